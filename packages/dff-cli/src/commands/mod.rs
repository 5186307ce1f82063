pub mod info;
pub mod modes;
pub mod run;
pub mod validate;
