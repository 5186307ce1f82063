//! Process exit codes, one per failure class.

pub const SUCCESS: i32 = 0;
pub const INPUT_ERROR: i32 = 1;
pub const MISSING_CAPABILITY: i32 = 2;
pub const EXECUTION_ERROR: i32 = 3;
