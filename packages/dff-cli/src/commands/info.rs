use crate::cli::InfoArgs;
use crate::exit_codes;
use crate::output;
use dff_rs::has_savgol_support;
use serde::Serialize;

#[derive(Serialize)]
struct InfoOutput {
    cli_version: String,
    platform: String,
    arch: String,
    savgol_support: bool,
    input_formats: Vec<&'static str>,
}

pub fn execute(args: InfoArgs) -> i32 {
    let info = InfoOutput {
        cli_version: env!("CARGO_PKG_VERSION").to_string(),
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        savgol_support: has_savgol_support(),
        input_formats: vec!["csv", "tsv", "txt", "dat"],
    };

    if args.json {
        match output::to_json(&info, false) {
            Ok(json) => {
                if let Err(e) = output::write_output(&json, None) {
                    eprintln!("Error: {}", e);
                    return exit_codes::EXECUTION_ERROR;
                }
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
        }
    } else {
        println!("fluolab CLI v{}", info.cli_version);
        println!("Platform: {} ({})", info.platform, info.arch);
        println!();
        if info.savgol_support {
            println!("Savitzky-Golay smoothing: available");
        } else {
            println!("Savitzky-Golay smoothing: not compiled in (gaussian only)");
        }
        println!("Input formats: {}", info.input_formats.join(", "));
    }

    exit_codes::SUCCESS
}
