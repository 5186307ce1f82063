use crate::cli::ValidateArgs;
use crate::exit_codes;
use crate::output;
use dff_rs::{SignalLoader, TableFormat};
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct ValidateOutput {
    file: String,
    exists: bool,
    readable: bool,
    supported: bool,
    file_type: Option<&'static str>,
    size_bytes: Option<u64>,
    n_channels: Option<usize>,
    n_frames: Option<usize>,
    error: Option<String>,
}

pub fn execute(args: ValidateArgs) -> i32 {
    let path = Path::new(&args.file);

    let exists = path.exists();
    let readable = path.is_file() && std::fs::File::open(path).is_ok();

    let file_type = TableFormat::from_path(path);
    let supported = file_type.is_some();

    let size_bytes = if readable {
        std::fs::metadata(path).ok().map(|m| m.len())
    } else {
        None
    };

    // Parse peek: load without trimming to report the table shape
    let mut n_channels = None;
    let mut n_frames = None;
    let mut parse_error = None;
    if exists && readable && supported {
        match SignalLoader::new(path).load() {
            Ok(table) => {
                n_channels = Some(table.n_channels());
                n_frames = Some(table.n_frames());
            }
            Err(e) => parse_error = Some(e.to_string()),
        }
    }

    let error = if !exists {
        Some(format!("File not found: {}", args.file))
    } else if !readable {
        Some(format!("File is not readable: {}", args.file))
    } else if !supported {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Some(format!(
            "Unsupported file extension '{}'. Supported: csv, tsv, txt, dat",
            ext
        ))
    } else {
        parse_error
    };

    let result = ValidateOutput {
        file: args.file.clone(),
        exists,
        readable,
        supported,
        file_type: file_type.map(|ft| ft.as_str()),
        size_bytes,
        n_channels,
        n_frames,
        error: error.clone(),
    };

    if args.json {
        match output::to_json(&result, false) {
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
    } else if let Some(ref err) = error {
        eprintln!("Error: {}", err);
    } else {
        println!(
            "File '{}' is valid ({}, {} bytes, {} channels x {} frames)",
            args.file,
            file_type.map(|ft| ft.as_str()).unwrap_or_default(),
            size_bytes.unwrap_or(0),
            n_channels.unwrap_or(0),
            n_frames.unwrap_or(0)
        );
    }

    if error.is_some() {
        exit_codes::INPUT_ERROR
    } else {
        exit_codes::SUCCESS
    }
}
