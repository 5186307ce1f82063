use crate::cli::RunArgs;
use crate::dff_params;
use crate::exit_codes;
use crate::output;
use dff_rs::{DffError, PipelineRunner, SignalLoader, SignalSaver};
use std::path::Path;

pub fn execute(args: RunArgs) -> i32 {
    // Validate file
    if let Err(msg) = dff_params::validate_file(&args.file) {
        eprintln!("Error: {}", msg);
        return exit_codes::INPUT_ERROR;
    }

    // Resolve configuration (defaults <- --params <- flags)
    let config = match dff_params::build_config(&args) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };
    log::debug!("Resolved config: {:?}", config);

    if !args.quiet {
        eprintln!("Processing {}...", args.file);
        eprintln!("  Baseline: {}", config.baseline_mode.as_str());
        eprintln!("  Detrend: {}", config.detrend.as_str());
        eprintln!("  Normalization: {}", config.normalization_mode.as_str());
        eprintln!("  Filter: {}", config.filter_method.as_str());
    }

    // Load traces
    let loader = SignalLoader::new(&args.file).with_drop_first(config.drop_first);
    let raw = match loader.load() {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };

    // Execute the pipeline
    let runner = match PipelineRunner::new(config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
    };
    let result = match runner.run(&raw) {
        Ok(r) => r,
        Err(e @ DffError::MissingDependency(_)) => {
            eprintln!("Error: {}", e);
            return exit_codes::MISSING_CAPABILITY;
        }
        Err(e @ DffError::Validation { .. }) => {
            eprintln!("Error: {}", e);
            return exit_codes::INPUT_ERROR;
        }
        Err(e) => {
            eprintln!("Pipeline execution failed: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
    };

    // Save the primary normalized table next to other run outputs
    if let Some(ref dir) = args.output_dir {
        let table_path =
            dff_params::output_table_path(Path::new(dir), Path::new(&args.file), result.primary);
        if let Err(e) = SignalSaver::new(&table_path).save_csv(result.primary_table()) {
            eprintln!("Error: {}", e);
            return exit_codes::EXECUTION_ERROR;
        }
        if !args.quiet {
            eprintln!("Primary table written to {}", table_path.display());
        }
    }

    match output::to_json(&result, args.compact) {
        Ok(json) => {
            if let Err(e) = output::write_output(&json, args.output.as_deref()) {
                eprintln!("Error: {}", e);
                return exit_codes::EXECUTION_ERROR;
            }
            if !args.quiet {
                if let Some(ref path) = args.output {
                    eprintln!("Results written to {}", path);
                }
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing result: {}", e);
            exit_codes::EXECUTION_ERROR
        }
    }
}
