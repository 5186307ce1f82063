use crate::cli::ModesArgs;
use crate::exit_codes;
use crate::output;
use dff_rs::modes::{
    BaselineModeInfo, BASELINE_MODE_REGISTRY, DETREND_METHODS, FILTER_METHODS, NORMALIZATION_MODES,
};
use serde::Serialize;

#[derive(Serialize)]
struct ModeCatalog {
    baseline_modes: &'static [BaselineModeInfo],
    detrend_methods: Vec<&'static str>,
    filter_methods: Vec<&'static str>,
    normalization_modes: Vec<&'static str>,
}

pub fn execute(args: ModesArgs) -> i32 {
    let catalog = ModeCatalog {
        baseline_modes: BASELINE_MODE_REGISTRY,
        detrend_methods: DETREND_METHODS.iter().map(|m| m.as_str()).collect(),
        filter_methods: FILTER_METHODS.iter().map(|m| m.as_str()).collect(),
        normalization_modes: NORMALIZATION_MODES.iter().map(|m| m.as_str()).collect(),
    };

    if args.json {
        match output::to_json(&catalog, false) {
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
        println!("Available baseline modes:\n");
        println!("  {:<20} {:<10} {:<40}", "Name", "Kind", "Requires");
        println!("  {}", "-".repeat(70));
        for mode in catalog.baseline_modes {
            println!(
                "  {:<20} {:<10} {:<40}",
                mode.name,
                format!("{:?}", mode.kind).to_lowercase(),
                mode.required_params.join(", ")
            );
        }
        println!();
        println!("Detrend methods: {}", catalog.detrend_methods.join(", "));
        println!("Filter methods: {}", catalog.filter_methods.join(", "));
        println!(
            "Normalization modes: {}",
            catalog.normalization_modes.join(", ")
        );
        println!();
        println!("Rolling modes track drift frame by frame; constant modes reduce");
        println!("each channel to a single F0 value.");
    }

    exit_codes::SUCCESS
}
