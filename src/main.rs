use clap::Parser;
use sdxl_tuner::adapters::key_inventory::load_key_inventory;
use sdxl_tuner::adapters::report_writer::write_report;
use sdxl_tuner::utils::error::ErrorSeverity;
use sdxl_tuner::utils::{logger, validation::Validate};
use sdxl_tuner::{
    node_registry, CliConfig, ClipTuner, ModelTuner, NodeKind, TuneReport, TunerError, TunerNode,
};
use std::path::Path;

fn main() {
    let config = CliConfig::parse();

    if config.log_json {
        logger::init_host_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }
    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(&config) {
        tracing::error!(
            "Tuning failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}

fn run(config: &CliConfig) -> Result<(), TunerError> {
    config.validate()?;

    if config.describe {
        println!("{}", serde_json::to_string_pretty(&node_registry())?);
        return Ok(());
    }

    let keys_path = config.keys.as_deref().unwrap_or_default();
    tracing::info!("Loading key inventory from {}", keys_path);
    let host_model = load_key_inventory(keys_path)?;

    let report: TuneReport = match config.node {
        NodeKind::Clip => {
            let weights = config.clip_weights()?;
            weights.validate()?;
            ClipTuner.tune(&host_model, &weights).report
        }
        NodeKind::Model => {
            let weights = config.model_weights()?;
            weights.validate()?;
            ModelTuner.tune(&host_model, &weights).report
        }
    };

    write_report(&report, config.format, config.output.as_deref().map(Path::new))
}
