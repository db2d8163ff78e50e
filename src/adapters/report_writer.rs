use crate::domain::model::TuneReport;
use crate::utils::error::Result;
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            other => Err(format!(
                "unsupported format '{}'. Valid formats: text, json, csv",
                other
            )),
        }
    }
}

pub fn render_report(report: &TuneReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(report)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)? + "\n"),
        ReportFormat::Csv => render_csv(report),
    }
}

fn render_text(report: &TuneReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", report.info);
    let _ = writeln!(out, "node: {} | mode: {}", report.node, report.mode);
    let _ = writeln!(out, "base multiplier: {:.4}", report.base_multiplier);
    if report.override_used {
        let _ = writeln!(out, "block vector override in effect");
    }
    for group in &report.multipliers {
        let _ = writeln!(out, "  {:<24} {:.4}", group.name, group.multiplier);
    }
    let _ = writeln!(
        out,
        "keys: {} seen, {} patched, {} neutral, {} excluded",
        report.keys_seen,
        report.patch_count(),
        report.skipped_neutral,
        report.excluded
    );
    for patch in &report.patches {
        let _ = writeln!(
            out,
            "  {:+.4}  {:<24} {}",
            patch.strength, patch.target, patch.key
        );
    }
    out
}

fn render_csv(report: &TuneReport) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for patch in &report.patches {
        writer.serialize(patch)?;
    }
    if report.patches.is_empty() {
        writer.write_record(["key", "target", "multiplier", "strength"])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render `report` and write it to `output`, or stdout when `None`.
pub fn write_report(report: &TuneReport, format: ReportFormat, output: Option<&Path>) -> Result<()> {
    let rendered = render_report(report, format)?;
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, rendered)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => print!("{}", rendered),
    }
    Ok(())
}
