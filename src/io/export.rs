//! CSV export for simulation step results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::load_control::ShedLevel;
use crate::sim::types::StepResult;

/// Column header for CSV telemetry export.
const HEADER: &str = "step,time,load_control,state,transition,requested_level,\
                       actual_level,output,present_value,command_priority,target";

fn level_field(level: ShedLevel) -> String {
    match level {
        ShedLevel::Percent(p) => format!("percent:{p}"),
        ShedLevel::Level(l) => format!("level:{l}"),
        ShedLevel::Amount(a) => format!("amount:{a:.2}"),
    }
}

/// Exports simulation results to a CSV file at the given path.
///
/// Writes a header row followed by one data row per Load Control object per
/// step. Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `results` - Complete simulation step results
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[StepResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes simulation results as CSV to any writer.
///
/// Empty cells mean "none": no transition fired, no slot occupied, no
/// shed target.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for r in results {
        wtr.write_record(&[
            r.step.to_string(),
            r.time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            r.load_control.to_string(),
            r.state.to_string(),
            r.transition.map(|t| t.to_string()).unwrap_or_default(),
            level_field(r.requested_level),
            level_field(r.actual_level),
            r.output.to_string(),
            r.present_value.map(|pv| format!("{pv:.4}")).unwrap_or_default(),
            r.command_priority.map(|p| p.to_string()).unwrap_or_default(),
            r.target.map(|t| format!("{t:.4}")).unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
