use std::io::{self, Write};

use linetrack_core::schema::{FLUID_LINE_COLUMN, OVERALL_PROGRESS};
use linetrack_core::{RenderPayload, Schema, StatusKind};

const BAR_WIDTH: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn write_payload<W: Write>(
    out: &mut W,
    payload: &RenderPayload,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => write_text(out, payload)?,
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, payload)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn write_text<W: Write>(out: &mut W, payload: &RenderPayload) -> io::Result<()> {
    let key_width = payload
        .table
        .records()
        .iter()
        .map(|r| r.fluid_line.len())
        .chain([FLUID_LINE_COLUMN.len()])
        .max()
        .unwrap_or_default();

    write!(out, "{FLUID_LINE_COLUMN:<key_width$}")?;
    for stage in &payload.stages {
        write!(out, " | {stage}")?;
    }
    writeln!(out, " | {OVERALL_PROGRESS}")?;

    for record in payload.table.records() {
        write!(out, "{:<key_width$}", record.fluid_line)?;
        for stage in &payload.stages {
            let cell = record.stage(stage).map(percent).unwrap_or_default();
            write!(out, " | {cell:>w$}", w = stage.len())?;
        }
        writeln!(
            out,
            " | {:>w$.2}",
            record.overall_progress,
            w = OVERALL_PROGRESS.len()
        )?;
    }

    writeln!(out)?;
    writeln!(out, "Progress Overview")?;
    for line in &payload.lines {
        writeln!(
            out,
            "{:<key_width$} [{}] {:.2}%",
            line.fluid_line,
            bar(line.progress),
            line.progress
        )?;
    }
    writeln!(out, "Total Progress: {:.2}%", payload.total_progress)?;

    if let Some(status) = &payload.status {
        let tag = match status.kind {
            StatusKind::Info => "info",
            StatusKind::Success => "ok",
            StatusKind::Error => "error",
        };
        writeln!(out, "[{tag}] {}", status.message)?;
    }
    Ok(())
}

pub fn write_schema<W: Write>(out: &mut W, schema: &Schema, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            writeln!(out, "Fluid lines:")?;
            for l in schema.fluid_lines() {
                writeln!(out, "  {l}")?;
            }
            writeln!(out, "Stages:")?;
            for s in schema.stages() {
                writeln!(out, "  {s}")?;
            }
        }
        OutputFormat::Json => {
            let v = serde_json::json!({
                "variant": schema.variant(),
                "fluid_lines": schema.fluid_lines(),
                "stages": schema.stages(),
            });
            serde_json::to_writer_pretty(&mut *out, &v)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn percent(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn bar(progress: f64) -> String {
    let filled = ((progress.clamp(0.0, 100.0) / 100.0) * BAR_WIDTH as f64).round() as usize;
    format!("{}{}", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}
