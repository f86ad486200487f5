//! Report rendering.
//!
//! This module provides exporters for writing an analysis [`Report`] as
//! human-readable text or as JSON.

pub mod json;
pub mod text;

use std::io::{self, Write};

use crate::analysis::Report;

pub use json::JsonExporter;
pub use text::TextExporter;

/// Report format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Text format - one section per workspace
    #[default]
    Text,
    /// JSON format - machine-readable, full data
    Json,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            _ => Err(format!(
                "Unknown report format: '{}'. Valid formats: text, json",
                s
            )),
        }
    }
}

impl std::fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFormat::Text => write!(f, "text"),
            ReportFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for exporters.
pub trait Exporter {
    /// Export the report to the given writer.
    fn export<W: Write>(&self, report: &Report, writer: &mut W) -> io::Result<()>;
}

/// Export a report in the specified format.
pub fn export<W: Write>(format: ReportFormat, report: &Report, writer: &mut W) -> io::Result<()> {
    match format {
        ReportFormat::Text => TextExporter.export(report, writer),
        ReportFormat::Json => JsonExporter.export(report, writer),
    }
}

/// Export a report to a string.
pub fn export_to_string(format: ReportFormat, report: &Report) -> io::Result<String> {
    let mut buffer = Vec::new();
    export(format, report, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
