//! JSON export implementation.
//!
//! Writes the report as pretty-printed JSON. Keys are sorted, so the same
//! project always renders to the same bytes.

use super::Exporter;
use crate::analysis::Report;
use std::io::{self, Write};

/// JSON exporter implementation.
pub struct JsonExporter;

impl Exporter for JsonExporter {
    fn export<W: Write>(&self, report: &Report, writer: &mut W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *writer, report)?;
        writeln!(writer)?;
        Ok(())
    }
}
