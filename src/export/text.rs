//! Text export implementation.

use super::Exporter;
use crate::analysis::Report;
use std::io::{self, Write};

/// Text exporter implementation.
///
/// One section per workspace, listing unused dependencies and then
/// undeclared ones with the scope they belong in.
pub struct TextExporter;

impl Exporter for TextExporter {
    fn export<W: Write>(&self, report: &Report, writer: &mut W) -> io::Result<()> {
        for workspace in &report.workspaces {
            writeln!(writer, "📦 {}", workspace)?;

            match report.unused(workspace) {
                Some(unused) if !unused.is_empty() => {
                    writeln!(
                        writer,
                        "Unused dependencies (declared but not imported anywhere)"
                    )?;
                    for dependency in unused {
                        writeln!(writer, "→ {}", dependency)?;
                    }
                }
                _ => writeln!(writer, "No unused dependencies!")?,
            }

            match report.undeclared(workspace) {
                Some(undeclared) if !undeclared.is_empty() => {
                    writeln!(
                        writer,
                        "Undeclared dependencies (imported but not declared in package.json)"
                    )?;
                    for (dependency, details) in undeclared {
                        writeln!(
                            writer,
                            "→ {} ({}, imported from {})",
                            dependency,
                            details.dependency_type,
                            details.imported_from.display()
                        )?;
                    }
                }
                _ => writeln!(writer, "No undeclared dependencies!")?,
            }

            writeln!(writer)?;
        }

        Ok(())
    }
}
