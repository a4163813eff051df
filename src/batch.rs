use super::*;
use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub total: usize,
    pub found: usize,
}

/// Runs `finder` over every row of a headered CSV and writes one result row per input row:
/// `Identifier,Name,Fragment,Notation,Error`. The identifier is the first column.
///
/// A name that yields no molecule gets an empty fragment and its error message; the
/// batch carries on with the next row.
pub fn find_molecules<R: Read, W: Write>(
    finder: &MoleculeFinder,
    reader: R,
    writer: W,
    name_column: usize,
    allow_correction: bool,
) -> Result<BatchSummary> {
    let mut rdr = ReaderBuilder::new().has_headers(true).flexible(true).from_reader(reader);
    let mut wtr = Writer::from_writer(writer);
    wtr.write_record(["Identifier", "Name", "Fragment", "Notation", "Error"])?;

    let mut summary = BatchSummary::default();
    for (row, result) in rdr.records().enumerate() {
        let record: StringRecord = result.context(format!("Error reading record {}", row + 1))?;
        let identifier = record.get(0).unwrap_or("");
        summary.total += 1;
        let Some(name) = record.get(name_column).map(str::trim).filter(|name| !name.is_empty()) else {
            warn!("{}: no name in column {}", identifier, name_column);
            let error = format!("no name in column {}", name_column);
            wtr.write_record([identifier, "", "", "", error.as_str()])?;
            continue;
        };

        match finder.find_molecule(name, allow_correction) {
            Ok(found) => {
                summary.found += 1;
                wtr.write_record([identifier, name, found.name.as_str(), found.notation.as_str(), ""])?;
            }
            Err(e) => {
                warn!("{}: {}", identifier, e);
                wtr.write_record([identifier, name, "", "", e.to_string().as_str()])?;
            }
        }
    }
    wtr.flush()?;
    info!("{}: found {} of {} names", finder, summary.found, summary.total);
    Ok(summary)
}

/// [`find_molecules`] from one CSV file into another.
pub fn find_molecules_in_csv(
    finder: &MoleculeFinder,
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    name_column: usize,
    allow_correction: bool,
) -> Result<BatchSummary> {
    let (input, output) = (input.as_ref(), output.as_ref());
    let reader = File::open(input).context(format!("Failed to open {}", input.display()))?;
    let writer = File::create(output).context(format!("Failed to create {}", output.display()))?;
    let summary = find_molecules(finder, reader, writer, name_column, allow_correction)?;
    info!("Results written to {}", output.display());
    Ok(summary)
}
