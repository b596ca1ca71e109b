use rusqlite::Connection;
use serde::Serialize;
use thiserror::Error;

use crate::store;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Header-only or entirely blank upload; rejected before any row runs.
    #[error("CSV file must contain data rows")]
    NoDataRows,
}

#[derive(Debug, Default, Serialize)]
pub struct IngestOutcome {
    pub created: u64,
    pub updated: u64,
    pub errors: Vec<String>,
}

/// Apply an uploaded CSV roster under the given marker.
///
/// The first non-blank line is the header and is discarded. Every data
/// row is processed independently: a malformed row (or a storage error
/// on that row) is recorded with its row number and never aborts the
/// batch. Rows already carrying the marker move neither counter.
///
/// Row numbers are 1-indexed positions in the blank-filtered line
/// sequence, so the first data row reports as "Row 2".
pub fn ingest_csv(
    conn: &Connection,
    text: &str,
    marker: &str,
) -> Result<IngestOutcome, IngestError> {
    let lines: Vec<&str> = text.split('\n').filter(|l| !l.trim().is_empty()).collect();
    if lines.len() <= 1 {
        return Err(IngestError::NoDataRows);
    }

    let mut outcome = IngestOutcome::default();
    for (i, line) in lines[1..].iter().enumerate() {
        let row_no = i + 2;
        let cells: Vec<String> = line
            .split(',')
            .map(|cell| cell.trim().replace('"', ""))
            .collect();

        if cells.len() < 2 {
            outcome.errors.push(format!("Row {}: Invalid format", row_no));
            continue;
        }
        let (email, name) = (&cells[0], &cells[1]);
        if email.is_empty() || name.is_empty() {
            outcome
                .errors
                .push(format!("Row {}: Missing email or name", row_no));
            continue;
        }

        // Extra cells past email,name are ignored.
        match apply_row(conn, email, name, marker) {
            Ok(RowEffect::Created) => outcome.created += 1,
            Ok(RowEffect::MarkerAdded) => outcome.updated += 1,
            Ok(RowEffect::Unchanged) => {}
            Err(e) => outcome.errors.push(format!("Row {}: {}", row_no, e)),
        }
    }

    Ok(outcome)
}

enum RowEffect {
    Created,
    MarkerAdded,
    Unchanged,
}

fn apply_row(conn: &Connection, email: &str, name: &str, marker: &str) -> anyhow::Result<RowEffect> {
    match store::find_by_email(conn, email)? {
        Some(existing) => {
            if existing.markers.iter().any(|m| m == marker) {
                return Ok(RowEffect::Unchanged);
            }
            store::add_marker(conn, email, marker)?;
            Ok(RowEffect::MarkerAdded)
        }
        None => {
            store::create(conn, email, name, marker)?;
            Ok(RowEffect::Created)
        }
    }
}
