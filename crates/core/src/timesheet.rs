//! Weekly timesheet submission.
//!
//! A weekly sheet is a grid of project rows by day cells, each cell holding
//! the raw duration text someone typed. Turning it into drafts is lenient:
//! blank or malformed cells are dropped rather than failing the whole sheet,
//! but a sheet with nothing usable in it is an error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::duration::{EntryDuration, TotalMinutes, aggregate, parse_duration};
use crate::types::ProjectId;

/// Raised when a sheet contains no saveable entry at all.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("no valid time entries to save")]
    NoValidEntries,
}

/// One project line of a weekly sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetRow {
    /// Project id as entered; blank rows are ignored.
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub cells: Vec<SheetCell>,
}

/// One day of a project line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetCell {
    pub date: NaiveDate,
    /// Raw `H:MM` text.
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub description: String,
}

/// A weekly timesheet as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySheet {
    #[serde(default)]
    pub rows: Vec<SheetRow>,
}

/// A validated, not yet persisted, time entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntryDraft {
    pub project_id: ProjectId,
    pub date: NaiveDate,
    pub duration: EntryDuration,
    pub description: String,
}

/// Drafts extracted from a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedDrafts {
    pub drafts: Vec<TimeEntryDraft>,
    /// Cells that had text in them but were dropped.
    pub skipped: usize,
}

impl CollectedDrafts {
    /// Total duration of the drafts.
    #[must_use]
    pub fn total(&self) -> TotalMinutes {
        aggregate(self.drafts.iter().map(|d| d.duration))
    }
}

/// Validate a weekly sheet into drafts.
///
/// Rows whose project id is blank or not a number are skipped with all their
/// cells. Within a kept row, blank cells are ignored and any other cell must
/// be exactly `H:MM` text; padding around it counts as malformed and the cell
/// is skipped. Descriptions are trimmed.
///
/// # Errors
///
/// Returns [`SubmissionError::NoValidEntries`] if nothing survives.
pub fn collect_drafts(sheet: &WeeklySheet) -> Result<CollectedDrafts, SubmissionError> {
    let mut drafts = Vec::new();
    let mut skipped = 0;

    for row in &sheet.rows {
        let filled = row.cells.iter().filter(|c| !c.duration.trim().is_empty());

        let Ok(project_id) = row.project_id.parse::<ProjectId>() else {
            skipped += filled.count();
            continue;
        };

        for cell in filled {
            match parse_duration(&cell.duration) {
                Ok(duration) => drafts.push(TimeEntryDraft {
                    project_id,
                    date: cell.date,
                    duration,
                    description: cell.description.trim().to_owned(),
                }),
                Err(_) => skipped += 1,
            }
        }
    }

    if drafts.is_empty() {
        return Err(SubmissionError::NoValidEntries);
    }

    Ok(CollectedDrafts { drafts, skipped })
}
