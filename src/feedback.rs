//! Feedback capture: turning a submitted form into a row on a feedback worksheet.

use chrono::{Local, NaiveDateTime};
use serde::Deserialize;

use crate::backend::{SpreadsheetBackend, Worksheet};
use crate::config::TrackedTable;
use crate::error::Result;
use crate::table::CellValue;

/// Format of the timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Row count of a freshly created feedback worksheet.
pub const NEW_SHEET_ROWS: u32 = 100;

/// Fields posted by a feedback form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedbackForm {
    #[serde(default)]
    pub name: String,

    /// Only read when the form collects email.
    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub feedback: String,
}

/// One feedback row ready to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackEntry {
    pub timestamp: String,
    pub name: String,
    /// `Some` exactly when the target worksheet has an email column.
    pub email: Option<String>,
    pub feedback: String,
}

impl FeedbackEntry {
    /// Build an entry from a submitted form.
    ///
    /// Returns `None` when the feedback text is empty or whitespace only.
    /// An email field left out of the form counts as an empty string when the
    /// form collects email, and is discarded when it does not.
    pub fn from_form(form: FeedbackForm, collect_email: bool, at: NaiveDateTime) -> Option<Self> {
        if form.feedback.trim().is_empty() {
            return None;
        }

        Some(Self {
            timestamp: at.format(TIMESTAMP_FORMAT).to_string(),
            name: form.name,
            email: collect_email.then(|| form.email.unwrap_or_default()),
            feedback: form.feedback,
        })
    }

    /// Cells in header order: timestamp, name, (email), feedback.
    pub fn to_row(&self) -> Vec<CellValue> {
        let mut row = vec![
            CellValue::from(self.timestamp.as_str()),
            CellValue::from(self.name.as_str()),
        ];
        if let Some(email) = &self.email {
            row.push(CellValue::from(email.as_str()));
        }
        row.push(CellValue::from(self.feedback.as_str()));
        row
    }
}

/// Header row of a feedback worksheet.
///
/// # Examples
/// ```
/// use sheetboard::feedback::feedback_header;
///
/// assert_eq!(feedback_header(false), ["timestamp", "name", "feedback"]);
/// assert_eq!(feedback_header(true), ["timestamp", "name", "email", "feedback"]);
/// ```
pub fn feedback_header(collect_email: bool) -> Vec<&'static str> {
    let mut header = vec!["timestamp", "name"];
    if collect_email {
        header.push("email");
    }
    header.push("feedback");
    header
}

/// Message shown to the submitter once feedback for `table` is stored.
pub fn acknowledgment(table: &TrackedTable) -> String {
    format!("Feedback submitted for {}!", table.title)
}

/// Result of handling one form submission.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Blank feedback; nothing was written.
    Skipped,
    /// The entry was appended.
    Appended { acknowledgment: String },
}

/// Return the worksheet named `sheet_name`, creating it with a header row if missing.
///
/// Creation and the header append are two separate backend calls. If the
/// second one fails the worksheet is left without a header.
pub async fn ensure_feedback_sheet(
    backend: &dyn SpreadsheetBackend,
    sheet_name: &str,
    collect_email: bool,
) -> Result<Worksheet> {
    if let Some(worksheet) = backend.find_worksheet(sheet_name).await? {
        return Ok(worksheet);
    }

    let header = feedback_header(collect_email);
    log::info!("Creating feedback worksheet '{}'", sheet_name);
    let worksheet = backend
        .add_worksheet(sheet_name, NEW_SHEET_ROWS, header.len() as u32)
        .await?;

    let header_row: Vec<CellValue> = header.into_iter().map(CellValue::from).collect();
    backend.append_row(&worksheet, &header_row).await?;

    Ok(worksheet)
}

/// Append `entry` to `sheet_name`, creating the worksheet first when needed.
pub async fn append_feedback(
    backend: &dyn SpreadsheetBackend,
    sheet_name: &str,
    entry: &FeedbackEntry,
) -> Result<()> {
    let worksheet = ensure_feedback_sheet(backend, sheet_name, entry.email.is_some()).await?;
    backend.append_row(&worksheet, &entry.to_row()).await?;
    log::info!("Appended feedback to '{}'", sheet_name);
    Ok(())
}

/// Handle a feedback form posted for `table`, timestamped now.
pub async fn submit_feedback(
    backend: &dyn SpreadsheetBackend,
    table: &TrackedTable,
    form: FeedbackForm,
) -> Result<SubmitOutcome> {
    submit_feedback_at(backend, table, form, Local::now().naive_local()).await
}

/// Handle a feedback form posted for `table` at a given time.
///
/// Blank feedback is skipped without touching the backend.
pub async fn submit_feedback_at(
    backend: &dyn SpreadsheetBackend,
    table: &TrackedTable,
    form: FeedbackForm,
    at: NaiveDateTime,
) -> Result<SubmitOutcome> {
    let Some(entry) = FeedbackEntry::from_form(form, table.collect_email, at) else {
        log::debug!("Ignoring blank feedback for '{}'", table.feedback_sheet);
        return Ok(SubmitOutcome::Skipped);
    };

    append_feedback(backend, &table.feedback_sheet, &entry).await?;

    Ok(SubmitOutcome::Appended {
        acknowledgment: acknowledgment(table),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn form(name: &str, email: Option<&str>, feedback: &str) -> FeedbackForm {
        FeedbackForm {
            name: name.to_string(),
            email: email.map(str::to_string),
            feedback: feedback.to_string(),
        }
    }

    fn cells(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    fn mobiliteit(collect_email: bool) -> TrackedTable {
        TrackedTable::new("Mobiliteit", "Feedback_Mobiliteit", "Mobiliteit")
            .collecting_email(collect_email)
    }

    #[test]
    fn test_blank_feedback_builds_no_entry() {
        assert!(FeedbackEntry::from_form(form("Bob", None, ""), false, at(9, 0, 0)).is_none());
        assert!(FeedbackEntry::from_form(form("Bob", None, " \t\n "), true, at(9, 0, 0)).is_none());
    }

    #[test]
    fn test_entry_row_order() {
        let entry =
            FeedbackEntry::from_form(form("Alice", Some("a@example.org"), "Nice"), true, at(9, 5, 7))
                .unwrap();
        assert_eq!(entry.timestamp, "2024-05-01 09:05:07");
        assert_eq!(
            entry.to_row(),
            cells(&["2024-05-01 09:05:07", "Alice", "a@example.org", "Nice"])
        );
    }

    #[test]
    fn test_email_dropped_when_not_collected() {
        let entry =
            FeedbackEntry::from_form(form("Alice", Some("a@example.org"), "Nice"), false, at(9, 0, 0))
                .unwrap();
        assert_eq!(entry.email, None);
        assert_eq!(entry.to_row().len(), 3);
    }

    #[tokio::test]
    async fn test_first_submission_creates_sheet_with_email_header() {
        let backend = MemoryBackend::new();
        let outcome = submit_feedback_at(
            &backend,
            &mobiliteit(true),
            form("Alice", Some(""), "Great tool"),
            at(10, 0, 0),
        )
        .await
        .unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Appended {
                acknowledgment: "Feedback submitted for Mobiliteit!".to_string()
            }
        );
        assert_eq!(
            backend.values("Feedback_Mobiliteit").unwrap(),
            vec![
                cells(&["timestamp", "name", "email", "feedback"]),
                cells(&["2024-05-01 10:00:00", "Alice", "", "Great tool"]),
            ]
        );
        assert_eq!(backend.grid_size("Feedback_Mobiliteit"), Some((100, 4)));
    }

    #[tokio::test]
    async fn test_first_submission_without_email_header() {
        let backend = MemoryBackend::new();
        submit_feedback_at(&backend, &mobiliteit(false), form("", None, "Meer data"), at(11, 0, 0))
            .await
            .unwrap();

        let values = backend.values("Feedback_Mobiliteit").unwrap();
        assert_eq!(values[0], cells(&["timestamp", "name", "feedback"]));
        assert_eq!(values[1], cells(&["2024-05-01 11:00:00", "", "Meer data"]));
        assert_eq!(backend.grid_size("Feedback_Mobiliteit"), Some((100, 3)));
    }

    #[tokio::test]
    async fn test_missing_email_field_is_empty_string() {
        let backend = MemoryBackend::new();
        submit_feedback_at(&backend, &mobiliteit(true), form("Alice", None, "Great tool"), at(10, 0, 0))
            .await
            .unwrap();

        let values = backend.values("Feedback_Mobiliteit").unwrap();
        assert_eq!(values[1], cells(&["2024-05-01 10:00:00", "Alice", "", "Great tool"]));
    }

    #[tokio::test]
    async fn test_whitespace_feedback_creates_nothing() {
        let backend = MemoryBackend::new();
        let outcome = submit_feedback_at(&backend, &mobiliteit(true), form("", None, "   "), at(10, 0, 0))
            .await
            .unwrap();

        assert_eq!(outcome, SubmitOutcome::Skipped);
        assert!(backend.worksheet_titles().is_empty());
    }

    #[tokio::test]
    async fn test_blank_feedback_never_reaches_backend() {
        let backend = MemoryBackend::new();
        backend.set_failing(true);
        let outcome = submit_feedback_at(&backend, &mobiliteit(false), form("x", None, ""), at(10, 0, 0))
            .await
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_n_submissions_append_n_rows_in_order() {
        let backend = MemoryBackend::new();
        let table = mobiliteit(false);
        for i in 0..5u32 {
            submit_feedback_at(&backend, &table, form("", None, &format!("punt {}", i)), at(12, 0, i))
                .await
                .unwrap();
        }

        let values = backend.values("Feedback_Mobiliteit").unwrap();
        assert_eq!(values.len(), 6);
        for (i, row) in values[1..].iter().enumerate() {
            assert_eq!(row[2], CellValue::from(format!("punt {}", i)));
        }
        assert_eq!(backend.worksheet_titles(), vec!["Feedback_Mobiliteit".to_string()]);
    }

    #[tokio::test]
    async fn test_existing_sheet_header_is_left_alone() {
        let backend = MemoryBackend::new().with_worksheet(
            "Feedback_Mobiliteit",
            vec![cells(&["timestamp", "name", "feedback"])],
        );
        submit_feedback_at(&backend, &mobiliteit(false), form("Eve", None, "Top"), at(8, 0, 0))
            .await
            .unwrap();

        let values = backend.values("Feedback_Mobiliteit").unwrap();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], cells(&["timestamp", "name", "feedback"]));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let backend = MemoryBackend::new();
        backend.set_failing(true);
        let err = submit_feedback_at(&backend, &mobiliteit(false), form("", None, "Hallo"), at(8, 0, 0))
            .await
            .unwrap_err();
        assert!(err.is_backend());
    }
}
