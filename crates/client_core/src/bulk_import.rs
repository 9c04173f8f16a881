//! Bulk invitee import from spreadsheets.
//!
//! The first sheet is read as a raw grid and its first row is treated as a
//! header. Each remaining row is either `first name | last name | email` or
//! `full name | email`. Bad rows are collected, never fatal.

use std::{
    collections::HashSet,
    fmt,
    path::Path,
};

use async_trait::async_trait;
use calamine::{open_workbook_auto, Data, Reader};
use shared::{
    domain::ProcessId,
    protocol::{BulkInviteFailure, BulkInviteResponse, BulkProcessInvitationRequest, Invitee},
};
use tracing::{info, warn};

use crate::{
    error::{ClientError, ClientResult},
    forms::is_valid_email,
    queries::Talentree,
};

/// Row errors listed individually before the rest are only counted.
pub const LISTED_ROW_ERRORS: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    /// Spreadsheet row number (1-based) of `rows[0]`.
    pub first_row_number: usize,
    pub rows: Vec<Vec<String>>,
}

impl RawSheet {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            first_row_number: 1,
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowError {
    pub row: usize,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub invitees: Vec<Invitee>,
    pub errors: Vec<RowError>,
}

impl ImportReport {
    /// First few row errors, then a count of the rest.
    pub fn error_summary(&self) -> Option<String> {
        if self.errors.is_empty() {
            return None;
        }
        let mut lines: Vec<String> = self
            .errors
            .iter()
            .take(LISTED_ROW_ERRORS)
            .map(RowError::to_string)
            .collect();
        let remaining = self.errors.len().saturating_sub(LISTED_ROW_ERRORS);
        if remaining > 0 {
            lines.push(format!("... and {remaining} more errors"));
        }
        Some(lines.join("\n"))
    }

    /// Blocking message for the import, if any.
    pub fn error_message(&self) -> Option<String> {
        if self.invitees.is_empty() {
            let mut message = "No valid invitees found in the file.".to_string();
            if let Some(summary) = self.error_summary() {
                message.push('\n');
                message.push_str(&summary);
            }
            return Some(message);
        }
        self.error_summary()
    }
}

pub fn read_sheet(path: &Path) -> ClientResult<RawSheet> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => read_csv(path),
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook(path),
        other => Err(ClientError::Import(format!(
            "unsupported file type '{other}'; use .xlsx, .xls, .ods or .csv"
        ))),
    }
}

fn read_workbook(path: &Path) -> ClientResult<RawSheet> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| ClientError::Import(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ClientError::Import("the workbook has no sheets".to_string()))?
        .map_err(|err| ClientError::Import(err.to_string()))?;

    let first_row_number = range
        .start()
        .map(|(row, _)| row as usize + 1)
        .unwrap_or(1);
    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    Ok(RawSheet {
        first_row_number,
        rows,
    })
}

fn cell_text(cell: &Data) -> String {
    let text = match cell {
        Data::Empty => String::new(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string(),
    };
    text.trim().to_string()
}

fn read_csv(path: &Path) -> ClientResult<RawSheet> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| ClientError::Import(err.to_string()))?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| ClientError::Import(err.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|cell| cell.trim_start_matches('\u{feff}').trim().to_string())
                .collect(),
        );
    }
    Ok(RawSheet::new(rows))
}

/// Skips the header row and blank rows; every other row yields an invitee
/// or a [`RowError`].
pub fn parse_sheet(sheet: &RawSheet) -> ImportReport {
    let mut report = ImportReport::default();
    let mut seen_emails = HashSet::new();

    for (index, cells) in sheet.rows.iter().enumerate().skip(1) {
        let cells = trim_trailing_empty(cells);
        if cells.is_empty() {
            continue;
        }
        let row = sheet.first_row_number + index;

        match parse_row(cells) {
            Ok(invitee) => {
                if seen_emails.insert(invitee.email.to_lowercase()) {
                    report.invitees.push(invitee);
                } else {
                    report.errors.push(RowError {
                        row,
                        message: format!("duplicate email '{}'", invitee.email),
                    });
                }
            }
            Err(message) => report.errors.push(RowError { row, message }),
        }
    }

    if !report.errors.is_empty() {
        warn!(
            rejected = report.errors.len(),
            accepted = report.invitees.len(),
            "skipped invalid invitee rows"
        );
    }
    report
}

pub fn parse_rows(rows: Vec<Vec<String>>) -> ImportReport {
    parse_sheet(&RawSheet::new(rows))
}

fn trim_trailing_empty(cells: &[String]) -> &[String] {
    let len = cells
        .iter()
        .rposition(|cell| !cell.trim().is_empty())
        .map_or(0, |last| last + 1);
    &cells[..len]
}

pub(crate) fn parse_row(cells: &[String]) -> Result<Invitee, String> {
    let (first_name, last_name, email) = match cells {
        [first, last, email, ..] => (
            first.trim().to_string(),
            last.trim().to_string(),
            email.trim().to_string(),
        ),
        [full_name, email] => {
            let mut words = full_name.split_whitespace();
            let first = words.next().unwrap_or_default().to_string();
            let rest = words.collect::<Vec<_>>().join(" ");
            // A single-word name is repeated as the last name.
            let last = if rest.is_empty() { first.clone() } else { rest };
            (first, last, email.trim().to_string())
        }
        _ => {
            return Err("expected first name, last name and email columns".to_string());
        }
    };

    if first_name.is_empty() {
        return Err("first name is required".to_string());
    }
    if last_name.is_empty() {
        return Err("last name is required".to_string());
    }
    if !is_valid_email(&email) {
        return Err(format!("invalid email '{email}'"));
    }

    Ok(Invitee {
        first_name,
        last_name,
        email,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkInviteSummary {
    pub successful: u32,
    pub failed: u32,
    pub errors: Vec<BulkInviteFailure>,
}

impl BulkInviteSummary {
    pub fn message(&self) -> String {
        if self.failed == 0 {
            format!("{} invitations sent", self.successful)
        } else {
            format!(
                "{} invitations sent, {} failed",
                self.successful, self.failed
            )
        }
    }
}

impl From<BulkInviteResponse> for BulkInviteSummary {
    fn from(response: BulkInviteResponse) -> Self {
        Self {
            successful: response.successful,
            failed: response.failed,
            errors: response.errors,
        }
    }
}

#[async_trait]
pub trait BulkInviteSender: Send + Sync {
    async fn send_bulk_invite(
        &self,
        request: &BulkProcessInvitationRequest,
    ) -> ClientResult<BulkInviteResponse>;
}

#[async_trait]
impl BulkInviteSender for Talentree {
    async fn send_bulk_invite(
        &self,
        request: &BulkProcessInvitationRequest,
    ) -> ClientResult<BulkInviteResponse> {
        self.bulk_invite(request).await
    }
}

/// State behind the bulk-invite dialog: a preview built from one file,
/// the import errors, and the outcome of the last submission.
#[derive(Debug, Clone)]
pub struct BulkInviteModal {
    process_id: ProcessId,
    file_name: Option<String>,
    preview: Vec<Invitee>,
    row_errors: Vec<RowError>,
    error: Option<String>,
    submitting: bool,
    last_result: Option<BulkInviteSummary>,
}

impl BulkInviteModal {
    pub fn new(process_id: ProcessId) -> Self {
        Self {
            process_id,
            file_name: None,
            preview: Vec::new(),
            row_errors: Vec::new(),
            error: None,
            submitting: false,
            last_result: None,
        }
    }

    pub fn process_id(&self) -> ProcessId {
        self.process_id
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn preview(&self) -> &[Invitee] {
        &self.preview
    }

    pub fn row_errors(&self) -> &[RowError] {
        &self.row_errors
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn last_result(&self) -> Option<&BulkInviteSummary> {
        self.last_result.as_ref()
    }

    pub fn can_submit(&self) -> bool {
        !self.preview.is_empty() && !self.submitting
    }

    /// Replaces the preview with the contents of `path`. A file that cannot
    /// be read leaves an empty preview and the error message set.
    pub fn load_file(&mut self, path: &Path) -> ClientResult<()> {
        self.file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        match read_sheet(path) {
            Ok(sheet) => {
                self.load_sheet(&sheet);
                Ok(())
            }
            Err(err) => {
                self.preview.clear();
                self.row_errors.clear();
                self.error = Some(err.display_message());
                Err(err)
            }
        }
    }

    pub fn load_sheet(&mut self, sheet: &RawSheet) {
        let report = parse_sheet(sheet);
        self.error = report.error_message();
        self.preview = report.invitees;
        self.row_errors = report.errors;
        self.last_result = None;
        info!(
            file = self.file_name.as_deref().unwrap_or("<rows>"),
            invitees = self.preview.len(),
            rejected = self.row_errors.len(),
            "invitee file loaded"
        );
    }

    /// Loads an in-memory grid whose first row is the header.
    pub fn load_rows(&mut self, rows: Vec<Vec<String>>) {
        self.load_sheet(&RawSheet::new(rows));
    }

    pub fn remove(&mut self, index: usize) -> Option<Invitee> {
        (index < self.preview.len()).then(|| self.preview.remove(index))
    }

    pub fn clear(&mut self) {
        self.file_name = None;
        self.preview.clear();
        self.row_errors.clear();
        self.error = None;
        self.last_result = None;
    }

    /// Sends the preview as one bulk request. An empty preview is rejected
    /// locally without a network call.
    pub async fn submit(
        &mut self,
        sender: &dyn BulkInviteSender,
    ) -> ClientResult<BulkInviteSummary> {
        if self.preview.is_empty() {
            let err = ClientError::validation("there are no valid invitees to send");
            self.error = Some(err.display_message());
            return Err(err);
        }

        let request = BulkProcessInvitationRequest {
            process_id: self.process_id,
            invitees: self.preview.clone(),
        };
        self.submitting = true;
        let result = sender.send_bulk_invite(&request).await;
        self.submitting = false;

        match result {
            Ok(response) => {
                let summary = BulkInviteSummary::from(response);
                self.preview.clear();
                self.row_errors.clear();
                self.error = None;
                self.file_name = None;
                self.last_result = Some(summary.clone());
                Ok(summary)
            }
            Err(err) => {
                self.error = Some(err.display_message());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/bulk_import_tests.rs"]
mod tests;
