use super::*;
use std::{
    io::Write as _,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex as StdMutex,
    },
};
use uuid::Uuid;

fn row(cells: &[&str]) -> Vec<String> {
    cells.iter().map(|cell| cell.to_string()).collect()
}

fn with_header(rows: &[&[&str]]) -> Vec<Vec<String>> {
    let mut all = vec![row(&["Nombre", "Apellido", "Email"])];
    all.extend(rows.iter().map(|cells| row(cells)));
    all
}

fn invitee(first: &str, last: &str, email: &str) -> Invitee {
    Invitee {
        first_name: first.to_string(),
        last_name: last.to_string(),
        email: email.to_string(),
    }
}

#[test]
fn two_column_row_splits_full_name_on_first_space() {
    let report = parse_rows(with_header(&[&["Juan Pérez", "juan@x.com"]]));

    assert!(report.errors.is_empty());
    assert_eq!(report.invitees, vec![invitee("Juan", "Pérez", "juan@x.com")]);
}

#[test]
fn two_column_row_keeps_compound_last_names() {
    let report = parse_rows(with_header(&[&["María José  de la Fuente", "mj@x.com"]]));

    assert_eq!(
        report.invitees,
        vec![invitee("María", "José de la Fuente", "mj@x.com")]
    );
}

#[test]
fn single_word_name_repeats_as_last_name() {
    let report = parse_rows(with_header(&[&["Ana", "ana@x.com"]]));

    assert_eq!(report.invitees, vec![invitee("Ana", "Ana", "ana@x.com")]);
}

#[test]
fn three_or_more_columns_map_to_first_last_email() {
    let report = parse_rows(with_header(&[
        &["Juan", "Pérez", "juan@x.com"],
        &["  Luis ", "Soto", " luis@x.com ", "ignored", "extra"],
    ]));

    assert!(report.errors.is_empty());
    assert_eq!(
        report.invitees,
        vec![
            invitee("Juan", "Pérez", "juan@x.com"),
            invitee("Luis", "Soto", "luis@x.com"),
        ]
    );
}

#[test]
fn invalid_email_rows_are_excluded_and_reported() {
    let report = parse_rows(with_header(&[
        &["Juan Pérez", "juan@x.com"],
        &["Pedro Soto", "not-an-email"],
    ]));

    assert_eq!(report.invitees.len(), 1);
    assert_eq!(
        report.errors,
        vec![RowError {
            row: 3,
            message: "invalid email 'not-an-email'".to_string(),
        }]
    );
}

#[test]
fn header_and_blank_rows_are_skipped() {
    let report = parse_rows(vec![
        row(&["Nombre completo", "Correo"]),
        row(&[]),
        row(&["", "  ", ""]),
        row(&["Ana", "ana@x.com"]),
    ]);

    assert!(report.errors.is_empty());
    assert_eq!(report.invitees.len(), 1);
}

#[test]
fn trailing_empty_cells_do_not_count_as_columns() {
    let report = parse_rows(with_header(&[&["Juan Pérez", "juan@x.com", "", ""]]));

    assert_eq!(report.invitees, vec![invitee("Juan", "Pérez", "juan@x.com")]);
}

#[test]
fn single_column_and_missing_names_are_row_errors() {
    let report = parse_rows(with_header(&[
        &["only-one-cell"],
        &["", "Soto", "soto@x.com"],
        &["Juan", "", "juan@x.com"],
    ]));

    assert!(report.invitees.is_empty());
    let messages: Vec<&str> = report.errors.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "expected first name, last name and email columns",
            "first name is required",
            "last name is required",
        ]
    );
}

#[test]
fn duplicate_emails_in_one_file_are_rejected() {
    let report = parse_rows(with_header(&[
        &["Ana", "ana@x.com"],
        &["Ana Dos", "ANA@x.com"],
    ]));

    assert_eq!(report.invitees.len(), 1);
    assert_eq!(report.errors[0].row, 3);
    assert!(report.errors[0].message.contains("duplicate email"));
}

#[test]
fn zero_valid_rows_sets_an_error_message() {
    let report = parse_rows(with_header(&[&["Pedro", "not-an-email"]]));

    assert!(report.invitees.is_empty());
    let message = report.error_message().expect("error message");
    assert!(message.starts_with("No valid invitees found"));
    assert!(message.contains("Row 2: invalid email 'not-an-email'"));
}

#[test]
fn header_only_sheet_still_reports_no_invitees() {
    let report = parse_rows(vec![row(&["Nombre", "Email"])]);

    assert!(report.invitees.is_empty());
    assert!(report.error_message().is_some());
    assert!(report.error_summary().is_none());
}

#[test]
fn error_summary_lists_five_and_counts_the_rest() {
    let bad_rows: Vec<Vec<&str>> = (0..8).map(|_| vec!["Pedro", "bad"]).collect();
    let refs: Vec<&[&str]> = bad_rows.iter().map(Vec::as_slice).collect();
    let report = parse_rows(with_header(&refs));

    let summary = report.error_summary().expect("summary");
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), LISTED_ROW_ERRORS + 1);
    assert_eq!(lines[0], "Row 2: invalid email 'bad'");
    assert_eq!(lines[5], "... and 3 more errors");
}

#[test]
fn row_numbers_follow_the_sheet_offset() {
    let sheet = RawSheet {
        first_row_number: 4,
        rows: with_header(&[&["Pedro", "bad"]]),
    };
    let report = parse_sheet(&sheet);
    assert_eq!(report.errors[0].row, 5);
}

#[test]
fn reads_csv_files_as_raw_rows() {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("temp csv");
    write!(
        file,
        "\u{feff}Nombre,Email\nJuan Pérez,juan@x.com\n\nAna,ana@x.com,\nPedro,nope\n"
    )
    .expect("write csv");

    let sheet = read_sheet(file.path()).expect("read csv");
    let report = parse_sheet(&sheet);

    assert_eq!(sheet.rows[0][0], "Nombre");
    assert_eq!(
        report.invitees,
        vec![
            invitee("Juan", "Pérez", "juan@x.com"),
            invitee("Ana", "Ana", "ana@x.com"),
        ]
    );
    assert_eq!(report.errors.len(), 1);
}

#[test]
fn reads_the_first_worksheet_of_an_xlsx_file() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/tests/fixtures/invitees.xlsx");

    let sheet = read_sheet(&path).expect("read xlsx");

    assert_eq!(sheet.first_row_number, 3);
    assert_eq!(sheet.rows[0], row(&["First name", "Last name", "Email", "Code"]));
    assert_eq!(sheet.rows[1], row(&["Ana", "Gómez", "ana@x.com", "1001"]));
    assert_eq!(sheet.rows[2][3], "1002.5");

    let report = parse_sheet(&sheet);
    assert_eq!(
        report.invitees,
        vec![
            invitee("Ana", "Gómez", "ana@x.com"),
            invitee("Luis", "Pérez", "luis@x.com"),
        ]
    );
}

#[test]
fn unsupported_extensions_are_rejected() {
    let err = read_sheet(Path::new("invitees.txt")).expect_err("txt");
    assert!(matches!(err, ClientError::Import(_)));
}

#[test]
fn float_cells_lose_integral_fraction() {
    assert_eq!(cell_text(&Data::Float(12345.0)), "12345");
    assert_eq!(cell_text(&Data::Float(1.5)), "1.5");
    assert_eq!(cell_text(&Data::String("  a@x.com ".to_string())), "a@x.com");
    assert_eq!(cell_text(&Data::Empty), "");
}

struct FakeSender {
    calls: AtomicUsize,
    requests: StdMutex<Vec<BulkProcessInvitationRequest>>,
    fail: bool,
}

impl FakeSender {
    fn new(fail: bool) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            requests: StdMutex::new(Vec::new()),
            fail,
        }
    }
}

#[async_trait]
impl BulkInviteSender for FakeSender {
    async fn send_bulk_invite(
        &self,
        request: &BulkProcessInvitationRequest,
    ) -> ClientResult<BulkInviteResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        if self.fail {
            return Err(shared::error::ApiException::new(400, "Process is closed").into());
        }
        Ok(BulkInviteResponse {
            successful: request.invitees.len() as u32 - 1,
            failed: 1,
            errors: vec![BulkInviteFailure {
                email: request.invitees[0].email.clone(),
                message: "already invited".to_string(),
            }],
        })
    }
}

fn loaded_modal() -> BulkInviteModal {
    let mut modal = BulkInviteModal::new(ProcessId(Uuid::new_v4()));
    modal.load_sheet(&RawSheet::new(with_header(&[
        &["Juan Pérez", "juan@x.com"],
        &["Ana", "ana@x.com"],
        &["Luis", "Soto", "luis@x.com"],
        &["Pedro", "bad"],
    ])));
    modal
}

#[tokio::test]
async fn modal_submits_preview_and_reports_partial_failures() {
    let mut modal = loaded_modal();
    assert_eq!(modal.preview().len(), 3);
    assert_eq!(modal.row_errors().len(), 1);
    assert!(modal.can_submit());

    let sender = FakeSender::new(false);
    let summary = modal.submit(&sender).await.expect("submit");

    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.message(), "2 invitations sent, 1 failed");
    assert!(modal.preview().is_empty());
    assert_eq!(modal.last_result(), Some(&summary));

    let requests = sender.requests.lock().expect("lock");
    assert_eq!(requests[0].process_id, modal.process_id());
    assert_eq!(requests[0].invitees[1], invitee("Ana", "Ana", "ana@x.com"));
}

#[tokio::test]
async fn modal_refuses_to_submit_an_empty_preview() {
    let mut modal = BulkInviteModal::new(ProcessId(Uuid::new_v4()));
    modal.load_rows(with_header(&[&["Pedro", "not-an-email"]]));
    assert!(modal.error().is_some());
    assert!(modal.preview().is_empty());

    let sender = FakeSender::new(false);
    let err = modal.submit(&sender).await.expect_err("empty preview");

    assert!(matches!(err, ClientError::Validation(_)));
    assert_eq!(sender.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn modal_keeps_preview_when_the_server_rejects_the_batch() {
    let mut modal = loaded_modal();
    let sender = FakeSender::new(true);

    let err = modal.submit(&sender).await.expect_err("server error");

    assert_eq!(err.display_message(), "Process is closed");
    assert_eq!(modal.error(), Some("Process is closed"));
    assert_eq!(modal.preview().len(), 3);
    assert!(!modal.is_submitting());
}

#[test]
fn modal_remove_and_clear() {
    let mut modal = loaded_modal();

    assert_eq!(
        modal.remove(0),
        Some(invitee("Juan", "Pérez", "juan@x.com"))
    );
    assert_eq!(modal.remove(10), None);
    assert_eq!(modal.preview().len(), 2);

    modal.clear();
    assert!(modal.preview().is_empty());
    assert!(modal.error().is_none());
}

#[test]
fn modal_load_file_surfaces_read_errors() {
    let mut modal = BulkInviteModal::new(ProcessId(Uuid::new_v4()));
    let missing = std::env::temp_dir().join(format!("talentree-missing-{}.xlsx", Uuid::new_v4()));

    assert!(modal.load_file(&missing).is_err());
    assert!(modal.error().is_some());
    assert!(modal.preview().is_empty());
    assert_eq!(
        modal.file_name(),
        missing.file_name().and_then(|name| name.to_str())
    );
}
