use chrono::{Duration, NaiveDate, TimeZone, Utc};
use district_dashboard::{
    AppError,
    choices::TaskStatus,
    models::{
        CreateEventRequest, CreateInitiativeRequest, CreateSheetRequest, CreateUserRequest, Initiative, InitiativeFilter,
        Task, TaskStatusForm, UpdateInitiativeRequest, UpdateTaskRequest,
    },
};

fn is_validation<T: std::fmt::Debug>(result: Result<T, AppError>) -> bool {
    matches!(result, Err(AppError::Validation(_)))
}

fn initiative_request() -> CreateInitiativeRequest {
    CreateInitiativeRequest {
        title: "Makerspace".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        ..CreateInitiativeRequest::default()
    }
}

#[test]
fn initiative_title_and_dates() {
    assert!(initiative_request().validate().is_ok());

    let blank = CreateInitiativeRequest {
        title: "   ".to_string(),
        ..initiative_request()
    };
    assert!(is_validation(blank.validate()));

    let long = CreateInitiativeRequest {
        title: "x".repeat(201),
        ..initiative_request()
    };
    assert!(is_validation(long.validate()));

    let backwards = CreateInitiativeRequest {
        end_date: NaiveDate::from_ymd_opt(2025, 2, 28),
        ..initiative_request()
    };
    assert!(is_validation(backwards.validate()));

    // Same-day start and end is fine.
    let same_day = CreateInitiativeRequest {
        end_date: NaiveDate::from_ymd_opt(2025, 3, 1),
        ..initiative_request()
    };
    assert!(same_day.validate().is_ok());

    let negative = CreateInitiativeRequest {
        budget: Some(-1.0),
        ..initiative_request()
    };
    assert!(is_validation(negative.validate()));
}

#[test]
fn partial_update_revalidates_merged_record() {
    let mut initiative = Initiative {
        title: "Makerspace".to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 6, 1),
        ..Initiative::default()
    };

    let moved_start = UpdateInitiativeRequest {
        start_date: NaiveDate::from_ymd_opt(2025, 7, 1),
        ..UpdateInitiativeRequest::default()
    };
    assert!(is_validation(moved_start.apply(&mut initiative.clone())));

    let retitle = UpdateInitiativeRequest {
        title: Some("Makerspace Phase 2".to_string()),
        ..UpdateInitiativeRequest::default()
    };
    retitle.apply(&mut initiative).unwrap();
    assert_eq!(initiative.title, "Makerspace Phase 2");
    assert_eq!(initiative.end_date, NaiveDate::from_ymd_opt(2025, 6, 1));
}

#[test]
fn status_form_parsing() {
    let form = |status: &str, progress: Option<&str>| TaskStatusForm {
        status: status.to_string(),
        progress: progress.map(str::to_string),
    };

    assert_eq!(form("completed", Some("100")).parse(), Some((TaskStatus::Completed, 100)));
    assert_eq!(form("on_hold", None).parse(), Some((TaskStatus::OnHold, 0)));
    assert_eq!(form("in_progress", Some("")).parse(), Some((TaskStatus::InProgress, 0)));
    assert_eq!(form("finished", Some("10")).parse(), None);
    assert_eq!(form("completed", Some("150")).parse(), None);
    assert_eq!(form("completed", Some("-1")).parse(), None);
    assert_eq!(form("completed", Some("half")).parse(), None);
}

#[test]
fn completion_stamp_survives_reopening() {
    let first = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let second = first + Duration::days(2);
    let mut task = Task {
        due_date: first + Duration::days(30),
        ..Task::default()
    };

    task.apply_status(TaskStatus::Completed, first);
    assert_eq!(task.completed_at, Some(first));

    task.apply_status(TaskStatus::InProgress, second);
    assert_eq!(task.completed_at, Some(first));

    // Completing again restamps.
    task.apply_status(TaskStatus::Completed, second);
    assert_eq!(task.completed_at, Some(second));
}

#[test]
fn task_update_rejects_bad_progress_before_touching_anything() {
    let now = Utc::now();
    let mut task = Task {
        title: "Kickoff".to_string(),
        progress: 30,
        due_date: now + Duration::days(1),
        ..Task::default()
    };
    let update = UpdateTaskRequest {
        title: Some("Renamed".to_string()),
        progress: Some(101),
        ..UpdateTaskRequest::default()
    };
    assert!(is_validation(update.apply(&mut task, now)));
    assert_eq!(task.title, "Kickoff");
    assert_eq!(task.progress, 30);
}

#[test]
fn overdue_is_derived_from_due_date_and_status() {
    let now = Utc::now();
    let mut task = Task {
        status: TaskStatus::OnHold,
        due_date: now - Duration::hours(1),
        ..Task::default()
    };
    assert!(task.is_overdue(now));
    task.status = TaskStatus::Completed;
    assert!(!task.is_overdue(now));
}

#[test]
fn links_must_be_http() {
    let sheet = CreateSheetRequest {
        sheet_url: "ftp://example.org/sheet".to_string(),
    };
    assert!(is_validation(sheet.validate()));

    let start = Utc::now();
    let event = CreateEventRequest {
        title: "Launch".to_string(),
        start_at: start,
        end_at: Some(start - Duration::hours(1)),
        ..CreateEventRequest::default()
    };
    assert!(is_validation(event.validate()));

    let event = CreateEventRequest {
        title: "Launch".to_string(),
        start_at: start,
        meet_link: Some("https://meet.example.org/abc".to_string()),
        ..CreateEventRequest::default()
    };
    assert!(event.validate().is_ok());
}

#[test]
fn new_accounts_need_an_email_and_a_real_password() {
    let request = |email: &str, password: &str| CreateUserRequest {
        email: email.to_string(),
        password: password.to_string(),
        full_name: String::new(),
        role: Default::default(),
        district_id: None,
    };
    assert!(request("coordinator@example.org", "12345678").validate().is_ok());
    assert!(is_validation(request("coordinator", "12345678").validate()));
    assert!(is_validation(request("coordinator@example.org", "1234567").validate()));
}

#[test]
fn filters_search_case_insensitively_but_match_district_exactly() {
    let initiative = Initiative {
        title: "Solar Makerspace".to_string(),
        district_name: "Batticaloa".to_string(),
        ..Initiative::default()
    };
    let filter = InitiativeFilter {
        search: Some("makerSPACE".to_string()),
        district: Some("Batticaloa".to_string()),
        ..InitiativeFilter::default()
    };
    assert!(filter.matches(&initiative));

    let filter = InitiativeFilter {
        district: Some("batticaloa".to_string()),
        ..InitiativeFilter::default()
    };
    assert!(!filter.matches(&initiative));
}
