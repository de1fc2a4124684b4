use courtcase_core::model::workflow::CaseWorkflow;
use courtcase_core::{
    CaseRecord, CaseStatus, CaseViewState, ClientInfo, DateRange, SortDirection, SortField,
    SortSpec, StatusFilter,
};

fn record(id: &str, client_name: &str, updated_at: i64) -> CaseRecord {
    CaseRecord {
        id: id.to_string(),
        case_number: format!("CASE-{id}"),
        client_name: client_name.to_string(),
        current_summary: String::new(),
        case_date: None,
        status: CaseStatus::Open,
        is_deleted: false,
        deleted_at: None,
        created_at: updated_at,
        updated_at,
        user_id: "alice".to_string(),
        is_primary: true,
        can_write: true,
        can_export: true,
        client: ClientInfo::default(),
        workflow: CaseWorkflow::new(),
    }
}

fn ids(cases: &[&CaseRecord]) -> Vec<String> {
    cases.iter().map(|case| case.id.clone()).collect()
}

fn loaded(cases: Vec<CaseRecord>) -> CaseViewState {
    let mut state = CaseViewState::default();
    state.cases_loaded(cases);
    state
}

#[test]
fn default_sort_is_updated_at_descending_and_reverses_exactly() {
    let mut state = loaded(vec![
        record("t1", "A", 100),
        record("t3", "B", 300),
        record("t2", "C", 200),
    ]);

    assert_eq!(ids(&state.sorted()), vec!["t3", "t2", "t1"]);

    state.set_sorting(SortSpec::new(SortField::UpdatedAt, SortDirection::Asc));
    assert_eq!(ids(&state.sorted()), vec!["t1", "t2", "t3"]);
}

#[test]
fn search_matches_case_insensitively_across_text_fields() {
    let mut summary_match = record("c", "Ann Lee", 3);
    summary_match.current_summary = "Witness: Mr SMITH".to_string();
    let mut state = loaded(vec![
        record("a", "John Smith", 1),
        record("b", "Jane Doe", 2),
        summary_match,
    ]);

    state.set_search_term("Smith");
    assert_eq!(ids(&state.filtered_cases()), vec!["a", "c"]);

    state.set_search_term("smith");
    assert_eq!(ids(&state.filtered_cases()), vec!["a", "c"]);

    state.set_search_term("case-b");
    assert_eq!(ids(&state.filtered_cases()), vec!["b"]);
}

#[test]
fn status_and_date_filters_combine() {
    let mut closed = record("closed", "A", 1);
    closed.status = CaseStatus::Closed;
    closed.case_date = Some(50);
    let mut open_dated = record("open", "B", 2);
    open_dated.case_date = Some(150);
    let undated = record("undated", "C", 3);
    let mut state = loaded(vec![closed, open_dated, undated]);

    state.set_status_filter(StatusFilter::Only(CaseStatus::Closed));
    assert_eq!(ids(&state.filtered_cases()), vec!["closed"]);

    state.set_status_filter(StatusFilter::All);
    state.set_date_range(DateRange::new(Some(100), None));
    assert_eq!(ids(&state.filtered_cases()), vec!["open"]);

    state.set_date_range(DateRange::new(None, Some(150)));
    assert_eq!(ids(&state.filtered_cases()), vec!["closed", "open"]);

    state.clear_filters();
    assert_eq!(state.filtered_count(), 3);
}

#[test]
fn text_and_flag_sorts_follow_their_kinds() {
    let mut b = record("b", "bravo", 1);
    b.is_primary = false;
    let a = record("a", "Alpha", 2);
    let c = record("c", "charlie", 3);
    let mut state = loaded(vec![c, b, a]);

    state.set_sorting(SortSpec::new(SortField::ClientName, SortDirection::Asc));
    assert_eq!(ids(&state.sorted()), vec!["a", "b", "c"]);

    state.set_sorting(SortSpec::new(SortField::IsPrimary, SortDirection::Asc));
    assert_eq!(ids(&state.sorted()), vec!["b", "c", "a"]);

    state.set_sorting(SortSpec::new(SortField::Client, SortDirection::Desc));
    assert_eq!(ids(&state.sorted()), vec!["c", "b", "a"]);
}

#[test]
fn missing_dates_sort_as_zero() {
    let mut dated = record("dated", "A", 1);
    dated.case_date = Some(10);
    let undated = record("undated", "B", 2);
    let mut state = loaded(vec![dated, undated]);

    state.set_sorting(SortSpec::new(SortField::CaseDate, SortDirection::Asc));
    assert_eq!(ids(&state.sorted()), vec!["undated", "dated"]);
}

#[test]
fn pagination_slices_and_filter_changes_reset_page() {
    let cases = (0..25)
        .map(|n| record(&format!("c{n:02}"), "Client", 1_000 - n))
        .collect();
    let mut state = loaded(cases);

    assert_eq!(state.page_size(), 10);
    assert_eq!(state.page_count(), 3);

    state.set_page(2);
    assert_eq!(ids(&state.visible_cases()), vec!["c20", "c21", "c22", "c23", "c24"]);

    state.set_sorting(SortSpec::new(SortField::UpdatedAt, SortDirection::Asc));
    assert_eq!(state.page(), 2);

    state.set_search_term("client");
    assert_eq!(state.page(), 0);

    state.set_page(5);
    assert!(state.visible_cases().is_empty());

    state.set_page_size(20);
    assert_eq!(state.page(), 0);
    assert_eq!(state.page_count(), 2);
}

#[test]
fn reducers_track_lifecycle_outcomes() {
    let mut state = loaded(vec![record("a", "A", 1), record("b", "B", 2)]);

    state.begin_request();
    assert!(state.loading);
    state.case_created(record("new", "N", 3));
    assert!(!state.loading);
    assert_eq!(state.cases[0].id, "new");
    assert_eq!(state.current_case.as_ref().map(|c| c.id.as_str()), Some("new"));

    let mut deleted = record("a", "A", 4);
    deleted.mark_deleted(4);
    state.case_soft_deleted(deleted);
    assert!(state.find("a").is_some_and(|case| case.is_deleted));
    assert_eq!(state.current_case.as_ref().map(|c| c.id.as_str()), Some("new"));

    state.case_loaded(record("new", "N", 3));
    let mut open_deleted = record("new", "N", 6);
    open_deleted.mark_deleted(6);
    state.case_soft_deleted(open_deleted);
    assert!(state.current_case.is_none());
    assert!(state.find("new").is_some_and(|case| case.is_deleted));

    state.case_restored(record("gone", "G", 5));
    assert_eq!(state.cases[0].id, "gone");

    state.case_loaded(record("b", "B", 2));
    state.case_permanently_deleted("b");
    assert!(state.find("b").is_none());
    assert!(state.current_case.is_none());

    state.begin_request();
    state.request_failed("Case not found: x");
    assert_eq!(state.error.as_deref(), Some("Case not found: x"));
    assert!(!state.loading);
    state.begin_request();
    assert!(state.error.is_none());

    state.case_loaded(record("a", "A", 4));
    state.clear_current_case();
    assert!(state.current_case.is_none());
}
