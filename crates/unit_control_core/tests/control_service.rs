use chrono::{Duration, Local, NaiveDate, NaiveDateTime};
use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;
use unit_control_core::{
    ActiveRegistry, Clock, CompletedEntry, CompletionLog, ControlEntry, ControlService,
    ControlServiceError, CsvActiveRegistry, CsvCompletionLog, DateBounds, RepoError, RepoResult,
};

#[derive(Clone)]
struct TestClock {
    now: Rc<Cell<NaiveDateTime>>,
}

impl TestClock {
    fn at(now: NaiveDateTime) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }
}

impl Clock for TestClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}

/// Completion log whose writes always fail.
#[derive(Default)]
struct BrokenLog {
    entries: Vec<CompletedEntry>,
}

impl CompletionLog for BrokenLog {
    fn load(&mut self) -> RepoResult<Vec<CompletedEntry>> {
        Ok(self.entries.clone())
    }

    fn append(&mut self, _entry: &CompletedEntry) -> RepoResult<()> {
        Err(RepoError::Io {
            path: "completed.csv".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn entries(&self) -> &[CompletedEntry] {
        &self.entries
    }
}

/// Active registry that reads from disk but rejects every write.
struct ReadOnlyRegistry {
    inner: CsvActiveRegistry,
}

impl ActiveRegistry for ReadOnlyRegistry {
    fn load(&mut self) -> RepoResult<Vec<ControlEntry>> {
        self.inner.load()
    }

    fn append(&mut self, _entry: &ControlEntry) -> RepoResult<()> {
        Err(RepoError::Io {
            path: self.inner.path().to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }

    fn remove_at(&mut self, index: usize) -> RepoResult<ControlEntry> {
        self.inner.remove_at(index)
    }

    fn entries(&self) -> &[ControlEntry] {
        self.inner.entries()
    }
}

fn at(d: u32, hh: u32, mm: u32, ss: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 7, d)
        .and_then(|date| date.and_hms_opt(hh, mm, ss))
        .unwrap()
}

fn csv_service(
    dir: &Path,
    clock: &TestClock,
) -> ControlService<CsvActiveRegistry, CsvCompletionLog, TestClock> {
    ControlService::with_clock(
        CsvActiveRegistry::new(dir.join("data.csv")),
        CsvCompletionLog::new(dir.join("completed.csv")),
        clock.clone(),
    )
}

#[test]
fn register_appends_trimmed_entry_stamped_now() {
    let dir = tempfile::tempdir().unwrap();
    let mut service = ControlService::new(
        CsvActiveRegistry::new(dir.path().join("data.csv")),
        CsvCompletionLog::new(dir.path().join("completed.csv")),
    );

    let before = Local::now().naive_local() - Duration::seconds(1);
    let created = service.register(" Unit-3 ", " A ").unwrap();
    let after = Local::now().naive_local() + Duration::seconds(1);

    let active = service.list_active().unwrap();
    assert_eq!(active, vec![created.clone()]);
    assert_eq!(created.equipment_name, "Unit-3");
    assert_eq!(created.unit_name, "A");
    let stamped = created.registered_at.parse().unwrap();
    assert!(stamped >= before && stamped <= after);
}

#[test]
fn register_rejects_missing_fields_without_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(1, 9, 0, 0));
    let mut service = csv_service(dir.path(), &clock);
    service.register("Unit-1", "A").unwrap();

    for (equipment, unit) in [("", "x"), ("x", ""), ("", ""), ("   ", "x")] {
        let err = service.register(equipment, unit).unwrap_err();
        assert!(matches!(err, ControlServiceError::Validation(_)));
    }

    assert_eq!(service.list_active().unwrap().len(), 1);
}

#[test]
fn duplicates_are_permitted() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(1, 9, 0, 0));
    let mut service = csv_service(dir.path(), &clock);
    service.register("Unit-1", "A").unwrap();
    service.register("Unit-1", "A").unwrap();
    assert_eq!(service.list_active().unwrap().len(), 2);
}

#[test]
fn register_complete_delete_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(3, 8, 0, 5));
    let mut service = csv_service(dir.path(), &clock);

    service.register("Unit-3", "A").unwrap();
    clock.set(at(3, 8, 1, 0));
    service.register("Unit-3", "B").unwrap();

    let active = service.list_active().unwrap();
    let units: Vec<&str> = active.iter().map(|e| e.unit_name.as_str()).collect();
    assert_eq!(units, vec!["A", "B"]);

    clock.set(at(3, 9, 30, 0));
    let done = service.complete(0).unwrap();
    assert_eq!(done.equipment_name, "Unit-3");
    assert_eq!(done.unit_name, "A");
    assert_eq!(done.registered_at.as_str(), "2025-07-03 08:00:05");
    assert_eq!(done.completed_at.as_str(), "2025-07-03 09:30:00");

    let active = service.list_active().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].unit_name, "B");

    let listing = service.list_completed_on(None).unwrap();
    assert_eq!(listing.entries, vec![done]);

    let removed = service.delete(0).unwrap();
    assert_eq!(removed.unit_name, "B");
    assert!(service.list_active().unwrap().is_empty());
    assert_eq!(service.list_completed_on(None).unwrap().entries.len(), 1);
}

#[test]
fn delete_adds_nothing_to_completed() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(3, 8, 0, 0));
    let mut service = csv_service(dir.path(), &clock);
    service.register("Unit-3", "A").unwrap();
    service.register("Unit-3", "B").unwrap();

    service.delete(1).unwrap();
    let active = service.list_active().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].unit_name, "A");
    assert!(service.distinct_registered_dates().unwrap().is_empty());
}

#[test]
fn stale_index_is_reported_for_complete_and_delete() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(3, 8, 0, 0));
    let mut service = csv_service(dir.path(), &clock);
    service.register("Unit-3", "A").unwrap();

    assert!(matches!(
        service.complete(1).unwrap_err(),
        ControlServiceError::StaleIndex { index: 1, len: 1 }
    ));
    assert!(matches!(
        service.delete(5).unwrap_err(),
        ControlServiceError::StaleIndex { index: 5, len: 1 }
    ));
    assert_eq!(service.list_active().unwrap().len(), 1);
}

#[test]
fn operations_see_writes_from_another_instance() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(3, 8, 0, 0));
    let mut first = csv_service(dir.path(), &clock);
    let mut second = csv_service(dir.path(), &clock);

    first.register("Unit-3", "A").unwrap();
    second.register("Unit-3", "B").unwrap();
    first.delete(0).unwrap();

    let remaining = second.list_active().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].unit_name, "B");
}

#[test]
fn failed_log_append_keeps_entry_active() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(3, 8, 0, 0));
    let mut service = ControlService::with_clock(
        CsvActiveRegistry::new(dir.path().join("data.csv")),
        BrokenLog::default(),
        clock,
    );
    service.register("Unit-3", "A").unwrap();

    let err = service.complete(0).unwrap_err();
    assert!(matches!(err, ControlServiceError::Persistence(_)));

    let active = service.list_active().unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].unit_name, "A");
    assert!(service.completion_log().entries().is_empty());
}

#[test]
fn missing_files_yield_empty_views() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(3, 8, 0, 0));
    let mut service = csv_service(dir.path(), &clock);

    assert!(service.list_active().unwrap().is_empty());
    let listing = service.list_completed_on(None).unwrap();
    assert!(listing.is_empty());
    assert_eq!(listing.date, None);
    assert_eq!(listing.bounds, None);

    let explicit = service
        .list_completed_on(NaiveDate::from_ymd_opt(2025, 7, 3))
        .unwrap();
    assert!(explicit.is_empty());
}

#[test]
fn completed_view_defaults_to_today_then_latest_date() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(1, 9, 0, 0));
    let mut service = csv_service(dir.path(), &clock);

    service.register("Unit-1", "A").unwrap();
    clock.set(at(4, 9, 0, 0));
    service.register("Unit-4", "B").unwrap();
    clock.set(at(6, 9, 0, 0));
    service.complete(0).unwrap();
    service.complete(0).unwrap();

    let today_missing = service.list_completed_on(None).unwrap();
    assert_eq!(today_missing.date, NaiveDate::from_ymd_opt(2025, 7, 4));
    assert_eq!(
        today_missing.bounds,
        Some(DateBounds {
            min: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            max: NaiveDate::from_ymd_opt(2025, 7, 4).unwrap(),
        })
    );
    assert_eq!(today_missing.entries.len(), 1);
    assert_eq!(today_missing.entries[0].equipment_name, "Unit-4");

    clock.set(at(1, 17, 0, 0));
    let today_present = service.list_completed_on(None).unwrap();
    assert_eq!(today_present.date, NaiveDate::from_ymd_opt(2025, 7, 1));
    assert_eq!(today_present.entries[0].equipment_name, "Unit-1");
}

#[test]
fn explicit_date_filters_by_registration_date() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(2, 23, 59, 0));
    let mut service = csv_service(dir.path(), &clock);
    service.register("Unit-2", "late").unwrap();
    clock.set(at(3, 0, 1, 0));
    service.complete(0).unwrap();

    let on_registration = service
        .list_completed_on(NaiveDate::from_ymd_opt(2025, 7, 2))
        .unwrap();
    assert_eq!(on_registration.entries.len(), 1);

    let on_completion = service
        .list_completed_on(NaiveDate::from_ymd_opt(2025, 7, 3))
        .unwrap();
    assert!(on_completion.is_empty());
    assert_eq!(on_completion.date, NaiveDate::from_ymd_opt(2025, 7, 3));
}

#[test]
fn completion_time_is_never_before_registration() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(5, 12, 0, 0));
    let mut service = csv_service(dir.path(), &clock);
    service.register("Unit-5", "A").unwrap();

    clock.set(at(5, 11, 0, 0));
    let done = service.complete(0).unwrap();
    assert!(done.completed_at.parse().unwrap() >= done.registered_at.parse().unwrap());
}

#[test]
fn completion_log_snapshot_is_reachable_after_complete() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(5, 12, 0, 0));
    let mut service = csv_service(dir.path(), &clock);
    service.register("Unit-5", "A").unwrap();
    service.complete(0).unwrap();

    assert_eq!(service.completion_log().entries().len(), 1);
    assert!(service.active_registry().entries().is_empty());
}

#[test]
fn complete_copies_unparseable_registration_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("data.csv"),
        "설비명,Unit명,등록일시\nUnit-9,Z,sometime last week\n",
    )
    .unwrap();
    let clock = TestClock::at(at(8, 14, 20, 33));
    let mut service = csv_service(dir.path(), &clock);

    let done = service.complete(0).unwrap();
    assert_eq!(done.registered_at.as_str(), "sometime last week");
    assert_eq!(done.completed_at.as_str(), "2025-07-08 14:20:33");
    assert!(service.list_active().unwrap().is_empty());

    let mut reopened = CsvCompletionLog::new(dir.path().join("completed.csv"));
    let stored = reopened.load().unwrap();
    assert_eq!(stored, vec![done]);
    assert!(reopened.distinct_registered_dates().is_empty());
}

#[test]
fn register_write_failure_is_persistence_and_leaves_active_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let clock = TestClock::at(at(3, 8, 0, 0));
    csv_service(dir.path(), &clock)
        .register("Unit-3", "A")
        .unwrap();

    let mut service = ControlService::with_clock(
        ReadOnlyRegistry {
            inner: CsvActiveRegistry::new(dir.path().join("data.csv")),
        },
        CsvCompletionLog::new(dir.path().join("completed.csv")),
        clock,
    );
    let before = service.list_active().unwrap();

    let err = service.register("Unit-3", "B").unwrap_err();
    assert!(matches!(err, ControlServiceError::Persistence(_)));
    assert_eq!(service.list_active().unwrap(), before);
    assert_eq!(before.len(), 1);
}
