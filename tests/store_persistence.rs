use chrono::{DateTime, Duration, TimeZone, Utc};
use rusqlite::{Connection, params};
use tempfile::TempDir;

use visitlog::{
    core::store::{StoreError, VisitRecordStore, VisitStore},
    op::Op,
    persist::{
        VisitJournal,
        memory::MemoryJournal,
        sqlite::{SqliteJournal, VISITS_KEY},
    },
    types::{VisitId, VisitPurpose},
    visit::{CloseVisit, ValidationError, VisitRecord},
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

fn record(id: &str, name: &str, minutes: i64) -> VisitRecord {
    VisitRecord {
        id: VisitId::new(id),
        visitor_name: name.to_string(),
        person_to_meet: Some("Dev Patel".to_string()),
        purpose: Some(VisitPurpose::Meeting),
        free_text_reason: None,
        phone_number: Some(format!("0412 555 {minutes:03}")),
        photo_reference: Some("data:image/jpeg;base64,AAAA".to_string()),
        check_in_time: t0() + Duration::minutes(minutes),
        check_out_time: None,
    }
}

#[test]
fn sqlite_reload_preserves_order_and_fields() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("visits.db");

    let mut store = VisitStore::open(SqliteJournal::open(&db_path).expect("open sqlite"));
    store.append(record("v-1", "Asha Rao", 0)).expect("append1");
    store.append(record("v-2", "Ben Ode", 5)).expect("append2");
    let mut other = record("v-3", "Cara Lim", 10);
    other.purpose = Some(VisitPurpose::Other);
    other.free_text_reason = Some("Fire inspection".to_string());
    other.phone_number = None;
    store.append(other).expect("append3");
    store
        .update(&VisitId::new("v-2"), CloseVisit { at: t0() + Duration::minutes(50) })
        .expect("close");

    let before = store.load_all();
    drop(store);

    let reopened = VisitStore::open(SqliteJournal::open(&db_path).expect("reopen"));
    assert_eq!(reopened.load_all(), before);
    assert_eq!(
        reopened.records().iter().map(|r| r.id.as_str()).collect::<Vec<_>>(),
        vec!["v-1", "v-2", "v-3"]
    );
    assert_eq!(reopened.active().len(), 2);
}

#[test]
fn duplicate_id_is_rejected_without_writing() {
    let journal = MemoryJournal::new();
    let mut store = VisitStore::open(journal.clone());
    store.append(record("dup", "Asha Rao", 0)).expect("append");

    let err = store.append(record("dup", "Someone Else", 1)).expect_err("duplicate");
    assert!(matches!(
        err,
        StoreError::Validation(ValidationError::DuplicateId(ref id)) if id.as_str() == "dup"
    ));
    assert_eq!(store.len(), 1);
    assert_eq!(journal.history().expect("history").len(), 1);
}

#[test]
fn update_rejects_missing_and_closed_records() {
    let mut store = VisitStore::in_memory();
    store.append(record("v-1", "Asha Rao", 0)).expect("append");

    let missing = store
        .update(&VisitId::new("nope"), CloseVisit { at: t0() })
        .expect_err("missing");
    assert!(matches!(missing, StoreError::NotFound(_)));

    let closed = store
        .update(&VisitId::new("v-1"), CloseVisit { at: t0() + Duration::hours(1) })
        .expect("close");
    assert_eq!(closed.check_out_time, Some(t0() + Duration::hours(1)));

    let again = store
        .update(&VisitId::new("v-1"), CloseVisit { at: t0() + Duration::hours(2) })
        .expect_err("already closed");
    assert!(matches!(again, StoreError::AlreadyClosed(_)));
    assert_eq!(
        store.get(&VisitId::new("v-1")).and_then(|r| r.check_out_time),
        Some(t0() + Duration::hours(1))
    );
}

#[test]
fn close_time_never_precedes_check_in() {
    let mut store = VisitStore::in_memory();
    store.append(record("v-1", "Asha Rao", 30)).expect("append");

    let closed = store
        .update(&VisitId::new("v-1"), CloseVisit { at: t0() })
        .expect("close");
    assert_eq!(closed.check_out_time, Some(closed.check_in_time));
}

#[test]
fn failed_write_leaves_store_unchanged() {
    let journal = MemoryJournal::new();
    let mut store = VisitStore::open(journal.clone());
    store.append(record("v-1", "Asha Rao", 0)).expect("append");

    journal.set_failing(true);
    assert!(matches!(
        store.append(record("v-2", "Ben Ode", 1)),
        Err(StoreError::Persist(_))
    ));
    assert!(matches!(
        store.update(&VisitId::new("v-1"), CloseVisit { at: t0() + Duration::hours(1) }),
        Err(StoreError::Persist(_))
    ));
    assert_eq!(store.len(), 1);
    assert!(store.get(&VisitId::new("v-1")).expect("v-1").is_active());

    journal.set_failing(false);
    store.append(record("v-2", "Ben Ode", 1)).expect("append after recovery");
    let reopened = VisitStore::open(journal);
    assert_eq!(reopened.len(), 2);
}

#[test]
fn corrupt_blob_loads_empty_and_self_heals() {
    let journal = MemoryJournal::with_blob(b"{ not json".to_vec());
    let mut store = VisitStore::open(journal.clone());
    assert!(store.is_empty());

    store.append(record("v-1", "Asha Rao", 0)).expect("append");
    let reopened = VisitStore::open(journal);
    assert_eq!(reopened.len(), 1);
}

#[test]
fn corrupt_sqlite_blob_does_not_reuse_journal_sequences() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("corrupt.db");

    let mut store = VisitStore::open(SqliteJournal::open(&db_path).expect("open"));
    store.append(record("v-1", "Asha Rao", 0)).expect("append");
    store.append(record("v-2", "Ben Ode", 1)).expect("append");
    drop(store);

    let conn = Connection::open(&db_path).expect("raw open");
    conn.execute(
        "UPDATE kv SET payload = ?1 WHERE key = ?2",
        params![b"\x00garbage".to_vec(), VISITS_KEY],
    )
    .expect("corrupt");
    drop(conn);

    let mut store = VisitStore::open(SqliteJournal::open(&db_path).expect("reopen"));
    assert!(store.is_empty());
    store.append(record("v-3", "Cara Lim", 2)).expect("append after corruption");
    assert_eq!(store.latest_op_seq(), 3);

    let history = store.history().expect("history");
    assert_eq!(history.iter().map(|op| op.seq).collect::<Vec<_>>(), vec![1, 2, 3]);
}

#[test]
fn legacy_bare_array_blob_is_accepted() {
    let legacy = serde_json::json!([
        {
            "id": "42",
            "fullName": "Asha Rao",
            "checkInTime": "2026-03-02T09:00:00Z",
            "checkOutTime": null
        },
        {
            "id": "43",
            "fullName": "Ben Ode",
            "personToMeet": "Dev Patel",
            "checkInTime": "2026-03-02T09:10:00Z",
            "checkOutTime": "2026-03-02T10:00:00Z"
        }
    ]);
    let store = VisitStore::open(MemoryJournal::with_blob(
        serde_json::to_vec(&legacy).expect("encode"),
    ));

    let all = store.load_all();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].visitor_name, "Asha Rao");
    assert!(all[0].is_active());
    assert!(!all[1].is_active());
}

#[test]
fn sqlite_journal_records_audit_events_per_visit() {
    let mut store = VisitStore::open(SqliteJournal::open_in_memory().expect("open"));
    store.append(record("v-1", "Asha Rao", 0)).expect("append1");
    store.append(record("v-2", "Ben Ode", 1)).expect("append2");
    store
        .update(&VisitId::new("v-1"), CloseVisit { at: t0() + Duration::minutes(90) })
        .expect("close");

    let history = store.history().expect("history");
    assert_eq!(history.len(), 3);
    assert!(matches!(&history[0].op, Op::CheckIn { visit } if visit.id.as_str() == "v-1"));
    assert!(matches!(
        &history[2].op,
        Op::CheckOut { id, at } if id.as_str() == "v-1" && *at == t0() + Duration::minutes(90)
    ));
}

#[test]
fn sqlite_events_for_filters_by_visit() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("audit.db");

    let mut store = VisitStore::open(SqliteJournal::open(&db_path).expect("open"));
    store.append(record("v-1", "Asha Rao", 0)).expect("append1");
    store.append(record("v-2", "Ben Ode", 1)).expect("append2");
    store
        .update(&VisitId::new("v-2"), CloseVisit { at: t0() + Duration::minutes(20) })
        .expect("close");
    drop(store);

    let journal = SqliteJournal::open(&db_path).expect("reopen");
    let events = journal.events_for(&VisitId::new("v-2")).expect("events");
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].op.kind(), 1);
    assert_eq!(events[1].op.kind(), 2);
    assert_eq!(journal.latest_seq().expect("latest"), 3);
}
