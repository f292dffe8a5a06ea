use std::sync::Arc;

use rusqlite::{Connection, params};
use tempfile::TempDir;

use ft8seq::{
    config::StationConfig,
    decode::DecodedRecord,
    log::{ContactRecord, ContactSink, StoredContact, sqlite::SqliteContactSink},
    runtime::handle::{RuntimeConfig, spawn_station},
    scheduler::ManualClock,
    station::Station,
    types::Band,
};

fn contact(seq: u64, peer: &str, band: Band) -> StoredContact {
    StoredContact {
        seq,
        contact: ContactRecord {
            own_call: "MYCALL".to_string(),
            own_grid: "FN20".to_string(),
            peer_call: peer.to_string(),
            peer_grid: "FN31".to_string(),
            band,
            sent_report: -7,
            received_report: -12,
            ts_ms: 1_700_000_000_000 + seq,
        },
    }
}

#[test]
fn journal_survives_reopen() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("contacts.db");

    {
        let mut sink = SqliteContactSink::open(&db_path).expect("open sqlite");
        assert_eq!(sink.latest_seq().expect("latest"), 0);
        let last = sink
            .append_contacts(&[contact(1, "W1ABC", Band::B20m), contact(2, "K2XYZ", Band::B40m)])
            .expect("append");
        assert_eq!(last, 2);
        sink.flush().expect("flush");
    }

    let sink = SqliteContactSink::open(&db_path).expect("reopen");
    let loaded = sink.load_contacts().expect("load");
    assert_eq!(loaded, vec![contact(1, "W1ABC", Band::B20m), contact(2, "K2XYZ", Band::B40m)]);
    assert_eq!(sink.latest_seq().expect("latest"), 2);
    assert_eq!(sink.count_for_call("w1abc").expect("count"), 1);
    assert_eq!(sink.load_contacts_after(1).expect("after").len(), 1);
}

#[test]
fn empty_append_reports_latest() {
    let mut sink = SqliteContactSink::open_in_memory().expect("open");
    sink.append_contacts(&[contact(5, "W1ABC", Band::B20m)]).expect("append");
    assert_eq!(sink.append_contacts(&[]).expect("empty"), 5);
}

#[test]
fn unknown_payload_version_is_rejected() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("contacts.db");
    drop(SqliteContactSink::open(&db_path).expect("create"));

    let conn = Connection::open(&db_path).expect("raw open");
    let payload = serde_json::json!({
        "format_version": 99,
        "stored": contact(1, "W1ABC", Band::B20m),
    });
    conn.execute(
        "INSERT INTO contacts(seq, ts_ms, peer_call, band, payload) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![1i64, 0i64, "W1ABC", "20", serde_json::to_vec(&payload).expect("json")],
    )
    .expect("insert");
    drop(conn);

    let sink = SqliteContactSink::open(&db_path).expect("reopen");
    assert!(sink.load_contacts().is_err());
}

#[tokio::test]
async fn runtime_contacts_land_in_journal_and_numbering_resumes() {
    let tmp = TempDir::new().expect("tmp");
    let db_path = tmp.path().join("contacts.db");

    for (round, peer) in ["K2XYZ", "W1ABC"].into_iter().enumerate() {
        let sink = SqliteContactSink::open(&db_path).expect("open");
        let mut station =
            Station::new(StationConfig::new("MYCALL", "FN20"), 0).expect("station");
        station.resume_contact_seq(sink.latest_seq().expect("latest"));

        let cfg = RuntimeConfig {
            poll_interval_ms: 0,
            ..RuntimeConfig::default()
        };
        let handle = spawn_station(station, Arc::new(ManualClock::new(0)), Some(Box::new(sink)), cfg);
        let rr73 = DecodedRecord::new("MYCALL", peer, "RR73", -4, 0);
        assert!(!handle.decodes(vec![rr73]).await.expect("decodes"));
        assert!(handle.select(0).await.expect("select"));
        assert_eq!(handle.flush().await.expect("flush"), round as u64 + 1);
        handle.shutdown().await.expect("shutdown");
    }

    let sink = SqliteContactSink::open(&db_path).expect("reopen");
    let loaded = sink.load_contacts().expect("load");
    let peers: Vec<_> = loaded.iter().map(|c| (c.seq, c.contact.peer_call.as_str())).collect();
    assert_eq!(peers, vec![(1, "K2XYZ"), (2, "W1ABC")]);
}
