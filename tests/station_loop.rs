use ft8seq::{
    config::StationConfig,
    decode::DecodedRecord,
    engine::QsoState,
    station::{DecodeHighlight, Station, StationError},
};

fn station() -> Station {
    Station::new(StationConfig::new("MYCALL", "FN20"), 0).expect("station")
}

fn beacon_station() -> Station {
    let mut config = StationConfig::new("MYCALL", "FN20");
    config.beacon = true;
    Station::new(config, 0).expect("station")
}

fn to_me(sender: &str, field: &str, snr: i32, slot: u8) -> DecodedRecord {
    DecodedRecord::new("MYCALL", sender, field, snr, slot)
}

fn cq(sender: &str, grid: &str, snr: i32) -> DecodedRecord {
    DecodedRecord::new("CQ", sender, grid, snr, 0)
}

#[test]
fn invalid_config_is_rejected() {
    assert!(Station::new(StationConfig::new("", "FN20"), 0).is_err());
    assert!(Station::new(StationConfig::new("MYCALL", "ZZ99"), 0).is_err());
}

#[test]
fn selected_cq_runs_to_a_logged_contact() {
    let mut st = station();

    assert!(!st.on_decodes(vec![cq("K2XYZ", "FN42", -3)]));
    assert_eq!(st.highlight(&st.last_decodes()[0]), DecodeHighlight::GeneralCall);
    assert_eq!(st.best_cq_candidate(), Some(0));

    assert_eq!(st.select(0), Ok(true));
    let status = st.tx_status();
    assert_eq!(status.queued.as_deref(), Some("K2XYZ MYCALL FN20"));
    assert_eq!(status.target_parity, 1);

    assert!(st.poll(100).transmission.is_none());
    let out = st.poll(15_000);
    assert_eq!(out.slot.boundary, Some(1));
    let tx = out.transmission.expect("grid goes out");
    assert_eq!(tx.text.as_str(), "K2XYZ MYCALL FN20");
    assert_eq!(tx.symbol_offset, 0);
    assert_eq!(st.tx_status().on_air.as_deref(), Some("K2XYZ MYCALL FN20"));

    // Nobody answered in time: one retry is booked.
    let out = st.poll(30_000);
    assert!(out.slot.timed_out);
    assert_eq!(st.state_label().as_str(), " RPLY tried:1");
    assert_eq!(st.tx_status().on_air, None);

    let _ = st.poll(45_000);
    assert!(st.on_decodes(vec![to_me("K2XYZ", "-10", -5, 0)]));
    assert_eq!(st.sequencer().state(), QsoState::RogerReport);
    let tx = st.poll(45_320).transmission.expect("late ack");
    assert_eq!(tx.text.as_str(), "K2XYZ MYCALL R-5");
    assert_eq!(tx.symbol_offset, 2);

    let _ = st.poll(60_000);
    let _ = st.poll(75_000);
    assert!(st.on_decodes(vec![to_me("K2XYZ", "RR73", -6, 0)]));
    assert_eq!(st.tx_status().queued.as_deref(), Some("K2XYZ MYCALL 73"));

    let contacts = st.drain_contacts();
    assert_eq!(contacts.len(), 1);
    assert_eq!(contacts[0].contact.peer_call, "K2XYZ");
    assert_eq!(contacts[0].contact.sent_report, -5);
    assert_eq!(contacts[0].contact.received_report, -10);

    let page = st.next_log_page().expect("log page");
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].line(), "20 K2XYZ -10 -5");
    assert!(st.next_log_page().is_none());

    assert!(st.poll(75_100).transmission.is_some());
    let _ = st.poll(90_000);
    assert_eq!(st.sequencer().state(), QsoState::Idle);
    assert_eq!(st.state_label().as_str(), "");
}

#[test]
fn one_batch_per_slot_and_none_while_transmitting() {
    let mut st = station();
    assert!(st.start_cq());
    assert_eq!(st.tx_status().queued.as_deref(), Some("CQ MYCALL FN20"));

    assert!(!st.on_decodes(Vec::new()));
    assert!(!st.on_decodes(vec![to_me("W1ABC", "FN31", -7, 0)]));
    assert_eq!(st.sequencer().state(), QsoState::Calling);

    assert!(st.poll(15_000).transmission.is_some());
    assert!(!st.on_decodes(vec![to_me("W1ABC", "FN31", -7, 0)]));
    assert_eq!(st.sequencer().state(), QsoState::Calling);

    assert!(st.poll(30_000).slot.timed_out);
    assert_eq!(st.sequencer().state(), QsoState::Idle);
}

#[test]
fn beacon_calls_cq_and_answers_callers() {
    let mut st = beacon_station();
    assert!(st.on_decodes(Vec::new()));
    assert_eq!(st.sequencer().state(), QsoState::Calling);
    assert_eq!(st.tx_status().target_parity, 1);

    assert!(st.poll(15_000).transmission.is_some());
    assert!(st.poll(30_000).slot.timed_out);
    assert_eq!(st.sequencer().state(), QsoState::Idle);

    let _ = st.poll(45_000);
    assert!(st.on_decodes(vec![to_me("W1ABC", "FN31", -7, 0)]));
    assert_eq!(st.sequencer().state(), QsoState::Report);
    let tx = st.poll(45_200).transmission.expect("report");
    assert_eq!(tx.text.as_str(), "W1ABC MYCALL -7");
    assert_eq!(tx.parity, 1);
}

#[test]
fn beacon_keeps_calling_after_late_sign_off() {
    let mut st = beacon_station();

    // A 73 from a finished contact matches nothing once promoted to Calling.
    assert!(st.on_decodes(vec![to_me("W1ABC", "73", -7, 0)]));
    assert_eq!(st.sequencer().state(), QsoState::Calling);
    assert_eq!(st.tx_status().queued.as_deref(), Some("CQ MYCALL FN20"));

    let mut cqs = 0;
    for slot in 1..=6u64 {
        let out = st.poll(slot * 15_000);
        if out.transmission.is_some() {
            cqs += 1;
        }
        let _ = st.on_decodes(Vec::new());
    }
    assert!(cqs >= 3, "only {cqs} CQs over six slots");
}

#[test]
fn select_outside_batch_fails() {
    let mut st = station();
    assert!(!st.on_decodes(vec![cq("K2XYZ", "FN42", -3)]));
    assert_eq!(st.select(3), Err(StationError::NoSuchDecode(3)));
    assert_eq!(st.sequencer().state(), QsoState::Idle);
}

#[test]
fn abort_clears_queue_and_contact() {
    let mut st = station();
    assert!(st.start_cq());
    st.abort();
    assert_eq!(st.tx_status().queued, None);
    assert!(!st.scheduler().is_pending());
    assert_eq!(st.sequencer().state(), QsoState::Idle);
    assert!(st.poll(15_000).transmission.is_none());
}

#[test]
fn highlights_and_cq_candidate_skip_worked_stations() {
    let mut st = station();
    assert!(!st.on_decodes(vec![to_me("K2XYZ", "RR73", -4, 0)]));
    assert_eq!(st.highlight(&st.last_decodes()[0]), DecodeHighlight::AddressedToMe);
    assert_eq!(st.select(0), Ok(true));
    assert_eq!(st.drain_contacts().len(), 1);

    assert!(st.poll(15_000).transmission.is_some());
    assert!(st.poll(30_000).slot.timed_out);

    assert!(!st.on_decodes(vec![
        cq("K2XYZ", "FN42", 5),
        cq("N3BBB", "FN10", -10),
        cq("W4CCC", "EM73", -2),
        DecodedRecord::new("N3BBB", "W4CCC", "-03", -2, 0),
    ]));
    let batch = st.last_decodes().to_vec();
    assert_eq!(st.highlight(&batch[0]), DecodeHighlight::WorkedCall);
    assert_eq!(st.highlight(&batch[1]), DecodeHighlight::GeneralCall);
    assert_eq!(st.highlight(&batch[3]), DecodeHighlight::Plain);
    assert_eq!(st.best_cq_candidate(), Some(2));
}

#[test]
fn resync_restarts_slot_count() {
    let mut st = station();
    let _ = st.poll(20_000);
    assert_eq!(st.status().parity, 1);
    st.resync(20_000);
    let status = st.status();
    assert_eq!(status.slot_index, 0);
    assert_eq!(status.parity, 0);
    assert_eq!(status.state, QsoState::Idle);
}
