use proptest::prelude::*;

use ft8seq::{
    decode::DecodedRecord,
    engine::{AutoSequencer, QsoState, SequencerOptions},
};

const CALLS: [&str; 3] = ["W1ABC", "K2XYZ", "N3AAA"];
const FIELDS: [&str; 8] = ["FN31", "-08", "+02", "R-12", "R+01", "RR73", "RRR", "73"];

#[derive(Debug, Clone)]
enum Event {
    Decode { sender: usize, field: usize, snr: i8, to_me: bool },
    Select { sender: usize, field: usize, snr: i8, to_me: bool },
    Tick,
    Render,
    StartCq,
    Beacon(bool),
    Reset,
}

fn event_strategy() -> impl Strategy<Value = Event> {
    let record = (0..CALLS.len(), 0..FIELDS.len(), -24i8..20, any::<bool>());
    prop_oneof![
        4 => record.clone().prop_map(|(sender, field, snr, to_me)| Event::Decode { sender, field, snr, to_me }),
        2 => record.prop_map(|(sender, field, snr, to_me)| Event::Select { sender, field, snr, to_me }),
        3 => Just(Event::Tick),
        3 => Just(Event::Render),
        1 => Just(Event::StartCq),
        1 => any::<bool>().prop_map(Event::Beacon),
        1 => Just(Event::Reset),
    ]
}

fn record(sender: usize, field: usize, snr: i8, to_me: bool) -> DecodedRecord {
    let addressee = if to_me { "MYCALL" } else { "CQ" };
    DecodedRecord::new(addressee, CALLS[sender], FIELDS[field], i32::from(snr), 0)
}

fn check_context(seq: &AutoSequencer) -> Result<(), TestCaseError> {
    let ctx = seq.context();
    prop_assert!(ctx.retry_count() <= ctx.retry_limit());
    if seq.state() == QsoState::Idle {
        prop_assert!(!ctx.logged());
        prop_assert!(ctx.next_tx().is_none());
        let label = seq.state_label();
        prop_assert_eq!(label.as_str(), "");
    }
    Ok(())
}

proptest! {
    #[test]
    fn context_invariants_hold_over_random_traffic(events in prop::collection::vec(event_strategy(), 1..120)) {
        let mut seq = AutoSequencer::new(SequencerOptions::default());
        seq.initialize("MYCALL", "FN20");

        for event in events {
            match event {
                Event::Decode { sender, field, snr, to_me } => {
                    let _ = seq.on_decode(&record(sender, field, snr, to_me));
                }
                Event::Select { sender, field, snr, to_me } => {
                    let armed = seq.on_select(&record(sender, field, snr, to_me));
                    prop_assert!(armed);
                    prop_assert!(seq.context().next_tx().is_some());
                }
                Event::Tick => seq.tick(),
                Event::Render => {
                    let armed = seq.context().next_tx();
                    let text = seq.next_transmission_text();
                    prop_assert_eq!(armed.is_some(), text.is_some());
                    // Rendering the same message again never logs a second time.
                    let before = seq.worked_log().total_written();
                    let _ = seq.next_transmission_text();
                    prop_assert_eq!(seq.worked_log().total_written(), before);
                }
                Event::StartCq => seq.start_general_call(),
                Event::Beacon(on) => seq.set_beacon(on),
                Event::Reset => seq.initialize("MYCALL", "FN20"),
            }
            check_context(&seq)?;
        }

        let logged = seq.drain_contacts();
        prop_assert_eq!(logged.len() as u64, seq.worked_log().total_written());
        prop_assert!(logged.windows(2).all(|w| w[0].seq < w[1].seq));
    }
}
