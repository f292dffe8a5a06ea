use ft8seq::scheduler::{
    ManualClock, SlotClock, SlotConfig, SlotScheduler, TimeoutHandler, TxStart,
};

#[derive(Default)]
struct Ticks(u32);

impl TimeoutHandler for Ticks {
    fn on_slot_timeout(&mut self) {
        self.0 += 1;
    }
}

fn scheduler(epoch: u64) -> SlotScheduler {
    SlotScheduler::new(SlotConfig::default(), epoch)
}

#[test]
fn boundaries_follow_period() {
    let mut s = scheduler(1_000);
    let mut ticks = Ticks::default();
    assert_eq!(s.current_parity(), 0);

    let u = s.update(15_999, &mut ticks);
    assert_eq!(u.boundary, None);

    let u = s.update(16_000, &mut ticks);
    assert_eq!(u.boundary, Some(1));
    assert!(!u.timed_out);
    assert_eq!(s.slot_index(), 1);

    let u = s.update(61_000, &mut ticks);
    assert_eq!(u.boundary, Some(0));
    assert_eq!(s.slot_index(), 4);
    assert_eq!(ticks.0, 0);
}

#[test]
fn armed_message_waits_for_its_parity() {
    let mut s = scheduler(0);
    let mut ticks = Ticks::default();
    s.arm(1);
    assert!(s.is_pending());

    assert_eq!(s.update(5_000, &mut ticks).started, None);

    let u = s.update(15_000, &mut ticks);
    assert_eq!(
        u.started,
        Some(TxStart {
            parity: 1,
            symbol_offset: 0
        })
    );
    assert!(!s.is_pending());
    assert!(s.is_transmitting());
}

#[test]
fn late_start_carries_symbol_offset() {
    let mut s = scheduler(0);
    let mut ticks = Ticks::default();
    s.arm(1);
    let u = s.update(15_000 + 28 * 160 + 159, &mut ticks);
    assert_eq!(u.started.map(|t| t.symbol_offset), Some(28));
}

#[test]
fn closed_window_defers_to_next_matching_slot() {
    let mut s = scheduler(0);
    let mut ticks = Ticks::default();
    let _ = s.update(15_000, &mut ticks);
    s.arm(1);

    assert_eq!(s.update(15_000 + 29 * 160, &mut ticks).started, None);
    assert!(s.is_pending());
    assert_eq!(s.update(30_000, &mut ticks).started, None);

    let u = s.update(45_100, &mut ticks);
    assert_eq!(u.started.map(|t| t.symbol_offset), Some(0));
}

#[test]
fn timeout_fires_only_after_own_transmission() {
    let mut s = scheduler(0);
    let mut ticks = Ticks::default();
    s.arm(1);
    assert!(s.update(15_000, &mut ticks).started.is_some());

    let u = s.update(30_000, &mut ticks);
    assert!(u.timed_out);
    assert_eq!(ticks.0, 1);
    assert!(!s.is_transmitting());

    let u = s.update(45_000, &mut ticks);
    assert!(!u.timed_out);
    assert_eq!(ticks.0, 1);
}

#[test]
fn cancel_drops_pending_transmission() {
    let mut s = scheduler(0);
    let mut ticks = Ticks::default();
    s.arm(1);
    s.cancel();
    assert!(!s.is_pending());
    assert_eq!(s.update(15_000, &mut ticks).started, None);
}

#[test]
fn decode_bookkeeping_resets_each_slot() {
    let mut s = scheduler(0);
    let mut ticks = Ticks::default();
    s.mark_decoded();
    assert!(s.decoded_this_slot());
    let _ = s.update(14_000, &mut ticks);
    assert!(s.decoded_this_slot());
    let _ = s.update(15_000, &mut ticks);
    assert!(!s.decoded_this_slot());
}

#[test]
fn resync_realigns_slot_zero() {
    let mut s = scheduler(0);
    let mut ticks = Ticks::default();
    let _ = s.update(20_000, &mut ticks);
    assert_eq!(s.current_parity(), 1);

    s.resync(20_000);
    assert_eq!(s.slot_index(), 0);
    assert_eq!(s.current_parity(), 0);
    assert_eq!(s.update(34_999, &mut ticks).boundary, None);
    assert_eq!(s.update(35_000, &mut ticks).boundary, Some(1));
}

#[test]
fn manual_clock_is_shared_between_clones() {
    let clock = ManualClock::new(100);
    let other = clock.clone();
    clock.advance(50);
    assert_eq!(other.now_ms(), 150);
    other.set(15_000);
    assert_eq!(clock.now_ms(), 15_000);
}
