use ft8seq::{
    log::worked::{LogEntry, LogPager, WorkedLog},
    types::Band,
};

fn entry(call: &str) -> LogEntry {
    LogEntry::new(Band::B20m, call, -7, -12)
}

fn calls(page: &[&LogEntry]) -> Vec<String> {
    page.iter().map(|e| e.call().to_string()).collect()
}

#[test]
fn log_line_puts_received_before_sent() {
    let e = LogEntry::new(Band::B40m, "W1ABC", -7, -12);
    assert_eq!(e.line(), "40 W1ABC -12 -7");
    assert_eq!(e.sent(), -7);
    assert_eq!(e.received(), -12);
    assert_eq!(e.band(), Band::B40m);
}

#[test]
fn log_line_drops_reports_that_do_not_fit() {
    let e = LogEntry::new(Band::B20m, "VK2/W1ABCDEFG", -7, -12);
    assert_eq!(e.line(), "20 VK2/W1ABCDEF -12");
    assert_eq!(e.call(), "VK2/W1ABCDEFG");

    let e = LogEntry::new(Band::B20m, "VK2/W1ABCDEFG", -7, -120);
    assert_eq!(e.line(), "20 VK2/W1ABCDEF -120");
}

#[test]
fn append_overwrites_oldest_once_full() {
    let mut log = WorkedLog::with_capacity(3);
    for call in ["K1A", "K1B", "K1C", "K1D", "K1E"] {
        log.append(entry(call));
    }
    assert_eq!(log.len(), 3);
    assert_eq!(log.total_written(), 5);
    assert_eq!(log.capacity(), 3);

    let page = log.page(0, 10).expect("first page");
    assert_eq!(calls(&page), ["K1E", "K1D", "K1C"]);
    assert!(!log.worked_before("K1A"));
    assert!(log.worked_before("k1c"));
    assert_eq!(log.latest().map(|e| e.call()), Some("K1E"));
}

#[test]
fn worked_before_survives_partial_eviction() {
    let mut log = WorkedLog::with_capacity(2);
    log.append(entry("W1ABC"));
    log.append(entry("W1ABC"));
    log.append(entry("K2XYZ"));
    assert!(log.worked_before("W1ABC"));

    log.append(entry("N3AAA"));
    assert!(!log.worked_before("W1ABC"));
    assert!(log.worked_before("K2XYZ"));
}

#[test]
fn paging_stops_past_stored_entries() {
    let mut log = WorkedLog::default();
    assert!(log.is_empty());
    assert_eq!(log.page(0, 10).map(|p| p.len()), Some(0));
    assert!(log.page(1, 10).is_none());

    for i in 0..10 {
        log.append(entry(&format!("K{i}AA")));
    }
    assert_eq!(log.page(0, 10).map(|p| p.len()), Some(10));
    assert_eq!(log.page(1, 10).map(|p| p.len()), Some(0));
    assert!(log.page(2, 10).is_none());
}

#[test]
fn pager_walks_pages_then_rewinds() {
    let mut log = WorkedLog::default();
    for i in 0..12 {
        log.append(entry(&format!("K{i}AA")));
    }
    let mut pager = LogPager::new(10);

    let first = pager.next_page(&log).expect("page 0");
    assert_eq!(first.len(), 10);
    assert_eq!(first[0].call(), "K11AA");

    let second = pager.next_page(&log).expect("page 1");
    assert_eq!(second.len(), 2);
    assert_eq!(second[1].call(), "K0AA");
    assert_eq!(pager.current_page(), 2);

    assert!(pager.next_page(&log).is_none());
    assert_eq!(pager.current_page(), 0);
    assert_eq!(pager.next_page(&log).map(|p| p.len()), Some(10));

    pager.reset();
    assert_eq!(pager.current_page(), 0);
}
