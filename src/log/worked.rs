use std::fmt::Write;

use hashbrown::HashMap;

use crate::{
    text::{LineText, Truncating, push_whole},
    types::{Band, Report},
};

/// Default number of entries kept before the oldest is overwritten.
pub const DEFAULT_CAPACITY: usize = 100;
/// Default number of entries per display page.
pub const DEFAULT_PAGE_ROWS: usize = 10;

/// Summary of one worked station, rendered once into a display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    band: Band,
    call: String,
    sent: Report,
    received: Report,
    line: LineText,
}

impl LogEntry {
    /// Builds an entry and renders its display line.
    pub fn new(band: Band, call: &str, sent: Report, received: Report) -> Self {
        let line = render_line(band, call, sent, received);
        Self {
            band,
            call: call.to_string(),
            sent,
            received,
            line,
        }
    }

    /// Band the contact was made on.
    pub fn band(&self) -> Band {
        self.band
    }

    /// Peer callsign.
    pub fn call(&self) -> &str {
        &self.call
    }

    /// Report we sent.
    pub fn sent(&self) -> Report {
        self.sent
    }

    /// Report we received.
    pub fn received(&self) -> Report {
        self.received
    }

    /// `"<band> <call> <received> <sent>"`, reports dropped when they do not fit.
    pub fn line(&self) -> &str {
        &self.line
    }
}

fn render_line(band: Band, call: &str, sent: Report, received: Report) -> LineText {
    let mut line = LineText::new();
    let head: String = call.chars().take(12).collect();
    let _ = write!(Truncating(&mut line), "{:.3} {head}", band.label());

    let mut piece: heapless::String<8> = heapless::String::new();
    let _ = write!(Truncating(&mut piece), " {received}");
    if !push_whole(&mut line, &piece) {
        return line;
    }

    piece.clear();
    let _ = write!(Truncating(&mut piece), " {sent}");
    let _ = push_whole(&mut line, &piece);
    line
}

/// Append-only circular list of worked stations.
///
/// Never blocks and never fails: once `capacity` entries have been written the
/// oldest one is overwritten.
#[derive(Debug)]
pub struct WorkedLog {
    slots: Vec<Option<LogEntry>>,
    total: u64,
    by_call: HashMap<String, usize>,
}

impl Default for WorkedLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl WorkedLog {
    /// Empty list holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: vec![None; capacity],
            total: 0,
            by_call: HashMap::new(),
        }
    }

    /// Most entries held at once.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Entries ever appended, including evicted ones.
    pub fn total_written(&self) -> u64 {
        self.total
    }

    /// Entries currently held.
    pub fn len(&self) -> usize {
        (self.total as usize).min(self.capacity())
    }

    /// True until the first append.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Adds `entry`, evicting the oldest one when full.
    pub fn append(&mut self, entry: LogEntry) {
        let idx = (self.total % self.capacity() as u64) as usize;
        if let Some(evicted) = self.slots[idx].take() {
            self.forget_call(evicted.call());
        }
        *self.by_call.entry(entry.call().to_ascii_uppercase()).or_insert(0) += 1;
        self.slots[idx] = Some(entry);
        self.total += 1;
    }

    /// True when `call` is among the entries still held.
    pub fn worked_before(&self, call: &str) -> bool {
        self.by_call.contains_key(&call.trim().to_ascii_uppercase())
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<&LogEntry> {
        self.nth_newest(0)
    }

    /// Page `page` of up to `rows` entries, newest first.
    ///
    /// Returns `None` once the page start lies beyond the stored entries.
    pub fn page(&self, page: usize, rows: usize) -> Option<Vec<&LogEntry>> {
        let stored = self.len();
        let start = page.saturating_mul(rows);
        if start > stored {
            return None;
        }
        let end = start.saturating_add(rows).min(stored);
        Some((start..end).filter_map(|i| self.nth_newest(i)).collect())
    }

    fn nth_newest(&self, offset: usize) -> Option<&LogEntry> {
        if offset >= self.len() {
            return None;
        }
        let index = self.total - 1 - offset as u64;
        let idx = (index % self.capacity() as u64) as usize;
        self.slots[idx].as_ref()
    }

    fn forget_call(&mut self, call: &str) {
        let key = call.to_ascii_uppercase();
        if let Some(count) = self.by_call.get_mut(&key) {
            *count -= 1;
            if *count == 0 {
                self.by_call.remove(&key);
            }
        }
    }
}

/// Page cursor for stepping through a [`WorkedLog`] on a display.
#[derive(Debug, Clone)]
pub struct LogPager {
    page: usize,
    rows: usize,
}

impl Default for LogPager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_ROWS)
    }
}

impl LogPager {
    /// Pager at the first page, `rows` entries per page.
    pub fn new(rows: usize) -> Self {
        Self {
            page: 0,
            rows: rows.max(1),
        }
    }

    /// Page the next call returns.
    pub fn current_page(&self) -> usize {
        self.page
    }

    /// Returns the next page and advances, or `None` and rewinds to the first page.
    pub fn next_page(&mut self, log: &WorkedLog) -> Option<Vec<LogEntry>> {
        match log.page(self.page, self.rows) {
            Some(entries) => {
                self.page += 1;
                Some(entries.into_iter().cloned().collect())
            }
            None => {
                self.page = 0;
                None
            }
        }
    }

    /// Back to the first page.
    pub fn reset(&mut self) {
        self.page = 0;
    }
}
