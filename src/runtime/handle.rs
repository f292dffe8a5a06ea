use std::sync::Arc;

use tokio::{
    sync::{Mutex, broadcast, mpsc, oneshot},
    time::{self, Duration, Instant, MissedTickBehavior},
};
use tracing::{debug, warn};

use crate::{
    decode::DecodedRecord,
    engine::QsoState,
    log::{ContactSink, PersistError, StoredContact, worked::LogEntry},
    scheduler::SlotClock,
    station::{PollOutcome, Station, StationError, StationStatus},
    text::MessageText,
    types::ContactSeq,
};

use super::events::StationEvent;

/// Failure of a [`StationHandle`] request.
#[derive(Debug)]
pub enum RuntimeError {
    /// The station refused the request.
    Station(StationError),
    /// A completed contact could not be handed to, or written by, the journal.
    Persist(PersistError),
    /// The station loop is gone.
    ChannelClosed,
}

impl From<StationError> for RuntimeError {
    fn from(value: StationError) -> Self {
        Self::Station(value)
    }
}

impl From<PersistError> for RuntimeError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

/// Station loop and persistence worker tuning.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Slot clock polling period; 0 leaves polling to [`StationHandle::poll`].
    pub poll_interval_ms: u64,
    /// Flush the sink after every contact instead of batching.
    pub flush_on_contact: bool,
    /// Longest a batched contact waits before it is written.
    pub batch_max_latency_ms: u64,
    /// Contacts that may wait for the persistence worker.
    pub persist_queue_bound: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 20,
            flush_on_contact: true,
            batch_max_latency_ms: 75,
            persist_queue_bound: 64,
        }
    }
}

/// Cloneable handle to a running station loop.
#[derive(Clone)]
pub struct StationHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<StationEvent>,
}

enum Command {
    Decodes {
        records: Vec<DecodedRecord>,
        resp: oneshot::Sender<Result<bool, RuntimeError>>,
    },
    Select {
        index: usize,
        resp: oneshot::Sender<Result<bool, RuntimeError>>,
    },
    StartCq {
        resp: oneshot::Sender<Result<bool, RuntimeError>>,
    },
    Abort {
        resp: oneshot::Sender<()>,
    },
    SetBeacon {
        beacon: bool,
        resp: oneshot::Sender<()>,
    },
    Resync {
        resp: oneshot::Sender<()>,
    },
    Poll {
        resp: oneshot::Sender<Result<PollOutcome, RuntimeError>>,
    },
    NextLogPage {
        resp: oneshot::Sender<Option<Vec<LogEntry>>>,
    },
    Status {
        resp: oneshot::Sender<StationStatus>,
    },
    Flush {
        resp: oneshot::Sender<Result<ContactSeq, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<Result<(), RuntimeError>>,
    },
}

enum PersistMsg {
    Contact(StoredContact),
    Flush {
        resp: oneshot::Sender<Result<ContactSeq, PersistError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// What the loop last reported, so only changes are published.
#[derive(PartialEq, Eq)]
struct Observed {
    state: QsoState,
    retry_count: u8,
    queued: Option<MessageText>,
}

impl Observed {
    fn of(station: &Station) -> Self {
        Self {
            state: station.sequencer().state(),
            retry_count: station.sequencer().context().retry_count(),
            queued: station.tx_status().queued,
        }
    }
}

struct StationLoop {
    station: Station,
    clock: Arc<dyn SlotClock>,
    events_tx: broadcast::Sender<StationEvent>,
    persist_tx: Option<mpsc::Sender<PersistMsg>>,
    observed: Observed,
    last_logged: ContactSeq,
    /// Journal failure hit with no caller to report it to; surfaces on the next flush.
    deferred: Option<RuntimeError>,
}

/// Moves `station` onto its own task and returns the handle that drives it.
///
/// Completed contacts go to `sink` on a separate worker, so slow storage
/// never delays the slot clock.
pub fn spawn_station(
    station: Station,
    clock: Arc<dyn SlotClock>,
    sink: Option<Box<dyn ContactSink>>,
    config: RuntimeConfig,
) -> StationHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(256);
    let (events_tx, _) = broadcast::channel::<StationEvent>(1024);

    let (persist_tx, mut durable_rx) = if let Some(sink) = sink {
        let (persist_tx, persist_rx) = mpsc::channel::<PersistMsg>(config.persist_queue_bound.max(1));
        let (durable_tx, durable_rx) = mpsc::unbounded_channel::<Result<ContactSeq, PersistError>>();
        spawn_persistence_worker(sink, persist_rx, durable_tx, config.clone());
        (Some(persist_tx), Some(durable_rx))
    } else {
        (None, None)
    };

    let mut state = StationLoop {
        observed: Observed::of(&station),
        station,
        clock,
        events_tx: events_tx.clone(),
        persist_tx,
        last_logged: 0,
        deferred: None,
    };

    tokio::spawn(async move {
        let polling = config.poll_interval_ms > 0;
        let mut ticker = time::interval(Duration::from_millis(config.poll_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => {
                    let Some(cmd) = cmd else { break; };
                    let done = state.handle_command(cmd).await;
                    if done {
                        break;
                    }
                }
                _ = ticker.tick(), if polling => {
                    state.poll();
                    state.publish_deferred();
                }
                durable = recv_durable(&mut durable_rx) => {
                    match durable {
                        Some(Ok(seq)) => {
                            let _ = state.events_tx.send(StationEvent::DurableUpTo { seq });
                        }
                        Some(Err(err)) => warn!(?err, "contact journal write failed"),
                        None => durable_rx = None,
                    }
                }
            }
        }
        debug!("station loop stopped");
    });

    StationHandle { cmd_tx, events_tx }
}

impl StationHandle {
    /// Receives every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StationEvent> {
        self.events_tx.subscribe()
    }

    /// Feeds one decode cycle. Returns whether a transmission got queued.
    pub async fn decodes(&self, records: Vec<DecodedRecord>) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::Decodes { records, resp }).await?
    }

    /// Operator selection of decode `index` from the last batch.
    pub async fn select(&self, index: usize) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::Select { index, resp }).await?
    }

    /// Starts calling CQ. Returns whether a transmission got queued.
    pub async fn start_cq(&self) -> Result<bool, RuntimeError> {
        self.request(|resp| Command::StartCq { resp }).await?
    }

    /// Drops the contact in progress and anything queued.
    pub async fn abort(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Abort { resp }).await
    }

    /// Turns unattended operation on or off.
    pub async fn set_beacon(&self, beacon: bool) -> Result<(), RuntimeError> {
        self.request(|resp| Command::SetBeacon { beacon, resp }).await
    }

    /// Re-aligns slot 0 to the clock's current time.
    pub async fn resync(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Resync { resp }).await
    }

    /// Runs the slot clock once, outside the automatic interval.
    pub async fn poll(&self) -> Result<PollOutcome, RuntimeError> {
        self.request(|resp| Command::Poll { resp }).await?
    }

    /// Next page of the worked list; `None` wraps back to the first page.
    pub async fn next_log_page(&self) -> Result<Option<Vec<LogEntry>>, RuntimeError> {
        self.request(|resp| Command::NextLogPage { resp }).await
    }

    /// Point-in-time status.
    pub async fn status(&self) -> Result<StationStatus, RuntimeError> {
        self.request(|resp| Command::Status { resp }).await
    }

    /// Waits until every contact logged so far is durable.
    pub async fn flush(&self) -> Result<ContactSeq, RuntimeError> {
        self.request(|resp| Command::Flush { resp }).await?
    }

    /// Flushes the journal and stops the loop.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.request(|resp| Command::Shutdown { resp }).await?
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(command(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

impl StationLoop {
    async fn handle_command(&mut self, cmd: Command) -> bool {
        match cmd {
            Command::Decodes { records, resp } => {
                let queued = self.station.on_decodes(records);
                let _ = resp.send(self.settle(queued));
            }
            Command::Select { index, resp } => {
                let out = match self.station.select(index) {
                    Ok(armed) => self.settle(armed),
                    Err(err) => Err(err.into()),
                };
                let _ = resp.send(out);
            }
            Command::StartCq { resp } => {
                let queued = self.station.start_cq();
                let _ = resp.send(self.settle(queued));
            }
            Command::Abort { resp } => {
                self.station.abort();
                self.publish_deferred();
                let _ = resp.send(());
            }
            Command::SetBeacon { beacon, resp } => {
                self.station.set_beacon(beacon);
                self.publish_deferred();
                let _ = resp.send(());
            }
            Command::Resync { resp } => {
                self.station.resync(self.clock.now_ms());
                self.publish_deferred();
                let _ = resp.send(());
            }
            Command::Poll { resp } => {
                let outcome = self.poll();
                let _ = resp.send(self.settle(outcome));
            }
            Command::NextLogPage { resp } => {
                let _ = resp.send(self.station.next_log_page());
            }
            Command::Status { resp } => {
                let _ = resp.send(self.station.status());
            }
            Command::Flush { resp } => {
                let dropped = self.deferred.take();
                let published = self.publish();
                let out = if let Some(err) = dropped {
                    Err(err)
                } else if let Err(err) = published {
                    Err(err)
                } else if let Some(tx) = &self.persist_tx {
                    let (flush_tx, flush_rx) = oneshot::channel();
                    if tx.send(PersistMsg::Flush { resp: flush_tx }).await.is_err() {
                        Err(RuntimeError::ChannelClosed)
                    } else {
                        flush_rx
                            .await
                            .map_err(|_| RuntimeError::ChannelClosed)
                            .and_then(|r| r.map_err(RuntimeError::from))
                    }
                } else {
                    Ok(self.last_logged)
                };
                let _ = resp.send(out);
            }
            Command::Shutdown { resp } => {
                self.publish_deferred();
                let out = if let Some(tx) = &self.persist_tx {
                    let (done_tx, done_rx) = oneshot::channel();
                    if tx.send(PersistMsg::Shutdown { resp: done_tx }).await.is_err() {
                        Err(RuntimeError::ChannelClosed)
                    } else {
                        done_rx.await.map_err(|_| RuntimeError::ChannelClosed)
                    }
                } else {
                    Ok(())
                };
                let _ = resp.send(out);
                return true;
            }
        }

        false
    }

    fn poll(&mut self) -> PollOutcome {
        let outcome = self.station.poll(self.clock.now_ms());
        if let Some(parity) = outcome.slot.boundary {
            let _ = self.events_tx.send(StationEvent::SlotBoundary {
                slot_index: self.station.scheduler().slot_index(),
                parity,
                timed_out: outcome.slot.timed_out,
            });
        }
        if let Some(tx) = &outcome.transmission {
            let _ = self.events_tx.send(StationEvent::TxStarted {
                text: tx.text.to_string(),
                parity: tx.parity,
                symbol_offset: tx.symbol_offset,
            });
        }
        outcome
    }

    /// Publishes, then returns `value` unless a completed contact missed the journal.
    fn settle<T>(&mut self, value: T) -> Result<T, RuntimeError> {
        self.publish().map(|()| value)
    }

    fn publish_deferred(&mut self) {
        if let Err(err) = self.publish() {
            self.deferred.get_or_insert(err);
        }
    }

    /// Emits events for whatever changed and hands new contacts to persistence.
    ///
    /// Every drained contact is offered to the journal; the first refusal is returned.
    fn publish(&mut self) -> Result<(), RuntimeError> {
        let now = Observed::of(&self.station);
        if now.state != self.observed.state || now.retry_count != self.observed.retry_count {
            let _ = self.events_tx.send(StationEvent::StateChanged {
                state: now.state,
                label: self.station.state_label().to_string(),
            });
        }
        if now.queued != self.observed.queued {
            if let Some(text) = &now.queued {
                let _ = self.events_tx.send(StationEvent::TxQueued {
                    text: text.to_string(),
                    parity: self.station.tx_status().target_parity,
                });
            }
        }
        self.observed = now;

        let mut result = Ok(());
        for stored in self.station.drain_contacts() {
            let seq = stored.seq;
            self.last_logged = self.last_logged.max(seq);
            let _ = self.events_tx.send(StationEvent::ContactLogged {
                seq,
                peer_call: stored.contact.peer_call.clone(),
            });
            match &self.persist_tx {
                Some(tx) => {
                    if let Err(err) = enqueue_persist(tx, stored) {
                        warn!(seq, ?err, "contact not journaled");
                        if result.is_ok() {
                            result = Err(err);
                        }
                    }
                }
                None => {
                    let _ = self.events_tx.send(StationEvent::DurableUpTo { seq });
                }
            }
        }
        result
    }
}

fn enqueue_persist(tx: &mpsc::Sender<PersistMsg>, stored: StoredContact) -> Result<(), RuntimeError> {
    tx.try_send(PersistMsg::Contact(stored))
        .map_err(|err| RuntimeError::Persist(PersistError::Message(format!("persist queue error: {err}"))))
}

async fn recv_durable(
    rx: &mut Option<mpsc::UnboundedReceiver<Result<ContactSeq, PersistError>>>,
) -> Option<Result<ContactSeq, PersistError>> {
    match rx.as_mut() {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

fn spawn_persistence_worker(
    sink: Box<dyn ContactSink>,
    mut rx: mpsc::Receiver<PersistMsg>,
    durable_tx: mpsc::UnboundedSender<Result<ContactSeq, PersistError>>,
    config: RuntimeConfig,
) {
    let sink = Arc::new(Mutex::new(sink));
    tokio::spawn(async move {
        let latency = Duration::from_millis(config.batch_max_latency_ms);
        let mut buf = Vec::<StoredContact>::new();
        let mut deadline = Instant::now() + latency;
        let mut last_durable: ContactSeq = 0;

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                        break;
                    };

                    match msg {
                        PersistMsg::Contact(stored) => {
                            if buf.is_empty() {
                                deadline = Instant::now() + latency;
                            }
                            buf.push(stored);
                            if config.flush_on_contact {
                                let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            }
                        }
                        PersistMsg::Flush { resp } => {
                            let result = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(result.map(|_| last_durable));
                        }
                        PersistMsg::Shutdown { resp } => {
                            let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, true).await;
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                _ = time::sleep_until(deadline), if !buf.is_empty() => {
                    let _ = flush_buf(&sink, &mut buf, &mut last_durable, &durable_tx, false).await;
                }
            }
        }
    });
}

async fn flush_buf(
    sink: &Arc<Mutex<Box<dyn ContactSink>>>,
    buf: &mut Vec<StoredContact>,
    last_durable: &mut ContactSeq,
    durable_tx: &mpsc::UnboundedSender<Result<ContactSeq, PersistError>>,
    call_flush: bool,
) -> Result<(), PersistError> {
    if buf.is_empty() {
        if call_flush {
            let sink_ref = Arc::clone(sink);
            tokio::task::spawn_blocking(move || {
                let mut sink = sink_ref.blocking_lock();
                sink.flush()
            })
            .await
            .map_err(|e| PersistError::Message(format!("join error: {e}")))??;
        }
        return Ok(());
    }

    let contacts = std::mem::take(buf);
    let sink_ref = Arc::clone(sink);
    let append_res: Result<ContactSeq, PersistError> = tokio::task::spawn_blocking(move || {
        let mut sink = sink_ref.blocking_lock();
        let seq = sink.append_contacts(&contacts)?;
        if call_flush {
            sink.flush()?;
        }
        Ok(seq)
    })
    .await
    .map_err(|e| PersistError::Message(format!("join error: {e}")))?;

    match append_res {
        Ok(seq) => {
            *last_durable = (*last_durable).max(seq);
            let _ = durable_tx.send(Ok(*last_durable));
            Ok(())
        }
        Err(err) => {
            let _ = durable_tx.send(Err(PersistError::Message(format!("append failed: {err:?}"))));
            Err(err)
        }
    }
}
