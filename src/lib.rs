//! FT8 auto-sequencing: message classification and formatting, the contact
//! state machine, slot timing and the worked-contact log.
//!
//! # Examples
//!
//! Driving the sequencer directly:
//! ```
//! use ft8seq::{
//!     decode::DecodedRecord,
//!     engine::{AutoSequencer, QsoState, SequencerOptions},
//! };
//!
//! let mut seq = AutoSequencer::new(SequencerOptions::default());
//! seq.initialize("MYCALL", "FN20");
//! seq.start_general_call();
//! assert_eq!(seq.next_transmission_text().as_deref(), Some("CQ MYCALL FN20"));
//!
//! let answer = DecodedRecord::new("MYCALL", "W1ABC", "FN31", -7, 1);
//! assert!(seq.on_decode(&answer));
//! assert_eq!(seq.state(), QsoState::Report);
//! assert_eq!(seq.next_transmission_text().as_deref(), Some("W1ABC MYCALL -7"));
//! ```
//!
//! Runtime usage with a SQLite contact journal:
//! ```no_run
//! use std::sync::Arc;
//!
//! use ft8seq::{
//!     config::StationConfig,
//!     log::sqlite::SqliteContactSink,
//!     runtime::handle::{RuntimeConfig, spawn_station},
//!     scheduler::SystemClock,
//!     station::Station,
//! };
//!
//! # #[tokio::main]
//! # async fn main() {
//! let config = StationConfig::load("station.json").expect("config");
//! let sink = SqliteContactSink::open("contacts.db").expect("open sqlite");
//! let mut station = Station::new(config, 0).expect("station");
//! station.resume_contact_seq(sink.latest_seq().expect("latest seq"));
//!
//! let handle = spawn_station(
//!     station,
//!     Arc::new(SystemClock::new()),
//!     Some(Box::new(sink)),
//!     RuntimeConfig::default(),
//! );
//! handle.start_cq().await.expect("cq");
//! handle.shutdown().await.expect("shutdown");
//! # }
//! ```
#![deny(missing_docs)]

/// Station configuration.
pub mod config;
/// Decoded message records.
pub mod decode;
/// Contact state machine and its transition tables.
pub mod engine;
/// Worked list, contact records and persistence.
pub mod log;
/// Message kinds, classification and formatting.
pub mod message;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Slot timing.
pub mod scheduler;
/// Control loop tying sequencer and scheduler together.
pub mod station;
/// Bounded text buffers.
pub mod text;
/// Shared primitive types and enums.
pub mod types;
