//! FSD network observer
//!
//! Connects to an FSD server as an observer, decodes pilot position reports
//! into a table of latest known state per callsign, and pushes that table to
//! a collector over HTTP on a fixed cadence.
//!
//! Data flow: socket bytes -> [`fsd::LineFramer`] -> [`fsd::parse_line`] ->
//! [`client_table::ClientTable`] -> [`push::PushRelay`] -> collector.

pub mod client_table;
pub mod config;
pub mod fsd;
pub mod observer;
pub mod push;
pub mod session;
pub mod state;

pub use client_table::ClientTable;
pub use config::{Config, ConfigError};
pub use observer::Observer;
