//! Snapshot delivery to the downstream collector

mod client;
mod relay;

pub use client::{Collector, HttpCollector, PushError};
pub use relay::{LiveUpdate, PushRelay};
