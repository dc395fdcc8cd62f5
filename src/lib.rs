//! Sport event ingestion.
//!
//! Polls an upstream odds feed and a symbol-mapping table, decodes both
//! compact text encodings, resolves mapping keys into domain events and keeps
//! a tombstoned history of every event seen.

pub mod assembler;
pub mod codec;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fetcher;
pub mod model;
pub mod server;
pub mod service;
pub mod store;

#[cfg(test)]
mod test_support;

pub use config::Config;
pub use error::{AssembleError, ConfigError, DecodeError, ExtractError, FetchError, MissingMapping};
pub use extractor::SportEventDataExtractor;
pub use model::{HistorizedStatus, Period, Score, Sport, SportEvent, SportEventHistorized, Status};
pub use store::{ChangeLoggingStore, EventStore, SportEventStateStore};
