//! Error taxonomy for one poll cycle.
//!
//! Everything here is fatal for the cycle except [`MissingMapping`], which
//! only drops the affected row.

use thiserror::Error;

/// Transport failure or non-success response from an upstream endpoint.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// Payload did not have the expected shape or encoding.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("response body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("'{field}' string not found in response")]
    MissingField { field: &'static str },

    #[error("odds row {index} has {count} fields, expected 7 or 8: '{content}'")]
    FieldCount {
        index: usize,
        count: usize,
        content: String,
    },

    #[error("mapping pair {index} is malformed: '{pair}'")]
    MalformedPair { index: usize, pair: String },
}

/// A literal inside an odds row could not be parsed. Indicates upstream corruption.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AssembleError {
    #[error("event '{id}' has a non-numeric start time '{value}'")]
    StartTime { id: String, value: String },

    #[error("event '{id}' has a malformed scores field '{value}': {reason}")]
    Scores {
        id: String,
        value: String,
        reason: &'static str,
    },
}

/// A closed enumeration received a value it does not know.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognised {kind} value '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// A row references a key the mapping table cannot resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MissingMapping {
    #[error("no mapping for {field} key '{key}'")]
    Key { field: &'static str, key: String },

    #[error("{field} key '{key}' maps to an {source}")]
    Value {
        field: &'static str,
        key: String,
        #[source]
        source: UnknownVariant,
    },
}

/// Anything that aborts an extraction cycle.
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("fetching {what} failed: {source}")]
    Fetch {
        what: &'static str,
        #[source]
        source: FetchError,
    },

    #[error("decoding {what} failed: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: DecodeError,
    },

    #[error(transparent)]
    Assemble(#[from] AssembleError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} is set but empty")]
    Empty { name: &'static str },

    #[error("invalid value for {name}: '{value}'")]
    InvalidValue { name: &'static str, value: String },
}
