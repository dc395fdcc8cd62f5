//! Joins decoded odds rows with the mapping table into domain events.

use std::collections::HashMap;
use std::str::FromStr;

use tracing::warn;

use crate::codec::OddsRow;
use crate::error::{AssembleError, MissingMapping, UnknownVariant};
use crate::model::{Period, Score, Scores, SportEvent};

/// Symbolic key -> human-readable value, rebuilt from scratch on every fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingTable {
    entries: HashMap<String, String>,
}

impl MappingTable {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, field: &'static str, key: &str) -> Result<&str, MissingMapping> {
        self.entries
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| MissingMapping::Key {
                field,
                key: key.to_string(),
            })
    }

    /// Resolve and parse into a closed enumeration.
    pub fn resolve_as<T>(&self, field: &'static str, key: &str) -> Result<T, MissingMapping>
    where
        T: FromStr<Err = UnknownVariant>,
    {
        self.resolve(field, key)?
            .parse()
            .map_err(|source| MissingMapping::Value {
                field,
                key: key.to_string(),
                source,
            })
    }
}

impl From<HashMap<String, String>> for MappingTable {
    fn from(entries: HashMap<String, String>) -> Self {
        Self::new(entries)
    }
}

enum RowFailure {
    Missing(MissingMapping),
    Malformed(AssembleError),
}

impl From<MissingMapping> for RowFailure {
    fn from(e: MissingMapping) -> Self {
        RowFailure::Missing(e)
    }
}

impl From<AssembleError> for RowFailure {
    fn from(e: AssembleError) -> Self {
        RowFailure::Malformed(e)
    }
}

/// Build the event list for one cycle.
///
/// Rows referencing an unknown key are logged and dropped; malformed literals
/// abort the whole batch. The row `id` is passed through without lookup.
pub fn assemble(rows: &[OddsRow], mappings: &MappingTable) -> Result<Vec<SportEvent>, AssembleError> {
    let mut events = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        match assemble_row(row, mappings) {
            Ok(event) => events.push(event),
            Err(RowFailure::Missing(e)) => {
                warn!(row = index, content = %row, "Skipping odds row: {}", e);
            }
            Err(RowFailure::Malformed(e)) => return Err(e),
        }
    }

    Ok(events)
}

fn assemble_row(row: &OddsRow, mappings: &MappingTable) -> Result<SportEvent, RowFailure> {
    // Literals first: corruption must fail the batch even when a key is also missing.
    let start_time_ts = Some(row.start_time.as_str())
        .filter(|t| is_digits(t.strip_prefix('-').unwrap_or(*t)))
        .and_then(|t| t.parse::<i64>().ok())
        .ok_or_else(|| AssembleError::StartTime {
            id: row.id.clone(),
            value: row.start_time.clone(),
        })?;
    let raw_scores = match &row.scores {
        Some(encoded) => parse_scores(&row.id, encoded)?,
        None => Vec::new(),
    };

    let mut scores = Scores::new();
    for (period_key, score) in raw_scores {
        let period: Period = mappings.resolve_as("period", period_key)?;
        scores.insert(period, score);
    }

    Ok(SportEvent {
        id: row.id.clone(),
        sport: mappings.resolve_as("sport", &row.sport)?,
        competition: mappings.resolve("competition", &row.competition)?.to_string(),
        start_time_ts,
        home_competitor: mappings.resolve("home competitor", &row.home)?.to_string(),
        away_competitor: mappings.resolve("away competitor", &row.away)?.to_string(),
        status: mappings.resolve_as("status", &row.status)?,
        scores,
    })
}

/// Split `key@home:away|key@home:away` into unresolved period keys and scores.
fn parse_scores<'a>(id: &str, encoded: &'a str) -> Result<Vec<(&'a str, Score)>, AssembleError> {
    let malformed = |reason| AssembleError::Scores {
        id: id.to_string(),
        value: encoded.to_string(),
        reason,
    };

    encoded
        .split('|')
        .map(|record| -> Result<(&'a str, Score), AssembleError> {
            let (period_key, pair) = record
                .split_once('@')
                .filter(|(key, pair)| !key.is_empty() && !pair.contains('@'))
                .ok_or_else(|| malformed("period record is not 'key@home:away'"))?;
            let (home, away) = pair
                .split_once(':')
                .filter(|(_, away)| !away.contains(':'))
                .ok_or_else(|| malformed("score is not 'home:away'"))?;
            let home = Some(home)
                .filter(|h| is_digits(h))
                .and_then(|h| h.parse::<u32>().ok())
                .ok_or_else(|| malformed("home score is not a non-negative integer"))?;
            let away = Some(away)
                .filter(|a| is_digits(a))
                .and_then(|a| a.parse::<u32>().ok())
                .ok_or_else(|| malformed("away score is not a non-negative integer"))?;
            Ok((period_key, Score::new(home, away)))
        })
        .collect()
}

/// Plain ASCII digits; rejects the sign prefixes `str::parse` would accept.
fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
