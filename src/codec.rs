//! Decoders for the two upstream text encodings.
//!
//! Odds: newline-separated rows of 7 or 8 comma-separated fields, each row
//! optionally terminated by a comma. Mappings: `key:value` pairs separated
//! by semicolons.

use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::error::DecodeError;

pub const ODDS_FIELD: &str = "odds";
pub const MAPPINGS_FIELD: &str = "mappings";

/// Pull the single textual payload field out of a JSON response body.
pub fn decode_envelope(body: &str, field: &'static str) -> Result<String, DecodeError> {
    let value: Value = serde_json::from_str(body)?;
    match value.get(field) {
        Some(Value::String(payload)) => Ok(payload.clone()),
        _ => Err(DecodeError::MissingField { field }),
    }
}

/// One odds row, fields kept verbatim. `scores` is `None` for 7-field rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OddsRow {
    pub id: String,
    pub sport: String,
    pub competition: String,
    pub start_time: String,
    pub home: String,
    pub away: String,
    pub status: String,
    pub scores: Option<String>,
}

impl OddsRow {
    fn from_fields(index: usize, line: &str) -> Result<Self, DecodeError> {
        let fields: Vec<&str> = line.split(',').collect();
        let (head, scores) = match fields.len() {
            7 => (&fields[..], None),
            8 => (&fields[..7], Some(fields[7].to_string())),
            count => {
                return Err(DecodeError::FieldCount {
                    index,
                    count,
                    content: line.to_string(),
                })
            }
        };

        Ok(Self {
            id: head[0].to_string(),
            sport: head[1].to_string(),
            competition: head[2].to_string(),
            start_time: head[3].to_string(),
            home: head[4].to_string(),
            away: head[5].to_string(),
            status: head[6].to_string(),
            scores,
        })
    }
}

/// Re-encodes the row as a comma-joined line, omitting an absent scores field.
impl fmt::Display for OddsRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.id, self.sport, self.competition, self.start_time, self.home, self.away, self.status
        )?;
        if let Some(scores) = &self.scores {
            write!(f, ",{}", scores)?;
        }
        Ok(())
    }
}

/// Decode the whole odds table. A single bad row rejects the batch.
pub fn decode_odds(text: &str) -> Result<Vec<OddsRow>, DecodeError> {
    // Row terminators are stripped per line, never here as well.
    let text = text.strip_suffix('\n').unwrap_or(text);
    if text.is_empty() {
        return Ok(Vec::new());
    }

    text.split('\n')
        .enumerate()
        .map(|(index, line)| {
            let line = line.strip_suffix(',').unwrap_or(line);
            OddsRow::from_fields(index, line)
        })
        .collect()
}

pub fn encode_odds(rows: &[OddsRow]) -> String {
    rows.iter()
        .map(OddsRow::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Decode the mapping table. Duplicate keys: the last occurrence wins.
pub fn decode_mappings(text: &str) -> Result<HashMap<String, String>, DecodeError> {
    let text = text.strip_suffix(';').unwrap_or(text);
    if text.is_empty() {
        return Ok(HashMap::new());
    }

    let mut mappings = HashMap::new();
    for (index, pair) in text.split(';').enumerate() {
        match pair.split_once(':') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                mappings.insert(key.to_string(), value.to_string());
            }
            _ => {
                return Err(DecodeError::MalformedPair {
                    index,
                    pair: pair.to_string(),
                })
            }
        }
    }
    Ok(mappings)
}
