//! Domain types produced by the assembler and held by the state store.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sport {
    Football,
    Basketball,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Football => "FOOTBALL",
            Sport::Basketball => "BASKETBALL",
        }
    }
}

impl FromStr for Sport {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FOOTBALL" => Ok(Sport::Football),
            "BASKETBALL" => Ok(Sport::Basketball),
            _ => Err(UnknownVariant::new("sport", s)),
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of an event as published upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Pre,
    Live,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pre => "PRE",
            Status::Live => "LIVE",
        }
    }
}

impl FromStr for Status {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PRE" => Ok(Status::Pre),
            "LIVE" => Ok(Status::Live),
            _ => Err(UnknownVariant::new("status", s)),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status as tracked by the store. `Removed` is only ever assigned there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistorizedStatus {
    Pre,
    Live,
    Removed,
}

impl HistorizedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistorizedStatus::Pre => "PRE",
            HistorizedStatus::Live => "LIVE",
            HistorizedStatus::Removed => "REMOVED",
        }
    }

    /// The live status, or `None` for a tombstone.
    pub fn live(&self) -> Option<Status> {
        match self {
            HistorizedStatus::Pre => Some(Status::Pre),
            HistorizedStatus::Live => Some(Status::Live),
            HistorizedStatus::Removed => None,
        }
    }
}

impl From<Status> for HistorizedStatus {
    fn from(status: Status) -> Self {
        match status {
            Status::Pre => HistorizedStatus::Pre,
            Status::Live => HistorizedStatus::Live,
        }
    }
}

impl fmt::Display for HistorizedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase of an event a score is tracked under.
///
/// Ordering puts `Current` first, then numbered periods ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Period {
    Current,
    Numbered(u32),
}

const PERIOD_PREFIX: &str = "PERIOD_";

impl FromStr for Period {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "CURRENT" {
            return Ok(Period::Current);
        }
        // Canonical digits only, so the label survives a display round trip.
        s.strip_prefix(PERIOD_PREFIX)
            .filter(|n| n.bytes().all(|b| b.is_ascii_digit()) && !(n.len() > 1 && n.starts_with('0')))
            .and_then(|n| n.parse::<u32>().ok())
            .map(Period::Numbered)
            .ok_or_else(|| UnknownVariant::new("period", s))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Current => f.write_str("CURRENT"),
            Period::Numbered(n) => write!(f, "{}{}", PERIOD_PREFIX, n),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Score {
    pub home: u32,
    pub away: u32,
}

impl Score {
    pub fn new(home: u32, away: u32) -> Self {
        Self { home, away }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.home, self.away)
    }
}

pub type Scores = BTreeMap<Period, Score>;

/// A fully resolved event from one extraction cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SportEvent {
    pub id: String,
    pub sport: Sport,
    pub competition: String,
    /// Epoch milliseconds.
    pub start_time_ts: i64,
    pub home_competitor: String,
    pub away_competitor: String,
    pub status: Status,
    pub scores: Scores,
}

/// A stored event, possibly tombstoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SportEventHistorized {
    pub id: String,
    pub sport: Sport,
    pub competition: String,
    pub start_time_ts: i64,
    pub home_competitor: String,
    pub away_competitor: String,
    pub status: HistorizedStatus,
    pub scores: Scores,
}

impl SportEventHistorized {
    pub fn is_removed(&self) -> bool {
        self.status == HistorizedStatus::Removed
    }

    /// Same record with its status forced to `Removed`; all other fields frozen.
    pub fn tombstoned(self) -> Self {
        Self {
            status: HistorizedStatus::Removed,
            ..self
        }
    }

    /// Back to a live event, unless tombstoned.
    pub fn to_live(&self) -> Option<SportEvent> {
        let status = self.status.live()?;
        Some(SportEvent {
            id: self.id.clone(),
            sport: self.sport,
            competition: self.competition.clone(),
            start_time_ts: self.start_time_ts,
            home_competitor: self.home_competitor.clone(),
            away_competitor: self.away_competitor.clone(),
            status,
            scores: self.scores.clone(),
        })
    }
}

impl From<SportEvent> for SportEventHistorized {
    fn from(event: SportEvent) -> Self {
        Self {
            id: event.id,
            sport: event.sport,
            competition: event.competition,
            start_time_ts: event.start_time_ts,
            home_competitor: event.home_competitor,
            away_competitor: event.away_competitor,
            status: event.status.into(),
            scores: event.scores,
        }
    }
}
