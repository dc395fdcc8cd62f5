//! Versioned event state: the live view plus tombstoned history.

use std::collections::BTreeMap;
use std::fmt;

use tracing::info;

use crate::model::{HistorizedStatus, Period, Score, Scores, SportEvent, SportEventHistorized};

/// Contract shared by the base store and its decorators.
pub trait EventStore {
    /// Replace the snapshot with `events`; ids missing from it become `REMOVED`.
    fn update(&mut self, events: Vec<SportEvent>);

    /// Every entry that is not tombstoned.
    fn list(&self) -> Vec<SportEvent>;

    /// Every id ever seen, tombstones included.
    fn historized(&self) -> Vec<SportEventHistorized>;
}

/// Both views are ordered by event id.
#[derive(Debug, Default)]
pub struct SportEventStateStore {
    events: BTreeMap<String, SportEventHistorized>,
}

impl SportEventStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl EventStore for SportEventStateStore {
    fn update(&mut self, events: Vec<SportEvent>) {
        let mut next: BTreeMap<String, SportEventHistorized> = std::mem::take(&mut self.events)
            .into_iter()
            .map(|(id, event)| (id, event.tombstoned()))
            .collect();

        // Full replacement, no field merge. A tombstoned id simply comes back.
        for event in events {
            next.insert(event.id.clone(), event.into());
        }

        self.events = next;
    }

    fn list(&self) -> Vec<SportEvent> {
        self.events.values().filter_map(SportEventHistorized::to_live).collect()
    }

    fn historized(&self) -> Vec<SportEventHistorized> {
        self.events.values().cloned().collect()
    }
}

/// The part of an event that change detection watches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedState {
    pub status: HistorizedStatus,
    pub scores: Scores,
}

pub type StoreSnapshot = BTreeMap<String, WatchedState>;

pub fn snapshot(events: &[SportEventHistorized]) -> StoreSnapshot {
    events
        .iter()
        .map(|event| {
            (
                event.id.clone(),
                WatchedState {
                    status: event.status,
                    scores: event.scores.clone(),
                },
            )
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Status {
        id: String,
        old: HistorizedStatus,
        new: HistorizedStatus,
    },
    Score {
        id: String,
        period: Period,
        old: Score,
        new: Score,
    },
}

impl Change {
    pub fn event_id(&self) -> &str {
        match self {
            Change::Status { id, .. } | Change::Score { id, .. } => id,
        }
    }
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Status { id, old, new } => {
                write!(f, "Event \"{}\" changed status: \"{}\" -> \"{}\"", id, old, new)
            }
            Change::Score { id, old, new, .. } => {
                write!(f, "Score of \"{}\" changed: {} -> {}", id, old, new)
            }
        }
    }
}

/// Diff the ids known before an update against their state after it.
///
/// A period without a prior score, or one that disappeared, produces nothing.
pub fn detect_changes(before: &StoreSnapshot, after: &StoreSnapshot) -> Vec<Change> {
    let mut changes = Vec::new();

    for (id, old) in before {
        let Some(new) = after.get(id) else {
            continue;
        };

        if old.status != new.status {
            changes.push(Change::Status {
                id: id.clone(),
                old: old.status,
                new: new.status,
            });
        }

        for (period, old_score) in &old.scores {
            match new.scores.get(period) {
                Some(new_score) if new_score != old_score => changes.push(Change::Score {
                    id: id.clone(),
                    period: *period,
                    old: *old_score,
                    new: *new_score,
                }),
                _ => {}
            }
        }
    }

    changes
}

/// Wraps a store and logs status and score transitions on every update.
///
/// Update semantics are exactly those of the wrapped store.
#[derive(Debug, Default)]
pub struct ChangeLoggingStore<S> {
    inner: S,
}

impl<S: EventStore> ChangeLoggingStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Update the wrapped store and return what changed.
    pub fn update_with_changes(&mut self, events: Vec<SportEvent>) -> Vec<Change> {
        let before = snapshot(&self.inner.historized());
        self.inner.update(events);
        let after = snapshot(&self.inner.historized());

        let changes = detect_changes(&before, &after);
        for change in &changes {
            match change {
                Change::Status { .. } => info!(event_id = change.event_id(), "{}", change),
                Change::Score { period, .. } => {
                    info!(event_id = change.event_id(), period = %period, "{}", change)
                }
            }
        }
        changes
    }
}

impl<S: EventStore> EventStore for ChangeLoggingStore<S> {
    fn update(&mut self, events: Vec<SportEvent>) {
        self.update_with_changes(events);
    }

    fn list(&self) -> Vec<SportEvent> {
        self.inner.list()
    }

    fn historized(&self) -> Vec<SportEventHistorized> {
        self.inner.historized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Sport, Status};
    use crate::test_support::capture_logs;

    fn event(id: &str, status: Status) -> SportEvent {
        SportEvent {
            id: id.to_string(),
            sport: Sport::Football,
            competition: "La Liga".to_string(),
            start_time_ts: 1234,
            home_competitor: "FC Barcelona".to_string(),
            away_competitor: "Real Madrid".to_string(),
            status,
            scores: Scores::new(),
        }
    }

    fn with_score(mut event: SportEvent, period: Period, home: u32, away: u32) -> SportEvent {
        event.scores.insert(period, Score::new(home, away));
        event
    }

    #[test]
    fn inserts_and_lists_events() {
        let mut store = SportEventStateStore::new();
        let events = vec![event("a", Status::Pre), event("b", Status::Live)];

        store.update(events.clone());
        assert_eq!(store.list(), events);
    }

    #[test]
    fn retains_old_events_as_removed() {
        let mut store = SportEventStateStore::new();
        let event_a = event("a", Status::Pre);
        let event_b = event("b", Status::Live);

        store.update(vec![event_b.clone()]);
        store.update(vec![event_a.clone()]);

        assert_eq!(store.list(), vec![event_a.clone()]);
        assert_eq!(
            store.historized(),
            vec![
                SportEventHistorized::from(event_a),
                SportEventHistorized::from(event_b).tombstoned(),
            ]
        );
    }

    #[test]
    fn tombstones_freeze_last_known_fields() {
        let mut store = SportEventStateStore::new();
        store.update(vec![with_score(event("a", Status::Live), Period::Current, 2, 1)]);
        store.update(vec![]);
        store.update(vec![]);

        let history = store.historized();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_removed());
        assert_eq!(history[0].scores[&Period::Current], Score::new(2, 1));
        assert!(store.list().is_empty());
    }

    #[test]
    fn history_never_shrinks() {
        let mut store = SportEventStateStore::new();
        store.update(vec![event("a", Status::Pre), event("b", Status::Pre)]);
        store.update(vec![event("c", Status::Pre)]);
        store.update(vec![]);
        assert_eq!(store.len(), 3);
        assert!(store.list().is_empty());
    }

    #[test]
    fn removed_id_reenters_on_reappearance() {
        let mut store = SportEventStateStore::new();
        store.update(vec![event("a", Status::Pre)]);
        store.update(vec![]);
        store.update(vec![event("a", Status::Live)]);

        assert_eq!(store.list(), vec![event("a", Status::Live)]);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_replaces_entries_outright() {
        let mut store = SportEventStateStore::new();
        store.update(vec![with_score(event("a", Status::Live), Period::Numbered(1), 1, 0)]);
        store.update(vec![with_score(event("a", Status::Live), Period::Current, 3, 3)]);

        let scores = &store.list()[0].scores;
        assert_eq!(scores.len(), 1);
        assert_eq!(scores[&Period::Current], Score::new(3, 3));
    }

    #[test]
    fn status_change_is_reported_once() {
        let mut store = ChangeLoggingStore::new(SportEventStateStore::new());
        assert!(store.update_with_changes(vec![event("a", Status::Pre)]).is_empty());

        let changes = store.update_with_changes(vec![event("a", Status::Live)]);
        assert_eq!(changes.len(), 1);
        assert_eq!(
            changes[0].to_string(),
            r#"Event "a" changed status: "PRE" -> "LIVE""#
        );
    }

    #[test]
    fn update_logs_one_line_per_change() {
        let mut store = ChangeLoggingStore::new(SportEventStateStore::new());
        let ((), first) = capture_logs(|| store.update(vec![event("a", Status::Pre)]));
        assert!(first.is_empty());

        let ((), logs) = capture_logs(|| store.update(vec![event("a", Status::Live)]));
        assert_eq!(logs.len(), 1);
        assert!(logs[0].contains("INFO"));
        assert!(logs[0].contains(r#"Event "a" changed status: "PRE" -> "LIVE""#));
        assert!(logs[0].contains("event_id=\"a\""));

        let ((), repeat) = capture_logs(|| store.update(vec![event("a", Status::Live)]));
        assert!(repeat.is_empty());
    }

    #[test]
    fn score_change_log_carries_period() {
        let mut store = ChangeLoggingStore::new(SportEventStateStore::new());
        store.update(vec![with_score(event("a", Status::Live), Period::Numbered(2), 0, 0)]);

        let ((), logs) = capture_logs(|| {
            store.update(vec![with_score(event("a", Status::Live), Period::Numbered(2), 1, 0)])
        });
        assert_eq!(logs.len(), 1);
        assert!(logs[0].contains(r#"Score of "a" changed: 0:0 -> 1:0"#));
        assert!(logs[0].contains("period=PERIOD_2"));
    }

    #[test]
    fn unrelated_field_change_is_silent() {
        let mut store = ChangeLoggingStore::new(SportEventStateStore::new());
        store.update(vec![event("a", Status::Pre)]);

        let mut renamed = event("a", Status::Pre);
        renamed.competition = "Copa del Rey".to_string();
        assert!(store.update_with_changes(vec![renamed]).is_empty());
    }

    #[test]
    fn repeated_batch_is_silent() {
        let batch = vec![with_score(event("a", Status::Live), Period::Current, 1, 0)];
        let mut store = ChangeLoggingStore::new(SportEventStateStore::new());
        store.update(batch.clone());
        store.update(vec![with_score(event("a", Status::Live), Period::Current, 2, 0)]);
        store.update(batch.clone());
        assert!(store.update_with_changes(batch).is_empty());
    }

    #[test]
    fn score_changes_are_reported_per_period() {
        let mut store = ChangeLoggingStore::new(SportEventStateStore::new());
        let first = with_score(event("a", Status::Live), Period::Current, 1, 0);
        store.update(vec![first.clone()]);

        let second = with_score(
            with_score(first, Period::Current, 2, 0),
            Period::Numbered(2),
            1,
            0,
        );
        let changes = store.update_with_changes(vec![second]);

        assert_eq!(
            changes,
            vec![Change::Score {
                id: "a".to_string(),
                period: Period::Current,
                old: Score::new(1, 0),
                new: Score::new(2, 0),
            }]
        );
        assert_eq!(changes[0].to_string(), r#"Score of "a" changed: 1:0 -> 2:0"#);
    }

    #[test]
    fn removal_is_reported_as_status_change() {
        let mut store = ChangeLoggingStore::new(SportEventStateStore::new());
        store.update(vec![event("a", Status::Live)]);

        let changes = store.update_with_changes(vec![]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].event_id(), "a");
        assert_eq!(
            changes[0].to_string(),
            r#"Event "a" changed status: "LIVE" -> "REMOVED""#
        );
    }

    #[test]
    fn decorator_keeps_base_semantics() {
        let batches = vec![
            vec![event("a", Status::Pre), event("b", Status::Live)],
            vec![event("b", Status::Pre)],
            vec![event("a", Status::Live)],
        ];

        let mut base = SportEventStateStore::new();
        let mut logged = ChangeLoggingStore::new(SportEventStateStore::new());
        for batch in batches {
            base.update(batch.clone());
            logged.update(batch);
        }

        assert_eq!(base.list(), logged.list());
        assert_eq!(base.historized(), logged.historized());
        assert_eq!(logged.inner().len(), 2);
    }
}
