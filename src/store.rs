use crate::events::CallEvent;
use chrono::{DateTime, Local, NaiveDate};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// How long a freshly called counter keeps its highlight styling.
const HIGHLIGHT_DURATION: Duration = Duration::from_secs(5);

/// "Currently serving" state for one counter. An absent ticket means idle.
#[derive(Debug, Clone, Default)]
pub struct CounterSnapshot {
    pub counter_id: i64,
    pub ticket_number: Option<String>,
    pub ticket_type_code: Option<String>,
    pub counter_label: Option<String>,
    pub called_at: Option<DateTime<Local>>,
    highlight_until: Option<Instant>,
}

impl CounterSnapshot {
    pub fn serving(
        counter_id: i64,
        ticket_number: String,
        ticket_type_code: String,
        counter_label: String,
        called_at: DateTime<Local>,
    ) -> Self {
        Self {
            counter_id,
            ticket_number: Some(ticket_number),
            ticket_type_code: Some(ticket_type_code),
            counter_label: Some(counter_label),
            called_at: Some(called_at),
            highlight_until: None,
        }
    }

    pub fn idle(counter_id: i64) -> Self {
        Self {
            counter_id,
            ..Self::default()
        }
    }

    /// A snapshot only counts as serving if it was called today; yesterday's
    /// calls are idle even when the fields were never cleared.
    pub fn is_serving_on(&self, today: NaiveDate) -> bool {
        match (&self.ticket_number, &self.called_at) {
            (Some(_), Some(at)) => at.date_naive() == today,
            _ => false,
        }
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlight_until
            .map(|until| Instant::now() < until)
            .unwrap_or(false)
    }
}

/// Map of counter id to its serving snapshot, reconciled from push events
/// and from periodic authoritative pulls. Mutated only by the dispatch task.
#[derive(Debug, Default)]
pub struct CounterStore {
    counters: HashMap<i64, CounterSnapshot>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one push/fallback call event: that counter now serves the
    /// event's ticket and is highlighted for HIGHLIGHT_DURATION.
    pub fn reconcile_from_event(&mut self, ev: &CallEvent) {
        let mut snapshot = CounterSnapshot::serving(
            ev.counter_id,
            ev.ticket_number.clone(),
            ev.ticket_type_code.clone(),
            ev.counter_label.clone(),
            ev.occurred_at,
        );
        snapshot.highlight_until = Some(Instant::now() + HIGHLIGHT_DURATION);
        self.counters.insert(ev.counter_id, snapshot);
    }

    /// Replace the whole map with an authoritative pull. Counters whose
    /// tickets were completed or cancelled server-side disappear here even
    /// if no push event was seen; this is the backstop for missed events.
    pub fn reconcile_from_pull(&mut self, snapshots: Vec<CounterSnapshot>) {
        self.counters = snapshots
            .into_iter()
            .map(|s| (s.counter_id, s))
            .collect();
    }

    /// Snapshot for one counter; idle when unknown or stale.
    pub fn get(&self, counter_id: i64) -> CounterSnapshot {
        let today = Local::now().date_naive();
        match self.counters.get(&counter_id) {
            Some(s) if s.is_serving_on(today) => s.clone(),
            _ => CounterSnapshot::idle(counter_id),
        }
    }

    /// All counters currently serving a same-day ticket, ordered by id.
    pub fn active(&self) -> Vec<CounterSnapshot> {
        let today = Local::now().date_naive();
        let mut active: Vec<CounterSnapshot> = self
            .counters
            .values()
            .filter(|s| s.is_serving_on(today))
            .cloned()
            .collect();
        active.sort_by_key(|s| s.counter_id);
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn call(counter_id: i64, ticket: &str) -> CallEvent {
        CallEvent {
            ticket_number: ticket.into(),
            ticket_type_code: "A".into(),
            counter_id,
            counter_label: format!("Loket {}", counter_id),
            occurred_at: Local::now(),
        }
    }

    #[test]
    fn event_sets_snapshot_and_highlight() {
        let mut store = CounterStore::new();
        store.reconcile_from_event(&call(3, "A007"));

        let snap = store.get(3);
        assert_eq!(snap.ticket_number.as_deref(), Some("A007"));
        assert!(snap.is_highlighted());
        assert_eq!(store.active().len(), 1);
    }

    #[test]
    fn unknown_counter_is_idle() {
        let store = CounterStore::new();
        let snap = store.get(9);
        assert!(snap.ticket_number.is_none());
        assert!(!snap.is_highlighted());
    }

    #[test]
    fn at_most_one_snapshot_per_counter() {
        let mut store = CounterStore::new();
        store.reconcile_from_event(&call(3, "A007"));
        store.reconcile_from_event(&call(3, "A008"));

        assert_eq!(store.active().len(), 1);
        assert_eq!(store.get(3).ticket_number.as_deref(), Some("A008"));
    }

    #[test]
    fn empty_pull_idles_everything() {
        let mut store = CounterStore::new();
        store.reconcile_from_event(&call(1, "A001"));
        store.reconcile_from_event(&call(2, "B001"));

        store.reconcile_from_pull(Vec::new());

        assert!(store.get(1).ticket_number.is_none());
        assert!(store.get(2).ticket_number.is_none());
        assert!(store.active().is_empty());
    }

    #[test]
    fn pull_replaces_rather_than_merges() {
        let mut store = CounterStore::new();
        store.reconcile_from_event(&call(1, "A001"));
        store.reconcile_from_event(&call(2, "B001"));

        store.reconcile_from_pull(vec![CounterSnapshot::serving(
            2,
            "B002".into(),
            "B".into(),
            "Loket 2".into(),
            Local::now(),
        )]);

        assert!(store.get(1).ticket_number.is_none());
        assert_eq!(store.get(2).ticket_number.as_deref(), Some("B002"));
    }

    #[test]
    fn previous_day_snapshots_are_idle() {
        let mut store = CounterStore::new();
        let mut ev = call(4, "C010");
        ev.occurred_at = Local::now()
            .checked_sub_days(Days::new(1))
            .unwrap_or_else(Local::now);
        store.reconcile_from_event(&ev);

        assert!(store.get(4).ticket_number.is_none());
        assert!(store.active().is_empty());
    }
}
