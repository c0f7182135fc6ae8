use crate::events::CallEvent;
use crate::store::CounterStore;
use chrono::{DateTime, Local};
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RecentCallEntry {
    pub ticket_number: String,
    pub counter_label: String,
    pub called_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub ticket_number: String,
    pub ticket_type_code: String,
    pub counter_label: String,
    pub called_at: DateTime<Local>,
}

/// Bounded recent-calls and history views plus the current-call banner and
/// waiting-count gauge. Append-with-eviction only; newest first.
#[derive(Debug)]
pub struct DisplayBoard {
    recent: VecDeque<RecentCallEntry>,
    history: VecDeque<HistoryEntry>,
    recent_capacity: usize,
    history_capacity: usize,
    current: Option<RecentCallEntry>,
    waiting: i64,
}

impl DisplayBoard {
    pub fn new(recent_capacity: usize, history_capacity: usize) -> Self {
        Self {
            recent: VecDeque::with_capacity(recent_capacity),
            history: VecDeque::with_capacity(history_capacity),
            recent_capacity: recent_capacity.max(1),
            history_capacity: history_capacity.max(1),
            current: None,
            waiting: 0,
        }
    }

    /// Push onto the recent list. A ticket equal to the current head is
    /// dropped: the same call arriving from both the push and fallback
    /// paths must not produce two rows.
    pub fn add_recent(&mut self, ev: &CallEvent) {
        self.push_recent(RecentCallEntry {
            ticket_number: ev.ticket_number.clone(),
            counter_label: ev.counter_label.clone(),
            called_at: ev.occurred_at,
        });
    }

    pub fn push_recent(&mut self, entry: RecentCallEntry) {
        if self
            .recent
            .front()
            .map(|head| head.ticket_number == entry.ticket_number)
            .unwrap_or(false)
        {
            return;
        }
        self.recent.push_front(entry);
        while self.recent.len() > self.recent_capacity {
            self.recent.pop_back();
        }
    }

    /// Push onto the history view, with the same head dedup and eviction.
    pub fn add_history(&mut self, ev: &CallEvent) {
        if self
            .history
            .front()
            .map(|head| head.ticket_number == ev.ticket_number)
            .unwrap_or(false)
        {
            return;
        }
        self.history.push_front(HistoryEntry {
            ticket_number: ev.ticket_number.clone(),
            ticket_type_code: ev.ticket_type_code.clone(),
            counter_label: ev.counter_label.clone(),
            called_at: ev.occurred_at,
        });
        while self.history.len() > self.history_capacity {
            self.history.pop_back();
        }
    }

    /// The call whose announcement just started.
    pub fn set_current(&mut self, ticket_number: String, counter_label: String) {
        self.current = Some(RecentCallEntry {
            ticket_number,
            counter_label,
            called_at: Local::now(),
        });
    }

    pub fn set_waiting(&mut self, count: i64) {
        self.waiting = count;
    }

    pub fn recent(&self) -> &VecDeque<RecentCallEntry> {
        &self.recent
    }

    pub fn history(&self) -> &VecDeque<HistoryEntry> {
        &self.history
    }

    /// Write the board to stdout. Called on every state change and on a
    /// periodic tick so the relative-time labels stay fresh with no new
    /// data.
    pub fn render(&self, store: &CounterStore, connected: bool) {
        let now = Local::now();
        println!();
        println!("================ ANTRIAN ================");
        println!(
            "{}  |  {}",
            now.format("%A, %d %B %Y %H:%M:%S"),
            if connected { "Terhubung" } else { "Polling Mode" }
        );
        match &self.current {
            Some(call) => println!(
                ">>> {}  Menuju {}",
                call.ticket_number, call.counter_label
            ),
            None => println!(">>> ---"),
        }
        println!("Menunggu: {}", self.waiting);

        let active = store.active();
        if !active.is_empty() {
            println!("-- Loket --");
            for snap in &active {
                let label = snap
                    .counter_label
                    .clone()
                    .unwrap_or_else(|| format!("Loket {}", snap.counter_id));
                let ticket = snap.ticket_number.clone().unwrap_or_default();
                let marker = if snap.is_highlighted() { " *" } else { "" };
                println!("  {:<12} {}{}", label, ticket, marker);
            }
        }

        if !self.recent.is_empty() {
            println!("-- Panggilan Terakhir --");
            for entry in &self.recent {
                println!(
                    "  {:<8} {:<12} {}",
                    entry.ticket_number,
                    entry.counter_label,
                    time_ago(entry.called_at, now)
                );
            }
        }
        if !self.history.is_empty() {
            println!("Riwayat: {} panggilan tercatat", self.history.len());
        }
        println!("=========================================");
    }
}

/// Relative "time ago" label in Indonesian.
pub fn time_ago(at: DateTime<Local>, now: DateTime<Local>) -> String {
    let secs = (now - at).num_seconds().max(0);
    if secs < 60 {
        "baru saja".to_string()
    } else if secs < 3600 {
        format!("{} menit yang lalu", secs / 60)
    } else {
        format!("{} jam yang lalu", secs / 3600)
    }
}
