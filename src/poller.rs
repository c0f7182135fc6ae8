use crate::api::{ApiClient, CalledTicket, CounterDetail};
use crate::app::AppContext;
use crate::dispatch::DispatchMsg;
use crate::events::CallEvent;
use crate::store::CounterSnapshot;
use chrono::Local;
use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Fallback poll cadence while the push channel is down.
const POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Cadence of the authoritative whole-store pull.
const RESYNC_INTERVAL: Duration = Duration::from_secs(10);

/// Dedup state for the fallback path. The key is the ticket number alone:
/// a ticket recalled under the same number is not surfaced again by
/// polling (the push path still announces recalls).
#[derive(Debug, Default)]
pub struct FallbackState {
    last_surfaced: Option<String>,
}

impl FallbackState {
    /// Whether this observation is new; records it either way.
    pub fn observe(&mut self, ticket_number: &str) -> bool {
        if self.last_surfaced.as_deref() == Some(ticket_number) {
            return false;
        }
        self.last_surfaced = Some(ticket_number.to_string());
        true
    }
}

/// Polls the latest called ticket while the push channel is disconnected
/// and feeds synthesized call events into the same dispatch channel the
/// stream uses.
pub fn spawn_fallback(
    ctx: Arc<AppContext>,
    api: Arc<ApiClient>,
    tx: mpsc::UnboundedSender<DispatchMsg>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut state = FallbackState::default();
        loop {
            interval.tick().await;
            if ctx.connected.load(Ordering::SeqCst) {
                continue;
            }
            if let Err(e) = poll_once(&api, &tx, &mut state).await {
                log::warn!("[poller] {}", e);
            }
        }
    })
}

async fn poll_once(
    api: &ApiClient,
    tx: &mpsc::UnboundedSender<DispatchMsg>,
    state: &mut FallbackState,
) -> Result<(), String> {
    if let Some(latest) = api.latest_called().await? {
        if state.observe(&latest.queue_number) {
            if let Some(counter_id) = latest.counter_id {
                let counter = api.counter_detail(counter_id).await?;
                let _ = tx.send(DispatchMsg::Call(CallEvent {
                    ticket_number: latest.queue_number,
                    ticket_type_code: latest.queue_type,
                    counter_id,
                    counter_label: counter.counter_name,
                    occurred_at: latest.called_at.unwrap_or_else(Local::now),
                }));
            }
        }
    }

    let stats = api.stats().await?;
    let _ = tx.send(DispatchMsg::WaitingCount(stats.waiting_queues));
    Ok(())
}

/// Periodic full reconciliation: called-today tickets joined with the
/// active counter list, replacing the store wholesale. This is the
/// backstop for missed or out-of-order push events, so it runs whether or
/// not the push channel is up.
pub fn spawn_resync(api: Arc<ApiClient>, tx: mpsc::UnboundedSender<DispatchMsg>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RESYNC_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match pull_snapshots(&api).await {
                Ok(snapshots) => {
                    let _ = tx.send(DispatchMsg::Resync(snapshots));
                }
                Err(e) => {
                    log::warn!("[poller] resync failed: {}", e);
                }
            }
        }
    })
}

async fn pull_snapshots(api: &ApiClient) -> Result<Vec<CounterSnapshot>, String> {
    let counters = api.active_counters().await?;
    let called = api.called_today().await?;
    Ok(join_snapshots(counters, called))
}

/// Join the authoritative "called today" tickets onto the active counters.
/// Counters with no called ticket are omitted entirely: the store replace
/// leaves them idle. When several tickets point at one counter, the most
/// recently called wins.
fn join_snapshots(counters: Vec<CounterDetail>, called: Vec<CalledTicket>) -> Vec<CounterSnapshot> {
    let mut by_counter: HashMap<i64, CalledTicket> = HashMap::new();
    for ticket in called {
        let Some(counter_id) = ticket.counter_id else {
            continue;
        };
        let newer = by_counter
            .get(&counter_id)
            .map(|held| ticket.called_at > held.called_at)
            .unwrap_or(true);
        if newer {
            by_counter.insert(counter_id, ticket);
        }
    }

    counters
        .into_iter()
        .filter_map(|counter| {
            let ticket = by_counter.remove(&counter.id)?;
            Some(CounterSnapshot::serving(
                counter.id,
                ticket.queue_number,
                ticket.queue_type,
                counter.counter_name,
                ticket.called_at.unwrap_or_else(Local::now),
            ))
        })
        .collect()
}
