use crate::app::AppContext;
use crate::display::{DisplayBoard, RecentCallEntry};
use crate::events::{AnnouncementJob, CallEvent};
use crate::sequencer::Sequencer;
use crate::settings;
use crate::store::{CounterSnapshot, CounterStore};
use chrono::Local;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Everything that mutates the store or the board goes through this
/// channel: push events, fallback polls, resync pulls, render ticks and the
/// sequencer's job-start feedback. One consumer, so no locks.
#[derive(Debug)]
pub enum DispatchMsg {
    /// A ticket was called (push or fallback path).
    Call(CallEvent),
    /// The sequencer started announcing this job.
    JobStarted(AnnouncementJob),
    /// Waiting-count gauge refresh.
    WaitingCount(i64),
    /// Authoritative whole-map store replacement.
    Resync(Vec<CounterSnapshot>),
    /// Live audio on/off from a settings_updated push event.
    AudioGate(bool),
    /// Periodic re-render to refresh relative-time labels.
    Render,
}

pub fn spawn(
    ctx: Arc<AppContext>,
    seq: Sequencer,
    rx: mpsc::UnboundedReceiver<DispatchMsg>,
) -> JoinHandle<()> {
    tokio::spawn(run(ctx, seq, rx))
}

async fn run(ctx: Arc<AppContext>, seq: Sequencer, mut rx: mpsc::UnboundedReceiver<DispatchMsg>) {
    let (recent_cap, history_cap) = match ctx.settings.lock() {
        Ok(s) => (s.recent_capacity, s.history_capacity),
        Err(_) => (5, 20),
    };
    let mut store = CounterStore::new();
    let mut board = DisplayBoard::new(recent_cap, history_cap);

    while let Some(msg) = rx.recv().await {
        match msg {
            DispatchMsg::Call(ev) => {
                log::info!(
                    "[dispatch] {} called to {} (counter {})",
                    ev.ticket_number,
                    ev.counter_label,
                    ev.counter_id
                );
                store.reconcile_from_event(&ev);
                board.add_history(&ev);
                seq.enqueue(AnnouncementJob::from(&ev));
            }
            DispatchMsg::JobStarted(job) => {
                board.set_current(job.ticket_number.clone(), job.counter_label.clone());
                board.push_recent(RecentCallEntry {
                    ticket_number: job.ticket_number,
                    counter_label: job.counter_label,
                    called_at: Local::now(),
                });
                board.render(&store, ctx.connected.load(Ordering::SeqCst));
            }
            DispatchMsg::WaitingCount(count) => {
                board.set_waiting(count);
            }
            DispatchMsg::Resync(snapshots) => {
                store.reconcile_from_pull(snapshots);
                board.render(&store, ctx.connected.load(Ordering::SeqCst));
            }
            DispatchMsg::AudioGate(enabled) => {
                log::info!("[dispatch] audio {}", if enabled { "enabled" } else { "disabled" });
                ctx.audio_enabled.store(enabled, Ordering::SeqCst);
                if let Ok(mut s) = ctx.settings.lock() {
                    s.audio_enabled = enabled;
                    if let Err(e) = settings::save(&s) {
                        log::warn!("[dispatch] failed to persist audio flag: {}", e);
                    }
                }
            }
            DispatchMsg::Render => {
                board.render(&store, ctx.connected.load(Ordering::SeqCst));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::time::Duration;

    fn call(ticket: &str, counter_id: i64) -> CallEvent {
        CallEvent {
            ticket_number: ticket.into(),
            ticket_type_code: "A".into(),
            counter_id,
            counter_label: format!("Loket {}", counter_id),
            occurred_at: Local::now(),
        }
    }

    #[tokio::test]
    async fn call_events_flow_to_the_sequencer_in_order() {
        let ctx = Arc::new(AppContext::new(Settings::default()));
        let (seq_tx, mut seq_rx) = mpsc::unbounded_channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let _handle = spawn(ctx, Sequencer::new(seq_tx), rx);

        tx.send(DispatchMsg::Call(call("A001", 1))).unwrap();
        tx.send(DispatchMsg::Call(call("B001", 2))).unwrap();

        let first = seq_rx.recv().await.unwrap();
        let second = seq_rx.recv().await.unwrap();
        assert_eq!(first.ticket_number, "A001");
        assert_eq!(second.ticket_number, "B001");
    }

    #[tokio::test]
    async fn render_and_gauge_messages_do_not_enqueue_jobs() {
        let ctx = Arc::new(AppContext::new(Settings::default()));
        let (seq_tx, mut seq_rx) = mpsc::unbounded_channel();
        let (tx, rx) = mpsc::unbounded_channel();
        let _handle = spawn(ctx, Sequencer::new(seq_tx), rx);

        tx.send(DispatchMsg::WaitingCount(4)).unwrap();
        tx.send(DispatchMsg::Resync(Vec::new())).unwrap();
        tx.send(DispatchMsg::Render).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(seq_rx.try_recv().is_err());
    }
}
