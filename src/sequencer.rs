use crate::announce::Announcer;
use crate::app::AppContext;
use crate::dispatch::DispatchMsg;
use crate::events::AnnouncementJob;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Pause between two announced jobs, and the longer pacing pause used when
/// audio is muted (the display still steps through calls one at a time).
const INTER_JOB_PAUSE: Duration = Duration::from_millis(300);
const MUTED_PAUSE: Duration = Duration::from_millis(1000);

/// FIFO announcement queue with a single worker: at most one announcement
/// is ever in flight, and the display update for a job fires when the job
/// starts playing, not when its event arrived.
#[derive(Clone)]
pub struct Sequencer {
    tx: mpsc::UnboundedSender<AnnouncementJob>,
}

impl Sequencer {
    pub fn new(tx: mpsc::UnboundedSender<AnnouncementJob>) -> Self {
        Self { tx }
    }

    pub fn enqueue(&self, job: AnnouncementJob) {
        if self.tx.send(job).is_err() {
            log::warn!("[sequencer] worker gone, dropping job");
        }
    }
}

pub fn spawn(
    ctx: Arc<AppContext>,
    announcer: Arc<dyn Announcer>,
    dispatch_tx: mpsc::UnboundedSender<DispatchMsg>,
) -> (Sequencer, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let handle = tokio::spawn(run_worker(ctx, announcer, dispatch_tx, rx));
    (Sequencer::new(tx), handle)
}

async fn run_worker(
    ctx: Arc<AppContext>,
    announcer: Arc<dyn Announcer>,
    dispatch_tx: mpsc::UnboundedSender<DispatchMsg>,
    mut rx: mpsc::UnboundedReceiver<AnnouncementJob>,
) {
    while let Some(job) = rx.recv().await {
        // Display update at job start, in receipt order.
        let _ = dispatch_tx.send(DispatchMsg::JobStarted(job.clone()));

        if ctx.audio_enabled.load(Ordering::SeqCst) {
            let announcer = announcer.clone();
            let play_job = job.clone();
            // No timeout around playback: a synthesizer that never returns
            // would stall this queue (known risk).
            match tokio::task::spawn_blocking(move || announcer.play(&play_job)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    log::warn!(
                        "[sequencer] announcement failed for {}: {}",
                        job.ticket_number,
                        e
                    );
                }
                Err(e) => {
                    log::warn!("[sequencer] announcer task failed: {}", e);
                }
            }
            tokio::time::sleep(INTER_JOB_PAUSE).await;
        } else {
            tokio::time::sleep(MUTED_PAUSE).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;
    use std::time::Instant;

    fn job(ticket: &str) -> AnnouncementJob {
        AnnouncementJob {
            ticket_number: ticket.into(),
            counter_label: "Loket 1".into(),
            ticket_type_code: "A".into(),
        }
    }

    fn audio_ctx() -> Arc<AppContext> {
        let ctx = Arc::new(AppContext::new(Settings::default()));
        ctx.audio_enabled.store(true, Ordering::SeqCst);
        ctx
    }

    /// Records play windows and fails if two overlap.
    struct RecordingAnnouncer {
        in_flight: AtomicUsize,
        windows: Mutex<Vec<(Instant, Instant)>>,
        play_time: Duration,
    }

    impl RecordingAnnouncer {
        fn new(play_time: Duration) -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                windows: Mutex::new(Vec::new()),
                play_time,
            }
        }
    }

    impl Announcer for RecordingAnnouncer {
        fn play(&self, _job: &AnnouncementJob) -> Result<(), String> {
            let active = self.in_flight.fetch_add(1, Ordering::SeqCst);
            assert_eq!(active, 0, "two announcements in flight");
            let started = Instant::now();
            std::thread::sleep(self.play_time);
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            if let Ok(mut windows) = self.windows.lock() {
                windows.push((started, Instant::now()));
            }
            Ok(())
        }
    }

    struct FailingAnnouncer;

    impl Announcer for FailingAnnouncer {
        fn play(&self, _job: &AnnouncementJob) -> Result<(), String> {
            Err("synthesizer unavailable".into())
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn jobs_never_overlap_and_pause_between() {
        let announcer = Arc::new(RecordingAnnouncer::new(Duration::from_millis(50)));
        let (dispatch_tx, mut dispatch_rx) = mpsc::unbounded_channel();
        let (seq, _handle) = spawn(audio_ctx(), announcer.clone(), dispatch_tx);

        for i in 0..3 {
            seq.enqueue(job(&format!("A00{}", i)));
        }
        // Three job-start notifications, in order.
        for i in 0..3 {
            match dispatch_rx.recv().await {
                Some(DispatchMsg::JobStarted(j)) => {
                    assert_eq!(j.ticket_number, format!("A00{}", i));
                }
                other => panic!("unexpected: {:?}", other),
            }
        }
        // Give the last playback time to finish, then inspect the windows.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let windows = announcer.windows.lock().unwrap().clone();
        assert_eq!(windows.len(), 3);
        for pair in windows.windows(2) {
            let gap = pair[1].0.duration_since(pair[0].1);
            assert!(gap >= INTER_JOB_PAUSE, "inter-job pause missing: {:?}", gap);
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn display_update_precedes_next_announcement() {
        let announcer = Arc::new(RecordingAnnouncer::new(Duration::from_millis(40)));
        let (dispatch_tx, mut dispatch_rx) = mpsc::unbounded_channel();
        let (seq, _handle) = spawn(audio_ctx(), announcer.clone(), dispatch_tx);

        seq.enqueue(job("A001"));
        seq.enqueue(job("A002"));

        // J1's display update arrives before J2 starts playing.
        let first = dispatch_rx.recv().await;
        assert!(matches!(
            first,
            Some(DispatchMsg::JobStarted(ref j)) if j.ticket_number == "A001"
        ));
        let started_so_far = announcer.windows.lock().unwrap().len();
        assert!(started_so_far <= 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_playback_does_not_stall_the_queue() {
        let ctx = audio_ctx();
        let (dispatch_tx, mut dispatch_rx) = mpsc::unbounded_channel();
        let (seq, _handle) = spawn(ctx, Arc::new(FailingAnnouncer), dispatch_tx);

        seq.enqueue(job("A001"));
        seq.enqueue(job("A002"));

        let mut seen = Vec::new();
        for _ in 0..2 {
            if let Some(DispatchMsg::JobStarted(j)) = dispatch_rx.recv().await {
                seen.push(j.ticket_number);
            }
        }
        assert_eq!(seen, vec!["A001".to_string(), "A002".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn muted_jobs_still_update_display() {
        // audio_enabled stays false.
        let ctx = Arc::new(AppContext::new(Settings::default()));
        let announcer = Arc::new(RecordingAnnouncer::new(Duration::from_millis(10)));
        let (dispatch_tx, mut dispatch_rx) = mpsc::unbounded_channel();
        let (seq, _handle) = spawn(ctx, announcer.clone(), dispatch_tx);

        seq.enqueue(job("A001"));

        let msg = dispatch_rx.recv().await;
        assert!(matches!(
            msg,
            Some(DispatchMsg::JobStarted(ref j)) if j.ticket_number == "A001"
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        // Playback skipped entirely.
        assert!(announcer.windows.lock().unwrap().is_empty());
    }
}
