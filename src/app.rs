use crate::announce::{Announcer, SpeechAnnouncer};
use crate::api::ApiClient;
use crate::dispatch::{self, DispatchMsg};
use crate::poller;
use crate::sequencer;
use crate::settings::{self, Settings};
use crate::stream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Cadence of the data-free re-render keeping relative-time labels fresh.
const RENDER_REFRESH: Duration = Duration::from_secs(30);

/// Shared state every component reads: the settings, the push-channel
/// status the poller consults, and the audio gate the sequencer checks.
pub struct AppContext {
    pub settings: Mutex<Settings>,
    pub connected: AtomicBool,
    pub audio_enabled: AtomicBool,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        let audio_enabled = settings.audio_enabled;
        Self {
            settings: Mutex::new(settings),
            connected: AtomicBool::new(false),
            audio_enabled: AtomicBool::new(audio_enabled),
        }
    }
}

/// The assembled client: create, start, dispose.
pub struct App {
    ctx: Arc<AppContext>,
    api: Arc<ApiClient>,
    announcer: Arc<dyn Announcer>,
    dispatch_tx: mpsc::UnboundedSender<DispatchMsg>,
    dispatch_rx: Option<mpsc::UnboundedReceiver<DispatchMsg>>,
    handles: Vec<JoinHandle<()>>,
}

impl App {
    pub fn create(settings: Settings) -> Result<Self, String> {
        let api = Arc::new(ApiClient::new(&settings.server_url)?);
        let announcer: Arc<dyn Announcer> = Arc::new(SpeechAnnouncer::new(
            settings.speech_command.clone(),
            settings.speech_voice.clone(),
            settings.speech_rate,
        ));
        let ctx = Arc::new(AppContext::new(settings));
        let (dispatch_tx, dispatch_rx) = mpsc::unbounded_channel();
        Ok(Self {
            ctx,
            api,
            announcer,
            dispatch_tx,
            dispatch_rx: Some(dispatch_rx),
            handles: Vec::new(),
        })
    }

    /// Spawn every task. Idempotent: a second call does nothing.
    pub fn start(&mut self) {
        let Some(dispatch_rx) = self.dispatch_rx.take() else {
            return;
        };

        let (seq, seq_handle) = sequencer::spawn(
            self.ctx.clone(),
            self.announcer.clone(),
            self.dispatch_tx.clone(),
        );
        self.handles.push(seq_handle);
        self.handles
            .push(dispatch::spawn(self.ctx.clone(), seq, dispatch_rx));
        self.handles
            .push(stream::spawn(self.ctx.clone(), self.dispatch_tx.clone()));
        self.handles.push(poller::spawn_fallback(
            self.ctx.clone(),
            self.api.clone(),
            self.dispatch_tx.clone(),
        ));
        self.handles
            .push(poller::spawn_resync(self.api.clone(), self.dispatch_tx.clone()));
        self.handles.push(spawn_render_timer(self.dispatch_tx.clone()));
    }

    /// Stop every task and persist the audio flag.
    pub fn dispose(self) {
        for handle in &self.handles {
            handle.abort();
        }
        if let Ok(mut s) = self.ctx.settings.lock() {
            s.audio_enabled = self.ctx.audio_enabled.load(Ordering::SeqCst);
            if let Err(e) = settings::save(&s) {
                log::warn!("[app] failed to save settings: {}", e);
            }
        }
    }
}

fn spawn_render_timer(tx: mpsc::UnboundedSender<DispatchMsg>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RENDER_REFRESH);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // Skip the immediate first tick; there is nothing to show yet.
        interval.tick().await;
        loop {
            interval.tick().await;
            if tx.send(DispatchMsg::Render).is_err() {
                break;
            }
        }
    })
}
