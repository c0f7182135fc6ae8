use crate::app::AppContext;
use crate::dispatch::DispatchMsg;
use crate::events::{self, ServerEvent};
use futures_util::StreamExt;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite};

/// Fixed delay before reconnecting after any transport failure.
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Push endpoint for this viewer role, derived from the REST base URL.
fn push_url(server_url: &str, counter_id: Option<i64>) -> String {
    let base = server_url.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        format!("ws://{}", base)
    };
    match counter_id {
        Some(id) => format!("{}/ws/counter/{}", base, id),
        None => format!("{}/ws/display", base),
    }
}

/// Maintains the push connection: parsed call events go into the dispatch
/// channel, the shared connected flag tracks transport state, and every
/// failure schedules a reconnect after a fixed delay. Terminates only when
/// the task is aborted on shutdown.
pub fn spawn(ctx: Arc<AppContext>, tx: mpsc::UnboundedSender<DispatchMsg>) -> JoinHandle<()> {
    tokio::spawn(run(ctx, tx))
}

async fn run(ctx: Arc<AppContext>, tx: mpsc::UnboundedSender<DispatchMsg>) {
    let url = match ctx.settings.lock() {
        Ok(s) => push_url(&s.server_url, s.counter_id()),
        Err(_) => return,
    };

    loop {
        log::info!("[stream] connecting to {}", url);
        match connect_async(url.as_str()).await {
            Ok((mut ws, _)) => {
                ctx.connected.store(true, Ordering::SeqCst);
                log::info!("[stream] connected");

                while let Some(msg) = ws.next().await {
                    match msg {
                        Ok(tungstenite::Message::Text(text)) => handle_frame(&text, &tx),
                        Ok(tungstenite::Message::Close(frame)) => {
                            match frame {
                                Some(frame) => log::warn!(
                                    "[stream] closed by server: {} {}",
                                    frame.code,
                                    frame.reason
                                ),
                                None => log::warn!("[stream] closed by server"),
                            }
                            break;
                        }
                        // Ping/pong/binary frames carry nothing for us.
                        Ok(_) => continue,
                        Err(e) => {
                            log::error!("[stream] transport error: {}", e);
                            break;
                        }
                    }
                }
                ctx.connected.store(false, Ordering::SeqCst);
            }
            Err(e) => {
                log::warn!("[stream] connect failed: {}", e);
            }
        }

        log::info!(
            "[stream] reconnecting in {}s",
            RECONNECT_DELAY.as_secs()
        );
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// Route one parsed frame. A frame that fails to parse is logged and
/// dropped; the connection is left alone.
fn handle_frame(text: &str, tx: &mpsc::UnboundedSender<DispatchMsg>) {
    match events::parse_frame(text) {
        Ok(ServerEvent::QueueCalled(ev)) => {
            let _ = tx.send(DispatchMsg::Call(ev));
        }
        Ok(ServerEvent::WaitingCount(count)) => {
            let _ = tx.send(DispatchMsg::WaitingCount(count));
        }
        Ok(ServerEvent::SettingsUpdated {
            audio_enabled: Some(enabled),
        }) => {
            let _ = tx.send(DispatchMsg::AudioGate(enabled));
        }
        Ok(ServerEvent::SettingsUpdated { .. })
        | Ok(ServerEvent::Connected)
        | Ok(ServerEvent::Ignored) => {}
        Err(e) => {
            log::warn!("[stream] dropping bad frame: {}", e);
        }
    }
}
