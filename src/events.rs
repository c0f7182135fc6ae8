use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::Value;

/// One "ticket called" notification, from either the push channel or the
/// polling fallback. Immutable once received; dispatched exactly once.
#[derive(Debug, Clone, Deserialize)]
pub struct CallEvent {
    #[serde(rename = "queue_number")]
    pub ticket_number: String,
    #[serde(rename = "queue_type", default)]
    pub ticket_type_code: String,
    #[serde(rename = "counter_id")]
    pub counter_id: i64,
    #[serde(rename = "counter_name")]
    pub counter_label: String,
    #[serde(rename = "timestamp", default = "Local::now")]
    pub occurred_at: DateTime<Local>,
}

/// One announcement owned by the sequencer queue; dropped after playback.
#[derive(Debug, Clone)]
pub struct AnnouncementJob {
    pub ticket_number: String,
    pub counter_label: String,
    pub ticket_type_code: String,
}

impl From<&CallEvent> for AnnouncementJob {
    fn from(ev: &CallEvent) -> Self {
        Self {
            ticket_number: ev.ticket_number.clone(),
            counter_label: ev.counter_label.clone(),
            ticket_type_code: ev.ticket_type_code.clone(),
        }
    }
}

/// Parsed push-channel frame.
#[derive(Debug, Clone)]
pub enum ServerEvent {
    QueueCalled(CallEvent),
    /// Waiting-count refresh (sent for both queue_updated and queue_added).
    WaitingCount(i64),
    SettingsUpdated { audio_enabled: Option<bool> },
    Connected,
    /// Unknown or irrelevant event type, kept for forward compatibility.
    Ignored,
}

/// Parse one `{"type": ..., "data": ...}` frame from the push channel.
/// Unknown types map to `Ignored`; a malformed frame is an Err so the
/// caller can log and drop it without touching the connection.
pub fn parse_frame(text: &str) -> Result<ServerEvent, String> {
    let frame: Value =
        serde_json::from_str(text).map_err(|e| format!("invalid frame json: {}", e))?;
    let event_type = frame.get("type").and_then(|t| t.as_str()).unwrap_or("");
    let data = frame.get("data").cloned().unwrap_or(Value::Null);

    match event_type {
        "queue_called" => {
            let ev: CallEvent = serde_json::from_value(data)
                .map_err(|e| format!("invalid queue_called payload: {}", e))?;
            Ok(ServerEvent::QueueCalled(ev))
        }
        "queue_updated" | "queue_added" => {
            let count = data
                .get("waiting_count")
                .and_then(|v| v.as_i64())
                .ok_or_else(|| format!("{} missing waiting_count", event_type))?;
            Ok(ServerEvent::WaitingCount(count))
        }
        "settings_updated" => Ok(ServerEvent::SettingsUpdated {
            audio_enabled: data.get("audio_enabled").and_then(|v| v.as_bool()),
        }),
        "connected" => Ok(ServerEvent::Connected),
        _ => Ok(ServerEvent::Ignored),
    }
}
