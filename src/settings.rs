use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Viewer role: "display" for the public board, "counter:{id}" for a
    /// counter station.
    #[serde(default = "default_role")]
    pub role: String,
    /// Whether audio was enabled last run; announcements are skipped (but
    /// still sequenced) when false.
    #[serde(default)]
    pub audio_enabled: bool,
    /// External speech synthesizer command.
    #[serde(default = "default_speech_command")]
    pub speech_command: String,
    #[serde(default = "default_speech_voice")]
    pub speech_voice: String,
    /// Words per minute passed to the synthesizer.
    #[serde(default = "default_speech_rate")]
    pub speech_rate: u32,
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
}

impl Settings {
    /// Counter id when the role is "counter:{id}".
    pub fn counter_id(&self) -> Option<i64> {
        self.role.strip_prefix("counter:")?.parse().ok()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            role: default_role(),
            audio_enabled: false,
            speech_command: default_speech_command(),
            speech_voice: default_speech_voice(),
            speech_rate: default_speech_rate(),
            recent_capacity: default_recent_capacity(),
            history_capacity: default_history_capacity(),
        }
    }
}

fn default_server_url() -> String {
    "http://localhost:8080".into()
}
fn default_role() -> String {
    "display".into()
}
fn default_speech_command() -> String {
    "espeak-ng".into()
}
fn default_speech_voice() -> String {
    "id".into()
}
fn default_speech_rate() -> u32 {
    140
}
fn default_recent_capacity() -> usize {
    5
}
fn default_history_capacity() -> usize {
    20
}

pub fn settings_path() -> Result<PathBuf, String> {
    if let Some(dir) = dirs::data_local_dir() {
        return Ok(dir.join("Antri").join("settings.json"));
    }
    if let Some(home) = dirs::home_dir() {
        return Ok(home.join(".antri").join("settings.json"));
    }
    Err("Failed to resolve data directory".into())
}

pub fn load() -> Settings {
    let path = match settings_path() {
        Ok(p) => p,
        Err(_) => return Settings::default(),
    };
    match fs::read_to_string(&path) {
        Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
        Err(_) => Settings::default(),
    }
}

pub fn save(settings: &Settings) -> Result<(), String> {
    let path = settings_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create settings dir: {}", e))?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {}", e))?;
    fs::write(&path, json).map_err(|e| format!("Failed to write settings: {}", e))?;
    Ok(())
}
