use crate::events::AnnouncementJob;
use crate::speech;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::process::Command;
use std::time::Duration;

/// Bell harmonics and per-harmonic gains, tuned to a single "ding".
const BELL_FREQS: [f32; 4] = [830.0, 1245.0, 1661.0, 2093.0];
const BELL_GAINS: [f32; 4] = [1.0, 0.6, 0.4, 0.3];
const BELL_SECS: f32 = 1.0;
/// How far into the bell decay the utterance starts.
const BELL_LEAD: Duration = Duration::from_millis(500);

/// Plays one announcement and blocks until it finishes. The sequencer runs
/// this under spawn_blocking and treats Err the same as completion, so an
/// implementation must return rather than hang on failure.
pub trait Announcer: Send + Sync {
    fn play(&self, job: &AnnouncementJob) -> Result<(), String>;
}

/// Production announcer: bell tone on the default output device, then an
/// external speech synthesizer for the Indonesian utterance.
pub struct SpeechAnnouncer {
    command: String,
    voice: String,
    rate: u32,
}

impl SpeechAnnouncer {
    pub fn new(command: String, voice: String, rate: u32) -> Self {
        Self {
            command,
            voice,
            rate,
        }
    }

    fn speak(&self, text: &str) -> Result<(), String> {
        let status = Command::new(&self.command)
            .arg("-v")
            .arg(&self.voice)
            .arg("-s")
            .arg(self.rate.to_string())
            .arg(text)
            .status()
            .map_err(|e| format!("failed to run {}: {}", self.command, e))?;
        if !status.success() {
            return Err(format!("{} exited with {}", self.command, status));
        }
        Ok(())
    }
}

impl Announcer for SpeechAnnouncer {
    fn play(&self, job: &AnnouncementJob) -> Result<(), String> {
        let text = speech::announcement_text(&job.ticket_number, &job.counter_label);

        // A missing output device should not swallow the spoken part.
        let bell = match play_bell() {
            Ok(stream) => Some(stream),
            Err(e) => {
                log::warn!("[announce] bell unavailable: {}", e);
                None
            }
        };
        std::thread::sleep(BELL_LEAD);

        let result = self.speak(&text);
        // Keep the stream alive until the decay has finished.
        if bell.is_some() {
            let remaining = Duration::from_secs_f32(BELL_SECS).saturating_sub(BELL_LEAD);
            std::thread::sleep(remaining);
        }
        drop(bell);
        result
    }
}

/// Synthesize the multi-harmonic bell on the default output device. The
/// tone decays exponentially over BELL_SECS; the returned stream must be
/// kept alive while it rings.
fn play_bell() -> Result<cpal::Stream, String> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or("No default output device")?;
    let config = device
        .default_output_config()
        .map_err(|e| format!("No output config: {}", e))?;
    let sample_rate = config.sample_rate().0 as f32;
    let channels = config.channels() as usize;
    let stream_config: cpal::StreamConfig = config.into();

    let mut sample_index: u64 = 0;
    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let t = sample_index as f32 / sample_rate;
                    let value = if t < BELL_SECS {
                        // Exponential decay from 0.3 down to near silence.
                        let envelope = 0.3 * (0.01f32 / 0.3).powf(t / BELL_SECS);
                        BELL_FREQS
                            .iter()
                            .zip(BELL_GAINS.iter())
                            .map(|(freq, gain)| {
                                gain * (2.0 * std::f32::consts::PI * freq * t).sin()
                            })
                            .sum::<f32>()
                            * envelope
                    } else {
                        0.0
                    };
                    for sample in frame.iter_mut() {
                        *sample = value;
                    }
                    sample_index += 1;
                }
            },
            |err| {
                log::error!("[announce] output stream error: {}", err);
            },
            None,
        )
        .map_err(|e| format!("Failed to build output stream: {}", e))?;

    stream
        .play()
        .map_err(|e| format!("Failed to start output stream: {}", e))?;
    Ok(stream)
}
