use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::audio::parameters::VoiceParams;
use crate::midi::collector::CollectorConfig;
use crate::types::waveform::Waveform;

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BridgeConfig {
    /// Size of the synthesiser's voice bank
    #[serde(default = "default_voices")]
    pub voices: usize,

    /// Size of the note slot pool used by `play_note_event`
    #[serde(default = "default_note_slots")]
    pub note_slots: usize,

    /// Events that may wait between the control and render contexts
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// How far the render window trails the clock, in milliseconds
    #[serde(default)]
    pub latency_ms: f64,

    /// Events stamped up to this many milliseconds before the render window
    /// still play; older ones are dropped as stale
    #[serde(default = "default_late_ms")]
    pub late_ms: f64,

    #[serde(default = "default_gain")]
    pub gain: f32,

    #[serde(default)]
    pub synth: SynthSettings,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices: Option<DeviceConfig>,

    /// Control loop cadence of the host binary
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
}

impl BridgeConfig {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Parse and validate YAML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: BridgeConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML config")?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.voices < 1 || self.voices > 128 {
            return Err(anyhow!("voices must be between 1 and 128"));
        }
        if self.note_slots < 1 || self.note_slots > 1024 {
            return Err(anyhow!("note_slots must be between 1 and 1024"));
        }
        if self.queue_capacity < 1 {
            return Err(anyhow!("queue_capacity must be at least 1"));
        }
        if !(self.latency_ms.is_finite() && self.latency_ms >= 0.0) {
            return Err(anyhow!("latency_ms must be >= 0"));
        }
        if !(self.late_ms.is_finite() && self.late_ms >= 0.0) {
            return Err(anyhow!("late_ms must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.gain) {
            return Err(anyhow!("gain must be between 0.0 and 1.0"));
        }
        if self.tick_ms < 1 || self.tick_ms > 1000 {
            return Err(anyhow!("tick_ms must be between 1 and 1000"));
        }

        self.synth.validate().context("Invalid synth settings")?;
        Ok(())
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            capacity: self.queue_capacity,
            latency: self.latency_ms / 1000.0,
            late_tolerance: self.late_ms / 1000.0,
        }
    }

    /// Initial values for the shared synth parameters
    pub fn voice_params(&self) -> VoiceParams {
        VoiceParams {
            waveform: self.synth.wave,
            attack: self.synth.attack,
            decay: self.synth.decay,
            sustain: self.synth.sustain,
            release: self.synth.release,
            gain: self.gain,
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            voices: default_voices(),
            note_slots: default_note_slots(),
            queue_capacity: default_queue_capacity(),
            latency_ms: 0.0,
            late_ms: default_late_ms(),
            gain: default_gain(),
            synth: SynthSettings::default(),
            devices: None,
            tick_ms: default_tick_ms(),
        }
    }
}

/// Sound shared by every voice
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SynthSettings {
    #[serde(default)]
    pub wave: Waveform,

    #[serde(default = "default_attack")]
    pub attack: f32,

    #[serde(default = "default_decay")]
    pub decay: f32,

    #[serde(default = "default_sustain")]
    pub sustain: f32,

    #[serde(default = "default_release")]
    pub release: f32,
}

impl SynthSettings {
    pub fn validate(&self) -> Result<()> {
        // Validate ADSR envelope parameters
        if !(0.0..=10.0).contains(&self.attack) {
            return Err(anyhow!("Attack must be between 0.0 and 10.0 seconds"));
        }
        if !(0.0..=10.0).contains(&self.decay) {
            return Err(anyhow!("Decay must be between 0.0 and 10.0 seconds"));
        }
        if !(0.0..=1.0).contains(&self.sustain) {
            return Err(anyhow!("Sustain must be between 0.0 and 1.0"));
        }
        if !(0.0..=10.0).contains(&self.release) {
            return Err(anyhow!("Release must be between 0.0 and 10.0 seconds"));
        }
        Ok(())
    }
}

impl Default for SynthSettings {
    fn default() -> Self {
        Self {
            wave: Waveform::default(),
            attack: default_attack(),
            decay: default_decay(),
            sustain: default_sustain(),
            release: default_release(),
        }
    }
}

/// Device selection for the host binary: a name substring or an index
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceConfig {
    #[serde(default)]
    pub midiin: Option<String>,
    #[serde(default)]
    pub audioout: Option<String>,
}

// Default value functions for serde
fn default_voices() -> usize {
    4
}

fn default_note_slots() -> usize {
    20
}

fn default_queue_capacity() -> usize {
    1024
}

fn default_late_ms() -> f64 {
    50.0
}

fn default_gain() -> f32 {
    0.25
}

fn default_tick_ms() -> u64 {
    16
}

fn default_attack() -> f32 {
    0.01
}

fn default_decay() -> f32 {
    0.1
}

fn default_sustain() -> f32 {
    0.7
}

fn default_release() -> f32 {
    0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = BridgeConfig::parse("{}").unwrap();
        assert_eq!(config.voices, 4);
        assert_eq!(config.note_slots, 20);
        assert_eq!(config.queue_capacity, 1024);
        assert_eq!(config.latency_ms, 0.0);
        assert_eq!(config.late_ms, 50.0);
        assert_eq!(config.tick_ms, 16);
        assert_eq!(config.voice_params(), VoiceParams::default());
        assert!(config.devices.is_none());
    }

    #[test]
    fn test_full_document() {
        let yaml = r#"
voices: 8
note_slots: 4
latency_ms: 20
late_ms: 0
gain: 0.5
synth:
  wave: square
  attack: 0.0
  release: 1.5
devices:
  midiin: "Keystep"
"#;
        let config = BridgeConfig::parse(yaml).unwrap();
        assert_eq!(config.voices, 8);
        assert_eq!(config.note_slots, 4);
        assert_eq!(config.synth.wave, Waveform::Square);
        assert_eq!(config.synth.sustain, 0.7);

        let collector = config.collector_config();
        assert!((collector.latency - 0.02).abs() < 1e-12);
        assert_eq!(collector.late_tolerance, 0.0);

        let devices = config.devices.unwrap();
        assert_eq!(devices.midiin.as_deref(), Some("Keystep"));
        assert!(devices.audioout.is_none());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(BridgeConfig::parse("voices: 0").is_err());
        assert!(BridgeConfig::parse("gain: 2.0").is_err());
        assert!(BridgeConfig::parse("latency_ms: -5").is_err());
        assert!(BridgeConfig::parse("late_ms: -1").is_err());
        assert!(BridgeConfig::parse("synth: { sustain: 1.5 }").is_err());
        assert!(BridgeConfig::parse("synth: { wave: noise }").is_err());
    }

    #[test]
    fn test_default_matches_empty_document() {
        let parsed = BridgeConfig::parse("{}").unwrap();
        let built = BridgeConfig::default();
        assert_eq!(parsed.voice_params(), built.voice_params());
        assert_eq!(parsed.collector_config(), built.collector_config());
        assert_eq!(parsed.tick_interval(), Duration::from_millis(16));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let err = BridgeConfig::load("/nonexistent/bridge.yaml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
