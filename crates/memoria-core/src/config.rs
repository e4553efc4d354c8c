//! Session configuration

use serde::{Deserialize, Serialize};

use crate::error::{MemoriaError, Result};
use crate::scale::{Scale, default_rotation};
use crate::voice::{VoiceConfig, VoiceId, default_voices};

/// Everything a `Sequencer` needs to start a session.
///
/// Every field has a default, so a partial TOML table is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequencerConfig {
    /// Initial tempo in BPM
    pub tempo: f64,
    pub tempo_min: f64,
    pub tempo_max: f64,
    /// BPM change per vertical drag step
    pub tempo_step: f64,
    /// Entries kept per voice history
    pub history_max: usize,
    /// Notes drawn per regenerated pool
    pub pool_length: usize,
    /// Scale rotation; the first entry is current at start
    pub scales: Vec<Scale>,
    /// Seconds between random scale swaps
    pub scale_swap_secs: f64,
    /// Seconds between history saves
    pub save_interval_secs: f64,
    /// Pixels of drag per gesture step
    pub drag_threshold: f64,
    /// Voices whose pools follow horizontal drags
    pub transpose_voices: Vec<VoiceId>,
    pub voices: Vec<VoiceConfig>,
    /// Fixed RNG seed for reproducible sessions
    pub seed: Option<u64>,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            tempo_min: 60.0,
            tempo_max: 200.0,
            tempo_step: 1.0,
            history_max: 25,
            pool_length: 8,
            scales: default_rotation(),
            scale_swap_secs: 30.0,
            save_interval_secs: 5.0,
            drag_threshold: 5.0,
            transpose_voices: vec![VoiceId::Melody],
            voices: default_voices(),
            seed: None,
        }
    }
}

impl SequencerConfig {
    /// Reject settings a session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.history_max == 0 {
            return Err(invalid("history_max must be positive"));
        }
        if self.pool_length == 0 {
            return Err(invalid("pool_length must be positive"));
        }
        if self.scales.is_empty() || self.scales.iter().any(Scale::is_empty) {
            return Err(invalid("scale rotation must hold at least one non-empty scale"));
        }
        if !(self.tempo_min.is_finite() && self.tempo_max.is_finite())
            || self.tempo_min <= 0.0
            || self.tempo_min >= self.tempo_max
        {
            return Err(invalid(format!(
                "tempo range {}..{} is not increasing",
                self.tempo_min, self.tempo_max
            )));
        }
        if !(self.scale_swap_secs > 0.0 && self.save_interval_secs > 0.0) {
            return Err(invalid("timer intervals must be positive"));
        }
        for voice in &self.voices {
            if let Some(gate) = voice.gate
                && !(0.0..=1.0).contains(&gate)
            {
                return Err(invalid(format!("{} gate {gate} is outside [0, 1]", voice.id)));
            }
            if self.voices.iter().filter(|v| v.id == voice.id).count() > 1 {
                return Err(invalid(format!("voice {} is configured twice", voice.id)));
            }
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> MemoriaError {
    MemoriaError::InvalidArgument(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SequencerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.voices.len(), 5);
        assert_eq!(config.scales.len(), 4);
    }

    #[test]
    fn test_rejects_bad_settings() {
        let cases: [fn(&mut SequencerConfig); 6] = [
            |c| c.history_max = 0,
            |c| c.pool_length = 0,
            |c| c.scales.clear(),
            |c| c.tempo_min = 250.0,
            |c| c.voices[3].gate = Some(1.5),
            |c| c.scale_swap_secs = 0.0,
        ];
        for mutate in cases {
            let mut config = SequencerConfig::default();
            mutate(&mut config);
            assert!(matches!(config.validate(), Err(MemoriaError::InvalidArgument(_))));
        }
    }

    #[test]
    fn test_duplicate_voice_rejected() {
        let mut config = SequencerConfig::default();
        let melody = config.voices[0].clone();
        config.voices.push(melody);
        assert!(config.validate().is_err());
    }
}
