//! Sound engine adapters

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use memoria_core::{Note, SoundEngine, VoiceId};
use tracing::{info, warn};

/// One note-on request, timestamped on the sequencer clock
#[derive(Debug, Clone, PartialEq)]
pub struct NoteTrigger {
    pub voice: VoiceId,
    pub notes: Vec<Note>,
    /// Seconds
    pub duration: f64,
    /// Seconds since the transport started
    pub time: f64,
}

impl NoteTrigger {
    pub fn frequencies(&self) -> Vec<f64> {
        self.notes.iter().map(|n| n.frequency()).collect()
    }

    /// Space-separated note names, e.g. `C4 E4 G4`
    pub fn names(&self) -> String {
        self.notes.iter().map(|n| n.name()).collect::<Vec<_>>().join(" ")
    }
}

/// Forwards triggers to whichever thread owns the synth
pub struct ChannelSoundEngine {
    tx: Sender<NoteTrigger>,
    dropped: u64,
    disconnected: bool,
}

impl ChannelSoundEngine {
    pub fn new(tx: Sender<NoteTrigger>) -> Self {
        Self {
            tx,
            dropped: 0,
            disconnected: false,
        }
    }

    /// Engine plus the receiving end of a channel holding `capacity` triggers
    pub fn bounded(capacity: usize) -> (Self, Receiver<NoteTrigger>) {
        let (tx, rx) = bounded(capacity);
        (Self::new(tx), rx)
    }

    /// Triggers lost to a full or closed channel
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Whether the receiving end has gone away
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }
}

impl SoundEngine for ChannelSoundEngine {
    fn trigger_note(&mut self, voice: VoiceId, notes: &[Note], duration: f64, time: f64) {
        let trigger = NoteTrigger {
            voice,
            notes: notes.to_vec(),
            duration,
            time,
        };
        match self.tx.try_send(trigger) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
                warn!(voice = %voice, time, dropped = self.dropped, "Trigger channel full");
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                // The receiver is gone for good; log once
                if !self.disconnected {
                    self.disconnected = true;
                    warn!(voice = %voice, time, dropped = self.dropped, "Trigger receiver disconnected");
                }
            }
        }
    }
}

/// Writes every trigger to the log; the headless default
#[derive(Debug, Default)]
pub struct LoggingSoundEngine {
    triggered: u64,
}

impl LoggingSoundEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triggered(&self) -> u64 {
        self.triggered
    }
}

impl SoundEngine for LoggingSoundEngine {
    fn trigger_note(&mut self, voice: VoiceId, notes: &[Note], duration: f64, time: f64) {
        self.triggered += 1;
        let names: Vec<String> = notes.iter().map(|n| n.name()).collect();
        info!(voice = %voice, notes = %names.join(" "), duration, time, "Note");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_forwards_triggers() {
        let (mut engine, rx) = ChannelSoundEngine::bounded(4);
        let chord = memoria_core::note::parse_notes(&["C4", "E4", "G4"]).unwrap();
        engine.trigger_note(VoiceId::Chord, &chord, 2.0, 0.0);

        let trigger = rx.try_recv().unwrap();
        assert_eq!(trigger.voice, VoiceId::Chord);
        assert_eq!(trigger.names(), "C4 E4 G4");
        assert_eq!(trigger.duration, 2.0);
        assert!((trigger.frequencies()[0] - 261.63).abs() < 0.01);
    }

    #[test]
    fn test_full_channel_counts_drops() {
        let (mut engine, _rx) = ChannelSoundEngine::bounded(1);
        engine.trigger_note(VoiceId::Melody, &[Note::MIDDLE_C], 0.25, 0.0);
        engine.trigger_note(VoiceId::Melody, &[Note::MIDDLE_C], 0.25, 0.5);
        assert_eq!(engine.dropped(), 1);
    }

    #[test]
    fn test_disconnected_receiver_is_not_fatal() {
        let (mut engine, rx) = ChannelSoundEngine::bounded(4);
        drop(rx);
        engine.trigger_note(VoiceId::Bass, &[Note::MIDDLE_C], 0.5, 0.0);
        engine.trigger_note(VoiceId::Bass, &[Note::MIDDLE_C], 0.5, 1.0);
        assert_eq!(engine.dropped(), 2);
        assert!(engine.is_disconnected());
    }

    #[test]
    fn test_disconnect_after_full_drops_is_noticed() {
        let (mut engine, rx) = ChannelSoundEngine::bounded(1);
        engine.trigger_note(VoiceId::Melody, &[Note::MIDDLE_C], 0.25, 0.0);
        engine.trigger_note(VoiceId::Melody, &[Note::MIDDLE_C], 0.25, 0.5);
        assert!(!engine.is_disconnected());

        drop(rx);
        engine.trigger_note(VoiceId::Melody, &[Note::MIDDLE_C], 0.25, 1.0);
        assert!(engine.is_disconnected());
        assert_eq!(engine.dropped(), 2);
    }

    #[test]
    fn test_logging_engine_counts() {
        let mut engine = LoggingSoundEngine::new();
        engine.trigger_note(VoiceId::Pad, &[Note::MIDDLE_C], 1.0, 0.0);
        assert_eq!(engine.triggered(), 1);
    }
}
