//! Session aggregate: voices, pools, scales and the clock they share

use fastrand::Rng;
use tracing::{debug, info, trace, warn};

use crate::config::SequencerConfig;
use crate::engine::{HistoryStore, SoundEngine};
use crate::error::Result;
use crate::gesture::{Gesture, GestureAction, GestureMapper};
use crate::history::{Step, VoiceHistory};
use crate::note::Note;
use crate::pattern::PatternBank;
use crate::scale::Scale;
use crate::selector;
use crate::transport::{Interval, Subdivision, TaskId, Tempo, TransportScheduler};
use crate::voice::{VoiceConfig, VoiceId, VoiceState};

#[derive(Debug, Clone)]
struct Voice {
    config: VoiceConfig,
    history: VoiceHistory<Step>,
    task: Option<TaskId>,
    state: VoiceState,
}

/// One running session.
///
/// All mutation goes through `&mut self`: voice ticks, timers and gestures are
/// applied one at a time on the scheduler's clock, and every change is seen by
/// the next tick of every voice.
#[derive(Debug)]
pub struct Sequencer {
    voices: Vec<Voice>,
    bank: PatternBank,
    scales: Vec<Scale>,
    current_scale: usize,
    tempo: Tempo,
    scheduler: TransportScheduler,
    rng: Rng,
    gestures: GestureMapper,
    transpose_voices: Vec<VoiceId>,
    history_max: usize,
    scale_swap_secs: f64,
    save_interval_secs: f64,
    swap_task: Option<TaskId>,
    save_task: Option<TaskId>,
}

impl Sequencer {
    pub fn new(config: SequencerConfig) -> Result<Self> {
        config.validate()?;

        let mut rng = config.seed.map(Rng::with_seed).unwrap_or_else(Rng::new);
        let bank = PatternBank::new(
            config.voices.iter().map(|v| (v.id, v.pool.clone())),
            &config.scales[0],
            config.pool_length,
            &mut rng,
        )?;
        let tempo = Tempo::new(config.tempo, config.tempo_min, config.tempo_max);
        let history_max = config.history_max;
        let voices = config
            .voices
            .into_iter()
            .map(|voice| Voice {
                config: voice,
                history: VoiceHistory::new(history_max),
                task: None,
                state: VoiceState::Idle,
            })
            .collect();

        Ok(Self {
            voices,
            bank,
            scales: config.scales,
            current_scale: 0,
            scheduler: TransportScheduler::new(tempo.bpm()),
            tempo,
            rng,
            gestures: GestureMapper::new(config.drag_threshold, config.tempo_step),
            transpose_voices: config.transpose_voices,
            history_max,
            scale_swap_secs: config.scale_swap_secs,
            save_interval_secs: config.save_interval_secs,
            swap_task: None,
            save_task: None,
        })
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Replace every voice history with what the store holds.
    ///
    /// Load failures are logged and leave that voice with an empty history.
    pub fn load_histories(&mut self, store: &mut dyn HistoryStore) {
        for voice in &mut self.voices {
            let id = voice.config.id;
            let steps = match store.load_history(id) {
                Ok(steps) => steps,
                Err(e) => {
                    warn!(voice = %id, error = %e, "Failed to load history, starting empty");
                    Vec::new()
                }
            };
            voice.history = VoiceHistory::from_entries(steps, self.history_max);
            debug!(voice = %id, entries = voice.history.len(), "Loaded history");
        }
    }

    /// Write every voice history. Returns how many saves succeeded.
    pub fn save_histories(&self, store: &mut dyn HistoryStore) -> usize {
        let mut saved = 0;
        for voice in &self.voices {
            let id = voice.config.id;
            match store.save_history(id, &voice.history.to_vec()) {
                Ok(()) => saved += 1,
                Err(e) => warn!(voice = %id, error = %e, "Failed to save history"),
            }
        }
        info!(saved, voices = self.voices.len(), "Saved histories");
        saved
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Register every voice and both timers, then start the clock
    pub fn start(&mut self) {
        if self.scheduler.is_playing() {
            return;
        }
        for voice in &mut self.voices {
            voice.task = Some(self.scheduler.schedule_repeat(Interval::Every(voice.config.every)));
            voice.state = VoiceState::Scheduled;
        }
        self.swap_task = Some(self.scheduler.schedule_repeat(Interval::Seconds(self.scale_swap_secs)));
        self.save_task = Some(self.scheduler.schedule_repeat(Interval::Seconds(self.save_interval_secs)));
        self.scheduler.start();
        info!(voices = self.voices.len(), bpm = self.tempo.bpm(), "Sequencer started");
    }

    /// Tear down every task and save histories
    pub fn stop(&mut self, store: &mut dyn HistoryStore) {
        if !self.scheduler.is_playing() {
            return;
        }
        self.scheduler.clear();
        for voice in &mut self.voices {
            voice.task = None;
            voice.state = VoiceState::Idle;
        }
        self.swap_task = None;
        self.save_task = None;
        info!(at = self.scheduler.now(), "Sequencer stopped");
        self.save_histories(store);
    }

    pub fn is_playing(&self) -> bool {
        self.scheduler.is_playing()
    }

    /// Clock time in seconds since start
    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    /// Report wall time; previews and tempo changes take effect there
    pub fn advance_to(&mut self, secs: f64) {
        self.scheduler.advance_to(secs);
    }

    /// Run every tick due at or before `until`. Returns the number handled.
    pub fn run_until(&mut self, until: f64, engine: &mut dyn SoundEngine, store: &mut dyn HistoryStore) -> usize {
        let mut handled = 0;
        while let Some(tick) = self.scheduler.next_due(until) {
            handled += 1;
            if Some(tick.task) == self.swap_task {
                self.swap_scale_random();
            } else if Some(tick.task) == self.save_task {
                self.save_histories(store);
            } else if let Some(idx) = self.voices.iter().position(|v| v.task == Some(tick.task)) {
                self.voice_tick(idx, tick.time, engine);
            }
        }
        handled
    }

    fn voice_tick(&mut self, idx: usize, time: f64, engine: &mut dyn SoundEngine) {
        let duration = self.scheduler.duration_secs(self.voices[idx].config.duration);
        let voice = &mut self.voices[idx];
        let id = voice.config.id;

        voice.state = VoiceState::Selecting;
        if let Some(gate) = voice.config.gate
            && self.rng.f64() >= gate
        {
            voice.state = VoiceState::Recording;
            voice.history.record(Step::Rest);
            voice.state = VoiceState::Scheduled;
            trace!(voice = %id, time, "Gate closed");
            return;
        }

        let chosen = match selector::select(self.bank.pool(id), voice.history.notes(), &mut self.rng) {
            Ok(note) => *note,
            Err(e) => {
                warn!(voice = %id, time, error = %e, "Skipping tick");
                voice.state = VoiceState::Scheduled;
                return;
            }
        };

        voice.state = VoiceState::Dispatching;
        let notes = voice.config.voicing(chosen);
        trace!(voice = %id, time, note = %chosen, "Tick");
        engine.trigger_note(id, &notes, duration, time);

        voice.state = VoiceState::Recording;
        voice.history.record(Step::Note(chosen));
        voice.state = VoiceState::Scheduled;
    }

    // ------------------------------------------------------------------------
    // Live controls
    // ------------------------------------------------------------------------

    /// Set tempo, clamped to the configured range. Returns the applied BPM.
    pub fn set_tempo(&mut self, bpm: f64) -> f64 {
        let applied = self.tempo.set(bpm);
        self.scheduler.set_bpm(applied);
        debug!(bpm = applied, "Tempo changed");
        applied
    }

    pub fn nudge_tempo(&mut self, delta: f64) -> f64 {
        self.set_tempo(self.tempo.bpm() + delta)
    }

    /// Shift the gesture-following pools
    pub fn transpose(&mut self, semitones: i32) {
        for &voice in &self.transpose_voices {
            self.bank.transpose(voice, semitones);
        }
        debug!(semitones, "Transposed pools");
    }

    /// Make the scale at `index` current (wrapping) and redraw scale pools
    pub fn swap_scale(&mut self, index: usize) -> Result<()> {
        let index = index % self.scales.len();
        self.bank.regenerate_from_scale(&self.scales[index], &mut self.rng)?;
        self.current_scale = index;
        info!(index, notes = self.scales[index].len(), "Scale swapped");
        Ok(())
    }

    /// Pick any scale of the rotation, possibly the current one
    pub fn swap_scale_random(&mut self) {
        let index = self.rng.usize(..self.scales.len());
        if let Err(e) = self.swap_scale(index) {
            warn!(index, error = %e, "Scale swap failed");
        }
    }

    /// Replace a voice's pool. An empty pool makes that voice skip its ticks.
    pub fn replace_pool(&mut self, voice: VoiceId, notes: Vec<Note>) -> bool {
        self.bank.replace_pool(voice, notes)
    }

    /// Map a pointer event and apply the resulting actions
    pub fn apply_gesture(&mut self, gesture: Gesture, engine: &mut dyn SoundEngine) -> Vec<GestureAction> {
        let actions = self.gestures.map(gesture);
        for action in &actions {
            match *action {
                GestureAction::Preview => self.preview(engine),
                GestureAction::Transpose(semitones) => self.transpose(semitones),
                GestureAction::TempoDelta(delta) => {
                    self.nudge_tempo(delta);
                }
            }
        }
        actions
    }

    /// Immediate sixteenth-note feedback: a random scale note on the melody
    /// voice and a low hit on percussion, stamped with the wall clock from
    /// `advance_to`. History is untouched.
    pub fn preview(&mut self, engine: &mut dyn SoundEngine) {
        let scale = self.scales[self.current_scale].notes();
        let note = scale[self.rng.usize(..scale.len())];
        let duration = self.scheduler.duration_secs(Subdivision::Sixteenth);
        let time = self.scheduler.wall_clock();
        engine.trigger_note(VoiceId::Melody, &[note], duration, time);
        engine.trigger_note(VoiceId::Percussion, &[Note::MIDDLE_C.transpose(-24)], duration, time);
        debug!(note = %note, time, "Preview");
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn tempo(&self) -> f64 {
        self.tempo.bpm()
    }

    pub fn tempo_range(&self) -> (f64, f64) {
        self.tempo.range()
    }

    pub fn voice_ids(&self) -> impl Iterator<Item = VoiceId> + '_ {
        self.voices.iter().map(|v| v.config.id)
    }

    pub fn history(&self, voice: VoiceId) -> Option<&VoiceHistory<Step>> {
        self.voice(voice).map(|v| &v.history)
    }

    pub fn voice_state(&self, voice: VoiceId) -> Option<VoiceState> {
        self.voice(voice).map(|v| v.state)
    }

    pub fn pool(&self, voice: VoiceId) -> &[Note] {
        self.bank.pool(voice)
    }

    pub fn current_scale(&self) -> &Scale {
        &self.scales[self.current_scale]
    }

    pub fn current_scale_index(&self) -> usize {
        self.current_scale
    }

    fn voice(&self, id: VoiceId) -> Option<&Voice> {
        self.voices.iter().find(|v| v.config.id == id)
    }
}
