//! Musical clock and repeat scheduler

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MemoriaError;

/// Grid resolution in ticks per quarter note
pub const PPQ: u64 = 192;

/// Musical note values used as repeat intervals and note durations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Subdivision {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

impl Subdivision {
    /// Length in grid ticks
    pub fn ticks(&self) -> u64 {
        match self {
            Self::Whole => PPQ * 4,
            Self::Half => PPQ * 2,
            Self::Quarter => PPQ,
            Self::Eighth => PPQ / 2,
            Self::Sixteenth => PPQ / 4,
        }
    }

    /// Length in quarter-note beats
    pub fn beats(&self) -> f64 {
        self.ticks() as f64 / PPQ as f64
    }

    /// Short notation (`4n` = quarter note)
    pub fn notation(&self) -> &'static str {
        match self {
            Self::Whole => "1n",
            Self::Half => "2n",
            Self::Quarter => "4n",
            Self::Eighth => "8n",
            Self::Sixteenth => "16n",
        }
    }
}

impl fmt::Display for Subdivision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notation())
    }
}

impl FromStr for Subdivision {
    type Err = MemoriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1n" | "whole" => Ok(Self::Whole),
            "2n" | "half" => Ok(Self::Half),
            "4n" | "quarter" => Ok(Self::Quarter),
            "8n" | "eighth" => Ok(Self::Eighth),
            "16n" | "sixteenth" => Ok(Self::Sixteenth),
            other => Err(MemoriaError::InvalidArgument(format!("unknown subdivision: {other}"))),
        }
    }
}

impl TryFrom<String> for Subdivision {
    type Error = MemoriaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Subdivision> for String {
    fn from(sub: Subdivision) -> Self {
        sub.notation().to_string()
    }
}

/// Tempo in BPM, kept inside a configured range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tempo {
    bpm: f64,
    min: f64,
    max: f64,
}

impl Tempo {
    pub fn new(bpm: f64, min: f64, max: f64) -> Self {
        let mut tempo = Self { bpm: min, min, max };
        tempo.set(bpm);
        tempo
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn range(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    /// Set, clamping into range. Returns the applied value.
    pub fn set(&mut self, bpm: f64) -> f64 {
        self.bpm = if bpm.is_nan() { self.bpm } else { bpm.clamp(self.min, self.max) };
        self.bpm
    }

    pub fn nudge(&mut self, delta: f64) -> f64 {
        self.set(self.bpm + delta)
    }
}

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
}

/// How often a task repeats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interval {
    /// Musical time, follows tempo
    Every(Subdivision),
    /// Wall-clock seconds, ignores tempo
    Seconds(f64),
}

/// Handle returned by `schedule_repeat`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// One due occurrence of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    pub task: TaskId,
    /// Intended trigger time in seconds since the transport started
    pub time: f64,
    /// Grid position for musical tasks
    pub position: Option<u64>,
}

#[derive(Debug, Clone)]
enum NextFire {
    Tick(u64),
    Secs(f64),
}

#[derive(Debug, Clone)]
struct Task {
    id: TaskId,
    interval: Interval,
    next: NextFire,
}

/// Cooperative scheduler on one shared tempo clock.
///
/// Owns no callbacks: callers pull due ticks with `next_due` and run each one
/// to completion before pulling the next, so ordering stays deterministic.
/// Ties resolve in registration order.
#[derive(Debug, Clone)]
pub struct TransportScheduler {
    state: TransportState,
    bpm: f64,
    /// Tempo mapping anchor: grid position and time of the last tempo change
    anchor_tick: f64,
    anchor_secs: f64,
    /// Time of the most recently dispatched tick
    cursor: f64,
    /// Latest time passed to `advance_to`
    wall: f64,
    tasks: Vec<Task>,
    next_task_id: u64,
}

impl Default for TransportScheduler {
    fn default() -> Self {
        Self::new(120.0)
    }
}

impl TransportScheduler {
    pub fn new(bpm: f64) -> Self {
        Self {
            state: TransportState::Stopped,
            bpm: sanitize_bpm(bpm, 120.0),
            anchor_tick: 0.0,
            anchor_secs: 0.0,
            cursor: 0.0,
            wall: 0.0,
            tasks: Vec::new(),
            next_task_id: 1,
        }
    }

    pub fn start(&mut self) {
        self.state = TransportState::Playing;
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Clock position in seconds: the later of wall time and the last
    /// dispatched tick
    pub fn now(&self) -> f64 {
        self.cursor.max(self.wall)
    }

    /// Latest wall time reported through `advance_to`
    pub fn wall_clock(&self) -> f64 {
        self.wall
    }

    /// Grid position at the current clock time
    pub fn position_ticks(&self) -> f64 {
        self.position_at(self.now())
    }

    fn position_at(&self, secs: f64) -> f64 {
        self.anchor_tick + (secs - self.anchor_secs) * (self.bpm * PPQ as f64) / 60.0
    }

    fn tick_to_secs(&self, tick: u64) -> f64 {
        self.anchor_secs + ((tick as f64 - self.anchor_tick) * 60.0) / (self.bpm * PPQ as f64)
    }

    /// Length of a subdivision in seconds at current tempo
    pub fn duration_secs(&self, subdivision: Subdivision) -> f64 {
        (subdivision.ticks() as f64 * 60.0) / (self.bpm * PPQ as f64)
    }

    /// Change tempo from the current clock position onward.
    ///
    /// Pending musical ticks keep their grid position, so their absolute
    /// times move proportionally. Already dispatched ticks are untouched.
    /// The anchor never passes the earliest pending musical tick: a tick
    /// already overdue keeps its time and everything after it stretches.
    pub fn set_bpm(&mut self, bpm: f64) {
        let bpm = sanitize_bpm(bpm, self.bpm);
        let anchor = self
            .tasks
            .iter()
            .filter_map(|task| match task.next {
                NextFire::Tick(tick) => Some(self.tick_to_secs(tick)),
                NextFire::Secs(_) => None,
            })
            .fold(self.now(), f64::min);
        self.anchor_tick = self.position_at(anchor);
        self.anchor_secs = anchor;
        self.bpm = bpm;
    }

    /// Register a repeating task.
    ///
    /// Musical tasks first fire on the next grid line of their subdivision
    /// (immediately when registered at time zero). Wall-clock tasks first fire
    /// one interval from now.
    pub fn schedule_repeat(&mut self, interval: Interval) -> TaskId {
        let id = TaskId(self.next_task_id);
        self.next_task_id += 1;

        let next = match interval {
            Interval::Every(sub) => {
                let step = sub.ticks();
                let pos = self.position_ticks().max(0.0);
                let steps = (pos / step as f64 - 1e-9).ceil().max(0.0) as u64;
                NextFire::Tick(steps * step)
            }
            Interval::Seconds(secs) => NextFire::Secs(self.now() + secs.max(f64::EPSILON)),
        };

        self.tasks.push(Task { id, interval, next });
        id
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    fn fire_time(&self, task: &Task) -> f64 {
        match task.next {
            NextFire::Tick(tick) => self.tick_to_secs(tick),
            NextFire::Secs(secs) => secs,
        }
    }

    /// Pop the earliest tick due at or before `until`, advancing its task.
    ///
    /// Returns `None` when stopped or when nothing is due yet.
    pub fn next_due(&mut self, until: f64) -> Option<Tick> {
        if !self.is_playing() {
            return None;
        }

        let mut earliest: Option<(usize, f64)> = None;
        for (idx, task) in self.tasks.iter().enumerate() {
            let time = self.fire_time(task);
            if earliest.is_none_or(|(_, best)| time < best) {
                earliest = Some((idx, time));
            }
        }

        let (idx, time) = earliest?;
        if time > until {
            return None;
        }

        let task = &mut self.tasks[idx];
        let position = match (&mut task.next, task.interval) {
            (NextFire::Tick(tick), Interval::Every(sub)) => {
                let fired = *tick;
                *tick += sub.ticks();
                Some(fired)
            }
            (NextFire::Secs(secs), Interval::Seconds(every)) => {
                *secs += every.max(f64::EPSILON);
                None
            }
            _ => None,
        };
        let tick = Tick { task: task.id, time, position };

        self.cursor = self.cursor.max(time);
        Some(tick)
    }

    /// Report wall-clock time without dispatching anything
    pub fn advance_to(&mut self, secs: f64) {
        self.wall = self.wall.max(secs);
    }

    /// Tear down: stop and forget every task
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.state = TransportState::Stopped;
    }
}

fn sanitize_bpm(bpm: f64, fallback: f64) -> f64 {
    if bpm.is_finite() && bpm > 0.0 { bpm } else { fallback }
}
