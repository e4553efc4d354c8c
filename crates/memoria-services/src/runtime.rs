//! Real-time runtime: one thread owns the sequencer and drives it from the
//! wall clock. Other threads talk to it only through `RuntimeCommand`s.

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use memoria_core::{Gesture, HistoryStore, MemoriaError, Sequencer, SoundEngine};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Sequencer error: {0}")]
    Sequencer(#[from] MemoriaError),
    #[error("Failed to spawn sequencer thread: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("Sequencer thread is not running")]
    NotRunning,
    #[error("Sequencer thread panicked")]
    Panicked,
}

/// Requests applied on the sequencer thread, in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeCommand {
    Gesture(Gesture),
    SetTempo(f64),
    NudgeTempo(f64),
    Transpose(i32),
    SwapScale(usize),
    Stop,
}

/// Timing of the runtime loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeOptions {
    /// How far ahead of the wall clock ticks are dispatched
    pub lookahead_ms: u64,
    /// Longest wait for a command between scheduling passes
    pub poll_ms: u64,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            lookahead_ms: 100,
            poll_ms: 10,
        }
    }
}

impl RuntimeOptions {
    pub fn lookahead(&self) -> Duration {
        Duration::from_millis(self.lookahead_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

pub struct SequencerRuntime<E, S> {
    sequencer: Sequencer,
    engine: E,
    store: S,
    options: RuntimeOptions,
    commands: Receiver<RuntimeCommand>,
}

impl<E, S> SequencerRuntime<E, S>
where
    E: SoundEngine + Send + 'static,
    S: HistoryStore + Send + 'static,
{
    /// Load histories, start the clock and run on a dedicated thread.
    ///
    /// The thread hands the sequencer back through `RuntimeHandle::stop`.
    pub fn spawn(sequencer: Sequencer, engine: E, store: S, options: RuntimeOptions) -> Result<RuntimeHandle, RuntimeError> {
        let (tx, rx) = unbounded();
        let runtime = Self {
            sequencer,
            engine,
            store,
            options,
            commands: rx,
        };
        let thread = thread::Builder::new()
            .name("memoria-sequencer".into())
            .spawn(move || runtime.run())
            .map_err(RuntimeError::Spawn)?;

        Ok(RuntimeHandle {
            tx,
            thread: Some(thread),
        })
    }

    fn run(mut self) -> Sequencer {
        self.sequencer.load_histories(&mut self.store);
        self.sequencer.start();

        let started = Instant::now();
        let lookahead = self.options.lookahead().as_secs_f64();
        let poll = self.options.poll_interval();
        info!(lookahead, "Runtime started");

        loop {
            let elapsed = started.elapsed().as_secs_f64();
            self.sequencer.advance_to(elapsed);
            self.sequencer
                .run_until(elapsed + lookahead, &mut self.engine, &mut self.store);

            match self.commands.recv_timeout(poll) {
                Ok(RuntimeCommand::Stop) => break,
                Ok(command) => self.apply(command),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("Command channel closed");
                    break;
                }
            }
        }

        self.sequencer.stop(&mut self.store);
        info!(elapsed = started.elapsed().as_secs_f64(), "Runtime stopped");
        self.sequencer
    }

    fn apply(&mut self, command: RuntimeCommand) {
        debug!(?command, "Runtime command");
        match command {
            RuntimeCommand::Gesture(gesture) => {
                self.sequencer.apply_gesture(gesture, &mut self.engine);
            }
            RuntimeCommand::SetTempo(bpm) => {
                self.sequencer.set_tempo(bpm);
            }
            RuntimeCommand::NudgeTempo(delta) => {
                self.sequencer.nudge_tempo(delta);
            }
            RuntimeCommand::Transpose(semitones) => self.sequencer.transpose(semitones),
            RuntimeCommand::SwapScale(index) => {
                if let Err(e) = self.sequencer.swap_scale(index) {
                    warn!(index, error = %e, "Scale swap failed");
                }
            }
            RuntimeCommand::Stop => {}
        }
    }
}

/// Control side of a running `SequencerRuntime`
pub struct RuntimeHandle {
    tx: Sender<RuntimeCommand>,
    thread: Option<JoinHandle<Sequencer>>,
}

impl RuntimeHandle {
    pub fn send(&self, command: RuntimeCommand) -> Result<(), RuntimeError> {
        self.tx.send(command).map_err(|_| RuntimeError::NotRunning)
    }

    pub fn gesture(&self, gesture: Gesture) -> Result<(), RuntimeError> {
        self.send(RuntimeCommand::Gesture(gesture))
    }

    pub fn set_tempo(&self, bpm: f64) -> Result<(), RuntimeError> {
        self.send(RuntimeCommand::SetTempo(bpm))
    }

    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the thread, wait for the final save and return the sequencer
    pub fn stop(mut self) -> Result<Sequencer, RuntimeError> {
        let thread = self.thread.take().ok_or(RuntimeError::NotRunning)?;
        // A finished thread has already dropped its receiver
        let _ = self.tx.send(RuntimeCommand::Stop);
        thread.join().map_err(|_| RuntimeError::Panicked)
    }
}

impl Drop for RuntimeHandle {
    fn drop(&mut self) {
        if let Some(thread) = self.thread.take() {
            let _ = self.tx.send(RuntimeCommand::Stop);
            let _ = thread.join();
        }
    }
}
