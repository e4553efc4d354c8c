//! memoria: headless ambient session with a console trigger monitor

mod config;

use std::time::{Duration, Instant};

use crossbeam_channel::RecvTimeoutError;
use memoria_core::{HistoryStore, NoPersistence, Sequencer};
use memoria_services::{ChannelSoundEngine, JsonHistoryStore, NoteTrigger, SequencerRuntime};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("memoria=debug".parse()?))
        .init();

    info!("Starting memoria");

    let path = config::config_path();
    let config = config::load_config();
    if !path.exists() {
        config::save_config(&config);
        info!(path = %path.display(), "Wrote default config");
    }

    let sequencer = Sequencer::new(config.sequencer.clone())?;
    let store = history_store(&config.player);
    let (engine, triggers) = ChannelSoundEngine::bounded(1024);
    let handle = SequencerRuntime::spawn(sequencer, engine, store, config.player.runtime)?;

    let deadline = config
        .player
        .duration_secs
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .map(|d| Instant::now() + d);
    loop {
        let wait = deadline.map_or(Duration::from_millis(500), |d| {
            d.saturating_duration_since(Instant::now()).min(Duration::from_millis(500))
        });
        match triggers.recv_timeout(wait) {
            Ok(trigger) => print_trigger(&trigger),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Sequencer thread exited");
                break;
            }
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
    }

    let sequencer = handle.stop()?;
    info!(tempo = sequencer.tempo(), scale = sequencer.current_scale_index(), "Session ended");
    Ok(())
}

fn history_store(settings: &config::PlayerSettings) -> Box<dyn HistoryStore + Send> {
    if !settings.persist {
        return Box::new(NoPersistence);
    }
    let dir = settings.history_dir.clone().or_else(JsonHistoryStore::default_dir);
    match dir {
        Some(dir) => {
            info!(dir = %dir.display(), "Persisting histories");
            Box::new(JsonHistoryStore::new(dir))
        }
        None => {
            warn!("No data directory, histories will not persist");
            Box::new(NoPersistence)
        }
    }
}

fn print_trigger(trigger: &NoteTrigger) {
    println!(
        "{:>9.3}s  {:<10} {:<12} {:.3}s",
        trigger.time,
        trigger.voice.as_str(),
        trigger.names(),
        trigger.duration
    );
}
