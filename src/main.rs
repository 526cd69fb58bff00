//! Ducks - sprite sound driver
//!
//! Loads the audio settings, starts the engine on the best available host,
//! registers the soundtrack and requests each configured effect in turn.

mod settings;

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use ducks_audio::host::{AudioHost, VirtualHost, VirtualHostConfig};
use ducks_audio::Scheduler;
use ducks_core::{Clock, SystemClock};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use settings::Settings;

/// Time between two effect requests
const EFFECT_SPACING: Duration = Duration::from_millis(400);

/// How long to keep ticking after the last request
const TAIL: Duration = Duration::from_secs(3);

fn open_host(clock: Rc<dyn Clock>) -> Rc<dyn AudioHost> {
    #[cfg(feature = "kira")]
    {
        match ducks_audio::host::KiraHost::new() {
            Ok(host) => return Rc::new(host),
            Err(e) => tracing::warn!("{}, continuing without sound", e),
        }
    }

    info!("Running headless on the virtual host");
    Rc::new(VirtualHost::new(VirtualHostConfig::desktop(), clock))
}

fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Ducks...");

    let settings = Settings::load();
    if !Settings::exists() {
        if let Err(e) = settings.save() {
            tracing::warn!("Could not write default settings: {}", e);
        }
    }

    let clock: Rc<dyn Clock> = Rc::new(SystemClock::new());
    let host = open_host(Rc::clone(&clock));
    let mut scheduler = Scheduler::new(host, Rc::clone(&clock), settings.engine_config())
        .context("Failed to start the audio engine")?;

    let soundtrack = scheduler
        .create_unit(settings.soundtrack.clone())
        .context("Failed to load the soundtrack")?;

    for effect in &settings.effects {
        let outcome = scheduler.play(soundtrack, effect.as_str(), false)?;
        info!("Requested '{}': {:?}", effect, outcome);

        let next = clock.now() + EFFECT_SPACING;
        scheduler.run_until(|_| clock.now() >= next);
    }

    let end = clock.now() + TAIL;
    scheduler.run_until(|s| clock.now() >= end && s.queue_len() == 0);

    info!(
        "Finished after {} ticks ({} clones, {} active)",
        scheduler.ticks(),
        scheduler.clone_count(),
        scheduler.active_count()
    );
    Ok(())
}
