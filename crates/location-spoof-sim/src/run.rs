use crate::settings::Settings;
use location_spoof_lib::{
    AllowList, Path, PersistedSettings, ProfileStore, SpoofError, SpoofedLocationSample,
    SpoofingEngine, StorageError,
};
use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Spoof(#[from] SpoofError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to encode sample: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Nothing to simulate: pass --gpx, --waypoint or --base, or enable a stored profile")]
    NothingToDo,
}

/// Why the sample loop stopped waiting for ticks
enum LoopExit {
    Finished(bool),
    Deadline,
    Interrupted,
}

/// Run one simulation as described by `settings`
pub async fn run(settings: Settings) -> Result<(), SimError> {
    let store = open_store(&settings);
    let persisted = if settings.ignore_persisted {
        PersistedSettings::default()
    } else {
        store.load_or_default(&settings.profile)
    };

    let engine = SpoofingEngine::with_settings(
        settings.engine_config(),
        Arc::new(AllowList::default()),
        &persisted,
    )?;
    apply_overrides(&engine, &settings);

    let path = load_path(&settings)?;
    let result = match path {
        Some(path) => simulate_movement(&engine, &settings, path).await,
        None => report_static(&engine, &settings),
    };

    if !settings.no_save {
        match store.save(&settings.profile, &engine.settings()) {
            Ok(()) => tracing::debug!(profile = %settings.profile, "Settings saved"),
            Err(e) => tracing::warn!("Failed to save settings: {}", e),
        }
    }
    result
}

fn open_store(settings: &Settings) -> ProfileStore {
    match ProfileStore::open_file(settings.storage.clone()) {
        Ok(store) => store,
        Err(e) => {
            tracing::warn!("Settings storage unavailable ({}); using in-memory storage", e);
            ProfileStore::in_memory()
        }
    }
}

fn apply_overrides(engine: &SpoofingEngine, settings: &Settings) {
    if let Some(mode) = settings.mode {
        engine.set_transportation_mode(mode);
    }
    if settings.jitter {
        engine.set_jitter_enabled(true);
    }
    if let Some(amplitude) = settings.jitter_amplitude {
        engine.set_jitter_amplitude(amplitude);
    }
    if let Some(accuracy) = settings.accuracy {
        engine.set_accuracy_value(accuracy);
    }
}

fn load_path(settings: &Settings) -> Result<Option<Arc<Path>>, SimError> {
    if let Some(gpx_path) = &settings.gpx {
        let file = File::open(gpx_path).map_err(|source| SimError::Open {
            path: gpx_path.display().to_string(),
            source,
        })?;
        let path = Path::from_gpx_reader(BufReader::new(file))?;
        tracing::info!(
            "Loaded {} waypoints ({:.0} m) from {}",
            path.len(),
            path.total_length(),
            gpx_path.display()
        );
        return Ok(Some(path));
    }
    if settings.waypoints.is_empty() {
        return Ok(None);
    }
    Ok(Some(Path::new(settings.waypoints.clone())?))
}

/// Print the single location reported while standing still
fn report_static(engine: &SpoofingEngine, settings: &Settings) -> Result<(), SimError> {
    if let Some(base) = settings.base {
        engine.enable_spoofing(base)?;
        engine.enable_spoofing_toggle();
    }
    if !engine.is_spoofing_enabled() {
        return Err(SimError::NothingToDo);
    }
    let sample = engine.create_realistic_spoofed_location(engine.spoofed_coordinate());
    emit(&sample, settings.json)
}

async fn simulate_movement(
    engine: &SpoofingEngine,
    settings: &Settings,
    path: Arc<Path>,
) -> Result<(), SimError> {
    let origin = settings
        .base
        .or_else(|| path.waypoints().get(settings.start_index).copied())
        .unwrap_or_default();
    engine.enable_spoofing(origin)?;
    engine.enable_spoofing_toggle();

    let mut samples = engine.subscribe();
    let (done_tx, mut done_rx) = oneshot::channel();
    let handle = engine.start_movement(
        path,
        settings.speed,
        settings.start_index,
        Some(Box::new(move |completed: bool| {
            let _ = done_tx.send(completed);
        })),
    )?;
    tracing::info!(
        run_id = handle.id(),
        "Moving at {:.1} m/s as {}, ETA {:.1} s",
        settings.speed,
        engine.transportation_mode(),
        engine.estimated_time_to_complete_current_path()
    );

    let deadline = settings
        .duration
        .map(|seconds| Instant::now() + Duration::from_secs_f64(seconds.max(0.0)));
    let timeout = async move {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(timeout);
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    let exit = loop {
        tokio::select! {
            changed = samples.changed() => {
                if changed.is_err() {
                    break LoopExit::Finished(false);
                }
                let latest = *samples.borrow_and_update();
                if let Some(sample) = latest {
                    emit(&sample, settings.json)?;
                }
            }
            completed = &mut done_rx => break LoopExit::Finished(completed.unwrap_or(false)),
            () = &mut timeout => break LoopExit::Deadline,
            _ = &mut interrupt => break LoopExit::Interrupted,
        }
    };

    let completed = match exit {
        LoopExit::Finished(completed) => completed,
        LoopExit::Deadline | LoopExit::Interrupted => {
            if matches!(exit, LoopExit::Interrupted) {
                tracing::info!("Interrupted");
            }
            handle.cancel();
            done_rx.await.unwrap_or(false)
        }
    };

    // The final sample lands right before completion fires
    if samples.has_changed().unwrap_or(false)
        && let Some(sample) = *samples.borrow_and_update()
    {
        emit(&sample, settings.json)?;
    }

    let stopped_at = engine.spoofed_coordinate();
    tracing::info!(
        completed,
        latitude = stopped_at.latitude,
        longitude = stopped_at.longitude,
        "Movement finished"
    );
    Ok(())
}

fn emit(sample: &SpoofedLocationSample, json: bool) -> Result<(), SimError> {
    if json {
        println!("{}", serde_json::to_string(sample)?);
    } else {
        tracing::info!(
            latitude = sample.coordinate.latitude,
            longitude = sample.coordinate.longitude,
            speed = sample.speed,
            course = sample.course,
            accuracy = sample.accuracy,
            "Location"
        );
    }
    Ok(())
}
