//! Simulated live location of the Fretor
//!
//! Once a booking is confirmed the tracker initializes the map, places a marker
//! at the origin, and then nudges it every interval by a small uniform random
//! offset. The walk is noisy on purpose and stays within `max_drift` of the
//! origin on each axis.
//!
//! Lifecycle:
//! - `start` spawns the tracking task; calling it again while a run exists is a no-op
//! - map initialization is polled while the renderer reports `NotLoaded`,
//!   up to `init_max_attempts`, then the run gives up quietly
//! - `stop` signals the task and waits for it; the task destroys the map once
//! - dropping the tracker signals the task as well


use crate::domain::types::LatLng;
use crate::infra::config::TrackerSettings;
use crate::infra::metrics::Metrics;
use crate::io::map::{MapError, MapSurface, TileLayerOptions};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Counts a live interval loop for as long as it is held
struct TimerGuard(Arc<AtomicUsize>);

impl TimerGuard {
    fn acquire(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

struct ActiveRun {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<Box<dyn MapSurface>>,
}

/// Owns the map handle and the position-update loop
pub struct SimulatedTracker {
    settings: TrackerSettings,
    /// Present while no run holds it
    map: Option<Box<dyn MapSurface>>,
    run: Option<ActiveRun>,
    position_tx: Arc<watch::Sender<LatLng>>,
    active_timers: Arc<AtomicUsize>,
    metrics: Arc<Metrics>,
}

impl SimulatedTracker {
    pub fn new(settings: TrackerSettings, map: Box<dyn MapSurface>, metrics: Arc<Metrics>) -> Self {
        let (position_tx, _) = watch::channel(settings.origin);
        Self {
            settings,
            map: Some(map),
            run: None,
            position_tx: Arc::new(position_tx),
            active_timers: Arc::new(AtomicUsize::new(0)),
            metrics,
        }
    }

    /// Start tracking. Returns false when a run already exists.
    pub fn start(&mut self) -> bool {
        if self.run.is_some() {
            debug!("tracker_start_ignored");
            return false;
        }
        let Some(map) = self.map.take() else {
            warn!("tracker_map_unavailable");
            return false;
        };

        let rng = match self.settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.position_tx.send_replace(self.settings.origin);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = TrackingTask {
            settings: self.settings.clone(),
            rng,
            position_tx: self.position_tx.clone(),
            shutdown_rx,
            active_timers: self.active_timers.clone(),
            metrics: self.metrics.clone(),
        };
        let handle = tokio::spawn(task.run(map));
        self.run = Some(ActiveRun { shutdown_tx, handle });

        info!(
            origin = %self.settings.origin,
            interval_ms = self.settings.interval.as_millis() as u64,
            "tracker_started"
        );
        true
    }

    /// Stop tracking and release the map. Safe to call any number of times.
    pub async fn stop(&mut self) {
        let Some(run) = self.run.take() else {
            return;
        };
        let _ = run.shutdown_tx.send(true);
        match run.handle.await {
            Ok(map) => self.map = Some(map),
            Err(e) => warn!(error = %e, "tracker_task_join_failed"),
        }
        info!("tracker_stopped");
    }

    /// Whether a run exists and its task is still alive
    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.handle.is_finished())
    }

    /// Number of live interval loops (0 or 1)
    pub fn active_timers(&self) -> usize {
        self.active_timers.load(Ordering::SeqCst)
    }

    /// Latest published position
    pub fn position(&self) -> LatLng {
        *self.position_tx.borrow()
    }

    /// Read-only stream of positions
    pub fn subscribe(&self) -> watch::Receiver<LatLng> {
        self.position_tx.subscribe()
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }
}

impl Drop for SimulatedTracker {
    fn drop(&mut self) {
        if let Some(run) = self.run.take() {
            let _ = run.shutdown_tx.send(true);
        }
    }
}

struct TrackingTask {
    settings: TrackerSettings,
    rng: StdRng,
    position_tx: Arc<watch::Sender<LatLng>>,
    shutdown_rx: watch::Receiver<bool>,
    active_timers: Arc<AtomicUsize>,
    metrics: Arc<Metrics>,
}

impl TrackingTask {
    async fn run(mut self, mut map: Box<dyn MapSurface>) -> Box<dyn MapSurface> {
        if !self.initialize(map.as_mut()).await {
            return map;
        }

        let _timer = TimerGuard::acquire(&self.active_timers);
        let period = self.settings.interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut position = self.settings.origin;

        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_rx.changed() => break,
                _ = ticker.tick() => {
                    position = next_position(
                        position,
                        self.settings.origin,
                        self.settings.step_span,
                        self.settings.max_drift,
                        &mut self.rng,
                    );
                    map.set_marker_position(position.lat, position.lng);
                    self.position_tx.send_replace(position);
                    self.metrics.record_tracker_tick();
                    debug!(position = %position, "tracker_tick");
                }
            }
        }

        map.destroy_map();
        map
    }

    /// Poll until the map initializes. Returns false when the run should end.
    async fn initialize(&mut self, map: &mut dyn MapSurface) -> bool {
        let max_attempts = self.settings.init_max_attempts;
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match init_map(map, &self.settings) {
                Ok(()) => {
                    debug!(attempt = attempt, "tracker_map_ready");
                    return true;
                }
                Err(MapError::NotLoaded) if attempt < max_attempts => {
                    tokio::select! {
                        _ = sleep(self.settings.init_retry_interval) => {}
                        _ = self.shutdown_rx.changed() => return false,
                    }
                }
                Err(e) => {
                    warn!(error = %e, attempts = attempt, "tracker_map_init_gave_up");
                    self.metrics.record_tracker_init_failure();
                    return false;
                }
            }
        }
    }
}

/// Create the map, tile layer and marker. A half-built map is torn down.
fn init_map(map: &mut dyn MapSurface, settings: &TrackerSettings) -> Result<(), MapError> {
    map.create_map(settings.origin, settings.zoom)?;
    let opts = TileLayerOptions {
        max_zoom: settings.max_zoom,
        attribution: settings.attribution.clone(),
    };
    let rest = map
        .add_tile_layer(&settings.tile_url, &opts)
        .and_then(|_| map.create_marker(settings.origin, &settings.marker_label));
    if let Err(e) = rest {
        map.destroy_map();
        return Err(e);
    }
    Ok(())
}

/// One random-walk step: uniform offset in `[-span/2, span/2]` per axis,
/// clamped to `max_drift` around the origin
pub(crate) fn next_position<R: Rng>(
    current: LatLng,
    origin: LatLng,
    span: f64,
    max_drift: f64,
    rng: &mut R,
) -> LatLng {
    let half = span / 2.0;
    let (d_lat, d_lng) = if half > 0.0 {
        (rng.gen_range(-half..=half), rng.gen_range(-half..=half))
    } else {
        (0.0, 0.0)
    };
    current.offset(d_lat, d_lng).clamp_around(origin, max_drift)
}
