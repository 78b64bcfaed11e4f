//! drill: several independent operator clients sharing one dispatch session.
//!
//! Every client runs its own frame loop, route resolver and finalizer against
//! a single store (in memory, or SQLite with `DRILL_DB`).  Simulated
//! operators dispatch, redirect and recall resources and open incidents at
//! random, seeded by `DRILL_SEED`.  At the end the replicated rows are
//! printed; with `DRILL_OUTPUT` each client's markers are exported to CSV.

mod config;

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use dx_animator::{AnimatorBuilder, AnimatorObserver, Client, spawn_client_tasks};
use dx_core::{Epoch, GeoPoint, OperatorRng, ResourceId, SessionId, SyncConfig, SystemClock};
use dx_fleet::{Fleet, default_roster, load_fleet_csv};
use dx_mobility::{Dispatcher, MemoryStore, MovementState, MovementStore};
use dx_output::{CsvWriter, TrackObserver};
use dx_spatial::{OsrmRouter, RouteResolver, Router, StraightLineRouter};
use dx_store::SqliteStore;

use config::{ACTION_PERIOD_MS, DrillConfig, SAMPLE_EVERY_FRAMES};

type SharedRouter = Arc<dyn Router>;
type DrillClient<S> = Client<Arc<S>, SystemClock, SharedRouter>;

// Destinations are drawn from this box around the three default stations.
const LAT_RANGE: (f64, f64) = (59.40, 59.95);
const LNG_RANGE: (f64, f64) = (10.60, 11.00);

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

// ── Observer wrapper to count events ─────────────────────────────────────────

struct DrillObserver {
    track:    Option<TrackObserver<CsvWriter>>,
    frames:   u64,
    arrivals: u64,
}

impl DrillObserver {
    fn new(output: Option<&Path>, client: u32) -> Result<Self> {
        let track = match output {
            Some(dir) => {
                let dir = dir.join(format!("client-{client}"));
                let writer = CsvWriter::new(&dir)
                    .with_context(|| format!("opening track export in {}", dir.display()))?;
                Some(TrackObserver::new(writer, SAMPLE_EVERY_FRAMES))
            }
            None => None,
        };
        Ok(Self { track, frames: 0, arrivals: 0 })
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(track) = self.track.as_mut() {
            track.finish()?;
        }
        Ok(())
    }
}

impl AnimatorObserver for DrillObserver {
    fn on_frame_start(&mut self, now: Epoch) {
        if let Some(t) = self.track.as_mut() {
            t.on_frame_start(now);
        }
    }

    fn on_position(&mut self, resource: &ResourceId, position: GeoPoint, now: Epoch) {
        if let Some(t) = self.track.as_mut() {
            t.on_position(resource, position, now);
        }
    }

    fn on_arrival(&mut self, resource: &ResourceId, epoch: Epoch, at: GeoPoint, now: Epoch) {
        self.arrivals += 1;
        if let Some(t) = self.track.as_mut() {
            t.on_arrival(resource, epoch, at, now);
        }
    }

    fn on_settled(&mut self, resource: &ResourceId, position: GeoPoint) {
        if let Some(t) = self.track.as_mut() {
            t.on_settled(resource, position);
        }
    }

    fn on_removed(&mut self, resource: &ResourceId) {
        if let Some(t) = self.track.as_mut() {
            t.on_removed(resource);
        }
    }

    fn on_frame_end(&mut self, now: Epoch, moving: usize) {
        self.frames += 1;
        if let Some(t) = self.track.as_mut() {
            t.on_frame_end(now, moving);
        }
    }
}

// ── Simulated operator ────────────────────────────────────────────────────────

fn random_point(rng: &mut OperatorRng) -> GeoPoint {
    GeoPoint::new(rng.gen_range(LAT_RANGE.0..LAT_RANGE.1), rng.gen_range(LNG_RANGE.0..LNG_RANGE.1))
}

/// One random operator action through the client's own session context.
async fn act<S: MovementStore + 'static>(
    client:    &mut DrillClient<S>,
    rng:       &mut OperatorRng,
    resources: &[ResourceId],
    actions:   u64,
) {
    if rng.gen_bool(0.1) {
        client.session_mut().set_incident_mode(true);
        let title = format!("Drill incident {actions}");
        if let Err(error) = client.click(random_point(rng), Some(title.as_str())).await {
            warn!(%error, "incident not opened");
        }
        return;
    }

    let Some(resource) = rng.choose(resources).cloned() else {
        return;
    };
    let state = client.animator().mirror().state(&resource);
    let recall = match state {
        MovementState::AtBase => false,
        MovementState::Deployed { .. } => rng.gen_bool(0.5),
        MovementState::Moving { .. } => rng.gen_bool(0.2),
    };

    let result = if recall {
        client.recall(&resource).await.map(|_| ())
    } else {
        client.session_mut().select(Some(resource.clone()));
        client.click(random_point(rng), None).await.map(|_| ())
    };
    if let Err(error) = result {
        warn!(resource = %resource, %error, "operator action failed");
    }
}

/// Run one client until `shutdown` fires.  Returns its observer.
async fn operate<S: MovementStore + 'static>(
    mut client:   DrillClient<S>,
    mut observer: DrillObserver,
    mut rng:      OperatorRng,
    resources:    Vec<ResourceId>,
    config:       SyncConfig,
    mut shutdown: watch::Receiver<bool>,
) -> Result<DrillObserver> {
    let mut frames = tokio::time::interval(Duration::from_millis(config.frame_interval_ms));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let pace = rng.gen_range(ACTION_PERIOD_MS.0..=ACTION_PERIOD_MS.1);
    let mut decisions = tokio::time::interval(Duration::from_millis(pace));
    decisions.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if let Err(error) = client.resync(&mut observer).await {
        warn!(%error, "initial resync failed, retrying next frame");
    }
    let mut actions = 0u64;
    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = frames.tick() => {
                client.step(&mut observer).await?;
            }
            _ = decisions.tick() => {
                actions += 1;
                act(&mut client, &mut rng, &resources, actions).await;
            }
        }
    }

    observer.finish()?;
    Ok(observer)
}

// ── Drill ─────────────────────────────────────────────────────────────────────

fn load_fleet(config: &DrillConfig) -> Result<Fleet> {
    match &config.fleet_dir {
        Some(dir) => load_fleet_csv(&dir.join("stations.csv"), &dir.join("resources.csv"))
            .with_context(|| format!("loading fleet from {}", dir.display())),
        None => Ok(default_roster()?),
    }
}

fn make_router(config: &DrillConfig) -> Result<SharedRouter> {
    let router: SharedRouter = match &config.routing_url {
        Some(url) => {
            info!(%url, "routing via provider");
            Arc::new(OsrmRouter::new(url.clone(), config.routing_timeout)?)
        }
        None => {
            info!("ROUTING_URL unset, routing along straight lines");
            Arc::new(StraightLineRouter)
        }
    };
    Ok(router)
}

async fn run_drill<S: MovementStore + 'static>(store: Arc<S>, config: DrillConfig) -> Result<()> {
    let fleet = Arc::new(load_fleet(&config)?);
    let router = make_router(&config)?;
    let sync = config.sync();
    let session = SessionId::new(format!("drill-{}", config.seed));
    let resources: Vec<ResourceId> = fleet.resources().map(|r| r.id.clone()).collect();

    println!(
        "Session {session}: {} clients, {} stations, {} resources, {} s",
        config.clients,
        fleet.station_count(),
        fleet.resource_count(),
        config.duration.as_secs()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut operators = Vec::new();

    for index in 0..config.clients {
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            SystemClock,
            Arc::clone(&fleet),
            sync.clone(),
            session.clone(),
        ));
        let resolver = Arc::new(RouteResolver::new(Arc::clone(&router), sync.default_anchor));
        let (animator, queues) = AnimatorBuilder::new(Arc::clone(&resolver), session.clone())
            .config(sync.clone())
            .build()?;
        spawn_client_tasks(resolver, Arc::clone(&dispatcher), queues);

        let client = Client::new(dispatcher, animator);
        let observer = DrillObserver::new(config.output.as_deref(), index)?;
        let rng = OperatorRng::new(config.seed, index);
        operators.push(tokio::spawn(operate(
            client,
            observer,
            rng,
            resources.clone(),
            sync.clone(),
            shutdown_rx.clone(),
        )));
    }

    let t0 = Instant::now();
    tokio::select! {
        _ = tokio::time::sleep(config.duration) => {}
        _ = tokio::signal::ctrl_c() => info!("interrupted"),
    }
    let _ = shutdown_tx.send(true);

    println!();
    println!("{:<8} {:>8} {:>9}", "Client", "Frames", "Arrivals");
    println!("{}", "-".repeat(27));
    for (index, handle) in operators.into_iter().enumerate() {
        match handle.await? {
            Ok(observer) => println!("{:<8} {:>8} {:>9}", index, observer.frames, observer.arrivals),
            Err(error) => warn!(client = index, %error, "client stopped with an error"),
        }
    }
    println!("Drill ran for {:.1} s", t0.elapsed().as_secs_f64());
    println!();

    // Final replicated state.
    let rows = store.list(&session).await?;
    println!("{:<10} {:<10} {:<24}", "Resource", "Status", "Position");
    println!("{}", "-".repeat(44));
    for resource in &resources {
        let state = rows
            .iter()
            .find(|r| &r.resource == resource)
            .map(|r| r.state)
            .unwrap_or_default();
        let position = state
            .last_known()
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into());
        println!("{:<10} {:<10} {:<24}", resource.as_str(), state.status().as_str(), position);
    }

    let incidents = store.list_incidents(&session).await?;
    let log = store.list_log(&session).await?;
    println!();
    println!("Incidents: {}  |  Log entries: {}", incidents.len(), log.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = DrillConfig::from_env();
    config.sync().validate()?;
    println!("=== drill: rust_dispatch movement sync ===");

    match config.db.clone() {
        Some(path) => {
            let store = SqliteStore::open(&path)
                .with_context(|| format!("opening {}", path.display()))?;
            run_drill(Arc::new(store), config).await
        }
        None => run_drill(Arc::new(MemoryStore::new()), config).await,
    }
}
