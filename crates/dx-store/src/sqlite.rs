//! SQLite-backed [`MovementStore`].
//!
//! One database file holds three tables: `movements`, `incidents` and
//! `log_entries`.  The connection sits behind a mutex and every call runs on
//! the blocking pool; change events are published before the mutex is
//! released, so feed order equals commit order.
//!
//! Finalization is a single conditional statement:
//!
//! ```sql
//! UPDATE movements SET status = 'DEPLOYED', ...
//!  WHERE session = ?1 AND resource = ?2
//!    AND status = 'MOVING' AND epoch_start = ?3
//! ```

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use dx_core::{Epoch, GeoPoint, IncidentId, ResourceId, SessionId};
use dx_mobility::{
    ChangeEvent, ChangeFeed, ChangeKind, FEED_CAPACITY, FinalizeOutcome, Incident, LogEntry,
    MovementRecord, MovementRow, MovementState, MovementStore, StoreError, StoreResult,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS movements (
        session         TEXT    NOT NULL,
        resource        TEXT    NOT NULL,
        status          TEXT    NOT NULL,
        position_lat    REAL,
        position_lng    REAL,
        origin_lat      REAL,
        origin_lng      REAL,
        destination_lat REAL,
        destination_lng REAL,
        epoch_start     INTEGER,
        speed_mps       REAL,
        PRIMARY KEY (session, resource)
    );
    CREATE TABLE IF NOT EXISTS incidents (
        session    TEXT    NOT NULL,
        id         TEXT    NOT NULL,
        title      TEXT    NOT NULL,
        lat        REAL    NOT NULL,
        lng        REAL    NOT NULL,
        solved     INTEGER NOT NULL,
        created_at INTEGER NOT NULL,
        PRIMARY KEY (session, id)
    );
    CREATE TABLE IF NOT EXISTS log_entries (
        seq      INTEGER PRIMARY KEY AUTOINCREMENT,
        id       TEXT    NOT NULL,
        session  TEXT    NOT NULL,
        resource TEXT,
        message  TEXT    NOT NULL,
        at       INTEGER NOT NULL
    );";

const MOVEMENT_COLUMNS: &str = "session, resource, status, position_lat, position_lng, \
     origin_lat, origin_lng, destination_lat, destination_lng, epoch_start, speed_mps";

const INCIDENT_COLUMNS: &str = "session, id, title, lat, lng, solved, created_at";

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn point(lat: Option<f64>, lng: Option<f64>) -> Option<GeoPoint> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
        _ => None,
    }
}

// ── Row decoding ──────────────────────────────────────────────────────────────

// Column values as stored; status and motion are validated afterwards.
struct RawMovement {
    session:     String,
    resource:    String,
    status:      String,
    position:    Option<GeoPoint>,
    origin:      Option<GeoPoint>,
    destination: Option<GeoPoint>,
    epoch_start: Option<i64>,
    speed_mps:   Option<f64>,
}

fn raw_movement(row: &Row<'_>) -> rusqlite::Result<RawMovement> {
    Ok(RawMovement {
        session:     row.get(0)?,
        resource:    row.get(1)?,
        status:      row.get(2)?,
        position:    point(row.get(3)?, row.get(4)?),
        origin:      point(row.get(5)?, row.get(6)?),
        destination: point(row.get(7)?, row.get(8)?),
        epoch_start: row.get(9)?,
        speed_mps:   row.get(10)?,
    })
}

fn decode_movement(raw: RawMovement) -> StoreResult<MovementRecord> {
    MovementRecord::try_from(MovementRow {
        session:     SessionId::new(raw.session),
        resource:    ResourceId::new(raw.resource),
        status:      raw.status.parse()?,
        position:    raw.position,
        origin:      raw.origin,
        destination: raw.destination,
        epoch_start: raw.epoch_start.map(Epoch::from_millis),
        speed_mps:   raw.speed_mps,
    })
}

fn incident(row: &Row<'_>) -> rusqlite::Result<Incident> {
    Ok(Incident {
        session:    SessionId::new(row.get::<_, String>(0)?),
        id:         IncidentId::new(row.get::<_, String>(1)?),
        title:      row.get(2)?,
        position:   GeoPoint::new(row.get(3)?, row.get(4)?),
        solved:     row.get::<_, i64>(5)? != 0,
        created_at: Epoch::from_millis(row.get(6)?),
    })
}

fn select_movement(
    conn:     &Connection,
    session:  &str,
    resource: &str,
) -> StoreResult<Option<MovementRecord>> {
    let raw = conn
        .query_row(
            &format!("SELECT {MOVEMENT_COLUMNS} FROM movements WHERE session = ?1 AND resource = ?2"),
            params![session, resource],
            raw_movement,
        )
        .optional()
        .map_err(backend)?;
    raw.map(decode_movement).transpose()
}

fn select_incident(conn: &Connection, session: &str, id: &str) -> StoreResult<Option<Incident>> {
    conn.query_row(
        &format!("SELECT {INCIDENT_COLUMNS} FROM incidents WHERE session = ?1 AND id = ?2"),
        params![session, id],
        incident,
    )
    .optional()
    .map_err(backend)
}

fn select_incidents(conn: &Connection, session: &str) -> StoreResult<Vec<Incident>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE session = ?1 ORDER BY created_at, id"
        ))
        .map_err(backend)?;
    let rows = stmt.query_map(params![session], incident).map_err(backend)?;
    rows.collect::<rusqlite::Result<Vec<_>>>().map_err(backend)
}

fn select_movements(conn: &Connection, session: &str) -> StoreResult<Vec<MovementRecord>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE session = ?1 ORDER BY resource"
        ))
        .map_err(backend)?;
    let raws = stmt
        .query_map(params![session], raw_movement)
        .map_err(backend)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(backend)?;
    raws.into_iter().map(decode_movement).collect()
}

/// Resources with a movement row in `session`, read without decoding the row.
fn select_movement_keys(conn: &Connection, session: &str) -> StoreResult<Vec<ResourceId>> {
    let mut stmt = conn
        .prepare_cached("SELECT resource FROM movements WHERE session = ?1 ORDER BY resource")
        .map_err(backend)?;
    let rows = stmt
        .query_map(params![session], |row| row.get::<_, String>(0))
        .map_err(backend)?;
    rows.map(|r| r.map(ResourceId::new)).collect::<rusqlite::Result<Vec<_>>>().map_err(backend)
}

/// Incidents of `session` that still decode; unreadable rows are skipped.
fn select_incidents_lenient(conn: &Connection, session: &str) -> StoreResult<Vec<Incident>> {
    let mut stmt = conn
        .prepare_cached(&format!(
            "SELECT {INCIDENT_COLUMNS} FROM incidents WHERE session = ?1 ORDER BY created_at, id"
        ))
        .map_err(backend)?;
    let rows = stmt.query_map(params![session], incident).map_err(backend)?;
    Ok(rows
        .filter_map(|row| match row {
            Ok(incident) => Some(incident),
            Err(error) => {
                warn!(%session, %error, "unreadable incident row, deleted without an event");
                None
            }
        })
        .collect())
}

// ── SqliteStore ───────────────────────────────────────────────────────────────

/// Replicated store persisted in one SQLite database.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    feed: broadcast::Sender<ChangeEvent>,
}

impl SqliteStore {
    /// Open (or create) the database at `path` and initialise the schema.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path).map_err(backend)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )
        .map_err(backend)?;
        debug!(path = %path.display(), "opened sqlite store");
        Self::with_connection(conn)
    }

    /// A private database that disappears with the store.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory().map_err(backend)?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        conn.execute_batch(SCHEMA).map_err(backend)?;
        let (feed, _) = broadcast::channel(FEED_CAPACITY);
        Ok(Self { conn: Arc::new(Mutex::new(conn)), feed })
    }

    /// Run `op` on the blocking pool with the connection locked.
    async fn run<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection, &broadcast::Sender<ChangeEvent>) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let feed = self.feed.clone();
        tokio::task::spawn_blocking(move || {
            let conn = conn.lock().unwrap_or_else(PoisonError::into_inner);
            op(&conn, &feed)
        })
        .await
        .map_err(|e| StoreError::Backend(format!("store task failed: {e}")))?
    }
}

#[async_trait]
impl MovementStore for SqliteStore {
    async fn upsert(&self, record: MovementRecord) -> StoreResult<()> {
        self.run(move |conn, feed| {
            let flat = MovementRow::from(&record);
            let tx = conn.unchecked_transaction().map_err(backend)?;
            let existed = tx
                .query_row(
                    "SELECT 1 FROM movements WHERE session = ?1 AND resource = ?2",
                    params![flat.session.as_str(), flat.resource.as_str()],
                    |_| Ok(()),
                )
                .optional()
                .map_err(backend)?
                .is_some();
            tx.execute(
                &format!(
                    "INSERT INTO movements ({MOVEMENT_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
                     ON CONFLICT (session, resource) DO UPDATE SET \
                         status          = excluded.status, \
                         position_lat    = excluded.position_lat, \
                         position_lng    = excluded.position_lng, \
                         origin_lat      = excluded.origin_lat, \
                         origin_lng      = excluded.origin_lng, \
                         destination_lat = excluded.destination_lat, \
                         destination_lng = excluded.destination_lng, \
                         epoch_start     = excluded.epoch_start, \
                         speed_mps       = excluded.speed_mps"
                ),
                params![
                    flat.session.as_str(),
                    flat.resource.as_str(),
                    flat.status.as_str(),
                    flat.position.map(|p| p.lat),
                    flat.position.map(|p| p.lng),
                    flat.origin.map(|p| p.lat),
                    flat.origin.map(|p| p.lng),
                    flat.destination.map(|p| p.lat),
                    flat.destination.map(|p| p.lng),
                    flat.epoch_start.map(Epoch::as_millis),
                    flat.speed_mps,
                ],
            )
            .map_err(backend)?;
            tx.commit().map_err(backend)?;

            let kind = if existed { ChangeKind::Update } else { ChangeKind::Insert };
            let _ = feed.send(ChangeEvent::movement(kind, record));
            Ok(())
        })
        .await
    }

    async fn get(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
    ) -> StoreResult<Option<MovementRecord>> {
        let (session, resource) = (session.clone(), resource.clone());
        self.run(move |conn, _| select_movement(conn, session.as_str(), resource.as_str()))
            .await
    }

    async fn list(&self, session: &SessionId) -> StoreResult<Vec<MovementRecord>> {
        let session = session.clone();
        self.run(move |conn, _| select_movements(conn, session.as_str())).await
    }

    async fn finalize(
        &self,
        session:  &SessionId,
        resource: &ResourceId,
        epoch:    Epoch,
    ) -> StoreResult<FinalizeOutcome> {
        let (session, resource) = (session.clone(), resource.clone());
        self.run(move |conn, feed| {
            let changed = conn
                .execute(
                    "UPDATE movements SET \
                         status          = 'DEPLOYED', \
                         position_lat    = destination_lat, \
                         position_lng    = destination_lng, \
                         origin_lat      = NULL, \
                         origin_lng      = NULL, \
                         destination_lat = NULL, \
                         destination_lng = NULL, \
                         epoch_start     = NULL, \
                         speed_mps       = NULL \
                     WHERE session = ?1 AND resource = ?2 \
                       AND status = 'MOVING' AND epoch_start = ?3",
                    params![session.as_str(), resource.as_str(), epoch.as_millis()],
                )
                .map_err(backend)?;
            if changed == 0 {
                return Ok(FinalizeOutcome::Stale);
            }
            if let Some(record) = select_movement(conn, session.as_str(), resource.as_str())? {
                let _ = feed.send(ChangeEvent::movement(ChangeKind::Update, record));
            }
            Ok(FinalizeOutcome::Applied)
        })
        .await
    }

    async fn insert_incident(&self, incident: Incident) -> StoreResult<()> {
        self.run(move |conn, feed| {
            if select_incident(conn, incident.session.as_str(), incident.id.as_str())?.is_some() {
                return Err(StoreError::DuplicateIncident(incident.id));
            }
            conn.execute(
                &format!("INSERT INTO incidents ({INCIDENT_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
                params![
                    incident.session.as_str(),
                    incident.id.as_str(),
                    incident.title,
                    incident.position.lat,
                    incident.position.lng,
                    incident.solved as i64,
                    incident.created_at.as_millis(),
                ],
            )
            .map_err(backend)?;
            let _ = feed.send(ChangeEvent::incident(ChangeKind::Insert, incident));
            Ok(())
        })
        .await
    }

    async fn resolve_incident(
        &self,
        session: &SessionId,
        id:      &IncidentId,
    ) -> StoreResult<Incident> {
        let (session, id) = (session.clone(), id.clone());
        self.run(move |conn, feed| {
            let changed = conn
                .execute(
                    "UPDATE incidents SET solved = 1 WHERE session = ?1 AND id = ?2",
                    params![session.as_str(), id.as_str()],
                )
                .map_err(backend)?;
            if changed == 0 {
                return Err(StoreError::IncidentNotFound(id));
            }
            let incident = select_incident(conn, session.as_str(), id.as_str())?
                .ok_or(StoreError::IncidentNotFound(id))?;
            let _ = feed.send(ChangeEvent::incident(ChangeKind::Update, incident.clone()));
            Ok(incident)
        })
        .await
    }

    async fn list_incidents(&self, session: &SessionId) -> StoreResult<Vec<Incident>> {
        let session = session.clone();
        self.run(move |conn, _| select_incidents(conn, session.as_str())).await
    }

    async fn append_log(&self, entry: LogEntry) -> StoreResult<()> {
        self.run(move |conn, feed| {
            conn.execute(
                "INSERT INTO log_entries (id, session, resource, message, at) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    entry.id.to_string(),
                    entry.session.as_str(),
                    entry.resource.as_ref().map(|r| r.as_str()),
                    entry.message,
                    entry.at.as_millis(),
                ],
            )
            .map_err(backend)?;
            let _ = feed.send(ChangeEvent::log(entry));
            Ok(())
        })
        .await
    }

    async fn list_log(&self, session: &SessionId) -> StoreResult<Vec<LogEntry>> {
        let session = session.clone();
        self.run(move |conn, _| {
            let mut stmt = conn
                .prepare_cached(
                    "SELECT id, session, resource, message, at FROM log_entries \
                     WHERE session = ?1 ORDER BY seq",
                )
                .map_err(backend)?;
            let rows = stmt
                .query_map(params![session.as_str()], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                })
                .map_err(backend)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(backend)?;

            rows.into_iter()
                .map(|(id, session, resource, message, at)| {
                    let id = Uuid::parse_str(&id)
                        .map_err(|e| StoreError::Decode(format!("log id {id:?}: {e}")))?;
                    Ok(LogEntry {
                        id,
                        session: SessionId::new(session),
                        resource: resource.map(ResourceId::new),
                        message,
                        at: Epoch::from_millis(at),
                    })
                })
                .collect()
        })
        .await
    }

    async fn reset_session(&self, session: &SessionId) -> StoreResult<()> {
        let session = session.clone();
        self.run(move |conn, feed| {
            // Malformed rows must not block a reset, so movement deletes are
            // published from the keys alone.
            let resources = select_movement_keys(conn, session.as_str())?;
            let incidents = select_incidents_lenient(conn, session.as_str())?;

            let tx = conn.unchecked_transaction().map_err(backend)?;
            tx.execute("DELETE FROM movements WHERE session = ?1", params![session.as_str()])
                .map_err(backend)?;
            tx.execute("DELETE FROM incidents WHERE session = ?1", params![session.as_str()])
                .map_err(backend)?;
            tx.commit().map_err(backend)?;

            for resource in resources {
                let gone = MovementRecord::new(session.clone(), resource, MovementState::AtBase);
                let _ = feed.send(ChangeEvent::movement(ChangeKind::Delete, gone));
            }
            for incident in incidents {
                let _ = feed.send(ChangeEvent::incident(ChangeKind::Delete, incident));
            }
            Ok(())
        })
        .await
    }

    fn subscribe(&self, session: &SessionId) -> ChangeFeed {
        ChangeFeed::new(self.feed.subscribe(), session.clone())
    }
}
