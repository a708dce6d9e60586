//! Database module for Planting Console
//! Handles SQLite storage for the planting run history

use crate::types::{PlantingRequest, Progress};
use rusqlite::{params, Connection, Result};
use std::path::Path;
use tracing::debug;

/// How a recorded run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Stopped,
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "stopped" => Some(Self::Stopped),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// A planting run as stored in history
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub request: PlantingRequest,
    pub outcome: Option<RunOutcome>,
    pub progress: Option<Progress>,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        debug!(path = %path.display(), "Database opened");
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                x REAL NOT NULL,
                y REAL NOT NULL,
                column_separation REAL NOT NULL,
                seed_spacing REAL NOT NULL,
                dispense_water INTEGER NOT NULL,
                outcome TEXT,
                current_progress REAL,
                target_progress REAL
            );

            CREATE INDEX IF NOT EXISTS idx_runs_started_at ON runs(started_at);",
        )?;
        Ok(())
    }

    /// Insert a new unfinished run, returning its id
    pub fn record_start(&self, request: &PlantingRequest) -> Result<i64> {
        let started_at = chrono::Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, x, y, column_separation, seed_spacing, dispense_water)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                started_at,
                request.x,
                request.y,
                request.column_separation,
                request.seed_spacing,
                request.dispense_water as i32
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(run_id = id, "Run recorded");
        Ok(id)
    }

    /// Finish a run. Returns false if the run was already finished or doesn't exist.
    pub fn record_outcome(
        &self,
        run_id: i64,
        outcome: RunOutcome,
        progress: Option<Progress>,
    ) -> Result<bool> {
        let finished_at = chrono::Local::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET outcome = ?1, finished_at = ?2, current_progress = ?3, target_progress = ?4
             WHERE id = ?5 AND outcome IS NULL",
            params![
                outcome.as_str(),
                finished_at,
                progress.map(|p| p.current),
                progress.map(|p| p.target),
                run_id
            ],
        )?;
        Ok(updated == 1)
    }

    /// Newest runs first
    pub fn recent_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, finished_at, x, y, column_separation, seed_spacing,
                    dispense_water, outcome, current_progress, target_progress
             FROM runs ORDER BY id DESC LIMIT ?1",
        )?;

        let runs = stmt
            .query_map(params![limit as i64], |row| {
                let outcome: Option<String> = row.get(8)?;
                let current: Option<f64> = row.get(9)?;
                let target: Option<f64> = row.get(10)?;
                Ok(RunRecord {
                    id: row.get(0)?,
                    started_at: row.get(1)?,
                    finished_at: row.get(2)?,
                    request: PlantingRequest {
                        x: row.get(3)?,
                        y: row.get(4)?,
                        column_separation: row.get(5)?,
                        seed_spacing: row.get(6)?,
                        dispense_water: row.get::<_, i32>(7)? != 0,
                    },
                    outcome: outcome.as_deref().and_then(RunOutcome::parse),
                    progress: current
                        .zip(target)
                        .map(|(current, target)| Progress { current, target }),
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(runs)
    }

    /// Clear all runs from database
    pub fn clear_runs(&self) -> Result<()> {
        self.conn.execute("DELETE FROM runs", [])?;
        Ok(())
    }
}
