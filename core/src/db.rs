use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::types::Type;
use rusqlite::{Connection, params};

use crate::models::{Gender, HistoryKind, HistoryRecord, NewProfile, Profile};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            self.conn
                .execute_batch(
                    "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_key TEXT NOT NULL UNIQUE,
                    birth_date TEXT NOT NULL,
                    gender TEXT NOT NULL CHECK (gender IN ('male', 'female')),
                    height_cm REAL NOT NULL,
                    weight_kg REAL NOT NULL,
                    goal_weight_kg REAL NOT NULL,
                    bmr REAL NOT NULL,
                    updated_on TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS weight_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_key TEXT NOT NULL,
                    weight_kg REAL NOT NULL,
                    date TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS goal_weight_history (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_key TEXT NOT NULL,
                    goal_weight_kg REAL NOT NULL,
                    date TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_weight_history_user ON weight_history(user_key, date);
                CREATE INDEX IF NOT EXISTS idx_goal_weight_history_user ON goal_weight_history(user_key, date);

                PRAGMA user_version = 1;",
                )
                .context("Failed to run database migration v1")?;
        }

        Ok(())
    }

    // --- Profiles ---

    /// Insert or replace the profile for `profile.user_key`. `created_at` survives updates.
    pub fn upsert_profile(&self, profile: &NewProfile) -> Result<Profile> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO users (user_key, birth_date, gender, height_cm, weight_kg,
                                goal_weight_kg, bmr, updated_on, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(user_key) DO UPDATE SET
                birth_date = excluded.birth_date,
                gender = excluded.gender,
                height_cm = excluded.height_cm,
                weight_kg = excluded.weight_kg,
                goal_weight_kg = excluded.goal_weight_kg,
                bmr = excluded.bmr,
                updated_on = excluded.updated_on",
            params![
                profile.user_key,
                profile.birth_date.format(DATE_FORMAT).to_string(),
                profile.gender.as_str(),
                profile.height_cm,
                profile.weight_kg,
                profile.goal_weight_kg,
                profile.bmr,
                profile.updated_on.format(DATE_FORMAT).to_string(),
                now,
            ],
        )?;
        self.get_profile(&profile.user_key)?
            .context("Profile not found after upsert")
    }

    pub fn get_profile(&self, user_key: &str) -> Result<Option<Profile>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_key, birth_date, gender, height_cm, weight_kg, goal_weight_kg,
                    bmr, updated_on, created_at
             FROM users WHERE user_key = ?1",
        )?;
        let mut rows = stmt.query(params![user_key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::profile_from_row(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_key, birth_date, gender, height_cm, weight_kg, goal_weight_kg,
                    bmr, updated_on, created_at
             FROM users ORDER BY id",
        )?;
        let profiles = stmt
            .query_map([], Self::profile_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(profiles)
    }

    fn profile_from_row(row: &rusqlite::Row) -> rusqlite::Result<Profile> {
        let gender_str: String = row.get(3)?;
        let gender = Gender::from_db(&gender_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("unknown gender '{gender_str}'").into(),
            )
        })?;
        Ok(Profile {
            id: row.get(0)?,
            user_key: row.get(1)?,
            birth_date: date_column(row, 2)?,
            gender,
            height_cm: row.get(4)?,
            weight_kg: row.get(5)?,
            goal_weight_kg: row.get(6)?,
            bmr: row.get(7)?,
            updated_on: date_column(row, 8)?,
            created_at: row.get(9)?,
        })
    }

    // --- History ---

    pub fn record_history(
        &self,
        user_key: &str,
        kind: HistoryKind,
        value_kg: f64,
        date: NaiveDate,
    ) -> Result<HistoryRecord> {
        let now = Local::now().to_rfc3339();
        self.conn.execute(
            &format!(
                "INSERT INTO {} (user_key, {}, date, created_at) VALUES (?1, ?2, ?3, ?4)",
                kind.table(),
                kind.column()
            ),
            params![user_key, value_kg, date.format(DATE_FORMAT).to_string(), now],
        )?;
        Ok(HistoryRecord {
            id: self.conn.last_insert_rowid(),
            user_key: user_key.to_string(),
            kind,
            value_kg,
            date,
        })
    }

    /// Every record of `kind` for `user_key`, oldest first.
    pub fn history(&self, user_key: &str, kind: HistoryKind) -> Result<Vec<HistoryRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, user_key, {}, date FROM {} WHERE user_key = ?1 ORDER BY date, id",
            kind.column(),
            kind.table()
        ))?;
        let records = stmt
            .query_map(params![user_key], |row| {
                Ok(HistoryRecord {
                    id: row.get(0)?,
                    user_key: row.get(1)?,
                    kind,
                    value_kg: row.get(2)?,
                    date: date_column(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

fn date_column(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
