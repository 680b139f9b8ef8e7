use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use shared::{
    domain::{Day, DayId, Event, EventId, Schedule, ScheduleId},
    protocol::DayDetails,
    validation::{DayFields, EventFields, ScheduleFields},
};

const DAY_COLUMNS: &str = "d.id, d.schedule_id, d.date, d.label,
    (SELECT COUNT(*) FROM schedule_events e WHERE e.day_id = d.id) AS event_count";

const EVENT_COLUMNS: &str =
    "id, day_id, title, start_time, end_time, location, description, sort_order";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

/// Result of a reorder. Nothing is renumbered unless every id belongs to the day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReorderOutcome {
    Reordered(Vec<Event>),
    UnknownEvent(EventId),
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn load_schedule(&self) -> Result<Option<Schedule>> {
        let row = sqlx::query(
            "SELECT id, name, release_date, is_published FROM schedules ORDER BY id LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .context("failed to load schedule")?;
        row.as_ref().map(schedule_from_row).transpose()
    }

    /// Creates the schedule on first call; afterwards rewrites its name and
    /// release date in place. The published flag is left alone.
    pub async fn upsert_schedule(&self, fields: &ScheduleFields) -> Result<Schedule> {
        let row = sqlx::query(
            "INSERT INTO schedules (singleton, name, release_date) VALUES (1, ?, ?)
             ON CONFLICT(singleton) DO UPDATE SET
                name = excluded.name,
                release_date = excluded.release_date,
                updated_at = CURRENT_TIMESTAMP
             RETURNING id, name, release_date, is_published",
        )
        .bind(&fields.name)
        .bind(fields.release_date)
        .fetch_one(&self.pool)
        .await
        .context("failed to upsert schedule")?;
        schedule_from_row(&row)
    }

    pub async fn update_schedule(
        &self,
        schedule_id: ScheduleId,
        name: &str,
        release_date: NaiveDate,
        is_published: bool,
    ) -> Result<Option<Schedule>> {
        let row = sqlx::query(
            "UPDATE schedules
             SET name = ?, release_date = ?, is_published = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?
             RETURNING id, name, release_date, is_published",
        )
        .bind(name)
        .bind(release_date)
        .bind(is_published)
        .bind(schedule_id.0)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update schedule")?;
        row.as_ref().map(schedule_from_row).transpose()
    }

    /// Deletes every day and event owned by the schedule. The schedule row
    /// itself is kept. Returns the number of days removed.
    pub async fn reset_schedule(&self, schedule_id: ScheduleId) -> Result<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM schedule_events
             WHERE day_id IN (SELECT id FROM schedule_days WHERE schedule_id = ?)",
        )
        .bind(schedule_id.0)
        .execute(&mut *tx)
        .await
        .context("failed to delete schedule events")?;

        let days = sqlx::query("DELETE FROM schedule_days WHERE schedule_id = ?")
            .bind(schedule_id.0)
            .execute(&mut *tx)
            .await
            .context("failed to delete schedule days")?
            .rows_affected();

        tx.commit().await?;
        Ok(days)
    }

    pub async fn list_days(&self, schedule_id: ScheduleId) -> Result<Vec<Day>> {
        let rows = sqlx::query(&format!(
            "SELECT {DAY_COLUMNS} FROM schedule_days d
             WHERE d.schedule_id = ?
             ORDER BY d.date ASC, d.id ASC"
        ))
        .bind(schedule_id.0)
        .fetch_all(&self.pool)
        .await
        .context("failed to list days")?;
        rows.iter().map(day_from_row).collect()
    }

    pub async fn load_day(&self, day_id: DayId) -> Result<Option<Day>> {
        let row = sqlx::query(&format!(
            "SELECT {DAY_COLUMNS} FROM schedule_days d WHERE d.id = ?"
        ))
        .bind(day_id.0)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load day")?;
        row.as_ref().map(day_from_row).transpose()
    }

    pub async fn create_day(&self, schedule_id: ScheduleId, fields: &DayFields) -> Result<Day> {
        let rec = sqlx::query(
            "INSERT INTO schedule_days (schedule_id, date, label) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(schedule_id.0)
        .bind(fields.date)
        .bind(fields.label.as_deref())
        .fetch_one(&self.pool)
        .await
        .context("failed to insert day")?;
        let day_id = DayId(rec.try_get::<i64, _>(0)?);

        Ok(Day {
            id: day_id,
            schedule_id,
            date: fields.date,
            label: fields.label.clone(),
            event_count: 0,
        })
    }

    pub async fn update_day(&self, day_id: DayId, fields: &DayFields) -> Result<Option<Day>> {
        let updated = sqlx::query(
            "UPDATE schedule_days SET date = ?, label = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?",
        )
        .bind(fields.date)
        .bind(fields.label.as_deref())
        .bind(day_id.0)
        .execute(&self.pool)
        .await
        .context("failed to update day")?
        .rows_affected();

        if updated == 0 {
            return Ok(None);
        }
        self.load_day(day_id).await
    }

    /// Removes the day and all of its events. Returns false if the day did
    /// not exist.
    pub async fn delete_day(&self, day_id: DayId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM schedule_events WHERE day_id = ?")
            .bind(day_id.0)
            .execute(&mut *tx)
            .await
            .context("failed to delete day events")?;

        let deleted = sqlx::query("DELETE FROM schedule_days WHERE id = ?")
            .bind(day_id.0)
            .execute(&mut *tx)
            .await
            .context("failed to delete day")?
            .rows_affected();

        tx.commit().await?;
        Ok(deleted > 0)
    }

    pub async fn list_events(&self, day_id: DayId) -> Result<Vec<Event>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM schedule_events
             WHERE day_id = ?
             ORDER BY sort_order ASC, id ASC"
        ))
        .bind(day_id.0)
        .fetch_all(&self.pool)
        .await
        .context("failed to list events")?;
        rows.iter().map(event_from_row).collect()
    }

    pub async fn load_event(&self, event_id: EventId) -> Result<Option<Event>> {
        let row = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM schedule_events WHERE id = ?"
        ))
        .bind(event_id.0)
        .fetch_optional(&self.pool)
        .await
        .context("failed to load event")?;
        row.as_ref().map(event_from_row).transpose()
    }

    pub async fn create_event(&self, day_id: DayId, fields: &EventFields) -> Result<Event> {
        let row = sqlx::query(&format!(
            "INSERT INTO schedule_events
                (day_id, title, start_time, end_time, location, description, sort_order)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(day_id.0)
        .bind(&fields.title)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(fields.location.as_deref())
        .bind(fields.description.as_deref())
        .bind(fields.sort_order)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert event")?;
        event_from_row(&row)
    }

    pub async fn update_event(
        &self,
        event_id: EventId,
        fields: &EventFields,
    ) -> Result<Option<Event>> {
        let row = sqlx::query(&format!(
            "UPDATE schedule_events
             SET title = ?, start_time = ?, end_time = ?, location = ?, description = ?,
                 sort_order = ?, updated_at = CURRENT_TIMESTAMP
             WHERE id = ?
             RETURNING {EVENT_COLUMNS}"
        ))
        .bind(&fields.title)
        .bind(fields.start_time)
        .bind(fields.end_time)
        .bind(fields.location.as_deref())
        .bind(fields.description.as_deref())
        .bind(fields.sort_order)
        .bind(event_id.0)
        .fetch_optional(&self.pool)
        .await
        .context("failed to update event")?;
        row.as_ref().map(event_from_row).transpose()
    }

    pub async fn delete_event(&self, event_id: EventId) -> Result<bool> {
        let deleted = sqlx::query("DELETE FROM schedule_events WHERE id = ?")
            .bind(event_id.0)
            .execute(&self.pool)
            .await
            .context("failed to delete event")?
            .rows_affected();
        Ok(deleted > 0)
    }

    /// Sets `sort_order = index` for each id, in one transaction. An id that
    /// is not an event of `day_id` rolls the whole renumbering back.
    pub async fn reorder_events(
        &self,
        day_id: DayId,
        ordered_ids: &[EventId],
    ) -> Result<ReorderOutcome> {
        let mut tx = self.pool.begin().await?;

        for (index, event_id) in ordered_ids.iter().enumerate() {
            let sort_order = i32::try_from(index).context("too many events to reorder")?;
            let updated = sqlx::query(
                "UPDATE schedule_events SET sort_order = ?, updated_at = CURRENT_TIMESTAMP
                 WHERE id = ? AND day_id = ?",
            )
            .bind(sort_order)
            .bind(event_id.0)
            .bind(day_id.0)
            .execute(&mut *tx)
            .await
            .context("failed to renumber event")?
            .rows_affected();

            if updated == 0 {
                tx.rollback().await?;
                return Ok(ReorderOutcome::UnknownEvent(*event_id));
            }
        }

        tx.commit().await?;
        Ok(ReorderOutcome::Reordered(self.list_events(day_id).await?))
    }

    /// Every day of the schedule with its events, in display order.
    pub async fn schedule_tree(&self, schedule_id: ScheduleId) -> Result<Vec<DayDetails>> {
        let days = self.list_days(schedule_id).await?;

        let rows = sqlx::query(
            "SELECT e.id, e.day_id, e.title, e.start_time, e.end_time, e.location,
                    e.description, e.sort_order
             FROM schedule_events e
             INNER JOIN schedule_days d ON d.id = e.day_id
             WHERE d.schedule_id = ?
             ORDER BY e.day_id, e.sort_order ASC, e.id ASC",
        )
        .bind(schedule_id.0)
        .fetch_all(&self.pool)
        .await
        .context("failed to load schedule events")?;

        let mut events_by_day: HashMap<DayId, Vec<Event>> = HashMap::new();
        for row in &rows {
            let event = event_from_row(row)?;
            events_by_day.entry(event.day_id).or_default().push(event);
        }

        Ok(days
            .into_iter()
            .map(|day| DayDetails {
                events: events_by_day.remove(&day.id).unwrap_or_default(),
                day,
            })
            .collect())
    }
}

fn schedule_from_row(row: &SqliteRow) -> Result<Schedule> {
    Ok(Schedule {
        id: ScheduleId(row.try_get("id")?),
        name: row.try_get("name")?,
        release_date: row.try_get("release_date")?,
        is_published: row.try_get("is_published")?,
    })
}

fn day_from_row(row: &SqliteRow) -> Result<Day> {
    Ok(Day {
        id: DayId(row.try_get("id")?),
        schedule_id: ScheduleId(row.try_get("schedule_id")?),
        date: row.try_get("date")?,
        label: row.try_get("label")?,
        event_count: row.try_get("event_count")?,
    })
}

fn event_from_row(row: &SqliteRow) -> Result<Event> {
    Ok(Event {
        id: EventId(row.try_get("id")?),
        day_id: DayId(row.try_get("day_id")?),
        title: row.try_get("title")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        location: row.try_get("location")?,
        description: row.try_get("description")?,
        sort_order: row.try_get("sort_order")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
