//! Calendar event statements
//!
//! One parameterized statement per function, run on a borrowed connection.
//! Rows are read as `EventRow` tuples in the fixed column order
//! `id, start_time, end_time, person`.

use chrono::NaiveDateTime;
use sqlx::PgConnection;

use super::{CalendarEvent, EventChanges, EventView, NewEvent};

type EventRow = (i64, NaiveDateTime, Option<NaiveDateTime>, String);

fn into_event((id, start_time, end_time, person): EventRow) -> CalendarEvent {
    CalendarEvent {
        id,
        start_time,
        end_time,
        person,
    }
}

/// Insert an event and return its new id.
///
/// Without an end time the column is left out so its default applies.
pub async fn insert(conn: &mut PgConnection, event: &NewEvent) -> Result<i64, sqlx::Error> {
    let id: i64 = match event.end_time {
        Some(end_time) => {
            sqlx::query_scalar(
                r#"
                INSERT INTO calendar_events (start_time, end_time, person)
                VALUES ($1, $2, $3)
                RETURNING id
                "#,
            )
            .bind(event.start_time)
            .bind(end_time)
            .bind(&event.person)
            .fetch_one(&mut *conn)
            .await?
        }
        None => {
            sqlx::query_scalar(
                r#"
                INSERT INTO calendar_events (start_time, person)
                VALUES ($1, $2)
                RETURNING id
                "#,
            )
            .bind(event.start_time)
            .bind(&event.person)
            .fetch_one(&mut *conn)
            .await?
        }
    };

    Ok(id)
}

/// Fetch one event, `None` if no row has this id
pub async fn read(conn: &mut PgConnection, id: i64) -> Result<Option<CalendarEvent>, sqlx::Error> {
    let row: Option<EventRow> = sqlx::query_as(
        r#"
        SELECT id, start_time, end_time, person
        FROM calendar_events
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(into_event))
}

/// Overwrite an event in place and return the updated row, `None` if no row has this id
pub async fn update(
    conn: &mut PgConnection,
    id: i64,
    changes: &EventChanges,
) -> Result<Option<CalendarEvent>, sqlx::Error> {
    tracing::debug!(
        event_id = id,
        start_time = ?changes.start_time,
        end_time = ?changes.end_time,
        "Editing calendar event"
    );

    let row: Option<EventRow> = match changes.end_time {
        Some(end_time) => {
            sqlx::query_as(
                r#"
                UPDATE calendar_events
                SET (person, start_time, end_time) =
                    (COALESCE($1, person), COALESCE($2, start_time), $3)
                WHERE id = $4
                RETURNING id, start_time, end_time, person
                "#,
            )
            .bind(changes.person.as_deref())
            .bind(changes.start_time)
            .bind(end_time)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
        }
        None => {
            sqlx::query_as(
                r#"
                UPDATE calendar_events
                SET (person, start_time) =
                    (COALESCE($1, person), COALESCE($2, start_time))
                WHERE id = $3
                RETURNING id, start_time, end_time, person
                "#,
            )
            .bind(changes.person.as_deref())
            .bind(changes.start_time)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
        }
    };

    Ok(row.map(into_event))
}

/// Remove an event. Returns whether a row was deleted.
pub async fn delete(conn: &mut PgConnection, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Events whose start lies in `[start, end]`, ordered by start time then id
pub async fn list_range(
    conn: &mut PgConnection,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<EventView>, sqlx::Error> {
    let rows: Vec<EventRow> = sqlx::query_as(
        r#"
        SELECT id, start_time, end_time, person
        FROM calendar_events
        WHERE start_time >= $1 AND start_time <= $2
        ORDER BY start_time ASC, id ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| EventView::from(into_event(row)))
        .collect())
}
