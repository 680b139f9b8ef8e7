use chrono::NaiveDate;
use shared::{
    domain::{Day, DayId, Event, EventId, Schedule},
    error::{ApiError, ErrorCode},
    protocol::{
        Ack, CreateDayRequest, CreateEventRequest, CreateScheduleRequest, PublicSchedule,
        ReorderEventsRequest, ScheduleDetails, UpdateDayRequest, UpdateEventRequest,
        UpdateScheduleRequest,
    },
    validation::{self, merge_day, merge_event, validate_new_day, validate_new_event},
};
use storage::{ReorderOutcome, Storage};
use tracing::info;

pub mod auth;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn get_schedule(ctx: &ApiContext) -> Result<Schedule, ApiError> {
    ctx.storage
        .load_schedule()
        .await
        .map_err(internal)?
        .ok_or_else(no_schedule)
}

pub async fn create_or_update_schedule(
    ctx: &ApiContext,
    req: &CreateScheduleRequest,
) -> Result<Schedule, ApiError> {
    let fields = validation::validate_schedule(req)?;
    let schedule = ctx
        .storage
        .upsert_schedule(&fields)
        .await
        .map_err(internal)?;
    info!(schedule_id = schedule.id.0, name = %schedule.name, "schedule saved");
    Ok(schedule)
}

pub async fn update_schedule(
    ctx: &ApiContext,
    req: &UpdateScheduleRequest,
) -> Result<Schedule, ApiError> {
    let existing = get_schedule(ctx).await?;
    let name = match &req.name {
        Some(name) => validation::schedule_name(Some(name)),
        None => existing.name.clone(),
    };
    let release_date = req.release_date.unwrap_or(existing.release_date);
    let is_published = req.is_published.unwrap_or(existing.is_published);

    let schedule = ctx
        .storage
        .update_schedule(existing.id, &name, release_date, is_published)
        .await
        .map_err(internal)?
        .ok_or_else(no_schedule)?;
    info!(
        schedule_id = schedule.id.0,
        is_published = schedule.is_published,
        "schedule updated"
    );
    Ok(schedule)
}

/// Removes all days and events. The schedule record survives.
pub async fn reset_schedule(ctx: &ApiContext) -> Result<Ack, ApiError> {
    let schedule = get_schedule(ctx).await?;
    let removed = ctx
        .storage
        .reset_schedule(schedule.id)
        .await
        .map_err(internal)?;
    info!(schedule_id = schedule.id.0, removed_days = removed, "schedule reset");
    Ok(Ack::ok(format!("schedule reset; removed {removed} day(s)")))
}

pub async fn schedule_details(ctx: &ApiContext) -> Result<ScheduleDetails, ApiError> {
    let schedule = get_schedule(ctx).await?;
    let days = ctx
        .storage
        .schedule_tree(schedule.id)
        .await
        .map_err(internal)?;
    Ok(ScheduleDetails { schedule, days })
}

/// Read side of the publication gate. Days are only included once the
/// schedule is visible on `today`.
pub async fn public_schedule(ctx: &ApiContext, today: NaiveDate) -> Result<PublicSchedule, ApiError> {
    let schedule = get_schedule(ctx).await?;
    let visible = schedule.is_visible_on(today);
    let days = if visible {
        ctx.storage
            .schedule_tree(schedule.id)
            .await
            .map_err(internal)?
    } else {
        Vec::new()
    };
    Ok(PublicSchedule {
        visible,
        name: schedule.name,
        release_date: schedule.release_date,
        days,
    })
}

pub async fn list_days(ctx: &ApiContext) -> Result<Vec<Day>, ApiError> {
    let schedule = get_schedule(ctx).await?;
    ctx.storage.list_days(schedule.id).await.map_err(internal)
}

pub async fn create_day(ctx: &ApiContext, req: &CreateDayRequest) -> Result<Day, ApiError> {
    let fields = validate_new_day(req)?;
    let schedule = get_schedule(ctx).await?;
    let day = ctx
        .storage
        .create_day(schedule.id, &fields)
        .await
        .map_err(internal)?;
    info!(day_id = day.id.0, date = %day.date, "day created");
    Ok(day)
}

pub async fn update_day(
    ctx: &ApiContext,
    day_id: DayId,
    req: &UpdateDayRequest,
) -> Result<Day, ApiError> {
    let existing = load_day(ctx, day_id).await?;
    let fields = merge_day(&existing, req);
    let day = ctx
        .storage
        .update_day(day_id, &fields)
        .await
        .map_err(internal)?
        .ok_or_else(|| day_not_found(day_id))?;
    info!(day_id = day.id.0, "day updated");
    Ok(day)
}

pub async fn delete_day(ctx: &ApiContext, day_id: DayId) -> Result<Ack, ApiError> {
    let deleted = ctx.storage.delete_day(day_id).await.map_err(internal)?;
    if !deleted {
        return Err(day_not_found(day_id));
    }
    info!(day_id = day_id.0, "day deleted with its events");
    Ok(Ack::ok("day deleted"))
}

/// Events of a day in display order. An unknown day is `NotFound`, including
/// one that was just deleted.
pub async fn list_events(ctx: &ApiContext, day_id: DayId) -> Result<Vec<Event>, ApiError> {
    load_day(ctx, day_id).await?;
    ctx.storage.list_events(day_id).await.map_err(internal)
}

pub async fn create_event(
    ctx: &ApiContext,
    day_id: DayId,
    req: &CreateEventRequest,
) -> Result<Event, ApiError> {
    let fields = validate_new_event(req)?;
    load_day(ctx, day_id).await?;
    let event = ctx
        .storage
        .create_event(day_id, &fields)
        .await
        .map_err(internal)?;
    info!(event_id = event.id.0, day_id = day_id.0, title = %event.title, "event created");
    Ok(event)
}

pub async fn update_event(
    ctx: &ApiContext,
    event_id: EventId,
    req: &UpdateEventRequest,
) -> Result<Event, ApiError> {
    let existing = ctx
        .storage
        .load_event(event_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| event_not_found(event_id))?;
    let fields = merge_event(&existing, req)?;
    let event = ctx
        .storage
        .update_event(event_id, &fields)
        .await
        .map_err(internal)?
        .ok_or_else(|| event_not_found(event_id))?;
    info!(event_id = event.id.0, "event updated");
    Ok(event)
}

pub async fn delete_event(ctx: &ApiContext, event_id: EventId) -> Result<Ack, ApiError> {
    let deleted = ctx.storage.delete_event(event_id).await.map_err(internal)?;
    if !deleted {
        return Err(event_not_found(event_id));
    }
    info!(event_id = event_id.0, "event deleted");
    Ok(Ack::ok("event deleted"))
}

pub async fn reorder_events(
    ctx: &ApiContext,
    day_id: DayId,
    req: &ReorderEventsRequest,
) -> Result<Vec<Event>, ApiError> {
    validation::validate_reorder(&req.event_ids)?;
    load_day(ctx, day_id).await?;
    match ctx
        .storage
        .reorder_events(day_id, &req.event_ids)
        .await
        .map_err(internal)?
    {
        ReorderOutcome::Reordered(events) => {
            info!(day_id = day_id.0, count = req.event_ids.len(), "events reordered");
            Ok(events)
        }
        ReorderOutcome::UnknownEvent(event_id) => Err(ApiError::not_found(format!(
            "event {} does not belong to day {}",
            event_id.0, day_id.0
        ))),
    }
}

async fn load_day(ctx: &ApiContext, day_id: DayId) -> Result<Day, ApiError> {
    ctx.storage
        .load_day(day_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| day_not_found(day_id))
}

fn no_schedule() -> ApiError {
    ApiError::not_found("no schedule has been created yet")
}

fn day_not_found(day_id: DayId) -> ApiError {
    ApiError::not_found(format!("day {} not found", day_id.0))
}

fn event_not_found(event_id: EventId) -> ApiError {
    ApiError::not_found(format!("event {} not found", event_id.0))
}

fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!(error = %err, "storage failure");
    ApiError::new(ErrorCode::Internal, err.to_string())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
