use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use shared::{
    domain::{Day, DayId, Event, EventId, Schedule},
    error::{ApiError, ErrorCode},
    protocol::{
        Ack, CreateDayRequest, CreateEventRequest, CreateScheduleRequest, PublicSchedule,
        ReorderEventsRequest, ScheduleDetails, UpdateDayRequest, UpdateEventRequest,
        UpdateScheduleRequest,
    },
};
use tracing::{info, warn};

use crate::{
    app_state::AppState,
    auth::{require_admin, require_api_key},
};

pub(crate) type HttpError = (StatusCode, Json<ApiError>);
type HttpResult<T> = Result<Json<T>, HttpError>;

pub(crate) fn into_http(err: ApiError) -> HttpError {
    let status = match err.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(err))
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, HttpError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected request body");
        into_http(ApiError::validation(rejection.body_text()))
    })
}

fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, HttpError> {
    path.map(|Path(id)| id).map_err(|rejection| {
        warn!(error = %rejection.body_text(), "rejected path");
        into_http(ApiError::validation(rejection.body_text()))
    })
}

pub(crate) async fn healthz(State(state): State<Arc<AppState>>) -> Result<&'static str, StatusCode> {
    state.api.storage.health_check().await.map_err(|error| {
        warn!(%error, "health check failed");
        StatusCode::SERVICE_UNAVAILABLE
    })?;
    Ok("ok")
}

pub(crate) async fn get_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<Schedule> {
    require_api_key(&state, &headers)?;
    let schedule = server_api::get_schedule(&state.api)
        .await
        .map_err(into_http)?;
    Ok(Json(schedule))
}

pub(crate) async fn create_or_update_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CreateScheduleRequest>, JsonRejection>,
) -> HttpResult<Schedule> {
    let admin = require_admin(&state, &headers)?;
    let req = json_body(payload)?;
    info!(admin = %admin.sub, "create or update schedule");
    let schedule = server_api::create_or_update_schedule(&state.api, &req)
        .await
        .map_err(into_http)?;
    Ok(Json(schedule))
}

pub(crate) async fn update_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<UpdateScheduleRequest>, JsonRejection>,
) -> HttpResult<Schedule> {
    let admin = require_admin(&state, &headers)?;
    let req = json_body(payload)?;
    info!(admin = %admin.sub, "patch schedule");
    let schedule = server_api::update_schedule(&state.api, &req)
        .await
        .map_err(into_http)?;
    Ok(Json(schedule))
}

pub(crate) async fn reset_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<Ack> {
    let admin = require_admin(&state, &headers)?;
    info!(admin = %admin.sub, "reset schedule");
    let ack = server_api::reset_schedule(&state.api)
        .await
        .map_err(into_http)?;
    Ok(Json(ack))
}

pub(crate) async fn schedule_details(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<ScheduleDetails> {
    require_api_key(&state, &headers)?;
    let details = server_api::schedule_details(&state.api)
        .await
        .map_err(into_http)?;
    Ok(Json(details))
}

pub(crate) async fn public_schedule(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<PublicSchedule> {
    require_api_key(&state, &headers)?;
    let today = Utc::now().date_naive();
    let public = server_api::public_schedule(&state.api, today)
        .await
        .map_err(into_http)?;
    Ok(Json(public))
}

pub(crate) async fn list_days(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> HttpResult<Vec<Day>> {
    require_api_key(&state, &headers)?;
    let days = server_api::list_days(&state.api)
        .await
        .map_err(into_http)?;
    Ok(Json(days))
}

pub(crate) async fn create_day(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<CreateDayRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Day>), HttpError> {
    require_admin(&state, &headers)?;
    let req = json_body(payload)?;
    let day = server_api::create_day(&state.api, &req)
        .await
        .map_err(into_http)?;
    Ok((StatusCode::CREATED, Json(day)))
}

pub(crate) async fn update_day(
    State(state): State<Arc<AppState>>,
    day_id: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<UpdateDayRequest>, JsonRejection>,
) -> HttpResult<Day> {
    require_admin(&state, &headers)?;
    let day_id = path_id(day_id)?;
    let req = json_body(payload)?;
    let day = server_api::update_day(&state.api, DayId(day_id), &req)
        .await
        .map_err(into_http)?;
    Ok(Json(day))
}

pub(crate) async fn delete_day(
    State(state): State<Arc<AppState>>,
    day_id: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
) -> HttpResult<Ack> {
    require_admin(&state, &headers)?;
    let day_id = path_id(day_id)?;
    let ack = server_api::delete_day(&state.api, DayId(day_id))
        .await
        .map_err(into_http)?;
    Ok(Json(ack))
}

pub(crate) async fn list_events(
    State(state): State<Arc<AppState>>,
    day_id: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
) -> HttpResult<Vec<Event>> {
    require_api_key(&state, &headers)?;
    let day_id = path_id(day_id)?;
    let events = server_api::list_events(&state.api, DayId(day_id))
        .await
        .map_err(into_http)?;
    Ok(Json(events))
}

pub(crate) async fn create_event(
    State(state): State<Arc<AppState>>,
    day_id: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Event>), HttpError> {
    require_admin(&state, &headers)?;
    let day_id = path_id(day_id)?;
    let req = json_body(payload)?;
    let event = server_api::create_event(&state.api, DayId(day_id), &req)
        .await
        .map_err(into_http)?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub(crate) async fn update_event(
    State(state): State<Arc<AppState>>,
    event_id: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> HttpResult<Event> {
    require_admin(&state, &headers)?;
    let event_id = path_id(event_id)?;
    let req = json_body(payload)?;
    let event = server_api::update_event(&state.api, EventId(event_id), &req)
        .await
        .map_err(into_http)?;
    Ok(Json(event))
}

pub(crate) async fn delete_event(
    State(state): State<Arc<AppState>>,
    event_id: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
) -> HttpResult<Ack> {
    require_admin(&state, &headers)?;
    let event_id = path_id(event_id)?;
    let ack = server_api::delete_event(&state.api, EventId(event_id))
        .await
        .map_err(into_http)?;
    Ok(Json(ack))
}

pub(crate) async fn reorder_events(
    State(state): State<Arc<AppState>>,
    day_id: Result<Path<i64>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<ReorderEventsRequest>, JsonRejection>,
) -> HttpResult<Vec<Event>> {
    require_admin(&state, &headers)?;
    let day_id = path_id(day_id)?;
    let req = json_body(payload)?;
    let events = server_api::reorder_events(&state.api, DayId(day_id), &req)
        .await
        .map_err(into_http)?;
    Ok(Json(events))
}
