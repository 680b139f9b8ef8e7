use super::*;
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use shared::{
    domain::ScheduleId,
    error::{ApiError, ErrorCode},
    validation::ValidationError,
};
use tokio::net::TcpListener;

const KEY: &str = "read-key";
const TOKEN: &str = "admin-token";

fn schedule() -> Schedule {
    Schedule {
        id: ScheduleId(1),
        name: "Model UN".to_string(),
        release_date: NaiveDate::from_ymd_opt(2027, 2, 1).expect("date"),
        is_published: false,
    }
}

fn unauthorized() -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiError::new(ErrorCode::Unauthorized, "nope")),
    )
}

async fn spawn_server(prefix: &str) -> std::io::Result<String> {
    let routes = Router::new()
        .route(
            "/schedule",
            get(|headers: HeaderMap| async move {
                if headers.get(API_KEY_HEADER).and_then(|v| v.to_str().ok()) != Some(KEY) {
                    return Err(unauthorized());
                }
                Ok(Json(schedule()))
            }),
        )
        .route(
            "/schedule/days",
            post(
                |headers: HeaderMap, Json(req): Json<CreateDayRequest>| async move {
                    let expected = format!("Bearer {TOKEN}");
                    if headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        != Some(expected.as_str())
                    {
                        return Err(unauthorized());
                    }
                    let date = req.date.ok_or_else(|| {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(ApiError::from(ValidationError::missing(&["date"]))),
                        )
                    })?;
                    Ok((
                        StatusCode::CREATED,
                        Json(Day {
                            id: DayId(7),
                            schedule_id: ScheduleId(1),
                            date,
                            label: req.label,
                            event_count: 0,
                        }),
                    ))
                },
            ),
        )
        .route(
            "/schedule/days/:day_id/events",
            get(|Path(day_id): Path<i64>| async move {
                (
                    StatusCode::NOT_FOUND,
                    Json(ApiError::not_found(format!("day {day_id} not found"))),
                )
            }),
        )
        .route(
            "/schedule/events/:event_id",
            put(|| async { (StatusCode::BAD_GATEWAY, "<html>upstream down</html>") }),
        );
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };

    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}{prefix}"))
}

fn client(url: &str, token: Option<&str>) -> HttpScheduleApi {
    HttpScheduleApi::new(
        url,
        KEY,
        Arc::new(StaticToken(token.map(str::to_string))),
    )
    .expect("client")
}

#[tokio::test]
async fn reads_send_the_api_key() {
    let url = spawn_server("").await.expect("server");
    let fetched = client(&url, None).get_schedule().await.expect("schedule");
    assert_eq!(fetched, schedule());
}

#[tokio::test]
async fn wrong_api_key_maps_to_unauthorized() {
    let url = spawn_server("").await.expect("server");
    let api = HttpScheduleApi::new(&url, "wrong", Arc::new(StaticToken::default())).expect("client");
    let err = api.get_schedule().await.expect_err("should fail");
    assert!(matches!(err, ClientError::Unauthorized(_)), "{err:?}");
}

#[tokio::test]
async fn writes_send_the_bearer_token() {
    let url = spawn_server("").await.expect("server");
    let day = client(&url, Some(TOKEN))
        .create_day(&CreateDayRequest {
            date: NaiveDate::from_ymd_opt(2027, 3, 5),
            label: Some("Opening".to_string()),
        })
        .await
        .expect("day");
    assert_eq!(day.id, DayId(7));
    assert_eq!(day.label.as_deref(), Some("Opening"));
}

#[tokio::test]
async fn writes_without_a_token_are_not_sent() {
    let url = spawn_server("").await.expect("server");
    let err = client(&url, None)
        .create_day(&CreateDayRequest::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, ClientError::Unauthorized(_)));
}

#[tokio::test]
async fn server_validation_error_keeps_its_message_and_fields() {
    let url = spawn_server("").await.expect("server");
    let err = client(&url, Some(TOKEN))
        .create_day(&CreateDayRequest::default())
        .await
        .expect_err("should fail");
    match err {
        ClientError::Validation(validation) => {
            assert_eq!(validation.message, "missing required field(s): date");
            assert!(validation.mentions("date"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn not_found_body_becomes_not_found_error() {
    let url = spawn_server("").await.expect("server");
    let err = client(&url, None)
        .list_events(DayId(42))
        .await
        .expect_err("should fail");
    assert_eq!(err, ClientError::NotFound("day 42 not found".to_string()));
    assert_eq!(err.user_message(), "day 42 not found");
}

#[tokio::test]
async fn non_json_failure_is_a_transport_error() {
    let url = spawn_server("").await.expect("server");
    let err = client(&url, Some(TOKEN))
        .update_event(EventId(1), &UpdateEventRequest::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, ClientError::Transport(_)), "{err:?}");
    assert_eq!(err.user_message(), crate::error::GENERIC_FAILURE_MESSAGE);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client(&format!("http://{addr}"), None)
        .get_schedule()
        .await
        .expect_err("should fail");
    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn base_url_path_prefix_is_preserved() {
    let url = spawn_server("/api").await.expect("server");
    let fetched = client(&url, None).get_schedule().await.expect("schedule");
    assert_eq!(fetched.name, "Model UN");
}

#[test]
fn invalid_server_url_is_rejected() {
    let err = HttpScheduleApi::new("not a url", KEY, Arc::new(StaticToken::default()))
        .err()
        .expect("should fail");
    assert!(matches!(err, ClientError::Transport(_)));
}
