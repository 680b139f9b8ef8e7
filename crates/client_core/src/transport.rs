//! Wire access to the schedule REST surface.
//!
//! [`ScheduleApi`] is the seam the repositories are written against; the
//! reqwest-backed [`HttpScheduleApi`] is the production implementation.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{Day, DayId, Event, EventId, Schedule},
    error::ApiError,
    protocol::{
        Ack, CreateDayRequest, CreateEventRequest, CreateScheduleRequest, PublicSchedule,
        ReorderEventsRequest, ScheduleDetails, UpdateDayRequest, UpdateEventRequest,
        UpdateScheduleRequest, API_KEY_HEADER,
    },
};
use tracing::debug;
use url::Url;

use crate::error::{ClientError, ClientResult};

#[async_trait]
pub trait ScheduleApi: Send + Sync {
    async fn get_schedule(&self) -> ClientResult<Schedule>;
    async fn create_or_update_schedule(&self, req: &CreateScheduleRequest)
        -> ClientResult<Schedule>;
    async fn update_schedule(&self, req: &UpdateScheduleRequest) -> ClientResult<Schedule>;
    async fn reset_schedule(&self) -> ClientResult<Ack>;
    async fn schedule_details(&self) -> ClientResult<ScheduleDetails>;
    async fn public_schedule(&self) -> ClientResult<PublicSchedule>;

    async fn list_days(&self) -> ClientResult<Vec<Day>>;
    async fn create_day(&self, req: &CreateDayRequest) -> ClientResult<Day>;
    async fn update_day(&self, day_id: DayId, req: &UpdateDayRequest) -> ClientResult<Day>;
    async fn delete_day(&self, day_id: DayId) -> ClientResult<Ack>;

    async fn list_events(&self, day_id: DayId) -> ClientResult<Vec<Event>>;
    async fn create_event(&self, day_id: DayId, req: &CreateEventRequest)
        -> ClientResult<Event>;
    async fn update_event(&self, event_id: EventId, req: &UpdateEventRequest)
        -> ClientResult<Event>;
    async fn delete_event(&self, event_id: EventId) -> ClientResult<Ack>;
    async fn reorder_events(
        &self,
        day_id: DayId,
        req: &ReorderEventsRequest,
    ) -> ClientResult<Vec<Event>>;
}

/// Supplies the admin bearer token attached to mutating calls. Issuing and
/// refreshing the token is someone else's job.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }
}

impl TokenSource for StaticToken {
    fn bearer_token(&self) -> Option<String> {
        self.0.clone()
    }
}

pub struct HttpScheduleApi {
    http: Client,
    base_url: Url,
    api_key: String,
    tokens: Arc<dyn TokenSource>,
}

impl HttpScheduleApi {
    pub fn new(
        server_url: &str,
        api_key: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> ClientResult<Self> {
        let mut base_url = Url::parse(server_url)
            .map_err(|e| ClientError::Transport(format!("invalid server url '{server_url}': {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            api_key: api_key.into(),
            tokens,
        })
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Transport(format!("invalid request path '{path}': {e}")))
    }

    async fn read<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await?;
        decode(response).await
    }

    fn authorized(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self
            .tokens
            .bearer_token()
            .ok_or_else(|| ClientError::Unauthorized("no admin token available".to_string()))?;
        Ok(self
            .http
            .request(method, self.endpoint(path)?)
            .bearer_auth(token))
    }

    async fn write<B, T>(&self, method: Method, path: &str, body: &B) -> ClientResult<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.authorized(method, path)?.json(body).send().await?;
        decode(response).await
    }

    async fn write_empty<T: DeserializeOwned>(&self, method: Method, path: &str) -> ClientResult<T> {
        let response = self.authorized(method, path)?.send().await?;
        decode(response).await
    }
}

/// Maps a response onto the client taxonomy. Failure bodies carry an
/// `error` string; anything that does not parse is a transport failure.
async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let url = response.url().clone();
    let bytes = response.bytes().await?;

    if status.is_success() {
        return serde_json::from_slice(&bytes).map_err(|e| {
            ClientError::Transport(format!("unexpected response body from {url}: {e}"))
        });
    }

    debug!(%status, %url, "request failed");
    match serde_json::from_slice::<ApiError>(&bytes) {
        Ok(err) => Err(err.into()),
        Err(_) => Err(ClientError::Transport(format!(
            "HTTP {status} from {url} without an error body"
        ))),
    }
}

#[async_trait]
impl ScheduleApi for HttpScheduleApi {
    async fn get_schedule(&self) -> ClientResult<Schedule> {
        self.read("schedule").await
    }

    async fn create_or_update_schedule(
        &self,
        req: &CreateScheduleRequest,
    ) -> ClientResult<Schedule> {
        self.write(Method::POST, "schedule", req).await
    }

    async fn update_schedule(&self, req: &UpdateScheduleRequest) -> ClientResult<Schedule> {
        self.write(Method::PUT, "schedule", req).await
    }

    async fn reset_schedule(&self) -> ClientResult<Ack> {
        self.write_empty(Method::DELETE, "schedule").await
    }

    async fn schedule_details(&self) -> ClientResult<ScheduleDetails> {
        self.read("schedule/details").await
    }

    async fn public_schedule(&self) -> ClientResult<PublicSchedule> {
        self.read("schedule/public").await
    }

    async fn list_days(&self) -> ClientResult<Vec<Day>> {
        self.read("schedule/days").await
    }

    async fn create_day(&self, req: &CreateDayRequest) -> ClientResult<Day> {
        self.write(Method::POST, "schedule/days", req).await
    }

    async fn update_day(&self, day_id: DayId, req: &UpdateDayRequest) -> ClientResult<Day> {
        self.write(Method::PUT, &format!("schedule/days/{}", day_id.0), req)
            .await
    }

    async fn delete_day(&self, day_id: DayId) -> ClientResult<Ack> {
        self.write_empty(Method::DELETE, &format!("schedule/days/{}", day_id.0))
            .await
    }

    async fn list_events(&self, day_id: DayId) -> ClientResult<Vec<Event>> {
        self.read(&format!("schedule/days/{}/events", day_id.0)).await
    }

    async fn create_event(
        &self,
        day_id: DayId,
        req: &CreateEventRequest,
    ) -> ClientResult<Event> {
        self.write(
            Method::POST,
            &format!("schedule/days/{}/events", day_id.0),
            req,
        )
        .await
    }

    async fn update_event(
        &self,
        event_id: EventId,
        req: &UpdateEventRequest,
    ) -> ClientResult<Event> {
        self.write(Method::PUT, &format!("schedule/events/{}", event_id.0), req)
            .await
    }

    async fn delete_event(&self, event_id: EventId) -> ClientResult<Ack> {
        self.write_empty(Method::DELETE, &format!("schedule/events/{}", event_id.0))
            .await
    }

    async fn reorder_events(
        &self,
        day_id: DayId,
        req: &ReorderEventsRequest,
    ) -> ClientResult<Vec<Event>> {
        self.write(
            Method::PUT,
            &format!("schedule/days/{}/events/reorder", day_id.0),
            req,
        )
        .await
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
