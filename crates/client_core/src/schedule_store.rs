use std::sync::Arc;

use shared::{
    domain::Schedule,
    protocol::{
        Ack, CreateScheduleRequest, PublicSchedule, ScheduleDetails, UpdateScheduleRequest,
    },
    validation::validate_schedule,
};
use tracing::info;

use crate::{error::ClientResult, transport::ScheduleApi};

/// Client view of the singleton schedule record.
#[derive(Clone)]
pub struct ScheduleStore {
    api: Arc<dyn ScheduleApi>,
}

impl ScheduleStore {
    pub fn new(api: Arc<dyn ScheduleApi>) -> Self {
        Self { api }
    }

    /// `None` when no schedule has been saved yet, which is a normal
    /// starting point rather than a failure.
    pub async fn fetch(&self) -> ClientResult<Option<Schedule>> {
        match self.api.get_schedule().await {
            Ok(schedule) => Ok(Some(schedule)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    pub async fn create_or_update(&self, req: &CreateScheduleRequest) -> ClientResult<Schedule> {
        validate_schedule(req)?;
        let schedule = self.api.create_or_update_schedule(req).await?;
        info!(schedule_id = schedule.id.0, "schedule saved");
        Ok(schedule)
    }

    pub async fn update(&self, req: &UpdateScheduleRequest) -> ClientResult<Schedule> {
        self.api.update_schedule(req).await
    }

    pub async fn fetch_details(&self) -> ClientResult<ScheduleDetails> {
        self.api.schedule_details().await
    }

    pub async fn fetch_public(&self) -> ClientResult<PublicSchedule> {
        self.api.public_schedule().await
    }

    /// Drops every day and event. Callers holding day or event lists must
    /// clear them; nothing is pushed to them.
    pub async fn reset(&self) -> ClientResult<Ack> {
        let ack = self.api.reset_schedule().await?;
        info!("schedule reset");
        Ok(ack)
    }

    pub async fn publish(&self) -> ClientResult<Schedule> {
        self.update(&UpdateScheduleRequest::publish(true)).await
    }

    pub async fn unpublish(&self) -> ClientResult<Schedule> {
        self.update(&UpdateScheduleRequest::publish(false)).await
    }
}
