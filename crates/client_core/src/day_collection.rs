use std::sync::Arc;

use shared::{
    domain::{Day, DayId},
    protocol::{CreateDayRequest, UpdateDayRequest},
    validation::validate_new_day,
};

use crate::{error::ClientResult, transport::ScheduleApi};

/// Days of the schedule, in date order as the server returns them.
#[derive(Clone)]
pub struct DayCollection {
    api: Arc<dyn ScheduleApi>,
}

impl DayCollection {
    pub fn new(api: Arc<dyn ScheduleApi>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> ClientResult<Vec<Day>> {
        self.api.list_days().await
    }

    pub async fn create(&self, req: &CreateDayRequest) -> ClientResult<Day> {
        validate_new_day(req)?;
        self.api.create_day(req).await
    }

    pub async fn update(&self, day_id: DayId, req: &UpdateDayRequest) -> ClientResult<Day> {
        self.api.update_day(day_id, req).await
    }

    /// Removes the day and all of its events.
    pub async fn delete(&self, day_id: DayId) -> ClientResult<()> {
        self.api.delete_day(day_id).await?;
        Ok(())
    }
}
