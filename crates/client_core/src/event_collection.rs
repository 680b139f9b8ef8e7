use std::sync::Arc;

use shared::{
    domain::{DayId, Event, EventId},
    protocol::{CreateEventRequest, ReorderEventsRequest, UpdateEventRequest},
    validation::{merge_event, validate_new_event, validate_reorder},
};

use crate::{error::ClientResult, transport::ScheduleApi};

/// Events of one day, ordered by `sort_order` then creation.
#[derive(Clone)]
pub struct EventCollection {
    api: Arc<dyn ScheduleApi>,
}

impl EventCollection {
    pub fn new(api: Arc<dyn ScheduleApi>) -> Self {
        Self { api }
    }

    pub async fn list(&self, day_id: DayId) -> ClientResult<Vec<Event>> {
        self.api.list_events(day_id).await
    }

    pub async fn create(&self, day_id: DayId, req: &CreateEventRequest) -> ClientResult<Event> {
        validate_new_event(req)?;
        self.api.create_event(day_id, req).await
    }

    /// `existing` is the record being edited; the patch is checked against it
    /// so a single changed time still has to keep the event ordered.
    pub async fn update(&self, existing: &Event, patch: &UpdateEventRequest) -> ClientResult<Event> {
        merge_event(existing, patch)?;
        self.api.update_event(existing.id, patch).await
    }

    pub async fn delete(&self, event_id: EventId) -> ClientResult<()> {
        self.api.delete_event(event_id).await?;
        Ok(())
    }

    /// Renumbers the listed events `0..n` in the given order. The server
    /// applies all of it or none of it.
    pub async fn reorder(&self, day_id: DayId, ordered: &[EventId]) -> ClientResult<Vec<Event>> {
        validate_reorder(ordered)?;
        self.api
            .reorder_events(
                day_id,
                &ReorderEventsRequest {
                    event_ids: ordered.to_vec(),
                },
            )
            .await
    }
}
