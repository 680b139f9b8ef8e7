//! In-memory stand-in for the schedule server.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex as StdMutex,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{
    domain::{Day, DayId, Event, EventId, Schedule, ScheduleId},
    protocol::{
        Ack, CreateDayRequest, CreateEventRequest, CreateScheduleRequest, DayDetails,
        PublicSchedule, ReorderEventsRequest, ScheduleDetails, UpdateDayRequest,
        UpdateEventRequest, UpdateScheduleRequest,
    },
    validation::{
        merge_day, merge_event, schedule_name, validate_new_day, validate_new_event,
        validate_reorder, validate_schedule,
    },
};
use tokio::sync::Notify;

use crate::{
    error::{ClientError, ClientResult},
    transport::ScheduleApi,
};

#[derive(Default)]
struct FakeState {
    schedule: Option<Schedule>,
    days: Vec<Day>,
    events: Vec<Event>,
    next_id: i64,
    transport_down: bool,
}

impl FakeState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn schedule(&self) -> ClientResult<Schedule> {
        self.schedule
            .clone()
            .ok_or_else(|| ClientError::NotFound("no schedule has been created yet".into()))
    }

    fn day(&self, day_id: DayId) -> ClientResult<Day> {
        self.days
            .iter()
            .find(|day| day.id == day_id)
            .map(|day| Day {
                event_count: self.events.iter().filter(|e| e.day_id == day.id).count() as i64,
                ..day.clone()
            })
            .ok_or_else(|| ClientError::NotFound(format!("day {} not found", day_id.0)))
    }

    fn sorted_days(&self) -> Vec<Day> {
        let mut days: Vec<Day> = self
            .days
            .iter()
            .filter_map(|day| self.day(day.id).ok())
            .collect();
        days.sort_by_key(|day| (day.date, day.id));
        days
    }

    fn sorted_events(&self, day_id: DayId) -> Vec<Event> {
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|event| event.day_id == day_id)
            .cloned()
            .collect();
        events.sort_by_key(|event| (event.sort_order, event.id));
        events
    }
}

#[derive(Default)]
pub(crate) struct FakeScheduleApi {
    state: StdMutex<FakeState>,
    calls: AtomicUsize,
    hold_event_lists: StdMutex<Option<Arc<Notify>>>,
    pub(crate) event_list_entered: Notify,
}

impl FakeScheduleApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn with_schedule(name: &str, release_date: NaiveDate) -> Arc<Self> {
        let api = Self::new();
        {
            let mut state = api.state.lock().expect("fake state");
            let id = state.next_id();
            state.schedule = Some(Schedule {
                id: ScheduleId(id),
                name: name.to_string(),
                release_date,
                is_published: false,
            });
        }
        api
    }

    /// Number of requests that reached the fake server.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn set_transport_down(&self, down: bool) {
        self.state.lock().expect("fake state").transport_down = down;
    }

    /// Makes every `list_events` wait until the returned gate is notified.
    pub(crate) fn hold_event_lists(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.hold_event_lists.lock().expect("gate") = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn stored_events(&self) -> Vec<Event> {
        self.state.lock().expect("fake state").events.clone()
    }

    fn enter(&self) -> ClientResult<std::sync::MutexGuard<'_, FakeState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().expect("fake state");
        if state.transport_down {
            return Err(ClientError::Transport("connection refused".into()));
        }
        Ok(state)
    }
}

#[async_trait]
impl ScheduleApi for FakeScheduleApi {
    async fn get_schedule(&self) -> ClientResult<Schedule> {
        self.enter()?.schedule()
    }

    async fn create_or_update_schedule(
        &self,
        req: &CreateScheduleRequest,
    ) -> ClientResult<Schedule> {
        let mut state = self.enter()?;
        let fields = validate_schedule(req)?;
        let id = match &state.schedule {
            Some(existing) => existing.id,
            None => ScheduleId(state.next_id()),
        };
        let is_published = state.schedule.as_ref().is_some_and(|s| s.is_published);
        let schedule = Schedule {
            id,
            name: fields.name,
            release_date: fields.release_date,
            is_published,
        };
        state.schedule = Some(schedule.clone());
        Ok(schedule)
    }

    async fn update_schedule(&self, req: &UpdateScheduleRequest) -> ClientResult<Schedule> {
        let mut state = self.enter()?;
        let mut schedule = state.schedule()?;
        if let Some(name) = &req.name {
            schedule.name = schedule_name(Some(name));
        }
        if let Some(release_date) = req.release_date {
            schedule.release_date = release_date;
        }
        if let Some(is_published) = req.is_published {
            schedule.is_published = is_published;
        }
        state.schedule = Some(schedule.clone());
        Ok(schedule)
    }

    async fn reset_schedule(&self) -> ClientResult<Ack> {
        let mut state = self.enter()?;
        state.schedule()?;
        state.days.clear();
        state.events.clear();
        Ok(Ack::ok("schedule reset"))
    }

    async fn schedule_details(&self) -> ClientResult<ScheduleDetails> {
        let state = self.enter()?;
        let schedule = state.schedule()?;
        let days = state
            .sorted_days()
            .into_iter()
            .map(|day| DayDetails {
                events: state.sorted_events(day.id),
                day,
            })
            .collect();
        Ok(ScheduleDetails { schedule, days })
    }

    async fn public_schedule(&self) -> ClientResult<PublicSchedule> {
        let state = self.enter()?;
        let schedule = state.schedule()?;
        let today = chrono::Utc::now().date_naive();
        let visible = schedule.is_visible_on(today);
        Ok(PublicSchedule {
            visible,
            name: schedule.name,
            release_date: schedule.release_date,
            days: Vec::new(),
        })
    }

    async fn list_days(&self) -> ClientResult<Vec<Day>> {
        let state = self.enter()?;
        state.schedule()?;
        Ok(state.sorted_days())
    }

    async fn create_day(&self, req: &CreateDayRequest) -> ClientResult<Day> {
        let mut state = self.enter()?;
        let fields = validate_new_day(req)?;
        let schedule = state.schedule()?;
        let day = Day {
            id: DayId(state.next_id()),
            schedule_id: schedule.id,
            date: fields.date,
            label: fields.label,
            event_count: 0,
        };
        state.days.push(day.clone());
        Ok(day)
    }

    async fn update_day(&self, day_id: DayId, req: &UpdateDayRequest) -> ClientResult<Day> {
        let mut state = self.enter()?;
        let existing = state.day(day_id)?;
        let fields = merge_day(&existing, req);
        let day = state
            .days
            .iter_mut()
            .find(|day| day.id == day_id)
            .ok_or_else(|| ClientError::NotFound(format!("day {} not found", day_id.0)))?;
        day.date = fields.date;
        day.label = fields.label;
        state.day(day_id)
    }

    async fn delete_day(&self, day_id: DayId) -> ClientResult<Ack> {
        let mut state = self.enter()?;
        state.day(day_id)?;
        state.days.retain(|day| day.id != day_id);
        state.events.retain(|event| event.day_id != day_id);
        Ok(Ack::ok("day deleted"))
    }

    async fn list_events(&self, day_id: DayId) -> ClientResult<Vec<Event>> {
        let gate = self.hold_event_lists.lock().expect("gate").clone();
        if let Some(gate) = gate {
            self.event_list_entered.notify_one();
            gate.notified().await;
        }
        let state = self.enter()?;
        state.day(day_id)?;
        Ok(state.sorted_events(day_id))
    }

    async fn create_event(
        &self,
        day_id: DayId,
        req: &CreateEventRequest,
    ) -> ClientResult<Event> {
        let mut state = self.enter()?;
        let fields = validate_new_event(req)?;
        state.day(day_id)?;
        let event = Event {
            id: EventId(state.next_id()),
            day_id,
            title: fields.title,
            start_time: fields.start_time,
            end_time: fields.end_time,
            location: fields.location,
            description: fields.description,
            sort_order: fields.sort_order,
        };
        state.events.push(event.clone());
        Ok(event)
    }

    async fn update_event(
        &self,
        event_id: EventId,
        req: &UpdateEventRequest,
    ) -> ClientResult<Event> {
        let mut state = self.enter()?;
        let event = state
            .events
            .iter_mut()
            .find(|event| event.id == event_id)
            .ok_or_else(|| ClientError::NotFound(format!("event {} not found", event_id.0)))?;
        let fields = merge_event(event, req)?;
        event.title = fields.title;
        event.start_time = fields.start_time;
        event.end_time = fields.end_time;
        event.location = fields.location;
        event.description = fields.description;
        event.sort_order = fields.sort_order;
        Ok(event.clone())
    }

    async fn delete_event(&self, event_id: EventId) -> ClientResult<Ack> {
        let mut state = self.enter()?;
        let before = state.events.len();
        state.events.retain(|event| event.id != event_id);
        if state.events.len() == before {
            return Err(ClientError::NotFound(format!("event {} not found", event_id.0)));
        }
        Ok(Ack::ok("event deleted"))
    }

    async fn reorder_events(
        &self,
        day_id: DayId,
        req: &ReorderEventsRequest,
    ) -> ClientResult<Vec<Event>> {
        let mut state = self.enter()?;
        validate_reorder(&req.event_ids)?;
        state.day(day_id)?;
        if let Some(unknown) = req.event_ids.iter().find(|id| {
            !state
                .events
                .iter()
                .any(|event| event.id == **id && event.day_id == day_id)
        }) {
            return Err(ClientError::NotFound(format!(
                "event {} does not belong to day {}",
                unknown.0, day_id.0
            )));
        }
        for (index, event_id) in req.event_ids.iter().enumerate() {
            if let Some(event) = state.events.iter_mut().find(|e| e.id == *event_id) {
                event.sort_order = index as i32;
            }
        }
        Ok(state.sorted_events(day_id))
    }
}
