//! The admin screen flow: schedule info, then days, then a day's events,
//! with a read-only preview of the whole tree.
//!
//! Every command re-fetches what it touched before the state is considered
//! settled. Each command also records the view generation it started in;
//! navigation bumps the generation, and a response that arrives for an
//! older generation only produces its notice, never a state change.

use std::{fmt, sync::Arc};

use shared::{
    domain::{Day, DayId, Event, EventId, Schedule},
    protocol::{
        CreateDayRequest, CreateEventRequest, PublicSchedule, ScheduleDetails, UpdateDayRequest,
        UpdateEventRequest,
    },
    validation::ValidationError,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    day_collection::DayCollection,
    error::{ClientError, ClientResult},
    event_collection::EventCollection,
    schedule_store::ScheduleStore,
    transport::ScheduleApi,
    types::{DayDraft, EventDraft, Notice, ScheduleDraft},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WorkflowStep {
    #[default]
    ScheduleInfo,
    Days,
    Events,
    Preview,
}

impl WorkflowStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ScheduleInfo => "schedule-info",
            Self::Days => "days",
            Self::Events => "events",
            Self::Preview => "preview",
        }
    }
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedItem {
    Day(Day),
    Event(Event),
}

/// An open create/edit form. `selected_item` is the record being edited
/// and is always `None` in create mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub mode: FormMode,
    pub selected_item: Option<SelectedItem>,
}

#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    pub step: WorkflowStep,
    pub schedule: Option<Schedule>,
    pub days: Vec<Day>,
    pub events: Vec<Event>,
    /// Set on entry to `Events`, cleared on the way out.
    pub selected_day: Option<Day>,
    pub form: Option<FormState>,
    pub preview: Option<ScheduleDetails>,
    pub busy: bool,
    pub notice: Option<Notice>,
    pub generation: u64,
}

impl WorkflowState {
    /// Leaving `Events` for any other step always drops the selected day.
    fn transition(&mut self, step: WorkflowStep) {
        if self.step != step {
            debug!(from = %self.step, to = %step, "workflow step");
        }
        if self.step == WorkflowStep::Events && step != WorkflowStep::Events {
            self.leave_events();
        }
        self.step = step;
        self.generation += 1;
    }

    fn leave_events(&mut self) {
        self.selected_day = None;
        self.events.clear();
    }

    fn apply(&mut self, refresh: Refresh) {
        match refresh {
            Refresh::Schedule(schedule) => self.schedule = schedule,
            Refresh::Days(days) => self.days = days,
            Refresh::Events(events) => self.events = events,
            Refresh::OpenDay(day, events) => {
                self.selected_day = Some(day);
                self.events = events;
                self.form = None;
                self.transition(WorkflowStep::Events);
            }
            Refresh::Preview(details) => {
                self.preview = Some(details);
                self.transition(WorkflowStep::Preview);
            }
            Refresh::Step(step) => self.transition(step),
            Refresh::CloseForm => self.form = None,
            Refresh::ForgetDay(day_id) => {
                if self.selected_day.as_ref().is_some_and(|day| day.id == day_id) {
                    if self.step == WorkflowStep::Events {
                        self.transition(WorkflowStep::Days);
                    }
                    self.leave_events();
                }
            }
            Refresh::ClearTree => {
                self.leave_events();
                self.preview = None;
                self.form = None;
                if matches!(self.step, WorkflowStep::Events | WorkflowStep::Preview) {
                    self.transition(WorkflowStep::Days);
                }
            }
        }
    }
}

/// State changes a settled command wants applied.
enum Refresh {
    Schedule(Option<Schedule>),
    Days(Vec<Day>),
    Events(Vec<Event>),
    OpenDay(Day, Vec<Event>),
    Preview(ScheduleDetails),
    Step(WorkflowStep),
    CloseForm,
    ForgetDay(DayId),
    ClearTree,
}

struct Outcome {
    message: String,
    refreshes: Vec<Refresh>,
    /// A write that failed but still re-fetched the view.
    failure: Option<ClientError>,
}

impl Outcome {
    fn new(message: impl Into<String>, refreshes: Vec<Refresh>) -> Self {
        Self {
            message: message.into(),
            refreshes,
            failure: None,
        }
    }

    fn failed(err: ClientError, refreshes: Vec<Refresh>) -> Self {
        Self {
            message: err.to_string(),
            refreshes,
            failure: Some(err),
        }
    }
}

enum DayWrite {
    Create(CreateDayRequest),
    Update(DayId, UpdateDayRequest),
}

enum EventWrite {
    Create(CreateEventRequest),
    Update(Event, UpdateEventRequest),
}

pub struct WorkflowController {
    schedule: ScheduleStore,
    days: DayCollection,
    events: EventCollection,
    inner: Mutex<WorkflowState>,
}

impl WorkflowController {
    pub fn new(api: Arc<dyn ScheduleApi>) -> Self {
        Self {
            schedule: ScheduleStore::new(Arc::clone(&api)),
            days: DayCollection::new(Arc::clone(&api)),
            events: EventCollection::new(api),
            inner: Mutex::new(WorkflowState::default()),
        }
    }

    pub async fn snapshot(&self) -> WorkflowState {
        self.inner.lock().await.clone()
    }

    /// Initial fetch. A missing schedule is the normal first-run state.
    pub async fn load(&self) -> Notice {
        let (generation, ()) = match self.begin(|_| Ok(())).await {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            let schedule = self.schedule.fetch().await?;
            let message = match &schedule {
                Some(schedule) => format!("Loaded \"{}\"", schedule.name),
                None => "No schedule yet; save one to get started".to_string(),
            };
            Ok::<_, ClientError>(Outcome::new(message, vec![Refresh::Schedule(schedule)]))
        }
        .await;
        self.settle(generation, result).await
    }

    /// Create-or-update of the schedule record; moves on to `Days` only
    /// when the save succeeds.
    pub async fn save_schedule(&self, draft: &ScheduleDraft) -> Notice {
        let (generation, req) = match self.begin(|_| Ok(draft.to_request()?)).await {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            self.schedule.create_or_update(&req).await?;
            let schedule = self.schedule.fetch().await?;
            let days = self.days.list().await?;
            Ok::<_, ClientError>(Outcome::new(
                "Schedule saved",
                vec![
                    Refresh::Schedule(schedule),
                    Refresh::Days(days),
                    Refresh::Step(WorkflowStep::Days),
                ],
            ))
        }
        .await;
        self.settle(generation, result).await
    }

    /// "Manage days & events". Callers only offer this once a schedule
    /// exists.
    pub async fn manage_days(&self) -> Notice {
        let (generation, ()) = match self.begin(|_| Ok(())).await {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            let days = self.days.list().await?;
            let message = format!("{} day(s)", days.len());
            Ok::<_, ClientError>(Outcome::new(
                message,
                vec![Refresh::Days(days), Refresh::Step(WorkflowStep::Days)],
            ))
        }
        .await;
        self.settle(generation, result).await
    }

    pub async fn open_day(&self, day_id: DayId) -> Notice {
        let (generation, day) = match self
            .begin(|state| {
                state
                    .days
                    .iter()
                    .find(|day| day.id == day_id)
                    .cloned()
                    .ok_or_else(|| ClientError::NotFound(format!("day {} not found", day_id.0)))
            })
            .await
        {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            let events = self.events.list(day.id).await?;
            let message = format!("{} event(s) on {}", events.len(), day.date);
            Ok::<_, ClientError>(Outcome::new(message, vec![Refresh::OpenDay(day, events)]))
        }
        .await;
        self.settle(generation, result).await
    }

    /// Fetches the full nested tree, then shows it.
    pub async fn preview(&self) -> Notice {
        let (generation, ()) = match self.begin(|_| Ok(())).await {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            let details = self.schedule.fetch_details().await?;
            Ok::<_, ClientError>(Outcome::new(
                "Preview ready",
                vec![Refresh::Preview(details)],
            ))
        }
        .await;
        self.settle(generation, result).await
    }

    /// Reads what the public site would show right now.
    pub async fn public_view(&self) -> ClientResult<PublicSchedule> {
        self.schedule.fetch_public().await
    }

    /// An open form is closed first; only a second `back` changes step.
    pub async fn back(&self) -> WorkflowStep {
        let mut state = self.inner.lock().await;
        if state.form.take().is_some() {
            return state.step;
        }
        match state.step {
            WorkflowStep::Events => state.transition(WorkflowStep::Days),
            WorkflowStep::Preview => {
                state.preview = None;
                state.transition(WorkflowStep::Days);
            }
            WorkflowStep::Days => state.transition(WorkflowStep::ScheduleInfo),
            WorkflowStep::ScheduleInfo => {}
        }
        state.step
    }

    pub async fn open_create_form(&self) {
        self.inner.lock().await.form = Some(FormState {
            mode: FormMode::Create,
            selected_item: None,
        });
    }

    pub async fn open_edit_form(&self, item: SelectedItem) {
        self.inner.lock().await.form = Some(FormState {
            mode: FormMode::Edit,
            selected_item: Some(item),
        });
    }

    pub async fn close_form(&self) {
        self.inner.lock().await.form = None;
    }

    /// Saves the open day form: a create, or an update of the day being
    /// edited. With no form open this creates.
    pub async fn submit_day(&self, draft: &DayDraft) -> Notice {
        let (generation, write) = match self
            .begin(|state| match &state.form {
                Some(FormState {
                    mode: FormMode::Edit,
                    selected_item,
                }) => match selected_item {
                    Some(SelectedItem::Day(day)) => {
                        Ok(DayWrite::Update(day.id, draft.to_update_request()?))
                    }
                    _ => Err(ValidationError::field("day", "the open form is not editing a day").into()),
                },
                _ => Ok(DayWrite::Create(draft.to_create_request()?)),
            })
            .await
        {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            let (target, written) = match write {
                DayWrite::Create(req) => (
                    None,
                    self.days
                        .create(&req)
                        .await
                        .map(|day| format!("Day {} added", day.date)),
                ),
                DayWrite::Update(day_id, req) => (
                    Some(day_id),
                    self.days
                        .update(day_id, &req)
                        .await
                        .map(|day| format!("Day {} updated", day.date)),
                ),
            };
            let message = match written {
                Ok(message) => message,
                Err(err) => return self.refetch_after_missing(err, target, false).await,
            };
            let days = self.days.list().await?;
            Ok::<_, ClientError>(Outcome::new(
                message,
                vec![Refresh::Days(days), Refresh::CloseForm],
            ))
        }
        .await;
        self.settle(generation, result).await
    }

    /// Deletes a day with its events. If it was the open day the selection
    /// goes with it.
    pub async fn delete_day(&self, day_id: DayId) -> Notice {
        let (generation, ()) = match self.begin(|_| Ok(())).await {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            if let Err(err) = self.days.delete(day_id).await {
                return self.refetch_after_missing(err, Some(day_id), false).await;
            }
            let days = self.days.list().await?;
            Ok::<_, ClientError>(Outcome::new(
                "Day deleted",
                vec![Refresh::ForgetDay(day_id), Refresh::Days(days)],
            ))
        }
        .await;
        self.settle(generation, result).await
    }

    /// Saves the open event form against the selected day.
    pub async fn submit_event(&self, draft: &EventDraft) -> Notice {
        let (generation, (day, write)) = match self
            .begin(|state| {
                let day = selected_day(state)?;
                let write = match &state.form {
                    Some(FormState {
                        mode: FormMode::Edit,
                        selected_item,
                    }) => match selected_item {
                        Some(SelectedItem::Event(event)) => {
                            EventWrite::Update(event.clone(), draft.to_update_request()?)
                        }
                        _ => {
                            return Err(ValidationError::field(
                                "event",
                                "the open form is not editing an event",
                            )
                            .into())
                        }
                    },
                    _ => EventWrite::Create(draft.to_create_request()?),
                };
                Ok((day, write))
            })
            .await
        {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            let written = match write {
                EventWrite::Create(req) => self
                    .events
                    .create(day.id, &req)
                    .await
                    .map(|event| format!("Event \"{}\" added", event.title)),
                EventWrite::Update(existing, patch) => self
                    .events
                    .update(&existing, &patch)
                    .await
                    .map(|event| format!("Event \"{}\" updated", event.title)),
            };
            let message = match written {
                Ok(message) => message,
                Err(err) => return self.refetch_after_missing(err, Some(day.id), true).await,
            };
            let events = self.events.list(day.id).await?;
            let days = self.days.list().await?;
            Ok::<_, ClientError>(Outcome::new(
                message,
                vec![
                    Refresh::Events(events),
                    Refresh::Days(days),
                    Refresh::CloseForm,
                ],
            ))
        }
        .await;
        self.settle(generation, result).await
    }

    pub async fn delete_event(&self, event_id: EventId) -> Notice {
        let (generation, day) = match self.begin(selected_day).await {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            if let Err(err) = self.events.delete(event_id).await {
                return self.refetch_after_missing(err, Some(day.id), true).await;
            }
            let events = self.events.list(day.id).await?;
            let days = self.days.list().await?;
            Ok::<_, ClientError>(Outcome::new(
                "Event deleted",
                vec![Refresh::Events(events), Refresh::Days(days)],
            ))
        }
        .await;
        self.settle(generation, result).await
    }

    /// Applies a new display order to the selected day's events.
    pub async fn reorder_events(&self, ordered: &[EventId]) -> Notice {
        let (generation, day) = match self.begin(selected_day).await {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            if let Err(err) = self.events.reorder(day.id, ordered).await {
                return self.refetch_after_missing(err, Some(day.id), true).await;
            }
            let events = self.events.list(day.id).await?;
            Ok::<_, ClientError>(Outcome::new(
                "Events reordered",
                vec![Refresh::Events(events)],
            ))
        }
        .await;
        self.settle(generation, result).await
    }

    pub async fn set_published(&self, is_published: bool) -> Notice {
        let (generation, ()) = match self.begin(|_| Ok(())).await {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            if is_published {
                self.schedule.publish().await?;
            } else {
                self.schedule.unpublish().await?;
            }
            let schedule = self.schedule.fetch().await?;
            let message = if is_published {
                "Schedule published"
            } else {
                "Schedule unpublished"
            };
            Ok::<_, ClientError>(Outcome::new(message, vec![Refresh::Schedule(schedule)]))
        }
        .await;
        self.settle(generation, result).await
    }

    /// Deletes every day and event; the schedule record itself stays.
    pub async fn reset_schedule(&self) -> Notice {
        let (generation, ()) = match self.begin(|_| Ok(())).await {
            Ok(started) => started,
            Err(notice) => return notice,
        };
        let result = async {
            self.schedule.reset().await?;
            let schedule = self.schedule.fetch().await?;
            let days = self.days.list().await?;
            Ok::<_, ClientError>(Outcome::new(
                "Schedule reset",
                vec![
                    Refresh::ClearTree,
                    Refresh::Schedule(schedule),
                    Refresh::Days(days),
                ],
            ))
        }
        .await;
        self.settle(generation, result).await
    }

    /// A write that hit a record someone else removed still re-lists, so the
    /// vanished entry drops out of view. `day_id` is the day the write
    /// touched; with `with_events` its events are re-listed too.
    async fn refetch_after_missing(
        &self,
        err: ClientError,
        day_id: Option<DayId>,
        with_events: bool,
    ) -> ClientResult<Outcome> {
        if !err.is_not_found() {
            return Err(err);
        }
        let days = self.days.list().await?;
        let mut refreshes = Vec::new();
        if let Some(day_id) = day_id {
            if !days.iter().any(|day| day.id == day_id) {
                refreshes.push(Refresh::ForgetDay(day_id));
            } else if with_events {
                refreshes.push(Refresh::Events(self.events.list(day_id).await?));
            }
        }
        refreshes.push(Refresh::Days(days));
        Ok(Outcome::failed(err, refreshes))
    }

    /// Claims the busy flag and captures the current generation. `read`
    /// pulls whatever the command needs out of the state; its failure is
    /// reported without any request being sent.
    async fn begin<T>(
        &self,
        read: impl FnOnce(&WorkflowState) -> ClientResult<T>,
    ) -> Result<(u64, T), Notice> {
        let mut state = self.inner.lock().await;
        if state.busy {
            let notice = Notice::from(&ClientError::Busy);
            state.notice = Some(notice.clone());
            return Err(notice);
        }
        match read(&state) {
            Ok(value) => {
                state.busy = true;
                Ok((state.generation, value))
            }
            Err(err) => {
                debug!(error = %err, "command rejected before sending");
                let notice = Notice::from(&err);
                state.notice = Some(notice.clone());
                Err(notice)
            }
        }
    }

    async fn settle(&self, generation: u64, result: ClientResult<Outcome>) -> Notice {
        let mut state = self.inner.lock().await;
        state.busy = false;
        let notice = match result {
            Ok(outcome) => {
                if state.generation == generation {
                    for refresh in outcome.refreshes {
                        state.apply(refresh);
                    }
                } else {
                    debug!(
                        started = generation,
                        current = state.generation,
                        "discarding stale response"
                    );
                }
                match outcome.failure {
                    Some(err) => {
                        warn!(error = %err, "command failed; view re-fetched");
                        Notice::from(&err)
                    }
                    None => {
                        info!(message = %outcome.message, "command settled");
                        Notice::success(outcome.message)
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "command failed");
                Notice::from(&err)
            }
        };
        state.notice = Some(notice.clone());
        notice
    }
}

fn selected_day(state: &WorkflowState) -> ClientResult<Day> {
    state
        .selected_day
        .clone()
        .ok_or_else(|| ValidationError::field("day", "open a day first").into())
}

#[cfg(test)]
#[path = "tests/workflow_tests.rs"]
mod tests;
