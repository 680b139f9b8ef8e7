//! Client side of the schedule manager: a typed HTTP transport, one
//! repository per record kind, and the workflow state machine that drives
//! the admin screens.

pub mod day_collection;
pub mod error;
pub mod event_collection;
pub mod schedule_store;
pub mod transport;
pub mod types;
pub mod workflow;

pub use day_collection::DayCollection;
pub use error::{ClientError, ClientResult};
pub use event_collection::EventCollection;
pub use schedule_store::ScheduleStore;
pub use transport::{HttpScheduleApi, ScheduleApi, StaticToken, TokenSource};
pub use types::{DayDraft, EventDraft, Notice, NoticeLevel, ScheduleDraft};
pub use workflow::{FormMode, FormState, SelectedItem, WorkflowController, WorkflowState, WorkflowStep};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod repository_tests;
