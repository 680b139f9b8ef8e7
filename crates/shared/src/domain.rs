use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(ScheduleId);
id_newtype!(DayId);
id_newtype!(EventId);

/// Name used when a schedule is saved without one.
pub const DEFAULT_SCHEDULE_NAME: &str = "Conference Schedule";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub name: String,
    pub release_date: NaiveDate,
    pub is_published: bool,
}

impl Schedule {
    /// A schedule is public once it is explicitly published or its release
    /// date has arrived, whichever comes first.
    pub fn is_visible_on(&self, today: NaiveDate) -> bool {
        self.is_published || today >= self.release_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub id: DayId,
    pub schedule_id: ScheduleId,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Number of events under this day at the time of the read.
    #[serde(default)]
    pub event_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub day_id: DayId,
    pub title: String,
    #[serde(with = "crate::time_format")]
    pub start_time: NaiveTime,
    #[serde(with = "crate::time_format")]
    pub end_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}
