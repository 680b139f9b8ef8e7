//! Form-shaped input and operator-facing output.
//!
//! Drafts hold raw text as typed; converting one into a request runs the
//! shared validators so a bad form never reaches the network.

use chrono::NaiveTime;
use shared::{
    domain::{Day, Event, Schedule},
    protocol::{
        CreateDayRequest, CreateEventRequest, CreateScheduleRequest, UpdateDayRequest,
        UpdateEventRequest,
    },
    time_format,
    validation::{
        ensure_time_order, optional_text, parse_date, parse_time, validate_new_event,
        ValidationError,
    },
};

use crate::error::ClientError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleDraft {
    pub name: String,
    pub release_date: String,
}

impl ScheduleDraft {
    pub fn from_schedule(schedule: &Schedule) -> Self {
        Self {
            name: schedule.name.clone(),
            release_date: schedule.release_date.format("%Y-%m-%d").to_string(),
        }
    }

    pub fn to_request(&self) -> Result<CreateScheduleRequest, ValidationError> {
        let release_date = parse_date("release_date", &self.release_date)?;
        Ok(CreateScheduleRequest {
            name: optional_text(Some(&self.name)),
            release_date: Some(release_date),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayDraft {
    pub date: String,
    pub label: String,
}

impl DayDraft {
    pub fn from_day(day: &Day) -> Self {
        Self {
            date: day.date.format("%Y-%m-%d").to_string(),
            label: day.label.clone().unwrap_or_default(),
        }
    }

    pub fn to_create_request(&self) -> Result<CreateDayRequest, ValidationError> {
        Ok(CreateDayRequest {
            date: Some(parse_date("date", &self.date)?),
            label: optional_text(Some(&self.label)),
        })
    }

    /// Full-form update; an emptied label field clears the label.
    pub fn to_update_request(&self) -> Result<UpdateDayRequest, ValidationError> {
        Ok(UpdateDayRequest {
            date: Some(parse_date("date", &self.date)?),
            label: Some(self.label.trim().to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub description: String,
    /// Blank means "append at the default position".
    pub sort_order: String,
}

impl EventDraft {
    pub fn new(title: &str, start_time: &str, end_time: &str) -> Self {
        Self {
            title: title.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
            ..Self::default()
        }
    }

    pub fn from_event(event: &Event) -> Self {
        Self {
            title: event.title.clone(),
            start_time: time_format::render(&event.start_time),
            end_time: time_format::render(&event.end_time),
            location: event.location.clone().unwrap_or_default(),
            description: event.description.clone().unwrap_or_default(),
            sort_order: event.sort_order.to_string(),
        }
    }

    pub fn to_create_request(&self) -> Result<CreateEventRequest, ValidationError> {
        let req = CreateEventRequest {
            title: self.title.trim().to_string(),
            start_time: optional_time("start_time", &self.start_time)?,
            end_time: optional_time("end_time", &self.end_time)?,
            location: optional_text(Some(&self.location)),
            description: optional_text(Some(&self.description)),
            sort_order: self.parsed_sort_order()?,
        };
        validate_new_event(&req)?;
        Ok(req)
    }

    /// Full-form update. Every field is sent; blank optional text clears it.
    pub fn to_update_request(&self) -> Result<UpdateEventRequest, ValidationError> {
        let title = optional_text(Some(&self.title));
        let mut missing = Vec::new();
        if title.is_none() {
            missing.push("title");
        }
        if self.start_time.trim().is_empty() {
            missing.push("start_time");
        }
        if self.end_time.trim().is_empty() {
            missing.push("end_time");
        }
        if !missing.is_empty() {
            return Err(ValidationError::missing(&missing));
        }

        let start_time = parse_time("start_time", &self.start_time)?;
        let end_time = parse_time("end_time", &self.end_time)?;
        ensure_time_order(start_time, end_time)?;

        Ok(UpdateEventRequest {
            title,
            start_time: Some(start_time),
            end_time: Some(end_time),
            location: Some(self.location.trim().to_string()),
            description: Some(self.description.trim().to_string()),
            sort_order: self.parsed_sort_order()?,
        })
    }

    fn parsed_sort_order(&self) -> Result<Option<i32>, ValidationError> {
        let raw = self.sort_order.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse::<i32>()
            .map(Some)
            .map_err(|_| ValidationError::field("sort_order", "sort_order must be a whole number"))
    }
}

fn optional_time(field: &str, raw: &str) -> Result<Option<NaiveTime>, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(None);
    }
    parse_time(field, raw).map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// One line of feedback for the operator after a command settles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl From<&ClientError> for Notice {
    fn from(err: &ClientError) -> Self {
        Self::error(err.user_message())
    }
}

#[cfg(test)]
#[path = "tests/types_tests.rs"]
mod tests;
