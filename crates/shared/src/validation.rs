//! Checks applied at the command boundary, before anything is persisted.
//!
//! The client runs these on form input so bad requests never leave the
//! process; the server runs them again on every request it accepts.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::{
    domain::{Day, Event, EventId, DEFAULT_SCHEDULE_NAME},
    protocol::{
        CreateDayRequest, CreateEventRequest, CreateScheduleRequest, UpdateDayRequest,
        UpdateEventRequest,
    },
    time_format,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Wire names of the offending fields.
    pub fields: Vec<String>,
    pub message: String,
}

impl ValidationError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self {
            fields: vec![field.to_string()],
            message: message.into(),
        }
    }

    pub fn missing(fields: &[&str]) -> Self {
        Self {
            fields: fields.iter().map(|f| f.to_string()).collect(),
            message: format!("missing required field(s): {}", fields.join(", ")),
        }
    }

    pub fn mentions(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleFields {
    pub name: String,
    pub release_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayFields {
    pub date: NaiveDate,
    pub label: Option<String>,
}

/// A complete, checked set of event columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub title: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub location: Option<String>,
    pub description: Option<String>,
    pub sort_order: i32,
}

pub fn schedule_name(raw: Option<&str>) -> String {
    optional_text(raw).unwrap_or_else(|| DEFAULT_SCHEDULE_NAME.to_string())
}

pub fn optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::missing(&[field]));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ValidationError::field(field, format!("{field} must be a date in YYYY-MM-DD form"))
    })
}

pub fn parse_time(field: &str, raw: &str) -> Result<NaiveTime, ValidationError> {
    if raw.trim().is_empty() {
        return Err(ValidationError::missing(&[field]));
    }
    time_format::parse(raw)
        .ok_or_else(|| ValidationError::field(field, format!("{field} must be a time in HH:MM form")))
}

/// Events must end strictly after they start.
pub fn ensure_time_order(start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if start >= end {
        return Err(ValidationError {
            fields: vec!["start_time".to_string(), "end_time".to_string()],
            message: "end_time must be after start_time".to_string(),
        });
    }
    Ok(())
}

pub fn validate_schedule(req: &CreateScheduleRequest) -> Result<ScheduleFields, ValidationError> {
    let release_date = req
        .release_date
        .ok_or_else(|| ValidationError::missing(&["release_date"]))?;
    Ok(ScheduleFields {
        name: schedule_name(req.name.as_deref()),
        release_date,
    })
}

pub fn validate_new_day(req: &CreateDayRequest) -> Result<DayFields, ValidationError> {
    let date = req.date.ok_or_else(|| ValidationError::missing(&["date"]))?;
    Ok(DayFields {
        date,
        label: optional_text(req.label.as_deref()),
    })
}

pub fn merge_day(existing: &Day, patch: &UpdateDayRequest) -> DayFields {
    DayFields {
        date: patch.date.unwrap_or(existing.date),
        label: match &patch.label {
            Some(label) => optional_text(Some(label)),
            None => existing.label.clone(),
        },
    }
}

pub fn validate_new_event(req: &CreateEventRequest) -> Result<EventFields, ValidationError> {
    let title = optional_text(Some(&req.title));
    let mut missing = Vec::new();
    if title.is_none() {
        missing.push("title");
    }
    if req.start_time.is_none() {
        missing.push("start_time");
    }
    if req.end_time.is_none() {
        missing.push("end_time");
    }
    let (Some(title), Some(start_time), Some(end_time)) = (title, req.start_time, req.end_time)
    else {
        return Err(ValidationError::missing(&missing));
    };
    ensure_time_order(start_time, end_time)?;

    Ok(EventFields {
        title,
        start_time,
        end_time,
        location: optional_text(req.location.as_deref()),
        description: optional_text(req.description.as_deref()),
        sort_order: req.sort_order.unwrap_or(0),
    })
}

/// Applies `patch` over `existing`. Time ordering is re-checked only when the
/// patch touches a time.
pub fn merge_event(existing: &Event, patch: &UpdateEventRequest) -> Result<EventFields, ValidationError> {
    let title = match &patch.title {
        Some(title) => optional_text(Some(title)).ok_or_else(|| ValidationError::missing(&["title"]))?,
        None => existing.title.clone(),
    };
    let start_time = patch.start_time.unwrap_or(existing.start_time);
    let end_time = patch.end_time.unwrap_or(existing.end_time);
    if patch.start_time.is_some() || patch.end_time.is_some() {
        ensure_time_order(start_time, end_time)?;
    }

    Ok(EventFields {
        title,
        start_time,
        end_time,
        location: match &patch.location {
            Some(location) => optional_text(Some(location)),
            None => existing.location.clone(),
        },
        description: match &patch.description {
            Some(description) => optional_text(Some(description)),
            None => existing.description.clone(),
        },
        sort_order: patch.sort_order.unwrap_or(existing.sort_order),
    })
}

pub fn validate_reorder(event_ids: &[EventId]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(event_ids.len());
    if let Some(duplicate) = event_ids.iter().find(|id| !seen.insert(**id)) {
        return Err(ValidationError::field(
            "event_ids",
            format!("event {} appears more than once", duplicate.0),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
