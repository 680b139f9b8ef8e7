//! Display helpers shared by the admin tool and public readers.

use chrono::{NaiveDate, NaiveTime};

use crate::domain::{Day, Event};

/// `"Friday, March 6"`
pub fn weekday_label(date: NaiveDate) -> String {
    date.format("%A, %B %-d").to_string()
}

pub fn day_label(day: &Day) -> String {
    day.label
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| weekday_label(day.date))
}

/// `"9:00 AM"`
pub fn clock_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

pub fn time_range(event: &Event) -> String {
    format!(
        "{} - {}",
        clock_time(event.start_time),
        clock_time(event.end_time)
    )
}
