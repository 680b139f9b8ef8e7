//! Plain-text views of workflow state.

use std::fmt::Write as _;

use client_core::WorkflowState;
use shared::{
    domain::{Day, Event, Schedule},
    format::{day_label, time_range},
    protocol::{DayDetails, PublicSchedule, ScheduleDetails},
};

pub fn overview(state: &WorkflowState) -> String {
    let mut out = String::new();
    match &state.schedule {
        Some(schedule) => {
            schedule_header(&mut out, schedule);
            for day in &state.days {
                day_line(&mut out, day);
            }
        }
        None => out.push_str("no schedule saved yet\n"),
    }
    out
}

pub fn day_events(state: &WorkflowState) -> String {
    let mut out = String::new();
    if let Some(day) = &state.selected_day {
        day_line(&mut out, day);
    }
    for event in &state.events {
        event_line(&mut out, event);
    }
    out
}

pub fn details(details: &ScheduleDetails) -> String {
    let mut out = String::new();
    schedule_header(&mut out, &details.schedule);
    day_tree(&mut out, &details.days);
    out
}

pub fn public(public: &PublicSchedule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", public.name);
    if !public.visible {
        let _ = writeln!(out, "  not yet released (release date {})", public.release_date);
        return out;
    }
    day_tree(&mut out, &public.days);
    out
}

fn schedule_header(out: &mut String, schedule: &Schedule) {
    let status = if schedule.is_published {
        "published"
    } else {
        "draft"
    };
    let _ = writeln!(
        out,
        "{} [{status}] release date {}",
        schedule.name, schedule.release_date
    );
}

fn day_tree(out: &mut String, days: &[DayDetails]) {
    for entry in days {
        day_line(out, &entry.day);
        for event in &entry.events {
            event_line(out, event);
        }
    }
}

fn day_line(out: &mut String, day: &Day) {
    let _ = writeln!(
        out,
        "  #{} {} ({}) - {} event(s)",
        day.id.0,
        day_label(day),
        day.date,
        day.event_count
    );
}

fn event_line(out: &mut String, event: &Event) {
    let _ = write!(
        out,
        "    #{} [{}] {} {}",
        event.id.0,
        event.sort_order,
        time_range(event),
        event.title
    );
    if let Some(location) = &event.location {
        let _ = write!(out, " @ {location}");
    }
    out.push('\n');
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
