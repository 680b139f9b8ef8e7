use super::*;
use chrono::{NaiveDate, NaiveTime};
use shared::domain::{DayId, EventId, ScheduleId};

fn day() -> Day {
    Day {
        id: DayId(2),
        schedule_id: ScheduleId(1),
        date: NaiveDate::from_ymd_opt(2026, 3, 6).expect("date"),
        label: None,
        event_count: 1,
    }
}

fn event() -> Event {
    Event {
        id: EventId(9),
        day_id: DayId(2),
        title: "Opening Ceremony".to_string(),
        start_time: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
        end_time: NaiveTime::from_hms_opt(10, 30, 0).expect("time"),
        location: Some("Main Hall".to_string()),
        description: None,
        sort_order: 0,
    }
}

#[test]
fn hidden_public_schedule_only_shows_release_date() {
    let text = public(&PublicSchedule {
        visible: false,
        name: "Model UN".to_string(),
        release_date: NaiveDate::from_ymd_opt(2027, 2, 1).expect("date"),
        days: Vec::new(),
    });
    assert_eq!(text, "Model UN\n  not yet released (release date 2027-02-01)\n");
}

#[test]
fn visible_public_schedule_lists_the_tree() {
    let text = public(&PublicSchedule {
        visible: true,
        name: "Model UN".to_string(),
        release_date: NaiveDate::from_ymd_opt(2026, 2, 1).expect("date"),
        days: vec![DayDetails {
            day: day(),
            events: vec![event()],
        }],
    });
    assert!(text.contains("#2 Friday, March 6 (2026-03-06) - 1 event(s)"));
    assert!(text.contains("#9 [0] 9:00 AM - 10:30 AM Opening Ceremony @ Main Hall"));
}

#[test]
fn overview_without_schedule_says_so() {
    assert_eq!(overview(&WorkflowState::default()), "no schedule saved yet\n");
}
