use super::*;
use crate::domain::{DayId, ScheduleId};

fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).expect("time")
}

fn stored_event() -> Event {
    Event {
        id: EventId(7),
        day_id: DayId(1),
        title: "Committee Session I".to_string(),
        start_time: time(9, 0),
        end_time: time(12, 0),
        location: Some("Ballroom A".to_string()),
        description: None,
        sort_order: 2,
    }
}

#[test]
fn equal_start_and_end_are_rejected() {
    let err = ensure_time_order(time(9, 0), time(9, 0)).expect_err("equal times");
    assert!(err.mentions("start_time"));
    assert!(err.mentions("end_time"));
}

#[test]
fn sub_minute_times_collapse_to_the_same_minute_and_are_rejected() {
    let req: CreateEventRequest = serde_json::from_str(
        r#"{"title":"Roll Call","start_time":"09:00:10","end_time":"09:00:50"}"#,
    )
    .expect("request");
    assert_eq!(req.start_time, Some(time(9, 0)));
    assert_eq!(req.end_time, Some(time(9, 0)));

    let err = validate_new_event(&req).expect_err("same minute");
    assert!(err.mentions("end_time"));
}

#[test]
fn new_event_names_every_missing_field() {
    let err = validate_new_event(&CreateEventRequest {
        title: "   ".to_string(),
        start_time: None,
        end_time: Some(time(10, 0)),
        ..CreateEventRequest::default()
    })
    .expect_err("missing fields");
    assert_eq!(err.fields, vec!["title", "start_time"]);
}

#[test]
fn new_event_defaults_sort_order_and_trims_text() {
    let fields = validate_new_event(&CreateEventRequest {
        title: " Opening Ceremonies ".to_string(),
        start_time: Some(time(9, 0)),
        end_time: Some(time(10, 0)),
        location: Some("  ".to_string()),
        description: Some("Keynote".to_string()),
        sort_order: None,
    })
    .expect("valid");
    assert_eq!(fields.title, "Opening Ceremonies");
    assert_eq!(fields.location, None);
    assert_eq!(fields.description.as_deref(), Some("Keynote"));
    assert_eq!(fields.sort_order, 0);
}

#[test]
fn patch_touching_one_time_rechecks_order_against_stored_value() {
    let err = merge_event(
        &stored_event(),
        &UpdateEventRequest {
            end_time: Some(time(8, 30)),
            ..UpdateEventRequest::default()
        },
    )
    .expect_err("end before stored start");
    assert!(err.mentions("end_time"));
}

#[test]
fn patch_without_times_keeps_stored_values() {
    let merged = merge_event(
        &stored_event(),
        &UpdateEventRequest {
            title: Some("Committee Session 1".to_string()),
            location: Some(String::new()),
            ..UpdateEventRequest::default()
        },
    )
    .expect("valid patch");
    assert_eq!(merged.title, "Committee Session 1");
    assert_eq!(merged.start_time, time(9, 0));
    assert_eq!(merged.location, None);
    assert_eq!(merged.sort_order, 2);
}

#[test]
fn blank_schedule_name_falls_back_to_default() {
    let fields = validate_schedule(&CreateScheduleRequest {
        name: Some("  ".to_string()),
        release_date: NaiveDate::from_ymd_opt(2027, 1, 15),
    })
    .expect("valid");
    assert_eq!(fields.name, DEFAULT_SCHEDULE_NAME);
}

#[test]
fn schedule_without_release_date_is_rejected() {
    let err = validate_schedule(&CreateScheduleRequest {
        name: Some("MUN".to_string()),
        release_date: None,
    })
    .expect_err("missing date");
    assert!(err.mentions("release_date"));
}

#[test]
fn day_patch_with_blank_label_clears_it() {
    let day = Day {
        id: DayId(1),
        schedule_id: ScheduleId(1),
        date: NaiveDate::from_ymd_opt(2027, 3, 5).expect("date"),
        label: Some("Opening Day".to_string()),
        event_count: 3,
    };
    let merged = merge_day(
        &day,
        &UpdateDayRequest {
            date: None,
            label: Some(String::new()),
        },
    );
    assert_eq!(merged.label, None);
    assert_eq!(merged.date, day.date);
}

#[test]
fn parse_date_distinguishes_missing_from_malformed() {
    let missing = parse_date("date", " ").expect_err("blank");
    assert!(missing.message.contains("missing"));
    let malformed = parse_date("date", "03/05/2027").expect_err("malformed");
    assert!(malformed.message.contains("YYYY-MM-DD"));
}

#[test]
fn reorder_rejects_duplicate_ids() {
    let err = validate_reorder(&[EventId(1), EventId(2), EventId(1)]).expect_err("duplicate");
    assert!(err.mentions("event_ids"));
    validate_reorder(&[EventId(3), EventId(1)]).expect("distinct ids");
}
