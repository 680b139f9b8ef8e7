use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    DayDraft, EventDraft, HttpScheduleApi, Notice, ScheduleApi, ScheduleDraft, SelectedItem,
    StaticToken, WorkflowController, WorkflowState,
};
use shared::domain::{DayId, EventId};
use tracing_subscriber::EnvFilter;

mod render;

#[derive(Parser, Debug)]
#[command(about = "Manage the conference schedule")]
struct Cli {
    #[arg(long, env = "SCHEDULE_SERVER_URL", default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[arg(long, env = "SCHEDULE_API_KEY", default_value = "dev-read-key")]
    api_key: String,
    /// Admin bearer token; required for anything that changes the schedule.
    #[arg(long, env = "SCHEDULE_ADMIN_TOKEN", hide_env_values = true)]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Schedule record and its days.
    Show,
    SaveSchedule {
        #[arg(long, default_value = "")]
        name: String,
        /// YYYY-MM-DD
        #[arg(long)]
        release_date: String,
    },
    Publish,
    Unpublish,
    /// Delete every day and event, keeping the schedule record.
    Reset,
    AddDay {
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "")]
        label: String,
    },
    EditDay {
        day_id: i64,
        #[arg(long)]
        date: Option<String>,
        /// An empty value clears the label.
        #[arg(long)]
        label: Option<String>,
    },
    DeleteDay {
        day_id: i64,
    },
    Events {
        day_id: i64,
    },
    AddEvent {
        day_id: i64,
        #[arg(long)]
        title: String,
        /// HH:MM
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long, default_value = "")]
        sort_order: String,
    },
    EditEvent {
        day_id: i64,
        event_id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        sort_order: Option<String>,
    },
    DeleteEvent {
        day_id: i64,
        event_id: i64,
    },
    /// Give the day's events a new order, first id first.
    Reorder {
        day_id: i64,
        #[arg(required = true)]
        event_ids: Vec<i64>,
    },
    /// The full nested tree as the public site will render it.
    Preview,
    /// What unauthenticated readers see right now.
    Public,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();
    let cli = Cli::parse();

    let api: Arc<dyn ScheduleApi> = Arc::new(HttpScheduleApi::new(
        &cli.server_url,
        cli.api_key,
        Arc::new(StaticToken(cli.token)),
    )?);
    let workflow = WorkflowController::new(api);

    report(workflow.load().await)?;

    match cli.command {
        Command::Show => {
            let state = workflow.snapshot().await;
            if state.schedule.is_some() {
                report(workflow.manage_days().await)?;
            }
            print!("{}", render::overview(&workflow.snapshot().await));
        }
        Command::SaveSchedule { name, release_date } => {
            report(
                workflow
                    .save_schedule(&ScheduleDraft { name, release_date })
                    .await,
            )?;
        }
        Command::Publish => report(workflow.set_published(true).await)?,
        Command::Unpublish => report(workflow.set_published(false).await)?,
        Command::Reset => report(workflow.reset_schedule().await)?,
        Command::AddDay { date, label } => {
            report(workflow.manage_days().await)?;
            workflow.open_create_form().await;
            report(workflow.submit_day(&DayDraft { date, label }).await)?;
        }
        Command::EditDay {
            day_id,
            date,
            label,
        } => {
            report(workflow.manage_days().await)?;
            let day = find_day(&workflow.snapshot().await, DayId(day_id))?;
            let mut draft = DayDraft::from_day(&day);
            if let Some(date) = date {
                draft.date = date;
            }
            if let Some(label) = label {
                draft.label = label;
            }
            workflow.open_edit_form(SelectedItem::Day(day)).await;
            report(workflow.submit_day(&draft).await)?;
        }
        Command::DeleteDay { day_id } => report(workflow.delete_day(DayId(day_id)).await)?,
        Command::Events { day_id } => {
            open_day(&workflow, day_id).await?;
            print!("{}", render::day_events(&workflow.snapshot().await));
        }
        Command::AddEvent {
            day_id,
            title,
            start,
            end,
            location,
            description,
            sort_order,
        } => {
            open_day(&workflow, day_id).await?;
            workflow.open_create_form().await;
            let draft = EventDraft {
                title,
                start_time: start,
                end_time: end,
                location,
                description,
                sort_order,
            };
            report(workflow.submit_event(&draft).await)?;
        }
        Command::EditEvent {
            day_id,
            event_id,
            title,
            start,
            end,
            location,
            description,
            sort_order,
        } => {
            open_day(&workflow, day_id).await?;
            let event = workflow
                .snapshot()
                .await
                .events
                .into_iter()
                .find(|event| event.id == EventId(event_id))
                .ok_or_else(|| anyhow!("event {event_id} is not on day {day_id}"))?;
            let mut draft = EventDraft::from_event(&event);
            for (field, value) in [
                (&mut draft.title, title),
                (&mut draft.start_time, start),
                (&mut draft.end_time, end),
                (&mut draft.location, location),
                (&mut draft.description, description),
                (&mut draft.sort_order, sort_order),
            ] {
                if let Some(value) = value {
                    *field = value;
                }
            }
            workflow.open_edit_form(SelectedItem::Event(event)).await;
            report(workflow.submit_event(&draft).await)?;
        }
        Command::DeleteEvent { day_id, event_id } => {
            open_day(&workflow, day_id).await?;
            report(workflow.delete_event(EventId(event_id)).await)?;
        }
        Command::Reorder { day_id, event_ids } => {
            open_day(&workflow, day_id).await?;
            let ordered: Vec<EventId> = event_ids.into_iter().map(EventId).collect();
            report(workflow.reorder_events(&ordered).await)?;
            print!("{}", render::day_events(&workflow.snapshot().await));
        }
        Command::Preview => {
            report(workflow.manage_days().await)?;
            report(workflow.preview().await)?;
            let state = workflow.snapshot().await;
            if let Some(details) = &state.preview {
                print!("{}", render::details(details));
            }
        }
        Command::Public => {
            let public = workflow
                .public_view()
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            print!("{}", render::public(&public));
        }
    }

    Ok(())
}

async fn open_day(workflow: &WorkflowController, day_id: i64) -> Result<()> {
    report(workflow.manage_days().await)?;
    report(workflow.open_day(DayId(day_id)).await)
}

fn find_day(state: &WorkflowState, day_id: DayId) -> Result<shared::domain::Day> {
    state
        .days
        .iter()
        .find(|day| day.id == day_id)
        .cloned()
        .ok_or_else(|| anyhow!("day {} not found", day_id.0))
}

/// Prints the notice; an error notice ends the run with a failure status.
fn report(notice: Notice) -> Result<()> {
    if notice.is_error() {
        bail!(notice.text);
    }
    println!("{}", notice.text);
    Ok(())
}
