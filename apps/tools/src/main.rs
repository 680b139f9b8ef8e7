use anyhow::{anyhow, Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use server_api::{
    auth::{mint_admin_token, AdminTokenConfig},
    ApiContext,
};
use shared::{
    error::ApiError,
    protocol::{CreateDayRequest, CreateEventRequest, CreateScheduleRequest},
};
use storage::Storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/schedule.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Save a schedule with two sample days, replacing any existing days.
    Seed {
        #[arg(long, default_value = "Model UN Conference")]
        name: String,
        /// First conference day, YYYY-MM-DD. The release date is a week earlier.
        #[arg(long)]
        first_day: NaiveDate,
    },
    /// Delete all days and events, keeping the schedule record.
    Reset,
    /// Print a bearer token accepted by the server's write endpoints.
    MintAdminToken {
        #[arg(long, env = "ADMIN_JWT_SECRET", hide_env_values = true)]
        secret: String,
        #[arg(long, default_value = "admin")]
        subject: String,
        #[arg(long, default_value_t = 8 * 60 * 60)]
        ttl_seconds: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Seed { name, first_day } => {
            let ctx = open(&cli.database_url).await?;
            seed(&ctx, name, first_day).await?;
        }
        Command::Reset => {
            let ctx = open(&cli.database_url).await?;
            let ack = server_api::reset_schedule(&ctx).await.map_err(api_failure)?;
            println!("{}", ack.message);
        }
        Command::MintAdminToken {
            secret,
            subject,
            ttl_seconds,
        } => {
            let token = mint_admin_token(
                &AdminTokenConfig {
                    secret,
                    ttl_seconds,
                },
                &subject,
            )
            .context("failed to sign admin token")?;
            println!("{token}");
        }
    }

    Ok(())
}

async fn open(database_url: &str) -> Result<ApiContext> {
    let storage = Storage::new(database_url)
        .await
        .with_context(|| format!("failed to open {database_url}"))?;
    Ok(ApiContext { storage })
}

fn api_failure(err: ApiError) -> anyhow::Error {
    anyhow!("{:?}: {}", err.code, err.message)
}

fn at(hour: u32, minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}

async fn seed(ctx: &ApiContext, name: String, first_day: NaiveDate) -> Result<()> {
    let schedule = server_api::create_or_update_schedule(
        ctx,
        &CreateScheduleRequest {
            name: Some(name),
            release_date: Some(first_day - Duration::days(7)),
        },
    )
    .await
    .map_err(api_failure)?;
    server_api::reset_schedule(ctx).await.map_err(api_failure)?;

    let sessions: [(&str, &[(&str, Option<NaiveTime>, Option<NaiveTime>, &str)]); 2] = [
        (
            "Opening Day",
            &[
                ("Registration", at(8, 0), at(9, 0), "Lobby"),
                ("Opening Ceremony", at(9, 0), at(10, 30), "Main Hall"),
                ("Committee Session I", at(11, 0), at(13, 0), "Committee Rooms"),
            ],
        ),
        (
            "Closing Day",
            &[
                ("Committee Session II", at(9, 0), at(12, 0), "Committee Rooms"),
                ("Closing Ceremony", at(14, 0), at(15, 30), "Main Hall"),
            ],
        ),
    ];

    for (offset, (label, events)) in sessions.iter().enumerate() {
        let day = server_api::create_day(
            ctx,
            &CreateDayRequest {
                date: Some(first_day + Duration::days(offset as i64)),
                label: Some(label.to_string()),
            },
        )
        .await
        .map_err(api_failure)?;
        for (sort_order, (title, start_time, end_time, location)) in events.iter().enumerate() {
            server_api::create_event(
                ctx,
                day.id,
                &CreateEventRequest {
                    title: title.to_string(),
                    start_time: *start_time,
                    end_time: *end_time,
                    location: Some(location.to_string()),
                    description: None,
                    sort_order: Some(sort_order as i32),
                },
            )
            .await
            .map_err(api_failure)?;
        }
        println!("seeded day_id={} with {} event(s)", day.id.0, events.len());
    }

    println!("seeded schedule_id={} \"{}\"", schedule.id.0, schedule.name);
    Ok(())
}
