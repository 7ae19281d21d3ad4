use std::path::PathBuf;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use office_hours_insights::config::Config;
use office_hours_insights::{db, preferences, report, Filter, InsightRegistry, PgStore, Role};

#[derive(Parser)]
#[command(name = "office-hours-insights")]
#[command(about = "Office hours queue insights for course staff", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load a demo course with questions
    Seed,
    /// Print metadata for every registered insight
    List,
    /// Compute one insight and print it as JSON
    Compute {
        name: String,
        #[arg(long, default_value = "professor")]
        role: Role,
        #[arg(long)]
        course: i32,
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        since_days: Option<i64>,
        /// Also write the output as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Generate a markdown dashboard of every insight the role may view
    Report {
        #[arg(long, default_value = "professor")]
        role: Role,
        #[arg(long)]
        course: i32,
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
        since_days: Option<i64>,
        #[arg(long, default_value = "insights.md")]
        out: PathBuf,
    },
    /// Add an insight to a user's dashboard
    ToggleOn {
        #[arg(long)]
        user: i32,
        name: String,
    },
    /// Remove an insight from a user's dashboard
    ToggleOff {
        #[arg(long)]
        user: i32,
        name: String,
    },
}

fn filters_for(course: i32, since_days: Option<i64>) -> Vec<Filter> {
    let mut filters = vec![Filter::course(course)];
    if let Some(days) = since_days {
        let end = Utc::now();
        filters.push(Filter::timeframe(end - Duration::days(days), end));
    }
    filters
}

fn window_label(since_days: Option<i64>) -> String {
    match since_days {
        Some(days) => format!("last {days} days"),
        None => "all time".to_string(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let registry = InsightRegistry::builtin()?;

    if let Commands::List = cli.command {
        println!("{}", serde_json::to_string_pretty(&registry.list_all())?);
        return Ok(());
    }

    let config = Config::from_env()?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to Postgres")?;
    let store = PgStore::new(pool);

    match cli.command {
        Commands::List => unreachable!("handled before connecting"),
        Commands::InitDb => {
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(store.pool()).await?;
            let dashboard = preferences::defaults_for(&registry, Role::Professor);
            db::set_user_insights(store.pool(), db::SEED_PROFESSOR_ID, &dashboard).await?;
            println!("Seed data inserted for course {}.", db::SEED_COURSE_ID);
        }
        Commands::Compute {
            name,
            role,
            course,
            since_days,
            csv,
        } => {
            let filters = filters_for(course, since_days);
            let computed = registry.compute(&store, &name, role, &filters).await?;
            println!("{}", serde_json::to_string_pretty(&computed)?);

            if let Some(path) = csv {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                report::write_csv(&computed.output, file)?;
                println!("CSV written to {}.", path.display());
            }
        }
        Commands::Report {
            role,
            course,
            since_days,
            out,
        } => {
            let filters = filters_for(course, since_days);
            let mut computed = Vec::new();
            for definition in registry.visible_to(role) {
                computed.push(registry.compute(&store, definition.name, role, &filters).await?);
            }
            info!(insights = computed.len(), course, "building dashboard report");

            let report = report::build_dashboard_report(
                &format!("course {course}"),
                &window_label(since_days),
                &computed,
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::ToggleOn { user, name } => {
            let current = db::user_insights(store.pool(), user).await?;
            let updated = preferences::enable(&registry, &current, &name)?;
            db::set_user_insights(store.pool(), user, &updated).await?;
            println!("Dashboard for user {user}: {}", updated.join(", "));
        }
        Commands::ToggleOff { user, name } => {
            let current = db::user_insights(store.pool(), user).await?;
            let updated = preferences::disable(&registry, &current, &name)?;
            db::set_user_insights(store.pool(), user, &updated).await?;
            println!("Dashboard for user {user}: {}", updated.join(", "));
        }
    }

    Ok(())
}
