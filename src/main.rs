use std::path::PathBuf;

use academic_insight_engine::{db, insight, report, risk, skills, trend};
use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "academic-insights")]
#[command(about = "Student insight profiles and institutional analytics", long_about = None)]
struct Cli {
    /// Postgres connection string
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    #[arg(long, env = "DATABASE_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    max_connections: u32,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load realistic seed data
    Seed,
    /// Import students from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Build the institution-wide overview
    Overview {
        #[arg(long, value_enum, default_value = "json")]
        format: OutputFormat,
        /// Write to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show one student with their completed insight profile
    Insight {
        #[arg(long)]
        student_id: String,
    },
    /// Complete insight profiles for every student
    BulkInsights,
    /// Predict next-semester CGPA from a comma-separated history
    PredictCgpa {
        #[arg(long, value_delimiter = ',', required = true, allow_negative_numbers = true)]
        history: Vec<f64>,
    },
    /// Score dropout risk from raw signals
    ScoreRisk {
        #[arg(long)]
        attendance: f64,
        #[arg(long, allow_negative_numbers = true)]
        cgpa_trend: f64,
        #[arg(long, default_value_t = 0)]
        failed_subjects: u32,
    },
    /// Compare possessed skills against a required set
    SkillGap {
        #[arg(long, value_delimiter = ',')]
        current: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        required: Vec<String>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_env("ACADEMIC_INSIGHTS_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect(cli: &Cli) -> anyhow::Result<PgPool> {
    let database_url = cli
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to a production Postgres instance")?;

    PgPoolOptions::new()
        .max_connections(cli.max_connections)
        .connect(database_url)
        .await
        .context("failed to connect to Postgres")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match &cli.command {
        Commands::PredictCgpa { history } => {
            return print_json(&trend::forecast(history));
        }
        Commands::ScoreRisk {
            attendance,
            cgpa_trend,
            failed_subjects,
        } => {
            return print_json(&risk::score(&risk::RiskSignals {
                attendance_percent: *attendance,
                cgpa_trend: *cgpa_trend,
                failed_subjects: *failed_subjects,
            }));
        }
        Commands::SkillGap { current, required } => {
            return print_json(&skills::analyze_gap(current, required));
        }
        _ => {}
    }

    let pool = connect(&cli).await?;
    let store = db::PgStore::new(pool.clone());

    match cli.command {
        Commands::InitDb => {
            db::init_db(&pool).await.context("failed to run migrations")?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let imported = db::import_csv(&pool, &csv)
                .await
                .with_context(|| format!("failed to import {}", csv.display()))?;
            println!("Imported {imported} students from {}.", csv.display());
        }
        Commands::Overview { format, out } => {
            let overview = report::generate_overview(&store, &store)
                .await
                .context("failed to build overview")?;
            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&overview)?,
                OutputFormat::Markdown => {
                    report::render_markdown(&overview, chrono::Utc::now().date_naive())
                }
            };

            match out {
                Some(path) => {
                    std::fs::write(&path, rendered)?;
                    println!("Overview written to {}.", path.display());
                }
                None => println!("{rendered}"),
            }
        }
        Commands::Insight { student_id } => {
            let detail = insight::inspect_student(&store, &store, &student_id)
                .await
                .with_context(|| format!("failed to load insights for {student_id}"))?;
            print_json(&detail)?;
        }
        Commands::BulkInsights => {
            let written = insight::bulk_generate(&store, &store).await?;
            println!("Insight profiles completed for {written} students.");
        }
        Commands::PredictCgpa { .. } | Commands::ScoreRisk { .. } | Commands::SkillGap { .. } => {}
    }

    Ok(())
}
