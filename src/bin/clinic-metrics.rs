use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use clinic_metrics::api::params::{parse_clinic_id, DEFAULT_RECENT_LIMIT};
use clinic_metrics::api::ApiContext;
use clinic_metrics::date_util::{parse_day, today_at_offset};
use clinic_metrics::{AppointmentSource, Database, ImportBatch, Metric, ServerConfig};

#[derive(Parser)]
#[command(name = "clinic-metrics", about = "Clinic scheduling metrics API and CLI")]
struct Cli {
    /// Rollup store path (default: $CLINIC_METRICS_DB or ~/.clinic-metrics/rollups.db)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (overrides $PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Load rollup rows and appointments from a JSON file
    Import {
        /// JSON file with optional "rollups" and "appointments" arrays
        file: PathBuf,
    },
    /// Summarize a clinic over a date range
    Summary {
        /// Clinic UUID
        #[arg(long)]
        clinic: String,
        /// First day of the range (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        /// Last day of the range (YYYY-MM-DD)
        #[arg(long)]
        to: String,
        /// Day used for "appointments today" (default: today)
        #[arg(long)]
        today: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one metric per day over a date range
    Timeseries {
        /// Clinic UUID
        #[arg(long)]
        clinic: String,
        /// appointments, medianResponseTime, averageResponseTime, noShowRate or responseRate
        #[arg(long)]
        metric: String,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List a clinic's most recently booked appointments
    Recent {
        /// Clinic UUID
        #[arg(long)]
        clinic: String,
        #[arg(long, default_value_t = DEFAULT_RECENT_LIMIT)]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show store location and row count
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // The server announces itself at info, so it starts one notch louder
    let verbosity = match cli.command {
        Commands::Serve { .. } => cli.verbose.max(1),
        _ => cli.verbose,
    };
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = ServerConfig::from_env()?;
    if let Some(path) = cli.db {
        config.db_path = Some(path);
    }

    let db_path = match &config.db_path {
        Some(path) => path.clone(),
        None => clinic_metrics::storage::default_path()?,
    };
    let db = match &config.db_path {
        Some(path) => Database::open_at(path).await?,
        None => Database::open().await?,
    };

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            let db = Arc::new(db);
            let ctx = ApiContext::new(db.clone(), db, config);
            clinic_metrics::api::serve(ctx).await?;
        }
        Commands::Import { file } => {
            let content = std::fs::read_to_string(&file)?;
            let batch: ImportBatch = serde_json::from_str(&content)?;
            let (rollups, appointments) = db.import(batch).await?;
            println!(
                "Imported {rollups} rollup rows and {appointments} appointments from {}.",
                file.display()
            );
        }
        Commands::Summary {
            clinic,
            from,
            to,
            today,
            json,
        } => {
            let clinic_id = parse_clinic_id(&clinic)?;
            let from = parse_day(&from)?;
            let to = parse_day(&to)?;
            let today = match today {
                Some(d) => parse_day(&d)?,
                None => today_at_offset(config.tz_offset_minutes)?,
            };
            let s = clinic_metrics::summarize(&db, clinic_id, from, to, today).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&s)?);
            } else {
                println!("Clinic {clinic_id} ({from} to {to})");
                println!("  Appointments today ({today}): {}", s.appts_today);
                println!("  Appointments in period:       {}", s.appts_in_period);
                println!("  Avg response (weighted):      {}s", s.avg_response_sec_weighted);
                println!("  Median response (daily p50):  {}s", s.p50_response_sec_period);
                println!("  Response rate:                {:.2}%", s.response_rate_percent);
                println!("  No-shows:                     {}", s.no_shows_in_period);
                println!(
                    "  Rescheduled from no-show:     {}",
                    s.rescheduled_from_no_show_in_period
                );
            }
        }
        Commands::Timeseries {
            clinic,
            metric,
            from,
            to,
            json,
        } => {
            let clinic_id = parse_clinic_id(&clinic)?;
            let metric: Metric = metric.parse()?;
            let from = parse_day(&from)?;
            let to = parse_day(&to)?;
            let points = clinic_metrics::project(&db, clinic_id, from, to, metric).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&points)?);
            } else if points.is_empty() {
                println!("No rollup rows for {clinic_id} between {from} and {to}.");
            } else {
                println!("{metric} for {clinic_id}:");
                for p in &points {
                    println!("  {}  {}", p.day, p.value);
                }
            }
        }
        Commands::Recent {
            clinic,
            limit,
            json,
        } => {
            let clinic_id = parse_clinic_id(&clinic)?;
            let appointments = db.recent_appointments(clinic_id, limit).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&appointments)?);
            } else if appointments.is_empty() {
                println!("No appointments for {clinic_id}.");
            } else {
                for a in &appointments {
                    println!(
                        "  {}  {}  {}  (booked {})",
                        a.scheduled_for, a.status, a.id, a.scheduled_at
                    );
                }
            }
        }
        Commands::Status => {
            let count = db.rollup_count().await?;
            println!("Store:        {}", db_path.display());
            println!("Rollup rows:  {count}");
        }
    }

    Ok(())
}
