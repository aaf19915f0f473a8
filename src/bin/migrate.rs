//! Migration runner
//!
//! Applies `migration_*.sql` scripts from a directory in version order.
//!
//! Run with: cargo run --bin migrate -- migrations/
//!
//! Exit codes: 0 success, 1 script failed, 2 discovery failed, 3 config/connection error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use sqlx::Connection;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use calendar_store::migrate::{plan, MigrationError, Progress, Sequencer, EXIT_CONNECTION_FAILED};
use calendar_store::{db, ConnectionUrl};

#[derive(Debug, Parser)]
#[command(name = "migrate", about = "Apply calendar_store migration scripts in version order")]
struct Args {
    /// Directory containing migration_<date>_<seq>[_<subseq>...].sql scripts
    dir: PathBuf,

    /// Print the order scripts would be applied in, without connecting
    #[arg(long)]
    dry_run: bool,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "calendar_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let args = Args::parse();

    if args.dry_run {
        return match plan(&args.dir).await {
            Ok(scripts) => {
                for script in scripts {
                    println!("{}", script.filename());
                }
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Migration discovery failed: {}", e);
                ExitCode::from(e.exit_code())
            }
        };
    }

    let url = match std::env::var("DATABASE_URL") {
        Ok(raw) => match ConnectionUrl::parse(&raw) {
            Ok(url) => url,
            Err(e) => {
                eprintln!("{}", e);
                return ExitCode::from(EXIT_CONNECTION_FAILED);
            }
        },
        Err(_) => {
            eprintln!("Missing environment variable: DATABASE_URL");
            return ExitCode::from(EXIT_CONNECTION_FAILED);
        }
    };

    let mut conn = match db::connect_single(&url).await {
        Ok(conn) => conn,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(EXIT_CONNECTION_FAILED);
        }
    };

    let sequencer = Sequencer::new(&args.dir);
    let result = sequencer
        .run(&mut conn, |progress| match progress {
            Progress::Applying(script) => println!("{}", script.filename()),
            Progress::Applied(script) => println!("Migration complete: {}", script.filename()),
            Progress::Skipped(script) => println!("Already applied: {}", script.filename()),
        })
        .await;

    if let Err(e) = conn.close().await {
        tracing::warn!(error = %e, "Failed to close migration connection cleanly");
    }

    match result {
        Ok(report) => {
            println!(
                "Migrations done: {} applied, {} already applied",
                report.applied.len(),
                report.skipped.len()
            );
            ExitCode::SUCCESS
        }
        Err(e) => exit_for(&e),
    }
}

fn exit_for(err: &MigrationError) -> ExitCode {
    eprintln!("{}", err);

    if let (MigrationError::Read { filename, .. } | MigrationError::Apply { filename, .. }) = err {
        eprintln!("Stopped at {}; later migrations were not attempted", filename);
    }

    ExitCode::from(err.exit_code())
}
