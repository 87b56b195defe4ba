mod cli;
mod traffic;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use loglens_athena::{provision, AthenaEngine, EngineConfig, PollPolicy, ProvisionOutcome, RowCount};
use loglens_core::{ddl, LogLocation, TableSpec};
use loglens_s3::{LogStore, ObjectProbe, DEFAULT_SAMPLE_LIMIT};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = Cli::parse();
    let region = args.region.clone();
    let output_location = args
        .output_location
        .clone()
        .unwrap_or_else(loglens_athena::config::default_output_location);

    match args.command {
        Command::Buckets => {
            let store = LogStore::connect(&region).await;
            let buckets = store.list_buckets().await;
            if buckets.is_empty() {
                println!("no buckets visible in {region}");
            } else {
                for b in buckets {
                    println!("{b}");
                }
            }
        }

        Command::Prefixes { bucket, prefix } => {
            let store = LogStore::connect(&region).await;
            let prefixes = store.list_prefixes(&bucket, &prefix).await;
            if prefixes.is_empty() {
                println!("no folders found under s3://{bucket}/{prefix}");
            } else {
                for p in prefixes {
                    println!("{p}");
                }
            }
        }

        Command::Verify { bucket, prefix } => {
            let store = LogStore::connect(&region).await;
            match store.probe_objects(&bucket, &prefix, DEFAULT_SAMPLE_LIMIT).await {
                ObjectProbe::Found(keys) => {
                    println!("found {} log file(s):", keys.len());
                    for key in keys {
                        println!("  {key}");
                    }
                }
                ObjectProbe::Empty => {
                    println!("no log files found at s3://{bucket}/{prefix}");
                    println!(
                        "make sure server access logging is enabled and logs \
                         have been delivered (delivery can take 5-15 minutes)"
                    );
                }
                ObjectProbe::Failed(reason) => {
                    println!("could not list s3://{bucket}/{prefix}: {reason}");
                }
            }
        }

        Command::Ddl {
            bucket,
            prefix,
            database,
            table,
        } => {
            let (spec, location) = resolve_target(&bucket, prefix, database, table);
            let uri = location.uri();
            println!("{};", ddl::create_database(&spec.database));
            println!();
            println!("{};", ddl::create_table(&spec.database, &spec.table, &uri));
            println!();
            println!("{};", ddl::count_rows(&spec.database, &spec.table));
        }

        Command::Setup {
            bucket,
            prefix,
            database,
            table,
            max_attempts,
            poll_interval,
            json,
        } => {
            let (spec, location) = resolve_target(&bucket, prefix, database, table);
            let policy = PollPolicy {
                max_attempts,
                interval: Duration::from_secs(poll_interval),
            };

            let mut config = EngineConfig::from_env();
            config.region = region.clone();
            config.output_location = output_location;
            let engine = AthenaEngine::connect(config).await;

            let report = provision(&engine, &spec, &location, &policy).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            for outcome in &report.stages {
                println!(
                    "{}: {} (query {})",
                    outcome.stage, outcome.status, outcome.query_id
                );
            }
            println!("{}", report.summary());

            match &report.outcome {
                ProvisionOutcome::Completed { row_count } => match row_count {
                    RowCount::Count(n) if n != "0" => {
                        println!();
                        println!("-- sample queries --");
                        println!("{}", ddl::sample_queries(&spec.database, &spec.table));
                    }
                    _ => print_empty_table_hints(&location),
                },
                ProvisionOutcome::Halted { .. } => {
                    std::process::exit(1);
                }
            }
        }

        Command::Traffic { bucket, requests } => {
            let store = LogStore::connect(&region).await;
            let (succeeded, failed) = traffic::run(store.client(), &bucket, requests).await;
            println!("{succeeded} requests succeeded, {failed} failed");
            println!("wait 5-15 minutes for access logs to appear");
        }
    }

    Ok(())
}

fn resolve_target(
    bucket: &str,
    prefix: Option<String>,
    database: Option<String>,
    table: Option<String>,
) -> (TableSpec, LogLocation) {
    let mut spec = TableSpec::for_bucket(bucket);
    if let Some(db) = database {
        spec.database = db;
    }
    if let Some(t) = table {
        spec.table = t;
    }
    (spec, LogLocation::new(bucket, prefix))
}

fn print_empty_table_hints(location: &LogLocation) {
    println!();
    println!("table created but no data found. Possible reasons:");
    println!("  1. log files have not been delivered yet (wait 5-15 minutes)");
    println!("  2. wrong location selected (current: {})", location.uri());
    println!("  3. log format mismatch");
}
