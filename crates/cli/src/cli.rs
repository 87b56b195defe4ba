use clap::{Parser, Subcommand};

/// Provision an Athena analytics table over S3 server-access logs.
#[derive(Parser, Debug)]
#[command(name = "loglens", version, about)]
pub struct Cli {
    /// AWS region the service clients are built for.
    #[arg(long, env = "AWS_REGION", default_value = "us-east-1")]
    pub region: String,

    /// S3 location query results are written to
    /// (default: s3://athena-results-{YYYYMMDD}/).
    #[arg(long, env = "LOGLENS_OUTPUT_LOCATION")]
    pub output_location: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List candidate log buckets.
    Buckets,

    /// List one level of folders under a bucket.
    Prefixes {
        #[arg(long)]
        bucket: String,

        /// Parent prefix to list under.
        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Check that log objects exist at a location.
    Verify {
        #[arg(long)]
        bucket: String,

        #[arg(long, default_value = "")]
        prefix: String,
    },

    /// Print the statements that `setup` would run, without executing.
    Ddl {
        #[arg(long)]
        bucket: String,

        #[arg(long)]
        prefix: Option<String>,

        /// Database name (default: s3_logs_{bucket}, sanitized).
        #[arg(long)]
        database: Option<String>,

        /// Table name (default: access_logs).
        #[arg(long)]
        table: Option<String>,
    },

    /// Create the database and external table, then verify rows are
    /// readable.
    Setup {
        #[arg(long)]
        bucket: String,

        #[arg(long)]
        prefix: Option<String>,

        #[arg(long)]
        database: Option<String>,

        #[arg(long)]
        table: Option<String>,

        /// Status polls per statement before giving up.
        #[arg(long, default_value_t = 30)]
        max_attempts: u32,

        /// Seconds between status polls.
        #[arg(long, default_value_t = 1)]
        poll_interval: u64,

        /// Emit the full report as JSON instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Generate synthetic request traffic so access logs exist to analyze.
    Traffic {
        #[arg(long)]
        bucket: String,

        /// Number of requests to issue.
        #[arg(long, default_value_t = 50)]
        requests: u32,
    },
}
