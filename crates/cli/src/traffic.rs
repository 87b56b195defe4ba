//! Synthetic request traffic so access logs exist to analyze.
//!
//! Issues a fixed mix of GET and HEAD requests against well-known keys,
//! including one that does not exist (a deliberate 404 in the logs), paced
//! 0.5–2 s apart. Request failures are expected and tolerated — the point
//! is the log lines, not the responses.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Get,
    Head,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("GET"),
            Self::Head => f.write_str("HEAD"),
        }
    }
}

/// Request mix. `non-existent.txt` is intentional: it writes 404 rows.
const OPERATIONS: [(Op, &str); 6] = [
    (Op::Get, "test1.txt"),
    (Op::Get, "test2.txt"),
    (Op::Get, "folder1/test2.txt"),
    (Op::Head, "large.txt"),
    (Op::Get, "non-existent.txt"),
    (Op::Get, "folder2/large.txt"),
];

const MIN_PACING_MS: u64 = 500;
const MAX_PACING_MS: u64 = 2000;

/// Pseudo-random index from the nanosecond fraction of the clock; good
/// enough for traffic shaping, avoids a rand dependency.
fn pick(n: usize) -> usize {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as usize;
    nanos % n
}

/// Pacing delay in `[500ms, 2000ms)`.
fn pacing() -> Duration {
    let span = MAX_PACING_MS - MIN_PACING_MS;
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    Duration::from_millis(MIN_PACING_MS + nanos % span)
}

/// Issue `requests` randomized object requests against `bucket`.
/// Returns `(succeeded, failed)` counts.
pub async fn run(client: &aws_sdk_s3::Client, bucket: &str, requests: u32) -> (u32, u32) {
    info!(bucket = %bucket, requests, "starting traffic generation");

    let mut succeeded = 0u32;
    let mut failed = 0u32;

    for i in 0..requests {
        let (op, key) = OPERATIONS[pick(OPERATIONS.len())];

        let result = match op {
            Op::Get => client
                .get_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            Op::Head => client
                .head_object()
                .bucket(bucket)
                .key(key)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
        };

        match result {
            Ok(()) => {
                succeeded += 1;
                info!(request = i + 1, op = %op, key = %key, "ok");
            }
            Err(e) => {
                failed += 1;
                warn!(request = i + 1, op = %op, key = %key, error = %e, "request failed (may be expected)");
            }
        }

        if i + 1 < requests {
            tokio::time::sleep(pacing()).await;
        }
    }

    info!(succeeded, failed, "traffic generation finished");
    (succeeded, failed)
}
