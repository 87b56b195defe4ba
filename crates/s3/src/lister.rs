//! Bucket and prefix enumeration over the S3 listing API.
//!
//! Listing failures are non-fatal by contract: they are logged and the call
//! returns an empty result, so a permission problem on one bucket never
//! aborts the surrounding workflow. Object probing is the exception — it
//! reports failure as a distinct [`ObjectProbe`] variant because callers
//! need to tell "no logs yet" apart from "could not look".

use std::collections::BTreeSet;

use aws_config::BehaviorVersion;
use tracing::{debug, info, warn};

/// How many sample keys a probe returns at most.
pub const DEFAULT_SAMPLE_LIMIT: i32 = 5;

/// Outcome of probing a location for log objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectProbe {
    /// Objects exist; carries up to the requested number of sample keys.
    Found(Vec<String>),
    /// The listing succeeded but returned nothing.
    Empty,
    /// The listing call itself failed.
    Failed(String),
}

impl ObjectProbe {
    /// Legacy boolean view: only `Found` counts as existing.
    pub fn exists(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}

/// Read-only client over the object-storage listing API.
pub struct LogStore {
    client: aws_sdk_s3::Client,
}

impl LogStore {
    /// Build a client for the given region using the ambient credential
    /// chain (env, profile, instance role).
    pub async fn connect(region: &str) -> Self {
        let region = aws_sdk_s3::config::Region::new(region.to_string());
        let aws_cfg = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        Self {
            client: aws_sdk_s3::Client::new(&aws_cfg),
        }
    }

    /// Access to the underlying SDK client, for callers issuing their own
    /// object requests (e.g. the traffic generator).
    pub fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }

    /// All buckets visible to the caller, in provider order. Transport and
    /// permission failures log a warning and yield an empty list.
    pub async fn list_buckets(&self) -> Vec<String> {
        match self.client.list_buckets().send().await {
            Ok(resp) => {
                let names: Vec<String> = resp
                    .buckets()
                    .iter()
                    .filter_map(|b| b.name().map(str::to_string))
                    .collect();
                debug!(count = names.len(), "listed buckets");
                names
            }
            Err(e) => {
                warn!(error = %e, "failed to list buckets");
                Vec::new()
            }
        }
    }

    /// Immediate child prefixes ("folders") under `prefix`, one delimiter
    /// level deep, sorted and deduplicated. Failures yield an empty list.
    pub async fn list_prefixes(&self, bucket: &str, prefix: &str) -> Vec<String> {
        let mut found = BTreeSet::new();

        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .delimiter("/")
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            match page {
                Ok(page) => {
                    for cp in page.common_prefixes() {
                        if let Some(p) = cp.prefix() {
                            found.insert(p.to_string());
                        }
                    }
                }
                Err(e) => {
                    warn!(bucket = %bucket, error = %e, "failed to list prefixes");
                    return Vec::new();
                }
            }
        }

        sorted_prefixes(found)
    }

    /// Check whether any objects exist under `bucket`/`prefix`, sampling up
    /// to `limit` keys.
    pub async fn probe_objects(&self, bucket: &str, prefix: &str, limit: i32) -> ObjectProbe {
        let resp = self
            .client
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix)
            .max_keys(limit)
            .send()
            .await;

        match resp {
            Ok(resp) => {
                let keys: Vec<String> = resp
                    .contents()
                    .iter()
                    .filter_map(|o| o.key().map(str::to_string))
                    .collect();
                if keys.is_empty() {
                    info!(bucket = %bucket, prefix = %prefix, "no log objects found");
                    ObjectProbe::Empty
                } else {
                    info!(bucket = %bucket, prefix = %prefix, samples = keys.len(), "log objects present");
                    ObjectProbe::Found(keys)
                }
            }
            Err(e) => {
                warn!(bucket = %bucket, prefix = %prefix, error = %e, "object probe failed");
                ObjectProbe::Failed(e.to_string())
            }
        }
    }
}

/// Ordered, deduplicated view of collected prefixes.
fn sorted_prefixes(found: BTreeSet<String>) -> Vec<String> {
    found.into_iter().collect()
}
