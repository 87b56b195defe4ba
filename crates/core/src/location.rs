use serde::{Deserialize, Serialize};

/// Glue catalog database names are capped at 64 characters.
const MAX_DATABASE_NAME_LEN: usize = 64;

/// Default table name for provisioned access-log tables.
pub const DEFAULT_TABLE_NAME: &str = "access_logs";

/// Replace characters that are legal in bucket names but not in catalog
/// identifiers. Idempotent: the replacement character is never rewritten.
pub fn sanitize(name: &str) -> String {
    name.replace(['-', '.'], "_")
}

/// The S3 location an external table's LOCATION clause points at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLocation {
    /// Bucket holding the server-access logs.
    pub bucket: String,
    /// Optional key prefix ("folder") under the bucket.
    pub prefix: Option<String>,
}

impl LogLocation {
    pub fn new(bucket: impl Into<String>, prefix: Option<String>) -> Self {
        // Listing APIs hand back prefixes with a trailing slash already;
        // treat an empty selection the same as no selection.
        let prefix = prefix.filter(|p| !p.is_empty());
        Self {
            bucket: bucket.into(),
            prefix,
        }
    }

    /// Render the `s3://` URI with exactly one trailing slash.
    pub fn uri(&self) -> String {
        let mut uri = match &self.prefix {
            Some(prefix) => format!("s3://{}/{}", self.bucket, prefix),
            None => format!("s3://{}/", self.bucket),
        };
        while uri.ends_with("//") {
            uri.pop();
        }
        if !uri.ends_with('/') {
            uri.push('/');
        }
        uri
    }
}

/// Desired database and table names for one provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSpec {
    pub database: String,
    pub table: String,
}

impl TableSpec {
    pub fn new(database: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            table: table.into(),
        }
    }

    /// Derive default names from a bucket: `s3_logs_{bucket}` with `-` and
    /// `.` rewritten to `_`, truncated to the catalog's 64-character limit,
    /// and the table named `access_logs`.
    pub fn for_bucket(bucket: &str) -> Self {
        Self {
            database: database_name_for(bucket),
            table: DEFAULT_TABLE_NAME.to_string(),
        }
    }

    /// Fully-qualified `database.table` name.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.database, self.table)
    }
}

/// Default database name for a bucket. Bucket names are ASCII by the
/// provider's naming rules, so byte truncation is safe.
pub fn database_name_for(bucket: &str) -> String {
    let mut name = format!("s3_logs_{}", sanitize(bucket));
    if name.len() > MAX_DATABASE_NAME_LEN {
        name.truncate(MAX_DATABASE_NAME_LEN);
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_dashes_and_dots() {
        assert_eq!(sanitize("my-app.logs"), "my_app_logs");
        assert_eq!(sanitize("plain"), "plain");
        assert_eq!(sanitize("a-b-c.d.e"), "a_b_c_d_e");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = sanitize("my-app.logs");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn database_name_is_truncated_to_catalog_limit() {
        let bucket = "b".repeat(100);
        let name = database_name_for(&bucket);
        assert_eq!(name.len(), 64);
        assert!(name.starts_with("s3_logs_b"));
    }

    #[test]
    fn database_name_under_limit_is_untouched() {
        assert_eq!(database_name_for("my-app.logs"), "s3_logs_my_app_logs");
    }

    #[test]
    fn for_bucket_defaults() {
        let spec = TableSpec::for_bucket("my-app.logs");
        assert_eq!(spec.database, "s3_logs_my_app_logs");
        assert_eq!(spec.table, "access_logs");
        assert_eq!(spec.qualified(), "s3_logs_my_app_logs.access_logs");
    }

    #[test]
    fn uri_without_prefix() {
        let loc = LogLocation::new("my-app.logs", None);
        assert_eq!(loc.uri(), "s3://my-app.logs/");
    }

    #[test]
    fn uri_with_prefix_keeps_single_trailing_slash() {
        let loc = LogLocation::new("logs", Some("2024/".to_string()));
        assert_eq!(loc.uri(), "s3://logs/2024/");

        // Prefix without a trailing slash gets one.
        let loc = LogLocation::new("logs", Some("2024".to_string()));
        assert_eq!(loc.uri(), "s3://logs/2024/");
    }

    #[test]
    fn empty_prefix_treated_as_none() {
        let loc = LogLocation::new("logs", Some(String::new()));
        assert!(loc.prefix.is_none());
        assert_eq!(loc.uri(), "s3://logs/");
    }
}
