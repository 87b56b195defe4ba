//! Statement rendering for the access-log external table.
//!
//! The row format is a RegexSerDe pattern matched against raw log lines.
//! Every token except the bracketed timestamp and the two quoted fields is
//! whitespace-delimited, and the trailing non-capturing group is optional so
//! that log lines written before the newest fields existed still parse.
//! The pattern and column list are a compatibility contract with tables
//! already created by earlier runs; do not reorder or retype them.

/// Fixed schema of the external table, in declaration order. The two
/// byte-count columns are BIGINT, everything else is STRING.
pub const COLUMNS: [(&str, &str); 26] = [
    ("bucketowner", "STRING"),
    ("bucket_name", "STRING"),
    ("requestdatetime", "STRING"),
    ("remoteip", "STRING"),
    ("requester", "STRING"),
    ("requestid", "STRING"),
    ("operation", "STRING"),
    ("key", "STRING"),
    ("request_uri", "STRING"),
    ("httpstatus", "STRING"),
    ("errorcode", "STRING"),
    ("bytessent", "BIGINT"),
    ("objectsize", "BIGINT"),
    ("totaltime", "STRING"),
    ("turnaroundtime", "STRING"),
    ("referrer", "STRING"),
    ("useragent", "STRING"),
    ("versionid", "STRING"),
    ("hostid", "STRING"),
    ("sigv", "STRING"),
    ("ciphersuite", "STRING"),
    ("authtype", "STRING"),
    ("endpoint", "STRING"),
    ("tlsversion", "STRING"),
    ("accesspointarn", "STRING"),
    ("aclrequired", "STRING"),
];

/// The SerDe's `input.regex` property, exactly as it must appear in the
/// statement (Hive unescapes `\\` to `\` when reading the property). The
/// trailing `(?: ...)?` group absorbs the eight fields added to the log
/// format over the years; lines without them still match.
pub const INPUT_REGEX: &str = r#"([^ ]*) ([^ ]*) \\[(.*?)\\] ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ("[^"]*"|-) (-|[0-9]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ("[^"]*"|-) ([^ ]*)(?: ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*) ([^ ]*))?.*$$"#;

const ROW_FORMAT_SERDE: &str = "org.apache.hadoop.hive.serde2.RegexSerDe";
const INPUT_FORMAT: &str = "org.apache.hadoop.mapred.TextInputFormat";
const OUTPUT_FORMAT: &str = "org.apache.hadoop.hive.ql.io.HiveIgnoreKeyTextOutputFormat";

/// Idempotent database creation.
pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {database}")
}

/// Idempotent external-table creation over `location` (used verbatim).
pub fn create_table(database: &str, table: &str, location: &str) -> String {
    let columns = COLUMNS
        .iter()
        .map(|(name, ty)| format!("  `{name}` {ty}"))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "CREATE EXTERNAL TABLE IF NOT EXISTS `{database}.{table}`(\n\
         {columns})\n\
         ROW FORMAT SERDE\n\
         \x20 '{ROW_FORMAT_SERDE}'\n\
         WITH SERDEPROPERTIES (\n\
         \x20 'input.regex'='{INPUT_REGEX}')\n\
         STORED AS INPUTFORMAT\n\
         \x20 '{INPUT_FORMAT}'\n\
         OUTPUTFORMAT\n\
         \x20 '{OUTPUT_FORMAT}'\n\
         LOCATION\n\
         \x20 '{location}'"
    )
}

/// Row-count verification query.
pub fn count_rows(database: &str, table: &str) -> String {
    format!("SELECT COUNT(*) as row_count FROM {database}.{table}")
}

/// Starter queries printed after a successful setup.
pub fn sample_queries(database: &str, table: &str) -> String {
    format!(
        "-- Check if data exists\n\
         SELECT COUNT(*) FROM {database}.{table};\n\
         \n\
         -- View first 10 logs\n\
         SELECT * FROM {database}.{table} LIMIT 10;\n\
         \n\
         -- Count by HTTP status\n\
         SELECT httpstatus, COUNT(*) as count\n\
         FROM {database}.{table}\n\
         WHERE httpstatus IS NOT NULL\n\
         GROUP BY httpstatus\n\
         ORDER BY count DESC;\n\
         \n\
         -- Find 404 errors\n\
         SELECT requestdatetime, key, remoteip, httpstatus\n\
         FROM {database}.{table}\n\
         WHERE httpstatus = '404';\n\
         \n\
         -- Top requested files\n\
         SELECT key, COUNT(*) as requests\n\
         FROM {database}.{table}\n\
         WHERE key IS NOT NULL\n\
         GROUP BY key\n\
         ORDER BY requests DESC\n\
         LIMIT 20;"
    )
}
