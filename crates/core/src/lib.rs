pub mod ddl;
pub mod location;
pub mod status;

pub use ddl::{create_database, create_table, count_rows, sample_queries};
pub use location::{sanitize, LogLocation, TableSpec};
pub use status::ExecutionStatus;
