pub mod lister;

pub use lister::{LogStore, ObjectProbe, DEFAULT_SAMPLE_LIMIT};
