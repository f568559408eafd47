pub mod merge;
pub mod snapshot;
pub mod sql;
