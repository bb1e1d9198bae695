pub mod api;
pub mod ask;
pub mod backend;
pub mod backup;
pub mod builder;
pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod format;
pub mod guard;
pub mod ingest;
pub mod masking;
pub mod output;
pub mod reports;
pub mod schema;
pub mod secrets;
pub mod snapshot;
pub mod storage;
pub mod validation;
pub mod value;
pub mod verbose;
