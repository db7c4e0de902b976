pub mod aggregate;
pub mod annotate;
pub mod compare;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fingerprint;
pub mod matcher;
pub mod metrics_api;
pub mod model;
pub mod prompt;
pub mod providers;
pub mod report;
pub mod storage;
