pub mod cli;
pub mod database;
pub mod database_factory;
pub mod date_provider;
pub mod error;
pub mod metrics;
pub mod quiz_attempt;
pub mod report;
pub mod row_factories;
pub mod store;
pub mod study_session;
pub mod study_time;
pub mod time_format;
