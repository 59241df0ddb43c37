// Birthday reminder core: contacts, notification backends, dispatch, scan,
// cron scheduling and process lifecycle

pub mod bootstrap;
pub mod config;
pub mod contacts;
pub mod dispatcher;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod notification;
pub mod os_signals;
pub mod scan;
pub mod schedule;
pub mod scheduler;
pub mod telemetry;
