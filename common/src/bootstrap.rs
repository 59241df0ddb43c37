// Bootstrap utilities for binary initialization
// Turns validated settings into a ready-to-start scheduler

use crate::config::Settings;
use crate::contacts::load_contacts;
use crate::dispatcher::Dispatcher;
use crate::models::Contact;
use crate::notification::build_backends;
use crate::scan::ScanEngine;
use crate::scheduler::BirthdayScheduler;
use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

/// Build the dispatcher from the notification settings
///
/// # Errors
/// Returns error if a backend cannot be constructed
pub fn init_dispatcher(settings: &Settings) -> Result<Dispatcher> {
    let backends =
        build_backends(&settings.notifications).context("Failed to build notification backends")?;

    for backend in &backends {
        info!(
            backend_kind = backend.kind(),
            backend_vendor = backend.vendor(),
            "Notification backend registered"
        );
    }

    let dispatcher = Dispatcher::new(backends);
    Ok(match settings.notifications.timeout_seconds {
        Some(seconds) => dispatcher.with_timeout(Duration::from_secs(seconds)),
        None => dispatcher,
    })
}

/// Build the scheduler around an already loaded contact list
///
/// # Errors
/// Returns error if the settings are invalid or a backend cannot be built
pub fn init_scheduler_with_contacts(
    settings: &Settings,
    contacts: Vec<Contact>,
) -> Result<BirthdayScheduler> {
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    let engine_config = settings
        .engine_config()
        .map_err(|e| anyhow::anyhow!("Invalid scheduler configuration: {}", e))?;

    let dispatcher = init_dispatcher(settings)?;
    let scanner = ScanEngine::new(contacts, dispatcher, settings.scheduler.handle_leap_years);

    info!(
        contact_count = scanner.contact_count(),
        backend_count = scanner.backend_count(),
        handle_leap_years = settings.scheduler.handle_leap_years,
        "Scan engine initialized"
    );

    Ok(BirthdayScheduler::new(engine_config, scanner))
}

/// Load contacts from the configured file and build the scheduler
///
/// # Errors
/// Returns error if contacts cannot be loaded or the settings are invalid
#[tracing::instrument(skip(settings))]
pub fn init_scheduler(settings: &Settings) -> Result<BirthdayScheduler> {
    let contacts = load_contacts(&settings.contacts.path).with_context(|| {
        format!(
            "Failed to load contacts from {}",
            settings.contacts.path.display()
        )
    })?;

    init_scheduler_with_contacts(settings, contacts)
}
