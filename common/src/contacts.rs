// Contact loading from CSV files
//
// Expected header: first_name,last_name,birthdate with birthdates formatted
// as YYYY-MM-DD. Unknown extra columns are ignored. Row order is preserved.

use crate::errors::ContactError;
use crate::models::Contact;
use csv::{ReaderBuilder, Trim};
use std::io::Read;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Load all contacts from a CSV file
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_contacts<P: AsRef<Path>>(path: P) -> Result<Vec<Contact>, ContactError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| ContactError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let contacts = parse_contacts(file).map_err(|e| match e {
        ContactError::Io { reason, .. } => ContactError::Io {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })?;

    if contacts.is_empty() {
        warn!("Contact file contains no contacts");
    } else {
        info!(contact_count = contacts.len(), "Contacts loaded");
    }

    Ok(contacts)
}

/// Parse contacts from any CSV source
pub fn parse_contacts<R: Read>(source: R) -> Result<Vec<Contact>, ContactError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);

    let mut contacts = Vec::new();
    for record in reader.deserialize::<Contact>() {
        contacts.push(record?);
    }
    Ok(contacts)
}
