//! Sales pipeline bookkeeping: registration checks and status changes.
//!
//! Moving a client along the pipeline requires a complete registration
//! (contact and address fields). Nothing here affects the sizing engine.

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::info;

use crate::models::{Client, ProjectStatus};

/// Days after a proposal is sent before the client should be contacted again.
pub const FOLLOW_UP_DAYS: i64 = 45;

/// A registration field that must be filled before the pipeline can advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Name,
    Cpf,
    Phone,
    Email,
    Zip,
    Street,
    Number,
    Neighborhood,
    City,
    State,
}

impl RequiredField {
    /// Fields in the order they are checked.
    pub const ALL: [RequiredField; 10] = [
        Self::Name,
        Self::Cpf,
        Self::Phone,
        Self::Email,
        Self::Zip,
        Self::Street,
        Self::Number,
        Self::Neighborhood,
        Self::City,
        Self::State,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "full name",
            Self::Cpf => "CPF",
            Self::Phone => "phone",
            Self::Email => "e-mail",
            Self::Zip => "ZIP code",
            Self::Street => "street",
            Self::Number => "number",
            Self::Neighborhood => "neighborhood",
            Self::City => "city",
            Self::State => "state",
        }
    }

    fn value<'a>(
        &self,
        client: &'a Client,
    ) -> &'a str {
        match self {
            Self::Name => &client.name,
            Self::Cpf => &client.cpf,
            Self::Phone => &client.phone,
            Self::Email => &client.email,
            Self::Zip => &client.address.zip,
            Self::Street => &client.address.street,
            Self::Number => &client.address.number,
            Self::Neighborhood => &client.address.neighborhood,
            Self::City => &client.address.city,
            Self::State => &client.address.state,
        }
    }
}

impl std::fmt::Display for RequiredField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Errors raised when the registration is not complete.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("the {0} is required")]
    MissingField(RequiredField),
}

/// Checks that every required field is non-blank.
///
/// # Errors
///
/// Returns [`RegistrationError::MissingField`] naming the first blank field.
pub fn validate_registration(client: &Client) -> Result<(), RegistrationError> {
    match RequiredField::ALL
        .into_iter()
        .find(|field| field.value(client).trim().is_empty())
    {
        Some(field) => Err(RegistrationError::MissingField(field)),
        None => Ok(()),
    }
}

/// Returns a copy of `client` moved to `status`, stamped at `now`.
///
/// Any stage may be selected, forwards or backwards.
///
/// # Errors
///
/// Returns [`RegistrationError`] when the registration is incomplete; the
/// client is left as it was.
pub fn change_status(
    client: &Client,
    status: ProjectStatus,
    now: DateTime<Utc>,
) -> Result<Client, RegistrationError> {
    validate_registration(client)?;

    info!(client_id = %client.id, from = %client.status, to = %status, "status changed");

    let mut updated = client.clone();
    updated.status = status;
    updated.status_updated_at = now;
    Ok(updated)
}

/// When a sent proposal should be followed up, or `None` in any other stage.
pub fn follow_up_date(client: &Client) -> Option<DateTime<Utc>> {
    (client.status == ProjectStatus::ProposalSent)
        .then(|| client.status_updated_at + Duration::days(FOLLOW_UP_DAYS))
}

/// Whether the follow-up date of a sent proposal has been reached.
pub fn is_follow_up_due(
    client: &Client,
    now: DateTime<Utc>,
) -> bool {
    follow_up_date(client).is_some_and(|date| now >= date)
}
