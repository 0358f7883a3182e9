use serde::Deserialize;
use validator::Validate;

use crate::domain::record::Record;
use crate::domain::types::RecordId;

#[derive(Clone, Debug, Default, Deserialize, Validate)]
/// Form data for creating or editing a customer record.
pub struct RecordForm {
    /// Identifier of the record being edited, empty for new records.
    #[serde(default)]
    pub id: Option<RecordId>,
    /// Display name.
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Postal address.
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
    /// Contact email.
    #[validate(email(message = "Email should be valid: prefix@domain.com"))]
    pub email: String,
    /// Contact phone number.
    #[validate(length(min = 1, message = "Telephone is required"))]
    pub telephone: String,
}

impl RecordForm {
    /// Builds a form with trimmed values so blank input fails validation.
    pub fn new(
        id: Option<RecordId>,
        name: &str,
        address: &str,
        email: &str,
        telephone: &str,
    ) -> Self {
        Self {
            id,
            name: name.trim().to_string(),
            address: address.trim().to_string(),
            email: email.trim().to_string(),
            telephone: telephone.trim().to_string(),
        }
    }
}

impl From<&Record> for RecordForm {
    fn from(record: &Record) -> Self {
        RecordForm::new(
            record.id,
            &record.name,
            &record.address,
            &record.email,
            &record.telephone,
        )
    }
}

impl From<RecordForm> for Record {
    /// Convert the [`RecordForm`] into a [`Record`] ready to be saved.
    fn from(form: RecordForm) -> Self {
        let record = Record::new(form.name, form.address, form.email, form.telephone);
        match form.id {
            Some(id) => record.with_id(id),
            None => record,
        }
    }
}

/// Flattens validation errors into a single human readable line.
pub fn describe_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field}: {}", err.code),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}
