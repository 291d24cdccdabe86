//! Customer and address types.

use serde::{Deserialize, Serialize};

use crate::error::CommerceError;

const DEFAULT_COUNTRY: &str = "CH";

const FIRST_NAMES: [&str; 10] = [
    "Hans", "Peter", "Thomas", "Michael", "Andreas", "Maria", "Anna", "Ursula", "Sandra", "Monika",
];

const LAST_NAMES: [&str; 10] = [
    "Müller", "Schmid", "Schneider", "Fischer", "Weber", "Meyer", "Huber", "Wagner", "Becker",
    "Hoffmann",
];

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

/// A postal address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(default)]
    pub street: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zip: String,
    /// ISO country code.
    #[serde(default = "default_country")]
    pub country: String,
}

impl Address {
    pub fn new(street: impl Into<String>, city: impl Into<String>, zip: impl Into<String>) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            zip: zip.into(),
            country: default_country(),
        }
    }

    /// Format as single line.
    pub fn one_line(&self) -> String {
        let parts = [
            self.street.as_str(),
            &format!("{} {}", self.zip, self.city),
            self.country.as_str(),
        ];
        parts
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Check if address is complete.
    pub fn is_complete(&self) -> bool {
        !self.street.is_empty()
            && !self.city.is_empty()
            && !self.zip.is_empty()
            && !self.country.is_empty()
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::new("", "", "")
    }
}

/// Contact data captured at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: Address,
}

impl Customer {
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            ..Self::default()
        }
    }

    /// A deterministic dummy customer living in Zürich.
    ///
    /// First and last names cycle independently through fixed lists, so
    /// consecutive indices give different people.
    pub fn sample(index: usize) -> Self {
        let first_name = FIRST_NAMES[index % FIRST_NAMES.len()];
        let last_name = LAST_NAMES[index % LAST_NAMES.len()];
        let email = format!(
            "{}.{}@example.com",
            email_local_part(first_name),
            email_local_part(last_name)
        );

        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email,
            phone: "+41 79 123 45 67".to_string(),
            address: Address::new("Bahnhofstrasse 1", "Zürich", "8001"),
        }
    }

    /// Get full name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Check the fields an order cannot go out without.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.first_name.trim().is_empty() {
            return Err(CommerceError::Validation("first name is required".into()));
        }
        if self.last_name.trim().is_empty() {
            return Err(CommerceError::Validation("last name is required".into()));
        }
        if !self.email.contains('@') {
            return Err(CommerceError::Validation(format!(
                "invalid email address: {:?}",
                self.email
            )));
        }
        Ok(())
    }
}

fn email_local_part(name: &str) -> String {
    name.to_lowercase()
        .replace('ä', "ae")
        .replace('ö', "oe")
        .replace('ü', "ue")
}
