//! Client record with an outstanding credit balance (the "tab").

use super::money::validate_amount;
use super::{limit_length, require_text, RecordId, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const MAX_NAME_CHARS: usize = 150;
const MAX_PHONE_CHARS: usize = 20;
const MAX_OBSERVATION_CHARS: usize = 500;
const MIN_PHONE_DIGITS: usize = 8;

static PHONE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9() -]+$").expect("phone pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: RecordId,
    pub name: String,
    pub phone: Option<String>,
    pub observations: Option<String>,
    /// Amount owed from credit orders. Never negative.
    pub outstanding_balance: Decimal,
    pub is_active: bool,
}

impl Client {
    /// Creates an unsaved, active client with a zero balance.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            phone: Some(phone.into()),
            observations: None,
            outstanding_balance: Decimal::ZERO,
            is_active: true,
        }
    }

    pub fn is_debtor(&self) -> bool {
        self.is_active && self.outstanding_balance > Decimal::ZERO
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.name, "Client name")?;
        limit_length(self.name.trim(), "Client name", MAX_NAME_CHARS)?;

        let phone = self.phone.as_deref().unwrap_or_default().trim();
        require_text(phone, "Phone")?;
        limit_length(phone, "Phone", MAX_PHONE_CHARS)?;
        let digits = phone.chars().filter(char::is_ascii_digit).count();
        if !PHONE_PATTERN.is_match(phone) || digits < MIN_PHONE_DIGITS {
            return Err(ValidationError::InvalidFormat("Phone"));
        }

        if let Some(observations) = self.observations.as_deref() {
            limit_length(observations, "Observations", MAX_OBSERVATION_CHARS)?;
        }
        validate_amount(self.outstanding_balance, "Outstanding balance")
    }
}

#[cfg(test)]
mod tests {
    use super::Client;
    use crate::model::ValidationError;

    #[test]
    fn phone_accepts_common_formats() {
        for phone in ["(11) 98765-4321", "+55 11 98765 4321", "1133334444"] {
            assert!(Client::new("Ana", phone).validate().is_ok(), "{phone}");
        }
    }

    #[test]
    fn phone_rejects_letters_and_short_numbers() {
        let letters = Client::new("Ana", "call me").validate().unwrap_err();
        assert_eq!(letters, ValidationError::InvalidFormat("Phone"));

        let short = Client::new("Ana", "1234").validate().unwrap_err();
        assert_eq!(short, ValidationError::InvalidFormat("Phone"));
    }

    #[test]
    fn missing_phone_is_required() {
        let mut client = Client::new("Ana", "");
        assert_eq!(client.validate(), Err(ValidationError::Required("Phone")));
        client.phone = None;
        assert_eq!(client.validate(), Err(ValidationError::Required("Phone")));
    }

    #[test]
    fn long_name_is_rejected() {
        let client = Client::new("x".repeat(151), "1133334444");
        assert!(matches!(
            client.validate(),
            Err(ValidationError::TooLong { max: 150, .. })
        ));
    }
}
