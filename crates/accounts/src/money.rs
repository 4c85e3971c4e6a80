use serde::{Deserialize, Serialize};

use bankes_core::{DomainError, ValueObject};

/// Currency code attached to an account.
///
/// Codes are compared case-insensitively by normalizing to upper case on parse, so
/// `"usd"` and `"USD"` name the same currency. No conversion between currencies exists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let code = raw.trim();
        if code.is_empty() {
            return Err(DomainError::validation("currency must not be empty"));
        }
        Ok(Self(code.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ValueObject for Currency {}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        assert_eq!(Currency::parse(" usd ").unwrap(), Currency::parse("USD").unwrap());
        assert_eq!(Currency::parse("eur").unwrap().as_str(), "EUR");
    }

    #[test]
    fn blank_currency_is_rejected() {
        assert!(matches!(Currency::parse("   "), Err(DomainError::Validation(_))));
    }
}
