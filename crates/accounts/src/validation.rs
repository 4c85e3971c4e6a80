//! Request pre-checks.
//!
//! Validation runs before a command exists. Every rule is evaluated and all failures
//! are reported together, so a caller fixing a request sees the full list at once.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::{AccountId, CreateAccount, UpdateBalance};
use crate::money::Currency;

/// Ordered list of human-readable field errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.join("; "))]
pub struct ValidationErrors(Vec<String>);

impl ValidationErrors {
    pub fn messages(&self) -> &[String] {
        &self.0
    }

    pub fn into_messages(self) -> Vec<String> {
        self.0
    }
}

/// A validated request to open an account. The router assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAccount {
    pub owner: String,
    pub currency: Currency,
    pub initial_balance: Decimal,
}

impl OpenAccount {
    pub fn into_command(self, account_id: AccountId, occurred_at: DateTime<Utc>) -> CreateAccount {
        CreateAccount {
            account_id,
            owner: self.owner,
            currency: self.currency,
            initial_balance: self.initial_balance,
            occurred_at,
        }
    }
}

/// Smallest accepted magnitude for a balance change.
fn minimum_amount() -> Decimal {
    Decimal::new(1, 2)
}

pub fn validate_open_account(
    owner: &str,
    currency: &str,
    initial_balance: Decimal,
) -> Result<OpenAccount, ValidationErrors> {
    let mut errors = Vec::new();

    let owner = owner.trim();
    if owner.is_empty() {
        errors.push("owner must not be empty".to_string());
    }

    let currency = Currency::parse(currency);
    if currency.is_err() {
        errors.push("currency must not be empty".to_string());
    }

    if initial_balance < Decimal::ZERO {
        errors.push("initialBalance must be at least 0".to_string());
    }

    match currency {
        Ok(currency) if errors.is_empty() => Ok(OpenAccount {
            owner: owner.to_string(),
            currency,
            initial_balance,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

pub fn validate_update_balance(
    account_id: AccountId,
    currency: &str,
    amount: Decimal,
    occurred_at: DateTime<Utc>,
) -> Result<UpdateBalance, ValidationErrors> {
    let mut errors = Vec::new();

    let currency = Currency::parse(currency);
    if currency.is_err() {
        errors.push("currency must not be empty".to_string());
    }

    if amount.abs() < minimum_amount() {
        errors.push("amount magnitude must be at least 0.01".to_string());
    }

    match currency {
        Ok(currency) if errors.is_empty() => Ok(UpdateBalance {
            account_id,
            currency,
            amount,
            occurred_at,
        }),
        _ => Err(ValidationErrors(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_open_request_passes_and_trims_owner() {
        let open = validate_open_account("  Alice ", "usd", Decimal::from(100)).unwrap();
        assert_eq!(open.owner, "Alice");
        assert_eq!(open.currency.as_str(), "USD");
        assert_eq!(open.initial_balance, Decimal::from(100));
    }

    #[test]
    fn zero_initial_balance_is_allowed() {
        assert!(validate_open_account("Bob", "EUR", Decimal::ZERO).is_ok());
    }

    #[test]
    fn open_request_reports_every_failure() {
        let errors = validate_open_account("", " ", Decimal::from(-1)).unwrap_err();
        assert_eq!(
            errors.messages(),
            [
                "owner must not be empty",
                "currency must not be empty",
                "initialBalance must be at least 0",
            ]
        );
    }

    #[test]
    fn tiny_amounts_are_rejected_in_both_directions() {
        let id = AccountId::generate();
        for raw in [Decimal::ZERO, Decimal::new(9, 3), Decimal::new(-9, 3)] {
            let errors = validate_update_balance(id, "USD", raw, Utc::now()).unwrap_err();
            assert_eq!(errors.messages(), ["amount magnitude must be at least 0.01"]);
        }
    }

    #[test]
    fn withdrawals_of_a_cent_or_more_pass() {
        let id = AccountId::generate();
        let cmd = validate_update_balance(id, "usd", Decimal::new(-1, 2), Utc::now()).unwrap();
        assert_eq!(cmd.account_id, id);
        assert_eq!(cmd.amount, Decimal::new(-1, 2));
    }

    #[test]
    fn update_request_reports_every_failure() {
        let errors =
            validate_update_balance(AccountId::generate(), "", Decimal::ZERO, Utc::now()).unwrap_err();
        assert_eq!(errors.messages().len(), 2);
        assert_eq!(errors.to_string(), "currency must not be empty; amount magnitude must be at least 0.01");
    }
}
