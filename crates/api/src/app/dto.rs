use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bankes_accounts::{Account, AccountId, OpenAccount, UpdateBalance, validate_open_account, validate_update_balance};

// -------------------------
// Request DTOs
// -------------------------

/// `POST /bank` body. Absent fields are reported as validation messages, not as a
/// deserialization failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateAccountRequest {
    pub owner: Option<String>,
    pub currency: Option<String>,
    pub initial_balance: Option<Decimal>,
}

/// `PUT /bank/{id}` body. `amount` accepts a JSON number or a decimal string.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateBalanceRequest {
    pub currency: Option<String>,
    pub amount: Option<Decimal>,
}

impl CreateAccountRequest {
    pub fn validate(self) -> Result<OpenAccount, Vec<String>> {
        let owner = self.owner.unwrap_or_default();
        let currency = self.currency.unwrap_or_default();
        match self.initial_balance {
            Some(balance) => validate_open_account(&owner, &currency, balance).map_err(|e| e.into_messages()),
            None => {
                // Still report the other fields; zero passes the balance rule.
                let mut messages = validate_open_account(&owner, &currency, Decimal::ZERO)
                    .err()
                    .map(|e| e.into_messages())
                    .unwrap_or_default();
                messages.push("initialBalance is required".to_string());
                Err(messages)
            }
        }
    }
}

impl UpdateBalanceRequest {
    pub fn validate(self, account_id: AccountId) -> Result<UpdateBalance, Vec<String>> {
        let currency = self.currency.unwrap_or_default();
        match self.amount {
            Some(amount) => {
                validate_update_balance(account_id, &currency, amount, Utc::now()).map_err(|e| e.into_messages())
            }
            None => {
                let mut messages = validate_update_balance(account_id, &currency, Decimal::ONE, Utc::now())
                    .err()
                    .map(|e| e.into_messages())
                    .unwrap_or_default();
                messages.push("amount is required".to_string());
                Err(messages)
            }
        }
    }
}

// -------------------------
// Response DTOs
// -------------------------

/// Account as rendered over HTTP. `balance` serializes as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub owner: String,
    pub currency: String,
    pub balance: Decimal,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id.to_string(),
            owner: account.owner,
            currency: account.currency.as_str().to_string(),
            balance: account.balance,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}
