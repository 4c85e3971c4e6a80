//! Bank account domain module (event-sourced).
//!
//! Business rules for a single account, implemented purely as deterministic domain
//! logic (no IO, no HTTP, no storage). Serialized execution per account is the job of
//! the infrastructure layer.

pub mod account;
pub mod money;
pub mod validation;

pub use account::{
    Account, AccountCommand, AccountCommandError, AccountCreated, AccountEvent, AccountId,
    AccountState, BalanceUpdated, BankAccount, CreateAccount, Rejection, UpdateBalance,
    UpdateOutcome,
};
pub use money::Currency;
pub use validation::{OpenAccount, ValidationErrors, validate_open_account, validate_update_balance};
