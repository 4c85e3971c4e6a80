use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bankes_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Entity};
use bankes_events::{Command, Event};

use crate::money::Currency;

/// Account identifier; also the id of the account's event stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub AggregateId);

impl AccountId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    /// Allocate a fresh, random account id.
    pub fn generate() -> Self {
        Self(AggregateId::new())
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.0
    }
}

impl core::fmt::Display for AccountId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl core::str::FromStr for AccountId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<AggregateId>().map(Self)
    }
}

/// Account snapshot as observed by a completed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub owner: String,
    pub currency: Currency,
    pub balance: Decimal,
}

impl Entity for Account {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Lifecycle of an account aggregate.
///
/// `Uninitialized` until the first `AccountCreated` is applied (live or replayed),
/// `Active` from then on. There is no terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountState {
    Uninitialized,
    Active(Account),
}

/// Aggregate root: BankAccount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankAccount {
    id: AccountId,
    state: AccountState,
    version: u64,
}

impl BankAccount {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: AccountId) -> Self {
        Self {
            id,
            state: AccountState::Uninitialized,
            version: 0,
        }
    }

    pub fn id_typed(&self) -> AccountId {
        self.id
    }

    pub fn state(&self) -> &AccountState {
        &self.state
    }

    /// Current snapshot, `None` while uninitialized.
    pub fn account(&self) -> Option<&Account> {
        match &self.state {
            AccountState::Active(account) => Some(account),
            AccountState::Uninitialized => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, AccountState::Active(_))
    }
}

impl AggregateRoot for BankAccount {
    type Id = AccountId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateAccount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccount {
    pub account_id: AccountId,
    pub owner: String,
    pub currency: Currency,
    pub initial_balance: Decimal,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateBalance. Negative amounts withdraw, positive amounts deposit.
///
/// `currency` must equal the account's currency; otherwise the update is rejected with
/// `Rejection::CurrencyMismatch` and nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateBalance {
    pub account_id: AccountId,
    pub currency: Currency,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountCommand {
    CreateAccount(CreateAccount),
    UpdateBalance(UpdateBalance),
}

impl Command for AccountCommand {
    fn target_aggregate_id(&self) -> AggregateId {
        match self {
            AccountCommand::CreateAccount(cmd) => cmd.account_id.aggregate_id(),
            AccountCommand::UpdateBalance(cmd) => cmd.account_id.aggregate_id(),
        }
    }
}

/// Event: AccountCreated. The only event that initializes state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub account: Account,
    pub occurred_at: DateTime<Utc>,
}

/// Event: BalanceUpdated. Carries the signed delta, never the resulting balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdated {
    pub account_id: AccountId,
    pub amount: Decimal,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountEvent {
    AccountCreated(AccountCreated),
    BalanceUpdated(BalanceUpdated),
}

impl Event for AccountEvent {
    fn event_type(&self) -> &'static str {
        match self {
            AccountEvent::AccountCreated(_) => "bank.account.created",
            AccountEvent::BalanceUpdated(_) => "bank.account.balance_updated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AccountEvent::AccountCreated(e) => e.occurred_at,
            AccountEvent::BalanceUpdated(e) => e.occurred_at,
        }
    }
}

/// Why an update was refused. A rejection is an answer, not a failure: the account
/// exists and is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum Rejection {
    #[error("insufficient funds: balance {balance}, requested change {requested}")]
    InsufficientFunds { balance: Decimal, requested: Decimal },

    #[error("currency mismatch: account holds {expected}, update is in {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },
}

/// Reply to an accepted-or-refused update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The update was persisted; carries the post-update snapshot.
    Updated(Account),
    /// The update was refused and nothing was persisted.
    Rejected(Rejection),
}

/// Error type of `BankAccount::handle`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountCommandError {
    #[error("update rejected: {0}")]
    Rejected(Rejection),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl Aggregate for BankAccount {
    type Command = AccountCommand;
    type Event = AccountEvent;
    type Error = AccountCommandError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AccountEvent::AccountCreated(e) => {
                self.id = e.account.id;
                self.state = AccountState::Active(e.account.clone());
            }
            AccountEvent::BalanceUpdated(e) => {
                // A delta ahead of creation cannot come from this aggregate; it is dropped
                // rather than inventing an account.
                if let AccountState::Active(account) = &mut self.state {
                    account.balance += e.amount;
                }
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AccountCommand::CreateAccount(cmd) => self.handle_create(cmd),
            AccountCommand::UpdateBalance(cmd) => self.handle_update(cmd),
        }
    }
}

impl BankAccount {
    fn ensure_account_id(&self, account_id: AccountId) -> Result<(), DomainError> {
        if self.id != account_id {
            return Err(DomainError::invariant("account_id mismatch"));
        }
        Ok(())
    }

    fn handle_create(&self, cmd: &CreateAccount) -> Result<Vec<AccountEvent>, AccountCommandError> {
        if self.is_active() {
            return Err(DomainError::conflict("account already exists").into());
        }
        self.ensure_account_id(cmd.account_id)?;

        if cmd.owner.trim().is_empty() {
            return Err(DomainError::validation("owner must not be empty").into());
        }
        if cmd.initial_balance < Decimal::ZERO {
            return Err(DomainError::validation("initial balance cannot be negative").into());
        }

        Ok(vec![AccountEvent::AccountCreated(AccountCreated {
            account: Account {
                id: cmd.account_id,
                owner: cmd.owner.clone(),
                currency: cmd.currency.clone(),
                balance: cmd.initial_balance,
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateBalance) -> Result<Vec<AccountEvent>, AccountCommandError> {
        let Some(account) = self.account() else {
            return Err(DomainError::not_found().into());
        };
        self.ensure_account_id(cmd.account_id)?;

        if cmd.amount.is_zero() {
            return Err(DomainError::validation("amount cannot be zero").into());
        }

        if cmd.currency != account.currency {
            return Err(AccountCommandError::Rejected(Rejection::CurrencyMismatch {
                expected: account.currency.clone(),
                found: cmd.currency.clone(),
            }));
        }

        let new_balance = account
            .balance
            .checked_add(cmd.amount)
            .ok_or_else(|| DomainError::invariant("balance overflow"))?;
        if new_balance < Decimal::ZERO {
            return Err(AccountCommandError::Rejected(Rejection::InsufficientFunds {
                balance: account.balance,
                requested: cmd.amount,
            }));
        }

        Ok(vec![AccountEvent::BalanceUpdated(BalanceUpdated {
            account_id: cmd.account_id,
            amount: cmd.amount,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_account_id() -> AccountId {
        AccountId::generate()
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn usd() -> Currency {
        Currency::parse("USD").unwrap()
    }

    fn create_cmd(account_id: AccountId, initial_balance: Decimal) -> AccountCommand {
        AccountCommand::CreateAccount(CreateAccount {
            account_id,
            owner: "Alice".to_string(),
            currency: usd(),
            initial_balance,
            occurred_at: test_time(),
        })
    }

    fn update_cmd(account_id: AccountId, amount: Decimal) -> AccountCommand {
        AccountCommand::UpdateBalance(UpdateBalance {
            account_id,
            currency: usd(),
            amount,
            occurred_at: test_time(),
        })
    }

    /// Decide + apply, the way the entity does after a successful append.
    fn run(account: &mut BankAccount, cmd: &AccountCommand) -> Result<Vec<AccountEvent>, AccountCommandError> {
        let events = account.handle(cmd)?;
        for e in &events {
            account.apply(e);
        }
        Ok(events)
    }

    fn created(id: AccountId, balance: i64) -> BankAccount {
        let mut account = BankAccount::empty(id);
        run(&mut account, &create_cmd(id, Decimal::from(balance))).unwrap();
        account
    }

    #[test]
    fn create_emits_snapshot_and_activates() {
        let id = test_account_id();
        let mut account = BankAccount::empty(id);
        let events = run(&mut account, &create_cmd(id, Decimal::from(100))).unwrap();

        assert_eq!(events.len(), 1);
        match &events[0] {
            AccountEvent::AccountCreated(e) => {
                assert_eq!(e.account.id, id);
                assert_eq!(e.account.owner, "Alice");
                assert_eq!(e.account.balance, Decimal::from(100));
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(account.is_active());
        assert_eq!(account.version(), 1);
    }

    #[test]
    fn second_create_conflicts() {
        let id = test_account_id();
        let account = created(id, 10);
        let err = account.handle(&create_cmd(id, Decimal::ZERO)).unwrap_err();
        assert!(matches!(err, AccountCommandError::Domain(DomainError::Conflict(_))));
    }

    #[test]
    fn update_before_create_is_not_found() {
        let id = test_account_id();
        let account = BankAccount::empty(id);
        let err = account.handle(&update_cmd(id, Decimal::ONE)).unwrap_err();
        assert_eq!(err, AccountCommandError::Domain(DomainError::NotFound));
    }

    #[test]
    fn withdrawal_below_zero_is_rejected_without_events() {
        let id = test_account_id();
        let mut account = created(id, 70);
        let before = account.clone();

        let err = run(&mut account, &update_cmd(id, Decimal::from(-80))).unwrap_err();
        assert_eq!(
            err,
            AccountCommandError::Rejected(Rejection::InsufficientFunds {
                balance: Decimal::from(70),
                requested: Decimal::from(-80),
            })
        );
        assert_eq!(account, before);
    }

    #[test]
    fn withdrawal_to_exactly_zero_is_accepted() {
        let id = test_account_id();
        let mut account = created(id, 70);
        run(&mut account, &update_cmd(id, Decimal::from(-70))).unwrap();
        assert_eq!(account.account().unwrap().balance, Decimal::ZERO);
    }

    #[test]
    fn currency_mismatch_is_rejected() {
        let id = test_account_id();
        let account = created(id, 70);
        let cmd = AccountCommand::UpdateBalance(UpdateBalance {
            account_id: id,
            currency: Currency::parse("EUR").unwrap(),
            amount: Decimal::ONE,
            occurred_at: test_time(),
        });
        let err = account.handle(&cmd).unwrap_err();
        assert!(matches!(
            err,
            AccountCommandError::Rejected(Rejection::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn update_for_another_account_violates_invariant() {
        let account = created(test_account_id(), 70);
        let err = account.handle(&update_cmd(test_account_id(), Decimal::ONE)).unwrap_err();
        assert!(matches!(err, AccountCommandError::Domain(DomainError::InvariantViolation(_))));
    }

    #[test]
    fn replay_of_empty_stream_stays_uninitialized() {
        let id = test_account_id();
        let replayed = BankAccount::empty(id).replay(&Vec::<AccountEvent>::new());
        assert_eq!(replayed.state(), &AccountState::Uninitialized);
        assert_eq!(replayed.version(), 0);
    }

    #[test]
    fn decimal_amounts_survive_json_exactly() {
        let event = AccountEvent::BalanceUpdated(BalanceUpdated {
            account_id: test_account_id(),
            amount: Decimal::new(-1234567, 2),
            occurred_at: test_time(),
        });
        let json = serde_json::to_value(&event).unwrap();
        let back: AccountEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: whatever mix of deposits and withdrawals is attempted, every
        /// observed balance is non-negative and a refused update changes nothing.
        #[test]
        fn balance_never_goes_negative(
            initial in 0i64..10_000i64,
            cents in prop::collection::vec(-50_000i64..50_000i64, 0..40)
        ) {
            let id = test_account_id();
            let mut account = created(id, initial);

            for c in cents.into_iter().filter(|c| *c != 0) {
                let amount = Decimal::new(c, 2);
                let before = account.clone();
                let expected = before.account().unwrap().balance + amount;

                match run(&mut account, &update_cmd(id, amount)) {
                    Ok(_) => prop_assert_eq!(account.account().unwrap().balance, expected),
                    Err(AccountCommandError::Rejected(Rejection::InsufficientFunds { .. })) => {
                        prop_assert!(expected < Decimal::ZERO);
                        prop_assert_eq!(&account, &before);
                    }
                    Err(other) => prop_assert!(false, "unexpected error {:?}", other),
                }
                prop_assert!(account.account().unwrap().balance >= Decimal::ZERO);
            }
        }

        /// Property: folding the recorded events from scratch reproduces exactly the
        /// state reached incrementally.
        #[test]
        fn replay_matches_live_state(
            initial in 0i64..10_000i64,
            cents in prop::collection::vec(-50_000i64..50_000i64, 0..40)
        ) {
            let id = test_account_id();
            let mut live = BankAccount::empty(id);
            let mut history = run(&mut live, &create_cmd(id, Decimal::from(initial))).unwrap();

            for c in cents.into_iter().filter(|c| *c != 0) {
                if let Ok(events) = run(&mut live, &update_cmd(id, Decimal::new(c, 2))) {
                    history.extend(events);
                }
            }

            let replayed = BankAccount::empty(id).replay(&history);
            prop_assert_eq!(replayed, live);
        }
    }
}
