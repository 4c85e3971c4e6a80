//! The router's own event-sourced record of which accounts exist.
//!
//! Kept in a stream separate from every account stream so that the router can rebuild
//! its id → entity map on startup without reading account data.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bankes_accounts::AccountId;
use bankes_core::{Aggregate, AggregateId, AggregateRoot, DomainError};
use bankes_events::Event;

/// Well-known stream id of the account directory.
pub const DIRECTORY_STREAM_ID: AggregateId = AggregateId::nil();

pub const DIRECTORY_AGGREGATE_TYPE: &str = "bank.directory";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterAccount {
    pub account_id: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryCommand {
    RegisterAccount(RegisterAccount),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRegistered {
    pub account_id: AccountId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectoryEvent {
    AccountRegistered(AccountRegistered),
}

impl Event for DirectoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            DirectoryEvent::AccountRegistered(_) => "bank.directory.account_registered",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            DirectoryEvent::AccountRegistered(e) => e.occurred_at,
        }
    }
}

/// Set of registered account ids plus the directory stream version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountDirectory {
    id: AggregateId,
    accounts: BTreeSet<AccountId>,
    version: u64,
}

impl AccountDirectory {
    pub fn empty() -> Self {
        Self {
            id: DIRECTORY_STREAM_ID,
            accounts: BTreeSet::new(),
            version: 0,
        }
    }

    pub fn contains(&self, account_id: &AccountId) -> bool {
        self.accounts.contains(account_id)
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AccountId> + '_ {
        self.accounts.iter()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl AggregateRoot for AccountDirectory {
    type Id = AggregateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for AccountDirectory {
    type Command = DirectoryCommand;
    type Event = DirectoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            // Set semantics: a repeated registration leaves a single entry.
            DirectoryEvent::AccountRegistered(e) => {
                self.accounts.insert(e.account_id);
            }
        }
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            DirectoryCommand::RegisterAccount(cmd) => {
                if self.contains(&cmd.account_id) {
                    return Err(DomainError::conflict(format!(
                        "account {} already registered",
                        cmd.account_id
                    )));
                }
                Ok(vec![DirectoryEvent::AccountRegistered(AccountRegistered {
                    account_id: cmd.account_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
        }
    }
}
