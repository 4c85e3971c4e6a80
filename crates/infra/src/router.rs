//! Account router: owns the id → entity map and the directory stream.
//!
//! ## Responsibilities
//!
//! - recover the directory before the first command is served
//! - assign ids to new accounts and record them in the directory
//! - spawn one entity per known id and forward commands to it
//!
//! The router never waits for an entity: the caller's reply channel travels with the
//! forwarded command and the entity answers the caller directly. A slow account
//! therefore never delays commands for other accounts.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use bankes_accounts::{Account, AccountId, OpenAccount, UpdateBalance, UpdateOutcome};
use bankes_core::{Aggregate, AggregateRoot, ExpectedVersion};

use crate::bank::Bank;
use crate::directory::{
    AccountDirectory, DIRECTORY_AGGREGATE_TYPE, DIRECTORY_STREAM_ID, DirectoryCommand, DirectoryEvent,
    RegisterAccount,
};
use crate::entity::{AccountEntity, EntityCommand, EntityHandle, Reply};
use crate::error::BankError;
use crate::event_store::{EventStore, EventStoreError, UncommittedEvent, validate_loaded_stream};

/// Requests accepted by the router.
#[derive(Debug)]
pub enum RouterCommand {
    Create {
        open: OpenAccount,
        reply: Reply<AccountId>,
    },
    Update {
        command: UpdateBalance,
        reply: Reply<Option<UpdateOutcome>>,
    },
    Get {
        account_id: AccountId,
        reply: Reply<Option<Account>>,
    },
    /// Number of registered accounts.
    Count { reply: Reply<usize> },
}

pub struct AccountRouter<S: ?Sized> {
    store: Arc<S>,
    directory: AccountDirectory,
    entities: HashMap<AccountId, EntityHandle>,
}

impl<S> AccountRouter<S>
where
    S: EventStore + ?Sized + 'static,
{
    /// Recover the directory, respawn an entity per registered account, and start
    /// serving. Returns the client handle once the router accepts commands.
    ///
    /// Entities recover lazily inside their own tasks; commands sent to them in the
    /// meantime wait in their queues.
    #[instrument(skip_all, err)]
    pub async fn start(store: Arc<S>, ask_timeout: Duration) -> Result<Bank, BankError> {
        let router = Self::recover(store).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(router.run(rx));
        Ok(Bank::new(tx, ask_timeout))
    }

    async fn recover(store: Arc<S>) -> Result<Self, BankError> {
        let history = store.load_stream(DIRECTORY_STREAM_ID).await?;
        validate_loaded_stream(DIRECTORY_STREAM_ID, &history)?;
        let events = history
            .iter()
            .map(|stored| stored.decode::<DirectoryEvent>().map(|env| env.into_payload()))
            .collect::<Result<Vec<_>, EventStoreError>>()?;

        let directory = AccountDirectory::empty().replay(&events);

        let mut entities = HashMap::with_capacity(directory.len());
        for account_id in directory.accounts() {
            // The directory is a set, so each id gets exactly one entity.
            entities
                .entry(*account_id)
                .or_insert_with(|| AccountEntity::spawn(*account_id, store.clone()));
        }

        info!(
            accounts = directory.len(),
            directory_version = directory.version(),
            "account directory recovered"
        );
        Ok(Self {
            store,
            directory,
            entities,
        })
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RouterCommand>) {
        while let Some(command) = rx.recv().await {
            self.dispatch(command).await;
        }
        debug!("router queue closed; stopping");
    }

    async fn dispatch(&mut self, command: RouterCommand) {
        match command {
            RouterCommand::Create { open, reply } => match self.register().await {
                Ok(handle) => {
                    let command = open.into_command(handle.account_id(), Utc::now());
                    handle.send(EntityCommand::Create { command, reply });
                }
                Err(err) => {
                    let _ = reply.send(Err(err));
                }
            },
            RouterCommand::Update { command, reply } => match self.entities.get(&command.account_id) {
                Some(handle) => handle.send(EntityCommand::Update { command, reply }),
                None => {
                    debug!(account_id = %command.account_id, "update for unknown account");
                    let _ = reply.send(Ok(None));
                }
            },
            RouterCommand::Get { account_id, reply } => match self.entities.get(&account_id) {
                Some(handle) => handle.send(EntityCommand::Get { reply }),
                None => {
                    let _ = reply.send(Ok(None));
                }
            },
            RouterCommand::Count { reply } => {
                let _ = reply.send(Ok(self.directory.len()));
            }
        }
    }

    /// Pick a fresh id, persist its registration and spawn its entity.
    ///
    /// Nothing is spawned or remembered unless the directory append succeeded.
    async fn register(&mut self) -> Result<EntityHandle, BankError> {
        let account_id = loop {
            let candidate = AccountId::generate();
            if !self.directory.contains(&candidate) {
                break candidate;
            }
        };

        let command = DirectoryCommand::RegisterAccount(RegisterAccount {
            account_id,
            occurred_at: Utc::now(),
        });
        let decided = self.directory.handle(&command)?;

        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(DIRECTORY_STREAM_ID, DIRECTORY_AGGREGATE_TYPE, Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()?;

        let expected = ExpectedVersion::Exact(self.directory.version());
        if let Err(err) = self.store.append(uncommitted, expected).await {
            error!(account_id = %account_id, error = %err, "directory append failed");
            return Err(err.into());
        }
        for ev in &decided {
            self.directory.apply(ev);
        }

        let handle = AccountEntity::spawn(account_id, self.store.clone());
        self.entities.insert(account_id, handle.clone());
        info!(account_id = %account_id, accounts = self.directory.len(), "account registered");
        Ok(handle)
    }
}
