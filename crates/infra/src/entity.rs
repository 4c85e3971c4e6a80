//! Account entity: one task per account, the sole writer of that account's stream.
//!
//! ## Execution Model
//!
//! ```text
//! spawn ──► recover (load + fold own stream) ──► loop { next command ─► decide ─► append ─► apply ─► reply }
//! ```
//!
//! Commands queue up in an unbounded FIFO while recovery runs, so nothing observes a
//! partially rebuilt account. Each command runs to completion before the next one is
//! dequeued; this serialization is the only concurrency control on account state.
//!
//! Events are applied to memory only after the append succeeded. A failed append is
//! reported to the caller and leaves the account exactly as it was.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use bankes_accounts::{
    Account, AccountCommand, AccountCommandError, AccountEvent, AccountId, BankAccount, CreateAccount,
    UpdateBalance, UpdateOutcome,
};
use bankes_core::{Aggregate, AggregateRoot, DomainError, ExpectedVersion};
use bankes_events::Event;

use crate::error::BankError;
use crate::event_store::{EventStore, EventStoreError, UncommittedEvent, validate_loaded_stream};

pub const ACCOUNT_AGGREGATE_TYPE: &str = "bank.account";

/// One-shot reply channel handed along with every request.
pub type Reply<T> = oneshot::Sender<Result<T, BankError>>;

/// Messages understood by an account entity.
///
/// Update and Get answer `None` when the account has never been created; the entity
/// knows its id but holds no state to report.
#[derive(Debug)]
pub enum EntityCommand {
    Create {
        command: CreateAccount,
        reply: Reply<AccountId>,
    },
    Update {
        command: UpdateBalance,
        reply: Reply<Option<UpdateOutcome>>,
    },
    Get {
        reply: Reply<Option<Account>>,
    },
}

impl EntityCommand {
    /// Answer the waiting caller with `err` without executing anything.
    pub fn fail(self, err: BankError) {
        // A dropped receiver means the caller already gave up waiting.
        match self {
            EntityCommand::Create { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            EntityCommand::Update { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            EntityCommand::Get { reply } => {
                let _ = reply.send(Err(err));
            }
        }
    }
}

/// Cheap, cloneable address of a running entity.
#[derive(Debug, Clone)]
pub struct EntityHandle {
    account_id: AccountId,
    tx: mpsc::UnboundedSender<EntityCommand>,
}

impl EntityHandle {
    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    /// Enqueue a command. If the entity task is gone the caller is answered with
    /// `Unavailable` right away.
    pub fn send(&self, command: EntityCommand) {
        if let Err(mpsc::error::SendError(command)) = self.tx.send(command) {
            warn!(account_id = %self.account_id, "entity queue closed");
            command.fail(BankError::Unavailable);
        }
    }
}

/// In-task state of one account.
pub struct AccountEntity<S: ?Sized> {
    account: BankAccount,
    store: Arc<S>,
}

impl<S> AccountEntity<S>
where
    S: EventStore + ?Sized + 'static,
{
    /// Start the entity task for `account_id`. Recovery happens inside the task,
    /// before the first queued command is read.
    pub fn spawn(account_id: AccountId, store: Arc<S>) -> EntityHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(account_id, store, rx));
        EntityHandle { account_id, tx }
    }

    /// Rebuild state by folding the persisted stream from empty.
    ///
    /// Pure with respect to the log: nothing is appended and nobody is answered.
    #[instrument(skip_all, fields(account_id = %account_id), err)]
    pub async fn recover(account_id: AccountId, store: Arc<S>) -> Result<Self, EventStoreError> {
        let stream_id = account_id.aggregate_id();
        let history = store.load_stream(stream_id).await?;
        validate_loaded_stream(stream_id, &history)?;

        let mut events = Vec::with_capacity(history.len());
        for stored in &history {
            let envelope = stored.decode::<AccountEvent>()?;
            if envelope.aggregate_type() != ACCOUNT_AGGREGATE_TYPE {
                return Err(EventStoreError::Corrupt(format!(
                    "event #{} of stream {account_id} belongs to '{}'",
                    envelope.sequence_number(),
                    envelope.aggregate_type()
                )));
            }
            events.push(envelope.into_payload());
        }

        let account = BankAccount::empty(account_id).replay(&events);
        if account.id_typed() != account_id {
            return Err(EventStoreError::Corrupt(format!(
                "stream {account_id} holds account {}",
                account.id_typed()
            )));
        }

        if !events.is_empty() {
            info!(version = account.version(), "account recovered");
        }
        Ok(Self { account, store })
    }

    pub fn account(&self) -> &BankAccount {
        &self.account
    }

    pub async fn handle(&mut self, command: EntityCommand) {
        match command {
            EntityCommand::Create { command, reply } => {
                let account_id = command.account_id;
                let result = match self.execute(AccountCommand::CreateAccount(command)).await {
                    Ok(()) => Ok(account_id),
                    Err(ExecuteError::Failed(err)) => Err(err),
                    // Creation has no refusal outcome.
                    Err(ExecuteError::Rejected(rejection)) => {
                        Err(DomainError::invariant(rejection.to_string()).into())
                    }
                };
                let _ = reply.send(result);
            }
            EntityCommand::Update { command, reply } => {
                let _ = reply.send(self.update(command).await);
            }
            EntityCommand::Get { reply } => {
                let _ = reply.send(Ok(self.account.account().cloned()));
            }
        }
    }

    async fn update(&mut self, command: UpdateBalance) -> Result<Option<UpdateOutcome>, BankError> {
        let amount = command.amount;
        match self.execute(AccountCommand::UpdateBalance(command)).await {
            Ok(()) => Ok(self.account.account().cloned().map(UpdateOutcome::Updated)),
            Err(ExecuteError::Rejected(rejection)) => {
                warn!(account_id = %self.account.id_typed(), %amount, reason = %rejection, "update rejected");
                Ok(Some(UpdateOutcome::Rejected(rejection)))
            }
            Err(ExecuteError::Failed(BankError::Domain(DomainError::NotFound))) => Ok(None),
            Err(ExecuteError::Failed(err)) => Err(err),
        }
    }

    /// Decide, persist, then apply. State is touched only after a successful append.
    async fn execute(&mut self, command: AccountCommand) -> Result<(), ExecuteError> {
        let decided = self.account.handle(&command)?;
        if decided.is_empty() {
            return Ok(());
        }

        let stream_id = self.account.id_typed().aggregate_id();
        let uncommitted = decided
            .iter()
            .map(|ev| UncommittedEvent::from_typed(stream_id, ACCOUNT_AGGREGATE_TYPE, Uuid::now_v7(), ev))
            .collect::<Result<Vec<_>, _>>()
            .map_err(BankError::from)?;

        let expected = ExpectedVersion::Exact(self.account.version());
        if let Err(err) = self.store.append(uncommitted, expected).await {
            warn!(account_id = %self.account.id_typed(), error = %err, "append failed; state unchanged");
            return Err(BankError::from(err).into());
        }

        for ev in &decided {
            self.account.apply(ev);
            debug!(
                account_id = %self.account.id_typed(),
                event_type = ev.event_type(),
                version = self.account.version(),
                "event applied"
            );
        }
        Ok(())
    }
}

/// Internal split between a refused update and everything else.
#[derive(Debug)]
enum ExecuteError {
    Rejected(bankes_accounts::Rejection),
    Failed(BankError),
}

impl From<AccountCommandError> for ExecuteError {
    fn from(value: AccountCommandError) -> Self {
        match value {
            AccountCommandError::Rejected(rejection) => ExecuteError::Rejected(rejection),
            AccountCommandError::Domain(err) => ExecuteError::Failed(err.into()),
        }
    }
}

impl From<BankError> for ExecuteError {
    fn from(value: BankError) -> Self {
        ExecuteError::Failed(value)
    }
}

async fn run<S>(account_id: AccountId, store: Arc<S>, mut rx: mpsc::UnboundedReceiver<EntityCommand>)
where
    S: EventStore + ?Sized + 'static,
{
    let mut entity = match AccountEntity::recover(account_id, store).await {
        Ok(entity) => entity,
        Err(err) => {
            // Never serve a partially rebuilt account: every request gets the error.
            warn!(account_id = %account_id, error = %err, "recovery failed; entity refuses all commands");
            while let Some(command) = rx.recv().await {
                command.fail(BankError::Store(err.clone()));
            }
            return;
        }
    };

    while let Some(command) = rx.recv().await {
        entity.handle(command).await;
    }
    debug!(account_id = %account_id, "entity queue closed; stopping");
}
