//! Client handle for the account service.
//!
//! `Bank` is what the outside world holds: a cloneable sender into the router queue plus
//! an ask timeout. Each call creates a one-shot reply channel, enqueues the request and
//! waits for the first of (reply, timeout). There is no retry: a timed-out command may
//! still complete later, and repeating a balance change would apply it twice.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::warn;

use bankes_accounts::{Account, AccountId, OpenAccount, UpdateBalance, UpdateOutcome};

use crate::error::BankError;
use crate::router::RouterCommand;

pub const DEFAULT_ASK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct Bank {
    tx: mpsc::UnboundedSender<RouterCommand>,
    ask_timeout: Duration,
}

impl Bank {
    pub(crate) fn new(tx: mpsc::UnboundedSender<RouterCommand>, ask_timeout: Duration) -> Self {
        Self { tx, ask_timeout }
    }

    pub fn ask_timeout(&self) -> Duration {
        self.ask_timeout
    }

    /// Open an account and return the id the router assigned to it.
    pub async fn create_account(&self, open: OpenAccount) -> Result<AccountId, BankError> {
        self.ask(|reply| RouterCommand::Create { open, reply }).await
    }

    /// Apply a balance change. `Ok(None)` means no account exists under the id.
    pub async fn update_balance(&self, command: UpdateBalance) -> Result<Option<UpdateOutcome>, BankError> {
        self.ask(|reply| RouterCommand::Update { command, reply }).await
    }

    /// Current account state, or `Ok(None)` for an unknown id.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Option<Account>, BankError> {
        self.ask(|reply| RouterCommand::Get { account_id, reply }).await
    }

    pub async fn account_count(&self) -> Result<usize, BankError> {
        self.ask(|reply| RouterCommand::Count { reply }).await
    }

    async fn ask<T, F>(&self, build: F) -> Result<T, BankError>
    where
        F: FnOnce(oneshot::Sender<Result<T, BankError>>) -> RouterCommand,
    {
        let (reply, rx) = oneshot::channel();
        if self.tx.send(build(reply)).is_err() {
            warn!("router queue closed");
            return Err(BankError::Unavailable);
        }

        match tokio::time::timeout(self.ask_timeout, rx).await {
            Ok(Ok(result)) => result,
            // Reply sender dropped without an answer: the task that held it is gone.
            Ok(Err(_)) => Err(BankError::Unavailable),
            Err(_) => {
                warn!(timeout_ms = self.ask_timeout.as_millis() as u64, "ask timed out");
                Err(BankError::Timeout(self.ask_timeout))
            }
        }
    }
}
