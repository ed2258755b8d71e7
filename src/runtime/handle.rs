use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::debug;

use crate::{
    core::store::VisitRecordStore,
    lifecycle::{SearchOutcome, VisitError, VisitLifecycleManager, VisitReceipt, VisitStats},
    types::VisitId,
    visit::{VisitDraft, VisitRecord},
};

use super::events::VisitEvent;

/// Failure of a call through [`KioskHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The operation itself was rejected.
    #[error(transparent)]
    Visit(#[from] VisitError),
    /// The runtime task is gone.
    #[error("kiosk runtime has stopped")]
    ChannelClosed,
}

/// Queue sizes and feature toggles for the runtime task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Commands that may wait before senders block.
    pub command_queue_bound: usize,
    /// Events buffered per subscriber before it lags.
    pub event_capacity: usize,
    /// Notify hosts on check-in when a directory is configured.
    pub notify_hosts: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 64,
            event_capacity: 256,
            notify_hosts: true,
        }
    }
}

/// Cloneable entry point to a running kiosk.
pub struct KioskHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<VisitEvent>,
}

impl Clone for KioskHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    CheckIn {
        draft: VisitDraft,
        resp: oneshot::Sender<Result<VisitReceipt, RuntimeError>>,
    },
    Search {
        term: String,
        resp: oneshot::Sender<Result<SearchOutcome, RuntimeError>>,
    },
    CheckOut {
        id: VisitId,
        resp: oneshot::Sender<Result<VisitReceipt, RuntimeError>>,
    },
    Get {
        id: VisitId,
        resp: oneshot::Sender<Option<VisitRecord>>,
    },
    Active {
        resp: oneshot::Sender<Vec<VisitRecord>>,
    },
    All {
        resp: oneshot::Sender<Vec<VisitRecord>>,
    },
    Stats {
        resp: oneshot::Sender<VisitStats>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `manager` into a task that runs one command at a time.
///
/// Commands already queued run to completion even if the caller stops
/// waiting for the reply.
pub fn spawn_kiosk<S>(manager: VisitLifecycleManager<S>, config: RuntimeConfig) -> KioskHandle
where
    S: VisitRecordStore + 'static,
{
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<VisitEvent>(config.event_capacity.max(1));

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut manager = manager;

        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &mut manager, &events_tx_loop).await {
                break;
            }
        }
        debug!("kiosk runtime stopped");
    });

    KioskHandle { cmd_tx, events_tx }
}

impl KioskHandle {
    /// Receives events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<VisitEvent> {
        self.events_tx.subscribe()
    }

    /// See [`VisitLifecycleManager::check_in`].
    pub async fn check_in(&self, draft: VisitDraft) -> Result<VisitReceipt, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::CheckIn { draft, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// See [`VisitLifecycleManager::find_active`].
    pub async fn find_active(&self, term: impl Into<String>) -> Result<SearchOutcome, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Search {
            term: term.into(),
            resp: tx,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// See [`VisitLifecycleManager::check_out`].
    pub async fn check_out(&self, id: VisitId) -> Result<VisitReceipt, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::CheckOut { id, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)?
    }

    /// Record by id.
    pub async fn get(&self, id: VisitId) -> Result<Option<VisitRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Get { id, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Active visits in check-in order.
    pub async fn active_visits(&self) -> Result<Vec<VisitRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Active { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Every visit in check-in order.
    pub async fn all_visits(&self) -> Result<Vec<VisitRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::All { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Dashboard counts.
    pub async fn stats(&self) -> Result<VisitStats, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Stats { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stops the runtime after the commands already queued.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    async fn send(&self, cmd: Command) -> Result<(), RuntimeError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command<S: VisitRecordStore>(
    cmd: Command,
    manager: &mut VisitLifecycleManager<S>,
    events_tx: &broadcast::Sender<VisitEvent>,
) -> bool {
    match cmd {
        Command::CheckIn { draft, resp } => {
            let res = manager.check_in(draft).await;
            if let Ok(receipt) = &res {
                let _ = events_tx.send(VisitEvent::CheckedIn {
                    id: receipt.record.id.clone(),
                });
                publish_warnings(events_tx, receipt);
            }
            let _ = resp.send(res.map_err(RuntimeError::from));
        }
        Command::Search { term, resp } => {
            let _ = resp.send(manager.find_active(&term).map_err(RuntimeError::from));
        }
        Command::CheckOut { id, resp } => {
            let res = manager.check_out(&id).await;
            if let Ok(receipt) = &res {
                let _ = events_tx.send(VisitEvent::CheckedOut { id });
                publish_warnings(events_tx, receipt);
            }
            let _ = resp.send(res.map_err(RuntimeError::from));
        }
        Command::Get { id, resp } => {
            let _ = resp.send(manager.get(&id));
        }
        Command::Active { resp } => {
            let _ = resp.send(manager.active_visits());
        }
        Command::All { resp } => {
            let _ = resp.send(manager.all_visits());
        }
        Command::Stats { resp } => {
            let _ = resp.send(manager.stats());
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

fn publish_warnings(events_tx: &broadcast::Sender<VisitEvent>, receipt: &VisitReceipt) {
    for warning in &receipt.warnings {
        let _ = events_tx.send(VisitEvent::RemoteDegraded {
            id: receipt.record.id.clone(),
            stage: warning.stage,
        });
    }
}
