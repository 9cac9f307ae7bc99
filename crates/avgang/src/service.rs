//! Shared access to one registry from many tasks.
//!
//! [`RegistryHandle::spawn`] moves a [`Registry`] into a tokio task that owns
//! it. Handles send commands over an mpsc channel and wait for a oneshot
//! reply, so mutations are applied one at a time without a lock. After every
//! successful mutation the task publishes the full record set to all
//! subscribers.

use std::sync::Arc;

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::departure::{Departure, DepartureId, DepartureInput};
use crate::error::{Error, Result};
use crate::import::{ImportPolicy, ImportSummary};
use crate::query::{Filter, SortKey};
use crate::registry::Registry;
use crate::stats::RegistryStats;

/// Full record set as published after a mutation.
pub type Snapshot = Arc<Vec<Departure>>;

const COMMAND_BUFFER: usize = 64;
const UPDATE_BUFFER: usize = 16;

#[derive(Debug)]
enum Command {
    List {
        filter: Filter,
        sort: Option<SortKey>,
        reply: oneshot::Sender<Vec<Departure>>,
    },
    Get {
        id: DepartureId,
        reply: oneshot::Sender<Option<Departure>>,
    },
    Stats {
        filter: Filter,
        reply: oneshot::Sender<RegistryStats>,
    },
    Add {
        input: DepartureInput,
        reply: oneshot::Sender<Result<Departure>>,
    },
    Upsert {
        id: DepartureId,
        input: DepartureInput,
        reply: oneshot::Sender<Result<Departure>>,
    },
    Delete {
        id: DepartureId,
        reply: oneshot::Sender<Result<Departure>>,
    },
    Clear {
        reply: oneshot::Sender<Result<usize>>,
    },
    Import {
        payload: String,
        policy: Option<ImportPolicy>,
        reply: oneshot::Sender<Result<ImportSummary>>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a registry task.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    commands: mpsc::Sender<Command>,
    updates: broadcast::Sender<Snapshot>,
}

impl RegistryHandle {
    /// Move `registry` into a new task and return a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(registry: Registry) -> Self {
        let (commands, rx) = mpsc::channel(COMMAND_BUFFER);
        let (updates, _) = broadcast::channel(UPDATE_BUFFER);

        tokio::spawn(run(registry, rx, updates.clone()));
        Self { commands, updates }
    }

    /// Receive the full record set after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| Error::ServiceStopped)?;
        response.await.map_err(|_| Error::ServiceStopped)
    }

    /// Departures matching `filter`, optionally sorted.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the task is gone.
    pub async fn list(&self, filter: Filter, sort: Option<SortKey>) -> Result<Vec<Departure>> {
        self.request(|reply| Command::List {
            filter,
            sort,
            reply,
        })
        .await
    }

    /// Look up one departure.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the task is gone.
    pub async fn get(&self, id: DepartureId) -> Result<Option<Departure>> {
        self.request(|reply| Command::Get { id, reply }).await
    }

    /// Summary counts.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the task is gone.
    pub async fn stats(&self, filter: Filter) -> Result<RegistryStats> {
        self.request(|reply| Command::Stats { filter, reply }).await
    }

    /// See [`Registry::add`].
    ///
    /// # Errors
    ///
    /// Returns the registry's error, or `ServiceStopped`.
    pub async fn add(&self, input: DepartureInput) -> Result<Departure> {
        self.request(|reply| Command::Add { input, reply }).await?
    }

    /// See [`Registry::upsert`].
    ///
    /// # Errors
    ///
    /// Returns the registry's error, or `ServiceStopped`.
    pub async fn upsert(&self, id: DepartureId, input: DepartureInput) -> Result<Departure> {
        self.request(|reply| Command::Upsert { id, input, reply })
            .await?
    }

    /// See [`Registry::delete`].
    ///
    /// # Errors
    ///
    /// Returns the registry's error, or `ServiceStopped`.
    pub async fn delete(&self, id: DepartureId) -> Result<Departure> {
        self.request(|reply| Command::Delete { id, reply }).await?
    }

    /// See [`Registry::clear`].
    ///
    /// # Errors
    ///
    /// Returns the registry's error, or `ServiceStopped`.
    pub async fn clear(&self) -> Result<usize> {
        self.request(|reply| Command::Clear { reply }).await?
    }

    /// See [`Registry::import`].
    ///
    /// # Errors
    ///
    /// Returns the registry's error, or `ServiceStopped`.
    pub async fn import(
        &self,
        payload: impl Into<String>,
        policy: Option<ImportPolicy>,
    ) -> Result<ImportSummary> {
        let payload = payload.into();
        self.request(|reply| Command::Import {
            payload,
            policy,
            reply,
        })
        .await?
    }

    /// Stop the task. Other handles get `ServiceStopped` afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ServiceStopped` if the task was already gone.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| Command::Shutdown { reply }).await
    }
}

async fn run(
    mut registry: Registry,
    mut commands: mpsc::Receiver<Command>,
    updates: broadcast::Sender<Snapshot>,
) {
    info!("Registry service started with {} departures", registry.len());

    while let Some(command) = commands.recv().await {
        let mutated = match command {
            Command::List {
                filter,
                sort,
                reply,
            } => {
                let _ = reply.send(registry.list(&filter, sort));
                false
            }
            Command::Get { id, reply } => {
                let _ = reply.send(registry.get(id).cloned());
                false
            }
            Command::Stats { filter, reply } => {
                let _ = reply.send(registry.stats(&filter));
                false
            }
            Command::Add { input, reply } => respond(reply, registry.add(&input)),
            Command::Upsert { id, input, reply } => respond(reply, registry.upsert(id, &input)),
            Command::Delete { id, reply } => respond(reply, registry.delete(id)),
            Command::Clear { reply } => respond(reply, registry.clear()),
            Command::Import {
                payload,
                policy,
                reply,
            } => respond(reply, registry.import(&payload, policy)),
            Command::Shutdown { reply } => {
                let _ = reply.send(());
                break;
            }
        };

        if mutated {
            // No subscribers is fine.
            let _ = updates.send(Arc::new(registry.all().to_vec()));
            debug!("Published {} departures", registry.len());
        }
    }

    info!("Registry service stopped");
}

/// Send a mutation result back; report whether it succeeded.
fn respond<T>(reply: oneshot::Sender<Result<T>>, result: Result<T>) -> bool {
    let ok = result.is_ok();
    let _ = reply.send(result);
    ok
}
