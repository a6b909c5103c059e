use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, warn};

use crate::{
    catalog::{Catalog, CatalogError, CatalogFormat, CatalogLoad, CatalogStatus, FaultCode},
    core::{
        filter::RecordFilter,
        store::{ExportSnapshot, StoreError},
    },
    record::{DiagnosticRecord, RecordDraft, RecordPatch},
    service::DiagnosticLog,
    types::RecordId,
};

use super::events::LogEvent;

/// Failures surfaced through [`DiagLogHandle`].
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The log rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A file handed to the runtime could not be read.
    #[error("reading {}: {source}", path.display())]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying read error.
        #[source]
        source: std::io::Error,
    },
    /// The runtime task has stopped.
    #[error("diagnostic log runtime has shut down")]
    ChannelClosed,
}

/// Channel sizing for [`spawn_diaglog`].
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Pending commands before senders wait.
    pub command_queue_bound: usize,
    /// Events buffered per subscriber before it lags.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// Cloneable async front end to a [`DiagnosticLog`] owned by a runtime task.
pub struct DiagLogHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<LogEvent>,
}

impl Clone for DiagLogHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Create {
        draft: RecordDraft,
        resp: oneshot::Sender<Result<DiagnosticRecord, StoreError>>,
    },
    Update {
        id: RecordId,
        patch: RecordPatch,
        resp: oneshot::Sender<Result<DiagnosticRecord, StoreError>>,
    },
    Delete {
        id: RecordId,
        resp: oneshot::Sender<Result<bool, StoreError>>,
    },
    Get {
        id: RecordId,
        resp: oneshot::Sender<Option<DiagnosticRecord>>,
    },
    List {
        filter: RecordFilter,
        resp: oneshot::Sender<Vec<DiagnosticRecord>>,
    },
    Export {
        resp: oneshot::Sender<ExportSnapshot>,
    },
    Import {
        payload: Vec<u8>,
        resp: oneshot::Sender<Result<usize, StoreError>>,
    },
    Clear {
        resp: oneshot::Sender<Result<(), StoreError>>,
    },
    Lookup {
        code: String,
        equipment: String,
        resp: oneshot::Sender<Option<FaultCode>>,
    },
    Search {
        text: String,
        brand: String,
        resp: oneshot::Sender<Vec<FaultCode>>,
    },
    SetCatalog {
        load: CatalogLoad,
        resp: oneshot::Sender<CatalogStatus>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `log` onto a tokio task that owns it exclusively.
///
/// Commands are applied one at a time in arrival order; callers interact
/// through the returned handle.
pub fn spawn_diaglog(log: DiagnosticLog, config: RuntimeConfig) -> DiagLogHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound);
    let (events_tx, _) = broadcast::channel::<LogEvent>(config.event_capacity);

    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut log = log;
        while let Some(cmd) = cmd_rx.recv().await {
            if handle_command(cmd, &mut log, &events_tx_loop) {
                break;
            }
        }
        debug!("diagnostic log runtime stopped");
    });

    DiagLogHandle { cmd_tx, events_tx }
}

impl DiagLogHandle {
    /// Receiver for events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEvent> {
        self.events_tx.subscribe()
    }

    /// See [`DiagnosticLog::create`].
    pub async fn create(&self, draft: RecordDraft) -> Result<DiagnosticRecord, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Create { draft, resp: tx }).await?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    /// See [`DiagnosticLog::update`].
    pub async fn update(
        &self,
        id: impl Into<RecordId>,
        patch: RecordPatch,
    ) -> Result<DiagnosticRecord, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Update {
            id: id.into(),
            patch,
            resp: tx,
        })
        .await?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    /// See [`DiagnosticLog::delete`].
    pub async fn delete(&self, id: impl Into<RecordId>) -> Result<bool, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Delete {
            id: id.into(),
            resp: tx,
        })
        .await?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    /// Record by id.
    pub async fn get(&self, id: impl Into<RecordId>) -> Result<Option<DiagnosticRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Get {
            id: id.into(),
            resp: tx,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Records matching `filter`, newest first.
    pub async fn list(&self, filter: RecordFilter) -> Result<Vec<DiagnosticRecord>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::List { filter, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Snapshot of every record.
    pub async fn export_all(&self) -> Result<ExportSnapshot, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Export { resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// See [`DiagnosticLog::import_json`].
    pub async fn import_json(&self, payload: Vec<u8>) -> Result<usize, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Import { payload, resp: tx }).await?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    /// Reads an export file asynchronously, then imports it.
    pub async fn import_file(&self, path: impl Into<PathBuf>) -> Result<usize, RuntimeError> {
        let path = path.into();
        let payload = match tokio::fs::read(&path).await {
            Ok(payload) => payload,
            Err(source) => {
                warn!(path = %path.display(), error = %source, "import rejected");
                return Err(RuntimeError::Io { path, source });
            }
        };
        self.import_json(payload).await
    }

    /// Empties the store. Irreversible.
    pub async fn clear_all(&self) -> Result<(), RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Clear { resp: tx }).await?;
        Ok(rx.await.map_err(|_| RuntimeError::ChannelClosed)??)
    }

    /// Fault code for `code`, preferring the brand inferred from `equipment`.
    pub async fn lookup(
        &self,
        code: impl Into<String>,
        equipment: impl Into<String>,
    ) -> Result<Option<FaultCode>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Lookup {
            code: code.into(),
            equipment: equipment.into(),
            resp: tx,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Capped catalog search.
    pub async fn search(
        &self,
        text: impl Into<String>,
        brand: impl Into<String>,
    ) -> Result<Vec<FaultCode>, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Search {
            text: text.into(),
            brand: brand.into(),
            resp: tx,
        })
        .await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Reads the catalog file off the command loop and installs the result.
    ///
    /// Never fails on a bad file: the catalog becomes empty and the returned
    /// status says why. Overlapping reloads are not coordinated; the last one
    /// to finish wins.
    pub async fn reload_catalog(
        &self,
        path: impl Into<PathBuf>,
        format: CatalogFormat,
    ) -> Result<CatalogStatus, RuntimeError> {
        let path = path.into();
        let parsed = match tokio::fs::read(&path).await {
            Ok(bytes) => Catalog::from_slice(&bytes, format),
            Err(err) => Err(CatalogError::Io(err)),
        };
        let load = CatalogLoad::from_result(parsed, &path.display().to_string());

        let (tx, rx) = oneshot::channel();
        self.send(Command::SetCatalog { load, resp: tx }).await?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }

    /// Stops the runtime task after earlier commands complete.
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

fn handle_command(
    cmd: Command,
    log: &mut DiagnosticLog,
    events_tx: &broadcast::Sender<LogEvent>,
) -> bool {
    match cmd {
        Command::Create { draft, resp } => {
            let res = log.create(draft);
            if let Ok(rec) = &res {
                let _ = events_tx.send(LogEvent::Created { id: rec.id.clone() });
            }
            let _ = resp.send(res);
        }
        Command::Update { id, patch, resp } => {
            let res = log.update(&id, &patch);
            if res.is_ok() {
                let _ = events_tx.send(LogEvent::Updated { id });
            }
            let _ = resp.send(res);
        }
        Command::Delete { id, resp } => {
            let res = log.delete(&id);
            if let Ok(true) = res {
                let _ = events_tx.send(LogEvent::Deleted { id });
            }
            let _ = resp.send(res);
        }
        Command::Get { id, resp } => {
            let _ = resp.send(log.get(&id));
        }
        Command::List { filter, resp } => {
            let _ = resp.send(log.list(&filter));
        }
        Command::Export { resp } => {
            let _ = resp.send(log.export_all());
        }
        Command::Import { payload, resp } => {
            let res = log.import_json(&payload);
            if let Ok(records) = res {
                let _ = events_tx.send(LogEvent::Imported { records });
            }
            let _ = resp.send(res);
        }
        Command::Clear { resp } => {
            let res = log.clear_all();
            if res.is_ok() {
                let _ = events_tx.send(LogEvent::Cleared);
            }
            let _ = resp.send(res);
        }
        Command::Lookup {
            code,
            equipment,
            resp,
        } => {
            let _ = resp.send(log.lookup_for_equipment(&code, &equipment));
        }
        Command::Search { text, brand, resp } => {
            let _ = resp.send(log.search_codes(&text, &brand, None));
        }
        Command::SetCatalog { load, resp } => {
            log.set_catalog(load);
            let status = log.catalog_status().clone();
            let _ = events_tx.send(LogEvent::CatalogLoaded {
                status: status.clone(),
            });
            let _ = resp.send(status);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}
