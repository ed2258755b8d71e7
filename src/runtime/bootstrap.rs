use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    config::KioskConfig,
    core::store::VisitStore,
    lifecycle::VisitLifecycleManager,
    persist::{PersistResult, sqlite::SqliteJournal},
    remote::{
        directory::{LogNotifier, StaticDirectory},
        http::HttpVisitSink,
    },
};

use super::handle::{KioskHandle, spawn_kiosk};

/// Opens the SQLite store named by `config`, wires the optional remote sink
/// and host notification, and spawns the runtime.
///
/// Must be called inside a tokio runtime. A remote sink that cannot be built
/// is logged and skipped; only a local store failure is an error.
pub fn open_kiosk(config: &KioskConfig) -> PersistResult<KioskHandle> {
    let journal = SqliteJournal::open(&config.database_path)?;
    let store = VisitStore::open(journal);
    info!(
        path = %config.database_path.display(),
        visits = store.len(),
        "visit store opened"
    );

    let mut manager = VisitLifecycleManager::new(store);

    if let Some(remote) = &config.remote {
        match HttpVisitSink::new(remote.clone()) {
            Ok(sink) => manager = manager.with_remote(Arc::new(sink)),
            Err(err) => warn!(error = %err, "remote sink unavailable, running local-only"),
        }
    }

    if config.runtime.notify_hosts && !config.hosts.is_empty() {
        manager = manager.with_host_notification(
            Arc::new(StaticDirectory::new(config.hosts.clone())),
            Arc::new(LogNotifier),
        );
    }

    Ok(spawn_kiosk(manager, config.runtime.clone()))
}
