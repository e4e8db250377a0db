//! Cross-device ledger sync
//!
//! Best effort: failures are logged and the local ledger stands.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::error::SyncError;
use crate::highscores::LedgerSnapshot;
use crate::platform::PeerChannel;

/// Push the local snapshot and wait for the peer's.
pub fn sync_once(
    peer: &dyn PeerChannel,
    local: &LedgerSnapshot,
    timeout: Duration,
) -> Result<LedgerSnapshot, SyncError> {
    peer.send(local.encode()?)?;
    match peer.receive(timeout)? {
        Some(bytes) => LedgerSnapshot::decode(&bytes),
        None => Err(SyncError::Timeout(timeout.as_millis() as u64)),
    }
}

/// Run `sync_once` on a detached thread.
///
/// `on_done` always runs, with the peer's snapshot or the failure (already
/// logged). Returns false if the thread could not be spawned.
pub fn spawn_sync<F>(
    peer: Arc<dyn PeerChannel>,
    local: LedgerSnapshot,
    timeout: Duration,
    on_done: F,
) -> bool
where
    F: FnOnce(Result<LedgerSnapshot, SyncError>) + Send + 'static,
{
    let spawned = std::thread::Builder::new()
        .name("ledger-sync".to_string())
        .spawn(move || {
            let result = sync_once(peer.as_ref(), &local, timeout);
            match &result {
                Ok(remote) => debug!(
                    "Ledger sync received best {} with {} entries",
                    remote.best_score,
                    remote.entries.len()
                ),
                Err(e) => warn!("Ledger sync failed, keeping local scores: {e}"),
            }
            on_done(result);
        });
    match spawned {
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to spawn ledger sync thread: {e}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::HighScores;
    use crate::platform::{LoopbackPeer, OfflinePeer};
    use crossbeam_channel::bounded;

    fn ledger(name: &str, score: u64) -> LedgerSnapshot {
        let mut ledger = HighScores::new();
        ledger.record_run(name, score);
        ledger.snapshot()
    }

    #[test]
    fn test_sync_once_exchanges_snapshots() {
        let (phone, watch) = LoopbackPeer::pair();
        let watch_ledger = ledger("Watch", 700);
        watch.send(watch_ledger.encode().unwrap()).unwrap();

        let phone_ledger = ledger("Phone", 300);
        let remote = sync_once(&phone, &phone_ledger, Duration::from_millis(100)).unwrap();
        assert_eq!(remote, watch_ledger);

        // The watch got ours too
        let bytes = watch.receive(Duration::from_millis(100)).unwrap().unwrap();
        assert_eq!(LedgerSnapshot::decode(&bytes).unwrap(), phone_ledger);
    }

    #[test]
    fn test_quiet_peer_times_out() {
        let (phone, _watch) = LoopbackPeer::pair();
        let result = sync_once(&phone, &LedgerSnapshot::default(), Duration::from_millis(5));
        assert!(matches!(result, Err(SyncError::Timeout(5))));
    }

    #[test]
    fn test_offline_peer_reports_failure() {
        let (tx, rx) = bounded(1);
        assert!(spawn_sync(
            Arc::new(OfflinePeer),
            LedgerSnapshot::default(),
            Duration::from_millis(5),
            move |result| {
                let _ = tx.send(result);
            },
        ));
        let result = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(result, Err(SyncError::Unreachable)));
    }

    #[test]
    fn test_spawned_sync_delivers_remote() {
        let (phone, watch) = LoopbackPeer::pair();
        let watch_ledger = ledger("Watch", 42);
        watch.send(watch_ledger.encode().unwrap()).unwrap();

        let (tx, rx) = bounded(1);
        assert!(spawn_sync(
            Arc::new(phone),
            LedgerSnapshot::default(),
            Duration::from_millis(500),
            move |result| {
                let _ = tx.send(result);
            },
        ));
        let remote = rx.recv_timeout(Duration::from_secs(2)).unwrap().unwrap();
        assert_eq!(remote, watch_ledger);
    }
}
