//! Paired-device channel
//!
//! Opaque byte payloads only; the ledger owns the encoding.

use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

use crate::error::SyncError;

pub trait PeerChannel: Send + Sync {
    fn send(&self, payload: Vec<u8>) -> Result<(), SyncError>;

    /// Wait up to `timeout` for the next payload. `Ok(None)` means the peer
    /// stayed quiet.
    fn receive(&self, timeout: Duration) -> Result<Option<Vec<u8>>, SyncError>;
}

/// In-process pair, e.g. phone and watch in one test
#[derive(Debug)]
pub struct LoopbackPeer {
    tx: Sender<Vec<u8>>,
    rx: Receiver<Vec<u8>>,
}

impl LoopbackPeer {
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = unbounded();
        let (b_tx, b_rx) = unbounded();
        (
            Self { tx: a_tx, rx: b_rx },
            Self { tx: b_tx, rx: a_rx },
        )
    }
}

impl PeerChannel for LoopbackPeer {
    fn send(&self, payload: Vec<u8>) -> Result<(), SyncError> {
        self.tx.send(payload).map_err(|_| SyncError::Unreachable)
    }

    fn receive(&self, timeout: Duration) -> Result<Option<Vec<u8>>, SyncError> {
        match self.rx.recv_timeout(timeout) {
            Ok(payload) => Ok(Some(payload)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(SyncError::Unreachable),
        }
    }
}

/// No paired device
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflinePeer;

impl PeerChannel for OfflinePeer {
    fn send(&self, _payload: Vec<u8>) -> Result<(), SyncError> {
        Err(SyncError::Unreachable)
    }

    fn receive(&self, _timeout: Duration) -> Result<Option<Vec<u8>>, SyncError> {
        Err(SyncError::Unreachable)
    }
}
