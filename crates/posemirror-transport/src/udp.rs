//! UDP transport implementation

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use posemirror_core::{MirrorError, MirrorResult};
use posemirror_state::RotationTable;
use posemirror_wire::{PoseFrame, MAX_FRAME_SIZE};

/// Default port trackers stream orientation frames to
pub const DEFAULT_POSE_PORT: u16 = 8200;

/// Why a receive loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveExit {
    /// Shutdown was requested through the handle
    Shutdown,
    /// The socket failed; the table keeps its last pose
    TransportFailed,
}

/// Bound socket waiting to be turned into a background receive loop
pub struct PoseReceiver {
    socket: Arc<UdpSocket>,
    local_addr: SocketAddr,
}

impl PoseReceiver {
    /// Bind to a local address
    pub async fn bind(addr: SocketAddr) -> MirrorResult<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| MirrorError::TransportError(format!("bind {}: {}", addr, e)))?;

        let local_addr = socket
            .local_addr()
            .map_err(|e| MirrorError::TransportError(e.to_string()))?;

        tracing::info!(%local_addr, "pose receiver listening");

        Ok(PoseReceiver {
            socket: Arc::new(socket),
            local_addr,
        })
    }

    /// Get local address
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start the background receive loop writing into `table`
    pub fn spawn(self, table: Arc<RotationTable>) -> ReceiverHandle {
        let live = Arc::new(AtomicBool::new(true));
        let wake = Arc::new(Notify::new());

        let task = tokio::spawn(receive_loop(
            self.socket,
            table,
            Arc::clone(&live),
            Arc::clone(&wake),
        ));

        ReceiverHandle {
            live,
            wake,
            local_addr: self.local_addr,
            task,
        }
    }
}

/// Control handle of a running receive loop
pub struct ReceiverHandle {
    live: Arc<AtomicBool>,
    wake: Arc<Notify>,
    local_addr: SocketAddr,
    task: JoinHandle<ReceiveExit>,
}

impl ReceiverHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Whether the loop is still receiving
    pub fn is_running(&self) -> bool {
        self.live.load(Ordering::Acquire) && !self.task.is_finished()
    }

    /// Clear the liveness flag and wake the loop if it is parked on a receive
    pub fn shutdown(&self) {
        self.live.store(false, Ordering::Release);
        self.wake.notify_one();
    }

    /// Wait for the loop to end
    pub async fn join(self) -> ReceiveExit {
        // A panicked or aborted task counts as a dead transport
        self.task.await.unwrap_or(ReceiveExit::TransportFailed)
    }

    /// Shut down and wait for the loop to end
    pub async fn stop(self) -> ReceiveExit {
        self.shutdown();
        self.join().await
    }
}

async fn receive_loop(
    socket: Arc<UdpSocket>,
    table: Arc<RotationTable>,
    live: Arc<AtomicBool>,
    wake: Arc<Notify>,
) -> ReceiveExit {
    let mut buf = vec![0u8; MAX_FRAME_SIZE];

    while live.load(Ordering::Acquire) {
        tokio::select! {
            _ = wake.notified() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok((len, from)) => {
                    if !live.load(Ordering::Acquire) {
                        break;
                    }
                    tracing::debug!(%from, len, "pose datagram received");
                    if !table.ingest(&buf[..len]) {
                        tracing::trace!(%from, "ignored datagram without frame header");
                    }
                }
                Err(e) => {
                    if !live.load(Ordering::Acquire) {
                        break;
                    }
                    tracing::error!("UDP receive error, pose stream stopped: {}", e);
                    live.store(false, Ordering::Release);
                    return ReceiveExit::TransportFailed;
                }
            },
        }
    }

    tracing::debug!("pose receive loop shut down");
    ReceiveExit::Shutdown
}

/// Sends orientation frames to a receiver
pub struct PoseSender {
    socket: UdpSocket,
}

impl PoseSender {
    pub async fn bind(addr: SocketAddr) -> MirrorResult<Self> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| MirrorError::TransportError(e.to_string()))?;
        Ok(PoseSender { socket })
    }

    pub fn local_addr(&self) -> MirrorResult<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| MirrorError::TransportError(e.to_string()))
    }

    /// Encode and send a frame
    pub async fn send(&self, frame: &PoseFrame, dest: SocketAddr) -> MirrorResult<()> {
        self.send_bytes(frame.encode().as_bytes(), dest).await
    }

    /// Send raw bytes to a destination
    pub async fn send_bytes(&self, bytes: &[u8], dest: SocketAddr) -> MirrorResult<()> {
        self.socket
            .send_to(bytes, dest)
            .await
            .map_err(|e| MirrorError::TransportError(e.to_string()))?;
        Ok(())
    }
}
