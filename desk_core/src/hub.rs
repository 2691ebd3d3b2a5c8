//! Telemetry fan-out.
//!
//! Spawns a pump thread that owns the `PositionSource`, decodes each raw
//! notification payload, and forwards the sample to every live subscriber in
//! arrival order. Malformed payloads are dropped and the pump keeps going;
//! transient link errors are skipped the same way. When the source reports
//! end-of-stream the pump drops all subscriber channels, so subscribers
//! observe a disconnect rather than an error.
//!
//! Safety: each `TelemetryHub` spawns exactly one thread that is shut down
//! when the hub is dropped, preventing thread leaks.

use crossbeam_channel as xch;
use desk_traits::PositionSource;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::protocol::DeskPosition;

/// One subscriber's view of the telemetry stream. Dropping it unsubscribes.
pub struct Subscription {
    rx: xch::Receiver<DeskPosition>,
}

impl Subscription {
    pub fn recv(&self) -> Result<DeskPosition, xch::RecvError> {
        self.rx.recv()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<DeskPosition, xch::RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub struct TelemetryHub {
    subscribers: Arc<Mutex<Vec<xch::Sender<DeskPosition>>>>,
    closed: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl TelemetryHub {
    /// Start pumping `source`. `recv_timeout` bounds each blocking read so
    /// the thread notices shutdown promptly.
    pub fn spawn<P: PositionSource + Send + 'static>(mut source: P, recv_timeout: Duration) -> Self {
        let subscribers: Arc<Mutex<Vec<xch::Sender<DeskPosition>>>> =
            Arc::new(Mutex::new(Vec::new()));
        let subscribers_pump = subscribers.clone();
        let closed = Arc::new(AtomicBool::new(false));
        let closed_pump = closed.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_pump = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            loop {
                if shutdown_pump.load(Ordering::Relaxed) {
                    tracing::debug!("telemetry pump received shutdown signal");
                    break;
                }

                match source.recv(recv_timeout) {
                    Ok(Some(payload)) => match DeskPosition::decode(&payload) {
                        Ok(sample) => {
                            if let Ok(mut subs) = subscribers_pump.lock() {
                                subs.retain(|tx| tx.send(sample).is_ok());
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "dropping malformed position sample");
                        }
                    },
                    Ok(None) => {
                        tracing::debug!("position stream ended");
                        break;
                    }
                    Err(e) => {
                        // Timeout or transient link fault; keep pumping.
                        tracing::trace!(error = %e, "position recv yielded no sample");
                    }
                }
            }

            closed_pump.store(true, Ordering::SeqCst);
            if let Ok(mut subs) = subscribers_pump.lock() {
                subs.clear();
            }
            tracing::trace!("telemetry pump exiting cleanly");
        });

        Self {
            subscribers,
            closed,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Register a new subscriber. Samples arriving after this call are
    /// delivered in arrival order. Subscribing to a closed hub yields a
    /// subscription that immediately reports disconnection.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = xch::unbounded();
        if !self.closed.load(Ordering::SeqCst)
            && let Ok(mut subs) = self.subscribers.lock()
        {
            // Re-check under the lock so a concurrently closing pump cannot
            // leave this sender stranded after its final clear().
            if !self.closed.load(Ordering::SeqCst) {
                subs.push(tx);
            }
        }
        Subscription { rx }
    }

    /// True once the underlying source reported end-of-stream.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Drop for TelemetryHub {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => tracing::trace!("telemetry pump joined successfully"),
                Err(e) => tracing::warn!(?e, "telemetry pump panicked during shutdown"),
            }
        }
    }
}
