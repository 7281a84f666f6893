//! Transport finalization handoff
//!
//! Negotiation runs on the caller's thread; bringing transports up belongs to
//! the network-I/O context. [`TransportFinalizer`] owns a channel into a task
//! running there. Each [`FinalizeRequest`] is a self-contained snapshot (the
//! descriptor handle, level, component and the layer stack) plus the session's
//! liveness token, so the task never touches session state.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use jsep_sdp_core::Fingerprint;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::descriptor::{DtlsRole, IceParameters, TransportDescriptor, TransportFlow};
use crate::error::Result;

/// Shared flag that says whether the owning session is still open
#[derive(Debug, Clone)]
pub struct SessionLiveness(Arc<AtomicBool>);

impl SessionLiveness {
    pub fn new() -> Self {
        SessionLiveness(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark the session closed; every clone observes it
    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for SessionLiveness {
    fn default() -> Self {
        Self::new()
    }
}

/// One layer of the transport stack, bottom first
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportLayer {
    Ice {
        local: IceParameters,
        remote: IceParameters,
        controlling: bool,
    },
    Dtls {
        role: DtlsRole,
        fingerprints: Vec<Fingerprint>,
    },
    Srtp,
}

impl fmt::Display for TransportLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportLayer::Ice { .. } => write!(f, "ice"),
            TransportLayer::Dtls { .. } => write!(f, "dtls"),
            TransportLayer::Srtp => write!(f, "srtp"),
        }
    }
}

/// Everything the finalization task needs for one transport
#[derive(Debug, Clone)]
pub struct FinalizeRequest {
    pub descriptor: Arc<TransportDescriptor>,
    pub level: usize,
    pub rtcp: bool,
    pub layers: Vec<TransportLayer>,
    pub liveness: SessionLiveness,
}

/// How a finalization request ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Finalized,
    /// The session closed before the flow could be recorded
    Cancelled,
    Failed(String),
}

/// The external transport layer
#[async_trait]
pub trait TransportHandler: Send + Sync {
    /// Bring up the layer stack for `descriptor` and return the running flow
    async fn finalize(&self, descriptor: &TransportDescriptor, layers: &[TransportLayer]) -> Result<TransportFlow>;

    /// Told about every failed request
    async fn finalization_failed(&self, level: usize, rtcp: bool, reason: &str) {
        let _ = (level, rtcp, reason);
    }
}

struct FinalizeJob {
    request: FinalizeRequest,
    reply: oneshot::Sender<FinalizeOutcome>,
}

/// Sender side of the finalization task
#[derive(Clone)]
pub struct TransportFinalizer {
    tx: mpsc::UnboundedSender<FinalizeJob>,
}

impl fmt::Debug for TransportFinalizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportFinalizer")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl TransportFinalizer {
    /// Start the finalization task on the current runtime
    ///
    /// Panics outside a tokio runtime, like `tokio::spawn`.
    pub fn spawn(handler: Arc<dyn TransportHandler>) -> Self {
        Self::spawn_on(&Handle::current(), handler)
    }

    /// Start the finalization task on `runtime`
    pub fn spawn_on(runtime: &Handle, handler: Arc<dyn TransportHandler>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<FinalizeJob>();

        runtime.spawn(async move {
            debug!("Transport finalization task started");
            while let Some(job) = rx.recv().await {
                let outcome = run_job(handler.as_ref(), &job.request).await;
                // The requester may have stopped listening
                let _ = job.reply.send(outcome);
            }
            debug!("Transport finalization task stopped");
        });

        TransportFinalizer { tx }
    }

    /// Queue a request without waiting for it
    pub fn dispatch(&self, request: FinalizeRequest) -> oneshot::Receiver<FinalizeOutcome> {
        let (reply, receiver) = oneshot::channel();
        debug!(
            "Dispatching transport finalization for level {} ({})",
            request.level,
            if request.rtcp { "rtcp" } else { "rtp" }
        );

        if let Err(mpsc::error::SendError(job)) = self.tx.send(FinalizeJob { request, reply }) {
            warn!("Transport finalization task is gone");
            let _ = job
                .reply
                .send(FinalizeOutcome::Failed("Finalization task is not running".to_string()));
        }
        receiver
    }
}

async fn run_job(handler: &dyn TransportHandler, request: &FinalizeRequest) -> FinalizeOutcome {
    if !request.liveness.is_alive() {
        debug!("Session closed, skipping finalization of level {}", request.level);
        return FinalizeOutcome::Cancelled;
    }

    let flow = match handler.finalize(&request.descriptor, &request.layers).await {
        Ok(flow) => flow,
        Err(e) => {
            let reason = e.to_string();
            warn!("Transport finalization failed for level {}: {}", request.level, reason);
            handler.finalization_failed(request.level, request.rtcp, &reason).await;
            return FinalizeOutcome::Failed(reason);
        }
    };

    // The session may have closed while the handler was running
    if !request.liveness.is_alive() {
        debug!("Session closed during finalization of level {}", request.level);
        return FinalizeOutcome::Cancelled;
    }

    if let Err(e) = request.descriptor.set_flow(flow) {
        let reason = e.to_string();
        handler.finalization_failed(request.level, request.rtcp, &reason).await;
        return FinalizeOutcome::Failed(reason);
    }

    info!(
        "Transport finalized for level {} ({})",
        request.level,
        request.descriptor.component()
    );
    FinalizeOutcome::Finalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liveness_shared_between_clones() {
        let liveness = SessionLiveness::new();
        let observer = liveness.clone();
        assert!(observer.is_alive());
        liveness.revoke();
        assert!(!observer.is_alive());
    }

    #[test]
    fn test_layer_names() {
        assert_eq!(TransportLayer::Srtp.to_string(), "srtp");
    }
}
