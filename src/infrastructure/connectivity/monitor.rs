use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::debug;

use crate::application::ports::ConnectivityProbe;

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Tracks network reachability. The cached flag is eventually consistent
/// and fine for best-effort branching; callers about to make an
/// online/offline decision that must be fresh (sign-in, sign-up, sync)
/// use `check_connectivity` instead.
pub struct ConnectivityMonitor {
    probe: Arc<dyn ConnectivityProbe>,
    online: AtomicBool,
    events: broadcast::Sender<bool>,
}

impl ConnectivityMonitor {
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            probe,
            online: AtomicBool::new(false),
            events,
        }
    }

    /// Cached state, cheap to read.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Force a fresh reachability probe and record the result.
    pub async fn check_connectivity(&self) -> bool {
        let online = self.probe.probe().await;
        self.record(online);
        online
    }

    /// Subscribe to connectivity transitions. The channel carries the new
    /// state and fires exactly once per edge; dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<bool> {
        self.events.subscribe()
    }

    /// Spawn a background polling loop refreshing the cached flag.
    pub fn start_polling(self: &Arc<Self>, interval_secs: u64) {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
            loop {
                interval.tick().await;
                monitor.check_connectivity().await;
            }
        });
    }

    fn record(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::SeqCst);
        if previous != online {
            debug!(online, "connectivity changed");
            // No subscribers is fine.
            let _ = self.events.send(online);
        }
    }
}

/// TCP reachability probe: a connection attempt against a well-known
/// endpoint with a short timeout. Any failure reads as offline.
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout_secs: u64) -> Self {
        Self {
            addr: addr.into(),
            timeout: Duration::from_secs(timeout_secs.max(1)),
        }
    }
}

#[async_trait::async_trait]
impl ConnectivityProbe for TcpProbe {
    async fn probe(&self) -> bool {
        matches!(
            tokio::time::timeout(self.timeout, tokio::net::TcpStream::connect(&self.addr)).await,
            Ok(Ok(_))
        )
    }
}
