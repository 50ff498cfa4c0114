//! Test double for [`HealthReporter`] that records lifecycle events.

use std::net::SocketAddr;
use std::sync::Mutex;

use patchwire_config::Config;

use crate::bootstrap::BootstrapError;
use crate::health::HealthReporter;

/// Lifecycle events observed during a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    BootstrapStarting,
    BootstrapSucceeded,
    BootstrapFailed(String),
    ListenerStarted(SocketAddr),
    ListenerStopped(SocketAddr),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Snapshot of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn listener_started(&self, addr: SocketAddr) {
        self.record(HealthEvent::ListenerStarted(addr));
    }

    fn listener_stopped(&self, addr: SocketAddr) {
        self.record(HealthEvent::ListenerStopped(addr));
    }
}
