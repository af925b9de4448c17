//! Service state machine
//!
//! Pure state machine: receives events, returns (new_state, action).
//! Caller (main.rs) executes the I/O implied by each action.
//!
//! ```text
//! Initializing ─ConfigLoaded─► Discovering ─DiscoveryCompleted─► Starting{Enabled}  ─ListenerReady─► Running
//!                                  └──────────DiscoveryFailed──► Starting{Disabled} ─ListenerReady─► Running
//! any ─ShutdownSignal─► Stopped
//! ```

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::error::Error as ServiceError;

/// Graceful shutdown drain limit
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether the `/auth/*` routes are served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeStatus {
    Enabled,
    /// Discovery failed; only `/health` and `/metrics` are served
    Disabled { reason: String },
}

impl BridgeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BridgeStatus::Enabled => "enabled",
            BridgeStatus::Disabled { .. } => "disabled",
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, BridgeStatus::Enabled)
    }
}

#[derive(Debug)]
pub enum ServiceState {
    /// Loading config, setting up resources
    Initializing,
    /// Fetching provider metadata and signing keys
    Discovering { listen_addr: SocketAddr },
    /// Binding the HTTP listener
    Starting {
        listen_addr: SocketAddr,
        bridge: BridgeStatus,
    },
    /// Serving requests
    Running {
        listen_addr: SocketAddr,
        bridge: BridgeStatus,
        started_at: Instant,
    },
    /// Terminal state
    Stopped { exit_code: i32 },
}

#[derive(Debug)]
pub enum ServiceEvent {
    /// Configuration parsed successfully
    ConfigLoaded { listen_addr: SocketAddr },
    /// Provider client ready
    DiscoveryCompleted,
    /// Provider unreachable or metadata invalid
    DiscoveryFailed(ServiceError),
    /// HTTP listener bound and ready
    ListenerReady,
    /// SIGTERM/SIGINT received
    ShutdownSignal,
}

/// Actions the caller should execute after a state transition
#[derive(Debug, PartialEq, Eq)]
pub enum ServiceAction {
    /// Run provider discovery
    Discover,
    /// Bind HTTP listener; mount `/auth/*` only if `bridge_enabled`
    StartListener {
        addr: SocketAddr,
        bridge_enabled: bool,
    },
    /// Stop accepting, drain for at most `DRAIN_TIMEOUT`, exit
    Shutdown { exit_code: i32 },
    /// No-op
    None,
}

/// Handle a state transition. Pure function: no I/O.
pub fn handle_event(state: ServiceState, event: ServiceEvent) -> (ServiceState, ServiceAction) {
    match (state, event) {
        (ServiceState::Initializing, ServiceEvent::ConfigLoaded { listen_addr }) => (
            ServiceState::Discovering { listen_addr },
            ServiceAction::Discover,
        ),

        (ServiceState::Discovering { listen_addr }, ServiceEvent::DiscoveryCompleted) => (
            ServiceState::Starting {
                listen_addr,
                bridge: BridgeStatus::Enabled,
            },
            ServiceAction::StartListener {
                addr: listen_addr,
                bridge_enabled: true,
            },
        ),

        // Not fatal: the host keeps running with the login routes disabled
        (ServiceState::Discovering { listen_addr }, ServiceEvent::DiscoveryFailed(e)) => (
            ServiceState::Starting {
                listen_addr,
                bridge: BridgeStatus::Disabled {
                    reason: e.to_string(),
                },
            },
            ServiceAction::StartListener {
                addr: listen_addr,
                bridge_enabled: false,
            },
        ),

        (
            ServiceState::Starting {
                listen_addr,
                bridge,
            },
            ServiceEvent::ListenerReady,
        ) => (
            ServiceState::Running {
                listen_addr,
                bridge,
                started_at: Instant::now(),
            },
            ServiceAction::None,
        ),

        (_, ServiceEvent::ShutdownSignal) => (
            ServiceState::Stopped { exit_code: 0 },
            ServiceAction::Shutdown { exit_code: 0 },
        ),

        // Invalid/unhandled transition: stay in current state
        (state, _event) => (state, ServiceAction::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localhost_addr() -> SocketAddr {
        "127.0.0.1:8065".parse().unwrap()
    }

    fn discovery_error() -> ServiceError {
        oidc_client::Error::Http("connection refused".into()).into()
    }

    #[test]
    fn init_to_discovering_on_config_loaded() {
        let (state, action) = handle_event(
            ServiceState::Initializing,
            ServiceEvent::ConfigLoaded {
                listen_addr: localhost_addr(),
            },
        );
        assert!(matches!(state, ServiceState::Discovering { .. }));
        assert_eq!(action, ServiceAction::Discover);
    }

    #[test]
    fn discovery_success_enables_bridge() {
        let (state, action) = handle_event(
            ServiceState::Discovering {
                listen_addr: localhost_addr(),
            },
            ServiceEvent::DiscoveryCompleted,
        );
        assert!(matches!(
            state,
            ServiceState::Starting {
                bridge: BridgeStatus::Enabled,
                ..
            }
        ));
        assert_eq!(
            action,
            ServiceAction::StartListener {
                addr: localhost_addr(),
                bridge_enabled: true
            }
        );
    }

    #[test]
    fn discovery_failure_disables_bridge_but_keeps_starting() {
        let (state, action) = handle_event(
            ServiceState::Discovering {
                listen_addr: localhost_addr(),
            },
            ServiceEvent::DiscoveryFailed(discovery_error()),
        );
        match state {
            ServiceState::Starting {
                bridge: BridgeStatus::Disabled { reason },
                ..
            } => assert!(reason.contains("connection refused"), "got: {reason}"),
            other => panic!("expected Starting{{Disabled}}, got {other:?}"),
        }
        assert_eq!(
            action,
            ServiceAction::StartListener {
                addr: localhost_addr(),
                bridge_enabled: false
            }
        );
    }

    #[test]
    fn starting_to_running_keeps_bridge_status() {
        let (state, action) = handle_event(
            ServiceState::Starting {
                listen_addr: localhost_addr(),
                bridge: BridgeStatus::Disabled {
                    reason: "x".into(),
                },
            },
            ServiceEvent::ListenerReady,
        );
        match state {
            ServiceState::Running { bridge, .. } => assert!(!bridge.is_enabled()),
            other => panic!("expected Running, got {other:?}"),
        }
        assert_eq!(action, ServiceAction::None);
    }

    #[test]
    fn any_state_shutdown_signal_stops() {
        let states = [
            ServiceState::Initializing,
            ServiceState::Discovering {
                listen_addr: localhost_addr(),
            },
            ServiceState::Running {
                listen_addr: localhost_addr(),
                bridge: BridgeStatus::Enabled,
                started_at: Instant::now(),
            },
        ];
        for state in states {
            let (state, action) = handle_event(state, ServiceEvent::ShutdownSignal);
            assert!(matches!(state, ServiceState::Stopped { exit_code: 0 }));
            assert_eq!(action, ServiceAction::Shutdown { exit_code: 0 });
        }
    }

    #[test]
    fn out_of_order_event_is_ignored() {
        let (state, action) =
            handle_event(ServiceState::Initializing, ServiceEvent::DiscoveryCompleted);
        assert!(matches!(state, ServiceState::Initializing));
        assert_eq!(action, ServiceAction::None);
    }

    #[test]
    fn status_labels() {
        assert_eq!(BridgeStatus::Enabled.label(), "enabled");
        assert_eq!(
            BridgeStatus::Disabled {
                reason: String::new()
            }
            .label(),
            "disabled"
        );
    }
}
