//! Connection state tracking
//!
//! This module tracks the lifecycle of a transport and publishes every
//! transition through a watch channel so observers (the GUI shell, the
//! client's fail-fast check, tests) always see the newest state.
//!
//! # Connection States
//!
//! - **Disconnected**: initial state, no usable channel
//! - **Connecting**: establishing the connection (spawning the server)
//! - **Connected**: operational
//! - **Unhealthy**: the server process is there but failed a liveness
//!   probe; functional calls are still accepted, a successful probe
//!   restores Connected
//!
//! # State Transitions
//!
//! ```text
//! Disconnected → Connecting → Connected ⇄ Unhealthy
//!                      ↓           ↓          ↓
//!                Disconnected  Disconnected  Disconnected
//! ```
//!
//! Unhealthy is deliberately distinct from Disconnected: a process
//! that stops answering probes has not gone away, and tearing down its
//! pipes would destroy in-flight work that may still complete.

use tokio::sync::watch;

/// Connection state of a transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Successfully connected
    Connected,
    /// Connected but failing liveness probes
    Unhealthy,
}

/// Publishes state transitions through a watch channel
///
/// The sender half lives inside the transport; observers get
/// [`watch::Receiver`]s via [`StateTracker::subscribe`]. A late
/// subscriber immediately sees the current value, and a receiver
/// awaiting `changed()` observes transitions in the order they occur.
#[derive(Debug)]
pub struct StateTracker {
    tx: watch::Sender<ConnectionState>,
}

impl StateTracker {
    /// Create a tracker starting in `Disconnected`
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self { tx }
    }

    /// Get the current state
    pub fn current(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Subscribe to state changes; the receiver starts at the current value
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Publish a new state
    ///
    /// `send_replace` never blocks and succeeds with or without
    /// receivers, so a transport can transition freely even when
    /// nobody is watching.
    pub fn set(&self, state: ConnectionState) {
        self.tx.send_replace(state);
    }

    /// Transition to `Connecting`
    pub fn connecting(&self) {
        self.set(ConnectionState::Connecting);
    }

    /// Transition to `Connected`
    pub fn connected(&self) {
        self.set(ConnectionState::Connected);
    }

    /// Transition to `Disconnected`
    pub fn disconnected(&self) {
        self.set(ConnectionState::Disconnected);
    }

    /// Transition to `Unhealthy`
    pub fn unhealthy(&self) {
        self.set(ConnectionState::Unhealthy);
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}
