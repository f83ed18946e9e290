//! Session lifecycle state machine
//!
//! ```text
//! NoSession ──register──► DeviceRegistered ──create──► SessionActive
//!     ▲                                                     │
//!     └──────────────── authentication failure ─────────────┘
//! ```
//!
//! Transitions carry the generation observed when an establishment started;
//! an invalidation bumps the generation so a late establishment result can
//! not resurrect a session that was already reset.

use banklink_domain::{impl_domain_status_conversions, SessionToken};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    NoSession,
    DeviceRegistered,
    SessionActive,
}

impl_domain_status_conversions!(SessionPhase {
    NoSession => "no_session",
    DeviceRegistered => "device_registered",
    SessionActive => "session_active",
});

#[derive(Debug, Clone)]
pub struct SessionState {
    phase: SessionPhase,
    token: Option<SessionToken>,
    generation: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self { phase: SessionPhase::NoSession, token: None, generation: 0 }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_device_registered(&self) -> bool {
        self.phase != SessionPhase::NoSession
    }

    /// Record a successful device registration.
    ///
    /// Returns `false` (and changes nothing) when the state was reset since
    /// `generation` was observed.
    pub fn mark_device_registered(&mut self, generation: u64) -> bool {
        if generation != self.generation {
            return false;
        }
        if self.phase == SessionPhase::NoSession {
            self.phase = SessionPhase::DeviceRegistered;
        }
        true
    }

    /// Record a freshly created session.
    pub fn activate(&mut self, generation: u64, token: SessionToken) -> bool {
        if generation != self.generation {
            return false;
        }
        self.phase = SessionPhase::SessionActive;
        self.token = Some(token);
        true
    }

    /// Drop the session unconditionally.
    pub fn invalidate(&mut self) {
        self.phase = SessionPhase::NoSession;
        self.token = None;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Drop the session only if `token` is still the active one. A request
    /// that failed with an older token must not discard a newer session.
    pub fn invalidate_token(&mut self, token: &SessionToken) -> bool {
        if self.token.as_ref() == Some(token) {
            self.invalidate();
            true
        } else {
            false
        }
    }
}
