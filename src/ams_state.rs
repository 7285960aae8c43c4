//! Backend registry: zero or one active AMS backend
//!
//! Hardware probing is the only writer. Wizard steps read through
//! [`AmsState::get_backend`], whose borrow cannot outlive a replacement:
//! `set_backend` needs `&mut self`, so the borrow checker rejects any step
//! that tries to keep a backend reference across a probing cycle.

use crate::backend::AmsBackend;
use crate::types::AmsType;
use std::fmt;

/// What the registry knows about attached hardware.
///
/// "Not probed yet" and "probed, nothing there" look the same to
/// `should_skip`, but diagnostics can tell them apart here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendPresence {
    /// Probing has not completed yet
    NotProbed,
    /// Probing completed and found no backend to register
    ProbedAbsent,
    /// A backend is registered (its type may still be `None`)
    Present(AmsType),
}

impl fmt::Display for BackendPresence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotProbed => write!(f, "not probed"),
            Self::ProbedAbsent => write!(f, "probed, absent"),
            Self::Present(ty) => write!(f, "present ({})", ty),
        }
    }
}

/// Owner of the active backend
#[derive(Debug, Default)]
pub struct AmsState {
    backend: Option<AmsBackend>,
    probed: bool,
    generation: u64,
}

impl AmsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly probed backend, dropping the previous one.
    pub fn set_backend(&mut self, backend: AmsBackend) {
        tracing::info!(
            "AMS backend set: {} (generation {})",
            backend.get_type(),
            self.generation + 1
        );
        self.backend = Some(backend);
        self.probed = true;
        self.generation += 1;
    }

    /// Drop the active backend and return to the "not probed" state.
    pub fn clear_backend(&mut self) {
        if self.backend.take().is_some() {
            tracing::debug!("AMS backend cleared");
        }
        self.probed = false;
        self.generation += 1;
    }

    /// Probing finished without producing a backend.
    pub fn mark_probed_absent(&mut self) {
        self.backend = None;
        self.probed = true;
        self.generation += 1;
    }

    /// Borrow the active backend for the duration of one call.
    pub fn get_backend(&self) -> Option<&AmsBackend> {
        self.backend.as_ref()
    }

    /// Mutable access for the probing side (topology updates).
    pub fn backend_mut(&mut self) -> Option<&mut AmsBackend> {
        self.backend.as_mut()
    }

    pub fn presence(&self) -> BackendPresence {
        match (&self.backend, self.probed) {
            (Some(backend), _) => BackendPresence::Present(backend.get_type()),
            (None, true) => BackendPresence::ProbedAbsent,
            (None, false) => BackendPresence::NotProbed,
        }
    }

    /// True if a backend is registered and its type is not `None`
    pub fn is_available(&self) -> bool {
        self.backend
            .as_ref()
            .is_some_and(|b| b.get_type().is_present())
    }

    /// Bumped on every registry write
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AfcBackend, AfcUnit};

    fn afc() -> AmsBackend {
        AmsBackend::Afc(AfcBackend::new(vec![AfcUnit {
            name: "Turtle_1".to_string(),
            lanes: 4,
        }]))
    }

    #[test]
    fn test_new_state_is_not_probed() {
        let state = AmsState::new();
        assert!(state.get_backend().is_none());
        assert_eq!(state.presence(), BackendPresence::NotProbed);
        assert!(!state.is_available());
        assert_eq!(state.generation(), 0);
    }

    #[test]
    fn test_none_typed_backend_is_present_but_unavailable() {
        let mut state = AmsState::new();
        state.set_backend(AmsBackend::None);
        assert!(state.get_backend().is_some());
        assert_eq!(state.presence(), BackendPresence::Present(AmsType::None));
        assert!(!state.is_available());
    }

    #[test]
    fn test_replacing_backend_bumps_generation() {
        let mut state = AmsState::new();
        state.set_backend(AmsBackend::None);
        let first = state.generation();
        state.set_backend(afc());
        assert!(state.generation() > first);
        assert_eq!(state.get_backend().map(|b| b.get_type()), Some(AmsType::Afc));
        assert!(state.is_available());
    }

    #[test]
    fn test_probed_absent_differs_from_not_probed() {
        let mut state = AmsState::new();
        state.mark_probed_absent();
        assert_eq!(state.presence(), BackendPresence::ProbedAbsent);
        state.clear_backend();
        assert_eq!(state.presence(), BackendPresence::NotProbed);
    }

    #[test]
    fn test_presence_display() {
        assert_eq!(BackendPresence::NotProbed.to_string(), "not probed");
        assert_eq!(
            BackendPresence::Present(AmsType::Afc).to_string(),
            "present (afc)"
        );
    }
}
