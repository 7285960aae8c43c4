//! Wizard step contract and shared lifecycle bookkeeping
//!
//! Every screen in the wizard is a [`WizardStep`]. The controller drives it
//! through a fixed protocol:
//!
//! ```text
//! Constructed
//!     ↓ init_subjects (once)
//! SubjectsInitialized
//!     ↓ create
//! Active  ←──────────┐   update_display any number of times
//!     ↓ cleanup      │
//! Cleaned ───create──┘   revisit path
//! ```
//!
//! A step never owns its screen. The container passed to `create` owns it,
//! and the step keeps only a handle that is valid between `create` and
//! `cleanup`. [`ScreenSlot`] is the checked accessor for that handle.

use crate::ams_state::AmsState;
use crate::error::{Result, WizardError};
use crate::screen::{ScreenBuilder, ScreenHandle};
use std::fmt;

/// Lifecycle position of a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepLifecycle {
    /// No subjects, no screen
    Constructed,
    /// Data bindings ready, no screen yet
    SubjectsInitialized,
    /// Screen exists and is displayed
    Active,
    /// Screen released; may become Active again
    Cleaned,
}

impl StepLifecycle {
    pub const fn description(self) -> &'static str {
        match self {
            Self::Constructed => "constructed",
            Self::SubjectsInitialized => "subjects initialized",
            Self::Active => "active",
            Self::Cleaned => "cleaned",
        }
    }
}

impl fmt::Display for StepLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Everything a step may touch during one call.
///
/// Both borrows end when the call returns, so a step cannot hold on to a
/// backend across a probing cycle.
pub struct StepContext<'a> {
    pub ams: &'a AmsState,
    pub ui: &'a mut dyn ScreenBuilder,
}

/// Contract between the controller and each wizard screen
pub trait WizardStep {
    /// Stable identity, also the step registry key
    fn name(&self) -> &'static str;

    fn lifecycle(&self) -> StepLifecycle;

    /// Prepare data bindings. Idempotent; runs before the first `create`.
    fn init_subjects(&mut self);

    /// Hook up event callbacks. Runs once, after `init_subjects`.
    fn register_callbacks(&mut self) {}

    /// Evaluated before every visit; never cached.
    fn should_skip(&self, _ams: &AmsState) -> bool {
        false
    }

    /// Build the screen under `parent` and fill it in.
    fn create(&mut self, ctx: &mut StepContext<'_>, parent: ScreenHandle) -> Result<ScreenHandle>;

    /// Refresh display fields. No-op unless Active.
    fn update_display(&mut self, ctx: &mut StepContext<'_>);

    /// Whether the controller may advance past this step
    fn is_validated(&self) -> bool {
        true
    }

    /// Primary user action on this screen (e.g. a confirm button)
    fn confirm(&mut self) {}

    /// Release the screen handle. Never deletes the screen itself.
    fn cleanup(&mut self);

    /// Registry teardown at shutdown. Must not log or touch rendering.
    fn teardown(&mut self);
}

/// Non-owning screen handle, valid only between create and cleanup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenSlot {
    handle: Option<ScreenHandle>,
}

impl ScreenSlot {
    pub fn is_set(&self) -> bool {
        self.handle.is_some()
    }

    /// Checked access. Fails loudly outside the create/cleanup window or
    /// when the owning container has already deleted the screen.
    pub fn get(&self, step: &str, ui: &dyn ScreenBuilder) -> Result<ScreenHandle> {
        match self.handle {
            Some(handle) if ui.is_alive(handle) => Ok(handle),
            Some(_) => {
                tracing::error!("[{}] Screen was deleted while the step was active", step);
                Err(WizardError::stale_screen(step))
            }
            None => {
                tracing::error!("[{}] Screen accessed outside create/cleanup", step);
                Err(WizardError::stale_screen(step))
            }
        }
    }

    fn set(&mut self, handle: ScreenHandle) {
        self.handle = Some(handle);
    }

    fn release(&mut self) -> Option<ScreenHandle> {
        self.handle.take()
    }
}

/// Lifecycle state shared by the concrete steps
#[derive(Debug, Clone)]
pub struct StepCore {
    name: &'static str,
    lifecycle: StepLifecycle,
    screen: ScreenSlot,
}

impl StepCore {
    pub fn new(name: &'static str) -> Self {
        tracing::debug!("[{}] Instance created", name);
        Self {
            name,
            lifecycle: StepLifecycle::Constructed,
            screen: ScreenSlot::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn lifecycle(&self) -> StepLifecycle {
        self.lifecycle
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle == StepLifecycle::Active
    }

    /// Returns true the first time only
    pub fn init_subjects(&mut self) -> bool {
        if self.lifecycle != StepLifecycle::Constructed {
            return false;
        }
        self.lifecycle = StepLifecycle::SubjectsInitialized;
        true
    }

    /// Checked accessor for the current screen
    pub fn screen(&self, ui: &dyn ScreenBuilder) -> Result<ScreenHandle> {
        self.screen.get(self.name, ui)
    }

    /// Instantiate `template_id` for this step.
    ///
    /// Self-heals a missing `cleanup` with a warning instead of building a
    /// second screen on top of a leaked handle. On failure the step is left
    /// in a non-Active state and the error is returned to the caller.
    pub fn create_screen(
        &mut self,
        ui: &mut dyn ScreenBuilder,
        parent: ScreenHandle,
        template_id: &str,
    ) -> Result<ScreenHandle> {
        if self.lifecycle == StepLifecycle::Constructed {
            tracing::debug!("[{}] create before init_subjects, initializing now", self.name);
            self.init_subjects();
        }

        if self.screen.is_set() || self.is_active() {
            tracing::warn!(
                "[{}] Screen handle not released - cleanup may not have been called properly",
                self.name
            );
            // The container that owns the old screen deletes it, not us.
            self.screen.release();
            self.lifecycle = StepLifecycle::Cleaned;
        }

        match ui.create_from_template(parent, template_id) {
            Ok(handle) => {
                self.screen.set(handle);
                self.lifecycle = StepLifecycle::Active;
                Ok(handle)
            }
            Err(e) => {
                tracing::error!("[{}] Failed to create screen '{}': {}", self.name, template_id, e);
                Err(e)
            }
        }
    }

    /// Set a named label's text if the label exists on the current screen
    pub fn set_label(&self, ui: &mut dyn ScreenBuilder, label: &str, text: &str) -> bool {
        let Ok(screen) = self.screen(&*ui) else {
            return false;
        };
        match ui.find_named_child(screen, label) {
            Some(handle) => {
                ui.set_label_text(handle, text);
                tracing::debug!("[{}] Set {}: {}", self.name, label, text);
                true
            }
            None => {
                tracing::debug!("[{}] Label '{}' not found on screen", self.name, label);
                false
            }
        }
    }

    /// Release the screen handle (controller-driven cleanup)
    pub fn cleanup(&mut self) {
        if self.screen.release().is_none() && !self.is_active() {
            tracing::debug!("[{}] cleanup with no active screen", self.name);
            return;
        }
        self.lifecycle = StepLifecycle::Cleaned;
        tracing::debug!("[{}] Cleanup complete", self.name);
    }

    /// Silent reset for registry teardown
    pub fn teardown(&mut self) {
        self.screen.release();
        if self.lifecycle == StepLifecycle::Active {
            self.lifecycle = StepLifecycle::Cleaned;
        }
    }
}
