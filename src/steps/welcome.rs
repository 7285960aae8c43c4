//! First screen of the wizard. Always shown.

use crate::ams_state::{AmsState, BackendPresence};
use crate::error::Result;
use crate::screen::{ScreenHandle, ScreenTemplate};
use crate::step::{StepContext, StepCore, StepLifecycle, WizardStep};

pub const NAME: &str = "WizardWelcomeStep";
pub const TEMPLATE: &str = "wizard_welcome";
pub const STATUS_LABEL: &str = "hardware_status_label";

pub fn template() -> ScreenTemplate {
    ScreenTemplate::new("Welcome")
        .label(
            "welcome_body_label",
            "This wizard sets up your printer's filament handling.",
        )
        .label(STATUS_LABEL, "")
}

/// Hardware discovery line shown under the welcome text
pub fn discovery_status(ams: &AmsState) -> &'static str {
    match ams.presence() {
        BackendPresence::NotProbed => "Looking for filament hardware...",
        BackendPresence::ProbedAbsent => "No filament system found",
        BackendPresence::Present(ty) if ty.is_present() => "Filament system found",
        BackendPresence::Present(_) => "No filament system found",
    }
}

#[derive(Debug, Clone)]
pub struct WelcomeStep {
    core: StepCore,
}

impl Default for WelcomeStep {
    fn default() -> Self {
        Self::new()
    }
}

impl WelcomeStep {
    pub fn new() -> Self {
        Self {
            core: StepCore::new(NAME),
        }
    }
}

impl WizardStep for WelcomeStep {
    fn name(&self) -> &'static str {
        NAME
    }

    fn lifecycle(&self) -> StepLifecycle {
        self.core.lifecycle()
    }

    fn init_subjects(&mut self) {
        self.core.init_subjects();
    }

    fn create(&mut self, ctx: &mut StepContext<'_>, parent: ScreenHandle) -> Result<ScreenHandle> {
        let screen = self.core.create_screen(ctx.ui, parent, TEMPLATE)?;
        self.update_display(ctx);
        Ok(screen)
    }

    fn update_display(&mut self, ctx: &mut StepContext<'_>) {
        if self.core.is_active() {
            self.core.set_label(ctx.ui, STATUS_LABEL, discovery_status(ctx.ams));
        }
    }

    fn cleanup(&mut self) {
        self.core.cleanup();
    }

    fn teardown(&mut self) {
        self.core.teardown();
    }
}
