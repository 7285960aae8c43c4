//! Final screen. The user must confirm before the wizard completes.

use crate::ams_state::AmsState;
use crate::error::Result;
use crate::screen::{ScreenHandle, ScreenTemplate};
use crate::step::{StepContext, StepCore, StepLifecycle, WizardStep};
use crate::steps::ams_identify::{get_ams_details, get_ams_type_name};

pub const NAME: &str = "WizardSummaryStep";
pub const TEMPLATE: &str = "wizard_summary";
pub const AMS_LABEL: &str = "summary_ams_label";
pub const HINT_LABEL: &str = "summary_hint_label";

pub fn template() -> ScreenTemplate {
    ScreenTemplate::new("Setup Summary")
        .label(AMS_LABEL, "")
        .label(HINT_LABEL, "")
}

/// One-line AMS summary for the final screen
pub fn ams_summary(ams: &AmsState) -> String {
    if ams.is_available() {
        format!("Filament system: {}, {}", get_ams_type_name(ams), get_ams_details(ams))
    } else {
        "Filament system: none".to_string()
    }
}

#[derive(Debug, Clone)]
pub struct SummaryStep {
    core: StepCore,
    confirmed: bool,
}

impl Default for SummaryStep {
    fn default() -> Self {
        Self::new()
    }
}

impl SummaryStep {
    pub fn new() -> Self {
        Self {
            core: StepCore::new(NAME),
            confirmed: false,
        }
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// User acknowledged the summary. Ignored unless the screen is showing.
    pub fn acknowledge(&mut self) {
        if self.core.is_active() {
            tracing::debug!("[{}] Summary confirmed", NAME);
            self.confirmed = true;
        }
    }

    fn hint(&self) -> &'static str {
        if self.confirmed {
            "Confirmed. Press Next to finish."
        } else {
            "Press Confirm if this looks right."
        }
    }
}

impl WizardStep for SummaryStep {
    fn name(&self) -> &'static str {
        NAME
    }

    fn lifecycle(&self) -> StepLifecycle {
        self.core.lifecycle()
    }

    fn init_subjects(&mut self) {
        if self.core.init_subjects() {
            self.confirmed = false;
        }
    }

    fn create(&mut self, ctx: &mut StepContext<'_>, parent: ScreenHandle) -> Result<ScreenHandle> {
        let screen = self.core.create_screen(ctx.ui, parent, TEMPLATE)?;
        // Every visit asks again
        self.confirmed = false;
        self.update_display(ctx);
        Ok(screen)
    }

    fn update_display(&mut self, ctx: &mut StepContext<'_>) {
        if !self.core.is_active() {
            return;
        }
        self.core.set_label(ctx.ui, AMS_LABEL, &ams_summary(ctx.ams));
        self.core.set_label(ctx.ui, HINT_LABEL, self.hint());
    }

    fn is_validated(&self) -> bool {
        self.confirmed
    }

    fn confirm(&mut self) {
        self.acknowledge();
    }

    fn cleanup(&mut self) {
        self.core.cleanup();
    }

    fn teardown(&mut self) {
        self.core.teardown();
        self.confirmed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AfcBackend, AfcUnit, AmsBackend};
    use crate::screen::ScreenTable;

    #[test]
    fn test_requires_confirmation_each_visit() {
        let mut ui = ScreenTable::new();
        ui.register_template(TEMPLATE, template()).unwrap();
        let root = ui.root();
        let ams = AmsState::new();
        let mut step = SummaryStep::new();

        step.confirm();
        assert!(!step.is_validated(), "confirm before create is ignored");

        {
            let mut ctx = StepContext { ams: &ams, ui: &mut ui };
            step.create(&mut ctx, root).unwrap();
        }
        assert!(!step.is_validated());
        step.confirm();
        assert!(step.is_validated());

        step.cleanup();
        let mut ctx = StepContext { ams: &ams, ui: &mut ui };
        step.create(&mut ctx, root).unwrap();
        assert!(!step.is_validated());
    }

    #[test]
    fn test_ams_summary() {
        let mut ams = AmsState::new();
        assert_eq!(ams_summary(&ams), "Filament system: none");

        ams.set_backend(AmsBackend::Afc(AfcBackend::new(vec![AfcUnit {
            name: "Turtle_1".to_string(),
            lanes: 4,
        }])));
        assert_eq!(
            ams_summary(&ams),
            "Filament system: AFC (Armored Turtle), 4 lanes detected"
        );
    }
}
