//! AMS identification step
//!
//! Display-only screen that tells the user which filament system was
//! detected and how many lanes it reports. Skipped entirely when there is
//! nothing to show.

use crate::ams_state::AmsState;
use crate::error::Result;
use crate::screen::{ScreenHandle, ScreenTemplate};
use crate::step::{StepContext, StepCore, StepLifecycle, WizardStep};
use crate::types::AmsType;

pub const NAME: &str = "WizardAmsIdentifyStep";
pub const TEMPLATE: &str = "wizard_ams_identify";
pub const TYPE_LABEL: &str = "ams_type_label";
pub const DETAILS_LABEL: &str = "ams_details_label";

/// Layout of the identify screen
pub fn template() -> ScreenTemplate {
    ScreenTemplate::new("Filament System Detected")
        .label("ams_intro_label", "Your printer reported this filament system:")
        .label(TYPE_LABEL, "")
        .label(DETAILS_LABEL, "")
}

/// Fixed display name for each hardware family
pub fn type_display_name(ams_type: AmsType) -> &'static str {
    match ams_type {
        AmsType::Afc => "AFC (Armored Turtle)",
        AmsType::HappyHare => "Happy Hare MMU",
        AmsType::ValgAce => "ValgACE (ACE Pro)",
        AmsType::ToolChanger => "Tool Changer",
        AmsType::None => "Unknown",
    }
}

/// Topology line. A zero count means "not reported yet", not "no lanes".
pub fn lanes_summary(total_slots: u32) -> String {
    if total_slots > 0 {
        format!("{} lanes detected", total_slots)
    } else {
        "System detected".to_string()
    }
}

/// Type label for whatever backend is registered right now
pub fn get_ams_type_name(ams: &AmsState) -> &'static str {
    ams.get_backend()
        .map(|backend| type_display_name(backend.get_type()))
        .unwrap_or("Unknown")
}

/// Details label for whatever backend is registered right now
pub fn get_ams_details(ams: &AmsState) -> String {
    match ams.get_backend() {
        Some(backend) => lanes_summary(backend.total_slots()),
        None => lanes_summary(0),
    }
}

/// The AMS identification step
#[derive(Debug, Clone)]
pub struct AmsIdentifyStep {
    core: StepCore,
}

impl Default for AmsIdentifyStep {
    fn default() -> Self {
        Self::new()
    }
}

impl AmsIdentifyStep {
    pub fn new() -> Self {
        Self {
            core: StepCore::new(NAME),
        }
    }
}

impl WizardStep for AmsIdentifyStep {
    fn name(&self) -> &'static str {
        NAME
    }

    fn lifecycle(&self) -> StepLifecycle {
        self.core.lifecycle()
    }

    fn init_subjects(&mut self) {
        if self.core.init_subjects() {
            tracing::debug!("[{}] Initializing subjects (no-op)", NAME);
        }
    }

    fn register_callbacks(&mut self) {
        tracing::debug!("[{}] Register callbacks (no-op)", NAME);
    }

    fn should_skip(&self, ams: &AmsState) -> bool {
        let Some(backend) = ams.get_backend() else {
            tracing::debug!("[{}] No AMS backend, skipping step", NAME);
            return true;
        };

        match backend.get_type() {
            AmsType::None => {
                tracing::info!("[{}] No AMS detected (type=none), skipping step", NAME);
                true
            }
            ty @ (AmsType::Afc | AmsType::HappyHare | AmsType::ValgAce | AmsType::ToolChanger) => {
                tracing::debug!("[{}] AMS detected (type={}), showing step", NAME, ty);
                false
            }
        }
    }

    fn create(&mut self, ctx: &mut StepContext<'_>, parent: ScreenHandle) -> Result<ScreenHandle> {
        tracing::debug!("[{}] Creating AMS identify screen", NAME);
        let screen = self.core.create_screen(ctx.ui, parent, TEMPLATE)?;
        self.update_display(ctx);
        tracing::debug!("[{}] Screen created successfully", NAME);
        Ok(screen)
    }

    fn update_display(&mut self, ctx: &mut StepContext<'_>) {
        if !self.core.is_active() {
            return;
        }
        let type_name = get_ams_type_name(ctx.ams);
        let details = get_ams_details(ctx.ams);
        self.core.set_label(ctx.ui, TYPE_LABEL, type_name);
        self.core.set_label(ctx.ui, DETAILS_LABEL, &details);
    }

    fn is_validated(&self) -> bool {
        // Nothing to fill in on this screen
        true
    }

    fn cleanup(&mut self) {
        tracing::debug!("[{}] Cleaning up resources", NAME);
        self.core.cleanup();
    }

    fn teardown(&mut self) {
        self.core.teardown();
    }
}
