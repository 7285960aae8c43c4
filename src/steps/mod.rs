//! Concrete wizard steps and their screen templates

pub mod ams_identify;
pub mod summary;
pub mod welcome;

use crate::error::Result;
use crate::screen::{ScreenTable, ScreenTemplate};
use crate::step::WizardStep;
use crate::step_registry::StepRegistry;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;
use strum::{Display, EnumIter, EnumString};

pub use ams_identify::AmsIdentifyStep;
pub use summary::SummaryStep;
pub use welcome::WelcomeStep;

/// Template id of the keyboard help overlay
pub const HELP_OVERLAY: &str = "help_overlay";

/// Step types the wizard can be assembled from
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Welcome,
    AmsIdentify,
    Summary,
}

impl StepKind {
    /// Registry key of the step
    pub const fn step_name(self) -> &'static str {
        match self {
            Self::Welcome => welcome::NAME,
            Self::AmsIdentify => ams_identify::NAME,
            Self::Summary => summary::NAME,
        }
    }

    /// welcome → ams_identify → summary
    pub fn default_order() -> Vec<StepKind> {
        vec![Self::Welcome, Self::AmsIdentify, Self::Summary]
    }
}

fn erase<S: WizardStep + 'static>(step: Rc<RefCell<S>>) -> Rc<RefCell<dyn WizardStep>> {
    step
}

/// Look up (or lazily build) the singleton for `kind`
pub fn get_step(registry: &mut StepRegistry, kind: StepKind) -> Result<Rc<RefCell<dyn WizardStep>>> {
    let name = kind.step_name();
    Ok(match kind {
        StepKind::Welcome => erase(registry.get_or_create(name, WelcomeStep::new)?),
        StepKind::AmsIdentify => erase(registry.get_or_create(name, AmsIdentifyStep::new)?),
        StepKind::Summary => erase(registry.get_or_create(name, SummaryStep::new)?),
    })
}

fn help_template() -> ScreenTemplate {
    ScreenTemplate::new("Help")
        .label("help_next", "Enter / →   next step")
        .label("help_back", "Backspace / ←   previous step")
        .label("help_confirm", "c   confirm")
        .label("help_close", "Esc   close this overlay")
        .label("help_quit", "q   quit")
}

/// Register every template the wizard can instantiate
pub fn register_templates(screens: &mut ScreenTable) -> Result<()> {
    screens.register_template(welcome::TEMPLATE, welcome::template())?;
    screens.register_template(ams_identify::TEMPLATE, ams_identify::template())?;
    screens.register_template(summary::TEMPLATE, summary::template())?;
    screens.register_template(HELP_OVERLAY, help_template())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_step_kind_names() {
        assert_eq!(StepKind::AmsIdentify.to_string(), "ams_identify");
        assert_eq!("summary".parse::<StepKind>().unwrap(), StepKind::Summary);
        assert_eq!(StepKind::iter().count(), StepKind::default_order().len());
    }

    #[test]
    fn test_get_step_matches_registry_name() {
        let mut registry = StepRegistry::new();
        for kind in StepKind::iter() {
            let step = get_step(&mut registry, kind).unwrap();
            assert_eq!(step.borrow().name(), kind.step_name());
            assert!(registry.contains(kind.step_name()));
        }
        let again = get_step(&mut registry, StepKind::Welcome).unwrap();
        assert_eq!(Rc::strong_count(&again), 3);
    }

    #[test]
    fn test_templates_register() {
        let mut screens = ScreenTable::new();
        register_templates(&mut screens).unwrap();
        for id in [welcome::TEMPLATE, ams_identify::TEMPLATE, summary::TEMPLATE, HELP_OVERLAY] {
            assert!(screens.has_template(id));
        }
    }
}
