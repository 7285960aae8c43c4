//! Wizard Controller
//!
//! Sequences the configured steps and owns the display container their
//! screens are built in. All state lives in an explicit [`WizardContext`]
//! that the caller passes in; nothing here is global.
//!
//! # Step protocol
//!
//! - `should_skip` is evaluated every time a step is reached, in the
//!   direction of travel. Skipped steps are passed over.
//! - `init_subjects` and `register_callbacks` run once per step, before its
//!   first `create`.
//! - Leaving a step calls its `cleanup`, then the controller clears the
//!   container. The step never deletes its own screen.
//! - `next` refuses to advance while the current step is not validated.
//! - A construction failure leaves no Active step, records a user-visible
//!   message in `last_error`, and returns the error. The following `next`
//!   builds that step again instead of moving past it.

use crate::ams_state::AmsState;
use crate::error::{Result, WizardError};
use crate::navigation::{NavigationHistory, ScreenContext};
use crate::screen::{ScreenBuilder, ScreenHandle, ScreenTable};
use crate::step::{StepContext, StepLifecycle, WizardStep};
use crate::step_registry::StepRegistry;
use crate::steps::{self, StepKind};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Name of the container wizard screens are built in
pub const CONTENT_CONTAINER: &str = "wizard_content";

/// Long-lived state shared by the wizard and the rest of the UI
#[derive(Debug)]
pub struct WizardContext {
    pub ams: AmsState,
    pub steps: StepRegistry,
    pub nav: NavigationHistory<ScreenContext>,
    pub screens: ScreenTable,
}

impl WizardContext {
    /// Fresh context with every wizard template registered
    pub fn new() -> Result<Self> {
        let mut screens = ScreenTable::new();
        steps::register_templates(&mut screens)?;
        Ok(Self {
            ams: AmsState::new(),
            steps: StepRegistry::new(),
            nav: NavigationHistory::default(),
            screens,
        })
    }

    /// Build `template_id` as an overlay on the root and push it
    pub fn show_overlay(&mut self, template_id: &str) -> Result<ScreenHandle> {
        let root = self.screens.root();
        let overlay = self.screens.create_from_template(root, template_id)?;
        self.nav.push_overlay(ScreenContext::Overlay(overlay));
        Ok(overlay)
    }

    /// Close the topmost overlay. False when none is open.
    pub fn dismiss_overlay(&mut self) -> bool {
        match self.nav.pop_context() {
            Some(dismissed) => {
                self.delete_overlay(dismissed);
                true
            }
            None => false,
        }
    }

    /// Connection loss: close every overlay and return to the base panel
    pub fn reset_navigation(&mut self) {
        for dismissed in self.nav.clear() {
            self.delete_overlay(dismissed);
        }
    }

    fn delete_overlay(&mut self, context: ScreenContext) {
        if let ScreenContext::Overlay(handle) = context {
            self.screens.delete(handle);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Drives an ordered list of steps
pub struct WizardController {
    steps: Vec<Rc<RefCell<dyn WizardStep>>>,
    prepared: Vec<bool>,
    current: Option<usize>,
    container: Option<ScreenHandle>,
    active: bool,
    completed: bool,
    last_error: Option<String>,
    on_complete: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for WizardController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardController")
            .field("steps", &self.step_names())
            .field("current", &self.current)
            .field("active", &self.active)
            .field("completed", &self.completed)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl WizardController {
    /// Controller over `kinds`, with step instances taken from the registry
    pub fn new(ctx: &mut WizardContext, kinds: &[StepKind]) -> Result<Self> {
        let steps = kinds
            .iter()
            .map(|kind| steps::get_step(&mut ctx.steps, *kind))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::with_steps(steps))
    }

    /// Controller over already constructed steps
    pub fn with_steps(steps: Vec<Rc<RefCell<dyn WizardStep>>>) -> Self {
        let prepared = vec![false; steps.len()];
        Self {
            steps,
            prepared,
            current: None,
            container: None,
            active: false,
            completed: false,
            last_error: None,
            on_complete: None,
        }
    }

    /// Callback run once when the wizard completes
    pub fn set_on_complete(&mut self, f: impl FnOnce() + 'static) {
        self.on_complete = Some(Box::new(f));
    }

    /// Show the first visible step
    pub fn start(&mut self, ctx: &mut WizardContext) -> Result<()> {
        if self.steps.is_empty() {
            return Err(WizardError::navigation("wizard has no steps"));
        }
        self.leave_current(ctx);
        self.ensure_container(ctx)?;
        self.active = true;
        self.completed = false;
        self.last_error = None;
        tracing::info!("Starting wizard with {} step(s)", self.steps.len());

        match self.find_visible(&ctx.ams, 0, Direction::Forward) {
            Some(index) => self.show(ctx, index),
            None => {
                tracing::info!("Every step skipped, nothing to show");
                self.complete(ctx);
                Ok(())
            }
        }
    }

    /// Advance to the next visible step, completing after the last one
    pub fn next(&mut self, ctx: &mut WizardContext) -> Result<()> {
        let current = self.require_active()?;
        let from = {
            let step = self.steps[current].borrow();
            if step.lifecycle() != StepLifecycle::Active {
                // Never shown: build it again unless it is now skipped
                tracing::debug!("[{}] Not on screen, retrying", step.name());
                current
            } else if !step.is_validated() {
                tracing::debug!("[{}] Not validated, staying", step.name());
                return Err(WizardError::validation(
                    "Confirm this screen before continuing",
                ));
            } else {
                current + 1
            }
        };

        match self.find_visible(&ctx.ams, from, Direction::Forward) {
            Some(index) => self.show(ctx, index),
            None => {
                self.complete(ctx);
                Ok(())
            }
        }
    }

    /// Return to the previous visible step. Ok(false) when there is none.
    pub fn back(&mut self, ctx: &mut WizardContext) -> Result<bool> {
        let current = self.require_active()?;
        let Some(start) = current.checked_sub(1) else {
            return Ok(false);
        };
        match self.find_visible(&ctx.ams, start, Direction::Backward) {
            Some(index) => {
                self.show(ctx, index)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Jump straight to step `index`. Skipped steps cannot be targeted.
    pub fn goto_step(&mut self, ctx: &mut WizardContext, index: usize) -> Result<()> {
        self.require_active()?;
        let Some(step) = self.steps.get(index) else {
            return Err(WizardError::navigation(format!(
                "step index {} out of range (0..{})",
                index,
                self.steps.len()
            )));
        };
        if step.borrow().should_skip(&ctx.ams) {
            return Err(WizardError::navigation(format!(
                "{} is skipped for this printer",
                step.borrow().name()
            )));
        }
        self.show(ctx, index)
    }

    /// Finish the wizard and run the completion callback
    pub fn complete(&mut self, ctx: &mut WizardContext) {
        self.leave_current(ctx);
        self.current = None;
        self.active = false;
        self.completed = true;
        tracing::info!("Wizard complete");
        if let Some(on_complete) = self.on_complete.take() {
            on_complete();
        }
    }

    /// Tear the wizard UI down without completing
    pub fn hide(&mut self, ctx: &mut WizardContext) {
        self.leave_current(ctx);
        self.current = None;
        self.active = false;
        tracing::debug!("Wizard hidden");
    }

    /// Primary action on the current screen
    pub fn confirm_current(&mut self, ctx: &mut WizardContext) -> Result<()> {
        let current = self.require_active()?;
        let mut step = self.steps[current].borrow_mut();
        step.confirm();
        let mut step_ctx = StepContext {
            ams: &ctx.ams,
            ui: &mut ctx.screens,
        };
        step.update_display(&mut step_ctx);
        Ok(())
    }

    /// Re-render the current step after the hardware picture changed
    pub fn refresh(&mut self, ctx: &mut WizardContext) {
        let Some(current) = self.current else {
            return;
        };
        let mut step_ctx = StepContext {
            ams: &ctx.ams,
            ui: &mut ctx.screens,
        };
        self.steps[current].borrow_mut().update_display(&mut step_ctx);
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current_step_name(&self) -> Option<&'static str> {
        self.current.map(|i| self.steps[i].borrow().name())
    }

    /// User-facing message of the last construction failure
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.borrow().name()).collect()
    }

    pub fn container(&self) -> Option<ScreenHandle> {
        self.container
    }

    /// (1-based position among visible steps, visible step count)
    pub fn progress(&self, ams: &AmsState) -> Option<(usize, usize)> {
        let current = self.current?;
        let mut position = 0;
        let mut total = 0;
        for (i, step) in self.steps.iter().enumerate() {
            if i == current || !step.borrow().should_skip(ams) {
                total += 1;
                if i <= current {
                    position += 1;
                }
            }
        }
        Some((position, total))
    }

    /// Display lines of whatever is in the wizard container
    pub fn render(&self, ctx: &WizardContext) -> Vec<String> {
        self.container
            .map(|c| ctx.screens.render_text(c))
            .unwrap_or_default()
    }

    fn require_active(&self) -> Result<usize> {
        match (self.active, self.current) {
            (true, Some(current)) => Ok(current),
            _ => Err(WizardError::navigation("wizard is not active")),
        }
    }

    fn ensure_container(&mut self, ctx: &mut WizardContext) -> Result<ScreenHandle> {
        if let Some(container) = self.container.filter(|c| ctx.screens.is_alive(*c)) {
            return Ok(container);
        }
        let root = ctx.screens.root();
        let container = ctx.screens.create_container(root, CONTENT_CONTAINER)?;
        self.container = Some(container);
        Ok(container)
    }

    fn find_visible(&self, ams: &AmsState, start: usize, direction: Direction) -> Option<usize> {
        let visible = |i: &usize| {
            let step = self.steps[*i].borrow();
            let skip = step.should_skip(ams);
            if skip {
                tracing::debug!("[{}] Skipped", step.name());
            }
            !skip
        };
        match direction {
            Direction::Forward => (start..self.steps.len()).find(visible),
            Direction::Backward => (0..=start.min(self.steps.len().saturating_sub(1)))
                .rev()
                .find(visible),
        }
    }

    fn leave_current(&mut self, ctx: &mut WizardContext) {
        if let Some(current) = self.current {
            self.steps[current].borrow_mut().cleanup();
        }
        if let Some(container) = self.container {
            ctx.screens.clear_children(container);
        }
    }

    fn show(&mut self, ctx: &mut WizardContext, index: usize) -> Result<()> {
        self.leave_current(ctx);
        self.current = Some(index);
        let container = self.ensure_container(ctx)?;

        let mut step = self.steps[index].borrow_mut();
        if !self.prepared[index] {
            step.init_subjects();
            step.register_callbacks();
            self.prepared[index] = true;
        }

        let mut step_ctx = StepContext {
            ams: &ctx.ams,
            ui: &mut ctx.screens,
        };
        match step.create(&mut step_ctx, container) {
            Ok(_) => {
                tracing::debug!("[{}] Showing step {}", step.name(), index);
                self.last_error = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!("[{}] Could not show step: {}", step.name(), e);
                self.last_error = Some(e.user_message());
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AfcBackend, AfcUnit, AmsBackend};
    use crate::screen::ScreenTable;
    use crate::step_registry::StepRegistry;
    use crate::steps::{ams_identify, summary, welcome};
    use std::cell::Cell;

    fn afc(lanes: u32) -> AmsBackend {
        AmsBackend::Afc(AfcBackend::new(vec![AfcUnit {
            name: "Turtle_1".to_string(),
            lanes,
        }]))
    }

    fn setup() -> (WizardContext, WizardController) {
        let mut ctx = WizardContext::new().unwrap();
        let wizard = WizardController::new(&mut ctx, &StepKind::default_order()).unwrap();
        (ctx, wizard)
    }

    #[test]
    fn test_skips_identify_without_backend() {
        let (mut ctx, mut wizard) = setup();
        wizard.start(&mut ctx).unwrap();
        assert_eq!(wizard.current_step_name(), Some(welcome::NAME));
        assert_eq!(wizard.progress(&ctx.ams), Some((1, 2)));

        wizard.next(&mut ctx).unwrap();
        assert_eq!(wizard.current_step_name(), Some(summary::NAME));
        assert_eq!(wizard.progress(&ctx.ams), Some((2, 2)));

        assert!(wizard.back(&mut ctx).unwrap());
        assert_eq!(wizard.current_step_name(), Some(welcome::NAME));
        assert!(!wizard.back(&mut ctx).unwrap());
    }

    #[test]
    fn test_shows_identify_with_afc() {
        let (mut ctx, mut wizard) = setup();
        ctx.ams.set_backend(afc(4));
        wizard.start(&mut ctx).unwrap();
        wizard.next(&mut ctx).unwrap();
        assert_eq!(wizard.current_step_name(), Some(ams_identify::NAME));
        assert_eq!(
            wizard.render(&ctx),
            vec![
                "== Filament System Detected ==".to_string(),
                "Your printer reported this filament system:".to_string(),
                "AFC (Armored Turtle)".to_string(),
                "4 lanes detected".to_string(),
            ]
        );
    }

    #[test]
    fn test_summary_gates_completion() {
        let (mut ctx, mut wizard) = setup();
        let done = Rc::new(Cell::new(0));
        let seen = Rc::clone(&done);
        wizard.set_on_complete(move || seen.set(seen.get() + 1));

        wizard.start(&mut ctx).unwrap();
        wizard.next(&mut ctx).unwrap();
        assert!(matches!(
            wizard.next(&mut ctx),
            Err(WizardError::Validation(_))
        ));
        assert!(wizard.is_active());

        wizard.confirm_current(&mut ctx).unwrap();
        wizard.next(&mut ctx).unwrap();
        assert!(wizard.is_completed());
        assert!(!wizard.is_active());
        assert_eq!(done.get(), 1);
        assert!(wizard.render(&ctx).is_empty());
        assert!(wizard.next(&mut ctx).is_err());
    }

    #[test]
    fn test_leaving_a_step_cleans_it_up() {
        let (mut ctx, mut wizard) = setup();
        let welcome = steps::get_step(&mut ctx.steps, StepKind::Welcome).unwrap();
        wizard.start(&mut ctx).unwrap();
        assert_eq!(welcome.borrow().lifecycle(), StepLifecycle::Active);

        wizard.next(&mut ctx).unwrap();
        assert_eq!(welcome.borrow().lifecycle(), StepLifecycle::Cleaned);
        let container = wizard.container().unwrap();
        assert_eq!(ctx.screens.children(container).len(), 1);
    }

    #[test]
    fn test_goto_skipped_step_is_refused() {
        let (mut ctx, mut wizard) = setup();
        wizard.start(&mut ctx).unwrap();
        assert!(matches!(
            wizard.goto_step(&mut ctx, 1),
            Err(WizardError::Navigation(_))
        ));
        assert!(wizard.goto_step(&mut ctx, 7).is_err());

        ctx.ams.set_backend(afc(2));
        wizard.goto_step(&mut ctx, 1).unwrap();
        assert_eq!(wizard.current_step_name(), Some(ams_identify::NAME));
    }

    #[test]
    fn test_refresh_picks_up_new_topology() {
        let (mut ctx, mut wizard) = setup();
        ctx.ams.set_backend(afc(0));
        wizard.start(&mut ctx).unwrap();
        wizard.next(&mut ctx).unwrap();
        assert!(wizard.render(&ctx).contains(&"System detected".to_string()));

        ctx.ams.set_backend(afc(8));
        wizard.refresh(&mut ctx);
        assert!(wizard.render(&ctx).contains(&"8 lanes detected".to_string()));
    }

    #[test]
    fn test_next_does_not_pass_a_step_that_failed_to_build() {
        let mut screens = ScreenTable::new();
        screens
            .register_template(welcome::TEMPLATE, welcome::template())
            .unwrap();
        screens
            .register_template(summary::TEMPLATE, summary::template())
            .unwrap();
        let mut ctx = WizardContext {
            ams: AmsState::new(),
            steps: StepRegistry::new(),
            nav: NavigationHistory::default(),
            screens,
        };
        ctx.ams.set_backend(afc(4));
        let mut wizard = WizardController::new(&mut ctx, &StepKind::default_order()).unwrap();
        wizard.start(&mut ctx).unwrap();

        assert!(matches!(
            wizard.next(&mut ctx),
            Err(WizardError::TemplateNotFound(_))
        ));
        assert_eq!(wizard.current_step_name(), Some(ams_identify::NAME));

        assert!(wizard.next(&mut ctx).is_err());
        assert_eq!(wizard.current_step_name(), Some(ams_identify::NAME));
        assert!(wizard.last_error().is_some());
        assert!(wizard.is_active());

        // Once the screen can be built, the next press shows it rather than skipping it
        ctx.screens
            .register_template(ams_identify::TEMPLATE, ams_identify::template())
            .unwrap();
        wizard.next(&mut ctx).unwrap();
        assert_eq!(wizard.current_step_name(), Some(ams_identify::NAME));
        assert_eq!(wizard.last_error(), None);
        wizard.next(&mut ctx).unwrap();
        assert_eq!(wizard.current_step_name(), Some(summary::NAME));
    }

    #[test]
    fn test_hide_does_not_complete() {
        let (mut ctx, mut wizard) = setup();
        wizard.start(&mut ctx).unwrap();
        wizard.hide(&mut ctx);
        assert!(!wizard.is_active());
        assert!(!wizard.is_completed());
        assert_eq!(wizard.current_step_name(), None);
    }

    #[test]
    fn test_overlays_round_trip() {
        let mut ctx = WizardContext::new().unwrap();
        let before = ctx.screens.live_count();
        let overlay = ctx.show_overlay(steps::HELP_OVERLAY).unwrap();
        assert_eq!(*ctx.nav.active(), ScreenContext::Overlay(overlay));
        assert!(ctx.dismiss_overlay());
        assert!(!ctx.screens.is_alive(overlay));
        assert_eq!(ctx.screens.live_count(), before);
        assert!(!ctx.dismiss_overlay());

        ctx.show_overlay(steps::HELP_OVERLAY).unwrap();
        ctx.show_overlay(steps::HELP_OVERLAY).unwrap();
        ctx.reset_navigation();
        assert_eq!(ctx.nav.depth(), 0);
        assert_eq!(ctx.screens.live_count(), before);
    }
}
