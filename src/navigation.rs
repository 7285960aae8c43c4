//! Navigation history for overlay screens
//!
//! The history keeps one active context plus a stack of the contexts the
//! user left to get there. Showing an overlay pushes the current context;
//! "back" pops it and makes it active again. Popping an empty stack is a
//! defined no-op that tells the caller to fall back to a default screen.
//!
//! The depth is not capped.

use crate::screen::ScreenHandle;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString};

/// Top-level panels reachable from the navigation bar
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PanelId {
    #[default]
    Home,
    PrintSelect,
    Controls,
    Filament,
    Settings,
    Advanced,
}

/// What the user is looking at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenContext {
    Panel(PanelId),
    Overlay(ScreenHandle),
}

impl Default for ScreenContext {
    fn default() -> Self {
        Self::Panel(PanelId::default())
    }
}

impl fmt::Display for ScreenContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Panel(panel) => write!(f, "panel {}", panel),
            Self::Overlay(_) => write!(f, "overlay"),
        }
    }
}

/// Active context plus the stack of contexts it was reached from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationHistory<C> {
    base: C,
    active: C,
    stack: Vec<C>,
}

impl<C: Clone + PartialEq + fmt::Debug> NavigationHistory<C> {
    /// History starting at `initial`, which is also the fallback for `clear`
    pub fn new(initial: C) -> Self {
        Self {
            base: initial.clone(),
            active: initial,
            stack: Vec::new(),
        }
    }

    /// Show `overlay` on top of the current context
    pub fn push_overlay(&mut self, overlay: C) {
        let leaving = std::mem::replace(&mut self.active, overlay);
        tracing::debug!("Pushed {:?}, depth {}", leaving, self.stack.len() + 1);
        self.stack.push(leaving);
    }

    /// Restore the most recently left context.
    ///
    /// Returns false and changes nothing when there is nothing to go back to.
    pub fn go_back(&mut self) -> bool {
        self.pop_context().is_some()
    }

    /// Like `go_back`, returning the dismissed context
    pub fn pop_context(&mut self) -> Option<C> {
        let previous = self.stack.pop()?;
        let dismissed = std::mem::replace(&mut self.active, previous);
        tracing::debug!("Back to {:?}, depth {}", self.active, self.stack.len());
        Some(dismissed)
    }

    /// Switch the base context. Drops any open overlays.
    pub fn set_active(&mut self, context: C) -> Vec<C> {
        let dismissed = self.clear();
        self.base = context.clone();
        self.active = context;
        dismissed
    }

    pub fn active(&self) -> &C {
        &self.active
    }

    /// Number of contexts `go_back` can still restore
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// Context `go_back` would restore
    pub fn peek(&self) -> Option<&C> {
        self.stack.last()
    }

    /// Whether `context` is showing or waiting underneath an overlay
    pub fn is_in_stack(&self, context: &C) -> bool {
        self.active == *context || self.stack.contains(context)
    }

    /// Drop every overlay and return to the base context (e.g. on
    /// connection loss). Returns the dismissed overlays, topmost first.
    pub fn clear(&mut self) -> Vec<C> {
        if self.stack.is_empty() {
            return Vec::new();
        }
        let mut dismissed = Vec::with_capacity(self.stack.len());
        dismissed.push(std::mem::replace(&mut self.active, self.base.clone()));
        // The bottom of the stack is the base context itself
        dismissed.extend(self.stack.drain(1..).rev());
        self.stack.clear();
        tracing::info!("Cleared {} overlay(s)", dismissed.len());
        dismissed
    }
}

impl<C: Clone + PartialEq + fmt::Debug + Default> Default for NavigationHistory<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_go_back_on_empty_stack_changes_nothing() {
        let mut nav = NavigationHistory::new("home");
        let before = nav.clone();
        assert!(!nav.go_back());
        assert_eq!(nav, before);
        assert_eq!(nav.pop_context(), None);
    }

    #[test]
    fn test_lifo_order() {
        let mut nav = NavigationHistory::new("home");
        nav.push_overlay("a");
        nav.push_overlay("b");
        assert_eq!(*nav.active(), "b");
        assert_eq!(nav.peek(), Some(&"a"));

        assert!(nav.go_back());
        assert_eq!(*nav.active(), "a");
        assert!(nav.go_back());
        assert_eq!(*nav.active(), "home");
        assert!(!nav.go_back());
    }

    #[test]
    fn test_is_in_stack() {
        let mut nav = NavigationHistory::new("home");
        nav.push_overlay("status");
        nav.push_overlay("console");
        assert!(nav.is_in_stack(&"status"));
        assert!(nav.is_in_stack(&"console"));
        assert!(!nav.is_in_stack(&"settings"));
    }

    #[test]
    fn test_clear_returns_to_base() {
        let mut nav = NavigationHistory::new("home");
        nav.push_overlay("a");
        nav.push_overlay("b");
        nav.push_overlay("c");
        assert_eq!(nav.clear(), vec!["c", "b", "a"]);
        assert_eq!(*nav.active(), "home");
        assert_eq!(nav.depth(), 0);
        assert!(nav.clear().is_empty());
    }

    #[test]
    fn test_set_active_replaces_base() {
        let mut nav = NavigationHistory::new(ScreenContext::default());
        nav.push_overlay(ScreenContext::Panel(PanelId::Filament));
        let dismissed = nav.set_active(ScreenContext::Panel(PanelId::Settings));
        assert_eq!(dismissed, vec![ScreenContext::Panel(PanelId::Filament)]);
        assert_eq!(*nav.active(), ScreenContext::Panel(PanelId::Settings));
        nav.push_overlay(ScreenContext::Panel(PanelId::Advanced));
        nav.clear();
        assert_eq!(*nav.active(), ScreenContext::Panel(PanelId::Settings));
    }

    #[test]
    fn test_panel_names() {
        assert_eq!(PanelId::PrintSelect.to_string(), "print_select");
        assert_eq!("filament".parse::<PanelId>().unwrap(), PanelId::Filament);
        assert_eq!(ScreenContext::default().to_string(), "panel home");
    }
}
