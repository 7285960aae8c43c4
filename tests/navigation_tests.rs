//! Tests for overlay navigation
//!
//! These tests verify:
//! - go_back on an empty history is a no-op
//! - LIFO restore order
//! - Overlay screens are created and deleted with the history
//! - Connection loss returns to the base panel

use filament_wizard::controller::WizardContext;
use filament_wizard::navigation::{NavigationHistory, PanelId, ScreenContext};
use filament_wizard::screen::ScreenBuilder;
use filament_wizard::steps::HELP_OVERLAY;

#[test]
fn test_empty_history_go_back_returns_false() {
    let mut nav: NavigationHistory<ScreenContext> = NavigationHistory::default();
    assert!(!nav.go_back());
    assert_eq!(*nav.active(), ScreenContext::Panel(PanelId::Home));
    assert_eq!(nav.depth(), 0);
}

#[test]
fn test_push_push_back_back_is_lifo() {
    let a = ScreenContext::Panel(PanelId::Controls);
    let b = ScreenContext::Panel(PanelId::Filament);
    let mut nav = NavigationHistory::new(ScreenContext::Panel(PanelId::Home));

    nav.push_overlay(a);
    nav.push_overlay(b);
    assert_eq!(nav.depth(), 2);

    assert!(nav.go_back());
    assert_eq!(*nav.active(), a);
    assert!(nav.go_back());
    assert_eq!(*nav.active(), ScreenContext::Panel(PanelId::Home));
    assert!(!nav.go_back());
}

#[test]
fn test_deep_history_is_not_capped() {
    let mut nav = NavigationHistory::new(0u32);
    for i in 1..=1000 {
        nav.push_overlay(i);
    }
    assert_eq!(nav.depth(), 1000);
    for expected in (0..1000).rev() {
        assert!(nav.go_back());
        assert_eq!(*nav.active(), expected);
    }
}

#[test]
fn test_overlay_screens_follow_history() {
    let mut ctx = WizardContext::new().unwrap();
    let first = ctx.show_overlay(HELP_OVERLAY).unwrap();
    let second = ctx.show_overlay(HELP_OVERLAY).unwrap();
    assert!(ctx.nav.is_in_stack(&ScreenContext::Overlay(first)));
    assert_eq!(*ctx.nav.active(), ScreenContext::Overlay(second));

    assert!(ctx.dismiss_overlay());
    assert!(!ctx.screens.is_alive(second));
    assert!(ctx.screens.is_alive(first));
    assert_eq!(*ctx.nav.active(), ScreenContext::Overlay(first));
}

#[test]
fn test_unknown_overlay_template_leaves_history_untouched() {
    let mut ctx = WizardContext::new().unwrap();
    assert!(ctx.show_overlay("no_such_overlay").is_err());
    assert_eq!(ctx.nav.depth(), 0);
}

#[test]
fn test_connection_loss_clears_overlays() {
    let mut ctx = WizardContext::new().unwrap();
    ctx.nav.set_active(ScreenContext::Panel(PanelId::Settings));
    let overlays: Vec<_> = (0..3)
        .map(|_| ctx.show_overlay(HELP_OVERLAY).unwrap())
        .collect();

    ctx.reset_navigation();
    assert_eq!(*ctx.nav.active(), ScreenContext::Panel(PanelId::Settings));
    assert!(overlays.iter().all(|o| !ctx.screens.is_alive(*o)));
    assert!(!ctx.dismiss_overlay());
}
