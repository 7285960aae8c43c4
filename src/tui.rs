//! Terminal front-end
//!
//! Draws whatever the wizard container and the topmost overlay hold, and
//! maps keys onto controller and navigation calls. SIGINT, SIGTERM and
//! SIGHUP set a shutdown flag that the event loop polls, so the terminal is
//! always restored on the way out.

use crate::controller::{WizardContext, WizardController};
use crate::navigation::ScreenContext;
use crate::steps::HELP_OVERLAY;
use crate::theme::Styles;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    text::Line,
    widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap},
};
use std::io::{Stdout, stdout};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const HINTS: &str = "Enter next · ← back · c confirm · ? help · q quit";

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Next,
    Back,
    Confirm,
    ShowHelp,
    CloseOverlay,
    Quit,
    Ignore,
}

/// Key bindings
///
/// Raw mode delivers Ctrl+C as a key event rather than SIGINT, so it is
/// matched here before the plain letter bindings.
pub fn map_key(key: KeyEvent) -> KeyAction {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('C') | KeyCode::Char('q') | KeyCode::Char('Q') => {
                KeyAction::Quit
            }
            _ => KeyAction::Ignore,
        };
    }
    match key.code {
        KeyCode::Enter | KeyCode::Right => KeyAction::Next,
        KeyCode::Left | KeyCode::Backspace => KeyAction::Back,
        KeyCode::Char('c') | KeyCode::Char('C') => KeyAction::Confirm,
        KeyCode::Char('?') => KeyAction::ShowHelp,
        KeyCode::Esc => KeyAction::CloseOverlay,
        KeyCode::Char('q') | KeyCode::Char('Q') => KeyAction::Quit,
        _ => KeyAction::Ignore,
    }
}

/// Flag raised by SIGINT, SIGTERM or SIGHUP
pub fn register_shutdown_flag() -> std::io::Result<Arc<AtomicBool>> {
    use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGTERM};

    let flag = Arc::new(AtomicBool::new(false));
    for signal in [SIGINT, SIGTERM, SIGHUP] {
        signal_hook::flag::register(signal, Arc::clone(&flag))?;
    }
    Ok(flag)
}

/// Wizard state plus the bits of UI state that live only in the terminal
pub struct WizardTui {
    ctx: WizardContext,
    wizard: WizardController,
    status: Option<String>,
    shutdown: Arc<AtomicBool>,
}

impl WizardTui {
    pub fn new(ctx: WizardContext, wizard: WizardController, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            ctx,
            wizard,
            status: None,
            shutdown,
        }
    }

    pub fn context(&self) -> &WizardContext {
        &self.ctx
    }

    pub fn wizard(&self) -> &WizardController {
        &self.wizard
    }

    /// Message shown above the key hints
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Apply one action. Returns true when the loop should exit.
    pub fn handle_action(&mut self, action: KeyAction) -> bool {
        let overlay_open = self.ctx.nav.depth() > 0;
        match action {
            KeyAction::Quit => return true,
            KeyAction::CloseOverlay => {
                if !self.ctx.dismiss_overlay() {
                    tracing::debug!("Nothing to go back to");
                }
            }
            KeyAction::ShowHelp if !overlay_open => {
                if let Err(e) = self.ctx.show_overlay(HELP_OVERLAY) {
                    tracing::warn!("Help overlay unavailable: {}", e);
                    self.status = Some(e.user_message());
                }
            }
            KeyAction::Ignore | KeyAction::ShowHelp => {}
            // Overlays swallow wizard keys
            _ if overlay_open => {}
            KeyAction::Next => {
                let result = self.wizard.next(&mut self.ctx);
                self.report(result);
            }
            KeyAction::Back => {
                let result = self.wizard.back(&mut self.ctx).map(|_| ());
                self.report(result);
            }
            KeyAction::Confirm => {
                let result = self.wizard.confirm_current(&mut self.ctx);
                self.report(result);
            }
        }
        self.wizard.is_completed()
    }

    fn report(&mut self, result: crate::error::Result<()>) {
        self.status = match result {
            Ok(()) => None,
            Err(e) => Some(e.user_message()),
        };
    }

    /// Main loop. Returns when the user quits, the wizard completes, or a
    /// shutdown signal arrives.
    pub fn run(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        tracing::info!("Starting terminal wizard");
        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                tracing::info!("Shutdown signal received");
                break;
            }

            terminal.draw(|f| self.draw(f))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_action(map_key(key)) {
                        break;
                    }
                }
            }
        }
        self.wizard.hide(&mut self.ctx);
        Ok(())
    }

    fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(f.area());

        let (position, total) = self.wizard.progress(&self.ctx.ams).unwrap_or((0, 0));
        let ratio = if total == 0 {
            0.0
        } else {
            position as f64 / total as f64
        };
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Printer setup"))
            .gauge_style(Styles::progress())
            .label(format!("Step {} of {}", position, total))
            .ratio(ratio);
        f.render_widget(gauge, chunks[0]);

        let lines: Vec<Line> = self
            .wizard
            .render(&self.ctx)
            .into_iter()
            .map(|l| styled_line(&l))
            .collect();
        let content = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Styles::border_active()),
            )
            .style(Styles::panel_bg())
            .wrap(Wrap { trim: true });
        f.render_widget(content, chunks[1]);

        let status = self.status.as_deref().or(self.wizard.last_error()).unwrap_or("");
        f.render_widget(Paragraph::new(status).style(Styles::error()), chunks[2]);
        f.render_widget(Paragraph::new(HINTS).style(Styles::hint()), chunks[3]);

        if let ScreenContext::Overlay(handle) = *self.ctx.nav.active() {
            let area = centered_rect(60, 50, f.area());
            let lines: Vec<Line> = self
                .ctx
                .screens
                .render_text(handle)
                .into_iter()
                .map(|l| styled_line(&l))
                .collect();
            f.render_widget(Clear, area);
            f.render_widget(
                Paragraph::new(lines)
                    .block(Block::default().borders(Borders::ALL))
                    .style(Styles::panel_bg()),
                area,
            );
        }
    }
}

fn styled_line(text: &str) -> Line<'static> {
    match text.strip_prefix("== ").and_then(|t| t.strip_suffix(" ==")) {
        Some(title) => Line::styled(title.to_string(), Styles::title()),
        None => Line::styled(text.to_string(), Styles::text()),
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

/// Set up the terminal, run the wizard, and always restore the terminal
pub fn run_terminal(ctx: WizardContext, wizard: WizardController) -> Result<()> {
    let shutdown = register_shutdown_flag().context("Failed to install signal handlers")?;

    enable_raw_mode().context("Failed to enable raw mode")?;
    crossterm::execute!(stdout(), EnterAlternateScreen)
        .context("Failed to enter alternate screen")?;

    let result = Terminal::new(CrosstermBackend::new(stdout()))
        .context("Failed to create terminal")
        .and_then(|mut terminal| WizardTui::new(ctx, wizard, shutdown).run(&mut terminal));

    // Restore even if the loop failed
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(stdout(), LeaveAlternateScreen);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::StepKind;

    fn tui() -> WizardTui {
        let mut ctx = WizardContext::new().unwrap();
        let mut wizard = WizardController::new(&mut ctx, &StepKind::default_order()).unwrap();
        wizard.start(&mut ctx).unwrap();
        WizardTui::new(ctx, wizard, Arc::new(AtomicBool::new(false)))
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_key_map() {
        assert_eq!(map_key(press(KeyCode::Enter)), KeyAction::Next);
        assert_eq!(map_key(press(KeyCode::Backspace)), KeyAction::Back);
        assert_eq!(map_key(press(KeyCode::Char('c'))), KeyAction::Confirm);
        assert_eq!(map_key(press(KeyCode::Char('?'))), KeyAction::ShowHelp);
        assert_eq!(map_key(press(KeyCode::Esc)), KeyAction::CloseOverlay);
        assert_eq!(map_key(press(KeyCode::Char('x'))), KeyAction::Ignore);
    }

    #[test]
    fn test_ctrl_c_and_ctrl_q_quit() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert_eq!(map_key(ctrl_c), KeyAction::Quit);
        assert_eq!(map_key(ctrl_q), KeyAction::Quit);
        assert_eq!(
            map_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::CONTROL)),
            KeyAction::Ignore
        );

        // Ctrl+C on the summary must not acknowledge it
        let mut tui = tui();
        tui.handle_action(KeyAction::Next);
        assert!(tui.handle_action(map_key(ctrl_c)));
        assert!(!tui.handle_action(KeyAction::Next));
        assert_eq!(tui.wizard().current_step_name(), Some(crate::steps::summary::NAME));
    }

    #[test]
    fn test_overlay_swallows_wizard_keys() {
        let mut tui = tui();
        let first = tui.wizard().current_step_name();
        tui.handle_action(KeyAction::ShowHelp);
        assert_eq!(tui.context().nav.depth(), 1);

        tui.handle_action(KeyAction::Next);
        assert_eq!(tui.wizard().current_step_name(), first);

        tui.handle_action(KeyAction::CloseOverlay);
        assert_eq!(tui.context().nav.depth(), 0);
        tui.handle_action(KeyAction::Next);
        assert_ne!(tui.wizard().current_step_name(), first);
    }

    #[test]
    fn test_validation_message_then_finish() {
        let mut tui = tui();
        assert!(!tui.handle_action(KeyAction::Next));
        assert!(!tui.handle_action(KeyAction::Next));
        assert_eq!(tui.status(), Some("Confirm this screen before continuing"));

        tui.handle_action(KeyAction::Confirm);
        assert_eq!(tui.status(), None);
        assert!(tui.handle_action(KeyAction::Next));
    }

    #[test]
    fn test_styled_line_detects_titles() {
        assert_eq!(styled_line("== Welcome ==").to_string(), "Welcome");
        assert_eq!(styled_line("4 lanes detected").to_string(), "4 lanes detected");
    }
}
