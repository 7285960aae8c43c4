//! Filament Wizard Library
//!
//! Core of a first-run setup wizard for touchscreen 3D printer controllers.
//! The step sequence adapts to whatever filament system (AMS) the printer
//! reports.

pub mod ams_state;
pub mod backend;
pub mod cli;
pub mod config;
pub mod controller;
pub mod error;
pub mod hardware;
pub mod navigation;
pub mod screen;
pub mod step;
pub mod step_registry;
pub mod steps;
pub mod theme;
pub mod tui;
pub mod types;

// Re-export main types for convenience
pub use ams_state::{AmsState, BackendPresence};
pub use backend::AmsBackend;
pub use config::WizardConfig;
pub use controller::{WizardContext, WizardController};
pub use error::{Result, WizardError};
pub use navigation::{NavigationHistory, PanelId, ScreenContext};
pub use screen::{ScreenBuilder, ScreenHandle, ScreenTable, ScreenTemplate};
pub use step::{StepContext, StepLifecycle, WizardStep};
pub use step_registry::StepRegistry;
pub use steps::StepKind;
pub use types::{AmsSystemInfo, AmsType, PathTopology, ToolMappingCapabilities};
