//! Error handling for the setup wizard
//!
//! One error type for the whole crate, built with thiserror. Display-only
//! steps never return these; they degrade to fallback text instead. Only
//! screen construction failures and controller refusals travel upward.

use thiserror::Error;

/// Main error type for the wizard core
#[derive(Error, Debug)]
pub enum WizardError {
    /// The rendering collaborator could not build a screen
    #[error("Screen construction failed: {0}")]
    Screen(String),

    /// No template registered under the requested id
    #[error("Unknown screen template: {0}")]
    TemplateNotFound(String),

    /// Template definition rejected at registration
    #[error("Malformed screen template '{template}': {reason}")]
    MalformedTemplate { template: String, reason: String },

    /// Screen handle dereferenced outside its create/cleanup window
    #[error("Stale screen reference in step '{step}'")]
    StaleScreen { step: String },

    /// Step registry entry exists under this name with a different type
    #[error("Step '{0}' is registered with a different type")]
    StepTypeMismatch(String),

    /// Navigation misuse (no steps, index out of range, wizard inactive)
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Current step refused to let the controller advance
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid tool or slot, or backend without editable mapping
    #[error("Tool mapping error: {0}")]
    ToolMapping(String),

    /// Configuration errors (loading, parsing, validation)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors (config files, terminal)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for wizard operations
pub type Result<T> = std::result::Result<T, WizardError>;

impl WizardError {
    /// Create a screen construction error
    pub fn screen(msg: impl Into<String>) -> Self {
        Self::Screen(msg.into())
    }

    /// Create a stale screen error for the named step
    pub fn stale_screen(step: impl Into<String>) -> Self {
        Self::StaleScreen { step: step.into() }
    }

    /// Create a navigation error
    pub fn navigation(msg: impl Into<String>) -> Self {
        Self::Navigation(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a tool mapping error
    pub fn tool_mapping(msg: impl Into<String>) -> Self {
        Self::ToolMapping(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Text suitable for showing on the touchscreen.
    ///
    /// The controller is the only layer that surfaces failures to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Screen(_) | Self::TemplateNotFound(_) | Self::MalformedTemplate { .. } => {
                "This setup screen could not be displayed.".to_string()
            }
            Self::Validation(msg) => msg.clone(),
            other => other.to_string(),
        }
    }
}
