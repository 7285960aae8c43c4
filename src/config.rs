//! Wizard configuration file
//!
//! JSON on disk. Every field has a default so an empty object is a valid
//! configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::backend::{ACE_SLOTS_PER_UNIT, MAX_SLOTS};
use crate::hardware::PrinterObjects;
use crate::steps::StepKind;

/// Wizard configuration that can be saved/loaded
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WizardConfig {
    /// tracing filter directive, e.g. `"filament_wizard=debug"`
    pub log_filter: Option<String>,
    /// Steps in the order the wizard visits them
    pub steps: Vec<StepKind>,
    /// Stand-in for hardware probing in the headless binary
    pub simulated_printer: Option<PrinterObjects>,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            steps: StepKind::default_order(),
            simulated_printer: None,
        }
    }
}

impl WizardConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save configuration to a JSON file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize configuration to JSON")?;

        fs::write(&path, json)
            .with_context(|| format!("Failed to write configuration to {:?}", path.as_ref()))?;

        Ok(())
    }

    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read configuration from {:?}", path.as_ref()))?;

        let config: Self =
            serde_json::from_str(&content).context("Failed to parse configuration JSON")?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.steps.is_empty() {
            anyhow::bail!("At least one wizard step must be configured");
        }

        let mut seen = HashSet::new();
        for step in &self.steps {
            if !seen.insert(step) {
                anyhow::bail!("Step '{}' is listed more than once", step);
            }
        }

        if let Some(filter) = &self.log_filter {
            if filter.trim().is_empty() {
                anyhow::bail!("log_filter must not be empty when set");
            }
        }

        if let Some(printer) = &self.simulated_printer {
            if printer.objects.iter().any(|o| o.trim().is_empty()) {
                anyhow::bail!("simulated_printer contains an empty object name");
            }
            if let Some(gates) = printer.mmu_num_gates.filter(|g| *g > MAX_SLOTS) {
                anyhow::bail!(
                    "simulated_printer.mmu_num_gates is {} (at most {} supported)",
                    gates,
                    MAX_SLOTS
                );
            }
            if let Some(units) = printer
                .ace_units
                .filter(|u| u.saturating_mul(ACE_SLOTS_PER_UNIT) > MAX_SLOTS)
            {
                anyhow::bail!(
                    "simulated_printer.ace_units is {} (at most {} supported)",
                    units,
                    MAX_SLOTS / ACE_SLOTS_PER_UNIT
                );
            }
        }

        Ok(())
    }
}
