//! AMS hardware detection from the printer's object list
//!
//! Klipper exposes every configured module as a named printer object. The
//! AMS family and most of its topology can be read off those names alone.
//!
//! # Design
//!
//! - **Fixed priority**: AFC, Happy Hare, ValgACE, tool changer. The first
//!   family with a matching object wins.
//! - **Safe default**: nothing recognised means no backend is registered,
//!   and the wizard skips the AMS step.
//! - **Single writer**: [`apply_probe`] is the only code that writes the
//!   backend registry.

use crate::ams_state::AmsState;
use crate::backend::{
    AfcBackend, AfcUnit, AmsBackend, HappyHareBackend, ToolChangerBackend, ValgAceBackend,
};
use crate::types::{AmsSystemInfo, AmsType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// AFC object prefixes that describe lanes or plumbing rather than units
const AFC_NON_UNIT_PREFIXES: &[&str] = &[
    "AFC_stepper",
    "AFC_lane",
    "AFC_hub",
    "AFC_extruder",
    "AFC_buffer",
    "AFC_led",
    "AFC_prep",
];

/// Snapshot of what the printer reported during discovery
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterObjects {
    /// Printer object names, e.g. `"AFC_stepper lane1"`, `"mmu"`, `"tool T0"`
    pub objects: Vec<String>,
    /// `mmu.num_gates` from the Happy Hare status, if already queried
    #[serde(default)]
    pub mmu_num_gates: Option<u32>,
    /// Number of ACE Pro units reported by ValgACE, if already queried
    #[serde(default)]
    pub ace_units: Option<u32>,
}

impl PrinterObjects {
    pub fn new<I, S>(objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            objects: objects.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    fn has(&self, pred: impl Fn(&str) -> bool) -> bool {
        self.objects.iter().any(|o| pred(o.as_str()))
    }

    /// Second word of every object whose first word is `kind`
    fn instances<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.objects.iter().filter_map(move |o| {
            let (head, name) = o.split_once(' ')?;
            (head == kind).then_some(name.trim())
        })
    }
}

/// Outcome of one probe, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub ams_type: AmsType,
    pub info: AmsSystemInfo,
}

impl fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AMS: {}, slots: {}, units: {}, path: {}",
            self.ams_type, self.info.total_slots, self.info.unit_count, self.info.path_topology
        )
    }
}

// ============================================================================
// Detection Functions
// ============================================================================

/// Identify the AMS family from object names.
pub fn detect_ams_type(printer: &PrinterObjects) -> AmsType {
    if printer.has(|o| o == "AFC" || o.starts_with("AFC_")) {
        AmsType::Afc
    } else if printer.has(|o| o == "mmu" || o.starts_with("mmu_")) {
        AmsType::HappyHare
    } else if printer.has(|o| o == "ace" || o.starts_with("ace ")) {
        AmsType::ValgAce
    } else if printer.has(|o| o == "toolchanger") || printer.instances("tool").count() >= 2 {
        AmsType::ToolChanger
    } else {
        AmsType::None
    }
}

/// Build a backend carrying whatever topology the objects reveal.
pub fn probe_backend(printer: &PrinterObjects) -> AmsBackend {
    match detect_ams_type(printer) {
        AmsType::None => AmsBackend::None,
        AmsType::Afc => AmsBackend::Afc(AfcBackend::new(afc_units(printer))),
        AmsType::HappyHare => AmsBackend::HappyHare(HappyHareBackend::new(printer.mmu_num_gates)),
        AmsType::ValgAce => AmsBackend::ValgAce(ValgAceBackend::new(printer.ace_units)),
        AmsType::ToolChanger => {
            let mut tools: Vec<String> = printer.instances("tool").map(str::to_string).collect();
            tools.sort();
            tools.dedup();
            AmsBackend::ToolChanger(ToolChangerBackend::new(tools))
        }
    }
}

/// AFC units with lanes spread across them. Lane-to-unit assignment lives
/// in the AFC config, not the object list, so lanes are split evenly.
fn afc_units(printer: &PrinterObjects) -> Vec<AfcUnit> {
    let mut lanes: Vec<&str> = printer
        .instances("AFC_stepper")
        .chain(printer.instances("AFC_lane"))
        .collect();
    lanes.sort_unstable();
    lanes.dedup();
    let total = lanes.len() as u32;

    let mut names: Vec<String> = printer
        .objects
        .iter()
        .filter_map(|o| {
            let (kind, name) = o.split_once(' ')?;
            let is_unit =
                kind.starts_with("AFC_") && !AFC_NON_UNIT_PREFIXES.contains(&kind);
            is_unit.then(|| name.trim().to_string())
        })
        .collect();
    names.sort();
    names.dedup();

    if names.is_empty() {
        if total == 0 {
            return Vec::new();
        }
        names.push("AFC".to_string());
    }

    let count = names.len() as u32;
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            let extra = u32::from((i as u32) < total % count);
            AfcUnit {
                name,
                lanes: total / count + extra,
            }
        })
        .collect()
}

/// Probe and publish the result to the registry.
///
/// Nothing recognised leaves the registry empty (probed, absent).
pub fn apply_probe(state: &mut AmsState, printer: &PrinterObjects) -> ProbeReport {
    let backend = probe_backend(printer);
    let report = ProbeReport {
        ams_type: backend.get_type(),
        info: backend.get_system_info(),
    };

    if report.ams_type.is_present() {
        state.set_backend(backend);
    } else {
        tracing::info!("No AMS detected in {} printer objects", printer.objects.len());
        state.mark_probed_absent();
    }
    report
}

// ============================================================================
// Tests
// ============================================================================
