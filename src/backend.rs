//! AMS backends as a closed tagged union
//!
//! Each variant keeps topology in the shape its firmware reports it (AFC
//! units with lanes, Happy Hare gates, ACE units, tool names) and derives a
//! fresh [`AmsSystemInfo`] on every query. Nothing here is cached on the
//! wizard side.

use crate::error::{Result, WizardError};
use crate::types::{AmsSystemInfo, AmsType, PathTopology, ToolMappingCapabilities};

/// Slots in one Anycubic ACE Pro unit
pub const ACE_SLOTS_PER_UNIT: u32 = 4;

/// Largest slot count a tool map is built for
pub const MAX_SLOTS: u32 = 256;

/// One AFC unit (Box Turtle, Night Owl, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AfcUnit {
    pub name: String,
    pub lanes: u32,
}

/// Armored Turtle AFC state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AfcBackend {
    units: Vec<AfcUnit>,
    tool_map: Vec<u32>,
}

impl AfcBackend {
    pub fn new(units: Vec<AfcUnit>) -> Self {
        Self {
            units,
            tool_map: Vec::new(),
        }
    }

    pub fn units(&self) -> &[AfcUnit] {
        &self.units
    }

    fn total_lanes(&self) -> u32 {
        self.units
            .iter()
            .fold(0u32, |total, unit| total.saturating_add(unit.lanes))
    }
}

/// Happy Hare MMU state. Gate count is unknown until the MMU reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HappyHareBackend {
    num_gates: Option<u32>,
    ttg_map: Vec<u32>,
}

impl HappyHareBackend {
    pub fn new(num_gates: Option<u32>) -> Self {
        Self {
            num_gates,
            ttg_map: Vec::new(),
        }
    }

    /// Record the gate count from an `mmu` status update
    pub fn report_gates(&mut self, num_gates: u32) {
        if self.num_gates != Some(num_gates) {
            self.ttg_map.clear();
        }
        self.num_gates = Some(num_gates);
    }
}

/// ValgACE state. Unit count is unknown until the driver reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValgAceBackend {
    units: Option<u32>,
}

impl ValgAceBackend {
    pub fn new(units: Option<u32>) -> Self {
        Self { units }
    }

    pub fn report_units(&mut self, units: u32) {
        self.units = Some(units);
    }
}

/// Tool changer state: one slot per tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolChangerBackend {
    tools: Vec<String>,
}

impl ToolChangerBackend {
    pub fn new(tools: Vec<String>) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &[String] {
        &self.tools
    }
}

/// One detected hardware system.
///
/// Created by probing, owned by [`crate::ams_state::AmsState`]. The wizard
/// only ever borrows it for the duration of a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AmsBackend {
    None,
    Afc(AfcBackend),
    HappyHare(HappyHareBackend),
    ValgAce(ValgAceBackend),
    ToolChanger(ToolChangerBackend),
}

impl AmsBackend {
    /// Hardware family. Fixed at construction.
    pub fn get_type(&self) -> AmsType {
        match self {
            Self::None => AmsType::None,
            Self::Afc(_) => AmsType::Afc,
            Self::HappyHare(_) => AmsType::HappyHare,
            Self::ValgAce(_) => AmsType::ValgAce,
            Self::ToolChanger(_) => AmsType::ToolChanger,
        }
    }

    /// Derive the topology summary from current backend state.
    ///
    /// Never fails: unknown topology is reported as `total_slots == 0`.
    /// Counts saturate at `u32::MAX` instead of wrapping.
    pub fn get_system_info(&self) -> AmsSystemInfo {
        let (unit_count, path_topology) = match self {
            Self::None => (0, PathTopology::default()),
            Self::Afc(afc) => (saturating_len(afc.units.len()), PathTopology::Hub),
            Self::HappyHare(_) => (1, PathTopology::Linear),
            Self::ValgAce(ace) => (ace.units.unwrap_or(0), PathTopology::Hub),
            Self::ToolChanger(tc) => (saturating_len(tc.tools.len()), PathTopology::Parallel),
        };

        AmsSystemInfo {
            total_slots: self.total_slots(),
            unit_count,
            path_topology,
            supports_tool_mapping: self.tool_mapping_capabilities().supported,
        }
    }

    /// Slot count alone, 0 when unknown
    pub fn total_slots(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Afc(afc) => afc.total_lanes(),
            Self::HappyHare(hh) => hh.num_gates.unwrap_or(0),
            Self::ValgAce(ace) => ace.units.unwrap_or(0).saturating_mul(ACE_SLOTS_PER_UNIT),
            Self::ToolChanger(tc) => saturating_len(tc.tools.len()),
        }
    }

    /// Current tool-to-slot map, `map[tool] == slot`.
    ///
    /// Empty when mapping is unsupported or the slot count is unknown or
    /// above [`MAX_SLOTS`]. Slots never mapped explicitly map 1:1.
    pub fn get_tool_mapping(&self) -> Vec<u32> {
        if !self.tool_mapping_capabilities().supported {
            return Vec::new();
        }
        let total_slots = self.total_slots();
        if total_slots > MAX_SLOTS {
            tracing::warn!(
                "{} reports {} slots, not building a tool map above {}",
                self.get_type(),
                total_slots,
                MAX_SLOTS
            );
            return Vec::new();
        }
        let stored = self.stored_tool_map();
        if stored.len() == total_slots as usize {
            stored.to_vec()
        } else {
            (0..total_slots).collect()
        }
    }

    fn stored_tool_map(&self) -> &[u32] {
        match self {
            Self::Afc(afc) => &afc.tool_map,
            Self::HappyHare(hh) => &hh.ttg_map,
            Self::None | Self::ValgAce(_) | Self::ToolChanger(_) => &[],
        }
    }

    /// What this family allows for tool-to-slot mapping
    pub fn tool_mapping_capabilities(&self) -> ToolMappingCapabilities {
        match self {
            Self::None | Self::ToolChanger(_) => ToolMappingCapabilities::unsupported(),
            Self::Afc(_) => ToolMappingCapabilities::editable("Per-lane tool assignment via SET_MAP"),
            Self::HappyHare(_) => {
                ToolMappingCapabilities::editable("Tool-to-gate map via MMU_TTG_MAP")
            }
            Self::ValgAce(_) => ToolMappingCapabilities::read_only("Fixed 1:1 mapping"),
        }
    }

    /// Point `tool` at `slot`. Several tools may share one slot.
    pub fn set_tool_mapping(&mut self, tool: u32, slot: u32) -> Result<()> {
        let caps = self.tool_mapping_capabilities();
        if !caps.editable {
            return Err(WizardError::tool_mapping(format!(
                "{} backend does not support editing the tool map",
                self.get_type()
            )));
        }

        let total_slots = self.total_slots();
        if total_slots > MAX_SLOTS {
            return Err(WizardError::tool_mapping(format!(
                "{} slots is more than the {} a tool map supports",
                total_slots, MAX_SLOTS
            )));
        }
        if tool >= total_slots {
            return Err(WizardError::tool_mapping(format!(
                "invalid tool T{} ({} tools available)",
                tool, total_slots
            )));
        }
        if slot >= total_slots {
            return Err(WizardError::tool_mapping(format!(
                "invalid slot {} ({} slots available)",
                slot, total_slots
            )));
        }
        let current = self.get_tool_mapping();

        let map = match self {
            Self::Afc(afc) => &mut afc.tool_map,
            Self::HappyHare(hh) => &mut hh.ttg_map,
            Self::None | Self::ValgAce(_) | Self::ToolChanger(_) => {
                return Err(WizardError::tool_mapping("tool map is not editable"));
            }
        };
        if map.len() != total_slots as usize {
            *map = current;
        }
        map[tool as usize] = slot;
        tracing::debug!("Tool T{} mapped to slot {}", tool, slot);
        Ok(())
    }
}

fn saturating_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}
