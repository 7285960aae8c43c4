//! Type-safe AMS vocabulary shared by backends, probing, and wizard steps
//!
//! The hardware family set is closed. Consumers match on it exhaustively, so
//! adding a family is a compile-time breaking change for every consumer.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Automated material system hardware family
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
pub enum AmsType {
    /// Probed and confirmed: no AMS attached
    #[default]
    #[strum(serialize = "none")]
    None,
    /// Armored Turtle AFC (Box Turtle and friends)
    #[strum(serialize = "afc")]
    #[serde(rename = "afc")]
    Afc,
    /// Happy Hare MMU firmware (ERCF, Tradrack, ...)
    #[strum(serialize = "happy_hare")]
    HappyHare,
    /// ValgACE driver for the Anycubic ACE Pro
    #[strum(serialize = "valgace")]
    #[serde(rename = "valgace")]
    ValgAce,
    /// Multi-toolhead printer, one spool per tool
    #[strum(serialize = "tool_changer")]
    ToolChanger,
}

impl AmsType {
    /// Returns true for every family except `None`
    pub fn is_present(self) -> bool {
        !matches!(self, Self::None)
    }
}

/// How filament travels from slots to the toolhead
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
    EnumIter,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PathTopology {
    /// Selector moves along a row of gates (Happy Hare)
    #[default]
    Linear,
    /// Lanes merge into a hub before the toolhead (AFC, ACE)
    Hub,
    /// Every slot has its own toolhead (tool changers)
    Parallel,
}

/// Topology summary reported by a backend.
///
/// `total_slots == 0` means the topology is not known yet. This is a
/// normal state, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AmsSystemInfo {
    /// Number of filament slots/lanes/gates, 0 when unknown
    pub total_slots: u32,
    /// Number of physical units (Box Turtles, ACE Pros, ...)
    pub unit_count: u32,
    /// Filament path shape
    pub path_topology: PathTopology,
    /// Whether the backend exposes a tool-to-slot mapping at all
    pub supports_tool_mapping: bool,
}

impl AmsSystemInfo {
    /// Returns true once the backend has reported a slot count
    pub fn is_topology_known(&self) -> bool {
        self.total_slots > 0
    }
}

/// What a backend allows with respect to tool-to-slot mapping
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ToolMappingCapabilities {
    pub supported: bool,
    pub editable: bool,
    pub description: String,
}

impl ToolMappingCapabilities {
    pub fn unsupported() -> Self {
        Self::default()
    }

    pub fn editable(description: impl Into<String>) -> Self {
        Self {
            supported: true,
            editable: true,
            description: description.into(),
        }
    }

    pub fn read_only(description: impl Into<String>) -> Self {
        Self {
            supported: true,
            editable: false,
            description: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_ams_type_parse_and_display() {
        assert_eq!("afc".parse::<AmsType>().unwrap(), AmsType::Afc);
        assert_eq!("happy_hare".parse::<AmsType>().unwrap(), AmsType::HappyHare);
        assert_eq!(AmsType::ValgAce.to_string(), "valgace");
        assert_eq!(AmsType::ToolChanger.to_string(), "tool_changer");
        assert!("ercf".parse::<AmsType>().is_err());
    }

    #[test]
    fn test_only_none_is_absent() {
        for ty in AmsType::iter() {
            assert_eq!(ty.is_present(), ty != AmsType::None);
        }
    }

    #[test]
    fn test_ams_type_serde_matches_display() {
        for ty in AmsType::iter() {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty));
        }
    }

    #[test]
    fn test_default_system_info_is_unknown_topology() {
        let info = AmsSystemInfo::default();
        assert_eq!(info.total_slots, 0);
        assert!(!info.is_topology_known());
    }

    #[test]
    fn test_tool_mapping_constructors() {
        let caps = ToolMappingCapabilities::unsupported();
        assert!(!caps.supported && !caps.editable && caps.description.is_empty());

        let caps = ToolMappingCapabilities::read_only("Fixed 1:1 mapping");
        assert!(caps.supported && !caps.editable);
    }
}
