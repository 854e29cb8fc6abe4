//! Types shared by classification, scheduling and planning.

use serde::{Deserialize, Serialize};

/// Health tier derived from a seeder count, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    Critical,
    Rare,
    Low,
    Healthy,
}

impl Classification {
    /// All tiers, most severe first.
    pub const ALL: [Classification; 4] = [
        Classification::Critical,
        Classification::Rare,
        Classification::Low,
        Classification::Healthy,
    ];

    /// Returns the persisted tier name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Critical => "CRITICAL",
            Classification::Rare => "RARE",
            Classification::Low => "LOW",
            Classification::Healthy => "HEALTHY",
        }
    }

    /// Whether this tier is below the point where actions are considered.
    pub fn is_at_risk(&self) -> bool {
        matches!(self, Classification::Critical | Classification::Rare)
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Seeder-count thresholds. Each bound is inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_critical")]
    pub critical_seeders: u32,
    #[serde(default = "default_rare")]
    pub rare_seeders: u32,
    #[serde(default = "default_low")]
    pub low_seeders: u32,
}

fn default_critical() -> u32 {
    1
}

fn default_rare() -> u32 {
    2
}

fn default_low() -> u32 {
    5
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            critical_seeders: default_critical(),
            rare_seeders: default_rare(),
            low_seeders: default_low(),
        }
    }
}

impl Thresholds {
    pub fn new(critical_seeders: u32, rare_seeders: u32, low_seeders: u32) -> Self {
        Self {
            critical_seeders,
            rare_seeders,
            low_seeders,
        }
    }

    /// True when `critical < rare < low`.
    pub fn is_strictly_increasing(&self) -> bool {
        self.critical_seeders < self.rare_seeders && self.rare_seeders < self.low_seeders
    }
}

/// Which corrective actions are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPolicy {
    #[serde(default = "default_true")]
    pub resume_critical: bool,
    #[serde(default)]
    pub resume_rare: bool,
    #[serde(default = "default_true")]
    pub set_priorities: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ActionPolicy {
    fn default() -> Self {
        Self {
            resume_critical: true,
            resume_rare: false,
            set_priorities: true,
        }
    }
}

/// A corrective action against the torrent client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Resume,
    BoostPriority,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Resume => "resume",
            Action::BoostPriority => "boost_priority",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_serialization() {
        assert_eq!(
            serde_json::to_string(&Classification::Critical).unwrap(),
            "\"CRITICAL\""
        );
        assert_eq!(
            serde_json::from_str::<Classification>("\"HEALTHY\"").unwrap(),
            Classification::Healthy
        );
        assert!(serde_json::from_str::<Classification>("\"healthy\"").is_err());
    }

    #[test]
    fn test_classification_as_str_matches_serde() {
        for tier in Classification::ALL {
            let json = serde_json::to_string(&tier).unwrap();
            assert_eq!(json, format!("\"{}\"", tier.as_str()));
        }
    }

    #[test]
    fn test_classification_severity_order() {
        assert!(Classification::Critical < Classification::Rare);
        assert!(Classification::Rare < Classification::Low);
        assert!(Classification::Low < Classification::Healthy);
    }

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t, Thresholds::new(1, 2, 5));
        assert!(t.is_strictly_increasing());
        assert!(!Thresholds::new(5, 2, 10).is_strictly_increasing());
    }

    #[test]
    fn test_deserialize_partial_policy() {
        let policy: ActionPolicy = toml::from_str("resume_rare = true").unwrap();
        assert!(policy.resume_critical);
        assert!(policy.resume_rare);
        assert!(policy.set_priorities);
    }
}
