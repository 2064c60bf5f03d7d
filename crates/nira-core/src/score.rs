//! Ordinal risk score scales.
//!
//! All assets carry a threat/vulnerability/consequence triple on a 1-5
//! ordinal scale, with risk as the triple product. The scales:
//!
//! - Threat: 1 = very low, 2 = low, 3 = medium, 4 = high, 5 = very high
//! - Vulnerability: 1 = very low, 2 = low, 3 = medium, 4 = high, 5 = critical
//! - Consequence: 1 = negligible, 2 = minor, 3 = moderate, 4 = severe,
//!   5 = catastrophic

use serde::{Deserialize, Serialize};

pub const THREAT_MIN: u8 = 1;
pub const THREAT_MAX: u8 = 5;
pub const THREAT_INC: u8 = 1;

pub const VULN_MIN: u8 = 1;
pub const VULN_MAX: u8 = 5;
pub const VULN_INC: u8 = 1;

pub const CONS_MIN: u8 = 1;
pub const CONS_MAX: u8 = 5;
pub const CONS_INC: u8 = 1;

pub const RISK_MIN: u32 = 1;
pub const RISK_MAX: u32 = THREAT_MAX as u32 * VULN_MAX as u32 * CONS_MAX as u32;
pub const RISK_INC: u32 = 1;

/// Which asset table an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    Nodes,
    Arcs,
}

impl AssetClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Nodes => "nodes",
            AssetClass::Arcs => "arcs",
        }
    }
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three mutable ordinal scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreKind {
    Threat,
    Vulnerability,
    Consequence,
}

impl ScoreKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreKind::Threat => "threat",
            ScoreKind::Vulnerability => "vulnerability",
            ScoreKind::Consequence => "consequence",
        }
    }
}

impl std::fmt::Display for ScoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute a critical-asset query ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RankAttribute {
    Threat,
    Vulnerability,
    Consequence,
    Risk,
}

impl RankAttribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankAttribute::Threat => "threat",
            RankAttribute::Vulnerability => "vulnerability",
            RankAttribute::Consequence => "consequence",
            RankAttribute::Risk => "risk",
        }
    }
}

impl From<ScoreKind> for RankAttribute {
    fn from(kind: ScoreKind) -> Self {
        match kind {
            ScoreKind::Threat => RankAttribute::Threat,
            ScoreKind::Vulnerability => RankAttribute::Vulnerability,
            ScoreKind::Consequence => RankAttribute::Consequence,
        }
    }
}

/// Clamp a raw score to the valid 1-5 range.
///
/// Out-of-range values from user edits are clamped silently; only
/// non-numeric input is a hard error, and that is rejected at parse time.
pub fn clamp_score(value: i64) -> u8 {
    value.clamp(THREAT_MIN as i64, THREAT_MAX as i64) as u8
}

/// Risk of a single asset: the triple product on the ordinal scales.
pub fn risk_product(threat: u8, vulnerability: u8, consequence: u8) -> u32 {
    threat as u32 * vulnerability as u32 * consequence as u32
}
