use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::hardware::HardwareLineItem;
use super::keyword::lenient;
use super::role::{Platform, Role};
use crate::estimate::{DurationTable, MultiplierConfig, RateTable, RoleRatioTable};
use crate::tree::FeatureTree;

pub const MIN_HEADCOUNT: u32 = 1;
pub const MAX_HEADCOUNT: u32 = 99;

/// A stored estimate: metadata plus the editable document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub document: EstimateProject,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight listing entry, without the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectInput {
    pub name: String,
    pub description: Option<String>,
    /// Starting document. Defaults to an empty tree with built-in tables.
    #[serde(default)]
    pub document: Option<EstimateProject>,
}

/// Input for updating project metadata. All fields are optional for partial updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProjectInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A named scalar applied to the base cost (e.g. "urgent delivery" at 1.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactFactor {
    pub name: String,
    #[serde(default = "neutral_factor")]
    pub value: f64,
}

fn neutral_factor() -> f64 {
    1.0
}

impl ImpactFactor {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// People assigned per role, always within `[MIN_HEADCOUNT, MAX_HEADCOUNT]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Headcounts(BTreeMap<Role, u32>);

impl<'de> Deserialize<'de> for Headcounts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        clamped_headcounts(deserializer).map(Self)
    }
}

impl Headcounts {
    /// Headcount for a role; roles never set count as one person.
    pub fn get(&self, role: Role) -> u32 {
        self.0
            .get(&role)
            .copied()
            .map(clamp_headcount)
            .unwrap_or(MIN_HEADCOUNT)
    }

    /// Store a clamped headcount and return the value actually stored.
    pub fn set(&mut self, role: Role, count: u32) -> u32 {
        let count = clamp_headcount(count);
        self.0.insert(role, count);
        count
    }
}

pub fn clamp_headcount(count: u32) -> u32 {
    count.clamp(MIN_HEADCOUNT, MAX_HEADCOUNT)
}

/// Role to headcount map read leniently. Unknown roles and non-integer counts
/// are dropped; every other count, negative ones included, is clamped.
pub fn clamped_headcounts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BTreeMap<Role, u32>, D::Error> {
    let raw: BTreeMap<Role, i64> = lenient::map(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(role, count)| {
            let count = count.clamp(i64::from(MIN_HEADCOUNT), i64::from(MAX_HEADCOUNT));
            (role, count as u32)
        })
        .collect())
}

/// Everything an estimate is computed from: the feature tree plus all
/// configuration. This is the persisted document; missing fields take
/// their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateProject {
    pub tree: FeatureTree,
    #[serde(deserialize_with = "lenient::list")]
    pub platforms: Vec<Platform>,
    pub rates: RateTable,
    pub ratios: RoleRatioTable,
    pub durations: DurationTable,
    pub multipliers: MultiplierConfig,
    pub hardware: Vec<HardwareLineItem>,
    pub impact_factors: Vec<ImpactFactor>,
    pub discount: f64,
    pub headcounts: Headcounts,
}

impl Default for EstimateProject {
    fn default() -> Self {
        Self {
            tree: FeatureTree::default(),
            platforms: Vec::new(),
            rates: RateTable::default(),
            ratios: RoleRatioTable::default(),
            durations: DurationTable::default(),
            multipliers: MultiplierConfig::default(),
            hardware: Vec::new(),
            impact_factors: Vec::new(),
            discount: 1.0,
            headcounts: Headcounts::default(),
        }
    }
}
