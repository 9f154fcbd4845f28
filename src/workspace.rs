//! An open project: the document, its tree history, and recompute.
//!
//! Editors go through [`Workspace`] rather than the tree directly so that
//! every successful tree mutation is snapshotted. Configuration changes are
//! not part of tree history. Recompute is explicit: call
//! [`Workspace::recompute`] after whatever changes the caller batches.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::config::EstimatorConfig;
use crate::estimate::{self, Calibration, DurationTable, EstimateResult, MultiplierConfig, RateTable, RoleRatioTable};
use crate::models::{
    clamped_headcounts, ButtonOperation, ButtonTemplate, EstimateProject, FeatureNode, HardwareLineItem, ImpactFactor,
    NodeField, Platform, Role,
};
use crate::tree::{FeatureTree, HistoryManager, TreeError};

/// Partial configuration update. Absent fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigUpdate {
    pub platforms: Option<Vec<Platform>>,
    pub rates: Option<RateTable>,
    pub ratios: Option<RoleRatioTable>,
    pub durations: Option<DurationTable>,
    pub multipliers: Option<MultiplierConfig>,
    pub hardware: Option<Vec<HardwareLineItem>>,
    pub impact_factors: Option<Vec<ImpactFactor>>,
    pub discount: Option<f64>,
    #[serde(default, deserialize_with = "optional_headcounts")]
    pub headcounts: Option<BTreeMap<Role, u32>>,
}

/// Headcount updates are read like stored headcounts: bad entries are
/// dropped and counts are clamped.
fn optional_headcounts<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<BTreeMap<Role, u32>>, D::Error> {
    clamped_headcounts(deserializer).map(Some)
}

#[derive(Debug, Clone)]
pub struct Workspace {
    project: EstimateProject,
    history: HistoryManager,
    calibration: Calibration,
}

impl Workspace {
    pub fn new(project: EstimateProject, calibration: Calibration, history_capacity: usize) -> Self {
        let history = HistoryManager::starting_from(project.tree.clone(), history_capacity);
        Self {
            project,
            history,
            calibration,
        }
    }

    pub fn from_config(project: EstimateProject, config: &EstimatorConfig) -> Self {
        Self::new(project, config.calibration.clone(), config.history_capacity)
    }

    pub fn project(&self) -> &EstimateProject {
        &self.project
    }

    pub fn into_project(self) -> EstimateProject {
        self.project
    }

    pub fn tree(&self) -> &FeatureTree {
        &self.project.tree
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Run the pipeline over the current document.
    pub fn recompute(&self) -> EstimateResult {
        estimate::compute(&self.project, &self.calibration)
    }

    // ============================================================
    // Tree mutations (snapshotted)
    // ============================================================

    pub fn insert_node(&mut self, parent_id: Option<Uuid>, node: FeatureNode) -> Result<Uuid, TreeError> {
        self.mutate(|tree| tree.insert_node(parent_id, node))
    }

    pub fn move_node(&mut self, node_id: Uuid, new_parent_id: Option<Uuid>, new_index: usize) -> Result<(), TreeError> {
        self.mutate(|tree| tree.move_node(node_id, new_parent_id, new_index))
    }

    pub fn delete_node(&mut self, node_id: Uuid) -> Result<Vec<Uuid>, TreeError> {
        self.mutate(|tree| tree.delete_node(node_id))
    }

    pub fn update_field(&mut self, node_id: Uuid, field: NodeField) -> Result<(), TreeError> {
        self.mutate(|tree| tree.update_field(node_id, field))
    }

    pub fn add_buttons(&mut self, node_id: Uuid, templates: &[ButtonTemplate]) -> Result<usize, TreeError> {
        self.mutate(|tree| tree.add_buttons(node_id, templates))
    }

    pub fn update_button(&mut self, node_id: Uuid, button_id: Uuid, field: NodeField) -> Result<(), TreeError> {
        self.mutate(|tree| tree.update_button(node_id, button_id, field))
    }

    pub fn remove_button(&mut self, node_id: Uuid, button_id: Uuid) -> Result<ButtonOperation, TreeError> {
        self.mutate(|tree| tree.remove_button(node_id, button_id))
    }

    /// Restore the previous tree version. Returns false at the oldest version.
    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(tree) => {
                self.project.tree = tree;
                true
            }
            None => false,
        }
    }

    /// Reapply the next tree version. Returns false at the newest version.
    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(tree) => {
                self.project.tree = tree;
                true
            }
            None => false,
        }
    }

    fn mutate<T>(&mut self, op: impl FnOnce(&mut FeatureTree) -> Result<T, TreeError>) -> Result<T, TreeError> {
        let out = op(&mut self.project.tree)?;
        self.history.commit(&self.project.tree);
        Ok(out)
    }

    // ============================================================
    // Configuration
    // ============================================================

    /// Returns the headcount actually stored after clamping.
    pub fn set_headcount(&mut self, role: Role, count: u32) -> u32 {
        self.project.headcounts.set(role, count)
    }

    pub fn set_discount(&mut self, discount: f64) {
        self.project.discount = discount;
    }

    pub fn set_platforms(&mut self, platforms: Vec<Platform>) {
        self.project.platforms = platforms;
    }

    pub fn rates_mut(&mut self) -> &mut RateTable {
        &mut self.project.rates
    }

    pub fn ratios_mut(&mut self) -> &mut RoleRatioTable {
        &mut self.project.ratios
    }

    pub fn durations_mut(&mut self) -> &mut DurationTable {
        &mut self.project.durations
    }

    pub fn multipliers_mut(&mut self) -> &mut MultiplierConfig {
        &mut self.project.multipliers
    }

    pub fn apply_config(&mut self, update: ConfigUpdate) {
        let project = &mut self.project;
        if let Some(platforms) = update.platforms {
            project.platforms = platforms;
        }
        if let Some(rates) = update.rates {
            project.rates = rates;
        }
        if let Some(ratios) = update.ratios {
            project.ratios = ratios;
        }
        if let Some(durations) = update.durations {
            project.durations = durations;
        }
        if let Some(multipliers) = update.multipliers {
            project.multipliers = multipliers;
        }
        if let Some(hardware) = update.hardware {
            project.hardware = hardware;
        }
        if let Some(factors) = update.impact_factors {
            project.impact_factors = factors;
        }
        if let Some(discount) = update.discount {
            project.discount = discount;
        }
        for (role, count) in update.headcounts.unwrap_or_default() {
            project.headcounts.set(role, count);
        }
    }
}
