//! The estimation pipeline.
//!
//! [`compute`] turns an [`EstimateProject`] into an [`EstimateResult`]. It is a
//! pure function: no I/O, no hidden state, identical inputs always give an
//! identical result. Results are rebuilt from scratch on every call.
//!
//! # Steps
//!
//! 1. Collect chargeable units: menus (leaves below the top level) and their
//!    buttons. A top-level node without children contributes nothing.
//! 2. Sum their baseline days from the [`DurationTable`].
//! 3. Scale by the [`MultiplierConfig`] aggregate.
//! 4. Derive base roles from the selected platforms.
//! 5. Sum the provisional workload of those roles.
//! 6. Escalate: architect, product manager, and project manager above strict
//!    manpower thresholds; designer whenever a native client is in scope.
//! 7. Compute each role's workload as `adjusted days * ratio`.
//! 8. Total duration is the summed workload times [`PARALLELISM_FACTOR`].
//! 9. Elapsed days per role divide by headcount.
//! 10. Cost per role is `workload / headcount / working days * salary`.
//! 11. Impact factors scale the base cost.
//! 12. The discount yields the final price.
//!
//! Hardware is summed separately and never enters the role pipeline.

mod multiplier;
mod rates;

pub use multiplier::*;
pub use rates::*;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::{EstimateProject, HardwareLineItem, ImpactFactor, Platform, Role};
use crate::tree::FeatureTree;

/// Share of summed role workload that ends up on the calendar, reflecting
/// roles working in parallel.
pub const PARALLELISM_FACTOR: f64 = 0.7;
/// Working days in a billing month.
pub const WORKING_DAYS_PER_MONTH: f64 = 22.0;
/// Provisional manpower (person-days) above which an architect joins.
pub const ARCHITECT_THRESHOLD: f64 = 30.0;
/// Provisional manpower above which a product manager joins.
pub const PRODUCT_MANAGER_THRESHOLD: f64 = 50.0;
/// Provisional manpower above which a project manager joins.
pub const PROJECT_MANAGER_THRESHOLD: f64 = 100.0;

/// Tunable constants of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
    pub parallelism_factor: f64,
    pub working_days_per_month: f64,
    pub architect_threshold: f64,
    pub product_manager_threshold: f64,
    pub project_manager_threshold: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            parallelism_factor: PARALLELISM_FACTOR,
            working_days_per_month: WORKING_DAYS_PER_MONTH,
            architect_threshold: ARCHITECT_THRESHOLD,
            product_manager_threshold: PRODUCT_MANAGER_THRESHOLD,
            project_manager_threshold: PROJECT_MANAGER_THRESHOLD,
        }
    }
}

impl Calibration {
    /// Working days per month, falling back to the default when not positive.
    fn working_days(&self) -> f64 {
        if self.working_days_per_month > 0.0 {
            self.working_days_per_month
        } else {
            WORKING_DAYS_PER_MONTH
        }
    }
}

/// One role's share of the estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamWorkload {
    pub role: Role,
    /// Person-days before dividing by headcount.
    pub work_days: f64,
    pub ratio: f64,
    pub headcount: u32,
    /// Calendar days for this role given its headcount.
    pub elapsed_days: f64,
    pub monthly_salary: f64,
    pub cost: f64,
}

/// Costed hardware line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareCost {
    #[serde(rename = "type")]
    pub kind: String,
    pub spec: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub monthly_unit_price: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareSummary {
    pub items: Vec<HardwareCost>,
    pub annual_total: f64,
    pub monthly_total: f64,
}

/// Output of one pipeline run. Never patched; recompute instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateResult {
    pub chargeable_units: usize,
    pub backend_baseline_days: f64,
    pub aggregate_multiplier: f64,
    pub adjusted_baseline_days: f64,
    pub provisional_manpower: f64,
    pub total_days: f64,
    pub team_workloads: Vec<TeamWorkload>,
    pub base_cost: f64,
    pub impact_factors: Vec<ImpactFactor>,
    pub impact_multiplier: f64,
    pub adjusted_cost: f64,
    pub discount: f64,
    pub final_price: f64,
    pub hardware: HardwareSummary,
}

impl EstimateResult {
    pub fn workload(&self, role: Role) -> Option<&TeamWorkload> {
        self.team_workloads.iter().find(|w| w.role == role)
    }

    pub fn roles(&self) -> Vec<Role> {
        self.team_workloads.iter().map(|w| w.role).collect()
    }
}

/// Run the full pipeline.
pub fn compute(project: &EstimateProject, calibration: &Calibration) -> EstimateResult {
    let (chargeable_units, backend_baseline_days) = baseline_days(&project.tree, &project.durations);
    let aggregate_multiplier = project.multipliers.aggregate();
    let adjusted_baseline_days = backend_baseline_days * aggregate_multiplier;

    let base = base_roles(&project.platforms);
    let provisional_manpower: f64 = base
        .iter()
        .map(|role| adjusted_baseline_days * project.ratios.ratio(*role))
        .sum();
    let roles = escalate(base, provisional_manpower, &project.platforms, calibration);

    let working_days = calibration.working_days();
    let team_workloads: Vec<TeamWorkload> = roles
        .into_iter()
        .map(|role| {
            let ratio = project.ratios.ratio(role);
            let work_days = adjusted_baseline_days * ratio;
            let headcount = project.headcounts.get(role);
            let elapsed_days = work_days / f64::from(headcount);
            let monthly_salary = project.rates.salary_for(role);
            TeamWorkload {
                role,
                work_days,
                ratio,
                headcount,
                elapsed_days,
                monthly_salary,
                cost: elapsed_days / working_days * monthly_salary,
            }
        })
        .collect();

    let total_days = team_workloads.iter().map(|w| w.work_days).sum::<f64>() * calibration.parallelism_factor;
    let base_cost: f64 = team_workloads.iter().map(|w| w.cost).sum();
    let impact_multiplier: f64 = project.impact_factors.iter().map(|f| f.value).product();
    let adjusted_cost = base_cost * impact_multiplier;
    let final_price = adjusted_cost * project.discount;

    tracing::debug!(
        chargeable_units,
        backend_baseline_days,
        provisional_manpower,
        total_days,
        final_price,
        roles = team_workloads.len(),
        "recomputed estimate"
    );

    EstimateResult {
        chargeable_units,
        backend_baseline_days,
        aggregate_multiplier,
        adjusted_baseline_days,
        provisional_manpower,
        total_days,
        team_workloads,
        base_cost,
        impact_factors: project.impact_factors.clone(),
        impact_multiplier,
        adjusted_cost,
        discount: project.discount,
        final_price,
        hardware: hardware_summary(&project.hardware),
    }
}

/// Count chargeable units and sum their baseline days.
///
/// Menus (leaves at depth > 0) count once each, plus once per button.
pub fn baseline_days(tree: &FeatureTree, durations: &DurationTable) -> (usize, f64) {
    let mut units = 0;
    let mut days = 0.0;
    for visit in tree.walk() {
        if visit.depth == 0 || !visit.node.is_leaf() {
            continue;
        }
        units += 1 + visit.node.buttons.len();
        days += durations.days(visit.node.complexity);
        days += visit
            .node
            .buttons
            .iter()
            .map(|b| durations.days(b.complexity))
            .sum::<f64>();
    }
    (units, days)
}

/// Union of the roles implied by each selected platform.
pub fn base_roles(platforms: &[Platform]) -> BTreeSet<Role> {
    platforms
        .iter()
        .flat_map(|p| p.roles().iter().copied())
        .collect()
}

/// Add escalation roles to `roles`. Thresholds are strict (`>`).
pub fn escalate(
    mut roles: BTreeSet<Role>,
    provisional_manpower: f64,
    platforms: &[Platform],
    calibration: &Calibration,
) -> BTreeSet<Role> {
    if provisional_manpower > calibration.architect_threshold {
        roles.insert(Role::Architect);
    }
    if provisional_manpower > calibration.product_manager_threshold {
        roles.insert(Role::ProductManager);
    }
    if provisional_manpower > calibration.project_manager_threshold {
        roles.insert(Role::ProjectManager);
    }
    if platforms.iter().any(Platform::needs_designer) {
        roles.insert(Role::Designer);
    }
    roles
}

pub fn hardware_summary(items: &[HardwareLineItem]) -> HardwareSummary {
    let items: Vec<HardwareCost> = items
        .iter()
        .map(|item| HardwareCost {
            kind: item.kind.clone(),
            spec: item.spec.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            monthly_unit_price: item.monthly_unit_price(),
            price: item.price(),
        })
        .collect();
    let annual_total: f64 = items.iter().map(|i| i.price).sum();
    HardwareSummary {
        items,
        annual_total,
        monthly_total: annual_total / 12.0,
    }
}
