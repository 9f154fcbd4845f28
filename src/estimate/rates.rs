//! Role salary, ratio, and duration lookups.
//!
//! Every lookup resolves to a neutral value when configuration is missing:
//! no salary entry costs 0, no complexity takes 0 days, and a role missing
//! from a ratio table falls back to its built-in ratio.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{lenient, ExperienceTier, Keyword, Role, Tier};

/// Salary growth per year of experience.
pub const YEARLY_SALARY_STEP: f64 = 0.05;
/// Cap on the experience bonus (50%).
pub const MAX_EXPERIENCE_BONUS: f64 = 0.5;

/// Baseline monthly salary of an intermediate hire, in thousands.
pub fn base_salary(role: Role) -> f64 {
    match role {
        Role::ProductManager => 25.0,
        Role::ProjectManager => 25.0,
        Role::Architect => 35.0,
        Role::Designer => 18.0,
        Role::Backend => 22.0,
        Role::Frontend => 20.0,
        Role::Ios => 22.0,
        Role::Android => 22.0,
        Role::MiniProgram => 18.0,
    }
}

/// Suggested monthly salary (thousands), rounded to a whole thousand.
pub fn recommended_salary(role: Role, tier: ExperienceTier, work_years: f64) -> f64 {
    let bonus = (work_years.max(0.0) * YEARLY_SALARY_STEP).min(MAX_EXPERIENCE_BONUS);
    (base_salary(role) * tier.multiplier() * (1.0 + bonus)).round()
}

/// One row of the rate table.
///
/// `salary` is sticky: it is recomputed from role, tier, and years only when
/// the role or tier changes through [`RateTable`], never after a manual edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleRateEntry {
    pub role: Role,
    pub experience_tier: ExperienceTier,
    #[serde(default)]
    pub work_years: f64,
    pub salary: f64,
}

impl RoleRateEntry {
    pub fn new(role: Role, experience_tier: ExperienceTier, work_years: f64) -> Self {
        Self {
            role,
            experience_tier,
            work_years,
            salary: recommended_salary(role, experience_tier, work_years),
        }
    }

    fn recompute_salary(&mut self) {
        self.salary = recommended_salary(self.role, self.experience_tier, self.work_years);
    }
}

/// Per-role salary configuration, one row per role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    entries: Vec<RoleRateEntry>,
}

impl Default for RateTable {
    fn default() -> Self {
        Self {
            entries: Role::ALL
                .iter()
                .map(|role| RoleRateEntry::new(*role, ExperienceTier::Intermediate, 3.0))
                .collect(),
        }
    }
}

impl RateTable {
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn from_entries(entries: Vec<RoleRateEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[RoleRateEntry] {
        &self.entries
    }

    pub fn entry(&self, role: Role) -> Option<&RoleRateEntry> {
        self.entries.iter().find(|e| e.role == role)
    }

    fn entry_mut(&mut self, role: Role) -> Option<&mut RoleRateEntry> {
        self.entries.iter_mut().find(|e| e.role == role)
    }

    /// Monthly salary for a role, 0 when the role has no entry.
    pub fn salary_for(&self, role: Role) -> f64 {
        self.entry(role).map(|e| e.salary).unwrap_or(0.0)
    }

    /// Insert or replace the row for `entry.role`.
    pub fn upsert(&mut self, entry: RoleRateEntry) {
        match self.entry_mut(entry.role) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn remove(&mut self, role: Role) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.role != role);
        self.entries.len() != before
    }

    /// Change a row's experience tier. Always overwrites the salary.
    pub fn set_experience_tier(&mut self, role: Role, tier: ExperienceTier) -> bool {
        let Some(entry) = self.entry_mut(role) else {
            return false;
        };
        entry.experience_tier = tier;
        entry.recompute_salary();
        true
    }

    /// Reassign a row to another role. Always overwrites the salary.
    ///
    /// Fails when `to` already has a row of its own.
    pub fn set_role(&mut self, from: Role, to: Role) -> bool {
        if from != to && self.entry(to).is_some() {
            return false;
        }
        let Some(entry) = self.entry_mut(from) else {
            return false;
        };
        entry.role = to;
        entry.recompute_salary();
        true
    }

    /// Years feed the next recommendation but do not touch the current salary.
    pub fn set_work_years(&mut self, role: Role, work_years: f64) -> bool {
        let Some(entry) = self.entry_mut(role) else {
            return false;
        };
        entry.work_years = work_years;
        true
    }

    /// Manual salary edit.
    pub fn set_salary(&mut self, role: Role, salary: f64) -> bool {
        let Some(entry) = self.entry_mut(role) else {
            return false;
        };
        entry.salary = salary;
        true
    }
}

/// Built-in workload ratio of a role relative to backend.
pub fn default_ratio(role: Role) -> f64 {
    match role {
        Role::ProductManager => 0.3,
        Role::ProjectManager => 0.2,
        Role::Architect => 0.2,
        Role::Designer => 0.3,
        Role::Backend => 1.0,
        Role::Frontend => 0.5,
        Role::Ios => 0.6,
        Role::Android => 0.6,
        Role::MiniProgram => 0.5,
    }
}

/// Workload ratio of each role relative to the backend baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RoleRatioTable {
    ratios: BTreeMap<Role, f64>,
}

impl<'de> Deserialize<'de> for RoleRatioTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self {
            ratios: lenient::map(deserializer)?,
        })
    }
}

impl Default for RoleRatioTable {
    fn default() -> Self {
        Self {
            ratios: Role::ALL.iter().map(|r| (*r, default_ratio(*r))).collect(),
        }
    }
}

impl RoleRatioTable {
    pub fn ratio(&self, role: Role) -> f64 {
        if role == Role::Backend {
            return 1.0;
        }
        self.ratios
            .get(&role)
            .copied()
            .unwrap_or_else(|| default_ratio(role))
    }

    /// Backend is the baseline and stays at 1.0.
    pub fn set_ratio(&mut self, role: Role, ratio: f64) -> bool {
        if role == Role::Backend {
            return false;
        }
        self.ratios.insert(role, ratio);
        true
    }
}

/// Baseline days per complexity tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DurationTable {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
    pub very_high: f64,
}

impl Default for DurationTable {
    fn default() -> Self {
        Self {
            low: 2.0,
            medium: 4.0,
            high: 6.0,
            very_high: 10.0,
        }
    }
}

impl DurationTable {
    pub fn days(&self, complexity: Option<Tier>) -> f64 {
        match complexity {
            Some(Tier::Low) => self.low,
            Some(Tier::Medium) => self.medium,
            Some(Tier::High) => self.high,
            Some(Tier::VeryHigh) => self.very_high,
            None => 0.0,
        }
    }

    pub fn set_days(&mut self, tier: Tier, days: f64) {
        match tier {
            Tier::Low => self.low = days,
            Tier::Medium => self.medium = days,
            Tier::High => self.high = days,
            Tier::VeryHigh => self.very_high = days,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recommended_salary_applies_tier_and_years() {
        // 22 * 1.2 * (1 + 0.25) = 33
        assert_eq!(recommended_salary(Role::Backend, ExperienceTier::Senior, 5.0), 33.0);
        // 20 * 0.7 * 1.0 = 14
        assert_eq!(recommended_salary(Role::Frontend, ExperienceTier::Junior, 0.0), 14.0);
    }

    #[test]
    fn experience_bonus_is_capped() {
        let ten = recommended_salary(Role::Architect, ExperienceTier::Principal, 10.0);
        let thirty = recommended_salary(Role::Architect, ExperienceTier::Principal, 30.0);
        assert_eq!(ten, thirty);
        // 35 * 1.5 * 1.5 = 78.75
        assert_eq!(ten, 79.0);
    }

    #[test]
    fn manual_salary_survives_years_change_but_not_tier_change() {
        let mut table = RateTable::default();
        table.set_salary(Role::Backend, 40.0);
        table.set_work_years(Role::Backend, 8.0);
        assert_eq!(table.salary_for(Role::Backend), 40.0);

        table.set_experience_tier(Role::Backend, ExperienceTier::Senior);
        assert_eq!(
            table.salary_for(Role::Backend),
            recommended_salary(Role::Backend, ExperienceTier::Senior, 8.0)
        );
    }

    #[test]
    fn role_change_recomputes_and_rejects_duplicates() {
        let mut table = RateTable::from_entries(vec![RoleRateEntry::new(
            Role::Frontend,
            ExperienceTier::Intermediate,
            0.0,
        )]);
        table.set_salary(Role::Frontend, 99.0);

        assert!(table.set_role(Role::Frontend, Role::Architect));
        assert_eq!(table.salary_for(Role::Architect), 35.0);
        assert_eq!(table.salary_for(Role::Frontend), 0.0);

        table.upsert(RoleRateEntry::new(Role::Designer, ExperienceTier::Junior, 1.0));
        assert!(!table.set_role(Role::Architect, Role::Designer));
    }

    #[test]
    fn missing_lookups_are_neutral() {
        let table = RateTable::empty();
        assert_eq!(table.salary_for(Role::Backend), 0.0);
        assert_eq!(DurationTable::default().days(None), 0.0);
    }

    #[test]
    fn ratio_table_falls_back_and_pins_backend() {
        let mut ratios: RoleRatioTable = serde_json::from_str(r#"{"frontend": 0.8, "tester": 3}"#).unwrap();
        assert_eq!(ratios.ratio(Role::Frontend), 0.8);
        assert_eq!(ratios.ratio(Role::Ios), default_ratio(Role::Ios));
        assert!(!ratios.set_ratio(Role::Backend, 2.0));
        assert_eq!(ratios.ratio(Role::Backend), 1.0);
    }
}
