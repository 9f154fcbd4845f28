use serde::{Deserialize, Serialize};

use super::keyword::Keyword;

/// A staffing role.
///
/// Declaration order is the canonical display order of team workloads, so
/// `Ord` on this enum is what the estimate sorts by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    ProductManager,
    ProjectManager,
    Architect,
    Designer,
    Backend,
    Frontend,
    Ios,
    Android,
    MiniProgram,
}

impl Keyword for Role {
    const ALL: &'static [Self] = &[
        Self::ProductManager,
        Self::ProjectManager,
        Self::Architect,
        Self::Designer,
        Self::Backend,
        Self::Frontend,
        Self::Ios,
        Self::Android,
        Self::MiniProgram,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::ProductManager => "product_manager",
            Self::ProjectManager => "project_manager",
            Self::Architect => "architect",
            Self::Designer => "designer",
            Self::Backend => "backend",
            Self::Frontend => "frontend",
            Self::Ios => "ios",
            Self::Android => "android",
            Self::MiniProgram => "mini_program",
        }
    }
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ProductManager => "Product Manager",
            Self::ProjectManager => "Project Manager",
            Self::Architect => "Architect",
            Self::Designer => "Designer",
            Self::Backend => "Backend Developer",
            Self::Frontend => "Frontend Developer",
            Self::Ios => "iOS Developer",
            Self::Android => "Android Developer",
            Self::MiniProgram => "Mini-Program Developer",
        }
    }
}

/// Seniority band of a role's rate entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceTier {
    Principal,
    Senior,
    Intermediate,
    Junior,
}

impl Keyword for ExperienceTier {
    const ALL: &'static [Self] = &[Self::Principal, Self::Senior, Self::Intermediate, Self::Junior];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Principal => "principal",
            Self::Senior => "senior",
            Self::Intermediate => "intermediate",
            Self::Junior => "junior",
        }
    }
}

impl ExperienceTier {
    /// Salary multiplier relative to the intermediate band.
    pub fn multiplier(&self) -> f64 {
        match self {
            Self::Principal => 1.5,
            Self::Senior => 1.2,
            Self::Intermediate => 1.0,
            Self::Junior => 0.7,
        }
    }
}

/// A delivery platform the estimate is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Web,
    Ios,
    Android,
    MiniProgram,
    /// Headless service with no client of its own.
    Api,
}

impl Keyword for Platform {
    const ALL: &'static [Self] = &[
        Self::Web,
        Self::Ios,
        Self::Android,
        Self::MiniProgram,
        Self::Api,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Ios => "ios",
            Self::Android => "android",
            Self::MiniProgram => "mini_program",
            Self::Api => "api",
        }
    }
}

impl Platform {
    /// Roles the platform implies: its client developer (if any) plus backend.
    pub fn roles(&self) -> &'static [Role] {
        match self {
            Self::Web => &[Role::Frontend, Role::Backend],
            Self::Ios => &[Role::Ios, Role::Backend],
            Self::Android => &[Role::Android, Role::Backend],
            Self::MiniProgram => &[Role::MiniProgram, Role::Backend],
            Self::Api => &[Role::Backend],
        }
    }

    /// Whether the platform ships a native client that needs a dedicated designer.
    pub fn needs_designer(&self) -> bool {
        matches!(self, Self::Ios | Self::Android | Self::MiniProgram)
    }
}
