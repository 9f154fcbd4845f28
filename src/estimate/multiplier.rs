use serde::{Deserialize, Serialize};

use crate::models::Keyword;

/// Multiplier of each tier index, lowest tier first.
pub const TIER_MULTIPLIERS: [f64; 4] = [1.0, 1.2, 1.5, 2.0];

/// Multiplier for a tier index. Indices outside 0..=3 are neutral.
pub fn tier_multiplier(index: u8) -> f64 {
    TIER_MULTIPLIERS
        .get(index as usize)
        .copied()
        .unwrap_or(1.0)
}

/// An independent axis of non-functional scope that inflates baseline days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    UserScale,
    ServiceLevel,
    Quality,
    Security,
    DisasterRecovery,
    Flexibility,
}

impl Keyword for Dimension {
    const ALL: &'static [Self] = &[
        Self::UserScale,
        Self::ServiceLevel,
        Self::Quality,
        Self::Security,
        Self::DisasterRecovery,
        Self::Flexibility,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::UserScale => "user_scale",
            Self::ServiceLevel => "service_level",
            Self::Quality => "quality",
            Self::Security => "security",
            Self::DisasterRecovery => "disaster_recovery",
            Self::Flexibility => "flexibility",
        }
    }
}

/// Selected tier index (0-3) for each of the six dimensions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiplierConfig {
    pub user_scale: u8,
    pub service_level: u8,
    pub quality: u8,
    pub security: u8,
    pub disaster_recovery: u8,
    pub flexibility: u8,
}

impl MultiplierConfig {
    /// Every dimension at the same tier.
    pub fn uniform(tier: u8) -> Self {
        let mut config = Self::default();
        for dimension in Dimension::ALL {
            config.set_tier(*dimension, tier);
        }
        config
    }

    pub fn tier(&self, dimension: Dimension) -> u8 {
        match dimension {
            Dimension::UserScale => self.user_scale,
            Dimension::ServiceLevel => self.service_level,
            Dimension::Quality => self.quality,
            Dimension::Security => self.security,
            Dimension::DisasterRecovery => self.disaster_recovery,
            Dimension::Flexibility => self.flexibility,
        }
    }

    /// Select a tier; indices above the top tier are clamped to it.
    pub fn set_tier(&mut self, dimension: Dimension, tier: u8) {
        let tier = tier.min(TIER_MULTIPLIERS.len() as u8 - 1);
        let slot = match dimension {
            Dimension::UserScale => &mut self.user_scale,
            Dimension::ServiceLevel => &mut self.service_level,
            Dimension::Quality => &mut self.quality,
            Dimension::Security => &mut self.security,
            Dimension::DisasterRecovery => &mut self.disaster_recovery,
            Dimension::Flexibility => &mut self.flexibility,
        };
        *slot = tier;
    }

    /// Combined scalar: `1 + Σ (multiplier(tier) - 1)`.
    ///
    /// Dimensions add above the 1.0 baseline instead of compounding, so the
    /// result spans 1.0 (all lowest) to 7.0 (all highest).
    pub fn aggregate(&self) -> f64 {
        1.0 + Dimension::ALL
            .iter()
            .map(|d| tier_multiplier(self.tier(*d)) - 1.0)
            .sum::<f64>()
    }
}
