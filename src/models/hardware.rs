use serde::{Deserialize, Serialize};

/// A purchased or leased piece of infrastructure, priced per year.
///
/// Hardware is costed independently of the role/day pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareLineItem {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub spec: String,
    pub quantity: u32,
    /// Annual price of one unit.
    pub unit_price: f64,
}

impl HardwareLineItem {
    pub fn new(kind: impl Into<String>, spec: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        Self {
            kind: kind.into(),
            spec: spec.into(),
            quantity,
            unit_price,
        }
    }

    /// Annual price of the whole line.
    pub fn price(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }

    pub fn monthly_unit_price(&self) -> f64 {
        self.unit_price / 12.0
    }
}
