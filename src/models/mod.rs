//! Domain models for featurecost.
//!
//! # Core Concepts
//!
//! - [`FeatureNode`]: a requirement in the feature breakdown. Nodes nest into a
//!   tree whose top level holds modules; nested nodes with children are
//!   submodules and nested leaves are menus. Kinds are derived, never stored.
//! - [`ButtonOperation`]: an operation on a menu (Create, Edit, ...). Menus and
//!   their buttons are the chargeable units of an estimate.
//! - [`Role`], [`ExperienceTier`], [`Platform`]: the staffing vocabulary.
//! - [`HardwareLineItem`]: infrastructure costed outside the role pipeline.
//! - [`EstimateProject`]: the persisted document bundling the tree with every
//!   table the estimate reads.
//!
//! All keyword enums parse leniently (see [`Keyword`]): unknown values fall
//! back to "absent" instead of failing a whole load.

mod feature;
mod hardware;
mod keyword;
mod project;
mod role;

pub use feature::*;
pub use hardware::*;
pub use keyword::*;
pub use project::*;
pub use role::*;
