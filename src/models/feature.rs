use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::keyword::{lenient, Keyword};

/// One of four ordered levels shared by complexity, priority, and the
/// impact dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Keyword for Tier {
    const ALL: &'static [Self] = &[Self::Low, Self::Medium, Self::High, Self::VeryHigh];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::VeryHigh => "very_high",
        }
    }
}

/// A requirement in the feature breakdown.
///
/// Nodes own their children exclusively; deleting a node deletes its whole
/// subtree. Children sit behind `Arc` so that history snapshots share every
/// subtree a mutation did not touch (see [`crate::tree::FeatureTree`]).
///
/// The node kind (module / submodule / menu) is never stored. It is derived
/// from the node's position in the live tree, see [`NodeKind::classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureNode {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::option")]
    pub complexity: Option<Tier>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub priority: Option<Tier>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_important: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub remark: String,
    #[serde(default)]
    pub children: Vec<Arc<FeatureNode>>,
    #[serde(default)]
    pub buttons: Vec<ButtonOperation>,
    /// Lookup-only back-reference, rewritten by the tree on insert and move.
    #[serde(default)]
    pub parent_id: Option<Uuid>,
}

impl FeatureNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            complexity: None,
            priority: None,
            is_important: false,
            remark: String::new(),
            children: Vec::new(),
            buttons: Vec::new(),
            parent_id: None,
        }
    }

    pub fn with_complexity(mut self, complexity: Tier) -> Self {
        self.complexity = Some(complexity);
        self
    }

    pub fn with_priority(mut self, priority: Tier) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_child(mut self, child: FeatureNode) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn with_button(mut self, button: ButtonOperation) -> Self {
        self.buttons.push(button);
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// An operation (button) on a leaf menu node. Buttons never have children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ButtonOperation {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::option")]
    pub complexity: Option<Tier>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub priority: Option<Tier>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub is_important: bool,
    #[serde(default, deserialize_with = "lenient::text")]
    pub remark: String,
}

impl ButtonOperation {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            complexity: None,
            priority: None,
            is_important: false,
            remark: String::new(),
        }
    }

    pub fn with_complexity(mut self, complexity: Tier) -> Self {
        self.complexity = Some(complexity);
        self
    }
}

/// Template used by `add_buttons`: the name identifies the button, the rest
/// seeds the new operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ButtonTemplate {
    pub name: String,
    #[serde(default, deserialize_with = "lenient::option")]
    pub complexity: Option<Tier>,
    #[serde(default, deserialize_with = "lenient::option")]
    pub priority: Option<Tier>,
}

impl ButtonTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            complexity: None,
            priority: None,
        }
    }

    /// The six standard operations, in canonical order.
    pub fn standard(complexity: Option<Tier>) -> Vec<Self> {
        STANDARD_BUTTONS
            .iter()
            .map(|name| Self {
                name: (*name).to_string(),
                complexity,
                priority: None,
            })
            .collect()
    }
}

/// Canonical ordering of the standard operations. Custom buttons sort after
/// these, keeping their insertion order.
pub const STANDARD_BUTTONS: &[&str] = &["Create", "Edit", "Delete", "Query", "Import", "Export"];

/// Rank of a button name in canonical order.
pub fn button_rank(name: &str) -> usize {
    STANDARD_BUTTONS
        .iter()
        .position(|standard| *standard == name)
        .unwrap_or(STANDARD_BUTTONS.len())
}

/// The derived role of a node within the tree.
///
/// - `Module`: any top-level node
/// - `Submodule`: a nested node with children
/// - `Menu`: a nested node without children; the only kind that carries work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Module,
    Submodule,
    Menu,
}

impl NodeKind {
    pub fn classify(depth: usize, node: &FeatureNode) -> Self {
        match (depth, node.is_leaf()) {
            (0, _) => Self::Module,
            (_, false) => Self::Submodule,
            (_, true) => Self::Menu,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Module => "module",
            Self::Submodule => "submodule",
            Self::Menu => "menu",
        }
    }
}

/// A pointwise update to one editable field of a node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum NodeField {
    Name(String),
    Complexity(Option<Tier>),
    Priority(Option<Tier>),
    IsImportant(bool),
    Remark(String),
}

impl NodeField {
    pub(crate) fn apply_to_node(self, node: &mut FeatureNode) {
        match self {
            Self::Name(name) => node.name = name,
            Self::Complexity(tier) => node.complexity = tier,
            Self::Priority(tier) => node.priority = tier,
            Self::IsImportant(flag) => node.is_important = flag,
            Self::Remark(remark) => node.remark = remark,
        }
    }

    pub(crate) fn apply_to_button(self, button: &mut ButtonOperation) {
        match self {
            Self::Name(name) => button.name = name,
            Self::Complexity(tier) => button.complexity = tier,
            Self::Priority(tier) => button.priority = tier,
            Self::IsImportant(flag) => button.is_important = flag,
            Self::Remark(remark) => button.remark = remark,
        }
    }
}
