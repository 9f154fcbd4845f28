//! ASCII tree rendering for feature breakdowns.

use crate::models::{FeatureNode, NodeKind};
use crate::tree::FeatureTree;

const MODULE: char = '■';
const SUBMODULE: char = '▣';
const MENU: char = '○';

/// Get the symbol for a node kind.
fn kind_symbol(kind: NodeKind) -> char {
    match kind {
        NodeKind::Module => MODULE,
        NodeKind::Submodule => SUBMODULE,
        NodeKind::Menu => MENU,
    }
}

/// Render a feature tree as ASCII art with kind symbols.
///
/// Menus list their buttons in brackets. Example output:
/// ```text
/// ■ Orders
/// ├── ▣ Checkout
/// │   ├── ○ Cart [Create, Edit, Delete]
/// │   └── ○ Payment
/// └── ○ History [Query, Export]
/// ```
pub fn render_tree(tree: &FeatureTree) -> String {
    let mut output = String::new();
    for root in tree.roots() {
        render_node(&mut output, root, "", true, 0);
    }
    output
}

/// Recursively render a node and its children.
fn render_node(output: &mut String, node: &FeatureNode, prefix: &str, is_last: bool, depth: usize) {
    let symbol = kind_symbol(NodeKind::classify(depth, node));

    if depth > 0 {
        let branch = if is_last { "└── " } else { "├── " };
        output.push_str(prefix);
        output.push_str(branch);
    }
    output.push(symbol);
    output.push(' ');
    output.push_str(&node.name);
    if !node.buttons.is_empty() {
        let names: Vec<&str> = node.buttons.iter().map(|b| b.name.as_str()).collect();
        output.push_str(" [");
        output.push_str(&names.join(", "));
        output.push(']');
    }
    output.push('\n');

    // Top-level children start flush left; deeper ones continue the rails.
    let child_prefix = if depth == 0 {
        String::new()
    } else {
        let continuation = if is_last { "    " } else { "│   " };
        format!("{}{}", prefix, continuation)
    };

    for (i, child) in node.children.iter().enumerate() {
        let child_is_last = i == node.children.len() - 1;
        render_node(output, child, &child_prefix, child_is_last, depth + 1);
    }
}
