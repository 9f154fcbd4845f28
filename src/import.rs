//! Loading persisted documents without all-or-nothing failure.
//!
//! A document is read section by section. Hardware line items and rate
//! entries are validated one by one: an entry with a missing or malformed
//! required field is skipped and reported, the rest still load. Any other
//! top-level field that cannot be read falls back to its default and is
//! reported the same way. Only input that is not a JSON object fails.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::estimate::{RateTable, RoleRateEntry};
use crate::models::{EstimateProject, HardwareLineItem};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Document must be a JSON object")]
    NotAnObject,
}

/// A part of the document that was dropped during import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedEntry {
    /// Top-level field the entry belongs to, e.g. `hardware`.
    pub section: String,
    /// Position within the section, when the section is a list.
    pub index: Option<usize>,
    pub reason: String,
}

/// Result of an import: the loaded project plus whatever was skipped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialImport {
    pub project: EstimateProject,
    pub skipped: Vec<SkippedEntry>,
}

impl PartialImport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub fn import_project(json: &str) -> Result<PartialImport, ImportError> {
    import_value(serde_json::from_str(json)?)
}

pub fn import_value(value: Value) -> Result<PartialImport, ImportError> {
    let Value::Object(mut fields) = value else {
        return Err(ImportError::NotAnObject);
    };
    let mut skipped = Vec::new();

    let hardware = fields
        .remove("hardware")
        .map(|section| import_list::<HardwareLineItem>("hardware", section, &mut skipped));
    let rates = fields
        .remove("rates")
        .map(|section| import_list::<RoleRateEntry>("rates", section, &mut skipped));

    let mut project = import_fields(fields, &mut skipped);
    if let Some(items) = hardware {
        project.hardware = items;
    }
    if let Some(entries) = rates {
        project.rates = RateTable::from_entries(entries);
    }

    for entry in &skipped {
        tracing::warn!(
            section = %entry.section,
            index = ?entry.index,
            reason = %entry.reason,
            "skipped entry during import"
        );
    }

    Ok(PartialImport { project, skipped })
}

/// Serialize a project in its persisted form.
pub fn export_project(project: &EstimateProject) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(project)
}

fn import_list<T: DeserializeOwned>(section: &str, value: Value, skipped: &mut Vec<SkippedEntry>) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        other => {
            skipped.push(SkippedEntry {
                section: section.to_string(),
                index: None,
                reason: format!("expected a list, found {}", kind_of(&other)),
            });
            return Vec::new();
        }
    };

    items
        .into_iter()
        .enumerate()
        .filter_map(|(index, item)| match serde_json::from_value(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                skipped.push(SkippedEntry {
                    section: section.to_string(),
                    index: Some(index),
                    reason: e.to_string(),
                });
                None
            }
        })
        .collect()
}

/// Read the remaining top-level fields, dropping any that fail on their own.
fn import_fields(fields: Map<String, Value>, skipped: &mut Vec<SkippedEntry>) -> EstimateProject {
    if let Ok(project) = serde_json::from_value(Value::Object(fields.clone())) {
        return project;
    }

    let mut readable = Map::new();
    for (key, value) in fields {
        let single = Value::Object(Map::from_iter([(key.clone(), value.clone())]));
        match serde_json::from_value::<EstimateProject>(single) {
            Ok(_) => {
                readable.insert(key, value);
            }
            Err(e) => skipped.push(SkippedEntry {
                section: key,
                index: None,
                reason: e.to_string(),
            }),
        }
    }
    serde_json::from_value(Value::Object(readable)).unwrap_or_default()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use serde_json::json;

    #[test]
    fn clean_document_imports_completely() {
        let result = import_value(json!({
            "platforms": ["web"],
            "hardware": [{"type": "Server", "quantity": 1, "unit_price": 100.0}]
        }))
        .unwrap();
        assert!(result.is_complete());
        assert_eq!(result.project.hardware.len(), 1);
    }

    #[test]
    fn malformed_optional_node_fields_keep_the_tree() {
        let result = import_value(json!({
            "tree": [{
                "name": "Orders",
                "children": [
                    {"name": "List", "complexity": "low", "is_important": "yes", "remark": 7},
                    {"name": ["Detail"], "complexity": "medium",
                     "buttons": [{"name": "Create", "is_important": 1, "remark": null}]}
                ]
            }]
        }))
        .unwrap();

        assert!(result.is_complete(), "skipped: {:?}", result.skipped);
        let module = &result.project.tree.roots()[0];
        assert_eq!(module.children.len(), 2);
        assert!(!module.children[0].is_important);
        assert_eq!(module.children[0].remark, "7");
        assert_eq!(module.children[1].name, "");
        assert!(!module.children[1].buttons[0].is_important);
    }

    #[test]
    fn invalid_hardware_items_are_skipped_individually() {
        let result = import_value(json!({
            "hardware": [
                {"type": "Server", "quantity": 2, "unit_price": 100.0},
                {"type": "Disk", "unit_price": 50.0},
                {"quantity": 1, "unit_price": 10.0},
                {"type": "Switch", "quantity": 1, "unit_price": 80.0}
            ]
        }))
        .unwrap();

        assert_eq!(result.project.hardware.len(), 2);
        assert_eq!(result.project.hardware[1].kind, "Switch");
        let indices: Vec<_> = result.skipped.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![Some(1), Some(2)]);
        assert!(result.skipped.iter().all(|s| s.section == "hardware"));
    }

    #[test]
    fn invalid_rate_entries_are_skipped() {
        let result = import_value(json!({
            "rates": [
                {"role": "backend", "experience_tier": "senior", "work_years": 4, "salary": 30},
                {"role": "astronaut", "experience_tier": "senior", "salary": 90}
            ]
        }))
        .unwrap();
        assert_eq!(result.project.rates.entries().len(), 1);
        assert_eq!(result.project.rates.salary_for(Role::Backend), 30.0);
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn unreadable_scalar_field_falls_back_to_default() {
        let result = import_value(json!({
            "discount": "ten percent",
            "platforms": ["ios"]
        }))
        .unwrap();
        assert_eq!(result.project.discount, 1.0);
        assert_eq!(result.project.platforms.len(), 1);
        assert_eq!(result.skipped[0].section, "discount");
    }

    #[test]
    fn non_object_document_fails() {
        assert!(matches!(import_value(json!([1, 2])), Err(ImportError::NotAnObject)));
        assert!(matches!(import_project("{not json"), Err(ImportError::Json(_))));
    }
}
