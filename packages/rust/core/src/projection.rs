//! Flattening upstream asset records into display rows.

use checkio_shared::{DisplayPropertySpec, ProjectedAsset, PropertyValue};
use serde_json::Value;

use crate::path::{display_at, display_value};

/// Header of the assignee column.
pub const ASSIGNED_TO_HEADER: &str = "Assigned To";

/// Header of the category column.
pub const CATEGORY_HEADER: &str = "Category";

/// Column headers for rows projected with `specs`: the fixed columns first,
/// then one per display property in order.
pub fn column_headers(specs: &[DisplayPropertySpec]) -> Vec<String> {
    [ASSIGNED_TO_HEADER, CATEGORY_HEADER]
        .into_iter()
        .map(String::from)
        .chain(specs.iter().map(|spec| spec.label.clone()))
        .collect()
}

/// The record's integer `id`, if it has one.
pub fn asset_id(record: &Value) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

/// Project `record` through `specs`. `None` when the record has no integer id.
pub fn project_asset(record: &Value, specs: &[DisplayPropertySpec]) -> Option<ProjectedAsset> {
    let id = asset_id(record)?;

    let (assigned_to_name, assigned_to_type) = match record.get("assigned_to") {
        Some(Value::Object(assignee)) => (
            non_null_text(assignee.get("name")),
            non_null_text(assignee.get("type")),
        ),
        _ => (None, None),
    };

    let properties = specs
        .iter()
        .map(|spec| PropertyValue {
            label: spec.label.clone(),
            value: display_at(record, &spec.path),
        })
        .collect();

    Some(ProjectedAsset {
        id,
        assigned_to_name,
        assigned_to_type,
        category_name: display_at(record, "category.name"),
        properties,
    })
}

fn non_null_text(value: Option<&Value>) -> Option<String> {
    value.filter(|v| !v.is_null()).map(display_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn specs() -> Vec<DisplayPropertySpec> {
        vec![
            DisplayPropertySpec::new("Serial", "serial"),
            DisplayPropertySpec::new("Model", "model.name"),
        ]
    }

    #[test]
    fn headers_follow_spec_order() {
        assert_eq!(
            column_headers(&specs()),
            vec!["Assigned To", "Category", "Serial", "Model"]
        );
        assert_eq!(column_headers(&[]), vec!["Assigned To", "Category"]);
    }

    #[test]
    fn projects_assigned_asset() {
        let record = json!({
            "id": 41,
            "serial": "SN-0041",
            "model": {"name": "Latitude 7440"},
            "category": {"id": 2, "name": "Laptops"},
            "assigned_to": {"id": 9, "name": "Grace Hopper", "type": "user"}
        });

        let row = project_asset(&record, &specs()).expect("projected");
        assert_eq!(row.id, 41);
        assert_eq!(row.assigned_to_name.as_deref(), Some("Grace Hopper"));
        assert_eq!(row.assigned_to_type.as_deref(), Some("user"));
        assert_eq!(row.category_name, "Laptops");
        assert_eq!(
            row.properties,
            vec![
                PropertyValue { label: "Serial".into(), value: "SN-0041".into() },
                PropertyValue { label: "Model".into(), value: "Latitude 7440".into() },
            ]
        );
    }

    #[test]
    fn malformed_fields_become_empty() {
        let record = json!({
            "id": 42,
            "assigned_to": ["not", "a", "mapping"],
            "category": null,
            "model": "flat string"
        });

        let row = project_asset(&record, &specs()).expect("projected");
        assert_eq!(row.assigned_to_name, None);
        assert_eq!(row.assigned_to_type, None);
        assert_eq!(row.category_name, "");
        assert!(row.properties.iter().all(|p| p.value.is_empty()));
    }

    #[test]
    fn unassigned_asset_has_no_assignee() {
        let record = json!({"id": 43, "assigned_to": null});
        let row = project_asset(&record, &specs()).expect("projected");
        assert_eq!(row.assigned_to_name, None);
    }

    #[test]
    fn records_without_integer_id_are_not_projected() {
        assert!(project_asset(&json!({"serial": "SN"}), &specs()).is_none());
        assert!(project_asset(&json!({"id": "44"}), &specs()).is_none());
    }
}
