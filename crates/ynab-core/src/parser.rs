//! Category tree parser
//!
//! Turns the `GET /budgets/{id}/categories` response into the metadata index
//! and the flat category list. Pure transform, no I/O.

use serde::Deserialize;

use crate::error::{ExporterError, Result};
use crate::types::{Category, CategoryGroup, MetadataEntry, MetadataIndex};

#[derive(Debug, Deserialize)]
struct RawResponse {
    data: RawData,
}

#[derive(Debug, Deserialize)]
struct RawData {
    category_groups: Vec<RawCategoryGroup>,
}

#[derive(Debug, Deserialize)]
struct RawCategoryGroup {
    id: String,
    name: String,
    hidden: bool,
    categories: Vec<RawCategory>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    id: String,
    name: String,
    hidden: bool,
    #[serde(default)]
    category_group_id: Option<String>,
    budgeted: i64,
    activity: i64,
    balance: i64,
}

/// Flat projections of one raw category tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryTree {
    /// Metadata for every group and category, keyed by id
    pub metadata_index: MetadataIndex,
    /// Categories in group order, then category order within the group
    pub flat_categories: Vec<Category>,
}

impl CategoryTree {
    pub fn into_parts(self) -> (MetadataIndex, Vec<Category>) {
        (self.metadata_index, self.flat_categories)
    }

    pub fn group_count(&self) -> usize {
        self.metadata_index.values().filter(|e| e.is_group()).count()
    }
}

/// Parse a raw categories response.
///
/// Unknown fields are ignored. Missing or mistyped required fields, an
/// absent `data.category_groups`, a duplicated id, or a category whose
/// `category_group_id` disagrees with its enclosing group all fail with
/// [`ExporterError::MalformedInput`].
pub fn parse(raw: &serde_json::Value) -> Result<CategoryTree> {
    let response: RawResponse = serde_path_to_error::deserialize(raw)
        .map_err(|e| ExporterError::MalformedInput(format!("{}: {}", e.path(), e.inner())))?;

    let mut tree = CategoryTree::default();

    for raw_group in response.data.category_groups {
        let group = CategoryGroup {
            id: raw_group.id,
            name: raw_group.name,
            hidden: raw_group.hidden,
        };
        insert_unique(&mut tree.metadata_index, MetadataEntry::from(&group))?;

        for raw_category in raw_group.categories {
            if let Some(declared) = &raw_category.category_group_id {
                if declared != &group.id {
                    return Err(ExporterError::MalformedInput(format!(
                        "category `{}` references group `{}` but is nested under `{}`",
                        raw_category.id, declared, group.id
                    )));
                }
            }

            let category = Category {
                id: raw_category.id,
                name: raw_category.name,
                hidden: raw_category.hidden,
                category_group_id: group.id.clone(),
                budgeted: raw_category.budgeted,
                activity: raw_category.activity,
                balance: raw_category.balance,
            };
            insert_unique(&mut tree.metadata_index, MetadataEntry::from(&category))?;
            tree.flat_categories.push(category);
        }
    }

    Ok(tree)
}

fn insert_unique(index: &mut MetadataIndex, entry: MetadataEntry) -> Result<()> {
    let id = entry.id().to_string();
    if index.contains_key(&id) {
        return Err(ExporterError::MalformedInput(format!(
            "duplicate id `{}` in category tree",
            id
        )));
    }
    index.insert(id, entry);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CategoryMetadata, GroupMetadata};
    use serde_json::json;

    fn bills_tree() -> serde_json::Value {
        json!({
            "data": {
                "category_groups": [{
                    "id": "g1",
                    "name": "Bills",
                    "hidden": false,
                    "deleted": false,
                    "categories": [{
                        "id": "c1",
                        "category_group_id": "g1",
                        "name": "Rent",
                        "hidden": false,
                        "note": null,
                        "budgeted": 500000,
                        "activity": -500000,
                        "balance": 0,
                        "goal_type": null
                    }]
                }],
                "server_knowledge": 42
            }
        })
    }

    #[test]
    fn test_parse_single_group() {
        let tree = parse(&bills_tree()).unwrap();

        assert_eq!(tree.metadata_index.len(), 2);
        assert_eq!(tree.group_count(), 1);
        assert_eq!(
            tree.metadata_index["g1"],
            MetadataEntry::Group(GroupMetadata {
                id: "g1".to_string(),
                name: "Bills".to_string(),
                hidden: false,
            })
        );
        assert_eq!(
            tree.metadata_index["c1"],
            MetadataEntry::Category(CategoryMetadata {
                id: "c1".to_string(),
                name: "Rent".to_string(),
                hidden: false,
                group_id: "g1".to_string(),
            })
        );

        assert_eq!(tree.flat_categories.len(), 1);
        let rent = &tree.flat_categories[0];
        assert_eq!(rent.category_group_id, "g1");
        assert_eq!(rent.budgeted, 500_000);
        assert_eq!(rent.activity, -500_000);
        assert_eq!(rent.balance, 0);
    }

    #[test]
    fn test_parse_preserves_nesting_order() {
        let raw = json!({
            "data": {
                "category_groups": [
                    {"id": "g2", "name": "Fun", "hidden": false, "categories": [
                        {"id": "c3", "name": "Games", "hidden": false, "budgeted": 1, "activity": 0, "balance": 1},
                        {"id": "c1", "name": "Books", "hidden": true, "budgeted": 2, "activity": 0, "balance": 2}
                    ]},
                    {"id": "g1", "name": "Bills", "hidden": false, "categories": [
                        {"id": "c2", "name": "Rent", "hidden": false, "budgeted": 3, "activity": 0, "balance": 3}
                    ]}
                ]
            }
        });

        let tree = parse(&raw).unwrap();
        let ids: Vec<&str> = tree.flat_categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c1", "c2"]);
        assert_eq!(tree.flat_categories[1].category_group_id, "g2");
        assert_eq!(tree.flat_categories[2].category_group_id, "g1");
    }

    #[test]
    fn test_parse_empty_groups() {
        let raw = json!({"data": {"category_groups": []}});
        let tree = parse(&raw).unwrap();
        assert!(tree.metadata_index.is_empty());
        assert!(tree.flat_categories.is_empty());
    }

    #[test]
    fn test_missing_category_groups_is_malformed() {
        let raw = json!({"data": {}});
        let err = parse(&raw).unwrap_err();
        assert!(matches!(err, ExporterError::MalformedInput(_)));
        assert!(err.to_string().contains("category_groups"));
    }

    #[test]
    fn test_missing_data_is_malformed() {
        let raw = json!({"error": {"id": "401", "name": "unauthorized"}});
        assert!(matches!(parse(&raw), Err(ExporterError::MalformedInput(_))));
    }

    #[test]
    fn test_wrong_amount_type_reports_path() {
        let mut raw = bills_tree();
        raw["data"]["category_groups"][0]["categories"][0]["budgeted"] = json!("500");

        let err = parse(&raw).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("data.category_groups[0].categories[0].budgeted"), "{message}");
    }

    #[test]
    fn test_missing_group_hidden_is_malformed() {
        let mut raw = bills_tree();
        raw["data"]["category_groups"][0]
            .as_object_mut()
            .unwrap()
            .remove("hidden");

        assert!(matches!(parse(&raw), Err(ExporterError::MalformedInput(_))));
    }

    #[test]
    fn test_duplicate_id_is_malformed() {
        let raw = json!({
            "data": {
                "category_groups": [
                    {"id": "x", "name": "Bills", "hidden": false, "categories": [
                        {"id": "x", "name": "Rent", "hidden": false, "budgeted": 0, "activity": 0, "balance": 0}
                    ]}
                ]
            }
        });

        let err = parse(&raw).unwrap_err();
        assert!(err.to_string().contains("duplicate id `x`"));
    }

    #[test]
    fn test_mismatched_group_reference_is_malformed() {
        let mut raw = bills_tree();
        raw["data"]["category_groups"][0]["categories"][0]["category_group_id"] = json!("g9");

        let err = parse(&raw).unwrap_err();
        assert!(matches!(err, ExporterError::MalformedInput(_)));
        assert!(err.to_string().contains("g9"));
    }
}
