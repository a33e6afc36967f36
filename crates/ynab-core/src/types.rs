use std::collections::BTreeMap;

/// A named container of categories. Groups sit at the root of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    pub id: String,
    pub name: String,
    pub hidden: bool,
}

/// A budget line item.
///
/// Amounts are in milliunits of the budget currency (1000 = one unit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub hidden: bool,
    pub category_group_id: String,
    pub budgeted: i64,
    pub activity: i64,
    pub balance: i64,
}

/// Metadata for a category group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMetadata {
    pub id: String,
    pub name: String,
    pub hidden: bool,
}

/// Metadata for a category, including the group it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryMetadata {
    pub id: String,
    pub name: String,
    pub hidden: bool,
    pub group_id: String,
}

/// One entry of the metadata index. The variant is decided once, when the
/// tree is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataEntry {
    Group(GroupMetadata),
    Category(CategoryMetadata),
}

impl MetadataEntry {
    pub fn id(&self) -> &str {
        match self {
            MetadataEntry::Group(group) => &group.id,
            MetadataEntry::Category(category) => &category.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            MetadataEntry::Group(group) => &group.name,
            MetadataEntry::Category(category) => &category.name,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, MetadataEntry::Group(_))
    }
}

impl From<&CategoryGroup> for MetadataEntry {
    fn from(group: &CategoryGroup) -> Self {
        MetadataEntry::Group(GroupMetadata {
            id: group.id.clone(),
            name: group.name.clone(),
            hidden: group.hidden,
        })
    }
}

impl From<&Category> for MetadataEntry {
    fn from(category: &Category) -> Self {
        MetadataEntry::Category(CategoryMetadata {
            id: category.id.clone(),
            name: category.name.clone(),
            hidden: category.hidden,
            group_id: category.category_group_id.clone(),
        })
    }
}

/// Metadata for every group and category of one snapshot, keyed by id.
///
/// Ordered so that projections built from it are deterministic.
pub type MetadataIndex = BTreeMap<String, MetadataEntry>;
