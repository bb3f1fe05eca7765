//! Fixed category set partitioning resume ingestion and query-time retrieval.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Semantic facet with its own similarity space. Declaration order is the enumeration order
/// used for embedding and querying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Roles held (e.g. Software Engineer).
    Roles,
    /// Technical skills (e.g. Java, Python).
    Skills,
    /// Seniority level or years of experience.
    Seniority,
    /// Related industries (e.g. Finance).
    Industry,
}

impl Category {
    /// Every category, in enumeration order.
    pub const ALL: [Category; 4] = [
        Category::Roles,
        Category::Skills,
        Category::Seniority,
        Category::Industry,
    ];

    /// Payload and schema key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Roles => "roles",
            Self::Skills => "skills",
            Self::Seniority => "seniority",
            Self::Industry => "industry",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Values derived for each category; iteration follows enumeration order.
pub type CategoryValues = BTreeMap<Category, Vec<String>>;

/// One embedding per category.
pub type CategoryEmbeddings = BTreeMap<Category, Vec<f32>>;

/// Join a category's values into the single string that gets embedded.
pub fn join_values(values: &[String]) -> String {
    values.join(", ")
}
