use std::{borrow::Cow, convert::Infallible, fmt, str::FromStr};

use schemars::{
    gen::SchemaGenerator,
    schema::{InstanceType, Schema, SchemaObject},
    JsonSchema,
};
use serde_with::{DeserializeFromStr, SerializeDisplay};

/// Business category.
///
/// The four canonical categories are a closed set. Records written by older
/// clients may carry free-text labels; those that have a known mapping are
/// canonicalized when parsed, the rest are kept verbatim as `Legacy` and never
/// match a category filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum Category {
    Restaurants,
    Clothing,
    Art,
    Entertainment,
    Legacy(String),
}

impl Category {
    pub const CANONICAL: [Category; 4] = [
        Category::Restaurants,
        Category::Clothing,
        Category::Art,
        Category::Entertainment,
    ];

    /// Maps a user supplied label to a canonical category.
    ///
    /// Matching ignores case, surrounding whitespace, `_`/`-` separators and
    /// `&` vs. `and`. Returns `None` for unknown labels.
    pub fn from_label(label: &str) -> Option<Category> {
        let normalized = normalize_label(label);
        let category = match normalized.as_str() {
            "restaurants" | "restaurant" | "food" | "food and drink" | "food drink"
            | "dining" => Category::Restaurants,
            "clothing" | "clothes" | "local shopping" | "shopping" | "fashion"
            | "apparel" => Category::Clothing,
            "art" | "arts" | "arts and culture" | "gallery" | "galleries" => {
                Category::Art
            }
            "entertainment" | "events" | "nightlife" | "music" => {
                Category::Entertainment
            }
            _ => return None,
        };
        Some(category)
    }

    /// Parses a stored value. Unknown labels are preserved as `Legacy`.
    pub fn from_stored(value: &str) -> Category {
        Category::from_label(value).unwrap_or_else(|| Category::Legacy(value.to_owned()))
    }

    pub fn code(&self) -> &str {
        match self {
            Category::Restaurants => "RESTAURANTS",
            Category::Clothing => "CLOTHING",
            Category::Art => "ART",
            Category::Entertainment => "ENTERTAINMENT",
            Category::Legacy(label) => label,
        }
    }

    pub fn display_label(&self) -> &str {
        match self {
            Category::Restaurants => "Restaurants",
            Category::Clothing => "Clothing",
            Category::Art => "Art",
            Category::Entertainment => "Entertainment",
            Category::Legacy(label) => label,
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Category::Legacy(_))
    }
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .replace('&', " and ")
        .replace(['_', '-', '/'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Category {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Category::from_stored(s))
    }
}

impl JsonSchema for Category {
    fn schema_name() -> String {
        "Category".to_owned()
    }

    fn schema_id() -> Cow<'static, str> {
        Cow::Borrowed(concat!(module_path!(), "::Category"))
    }

    fn json_schema(_gen: &mut SchemaGenerator) -> Schema {
        SchemaObject {
            instance_type: Some(InstanceType::String.into()),
            enum_values: Some(
                Category::CANONICAL
                    .iter()
                    .map(|category| category.code().into())
                    .collect(),
            ),
            ..Default::default()
        }
        .into()
    }
}
