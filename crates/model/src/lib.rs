use schemars::JsonSchema;
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
pub use serde_with;
use utility::id::{HasId, Id};

pub mod business;
pub mod category;
pub mod coordinate;
pub mod owner;
pub mod review;
pub mod video;

pub trait ExampleData {
    fn example_data() -> Self;
}

/// A value annotated with its distance to the center of a radius query.
///
/// `distance_miles` is only populated when the query had a center; it is
/// serialized as an explicit `null` otherwise.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WithDistance<T> {
    pub distance_miles: Option<f64>,
    #[serde(flatten)]
    pub content: T,
}

impl<T> WithDistance<T> {
    pub fn new(distance_miles: Option<f64>, content: T) -> Self {
        Self {
            distance_miles,
            content,
        }
    }

    pub fn without_distance(content: T) -> Self {
        Self::new(None, content)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> WithDistance<U> {
        WithDistance::new(self.distance_miles, f(self.content))
    }
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct WithId<V>
where
    V: HasId,
    V::IdType: Serialize + Debug + Clone,
{
    pub id: Id<V>,
    #[serde(flatten)]
    pub content: V,
}

impl<V> WithId<V>
where
    V: HasId,
    V::IdType: Serialize + Debug + Clone,
{
    pub fn new(id: Id<V>, content: V) -> Self {
        Self { id, content }
    }
}
