use model::WithId;
use utility::id::{HasId, Id};
use uuid::Uuid;

pub mod business;
pub mod owner;
pub mod review;
pub mod video;

/// A table row that maps onto a model type identified by a uuid.
pub trait DatabaseRow {
    type Model: HasId<IdType = Uuid>;

    fn get_id(&self) -> Id<Self::Model>;
    fn to_model(self) -> Self::Model;
    fn from_model(id: Id<Self::Model>, model: Self::Model) -> Self;
}

pub fn with_ids<R: DatabaseRow>(rows: Vec<R>) -> Vec<WithId<R::Model>> {
    rows.into_iter().map(|row| with_id(row)).collect::<Vec<_>>()
}

pub fn with_id<R: DatabaseRow>(row: R) -> WithId<R::Model> {
    WithId::new(row.get_id(), row.to_model())
}
