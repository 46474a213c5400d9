use discovery::database::DatabaseError;

pub mod business;
pub mod owner;
pub mod review;
pub mod video;

pub(crate) fn convert_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        sqlx::Error::Database(ref error) if error.is_unique_violation() => {
            DatabaseError::Conflict(error.message().to_owned())
        }
        // a referenced row does not exist
        sqlx::Error::Database(ref error) if error.is_foreign_key_violation() => {
            DatabaseError::NotFound
        }
        _ => DatabaseError::Other(Box::new(why)),
    }
}
