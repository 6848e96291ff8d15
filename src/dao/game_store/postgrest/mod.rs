//! PostgREST-backed game store, as exposed by hosted Postgres platforms.

mod config;
mod error;
mod models;
mod store;

use std::sync::Arc;

pub use config::PostgrestConfig;
pub use error::{PostgrestDaoError, PostgrestResult};
pub use store::PostgrestGameStore;

use crate::{
    config::DatabaseSettings,
    dao::{game_store::StorageHandles, storage::StorageError},
};

impl From<PostgrestDaoError> for StorageError {
    fn from(err: PostgrestDaoError) -> Self {
        match err {
            PostgrestDaoError::UnexpectedRows { .. } => StorageError::malformed(err.to_string()),
            other => StorageError::unavailable(other),
        }
    }
}

/// Build one client per credential scope against the same table.
///
/// The public client only ever serves reads; the privileged client carries the
/// service-role key and performs every write.
pub async fn connect_handles(
    settings: &DatabaseSettings,
    table: &str,
) -> PostgrestResult<StorageHandles> {
    let public = PostgrestGameStore::connect(PostgrestConfig::new(
        &settings.url,
        table,
        settings.anon_key.clone(),
    ))
    .await?;
    let privileged = PostgrestGameStore::connect(PostgrestConfig::new(
        &settings.url,
        table,
        settings.service_role_key.clone(),
    ))
    .await?;

    Ok(StorageHandles {
        public: Arc::new(public),
        privileged: Arc::new(privileged),
    })
}
