pub mod emails;
pub mod section_templates;
pub mod stats;
pub mod templates;

use crate::errors::EditorError;
use crate::storage::{SqliteStore, StoreError};
use actix_web::web;

/// Runs storage-bound work on the blocking pool so rusqlite never stalls an
/// actix worker.
pub(crate) async fn run_blocking<T, F>(store: web::Data<SqliteStore>, work: F) -> Result<T, EditorError>
where
    F: FnOnce(&SqliteStore) -> Result<T, EditorError> + Send + 'static,
    T: Send + 'static,
{
    let store = store.into_inner();
    tokio::task::spawn_blocking(move || work(&store))
        .await
        .map_err(|e| EditorError::from(StoreError::Task(e.to_string())))?
}
