use crate::errors::EditorError;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::{EmailStore, SqliteStore};
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// Rows returned, newest update first.
const RECENT_EMAILS: usize = 5;

pub async fn process(_identity: Identity, store: web::Data<SqliteStore>) -> impl Responder {
    match run_blocking(store, |store| {
        store
            .list_recent_emails(RECENT_EMAILS)
            .map_err(EditorError::from)
    })
    .await
    {
        Ok(emails) => HttpResponse::Ok().json(emails),
        Err(e) => e.error_response(),
    }
}
