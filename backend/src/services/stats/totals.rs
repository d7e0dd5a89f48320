use crate::errors::EditorError;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::{EmailStore, SqliteStore, TemplateStore, UserDirectory};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::stats::Totals;

/// Actix web handler for `GET /api/stats/totals`.
///
/// # Returns
/// - `200 OK` with `{ emails, templates, users }`.
/// - `503 Service Unavailable` if a count query fails.
pub async fn process(_identity: Identity, store: web::Data<SqliteStore>) -> impl Responder {
    match run_blocking(store, |store| totals(store)).await {
        Ok(totals) => HttpResponse::Ok().json(totals),
        Err(e) => e.error_response(),
    }
}

pub fn totals<S>(store: &S) -> Result<Totals, EditorError>
where
    S: EmailStore + TemplateStore + UserDirectory,
{
    Ok(Totals {
        emails: store.count_emails()?,
        templates: store.count_templates()?,
        users: store.count_users()?,
    })
}
