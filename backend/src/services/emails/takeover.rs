use crate::editor::session::EditingSession;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::SqliteStore;
use actix_web::{web, HttpResponse, Responder, ResponseError};

/// Admin override: force-unlock, then open for edit as the admin.
pub async fn process(
    identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    match run_blocking(store, move |store| {
        EditingSession::new(store).take_over(&uuid, &identity)
    })
    .await
    {
        Ok(opened) => HttpResponse::Ok().json(opened),
        Err(e) => e.error_response(),
    }
}
