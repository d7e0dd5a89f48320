use crate::editor::session::EditingSession;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::SqliteStore;
use actix_web::{web, HttpResponse, Responder};
use common::responses::MessageResponse;
use log::warn;

/// Always answers 200 so a client leaving the editor is never held up;
/// release problems end up in the log.
pub async fn process(
    identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    let result = run_blocking(store, move |store| {
        EditingSession::new(store).close(&uuid, &identity);
        Ok(())
    })
    .await;
    if let Err(e) = result {
        warn!("Close request could not run: {}", e);
    }
    HttpResponse::Ok().json(MessageResponse::new("Editor cerrado."))
}
