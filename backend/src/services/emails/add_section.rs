use crate::editor::session::EditingSession;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::SqliteStore;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::AddSectionRequest;

/// Responds with the whole document after the append.
pub async fn process(
    identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
    payload: web::Json<AddSectionRequest>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    let section_template_id = payload.section_template_id;
    match run_blocking(store, move |store| {
        EditingSession::new(store).add_section(&uuid, &identity, section_template_id)
    })
    .await
    {
        Ok(document) => HttpResponse::Ok().json(document),
        Err(e) => e.error_response(),
    }
}
