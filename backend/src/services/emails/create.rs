use crate::editor::session::EditingSession;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::SqliteStore;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::CreateEmailRequest;
use common::responses::CreatedEmail;

/// `POST /api/emails-editable`: 201 with the new uuid.
pub async fn process(
    identity: Identity,
    store: web::Data<SqliteStore>,
    payload: web::Json<CreateEmailRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    let result = run_blocking(store, move |store| {
        EditingSession::new(store).create_email(
            &identity,
            request.template_id,
            &request.initial_content,
        )
    })
    .await;

    match result {
        Ok(uuid) => HttpResponse::Created().json(CreatedEmail {
            uuid,
            message: "Correo editable creado y bloqueado exitosamente.".to_string(),
        }),
        Err(e) => e.error_response(),
    }
}
