//! Raw lock endpoints; the editor normally goes through `open` and `close`.

use crate::editor::session::EditingSession;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::SqliteStore;
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::responses::MessageResponse;

/// Current holder, if any. Never changes the lock.
pub async fn status(
    _identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    match run_blocking(store, move |store| EditingSession::new(store).lock_status(&uuid)).await {
        Ok(status) => HttpResponse::Ok().json(status),
        Err(e) => e.error_response(),
    }
}

/// Idempotent for the current holder.
pub async fn acquire(
    identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    match run_blocking(store, move |store| {
        EditingSession::new(store).acquire(&uuid, &identity)
    })
    .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("Correo bloqueado para edición.")),
        Err(e) => e.error_response(),
    }
}

pub async fn release(
    identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    match run_blocking(store, move |store| {
        EditingSession::new(store).release(&uuid, &identity)
    })
    .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new("Correo desbloqueado.")),
        Err(e) => e.error_response(),
    }
}

/// Admin only; `403` for anyone else.
pub async fn force_release(
    identity: Identity,
    uuid: web::Path<String>,
    store: web::Data<SqliteStore>,
) -> impl Responder {
    let uuid = uuid.into_inner();
    match run_blocking(store, move |store| {
        EditingSession::new(store).force_release(&uuid, &identity)
    })
    .await
    {
        Ok(()) => HttpResponse::Ok().json(MessageResponse::new(
            "Correo desbloqueado por el administrador.",
        )),
        Err(e) => e.error_response(),
    }
}
