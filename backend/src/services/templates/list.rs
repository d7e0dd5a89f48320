use crate::errors::EditorError;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::{SqliteStore, TemplateStore};
use actix_web::{web, HttpResponse, Responder, ResponseError};

pub async fn process(_identity: Identity, store: web::Data<SqliteStore>) -> impl Responder {
    match run_blocking(store, |store| {
        store.list_templates().map_err(EditorError::from)
    })
    .await
    {
        Ok(templates) => HttpResponse::Ok().json(templates),
        Err(e) => e.error_response(),
    }
}
