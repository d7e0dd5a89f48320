//! # Template Retrieval Service
//!
//! `GET /api/templates/{template_id}` returns the stored HTML together with
//! what the parser finds in it: the distinct `{{placeholder}}` names and the
//! sections a new email would start with. The preview is computed on every
//! request and never stored.

use crate::editor::parser::{parse_template_html, placeholder_keys};
use crate::errors::EditorError;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::{SqliteStore, TemplateStore};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::model::template::TemplateDetail;

pub async fn process(
    _identity: Identity,
    template_id: web::Path<i64>,
    store: web::Data<SqliteStore>,
) -> impl Responder {
    let template_id = template_id.into_inner();
    match run_blocking(store, move |store| get_template_detail(store, template_id)).await {
        Ok(detail) => HttpResponse::Ok().json(detail),
        Err(e) => e.error_response(),
    }
}

pub fn get_template_detail<S: TemplateStore>(
    store: &S,
    template_id: i64,
) -> Result<TemplateDetail, EditorError> {
    let template = store
        .get_template(template_id)?
        .ok_or_else(|| EditorError::not_found("Template no encontrado."))?;

    Ok(TemplateDetail {
        placeholders: placeholder_keys(&template.html_content),
        sections: parse_template_html(&template.html_content),
        id: template.id,
        name: template.name,
        html_content: template.html_content,
    })
}
