use crate::editor::parser::placeholder_keys;
use crate::editor::session::require_elevated;
use crate::errors::EditorError;
use crate::identity::Identity;
use crate::services::run_blocking;
use crate::storage::{SqliteStore, TemplateStore};
use actix_web::{web, HttpResponse, Responder, ResponseError};
use common::requests::SaveTemplateRequest;
use log::info;
use serde_json::json;

const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 255;

pub async fn process(
    identity: Identity,
    store: web::Data<SqliteStore>,
    payload: web::Json<SaveTemplateRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    match run_blocking(store, move |store| save_template(store, &identity, &request)).await {
        Ok(id) => HttpResponse::Ok().json(json!({
            "id": id,
            "message": "Template guardado correctamente",
        })),
        Err(e) => e.error_response(),
    }
}

/// Inserts or updates a template and returns its id.
pub fn save_template<S: TemplateStore>(
    store: &S,
    identity: &Identity,
    request: &SaveTemplateRequest,
) -> Result<i64, EditorError> {
    require_elevated(identity)?;

    let name = request.name.trim();
    let name_len = name.chars().count();
    if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&name_len) {
        return Err(EditorError::invalid(format!(
            "El nombre del template debe tener entre {} y {} caracteres.",
            MIN_NAME_LEN, MAX_NAME_LEN
        )));
    }
    if placeholder_keys(&request.html_content).is_empty() {
        return Err(EditorError::invalid(
            "El HTML del template debe contener al menos un placeholder {{nombre}}.",
        ));
    }
    if store.template_name_taken(name, request.id)? {
        return Err(EditorError::invalid("Ya existe un template con ese nombre."));
    }

    match request.id {
        Some(id) => {
            if !store.update_template(id, name, &request.html_content)? {
                return Err(EditorError::not_found("Template no encontrado."));
            }
            info!("Template {} updated by user {}", id, identity.user_id);
            Ok(id)
        }
        None => {
            let id = store.insert_template(name, &request.html_content, identity.user_id)?;
            info!("Template {} '{}' created by user {}", id, name, identity.user_id);
            Ok(id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::user::Role;
    use crate::storage::SqliteStore;

    const ADMIN: Identity = Identity {
        user_id: 3,
        role: Role::Admin,
        username: None,
    };

    fn request(id: Option<i64>, name: &str, html: &str) -> SaveTemplateRequest {
        SaveTemplateRequest {
            id,
            name: name.to_string(),
            html_content: html.to_string(),
        }
    }

    fn store() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("save.sqlite")).unwrap();
        store.insert_user(3, "root", "admin").unwrap();
        (dir, store)
    }

    #[test]
    fn editors_cannot_save() {
        let (_dir, store) = store();
        let editor = Identity::new(1, Role::Editor);
        let err = save_template(&store, &editor, &request(None, "Promo", "{{a}}")).unwrap_err();
        assert!(matches!(err, EditorError::Forbidden(_)));
    }

    #[test]
    fn name_and_placeholder_rules() {
        let (_dir, store) = store();
        for bad in [request(None, "ab", "{{a}}"), request(None, "Promo", "<p>sin campos</p>")] {
            let err = save_template(&store, &ADMIN, &bad).unwrap_err();
            assert!(matches!(err, EditorError::ValidationFailed(_)));
        }
    }

    #[test]
    fn duplicate_names_are_rejected_but_self_update_is_not() {
        let (_dir, store) = store();
        let id = save_template(&store, &ADMIN, &request(None, "Promo", "{{a}}")).unwrap();

        let err = save_template(&store, &ADMIN, &request(None, "Promo", "{{b}}")).unwrap_err();
        assert!(matches!(err, EditorError::ValidationFailed(_)));

        let same = save_template(&store, &ADMIN, &request(Some(id), "Promo", "{{b}}")).unwrap();
        assert_eq!(same, id);
        assert_eq!(store.get_template_html(id).unwrap().as_deref(), Some("{{b}}"));
    }

    #[test]
    fn updating_a_missing_template_is_not_found() {
        let (_dir, store) = store();
        let err = save_template(&store, &ADMIN, &request(Some(42), "Promo", "{{a}}")).unwrap_err();
        assert!(matches!(err, EditorError::NotFound(_)));
    }
}
