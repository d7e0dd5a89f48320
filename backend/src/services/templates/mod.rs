//! # Template Service Module
//!
//! Endpoints for the shared HTML templates emails are created from, mounted
//! under `/api/templates`.
//!
//! ## Sub-modules:
//! - `list`: template catalogue, ordered by name.
//! - `get`: one template with its placeholders and parsed section preview.
//! - `save`: admin-only creation and update.

mod get;
mod list;
mod save;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// # Registered Routes:
///
/// *   **`GET /`**: `list::process`, id, name and creation date of every template.
/// *   **`POST /save`**: `save::process`, creates a template, or updates it
///     when the payload carries an `id`. Admins only.
/// *   **`GET /{template_id}`**: `get::process`, the HTML plus the distinct
///     placeholders and the sections an email created from it would get.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/save", post().to(save::process))
        .route("/{template_id}", get().to(get::process))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{USER_ID_HEADER, USER_ROLE_HEADER};
    use crate::storage::SqliteStore;
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn admin_saves_and_editor_reads_detail() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("templates.sqlite")).unwrap();
        store.insert_user(1, "ana", "editor").unwrap();
        store.insert_user(3, "root", "admin").unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(store))
                .service(configure_routes()),
        )
        .await;

        let body = json!({
            "name": "Boletín",
            "html_content": r#"<div><section data-section-type="hero">{{titulo}} <img src="a.png"></section></div>"#
        });
        let req = test::TestRequest::post()
            .uri("/api/templates/save")
            .insert_header((USER_ID_HEADER, "1"))
            .set_json(&body)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::post()
            .uri("/api/templates/save")
            .insert_header((USER_ID_HEADER, "3"))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .set_json(&body)
            .to_request();
        let saved: Value = test::call_and_read_body_json(&app, req).await;
        let id = saved["id"].as_i64().unwrap();

        let req = test::TestRequest::get()
            .uri(&format!("/api/templates/{}", id))
            .insert_header((USER_ID_HEADER, "1"))
            .to_request();
        let detail: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(detail["name"], "Boletín");
        assert_eq!(detail["placeholders"], json!(["titulo"]));
        assert_eq!(detail["sections"][0]["type"], "hero");
        assert_eq!(detail["sections"][0]["content"], json!({ "titulo": "", "image_0": "" }));

        let req = test::TestRequest::get()
            .uri("/api/templates")
            .insert_header((USER_ID_HEADER, "1"))
            .to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let req = test::TestRequest::get()
            .uri("/api/templates/999")
            .insert_header((USER_ID_HEADER, "1"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
