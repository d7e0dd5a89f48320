//! # Stats Service Module
//!
//! Dashboard figures under `/api/stats`. Both endpoints are read-only and
//! available to any identified user.
//!
//! ## Sub-modules:
//! - `totals`: how many emails, templates and users exist.
//! - `recent`: the most recently updated emails.

mod recent;
mod totals;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/stats";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/totals", get().to(totals::process))
        .route("/recent-emails", get().to(recent::process))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::USER_ID_HEADER;
    use crate::storage::{EmailStore, NewEmail, SqliteStore, TemplateStore};
    use actix_web::http::StatusCode;
    use actix_web::{test, web, App};
    use common::model::content::ContentDocument;
    use common::model::email::LockState;
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn dashboard_counts_and_recent_emails() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(dir.path().join("stats.sqlite")).unwrap();
        store.insert_user(1, "ana", "editor").unwrap();
        let template_id = store.insert_template("Promo", "<p>{{titulo}}</p>", 1).unwrap();
        for index in 0..7 {
            store
                .insert_email(&NewEmail {
                    uuid: &format!("correo-{}", index),
                    template_id,
                    content: &ContentDocument::default(),
                    user_id: 1,
                    lock: LockState::Unlocked,
                })
                .unwrap();
        }
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(store))
                .service(configure_routes()),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/stats/totals")
            .insert_header((USER_ID_HEADER, "1"))
            .to_request();
        let totals: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(totals, json!({ "emails": 7, "templates": 1, "users": 1 }));

        let req = test::TestRequest::get()
            .uri("/api/stats/recent-emails")
            .insert_header((USER_ID_HEADER, "1"))
            .to_request();
        let recent: Value = test::call_and_read_body_json(&app, req).await;
        let uuids: Vec<_> = recent
            .as_array()
            .unwrap()
            .iter()
            .map(|email| email["uuid"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(uuids, vec!["correo-6", "correo-5", "correo-4", "correo-3", "correo-2"]);

        let req = test::TestRequest::get().uri("/api/stats/totals").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
