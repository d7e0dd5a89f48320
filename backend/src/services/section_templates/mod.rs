//! Read-only section library, mounted under `/api/section-templates`.

mod list;

use actix_web::web::{get, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/section-templates";

pub fn configure_routes() -> Scope {
    scope(API_PATH).route("", get().to(list::process))
}
