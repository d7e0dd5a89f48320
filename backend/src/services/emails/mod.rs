//! # Editable Email Service Module
//!
//! HTTP surface of the editing protocol, mounted under `/api/emails-editable`.
//! Every handler extracts the caller's [`Identity`](crate::identity::Identity),
//! runs one [`EditingSession`](crate::editor::session::EditingSession)
//! operation on the blocking pool and maps [`EditorError`](crate::errors::EditorError)
//! to a JSON error response.
//!
//! ## Routes
//! - `GET /`: list emails with creator, modifier and lock holder names.
//! - `POST /`: create an email from a template; the creator holds its lock.
//! - `POST /{uuid}/open`: acquire the lock and load the reconciled content.
//!   Admins get a read-only view when someone else holds the lock.
//! - `PUT /{uuid}`: save `{ updated_content }` while holding the lock.
//! - `DELETE /{uuid}`: delete when free or locked by the caller.
//! - `POST /{uuid}/sections`: append a section from the section library.
//! - `POST /{uuid}/close`: best-effort release when leaving the editor.
//! - `GET|POST /{uuid}/lock`, `POST /{uuid}/unlock`: raw lock operations.
//! - `POST /{uuid}/force-unlock`, `POST /{uuid}/takeover`: admin overrides.

mod add_section;
mod close;
mod create;
mod delete;
mod list;
mod lock;
mod open;
mod save;
mod takeover;

use actix_web::web::{delete, get, post, put, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/emails-editable";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("", post().to(create::process))
        .route("/{uuid}", put().to(save::process))
        .route("/{uuid}", delete().to(delete::process))
        .route("/{uuid}/open", post().to(open::process))
        .route("/{uuid}/sections", post().to(add_section::process))
        .route("/{uuid}/close", post().to(close::process))
        .route("/{uuid}/lock", get().to(lock::status))
        .route("/{uuid}/lock", post().to(lock::acquire))
        .route("/{uuid}/unlock", post().to(lock::release))
        .route("/{uuid}/force-unlock", post().to(lock::force_release))
        .route("/{uuid}/takeover", post().to(takeover::process))
}
