//! Models shared between the email editor server and its clients.
//!
//! Everything here is plain serde data: the persisted content document and its
//! sections, email and lock summaries, templates and the section library, plus
//! the request and response bodies of the HTTP API.

pub mod model;
pub mod requests;
pub mod responses;
