//! The editing core: template parsing, content reconciliation, field
//! validation, edit locks and the session protocol tying them together.

pub mod lock;
pub mod parser;
pub mod reconciler;
pub mod session;
pub mod validation;
