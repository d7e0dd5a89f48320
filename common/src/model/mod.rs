pub mod content;
pub mod email;
pub mod section_template;
pub mod stats;
pub mod template;
pub mod user;
