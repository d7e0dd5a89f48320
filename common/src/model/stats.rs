use serde::{Deserialize, Serialize};

/// Row counts shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub emails: i64,
    pub templates: i64,
    pub users: i64,
}
