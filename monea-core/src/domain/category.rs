//! Category domain model
//!
//! The engine never assigns categories to transactions beyond carrying an
//! id through backup merges; categorization is a manual, user-driven edit
//! outside this core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub icon: String,
    pub color: String,
    /// System categories ship with the app and are never imported
    pub is_system: bool,
    pub is_income: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, color: impl Into<String>, is_income: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            icon: icon.into(),
            color: color.into(),
            is_system: false,
            is_income,
            created_at: Utc::now(),
        }
    }
}
