use serde::Deserialize;

use crate::schedule::ScheduleItem;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// The only cross-request state: the item collection the host loaded.
/// Replaced wholesale by `items.load`, read-only everywhere else.
pub struct AppState {
    pub items: Option<Vec<ScheduleItem>>,
}
