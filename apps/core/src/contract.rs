use serde::{Deserialize, Serialize};

use crate::cache::RefreshOutcome;
use crate::model::{Item, ItemKind};

/// The item shape the presentation layer depends on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemDto {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    pub results: Vec<ItemDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivateRequest {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivateResponse {
    pub activated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshResponse {
    pub success: bool,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CloseTabRequest {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CloseTabResponse {
    pub closed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreRequest {
    Search(SearchRequest),
    ListAll,
    Activate(ActivateRequest),
    Refresh,
    CloseTab(CloseTabRequest),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "payload")]
pub enum CoreResponse {
    Search(SearchResponse),
    ListAll(SearchResponse),
    Activate(ActivateResponse),
    Refresh(RefreshResponse),
    CloseTab(CloseTabResponse),
}

impl From<Item> for ItemDto {
    fn from(value: Item) -> Self {
        Self {
            id: value.id,
            title: value.title,
            subtitle: value.subtitle,
            kind: value.kind,
        }
    }
}

impl From<RefreshOutcome> for RefreshResponse {
    fn from(value: RefreshOutcome) -> Self {
        Self {
            success: value.success,
            timestamp: value.timestamp_ms,
            error: value.error,
        }
    }
}
