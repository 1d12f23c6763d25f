use crate::error::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A request to the search backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub index: String,
    pub query: String,
    /// Bypass any cache between the caller and the backend
    pub force_fresh: bool,
}

/// A single search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub score: f64,
    #[serde(default)]
    pub source: serde_json::Value,
}

/// Results returned by the search backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResults {
    pub hits: Vec<SearchHit>,
    pub total: u64,
    pub took_ms: u64,
}

/// Port for the downstream search backend
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, request: SearchRequest) -> Result<SearchResults, SearchError>;
}
