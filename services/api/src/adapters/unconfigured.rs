//! services/api/src/adapters/unconfigured.rs
//!
//! Stand-ins used when a provider's credentials are absent. The server still
//! starts; every call through one of these fails with a message naming the
//! missing setting.

use async_trait::async_trait;
use bytes::Bytes;
use recipe_finder_core::{
    domain::{ImagePayload, PromptMessage},
    ports::{
        BlobStore, DocumentStore, Filter, ImageGenerationService, PortError, PortResult, RecipeGenerationService,
        SelectQuery,
    },
};
use serde_json::Value;

/// Names the missing setting in every error it returns.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured {
    setting: &'static str,
}

impl Unconfigured {
    pub const fn openai() -> Self {
        Self { setting: "OPENAI_API_KEY" }
    }

    pub const fn gemini() -> Self {
        Self { setting: "GEMINI_API_KEY" }
    }

    pub const fn supabase() -> Self {
        Self { setting: "Supabase" }
    }

    fn error(&self) -> PortError {
        PortError::Upstream(format!("{} is not configured.", self.setting))
    }
}

#[async_trait]
impl RecipeGenerationService for Unconfigured {
    async fn invoke(&self, _messages: &[PromptMessage]) -> PortResult<String> {
        Err(self.error())
    }
}

#[async_trait]
impl ImageGenerationService for Unconfigured {
    async fn generate(&self, _prompt: &str) -> PortResult<Option<ImagePayload>> {
        Err(self.error())
    }
}

#[async_trait]
impl BlobStore for Unconfigured {
    async fn upload(&self, _path: &str, _data: Bytes, _content_type: &str) -> PortResult<String> {
        Err(self.error())
    }
}

#[async_trait]
impl DocumentStore for Unconfigured {
    async fn select(&self, _table: &str, _query: &SelectQuery) -> PortResult<Vec<Value>> {
        Err(self.error())
    }

    async fn insert(&self, _table: &str, _rows: Vec<Value>) -> PortResult<Vec<Value>> {
        Err(self.error())
    }

    async fn update(&self, _table: &str, _filters: &[Filter], _patch: Value) -> PortResult<Vec<Value>> {
        Err(self.error())
    }

    async fn delete(&self, _table: &str, _filters: &[Filter]) -> PortResult<()> {
        Err(self.error())
    }
}
