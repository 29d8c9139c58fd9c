//! services/api/src/adapters/pause.rs
//!
//! The production `Pause` adapter: a plain tokio timer.

use async_trait::async_trait;
use recipe_finder_core::ports::Pause;
use std::time::Duration;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
