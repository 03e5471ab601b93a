use crate::error::Result;
use crate::warning::{NowcastDetail, NowcastSummary};
use async_trait::async_trait;

/// Source of nowcast data for one poll cycle (spec.md §6).
///
/// Implemented by `alert-upstream::HttpUpstreamClient` against the real BMKG API, and
/// by fixed in-memory fixtures in tests for `alert-engine`.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn list_nowcast(&self) -> Result<Vec<NowcastSummary>>;
    async fn fetch_detail(&self, code: &str) -> Result<NowcastDetail>;
}
