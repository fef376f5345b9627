//! Topology service façade.
//!
//! The one type embedders hold: query with filters and pagination,
//! force refreshes, stats, export, health. All methods take `&self`
//! and are safe to call from any number of tasks.

use crate::cache::GraphCache;
use crate::error::TopologyError;
use crate::export::{self, ExportFormat};
use crate::model::{TopologyGraph, TopologyStats};
use crate::stats;
use crate::view::{self, GraphFilter, PageRequest};
use chrono::{DateTime, Utc};
use fwatlas_collect::StateCollector;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

// ── Settings ────────────────────────────────────────────────────────

/// Runtime knobs of the engine, usually produced by `fwatlas-config`.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// How long a built graph stays fresh.
    pub max_age: Duration,
    /// Deadline for the health probe's cache peek.
    pub health_timeout: Duration,
    /// Page size used when a query asks for a page without one.
    pub default_page_size: i64,
    /// Hard ceiling on caller-supplied page sizes.
    pub max_page_size: i64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(30),
            health_timeout: Duration::from_millis(2000),
            default_page_size: 50,
            max_page_size: 500,
        }
    }
}

// ── Query / response types ──────────────────────────────────────────

/// One topology request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopologyQuery {
    #[serde(default)]
    pub filter: GraphFilter,
    /// Page number; pagination is off when absent.
    pub page: Option<i64>,
    /// Page size; falls back to the configured default.
    pub page_size: Option<i64>,
    #[serde(default)]
    pub include_stats: bool,
    #[serde(default)]
    pub include_metadata: bool,
}

/// Request echo attached when `include_metadata` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub filter: GraphFilter,
    pub page: Option<PageRequest>,
    pub rule_nodes: usize,
    pub warning_count: usize,
}

/// A filtered view plus optional extras.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopologyResponse {
    pub graph: TopologyGraph,
    /// When the underlying build happened; identical across responses
    /// served from the same cached graph.
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<TopologyStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

// ── Health ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Outcome of a health probe. Never an `Err`: an unhealthy engine is
/// still a reportable state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    /// Probe latency in milliseconds.
    pub response_time_ms: u64,
    pub checked_at: DateTime<Utc>,
    /// Build timestamp of the cached graph, if one exists.
    pub generated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ── Service ─────────────────────────────────────────────────────────

/// Façade over the cache, views, stats, and export.
#[derive(Clone)]
pub struct TopologyService {
    cache: GraphCache,
    settings: EngineSettings,
}

impl TopologyService {
    pub fn new(collector: Arc<dyn StateCollector>, settings: EngineSettings) -> Self {
        Self { cache: GraphCache::new(collector, settings.max_age), settings }
    }

    /// Answer one topology query.
    ///
    /// Validation happens before the cache is touched, so a bad page
    /// never costs a collector read.
    pub async fn get(&self, query: &TopologyQuery) -> Result<TopologyResponse, TopologyError> {
        let page = self.validated_page(query)?;

        let graph = self.cache.get().await?;
        let view = view::apply(&graph, &query.filter, page)?;
        debug!(
            nodes = view.nodes.len(),
            links = view.links.len(),
            filtered = !query.filter.is_empty(),
            "topology query answered"
        );

        let stats = query.include_stats.then(|| stats::summarize(&view));
        let meta = query.include_metadata.then(|| ResponseMeta {
            filter: query.filter.clone(),
            page,
            rule_nodes: view.nodes.iter().filter(|n| n.layer == 3).count(),
            warning_count: view.warnings.len(),
        });

        Ok(TopologyResponse { generated_at: view.generated_at, graph: view, stats, meta })
    }

    /// Discard slot age and rebuild from fresh collector reads.
    pub async fn refresh(&self) -> Result<Arc<TopologyGraph>, TopologyError> {
        self.cache.force_refresh().await
    }

    /// Stats over the full (unfiltered) current graph.
    pub async fn stats(&self) -> Result<TopologyStats, TopologyError> {
        let graph = self.cache.get().await?;
        Ok(stats::summarize(&graph))
    }

    /// Encode the full current graph.
    pub async fn export(&self, format: ExportFormat) -> Result<Vec<u8>, TopologyError> {
        let graph = self.cache.get().await?;
        export::encode(&graph, format)
    }

    /// Probe engine liveness with a deadline-bounded cache peek.
    pub async fn health(&self) -> HealthReport {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.settings.health_timeout, self.cache.peek()).await;
        let elapsed = started.elapsed();
        #[allow(clippy::cast_possible_truncation)]
        let response_time_ms = elapsed.as_millis() as u64;

        match outcome {
            Ok(slot) => HealthReport {
                status: HealthStatus::Healthy,
                response_time_ms,
                checked_at: Utc::now(),
                generated_at: slot.map(|graph| graph.generated_at),
                error: None,
            },
            Err(_) => {
                warn!(timeout = ?self.settings.health_timeout, "health probe timed out");
                HealthReport {
                    status: HealthStatus::Unhealthy,
                    response_time_ms,
                    checked_at: Utc::now(),
                    generated_at: None,
                    error: Some(format!(
                        "cache probe exceeded {}ms",
                        self.settings.health_timeout.as_millis()
                    )),
                }
            }
        }
    }

    fn validated_page(&self, query: &TopologyQuery) -> Result<Option<PageRequest>, TopologyError> {
        if let Some(size) = query.page_size {
            if size <= 0 {
                return Err(TopologyError::validation("page_size", "must be a positive integer"));
            }
        }
        let Some(page) = query.page else {
            return Ok(None);
        };
        if page <= 0 {
            return Err(TopologyError::validation("page", "must be a positive integer"));
        }

        let page_size = query.page_size.unwrap_or(self.settings.default_page_size);
        if page_size > self.settings.max_page_size {
            return Err(TopologyError::validation(
                "page_size",
                format!("exceeds maximum of {}", self.settings.max_page_size),
            ));
        }
        Ok(Some(PageRequest { page, page_size }))
    }
}
