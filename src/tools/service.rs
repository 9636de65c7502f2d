//! Tool Service Module
//!
//! Runs a tool call end to end: key, cache lookup or fetch, then pagination
//! or export.

use std::borrow::Cow;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use super::call::ToolCall;
use super::export::{export_json, DEFAULT_EXPORT_DIR};
use super::provider::DataProvider;
use crate::cache::{CacheLookup, SharedCache};
use crate::config::Config;
use crate::error::{Result, ToolError};
use crate::pagination::{Dataset, PageRequest, Paginator, DEFAULT_MAX_TOKENS};

/// Cached form of a provider payload. Shared, never mutated.
pub type CachedDataset = Arc<Dataset>;

// == Tool Request ==
/// A tool call plus its presentation arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolRequest {
    pub call: ToolCall,
    /// 1-based page, clamped by the paginator
    pub page: usize,
    /// When set, the full dataset is written to this path under the
    /// service's export directory instead of paginated
    pub export_path: Option<String>,
    /// Overrides the service's default token budget
    pub max_tokens: Option<usize>,
}

impl ToolRequest {
    pub fn new(call: ToolCall) -> Self {
        Self {
            call,
            page: 1,
            export_path: None,
            max_tokens: None,
        }
    }

    pub fn with_page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn with_export_path(mut self, path: impl Into<String>) -> Self {
        self.export_path = Some(path.into());
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

// == Tool Service ==
/// Composition of provider, shared cache and paginator. Cheap to clone.
#[derive(Clone)]
pub struct ToolService {
    provider: Arc<dyn DataProvider>,
    cache: SharedCache<CachedDataset>,
    paginator: Paginator,
    max_tokens: usize,
    dedupe_fetches: bool,
    export_dir: PathBuf,
}

impl ToolService {
    pub fn new(provider: Arc<dyn DataProvider>, cache: SharedCache<CachedDataset>) -> Self {
        Self {
            provider,
            cache,
            paginator: Paginator::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            dedupe_fetches: false,
            export_dir: PathBuf::from(DEFAULT_EXPORT_DIR),
        }
    }

    /// Builds the service described by `config` around `provider`.
    pub fn from_config(config: &Config, provider: Arc<dyn DataProvider>) -> Self {
        Self::new(provider, SharedCache::new(config.cache_capacity))
            .with_paginator(Paginator::new(config.max_column_width, config.page_sizing))
            .with_max_tokens(config.max_tokens)
            .with_dedupe_fetches(config.dedupe_fetches)
            .with_export_dir(&config.export_dir)
    }

    pub fn with_paginator(mut self, paginator: Paginator) -> Self {
        self.paginator = paginator;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_dedupe_fetches(mut self, dedupe_fetches: bool) -> Self {
        self.dedupe_fetches = dedupe_fetches;
        self
    }

    /// Directory every export is confined to.
    pub fn with_export_dir(mut self, export_dir: impl Into<PathBuf>) -> Self {
        self.export_dir = export_dir.into();
        self
    }

    pub fn cache(&self) -> &SharedCache<CachedDataset> {
        &self.cache
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    // == Call ==
    /// Answers `request` with a rendered page or an export confirmation.
    ///
    /// Provider failures and unrenderable payloads are returned as errors
    /// and leave the cache untouched.
    pub async fn call(&self, request: &ToolRequest) -> Result<String> {
        let call = &request.call;
        call.validate()?;

        let key = call.cache_key();
        let lookup = self.load(call, &key).await?;

        let dataset = match call.fields() {
            Some(fields) => Cow::Owned(lookup.value.select_fields(fields)),
            None => Cow::Borrowed(lookup.value.as_ref()),
        };

        if let Some(path) = &request.export_path {
            info!(key = %key, path = %path, "exporting tool data");
            return export_json(&dataset, &self.export_dir, path).await;
        }

        let page_request = PageRequest::new(call.title())
            .with_page(request.page)
            .with_max_tokens(request.max_tokens.unwrap_or(self.max_tokens))
            .with_cache_age(lookup.age);
        let result = self.paginator.paginate(&dataset, &page_request)?;

        info!(
            key = %key,
            cached = !lookup.is_fresh(),
            page = result.page,
            total_pages = result.total_pages,
            tokens = result.estimated_tokens,
            "tool call served"
        );
        Ok(result.text)
    }

    async fn load(&self, call: &ToolCall, key: &str) -> Result<CacheLookup<CachedDataset>> {
        let provider = &self.provider;
        let fetch = move || async move {
            let payload = provider.fetch(call).await.map_err(|err| {
                warn!(provider = provider.name(), error = %err, "fetch failed");
                ToolError::from(err)
            })?;
            Dataset::from_json(payload, call.data_kind()).map(Arc::new)
        };

        if self.dedupe_fetches {
            self.cache.get_or_set_exclusive(key, fetch, call.ttl()).await
        } else {
            self.cache.get_or_set(key, fetch, call.ttl()).await
        }
    }
}
