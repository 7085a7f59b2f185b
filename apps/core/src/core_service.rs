use std::sync::Arc;

use crate::activation::ActivationDispatcher;
use crate::cache::{InventoryCache, RefreshOutcome};
use crate::config::{validate, Config};
use crate::contract::{
    ActivateResponse, CloseTabResponse, CoreRequest, CoreResponse, SearchResponse,
};
use crate::model::{Item, ItemKind};
use crate::tab_provider::TabProvider;
use crate::window_provider::WindowProvider;

#[derive(Debug)]
pub enum ServiceError {
    Config(String),
    InvalidRequest(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::InvalidRequest(error) => write!(f, "invalid request: {error}"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// The surface the presentation layer talks to: search, activate, refresh.
pub struct CoreService {
    config: Config,
    cache: InventoryCache,
    dispatcher: ActivationDispatcher,
}

impl CoreService {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;

        let windows = Arc::new(WindowProvider::from_config(&config));
        let tabs = Arc::new(TabProvider::from_config(&config));
        let cache = InventoryCache::new(
            windows.clone(),
            tabs.clone(),
            config.staleness(),
            config.provider_timeout(),
        );
        let dispatcher = ActivationDispatcher::new(windows, tabs, &config.browser_name);

        Ok(Self {
            config,
            cache,
            dispatcher,
        })
    }

    pub fn with_parts(
        config: Config,
        cache: InventoryCache,
        dispatcher: ActivationDispatcher,
    ) -> Result<Self, ServiceError> {
        validate(&config).map_err(ServiceError::Config)?;
        Ok(Self {
            config,
            cache,
            dispatcher,
        })
    }

    pub fn cache(&self) -> &InventoryCache {
        &self.cache
    }

    pub fn search(&self, query: &str) -> Vec<Item> {
        self.search_with_limit(query, None)
    }

    /// `limit` overrides the configured `max_results`; zero means unlimited.
    pub fn search_with_limit(&self, query: &str, limit: Option<usize>) -> Vec<Item> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let snapshot = self.cache.get();
        let mut results = crate::search::search(&snapshot, query);

        let effective_limit = limit.unwrap_or(self.config.max_results as usize);
        if effective_limit > 0 {
            results.truncate(effective_limit);
        }
        results
    }

    /// Every cached item, windows first. Used to populate an empty launcher.
    pub fn list_all(&self) -> Vec<Item> {
        self.cache.get().items().cloned().collect()
    }

    pub fn activate(&self, kind: ItemKind, id: &str) -> bool {
        self.dispatcher.activate(kind, id)
    }

    pub fn close_tab(&self, id: &str) -> bool {
        let closed = self.dispatcher.close_tab(id);
        if closed {
            let _ = self.cache.try_refresh();
        }
        closed
    }

    pub fn force_refresh(&self) -> RefreshOutcome {
        self.cache.force_refresh()
    }

    pub fn handle_command(&self, request: CoreRequest) -> Result<CoreResponse, ServiceError> {
        match request {
            CoreRequest::Search(request) => {
                let results = self
                    .search_with_limit(&request.query, request.limit)
                    .into_iter()
                    .map(Into::into)
                    .collect();
                Ok(CoreResponse::Search(SearchResponse { results }))
            }
            CoreRequest::ListAll => {
                let results = self.list_all().into_iter().map(Into::into).collect();
                Ok(CoreResponse::ListAll(SearchResponse { results }))
            }
            CoreRequest::Activate(request) => {
                let id = request.id.trim();
                if id.is_empty() {
                    return Err(ServiceError::InvalidRequest(
                        "activate requires a non-empty id".to_string(),
                    ));
                }
                let activated = self.activate(request.kind, id);
                Ok(CoreResponse::Activate(ActivateResponse { activated }))
            }
            CoreRequest::Refresh => Ok(CoreResponse::Refresh(self.force_refresh().into())),
            CoreRequest::CloseTab(request) => {
                let id = request.id.trim();
                if id.is_empty() {
                    return Err(ServiceError::InvalidRequest(
                        "close_tab requires a non-empty id".to_string(),
                    ));
                }
                let closed = self.close_tab(id);
                Ok(CoreResponse::CloseTab(CloseTabResponse { closed }))
            }
        }
    }
}
