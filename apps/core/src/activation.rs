use std::sync::Arc;

use crate::discovery::ProviderError;
use crate::logging;
use crate::model::{native_tab_id, Item, ItemKind};
use crate::tab_provider::TabProvider;
use crate::window_provider::WindowProvider;

pub trait WindowControl: Send + Sync {
    fn list_windows(&self) -> Vec<Item>;
    fn activate_window(&self, id: &str) -> bool;
}

pub trait TabControl: Send + Sync {
    fn activate_tab(&self, native_id: &str) -> Result<(), ProviderError>;
    fn close_tab(&self, native_id: &str) -> Result<(), ProviderError>;
}

impl WindowControl for WindowProvider {
    fn list_windows(&self) -> Vec<Item> {
        WindowProvider::list_windows(self)
    }

    fn activate_window(&self, id: &str) -> bool {
        WindowProvider::activate_window(self, id)
    }
}

impl TabControl for TabProvider {
    fn activate_tab(&self, native_id: &str) -> Result<(), ProviderError> {
        TabProvider::activate_tab(self, native_id)
    }

    fn close_tab(&self, native_id: &str) -> Result<(), ProviderError> {
        TabProvider::close_tab(self, native_id)
    }
}

/// Routes an activation request to the provider that owns the item.
pub struct ActivationDispatcher {
    windows: Arc<dyn WindowControl>,
    tabs: Arc<dyn TabControl>,
    browser_name: String,
}

impl ActivationDispatcher {
    pub fn new(
        windows: Arc<dyn WindowControl>,
        tabs: Arc<dyn TabControl>,
        browser_name: &str,
    ) -> Self {
        Self {
            windows,
            tabs,
            browser_name: browser_name.trim().to_lowercase(),
        }
    }

    pub fn activate(&self, kind: ItemKind, id: &str) -> bool {
        if id.trim().is_empty() {
            logging::warn("activation requested with an empty id");
            return false;
        }
        match kind {
            ItemKind::Window => self.windows.activate_window(id),
            ItemKind::Tab => self.activate_tab(id),
        }
    }

    /// Raises the browser window first, so a failed tab switch still leaves the browser
    /// in front.
    fn activate_tab(&self, item_id: &str) -> bool {
        let native_id = native_tab_id(item_id);

        let raised = match self.find_browser_window() {
            Some(window_id) => {
                let raised = self.windows.activate_window(&window_id);
                if raised {
                    logging::debug(&format!("raised browser window {window_id}"));
                }
                raised
            }
            None => {
                logging::debug(&format!(
                    "no window matching browser '{}' found",
                    self.browser_name
                ));
                false
            }
        };

        match self.tabs.activate_tab(native_id) {
            Ok(()) => true,
            Err(error) => {
                logging::info(&format!(
                    "tab {native_id} activation failed (browser raised: {raised}): {error}"
                ));
                raised
            }
        }
    }

    fn find_browser_window(&self) -> Option<String> {
        if self.browser_name.is_empty() {
            return None;
        }
        self.windows
            .list_windows()
            .into_iter()
            .find(|item| {
                let owner = item
                    .window()
                    .map(|record| record.owner.name.to_lowercase())
                    .unwrap_or_default();
                item.title.to_lowercase().contains(&self.browser_name)
                    || owner.contains(&self.browser_name)
            })
            .map(|item| item.id)
    }

    pub fn close_tab(&self, item_id: &str) -> bool {
        let native_id = native_tab_id(item_id);
        match self.tabs.close_tab(native_id) {
            Ok(()) => true,
            Err(error) => {
                logging::warn(&format!("tab {native_id} could not be closed: {error}"));
                false
            }
        }
    }
}
