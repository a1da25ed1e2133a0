use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::collab::NavigationSink;
use crate::window::WindowIndex;

/// Last known navigation facts for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    pub loading: bool,
    pub can_go_back: bool,
    pub can_go_forward: bool,
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Records navigation events per window index, then forwards them to an
/// optional downstream sink (a navigation bar, usually).
#[derive(Default)]
pub struct NavigationState {
    pages: Mutex<HashMap<WindowIndex, PageState>>,
    downstream: Option<Arc<dyn NavigationSink>>,
}

impl NavigationState {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_downstream(downstream: Arc<dyn NavigationSink>) -> Self {
        Self {
            pages: Mutex::default(),
            downstream: Some(downstream),
        }
    }

    pub fn page(&self, window_index: WindowIndex) -> Option<PageState> {
        self.pages.lock().get(&window_index).cloned()
    }

    pub fn forget(&self, window_index: WindowIndex) {
        self.pages.lock().remove(&window_index);
    }

    fn edit(&self, window_index: WindowIndex, f: impl FnOnce(&mut PageState)) {
        f(self.pages.lock().entry(window_index).or_default());
    }
}

impl NavigationSink for NavigationState {
    fn load_state_changed(&self, window_index: WindowIndex, loading: bool) {
        self.edit(window_index, |p| p.loading = loading);
        if let Some(d) = &self.downstream {
            d.load_state_changed(window_index, loading);
        }
    }

    fn history_changed(&self, window_index: WindowIndex, can_go_back: bool, can_go_forward: bool) {
        self.edit(window_index, |p| {
            p.can_go_back = can_go_back;
            p.can_go_forward = can_go_forward;
        });
        if let Some(d) = &self.downstream {
            d.history_changed(window_index, can_go_back, can_go_forward);
        }
    }

    fn title_changed(&self, window_index: WindowIndex, title: &str) {
        self.edit(window_index, |p| p.title = Some(title.to_string()));
        if let Some(d) = &self.downstream {
            d.title_changed(window_index, title);
        }
    }

    fn url_changed(&self, window_index: WindowIndex, url: &str) {
        self.edit(window_index, |p| p.url = Some(url.to_string()));
        if let Some(d) = &self.downstream {
            d.url_changed(window_index, url);
        }
    }
}
