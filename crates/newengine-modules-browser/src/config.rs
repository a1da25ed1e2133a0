use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::bridge::NativeLogLevel;
use crate::error::{BrowserError, BrowserResult};
use crate::shutdown::{DEFAULT_SHUTDOWN_POLL, DEFAULT_SHUTDOWN_TIMEOUT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

/// `[modules.data]` table of the `browser` module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub library: PathBuf,
    pub user_agent: String,
    pub homepage: Option<String>,
    pub close_native_window_on_close: bool,
    pub resources_path: Option<PathBuf>,
    pub log_level: NativeLogLevel,
    pub forward_native_log: bool,
    pub shutdown_timeout_ms: u64,
    pub shutdown_poll_ms: u64,
    /// Opened once the module starts.
    pub initial_window: Option<WindowSize>,
}

fn default_library() -> PathBuf {
    let name = if cfg!(target_os = "windows") {
        "native_browser.dll"
    } else if cfg!(target_os = "macos") {
        "libnative_browser.dylib"
    } else {
        "libnative_browser.so"
    };
    PathBuf::from(name)
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            library: default_library(),
            user_agent: format!("NewEngine/{}", env!("CARGO_PKG_VERSION")),
            homepage: None,
            close_native_window_on_close: true,
            resources_path: None,
            log_level: NativeLogLevel::default(),
            forward_native_log: true,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT.as_millis() as u64,
            shutdown_poll_ms: DEFAULT_SHUTDOWN_POLL.as_millis() as u64,
            initial_window: None,
        }
    }
}

impl BrowserConfig {
    /// Missing data means defaults.
    pub fn from_module_data(data: Option<&toml::Value>) -> BrowserResult<Self> {
        match data {
            None => Ok(Self::default()),
            Some(v) => v
                .clone()
                .try_into()
                .map_err(|e: toml::de::Error| BrowserError::Config(e.to_string())),
        }
    }

    #[inline]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    #[inline]
    pub fn shutdown_poll(&self) -> Duration {
        Duration::from_millis(self.shutdown_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_gives_defaults() {
        let v = toml::Value::Table(toml::map::Map::new());
        let cfg = BrowserConfig::from_module_data(Some(&v)).unwrap();
        assert_eq!(cfg, BrowserConfig::default());
        assert_eq!(cfg.shutdown_timeout(), Duration::from_millis(2000));
        assert_eq!(cfg.shutdown_poll(), Duration::from_millis(1));
    }

    #[test]
    fn reads_every_key() {
        let v: toml::Value = toml::from_str(
            r#"
            library = "/opt/browser/libnb.so"
            user_agent = "Test/1"
            homepage = "https://example.org/"
            close_native_window_on_close = false
            resources_path = "assets/browser"
            log_level = "rel_info"
            forward_native_log = false
            shutdown_timeout_ms = 500
            shutdown_poll_ms = 5
            initial_window = { width = 1280, height = 720 }
            "#,
        )
        .unwrap();

        let cfg = BrowserConfig::from_module_data(Some(&v)).unwrap();
        assert_eq!(cfg.library, PathBuf::from("/opt/browser/libnb.so"));
        assert_eq!(cfg.homepage.as_deref(), Some("https://example.org/"));
        assert!(!cfg.close_native_window_on_close);
        assert_eq!(cfg.log_level, NativeLogLevel::RelInfo);
        assert!(!cfg.forward_native_log);
        assert_eq!(cfg.shutdown_timeout(), Duration::from_millis(500));
        assert_eq!(
            cfg.initial_window,
            Some(WindowSize {
                width: 1280,
                height: 720
            })
        );
    }

    #[test]
    fn bad_types_are_config_errors() {
        let v: toml::Value = toml::from_str("shutdown_timeout_ms = \"soon\"").unwrap();
        assert!(matches!(
            BrowserConfig::from_module_data(Some(&v)),
            Err(BrowserError::Config(_))
        ));
    }
}
