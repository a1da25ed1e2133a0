use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_title")]
    pub title: String,

    /// Target frame time for the headless loop. 0 disables pacing.
    #[serde(default = "default_frame_ms")]
    pub frame_ms: u32,

    #[serde(default)]
    pub modules: Vec<ModuleConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleConfig {
    pub id: String,

    /// Free-form module settings.
    /// toml::Value has no Default, so an empty table is supplied.
    #[serde(default = "default_module_data")]
    pub data: toml::Value,
}

fn default_title() -> String {
    "NewEngine".to_string()
}
fn default_frame_ms() -> u32 {
    16
}

fn default_module_data() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            frame_ms: default_frame_ms(),
            modules: vec![
                ModuleConfig {
                    id: "logging".into(),
                    data: default_module_data(),
                },
                ModuleConfig {
                    id: "browser".into(),
                    data: default_module_data(),
                },
            ],
        }
    }
}

impl EngineConfig {
    pub fn load_or_default(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => Self::parse(&s)
                .map_err(|e| EngineError::Config(format!("parse {}: {}", path.display(), e))),
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn parse(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Settings table for module `id`, if the config lists it.
    pub fn module_data(&self, id: &str) -> Option<&toml::Value> {
        self.modules.iter().find(|m| m.id == id).map(|m| &m.data)
    }
}
