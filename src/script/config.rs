use serde::{Deserialize, Serialize};

/// Processing engine backing a script engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    #[default]
    InMemory,
}

/// Script engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    /// Dataset processing backend.
    pub engine: EngineKind,
    /// Log every evaluated statement at debug level.
    pub log_statements: bool,
}

impl ScriptConfig {
    /// Parse a JSON configuration; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
