//! Instrumentation configuration.
//!
//! These are the resolved flags that decide whether a hook category gets
//! intercepted at all. Option normalization happens upstream; this module
//! only parses the resolved shape and answers gating questions.
//!
//! ## Syntax
//!
//! ```yaml
//! enabled: true
//! mode: normal        # normal | lite | brief
//! features:
//!   loader: true
//!   plugins: true
//!   resolver: false
//!   bundle: true
//! ```
//!
//! `features: true` / `features: false` switches every category at once.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::TelemetryError;

/// How much the downstream report should carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    #[default]
    Normal,
    Lite,
    Brief,
}

/// Which family of build hooks a registration belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookCategory {
    /// Compiler and compilation plugin hooks
    Plugin,
    /// Loader execution hooks
    Loader,
    /// Module resolution hooks
    Resolver,
    /// Chunk/asset graph hooks
    Bundle,
}

impl HookCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookCategory::Plugin => "plugin",
            HookCategory::Loader => "loader",
            HookCategory::Resolver => "resolver",
            HookCategory::Bundle => "bundle",
        }
    }
}

impl fmt::Display for HookCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-category instrumentation switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureFlags {
    #[serde(default = "default_true")]
    pub loader: bool,

    #[serde(default = "default_true")]
    pub plugins: bool,

    #[serde(default)]
    pub resolver: bool,

    #[serde(default = "default_true")]
    pub bundle: bool,
}

impl FeatureFlags {
    fn all(enabled: bool) -> Self {
        Self {
            loader: enabled,
            plugins: enabled,
            resolver: enabled,
            bundle: enabled,
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            loader: true,
            plugins: true,
            resolver: false,
            bundle: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Wrapper for deserializing features from either a boolean or a full object
#[derive(Debug, Clone)]
enum FeaturesInput {
    All(bool),
    Full(FeatureFlags),
}

impl<'de> Deserialize<'de> for FeaturesInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, MapAccess, Visitor};

        struct FeaturesInputVisitor;

        impl<'de> Visitor<'de> for FeaturesInputVisitor {
            type Value = FeaturesInput;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a boolean or a feature flag object")
            }

            fn visit_bool<E>(self, value: bool) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(FeaturesInput::All(value))
            }

            fn visit_map<M>(self, map: M) -> Result<Self::Value, M::Error>
            where
                M: MapAccess<'de>,
            {
                let flags =
                    FeatureFlags::deserialize(serde::de::value::MapAccessDeserializer::new(map))?;
                Ok(FeaturesInput::Full(flags))
            }
        }

        deserializer.deserialize_any(FeaturesInputVisitor)
    }
}

impl From<FeaturesInput> for FeatureFlags {
    fn from(input: FeaturesInput) -> Self {
        match input {
            FeaturesInput::All(enabled) => FeatureFlags::all(enabled),
            FeaturesInput::Full(flags) => flags,
        }
    }
}

fn deserialize_features<'de, D>(deserializer: D) -> Result<FeatureFlags, D::Error>
where
    D: Deserializer<'de>,
{
    FeaturesInput::deserialize(deserializer).map(FeatureFlags::from)
}

/// Resolved instrumentation settings for one build session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentationConfig {
    /// Master switch
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub mode: ReportMode,

    #[serde(default, deserialize_with = "deserialize_features")]
    pub features: FeatureFlags,
}

impl Default for InstrumentationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ReportMode::default(),
            features: FeatureFlags::default(),
        }
    }
}

impl InstrumentationConfig {
    /// Configuration that instruments nothing.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    /// Whether hooks in `category` should be intercepted.
    pub fn allows(&self, category: HookCategory) -> bool {
        if !self.enabled {
            return false;
        }
        match category {
            HookCategory::Plugin => self.features.plugins,
            HookCategory::Loader => self.features.loader,
            HookCategory::Resolver => self.features.resolver,
            HookCategory::Bundle => self.features.bundle,
        }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, TelemetryError> {
        serde_yaml_ng::from_str(content)
            .map_err(|source| TelemetryError::ConfigParseYaml { source })
    }

    pub fn from_json_str(content: &str) -> Result<Self, TelemetryError> {
        serde_json::from_str(content).map_err(|source| TelemetryError::ConfigParseJson { source })
    }

    /// Load from a file. `.json` files parse as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, TelemetryError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| TelemetryError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::from_yaml_str(&content)?
        };

        tracing::debug!(
            path = %path.display(),
            enabled = config.enabled,
            mode = ?config.mode,
            "Loaded instrumentation config"
        );
        Ok(config)
    }
}
