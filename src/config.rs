//! @ai:module:intent Configuration structs for the benchmark harness
//! @ai:module:layer infrastructure
//! @ai:module:public_api BenchmarkConfig, ToolConfig, ProbeConfig, RunDefaults, RunConfiguration
//! @ai:module:stateless true

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prompt used when none is given on the command line.
pub const DEFAULT_PROMPT: &str =
    "List all 50 US state capitals in alphabetical order by state name.";

/// @ai:intent Main configuration file for the harness
/// @ai:effects pure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub run: RunDefaults,
}

/// @ai:intent External inference tool settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_executable")]
    pub executable: String,
    #[serde(default = "default_monitor_script")]
    pub monitor_script: String,
}

/// @ai:intent Host resource sensor settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeConfig {
    #[serde(default = "default_memory_command")]
    pub memory_command: Vec<String>,
    #[serde(default = "default_accelerator_load_path")]
    pub accelerator_load_path: PathBuf,
    /// Retry a denied read through `sudo -n`, which never prompts.
    #[serde(default = "default_true")]
    pub privileged_read: bool,
}

/// @ai:intent Defaults for a single benchmark run, overridable from the CLI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunDefaults {
    #[serde(default = "default_prompt")]
    pub prompt: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_context")]
    pub max_context: u32,
    #[serde(default = "default_true")]
    pub apply_template: bool,
    #[serde(default = "default_output")]
    pub output: PathBuf,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            monitor_script: default_monitor_script(),
        }
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            memory_command: default_memory_command(),
            accelerator_load_path: default_accelerator_load_path(),
            privileged_read: true,
        }
    }
}

impl Default for RunDefaults {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            max_tokens: default_max_tokens(),
            max_context: default_max_context(),
            apply_template: true,
            output: default_output(),
        }
    }
}

fn default_executable() -> String {
    "rkllm".to_string()
}

fn default_monitor_script() -> String {
    "./monitor-npu.sh".to_string()
}

fn default_memory_command() -> Vec<String> {
    vec!["free".to_string(), "-g".to_string()]
}

fn default_accelerator_load_path() -> PathBuf {
    PathBuf::from("/sys/kernel/debug/rknpu/load")
}

fn default_prompt() -> String {
    DEFAULT_PROMPT.to_string()
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_max_context() -> u32 {
    4096
}

fn default_output() -> PathBuf {
    PathBuf::from("benchmark_results.csv")
}

fn default_true() -> bool {
    true
}

impl BenchmarkConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// @ai:intent Immutable input to one benchmark session
/// @ai:effects pure
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfiguration {
    pub model_path: PathBuf,
    pub prompt: String,
    pub max_tokens: u32,
    pub max_context: u32,
    pub apply_template: bool,
    pub output: PathBuf,
}

impl RunConfiguration {
    /// @ai:intent Build a run configuration for a model using the configured defaults
    /// @ai:effects pure
    pub fn from_defaults(model_path: impl Into<PathBuf>, defaults: &RunDefaults) -> Self {
        Self {
            model_path: model_path.into(),
            prompt: defaults.prompt.clone(),
            max_tokens: defaults.max_tokens,
            max_context: defaults.max_context,
            apply_template: defaults.apply_template,
            output: defaults.output.clone(),
        }
    }

    /// @ai:intent Basename of the model artifact, used as the model identifier
    /// @ai:effects pure
    pub fn model_name(&self) -> String {
        self.model_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model_path.to_string_lossy().into_owned())
    }
}
