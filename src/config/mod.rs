//! Configuration management for geochat
//!
//! Settings are read from a TOML file (`GEOCHAT_CONFIG` or the platform
//! config dir) and fall back to built-in defaults. The `AGENT_ENV`
//! environment variable picks the profile.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Environment variable selecting the profile
pub const PROFILE_ENV_VAR: &str = "AGENT_ENV";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV_VAR: &str = "GEOCHAT_CONFIG";

/// Default MCP server name
pub const DEFAULT_SERVER_NAME: &str = "saudi-location-intelligence";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Resolved from `AGENT_ENV`, never read from the file
    #[serde(skip)]
    pub profile: Profile,
    pub llm: LlmConfig,
    pub mcp: McpConfig,
    pub analysis: AnalysisConfig,
    pub agent: AgentConfig,
    pub session: SessionConfig,
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
}

/// Deployment profile. Profiles only differ in debug/log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Development,
    Production,
}

impl Profile {
    /// Resolve from an `AGENT_ENV` value; anything but "production" is development
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "production" => Profile::Production,
            _ => Profile::Development,
        }
    }

    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(PROFILE_ENV_VAR).ok().as_deref())
    }

    pub fn debug(&self) -> bool {
        matches!(self, Profile::Development)
    }

    pub fn verbose_logging(&self) -> bool {
        matches!(self, Profile::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

/// MCP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpConfig {
    /// Check that interpreter and script paths exist before connecting
    pub validate_paths: bool,
    /// Timeout for a single remote tool call
    pub tool_timeout_secs: u64,
    /// Servers by name
    pub servers: BTreeMap<String, McpServer>,
}

impl Default for McpConfig {
    fn default() -> Self {
        let mut servers = BTreeMap::new();
        servers.insert(DEFAULT_SERVER_NAME.to_string(), McpServer::default());
        Self {
            validate_paths: true,
            tool_timeout_secs: 120,
            servers,
        }
    }
}

/// Transport kinds accepted in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum McpTransportKind {
    #[default]
    Stdio,
    Sse,
    #[serde(rename = "streamable_http")]
    StreamableHttp,
}

/// A single MCP server entry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpServer {
    /// Interpreter or executable to spawn
    pub command: String,
    /// Arguments, usually the server script path
    pub args: Vec<String>,
    pub transport: McpTransportKind,
    /// Extra environment for the child (supports `${VAR}` expansion)
    pub env: HashMap<String, String>,
    pub enabled: bool,
}

impl Default for McpServer {
    fn default() -> Self {
        let project_root = PathBuf::from("..").join("backend");
        let mut env = HashMap::new();
        env.insert(
            "PYTHONPATH".to_string(),
            project_root.to_string_lossy().into_owned(),
        );
        Self {
            command: project_root
                .join(".venv")
                .join("bin")
                .join("python")
                .to_string_lossy()
                .into_owned(),
            args: vec![project_root
                .join("tool_bridge_mcp_server")
                .join("mcp_server.py")
                .to_string_lossy()
                .into_owned()],
            transport: McpTransportKind::Stdio,
            env,
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub default_analysis_type: String,
    pub default_num_territories: u32,
    pub default_distance_limit_km: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_analysis_type: "comprehensive".to_string(),
            default_num_territories: 6,
            default_distance_limit_km: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub max_iterations: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self { max_iterations: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Fixed session id; generated when absent
    pub id: Option<String>,
    /// Fixed default thread id; derived from the session id when absent
    pub thread_id: Option<String>,
    /// Keep conversation memory per thread
    pub memory: bool,
    /// Oldest messages beyond this are dropped from a thread
    pub max_history_messages: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            id: None,
            thread_id: None,
            memory: true,
            max_history_messages: crate::agent::DEFAULT_MAX_HISTORY_MESSAGES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8050,
        }
    }
}

/// Static vocabulary shown in the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub business_types: Vec<String>,
    pub cities: Vec<String>,
    /// Prompt type name -> description
    pub prompt_types: BTreeMap<String, String>,
    pub example_queries: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let to_strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();

        let mut prompt_types = BTreeMap::new();
        prompt_types.insert(
            "comprehensive".to_string(),
            "Full academic report with detailed methodology".to_string(),
        );
        prompt_types.insert(
            "simple".to_string(),
            "Basic analysis without detailed methodology".to_string(),
        );
        prompt_types.insert(
            "executive".to_string(),
            "High-level business insights and strategic recommendations".to_string(),
        );

        Self {
            business_types: to_strings(&[
                "supermarket",
                "restaurant",
                "pharmacy",
                "gas_station",
                "retail",
                "hospital",
                "bank",
                "grocery_store",
                "shopping_mall",
                "hotel",
            ]),
            cities: to_strings(&[
                "Riyadh",
                "Jeddah",
                "Dammam",
                "Mecca",
                "Medina",
                "Khobar",
                "Taif",
                "Buraidah",
                "Khamis Mushait",
                "Hail",
            ]),
            prompt_types,
            example_queries: to_strings(&[
                "Create 6 sales territories for restaurants in Jeddah",
                "Optimize supermarket territories in Riyadh with 8 regions",
                "Analyze pharmacy distribution in Dammam for 5 sales teams",
                "Generate territory plan for gas stations in Mecca",
                "Create 4 balanced territories for retail stores in Khobar",
                "Optimize hospital coverage in Medina with 3 service areas",
            ]),
        }
    }
}

impl Config {
    /// Load configuration from the default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Config::default()
        };
        config.profile = Profile::from_env();
        Ok(config)
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV_VAR) {
            return Ok(PathBuf::from(path));
        }
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "geochat") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Ok(PathBuf::from("config.toml"))
        }
    }

    /// Enabled MCP servers
    pub fn enabled_servers(&self) -> impl Iterator<Item = (&String, &McpServer)> {
        self.mcp.servers.iter().filter(|(_, s)| s.enabled)
    }

    /// Return every required path that does not exist.
    ///
    /// Checks each enabled stdio server's command (when it is a path rather
    /// than a bare program name) and any argument that looks like a script.
    pub fn validate_paths(&self) -> Vec<PathBuf> {
        let mut missing = Vec::new();
        for (name, server) in self.enabled_servers() {
            if server.transport != McpTransportKind::Stdio {
                continue;
            }
            let command = Path::new(&server.command);
            if command.components().count() > 1 && !command.exists() {
                tracing::warn!("[{}] missing interpreter: {}", name, command.display());
                missing.push(command.to_path_buf());
            }
            for arg in server.args.iter().filter(|a| looks_like_script(a)) {
                let script = Path::new(arg);
                if !script.exists() {
                    tracing::warn!("[{}] missing server script: {}", name, script.display());
                    missing.push(script.to_path_buf());
                }
            }
        }
        missing
    }
}

fn looks_like_script(arg: &str) -> bool {
    !arg.starts_with('-')
        && Path::new(arg)
            .extension()
            .is_some_and(|ext| matches!(ext.to_str(), Some("py" | "js" | "mjs" | "ts")))
}
