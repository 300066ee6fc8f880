use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use storyboard_pipeline::config::ComfyUISettings;
use storyboard_pipeline::BackendConfig;

/// Start-up configuration that could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("GENERATION_TIMEOUT_SECS ({generation}) must be below REQUEST_TIMEOUT_SECS ({request})")]
    TimeoutOrder { generation: u64, request: u64 },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`).
    pub request_timeout_secs: u64,
    /// Ceiling on one backend call in seconds (default: `480`).
    pub generation_timeout_secs: u64,
    /// Root of the on-disk layout, see [`DataDirs`].
    pub data_dir: PathBuf,
    pub backend: BackendConfig,
    /// External story analysis command; empty disables it.
    pub analyzer_command: String,
    pub analyzer_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                       | Default                      |
    /// |-------------------------------|------------------------------|
    /// | `HOST`                        | `0.0.0.0`                    |
    /// | `PORT`                        | `3000`                       |
    /// | `CORS_ORIGINS`                | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS`        | `600`                        |
    /// | `GENERATION_TIMEOUT_SECS`     | `480`                        |
    /// | `DATA_DIR`                    | `./data`                     |
    /// | `IMAGE_BACKEND`               | `mock`                       |
    /// | `NANA_BANANA_API_KEY`         | empty                        |
    /// | `NANA_BANANA_BASE_URL`        | `https://api.nanabanana.pro` |
    /// | `CLOUD_API_TIMEOUT_SECS`      | `120`                        |
    /// | `COMFYUI_ENABLED`             | `false`                      |
    /// | `COMFYUI_HOST`                | `127.0.0.1`                  |
    /// | `COMFYUI_PORT`                | `8188`                       |
    /// | `COMFYUI_USE_HTTPS`           | `false`                      |
    /// | `COMFYUI_TIMEOUT_SECS`        | `300`                        |
    /// | `COMFYUI_WORKFLOW_FILE`       | empty                        |
    /// | `COMFYUI_MODEL`               | empty (auto-detect)          |
    /// | `MOCK_DELAY_MS`               | `0`                          |
    /// | `STORY_ANALYZER_COMMAND`      | empty                        |
    /// | `STORY_ANALYZER_TIMEOUT_SECS` | `120`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let port: u16 = vars.parsed("PORT", 3000, "a port number")?;
        if port == 0 {
            return Err(invalid("PORT", "0", "a port number"));
        }

        let cors_origins: Vec<String> = vars
            .string("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = vars.parsed("REQUEST_TIMEOUT_SECS", 600, "a number of seconds")?;
        let generation_timeout_secs: u64 =
            vars.parsed("GENERATION_TIMEOUT_SECS", 480, "a number of seconds")?;
        if generation_timeout_secs >= request_timeout_secs {
            return Err(ConfigError::TimeoutOrder {
                generation: generation_timeout_secs,
                request: request_timeout_secs,
            });
        }

        let defaults = BackendConfig::default();
        let comfy = ComfyUISettings::default();
        let workflow_file = vars.string("COMFYUI_WORKFLOW_FILE", "");
        let backend = BackendConfig {
            backend: vars.string("IMAGE_BACKEND", &defaults.backend),
            api_key: vars.string("NANA_BANANA_API_KEY", ""),
            api_base_url: vars.string("NANA_BANANA_BASE_URL", &defaults.api_base_url),
            api_timeout: Duration::from_secs(vars.parsed(
                "CLOUD_API_TIMEOUT_SECS",
                defaults.api_timeout.as_secs(),
                "a number of seconds",
            )?),
            comfyui: ComfyUISettings {
                enabled: vars.flag("COMFYUI_ENABLED", comfy.enabled)?,
                host: vars.string("COMFYUI_HOST", &comfy.host),
                port: vars.parsed("COMFYUI_PORT", comfy.port, "a port number")?,
                use_https: vars.flag("COMFYUI_USE_HTTPS", comfy.use_https)?,
                timeout: Duration::from_secs(vars.parsed(
                    "COMFYUI_TIMEOUT_SECS",
                    comfy.timeout.as_secs(),
                    "a number of seconds",
                )?),
                workflow_file: (!workflow_file.is_empty()).then(|| PathBuf::from(workflow_file)),
                model: vars.string("COMFYUI_MODEL", ""),
            },
            mock_delay: Duration::from_millis(vars.parsed("MOCK_DELAY_MS", 0, "a number of milliseconds")?),
        };

        Ok(Self {
            host: vars.string("HOST", "0.0.0.0"),
            port,
            cors_origins,
            request_timeout_secs,
            generation_timeout_secs,
            data_dir: PathBuf::from(vars.string("DATA_DIR", "./data")),
            backend,
            analyzer_command: vars.string("STORY_ANALYZER_COMMAND", ""),
            analyzer_timeout_secs: vars.parsed("STORY_ANALYZER_TIMEOUT_SECS", 120, "a number of seconds")?,
        })
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn analyzer_timeout(&self) -> Duration {
        Duration::from_secs(self.analyzer_timeout_secs)
    }
}

fn invalid(name: &'static str, value: &str, expected: &'static str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
        expected,
    }
}

/// Variable source with typed accessors. Blank values count as unset.
struct Vars<F>(F);

impl<F: Fn(&str) -> Option<String>> Vars<F> {
    fn raw(&self, name: &str) -> Option<String> {
        (self.0)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, name: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError> {
        match self.raw(name) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|_| invalid(name, &value, expected)),
        }
    }

    fn flag(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.raw(name) {
            None => Ok(default),
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(invalid(name, &value, "a boolean")),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Data directories
// ---------------------------------------------------------------------------

/// Asset categories kept under `assets/`.
pub const ASSET_CATEGORIES: &[&str] = &["characters", "scenes", "props", "styles"];

/// On-disk layout below `DATA_DIR`.
#[derive(Debug, Clone)]
pub struct DataDirs {
    pub root: PathBuf,
    pub projects: PathBuf,
    pub outputs: PathBuf,
    pub exports: PathBuf,
    pub assets: PathBuf,
}

impl DataDirs {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            projects: root.join("projects"),
            outputs: root.join("outputs"),
            exports: root.join("exports"),
            assets: root.join("assets"),
            root,
        }
    }

    /// Create every directory of the layout.
    pub async fn create_all(&self) -> std::io::Result<()> {
        for dir in [&self.projects, &self.outputs, &self.exports] {
            tokio::fs::create_dir_all(dir).await?;
        }
        for category in ASSET_CATEGORIES {
            tokio::fs::create_dir_all(self.assets.join(category)).await?;
        }
        tracing::debug!(root = %self.root.display(), "Data directories ready");
        Ok(())
    }
}
