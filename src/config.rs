//! src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

pub const DB_PATH_ENV: &str = "COMMIT_DB_PATH";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

const CONFIG_FILE_NAME: &str = "coas.toml";
const DEFAULT_DB_FILE_NAME: &str = "commits.db";
const DEFAULT_LOG_LEVEL: &str = "warn";
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Returns the configuration directory path (~/.config/coas).
pub async fn get_config_dir() -> Result<PathBuf> {
    let config_dir = if cfg!(windows) {
        // Windows: %APPDATA%\coas
        dirs::data_dir()
            .map(|p| p.join("coas"))
            .context("Could not get data directory")?
    } else {
        // Linux/macOS: ~/.config/coas
        dirs::config_dir()
            .map(|p| p.join("coas"))
            .context("Could not get config directory")?
    };

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)
            .await
            .context("Could not create config directory")?;
    }
    Ok(config_dir)
}

pub async fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir().await?.join(CONFIG_FILE_NAME))
}

/// 把开头的 `~` 展开成用户主目录。
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// 配置文件的内容，每个 section 下都是字符串键值对，缺省的键用默认值兜底。
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub git: GitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct GitConfig {
    /// 全局 hooks 目录，setup 时写回。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hooks_dir: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// 为空时日志写到 stderr。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GeminiConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
        }
    }
}

impl Config {
    /// Loads the config file, creating it with defaults on first access.
    pub async fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Config::default();
            config.save(path).await?;
            log::info!("Created default config file at {}", path.display());
            return Ok(config);
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Could not read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Could not parse config file {}", path.display()))?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Could not create config directory")?;
        }
        let content = toml::to_string(self).context("Could not serialize config")?;
        fs::write(path, content)
            .await
            .with_context(|| format!("Could not write config file {}", path.display()))?;
        Ok(())
    }

    /// 纯读取，不会触发任何交互。未知的 section/key 返回 None。
    pub fn get(&self, section: &str, key: &str) -> Option<String> {
        match (section, key) {
            ("database", "path") => self.database.path.clone(),
            ("git", "hooks_dir") => self.git.hooks_dir.clone(),
            ("logging", "level") => Some(self.logging.level.clone()),
            ("logging", "file") => self.logging.file.clone(),
            ("gemini", "api_key") => self.gemini.api_key.clone(),
            ("gemini", "model") => Some(self.gemini.model.clone()),
            ("gemini", "api_base") => Some(self.gemini.api_base.clone()),
            _ => None,
        }
        .filter(|v| !v.is_empty())
    }

    pub fn get_or(&self, section: &str, key: &str, default: &str) -> String {
        self.get(section, key).unwrap_or_else(|| default.to_string())
    }

    /// 只改内存中的值，需要调用 `save` 才会落盘。返回 false 表示没有这个键。
    pub fn set(&mut self, section: &str, key: &str, value: &str) -> bool {
        let value = value.to_string();
        match (section, key) {
            ("database", "path") => self.database.path = Some(value),
            ("git", "hooks_dir") => self.git.hooks_dir = Some(value),
            ("logging", "level") => self.logging.level = value,
            ("logging", "file") => self.logging.file = Some(value),
            ("gemini", "api_key") => self.gemini.api_key = Some(value),
            ("gemini", "model") => self.gemini.model = value,
            ("gemini", "api_base") => self.gemini.api_base = value,
            _ => return false,
        }
        true
    }

    /// 配置文件里的 key 优先，其次是 GEMINI_API_KEY 环境变量。
    pub fn api_key(&self) -> Option<String> {
        self.get("gemini", "api_key").or_else(|| {
            env::var(API_KEY_ENV)
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
        })
    }

    /// COMMIT_DB_PATH > database.path > 配置目录下的 commits.db
    pub fn db_path(&self, config_dir: &Path) -> PathBuf {
        if let Ok(path) = env::var(DB_PATH_ENV) {
            if !path.trim().is_empty() {
                return expand_home(path.trim());
            }
        }
        match self.get("database", "path") {
            Some(path) => expand_home(&path),
            None => config_dir.join(DEFAULT_DB_FILE_NAME),
        }
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.get("logging", "file").map(|p| expand_home(&p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn creates_default_file_on_first_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

        let config = Config::load_or_create(&path).await.unwrap();

        assert!(path.exists());
        assert_eq!(config, Config::default());
        assert_eq!(config.get_or("logging", "level", "info"), "warn");
        assert_eq!(config.get("gemini", "api_key"), None);
    }

    #[tokio::test]
    async fn saved_values_survive_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);

        let mut config = Config::default();
        assert!(config.set("gemini", "api_key", "secret"));
        assert!(config.set("git", "hooks_dir", "/tmp/hooks"));
        config.save(&path).await.unwrap();

        let reloaded = Config::load_or_create(&path).await.unwrap();
        assert_eq!(reloaded.get("gemini", "api_key").as_deref(), Some("secret"));
        assert_eq!(reloaded.get("git", "hooks_dir").as_deref(), Some("/tmp/hooks"));
    }

    #[tokio::test]
    async fn partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[database]\npath = \"/data/commits.db\"\n[gemini]\napi_key = \"k\"\n")
            .await
            .unwrap();

        let config = Config::load_or_create(&path).await.unwrap();
        assert_eq!(config.get("database", "path").as_deref(), Some("/data/commits.db"));
        assert_eq!(config.gemini.api_key.as_deref(), Some("k"));
        assert_eq!(config.gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(config.logging.level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn unknown_keys_are_absent() {
        let mut config = Config::default();
        assert_eq!(config.get("gemini", "nope"), None);
        assert_eq!(config.get_or("nope", "nope", "fallback"), "fallback");
        assert!(!config.set("nope", "nope", "x"));
    }

    #[test]
    fn empty_values_read_as_absent() {
        let mut config = Config::default();
        config.set("gemini", "api_key", "");
        assert_eq!(config.get("gemini", "api_key"), None);
    }

    #[test]
    fn expands_tilde() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_home("~/x/commits.db"), home.join("x").join("commits.db"));
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
    }
}
