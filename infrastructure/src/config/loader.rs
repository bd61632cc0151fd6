//! Configuration file loader with multi-source merging

use super::file_config::FileConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::path::{Path, PathBuf};

const PROJECT_FILES: &[&str] = &["playpen.toml", ".playpen.toml"];

/// Configuration loader that handles file discovery and merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from all sources with proper priority
    ///
    /// Priority (highest to lowest):
    /// 1. Explicit config path (if provided)
    /// 2. `PLAYPEN_*` environment variables (`PLAYPEN_BACKEND__ENDPOINT=...`)
    /// 3. Project root: `./playpen.toml` or `./.playpen.toml`
    /// 4. Global: `$XDG_CONFIG_HOME/playpen/config.toml`
    /// 5. Default values
    pub fn load(config_path: Option<&Path>) -> Result<FileConfig, Box<figment::Error>> {
        Self::figment(config_path, Self::project_config_path(), Self::global_config_path())
            .extract()
            .map_err(Box::new)
    }

    fn figment(
        config_path: Option<&Path>,
        project_path: Option<PathBuf>,
        global_path: Option<PathBuf>,
    ) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(FileConfig::default()));

        if let Some(global_path) = global_path
            && global_path.exists()
        {
            figment = figment.merge(Toml::file(global_path));
        }

        if let Some(project_path) = project_path {
            figment = figment.merge(Toml::file(project_path));
        }

        figment = figment.merge(Env::prefixed("PLAYPEN_").split("__"));

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file_exact(path));
        }

        figment
    }

    /// Load only default configuration (for --no-config)
    pub fn load_defaults() -> FileConfig {
        FileConfig::default()
    }

    /// `$XDG_CONFIG_HOME/playpen/config.toml`, falling back to
    /// `~/.config/playpen/config.toml`
    pub fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("playpen").join("config.toml"))
    }

    /// Get the project-level config file path (if it exists)
    pub fn project_config_path() -> Option<PathBuf> {
        PROJECT_FILES
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }

    /// Describe the config file locations in priority order (for --show-config)
    pub fn config_sources(config_path: Option<&Path>) -> Vec<String> {
        let mut lines = vec!["Configuration sources (in priority order):".to_string()];

        if let Some(path) = config_path {
            lines.push(format!("  [FOUND] Explicit: {}", path.display()));
        }

        match Self::project_config_path() {
            Some(path) => lines.push(format!("  [FOUND] Project: {}", path.display())),
            None => lines.push("  [     ] Project: ./playpen.toml or ./.playpen.toml".to_string()),
        }

        if let Some(path) = Self::global_config_path() {
            let mark = if path.exists() { "FOUND" } else { "     " };
            lines.push(format!("  [{mark}] Global:  {}", path.display()));
        }

        lines.push("  [     ] Default: built-in defaults".to_string());
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FileOutputFormat;
    use std::fs;

    #[test]
    fn test_load_defaults() {
        let config = ConfigLoader::load_defaults();
        assert_eq!(config.backend.default_backend, "llama-server");
        assert!(!config.logging.log_messages);
    }

    #[test]
    fn test_global_config_path_returns_some() {
        let path = ConfigLoader::global_config_path().unwrap();
        assert!(path.ends_with("playpen/config.toml"));
    }

    #[test]
    fn test_later_sources_override_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        let explicit = dir.path().join("explicit.toml");
        fs::write(
            &global,
            "[backend]\nendpoint = \"http://global:1\"\ntimeout_secs = 5\n[output]\nformat = \"json\"\n",
        )
        .unwrap();
        fs::write(&project, "[backend]\nendpoint = \"http://project:2\"\n").unwrap();
        fs::write(&explicit, "[logging]\nlog_messages = true\n").unwrap();

        let config: FileConfig =
            ConfigLoader::figment(Some(explicit.as_path()), Some(project), Some(global))
                .extract()
                .unwrap();

        assert_eq!(config.backend.endpoint, "http://project:2");
        assert_eq!(config.backend.timeout_secs, 5);
        assert_eq!(config.output.format, Some(FileOutputFormat::Json));
        assert!(config.logging.log_messages);
        assert_eq!(config.generation.spec, "temperature=0.0,max_new_tokens=100");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let result = ConfigLoader::figment(Some(missing.as_path()), None, None).extract::<FileConfig>();
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[backend]\ntimeout_secs = \"soon\"\n").unwrap();
        let result = ConfigLoader::figment(Some(bad.as_path()), None, None).extract::<FileConfig>();
        assert!(result.is_err());
    }
}
