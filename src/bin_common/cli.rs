//! Config path resolution for binaries

use std::path::PathBuf;

/// Which configuration file to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Bot configuration (configs/config.yml)
    Hermit,
    /// Explicit path
    Custom(String),
}

impl ConfigType {
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Hermit => "configs/config.yml",
            ConfigType::Custom(path) => path,
        }
    }

    pub fn env_var_name(&self) -> &str {
        "HERMIT_CONFIG_PATH"
    }
}

/// Load configuration path from environment or use default
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// First CLI argument wins over the environment
pub fn resolve_config_path(args: &[String], config_type: ConfigType) -> PathBuf {
    match args.first() {
        Some(path) => PathBuf::from(path),
        None => load_config_from_env(config_type),
    }
}

/// Command line arguments, program name excluded
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_type_paths() {
        assert_eq!(ConfigType::Hermit.default_path(), "configs/config.yml");

        let custom = ConfigType::Custom("custom/path.yml".to_string());
        assert_eq!(custom.default_path(), "custom/path.yml");
    }

    #[test]
    fn test_cli_argument_wins() {
        let args = vec!["other.yml".to_string()];
        assert_eq!(
            resolve_config_path(&args, ConfigType::Hermit),
            PathBuf::from("other.yml")
        );
    }
}
