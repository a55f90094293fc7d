use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Database file used when neither the CLI nor the config names one
pub const DEFAULT_DATABASE: &str = "renewable.db";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RenewableConfig {
    pub database: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("renewable.toml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<RenewableConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: RenewableConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Pick the database path: explicit flag, then config, then the default
pub fn resolve_database(flag: Option<PathBuf>, config: Option<&RenewableConfig>) -> PathBuf {
    flag.or_else(|| config.and_then(|c| c.database.as_ref()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_config(Some(&dir.path().join("absent.toml"))).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renewable.toml");
        std::fs::write(&path, "database = \"data/registry.db\"\n").unwrap();

        let config = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(config.database.as_deref(), Some("data/registry.db"));
    }

    #[test]
    fn test_invalid_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("renewable.toml");
        std::fs::write(&path, "database = [").unwrap();
        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_resolve_database_precedence() {
        let config = RenewableConfig { database: Some("from-config.db".to_string()) };
        assert_eq!(
            resolve_database(Some(PathBuf::from("flag.db")), Some(&config)),
            PathBuf::from("flag.db")
        );
        assert_eq!(resolve_database(None, Some(&config)), PathBuf::from("from-config.db"));
        assert_eq!(resolve_database(None, None), PathBuf::from(DEFAULT_DATABASE));
    }
}
