use crate::config::schema::DaemonConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use validator::Validate;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates a config file; the format follows the extension
    /// (json, yaml/yml, toml).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<DaemonConfig> {
        let path = path.as_ref();
        let config = Self::load_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<DaemonConfig> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let config: DaemonConfig = serde_json::from_str(&content)?;
                Ok(config)
            }
            Some("yaml") | Some("yml") => {
                let config: DaemonConfig = serde_yaml::from_str(&content)?;
                Ok(config)
            }
            Some("toml") => {
                let config: DaemonConfig = toml::from_str(&content)?;
                Ok(config)
            }
            _ => Err(Error::Config(format!(
                "Unsupported file extension: {}",
                path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(suffix)
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_toml_with_defaults() {
        let file = write_config(".toml", "pool_size = 8\n");
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.pool_size, 8);
        assert_eq!(config.queue_capacity, 64);
        assert_eq!(config.batch.top_n, 5);
        assert_eq!(config.batch.order, "count");
    }

    #[test]
    fn loads_yaml_batch_block() {
        let file = write_config(
            ".yaml",
            "batch:\n  interval_secs: 5\n  top_n: 2\n  order: recency\n",
        );
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.batch.interval_secs, 5);
        assert_eq!(config.batch.top_n, 2);
        assert_eq!(config.batch.order, "recency");
    }

    #[test]
    fn loads_json() {
        let file = write_config(".json", r#"{"listen_addr": "0.0.0.0:9000"}"#);
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.listen_addr, "0.0.0.0:9000");
    }

    #[test]
    fn rejects_zero_pool_size() {
        let file = write_config(".toml", "pool_size = 0\n");
        assert!(matches!(
            ConfigLoader::load(file.path()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rejects_unknown_batch_order() {
        let file = write_config(".toml", "[batch]\norder = \"latest\"\n");
        assert!(matches!(
            ConfigLoader::load(file.path()),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = write_config(".ini", "pool_size = 1\n");
        assert!(matches!(
            ConfigLoader::load(file.path()),
            Err(Error::Config(_))
        ));
    }
}
