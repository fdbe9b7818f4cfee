//! Integration tests for config

#[cfg(test)]
mod tests {
    use hangar_config::*;
    use hangar_errors::{ConfigError, Error};
    use hangar_types::OutputFormat;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
default_output = "json"

[paths]
install_root = "/srv/hangar"

[install]
default_category = "Scenery"
max_concurrent_installs = 4

[network]
timeout = 30
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.general.default_output, OutputFormat::Json);
        assert_eq!(config.install_root(), PathBuf::from("/srv/hangar"));
        assert_eq!(config.install.default_category, "Scenery");
        assert_eq!(config.install.max_concurrent_installs, 4);
        assert_eq!(config.network.timeout, 30);
        assert!(config.network.user_agent.starts_with("hangar/"));
        assert_eq!(config.category_dir(), PathBuf::from("/srv/hangar/Scenery"));
    }

    #[tokio::test]
    async fn test_empty_file_uses_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        assert_eq!(config.install.default_category, "Aircraft");
        assert_eq!(config.install.max_concurrent_installs, 2);
        assert_eq!(config.network.timeout, 300);
        config.validate().unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_or_default(Some(&dir.path().join("nope.toml")))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "[install\nmax = ").unwrap();
        let err = Config::load_from_file(temp_file.path()).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_merge_vars() {
        let vars: HashMap<&str, &str> = [
            ("HANGAR_INSTALL_ROOT", "/data/hangar"),
            ("HANGAR_MAX_CONCURRENT_INSTALLS", "5"),
            ("HANGAR_NETWORK_TIMEOUT", "12"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .merge_vars(|key| vars.get(key).map(ToString::to_string))
            .unwrap();
        assert_eq!(config.install_root(), PathBuf::from("/data/hangar"));
        assert_eq!(config.install.max_concurrent_installs, 5);
        assert_eq!(config.network_timeout(), std::time::Duration::from_secs(12));
    }

    #[test]
    fn test_merge_vars_rejects_garbage() {
        let mut config = Config::default();
        let err = config
            .merge_vars(|key| (key == "HANGAR_MAX_CONCURRENT_INSTALLS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue { ref field, .. })
                if field == "HANGAR_MAX_CONCURRENT_INSTALLS"
        ));
    }

    #[test]
    fn test_validate() {
        let mut config = Config::default();
        config.install.max_concurrent_installs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.install.default_category = "  ".into();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.install.default_category = "../etc".into();
        assert!(config.validate().is_err());
    }
}
