use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use super::{
    ConfigContentProvider, ConfigSerializer, FileContentConfigProvider, Validate,
    YamlConfigSerializer,
};

/// Loads a config once, validates it, and caches the result.
pub struct ConfigManager<TConfigContentProvider, TConfig, TConfigSerializer = YamlConfigSerializer>
where
    TConfigContentProvider: ConfigContentProvider,
    TConfig: Clone + for<'de> Deserialize<'de> + Serialize + Validate + Default,
    TConfigSerializer: ConfigSerializer<TConfig>,
{
    config_serializer: TConfigSerializer,
    config_content_provider: TConfigContentProvider,
    config: Mutex<Option<TConfig>>,
}

impl<TConfig> ConfigManager<FileContentConfigProvider, TConfig, YamlConfigSerializer>
where
    TConfig: Clone + for<'de> Deserialize<'de> + Serialize + Validate + Default,
{
    pub fn from_yaml_file(file_path: &str) -> Self {
        Self::new(
            FileContentConfigProvider::new(file_path.to_string()),
            YamlConfigSerializer,
        )
    }
}

impl<TConfigContentProvider, TConfig, TConfigSerializer>
    ConfigManager<TConfigContentProvider, TConfig, TConfigSerializer>
where
    TConfigContentProvider: ConfigContentProvider,
    TConfig: Clone + for<'de> Deserialize<'de> + Serialize + Validate + Default,
    TConfigSerializer: ConfigSerializer<TConfig>,
{
    pub fn new(config_content_provider: TConfigContentProvider, config_serializer: TConfigSerializer) -> Self {
        Self {
            config_serializer,
            config_content_provider,
            config: Mutex::new(None),
        }
    }

    pub fn get_config(&self) -> Result<TConfig, String> {
        let mut current = self
            .config
            .lock()
            .map_err(|e| format!("Config cache poisoned: {}", e))?;

        if let Some(config) = current.as_ref() {
            return Ok(config.clone());
        }

        let config = match self.config_content_provider.get_config_content()? {
            Some(content) => self.config_serializer.deserialize(&content)?,
            None => TConfig::default(),
        };

        config
            .validate()
            .map_err(|e| format!("Config validation error: {}", e))?;

        *current = Some(config.clone());
        Ok(config)
    }

    pub fn to_yaml(&self, config: &TConfig) -> Result<String, String> {
        self.config_serializer.serialize(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_content_provider::StaticContentProvider;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct SampleConfig {
        size: usize,
    }

    impl Validate for SampleConfig {
        fn validate(&self) -> Result<(), String> {
            if self.size > 25 {
                return Err(format!("size {} too large", self.size));
            }
            Ok(())
        }
    }

    #[test]
    fn test_missing_content_yields_default() {
        let manager: ConfigManager<_, SampleConfig> =
            ConfigManager::new(StaticContentProvider(None), YamlConfigSerializer);
        assert_eq!(manager.get_config().unwrap(), SampleConfig::default());
    }

    #[test]
    fn test_yaml_content_is_parsed() {
        let manager: ConfigManager<_, SampleConfig> = ConfigManager::new(
            StaticContentProvider(Some("size: 13\n".to_string())),
            YamlConfigSerializer,
        );
        assert_eq!(manager.get_config().unwrap().size, 13);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let manager: ConfigManager<_, SampleConfig> = ConfigManager::new(
            StaticContentProvider(Some("size: 40\n".to_string())),
            YamlConfigSerializer,
        );
        let err = manager.get_config().unwrap_err();
        assert!(err.contains("too large"));
    }

    #[test]
    fn test_missing_file_yields_default() {
        let manager: ConfigManager<_, SampleConfig> =
            ConfigManager::from_yaml_file("/nonexistent/dir/go_server.yaml");
        assert_eq!(manager.get_config().unwrap(), SampleConfig::default());
    }
}
