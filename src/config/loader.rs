use crate::config::config::AppConfig;
use crate::error::AppError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml, Yaml},
};

/// 环境变量前缀，嵌套字段用 `__` 分隔，例如 `MEDCONSULT_SERVER__PORT`
pub const ENV_PREFIX: &str = "MEDCONSULT_";

pub const TOML_CONFIG_FILE: &str = "config.toml";
pub const YAML_CONFIG_FILE: &str = "config.yaml";

/// 配置加载器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 从默认路径加载配置
    ///
    /// 优先级（后者覆盖前者）：
    /// 1. 内置默认值
    /// 2. ./config.toml
    /// 3. ./config.yaml
    /// 4. `MEDCONSULT_` 前缀环境变量
    /// 5. GEMINI_API_KEY / ELEVENLABS_API_KEY / ELEVENLABS_VOICE_ID
    pub fn load() -> Result<AppConfig, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(TOML_CONFIG_FILE))
            .merge(Yaml::file(YAML_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(provider_env())
    }

    /// 验证配置
    pub fn validate(config: &AppConfig) -> Result<(), ConfigValidationError> {
        if config.server.port == 0 {
            return Err(ConfigValidationError::InvalidPort);
        }

        if config.gemini.api_key.trim().is_empty() {
            return Err(ConfigValidationError::MissingGeminiApiKey);
        }

        if config.gemini.model.trim().is_empty() {
            return Err(ConfigValidationError::MissingModel);
        }

        Ok(())
    }
}

/// 上游服务惯用的裸环境变量
fn provider_env() -> Env {
    Env::raw()
        .only(&["GEMINI_API_KEY", "ELEVENLABS_API_KEY", "ELEVENLABS_VOICE_ID"])
        .map(|key| match key.as_str().to_ascii_uppercase().as_str() {
            "GEMINI_API_KEY" => "gemini.api_key".into(),
            "ELEVENLABS_API_KEY" => "speech.api_key".into(),
            _ => "speech.default_voice_id".into(),
        })
}

/// 配置验证错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigValidationError {
    #[error("服务端口无效，必须大于 0")]
    InvalidPort,

    #[error("Gemini API 密钥未配置（GEMINI_API_KEY）")]
    MissingGeminiApiKey,

    #[error("Gemini 模型名称未配置")]
    MissingModel,
}

impl From<ConfigValidationError> for AppError {
    fn from(e: ConfigValidationError) -> Self {
        match e {
            ConfigValidationError::InvalidPort => AppError::Config(e.to_string()),
            _ => AppError::ConfigurationMissing(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_files() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load()?;
            assert_eq!(config.server.port, 8000);
            assert_eq!(config.gemini.top_k, 40);
            assert_eq!(config.app_name, "medconsult");
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [server]
                port = 9000

                [gemini]
                model = "gemini-1.5-pro"
                temperature = 0.3

                [gemini.safety]
                harassment = "BLOCK_ONLY_HIGH"
                "#,
            )?;
            jail.set_env("MEDCONSULT_SERVER__PORT", "9100");
            jail.set_env("MEDCONSULT_INSIGHTS__STRICT_LENGTHS", "true");
            jail.set_env("GEMINI_API_KEY", "from-env");

            let config = ConfigLoader::load()?;
            assert_eq!(config.server.port, 9100);
            assert_eq!(config.gemini.model, "gemini-1.5-pro");
            assert_eq!(config.gemini.temperature, 0.3);
            assert_eq!(
                config.gemini.safety.harassment,
                crate::llm::HarmBlockThreshold::BlockOnlyHigh
            );
            assert_eq!(config.gemini.api_key, "from-env");
            assert!(config.insights.strict_lengths);
            Ok(())
        });
    }

    #[test]
    fn test_validate_requires_api_key() {
        let mut config = AppConfig::development();
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigValidationError::MissingGeminiApiKey));
        assert!(matches!(
            AppError::from(err),
            AppError::ConfigurationMissing(_)
        ));

        config.gemini.api_key = "key".into();
        assert!(ConfigLoader::validate(&config).is_ok());

        config.server.port = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigValidationError::InvalidPort)
        ));
    }
}
