//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::constants;
use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 翻译配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TranslationConfig {
    // 补全接口
    pub endpoint: String,
    pub completions_path: String,
    pub model: String,
    pub temperature: f32,
    pub single_max_tokens: u32,
    pub batch_max_tokens: u32,
    pub single_stop: Vec<String>,
    pub batch_stop: Vec<String>,
    pub request_timeout_secs: u64,

    // 语言
    pub source_lang: String,
    pub target_lang: String,

    // 分块
    pub chunk_max_chars: usize,
    pub chunk_max_items: usize,

    // 译文校验
    pub enforce_validation: bool,
    pub min_target_ratio: f32,
    pub unchanged_min_len: usize,
    pub unchanged_similarity: f32,

    // 重试
    pub batch_retry_budget: usize,
    pub single_retry_budget: usize,
    pub retry_delay_ms: u64,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            endpoint: constants::DEFAULT_ENDPOINT.to_string(),
            completions_path: constants::DEFAULT_COMPLETIONS_PATH.to_string(),
            model: constants::DEFAULT_MODEL.to_string(),
            temperature: constants::DEFAULT_TEMPERATURE,
            single_max_tokens: constants::DEFAULT_SINGLE_MAX_TOKENS,
            batch_max_tokens: constants::DEFAULT_BATCH_MAX_TOKENS,
            single_stop: to_strings(constants::SINGLE_STOP_SEQUENCES),
            batch_stop: to_strings(constants::BATCH_STOP_SEQUENCES),
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT_SECS,

            source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: constants::DEFAULT_TARGET_LANG.to_string(),

            chunk_max_chars: constants::DEFAULT_CHUNK_MAX_CHARS,
            chunk_max_items: constants::DEFAULT_CHUNK_MAX_ITEMS,

            enforce_validation: true,
            min_target_ratio: constants::DEFAULT_MIN_TARGET_RATIO,
            unchanged_min_len: constants::DEFAULT_UNCHANGED_MIN_LEN,
            unchanged_similarity: constants::DEFAULT_UNCHANGED_SIMILARITY,

            batch_retry_budget: constants::DEFAULT_BATCH_RETRY_BUDGET,
            single_retry_budget: constants::DEFAULT_SINGLE_RETRY_BUDGET,
            retry_delay_ms: constants::DEFAULT_RETRY_DELAY_MS,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl TranslationConfig {
    /// 创建带指定语言的默认配置
    pub fn default_with_lang(target_lang: &str, endpoint: Option<&str>) -> Self {
        let mut config = Self::default();
        config.target_lang = target_lang.to_string();
        if let Some(url) = endpoint {
            config.endpoint = url.trim_end_matches('/').to_string();
        }
        config
    }

    /// 验证配置
    pub fn validate(&self) -> TranslationResult<()> {
        self.completions_url()?;

        if self.model.trim().is_empty() {
            return Err(TranslationError::ConfigError("模型名称不能为空".to_string()));
        }

        if self.chunk_max_chars == 0 || self.chunk_max_items == 0 {
            return Err(TranslationError::ConfigError("分块上限必须大于0".to_string()));
        }

        if !(0.0..=1.0).contains(&self.min_target_ratio) {
            return Err(TranslationError::ConfigError(
                "目标文字比例阈值必须在0到1之间".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.unchanged_similarity) {
            return Err(TranslationError::ConfigError(
                "相似度阈值必须在0到1之间".to_string(),
            ));
        }

        if self.temperature < 0.0 {
            return Err(TranslationError::ConfigError("temperature 不能为负数".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslationError::ConfigError("请求超时必须大于0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    ///
    /// 只有显式设置的变量才会覆盖；无效值记录警告后忽略。
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{translation, EnvResult, EnvVar};

        fn apply<T>(result: Option<EnvResult<T>>, target: &mut T) {
            match result {
                Some(Ok(value)) => *target = value,
                Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
                None => {}
            }
        }

        apply(translation::Endpoint::get_if_set(), &mut self.endpoint);
        apply(translation::Model::get_if_set(), &mut self.model);
        apply(translation::TargetLang::get_if_set(), &mut self.target_lang);
        apply(translation::SourceLang::get_if_set(), &mut self.source_lang);
        apply(translation::ChunkMaxChars::get_if_set(), &mut self.chunk_max_chars);
        apply(translation::ChunkMaxItems::get_if_set(), &mut self.chunk_max_items);
        apply(
            translation::EnforceValidation::get_if_set(),
            &mut self.enforce_validation,
        );

        match translation::RequestTimeout::get_if_set() {
            Some(Ok(timeout)) => self.request_timeout_secs = timeout.as_secs(),
            Some(Err(e)) => tracing::warn!("忽略无效的环境变量: {}", e),
            None => {}
        }
    }

    /// 补全接口完整地址
    pub fn completions_url(&self) -> TranslationResult<Url> {
        let base = Url::parse(&self.endpoint).map_err(|e| {
            TranslationError::ConfigError(format!("无效的接口地址 {}: {}", self.endpoint, e))
        })?;
        base.join(&self.completions_path).map_err(|e| {
            TranslationError::ConfigError(format!(
                "无效的接口路径 {}: {}",
                self.completions_path, e
            ))
        })
    }

    /// 请求超时
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 重试基础延迟
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 提示词中使用的目标语言名称
    pub fn target_language_name(&self) -> String {
        match self.target_lang.as_str() {
            "ko" => "Korean (한국어)".to_string(),
            "ja" => "Japanese (日本語)".to_string(),
            "zh" => "Chinese (中文)".to_string(),
            other => other.to_string(),
        }
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: TranslationConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器
    ///
    /// 加载顺序：`.env` 文件、配置文件（按搜索路径）、环境变量覆盖，最后验证。
    pub fn new() -> TranslationResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定配置文件创建
    pub fn from_path(path: &str) -> TranslationResult<Self> {
        Self::load_dotenv();
        let expanded_path = shellexpand::tilde(path);
        let mut config = Self::load_from_file(&expanded_path)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 使用现成的配置创建
    pub fn with_config(config: TranslationConfig) -> TranslationResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// 取出配置
    pub fn into_config(self) -> TranslationConfig {
        self.config
    }

    /// 从文件加载配置
    fn load_config() -> TranslationResult<TranslationConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::debug!("未找到配置文件，使用默认配置");
        Ok(TranslationConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslationResult<TranslationConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| helpers::config_error(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".toml") {
            toml::from_str(&content)
                .map_err(|e| helpers::config_error(format!("解析TOML配置失败: {}", e)))
        } else {
            serde_json::from_str(&content)
                .map_err(|e| helpers::config_error(format!("解析JSON配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::debug!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslationResult<()> {
        let config = TranslationConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslationError::ConfigError(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslationError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TranslationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_max_chars, 800);
        assert_eq!(config.chunk_max_items, 3);
        assert_eq!(
            config.completions_url().unwrap().as_str(),
            "http://localhost:1234/api/v0/completions"
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = TranslationConfig::default();
        config.chunk_max_items = 0;
        assert!(matches!(
            config.validate(),
            Err(TranslationError::ConfigError(_))
        ));

        let mut config = TranslationConfig::default();
        config.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = TranslationConfig::default();
        config.min_target_ratio = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: TranslationConfig =
            toml::from_str("model = \"other-model\"\nchunk_max_items = 5\n").unwrap();
        assert_eq!(config.model, "other-model");
        assert_eq!(config.chunk_max_items, 5);
        assert_eq!(config.chunk_max_chars, 800);
        assert_eq!(config.target_lang, "ko");
    }

    #[test]
    fn test_generate_and_load_example_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pagelingo.toml");
        let path = path.to_str().unwrap();

        ConfigManager::generate_example_config(path).unwrap();
        let loaded = ConfigManager::load_from_file(path).unwrap();
        assert_eq!(loaded, TranslationConfig::default());
    }

    #[test]
    fn test_target_language_name() {
        let config = TranslationConfig::default();
        assert_eq!(config.target_language_name(), "Korean (한국어)");
        let config = TranslationConfig::default_with_lang("fr", Some("http://h:1/"));
        assert_eq!(config.target_language_name(), "fr");
        assert_eq!(config.endpoint, "http://h:1");
    }
}
