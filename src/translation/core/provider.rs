//! 补全能力
//!
//! 翻译流程只依赖一个不透明的 `complete(prompt) -> text` 能力，
//! 这里定义该能力的 trait 和面向 LM Studio `/api/v0/completions` 接口的 HTTP 实现。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::translation::config::TranslationConfig;
use crate::translation::error::{helpers, TranslationError, TranslationResult};

/// 单次补全请求的采样参数
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub stop: Vec<String>,
}

/// 文本补全能力
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// 提供者名称，用于日志
    fn id(&self) -> &str;

    /// 对提示词做一次补全，返回修剪后的文本
    ///
    /// 网络失败或非成功状态码都返回 [`TranslationError::Transport`]。
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> TranslationResult<String>;
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    max_tokens: u32,
    stop: &'a [String],
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    #[serde(default)]
    text: String,
}

/// LM Studio 补全接口
pub struct LmStudioProvider {
    api_url: Url,
    client: reqwest::Client,
}

impl LmStudioProvider {
    /// 按配置创建，使用配置中的地址和请求超时
    pub fn new(config: &TranslationConfig) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| helpers::config_error(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            api_url: config.completions_url()?,
            client,
        })
    }

    /// 使用指定的完整接口地址
    pub fn with_url(api_url: Url) -> Self {
        Self {
            api_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn api_url(&self) -> &Url {
        &self.api_url
    }
}

#[async_trait]
impl CompletionProvider for LmStudioProvider {
    fn id(&self) -> &str {
        "lmstudio"
    }

    async fn complete(&self, prompt: &str, params: &CompletionParams) -> TranslationResult<String> {
        let request = ApiRequest {
            model: &params.model,
            prompt,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stop: &params.stop,
        };

        tracing::debug!(
            "发送补全请求: {} (提示词 {} 字符, max_tokens {})",
            self.api_url,
            prompt.chars().count(),
            params.max_tokens
        );

        let response = self
            .client
            .post(self.api_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| helpers::transport_error(format!("请求失败: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(helpers::transport_error(format!(
                "HTTP {}: {}",
                status,
                body.trim()
            )));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| helpers::transport_error(format!("响应解析失败: {}", e)))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.text.trim().to_string())
            .ok_or_else(|| helpers::transport_error("响应中没有 choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

    fn params() -> CompletionParams {
        CompletionParams {
            model: "translategemma-4b-it".to_string(),
            temperature: 0.1,
            max_tokens: 2048,
            stop: vec!["<end_of_turn>".to_string()],
        }
    }

    fn provider_for(server: &MockServer) -> LmStudioProvider {
        let mut config = TranslationConfig::default();
        config.endpoint = server.uri();
        LmStudioProvider::new(&config).unwrap()
    }

    #[test]
    fn test_url_from_config() {
        let provider = LmStudioProvider::new(&TranslationConfig::default()).unwrap();
        assert_eq!(
            provider.api_url().as_str(),
            "http://localhost:1234/api/v0/completions"
        );
        assert_eq!(provider.id(), "lmstudio");
    }

    #[tokio::test]
    async fn test_complete_success() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .and(matchers::path("/api/v0/completions"))
            .and(matchers::body_partial_json(serde_json::json!({
                "model": "translategemma-4b-it",
                "prompt": "hello",
                "max_tokens": 2048,
                "stop": ["<end_of_turn>"]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "index": 0, "text": "  안녕하세요 \n" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = provider_for(&server).complete("hello", &params()).await.unwrap();
        assert_eq!(text, "안녕하세요");
    }

    #[tokio::test]
    async fn test_complete_http_error() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        match provider_for(&server).complete("hello", &params()).await {
            Err(TranslationError::Transport(msg)) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("model not loaded"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_complete_without_choices() {
        let server = MockServer::start().await;

        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "choices": [] })))
            .mount(&server)
            .await;

        let result = provider_for(&server).complete("hello", &params()).await;
        assert!(matches!(result, Err(TranslationError::Transport(_))));
    }

    #[tokio::test]
    async fn test_connection_refused() {
        let provider = LmStudioProvider::with_url(Url::parse("http://127.0.0.1:9/api/v0/completions").unwrap());
        let result = provider.complete("hello", &params()).await;
        assert!(matches!(result, Err(TranslationError::Transport(_))));
    }
}
