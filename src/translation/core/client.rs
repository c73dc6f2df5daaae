//! 翻译客户端
//!
//! 负责提示词格式化、调用补全能力以及拆分批量响应。
//!
//! 单条模式和批量模式使用不同的提示词、`max_tokens` 与停止序列；
//! 批量模式用 ` ||| ` 连接各段，要求模型以 `|||` 分隔输出，再按 `|||` 拆分并修剪。

use std::sync::Arc;

use crate::translation::config::{constants, TranslationConfig};
use crate::translation::core::provider::{CompletionParams, CompletionProvider};
use crate::translation::error::{TranslationError, TranslationResult};

/// 翻译客户端
#[derive(Clone)]
pub struct TranslationClient {
    provider: Arc<dyn CompletionProvider>,
    source_lang: String,
    target_name: String,
    single_params: CompletionParams,
    batch_params: CompletionParams,
}

impl TranslationClient {
    /// 创建客户端
    ///
    /// # 参数
    /// * `provider` - 补全能力
    /// * `config` - 翻译配置，提供模型、语言和采样参数
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &TranslationConfig) -> Self {
        Self {
            provider,
            source_lang: config.source_lang.clone(),
            target_name: config.target_language_name(),
            single_params: CompletionParams {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.single_max_tokens,
                stop: config.single_stop.clone(),
            },
            batch_params: CompletionParams {
                model: config.model.clone(),
                temperature: config.temperature,
                max_tokens: config.batch_max_tokens,
                stop: config.batch_stop.clone(),
            },
        }
    }

    pub fn provider_id(&self) -> &str {
        self.provider.id()
    }

    /// 翻译单条文本
    pub async fn translate_one(&self, text: &str) -> TranslationResult<String> {
        let prompt = single_prompt(text, &self.target_name);
        self.provider.complete(&prompt, &self.single_params).await
    }

    /// 批量翻译
    ///
    /// # 返回值
    /// 与输入等长、顺序一致的译文；段数不一致时返回 [`TranslationError::BatchMismatch`]
    pub async fn translate_many(&self, texts: &[String]) -> TranslationResult<Vec<String>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let prompt = batch_prompt(texts, &self.source_lang, &self.target_name);
        let raw = self.provider.complete(&prompt, &self.batch_params).await?;
        split_batch_response(&raw, texts.len())
    }
}

/// 单条翻译提示词
pub fn single_prompt(text: &str, target_name: &str) -> String {
    format!(
        "<bos><start_of_turn>user\n\
         Translate the English text below into {target}.\n\
         CRITICAL RULES:\n\
         1. Preserve all tags like \"<t0>\", \"</t0>\", \"<t1>\" exactly where they belong in the translated sentence. \n\
         2. Do not modify or remove any tags.\n\
         3. Output ONLY the translated {target} text. No English, no explanations.\n\
         \n\
         Text:\n\
         {text}<end_of_turn>\n\
         <start_of_turn>model\n",
        target = target_name,
        text = text,
    )
}

/// 批量翻译提示词
pub fn batch_prompt(texts: &[String], source_lang: &str, target_name: &str) -> String {
    format!(
        "<bos><start_of_turn>user\n\
         Task: Translate these {count} sentences from {source} to {target}.\n\
         Strict Requirements:\n\
         1. Output ONLY the translated text.\n\
         2. Separate each translation strictly with \"{delimiter}\".\n\
         3. Preserve all data tags like \"<t0>\", \"</t0>\", \"<t1>\" in their relative positions. Do NOT remove tags.\n\
         4. No English, No other languages, No explanations.\n\
         \n\
         Sentences:\n\
         {joined}<end_of_turn>\n\
         <start_of_turn>model\n",
        count = texts.len(),
        source = source_lang,
        target = target_name,
        delimiter = constants::BATCH_DELIMITER.trim(),
        joined = texts.join(constants::BATCH_DELIMITER),
    )
}

/// 拆分批量响应，段数必须与提交的数量一致
pub fn split_batch_response(raw: &str, expected: usize) -> TranslationResult<Vec<String>> {
    let segments: Vec<String> = raw
        .split(constants::BATCH_DELIMITER.trim())
        .map(|segment| segment.trim().to_string())
        .collect();

    if segments.len() != expected {
        return Err(TranslationError::BatchMismatch {
            expected,
            received: segments.len(),
        });
    }

    Ok(segments)
}
