//! 译文校验器
//!
//! 两个启发式检查：
//! - 合理性：去掉占位符后只看字母，目标文字所占比例不低于阈值，
//!   或者非目标文字的字母全部是 ASCII；
//! - 未改变：源文本足够长且译文与源文本几乎逐字相同。
//!
//! 校验器不理解语义，只能发现“明显没翻”或“翻成了别的文字”的输出。

use std::sync::OnceLock;

use regex::Regex;

use crate::translation::config::{constants, TranslationConfig};
use crate::translation::error::{TranslationError, TranslationResult};

static PLACEHOLDER_PATTERN: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_PATTERN
        .get_or_init(|| Regex::new(r"</?t\d+/?>").expect("占位符正则表达式无效"))
}

/// 去掉文本中的占位符
pub fn strip_placeholders(text: &str) -> String {
    placeholder_regex().replace_all(text, "").into_owned()
}

/// 目标语言使用的文字
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetScript {
    Hangul,
    Japanese,
    Han,
    Cyrillic,
    Greek,
    Arabic,
    Hebrew,
    Thai,
    Devanagari,
    Latin,
}

impl TargetScript {
    /// 由语言代码推断文字，未知语言按拉丁文字处理
    pub fn for_language(lang: &str) -> Self {
        let primary = lang
            .split(['-', '_'])
            .next()
            .unwrap_or(lang)
            .to_ascii_lowercase();

        match primary.as_str() {
            "ko" => TargetScript::Hangul,
            "ja" => TargetScript::Japanese,
            "zh" => TargetScript::Han,
            "ru" | "uk" | "be" | "bg" | "sr" | "mk" | "kk" => TargetScript::Cyrillic,
            "el" => TargetScript::Greek,
            "ar" | "fa" | "ur" => TargetScript::Arabic,
            "he" | "yi" => TargetScript::Hebrew,
            "th" => TargetScript::Thai,
            "hi" | "mr" | "ne" => TargetScript::Devanagari,
            _ => TargetScript::Latin,
        }
    }

    /// 字符是否属于该文字
    pub fn contains(&self, c: char) -> bool {
        match self {
            TargetScript::Hangul => matches!(c,
                '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}'),
            TargetScript::Japanese => {
                matches!(c, '\u{3040}'..='\u{309F}' | '\u{30A0}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}')
                    || is_han(c)
            }
            TargetScript::Han => is_han(c),
            TargetScript::Cyrillic => matches!(c, '\u{0400}'..='\u{04FF}' | '\u{0500}'..='\u{052F}'),
            TargetScript::Greek => matches!(c, '\u{0370}'..='\u{03FF}' | '\u{1F00}'..='\u{1FFF}'),
            TargetScript::Arabic => matches!(c, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}'),
            TargetScript::Hebrew => matches!(c, '\u{0590}'..='\u{05FF}'),
            TargetScript::Thai => matches!(c, '\u{0E00}'..='\u{0E7F}'),
            TargetScript::Devanagari => matches!(c, '\u{0900}'..='\u{097F}'),
            TargetScript::Latin => {
                c.is_ascii_alphabetic() || matches!(c, '\u{00C0}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}')
            }
        }
    }
}

fn is_han(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}')
}

/// 校验器配置
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorConfig {
    pub target: TargetScript,
    pub min_target_ratio: f32,
    pub unchanged_min_len: usize,
    pub unchanged_similarity: f32,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            target: TargetScript::for_language(constants::DEFAULT_TARGET_LANG),
            min_target_ratio: constants::DEFAULT_MIN_TARGET_RATIO,
            unchanged_min_len: constants::DEFAULT_UNCHANGED_MIN_LEN,
            unchanged_similarity: constants::DEFAULT_UNCHANGED_SIMILARITY,
        }
    }
}

impl From<&TranslationConfig> for ValidatorConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            target: TargetScript::for_language(&config.target_lang),
            min_target_ratio: config.min_target_ratio,
            unchanged_min_len: config.unchanged_min_len,
            unchanged_similarity: config.unchanged_similarity,
        }
    }
}

/// 译文校验器
#[derive(Debug, Clone, Default)]
pub struct OutputValidator {
    config: ValidatorConfig,
}

impl OutputValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// 译文是否像目标语言
    ///
    /// 只统计字母；没有字母（纯数字、标点、占位符）时视为合理。
    pub fn is_plausible_translation(&self, text: &str) -> bool {
        let stripped = strip_placeholders(text);
        let letters: Vec<char> = stripped.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.is_empty() {
            return true;
        }

        let target = self.config.target;
        let target_count = letters.iter().filter(|&&c| target.contains(c)).count();
        let ratio = target_count as f32 / letters.len() as f32;
        if ratio >= self.config.min_target_ratio {
            return true;
        }

        letters
            .iter()
            .filter(|&&c| !target.contains(c))
            .all(|c| c.is_ascii())
    }

    /// 译文是否与源文本基本相同
    pub fn is_unchanged(&self, source: &str, translated: &str) -> bool {
        let source = normalize(source);
        let translated = normalize(translated);

        let source_len = source.chars().count();
        if source_len < self.config.unchanged_min_len {
            return false;
        }
        if source == translated {
            return true;
        }

        let translated_len = translated.chars().count();
        let longer = source_len.max(translated_len);
        let matching = source
            .chars()
            .zip(translated.chars())
            .filter(|(a, b)| a == b)
            .count();

        matching as f32 / longer as f32 > self.config.unchanged_similarity
    }

    /// 综合校验，失败时返回 [`TranslationError::ValidationFailure`]
    pub fn validate(&self, source: &str, translated: &str) -> TranslationResult<()> {
        if translated.trim().is_empty() {
            return Err(TranslationError::ValidationFailure("译文为空".to_string()));
        }
        if !self.is_plausible_translation(translated) {
            return Err(TranslationError::ValidationFailure(format!(
                "译文不像目标语言: {}",
                preview(translated)
            )));
        }
        if self.is_unchanged(source, translated) {
            return Err(TranslationError::ValidationFailure(format!(
                "译文与原文相同: {}",
                preview(translated)
            )));
        }
        Ok(())
    }
}

fn normalize(text: &str) -> String {
    strip_placeholders(text).trim().to_lowercase()
}

fn preview(text: &str) -> String {
    let mut short: String = text.chars().take(40).collect();
    if text.chars().count() > 40 {
        short.push('…');
    }
    short
}
