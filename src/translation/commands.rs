//! 宿主命令
//!
//! 宿主以 JSON `{"action": ..., ...}` 发送命令，分派到编排器入口，
//! 响应为 `{"state", "count"}` 或 `{"message"}`。

use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};

use crate::translation::core::{PageTranslator, TranslationStatus};
use crate::translation::error::{TranslationError, TranslationResult};

/// 宿主命令
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum HostCommand {
    TranslatePage,
    TranslateSelection { text: String },
    ToggleTranslation,
    GetTranslationState,
}

impl HostCommand {
    /// 解析 JSON 命令
    pub fn from_json(raw: &str) -> TranslationResult<Self> {
        serde_json::from_str(raw)
            .map_err(|e| TranslationError::InvalidInput(format!("无法解析命令 {}: {}", raw.trim(), e)))
    }

    /// 是否需要页面文档
    pub fn needs_document(&self) -> bool {
        !matches!(self, HostCommand::TranslateSelection { .. })
    }

    /// 是否会修改页面文档
    pub fn mutates_document(&self) -> bool {
        matches!(self, HostCommand::TranslatePage | HostCommand::ToggleTranslation)
    }
}

/// 命令响应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostResponse {
    Status(TranslationStatus),
    Message { message: String },
}

impl HostResponse {
    pub fn message<T: Into<String>>(message: T) -> Self {
        HostResponse::Message {
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> TranslationResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// 执行一条宿主命令
///
/// # 参数
/// * `translator` - 编排器
/// * `root` - 页面根元素；`translateSelection` 不使用它，可传 `None`
/// * `command` - 要执行的命令
pub async fn dispatch(
    translator: &PageTranslator,
    root: Option<&Handle>,
    command: HostCommand,
) -> TranslationResult<HostResponse> {
    tracing::debug!("执行命令: {:?}", command);

    if let HostCommand::TranslateSelection { text } = &command {
        let translated = translator.translate_selection(text).await?;
        return Ok(HostResponse::message(translated));
    }

    let root = root.ok_or_else(|| {
        TranslationError::InvalidInput(format!("命令 {:?} 需要页面文档", command))
    })?;

    match command {
        HostCommand::TranslatePage => {
            let report = translator.translate_page(root).await?;
            Ok(HostResponse::message(report.summary()))
        }
        HostCommand::ToggleTranslation => Ok(HostResponse::Status(translator.toggle(root))),
        HostCommand::GetTranslationState => {
            Ok(HostResponse::Status(translator.translation_state(root)))
        }
        HostCommand::TranslateSelection { .. } => Err(TranslationError::InternalError(
            "选中文本命令应已处理".to_string(),
        )),
    }
}
