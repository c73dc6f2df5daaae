use std::fs;
use std::io::{self, Read};
use std::path::Path;

use encoding_rs::Encoding;
use markup5ever_rcdom::{Handle, RcDom};

use crate::parsers::html::{find_body, get_charset, html_to_dom, serialize_document};
use crate::translation::error::{TranslationError, TranslationResult};

/// 标准输入/输出的占位路径
pub const STDIO_PATH: &str = "-";

/// 已解析的页面文档
///
/// 持有 DOM 以及读入时确定的字符集，写出时按同一字符集重新编码。
pub struct PageDocument {
    pub dom: RcDom,
    pub encoding: String,
}

impl PageDocument {
    /// 从原始字节解析文档
    ///
    /// 先按 `input_encoding`（默认 UTF-8）解析，如果文档声明了有效的字符集，
    /// 再按声明的字符集重新解析一次。
    ///
    /// # 参数
    /// - `input_data`: 文档字节
    /// - `input_encoding`: 调用方指定的编码，优先级低于文档内声明
    pub fn from_bytes(input_data: &[u8], input_encoding: Option<&str>) -> TranslationResult<Self> {
        if let Some(label) = input_encoding {
            validate_encoding(label)?;
        }

        let mut document_encoding = input_encoding.unwrap_or("utf-8").to_string();
        let mut dom = html_to_dom(input_data, &document_encoding)?;

        if let Some(html_charset) = get_charset(&dom.document) {
            if !html_charset.is_empty() {
                if let Some(document_charset) =
                    Encoding::for_label_no_replacement(html_charset.as_bytes())
                {
                    if !document_charset.name().eq_ignore_ascii_case(&document_encoding) {
                        tracing::debug!("按文档声明的字符集重新解析: {}", html_charset);
                        dom = html_to_dom(input_data, document_charset.name())?;
                    }
                    document_encoding = html_charset;
                }
            }
        }

        Ok(Self {
            dom,
            encoding: document_encoding,
        })
    }

    /// 从 UTF-8 字符串解析文档
    pub fn parse(html: &str) -> TranslationResult<Self> {
        Self::from_bytes(html.as_bytes(), None)
    }

    /// 文档的 `<body>` 元素
    pub fn body(&self) -> TranslationResult<Handle> {
        find_body(&self.dom)
            .ok_or_else(|| TranslationError::ParseError("文档缺少 body 元素".to_string()))
    }

    /// 按文档字符集序列化
    pub fn to_bytes(&self) -> TranslationResult<Vec<u8>> {
        Ok(serialize_document(&self.dom, &self.encoding)?)
    }

    /// 序列化为 UTF-8 字符串
    pub fn to_html_string(&self) -> TranslationResult<String> {
        let buf = serialize_document(&self.dom, "utf-8")?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// 读取输入文档，`-` 表示标准输入
pub fn read_input(target: &str) -> io::Result<Vec<u8>> {
    if target == STDIO_PATH {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(Path::new(target))
    }
}

/// 检查编码标签是否可识别
pub fn validate_encoding(label: &str) -> TranslationResult<()> {
    if Encoding::for_label_no_replacement(label.as_bytes()).is_none() {
        return Err(TranslationError::InvalidInput(format!(
            "unknown encoding \"{}\"",
            label
        )));
    }
    Ok(())
}

/// 解析 Content-Type 值，返回 (媒体类型, 字符集)
pub fn parse_content_type(content_type: &str) -> (String, String) {
    let mut parts = content_type.split(';');
    let media_type = parts.next().unwrap_or_default().trim().to_lowercase();
    let mut charset = String::new();

    for part in parts {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("charset=") {
            charset = value.trim_matches('"').to_string();
        }
    }

    (media_type, charset)
}
