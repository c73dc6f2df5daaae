//! HTML序列化
//!
//! 文档级序列化沿用 html5ever 自带的序列化器；片段级提供 innerHTML / outerHTML
//! 以及与 html5ever 输出逐字节一致的转义和起始标签写出，供遮罩编解码使用。

use std::io;

use encoding_rs::Encoding;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// 序列化文档
///
/// `document_encoding` 非空且可识别时按该编码重新编码输出。
pub fn serialize_document(dom: &RcDom, document_encoding: &str) -> io::Result<Vec<u8>> {
    let mut buf: Vec<u8> = Vec::new();

    let serializable: SerializableHandle = dom.document.clone().into();
    serialize(&mut buf, &serializable, SerializeOpts::default())?;

    if !document_encoding.is_empty() {
        if let Some(encoding) = Encoding::for_label(document_encoding.as_bytes()) {
            if encoding != encoding_rs::UTF_8 {
                let s: &str = &String::from_utf8_lossy(&buf);
                let (data, _, _) = encoding.encode(s);
                buf = data.into_owned();
            }
        }
    }

    Ok(buf)
}

fn serialize_node(node: &Handle, traversal_scope: TraversalScope) -> String {
    let mut buf: Vec<u8> = Vec::new();
    let serializable: SerializableHandle = node.clone().into();
    let opts = SerializeOpts {
        traversal_scope,
        ..Default::default()
    };

    if serialize(&mut buf, &serializable, opts).is_err() {
        tracing::warn!("节点序列化失败");
    }

    String::from_utf8_lossy(&buf).into_owned()
}

/// 元素内部 HTML
pub fn inner_html(node: &Handle) -> String {
    serialize_node(node, TraversalScope::ChildrenOnly(None))
}

/// 元素自身及内部 HTML
///
/// `<template>` 只输出空标签，其内容不在子节点中。
pub fn outer_html(node: &Handle) -> String {
    serialize_node(node, TraversalScope::IncludeNode)
}

/// 按 HTML 文本规则转义
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// 按 HTML 属性值规则转义
pub fn escape_attr_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// 写出元素的起始标签，例如 `<a href="/x" class="y">`
pub fn start_tag(node: &Handle) -> Option<String> {
    let NodeData::Element { name, attrs, .. } = &node.data else {
        return None;
    };

    let mut tag = String::from("<");
    tag.push_str(&name.local);
    for attr in attrs.borrow().iter() {
        tag.push(' ');
        if let Some(prefix) = &attr.name.prefix {
            tag.push_str(prefix);
            tag.push(':');
        }
        tag.push_str(&attr.name.local);
        tag.push_str("=\"");
        tag.push_str(&escape_attr_value(&attr.value));
        tag.push('"');
    }
    tag.push('>');

    Some(tag)
}

/// 写出元素的结束标签
pub fn end_tag(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(format!("</{}>", name.local)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::dom::{find_nodes, html_to_dom};

    #[test]
    fn test_inner_and_outer_html() {
        let dom = html_to_dom(b"<p class=\"a\">x <b>y</b></p>", "utf-8").unwrap();
        let p = find_nodes(&dom.document, vec!["p"]).pop().unwrap();

        assert_eq!(inner_html(&p), "x <b>y</b>");
        assert_eq!(outer_html(&p), "<p class=\"a\">x <b>y</b></p>");
    }

    #[test]
    fn test_start_tag_matches_serializer() {
        let dom = html_to_dom(
            b"<p><a href=\"/q?a=1&amp;b=&quot;2&quot;\" title=\"t\">link</a></p>",
            "utf-8",
        )
        .unwrap();
        let a = find_nodes(&dom.document, vec!["a"]).pop().unwrap();

        let start = start_tag(&a).unwrap();
        let end = end_tag(&a).unwrap();
        assert_eq!(format!("{}link{}", start, end), outer_html(&a));
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a < b & c > d\u{a0}"), "a &lt; b &amp; c &gt; d&nbsp;");
        assert_eq!(escape_attr_value("say \"hi\" & <bye>"), "say &quot;hi&quot; &amp; <bye>");
    }

    #[test]
    fn test_serialize_document_reencodes() {
        let dom = html_to_dom("<p>café</p>".as_bytes(), "utf-8").unwrap();
        let utf8 = serialize_document(&dom, "utf-8").unwrap();
        assert!(String::from_utf8(utf8).unwrap().contains("café"));

        let latin = serialize_document(&dom, "windows-1252").unwrap();
        assert!(latin.contains(&0xE9));
    }
}
