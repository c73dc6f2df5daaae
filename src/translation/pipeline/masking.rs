//! 结构遮罩编解码
//!
//! 把元素的混合内容（文本 + 行内标记）压平成带占位符的纯文本交给模型，
//! 再把模型返回的文本还原成 HTML。
//!
//! 占位符有三种形式：
//! - `<tN>` / `</tN>`：成对出现，替代行内元素的起始和结束标签，内部文本继续参与翻译；
//! - `<tN/>`：自闭合，替代整段保留的标记（注释、表单控件、媒体、未知元素等）。
//!
//! 编号来自整个递归过程共享的单调计数器，从 0 开始按文档前序分配。
//!
//! 整段保留的标记取自 rcdom 的序列化结果。rcdom 把 `<template>` 的内容放在
//! `template_contents` 而不是子节点里，序列化只得到 `<template></template>`，
//! 所以译文写回后模板内容会丢失。
//!
//! ```text
//! <p>Hello <b>world</b>!</p>   ->   "Hello <t0>world</t0>!"
//!                                   { <t0>: "<b>", </t0>: "</b>" }
//! ```

use markup5ever_rcdom::{Handle, NodeData};

use crate::parsers::html::{end_tag, escape_text, get_node_name, outer_html, start_tag, TagClass};

/// 占位符种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// `<tN>`
    Open,
    /// `</tN>`
    Close,
    /// `<tN/>`
    SelfClosing,
}

/// 占位符与其替代的原始标记
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub index: usize,
    pub kind: PlaceholderKind,
    pub markup: String,
}

impl Placeholder {
    /// 占位符文本，例如 `<t0>`、`</t0>`、`<t1/>`
    pub fn token(&self) -> String {
        match self.kind {
            PlaceholderKind::Open => format!("<t{}>", self.index),
            PlaceholderKind::Close => format!("</t{}>", self.index),
            PlaceholderKind::SelfClosing => format!("<t{}/>", self.index),
        }
    }

    /// 占位符经 HTML 文本转义后的形式
    fn escaped_token(&self) -> String {
        escape_text(&self.token())
    }
}

/// 占位符映射表
///
/// 每个占位符文本在表中只出现一次。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<Placeholder>,
    next_index: usize,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_index(&mut self) -> usize {
        let index = self.next_index;
        self.next_index += 1;
        index
    }

    fn push(&mut self, index: usize, kind: PlaceholderKind, markup: String) -> String {
        let placeholder = Placeholder {
            index,
            kind,
            markup,
        };
        let token = placeholder.token();
        self.entries.push(placeholder);
        token
    }

    /// 按占位符文本查找原始标记
    pub fn get(&self, token: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|p| p.token() == token)
            .map(|p| p.markup.as_str())
    }

    /// 已分配的编号数量（编号范围为 `0..index_count()`）
    pub fn index_count(&self) -> usize {
        self.next_index
    }

    /// 映射表条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placeholder> {
        self.entries.iter()
    }

    /// 检查占位符在译文中的出现情况，返回 (丢失的占位符, 重复的占位符)
    pub fn audit(&self, translated: &str) -> (Vec<String>, Vec<String>) {
        let mut missing = Vec::new();
        let mut duplicated = Vec::new();

        for placeholder in &self.entries {
            let token = placeholder.token();
            match translated.matches(token.as_str()).count() {
                0 => missing.push(token),
                1 => {}
                _ => duplicated.push(token),
            }
        }

        (missing, duplicated)
    }
}

/// 遮罩结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedFragment {
    pub text: String,
    pub placeholders: PlaceholderMap,
}

/// 遮罩元素的全部子节点
pub fn mask(element: &Handle) -> MaskedFragment {
    let mut placeholders = PlaceholderMap::new();
    let mut text = String::new();

    for child in element.children.borrow().iter() {
        mask_node(child, &mut text, &mut placeholders);
    }

    MaskedFragment { text, placeholders }
}

fn mask_node(node: &Handle, out: &mut String, placeholders: &mut PlaceholderMap) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Comment { contents } => {
            let index = placeholders.allocate_index();
            let markup = format!("<!--{}-->", contents);
            out.push_str(&placeholders.push(index, PlaceholderKind::SelfClosing, markup));
        }
        NodeData::Element { .. } => {
            let class = get_node_name(node).map(TagClass::of).unwrap_or(TagClass::Unknown);
            if class == TagClass::Inline {
                mask_inline(node, out, placeholders);
            } else {
                let index = placeholders.allocate_index();
                out.push_str(&placeholders.push(
                    index,
                    PlaceholderKind::SelfClosing,
                    outer_html(node),
                ));
            }
        }
        _ => {}
    }
}

fn mask_inline(node: &Handle, out: &mut String, placeholders: &mut PlaceholderMap) {
    let index = placeholders.allocate_index();
    let open = start_tag(node).unwrap_or_default();
    let close = end_tag(node).unwrap_or_default();

    out.push_str(&placeholders.push(index, PlaceholderKind::Open, open));
    for child in node.children.borrow().iter() {
        mask_node(child, out, placeholders);
    }
    out.push_str(&placeholders.push(index, PlaceholderKind::Close, close));
}

/// 将带占位符的译文还原为 HTML
///
/// 模型输出整体按文本转义，随后按编号从大到小把转义后的占位符逐字替换为原始标记。
/// 模型重复的占位符会复制标记，丢失的占位符会丢失标记，两种情况都会记录警告。
pub fn unmask(flat_text: &str, placeholders: &PlaceholderMap) -> String {
    let (missing, duplicated) = placeholders.audit(flat_text);
    if !missing.is_empty() || !duplicated.is_empty() {
        tracing::warn!(
            "译文中的占位符不完整: 丢失 {:?}，重复 {:?}",
            missing,
            duplicated
        );
    }

    let mut ordered: Vec<&Placeholder> = placeholders.iter().collect();
    ordered.sort_by(|a, b| b.index.cmp(&a.index));

    let mut html = escape_text(flat_text);
    for placeholder in ordered {
        html = html.replace(&placeholder.escaped_token(), &placeholder.markup);
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{find_nodes, html_to_dom, inner_html};
    use markup5ever_rcdom::RcDom;

    // 文档被释放时会拆掉整棵树，测试中必须让 RcDom 与节点同生命周期
    fn first(html: &str, tag: &str) -> (RcDom, Handle) {
        let dom = html_to_dom(html.as_bytes(), "utf-8").unwrap();
        let node = find_nodes(&dom.document, vec![tag]).remove(0);
        (dom, node)
    }

    #[test]
    fn test_inline_pair() {
        let (_dom, p) = first("<p>Hello <b>world</b>!</p>", "p");
        let masked = mask(&p);

        assert_eq!(masked.text, "Hello <t0>world</t0>!");
        assert_eq!(masked.placeholders.get("<t0>"), Some("<b>"));
        assert_eq!(masked.placeholders.get("</t0>"), Some("</b>"));
        assert_eq!(masked.placeholders.len(), 2);
    }

    #[test]
    fn test_preserve_and_comment_and_unknown() {
        let (_dom, p) = first(
            "<p>Pick <select><option>A</option></select> now<!-- note --> <my-widget>x</my-widget></p>",
            "p",
        );
        let masked = mask(&p);

        assert_eq!(masked.text, "Pick <t0/> now<t1/> <t2/>");
        assert_eq!(
            masked.placeholders.get("<t0/>"),
            Some("<select><option>A</option></select>")
        );
        assert_eq!(masked.placeholders.get("<t1/>"), Some("<!-- note -->"));
        assert_eq!(
            masked.placeholders.get("<t2/>"),
            Some("<my-widget>x</my-widget>")
        );
    }

    #[test]
    fn test_template_serializes_without_contents() {
        let (_dom, p) = first("<p>Use <template><b>x</b></template> here</p>", "p");
        let masked = mask(&p);

        assert_eq!(masked.text, "Use <t0/> here");
        assert_eq!(masked.placeholders.get("<t0/>"), Some("<template></template>"));
    }

    #[test]
    fn test_counter_shared_across_recursion() {
        let (_dom, p) = first(
            "<p><a href=\"/x\">go <em>now</em></a> and <code>x()</code></p>",
            "p",
        );
        let masked = mask(&p);

        assert_eq!(masked.text, "<t0>go <t1>now</t1></t0> and <t2/>");
        assert_eq!(masked.placeholders.index_count(), 3);
        assert_eq!(masked.placeholders.get("<t0>"), Some("<a href=\"/x\">"));
    }

    #[test]
    fn test_placeholder_tokens_unique() {
        let (_dom, p) = first(
            "<li><b>a</b><i>b</i><span><u>c</u></span><img src=\"x.png\"><!--z--></li>",
            "li",
        );
        let masked = mask(&p);

        let tokens: Vec<String> = masked.placeholders.iter().map(|p| p.token()).collect();
        let mut deduped = tokens.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(tokens.len(), deduped.len());

        let mut indices: Vec<usize> = masked.placeholders.iter().map(|p| p.index).collect();
        indices.sort();
        indices.dedup();
        assert_eq!(indices, (0..masked.placeholders.index_count()).collect::<Vec<_>>());
        for token in &tokens {
            assert_eq!(masked.text.matches(token.as_str()).count(), 1);
        }
    }

    #[test]
    fn test_round_trip_identity() {
        for html in [
            "<p>Hello <b>world</b>!</p>",
            "<p>A <a href=\"/q?a=1&amp;b=2\" class=\"x\">link &amp; <em>more</em></a> &lt;tag&gt;</p>",
            "<p>Pick <select><option>A</option></select> now<!-- note --></p>",
            "<p>x<br>y <img src=\"a.png\" alt=\"a &quot;b&quot;\"> z\u{a0}</p>",
        ] {
            let (_dom, p) = first(html, "p");
            let masked = mask(&p);
            assert_eq!(
                unmask(&masked.text, &masked.placeholders),
                inner_html(&p),
                "round trip failed for {}",
                html
            );
        }
    }

    #[test]
    fn test_unmask_translated_output() {
        let (_dom, p) = first("<p>Hello <b>world</b>!</p>", "p");
        let masked = mask(&p);
        assert_eq!(
            unmask("안녕 <t0>세계</t0>!", &masked.placeholders),
            "안녕 <b>세계</b>!"
        );
    }

    #[test]
    fn test_unmask_escapes_model_markup() {
        let map = PlaceholderMap::new();
        assert_eq!(
            unmask("<script>alert(1)</script>", &map),
            "&lt;script&gt;alert(1)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_unmask_high_indices_first() {
        let (_dom, p) = first(
            "<p><b>1</b><b>2</b><b>3</b><b>4</b><b>5</b><b>6</b><b>7</b><b>8</b><b>9</b><b>10</b><i>11</i></p>",
            "p",
        );
        let masked = mask(&p);
        assert!(masked.text.ends_with("<t10>11</t10>"));
        assert_eq!(unmask(&masked.text, &masked.placeholders), inner_html(&p));
    }

    #[test]
    fn test_dropped_and_duplicated_placeholders() {
        let (_dom, p) = first("<p>Hello <b>world</b>!</p>", "p");
        let masked = mask(&p);

        let (missing, duplicated) = masked.placeholders.audit("안녕 세계!");
        assert_eq!(missing, vec!["<t0>", "</t0>"]);
        assert!(duplicated.is_empty());
        assert_eq!(unmask("안녕 세계!", &masked.placeholders), "안녕 세계!");

        assert_eq!(
            unmask("<t0>a</t0> <t0>b</t0>", &masked.placeholders),
            "<b>a</b> <b>b</b>"
        );
    }
}
