//! 基础DOM操作
//!
//! 在 `markup5ever_rcdom` 之上提供页面翻译需要的节点查询和修改功能：
//! 属性读写、文本内容提取、innerHTML 替换以及按属性查找元素。

use std::io;
use std::rc::Rc;

use encoding_rs::Encoding;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::core::parse_content_type;

/// 将 HTML 字节转换为 DOM
///
/// 按 `document_encoding` 解码字节，无法识别的编码按 UTF-8（有损）处理。
pub fn html_to_dom(data: &[u8], document_encoding: &str) -> io::Result<RcDom> {
    let s: String = match Encoding::for_label(document_encoding.as_bytes()) {
        Some(encoding) => {
            let (string, _, _) = encoding.decode(data);
            string.into_owned()
        }
        None => String::from_utf8_lossy(data).into_owned(),
    };

    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut s.as_bytes())
}

/// 查找指定路径的DOM节点
///
/// `node_names` 是从外到内的元素名路径，例如 `["html", "body"]`。
pub fn find_nodes(node: &Handle, node_names: Vec<&str>) -> Vec<Handle> {
    let mut found_nodes = Vec::new();
    let Some(node_name) = node_names.first().copied() else {
        return found_nodes;
    };

    if node_names.len() == 1 {
        if get_node_name(node) == Some(node_name) {
            found_nodes.push(node.clone());
        }

        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
        }
    } else if get_node_name(node) == Some(node_name) {
        let mut new_node_names = node_names;
        new_node_names.remove(0);
        found_nodes.append(&mut find_nodes(node, new_node_names));
    } else {
        for child_node in node.children.borrow().iter() {
            found_nodes.append(&mut find_nodes(child_node, node_names.clone()));
        }
    }

    found_nodes
}

/// 获取文档的 `<body>` 元素
pub fn find_body(dom: &RcDom) -> Option<Handle> {
    find_nodes(&dom.document, vec!["html", "body"]).into_iter().next()
}

/// 根据名称获取子节点
pub fn get_child_node_by_name(parent: &Handle, node_name: &str) -> Option<Handle> {
    let children = parent.children.borrow();
    children
        .iter()
        .find(|child| get_node_name(child) == Some(node_name))
        .cloned()
}

/// 获取节点属性值
pub fn get_node_attr(node: &Handle, attr_name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| &*attr.name.local == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

/// 获取节点名称
pub fn get_node_name(node: &Handle) -> Option<&'_ str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

/// 设置节点属性
///
/// `attr_value` 为 `None` 时删除该属性。
pub fn set_node_attr(node: &Handle, attr_name: &str, attr_value: Option<String>) {
    use html5ever::interface::{Attribute, QualName};
    use html5ever::tendril::format_tendril;
    use html5ever::{namespace_url, ns, LocalName};

    if let NodeData::Element { attrs, .. } = &node.data {
        let attrs_mut = &mut attrs.borrow_mut();
        let mut i = 0;
        let mut found_existing_attr: bool = false;

        while i < attrs_mut.len() {
            if &attrs_mut[i].name.local == attr_name {
                found_existing_attr = true;

                if let Some(attr_value) = attr_value.as_deref() {
                    attrs_mut[i].value.clear();
                    attrs_mut[i].value.push_slice(attr_value);
                } else {
                    attrs_mut.remove(i);
                    continue;
                }
            }

            i += 1;
        }

        if !found_existing_attr {
            if let Some(attr_value) = attr_value {
                attrs_mut.push(Attribute {
                    name: QualName::new(None, ns!(), LocalName::from(attr_name)),
                    value: format_tendril!("{}", attr_value),
                });
            }
        }
    };
}

/// 不参与渲染的元素，`innerText` 忽略其内容
const NON_RENDERED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "title", "head", "meta", "link",
];

/// 获取节点渲染后可见的文本（近似 `innerText`）
///
/// 不含注释，跳过脚本、样式等不渲染元素的子树。
pub fn rendered_text(node: &Handle) -> String {
    let mut text = String::new();
    append_rendered_text(node, &mut text);
    text
}

fn append_rendered_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        NodeData::Element { name, .. } if NON_RENDERED_TAGS.contains(&&*name.local) => {}
        NodeData::Element { .. } | NodeData::Document => {
            for child in node.children.borrow().iter() {
                append_rendered_text(child, out);
            }
        }
        _ => {}
    }
}

/// 元素是否直接拥有非空白文本节点
pub fn has_direct_text(node: &Handle) -> bool {
    node.children.borrow().iter().any(|child| match &child.data {
        NodeData::Text { contents } => !contents.borrow().trim().is_empty(),
        _ => false,
    })
}

/// 元素是否含有子元素或注释节点
pub fn has_markup_children(node: &Handle) -> bool {
    node.children.borrow().iter().any(|child| {
        matches!(
            child.data,
            NodeData::Element { .. } | NodeData::Comment { .. }
        )
    })
}

/// 获取元素类型的直接子节点
pub fn child_elements(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|child| matches!(child.data, NodeData::Element { .. }))
        .cloned()
        .collect()
}

/// 按文档顺序查找带有指定属性的所有元素（等价于 `querySelectorAll('[attr]')`）
pub fn find_elements_with_attr(root: &Handle, attr_name: &str) -> Vec<Handle> {
    let mut found = Vec::new();
    collect_with_attr(root, attr_name, &mut found);
    found
}

fn collect_with_attr(node: &Handle, attr_name: &str, found: &mut Vec<Handle>) {
    if get_node_attr(node, attr_name).is_some() {
        found.push(node.clone());
    }
    for child in node.children.borrow().iter() {
        collect_with_attr(child, attr_name, found);
    }
}

/// 用一段 HTML 片段替换元素的全部子节点（等价于设置 `innerHTML`）
///
/// 片段在 `<body>` 上下文中解析，解析得到的节点被移动到目标元素下。
pub fn set_inner_html(node: &Handle, markup: &str) -> io::Result<()> {
    let wrapped = format!(
        "<!DOCTYPE html><html><head></head><body>{}</body></html>",
        markup
    );
    let fragment_dom = parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut wrapped.as_bytes())?;

    let fragment_body = find_body(&fragment_dom).ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidData, "片段解析后缺少 body 元素")
    })?;

    let new_children: Vec<Handle> = fragment_body.children.borrow_mut().drain(..).collect();

    let mut children = node.children.borrow_mut();
    for old_child in children.drain(..) {
        old_child.parent.set(None);
    }
    for new_child in new_children {
        new_child.parent.set(Some(Rc::downgrade(node)));
        children.push(new_child);
    }

    Ok(())
}

/// 获取文档声明的字符集
///
/// 支持 `<meta charset>` 和 `<meta http-equiv="content-type">` 两种写法。
pub fn get_charset(node: &Handle) -> Option<String> {
    for meta_node in find_nodes(node, vec!["html", "head", "meta"]).iter() {
        if let Some(charset) = get_node_attr(meta_node, "charset") {
            return Some(charset);
        }

        if get_node_attr(meta_node, "http-equiv")
            .unwrap_or_default()
            .eq_ignore_ascii_case("content-type")
        {
            if let Some(content) = get_node_attr(meta_node, "content") {
                let (_media_type, charset) = parse_content_type(&content);
                return Some(charset);
            }
        }
    }

    None
}
