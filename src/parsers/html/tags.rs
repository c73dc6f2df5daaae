//! 标签分类表
//!
//! 遍历器和遮罩编解码共用的唯一分类来源。每个标签名只属于一个类别，
//! 未登记的标签归为 [`TagClass::Unknown`]。

use std::collections::HashMap;
use std::sync::OnceLock;

/// 标签类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// 非内容元素，遍历时整体跳过
    Skip,
    /// 叶子块级元素（段落、标题、列表项、单元格等）
    LeafBlock,
    /// 容器块级元素
    Container,
    /// 行内修饰元素，遮罩时成对替换
    Inline,
    /// 内部结构不可暴露给模型的元素，遮罩时整体替换
    Preserve,
    /// 未登记的元素
    Unknown,
}

impl TagClass {
    /// 查询标签类别（大小写不敏感）
    pub fn of(tag_name: &str) -> TagClass {
        let table = tag_table();
        if let Some(class) = table.get(tag_name) {
            return *class;
        }
        table
            .get(tag_name.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(TagClass::Unknown)
    }

    /// 是否为块级元素（叶子块或容器）
    pub fn is_block(self) -> bool {
        matches!(self, TagClass::LeafBlock | TagClass::Container)
    }
}

const SKIP_TAGS: &[&str] = &[
    "script", "style", "noscript", "iframe", "object", "embed", "svg", "math", "code", "pre",
    "textarea", "input", "title", "meta", "link", "head", "html",
];

const LEAF_BLOCK_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "blockquote", "td", "th", "caption", "label",
    "figcaption", "dt", "dd", "summary",
];

const CONTAINER_TAGS: &[&str] = &[
    "div", "section", "article", "nav", "header", "footer", "main", "aside", "ol", "ul", "dl",
    "table", "tbody", "thead", "tfoot", "tr", "figure", "details", "dialog", "form", "fieldset",
];

const INLINE_TAGS: &[&str] = &[
    "a", "b", "strong", "i", "em", "span", "sub", "sup", "u", "small", "mark", "del", "ins", "q",
    "cite", "dfn", "abbr", "time", "bdo", "bdi", "ruby", "rt", "rp", "data",
];

const PRESERVE_TAGS: &[&str] = &[
    "select", "button", "option", "optgroup", "canvas", "video", "audio", "img", "picture",
    "source", "map", "area", "kbd", "samp", "var", "slot", "template", "portal", "wbr", "br",
];

fn tag_table() -> &'static HashMap<&'static str, TagClass> {
    static TABLE: OnceLock<HashMap<&'static str, TagClass>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let groups: [(&[&str], TagClass); 5] = [
            (SKIP_TAGS, TagClass::Skip),
            (LEAF_BLOCK_TAGS, TagClass::LeafBlock),
            (CONTAINER_TAGS, TagClass::Container),
            (INLINE_TAGS, TagClass::Inline),
            (PRESERVE_TAGS, TagClass::Preserve),
        ];

        let mut table = HashMap::new();
        for (tags, class) in groups {
            for tag in tags {
                table.insert(*tag, class);
            }
        }
        table
    })
}
