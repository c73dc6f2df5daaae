//! HTML解析和处理模块
//!
//! - `dom`: 基础DOM操作
//! - `serializer`: 文档与片段序列化
//! - `tags`: 标签分类表

pub mod dom;
pub mod serializer;
pub mod tags;

pub use dom::{
    child_elements, find_body, find_elements_with_attr, find_nodes, get_charset,
    get_child_node_by_name, get_node_attr, get_node_name, has_direct_text, has_markup_children,
    html_to_dom, rendered_text, set_inner_html, set_node_attr,
};
pub use serializer::{
    end_tag, escape_attr_value, escape_text, inner_html, outer_html, serialize_document, start_tag,
};
pub use tags::TagClass;
