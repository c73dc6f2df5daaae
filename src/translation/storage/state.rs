//! 元素翻译状态存储
//!
//! 每个被翻译过的元素都带有一条记录：当前状态、首次触碰时捕获的原始标记、
//! 最近一次写入的译文标记。原始标记一经捕获不再覆盖。
//!
//! 提供两种实现：
//! - [`AttributeStore`]：写入元素的 `data-tg-*` 属性，随文档一起保存；
//! - [`MemoryStateStore`]：按节点身份保存在内存表中，不改动文档属性。

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};

use crate::parsers::html::{find_elements_with_attr, get_node_attr, set_node_attr};

/// 状态属性名
pub const STATE_ATTR: &str = "data-tg-state";
/// 原始标记属性名
pub const ORIGINAL_ATTR: &str = "data-tg-original";
/// 译文标记属性名
pub const TRANSLATED_ATTR: &str = "data-tg-translated-html";

/// 元素状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Untouched,
    Original,
    Translated,
}

impl ElementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementState::Untouched => "untouched",
            ElementState::Original => "original",
            ElementState::Translated => "translated",
        }
    }

    fn from_attr(value: &str) -> Self {
        match value {
            "original" => ElementState::Original,
            "translated" => ElementState::Translated,
            _ => ElementState::Untouched,
        }
    }
}

impl fmt::Display for ElementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 单个元素的完整记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    pub state: ElementState,
    pub original_markup: Option<String>,
    pub translated_markup: Option<String>,
}

impl Default for ElementRecord {
    fn default() -> Self {
        Self {
            state: ElementState::Untouched,
            original_markup: None,
            translated_markup: None,
        }
    }
}

/// 元素状态存储接口
///
/// 所有方法都通过共享引用调用，实现内部自行处理可变性（DOM 节点本身就是内部可变的）。
pub trait StateStore {
    /// 读取元素记录，未记录过的元素返回默认记录
    fn record(&self, element: &Handle) -> ElementRecord;

    /// 设置元素状态
    fn set_state(&self, element: &Handle, state: ElementState);

    /// 捕获原始标记；已经捕获过时保持不变并返回 `false`
    fn capture_original(&self, element: &Handle, markup: &str) -> bool;

    /// 记录最新的译文标记
    fn set_translated_markup(&self, element: &Handle, markup: &str);

    /// 按文档顺序返回 `root` 下所有带状态的元素
    fn tracked_elements(&self, root: &Handle) -> Vec<Handle>;

    fn state(&self, element: &Handle) -> ElementState {
        self.record(element).state
    }
}

/// 基于 `data-tg-*` 属性的状态存储
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeStore;

impl AttributeStore {
    pub fn new() -> Self {
        Self
    }
}

impl StateStore for AttributeStore {
    fn record(&self, element: &Handle) -> ElementRecord {
        ElementRecord {
            state: get_node_attr(element, STATE_ATTR)
                .map(|value| ElementState::from_attr(&value))
                .unwrap_or(ElementState::Untouched),
            original_markup: get_node_attr(element, ORIGINAL_ATTR),
            translated_markup: get_node_attr(element, TRANSLATED_ATTR),
        }
    }

    fn state(&self, element: &Handle) -> ElementState {
        get_node_attr(element, STATE_ATTR)
            .map(|value| ElementState::from_attr(&value))
            .unwrap_or(ElementState::Untouched)
    }

    fn set_state(&self, element: &Handle, state: ElementState) {
        match state {
            ElementState::Untouched => set_node_attr(element, STATE_ATTR, None),
            other => set_node_attr(element, STATE_ATTR, Some(other.as_str().to_string())),
        }
    }

    fn capture_original(&self, element: &Handle, markup: &str) -> bool {
        if get_node_attr(element, ORIGINAL_ATTR).is_some() {
            return false;
        }
        set_node_attr(element, ORIGINAL_ATTR, Some(markup.to_string()));
        true
    }

    fn set_translated_markup(&self, element: &Handle, markup: &str) {
        set_node_attr(element, TRANSLATED_ATTR, Some(markup.to_string()));
    }

    fn tracked_elements(&self, root: &Handle) -> Vec<Handle> {
        find_elements_with_attr(root, STATE_ATTR)
    }
}

/// 内存中的状态表
///
/// 以节点地址为键，同时持有节点句柄以保证地址在表的生命周期内有效。
#[derive(Default)]
pub struct MemoryStateStore {
    records: RefCell<HashMap<usize, (Handle, ElementRecord)>>,
    order: RefCell<Vec<usize>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(element: &Handle) -> usize {
        Rc::as_ptr(element) as usize
    }

    fn update<F: FnOnce(&mut ElementRecord)>(&self, element: &Handle, f: F) {
        let key = Self::key(element);
        let mut records = self.records.borrow_mut();
        let entry = records.entry(key).or_insert_with(|| {
            self.order.borrow_mut().push(key);
            (element.clone(), ElementRecord::default())
        });
        f(&mut entry.1);
    }

    /// 已记录的元素数量
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }
}

impl StateStore for MemoryStateStore {
    fn record(&self, element: &Handle) -> ElementRecord {
        self.records
            .borrow()
            .get(&Self::key(element))
            .map(|(_, record)| record.clone())
            .unwrap_or_default()
    }

    fn set_state(&self, element: &Handle, state: ElementState) {
        self.update(element, |record| record.state = state);
    }

    fn capture_original(&self, element: &Handle, markup: &str) -> bool {
        let mut captured = false;
        self.update(element, |record| {
            if record.original_markup.is_none() {
                record.original_markup = Some(markup.to_string());
                captured = true;
            }
        });
        captured
    }

    fn set_translated_markup(&self, element: &Handle, markup: &str) {
        self.update(element, |record| {
            record.translated_markup = Some(markup.to_string())
        });
    }

    fn tracked_elements(&self, root: &Handle) -> Vec<Handle> {
        let records = self.records.borrow();
        self.order
            .borrow()
            .iter()
            .filter_map(|key| records.get(key))
            .filter(|(handle, record)| {
                record.state != ElementState::Untouched && is_descendant_or_self(handle, root)
            })
            .map(|(handle, _)| handle.clone())
            .collect()
    }
}

fn is_descendant_or_self(node: &Handle, root: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if Rc::ptr_eq(&candidate, root) {
            return true;
        }
        let parent = candidate.parent.take();
        candidate.parent.set(parent.clone());
        current = parent.and_then(|weak| weak.upgrade());
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{find_body, find_nodes, html_to_dom};
    use markup5ever_rcdom::RcDom;

    fn sample() -> (RcDom, Vec<Handle>) {
        let dom = html_to_dom(b"<p>a</p><p>b</p><p>c</p>", "utf-8").unwrap();
        let ps = find_nodes(&dom.document, vec!["p"]);
        (dom, ps)
    }

    fn exercise(store: &dyn StateStore, ps: &[Handle], body: &Handle) {
        assert_eq!(store.state(&ps[0]), ElementState::Untouched);

        assert!(store.capture_original(&ps[0], "a"));
        assert!(!store.capture_original(&ps[0], "changed"));
        store.set_translated_markup(&ps[0], "가");
        store.set_state(&ps[0], ElementState::Translated);

        store.capture_original(&ps[2], "c");
        store.set_state(&ps[2], ElementState::Original);

        let record = store.record(&ps[0]);
        assert_eq!(record.state, ElementState::Translated);
        assert_eq!(record.original_markup.as_deref(), Some("a"));
        assert_eq!(record.translated_markup.as_deref(), Some("가"));

        let tracked = store.tracked_elements(body);
        assert_eq!(tracked.len(), 2);
        assert!(Rc::ptr_eq(&tracked[0], &ps[0]));
        assert!(Rc::ptr_eq(&tracked[1], &ps[2]));
    }

    #[test]
    fn test_attribute_store() {
        let (dom, ps) = sample();
        let body = find_body(&dom).unwrap();
        exercise(&AttributeStore::new(), &ps, &body);

        assert_eq!(get_node_attr(&ps[0], STATE_ATTR).as_deref(), Some("translated"));
        assert_eq!(get_node_attr(&ps[0], ORIGINAL_ATTR).as_deref(), Some("a"));
        assert_eq!(get_node_attr(&ps[0], TRANSLATED_ATTR).as_deref(), Some("가"));
    }

    #[test]
    fn test_memory_store_leaves_attributes_alone() {
        let (dom, ps) = sample();
        let body = find_body(&dom).unwrap();
        let store = MemoryStateStore::new();
        exercise(&store, &ps, &body);

        assert_eq!(get_node_attr(&ps[0], STATE_ATTR), None);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_state_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ElementState::Translated).unwrap(),
            "\"translated\""
        );
    }
}
