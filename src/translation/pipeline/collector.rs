//! 翻译单元收集器
//!
//! 从页面中选出最小的一组互不相交的“叶子”元素，每个元素直接拥有值得翻译的文本。
//! 遍历规则（前序、递归）：
//!
//! 1. 跳过非内容元素（脚本、样式、嵌入文档等），不进入其子树；
//! 2. 跳过已经带有翻译状态的元素；
//! 3. 容器元素没有直接文本时，只进入子元素；
//! 4. 任一直接子元素是块级元素时，进入子元素；
//! 5. 文本内容为空白时跳过；
//! 6. 否则为该元素生成一个翻译单元：含子元素或注释时做结构遮罩，否则取修剪后的纯文本。

use std::time::Instant;

use markup5ever_rcdom::Handle;

use crate::parsers::html::{
    child_elements, escape_text, get_node_name, has_direct_text, has_markup_children,
    rendered_text, TagClass,
};
use crate::translation::pipeline::masking::{mask, unmask, PlaceholderMap};
use crate::translation::storage::{ElementState, StateStore};

/// 一个翻译单元
///
/// 单元只引用元素而不拥有元素，文档必须比单元活得更久。
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    /// 目标元素
    pub element: Handle,
    /// 送往模型的文本：纯文本或带占位符的遮罩文本
    pub source_text: String,
    /// 是否经过结构遮罩
    pub is_structural: bool,
    /// 占位符映射，仅结构单元存在
    pub placeholders: Option<PlaceholderMap>,
}

impl TranslationUnit {
    /// 纯文本单元
    pub fn plain(element: Handle, text: String) -> Self {
        Self {
            element,
            source_text: text,
            is_structural: false,
            placeholders: None,
        }
    }

    /// 结构单元
    pub fn structural(element: Handle, text: String, placeholders: PlaceholderMap) -> Self {
        Self {
            element,
            source_text: text,
            is_structural: true,
            placeholders: Some(placeholders),
        }
    }

    /// 源文本字符数（按 Unicode 标量计）
    pub fn char_count(&self) -> usize {
        self.source_text.chars().count()
    }

    /// 元素标签名
    pub fn tag_name(&self) -> &str {
        get_node_name(&self.element).unwrap_or("")
    }

    /// 由译文生成写回元素的 HTML
    ///
    /// 结构单元还原占位符；纯文本单元按文本转义。
    pub fn render(&self, translated: &str) -> String {
        match &self.placeholders {
            Some(placeholders) if self.is_structural => unmask(translated, placeholders),
            _ => escape_text(translated),
        }
    }
}

/// 收集器配置
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// 最大递归深度，超出的子树不再进入
    pub max_depth: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self { max_depth: 512 }
    }
}

/// 收集统计
#[derive(Debug, Clone, Default)]
pub struct CollectionStats {
    pub elements_visited: usize,
    pub skipped_tags: usize,
    pub skipped_stateful: usize,
    pub skipped_empty: usize,
    pub plain_units: usize,
    pub structural_units: usize,
    pub collection_time_ms: u64,
}

impl CollectionStats {
    /// 重置统计
    pub fn reset(&mut self) {
        *self = Default::default();
    }

    /// 生成的单元总数
    pub fn total_units(&self) -> usize {
        self.plain_units + self.structural_units
    }
}

/// 翻译单元收集器
pub struct UnitCollector<'a> {
    config: CollectorConfig,
    store: &'a dyn StateStore,
    stats: CollectionStats,
}

impl<'a> UnitCollector<'a> {
    /// 创建新的收集器
    pub fn new(store: &'a dyn StateStore) -> Self {
        Self::with_config(store, CollectorConfig::default())
    }

    pub fn with_config(store: &'a dyn StateStore, config: CollectorConfig) -> Self {
        Self {
            config,
            store,
            stats: CollectionStats::default(),
        }
    }

    /// 从 `root` 开始收集翻译单元，结果按文档顺序排列
    pub fn collect(&mut self, root: &Handle) -> Vec<TranslationUnit> {
        let start = Instant::now();
        self.stats.reset();

        let mut units = Vec::new();
        self.walk(root, &mut units, 0);

        self.stats.collection_time_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            "收集完成: 访问 {} 个元素，生成 {} 个单元（结构 {}）",
            self.stats.elements_visited,
            self.stats.total_units(),
            self.stats.structural_units
        );

        units
    }

    /// 获取统计信息
    pub fn stats(&self) -> &CollectionStats {
        &self.stats
    }

    fn walk(&mut self, element: &Handle, units: &mut Vec<TranslationUnit>, depth: usize) {
        if depth > self.config.max_depth {
            tracing::warn!("超过最大遍历深度 {}，忽略子树", self.config.max_depth);
            return;
        }

        let Some(name) = get_node_name(element) else {
            return;
        };
        self.stats.elements_visited += 1;

        let class = TagClass::of(name);
        if class == TagClass::Skip {
            self.stats.skipped_tags += 1;
            return;
        }

        if self.store.state(element) != ElementState::Untouched {
            self.stats.skipped_stateful += 1;
            return;
        }

        if class == TagClass::Container && !has_direct_text(element) {
            self.walk_children(element, units, depth);
            return;
        }

        let has_block_child = child_elements(element)
            .iter()
            .any(|child| get_node_name(child).map(TagClass::of).is_some_and(TagClass::is_block));
        if has_block_child {
            self.walk_children(element, units, depth);
            return;
        }

        // 只看渲染后的文本，脚本和样式内容不算
        let text = rendered_text(element);
        let trimmed = text.trim();
        if trimmed.is_empty() {
            self.stats.skipped_empty += 1;
            return;
        }

        if has_markup_children(element) {
            let masked = mask(element);
            self.stats.structural_units += 1;
            units.push(TranslationUnit::structural(
                element.clone(),
                masked.text,
                masked.placeholders,
            ));
        } else {
            self.stats.plain_units += 1;
            units.push(TranslationUnit::plain(element.clone(), trimmed.to_string()));
        }
    }

    fn walk_children(&mut self, element: &Handle, units: &mut Vec<TranslationUnit>, depth: usize) {
        for child in child_elements(element) {
            self.walk(&child, units, depth + 1);
        }
    }
}

/// 便捷函数：用给定状态存储从 `root` 收集翻译单元
pub fn extract(root: &Handle, store: &dyn StateStore) -> Vec<TranslationUnit> {
    UnitCollector::new(store).collect(root)
}
