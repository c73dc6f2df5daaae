//! 分块模块
//!
//! 把翻译单元按顺序贪心地装入有界的块，每块对应一次批量补全请求。
//!
//! ## 装箱规则
//!
//! 下一个单元会追加到当前块，除非：
//! - 当前块非空，且追加后累计字符数超过 `max_chars`；或
//! - 当前块已经装满 `max_items` 个单元。
//!
//! 满足任一条件时关闭当前块并用该单元开启新块。单个超长单元独占一块，不会阻塞后续处理。
//! 字符数按 Unicode 标量计算。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use pagelingo::translation::pipeline::batch::{Chunker, ChunkerConfig};
//!
//! let mut chunker = Chunker::new(ChunkerConfig::default());
//! let chunks = chunker.chunk(units);
//! println!("{} 个单元分成 {} 块", chunker.stats().input_units, chunks.len());
//! ```

use crate::translation::config::{constants, TranslationConfig};
use crate::translation::pipeline::collector::TranslationUnit;

/// 一块翻译单元
///
/// `texts[i]` 始终等于 `units[i].source_text`。
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub units: Vec<TranslationUnit>,
    pub texts: Vec<String>,
}

impl Chunk {
    fn push(&mut self, unit: TranslationUnit) {
        self.texts.push(unit.source_text.clone());
        self.units.push(unit);
    }

    /// 单元数量
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// 累计字符数
    pub fn char_count(&self) -> usize {
        self.units.iter().map(TranslationUnit::char_count).sum()
    }
}

/// 分块配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkerConfig {
    /// 每块最大字符数（软上限）
    pub max_chars: usize,
    /// 每块最大单元数（硬上限）
    pub max_items: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: constants::DEFAULT_CHUNK_MAX_CHARS,
            max_items: constants::DEFAULT_CHUNK_MAX_ITEMS,
        }
    }
}

impl From<&TranslationConfig> for ChunkerConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            max_chars: config.chunk_max_chars,
            max_items: config.chunk_max_items,
        }
    }
}

/// 分块统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkStats {
    pub input_units: usize,
    pub output_chunks: usize,
    /// 独占一块的超长单元数
    pub oversized_units: usize,
}

impl ChunkStats {
    pub fn reset(&mut self) {
        *self = Default::default();
    }
}

/// 分块器
#[derive(Debug, Clone, Default)]
pub struct Chunker {
    config: ChunkerConfig,
    stats: ChunkStats,
}

impl Chunker {
    pub fn new(config: ChunkerConfig) -> Self {
        Self {
            config,
            stats: ChunkStats::default(),
        }
    }

    /// 按顺序分块
    ///
    /// # 参数
    /// * `units` - 按文档顺序排列的翻译单元
    ///
    /// # 返回值
    /// 保持原顺序的块序列；不丢弃也不重复任何单元
    pub fn chunk(&mut self, units: Vec<TranslationUnit>) -> Vec<Chunk> {
        self.stats.reset();
        self.stats.input_units = units.len();

        // 上限为 0 时按 1 处理，保证每块至少能放下一个单元
        let max_items = self.config.max_items.max(1);
        let max_chars = self.config.max_chars;

        let mut chunks = Vec::new();
        let mut current = Chunk::default();
        let mut current_chars = 0usize;

        for unit in units {
            let len = unit.char_count();
            if !current.is_empty()
                && (current_chars + len > max_chars || current.len() >= max_items)
            {
                chunks.push(std::mem::take(&mut current));
                current_chars = 0;
            }
            if len > max_chars {
                self.stats.oversized_units += 1;
            }
            current_chars += len;
            current.push(unit);
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        self.stats.output_chunks = chunks.len();
        tracing::debug!(
            "分块完成: {} 个单元 -> {} 块",
            self.stats.input_units,
            self.stats.output_chunks
        );

        chunks
    }

    pub fn stats(&self) -> &ChunkStats {
        &self.stats
    }
}

/// 便捷函数：按给定上限分块
pub fn chunk_units(units: Vec<TranslationUnit>, max_chars: usize, max_items: usize) -> Vec<Chunk> {
    Chunker::new(ChunkerConfig {
        max_chars,
        max_items,
    })
    .chunk(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::html::{find_nodes, html_to_dom};
    use markup5ever_rcdom::RcDom;

    fn units_of(texts: &[&str]) -> (RcDom, Vec<TranslationUnit>) {
        let html: String = texts.iter().map(|t| format!("<p>{}</p>", t)).collect();
        let dom = html_to_dom(html.as_bytes(), "utf-8").unwrap();
        let units = find_nodes(&dom.document, vec!["p"])
            .into_iter()
            .zip(texts)
            .map(|(node, text)| TranslationUnit::plain(node, text.to_string()))
            .collect();
        (dom, units)
    }

    fn sizes(chunks: &[Chunk]) -> Vec<usize> {
        chunks.iter().map(Chunk::len).collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(chunk_units(Vec::new(), 800, 3).is_empty());
    }

    #[test]
    fn test_one_item_per_chunk() {
        let (_dom, units) = units_of(&["a", "b", "c", "d"]);
        let chunks = chunk_units(units, 800, 1);
        assert_eq!(sizes(&chunks), vec![1, 1, 1, 1]);
    }

    #[test]
    fn test_unbounded_single_chunk_in_order() {
        let (_dom, units) = units_of(&["one", "two", "three", "four", "five"]);
        let chunks = chunk_units(units, usize::MAX / 2, usize::MAX);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].texts, vec!["one", "two", "three", "four", "five"]);
    }

    #[test]
    fn test_default_item_limit() {
        let (_dom, units) = units_of(&["a", "b", "c", "d", "e", "f", "g"]);
        let mut chunker = Chunker::new(ChunkerConfig::default());
        let chunks = chunker.chunk(units);

        assert_eq!(sizes(&chunks), vec![3, 3, 1]);
        assert_eq!(chunker.stats().output_chunks, 3);
        assert_eq!(chunker.stats().input_units, 7);
    }

    #[test]
    fn test_char_limit_closes_chunk() {
        let (_dom, units) = units_of(&["aaaa", "bbbb", "cc", "d"]);
        let chunks = chunk_units(units, 8, 10);

        assert_eq!(sizes(&chunks), vec![2, 2]);
        assert_eq!(chunks[0].char_count(), 8);
    }

    #[test]
    fn test_oversized_unit_alone() {
        let (_dom, units) = units_of(&["short", "this one is far too long", "tail"]);
        let mut chunker = Chunker::new(ChunkerConfig {
            max_chars: 10,
            max_items: 3,
        });
        let chunks = chunker.chunk(units);

        assert_eq!(sizes(&chunks), vec![1, 1, 1]);
        assert_eq!(chunks[1].texts, vec!["this one is far too long"]);
        assert_eq!(chunker.stats().oversized_units, 1);
    }

    #[test]
    fn test_counts_unicode_scalars() {
        // 每个韩文音节是 3 字节但只算 1 个字符
        let (_dom, units) = units_of(&["가나다", "라마바"]);
        let chunks = chunk_units(units, 6, 10);
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_texts_parallel_to_units() {
        let (_dom, units) = units_of(&["x", "y", "z", "w"]);
        for chunk in chunk_units(units, 800, 3) {
            assert_eq!(chunk.units.len(), chunk.texts.len());
            for (unit, text) in chunk.units.iter().zip(&chunk.texts) {
                assert_eq!(&unit.source_text, text);
            }
        }
    }
}
