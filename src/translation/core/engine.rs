//! 页面翻译编排器
//!
//! 驱动整条翻译流水线并维护每个元素的可逆状态。
//!
//! ## 一次页面翻译
//! 1. 把处于 `original` 状态的元素恢复为缓存的译文；
//! 2. 收集翻译单元并分块；
//! 3. 逐块先尝试批量翻译，传输失败或段数不符时改为逐条翻译；
//! 4. 启用校验时，未通过的译文单独重试（批量结果预算较浅，逐条调用预算较深），
//!    仍失败的单元跳过，元素保留原文；
//! 5. 成功的单元：首次捕获原始标记，写入译文，标记为 `translated` 并缓存译文标记；
//! 6. 每块结束后报告进度。
//!
//! 单元级的失败不会中断运行，运行总会以汇总报告结束。
//! 同一时刻只允许一次页面翻译，重复调用返回 [`TranslationError::RunInProgress`]。
//!
//! ## 使用示例
//! ```rust,ignore
//! let translator = PageTranslator::from_config(&config)?;
//! let report = translator.translate_page(&document.body()?).await?;
//! println!("{}", report.summary());
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use markup5ever_rcdom::Handle;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::parsers::html::{inner_html, set_inner_html};
use crate::translation::config::TranslationConfig;
use crate::translation::core::client::TranslationClient;
use crate::translation::core::progress::{chunk_progress_message, LogReporter, ProgressReporter};
use crate::translation::core::provider::{CompletionProvider, LmStudioProvider};
use crate::translation::error::{helpers, TranslationError, TranslationResult};
use crate::translation::pipeline::{
    Chunk, Chunker, ChunkerConfig, OutputValidator, TranslationUnit, UnitCollector,
    ValidatorConfig,
};
use crate::translation::storage::{AttributeStore, ElementState, StateStore};

/// 编排器配置
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// 是否校验译文
    pub enforce_validation: bool,
    /// 批量结果未通过校验时的单独重试次数
    pub batch_retry_budget: usize,
    /// 逐条翻译的重试次数（不含首次调用）
    pub single_retry_budget: usize,
    /// 重试基础延迟，按 2 的幂次退避
    pub retry_delay: Duration,
    pub chunker: ChunkerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&TranslationConfig::default())
    }
}

impl From<&TranslationConfig> for EngineConfig {
    fn from(config: &TranslationConfig) -> Self {
        Self {
            enforce_validation: config.enforce_validation,
            batch_retry_budget: config.batch_retry_budget,
            single_retry_budget: config.single_retry_budget,
            retry_delay: config.retry_delay(),
            chunker: ChunkerConfig::from(config),
        }
    }
}

/// 一次页面翻译的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// 从缓存译文恢复的元素数
    pub restored: usize,
    /// 本次收集到的翻译单元数
    pub units: usize,
    pub chunks: usize,
    /// 新写入译文的单元数
    pub translated: usize,
    /// 最终放弃的单元数
    pub skipped: usize,
    /// 批量请求成功的块数
    pub batch_successes: usize,
    /// 改为逐条翻译的块数
    pub fallbacks: usize,
    /// 重试次数
    pub retries: usize,
    pub elapsed_ms: u64,
}

impl RunReport {
    /// 面向用户的结束消息
    pub fn summary(&self) -> String {
        if self.units == 0 {
            if self.restored > 0 {
                format!("已恢复 {} 个元素的译文", self.restored)
            } else {
                "所有文本都已翻译".to_string()
            }
        } else {
            format!(
                "翻译完成！（恢复: {}，新增: {}，跳过: {}）",
                self.restored, self.translated, self.skipped
            )
        }
    }
}

/// 页面整体状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageState {
    /// 没有任何带状态的元素
    None,
    Original,
    Translated,
}

/// 状态查询与切换的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationStatus {
    pub state: PageState,
    pub count: usize,
}

/// 编排器累计统计
#[derive(Debug, Default)]
pub struct EngineStats {
    pub runs: AtomicUsize,
    pub batch_requests: AtomicUsize,
    pub single_requests: AtomicUsize,
    pub fallbacks: AtomicUsize,
    pub retries: AtomicUsize,
    pub validation_failures: AtomicUsize,
    pub units_translated: AtomicUsize,
    pub units_skipped: AtomicUsize,
    pub toggles: AtomicUsize,
}

impl EngineStats {
    fn inc(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }

    pub fn reset(&mut self) {
        *self = Default::default();
    }
}

/// 运行标志守卫，离开作用域时清除标志
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> TranslationResult<Self> {
        if flag.swap(true, Ordering::AcqRel) {
            return Err(TranslationError::RunInProgress);
        }
        Ok(Self(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// 页面翻译编排器
pub struct PageTranslator {
    client: TranslationClient,
    validator: OutputValidator,
    config: EngineConfig,
    store: Box<dyn StateStore>,
    progress: Box<dyn ProgressReporter>,
    running: AtomicBool,
    stats: EngineStats,
}

impl PageTranslator {
    /// 使用指定的补全能力创建编排器
    ///
    /// 默认使用属性存储和日志进度提示。
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &TranslationConfig) -> Self {
        Self {
            client: TranslationClient::new(provider, config),
            validator: OutputValidator::new(ValidatorConfig::from(config)),
            config: EngineConfig::from(config),
            store: Box::new(AttributeStore::new()),
            progress: Box::new(LogReporter),
            running: AtomicBool::new(false),
            stats: EngineStats::default(),
        }
    }

    /// 按配置创建，连接 LM Studio 补全接口
    pub fn from_config(config: &TranslationConfig) -> TranslationResult<Self> {
        let provider = LmStudioProvider::new(config)?;
        tracing::debug!("补全接口: {}", provider.api_url());
        Ok(Self::new(Arc::new(provider), config))
    }

    /// 替换状态存储
    pub fn with_store(mut self, store: Box<dyn StateStore>) -> Self {
        self.store = store;
        self
    }

    /// 替换进度提示
    pub fn with_progress(mut self, progress: Box<dyn ProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    /// 是否有页面翻译正在进行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 翻译 `root` 下的页面内容
    ///
    /// # 参数
    /// * `root` - 页面根元素，通常是 `<body>`
    ///
    /// # 返回值
    /// 本次运行的汇总；只有已有运行在进行时才返回错误
    pub async fn translate_page(&self, root: &Handle) -> TranslationResult<RunReport> {
        let _guard = RunGuard::acquire(&self.running)?;
        let start = Instant::now();
        EngineStats::inc(&self.stats.runs);

        tracing::info!("开始页面翻译 (provider: {})", self.client.provider_id());
        self.progress.show("正在分析页面结构...");

        let mut report = RunReport {
            restored: self.restore_cached(root),
            ..RunReport::default()
        };
        if report.restored > 0 {
            tracing::info!("已将 {} 个元素恢复为缓存的译文", report.restored);
        }

        let units = UnitCollector::new(self.store.as_ref()).collect(root);
        report.units = units.len();

        if units.is_empty() {
            report.elapsed_ms = start.elapsed().as_millis() as u64;
            self.progress.done(&report.summary());
            return Ok(report);
        }

        let chunks = Chunker::new(self.config.chunker.clone()).chunk(units);
        report.chunks = chunks.len();
        tracing::info!(
            "共 {} 个单元，分为 {} 块（恢复 {} 个）",
            report.units,
            report.chunks,
            report.restored
        );

        for (index, chunk) in chunks.iter().enumerate() {
            let results = self.translate_chunk(index, chunk, &mut report).await;
            for (unit, result) in chunk.units.iter().zip(results) {
                let applied = match result {
                    Some(translated) => match self.apply(unit, &translated) {
                        Ok(()) => true,
                        Err(e) => {
                            helpers::log_error(&e.with_context("写入译文失败"));
                            false
                        }
                    },
                    None => false,
                };

                if applied {
                    report.translated += 1;
                    EngineStats::inc(&self.stats.units_translated);
                } else {
                    report.skipped += 1;
                    EngineStats::inc(&self.stats.units_skipped);
                    tracing::warn!(
                        "跳过 <{}>: {}",
                        unit.tag_name(),
                        preview(&unit.source_text)
                    );
                }
            }

            // 本块写回之后再报告进度
            self.progress
                .show(&chunk_progress_message(index + 1, chunks.len()));
        }

        report.elapsed_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            "页面翻译结束: 新增 {}，跳过 {}，回退 {} 块，重试 {} 次，耗时 {}ms",
            report.translated,
            report.skipped,
            report.fallbacks,
            report.retries,
            report.elapsed_ms
        );
        self.progress.done(&report.summary());

        Ok(report)
    }

    /// 翻译一块，返回与单元一一对应的结果，`None` 表示跳过
    async fn translate_chunk(
        &self,
        index: usize,
        chunk: &Chunk,
        report: &mut RunReport,
    ) -> Vec<Option<String>> {
        EngineStats::inc(&self.stats.batch_requests);

        match self.client.translate_many(&chunk.texts).await {
            Ok(segments) => {
                report.batch_successes += 1;
                tracing::debug!("第 {} 块批量翻译成功（{} 段）", index + 1, segments.len());

                let mut results = Vec::with_capacity(segments.len());
                for (source, candidate) in chunk.texts.iter().zip(segments) {
                    results.push(self.settle_batch_segment(source, candidate, report).await);
                }
                results
            }
            Err(e) => {
                if !e.should_degrade_batch() {
                    helpers::log_error(&e);
                }
                tracing::warn!("第 {} 块批量翻译失败，改为逐条翻译: {}", index + 1, e);
                report.fallbacks += 1;
                EngineStats::inc(&self.stats.fallbacks);

                let mut results = Vec::with_capacity(chunk.texts.len());
                for source in &chunk.texts {
                    let attempts = 1 + self.config.single_retry_budget;
                    results.push(self.translate_with_retries(source, attempts, 0, report).await);
                }
                results
            }
        }
    }

    /// 检查批量结果中的一段，未通过时按批量预算单独重试
    async fn settle_batch_segment(
        &self,
        source: &str,
        candidate: String,
        report: &mut RunReport,
    ) -> Option<String> {
        match self.check(source, &candidate) {
            Ok(()) => Some(candidate),
            Err(e) => {
                tracing::debug!("批量译文未通过校验: {}", e);
                self.translate_with_retries(source, self.config.batch_retry_budget, 1, report)
                    .await
            }
        }
    }

    /// 逐条翻译，最多调用 `attempts` 次
    ///
    /// `first_backoff` 是第一次调用前的退避指数，0 表示立即调用。
    async fn translate_with_retries(
        &self,
        source: &str,
        attempts: usize,
        first_backoff: u32,
        report: &mut RunReport,
    ) -> Option<String> {
        for attempt in 0..attempts {
            let backoff = first_backoff + attempt as u32;
            if backoff > 0 {
                report.retries += 1;
                EngineStats::inc(&self.stats.retries);
                let delay = self.backoff_delay(backoff);
                tracing::debug!("{}ms 后重试 (尝试 {}/{})", delay.as_millis(), attempt + 1, attempts);
                sleep(delay).await;
            }

            EngineStats::inc(&self.stats.single_requests);
            match self.client.translate_one(source).await {
                Ok(translated) => match self.check(source, &translated) {
                    Ok(()) => return Some(translated),
                    Err(e) => tracing::debug!("译文未通过校验: {}", e),
                },
                Err(e) if e.is_retryable() => {
                    tracing::warn!("逐条翻译失败 (尝试 {}/{}): {}", attempt + 1, attempts, e);
                }
                Err(e) => {
                    helpers::log_error(&e);
                    return None;
                }
            }
        }
        None
    }

    fn backoff_delay(&self, exponent: u32) -> Duration {
        let factor = 1u32 << (exponent - 1).min(10);
        self.config.retry_delay.saturating_mul(factor)
    }

    /// 按配置校验译文；空译文总是视为失败
    fn check(&self, source: &str, translated: &str) -> TranslationResult<()> {
        let result = if self.config.enforce_validation {
            self.validator.validate(source, translated)
        } else if translated.trim().is_empty() {
            Err(TranslationError::ValidationFailure("译文为空".to_string()))
        } else {
            Ok(())
        };

        if result.is_err() {
            EngineStats::inc(&self.stats.validation_failures);
        }
        result
    }

    /// 把译文写回元素
    fn apply(&self, unit: &TranslationUnit, translated: &str) -> TranslationResult<()> {
        let element = &unit.element;
        let html = unit.render(translated);

        self.store.capture_original(element, &inner_html(element));
        set_inner_html(element, &html)?;
        self.store.set_state(element, ElementState::Translated);
        self.store.set_translated_markup(element, &html);

        Ok(())
    }

    /// 把 `original` 状态且有缓存译文的元素恢复为译文
    fn restore_cached(&self, root: &Handle) -> usize {
        let mut restored = 0;
        for element in self.store.tracked_elements(root) {
            let record = self.store.record(&element);
            if record.state != ElementState::Original {
                continue;
            }
            if let Some(markup) = record.translated_markup {
                if self.replace_markup(&element, &markup, ElementState::Translated) {
                    restored += 1;
                }
            }
        }
        restored
    }

    fn replace_markup(&self, element: &Handle, markup: &str, state: ElementState) -> bool {
        match set_inner_html(element, markup) {
            Ok(()) => {
                self.store.set_state(element, state);
                true
            }
            Err(e) => {
                tracing::warn!("替换元素内容失败: {}", e);
                false
            }
        }
    }

    /// 当前页面状态：多数元素为 `translated` 时视为已翻译
    pub fn translation_state(&self, root: &Handle) -> TranslationStatus {
        let elements = self.store.tracked_elements(root);
        TranslationStatus {
            state: self.majority_state(&elements),
            count: elements.len(),
        }
    }

    fn majority_state(&self, elements: &[Handle]) -> PageState {
        if elements.is_empty() {
            return PageState::None;
        }
        let translated = elements
            .iter()
            .filter(|el| self.store.state(el) == ElementState::Translated)
            .count();
        if translated * 2 > elements.len() {
            PageState::Translated
        } else {
            PageState::Original
        }
    }

    /// 在原文和译文之间切换
    ///
    /// 按多数状态决定方向，所有带状态的元素都切到同一方向；
    /// 缺少所需缓存标记的元素保持不变且不计数。
    pub fn toggle(&self, root: &Handle) -> TranslationStatus {
        let elements = self.store.tracked_elements(root);
        let target = match self.majority_state(&elements) {
            PageState::None => {
                return TranslationStatus {
                    state: PageState::None,
                    count: 0,
                }
            }
            PageState::Translated => PageState::Original,
            PageState::Original => PageState::Translated,
        };
        EngineStats::inc(&self.stats.toggles);

        let mut count = 0;
        for element in &elements {
            let record = self.store.record(element);
            let (markup, state) = match target {
                PageState::Original => (record.original_markup, ElementState::Original),
                _ => (record.translated_markup, ElementState::Translated),
            };
            if let Some(markup) = markup {
                if self.replace_markup(element, &markup, state) {
                    count += 1;
                }
            }
        }

        tracing::info!("已切换 {} 个元素为 {:?}", count, target);
        TranslationStatus {
            state: target,
            count,
        }
    }

    /// 翻译一段选中的文本
    pub async fn translate_selection(&self, text: &str) -> TranslationResult<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(helpers::validation_error("选中的文本为空"));
        }
        EngineStats::inc(&self.stats.single_requests);
        self.client.translate_one(text).await
    }
}

fn preview(text: &str) -> String {
    let short: String = text.chars().take(40).collect();
    if short.len() < text.len() {
        format!("{}…", short)
    } else {
        short
    }
}
