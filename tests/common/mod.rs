// 集成测试公共模块
//
// 提供 HTML 夹具、DOM 辅助函数和可编排的补全能力

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use markup5ever_rcdom::{Handle, RcDom};

use pagelingo::parsers::html::{find_body, find_nodes, html_to_dom, inner_html};
use pagelingo::translation::{
    CompletionParams, CompletionProvider, PageTranslator, TranslationConfig, TranslationError,
    TranslationResult,
};

type Responder = Box<dyn Fn(&str) -> TranslationResult<String> + Send + Sync>;

/// 可编排的补全能力
///
/// 先按顺序返回预设结果，预设用完后交给响应函数；两者都没有时返回传输错误。
pub struct MockProvider {
    scripted: Mutex<VecDeque<TranslationResult<String>>>,
    responder: Option<Responder>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockProvider {
    /// 只返回预设结果
    pub fn scripted(replies: Vec<TranslationResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            scripted: Mutex::new(replies.into()),
            responder: None,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    /// 按词典翻译，词典里没有的文本加上韩文前缀
    pub fn dictionary(entries: &[(&str, &str)]) -> Arc<Self> {
        let table: HashMap<String, String> = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::with_responder(move |prompt| Ok(answer(prompt, &table)))
    }

    /// 始终失败
    pub fn failing() -> Arc<Self> {
        Self::with_responder(|_| Err(TranslationError::Transport("connection refused".to_string())))
    }

    pub fn with_responder<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str) -> TranslationResult<String> + Send + Sync + 'static,
    {
        Arc::new(Self {
            scripted: Mutex::new(VecDeque::new()),
            responder: Some(Box::new(responder)),
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// 批量提示词的调用次数
    pub fn batch_calls(&self) -> usize {
        self.prompts()
            .iter()
            .filter(|p| p.contains("Sentences:\n"))
            .count()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    async fn complete(&self, prompt: &str, _params: &CompletionParams) -> TranslationResult<String> {
        // 让出一次执行权，模拟真实请求的挂起点
        tokio::task::yield_now().await;

        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(reply) = self.scripted.lock().unwrap().pop_front() {
            return reply;
        }
        match &self.responder {
            Some(responder) => responder(prompt),
            None => Err(TranslationError::Transport("no scripted reply left".to_string())),
        }
    }
}

/// 从提示词中取出待翻译的部分并逐段翻译
fn answer(prompt: &str, table: &HashMap<String, String>) -> String {
    let translate = |text: &str| {
        table
            .get(text)
            .cloned()
            .unwrap_or_else(|| format!("번역된 {}", text))
    };

    if let Some(body) = section(prompt, "Sentences:\n") {
        body.split(" ||| ")
            .map(translate)
            .collect::<Vec<_>>()
            .join(" ||| ")
    } else if let Some(body) = section(prompt, "Text:\n") {
        translate(body)
    } else {
        String::new()
    }
}

fn section<'a>(prompt: &'a str, marker: &str) -> Option<&'a str> {
    let start = prompt.find(marker)? + marker.len();
    let end = prompt[start..].find("<end_of_turn>")? + start;
    Some(&prompt[start..end])
}

/// 测试用配置：不等待重试
pub fn fast_config() -> TranslationConfig {
    let mut config = TranslationConfig::default();
    config.retry_delay_ms = 0;
    config
}

pub fn translator(provider: Arc<MockProvider>) -> PageTranslator {
    PageTranslator::new(provider, &fast_config())
}

/// HTML 测试辅助工具
pub struct HtmlTestHelper;

impl HtmlTestHelper {
    /// 创建测试用的 DOM
    pub fn create_test_dom(html: &str) -> RcDom {
        html_to_dom(html.as_bytes(), "utf-8").unwrap()
    }

    /// 创建 DOM 并返回 body；DOM 必须与 body 同生命周期
    pub fn page(html: &str) -> (RcDom, Handle) {
        let dom = Self::create_test_dom(html);
        let body = find_body(&dom).unwrap();
        (dom, body)
    }

    /// 第 `index` 个 `tag` 元素的内部 HTML
    pub fn inner(dom: &RcDom, tag: &str, index: usize) -> String {
        inner_html(&find_nodes(&dom.document, vec![tag])[index])
    }

    pub fn nodes(dom: &RcDom, tag: &str) -> Vec<Handle> {
        find_nodes(&dom.document, vec![tag])
    }

    /// 简单的英文页面
    pub fn create_simple_english_page() -> String {
        r#"<!DOCTYPE html>
<html>
<head><title>Test Page</title></head>
<body>
    <h1>Welcome</h1>
    <p>Hello <b>world</b>!</p>
    <p>Plain paragraph</p>
</body>
</html>"#
            .to_string()
    }

    /// 含导航、脚本、列表、表格和表单的文章页面
    pub fn create_article_page() -> String {
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Article</title>
    <style>p { color: red; }</style>
</head>
<body>
    <nav><ul><li><a href="/">Home</a></li><li><a href="/about">About</a></li></ul></nav>
    <main>
        <article>
            <h2>Release notes</h2>
            <p>Read the <a href="/docs" class="link">documentation</a> before upgrading.</p>
            <blockquote><p>Quoted text</p></blockquote>
            <pre>let x = 1;</pre>
            <table><tr><th>Name</th><td>Value</td></tr></table>
            <p>Choose <select><option>A</option></select> and press <kbd>Enter</kbd>.</p>
        </article>
    </main>
    <script>console.log("untouched");</script>
    <footer>Copyright notice</footer>
</body>
</html>"#
            .to_string()
    }
}
