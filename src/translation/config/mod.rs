//! 翻译配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, TranslationConfig};

/// 配置常量
pub mod constants {
    // 补全接口
    pub const DEFAULT_ENDPOINT: &str = "http://localhost:1234";
    pub const DEFAULT_COMPLETIONS_PATH: &str = "/api/v0/completions";
    pub const DEFAULT_MODEL: &str = "translategemma-4b-it";
    pub const DEFAULT_TEMPERATURE: f32 = 0.1;
    pub const DEFAULT_SINGLE_MAX_TOKENS: u32 = 2048;
    pub const DEFAULT_BATCH_MAX_TOKENS: u32 = 4096;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

    pub const SINGLE_STOP_SEQUENCES: &[&str] = &["<end_of_turn>", "Text:", "Note:", "Explanation:"];
    pub const BATCH_STOP_SEQUENCES: &[&str] =
        &["<end_of_turn>", "Sentences:", "Note:", "Explanation:"];

    // 批量翻译分隔符
    pub const BATCH_DELIMITER: &str = " ||| ";

    // 语言
    pub const DEFAULT_SOURCE_LANG: &str = "en";
    pub const DEFAULT_TARGET_LANG: &str = "ko";

    // 分块
    pub const DEFAULT_CHUNK_MAX_CHARS: usize = 800;
    pub const DEFAULT_CHUNK_MAX_ITEMS: usize = 3;

    // 译文校验
    pub const DEFAULT_MIN_TARGET_RATIO: f32 = 0.3;
    pub const DEFAULT_UNCHANGED_MIN_LEN: usize = 30;
    pub const DEFAULT_UNCHANGED_SIMILARITY: f32 = 0.9;

    // 重试
    pub const DEFAULT_BATCH_RETRY_BUDGET: usize = 1;
    pub const DEFAULT_SINGLE_RETRY_BUDGET: usize = 3;
    pub const DEFAULT_RETRY_DELAY_MS: u64 = 500;

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "pagelingo.toml",
        ".pagelingo.toml",
        "~/.config/pagelingo/config.toml",
        "/etc/pagelingo/config.toml",
    ];
}

