//! 进度提示
//!
//! 编排器在扫描、逐块翻译和结束时发出面向用户的提示消息，
//! 显示方式由实现决定（日志、终端状态栏等）。

/// 进度提示接口
pub trait ProgressReporter {
    /// 显示一条进行中的消息
    fn show(&self, message: &str);

    /// 显示最终消息并结束提示
    fn done(&self, message: &str);

    /// 立即隐藏提示
    fn hide(&self) {}
}

/// 只写日志的进度提示
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ProgressReporter for LogReporter {
    fn show(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn done(&self, message: &str) {
        tracing::info!("{}", message);
    }
}

/// 百分比进度消息，例如 `翻译中... 2/4 (50%)`
pub fn chunk_progress_message(current: usize, total: usize) -> String {
    let percent = if total == 0 {
        100
    } else {
        (current * 100 + total / 2) / total
    };
    format!("翻译中... {}/{} ({}%)", current, total, percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_progress_message() {
        assert_eq!(chunk_progress_message(1, 4), "翻译中... 1/4 (25%)");
        assert_eq!(chunk_progress_message(2, 3), "翻译中... 2/3 (67%)");
        assert_eq!(chunk_progress_message(3, 3), "翻译中... 3/3 (100%)");
    }
}
