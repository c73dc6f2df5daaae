//! 终端状态提示
//!
//! 进程内唯一的状态提示对象，在 stderr 上显示一行带旋转指示的消息。

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::translation::core::ProgressReporter;

/// 状态提示
#[derive(Clone)]
pub struct StatusToast {
    bar: ProgressBar,
}

impl StatusToast {
    /// 创建状态提示；`quiet` 为真时不输出任何内容
    pub fn new(quiet: bool) -> Self {
        if quiet {
            return Self::hidden();
        }

        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(120));

        Self { bar }
    }

    /// 不可见的状态提示
    pub fn hidden() -> Self {
        Self {
            bar: ProgressBar::hidden(),
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }
}

impl ProgressReporter for StatusToast {
    fn show(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    fn done(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    fn hide(&self) {
        self.bar.finish_and_clear();
    }
}
