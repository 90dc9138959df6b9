//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，替代各模块中分散的
//! `.map_err(|e| e.to_string())`、`format!(...)` 等不一致模式。
//!
//! 顶层入口统一返回 `Result<T, AppError>`，调用方收到一致的错误形态，
//! 每次顶层操作最多呈现一条终态失败，不暴露部分成功状态。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `FitError` / `ClipboardError` 提供 `From` 转换，无需手动 map。

use crate::clipboard::ClipboardError;
use crate::image_fit::FitError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 图片适配链路错误（加载 / 解码 / 收敛）
    #[error("{0}")]
    Fit(#[from] FitError),

    /// 剪贴板发布或枚举失败
    #[error("{0}")]
    Clipboard(#[from] ClipboardError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// 该错误是否值得调用方稍后重试。
    ///
    /// 目前只有“剪贴板会话被占用”属于可重试场景。
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AppError::Clipboard(ClipboardError::SessionUnavailable(_))
        )
    }
}
