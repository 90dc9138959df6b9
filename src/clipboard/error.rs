//! # 剪贴板错误模型
//!
//! ## 设计思路
//!
//! 按“调用方能否重试”划分错误分支：
//! - `SessionUnavailable`：独占会话未能获取，调用方可稍后重试
//! - 其余分支均为本次调用的致命错误：任一槽位失败即中止整次发布并释放
//!   会话，API 层面不存在部分成功的返回值

use super::models::FormatSlot;

/// 剪贴板发布与枚举的统一错误类型。
#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    /// 独占会话获取失败（被其他进程占用），可重试。
    #[error("剪贴板会话不可用：{0}")]
    SessionUnavailable(String),

    /// 某一格式槽位写入失败，整次发布已中止。
    #[error("格式 {slot} 写入失败：{message}")]
    PublishFailed { slot: FormatSlot, message: String },

    /// 自定义格式注册失败。
    #[error("注册剪贴板格式 '{0}' 失败")]
    RegisterFormat(String),

    /// 发布前的负载编码失败。
    #[error("负载编码失败：{0}")]
    Encode(#[from] crate::image_fit::FitError),

    /// 当前平台不支持该操作。
    #[error("当前平台不支持该操作：{0}")]
    Unsupported(String),
}
