//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载图片适配链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。

/// 图片适配统一错误类型。
///
/// 该类型会在入口层被上转为 `AppError`，最终呈现给调用方。
#[derive(Debug, thiserror::Error)]
pub enum FitError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("编码失败：{0}")]
    EncodingFailed(String),

    /// 缩放比例下探到下限仍无法满足体积预算。
    ///
    /// 携带最后一次尝试的负载体积与缩放比例，便于诊断。
    #[error("无法收敛到目标体积：最后尝试 {last_size} 字节（scale={last_scale:.2}）")]
    BudgetUnreachable { last_size: u64, last_scale: f64 },

    #[error("剪贴板错误：{0}")]
    Clipboard(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),
}

impl From<FitError> for String {
    /// 兼容部分仍使用字符串错误的调用点。
    fn from(error: FitError) -> Self {
        error.to_string()
    }
}
