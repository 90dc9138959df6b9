//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“收敛链路中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `SourceImage` 表示已解码、待适配的图像与其容器格式提示
//! - `EncodedPayload` 表示一次编码产物（字节 + 容器格式）
//! - `FittedImage` 表示收敛完成、可直接发布的结果

use image::{DynamicImage, ImageFormat};

/// 图片输入来源。
pub enum ImageSource {
    /// 系统剪贴板上的图像数据。
    Clipboard,
    /// 本地文件路径来源。
    FilePath(String),
}

/// 已解码的源图像。
///
/// `format_hint` 记录原始容器格式；缺失时按 PNG 处理。
pub struct SourceImage {
    /// 解码后的图像数据。
    pub image: DynamicImage,
    /// 原始容器格式提示（来自文件字节嗅探；剪贴板来源无提示）。
    pub format_hint: Option<ImageFormat>,
}

impl SourceImage {
    /// 收敛与发布阶段实际使用的编码格式。
    ///
    /// 未知来源统一回退到 PNG。
    pub fn encode_format(&self) -> ImageFormat {
        self.format_hint.unwrap_or(ImageFormat::Png)
    }
}

/// 一次编码的产物。
///
/// 由收敛引擎产出，发布方原样消费，避免二次编码开销。
pub struct EncodedPayload {
    /// 编码使用的容器格式。
    pub format: ImageFormat,
    /// 编码后的完整字节序列。
    pub bytes: Vec<u8>,
}

/// 体积收敛完成的结果。
pub struct FittedImage {
    /// 最终图像（可能与源相同，也可能是缩放产物）。
    pub image: DynamicImage,
    /// 最终图像的编码负载。
    pub payload: EncodedPayload,
    /// 最终使用的缩放比例（未缩放时为 1.0）。
    pub scale: f64,
    /// 收敛过程中执行的编码次数（诊断用）。
    pub attempts: u32,
}
