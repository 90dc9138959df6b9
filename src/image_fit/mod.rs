//! # 体积适配模块（image_fit）
//!
//! ## 设计思路
//!
//! 该模块将“来源加载 → 体积收敛 → 结果模型”按职责拆分为多个子模块，
//! 避免单文件膨胀与耦合。
//!
//! - `handler`：编排整条处理流水线
//! - `engine`：体积收敛循环（编码 → 无损优化 → 单调缩放）
//! - `encoder`：容器编码与按比例缩放
//! - `loader`：负责剪贴板/文件加载与安全校验
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 实现思路
//!
//! 对外仅暴露必要类型与入口函数，内部细节保持 `mod` 私有。
//! 调用链：
//!
//! ```text
//! main.rs（参数适配）
//!    ↓
//! handler.rs（配置快照 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 体积/签名校验）
//!    ├─ engine.rs（收敛循环，postcondition: payload ≤ 预算）
//!    │    └─ encoder.rs（编码 + floor 缩放）
//!    └─ crate::clipboard（多格式发布）
//! ```

mod config;
mod encoder;
mod engine;
mod error;
mod handler;
mod loader;
mod source;

pub use config::FitConfig;
pub(crate) use encoder::encode_image;
pub use engine::fit_to_budget;
pub use error::FitError;
pub use handler::ImageFitter;
pub use source::{EncodedPayload, FittedImage, ImageSource, SourceImage};
