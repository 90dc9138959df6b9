//! # 剪贴板图片体积适配工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     main.rs (CLI)                        │
//! │        参数解析 · env_logger 初始化 · 结果呈现            │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕              库 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  │                                                       │
//! │  ├─ image_fit ── 体积收敛引擎                             │
//! │  │   ├─ loader   剪贴板/文件来源加载 + 校验               │
//! │  │   ├─ engine   编码 → 无损优化 → 单调缩放循环           │
//! │  │   └─ encoder  容器编码 / floor 缩放                    │
//! │  │                                                       │
//! │  └─ clipboard ── 多格式发布 + 诊断目录                    │
//! │      ├─ session   能力对象 + RAII 独占会话                │
//! │      ├─ publisher CF_DIB / PNG / DropEffect 整体写入      │
//! │      └─ catalog   格式枚举（只读诊断）                    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，顶层入口的返回类型 |
//! | [`image_fit`] | 将图像收敛到体积预算内：编码、无损优化、缩放循环 |
//! | [`clipboard`] | 独占会话、多格式整体发布、格式目录诊断 |

pub mod clipboard;
pub mod error;
pub mod image_fit;
