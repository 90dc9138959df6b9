//! 剪贴板发布模块
//!
//! # 设计思路
//!
//! 统一管理与操作系统剪贴板交互的核心能力：
//! - **会话**：剪贴板是进程外的全局互斥资源，用能力对象 + RAII 守卫建模，
//!   任何退出路径都保证释放，且无法嵌套
//! - **发布**：同一逻辑图像的多种表示（CF_DIB / PNG / 粘贴行为提示）
//!   在一个独占窗口内整体替换写入
//! - **目录**：只读诊断能力，枚举当前驻留格式并按数值区间分类
//!
//! # 实现思路
//!
//! - 所有编码工作前置到会话之外，独占窗口内只做内存拷贝与系统调用。
//! - Windows 走原生 Win32 接口；其他平台回退 arboard。
//! - 底层能力面（`RawClipboard`）在测试中以内存假件替换，
//!   发布协议的顺序与原子性因此可以离线断言。

mod catalog;
mod error;
mod models;
mod publisher;
#[cfg(any(target_os = "windows", test))]
mod session;

pub use catalog::list_formats;
pub use error::ClipboardError;
pub use models::{
    ClipboardFormatEntry, DropEffect, FormatContent, FormatKind, FormatSlot, classify,
};
pub use publisher::publish;
