//! # 格式目录模块（诊断读路径）
//!
//! ## 设计思路
//!
//! 枚举剪贴板当前驻留的全部格式，生成一份点时快照用于观测与排障。
//! 该路径是只读诊断能力，不是发布链路的依赖。
//!
//! ## 实现思路
//!
//! - 一个独占会话内完成整轮枚举：从 0 开始反复请求“下一个格式”，
//!   返回 0 即结束。
//! - 名称解析：预定义表命中优先，否则向系统查询注册名，
//!   都拿不到时用 `0xNNNN` 占位。
//! - 单条内容读取失败只记录“不可读”标记，不中断整轮枚举。
//! - 名称命中 "Preferred DropEffect"（忽略大小写）时将内容解码为位标志。

use super::error::ClipboardError;
use super::models::ClipboardFormatEntry;

/// 枚举剪贴板当前驻留的全部格式。
///
/// # 示例
/// ```rust,no_run
/// use clipboard_resize::clipboard;
///
/// for entry in clipboard::list_formats()? {
///     println!("{} ({}) -> {:?}", entry.name, entry.id, entry.kind);
/// }
/// # Ok::<(), clipboard_resize::clipboard::ClipboardError>(())
/// ```
pub fn list_formats() -> Result<Vec<ClipboardFormatEntry>, ClipboardError> {
    #[cfg(target_os = "windows")]
    {
        let mut raw = super::session::win32::Win32Clipboard::new();
        snapshot_with(&mut raw)
    }

    #[cfg(not(target_os = "windows"))]
    {
        Err(ClipboardError::Unsupported(
            "格式枚举需要 Windows 剪贴板接口".to_string(),
        ))
    }
}

#[cfg(any(target_os = "windows", test))]
pub(crate) fn snapshot_with(
    raw: &mut dyn super::session::RawClipboard,
) -> Result<Vec<ClipboardFormatEntry>, ClipboardError> {
    use super::models::{
        DROP_EFFECT_FORMAT_NAME, DropEffect, FormatContent, STANDARD_FORMATS, classify,
    };
    use super::session::ClipboardSession;

    let mut session = ClipboardSession::open(raw)
        .map_err(|f| ClipboardError::SessionUnavailable(f.message))?;

    let mut entries = Vec::new();
    let mut id = 0u32;

    loop {
        id = session.next_format(id);
        if id == 0 {
            break;
        }

        let (name, known) = match STANDARD_FORMATS.get(&id) {
            Some(table_name) => ((*table_name).to_string(), true),
            None => (
                session
                    .format_name(id)
                    .unwrap_or_else(|| format!("0x{:04X}", id)),
                false,
            ),
        };
        let kind = classify(id, known);

        let content = match session.read_data(id) {
            Some(bytes) if name.eq_ignore_ascii_case(DROP_EFFECT_FORMAT_NAME) => {
                match DropEffect::from_le_bytes(&bytes) {
                    Some(effect) => FormatContent::DropEffect(effect),
                    // 线格式不足 4 字节时保留原始内容
                    None => FormatContent::Bytes(bytes),
                }
            }
            Some(bytes) => FormatContent::Bytes(bytes),
            None => {
                log::warn!("⚠️ 无法读取格式 {} ({}) 的内容", name, id);
                FormatContent::Unavailable
            }
        };

        entries.push(ClipboardFormatEntry {
            id,
            name,
            kind,
            content,
        });
    }

    log::debug!("🔍 枚举到 {} 个剪贴板格式", entries.len());
    Ok(entries)
}
