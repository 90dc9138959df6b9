//! # 剪贴板数据模型
//!
//! ## 设计思路
//!
//! 汇集与操作系统剪贴板交互用到的纯数据类型：
//! - `DropEffect`：粘贴行为提示的位标志与 4 字节小端线格式
//! - `FormatKind` + `classify`：按数值区间的四档分类，纯函数，独立可测
//! - `ClipboardFormatEntry`：诊断枚举的单条快照，可序列化输出
//!
//! 区间依据标准剪贴板格式文档：私有区 0x0200~0x02FF，GDI 对象区 0x0300~0x03FF。

#[cfg(any(target_os = "windows", test))]
use std::collections::HashMap;
use std::fmt;

#[cfg(any(target_os = "windows", test))]
use once_cell::sync::Lazy;
use serde::Serialize;

/// 标准位图槽位（CF_DIB）的格式编号。
#[cfg(any(target_os = "windows", test))]
pub(crate) const CF_DIB_ID: u32 = 8;

/// 动态注册的 PNG 槽位名称。
#[cfg(any(target_os = "windows", test))]
pub(crate) const PNG_FORMAT_NAME: &str = "PNG";
/// 动态注册的粘贴行为提示槽位名称。
#[cfg(any(target_os = "windows", test))]
pub(crate) const DROP_EFFECT_FORMAT_NAME: &str = "Preferred DropEffect";

const PRIVATE_FIRST: u32 = 0x0200;
const PRIVATE_LAST: u32 = 0x02FF;
const GDI_OBJ_FIRST: u32 = 0x0300;
const GDI_OBJ_LAST: u32 = 0x03FF;

/// 系统预定义格式编号 → 名称对照表。
#[cfg(any(target_os = "windows", test))]
pub(crate) static STANDARD_FORMATS: Lazy<HashMap<u32, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (1, "CF_TEXT"),
        (2, "CF_BITMAP"),
        (3, "CF_METAFILEPICT"),
        (4, "CF_SYLK"),
        (5, "CF_DIF"),
        (6, "CF_TIFF"),
        (7, "CF_OEMTEXT"),
        (8, "CF_DIB"),
        (9, "CF_PALETTE"),
        (10, "CF_PENDATA"),
        (11, "CF_RIFF"),
        (12, "CF_WAVE"),
        (13, "CF_UNICODETEXT"),
        (14, "CF_ENHMETAFILE"),
        (15, "CF_HDROP"),
        (16, "CF_LOCALE"),
        (17, "CF_DIBV5"),
        (0x0080, "CF_OWNERDISPLAY"),
        (0x0081, "CF_DSPTEXT"),
        (0x0082, "CF_DSPBITMAP"),
        (0x0083, "CF_DSPMETAFILEPICT"),
        (0x008E, "CF_DSPENHMETAFILE"),
    ])
});

/// 发布协议中的三个格式槽位，用于错误定位与日志。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatSlot {
    /// 标准位图槽（CF_DIB）。
    Dib,
    /// 动态注册的 "PNG" 槽。
    Png,
    /// 动态注册的 "Preferred DropEffect" 槽。
    DropEffect,
}

impl fmt::Display for FormatSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatSlot::Dib => "CF_DIB",
            FormatSlot::Png => "PNG",
            FormatSlot::DropEffect => "Preferred DropEffect",
        };
        f.write_str(name)
    }
}

/// 粘贴行为提示的位标志。
///
/// 线格式为 4 字节小端有符号整数；本工具写入时恒为 `COPY`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropEffect(pub i32);

impl DropEffect {
    pub const NONE: DropEffect = DropEffect(0);
    pub const COPY: DropEffect = DropEffect(1);
    pub const MOVE: DropEffect = DropEffect(2);
    pub const LINK: DropEffect = DropEffect(4);
    pub const SCROLL: DropEffect = DropEffect(0x8000_0000u32 as i32);

    /// 序列化为剪贴板线格式。
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// 从剪贴板线格式还原；长度不足 4 字节时返回 `None`。
    pub fn from_le_bytes(bytes: &[u8]) -> Option<Self> {
        let raw: [u8; 4] = bytes.get(0..4)?.try_into().ok()?;
        Some(DropEffect(i32::from_le_bytes(raw)))
    }

    /// 是否包含指定标志位。
    pub fn contains(self, other: DropEffect) -> bool {
        self.0 & other.0 == other.0
    }
}

/// 格式编号的四档分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FormatKind {
    /// 系统预定义格式。
    Standard,
    /// 应用私有区（0x0200~0x02FF）。
    Private,
    /// GDI 对象区（0x0300~0x03FF）。
    GdiObj,
    /// 运行时注册的自定义格式。
    Custom,
}

/// 按数值区间对格式编号分类。
///
/// `known` 表示编号命中了系统预定义对照表；区间判定只在未命中时进行。
pub fn classify(id: u32, known: bool) -> FormatKind {
    if known {
        FormatKind::Standard
    } else if (GDI_OBJ_FIRST..=GDI_OBJ_LAST).contains(&id) {
        FormatKind::GdiObj
    } else if (PRIVATE_FIRST..=PRIVATE_LAST).contains(&id) {
        FormatKind::Private
    } else {
        FormatKind::Custom
    }
}

/// 单条格式内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatContent {
    /// 原始字节内容。
    Bytes(Vec<u8>),
    /// 已解码的粘贴行为提示。
    DropEffect(DropEffect),
    /// 内容读取失败，枚举继续。
    Unavailable,
}

/// 诊断枚举的单条快照。
///
/// 仅描述调用瞬间的剪贴板状态，从不持久化。
#[derive(Debug, Clone, Serialize)]
pub struct ClipboardFormatEntry {
    /// 格式编号。
    pub id: u32,
    /// 可读名称（预定义表命中、系统注册名或 `0xNNNN` 占位）。
    pub name: String,
    /// 数值区间分类。
    pub kind: FormatKind,
    /// 内容或“不可读”标记。
    pub content: FormatContent,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn classify_hits_standard_table_first() {
        assert_eq!(classify(1, true), FormatKind::Standard);
        assert_eq!(classify(8, true), FormatKind::Standard);
        // 预定义表未命中时，编号本身不再有“标准”待遇
        assert_eq!(classify(1, false), FormatKind::Custom);
    }

    #[test]
    fn classify_band_edges() {
        assert_eq!(classify(0x01FF, false), FormatKind::Custom);
        assert_eq!(classify(0x0200, false), FormatKind::Private);
        assert_eq!(classify(0x02FF, false), FormatKind::Private);
        assert_eq!(classify(0x0300, false), FormatKind::GdiObj);
        assert_eq!(classify(0x03FF, false), FormatKind::GdiObj);
        assert_eq!(classify(0x0400, false), FormatKind::Custom);
        assert_eq!(classify(0xC123, false), FormatKind::Custom);
    }

    #[test]
    fn drop_effect_wire_format_is_little_endian() {
        assert_eq!(DropEffect::COPY.to_le_bytes(), [1, 0, 0, 0]);
        assert_eq!(DropEffect::MOVE.to_le_bytes(), [2, 0, 0, 0]);
        assert_eq!(DropEffect::SCROLL.to_le_bytes(), [0, 0, 0, 0x80]);
    }

    #[test]
    fn drop_effect_rejects_short_payload() {
        assert_eq!(DropEffect::from_le_bytes(&[1, 0]), None);
        assert_eq!(
            DropEffect::from_le_bytes(&[1, 0, 0, 0]),
            Some(DropEffect::COPY)
        );
    }

    #[test]
    fn drop_effect_contains_checks_flag_bits() {
        let combined = DropEffect(DropEffect::COPY.0 | DropEffect::LINK.0);
        assert!(combined.contains(DropEffect::COPY));
        assert!(combined.contains(DropEffect::LINK));
        assert!(!combined.contains(DropEffect::MOVE));
        assert!(DropEffect::NONE.contains(DropEffect::NONE));
    }

    proptest! {
        #[test]
        fn drop_effect_roundtrips_any_value(raw in any::<i32>()) {
            let effect = DropEffect(raw);
            let decoded = DropEffect::from_le_bytes(&effect.to_le_bytes());
            prop_assert_eq!(decoded, Some(effect));
        }

        #[test]
        fn classify_never_returns_standard_without_table_hit(id in any::<u32>()) {
            prop_assert_ne!(classify(id, false), FormatKind::Standard);
        }
    }
}
