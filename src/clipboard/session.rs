//! # 剪贴板会话模块
//!
//! ## 设计思路
//!
//! 操作系统剪贴板是全局共享的互斥资源，必须以“能力对象 + 作用域会话”建模，
//! 而不是散落的全局函数调用：
//! - `RawClipboard`：平台剪贴板的最小能力面，测试中可用内存假件替换
//! - `ClipboardSession`：RAII 守卫，构造即独占打开，`Drop` 保证关闭，
//!   任何退出路径（正常返回 / 提前返回 / 错误）都不会泄漏会话，也无法嵌套
//!
//! ## 错误日志字段约定（Windows）
//!
//! 失败信息统一使用以下可检索字段，便于排障与告警聚合：
//! - `format`: 写入失败的剪贴板格式（如 `PNG`、`CF_DIB`）
//! - `hr`: 原始 HRESULT（十六进制）
//! - `code`: 从 HRESULT 解析出的 Win32 错误码（若可解析）
//! - `hint`: 内置错误语义提示（用于快速定位 Busy/内存/资源问题）

/// 剪贴板底层失败的可重试性分类。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FailureKind {
    Busy,
    Transient,
    Fatal,
}

/// 底层剪贴板操作失败。
#[derive(Debug, Clone)]
pub(crate) struct ClipboardWriteFailure {
    pub(crate) kind: FailureKind,
    pub(crate) message: String,
}

impl ClipboardWriteFailure {
    pub(crate) fn busy(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Busy,
            message: message.into(),
        }
    }

    pub(crate) fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub(crate) fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fatal,
            message: message.into(),
        }
    }

    pub(crate) fn is_retryable(&self) -> bool {
        matches!(self.kind, FailureKind::Busy | FailureKind::Transient)
    }
}

/// 平台剪贴板的最小能力面。
///
/// `register_format` 不依赖已打开的会话（系统层面注册表独立于会话），
/// 其余读写操作必须在 [`ClipboardSession`] 内进行。
pub(crate) trait RawClipboard {
    fn open(&mut self) -> Result<(), ClipboardWriteFailure>;
    fn close(&mut self);
    fn empty(&mut self) -> Result<(), ClipboardWriteFailure>;
    /// 注册命名自定义格式；同名重复注册必须返回相同编号。
    fn register_format(&mut self, name: &str) -> Result<u32, ClipboardWriteFailure>;
    fn set_data(
        &mut self,
        format_id: u32,
        format_name: &str,
        bytes: &[u8],
    ) -> Result<(), ClipboardWriteFailure>;
    /// 返回 `after` 之后的下一个格式编号；0 表示枚举结束。
    fn next_format(&mut self, after: u32) -> u32;
    fn format_name(&mut self, id: u32) -> Option<String>;
    fn read_data(&mut self, id: u32) -> Option<Vec<u8>>;
}

/// 独占剪贴板会话的 RAII 守卫。
///
/// 生命周期内独占借用底层能力对象，语言层面排除了嵌套会话。
pub(crate) struct ClipboardSession<'a> {
    raw: &'a mut dyn RawClipboard,
}

impl<'a> ClipboardSession<'a> {
    /// 打开独占会话；失败时不产生守卫，无需清理。
    pub(crate) fn open(raw: &'a mut dyn RawClipboard) -> Result<Self, ClipboardWriteFailure> {
        raw.open()?;
        Ok(Self { raw })
    }

    /// 无条件清空现有内容（整体替换语义）。
    pub(crate) fn empty(&mut self) -> Result<(), ClipboardWriteFailure> {
        self.raw.empty()
    }

    pub(crate) fn set_data(
        &mut self,
        format_id: u32,
        format_name: &str,
        bytes: &[u8],
    ) -> Result<(), ClipboardWriteFailure> {
        self.raw.set_data(format_id, format_name, bytes)
    }

    pub(crate) fn next_format(&mut self, after: u32) -> u32 {
        self.raw.next_format(after)
    }

    pub(crate) fn format_name(&mut self, id: u32) -> Option<String> {
        self.raw.format_name(id)
    }

    pub(crate) fn read_data(&mut self, id: u32) -> Option<Vec<u8>> {
        self.raw.read_data(id)
    }
}

impl Drop for ClipboardSession<'_> {
    fn drop(&mut self) {
        self.raw.close();
    }
}

pub(crate) fn hresult_to_win32_code(hr: i32) -> Option<u32> {
    let value = hr as u32;
    if (value & 0xFFFF_0000) == 0x8007_0000 {
        Some(value & 0xFFFF)
    } else {
        None
    }
}

pub(crate) fn format_win32_error_message(
    operation: &str,
    format_name: &str,
    hr: i32,
    detail: &str,
) -> String {
    let code = hresult_to_win32_code(hr);
    let code_str = code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let hint = win32_error_hint(code);
    format!(
        "{}失败: format={} hr=0x{:08X} code={} hint={} detail={}",
        operation, format_name, hr as u32, code_str, hint, detail
    )
}

fn win32_error_hint(code: Option<u32>) -> &'static str {
    #[cfg(target_os = "windows")]
    {
        use windows::Win32::Foundation::{
            ERROR_ACCESS_DENIED, ERROR_BUSY, ERROR_CLIPBOARD_NOT_OPEN, ERROR_NOT_ENOUGH_MEMORY,
            ERROR_NOT_ENOUGH_QUOTA, ERROR_NO_SYSTEM_RESOURCES, ERROR_OUTOFMEMORY,
        };

        match code {
            Some(c) if c == ERROR_ACCESS_DENIED.0 => "剪贴板被其他进程占用或权限不足",
            Some(c) if c == ERROR_CLIPBOARD_NOT_OPEN.0 => "剪贴板句柄未打开或已失效",
            Some(c) if c == ERROR_BUSY.0 => "系统忙，资源暂不可用",
            Some(c) if c == ERROR_NOT_ENOUGH_MEMORY.0 => "内存不足",
            Some(c) if c == ERROR_OUTOFMEMORY.0 => "系统报告内存耗尽",
            Some(c) if c == ERROR_NO_SYSTEM_RESOURCES.0 => "系统资源不足",
            Some(c) if c == ERROR_NOT_ENOUGH_QUOTA.0 => "进程配额不足",
            Some(_) => "未分类 Win32 错误",
            None => "无法从 HRESULT 解析 Win32 错误码",
        }
    }

    #[cfg(not(target_os = "windows"))]
    {
        match code {
            Some(_) => "未分类 Win32 错误",
            None => "无法从 HRESULT 解析 Win32 错误码",
        }
    }
}

// ============================================================================
// Windows 原生实现
// ============================================================================

#[cfg(target_os = "windows")]
pub(crate) mod win32 {
    use super::*;
    use std::ptr::copy_nonoverlapping;
    use windows::Win32::Foundation::{
        GlobalFree, HANDLE, HGLOBAL, ERROR_ACCESS_DENIED, ERROR_BUSY, ERROR_CLIPBOARD_NOT_OPEN,
        ERROR_NOT_ENOUGH_MEMORY, ERROR_NOT_ENOUGH_QUOTA, ERROR_NO_SYSTEM_RESOURCES,
        ERROR_OUTOFMEMORY,
    };
    use windows::Win32::System::DataExchange::{
        CloseClipboard, EmptyClipboard, EnumClipboardFormats, GetClipboardData,
        GetClipboardFormatNameW, OpenClipboard, RegisterClipboardFormatW, SetClipboardData,
    };
    use windows::Win32::System::Memory::{
        GlobalAlloc, GlobalLock, GlobalSize, GlobalUnlock, GMEM_MOVEABLE,
    };

    /// Win32 剪贴板能力对象。
    ///
    /// 所有重量级准备工作都应在打开会话之前完成，
    /// 使 Open→Empty→Set→Close 窗口尽可能短。
    pub(crate) struct Win32Clipboard;

    impl Win32Clipboard {
        pub(crate) fn new() -> Self {
            Self
        }
    }

    impl RawClipboard for Win32Clipboard {
        fn open(&mut self) -> Result<(), ClipboardWriteFailure> {
            unsafe {
                OpenClipboard(None).map_err(|e| classify_win32_error("打开剪贴板", "N/A", &e))
            }
        }

        fn close(&mut self) {
            unsafe {
                let _ = CloseClipboard();
            }
        }

        fn empty(&mut self) -> Result<(), ClipboardWriteFailure> {
            unsafe { EmptyClipboard().map_err(|e| classify_win32_error("清空剪贴板", "N/A", &e)) }
        }

        fn register_format(&mut self, name: &str) -> Result<u32, ClipboardWriteFailure> {
            let wide: Vec<u16> = name.encode_utf16().chain(std::iter::once(0)).collect();
            let format_id =
                unsafe { RegisterClipboardFormatW(windows::core::PCWSTR(wide.as_ptr())) };
            if format_id == 0 {
                return Err(ClipboardWriteFailure::fatal(format!(
                    "注册格式 '{}' 失败",
                    name
                )));
            }
            Ok(format_id)
        }

        fn set_data(
            &mut self,
            format_id: u32,
            format_name: &str,
            bytes: &[u8],
        ) -> Result<(), ClipboardWriteFailure> {
            unsafe {
                let hglobal = GlobalAlloc(GMEM_MOVEABLE, bytes.len())
                    .map_err(|e| classify_win32_error("GlobalAlloc", format_name, &e))?;

                let ptr = GlobalLock(hglobal) as *mut u8;
                if ptr.is_null() {
                    let _ = GlobalFree(Some(hglobal));
                    return Err(ClipboardWriteFailure::transient(
                        "GlobalLock 返回空指针".to_string(),
                    ));
                }

                copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
                let _ = GlobalUnlock(hglobal);

                if let Err(e) = SetClipboardData(format_id, Some(HANDLE(hglobal.0))) {
                    let _ = GlobalFree(Some(hglobal));
                    return Err(classify_win32_error("SetClipboardData", format_name, &e));
                }
            }

            Ok(())
        }

        fn next_format(&mut self, after: u32) -> u32 {
            unsafe { EnumClipboardFormats(after) }
        }

        fn format_name(&mut self, id: u32) -> Option<String> {
            let mut buf = [0u16; 256];
            let len = unsafe { GetClipboardFormatNameW(id, &mut buf) };
            if len <= 0 {
                return None;
            }
            Some(String::from_utf16_lossy(&buf[..len as usize]))
        }

        fn read_data(&mut self, id: u32) -> Option<Vec<u8>> {
            unsafe {
                let handle = GetClipboardData(id).ok()?;
                let hglobal = HGLOBAL(handle.0);
                // 非 HGLOBAL 承载的格式（如 CF_BITMAP 的 HBITMAP）拿不到尺寸，按不可读处理
                let size = GlobalSize(hglobal);
                if size == 0 {
                    return None;
                }

                let ptr = GlobalLock(hglobal) as *const u8;
                if ptr.is_null() {
                    return None;
                }
                let bytes = std::slice::from_raw_parts(ptr, size).to_vec();
                let _ = GlobalUnlock(hglobal);
                // 句柄归剪贴板所有，不做释放
                Some(bytes)
            }
        }
    }

    pub(super) fn classify_win32_error(
        operation: &str,
        format_name: &str,
        err: &windows::core::Error,
    ) -> ClipboardWriteFailure {
        let code = hresult_to_win32_code(err.code().0);
        let message =
            format_win32_error_message(operation, format_name, err.code().0, &format!("{:?}", err));

        match code {
            Some(c)
                if c == ERROR_ACCESS_DENIED.0
                    || c == ERROR_CLIPBOARD_NOT_OPEN.0
                    || c == ERROR_BUSY.0 =>
            {
                ClipboardWriteFailure::busy(message)
            }
            Some(c)
                if c == ERROR_NOT_ENOUGH_MEMORY.0
                    || c == ERROR_OUTOFMEMORY.0
                    || c == ERROR_NO_SYSTEM_RESOURCES.0
                    || c == ERROR_NOT_ENOUGH_QUOTA.0 =>
            {
                ClipboardWriteFailure::transient(message)
            }
            _ => ClipboardWriteFailure::fatal(message),
        }
    }
}

// ============================================================================
// 测试假件 — 记录操作序列的内存剪贴板
// ============================================================================

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::{HashMap, HashSet};

    /// 假件记录的单步操作。
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum MockOp {
        Register(String),
        Open,
        Empty,
        Set { id: u32, len: usize },
        Close,
    }

    /// 内存剪贴板假件。
    ///
    /// 记录完整操作序列供断言；可注入打开失败次数与指定槽位的写入/读取失败。
    pub(crate) struct MockClipboard {
        pub(crate) ops: Vec<MockOp>,
        registered: HashMap<String, u32>,
        next_custom_id: u32,
        /// 按写入顺序保存的 (格式编号, 内容)，同时驱动枚举顺序。
        pub(crate) store: Vec<(u32, Vec<u8>)>,
        names: HashMap<u32, String>,
        unreadable: HashSet<u32>,
        fail_open_times: u32,
        fail_set_ids: HashSet<u32>,
    }

    impl MockClipboard {
        pub(crate) fn new() -> Self {
            Self {
                ops: Vec::new(),
                registered: HashMap::new(),
                next_custom_id: 0xC000,
                store: Vec::new(),
                names: HashMap::new(),
                unreadable: HashSet::new(),
                fail_open_times: 0,
                fail_set_ids: HashSet::new(),
            }
        }

        /// 预置一条剪贴板内容（模拟枚举前已有数据）。
        pub(crate) fn seed(&mut self, id: u32, name: Option<&str>, bytes: Option<Vec<u8>>) {
            if let Some(name) = name {
                self.names.insert(id, name.to_string());
                self.registered.insert(name.to_string(), id);
                self.next_custom_id = self.next_custom_id.max(id + 1);
            }
            match bytes {
                Some(bytes) => self.store.push((id, bytes)),
                None => {
                    self.unreadable.insert(id);
                    self.store.push((id, Vec::new()));
                }
            }
        }

        /// 注入前 `times` 次 `open` 调用失败（Busy）。
        pub(crate) fn fail_open(&mut self, times: u32) {
            self.fail_open_times = times;
        }

        /// 注入指定格式编号的写入失败（Fatal）。
        pub(crate) fn fail_set(&mut self, id: u32) {
            self.fail_set_ids.insert(id);
        }

        pub(crate) fn registered_id(&self, name: &str) -> Option<u32> {
            self.registered.get(name).copied()
        }
    }

    impl RawClipboard for MockClipboard {
        fn open(&mut self) -> Result<(), ClipboardWriteFailure> {
            if self.fail_open_times > 0 {
                self.fail_open_times -= 1;
                return Err(ClipboardWriteFailure::busy("mock: clipboard busy"));
            }
            self.ops.push(MockOp::Open);
            Ok(())
        }

        fn close(&mut self) {
            self.ops.push(MockOp::Close);
        }

        fn empty(&mut self) -> Result<(), ClipboardWriteFailure> {
            self.store.clear();
            self.ops.push(MockOp::Empty);
            Ok(())
        }

        fn register_format(&mut self, name: &str) -> Result<u32, ClipboardWriteFailure> {
            self.ops.push(MockOp::Register(name.to_string()));
            if let Some(existing) = self.registered.get(name) {
                return Ok(*existing);
            }
            let id = self.next_custom_id;
            self.next_custom_id += 1;
            self.registered.insert(name.to_string(), id);
            self.names.insert(id, name.to_string());
            Ok(id)
        }

        fn set_data(
            &mut self,
            format_id: u32,
            format_name: &str,
            bytes: &[u8],
        ) -> Result<(), ClipboardWriteFailure> {
            if self.fail_set_ids.contains(&format_id) {
                return Err(ClipboardWriteFailure::fatal(format!(
                    "mock: set_data 注入失败 format={}",
                    format_name
                )));
            }
            self.store.push((format_id, bytes.to_vec()));
            self.ops.push(MockOp::Set {
                id: format_id,
                len: bytes.len(),
            });
            Ok(())
        }

        fn next_format(&mut self, after: u32) -> u32 {
            if after == 0 {
                return self.store.first().map(|(id, _)| *id).unwrap_or(0);
            }
            let pos = self.store.iter().position(|(id, _)| *id == after);
            match pos {
                Some(index) => self
                    .store
                    .get(index + 1)
                    .map(|(id, _)| *id)
                    .unwrap_or(0),
                None => 0,
            }
        }

        fn format_name(&mut self, id: u32) -> Option<String> {
            self.names.get(&id).cloned()
        }

        fn read_data(&mut self, id: u32) -> Option<Vec<u8>> {
            if self.unreadable.contains(&id) {
                return None;
            }
            self.store
                .iter()
                .find(|(stored_id, _)| *stored_id == id)
                .map(|(_, bytes)| bytes.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::{MockClipboard, MockOp};
    use super::*;

    #[test]
    fn hresult_to_win32_code_extracts_mapped_code() {
        let hr = 0x8007_058A_u32 as i32;
        assert_eq!(hresult_to_win32_code(hr), Some(1418));
        assert_eq!(hresult_to_win32_code(0x8000_4005_u32 as i32), None);
    }

    #[test]
    fn win32_error_message_contains_format_and_hint() {
        let message = format_win32_error_message(
            "SetClipboardData",
            "PNG",
            0x8007_058A_u32 as i32,
            "mock_detail",
        );

        assert!(message.contains("format=PNG"));
        assert!(message.contains("hint="));
        assert!(message.contains("code=1418"));
    }

    #[test]
    fn busy_and_transient_failures_are_retryable() {
        assert!(ClipboardWriteFailure::busy("x").is_retryable());
        assert!(ClipboardWriteFailure::transient("x").is_retryable());
        assert!(!ClipboardWriteFailure::fatal("x").is_retryable());
    }

    #[test]
    fn session_guard_closes_on_drop() {
        let mut raw = MockClipboard::new();
        {
            let _session = ClipboardSession::open(&mut raw).expect("open should succeed");
        }
        assert_eq!(raw.ops, vec![MockOp::Open, MockOp::Close]);
    }

    #[test]
    fn failed_open_produces_no_guard_and_no_close() {
        let mut raw = MockClipboard::new();
        raw.fail_open(1);

        assert!(ClipboardSession::open(&mut raw).is_err());
        assert!(raw.ops.is_empty());
    }

    #[test]
    fn mock_register_is_idempotent() {
        let mut raw = MockClipboard::new();
        let first = raw.register_format("PNG").expect("register failed");
        let second = raw.register_format("PNG").expect("register failed");
        let other = raw.register_format("Preferred DropEffect").expect("register failed");

        assert_eq!(first, second);
        assert_ne!(first, other);
    }
}
