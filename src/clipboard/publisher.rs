//! # 多格式发布模块
//!
//! ## 设计思路
//!
//! 把同一逻辑图像的三种表示作为一次整体替换写入剪贴板：
//! - `CF_DIB`：位图容器去掉前 14 字节文件头后的剩余部分（标准位图槽）
//! - `PNG`（动态注册）：完整 PNG 字节，保留 DIB 槽位无法承载的透明通道
//! - `Preferred DropEffect`（动态注册）：4 字节小端 COPY 标志，
//!   告知粘贴目标“按复制处理，而非剪切/移动”
//!
//! ## 实现思路
//!
//! 所有编码与缓冲准备都在打开剪贴板之前完成，使 Open→Empty→Set→Close
//! 窗口尽可能短；窗口内任一槽位失败都会中止整次发布（部分写入会留下
//! 不一致的剪贴板状态），会话由 RAII 守卫保证释放。对 Busy/瞬时失败
//! 执行有限重试（指数退避 + 抖动 + 总预算），最终失败按可重试性上浮。
//!
//! 非 Windows 平台回退到 arboard。

use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::image_fit::{EncodedPayload, FitConfig, FitError, encode_image};

use super::error::ClipboardError;
use super::models::DropEffect;

const BMP_FILE_HEADER_LEN: usize = 14;

/// 预备好的发布缓冲区（所有编码工作已在此完成）。
pub(crate) struct PreparedFormats {
    /// CF_DIB 槽字节 = BMP 容器去掉 14 字节文件头。
    pub(crate) dib_bytes: Vec<u8>,
    /// 完整 PNG 字节。
    pub(crate) png_bytes: Vec<u8>,
    /// 粘贴行为提示，恒为 COPY 的小端编码。
    pub(crate) drop_effect_bytes: [u8; 4],
}

/// 去掉 BMP 容器开头的 14 字节文件头。
///
/// 剪贴板的位图槽期望从 BITMAPINFOHEADER 开始的数据。
pub(crate) fn strip_bmp_file_header(bytes: &[u8]) -> Result<Vec<u8>, FitError> {
    if bytes.len() <= BMP_FILE_HEADER_LEN || &bytes[0..2] != b"BM" {
        return Err(FitError::EncodingFailed(
            "BMP 容器缺少有效文件头".to_string(),
        ));
    }
    Ok(bytes[BMP_FILE_HEADER_LEN..].to_vec())
}

/// 在**不持有剪贴板的前提下**准备全部槽位缓冲。
///
/// 收敛引擎已产出的负载按格式原样复用，不再二次编码。
pub(crate) fn prepare_formats(
    image: &DynamicImage,
    precomputed: Option<&EncodedPayload>,
) -> Result<PreparedFormats, FitError> {
    let bmp_bytes = match precomputed.filter(|p| p.format == ImageFormat::Bmp) {
        Some(payload) => payload.bytes.clone(),
        None => encode_image(image, ImageFormat::Bmp, false)?,
    };
    let dib_bytes = strip_bmp_file_header(&bmp_bytes)?;

    let png_bytes = match precomputed.filter(|p| p.format == ImageFormat::Png) {
        Some(payload) => payload.bytes.clone(),
        None => encode_image(image, ImageFormat::Png, false)?,
    };

    Ok(PreparedFormats {
        dib_bytes,
        png_bytes,
        drop_effect_bytes: DropEffect::COPY.to_le_bytes(),
    })
}

/// 将图像的多种表示整体发布到系统剪贴板。
///
/// `precomputed` 为收敛引擎已产出的负载，匹配槽位时原样复用。
///
/// # 示例
/// ```rust,no_run
/// use clipboard_resize::clipboard;
/// use clipboard_resize::image_fit::FitConfig;
/// use image::DynamicImage;
///
/// let image = DynamicImage::new_rgba8(16, 16);
/// clipboard::publish(&image, None, &FitConfig::default())?;
/// # Ok::<(), clipboard_resize::clipboard::ClipboardError>(())
/// ```
pub fn publish(
    image: &DynamicImage,
    precomputed: Option<&EncodedPayload>,
    config: &FitConfig,
) -> Result<(), ClipboardError> {
    log::debug!(
        "📋 准备发布到剪贴板 - {}x{}",
        image.width(),
        image.height()
    );

    // ── 预编码阶段（不持有剪贴板）──
    let prepared = prepare_formats(image, precomputed)?;

    // ── 写入阶段 + 重试 ──
    #[cfg(target_os = "windows")]
    {
        let mut raw = super::session::win32::Win32Clipboard::new();
        native::publish_with_retry(&mut raw, &prepared, config)
    }

    #[cfg(not(target_os = "windows"))]
    {
        fallback::publish_via_arboard(image, &prepared, config)
    }
}

// ============================================================================
// 原生多格式写入 + 重试 — 所有重量级编码已前置于剪贴板锁之外
// ============================================================================

#[cfg(any(target_os = "windows", test))]
mod native {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    use super::super::models::{CF_DIB_ID, DROP_EFFECT_FORMAT_NAME, FormatSlot, PNG_FORMAT_NAME};
    use super::super::session::{
        ClipboardSession, ClipboardWriteFailure, FailureKind, RawClipboard,
    };
    use super::{ClipboardError, FitConfig, PreparedFormats};

    static JITTER_STATE: AtomicU64 = AtomicU64::new(0);

    fn seed_jitter_state() -> u64 {
        let time_seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        let mut state = time_seed ^ ((std::process::id() as u64) << 32) ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA5A5_5A5A_0123_4567;
        }
        state
    }

    fn next_jitter_u64() -> u64 {
        let mut current = JITTER_STATE.load(Ordering::Relaxed);

        loop {
            let seeded = if current == 0 {
                seed_jitter_state()
            } else {
                current
            };

            let mut next = seeded;
            next ^= next << 13;
            next ^= next >> 7;
            next ^= next << 17;

            match JITTER_STATE.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(observed) => current = observed,
            }
        }
    }

    pub(super) fn compute_backoff_delay_with_jitter(
        base_delay_ms: u64,
        attempt: u32,
        max_delay_ms: u64,
    ) -> u64 {
        let exp = base_delay_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(8));
        let capped = exp.min(max_delay_ms.max(base_delay_ms));
        let jitter_bound = (capped / 3).max(1);
        let jitter = next_jitter_u64() % (jitter_bound + 1);
        capped.saturating_add(jitter)
    }

    pub(super) fn would_exceed_retry_budget(elapsed_ms: u64, wait_ms: u64, budget_ms: u64) -> bool {
        elapsed_ms.saturating_add(wait_ms) > budget_ms
    }

    /// 单次发布尝试中的失败位置。
    enum AttemptError {
        Register(String, ClipboardWriteFailure),
        Session(ClipboardWriteFailure),
        Slot(FormatSlot, ClipboardWriteFailure),
    }

    impl AttemptError {
        fn failure(&self) -> &ClipboardWriteFailure {
            match self {
                AttemptError::Register(_, f)
                | AttemptError::Session(f)
                | AttemptError::Slot(_, f) => f,
            }
        }
    }

    /// 极速写入：Register→Open→Empty→Set×3→Close。
    ///
    /// 此函数内不做任何编码/转换，只做内存拷贝与底层调用；
    /// 注册不依赖会话，放在打开之前以进一步缩短独占窗口。
    fn write_all_formats(
        raw: &mut dyn RawClipboard,
        prepared: &PreparedFormats,
    ) -> Result<(), AttemptError> {
        let png_id = raw
            .register_format(PNG_FORMAT_NAME)
            .map_err(|f| AttemptError::Register(PNG_FORMAT_NAME.to_string(), f))?;
        let effect_id = raw
            .register_format(DROP_EFFECT_FORMAT_NAME)
            .map_err(|f| AttemptError::Register(DROP_EFFECT_FORMAT_NAME.to_string(), f))?;

        let mut session = ClipboardSession::open(raw).map_err(AttemptError::Session)?;
        session.empty().map_err(AttemptError::Session)?;

        session
            .set_data(CF_DIB_ID, "CF_DIB", &prepared.dib_bytes)
            .map_err(|f| AttemptError::Slot(FormatSlot::Dib, f))?;
        session
            .set_data(png_id, PNG_FORMAT_NAME, &prepared.png_bytes)
            .map_err(|f| AttemptError::Slot(FormatSlot::Png, f))?;
        session
            .set_data(
                effect_id,
                DROP_EFFECT_FORMAT_NAME,
                &prepared.drop_effect_bytes,
            )
            .map_err(|f| AttemptError::Slot(FormatSlot::DropEffect, f))?;

        Ok(())
    }

    /// 带重试的发布执行体。
    pub(super) fn publish_with_retry(
        raw: &mut dyn RawClipboard,
        prepared: &PreparedFormats,
        config: &FitConfig,
    ) -> Result<(), ClipboardError> {
        let retry_count = config.clipboard_retries.max(1);
        let started = Instant::now();
        let mut last_error: Option<AttemptError> = None;

        for attempt in 1..=retry_count {
            if attempt > 1 {
                let elapsed_ms = started.elapsed().as_millis() as u64;
                if elapsed_ms >= config.clipboard_retry_max_total_ms {
                    log::warn!(
                        "⏱️ 剪贴板发布重试预算耗尽（{}ms >= {}ms）",
                        elapsed_ms,
                        config.clipboard_retry_max_total_ms
                    );
                    break;
                }

                let wait_ms = compute_backoff_delay_with_jitter(
                    config.clipboard_retry_delay.max(1),
                    attempt - 1,
                    config.clipboard_retry_max_delay_ms,
                );

                if would_exceed_retry_budget(
                    elapsed_ms,
                    wait_ms,
                    config.clipboard_retry_max_total_ms,
                ) {
                    log::warn!(
                        "⏱️ 跳过第 {} 次重试：等待 {}ms 会超过预算 {}ms",
                        attempt,
                        wait_ms,
                        config.clipboard_retry_max_total_ms
                    );
                    break;
                }

                log::debug!(
                    "🔄 重试 {}/{}，等待 {}ms（指数退避+抖动）",
                    attempt,
                    retry_count,
                    wait_ms
                );
                std::thread::sleep(Duration::from_millis(wait_ms));
            }

            match write_all_formats(raw, prepared) {
                Ok(()) => {
                    log::info!("✅ 发布成功 (尝试 {})", attempt);
                    return Ok(());
                }
                Err(error) => {
                    let retryable = error.failure().is_retryable();
                    log::warn!(
                        "❌ 尝试 {} 失败: {}（kind={:?}, retryable={}）",
                        attempt,
                        error.failure().message,
                        error.failure().kind,
                        retryable
                    );
                    let stop = !retryable || attempt >= retry_count;
                    last_error = Some(error);

                    if stop {
                        break;
                    }
                }
            }
        }

        let error = last_error.map_or_else(
            || ClipboardError::SessionUnavailable("未知错误".to_string()),
            |error| match error {
                AttemptError::Register(name, _) => ClipboardError::RegisterFormat(name),
                AttemptError::Session(f) => ClipboardError::SessionUnavailable(f.message),
                AttemptError::Slot(_, f) if f.kind == FailureKind::Busy => {
                    ClipboardError::SessionUnavailable(f.message)
                }
                AttemptError::Slot(slot, f) => ClipboardError::PublishFailed {
                    slot,
                    message: f.message,
                },
            },
        );
        Err(error)
    }
}

// ============================================================================
// 非 Windows 回退方案 — 沿用 arboard
// ============================================================================

#[cfg(not(target_os = "windows"))]
mod fallback {
    use super::*;
    use std::borrow::Cow;

    /// arboard 不暴露逐格式槽位，整图交由平台后端展开。
    pub(super) fn publish_via_arboard(
        image: &DynamicImage,
        _prepared: &PreparedFormats,
        _config: &FitConfig,
    ) -> Result<(), ClipboardError> {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let bytes = rgba.into_raw();

        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| ClipboardError::SessionUnavailable(format!("无法访问剪贴板：{}", e)))?;

        let image_data = arboard::ImageData {
            width: width as usize,
            height: height as usize,
            bytes: Cow::Borrowed(&bytes),
        };

        clipboard
            .set_image(image_data)
            .map_err(|e| ClipboardError::PublishFailed {
                slot: super::super::models::FormatSlot::Dib,
                message: format!("复制失败：{}", e),
            })?;

        Ok(())
    }
}
