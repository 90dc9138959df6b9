//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `FitConfig`，保证运行时行为可观测、可调整、可测试。
//! 体积预算与缩放步长来自外部参数而非编译期常量，调用方可以按场景覆盖。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的默认配置（8 MiB 预算、0.9 起步、0.1 步长）。
//! - `validate` 在入口处一次性校验参数组合，尽快失败。

use image::imageops::FilterType;

use super::FitError;

/// 图片适配配置。
///
/// 字段覆盖了源加载、体积收敛与剪贴板写入重试三个阶段。
#[derive(Debug, Clone)]
pub struct FitConfig {
    /// 主位图负载允许的最大字节数（体积预算）。
    pub max_payload_bytes: u64,
    /// 缩放循环的起始比例（相对原始尺寸）。
    pub scale_start: f64,
    /// 每轮缩放递减的比例步长。
    pub scale_step: f64,
    /// 读取源文件时允许的最大文件体积（字节）。
    pub max_file_size: u64,
    /// 降采样滤镜策略。
    pub resize_filter: FilterType,
    /// 写入剪贴板失败时最大重试次数。
    pub clipboard_retries: u32,
    /// 重试间隔（毫秒）。
    pub clipboard_retry_delay: u64,
    /// 单次写入流程允许的总重试预算（毫秒）。
    pub clipboard_retry_max_total_ms: u64,
    /// 单次退避延迟上限（毫秒）。
    pub clipboard_retry_max_delay_ms: u64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_payload_bytes: 8 * 1024 * 1024,
            scale_start: 0.9,
            scale_step: 0.1,
            max_file_size: 50 * 1024 * 1024,
            resize_filter: FilterType::Triangle,
            clipboard_retries: 3,
            clipboard_retry_delay: 100,
            clipboard_retry_max_total_ms: 1_800,
            clipboard_retry_max_delay_ms: 900,
        }
    }
}

impl FitConfig {
    /// 校验参数组合是否可用。
    ///
    /// 在处理器构造时调用一次，处理链路内部不再重复校验。
    pub fn validate(&self) -> Result<(), FitError> {
        if self.max_payload_bytes == 0 {
            return Err(FitError::InvalidFormat(
                "max_payload_bytes 必须大于 0".to_string(),
            ));
        }
        if !(self.scale_start > 0.0 && self.scale_start <= 1.0) {
            return Err(FitError::InvalidFormat(
                "scale_start 必须在 (0, 1] 区间内".to_string(),
            ));
        }
        if !(self.scale_step > 0.0 && self.scale_step <= self.scale_start) {
            return Err(FitError::InvalidFormat(
                "scale_step 必须大于 0 且不超过 scale_start".to_string(),
            ));
        }
        if self.max_file_size == 0 {
            return Err(FitError::InvalidFormat(
                "max_file_size 必须大于 0".to_string(),
            ));
        }
        if !(200..=30_000).contains(&self.clipboard_retry_max_total_ms) {
            return Err(FitError::InvalidFormat(
                "clipboard_retry_max_total_ms 必须在 200~30000 毫秒之间".to_string(),
            ));
        }
        if !(10..=5_000).contains(&self.clipboard_retry_max_delay_ms) {
            return Err(FitError::InvalidFormat(
                "clipboard_retry_max_delay_ms 必须在 10~5000 毫秒之间".to_string(),
            ));
        }
        if self.clipboard_retry_max_delay_ms > self.clipboard_retry_max_total_ms {
            return Err(FitError::InvalidFormat(
                "clipboard_retry_max_delay_ms 不能大于 clipboard_retry_max_total_ms".to_string(),
            ));
        }

        Ok(())
    }
}
