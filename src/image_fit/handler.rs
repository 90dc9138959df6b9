//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageFitter` 只负责流程编排与配置管理，不直接触碰平台剪贴板细节。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载源图像
//! 3. 体积收敛（编码 → 优化 → 缩放循环）
//! 4. 多格式发布到剪贴板
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<FitConfig>>` 支持运行时调整。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/fit/publish/total` 阶段耗时，便于性能诊断。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use crate::clipboard;
use crate::error::AppError;

use super::engine;
use super::loader;
use super::source::{FittedImage, ImageSource, SourceImage};
use super::{FitConfig, FitError};

/// 图片适配处理器。
///
/// 封装配置状态，并编排“加载 → 收敛 → 发布”的完整流程。
pub struct ImageFitter {
    config: Arc<RwLock<FitConfig>>,
}

impl ImageFitter {
    /// 根据初始配置创建处理器，配置在此一次性校验。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use clipboard_resize::image_fit::{FitConfig, ImageFitter};
    ///
    /// let fitter = ImageFitter::new(FitConfig::default())?;
    /// # Ok::<(), clipboard_resize::image_fit::FitError>(())
    /// ```
    pub fn new(config: FitConfig) -> Result<Self, FitError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub(super) fn config_snapshot(&self) -> Result<FitConfig, FitError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| FitError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 将源图像收敛到当前配置的体积预算内。
    pub fn fit_to_budget(&self, source: SourceImage) -> Result<FittedImage, FitError> {
        let config = self.config_snapshot()?;
        engine::fit_to_budget(source, &config)
    }

    /// 处理主入口：加载源图像、收敛体积并发布到剪贴板。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use clipboard_resize::image_fit::{FitConfig, ImageFitter, ImageSource};
    ///
    /// let fitter = ImageFitter::new(FitConfig::default())?;
    /// fitter.process_and_publish(ImageSource::FilePath("C:/tmp/test.png".into()))?;
    /// # Ok::<(), clipboard_resize::error::AppError>(())
    /// ```
    pub fn process_and_publish(&self, source: ImageSource) -> Result<(), AppError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let loaded = match source {
            ImageSource::Clipboard => loader::load_from_clipboard()?,
            ImageSource::FilePath(path) => loader::load_from_file(&path, &config)?,
        };
        let load_elapsed = load_start.elapsed();

        let fit_start = Instant::now();
        let fitted = engine::fit_to_budget(loaded, &config)?;
        let fit_elapsed = fit_start.elapsed();

        let publish_start = Instant::now();
        clipboard::publish(&fitted.image, Some(&fitted.payload), &config)?;
        let publish_elapsed = publish_start.elapsed();

        let total_elapsed = total_start.elapsed();
        log::info!(
            "✅ 图片处理完成 - load={}ms fit={}ms publish={}ms total={}ms（scale={:.2}，{} 次编码）",
            load_elapsed.as_millis(),
            fit_elapsed.as_millis(),
            publish_elapsed.as_millis(),
            total_elapsed.as_millis(),
            fitted.scale,
            fitted.attempts
        );

        Ok(())
    }
}
