//! # 剪贴板图片体积适配工具 — 应用入口
//!
//! 本文件仅负责参数解析、日志初始化与结果呈现。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use clap::Parser;

use clipboard_resize::clipboard;
use clipboard_resize::error::AppError;
use clipboard_resize::image_fit::{FitConfig, ImageFitter, ImageSource};

/// 将剪贴板（或文件）中的图片压入体积预算后重新发布到剪贴板。
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// 图片文件路径；缺省时从剪贴板读取图像
    path: Option<String>,

    /// 主位图负载的最大字节数
    #[arg(long, default_value_t = 8 * 1024 * 1024)]
    max_bytes: u64,

    /// 缩放循环起始比例
    #[arg(long, default_value_t = 0.9)]
    scale_start: f64,

    /// 缩放循环步长
    #[arg(long, default_value_t = 0.1)]
    scale_step: f64,

    /// 仅枚举当前剪贴板格式并以 JSON 输出（诊断用）
    #[arg(long)]
    list_formats: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        if err.is_retryable() {
            log::error!("处理失败（可稍后重试）: {err}");
        } else {
            log::error!("处理失败: {err}");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    if cli.list_formats {
        let entries = clipboard::list_formats()?;
        let json = serde_json::to_string_pretty(&entries)
            .map_err(|e| AppError::Io(std::io::Error::other(e)))?;
        println!("{json}");
        return Ok(());
    }

    let mut config = FitConfig::default();
    config.max_payload_bytes = cli.max_bytes;
    config.scale_start = cli.scale_start;
    config.scale_step = cli.scale_step;

    let fitter = ImageFitter::new(config)?;

    let source = match cli.path {
        Some(path) => ImageSource::FilePath(path),
        None => ImageSource::Clipboard,
    };

    fitter.process_and_publish(source)
}
