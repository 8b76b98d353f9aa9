//! # 精灵表预处理工具 — 命令行入口
//!
//! 本文件只负责参数解析、图片读写与 manifest 合并。
//! 切片逻辑全部在 `sprite_sheet` 模块中，详见 `lib.rs` 架构文档。

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Serialize;
use sprite_slicer::error::AppError;
use sprite_slicer::sprite_sheet::{
    ActionGroup, FrameRect, MANIFEST_FILE_NAME, PixelBuffer, ProcessResult, RunSummary, SlicingConfig,
    SlicingMode, SlicingOrchestrator, SpriteManifest, processed_file_name, processed_stem, resolve_group_name,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// The sprite sheet to process (PNG / JPEG).
    pub input: PathBuf,

    /// Output folder (defaults to the input's folder).
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,

    /// JSON config file; missing fields use defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Slicing mode (auto_divide, custom_grid, smart_slice)
    #[arg(short, long)]
    pub mode: Option<String>,

    #[arg(long)]
    pub rows: Option<u32>,

    #[arg(long)]
    pub cols: Option<u32>,

    /// Inner padding of grid cells in pixels
    #[arg(long)]
    pub padding: Option<u32>,

    /// Background key tolerance in [0, 1]
    #[arg(long)]
    pub tolerance: Option<f32>,

    /// Background key color, "#ff00ff" or "255,0,255"
    #[arg(long)]
    pub key_color: Option<String>,

    /// Smart slice alpha threshold in (0, 1]
    #[arg(long)]
    pub alpha_threshold: Option<f32>,

    /// Smart slice minimum island size in pixels
    #[arg(long)]
    pub min_pixels: Option<u32>,

    /// Split smart slice islands into action rows
    #[arg(long, default_value_t = false)]
    pub split_rows: bool,

    /// Number of action rows when splitting
    #[arg(long)]
    pub row_count: Option<u32>,

    /// Action group (idle, walk, attack, die); detected from the file name if omitted
    #[arg(long)]
    pub action_group: Option<String>,

    /// Frame name prefix (defaults to the processed file stem)
    #[arg(long)]
    pub frame_name: Option<String>,

    #[arg(long, default_value_t = false)]
    pub no_background: bool,

    #[arg(long, default_value_t = false)]
    pub no_crop: bool,

    #[arg(long, default_value_t = false)]
    pub no_normalize: bool,

    #[arg(long, default_value_t = false)]
    pub no_manifest: bool,
}

impl Args {
    /// 命令行参数覆盖配置文件中的同名字段。
    fn apply_overrides(&self, config: &mut SlicingConfig) -> Result<(), AppError> {
        if let Some(mode) = &self.mode {
            config.mode = SlicingMode::from_str(mode)?;
        }
        if let Some(rows) = self.rows {
            config.rows = rows;
        }
        if let Some(cols) = self.cols {
            config.cols = cols;
        }
        if let Some(padding) = self.padding {
            config.inner_padding = padding;
        }
        if let Some(tolerance) = self.tolerance {
            config.background.tolerance = tolerance;
        }
        if let Some(key_color) = &self.key_color {
            config.background.key_color = parse_key_color(key_color)?;
        }
        if let Some(alpha_threshold) = self.alpha_threshold {
            config.alpha_threshold = alpha_threshold;
        }
        if let Some(min_pixels) = self.min_pixels {
            config.min_island_pixels = min_pixels;
        }
        if self.split_rows {
            config.split_into_action_rows = true;
        }
        if let Some(row_count) = self.row_count {
            config.action_row_count = row_count;
        }
        if self.no_background {
            config.background.enabled = false;
        }
        if self.no_crop {
            config.crop_to_selection = false;
        }
        if self.no_normalize {
            config.normalize_frames = false;
        }
        Ok(())
    }
}

/// 写在图集旁边的帧列表。
#[derive(Serialize)]
struct FrameSheet<'a> {
    image: &'a str,
    width: u32,
    height: u32,
    normalized: bool,
    frames: &'a [FrameRect],
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(err) = run(&args) {
        log::error!("❌ 处理失败: {err}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), AppError> {
    let mut config = load_config(args.config.as_deref())?;
    args.apply_overrides(&mut config)?;

    let file_stem = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .ok_or_else(|| AppError::Config(format!("无效的输入路径: {}", args.input.display())))?;
    let source_file = args
        .input
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| file_stem.clone());

    let manual_group = args.action_group.as_deref().map(ActionGroup::from_str).transpose()?;
    let group = resolve_group_name(&file_stem, manual_group, config.splits_action_rows());
    let output_stem = processed_stem(&group, &file_stem);
    config.frame_base_name = args.frame_name.clone().unwrap_or_else(|| output_stem.clone());

    let decoded = image::open(&args.input)?.to_rgba8();
    log::info!(
        "📥 已读取 {}（{}x{}），mode={} group={}",
        source_file,
        decoded.width(),
        decoded.height(),
        config.mode.as_str(),
        group
    );

    let source = PixelBuffer::from_rgba_image(&decoded);
    let result = SlicingOrchestrator::new().process(&source, &config)?;
    for warning in &result.warnings {
        log::warn!("⚠️ {warning}");
    }

    let out_dir = match &args.out_dir {
        Some(dir) => dir.clone(),
        None => args.input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    fs::create_dir_all(&out_dir)?;

    let output_texture = processed_file_name(&group, &file_stem);
    write_outputs(&out_dir, &output_texture, &output_stem, &result)?;

    if !args.no_manifest {
        let manifest_path = out_dir.join(MANIFEST_FILE_NAME);
        let mut manifest = SpriteManifest::load_from_path(&manifest_path);
        manifest.record_run(&RunSummary {
            action_group: &group,
            source_file: &source_file,
            source_stem: &file_stem,
            output_texture: &output_texture,
            config: &config,
            result: &result,
        });
        manifest.save_to_path(&manifest_path)?;
        log::info!("📝 manifest 已更新: {}", manifest_path.display());
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SlicingConfig, AppError> {
    let Some(path) = path else {
        return Ok(SlicingConfig::default());
    };

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("读取配置文件失败 {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| AppError::Config(format!("解析配置文件失败 {}: {}", path.display(), e)))
}

fn write_outputs(out_dir: &Path, output_texture: &str, output_stem: &str, result: &ProcessResult) -> Result<(), AppError> {
    let texture_path = out_dir.join(output_texture);
    result.buffer.to_rgba_image().save(&texture_path)?;

    let sheet = FrameSheet {
        image: output_texture,
        width: result.buffer.width(),
        height: result.buffer.height(),
        normalized: result.normalized,
        frames: &result.frames,
    };
    let frames_path = out_dir.join(format!("{}.frames.json", output_stem));
    let content = serde_json::to_string_pretty(&sheet).map_err(std::io::Error::from)?;
    fs::write(&frames_path, content)?;

    log::info!(
        "💾 已写出 {}（{} 帧）与 {}",
        texture_path.display(),
        result.frames.len(),
        frames_path.display()
    );
    Ok(())
}

/// 解析 `#rrggbb` / `rrggbb` / `r,g,b` 形式的键控色。
fn parse_key_color(value: &str) -> Result<[u8; 3], AppError> {
    let value = value.trim();
    let invalid = || AppError::Config(format!("无效的键控色: {}（示例：#ff00ff 或 255,0,255）", value));

    if value.contains(',') {
        let channels: Vec<u8> = value
            .split(',')
            .map(|part| part.trim().parse::<u8>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;
        return <[u8; 3]>::try_from(channels).map_err(|_| invalid());
    }

    let hex = value.trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
    Ok([channel(0)?, channel(2)?, channel(4)?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_color_accepts_hex_and_triplets() {
        assert_eq!(parse_key_color("#FF00ff").expect("hex"), [255, 0, 255]);
        assert_eq!(parse_key_color("0,255, 12").expect("triplet"), [0, 255, 12]);
        assert!(parse_key_color("#ff00").is_err());
        assert!(parse_key_color("1,2").is_err());
        assert!(parse_key_color("300,0,0").is_err());
    }

    #[test]
    fn overrides_replace_config_fields() {
        let args = Args::parse_from([
            "sprite-slicer",
            "hero_walk.png",
            "--mode",
            "smart",
            "--split-rows",
            "--row-count",
            "3",
            "--no-normalize",
            "--key-color",
            "0,0,0",
        ]);
        let mut config = SlicingConfig::default();

        args.apply_overrides(&mut config).expect("overrides");

        assert_eq!(config.mode, SlicingMode::SmartSlice);
        assert!(config.splits_action_rows());
        assert_eq!(config.action_row_count, 3);
        assert!(!config.normalize_frames);
        assert_eq!(config.background.key_color, [0, 0, 0]);
        assert!(config.crop_to_selection);
    }
}
