//! # Manifest 记录模块
//!
//! ## 设计思路
//!
//! 每个输出目录维护一份 `manifest.json`，记录每个动作组最近一次的处理结果，
//! 供游戏侧按动作组加载图集、读取帧尺寸和 pivot。
//!
//! - 同一动作组重复处理时覆盖原记录（组名大小写不敏感）
//! - 源文件列表与警告列表去重（大小写不敏感，跳过空白项）
//! - 读取失败（文件缺失 / 空文件 / 损坏）时回退为新的 manifest，不中断处理
//!
//! 字段使用 camelCase，与编辑器工具写出的文件保持兼容。

use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::config::{BackgroundRemovalMode, ChannelComparison, SlicingConfig, SlicingMode};
use super::frame::{DEFAULT_PIVOT, ProcessResult};
use crate::error::AppError;

/// manifest 文件名。
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

const MANIFEST_VERSION: u32 = 1;

/// 输出目录下所有动作组的汇总。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpriteManifest {
    pub version: u32,
    /// 最近一次写入时间（UTC，RFC 3339）。
    pub updated_at_utc: String,
    pub source_files: Vec<String>,
    pub actions: Vec<ManifestActionRecord>,
}

impl Default for SpriteManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            updated_at_utc: String::new(),
            source_files: Vec::new(),
            actions: Vec::new(),
        }
    }
}

/// 单个动作组的处理记录。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestActionRecord {
    pub action_group: String,
    pub source_file: String,
    pub output_texture: String,
    pub frame_count: usize,
    pub max_frame_width: u32,
    pub max_frame_height: u32,
    pub pivot_x: f32,
    pub pivot_y: f32,
    pub normalized_frames: bool,
    pub slicing_mode: String,
    pub options: ManifestOptions,
    pub warnings: Vec<String>,
}

impl Default for ManifestActionRecord {
    fn default() -> Self {
        Self {
            action_group: "unknown".to_string(),
            source_file: String::new(),
            output_texture: String::new(),
            frame_count: 0,
            max_frame_width: 0,
            max_frame_height: 0,
            pivot_x: DEFAULT_PIVOT.0,
            pivot_y: DEFAULT_PIVOT.1,
            normalized_frames: false,
            slicing_mode: String::new(),
            options: ManifestOptions::default(),
            warnings: Vec::new(),
        }
    }
}

/// 生成该记录时使用的参数快照。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManifestOptions {
    pub remove_background: bool,
    pub use_rgb_range_filter: bool,
    pub key_color: [u8; 3],
    pub tolerance: f32,
    pub threshold_r: u8,
    pub threshold_g: u8,
    pub threshold_b: u8,
    pub compare_r: ChannelComparison,
    pub compare_g: ChannelComparison,
    pub compare_b: ChannelComparison,
    pub crop_to_selection: bool,
    pub normalize_frames: bool,
    pub slicing_mode: SlicingMode,
    pub rows: u32,
    pub cols: u32,
    pub inner_padding: u32,
    pub smart_slice_alpha_threshold: f32,
    pub smart_slice_min_pixels: u32,
    pub smart_slice_outer_padding: u32,
    pub smart_slice_split_actions_by_rows: bool,
    pub smart_slice_action_row_count: u32,
}

impl ManifestOptions {
    pub fn from_config(config: &SlicingConfig) -> Self {
        let background = &config.background;
        Self {
            remove_background: background.enabled,
            use_rgb_range_filter: background.mode == BackgroundRemovalMode::RangeFilter,
            key_color: background.key_color,
            tolerance: background.tolerance,
            threshold_r: background.red.threshold,
            threshold_g: background.green.threshold,
            threshold_b: background.blue.threshold,
            compare_r: background.red.compare,
            compare_g: background.green.compare,
            compare_b: background.blue.compare,
            crop_to_selection: config.crop_to_selection,
            normalize_frames: config.normalize_frames,
            slicing_mode: config.mode,
            rows: config.rows,
            cols: config.cols,
            inner_padding: config.inner_padding,
            smart_slice_alpha_threshold: config.alpha_threshold,
            smart_slice_min_pixels: config.min_island_pixels,
            smart_slice_outer_padding: config.outer_padding,
            smart_slice_split_actions_by_rows: config.split_into_action_rows,
            smart_slice_action_row_count: config.action_row_count,
        }
    }
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self::from_config(&SlicingConfig::default())
    }
}

/// 一次处理运行的摘要，作为 `record_run` 的输入。
#[derive(Debug, Clone, Copy)]
pub struct RunSummary<'a> {
    pub action_group: &'a str,
    /// 源文件名（含扩展名）。
    pub source_file: &'a str,
    /// 源文件名主干，写入 `source=` 警告项。
    pub source_stem: &'a str,
    pub output_texture: &'a str,
    pub config: &'a SlicingConfig,
    pub result: &'a ProcessResult,
}

impl SpriteManifest {
    /// 合并一次运行的结果。
    pub fn record_run(&mut self, run: &RunSummary<'_>) {
        self.updated_at_utc = Utc::now().to_rfc3339();
        add_unique_entry(&mut self.source_files, run.source_file);

        let index = match self
            .actions
            .iter()
            .position(|record| record.action_group.eq_ignore_ascii_case(run.action_group))
        {
            Some(index) => index,
            None => {
                self.actions.push(ManifestActionRecord::default());
                self.actions.len() - 1
            }
        };

        let record = &mut self.actions[index];
        record.action_group = run.action_group.to_string();
        record.source_file = run.source_file.to_string();
        record.output_texture = run.output_texture.to_string();
        record.frame_count = run.result.frames.len();
        record.max_frame_width = run.result.max_frame_width;
        record.max_frame_height = run.result.max_frame_height;
        record.pivot_x = DEFAULT_PIVOT.0;
        record.pivot_y = DEFAULT_PIVOT.1;
        record.normalized_frames = run.result.normalized;
        record.slicing_mode = run.config.mode.as_str().to_string();
        record.options = ManifestOptions::from_config(run.config);

        record.warnings.clear();
        add_unique_entry(&mut record.warnings, &format!("source={}", run.source_stem));
        for warning in &run.result.warnings {
            add_unique_entry(&mut record.warnings, warning);
        }
    }

    /// 查找动作组记录（大小写不敏感）。
    pub fn find_action(&self, action_group: &str) -> Option<&ManifestActionRecord> {
        self.actions
            .iter()
            .find(|record| record.action_group.eq_ignore_ascii_case(action_group))
    }

    /// 从文件加载；文件缺失、为空或无法解析时返回新的 manifest。
    pub fn load_from_path(path: &Path) -> Self {
        let Ok(content) = fs::read_to_string(path) else {
            return Self::default();
        };
        if content.trim().is_empty() {
            return Self::default();
        }

        match serde_json::from_str(&content) {
            Ok(manifest) => manifest,
            Err(e) => {
                log::warn!("⚠️ manifest 解析失败，将重新生成: {} ({})", path.display(), e);
                Self::default()
            }
        }
    }

    /// 以格式化 JSON 写入文件。
    pub fn save_to_path(&self, path: &Path) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Manifest(format!("序列化 manifest 失败: {}", e)))?;
        fs::write(path, content).map_err(|e| AppError::Manifest(format!("写入 manifest 失败: {}", e)))?;
        Ok(())
    }
}

/// 追加一项，跳过空白项与大小写不敏感的重复项。
fn add_unique_entry(values: &mut Vec<String>, value: &str) {
    if value.trim().is_empty() || values.iter().any(|existing| existing.eq_ignore_ascii_case(value)) {
        return;
    }
    values.push(value.to_string());
}
