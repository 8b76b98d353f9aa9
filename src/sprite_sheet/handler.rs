//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `SlicingOrchestrator` 是流水线的唯一入口，只负责编排，不持有任何状态。
//! 处理链路固定为：
//! 1. 校验配置（失败立即返回，不做任何修改）
//! 2. 复制源缓冲，之后只修改副本
//! 3. 背景移除（可选）
//! 4. 裁剪到网格选区（可选，仅网格模式）
//! 5. 生成帧矩形：网格切片，或连通域检测（+ 动作行分类）
//! 6. 帧归一化（可选）
//!
//! ## 实现思路
//!
//! - 非致命问题统一追加到 `warnings`，最终随 `ProcessResult` 返回。
//! - 记录 `keying/crop/slice/normalize/total` 阶段耗时，便于性能诊断。
//! - 结构体无字段，天然 `Send + Sync`，调用方可以放到后台线程整体执行。

use std::time::Instant;

use super::background::ColorKeyBackgroundRemover;
use super::cache::FrameRectCache;
use super::classifier::{ActionRowClassifier, flat_frames};
use super::config::{SlicingConfig, SlicingMode};
use super::frame::{FrameRect, PixelRect, ProcessResult, max_frame_size};
use super::grid::{GridFrameSlicer, GridGeometry};
use super::islands::IslandDetector;
use super::normalizer::FrameNormalizer;
use super::{PixelBuffer, SlicingError};

/// 没有得到任何帧时追加的警告。
pub const EMPTY_RESULT_WARNING: &str = "No valid frame rects were detected from current slicing settings.";

/// 切片流水线编排器。
#[derive(Debug, Clone, Copy, Default)]
pub struct SlicingOrchestrator;

impl SlicingOrchestrator {
    pub fn new() -> Self {
        Self
    }

    /// 处理主入口。
    ///
    /// `source` 不会被修改；返回的缓冲是独立副本（可能已裁剪或归一化）。
    ///
    /// # 示例
    /// ```rust
    /// use sprite_slicer::sprite_sheet::{PixelBuffer, SlicingConfig, SlicingOrchestrator};
    ///
    /// let sheet = PixelBuffer::new_transparent(128, 64);
    /// let result = SlicingOrchestrator::new().process(&sheet, &SlicingConfig::default())?;
    /// assert_eq!(result.frames.len(), 8);
    /// # Ok::<(), sprite_slicer::sprite_sheet::SlicingError>(())
    /// ```
    pub fn process(&self, source: &PixelBuffer, config: &SlicingConfig) -> Result<ProcessResult, SlicingError> {
        config.validate(source.width(), source.height())?;

        let total_start = Instant::now();
        let mut warnings = Vec::new();
        let mut buffer = source.clone();

        let keying_start = Instant::now();
        if config.background.enabled {
            let stats = ColorKeyBackgroundRemover::from_config(&config.background).apply(&mut buffer);
            log::debug!(
                "🎨 背景移除：removed={} softened={}",
                stats.removed,
                stats.softened
            );
        }
        let keying_elapsed = keying_start.elapsed();

        let crop_start = Instant::now();
        let mut geometry = GridGeometry::from_config(config, buffer.width(), buffer.height());
        if config.crop_to_selection {
            if let Some(geometry) = geometry.as_mut() {
                buffer = crop_to_selection(buffer, geometry, config)?;
            }
        }
        let crop_elapsed = crop_start.elapsed();

        let slice_start = Instant::now();
        let mut frames = match geometry {
            Some(geometry) => GridFrameSlicer::slice(
                &geometry,
                buffer.width(),
                buffer.height(),
                &config.frame_base_name,
                &mut warnings,
            ),
            None => smart_slice(&buffer, config, &mut warnings),
        };
        let slice_elapsed = slice_start.elapsed();

        let normalize_start = Instant::now();
        let mut normalized = false;
        if config.normalize_frames && !frames.is_empty() {
            let columns = config.mode.is_grid().then_some(config.cols);
            match FrameNormalizer::normalize(&buffer, &frames, columns) {
                Ok(Some(atlas)) => {
                    log::debug!(
                        "📐 帧归一化：{} 帧，单元 {}x{}，{} 列 x {} 行",
                        atlas.frames.len(),
                        atlas.cell_width,
                        atlas.cell_height,
                        atlas.columns,
                        atlas.rows
                    );
                    buffer = atlas.buffer;
                    frames = atlas.frames;
                    normalized = true;
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("⚠️ 帧归一化已跳过: {}", e);
                    warnings.push(format!("帧归一化已跳过：{}", e));
                }
            }
        }
        let normalize_elapsed = normalize_start.elapsed();

        if frames.is_empty() {
            log::warn!("⚠️ 当前切片参数未得到任何有效帧（mode={}）", config.mode.as_str());
            warnings.push(EMPTY_RESULT_WARNING.to_string());
        }

        let (max_frame_width, max_frame_height) = max_frame_size(&frames);

        log::info!(
            "✅ 切片完成 - mode={} frames={} warnings={} keying={}ms crop={}ms slice={}ms normalize={}ms total={}ms",
            config.mode.as_str(),
            frames.len(),
            warnings.len(),
            keying_elapsed.as_millis(),
            crop_elapsed.as_millis(),
            slice_elapsed.as_millis(),
            normalize_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(ProcessResult {
            buffer,
            frames,
            warnings,
            normalized,
            max_frame_width,
            max_frame_height,
        })
    }

    /// 带缓存的处理入口：缓冲内容与配置都未变化时直接复用上一次结果。
    pub fn process_cached(
        &self,
        source: &PixelBuffer,
        config: &SlicingConfig,
        cache: &mut FrameRectCache,
    ) -> Result<ProcessResult, SlicingError> {
        let Some(key) = FrameRectCache::key_for(source, config) else {
            return self.process(source, config);
        };

        if let Some(cached) = cache.lookup(key) {
            log::debug!("♻️ 命中帧矩形缓存（{} 帧）", cached.frames.len());
            return Ok(cached.clone());
        }

        let result = self.process(source, config)?;
        cache.store(key, result.clone());
        Ok(result)
    }
}

/// 裁剪到网格选区，并把网格偏移换算到裁剪后的坐标系。
///
/// 选区等于整张缓冲时不做任何事。
fn crop_to_selection(
    buffer: PixelBuffer,
    geometry: &mut GridGeometry,
    config: &SlicingConfig,
) -> Result<PixelBuffer, SlicingError> {
    let Some(bounds) = geometry.selection_bounds(buffer.width(), buffer.height()) else {
        return Ok(buffer);
    };

    let rect = bounds.rect;
    if rect == PixelRect::new(0, 0, buffer.width(), buffer.height()) {
        return Ok(buffer);
    }

    let cropped = buffer.crop(rect.x, rect.y, rect.width, rect.height)?;
    log::debug!(
        "✂️ 裁剪到网格选区：{}x{} → {}x{}（x={}, y={}）",
        buffer.width(),
        buffer.height(),
        cropped.width(),
        cropped.height(),
        rect.x,
        rect.y
    );

    match config.mode {
        SlicingMode::CustomGrid => {
            geometry.offset = (geometry.offset.0 - rect.x as f32, geometry.offset.1 - bounds.top);
        }
        SlicingMode::AutoDivide => {
            *geometry = GridGeometry::auto_divide(
                cropped.width(),
                cropped.height(),
                config.rows,
                config.cols,
                config.inner_padding,
            );
        }
        SlicingMode::SmartSlice => {}
    }

    Ok(cropped)
}

/// SmartSlice：连通域检测，按需拆分动作行。
fn smart_slice(buffer: &PixelBuffer, config: &SlicingConfig, warnings: &mut Vec<String>) -> Vec<FrameRect> {
    let detector = IslandDetector::new(config.alpha_threshold, config.min_island_pixels, config.outer_padding);
    let islands = detector.detect(buffer);
    log::debug!("🔍 SmartSlice 检测到 {} 个连通域", islands.len());

    if config.splits_action_rows() {
        let rects = islands.into_iter().map(|island| island.rect).collect();
        return ActionRowClassifier::new(config.action_row_count)
            .classify(rects, warnings)
            .into_frames(&config.frame_base_name);
    }

    let mut rects = Vec::with_capacity(islands.len());
    for (i, island) in islands.iter().enumerate() {
        let rect = island.rect;
        match PixelRect::clamp_to_bounds(
            rect.x as f32,
            rect.y as f32,
            rect.width as f32,
            rect.height as f32,
            buffer.width(),
            buffer.height(),
        ) {
            Some(clamped) => rects.push(clamped),
            None => warnings.push(format!("连通域 #{} 超出图像范围，已跳过", i)),
        }
    }

    flat_frames(&config.frame_base_name, rects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite_sheet::config::BackgroundRemovalConfig;
    use image::Rgba;

    const MAGENTA: Rgba<u8> = Rgba([255, 0, 255, 255]);
    const INK: Rgba<u8> = Rgba([20, 160, 40, 255]);

    fn fill(buffer: &mut PixelBuffer, x: u32, y: u32, width: u32, height: u32, pixel: Rgba<u8>) {
        for py in y..y + height {
            for px in x..x + width {
                buffer.put(px, py, pixel);
            }
        }
    }

    fn no_background() -> BackgroundRemovalConfig {
        BackgroundRemovalConfig {
            enabled: false,
            ..BackgroundRemovalConfig::default()
        }
    }

    fn smart_config() -> SlicingConfig {
        SlicingConfig {
            mode: SlicingMode::SmartSlice,
            alpha_threshold: 0.5,
            min_island_pixels: 50,
            outer_padding: 0,
            normalize_frames: false,
            background: no_background(),
            ..SlicingConfig::default()
        }
    }

    #[test]
    fn source_buffer_is_never_mutated() {
        let mut source = PixelBuffer::new_transparent(400, 200);
        fill(&mut source, 0, 0, 400, 200, MAGENTA);
        fill(&mut source, 20, 20, 30, 30, INK);
        let before = source.clone();

        let result = SlicingOrchestrator::new()
            .process(&source, &SlicingConfig::default())
            .expect("pipeline should succeed");

        assert_eq!(source, before);
        assert_ne!(result.buffer, before);
        assert!(result.normalized);
        assert_eq!(result.buffer.get(0, 0).map(|p| p.0[3]), Some(0));
    }

    #[test]
    fn auto_divide_without_normalization_keeps_grid_layout() {
        let source = PixelBuffer::new_transparent(400, 200);
        let config = SlicingConfig {
            inner_padding: 0,
            normalize_frames: false,
            ..SlicingConfig::default()
        };

        let result = SlicingOrchestrator::new().process(&source, &config).expect("pipeline");

        assert_eq!(result.frames.len(), 8);
        assert!(!result.normalized);
        assert_eq!(result.frames[0].name, "sprite_0_0");
        assert_eq!((result.max_frame_width, result.max_frame_height), (100, 100));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn invalid_config_fails_before_processing() {
        let source = PixelBuffer::new_transparent(64, 64);
        let config = SlicingConfig {
            rows: 0,
            ..SlicingConfig::default()
        };

        let error = SlicingOrchestrator::new().process(&source, &config).expect_err("should fail");

        assert!(matches!(error, SlicingError::Validation(_)));
    }

    #[test]
    fn custom_grid_crop_reexpresses_offsets() {
        let source = PixelBuffer::new_transparent(300, 300);
        let config = SlicingConfig {
            mode: SlicingMode::CustomGrid,
            rows: 2,
            cols: 3,
            inner_padding: 0,
            offset: (10.0, 20.0),
            cell_size: (50.0, 60.0),
            spacing: (5.0, 4.0),
            normalize_frames: false,
            background: no_background(),
            ..SlicingConfig::default()
        };

        let result = SlicingOrchestrator::new().process(&source, &config).expect("pipeline");

        assert_eq!((result.buffer.width(), result.buffer.height()), (160, 124));
        assert_eq!(result.frames.len(), 6);
        assert_eq!(result.frames[0].rect(), PixelRect::new(0, 64, 50, 60));
        assert_eq!(result.frames[5].rect(), PixelRect::new(110, 0, 50, 60));
    }

    #[test]
    fn smart_slice_with_action_rows_names_frames_by_action() {
        let mut source = PixelBuffer::new_transparent(100, 200);
        for y in [10, 60, 110, 160] {
            fill(&mut source, 50, y, 10, 10, INK);
            fill(&mut source, 10, y, 10, 10, INK);
        }
        let config = SlicingConfig {
            split_into_action_rows: true,
            ..smart_config()
        };

        let result = SlicingOrchestrator::new().process(&source, &config).expect("pipeline");

        assert_eq!(result.frames.len(), 8);
        assert_eq!(result.frames[0].name, "sprite_idle_00");
        assert_eq!((result.frames[0].x, result.frames[0].y), (10, 160));
        assert_eq!(result.frames[1].name, "sprite_idle_01");
        assert_eq!(result.frames[7].name, "sprite_die_01");
        assert_eq!((result.frames[7].x, result.frames[7].y), (50, 10));
    }

    #[test]
    fn empty_sheet_reports_warning() {
        let source = PixelBuffer::new_transparent(32, 32);

        let result = SlicingOrchestrator::new().process(&source, &smart_config()).expect("pipeline");

        assert!(result.frames.is_empty());
        assert!(!result.normalized);
        assert!(result.warnings.iter().any(|w| w == EMPTY_RESULT_WARNING));
        assert_eq!((result.max_frame_width, result.max_frame_height), (0, 0));
    }

    #[test]
    fn oversized_atlas_skips_normalization_with_warning() {
        let source = PixelBuffer::new_transparent(2000, 1000);
        let config = SlicingConfig {
            mode: SlicingMode::CustomGrid,
            rows: 1,
            cols: 65_536,
            inner_padding: 0,
            offset: (0.0, 0.0),
            cell_size: (1000.0, 1000.0),
            spacing: (0.0, 0.0),
            normalize_frames: true,
            background: no_background(),
            ..SlicingConfig::default()
        };

        let result = SlicingOrchestrator::new().process(&source, &config).expect("pipeline");

        assert!(!result.normalized);
        assert_eq!(result.frames.len(), 2);
        assert_eq!((result.buffer.width(), result.buffer.height()), (2000, 1000));
        assert!(result.warnings.iter().any(|w| w.starts_with("帧归一化已跳过")));
    }

    #[test]
    fn custom_grid_entirely_off_buffer_yields_empty_result() {
        let source = PixelBuffer::new_transparent(64, 64);
        let config = SlicingConfig {
            mode: SlicingMode::CustomGrid,
            rows: 2,
            cols: 2,
            inner_padding: 0,
            offset: (5000.0, 5000.0),
            cell_size: (10.0, 10.0),
            spacing: (0.0, 0.0),
            normalize_frames: true,
            background: no_background(),
            ..SlicingConfig::default()
        };

        let result = SlicingOrchestrator::new().process(&source, &config).expect("pipeline");

        assert!(result.frames.is_empty());
        assert!(!result.normalized);
        assert!(result.warnings.iter().any(|w| w == EMPTY_RESULT_WARNING));
    }

    #[test]
    fn smart_slice_normalizes_mixed_sizes() {
        let mut source = PixelBuffer::new_transparent(100, 100);
        fill(&mut source, 5, 60, 10, 20, INK);
        fill(&mut source, 40, 60, 16, 12, INK);
        fill(&mut source, 70, 60, 8, 8, INK);
        let config = SlicingConfig {
            normalize_frames: true,
            ..smart_config()
        };

        let result = SlicingOrchestrator::new().process(&source, &config).expect("pipeline");

        assert!(result.normalized);
        assert_eq!(result.frames.len(), 3);
        assert!(result.frames.iter().all(|f| f.width == 16 && f.height == 20));
        assert_eq!((result.max_frame_width, result.max_frame_height), (16, 20));
        // 3 帧 → 2 列 x 2 行
        assert_eq!((result.buffer.width(), result.buffer.height()), (32, 40));
    }

    #[test]
    fn cached_processing_reuses_result_until_invalidated() {
        let mut source = PixelBuffer::new_transparent(64, 64);
        fill(&mut source, 8, 8, 10, 10, INK);
        let config = smart_config();
        let orchestrator = SlicingOrchestrator::new();
        let mut cache = FrameRectCache::new();

        let first = orchestrator.process_cached(&source, &config, &mut cache).expect("first");
        assert!(!cache.is_empty());
        let second = orchestrator.process_cached(&source, &config, &mut cache).expect("second");
        assert_eq!(first.frames, second.frames);

        cache.invalidate();
        assert!(cache.is_empty());
    }
}
