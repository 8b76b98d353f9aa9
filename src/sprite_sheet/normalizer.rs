//! # 帧归一化模块
//!
//! ## 设计思路
//!
//! 引擎侧的动画通常要求所有帧尺寸一致、pivot 一致。这里把任意尺寸的帧
//! 重新排进一张统一单元（`maxW x maxH`）的图集：
//!
//! ```text
//! col           = i % columns
//! rowFromBottom = rows - 1 - i / columns
//! cell          = (col * maxW, rowFromBottom * maxH)
//! dest          = (cellX + max(0, (maxW - srcW) / 2), cellY)   // 水平居中、底边对齐
//! ```
//!
//! 帧序号 0 位于图集左上角，与帧列表的阅读顺序一致。
//!
//! ## 实现思路
//!
//! - 逐行整段复制像素（`copy_from_slice`），越界部分直接裁掉
//! - 新帧矩形就是整个单元，名称保持不变
//! - 对已归一化的结果再次执行结果不变（幂等）
//! - 图集尺寸用 `u64` 计算，溢出或超过 `MAX_ATLAS_PIXELS` 时返回错误，由编排层降级为 warning

use super::buffer::PixelBuffer;
use super::error::SlicingError;
use super::frame::{FrameRect, PixelRect, max_frame_size};

/// 图集像素总数上限（16384 x 16384）。
pub const MAX_ATLAS_PIXELS: u64 = 16_384 * 16_384;

/// 归一化后的图集。
#[derive(Debug, Clone)]
pub struct NormalizedAtlas {
    pub buffer: PixelBuffer,
    pub frames: Vec<FrameRect>,
    pub cell_width: u32,
    pub cell_height: u32,
    pub columns: u32,
    pub rows: u32,
}

/// 帧归一化器。
pub struct FrameNormalizer;

impl FrameNormalizer {
    /// 把帧重新排进统一单元的图集。
    ///
    /// `columns` 为 `None` 时使用 `ceil(sqrt(n))`。
    /// 帧为空或最大尺寸为 0 时返回 `Ok(None)`，调用方保留原缓冲与原帧。
    /// 图集尺寸溢出或超过 `MAX_ATLAS_PIXELS` 时返回 `SlicingError::InvalidBuffer`。
    pub fn normalize(
        source: &PixelBuffer,
        frames: &[FrameRect],
        columns: Option<u32>,
    ) -> Result<Option<NormalizedAtlas>, SlicingError> {
        if frames.is_empty() {
            return Ok(None);
        }

        let (cell_width, cell_height) = max_frame_size(frames);
        if cell_width == 0 || cell_height == 0 {
            return Ok(None);
        }

        let count = u32::try_from(frames.len())
            .map_err(|_| SlicingError::InvalidBuffer(format!("帧数量过多：{}", frames.len())))?;
        let columns = columns
            .filter(|&c| c > 0)
            .unwrap_or_else(|| (count as f64).sqrt().ceil() as u32)
            .max(1);
        let rows = count.div_ceil(columns);

        let (atlas_width, atlas_height) = atlas_size(columns, rows, cell_width, cell_height)?;
        let mut buffer = PixelBuffer::new_transparent(atlas_width, atlas_height);
        let mut normalized = Vec::with_capacity(frames.len());

        for (i, frame) in frames.iter().enumerate() {
            let i = i as u32;
            let col = i % columns;
            let row_from_bottom = rows - 1 - i / columns;
            let cell_x = col * cell_width;
            let cell_y = row_from_bottom * cell_height;

            let dest_x = cell_x + cell_width.saturating_sub(frame.width) / 2;
            copy_rect(source, frame.rect(), &mut buffer, dest_x, cell_y);

            normalized.push(FrameRect::new(
                frame.name.clone(),
                PixelRect::new(cell_x, cell_y, cell_width, cell_height),
            ));
        }

        Ok(Some(NormalizedAtlas {
            buffer,
            frames: normalized,
            cell_width,
            cell_height,
            columns,
            rows,
        }))
    }
}

fn atlas_size(columns: u32, rows: u32, cell_width: u32, cell_height: u32) -> Result<(u32, u32), SlicingError> {
    let width = columns as u64 * cell_width as u64;
    let height = rows as u64 * cell_height as u64;

    match width.checked_mul(height) {
        Some(pixels) if pixels <= MAX_ATLAS_PIXELS => Ok((width as u32, height as u32)),
        _ => Err(SlicingError::InvalidBuffer(format!(
            "归一化图集过大：{} 列 x {} 行，单元 {}x{}，上限 {} 像素",
            columns, rows, cell_width, cell_height, MAX_ATLAS_PIXELS
        ))),
    }
}

/// 把 `source` 中的 `rect` 逐行复制到 `target` 的 `(dest_x, dest_y)`，两侧越界部分都会被裁掉。
fn copy_rect(source: &PixelBuffer, rect: PixelRect, target: &mut PixelBuffer, dest_x: u32, dest_y: u32) {
    if rect.x >= source.width() || rect.y >= source.height() || dest_x >= target.width() || dest_y >= target.height() {
        return;
    }

    let copy_width = rect
        .width
        .min(source.width() - rect.x)
        .min(target.width() - dest_x) as usize;
    let copy_height = rect
        .height
        .min(source.height() - rect.y)
        .min(target.height() - dest_y);

    for row in 0..copy_height {
        let src_start = source.index(rect.x, rect.y + row);
        let dst_start = target.index(dest_x, dest_y + row);
        target.pixels_mut()[dst_start..dst_start + copy_width]
            .copy_from_slice(&source.pixels()[src_start..src_start + copy_width]);
    }
}
