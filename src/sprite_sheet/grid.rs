//! # 网格切片模块
//!
//! ## 设计思路
//!
//! 网格模式完全不读取像素，只根据行列、偏移、单元尺寸、间距与内边距计算矩形。
//! 配置中的行号与偏移使用“顶部原点”的显示坐标，而缓冲使用“底部原点”，
//! 所以每个单元都要做一次坐标翻转：
//!
//! ```text
//! guiY           = offsetY + r * (cellH + spacingY)
//! textureBottomY = H - (guiY + cellH)
//! rect.y         = textureBottomY + padding
//! rect.x         = offsetX + c * (cellW + spacingX) + padding
//! ```
//!
//! AutoDivide 的单元尺寸是 `W / C` 这类小数，四条边先四舍五入到整像素再收缩，
//! 相邻单元共享同一条边，每帧与 `W / C` 的差距不超过 1px。
//! CustomGrid 严格按上面的公式计算，小数边缘交给 `PixelRect::clamp_to_bounds` 处理。
//!
//! ## 实现思路
//!
//! - `GridGeometry` 把 AutoDivide / CustomGrid 统一成同一组几何参数。
//! - 单元收缩为空或完全越界时跳过并记录 warning，不让整条流水线失败。
//! - `selection_bounds` 计算整个网格选区的包围盒，供“裁剪到选区”使用。

use super::config::{SlicingConfig, SlicingMode};
use super::frame::{FrameRect, PixelRect};

/// 已解析的网格几何参数（顶部原点的显示坐标）。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    pub rows: u32,
    pub cols: u32,
    pub cell: (f32, f32),
    pub offset: (f32, f32),
    pub spacing: (f32, f32),
    pub inner_padding: u32,
    /// 是否把单元边缘吸附到整像素（仅 AutoDivide）。
    pub snap_edges: bool,
}

/// 网格选区包围盒。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionBounds {
    /// 底部原点的裁剪矩形。
    pub rect: PixelRect,
    /// 裁剪矩形上边缘到缓冲顶部的距离（显示坐标下的纵向偏移）。
    pub top: f32,
}

impl GridGeometry {
    /// AutoDivide：按行列数等分整个缓冲。
    pub fn auto_divide(width: u32, height: u32, rows: u32, cols: u32, inner_padding: u32) -> Self {
        let rows = rows.max(1);
        let cols = cols.max(1);

        Self {
            rows,
            cols,
            cell: (width as f32 / cols as f32, height as f32 / rows as f32),
            offset: (0.0, 0.0),
            spacing: (0.0, 0.0),
            inner_padding,
            snap_edges: true,
        }
    }

    /// 根据配置解析几何参数。SmartSlice 下返回 `None`。
    pub fn from_config(config: &SlicingConfig, width: u32, height: u32) -> Option<Self> {
        match config.mode {
            SlicingMode::AutoDivide => Some(Self::auto_divide(
                width,
                height,
                config.rows,
                config.cols,
                config.inner_padding,
            )),
            SlicingMode::CustomGrid => Some(Self {
                rows: config.rows,
                cols: config.cols,
                cell: config.cell_size,
                offset: config.offset,
                spacing: config.spacing,
                inner_padding: config.inner_padding,
                snap_edges: false,
            }),
            SlicingMode::SmartSlice => None,
        }
    }

    /// 网格整体选区在缓冲中的包围盒。
    pub fn selection_bounds(&self, width: u32, height: u32) -> Option<SelectionBounds> {
        if width == 0 || height == 0 || self.rows == 0 || self.cols == 0 {
            return None;
        }

        let (cell_w, cell_h) = self.cell;
        let (off_x, off_y) = self.offset;
        let (spc_x, spc_y) = self.spacing;
        let cols = self.cols as f32;
        let rows = self.rows as f32;

        let max_x = off_x + cols * cell_w + (cols - 1.0) * spc_x;
        let max_y_top = off_y + rows * cell_h + (rows - 1.0) * spc_y;

        let w_total = width as i64;
        let h_total = height as i64;
        let x = (off_x.floor() as i64).clamp(0, w_total - 1);
        let y = ((height as f32 - max_y_top).floor() as i64).clamp(0, h_total - 1);
        let w = ((max_x - off_x).ceil() as i64).clamp(1, w_total - x);
        let h = ((max_y_top - off_y).ceil() as i64).clamp(1, h_total - y);

        Some(SelectionBounds {
            rect: PixelRect::new(x as u32, y as u32, w as u32, h as u32),
            top: (h_total - (y + h)) as f32,
        })
    }

    fn edges(&self, start: f32, size: f32) -> (f32, f32) {
        if self.snap_edges {
            (start.round(), (start + size).round())
        } else {
            (start, start + size)
        }
    }
}

/// 网格帧切片器。
pub struct GridFrameSlicer;

impl GridFrameSlicer {
    /// 计算所有网格帧。
    ///
    /// 返回的帧按行（自上而下）、列（自左而右）排列，命名为 `{base}_{r}_{c}`。
    /// 收缩为空或越界的单元会被跳过，并向 `warnings` 追加一条说明。
    pub fn slice(
        geometry: &GridGeometry,
        width: u32,
        height: u32,
        base_name: &str,
        warnings: &mut Vec<String>,
    ) -> Vec<FrameRect> {
        let mut frames = Vec::new();
        let (cell_w, cell_h) = geometry.cell;
        let (off_x, off_y) = geometry.offset;
        let (spc_x, spc_y) = geometry.spacing;
        let padding = geometry.inner_padding as f32;

        for r in 0..geometry.rows {
            for c in 0..geometry.cols {
                let gui_y = off_y + r as f32 * (cell_h + spc_y);
                let cell_x = off_x + c as f32 * (cell_w + spc_x);
                let (gui_top, gui_bottom) = geometry.edges(gui_y, cell_h);
                let (left, right) = geometry.edges(cell_x, cell_w);
                let texture_bottom_y = height as f32 - gui_bottom;

                let x = left + padding;
                let y = texture_bottom_y + padding;
                let w = right - left - padding * 2.0;
                let h = gui_bottom - gui_top - padding * 2.0;

                if w <= 0.0 || h <= 0.0 {
                    warnings.push(format!("网格帧 ({},{}) 收缩为空尺寸，已跳过", r, c));
                    continue;
                }

                match PixelRect::clamp_to_bounds(x, y, w, h, width, height) {
                    Some(rect) => frames.push(FrameRect::new(format!("{}_{}_{}", base_name, r, c), rect)),
                    None => warnings.push(format!("网格帧 ({},{}) 超出图像范围，已跳过", r, c)),
                }
            }
        }

        frames
    }
}
