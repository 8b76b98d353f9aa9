//! # 帧矩形与中间模型
//!
//! ## 设计思路
//!
//! 将“流水线中间结果”和“对外输出”拆成独立类型：
//! - `PixelRect` 表示纯几何矩形（底部原点、整数像素）
//! - `IslandRegion` 表示连通域检测的瞬时产物
//! - `FrameRect` 表示带名称与 pivot 的最终帧
//! - `ProcessResult` 表示一次流水线运行的完整输出
//!
//! 浮点矩形 → 整数矩形的收敛规则集中在 `PixelRect::clamp_to_bounds`，
//! 网格切片与连通域检测共用同一套规则，避免两处 off-by-one 不一致。

use serde::{Deserialize, Serialize};

use super::PixelBuffer;

/// 默认 pivot：水平居中、底边对齐。
pub const DEFAULT_PIVOT: (f32, f32) = (0.5, 0.0);

/// 浮点边界取整时使用的容差，避免 `99.99999` 被 ceil 成多出一列。
const CLAMP_EPSILON: f32 = 0.0001;

/// 底部原点的整数像素矩形。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 右边界（不含）。
    pub fn x_max(&self) -> u32 {
        self.x + self.width
    }

    /// 上边界（不含）。
    pub fn y_max(&self) -> u32 {
        self.y + self.height
    }

    /// 垂直中心（底部原点）。
    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.0
    }

    /// 判断矩形是否完整落在 `width x height` 的缓冲内且尺寸非零。
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.width > 0 && self.height > 0 && self.x_max() <= width && self.y_max() <= height
    }

    /// 将浮点矩形收敛到缓冲范围内。
    ///
    /// # 规则
    /// 1. 非有限值、非正尺寸、与缓冲完全不相交 → `None`
    /// 2. 四条边先 clamp 到 `[0, dim]`
    /// 3. 下边界 `floor(min + ε)`，上边界 `ceil(max - ε)`
    /// 4. 至少保留 1px
    pub fn clamp_to_bounds(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        bounds_width: u32,
        bounds_height: u32,
    ) -> Option<Self> {
        if bounds_width == 0 || bounds_height == 0 {
            return None;
        }
        if ![x, y, width, height].iter().all(|v| v.is_finite()) || width <= 0.0 || height <= 0.0 {
            return None;
        }

        let bw = bounds_width as f32;
        let bh = bounds_height as f32;
        let x_max = x + width;
        let y_max = y + height;

        if x_max <= 0.0 || y_max <= 0.0 || x >= bw || y >= bh {
            return None;
        }

        let x_min_i = clamp_floor(x.clamp(0.0, bw), bounds_width);
        let y_min_i = clamp_floor(y.clamp(0.0, bh), bounds_height);
        let x_max_i = clamp_ceil(x_max.clamp(0.0, bw), x_min_i + 1, bounds_width);
        let y_max_i = clamp_ceil(y_max.clamp(0.0, bh), y_min_i + 1, bounds_height);

        if x_max_i <= x_min_i || y_max_i <= y_min_i {
            return None;
        }

        Some(Self::new(x_min_i, y_min_i, x_max_i - x_min_i, y_max_i - y_min_i))
    }
}

fn clamp_floor(value: f32, dimension: u32) -> u32 {
    let floored = (value + CLAMP_EPSILON).floor() as i64;
    floored.clamp(0, dimension as i64 - 1) as u32
}

fn clamp_ceil(value: f32, min: u32, dimension: u32) -> u32 {
    let ceiled = (value - CLAMP_EPSILON).ceil() as i64;
    ceiled.clamp(min as i64, dimension as i64) as u32
}

/// 连通域检测结果：包围盒 + 像素数。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IslandRegion {
    pub rect: PixelRect,
    pub pixel_count: usize,
}

/// 最终输出的动画帧。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRect {
    pub name: String,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub pivot: (f32, f32),
}

impl FrameRect {
    /// 以默认 pivot 创建帧。
    pub fn new(name: impl Into<String>, rect: PixelRect) -> Self {
        Self {
            name: name.into(),
            x: rect.x,
            y: rect.y,
            width: rect.width,
            height: rect.height,
            pivot: DEFAULT_PIVOT,
        }
    }

    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.x, self.y, self.width, self.height)
    }
}

/// 计算帧列表中的最大宽高（用于 manifest 与归一化）。
pub fn max_frame_size(frames: &[FrameRect]) -> (u32, u32) {
    frames.iter().fold((0, 0), |(max_w, max_h), frame| {
        (max_w.max(frame.width), max_h.max(frame.height))
    })
}

/// 一次流水线运行的输出。
#[derive(Debug, Clone)]
pub struct ProcessResult {
    /// 处理后的像素缓冲（可能已裁剪或归一化）。
    pub buffer: PixelBuffer,
    /// 有序帧列表，坐标位于 `buffer` 内。
    pub frames: Vec<FrameRect>,
    /// 各阶段累计的非致命警告。
    pub warnings: Vec<String>,
    /// 是否执行了帧归一化。
    pub normalized: bool,
    pub max_frame_width: u32,
    pub max_frame_height: u32,
}
