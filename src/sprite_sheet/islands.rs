//! # 连通域（island）检测模块
//!
//! ## 设计思路
//!
//! SmartSlice 模式不依赖网格参数，而是把 alpha 达到阈值的 4 连通像素块
//! 视为一帧。输出顺序必须稳定：同一输入永远得到同一列表、同一顺序，
//! 因为帧序号通常编码了动作内的时间顺序（从左到右）。
//!
//! ## 实现思路
//!
//! 1. 阈值换算为字节 cutoff（`[1, 255]`）
//! 2. 按行主序扫描，遇到未访问的不透明像素即启动 BFS
//!    （显式 `VecDeque` + `visited` 数组，不使用递归）
//! 3. 丢弃像素数不足的块，包围盒外扩 `outer_padding` 并收敛到缓冲内
//! 4. 按“距顶部距离”分行（1px 容差），行内按 x 升序
//!
//! 外扩后相互重叠的包围盒不做合并。

use std::collections::VecDeque;

use super::frame::{IslandRegion, PixelRect};
use super::PixelBuffer;

/// 行分组容差：距顶部距离相差不超过该值的 island 视为同一行。
const ROW_TOLERANCE_PX: u32 = 1;

/// alpha 连通域检测器。
#[derive(Debug, Clone, Copy)]
pub struct IslandDetector {
    alpha_cutoff: u8,
    min_pixels: usize,
    outer_padding: u32,
}

impl IslandDetector {
    /// 创建检测器。
    ///
    /// `alpha_threshold` 按 `round(t * 255)` 换算并限制在 `[1, 255]`，
    /// `min_island_pixels` 至少为 1。
    pub fn new(alpha_threshold: f32, min_island_pixels: u32, outer_padding: u32) -> Self {
        let alpha_cutoff = (alpha_threshold * 255.0).round().clamp(1.0, 255.0) as u8;

        Self {
            alpha_cutoff,
            min_pixels: min_island_pixels.max(1) as usize,
            outer_padding,
        }
    }

    pub fn alpha_cutoff(&self) -> u8 {
        self.alpha_cutoff
    }

    /// 检测全部连通域，返回自上而下、自左而右排序的结果。
    pub fn detect(&self, buffer: &PixelBuffer) -> Vec<IslandRegion> {
        if buffer.is_empty() {
            return Vec::new();
        }

        let width = buffer.width() as usize;
        let height = buffer.height() as usize;
        let pixels = buffer.pixels();
        let is_solid = |index: usize| pixels[index].0[3] >= self.alpha_cutoff;

        let mut visited = vec![false; width * height];
        let mut queue: VecDeque<usize> = VecDeque::with_capacity(256);
        let mut regions = Vec::new();
        let mut discarded = 0usize;

        for start in 0..width * height {
            if visited[start] || !is_solid(start) {
                continue;
            }

            visited[start] = true;
            queue.push_back(start);

            let (mut min_x, mut min_y) = (start % width, start / width);
            let (mut max_x, mut max_y) = (min_x, min_y);
            let mut count = 0usize;

            while let Some(index) = queue.pop_front() {
                let cx = index % width;
                let cy = index / width;
                count += 1;

                min_x = min_x.min(cx);
                min_y = min_y.min(cy);
                max_x = max_x.max(cx);
                max_y = max_y.max(cy);

                let neighbors = [
                    (cx > 0).then(|| index - 1),
                    (cx + 1 < width).then(|| index + 1),
                    (cy > 0).then(|| index - width),
                    (cy + 1 < height).then(|| index + width),
                ];

                for next in neighbors.into_iter().flatten() {
                    if !visited[next] && is_solid(next) {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }

            if count < self.min_pixels {
                discarded += 1;
                continue;
            }

            let pad = self.outer_padding as usize;
            let x_min = min_x.saturating_sub(pad);
            let y_min = min_y.saturating_sub(pad);
            let x_max = (max_x + pad).min(width - 1);
            let y_max = (max_y + pad).min(height - 1);

            regions.push(IslandRegion {
                rect: PixelRect::new(
                    x_min as u32,
                    y_min as u32,
                    (x_max - x_min + 1) as u32,
                    (y_max - y_min + 1) as u32,
                ),
                pixel_count: count,
            });
        }

        sort_top_to_bottom(&mut regions, buffer.height());

        log::debug!(
            "🔍 连通域检测完成：{} 个有效，{} 个低于 {} 像素被丢弃（alpha cutoff={}）",
            regions.len(),
            discarded,
            self.min_pixels,
            self.alpha_cutoff
        );

        regions
    }
}

/// 自上而下分行、行内自左而右排序。
///
/// 先按 (距顶部距离, x) 做全序排序，再把距顶部距离相差不超过
/// `ROW_TOLERANCE_PX` 的相邻元素归为一行，行内按 x 重新排序。
pub(crate) fn sort_top_to_bottom(regions: &mut [IslandRegion], height: u32) {
    let top = |region: &IslandRegion| height.saturating_sub(region.rect.y_max());

    regions.sort_by_key(|region| (top(region), region.rect.x, region.rect.y));

    let mut start = 0;
    while start < regions.len() {
        let anchor = top(&regions[start]);
        let mut end = start + 1;
        while end < regions.len() && top(&regions[end]) - anchor <= ROW_TOLERANCE_PX {
            end += 1;
        }

        regions[start..end].sort_by_key(|region| (region.rect.x, top(region)));
        start = end;
    }
}
