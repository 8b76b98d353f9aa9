//! # 动作行分类模块
//!
//! ## 设计思路
//!
//! 一张 AI 生成的“多动作”精灵表通常是每行一个动作（idle / walk / attack / die）。
//! 这里用最简单的办法把连通域按垂直中心聚成 N 行：
//! 以最高、最低中心之间的距离等分 N 段，每个矩形落进对应的桶。
//!
//! 这是尽力而为的启发式，不保证聚类正确：行距不均匀时可能出现空桶，
//! 此时直接退化为扁平序列并给出 warning，不尝试“修复”。
//!
//! ## 退化规则
//!
//! | 条件 | 输出顺序 |
//! |------|----------|
//! | 矩形数 < N | 保持输入顺序 |
//! | 垂直跨度 < 1e-4 | 按 x 升序 |
//! | 行步长 < 0.5px | 按 x 升序 |
//! | 出现空桶 | 按中心 y 降序，再按 x 升序 |

use std::cmp::Ordering;

use super::frame::{FrameRect, PixelRect};

/// N == 4 时使用的动作标签（自上而下）。
pub const FOUR_ACTION_LABELS: [&str; 4] = ["idle", "walk", "attack", "die"];

const MIN_VERTICAL_RANGE: f32 = 0.0001;
const MIN_ROW_STEP: f32 = 0.5;

/// 一个动作行：标签 + 自左而右排序的矩形。
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRow {
    pub label: String,
    pub rects: Vec<PixelRect>,
}

/// 分类结果。
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// 成功拆分为 N 个具名动作行（自上而下）。
    Rows(Vec<ActionRow>),
    /// 退化为扁平编号序列。
    Flat(Vec<PixelRect>),
}

impl Classification {
    /// 转换为最终帧。
    ///
    /// 动作行命名为 `{base}_{label}_{frame:02}`，扁平序列命名为 `{base}_{i:02}`。
    pub fn into_frames(self, base_name: &str) -> Vec<FrameRect> {
        match self {
            Self::Rows(rows) => rows
                .into_iter()
                .flat_map(|row| {
                    let label = row.label;
                    row.rects
                        .into_iter()
                        .enumerate()
                        .map(move |(frame, rect)| {
                            FrameRect::new(format!("{}_{}_{:02}", base_name, label, frame), rect)
                        })
                })
                .collect(),
            Self::Flat(rects) => flat_frames(base_name, rects),
        }
    }
}

/// 扁平编号命名：`{base}_{i:02}`。
pub(crate) fn flat_frames(base_name: &str, rects: Vec<PixelRect>) -> Vec<FrameRect> {
    rects
        .into_iter()
        .enumerate()
        .map(|(i, rect)| FrameRect::new(format!("{}_{:02}", base_name, i), rect))
        .collect()
}

/// 第 `row` 行的标签。
pub fn row_label(row: usize, row_count: usize) -> String {
    if row_count == FOUR_ACTION_LABELS.len() {
        FOUR_ACTION_LABELS[row].to_string()
    } else {
        format!("row{:02}", row)
    }
}

/// 按垂直中心把矩形聚成 N 行。
#[derive(Debug, Clone, Copy)]
pub struct ActionRowClassifier {
    row_count: usize,
}

impl ActionRowClassifier {
    /// `row_count` 小于 2 时按 2 处理。
    pub fn new(row_count: u32) -> Self {
        Self {
            row_count: row_count.max(2) as usize,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// 执行分类。任何退化情况都会向 `warnings` 追加说明，但永远不会失败。
    pub fn classify(&self, mut rects: Vec<PixelRect>, warnings: &mut Vec<String>) -> Classification {
        let row_count = self.row_count;

        if rects.is_empty() {
            return Classification::Flat(rects);
        }

        if rects.len() < row_count {
            warnings.push(format!(
                "动作行拆分已跳过：帧数 ({}) 少于行数 ({})",
                rects.len(),
                row_count
            ));
            return Classification::Flat(rects);
        }

        let centers: Vec<f32> = rects.iter().map(PixelRect::center_y).collect();
        let top_center = centers.iter().copied().fold(f32::MIN, f32::max);
        let bottom_center = centers.iter().copied().fold(f32::MAX, f32::min);
        let range = top_center - bottom_center;

        if range < MIN_VERTICAL_RANGE {
            warnings.push("动作行拆分已跳过：垂直跨度过小".to_string());
            rects.sort_by_key(|rect| rect.x);
            return Classification::Flat(rects);
        }

        let step = range / row_count as f32;
        if step < MIN_ROW_STEP {
            warnings.push("动作行拆分已跳过：推算的行步长过小".to_string());
            rects.sort_by_key(|rect| rect.x);
            return Classification::Flat(rects);
        }

        let mut buckets: Vec<Vec<PixelRect>> = vec![Vec::new(); row_count];
        for (rect, center) in rects.iter().zip(&centers) {
            let row = ((top_center - center) / step).floor().clamp(0.0, (row_count - 1) as f32) as usize;
            buckets[row].push(*rect);
        }

        if buckets.iter().any(Vec::is_empty) {
            warnings.push("动作行拆分已跳过：存在空行".to_string());
            rects.sort_by(|a, b| match b.center_y().total_cmp(&a.center_y()) {
                Ordering::Equal => a.x.cmp(&b.x),
                other => other,
            });
            return Classification::Flat(rects);
        }

        let rows = buckets
            .into_iter()
            .enumerate()
            .map(|(row, mut bucket)| {
                bucket.sort_by_key(|rect| rect.x);
                ActionRow {
                    label: row_label(row, row_count),
                    rects: bucket,
                }
            })
            .collect();

        Classification::Rows(rows)
    }
}
