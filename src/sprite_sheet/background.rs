//! # 背景移除模块（色键抠图）
//!
//! ## 设计思路
//!
//! AI 生成的精灵表通常带有一块纯色（或近似纯色）背景。这里提供两种移除方式：
//!
//! - **范围过滤**：逐通道与阈值比较，三通道全部命中则 alpha 置 0，不做羽化。
//! - **颜色距离**（默认）：在 RGB 单位立方体内计算到键控色的欧氏距离，
//!   cutoff 内直接透明，cutoff 外的窄带做羽化，再做一圈“去溢色”。
//!
//! 平均绝对差会低估洋红 (1,0,1) 与蓝 (0,0,1) 的差异，导致角色本体被一起抠掉，
//! 所以距离模式使用欧氏距离。
//!
//! ## 实现思路
//!
//! 1. `from_config` 时预先算好 cutoff / feather / despill 三个半径
//! 2. 逐像素原地修改，距离超出所有带宽的像素完全不写回（避免量化漂移）
//! 3. 返回 `RemovalStats` 供编排层记录日志

use image::Rgba;

use super::config::{BackgroundRemovalConfig, BackgroundRemovalMode, ChannelThreshold, KeyingTuning};
use super::PixelBuffer;

/// 数值保护，避免除零。
const MIN_DIVISOR: f32 = 0.0001;

/// 一次背景移除的统计信息。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovalStats {
    /// 被置为完全透明的像素数。
    pub removed: usize,
    /// 被羽化或去溢色修改但仍可见的像素数。
    pub softened: usize,
}

/// 色键背景移除器。
#[derive(Debug, Clone)]
pub enum ColorKeyBackgroundRemover {
    RangeFilter {
        red: ChannelThreshold,
        green: ChannelThreshold,
        blue: ChannelThreshold,
    },
    ColorDistance {
        key: [f32; 3],
        key_dir: [f32; 3],
        cutoff: f32,
        feather: f32,
        despill_range: f32,
        tuning: KeyingTuning,
    },
}

impl ColorKeyBackgroundRemover {
    /// 根据配置构建移除器，并预计算距离带宽。
    pub fn from_config(config: &BackgroundRemovalConfig) -> Self {
        match config.mode {
            BackgroundRemovalMode::RangeFilter => Self::RangeFilter {
                red: config.red,
                green: config.green,
                blue: config.blue,
            },
            BackgroundRemovalMode::ColorDistance => {
                Self::color_distance(config.key_color, config.tolerance, config.tuning)
            }
        }
    }

    /// 构建颜色距离移除器。
    ///
    /// `cutoff = tolerance * sqrt(3)`，
    /// `feather = clamp(tolerance * 0.18, 0.01, 0.08)`，
    /// `despill = clamp(feather * 2.2, 0.02, 0.16)`（默认调参下）。
    pub fn color_distance(key_color: [u8; 3], tolerance: f32, tuning: KeyingTuning) -> Self {
        let tolerance = tolerance.clamp(0.0, 1.0);
        let cutoff = tolerance * tuning.cutoff_scale;
        let feather = bounded(tolerance * tuning.feather_ratio, tuning.feather_min, tuning.feather_max);
        let despill_range = bounded(feather * tuning.despill_ratio, tuning.despill_min, tuning.despill_max);

        let key = key_color.map(|c| c as f32 / 255.0);
        let key_mag = length(key).max(MIN_DIVISOR);
        let key_dir = key.map(|c| c / key_mag);

        Self::ColorDistance {
            key,
            key_dir,
            cutoff,
            feather,
            despill_range,
            tuning,
        }
    }

    /// 原地处理整张缓冲。
    pub fn apply(&self, buffer: &mut PixelBuffer) -> RemovalStats {
        let mut stats = RemovalStats::default();

        match self {
            Self::RangeFilter { red, green, blue } => {
                for pixel in buffer.pixels_mut() {
                    let [r, g, b, _] = pixel.0;
                    if red.compare.matches(r, red.threshold)
                        && green.compare.matches(g, green.threshold)
                        && blue.compare.matches(b, blue.threshold)
                    {
                        pixel.0[3] = 0;
                        stats.removed += 1;
                    }
                }
            }
            Self::ColorDistance { .. } => {
                for pixel in buffer.pixels_mut() {
                    match self.key_pixel(pixel) {
                        PixelOutcome::Removed => stats.removed += 1,
                        PixelOutcome::Softened => stats.softened += 1,
                        PixelOutcome::Untouched => {}
                    }
                }
            }
        }

        stats
    }

    fn key_pixel(&self, pixel: &mut Rgba<u8>) -> PixelOutcome {
        let Self::ColorDistance {
            key,
            key_dir,
            cutoff,
            feather,
            despill_range,
            tuning,
        } = self
        else {
            return PixelOutcome::Untouched;
        };

        let [r, g, b, a] = pixel.0;
        let mut rgb = [r, g, b].map(|c| c as f32 / 255.0);
        let mut alpha = a as f32 / 255.0;
        let dist = distance(rgb, *key);

        if dist <= *cutoff {
            pixel.0[3] = 0;
            return PixelOutcome::Removed;
        }

        if dist > cutoff + feather.max(*despill_range) {
            return PixelOutcome::Untouched;
        }

        // 羽化带：只做浅羽化，避免本体变透明
        if dist <= cutoff + feather {
            let t = ((dist - cutoff) / feather.max(MIN_DIVISOR)).clamp(0.0, 1.0);
            alpha *= lerp(tuning.feather_alpha_floor, 1.0, t);
        }

        // 去溢色：只削弱键控色方向的分量，alpha 不变
        if dist <= cutoff + despill_range && alpha > 0.0 {
            let near = 1.0 - ((dist - cutoff) / despill_range.max(MIN_DIVISOR)).clamp(0.0, 1.0);
            let projection = dot(rgb, *key_dir).max(0.0);
            let strength = near * tuning.despill_strength;
            for (channel, dir) in rgb.iter_mut().zip(key_dir) {
                *channel = (*channel - dir * projection * strength).clamp(0.0, 1.0);
            }
        }

        if alpha <= tuning.alpha_snap {
            alpha = 0.0;
        }

        let [r, g, b] = rgb.map(to_byte);
        *pixel = Rgba([r, g, b, to_byte(alpha)]);

        if alpha == 0.0 {
            PixelOutcome::Removed
        } else {
            PixelOutcome::Softened
        }
    }
}

enum PixelOutcome {
    Removed,
    Softened,
    Untouched,
}

/// 与 `f32::clamp` 相同，但 `min > max` 或边界为 NaN 时不 panic（上界优先）。
fn bounded(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn length(v: [f32; 3]) -> f32 {
    dot(v, v).sqrt()
}

fn distance(a: [f32; 3], b: [f32; 3]) -> f32 {
    length([a[0] - b[0], a[1] - b[1], a[2] - b[2]])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprite_sheet::config::ChannelComparison;

    const MAGENTA: [u8; 3] = [255, 0, 255];

    fn single_pixel(pixel: [u8; 4]) -> PixelBuffer {
        PixelBuffer::from_pixels(1, 1, vec![Rgba(pixel)]).expect("1x1 buffer")
    }

    fn key_one(pixel: [u8; 4], key: [u8; 3], tolerance: f32) -> Rgba<u8> {
        let mut buffer = single_pixel(pixel);
        ColorKeyBackgroundRemover::color_distance(key, tolerance, KeyingTuning::default()).apply(&mut buffer);
        buffer.pixels()[0]
    }

    #[test]
    fn key_color_is_always_transparent() {
        for tolerance in [0.0001, 0.01, 0.1, 0.35, 0.9, 1.0] {
            let keyed = key_one([255, 0, 255, 255], MAGENTA, tolerance);
            assert_eq!(keyed.0[3], 0, "tolerance={tolerance}");
        }
    }

    #[test]
    fn derived_radii_match_defaults() {
        let remover = ColorKeyBackgroundRemover::color_distance(MAGENTA, 0.1, KeyingTuning::default());
        let ColorKeyBackgroundRemover::ColorDistance {
            cutoff,
            feather,
            despill_range,
            ..
        } = remover
        else {
            panic!("expected color distance remover");
        };

        assert!((cutoff - 0.173_205).abs() < 1e-4);
        assert!((feather - 0.018).abs() < 1e-6);
        assert!((despill_range - 0.0396).abs() < 1e-5);
    }

    #[test]
    fn far_pixel_stays_fully_opaque_and_untouched() {
        // 与洋红的距离约 0.502，远大于 cutoff + feather + despill
        let original = [255, 128, 255, 255];
        let keyed = key_one(original, MAGENTA, 0.1);
        assert_eq!(keyed.0, original);
    }

    #[test]
    fn feather_band_softens_alpha_and_despills() {
        // g=46 → 距离约 0.1804，落在 (0.1732, 0.1912] 羽化带内
        let keyed = key_one([255, 46, 255, 255], MAGENTA, 0.1);

        let [r, g, b, a] = keyed.0;
        assert!(a > 191 && a < 255, "alpha={a}");
        assert!(r < 255 && b < 255, "spill should be reduced: r={r} b={b}");
        assert_eq!(g, 46);
    }

    #[test]
    fn black_key_removes_black_without_despill() {
        let keyed = key_one([0, 0, 0, 255], [0, 0, 0], 0.05);
        assert_eq!(keyed.0[3], 0);

        let near = key_one([20, 20, 20, 255], [0, 0, 0], 0.05);
        assert_eq!(&near.0[..3], &[20, 20, 20]);
    }

    #[test]
    fn inverted_tuning_bounds_do_not_panic() {
        let tuning = KeyingTuning {
            feather_min: 0.5,
            feather_max: 0.1,
            despill_min: f32::NAN,
            ..KeyingTuning::default()
        };
        let mut buffer = single_pixel([255, 0, 255, 255]);

        ColorKeyBackgroundRemover::color_distance(MAGENTA, 0.1, tuning).apply(&mut buffer);

        assert_eq!(buffer.pixels()[0].0[3], 0);
    }

    #[test]
    fn range_filter_requires_all_channels() {
        let config = BackgroundRemovalConfig {
            mode: BackgroundRemovalMode::RangeFilter,
            ..BackgroundRemovalConfig::default()
        };
        let remover = ColorKeyBackgroundRemover::from_config(&config);

        let mut buffer = PixelBuffer::from_pixels(
            3,
            1,
            vec![
                Rgba([200, 30, 200, 255]),
                Rgba([100, 30, 200, 255]),
                Rgba([200, 51, 200, 255]),
            ],
        )
        .expect("3x1 buffer");

        let stats = remover.apply(&mut buffer);

        assert_eq!(stats.removed, 1);
        assert_eq!(buffer.pixels()[0].0[3], 0);
        assert_eq!(buffer.pixels()[1].0[3], 255);
        assert_eq!(buffer.pixels()[2].0[3], 255);
    }

    #[test]
    fn range_filter_ignore_matches_everything() {
        let ignore = ChannelThreshold::new(0, ChannelComparison::Ignore);
        let remover = ColorKeyBackgroundRemover::RangeFilter {
            red: ignore,
            green: ignore,
            blue: ignore,
        };
        let mut buffer = single_pixel([12, 34, 56, 255]);

        remover.apply(&mut buffer);

        assert_eq!(buffer.pixels()[0].0, [12, 34, 56, 0]);
    }
}
