//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `SlicingConfig`，一次流水线运行只读取同一份不可变配置。
//! 切片模式、通道比较方式等枚举既用于逻辑分支，也作为稳定字符串写入 manifest。
//!
//! ## 实现思路
//!
//! - `Default` 提供与编辑器工具一致的出厂参数。
//! - 枚举提供 `from_str` / `as_str`，供 CLI 与 manifest 使用。
//! - `validate` 一次性收集全部违规项，合并为一条 `SlicingError::Validation`。
//! - 抠图算法中的经验常量集中在 `KeyingTuning`，默认值即调参结果。

use serde::{Deserialize, Serialize};

use super::SlicingError;

/// `sqrt(3)`：把 0~1 的容差映射到 RGB 单位立方体的欧氏距离。
pub const CUTOFF_SCALE: f32 = 1.732_050_8;
pub const FEATHER_RATIO: f32 = 0.18;
pub const FEATHER_MIN: f32 = 0.01;
pub const FEATHER_MAX: f32 = 0.08;
pub const DESPILL_RATIO: f32 = 2.2;
pub const DESPILL_MIN: f32 = 0.02;
pub const DESPILL_MAX: f32 = 0.16;
pub const DESPILL_STRENGTH: f32 = 0.35;
/// 羽化带内侧（紧贴 cutoff）保留的最小 alpha 比例。
pub const FEATHER_ALPHA_FLOOR: f32 = 0.75;
/// 低于该 alpha 的像素直接视为全透明。
pub const ALPHA_SNAP: f32 = 0.003;

/// 网格模式下 `rows * cols` 的上限。
pub const MAX_GRID_CELLS: u64 = 65_536;

/// 帧定位方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlicingMode {
    /// 按行列数等分整张图。
    AutoDivide,
    /// 按偏移 / 单元尺寸 / 间距手动描述网格。
    CustomGrid,
    /// 基于 alpha 连通域自动检测。
    SmartSlice,
}

impl SlicingMode {
    /// 从外部字符串解析模式。
    ///
    /// # 示例
    /// ```rust
    /// use sprite_slicer::sprite_sheet::SlicingMode;
    ///
    /// let mode = SlicingMode::from_str("smart")?;
    /// assert_eq!(mode.as_str(), "smart_slice");
    /// # Ok::<(), sprite_slicer::sprite_sheet::SlicingError>(())
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(mode: &str) -> Result<Self, SlicingError> {
        match mode.trim().to_lowercase().replace('-', "_").as_str() {
            "auto" | "auto_divide" | "autodivide" => Ok(Self::AutoDivide),
            "grid" | "custom_grid" | "customgrid" => Ok(Self::CustomGrid),
            "smart" | "smart_slice" | "smartslice" => Ok(Self::SmartSlice),
            other => Err(SlicingError::Validation(format!(
                "未知切片模式：{}（可选：auto_divide / custom_grid / smart_slice）",
                other
            ))),
        }
    }

    /// 稳定字符串，供 manifest 与日志使用。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutoDivide => "auto_divide",
            Self::CustomGrid => "custom_grid",
            Self::SmartSlice => "smart_slice",
        }
    }

    /// 网格类模式（不读取像素数据）。
    pub fn is_grid(self) -> bool {
        matches!(self, Self::AutoDivide | Self::CustomGrid)
    }
}

/// 单通道比较方式（范围过滤模式）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelComparison {
    Ignore,
    GreaterOrEqual,
    LessOrEqual,
}

impl ChannelComparison {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Result<Self, SlicingError> {
        match value.trim().to_lowercase().as_str() {
            "ignore" | "any" | "*" => Ok(Self::Ignore),
            "ge" | ">=" | "greater_or_equal" => Ok(Self::GreaterOrEqual),
            "le" | "<=" | "less_or_equal" => Ok(Self::LessOrEqual),
            other => Err(SlicingError::Validation(format!(
                "未知通道比较方式：{}（可选：ignore / ge / le）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ignore => "ignore",
            Self::GreaterOrEqual => "ge",
            Self::LessOrEqual => "le",
        }
    }

    /// 判断通道值是否满足比较条件。
    pub fn matches(self, value: u8, threshold: u8) -> bool {
        match self {
            Self::Ignore => true,
            Self::GreaterOrEqual => value >= threshold,
            Self::LessOrEqual => value <= threshold,
        }
    }
}

/// 单通道阈值条件。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelThreshold {
    pub threshold: u8,
    pub compare: ChannelComparison,
}

impl ChannelThreshold {
    pub fn new(threshold: u8, compare: ChannelComparison) -> Self {
        Self { threshold, compare }
    }
}

/// 背景移除方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundRemovalMode {
    /// 颜色距离抠图（带羽化与去溢色）。
    ColorDistance,
    /// 逐通道阈值过滤，无羽化。
    RangeFilter,
}

/// 颜色距离抠图的经验常量。
///
/// 默认值即调参结果；暴露出来只是为了允许调用方微调。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyingTuning {
    pub cutoff_scale: f32,
    pub feather_ratio: f32,
    pub feather_min: f32,
    pub feather_max: f32,
    pub despill_ratio: f32,
    pub despill_min: f32,
    pub despill_max: f32,
    pub despill_strength: f32,
    pub feather_alpha_floor: f32,
    pub alpha_snap: f32,
}

impl KeyingTuning {
    /// 检查调参值，违规项追加到 `problems`。
    fn collect_problems(&self, problems: &mut Vec<String>) {
        let fields = [
            ("cutoff_scale", self.cutoff_scale),
            ("feather_ratio", self.feather_ratio),
            ("feather_min", self.feather_min),
            ("feather_max", self.feather_max),
            ("despill_ratio", self.despill_ratio),
            ("despill_min", self.despill_min),
            ("despill_max", self.despill_max),
            ("despill_strength", self.despill_strength),
            ("feather_alpha_floor", self.feather_alpha_floor),
            ("alpha_snap", self.alpha_snap),
        ];

        let mut all_finite = true;
        for (name, value) in fields {
            if !value.is_finite() {
                problems.push(format!("tuning.{} 必须是有限数值（当前 {}）", name, value));
                all_finite = false;
            } else if value < 0.0 {
                problems.push(format!("tuning.{} 不能为负数（当前 {}）", name, value));
            }
        }

        if !all_finite {
            return;
        }
        if self.feather_min > self.feather_max {
            problems.push(format!(
                "tuning.feather_min ({}) 不能大于 feather_max ({})",
                self.feather_min, self.feather_max
            ));
        }
        if self.despill_min > self.despill_max {
            problems.push(format!(
                "tuning.despill_min ({}) 不能大于 despill_max ({})",
                self.despill_min, self.despill_max
            ));
        }
    }
}

impl Default for KeyingTuning {
    fn default() -> Self {
        Self {
            cutoff_scale: CUTOFF_SCALE,
            feather_ratio: FEATHER_RATIO,
            feather_min: FEATHER_MIN,
            feather_max: FEATHER_MAX,
            despill_ratio: DESPILL_RATIO,
            despill_min: DESPILL_MIN,
            despill_max: DESPILL_MAX,
            despill_strength: DESPILL_STRENGTH,
            feather_alpha_floor: FEATHER_ALPHA_FLOOR,
            alpha_snap: ALPHA_SNAP,
        }
    }
}

/// 背景移除参数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundRemovalConfig {
    pub enabled: bool,
    pub mode: BackgroundRemovalMode,
    /// 键控颜色（RGB 0~255）。
    pub key_color: [u8; 3],
    /// 颜色距离容差，范围 `[0, 1]`。
    pub tolerance: f32,
    pub red: ChannelThreshold,
    pub green: ChannelThreshold,
    pub blue: ChannelThreshold,
    pub tuning: KeyingTuning,
}

impl Default for BackgroundRemovalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: BackgroundRemovalMode::ColorDistance,
            key_color: [255, 0, 255],
            tolerance: 0.1,
            red: ChannelThreshold::new(150, ChannelComparison::GreaterOrEqual),
            green: ChannelThreshold::new(50, ChannelComparison::LessOrEqual),
            blue: ChannelThreshold::new(150, ChannelComparison::GreaterOrEqual),
            tuning: KeyingTuning::default(),
        }
    }
}

/// 一次切片流水线的完整配置。
///
/// 字段覆盖了背景移除、裁剪、帧定位与归一化四个阶段。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlicingConfig {
    pub mode: SlicingMode,
    /// 网格行数（网格模式）。
    pub rows: u32,
    /// 网格列数（网格模式）。
    pub cols: u32,
    /// 每个单元四周向内收缩的像素数。
    pub inner_padding: u32,
    /// 网格起点（顶部原点的显示坐标，仅 CustomGrid）。
    pub offset: (f32, f32),
    /// 单元尺寸（仅 CustomGrid）。
    pub cell_size: (f32, f32),
    /// 单元间距（仅 CustomGrid）。
    pub spacing: (f32, f32),
    /// 连通域 alpha 阈值，范围 `(0, 1]`。
    pub alpha_threshold: f32,
    /// 小于该像素数的连通域视为噪点。
    pub min_island_pixels: u32,
    /// 连通域包围盒向外扩展的像素数。
    pub outer_padding: u32,
    /// SmartSlice 下是否按行拆分为动作组。
    pub split_into_action_rows: bool,
    pub action_row_count: u32,
    pub background: BackgroundRemovalConfig,
    /// 网格模式下先裁剪到网格选区的包围盒。
    pub crop_to_selection: bool,
    pub normalize_frames: bool,
    /// 帧命名前缀。
    pub frame_base_name: String,
}

impl Default for SlicingConfig {
    fn default() -> Self {
        Self {
            mode: SlicingMode::AutoDivide,
            rows: 2,
            cols: 4,
            inner_padding: 4,
            offset: (0.0, 0.0),
            cell_size: (100.0, 100.0),
            spacing: (0.0, 0.0),
            alpha_threshold: 0.1,
            min_island_pixels: 64,
            outer_padding: 2,
            split_into_action_rows: false,
            action_row_count: 4,
            background: BackgroundRemovalConfig::default(),
            crop_to_selection: true,
            normalize_frames: true,
            frame_base_name: "sprite".to_string(),
        }
    }
}

impl SlicingConfig {
    /// SmartSlice 且开启按行拆分。
    pub fn splits_action_rows(&self) -> bool {
        self.mode == SlicingMode::SmartSlice && self.split_into_action_rows
    }

    /// 针对给定缓冲尺寸校验配置。
    ///
    /// 全部违规项会被收集后合并为一条消息返回，调用方只需展示一次。
    pub fn validate(&self, buffer_width: u32, buffer_height: u32) -> Result<(), SlicingError> {
        let mut problems: Vec<String> = Vec::new();

        if buffer_width == 0 || buffer_height == 0 {
            problems.push(format!("源图尺寸无效：{}x{}", buffer_width, buffer_height));
        }

        if self.mode.is_grid() {
            if self.rows == 0 || self.cols == 0 {
                problems.push(format!("rows/cols 必须 >= 1（当前 {}x{}）", self.rows, self.cols));
            } else if self.rows as u64 * self.cols as u64 > MAX_GRID_CELLS {
                problems.push(format!(
                    "网格单元过多：{}x{} 超过上限 {}",
                    self.rows, self.cols, MAX_GRID_CELLS
                ));
            }

            let cell = match self.mode {
                SlicingMode::CustomGrid => {
                    let geometry = [
                        self.offset.0,
                        self.offset.1,
                        self.cell_size.0,
                        self.cell_size.1,
                        self.spacing.0,
                        self.spacing.1,
                    ];
                    if !geometry.iter().all(|v| v.is_finite()) {
                        problems.push("CustomGrid 的 offset/cell_size/spacing 必须是有限数值".to_string());
                        None
                    } else if self.cell_size.0 <= 0.0 || self.cell_size.1 <= 0.0 {
                        problems.push(format!(
                            "CustomGrid 的 cell_size 必须 > 0（当前 {}x{}）",
                            self.cell_size.0, self.cell_size.1
                        ));
                        None
                    } else {
                        Some(self.cell_size)
                    }
                }
                _ if self.rows > 0 && self.cols > 0 => Some((
                    buffer_width as f32 / self.cols as f32,
                    buffer_height as f32 / self.rows as f32,
                )),
                _ => None,
            };

            if let Some((cell_w, cell_h)) = cell {
                let max_padding = cell_w.min(cell_h) * 0.5;
                if self.inner_padding as f32 >= max_padding {
                    problems.push(format!(
                        "inner_padding={} 过大：必须小于单元最短边的一半（{:.2}）",
                        self.inner_padding, max_padding
                    ));
                }
            }
        }

        if !(self.alpha_threshold > 0.0 && self.alpha_threshold <= 1.0) {
            problems.push(format!("alpha_threshold 必须在 (0, 1] 之间（当前 {}）", self.alpha_threshold));
        }

        if self.min_island_pixels < 1 {
            problems.push("min_island_pixels 必须 >= 1".to_string());
        }

        if self.splits_action_rows() && self.action_row_count < 2 {
            problems.push(format!("action_row_count 必须 >= 2（当前 {}）", self.action_row_count));
        }

        let tolerance = self.background.tolerance;
        if !(0.0..=1.0).contains(&tolerance) {
            problems.push(format!("tolerance 必须在 [0, 1] 之间（当前 {}）", tolerance));
        }

        self.background.tuning.collect_problems(&mut problems);

        if problems.is_empty() {
            Ok(())
        } else {
            Err(SlicingError::Validation(problems.join("；")))
        }
    }
}
