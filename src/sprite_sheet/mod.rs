//! # 精灵表切片模块（sprite_sheet）
//!
//! ## 设计思路
//!
//! 该模块把“AI 生成的精灵表 → 引擎可直接使用的帧列表”拆成若干独立阶段，
//! 每个阶段都是纯函数式的：输入缓冲与配置，输出新缓冲 / 矩形 / 警告。
//!
//! - `config`：配置、枚举与校验
//! - `buffer`：底部原点的 RGBA8 像素缓冲
//! - `background`：色键背景移除（颜色距离 / 范围过滤）
//! - `grid`：AutoDivide / CustomGrid 网格切片与选区计算
//! - `islands`：alpha 连通域检测（SmartSlice）
//! - `classifier`：按垂直中心拆分动作行
//! - `normalizer`：统一帧尺寸并重排为图集
//! - `handler`：编排整条流水线
//! - `cache` / `manifest` / `naming`：缓存、manifest 与输出命名
//!
//! ## 新同事快速上手
//!
//! 可以按下面顺序理解调用链：
//!
//! ```text
//! 调用方（CLI / 编辑器）
//!    ↓
//! handler.rs（校验 + 统一编排 + 阶段耗时日志）
//!    ├─ background.rs（抠图，原地修改副本）
//!    ├─ grid.rs（选区裁剪 + 网格帧）
//!    ├─ islands.rs → classifier.rs（连通域 + 动作行）
//!    └─ normalizer.rs（统一单元图集）
//!    ↓
//! ProcessResult { buffer, frames, warnings }
//!    ↓
//! manifest.rs（合并写入 manifest.json，可选）
//! ```
//!
//! ## 分层职责建议
//!
//! - 新增配置项优先改 `config.rs`，同时补 `validate`
//! - 流程顺序变更优先改 `handler.rs`
//! - 单阶段算法优化分别改对应子模块，不要在编排层写像素逻辑

mod background;
mod buffer;
mod cache;
mod classifier;
mod config;
mod error;
mod frame;
mod grid;
mod handler;
mod islands;
mod manifest;
mod naming;
mod normalizer;

pub use background::{ColorKeyBackgroundRemover, RemovalStats};
pub use buffer::{PixelBuffer, TRANSPARENT};
pub use cache::FrameRectCache;
pub use classifier::{ActionRow, ActionRowClassifier, Classification, FOUR_ACTION_LABELS};
pub use config::{
    BackgroundRemovalConfig, BackgroundRemovalMode, ChannelComparison, ChannelThreshold, KeyingTuning,
    SlicingConfig, SlicingMode,
};
pub use error::SlicingError;
pub use frame::{DEFAULT_PIVOT, FrameRect, IslandRegion, PixelRect, ProcessResult, max_frame_size};
pub use grid::{GridFrameSlicer, GridGeometry, SelectionBounds};
pub use handler::{EMPTY_RESULT_WARNING, SlicingOrchestrator};
pub use islands::IslandDetector;
pub use manifest::{MANIFEST_FILE_NAME, ManifestActionRecord, ManifestOptions, RunSummary, SpriteManifest};
pub use naming::{ActionGroup, MULTI_ACTION_GROUP, processed_file_name, processed_stem, resolve_group_name};
pub use normalizer::{FrameNormalizer, MAX_ATLAS_PIXELS, NormalizedAtlas};
