//! # 精灵表预处理工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                 CLI (sprite-slicer, clap)                │
//! │                                                          │
//! │  解码 PNG ── 合并配置 ── 写出图集 / 帧列表 / manifest    │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Result<T, AppError>
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            核心库 (Rust)                         │
//! │                                                          │
//! │  ┌─ error ────── AppError (应用层统一错误类型)           │
//! │  │                                                       │
//! │  └─ sprite_sheet                                         │
//! │      ├─ handler     SlicingOrchestrator 统一编排         │
//! │      ├─ background  色键抠图                             │
//! │      ├─ grid        网格切片 + 选区裁剪                  │
//! │      ├─ islands     alpha 连通域                         │
//! │      ├─ classifier  动作行拆分                           │
//! │      ├─ normalizer  帧归一化                             │
//! │      └─ manifest    manifest.json 读写                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 应用层统一错误类型 `AppError`，CLI 与 manifest 读写的返回类型 |
//! | [`sprite_sheet`] | 背景移除、帧定位、动作行拆分、归一化与 manifest 模型 |

pub mod error;
pub mod sprite_sheet;
