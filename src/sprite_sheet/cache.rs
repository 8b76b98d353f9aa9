//! # 帧矩形缓存
//!
//! 预览类调用方会用同一张图、同一份配置反复调用流水线。
//! `FrameRectCache` 只记住最近一次结果，由调用方持有（`&mut`），不存在全局状态。
//!
//! 缓存键 = 配置的 JSON 字节 + 像素缓冲内容的哈希。配置里有浮点字段无法直接 `Hash`，
//! 序列化后再哈希可以覆盖全部字段。

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::config::SlicingConfig;
use super::frame::ProcessResult;
use super::PixelBuffer;

/// 最近一次流水线结果的缓存。
#[derive(Debug, Clone, Default)]
pub struct FrameRectCache {
    entry: Option<(u64, ProcessResult)>,
}

impl FrameRectCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 计算缓存键；配置无法序列化时返回 `None`（即不缓存）。
    pub fn key_for(buffer: &PixelBuffer, config: &SlicingConfig) -> Option<u64> {
        let config_bytes = serde_json::to_vec(config).ok()?;
        let mut hasher = DefaultHasher::new();
        config_bytes.hash(&mut hasher);
        buffer.hash(&mut hasher);
        Some(hasher.finish())
    }

    pub(crate) fn lookup(&self, key: u64) -> Option<&ProcessResult> {
        self.entry
            .as_ref()
            .filter(|(cached_key, _)| *cached_key == key)
            .map(|(_, result)| result)
    }

    pub(crate) fn store(&mut self, key: u64, result: ProcessResult) {
        self.entry = Some((key, result));
    }

    /// 清空缓存，下一次调用必定重新计算。
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_changes_with_config_and_pixels() {
        let buffer = PixelBuffer::new_transparent(8, 8);
        let config = SlicingConfig::default();
        let base = FrameRectCache::key_for(&buffer, &config).expect("key");

        let tweaked = SlicingConfig {
            alpha_threshold: 0.2,
            ..SlicingConfig::default()
        };
        assert_ne!(FrameRectCache::key_for(&buffer, &tweaked), Some(base));

        let mut painted = buffer.clone();
        painted.put(3, 3, image::Rgba([1, 2, 3, 255]));
        assert_ne!(FrameRectCache::key_for(&painted, &config), Some(base));

        assert_eq!(FrameRectCache::key_for(&buffer, &config), Some(base));
    }
}
