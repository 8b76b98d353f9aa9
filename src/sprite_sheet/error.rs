//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 切片流水线只有两类“硬失败”：配置非法、输入缓冲非法。
//! 其余问题（单帧越界、聚类退化、结果为空）都以 warning 字符串形式随结果返回，
//! 不会中断整条流水线。

/// 切片流水线统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlicingError {
    /// 配置校验失败。所有违规项会被合并为一条消息。
    #[error("配置校验失败：{0}")]
    Validation(String),

    /// 像素缓冲尺寸、裁剪区域或归一化图集尺寸非法。
    #[error("像素缓冲无效：{0}")]
    InvalidBuffer(String),
}

impl From<SlicingError> for String {
    /// 兼容部分仍使用字符串错误的调用点。
    fn from(error: SlicingError) -> Self {
        error.to_string()
    }
}
