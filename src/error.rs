//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 核心流水线只返回 `SlicingError`；文件读写、图片编解码、manifest 与配置文件
//! 这些“外层”失败在这里统一为 `AppError`，CLI 入口只需处理一种错误。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `SlicingError` / `io::Error` / `ImageError` 提供 `From` 转换，无需手动 map。

use crate::sprite_sheet::SlicingError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 切片流水线错误（配置校验 / 缓冲非法）
    #[error("{0}")]
    Slicing(#[from] SlicingError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 图片解码或编码失败
    #[error("图片编解码失败: {0}")]
    Image(#[from] image::ImageError),

    /// manifest 读写失败
    #[error("manifest 错误: {0}")]
    Manifest(String),

    /// 配置文件或命令行参数无效
    #[error("配置错误: {0}")]
    Config(String),
}

impl From<AppError> for String {
    fn from(error: AppError) -> Self {
        error.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slicing_error_message_passes_through() {
        let error: AppError = SlicingError::Validation("rows/cols 必须 >= 1".to_string()).into();
        assert_eq!(String::from(error), "配置校验失败：rows/cols 必须 >= 1");
    }
}
