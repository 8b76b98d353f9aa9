//! # 像素缓冲模块
//!
//! ## 设计思路
//!
//! `PixelBuffer` 是所有阶段共享的 RGBA8 栅格。帧矩形使用“左下角原点”的坐标系，
//! 因此缓冲内部同样按“第 0 行 = 图像最底部一行”存储，矩形坐标可以直接索引像素，
//! 无需在每个算法里反复做 Y 轴翻转。
//!
//! ## 实现思路
//!
//! - 与 `image::RgbaImage`（第 0 行在顶部）互转时统一在这里翻转行序。
//! - 所有可能越界的构造/裁剪操作都返回 `Result`，不在库代码里 panic。

use image::{ImageBuffer, Rgba, RgbaImage};

use super::SlicingError;

/// 完全透明像素。
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// RGBA8 像素缓冲（行主序，第 0 行为图像底部）。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba<u8>>,
}

impl PixelBuffer {
    /// 创建指定尺寸、完全透明的缓冲。
    pub fn new_transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![TRANSPARENT; width as usize * height as usize],
        }
    }

    /// 由底向上排列的像素数组构造缓冲。
    ///
    /// 像素数量必须严格等于 `width * height`。
    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Rgba<u8>>) -> Result<Self, SlicingError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| SlicingError::InvalidBuffer("缓冲尺寸溢出".to_string()))?;

        if pixels.len() != expected {
            return Err(SlicingError::InvalidBuffer(format!(
                "像素数量 {} 与尺寸 {}x{} 不一致",
                pixels.len(),
                width,
                height
            )));
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// 从 `image` 解码结果构造（翻转为底部原点）。
    pub fn from_rgba_image(image: &RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for image_y in (0..height).rev() {
            for x in 0..width {
                pixels.push(*image.get_pixel(x, image_y));
            }
        }

        Self {
            width,
            height,
            pixels,
        }
    }

    /// 转回 `image::RgbaImage`（顶部原点），用于编码输出。
    pub fn to_rgba_image(&self) -> RgbaImage {
        let height = self.height;
        ImageBuffer::from_fn(self.width, self.height, |x, image_y| {
            self.pixels[self.index(x, height - 1 - image_y)]
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> &[Rgba<u8>] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Rgba<u8>] {
        &mut self.pixels
    }

    /// 底部原点坐标 → 线性下标。调用方负责保证坐标在范围内。
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// 读取像素，越界时返回 `None`。
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// 写入像素，越界写入会被忽略并返回 `false`。
    pub fn put(&mut self, x: u32, y: u32, pixel: Rgba<u8>) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = self.index(x, y);
        self.pixels[index] = pixel;
        true
    }

    /// 按底部原点矩形裁剪出新的缓冲。
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Self, SlicingError> {
        let fits = width > 0
            && height > 0
            && x.checked_add(width).is_some_and(|x_max| x_max <= self.width)
            && y.checked_add(height).is_some_and(|y_max| y_max <= self.height);

        if !fits {
            return Err(SlicingError::InvalidBuffer(format!(
                "裁剪区域 ({}, {}, {}x{}) 超出缓冲 {}x{}",
                x, y, width, height, self.width, self.height
            )));
        }

        let mut pixels = Vec::with_capacity(width as usize * height as usize);
        for row in y..y + height {
            let start = self.index(x, row);
            pixels.extend_from_slice(&self.pixels[start..start + width as usize]);
        }

        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}
