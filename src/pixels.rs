//! # 像素规范化
//!
//! 把任意解码后的图像转换为独立拥有的 8 位 RGBA 缓冲区。

use image::{DynamicImage, RgbaImage};

/// 返回 `image` 的 RGBA8 副本。
///
/// 已经是 RGBA8 的图像会被完整复制，其它格式按通道扩展转换。
/// 返回的缓冲区从不与调用者的图像共享内存，嵌入操作不会修改原图。
pub fn normalize(image: &DynamicImage) -> RgbaImage {
    match image {
        DynamicImage::ImageRgba8(rgba) => rgba.clone(),
        other => other.to_rgba8(),
    }
}
