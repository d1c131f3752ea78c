//! # 位平面通道编解码
//!
//! 把任意字节写入 RGBA 缓冲区中每个通道字节的最低 2 位。
//! 每个像素有 4 个通道，每个通道承载 2 bits，因此一个像素恰好承载一个字节。

use thiserror::Error;

/// 每个像素的通道数 (R, G, B, A)。
pub const CHANNELS_PER_PIXEL: usize = 4;

/// 通道字节中保留的高 6 位掩码。
const HIGH_BITS_MASK: u8 = 0xFC;

/// 通道字节中承载数据的低 2 位掩码。
const LOW_BITS_MASK: u8 = 0x03;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ChannelError {
    #[error("region of {len} bytes at pixel {offset} exceeds the capacity of {capacity} pixels")]
    OutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },
}

/// 对一块 RGBA 字节缓冲区进行按像素的位平面读写。
///
/// 只读操作只需要 `B: AsRef<[u8]>`，写入额外要求 `B: AsMut<[u8]>`，
/// 因此既可以包装 `&[u8]`，也可以包装 `&mut [u8]` 或者拥有所有权的 `Vec<u8>`。
#[derive(Debug)]
pub struct PixelChannels<B> {
    pix: B,
}

impl<B: AsRef<[u8]>> PixelChannels<B> {
    pub fn new(pix: B) -> Self {
        Self { pix }
    }

    /// 可存储的字节数，即完整像素的个数。
    pub fn capacity(&self) -> usize {
        self.pix.as_ref().len() / CHANNELS_PER_PIXEL
    }

    /// 从第 `offset` 个像素开始读取 `n` 个字节。
    ///
    /// 每个字节由该像素 4 个通道的低 2 位依次拼接而成：
    /// 通道 0 → bits 7-6，通道 1 → bits 5-4，通道 2 → bits 3-2，通道 3 → bits 1-0。
    ///
    /// # Errors
    ///
    /// 如果 `offset + n` 超过 [`capacity`](Self::capacity)，返回 [`ChannelError::OutOfBounds`]。
    pub fn read(&self, n: usize, offset: usize) -> Result<Vec<u8>, ChannelError> {
        self.check_bounds(offset, n)?;

        let start = offset * CHANNELS_PER_PIXEL;
        let end = start + n * CHANNELS_PER_PIXEL;

        let out = self.pix.as_ref()[start..end]
            .chunks_exact(CHANNELS_PER_PIXEL)
            .map(|pixel| {
                pixel
                    .iter()
                    .fold(0u8, |acc, &channel| (acc << 2) | (channel & LOW_BITS_MASK))
            })
            .collect();

        Ok(out)
    }

    /// 返回底层缓冲区。
    pub fn into_inner(self) -> B {
        self.pix
    }

    fn check_bounds(&self, offset: usize, len: usize) -> Result<(), ChannelError> {
        let capacity = self.capacity();
        if offset.checked_add(len).is_none_or(|end| end > capacity) {
            return Err(ChannelError::OutOfBounds {
                offset,
                len,
                capacity,
            });
        }
        Ok(())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> PixelChannels<B> {
    /// 从第 `offset` 个像素开始写入 `data`，每个像素一个字节。
    ///
    /// 只修改每个通道的低 2 位，高 6 位保持不变。
    ///
    /// # Errors
    ///
    /// 如果 `offset + data.len()` 超过 [`capacity`](Self::capacity)，返回
    /// [`ChannelError::OutOfBounds`]，此时缓冲区不会被修改。
    pub fn write(&mut self, data: &[u8], offset: usize) -> Result<(), ChannelError> {
        self.check_bounds(offset, data.len())?;

        let start = offset * CHANNELS_PER_PIXEL;
        let end = start + data.len() * CHANNELS_PER_PIXEL;
        let sub_pix = &mut self.pix.as_mut()[start..end];

        for (pixel, &value) in sub_pix.chunks_exact_mut(CHANNELS_PER_PIXEL).zip(data) {
            for (i, channel) in pixel.iter_mut().enumerate() {
                let shift = 6 - 2 * i;
                *channel = (*channel & HIGH_BITS_MASK) | ((value >> shift) & LOW_BITS_MASK);
            }
        }

        Ok(())
    }
}
