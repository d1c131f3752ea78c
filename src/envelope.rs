//! # 信封编解码
//!
//! 组织完整的嵌入流程：规范化像素 → 构造明文信封 → 加密 → 写入长度头部和密文。
//!
//! 载体上的布局 (从像素 `offset` 开始，每个像素一个字节)：
//!
//! ```text
//! [密文长度 u32 BE][salt 8][nonce 12][AES-GCM(ext_len 1 || ext || payload) + tag 16]
//! ```
//!
//! 扩展名位于加密边界之内，明文中只暴露密文长度。

use image::{DynamicImage, RgbaImage};
use log::{debug, warn};
use thiserror::Error;

use crate::constants::{LENGTH_HEADER_SIZE, MAX_EXTENSION_LEN, OVERHEAD};
use crate::crypto::{self, CipherError};
use crate::pixels::normalize;
use crate::steganography::PixelChannels;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StegoError {
    #[error("image not supported: no capacity left at pixel offset {offset}")]
    ImageNotSupported { offset: usize },

    #[error("image too small: need {needed} pixels, have {available}")]
    ImageTooSmall { needed: usize, available: usize },

    #[error("extension too long: {0} bytes (max 255)")]
    ExtensionTooLong(usize),

    #[error("no hidden data detected: {0}")]
    DataNotFound(&'static str),

    #[error("decryption failed (wrong password or data corrupted)")]
    DecryptionFailed,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<CipherError> for StegoError {
    fn from(err: CipherError) -> Self {
        match err {
            CipherError::DecryptionFailed => StegoError::DecryptionFailed,
            CipherError::EncryptionFailed => StegoError::Internal(err.to_string()),
        }
    }
}

/// 从载体中恢复出的数据及其扩展名。扩展名为空表示纯文本。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenPayload {
    pub data: Vec<u8>,
    pub extension: String,
}

/// 载体的像素总数，即可写入的字节总数 (包含固定开销)。
pub fn capacity(image: &DynamicImage) -> usize {
    image.width() as usize * image.height() as usize
}

/// 在给定扩展名和偏移下，最多能隐藏多少字节的载荷。
pub fn max_payload_len(image: &DynamicImage, extension: &str, offset: usize) -> usize {
    capacity(image)
        .saturating_sub(offset)
        .saturating_sub(OVERHEAD + 1 + extension.len())
}

/// 构造明文信封：`ext_len (1 byte) || ext || payload`。
pub fn seal_envelope(extension: &str, payload: &[u8]) -> Result<Vec<u8>, StegoError> {
    let ext = extension.as_bytes();
    let ext_len = u8::try_from(ext.len()).map_err(|_| StegoError::ExtensionTooLong(ext.len()))?;

    let mut envelope = Vec::with_capacity(1 + ext.len() + payload.len());
    envelope.push(ext_len);
    envelope.extend_from_slice(ext);
    envelope.extend_from_slice(payload);
    Ok(envelope)
}

/// 解析明文信封。解密成功后信封仍然无法解析属于内部错误。
pub fn open_envelope(mut envelope: Vec<u8>) -> Result<HiddenPayload, StegoError> {
    let Some(&ext_len) = envelope.first() else {
        return Err(StegoError::Internal(
            "data corrupted: missing extension length".into(),
        ));
    };
    let ext_end = 1 + ext_len as usize;
    if envelope.len() < ext_end {
        return Err(StegoError::Internal(
            "data corrupted: extension length mismatch".into(),
        ));
    }

    let data = envelope.split_off(ext_end);
    let extension = String::from_utf8(envelope[1..].to_vec())
        .map_err(|_| StegoError::Internal("data corrupted: extension is not UTF-8".into()))?;

    Ok(HiddenPayload { data, extension })
}

/// 把 `payload` 加密后隐藏到 `image` 中，从第 `offset` 个像素开始写入。
///
/// 返回新的 RGBA 图像，原图不会被修改。结果必须以无损格式 (PNG) 保存，
/// 有损压缩会破坏低位数据。
///
/// # Errors
///
/// * [`StegoError::ImageNotSupported`] - `offset` 处已没有可用像素。
/// * [`StegoError::ExtensionTooLong`] - 扩展名超过 255 字节，在任何加密工作之前检查。
/// * [`StegoError::ImageTooSmall`] - 信封加上固定开销超出可用像素。
/// * [`StegoError::Internal`] - 容量检查之后的写入仍然越界。
pub fn embed(
    image: &DynamicImage,
    payload: &[u8],
    extension: &str,
    offset: usize,
    password: &str,
) -> Result<RgbaImage, StegoError> {
    let mut dst = normalize(image);
    let mut channels = PixelChannels::new(&mut *dst);

    let available = match channels.capacity().checked_sub(offset) {
        Some(n) if n > 0 => n,
        _ => {
            warn!("offset {offset} leaves no room in a {} pixel carrier", channels.capacity());
            return Err(StegoError::ImageNotSupported { offset });
        }
    };

    if extension.len() > MAX_EXTENSION_LEN {
        return Err(StegoError::ExtensionTooLong(extension.len()));
    }

    let envelope = seal_envelope(extension, payload)?;
    let needed = envelope.len() + OVERHEAD;
    if needed > available {
        return Err(StegoError::ImageTooSmall { needed, available });
    }

    let ciphertext = crypto::encrypt(password, &envelope)?;
    let length = u32::try_from(ciphertext.len())
        .map_err(|_| StegoError::Internal("ciphertext length exceeds u32".into()))?;
    debug!(
        "embedding {} byte envelope as {} byte ciphertext at pixel {offset}",
        envelope.len(),
        ciphertext.len()
    );

    channels
        .write(&length.to_be_bytes(), offset)
        .map_err(|e| StegoError::Internal(format!("header embed failed: {e}")))?;
    channels
        .write(&ciphertext, offset + LENGTH_HEADER_SIZE)
        .map_err(|e| StegoError::Internal(format!("body embed failed: {e}")))?;

    Ok(dst)
}

/// 从 `image` 的第 `offset` 个像素开始读取并解密隐藏的数据。
///
/// # Errors
///
/// * [`StegoError::DataNotFound`] - 头部不可读、长度为 0 或超出容量、数据流不完整。
/// * [`StegoError::DecryptionFailed`] - 口令错误或数据损坏。
/// * [`StegoError::Internal`] - 解密成功但信封格式无效。
pub fn extract(
    image: &DynamicImage,
    offset: usize,
    password: &str,
) -> Result<HiddenPayload, StegoError> {
    let pix = normalize(image);
    let channels = PixelChannels::new(&*pix);

    let header = channels
        .read(LENGTH_HEADER_SIZE, offset)
        .map_err(|_| StegoError::DataNotFound("cannot read header"))?;
    let header: [u8; LENGTH_HEADER_SIZE] = header
        .as_slice()
        .try_into()
        .map_err(|_| StegoError::Internal("short length header".into()))?;

    let length = u32::from_be_bytes(header) as usize;
    if length == 0 || length > channels.capacity() {
        debug!("implausible ciphertext length {length} at pixel {offset}");
        return Err(StegoError::DataNotFound("invalid length"));
    }

    let ciphertext = channels
        .read(length, offset + LENGTH_HEADER_SIZE)
        .map_err(|_| StegoError::DataNotFound("incomplete data stream"))?;

    let envelope = crypto::decrypt(password, &ciphertext)?;
    open_envelope(envelope)
}
