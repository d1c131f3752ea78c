//! # lsb_seal 库
//!
//! 本库实现带口令保护的 LSB 隐写：数据先经 PBKDF2 + AES-256-GCM 加密，
//! 再写入 RGBA 像素每个通道的最低 2 位。

// 声明库包含的所有模块。

pub mod cli;
pub mod constants;
pub mod crypto;
pub mod envelope;
pub mod handler;
pub mod pixels;
pub mod steganography;

pub use envelope::{HiddenPayload, StegoError, capacity, embed, extract, max_payload_len};
