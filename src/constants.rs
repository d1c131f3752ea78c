use crate::crypto::{NONCE_SIZE, SALT_SIZE, TAG_SIZE};

/// 嵌入流开头记录密文长度的头部大小 (字节，大端 `u32`)。
/// 每个像素承载一个字节，因此头部占用 4 个像素。
pub const LENGTH_HEADER_SIZE: usize = 4;

/// 扩展名的最大字节数，由信封中 1 字节的长度字段决定。
pub const MAX_EXTENSION_LEN: usize = u8::MAX as usize;

/// 与载荷大小无关的固定开销：盐 + nonce + 认证标签 + 长度头部。
pub const OVERHEAD: usize = SALT_SIZE + NONCE_SIZE + TAG_SIZE + LENGTH_HEADER_SIZE;

/// 命令行接受的最短口令长度。
pub const MIN_PASSWORD_LEN: usize = 6;

/// 未指定输出路径时，隐写图像文件名的前缀。
pub const HIDDEN_IMAGE_PREFIX: &str = "doctored_";

/// 未指定输出路径时，恢复文件名的前缀。
pub const RECOVERED_FILE_PREFIX: &str = "recovered_";

/// 恢复的数据没有扩展名时使用的扩展名。
pub const DEFAULT_TEXT_EXTENSION: &str = "txt";
