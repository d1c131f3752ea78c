//! # 密钥派生与认证加密
//!
//! 使用 PBKDF2-HMAC-SHA256 从口令派生 256 位密钥，再用 AES-256-GCM 加密。
//!
//! 输出格式：`salt (8 bytes) || nonce (12 bytes) || ciphertext || tag (16 bytes)`。

use aes_gcm::{
    Aes256Gcm, Key, Nonce,
    aead::{Aead, KeyInit},
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use thiserror::Error;
use zeroize::Zeroizing;

/// 每条消息随机生成的盐的长度 (字节)。
pub const SALT_SIZE: usize = 8;

/// AES-GCM 的 nonce 长度 (字节)。
pub const NONCE_SIZE: usize = 12;

/// AES-GCM 附加在密文末尾的认证标签长度 (字节)。
pub const TAG_SIZE: usize = 16;

/// 派生密钥长度 (AES-256)。
pub const KEY_SIZE: usize = 32;

/// PBKDF2 迭代次数。
pub const PBKDF2_ROUNDS: u32 = 4096;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CipherError {
    /// 口令错误、数据被篡改或被截断，三者不可区分。
    #[error("decryption failed (wrong password or data corrupted)")]
    DecryptionFailed,

    #[error("encryption failed")]
    EncryptionFailed,
}

fn derive_key(password: &str, salt: &[u8]) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, key.as_mut_slice());
    key
}

/// 用口令加密 `plaintext`，返回 `salt || nonce || sealed`。
///
/// 每次调用都会生成新的盐和 nonce，相同口令和明文的两次加密结果不同。
///
/// # Errors
///
/// 只有在 AEAD 实现拒绝明文 (长度超出 GCM 上限) 时才会返回
/// [`CipherError::EncryptionFailed`]。
pub fn encrypt(password: &str, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let mut rng = rand::rng();

    let mut salt = [0u8; SALT_SIZE];
    rng.fill_bytes(&mut salt);

    let mut nonce = [0u8; NONCE_SIZE];
    rng.fill_bytes(&mut nonce);

    let key = derive_key(password, &salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
    let sealed = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CipherError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(SALT_SIZE + NONCE_SIZE + sealed.len());
    out.extend_from_slice(&salt);
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&sealed);
    Ok(out)
}

/// 解密 [`encrypt`] 产生的数据块。
///
/// # Errors
///
/// 数据块短于盐或 nonce、口令错误、数据被篡改时，统一返回
/// [`CipherError::DecryptionFailed`]。
pub fn decrypt(password: &str, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
    if blob.len() < SALT_SIZE {
        return Err(CipherError::DecryptionFailed);
    }
    let (salt, rest) = blob.split_at(SALT_SIZE);

    if rest.len() < NONCE_SIZE {
        return Err(CipherError::DecryptionFailed);
    }
    let (nonce, sealed) = rest.split_at(NONCE_SIZE);

    let key = derive_key(password, salt);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_slice()));
    cipher
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CipherError::DecryptionFailed)
}
