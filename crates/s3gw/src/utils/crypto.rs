use hmac::{Hmac, KeyInit, Mac};
use sha1::Sha1;
use sha2::{Digest, Sha256};

pub const EMPTY_STRING_SHA256_HASH: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

#[must_use]
pub fn hex(data: impl AsRef<[u8]>) -> String {
    hex_simd::encode_to_string(data, hex_simd::AsciiCase::Lower)
}

#[must_use]
pub fn hex_sha256(data: &[u8]) -> String {
    hex(Sha256::digest(data))
}

/// Hashes a chunk that arrived in several pieces.
#[must_use]
pub fn hex_sha256_chunk(chunk: &[bytes::Bytes]) -> String {
    let mut hasher = Sha256::new();
    for piece in chunk {
        hasher.update(piece.as_ref());
    }
    hex(hasher.finalize())
}

#[must_use]
pub fn hmac_sha256(key: impl AsRef<[u8]>, data: impl AsRef<[u8]>) -> [u8; 32] {
    let mut m = <Hmac<Sha256>>::new_from_slice(key.as_ref()).expect("HMAC can accept keys of any length");
    m.update(data.as_ref());
    m.finalize().into_bytes().into()
}

#[must_use]
pub fn hmac_sha1(key: impl AsRef<[u8]>, data: impl AsRef<[u8]>) -> [u8; 20] {
    let mut m = <Hmac<Sha1>>::new_from_slice(key.as_ref()).expect("HMAC can accept keys of any length");
    m.update(data.as_ref());
    m.finalize().into_bytes().into()
}

/// Is `s` a hex-encoded SHA-256 digest?
#[must_use]
pub fn is_sha256_checksum(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_hexdigit())
}
