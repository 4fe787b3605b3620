//! Hash strategies for HistoryBlock entries
//!
//! Canonical keys are stored as SHA-1 hex digests so the blacklist never
//! holds the blocked domains in the clear. SHA-1 is implemented here per
//! FIPS 180-1; it is used as a one-way mapping, not for collision resistance.
//!
//! [`NoHash`] stores keys verbatim and exists for debugging only: under it the
//! persisted blacklist leaks every blocked key in plaintext.

use std::fmt::Debug;
use std::sync::Arc;

use crate::types::EncryptionMode;

// =============================================================================
// Strategy
// =============================================================================

/// Turns canonical keys into stored entries.
pub trait HashStrategy: Send + Sync + Debug {
    /// The mode this strategy implements.
    fn mode(&self) -> EncryptionMode;

    /// Digest a canonical key into a blacklist entry.
    fn digest(&self, input: &str) -> String;

    /// Whether `input` is a well-formed output of [`HashStrategy::digest`].
    /// Used to filter imported entries.
    fn test(&self, input: &str) -> bool;
}

/// SHA-1, lowercase hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha1Hash;

impl HashStrategy for Sha1Hash {
    fn mode(&self) -> EncryptionMode {
        EncryptionMode::Sha1
    }

    fn digest(&self, input: &str) -> String {
        sha1_hex(input.as_bytes())
    }

    fn test(&self, input: &str) -> bool {
        is_sha1_hex(input)
    }
}

/// Pass-through hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHash;

impl HashStrategy for NoHash {
    fn mode(&self) -> EncryptionMode {
        EncryptionMode::None
    }

    fn digest(&self, input: &str) -> String {
        input.to_string()
    }

    fn test(&self, _input: &str) -> bool {
        true
    }
}

/// Build the strategy for `mode`.
pub fn hash_for(mode: EncryptionMode) -> Arc<dyn HashStrategy> {
    match mode {
        EncryptionMode::Sha1 => Arc::new(Sha1Hash),
        EncryptionMode::None => Arc::new(NoHash),
    }
}

// =============================================================================
// SHA-1 (FIPS 180-1)
// =============================================================================

/// Length of a hex-encoded SHA-1 digest.
pub const SHA1_HEX_LEN: usize = 40;

const H_INIT: [u32; 5] = [0x67452301, 0xEFCDAB89, 0x98BADCFE, 0x10325476, 0xC3D2E1F0];

const K0: u32 = 0x5A827999;
const K1: u32 = 0x6ED9EBA1;
const K2: u32 = 0x8F1BBCDC;
const K3: u32 = 0xCA62C1D6;

/// Compute the SHA-1 digest of `data`.
pub fn sha1(data: &[u8]) -> [u8; 20] {
    let mut state = H_INIT;

    let mut blocks = data.chunks_exact(64);
    for block in &mut blocks {
        compress(&mut state, block);
    }

    // Padding: 0x80, zeros, then the message length in bits (64-bit BE)
    let rem = blocks.remainder();
    let mut tail = [0u8; 128];
    tail[..rem.len()].copy_from_slice(rem);
    tail[rem.len()] = 0x80;

    let tail_len = if rem.len() < 56 { 64 } else { 128 };
    let bit_len = (data.len() as u64).wrapping_mul(8);
    tail[tail_len - 8..tail_len].copy_from_slice(&bit_len.to_be_bytes());

    for block in tail[..tail_len].chunks_exact(64) {
        compress(&mut state, block);
    }

    let mut out = [0u8; 20];
    for (chunk, word) in out.chunks_exact_mut(4).zip(state) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }
    out
}

/// Process one 64-byte block.
#[inline]
fn compress(state: &mut [u32; 5], block: &[u8]) {
    let mut w = [0u32; 80];
    for (i, word) in block.chunks_exact(4).enumerate() {
        w[i] = u32::from_be_bytes([word[0], word[1], word[2], word[3]]);
    }
    for i in 16..80 {
        w[i] = (w[i - 3] ^ w[i - 8] ^ w[i - 14] ^ w[i - 16]).rotate_left(1);
    }

    let [mut a, mut b, mut c, mut d, mut e] = *state;

    for (i, &wi) in w.iter().enumerate() {
        let (f, k) = match i {
            0..=19 => ((b & c) | (!b & d), K0),
            20..=39 => (b ^ c ^ d, K1),
            40..=59 => ((b & c) | (b & d) | (c & d), K2),
            _ => (b ^ c ^ d, K3),
        };

        let temp = a
            .rotate_left(5)
            .wrapping_add(f)
            .wrapping_add(e)
            .wrapping_add(k)
            .wrapping_add(wi);
        e = d;
        d = c;
        c = b.rotate_left(30);
        b = a;
        a = temp;
    }

    state[0] = state[0].wrapping_add(a);
    state[1] = state[1].wrapping_add(b);
    state[2] = state[2].wrapping_add(c);
    state[3] = state[3].wrapping_add(d);
    state[4] = state[4].wrapping_add(e);
}

/// SHA-1 of `data` as 40 lowercase hex characters.
pub fn sha1_hex(data: &[u8]) -> String {
    to_hex(&sha1(data))
}

fn to_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

/// Check for exactly 40 lowercase hex characters.
#[inline]
pub fn is_sha1_hex(s: &str) -> bool {
    s.len() == SHA1_HEX_LEN && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
