//! Additive packet checksum.
//!
//! The final byte of every RPC packet is the low 8 bits of the sum of
//! all preceding bytes. Not a CRC: overflow wraps modulo 256.

/// Wrapping sum of `bytes`.
pub fn additive_sum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Checksum for `packet`, whose final byte is the checksum slot and is
/// therefore excluded from the sum.
pub fn checksum(packet: &[u8]) -> u8 {
    match packet.split_last() {
        Some((_, body)) => additive_sum(body),
        None => 0,
    }
}

/// `true` if `packet` has at least two bytes and its final byte matches
/// the checksum of the bytes before it.
pub fn verify(packet: &[u8]) -> bool {
    match packet.split_last() {
        Some((&last, body)) if !body.is_empty() => last == additive_sum(body),
        _ => false,
    }
}
