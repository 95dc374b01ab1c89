// src/utils/codes.rs

use rand::Rng;

/// Characters used in human-presentable codes. 0/O and 1/I are excluded so a
/// code read out loud at a redemption counter is unambiguous.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generates a code like `JET-X7F2-Q9KM-WR4T`. Uniqueness is enforced by the
/// store's unique index, not here; issuers retry on collision.
pub fn generate_code(prefix: &str, groups: usize, group_len: usize) -> String {
    let mut rng = rand::rng();
    let mut out = String::with_capacity(prefix.len() + groups * (group_len + 1));
    out.push_str(prefix);
    for _ in 0..groups {
        out.push('-');
        for _ in 0..group_len {
            let idx = rng.random_range(0..CODE_ALPHABET.len());
            out.push(CODE_ALPHABET[idx] as char);
        }
    }
    out
}
