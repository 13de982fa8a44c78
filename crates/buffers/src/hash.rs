//! 32-bit FNV-1a hash over raw property-name bytes.

pub const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
pub const FNV_PRIME: u32 = 0x0100_0193;

/// Hashes the bytes exactly as they appear between the quotes of a JSON
/// name. The same function is used when a binding table is prepared, so a
/// name with escape sequences only matches a declaration spelled with the
/// same escapes.
#[inline]
pub fn name_hash(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
