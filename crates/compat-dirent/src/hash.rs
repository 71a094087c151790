use crate::entry::PATH_MAX;
use crate::unit::NameUnit;

/// Position reported once the stream has no further entries.
pub const END_OF_STREAM: i64 = 0x7fff_ffff;

/// 31-bit DJB2 hash of a file name, used as the stream position of the
/// entry carrying that name.
///
/// At most `PATH_MAX` units take part and hashing stops at the first NUL.
pub fn dirent_hash<C: NameUnit>(name: &[C]) -> i64 {
    let mut hash: u32 = 5381;
    for &c in name.iter().take(PATH_MAX) {
        if c == C::NUL {
            break;
        }
        hash = (hash << 5).wrapping_add(hash).wrapping_add(c.hash_value());
    }
    (hash & 0x7fff_ffff) as i64
}
