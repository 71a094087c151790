use std::cmp::Ordering;
use std::ffi::OsStr;
use std::fmt;
use std::path::PathBuf;

/// Code unit of a file name: `u8` for narrow streams, `u16` for wide ones.
pub trait NameUnit: Copy + Default + Eq + Ord + fmt::Debug + Send + Sync + 'static {
    /// Terminator stored after the name in an entry buffer.
    const NUL: Self;

    /// Native name converted into this unit type.
    fn from_os_str(name: &OsStr) -> Vec<Self>;

    /// Path named by a unit string.
    fn to_path(units: &[Self]) -> PathBuf;

    /// Lossy text rendering, for display.
    fn to_string_lossy(units: &[Self]) -> String;

    /// Value fed into the position hash.
    fn hash_value(self) -> u32;

    fn is_digit(self) -> bool;

    fn is_zero(self) -> bool;

    /// Collation used by `alphasort`.
    fn collate(a: &[Self], b: &[Self]) -> Ordering {
        a.cmp(b)
    }
}

impl NameUnit for u8 {
    const NUL: Self = 0;

    #[cfg(unix)]
    fn from_os_str(name: &OsStr) -> Vec<Self> {
        use std::os::unix::ffi::OsStrExt;
        name.as_bytes().to_vec()
    }

    #[cfg(not(unix))]
    fn from_os_str(name: &OsStr) -> Vec<Self> {
        name.to_string_lossy().into_owned().into_bytes()
    }

    #[cfg(unix)]
    fn to_path(units: &[Self]) -> PathBuf {
        use std::os::unix::ffi::OsStrExt;
        PathBuf::from(OsStr::from_bytes(units))
    }

    #[cfg(not(unix))]
    fn to_path(units: &[Self]) -> PathBuf {
        PathBuf::from(String::from_utf8_lossy(units).into_owned())
    }

    fn to_string_lossy(units: &[Self]) -> String {
        String::from_utf8_lossy(units).into_owned()
    }

    // char is signed on the ABI the hash was defined for
    fn hash_value(self) -> u32 {
        self as i8 as i32 as u32
    }

    fn is_digit(self) -> bool {
        self.is_ascii_digit()
    }

    fn is_zero(self) -> bool {
        self == b'0'
    }
}

impl NameUnit for u16 {
    const NUL: Self = 0;

    #[cfg(windows)]
    fn from_os_str(name: &OsStr) -> Vec<Self> {
        use std::os::windows::ffi::OsStrExt;
        name.encode_wide().collect()
    }

    #[cfg(not(windows))]
    fn from_os_str(name: &OsStr) -> Vec<Self> {
        name.to_string_lossy().encode_utf16().collect()
    }

    #[cfg(windows)]
    fn to_path(units: &[Self]) -> PathBuf {
        use std::os::windows::ffi::OsStringExt;
        PathBuf::from(std::ffi::OsString::from_wide(units))
    }

    #[cfg(not(windows))]
    fn to_path(units: &[Self]) -> PathBuf {
        PathBuf::from(String::from_utf16_lossy(units))
    }

    fn to_string_lossy(units: &[Self]) -> String {
        String::from_utf16_lossy(units)
    }

    fn hash_value(self) -> u32 {
        self as u32
    }

    fn is_digit(self) -> bool {
        (b'0' as u16..=b'9' as u16).contains(&self)
    }

    fn is_zero(self) -> bool {
        self == b'0' as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wide_roundtrip_through_path() {
        let units: Vec<u16> = "données".encode_utf16().collect();
        let path = u16::to_path(&units);
        assert_eq!(u16::from_os_str(path.as_os_str()), units);
    }

    #[test]
    fn test_digit_classification() {
        assert!(b'7'.is_digit());
        assert!(!b'a'.is_digit());
        assert!(b'0'.is_zero());
        assert!((b'9' as u16).is_digit());
        assert!(!(0x0660u16).is_digit());
    }

    #[test]
    fn test_narrow_hash_value_sign_extends() {
        assert_eq!(b'a'.hash_value(), 97);
        assert_eq!(0xffu8.hash_value(), u32::MAX);
        assert_eq!(0xffffu16.hash_value(), 0xffff);
    }
}
