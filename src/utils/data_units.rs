pub const KIBI_LIMIT: u64 = 1024;
pub const MEBI_LIMIT: u64 = 1024 * 1024;
pub const GIBI_LIMIT: u64 = 1024 * 1024 * 1024;
pub const TEBI_LIMIT: u64 = 1024 * 1024 * 1024 * 1024;

pub const KIBI_LIMIT_F64: f64 = 1024.0;
pub const MEBI_LIMIT_F64: f64 = 1024.0 * 1024.0;
pub const GIBI_LIMIT_F64: f64 = 1024.0 * 1024.0 * 1024.0;
pub const TEBI_LIMIT_F64: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;

/// Returns a tuple containing the value and the unit in bytes. In units of 1024. This only
/// supports up to a tebi.
#[inline]
pub fn get_binary_bytes(bytes: u64) -> (f64, &'static str) {
    match bytes {
        b if b < KIBI_LIMIT => (bytes as f64, "B"),
        b if b < MEBI_LIMIT => (bytes as f64 / KIBI_LIMIT_F64, "KiB"),
        b if b < GIBI_LIMIT => (bytes as f64 / MEBI_LIMIT_F64, "MiB"),
        b if b < TEBI_LIMIT => (bytes as f64 / GIBI_LIMIT_F64, "GiB"),
        _ => (bytes as f64 / TEBI_LIMIT_F64, "TiB"),
    }
}

/// Formats a byte count with a binary prefix, e.g. `15.6 GiB`. Whole bytes get no decimal.
pub fn binary_bytes_string(bytes: u64) -> String {
    let (value, unit) = get_binary_bytes(bytes);

    if bytes < KIBI_LIMIT {
        format!("{value:.0} {unit}")
    } else {
        format!("{value:.1} {unit}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn binary_strings() {
        assert_eq!(binary_bytes_string(0), "0 B");
        assert_eq!(binary_bytes_string(1023), "1023 B");
        assert_eq!(binary_bytes_string(KIBI_LIMIT), "1.0 KiB");
        assert_eq!(binary_bytes_string(3 * MEBI_LIMIT / 2), "1.5 MiB");
        assert_eq!(binary_bytes_string(16 * GIBI_LIMIT), "16.0 GiB");
        assert_eq!(binary_bytes_string(2 * TEBI_LIMIT), "2.0 TiB");
    }
}
