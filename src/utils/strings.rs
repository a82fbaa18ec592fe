//! Parsing helpers for strings reported by processors and kernels.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HERTZ: Regex = Regex::new(r"(\d+(?:\.\d+)?) ?([kMGT]?Hz)").unwrap();
    static ref VENDOR_FREQ_SUFFIX: Regex = Regex::new(r"@ (.*)$").unwrap();
    static ref IDENTIFIER: Regex =
        Regex::new(r"Family (\S+) Model (\S+) Stepping (\S+?),?(?:\s|$)").unwrap();
}

#[cfg(test)]
thread_local! {
    /// How many times [`vendor_freq_from_name`] actually parsed something on this thread.
    pub(crate) static VENDOR_FREQ_PARSES: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Parses a frequency string such as `2.00GHz` or `800 MHz` into hertz.
///
/// Returns `-1` if the string does not hold a frequency.
pub fn parse_hertz(hertz: &str) -> i64 {
    let Some(caps) = HERTZ.captures(hertz) else {
        return -1;
    };

    let Ok(value) = caps[1].parse::<f64>() else {
        return -1;
    };

    let multiplier = match &caps[2] {
        "Hz" => 1.0,
        "kHz" => 1e3,
        "MHz" => 1e6,
        "GHz" => 1e9,
        "THz" => 1e12,
        _ => return -1,
    };

    (value * multiplier).round() as i64
}

/// Returns the vendor frequency advertised at the end of a processor name, e.g.
/// `Intel(R) Core(TM)2 Duo CPU T7300 @ 2.00GHz`, or `-1` if there is none.
pub fn vendor_freq_from_name(name: &str) -> i64 {
    #[cfg(test)]
    VENDOR_FREQ_PARSES.with(|count| count.set(count.get() + 1));

    match VENDOR_FREQ_SUFFIX.captures(name) {
        Some(caps) => parse_hertz(&caps[1]),
        None => -1,
    }
}

/// The family, model and stepping parts of an identifier such as
/// `Intel64 Family 6 Model 158 Stepping 10, GenuineIntel`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IdentifierParts<'a> {
    pub family: &'a str,
    pub model: &'a str,
    pub stepping: &'a str,
}

pub fn parse_identifier(identifier: &str) -> Option<IdentifierParts<'_>> {
    let caps = IDENTIFIER.captures(identifier)?;

    Some(IdentifierParts {
        family: caps.get(1)?.as_str(),
        model: caps.get(2)?.as_str(),
        stepping: caps.get(3)?.as_str(),
    })
}

/// Trims a value read from a kernel interface, returning [`None`] if nothing is left.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let value = value.trim().trim_matches(char::from(0)).trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Like [`non_empty`], but also drops the placeholders vendors leave in SMBIOS tables.
#[cfg_attr(not(any(target_os = "windows", target_os = "freebsd")), allow(dead_code))]
pub(crate) fn firmware_value(value: &str) -> Option<String> {
    non_empty(value).filter(|value| {
        !matches!(
            value.to_ascii_lowercase().as_str(),
            "none" | "not specified" | "to be filled by o.e.m." | "default string"
        )
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hertz_units() {
        assert_eq!(parse_hertz("2.00GHz"), 2_000_000_000);
        assert_eq!(parse_hertz("2.4GHz"), 2_400_000_000);
        assert_eq!(parse_hertz("800 MHz"), 800_000_000);
        assert_eq!(parse_hertz("33kHz"), 33_000);
        assert_eq!(parse_hertz("60Hz"), 60);
        assert_eq!(parse_hertz("1THz"), 1_000_000_000_000);
    }

    #[test]
    fn hertz_garbage() {
        assert_eq!(parse_hertz(""), -1);
        assert_eq!(parse_hertz("fast"), -1);
        assert_eq!(parse_hertz("2.00 GB"), -1);
    }

    #[test]
    fn vendor_freq() {
        assert_eq!(
            vendor_freq_from_name("Intel(R) Core(TM)2 Duo CPU T7300 @ 2.00GHz"),
            2_000_000_000
        );
        assert_eq!(
            vendor_freq_from_name("AMD Ryzen 7 5800X 8-Core Processor"),
            -1
        );
        assert_eq!(vendor_freq_from_name("Weird CPU @ soon"), -1);
    }

    #[test]
    fn identifier_parts() {
        let parts = parse_identifier("Intel64 Family 6 Model 158 Stepping 10, GenuineIntel").unwrap();
        assert_eq!(
            parts,
            IdentifierParts {
                family: "6",
                model: "158",
                stepping: "10"
            }
        );

        let parts = parse_identifier("x86 Family 6 Model 15 Stepping 10").unwrap();
        assert_eq!(parts.family, "6");
        assert_eq!(parts.model, "15");
        assert_eq!(parts.stepping, "10");

        assert!(parse_identifier("ARMv8 (64-bit) Family 8").is_none());
        assert!(parse_identifier("").is_none());
    }

    #[test]
    fn trims_kernel_values() {
        assert_eq!(non_empty("  LENOVO\n"), Some("LENOVO".to_string()));
        assert_eq!(non_empty("\0\0"), None);
        assert_eq!(non_empty("\n"), None);
    }

    #[test]
    fn firmware_placeholders() {
        assert_eq!(firmware_value("  Supermicro\n").as_deref(), Some("Supermicro"));
        assert_eq!(firmware_value("To Be Filled By O.E.M."), None);
        assert_eq!(firmware_value("Not Specified"), None);
        assert_eq!(firmware_value(""), None);
    }
}
