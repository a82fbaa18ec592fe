//! Displays, as described by their EDID block.

use serde::{Serialize, Serializer};

const EDID_HEADER: [u8; 8] = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00];

/// A connected display and its raw EDID.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Display {
    /// Where the platform reported it, e.g. `card0-eDP-1`.
    pub connector: String,
    pub edid: Vec<u8>,
}

impl Display {
    pub fn new(connector: String, edid: Vec<u8>) -> Self {
        Self { connector, edid }
    }

    /// Whether the EDID starts with the fixed EDID header.
    pub fn has_valid_header(&self) -> bool {
        self.edid.starts_with(&EDID_HEADER)
    }

    /// The three-letter PNP manufacturer id, e.g. `DEL` or `SAM`.
    pub fn manufacturer_id(&self) -> Option<String> {
        let bytes = self.edid.get(8..10)?;
        let packed = u16::from_be_bytes([bytes[0], bytes[1]]);

        // Three 5-bit letters where 1 is 'A'.
        [10u16, 5, 0]
            .into_iter()
            .map(|shift| match (packed >> shift) & 0x1F {
                letter @ 1..=26 => Some(char::from(b'A' + letter as u8 - 1)),
                _ => None,
            })
            .collect()
    }

    pub fn product_code(&self) -> Option<u16> {
        let bytes = self.edid.get(10..12)?;
        Some(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn serial_number(&self) -> Option<u32> {
        let bytes = self.edid.get(12..16)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }
}

impl Serialize for Display {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Display", 5)?;
        state.serialize_field("connector", &self.connector)?;
        state.serialize_field("manufacturer_id", &self.manufacturer_id())?;
        state.serialize_field("product_code", &self.product_code())?;
        state.serialize_field("serial_number", &self.serial_number())?;
        state.serialize_field("edid_bytes", &self.edid.len())?;
        state.end()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// The first 16 bytes of a Dell panel's EDID.
    const DELL_EDID: [u8; 16] = [
        0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x10, 0xAC, 0x7B, 0xA0, 0x4C, 0x35, 0x34,
        0x30,
    ];

    #[test]
    fn decodes_header_fields() {
        let display = Display::new("card0-DP-1".into(), DELL_EDID.to_vec());

        assert!(display.has_valid_header());
        assert_eq!(display.manufacturer_id().as_deref(), Some("DEL"));
        assert_eq!(display.product_code(), Some(0xA07B));
        assert_eq!(display.serial_number(), Some(0x3034_354C));
    }

    #[test]
    fn short_or_bad_edid() {
        let display = Display::new("card1-HDMI-A-1".into(), vec![0x00, 0xFF]);

        assert!(!display.has_valid_header());
        assert_eq!(display.manufacturer_id(), None);
        assert_eq!(display.product_code(), None);
        assert_eq!(display.serial_number(), None);

        let mut zeroed = DELL_EDID.to_vec();
        zeroed[8] = 0;
        zeroed[9] = 0;
        assert_eq!(
            Display::new(String::new(), zeroed).manufacturer_id(),
            None
        );
    }
}
