/// Fallback stored for an event whose color has no sRGB representation.
pub const DEFAULT_EVENT_HEX: &str = "999999";

/// sRGB color with channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Rgba {
    pub const fn new(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Rgba {
            red,
            green,
            blue,
            alpha,
        }
    }

    pub const fn opaque(red: f64, green: f64, blue: f64) -> Self {
        Rgba::new(red, green, blue, 1.0)
    }

    pub fn from_bytes(r: u8, g: u8, b: u8) -> Self {
        Rgba::opaque(r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0)
    }

    /// Packs the RGB channels into six lowercase hex digits. Opacity is not
    /// encoded. Returns `None` when a channel has no sRGB byte value.
    pub fn to_hex(&self) -> Option<String> {
        let r = channel_byte(self.red)?;
        let g = channel_byte(self.green)?;
        let b = channel_byte(self.blue)?;
        let rgb = (r as u32) << 16 | (g as u32) << 8 | b as u32;
        Some(format!("{:06x}", rgb))
    }

    /// Decodes a stored hex string. Anything that does not parse decodes as
    /// opaque black.
    pub fn from_hex(hex: &str) -> Self {
        let cleaned: String = hex.chars().filter(|c| c.is_alphanumeric()).collect();
        let digits: String = cleaned
            .chars()
            .take_while(|c| c.is_ascii_hexdigit())
            .collect();
        let value = u32::from_str_radix(&digits, 16).unwrap_or(0);
        Rgba::from_bytes(
            ((value >> 16) & 0xFF) as u8,
            ((value >> 8) & 0xFF) as u8,
            (value & 0xFF) as u8,
        )
    }

    pub fn bytes(&self) -> (u8, u8, u8) {
        (
            channel_byte(self.red).unwrap_or(0),
            channel_byte(self.green).unwrap_or(0),
            channel_byte(self.blue).unwrap_or(0),
        )
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha <= 0.0
    }
}

/// Re-encodes user input the way colors are stored: six lowercase digits.
pub fn normalize_hex(input: &str) -> String {
    Rgba::from_hex(input)
        .to_hex()
        .unwrap_or_else(|| DEFAULT_EVENT_HEX.to_string())
}

impl From<Rgba> for ratatui::style::Color {
    fn from(color: Rgba) -> Self {
        let (r, g, b) = color.bytes();
        ratatui::style::Color::Rgb(r, g, b)
    }
}

fn channel_byte(value: f64) -> Option<u8> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return None;
    }
    Some((value * 255.0).round() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encodes_six_lowercase_digits() {
        assert_eq!(Rgba::from_bytes(0xAB, 0x01, 0xFF).to_hex().as_deref(), Some("ab01ff"));
        assert_eq!(Rgba::opaque(0.0, 0.0, 0.0).to_hex().as_deref(), Some("000000"));
    }

    #[test]
    fn rounds_channels_instead_of_truncating() {
        // 0.5 * 255 = 127.5
        assert_eq!(Rgba::opaque(0.5, 0.5, 0.5).to_hex().as_deref(), Some("808080"));
    }

    #[test]
    fn refuses_colors_outside_srgb() {
        assert_eq!(Rgba::opaque(1.2, 0.0, 0.0).to_hex(), None);
        assert_eq!(Rgba::opaque(0.0, f64::NAN, 0.0).to_hex(), None);
        assert_eq!(Rgba::opaque(0.0, 0.0, -0.01).to_hex(), None);
    }

    #[test]
    fn decodes_with_punctuation_stripped() {
        assert_eq!(Rgba::from_hex("#ff8000").bytes(), (0xFF, 0x80, 0x00));
        assert_eq!(Rgba::from_hex("  00-ff-00 ").bytes(), (0x00, 0xFF, 0x00));
        assert_eq!(Rgba::from_hex("#ff8000").alpha, 1.0);
    }

    #[test]
    fn garbage_decodes_as_black() {
        assert_eq!(Rgba::from_hex("").bytes(), (0, 0, 0));
        assert_eq!(Rgba::from_hex("zzzzzz").bytes(), (0, 0, 0));
        assert_eq!(Rgba::from_hex("123456789abcdef").bytes(), (0, 0, 0));
    }

    #[test]
    fn short_input_reads_as_low_bytes() {
        assert_eq!(Rgba::from_hex("fff").bytes(), (0x00, 0x0F, 0xFF));
    }

    #[test]
    fn opacity_is_not_preserved() {
        let translucent = Rgba::new(0.2, 0.4, 0.6, 0.3);
        let hex = translucent.to_hex().unwrap();
        assert_eq!(Rgba::from_hex(&hex).alpha, 1.0);
    }

    proptest! {
        #[test]
        fn hex_round_trip_stays_within_one_step(
            red in 0.0f64..=1.0,
            green in 0.0f64..=1.0,
            blue in 0.0f64..=1.0
        ) {
            let original = Rgba::opaque(red, green, blue);
            let hex = original.to_hex().unwrap();
            let decoded = Rgba::from_hex(&hex);
            let tolerance = 1.0 / 255.0;
            prop_assert!((decoded.red - red).abs() <= tolerance);
            prop_assert!((decoded.green - green).abs() <= tolerance);
            prop_assert!((decoded.blue - blue).abs() <= tolerance);
            prop_assert_eq!(decoded.alpha, 1.0);
        }
    }
}
