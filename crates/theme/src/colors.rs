pub use panel_core::Color;

/// Conversion of panel colours into Iced colours.
pub trait ToIced {
    fn to_iced(self) -> iced::Color;
}

impl ToIced for Color {
    #[inline]
    fn to_iced(self) -> iced::Color {
        iced::Color::from_rgba(self.r, self.g, self.b, self.a)
    }
}

/// Parse `hex`, falling back to `fallback` (with a warning) when malformed.
pub fn parse_or(hex: &str, fallback: Color) -> Color {
    Color::from_hex(hex).unwrap_or_else(|| {
        tracing::warn!("Invalid color {hex:?} in theme; using fallback");
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_hex_falls_back() {
        assert_eq!(parse_or("not-a-color", Color::INK), Color::INK);
        assert_eq!(parse_or("#ffffff", Color::INK), Color::WHITE);
    }
}
