/// An 8-bit sRGB color with straight (non-premultiplied) alpha, as picked in the brush UI.
///
/// Serialized as a CSS-style hex string, `#rrggbb` or `#rrggbbaa`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}
impl Color {
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
    #[must_use]
    pub fn as_array(&self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
    #[must_use]
    pub fn is_opaque(&self) -> bool {
        self.a == 255
    }
}
impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("color must start with '#'")]
    MissingHash,
    #[error("expected 3, 4, 6, or 8 hex digits")]
    BadLength,
    #[error("invalid hex digit")]
    BadDigit,
}

/// Parse `#rgb`, `#rgba`, `#rrggbb`, or `#rrggbbaa`. Case insensitive.
impl std::str::FromStr for Color {
    type Err = ColorParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .trim()
            .strip_prefix('#')
            .ok_or(ColorParseError::MissingHash)?;
        if !digits.is_ascii() {
            return Err(ColorParseError::BadDigit);
        }
        let nibble = |c: u8| -> Result<u8, ColorParseError> {
            (c as char)
                .to_digit(16)
                // Always < 16
                .map(|d| d as u8)
                .ok_or(ColorParseError::BadDigit)
        };
        let bytes = digits.as_bytes();
        let channels: smallvec::SmallVec<[u8; 4]> = match bytes.len() {
            // Short form, each digit doubled: #abc == #aabbcc
            3 | 4 => bytes
                .iter()
                .map(|&c| nibble(c).map(|n| n * 17))
                .collect::<Result<_, _>>()?,
            6 | 8 => bytes
                .chunks_exact(2)
                .map(|pair| -> Result<u8, ColorParseError> {
                    Ok(nibble(pair[0])? << 4 | nibble(pair[1])?)
                })
                .collect::<Result<_, _>>()?,
            _ => return Err(ColorParseError::BadLength),
        };
        Ok(Self {
            r: channels[0],
            g: channels[1],
            b: channels[2],
            a: channels.get(3).copied().unwrap_or(255),
        })
    }
}
impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if !self.is_opaque() {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}
impl serde::Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
impl<'de> serde::Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let str =
            <std::borrow::Cow<'de, str> as serde::Deserialize<'de>>::deserialize(deserializer)?;
        str.parse().map_err(serde::de::Error::custom)
    }
}
