//! Physical units, for describing how exported pixels map onto the printed garment.

pub const CM_PER_IN: f32 = 2.54;
pub const IN_PER_CM: f32 = 1.0 / CM_PER_IN;
pub const CM_PER_M: f32 = 100.0;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum UnitParseError {
    #[error(transparent)]
    Value(#[from] std::num::ParseFloatError),
    #[error("unknown unit")]
    UnrecognizedUnit,
    #[error("resolution must be positive")]
    NotPositive,
}

/// Defines the relationship between exported pixels and physical units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Resolution {
    /// Dots (pixels) per inch
    Dpi(f32),
    /// Dots (pixels) per centimeter
    Dpcm(f32),
}
impl Resolution {
    #[must_use]
    pub fn value(self) -> f32 {
        match self {
            Self::Dpi(x) | Self::Dpcm(x) => x,
        }
    }
    #[must_use]
    pub fn unit(self) -> &'static str {
        match self {
            Resolution::Dpi(_) => "dpi",
            Resolution::Dpcm(_) => "dpcm",
        }
    }
    #[must_use]
    pub fn into_dpcm(self) -> f32 {
        match self {
            Resolution::Dpi(i) => i * IN_PER_CM,
            Resolution::Dpcm(cm) => cm,
        }
    }
    /// Pixels per meter, rounded, as stored in a PNG `pHYs` chunk.
    #[must_use]
    pub fn pixels_per_meter(self) -> u32 {
        (self.into_dpcm() * CM_PER_M).round().max(0.0) as u32
    }
}
impl Default for Resolution {
    fn default() -> Self {
        // Typical DTG/DTF print resolution.
        Self::Dpi(300.0)
    }
}
impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.value(), self.unit())
    }
}
impl std::str::FromStr for Resolution {
    type Err = UnitParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (value, ctor): (&str, fn(f32) -> Self) = if let Some(v) = s.strip_suffix("dpcm") {
            (v, Self::Dpcm)
        } else if let Some(v) = s.strip_suffix("dpi") {
            (v, Self::Dpi)
        } else {
            return Err(UnitParseError::UnrecognizedUnit);
        };
        let value: f32 = value.trim().parse()?;
        if value.is_finite() && value > 0.0 {
            Ok(ctor(value))
        } else {
            Err(UnitParseError::NotPositive)
        }
    }
}
impl serde::Serialize for Resolution {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
impl<'de> serde::Deserialize<'de> for Resolution {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let str =
            <std::borrow::Cow<'de, str> as serde::Deserialize<'de>>::deserialize(deserializer)?;
        str.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::{Resolution, UnitParseError};
    #[test]
    fn parse_resolution() {
        assert_eq!("300dpi".parse(), Ok(Resolution::Dpi(300.0)));
        assert_eq!(" 118.11 dpcm".parse(), Ok(Resolution::Dpcm(118.11)));
        assert_eq!(
            "300ppi".parse::<Resolution>(),
            Err(UnitParseError::UnrecognizedUnit)
        );
        assert_eq!(
            "-3dpi".parse::<Resolution>(),
            Err(UnitParseError::NotPositive)
        );
    }
    #[test]
    fn pixels_per_meter() {
        // 300dpi == 11811.02 px/m
        assert_eq!(Resolution::Dpi(300.0).pixels_per_meter(), 11811);
        assert_eq!(Resolution::Dpcm(100.0).pixels_per_meter(), 10000);
    }
}
