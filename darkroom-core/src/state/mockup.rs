//! Garment mockups, drawn behind every layer.

/// Which face of the garment is being edited.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    Debug,
    Default,
    serde::Serialize,
    serde::Deserialize,
    strum::AsRefStr,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Side {
    #[default]
    Front,
    Back,
}

/// A background image for one side of a garment, optionally specific to a variant.
#[derive(Clone, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct MockupAsset {
    pub side: Side,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
    /// Location understood by the asset source.
    pub image_url: String,
}

/// Choose the mockup to show for a side and variant.
///
/// An exact match wins. Otherwise the side's first variant-less record, then the side's first
/// record of any variant. `None` means a plain white background.
#[must_use]
pub fn lookup<'a>(
    records: &'a [MockupAsset],
    side: Side,
    variant: Option<&str>,
) -> Option<&'a MockupAsset> {
    let mut for_side = records.iter().filter(|record| record.side == side);
    if let Some(variant) = variant {
        if let Some(exact) = for_side
            .clone()
            .find(|record| record.variant_id.as_deref() == Some(variant))
        {
            return Some(exact);
        }
    }
    for_side
        .clone()
        .find(|record| record.variant_id.is_none())
        .or_else(|| for_side.next())
}

/// Whether any record names this variant, on any side.
#[must_use]
pub fn has_variant(records: &[MockupAsset], variant: &str) -> bool {
    records
        .iter()
        .any(|record| record.variant_id.as_deref() == Some(variant))
}
