/// Prefix of the Outlook category color presets (`preset0` .. `preset24`).
pub const PRESET_PREFIX: &str = "preset";

/// Returned for unknown, malformed or out-of-range presets.
pub const DEFAULT_PRESET_COLOR: &str = "#FFFFFF";

/// Outlook preset colors, indexed by preset number.
pub const PALETTE: [&str; 25] = [
    "#D6252E", "#F06C15", "#FFCA4C", "#FFFE3D", "#4AB63F",
    "#40BD95", "#859A52", "#3267B8", "#613DB4", "#A34E78",
    "#C4CCDD", "#8C9CBD", "#C4C4C4", "#A5A5A5", "#1C1C1C",
    "#AF1E25", "#B14F0D", "#AB7B05", "#999400", "#35792B",
    "#2E7D64", "#5F6C3A", "#2A5191", "#50328F", "#82375F",
];

pub fn color_for_preset(preset_name: &str) -> &'static str {
    preset_name
        .strip_prefix(PRESET_PREFIX)
        .and_then(|index| index.parse::<usize>().ok())
        .and_then(|index| PALETTE.get(index).copied())
        .unwrap_or(DEFAULT_PRESET_COLOR)
}
