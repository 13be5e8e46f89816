use super::ColorOption;

/// Colors offered by the picker, in display order.
#[rustfmt::skip]
pub const AVAILABLE_COLORS: &[ColorOption] = &[
    ColorOption { name: "Light Pink",           hex: "ffadad", rgb: [255, 173, 173] },
    ColorOption { name: "Deep Champagne",       hex: "ffd6a5", rgb: [255, 214, 165] },
    ColorOption { name: "Lemon Yellow Crayola", hex: "fdffb6", rgb: [253, 255, 182] },
    ColorOption { name: "Nyanza",               hex: "ddffd6", rgb: [221, 255, 214] },
    ColorOption { name: "Uranian Blue",         hex: "c2e8ff", rgb: [194, 232, 255] },
    ColorOption { name: "Pale Purple Pantone",  hex: "ffebff", rgb: [255, 235, 255] },
];

/// `rgb(r,g,b)` with no spaces.
pub fn rgb_css(rgb: [u8; 3]) -> String {
    let [r, g, b] = rgb;
    format!("rgb({r},{g},{b})")
}

/// Parse six hex digits, with or without a leading `#`.
pub fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Look up a palette entry by name (case-insensitive) or hex.
pub fn find(query: &str) -> Option<&'static ColorOption> {
    let query = query.trim();
    let hex = query.strip_prefix('#').unwrap_or(query);
    AVAILABLE_COLORS
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(query) || c.hex.eq_ignore_ascii_case(hex))
}

/// Turn user input into a persisted CSS color.
///
/// Palette names and hex codes map to the entry's `rgb()` form; other hex
/// codes become `rgb()` too; `rgb(...)` expressions pass through.
pub fn resolve(input: &str) -> Option<String> {
    if let Some(option) = find(input) {
        return Some(option.css());
    }
    let input = input.trim();
    if let Some(rgb) = parse_hex(input) {
        return Some(rgb_css(rgb));
    }
    let canonical = canonical_css(input);
    if canonical.starts_with("rgb(") && canonical.ends_with(')') {
        return Some(canonical);
    }
    None
}

/// Form used to compare colors: lowercase, no whitespace, `#rrggbb` as `rgb()`.
///
/// Browsers read back `rgb(1, 2, 3)` for an inline `rgb(1,2,3)`, so a plain
/// string comparison would never match.
pub fn canonical_css(color: &str) -> String {
    let compact: String = color
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();
    match compact.strip_prefix('#').and_then(parse_hex) {
        Some(rgb) => rgb_css(rgb),
        None => compact,
    }
}

pub fn same_color(a: &str, b: &str) -> bool {
    canonical_css(a) == canonical_css(b)
}
