//! Named light colors and RGB resolution.

/// RGB triple as Home Assistant's `rgb_color` expects it.
pub type Rgb = [u8; 3];

pub const WHITE: Rgb = [255, 255, 255];

/// The color names the interpreter understands, with their RGB values.
pub const COLOR_TABLE: [(&str, Rgb); 12] = [
    ("red", [255, 0, 0]),
    ("green", [0, 255, 0]),
    ("blue", [0, 0, 255]),
    ("white", WHITE),
    ("warm white", [255, 223, 186]),
    ("yellow", [255, 255, 0]),
    ("orange", [255, 165, 0]),
    ("purple", [128, 0, 128]),
    ("pink", [255, 192, 203]),
    ("cyan", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("cool white", [230, 230, 255]),
];

/// RGB for a table color name (case-insensitive).
pub fn lookup(name: &str) -> Option<Rgb> {
    let name = name.trim().to_lowercase();
    COLOR_TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, rgb)| *rgb)
}

pub fn is_known(name: &str) -> bool {
    lookup(name).is_some()
}

/// Parse a literal `"r,g,b"` triple. Components above 255 are clamped.
pub fn parse_rgb(literal: &str) -> Option<Rgb> {
    let parts: Vec<&str> = literal.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return None;
    }
    let mut rgb = [0u8; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: u32 = part.parse().unwrap_or(u32::MAX);
        *slot = value.min(255) as u8;
    }
    Some(rgb)
}

/// Table color, else literal triple, else white.
pub fn resolve(color: &str) -> Rgb {
    lookup(color)
        .or_else(|| parse_rgb(color))
        .unwrap_or(WHITE)
}
