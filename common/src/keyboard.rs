//! Odia virtual keyboard
//!
//! Latin key labels mapped to the Odia glyph inserted when the key is
//! clicked. Punctuation keys pass through unchanged. `0` and `p` both
//! produce `୰`; the table is kept as observed in the field.

/// One key of the on-screen keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCell {
    pub latin: &'static str,
    pub glyph: &'static str,
}

const fn key(latin: &'static str, glyph: &'static str) -> KeyCell {
    KeyCell { latin, glyph }
}

/// Keys offered by the keyboard, row by row
pub const KEYBOARD: [&[KeyCell]; 4] = [
    &[
        key("`", "଼"),
        key("1", "୧"),
        key("2", "୨"),
        key("3", "୩"),
        key("4", "୪"),
        key("5", "୫"),
        key("6", "୬"),
        key("7", "୭"),
        key("8", "୮"),
        key("9", "୯"),
        key("0", "୰"),
        key("=", "="),
    ],
    &[
        key("q", "ୱ"),
        key("w", "୲"),
        key("e", "୳"),
        key("r", "୴"),
        key("t", "୵"),
        key("y", "୶"),
        key("u", "୷"),
        key("i", "୸"),
        key("o", "୹"),
        key("p", "୰"),
        key("[", "["),
        key("]", "]"),
    ],
    &[
        key("a", "ଅ"),
        key("s", "ଆ"),
        key("d", "ଇ"),
        key("f", "ଈ"),
        key("g", "ଉ"),
        key("h", "ଊ"),
        key("j", "ଋ"),
        key("k", "ଌ"),
        key("l", "ଏ"),
        key(";", ";"),
        key("'", "'"),
        key("\\", "\\"),
    ],
    &[
        key("z", "ଓ"),
        key("x", "ଔ"),
        key("c", "କ"),
        key("v", "ଖ"),
        key("b", "ଗ"),
        key("n", "ଘ"),
        key("m", "ଙ"),
        key(",", ","),
        key(".", "."),
        key("/", "/"),
        key("-", "-"),
    ],
];

/// The space bar below the grid
pub const SPACE_KEY: KeyCell = key(" ", " ");

/// Every key in the grid followed by the space bar
pub fn cells() -> impl Iterator<Item = &'static KeyCell> {
    KEYBOARD
        .iter()
        .flat_map(|row| row.iter())
        .chain(std::iter::once(&SPACE_KEY))
}

/// Glyph inserted for a Latin key, `None` when the keyboard has no such key
pub fn glyph_for(latin: &str) -> Option<&'static str> {
    cells().find(|cell| cell.latin == latin).map(|cell| cell.glyph)
}

/// Type a Latin key sequence on the keyboard; characters without a key are dropped
pub fn transliterate(latin: &str) -> String {
    let mut buf = [0u8; 4];
    latin
        .chars()
        .filter_map(|c| glyph_for(c.encode_utf8(&mut buf)))
        .collect()
}
