//! Standard-14 Helvetica metrics and WinAnsi text encoding.
//!
//! The footer uses the non-embedded Type1 Helvetica every PDF viewer ships,
//! so right-aligned text has to be measured against the font's published
//! advance widths (1/1000 em) rather than by loading a font program.

/// Advance widths for ASCII 32..=126.
const ASCII_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Advance widths for WinAnsi 160..=255 (the Latin-1 range).
const LATIN1_WIDTHS: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333, //
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611, //
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278, //
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611, //
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,
];

/// WinAnsi 128..=159: (code, Unicode scalar, width). Codes 0x81, 0x8D, 0x8F,
/// 0x90 and 0x9D are unassigned.
const WIN_ANSI_HIGH: [(u8, char, u16); 27] = [
    (0x80, '\u{20AC}', 556),  // €
    (0x82, '\u{201A}', 222),  // ‚
    (0x83, '\u{0192}', 556),  // ƒ
    (0x84, '\u{201E}', 333),  // „
    (0x85, '\u{2026}', 1000), // …
    (0x86, '\u{2020}', 556),  // †
    (0x87, '\u{2021}', 556),  // ‡
    (0x88, '\u{02C6}', 333),  // ˆ
    (0x89, '\u{2030}', 1000), // ‰
    (0x8A, '\u{0160}', 667),  // Š
    (0x8B, '\u{2039}', 333),  // ‹
    (0x8C, '\u{0152}', 1000), // Œ
    (0x8E, '\u{017D}', 611),  // Ž
    (0x91, '\u{2018}', 222),  // ‘
    (0x92, '\u{2019}', 222),  // ’
    (0x93, '\u{201C}', 333),  // “
    (0x94, '\u{201D}', 333),  // ”
    (0x95, '\u{2022}', 350),  // •
    (0x96, '\u{2013}', 556),  // –
    (0x97, '\u{2014}', 1000), // —
    (0x98, '\u{02DC}', 333),  // ˜
    (0x99, '\u{2122}', 1000), // ™
    (0x9A, '\u{0161}', 500),  // š
    (0x9B, '\u{203A}', 333),  // ›
    (0x9C, '\u{0153}', 944),  // œ
    (0x9E, '\u{017E}', 500),  // ž
    (0x9F, '\u{0178}', 667),  // Ÿ
];

/// Replacement for characters WinAnsi cannot represent.
const REPLACEMENT: u8 = b'?';

/// Map one character to its WinAnsi code, if it has one.
fn win_ansi_byte(c: char) -> Option<u8> {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(c as u32 as u8),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(_, ch, _)| *ch == c)
            .map(|(code, _, _)| *code),
    }
}

/// Encode `text` as WinAnsi bytes. Unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| win_ansi_byte(c).unwrap_or(REPLACEMENT))
        .collect()
}

/// Advance width of one WinAnsi code in 1/1000 em.
pub fn glyph_width(code: u8) -> u16 {
    match code {
        0x20..=0x7E => ASCII_WIDTHS[(code - 0x20) as usize],
        0xA0..=0xFF => LATIN1_WIDTHS[(code - 0xA0) as usize],
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, _, w)| *w)
            .unwrap_or(0),
    }
}

/// Width of `text` set in Helvetica at `size` points, after WinAnsi encoding.
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = encode_win_ansi(text)
        .into_iter()
        .map(|b| glyph_width(b) as u32)
        .sum();
    units as f32 * size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_widths() {
        assert_eq!(glyph_width(b' '), 278);
        assert_eq!(glyph_width(b'@'), 1015);
        assert_eq!(glyph_width(b'W'), 944);
        assert_eq!(glyph_width(b'i'), 222);
        assert_eq!(glyph_width(b'~'), 584);
    }

    #[test]
    fn middle_dot_is_latin1() {
        assert_eq!(encode_win_ansi("a\u{00b7}b"), vec![b'a', 0xB7, b'b']);
        assert_eq!(glyph_width(0xB7), 278);
    }

    #[test]
    fn high_range_and_replacement() {
        assert_eq!(encode_win_ansi("\u{2014}\u{2022}\u{20AC}"), vec![0x97, 0x95, 0x80]);
        assert_eq!(encode_win_ansi("日本"), vec![b'?', b'?']);
        assert_eq!(glyph_width(0x81), 0);
    }

    #[test]
    fn latin1_spot_checks() {
        assert_eq!(glyph_width(0xA9), 737); // ©
        assert_eq!(glyph_width(0xC6), 1000); // Æ
        assert_eq!(glyph_width(0xE9), 556); // é
        assert_eq!(glyph_width(0xFF), 500); // ÿ
    }

    #[test]
    fn width_scales_with_size() {
        // "Page" = 667 + 556 + 556 + 556
        let w = text_width("Page", 10.0);
        assert!((w - 23.35).abs() < 1e-4, "got {w}");
        assert!((text_width("Page", 6.5) - 2335.0 * 6.5 / 1000.0).abs() < 1e-4);
        assert_eq!(text_width("", 6.5), 0.0);
    }
}
