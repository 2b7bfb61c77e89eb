//! Text encoding into the HD44780 ROM code space.
//!
//! The controller's character ROM (code A00, the Japanese variant) is a fixed
//! non-Unicode byte table: ASCII in 0x20-0x7D, half-width katakana glyphs at
//! 0xA1-0xDF and a handful of Greek/symbol glyphs at 0xE0-0xFF. This module
//! maps Unicode text into that space:
//!
//! 1. [`to_halfwidth`] normalizes full-width alphanumerics and symbols to
//!    ASCII and full-width katakana to the half-width block. The rendered
//!    length of a line (one display cell per char) is measured on this form.
//! 2. [`to_fullwidth_kana`] re-expands the kana back to full-width forms, the
//!    shape the lookup tables are indexed by. The normalization is asymmetric
//!    on purpose: digits and latin letters stay half-width, kana goes back to
//!    full-width.
//! 3. [`encode`] decomposes voiced/semi-voiced kana into base glyph plus
//!    diacritic (the ROM has no composed forms) and looks every glyph up,
//!    falling back to `?` for anything the ROM cannot show.
//!
//! The katakana ROM block 0xA1-0xDF mirrors the Unicode half-width katakana
//! block U+FF61-U+FF9F index for index, so [`KANA_ROM`] serves both the width
//! conversions and the code lookup.

use crate::{LcdError, LcdResult};

/// ROM glyphs at codes 0xA1..=0xDF, in code order.
const KANA_ROM: &str = "。「」、・ヲァィゥェォャュョッー\
                        アイウエオカキクケコサシスセソタチツテトナニヌネノハヒフヘホマミムメモ\
                        ヤユヨラリルレロワン゛゜";

const KANA_ROM_BASE: u8 = 0xA1;

/// First code point of the Unicode half-width katakana block (U+FF61 `｡`).
const HALFWIDTH_BASE: u32 = 0xFF61;

const HALFWIDTH_VOICED_MARK: char = '\u{FF9E}'; // ﾞ
const HALFWIDTH_SEMIVOICED_MARK: char = '\u{FF9F}'; // ﾟ

/// Composed voiced/semi-voiced katakana and their (base, diacritic) pairs.
const VOICED_KANA: &[(char, char, char)] = &[
    ('ガ', 'カ', '゛'),
    ('ギ', 'キ', '゛'),
    ('グ', 'ク', '゛'),
    ('ゲ', 'ケ', '゛'),
    ('ゴ', 'コ', '゛'),
    ('ザ', 'サ', '゛'),
    ('ジ', 'シ', '゛'),
    ('ズ', 'ス', '゛'),
    ('ゼ', 'セ', '゛'),
    ('ゾ', 'ソ', '゛'),
    ('ダ', 'タ', '゛'),
    ('ヂ', 'チ', '゛'),
    ('ヅ', 'ツ', '゛'),
    ('デ', 'テ', '゛'),
    ('ド', 'ト', '゛'),
    ('バ', 'ハ', '゛'),
    ('ビ', 'ヒ', '゛'),
    ('ブ', 'フ', '゛'),
    ('ベ', 'ヘ', '゛'),
    ('ボ', 'ホ', '゛'),
    ('パ', 'ハ', '゜'),
    ('ピ', 'ヒ', '゜'),
    ('プ', 'フ', '゜'),
    ('ペ', 'ヘ', '゜'),
    ('ポ', 'ホ', '゜'),
];

/// Nearest printable stand-ins for the 0xE0-0xFF ROM region. Codes whose
/// stand-in would collide with an ASCII glyph (0xE7, 0xEE, 0xF0, 0xF1, 0xF8)
/// and the blank 0xFE are left unmapped.
const EXTENDED_GLYPHS: &[(char, u8)] = &[
    ('α', 0xE0),
    ('ä', 0xE1),
    ('β', 0xE2),
    ('ε', 0xE3),
    ('μ', 0xE4),
    ('σ', 0xE5),
    ('ρ', 0xE6),
    ('√', 0xE8),
    ('陰', 0xE9),
    ('ι', 0xEA),
    ('×', 0xEB),
    ('￠', 0xEC),
    ('￡', 0xED),
    ('ö', 0xEF),
    ('θ', 0xF2),
    ('∞', 0xF3),
    ('Ω', 0xF4),
    ('ü', 0xF5),
    ('Σ', 0xF6),
    ('π', 0xF7),
    ('ν', 0xF9),
    ('千', 0xFA),
    ('万', 0xFB),
    ('円', 0xFC),
    ('÷', 0xFD),
    ('塗', 0xFF),
];

fn kana_rom_index(c: char) -> Option<usize> {
    KANA_ROM.chars().position(|glyph| glyph == c)
}

/// Splits a composed glyph into the two glyphs the ROM renders it as.
fn decompose(c: char) -> Option<(char, char)> {
    if c == '℃' {
        // No single degree-Celsius glyph; the degree ring doubles as the
        // semi-voiced mark.
        return Some(('゜', 'C'));
    }
    VOICED_KANA
        .iter()
        .find(|&&(composed, _, _)| composed == c)
        .map(|&(_, base, mark)| (base, mark))
}

fn compose(base: char, mark: char) -> Option<char> {
    VOICED_KANA
        .iter()
        .find(|&&(_, b, m)| b == base && m == mark)
        .map(|&(composed, _, _)| composed)
}

/// ROM code for a single glyph, if the ROM has one.
pub fn glyph_code(c: char) -> Option<u8> {
    if ('\u{20}'..='\u{7D}').contains(&c) {
        return Some(c as u8);
    }
    match c {
        '→' => return Some(0x7E),
        '←' => return Some(0x7F),
        _ => {}
    }
    if let Some(index) = kana_rom_index(c) {
        return Some(KANA_ROM_BASE + index as u8);
    }
    EXTENDED_GLYPHS
        .iter()
        .find(|&&(glyph, _)| glyph == c)
        .map(|&(_, code)| code)
}

/// Normalizes text towards half-width forms: full-width ASCII and the
/// ideographic space become plain ASCII, full-width katakana becomes
/// half-width katakana (voiced forms expand to base plus mark). One output
/// char corresponds to one display cell.
pub fn to_halfwidth(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{3000}' => out.push(' '),
            '\u{FF01}'..='\u{FF5E}' => {
                out.push(char::from_u32(c as u32 - 0xFEE0).unwrap_or(c));
            }
            _ => {
                if let Some((base, mark)) = decompose(c).filter(|_| c != '℃') {
                    out.push(halfwidth_kana(base).unwrap_or(base));
                    out.push(halfwidth_kana(mark).unwrap_or(mark));
                } else if let Some(half) = halfwidth_kana(c) {
                    out.push(half);
                } else {
                    out.push(c);
                }
            }
        }
    }
    out
}

fn halfwidth_kana(c: char) -> Option<char> {
    kana_rom_index(c).and_then(|index| char::from_u32(HALFWIDTH_BASE + index as u32))
}

/// Converts half-width katakana back to full-width forms, recombining a base
/// glyph with a following voicing mark where a composed form exists. ASCII
/// and anything outside the half-width kana block pass through untouched.
pub fn to_fullwidth_kana(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let Some(index) = (c as u32).checked_sub(HALFWIDTH_BASE) else {
            out.push(c);
            continue;
        };
        let Some(full) = KANA_ROM.chars().nth(index as usize) else {
            out.push(c);
            continue;
        };
        let composed = match chars.peek() {
            Some(&HALFWIDTH_VOICED_MARK) => compose(full, '゛'),
            Some(&HALFWIDTH_SEMIVOICED_MARK) => compose(full, '゜'),
            _ => None,
        };
        match composed {
            Some(glyph) => {
                chars.next();
                out.push(glyph);
            }
            None => out.push(full),
        }
    }
    out
}

/// Encodes normalized text into ROM codes: composed glyphs decompose into two
/// codes, anything the ROM cannot show degrades to `?` rather than failing
/// the paint.
pub fn encode(text: &str) -> Vec<u8> {
    let mut codes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match decompose(c) {
            Some((first, second)) => {
                codes.push(glyph_code(first).unwrap_or(b'?'));
                codes.push(glyph_code(second).unwrap_or(b'?'));
            }
            None => codes.push(glyph_code(c).unwrap_or(b'?')),
        }
    }
    codes
}

/// ASCII passthrough for plain (non-kana) mode. Anything outside ASCII has no
/// defined rendering here, so it fails loudly instead of corrupting the line.
pub fn encode_ascii(text: &str) -> LcdResult<Vec<u8>> {
    text.chars()
        .map(|c| {
            if c.is_ascii() {
                Ok(c as u8)
            } else {
                Err(LcdError::UnsupportedChar(c))
            }
        })
        .collect()
}
