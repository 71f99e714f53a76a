//! Literal text location: map a token back to its on-page geometry.

use regex::Regex;

use crate::{BBox, PageText};

/// Two glyphs whose bottom edges differ by less than this many points are
/// treated as sitting on the same line.
const LINE_TOLERANCE: f64 = 1.0;

/// Find every literal occurrence of `needle` on the page and return its
/// bounding geometry.
///
/// The algorithm follows the usual position-aware search shape:
/// 1. Concatenate all glyph characters into a single string, tracking the
///    byte-offset → glyph-index mapping.
/// 2. Run the escaped (literal) pattern against the concatenated string.
/// 3. For each match, union the contributing glyphs' boxes, one box per
///    line, so a match that wraps yields a box per line segment rather than
///    a rectangle spanning both.
///
/// Matching is case-sensitive and not anchored to word boundaries: an
/// occurrence inside a longer word is returned too. Misses simply produce an
/// empty vector.
pub fn locate_literal(page: &PageText, needle: &str) -> Vec<BBox> {
    if page.glyphs.is_empty() || needle.is_empty() {
        return Vec::new();
    }

    // byte_to_glyph[byte_offset] = index into the page's glyph list
    let mut full_text = String::new();
    let mut byte_to_glyph: Vec<usize> = Vec::new();
    for (i, g) in page.glyphs.iter().enumerate() {
        let start = full_text.len();
        full_text.push(g.ch);
        for _ in start..full_text.len() {
            byte_to_glyph.push(i);
        }
    }

    let re = match Regex::new(&regex::escape(needle)) {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    let mut boxes = Vec::new();

    for m in re.find_iter(&full_text) {
        let mut indices: Vec<usize> = Vec::new();
        for byte_offset in m.range() {
            let idx = byte_to_glyph[byte_offset];
            if indices.last() != Some(&idx) {
                indices.push(idx);
            }
        }
        if indices.is_empty() {
            continue;
        }

        // Union per line: start a new box whenever the baseline jumps.
        let mut current = page.glyphs[indices[0]].bbox;
        for &idx in &indices[1..] {
            let bbox = page.glyphs[idx].bbox;
            if (bbox.y0 - current.y0).abs() > LINE_TOLERANCE {
                boxes.push(current);
                current = bbox;
            } else {
                current = current.union(&bbox);
            }
        }
        boxes.push(current);
    }

    boxes
}
