//! Positioned text extraction from page content streams.
//!
//! lopdf exposes the PDF object model but no layout, so this module walks a
//! page's decoded content stream with a simplified text-rendering state
//! machine and emits one [`TextSpan`] per text-showing operation, backed by
//! per-character [`Glyph`] boxes. Handled operators:
//!
//! | Operator | Action |
//! |----------|--------|
//! | `BT`     | Begin text object, reset matrices |
//! | `ET`     | End text object |
//! | `Tf`     | Set font and size |
//! | `Tm`     | Set text matrix directly |
//! | `Td`     | Translate text position |
//! | `TD`     | Translate and set leading |
//! | `T*`     | Move to start of next line |
//! | `TL`     | Set text leading |
//! | `Tc`     | Set character spacing |
//! | `Tw`     | Set word spacing |
//! | `Tz`     | Set horizontal scaling |
//! | `Ts`     | Set text rise |
//! | `Tj`     | Show a string |
//! | `TJ`     | Show strings with kerning adjustments |
//! | `'`      | Move to next line and show string |
//! | `"`      | Set spacing, move to next line and show string |
//!
//! Glyph advances use the font's /Widths array when the page resources carry
//! one; otherwise a fixed width-per-point ratio stands in. The output order
//! is content-stream order, which is this engine's reading order.

use std::collections::HashMap;

use lopdf::content::Content;
use tracing::debug;

use redline_core::{BBox, Glyph, PageText};

use crate::document::{deref, page_content_bytes, resolve_inherited};
use crate::error::EngineError;

/// Approximate glyph width as a fraction of font size when the font carries
/// no /Widths array (the standard-14 fonts, for instance).
const APPROX_WIDTH_RATIO: f64 = 0.5;

/// Vertical extent of a glyph box around the baseline, as fractions of the
/// effective font size.
const ASCENT_RATIO: f64 = 0.75;
const DESCENT_RATIO: f64 = 0.25;

/// A TJ kerning displacement larger than this fraction of the approximate
/// glyph width is rendered as an inter-word gap.
const KERN_GAP_FACTOR: f64 = 0.3;

/// The identity text matrix: [a, b, c, d, tx, ty].
const IDENTITY_MATRIX: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Glyph widths for one font resource, from its /FirstChar + /Widths pair.
struct FontWidths {
    first_char: i64,
    widths: Vec<f64>,
}

impl FontWidths {
    /// Width of a character code in thousandths of text-space units.
    fn width(&self, code: u32) -> Option<f64> {
        let index = code as i64 - self.first_char;
        if (0..self.widths.len() as i64).contains(&index) {
            Some(self.widths[index as usize])
        } else {
            None
        }
    }
}

/// Text-rendering state tracked across content-stream operators.
struct TextState {
    font_key: Vec<u8>,
    font_size: f64,
    text_matrix: [f64; 6],
    line_matrix: [f64; 6],
    /// Horizontal scaling (Tz), as a fraction.
    horiz_scale: f64,
    /// Character spacing (Tc).
    char_spacing: f64,
    /// Word spacing (Tw), applied to single-byte code 32.
    word_spacing: f64,
    /// Text rise (Ts).
    text_rise: f64,
    /// Leading (TL).
    leading: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_key: Vec::new(),
            font_size: 0.0,
            text_matrix: IDENTITY_MATRIX,
            line_matrix: IDENTITY_MATRIX,
            horiz_scale: 1.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            text_rise: 0.0,
            leading: 0.0,
        }
    }
}

impl TextState {
    fn x(&self) -> f64 {
        self.text_matrix[4]
    }

    fn y(&self) -> f64 {
        self.text_matrix[5]
    }

    /// Effective font size accounting for the text matrix vertical scale.
    fn effective_font_size(&self) -> f64 {
        let scale = (self.text_matrix[1].powi(2) + self.text_matrix[3].powi(2)).sqrt();
        (self.font_size * scale).abs()
    }

    /// Horizontal scale the text matrix applies to x displacements.
    fn x_scale(&self) -> f64 {
        self.text_matrix[0].abs()
    }

    /// Advance the text matrix horizontally by `dx` text-space units.
    fn advance_x(&mut self, dx: f64) {
        self.text_matrix[4] += dx * self.text_matrix[0];
        self.text_matrix[5] += dx * self.text_matrix[1];
    }

    /// Multiply the line matrix by a translation (Td / TD / T*).
    fn translate_line(&mut self, tx: f64, ty: f64) {
        let new_tx = self.line_matrix[0] * tx + self.line_matrix[2] * ty + self.line_matrix[4];
        let new_ty = self.line_matrix[1] * tx + self.line_matrix[3] * ty + self.line_matrix[5];
        self.line_matrix[4] = new_tx;
        self.line_matrix[5] = new_ty;
        self.text_matrix = self.line_matrix;
    }
}

/// Extract one number from a lopdf object, accepting Integer and Real.
fn number(obj: &lopdf::Object) -> Option<f64> {
    match obj {
        lopdf::Object::Integer(i) => Some(*i as f64),
        lopdf::Object::Real(f) => Some(*f as f64),
        _ => None,
    }
}

/// Best-effort decoding of show-string bytes into characters.
///
/// Each character keeps its single-byte code when one exists, for /Widths
/// lookups. The ladder: UTF-16BE with BOM, then valid UTF-8, then Latin-1
/// (every byte mapped to its code point).
fn decode_show_bytes(bytes: &[u8]) -> Vec<(char, Option<u32>)> {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return char::decode_utf16(units)
            .filter_map(|r| r.ok())
            .map(|ch| (ch, None))
            .collect();
    }
    if bytes.is_ascii() {
        return bytes.iter().map(|&b| (b as char, Some(b as u32))).collect();
    }
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s
            .chars()
            .map(|ch| {
                let code = (ch as u32 <= 0xFF).then_some(ch as u32);
                (ch, code)
            })
            .collect();
    }
    bytes.iter().map(|&b| (b as char, Some(b as u32))).collect()
}

/// Collect /FirstChar + /Widths metrics for every font in the page's
/// resource dictionary. Best-effort: fonts without metrics are simply absent.
fn page_font_widths(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> HashMap<Vec<u8>, FontWidths> {
    let mut map = HashMap::new();

    let Ok(Some(resources_obj)) = resolve_inherited(doc, page_id, b"Resources") else {
        return map;
    };
    let Ok(resources) = deref(doc, resources_obj).as_dict() else {
        return map;
    };
    let Ok(fonts_obj) = resources.get(b"Font") else {
        return map;
    };
    let Ok(fonts) = deref(doc, fonts_obj).as_dict() else {
        return map;
    };

    for (name, value) in fonts.iter() {
        let Ok(font_dict) = deref(doc, value).as_dict() else {
            continue;
        };
        let first_char = font_dict
            .get(b"FirstChar")
            .ok()
            .and_then(|obj| number(deref(doc, obj)))
            .map(|n| n as i64);
        let widths = font_dict
            .get(b"Widths")
            .ok()
            .and_then(|obj| deref(doc, obj).as_array().ok())
            .map(|arr| arr.iter().filter_map(number).collect::<Vec<f64>>());
        if let (Some(first_char), Some(widths)) = (first_char, widths) {
            map.insert(name.clone(), FontWidths { first_char, widths });
        }
    }

    map
}

/// Walk a page's content stream and produce its ordered [`PageText`].
pub(crate) fn extract_page_text(
    doc: &lopdf::Document,
    page_id: lopdf::ObjectId,
) -> Result<PageText, EngineError> {
    let content_bytes = page_content_bytes(doc, page_id)?;
    if content_bytes.is_empty() {
        return Ok(PageText::new());
    }

    let content = Content::decode(&content_bytes)
        .map_err(|e| EngineError::Malformed(format!("cannot decode content stream: {e}")))?;
    let fonts = page_font_widths(doc, page_id);

    let mut interp = Interpreter {
        state: TextState::default(),
        fonts,
        page: PageText::new(),
    };

    for op in &content.operations {
        interp.apply(op);
    }

    debug!(
        spans = interp.page.span_count(),
        glyphs = interp.page.glyphs.len(),
        "extracted page text"
    );
    Ok(interp.page)
}

struct Interpreter {
    state: TextState,
    fonts: HashMap<Vec<u8>, FontWidths>,
    page: PageText,
}

impl Interpreter {
    fn apply(&mut self, op: &lopdf::content::Operation) {
        let operands = &op.operands;
        match op.operator.as_str() {
            "BT" => {
                self.state.text_matrix = IDENTITY_MATRIX;
                self.state.line_matrix = IDENTITY_MATRIX;
            }
            "ET" => {
                // Font state is kept across text objects; some producers set
                // the font once and reuse it in later BT/ET blocks.
            }
            "Tf" => {
                if operands.len() >= 2 {
                    if let lopdf::Object::Name(name) = &operands[0] {
                        self.state.font_key = name.clone();
                    }
                    if let Some(size) = number(&operands[1]) {
                        self.state.font_size = size;
                    }
                }
            }
            "Tm" => {
                let vals: Vec<f64> = operands.iter().take(6).filter_map(number).collect();
                if vals.len() == 6 {
                    self.state.text_matrix = [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]];
                    self.state.line_matrix = self.state.text_matrix;
                }
            }
            "Td" => {
                if operands.len() >= 2 {
                    let tx = number(&operands[0]).unwrap_or(0.0);
                    let ty = number(&operands[1]).unwrap_or(0.0);
                    self.state.translate_line(tx, ty);
                }
            }
            "TD" => {
                // TD is equivalent to: -ty TL; tx ty Td
                if operands.len() >= 2 {
                    let tx = number(&operands[0]).unwrap_or(0.0);
                    let ty = number(&operands[1]).unwrap_or(0.0);
                    self.state.leading = -ty;
                    self.state.translate_line(tx, ty);
                }
            }
            "T*" => {
                self.state.translate_line(0.0, -self.state.leading);
            }
            "TL" => {
                if let Some(v) = operands.first().and_then(number) {
                    self.state.leading = v;
                }
            }
            "Tc" => {
                if let Some(v) = operands.first().and_then(number) {
                    self.state.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some(v) = operands.first().and_then(number) {
                    self.state.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some(v) = operands.first().and_then(number) {
                    self.state.horiz_scale = v / 100.0;
                }
            }
            "Ts" => {
                if let Some(v) = operands.first().and_then(number) {
                    self.state.text_rise = v;
                }
            }
            "Tj" => {
                if let Some(lopdf::Object::String(bytes, _)) = operands.first() {
                    let mut glyphs = Vec::new();
                    self.show_string(bytes, &mut glyphs);
                    self.page.push_span(glyphs);
                }
            }
            "TJ" => {
                if let Some(lopdf::Object::Array(elements)) = operands.first() {
                    self.show_array(elements);
                }
            }
            "'" => {
                self.state.translate_line(0.0, -self.state.leading);
                if let Some(lopdf::Object::String(bytes, _)) = operands.first() {
                    let mut glyphs = Vec::new();
                    self.show_string(bytes, &mut glyphs);
                    self.page.push_span(glyphs);
                }
            }
            "\"" => {
                // " aw ac string  =>  set Tw, Tc, then ' string
                if operands.len() >= 3 {
                    if let Some(aw) = number(&operands[0]) {
                        self.state.word_spacing = aw;
                    }
                    if let Some(ac) = number(&operands[1]) {
                        self.state.char_spacing = ac;
                    }
                    self.state.translate_line(0.0, -self.state.leading);
                    if let lopdf::Object::String(bytes, _) = &operands[2] {
                        let mut glyphs = Vec::new();
                        self.show_string(bytes, &mut glyphs);
                        self.page.push_span(glyphs);
                    }
                }
            }
            _ => { /* non-text operator */ }
        }
    }

    /// Width of one character code in text-space units (before matrix scale).
    fn glyph_width(&self, code: Option<u32>) -> f64 {
        let w0 = code
            .and_then(|c| self.fonts.get(&self.state.font_key).and_then(|f| f.width(c)))
            .unwrap_or(APPROX_WIDTH_RATIO * 1000.0);
        w0 / 1000.0 * self.state.font_size * self.state.horiz_scale
    }

    /// Emit glyphs for one shown string and advance the text matrix.
    fn show_string(&mut self, bytes: &[u8], glyphs: &mut Vec<Glyph>) {
        for (ch, code) in decode_show_bytes(bytes) {
            let fs = self.state.effective_font_size();
            let width = self.glyph_width(code);
            let x = self.state.x();
            let y = self.state.y() + self.state.text_rise;
            glyphs.push(Glyph {
                ch,
                bbox: BBox::new(
                    x,
                    y - DESCENT_RATIO * fs,
                    x + width * self.state.x_scale(),
                    y + ASCENT_RATIO * fs,
                ),
            });

            let mut advance = width + self.state.char_spacing * self.state.horiz_scale;
            if code == Some(32) {
                advance += self.state.word_spacing * self.state.horiz_scale;
            }
            self.state.advance_x(advance);
        }
    }

    /// Process a TJ array: strings to show interleaved with kerning
    /// adjustments in thousandths of text-space units. The whole array
    /// becomes a single span; a displacement wide enough to read as a word
    /// gap becomes a synthetic space glyph covering the gap.
    fn show_array(&mut self, elements: &[lopdf::Object]) {
        let mut glyphs: Vec<Glyph> = Vec::new();
        let mut pending_gap: Option<BBox> = None;

        for element in elements {
            match element {
                lopdf::Object::String(bytes, _) => {
                    if let Some(gap) = pending_gap.take() {
                        if !glyphs.is_empty() {
                            glyphs.push(Glyph { ch: ' ', bbox: gap });
                        }
                    }
                    self.show_string(bytes, &mut glyphs);
                }
                other => {
                    if let Some(adjustment) = number(other) {
                        // Negative adjustment moves right.
                        let dx =
                            -adjustment / 1000.0 * self.state.font_size * self.state.horiz_scale;
                        let gap_threshold = KERN_GAP_FACTOR
                            * APPROX_WIDTH_RATIO
                            * self.state.font_size
                            * self.state.horiz_scale;
                        if dx > gap_threshold {
                            let fs = self.state.effective_font_size();
                            let x = self.state.x();
                            let y = self.state.y() + self.state.text_rise;
                            pending_gap = Some(BBox::new(
                                x,
                                y - DESCENT_RATIO * fs,
                                x + dx * self.state.x_scale(),
                                y + ASCENT_RATIO * fs,
                            ));
                        }
                        self.state.advance_x(dx);
                    }
                }
            }
        }

        self.page.push_span(glyphs);
    }
}
