// Morse code pattern lookup table - O(1) character-to-pattern mapping
use crate::types::Mark;

pub type MarkPattern = &'static [Mark];

const DOT: Mark = Mark::Dot;
const DASH: Mark = Mark::Dash;

// Letter patterns
const PATTERN_A: MarkPattern = &[DOT, DASH]; // .-
const PATTERN_B: MarkPattern = &[DASH, DOT, DOT, DOT]; // -...
const PATTERN_C: MarkPattern = &[DASH, DOT, DASH, DOT]; // -.-.
const PATTERN_D: MarkPattern = &[DASH, DOT, DOT]; // -..
const PATTERN_E: MarkPattern = &[DOT]; // .
const PATTERN_F: MarkPattern = &[DOT, DOT, DASH, DOT]; // ..-.
const PATTERN_G: MarkPattern = &[DASH, DASH, DOT]; // --.
const PATTERN_H: MarkPattern = &[DOT, DOT, DOT, DOT]; // ....
const PATTERN_I: MarkPattern = &[DOT, DOT]; // ..
const PATTERN_J: MarkPattern = &[DOT, DASH, DASH, DASH]; // .---
const PATTERN_K: MarkPattern = &[DASH, DOT, DASH]; // -.-
const PATTERN_L: MarkPattern = &[DOT, DASH, DOT, DOT]; // .-..
const PATTERN_M: MarkPattern = &[DASH, DASH]; // --
const PATTERN_N: MarkPattern = &[DASH, DOT]; // -.
const PATTERN_O: MarkPattern = &[DASH, DASH, DASH]; // ---
const PATTERN_P: MarkPattern = &[DOT, DASH, DASH, DOT]; // .--.
const PATTERN_Q: MarkPattern = &[DASH, DASH, DOT, DASH]; // --.-
const PATTERN_R: MarkPattern = &[DOT, DASH, DOT]; // .-.
const PATTERN_S: MarkPattern = &[DOT, DOT, DOT]; // ...
const PATTERN_T: MarkPattern = &[DASH]; // -
const PATTERN_U: MarkPattern = &[DOT, DOT, DASH]; // ..-
const PATTERN_V: MarkPattern = &[DOT, DOT, DOT, DASH]; // ...-
const PATTERN_W: MarkPattern = &[DOT, DASH, DASH]; // .--
const PATTERN_X: MarkPattern = &[DASH, DOT, DOT, DASH]; // -..-
const PATTERN_Y: MarkPattern = &[DASH, DOT, DASH, DASH]; // -.--
const PATTERN_Z: MarkPattern = &[DASH, DASH, DOT, DOT]; // --..

// Number patterns
const PATTERN_0: MarkPattern = &[DASH, DASH, DASH, DASH, DASH]; // -----
const PATTERN_1: MarkPattern = &[DOT, DASH, DASH, DASH, DASH]; // .----
const PATTERN_2: MarkPattern = &[DOT, DOT, DASH, DASH, DASH]; // ..---
const PATTERN_3: MarkPattern = &[DOT, DOT, DOT, DASH, DASH]; // ...--
const PATTERN_4: MarkPattern = &[DOT, DOT, DOT, DOT, DASH]; // ....-
const PATTERN_5: MarkPattern = &[DOT, DOT, DOT, DOT, DOT]; // .....
const PATTERN_6: MarkPattern = &[DASH, DOT, DOT, DOT, DOT]; // -....
const PATTERN_7: MarkPattern = &[DASH, DASH, DOT, DOT, DOT]; // --...
const PATTERN_8: MarkPattern = &[DASH, DASH, DASH, DOT, DOT]; // ---..
const PATTERN_9: MarkPattern = &[DASH, DASH, DASH, DASH, DOT]; // ----.

// Direct lookup table for O(1) access - 256 entries for all possible bytes
static MARK_PATTERNS: [Option<MarkPattern>; 256] = {
    let mut patterns = [None; 256];

    // Uppercase letters
    patterns[b'A' as usize] = Some(PATTERN_A);
    patterns[b'B' as usize] = Some(PATTERN_B);
    patterns[b'C' as usize] = Some(PATTERN_C);
    patterns[b'D' as usize] = Some(PATTERN_D);
    patterns[b'E' as usize] = Some(PATTERN_E);
    patterns[b'F' as usize] = Some(PATTERN_F);
    patterns[b'G' as usize] = Some(PATTERN_G);
    patterns[b'H' as usize] = Some(PATTERN_H);
    patterns[b'I' as usize] = Some(PATTERN_I);
    patterns[b'J' as usize] = Some(PATTERN_J);
    patterns[b'K' as usize] = Some(PATTERN_K);
    patterns[b'L' as usize] = Some(PATTERN_L);
    patterns[b'M' as usize] = Some(PATTERN_M);
    patterns[b'N' as usize] = Some(PATTERN_N);
    patterns[b'O' as usize] = Some(PATTERN_O);
    patterns[b'P' as usize] = Some(PATTERN_P);
    patterns[b'Q' as usize] = Some(PATTERN_Q);
    patterns[b'R' as usize] = Some(PATTERN_R);
    patterns[b'S' as usize] = Some(PATTERN_S);
    patterns[b'T' as usize] = Some(PATTERN_T);
    patterns[b'U' as usize] = Some(PATTERN_U);
    patterns[b'V' as usize] = Some(PATTERN_V);
    patterns[b'W' as usize] = Some(PATTERN_W);
    patterns[b'X' as usize] = Some(PATTERN_X);
    patterns[b'Y' as usize] = Some(PATTERN_Y);
    patterns[b'Z' as usize] = Some(PATTERN_Z);

    // Lowercase letters (same patterns)
    patterns[b'a' as usize] = Some(PATTERN_A);
    patterns[b'b' as usize] = Some(PATTERN_B);
    patterns[b'c' as usize] = Some(PATTERN_C);
    patterns[b'd' as usize] = Some(PATTERN_D);
    patterns[b'e' as usize] = Some(PATTERN_E);
    patterns[b'f' as usize] = Some(PATTERN_F);
    patterns[b'g' as usize] = Some(PATTERN_G);
    patterns[b'h' as usize] = Some(PATTERN_H);
    patterns[b'i' as usize] = Some(PATTERN_I);
    patterns[b'j' as usize] = Some(PATTERN_J);
    patterns[b'k' as usize] = Some(PATTERN_K);
    patterns[b'l' as usize] = Some(PATTERN_L);
    patterns[b'm' as usize] = Some(PATTERN_M);
    patterns[b'n' as usize] = Some(PATTERN_N);
    patterns[b'o' as usize] = Some(PATTERN_O);
    patterns[b'p' as usize] = Some(PATTERN_P);
    patterns[b'q' as usize] = Some(PATTERN_Q);
    patterns[b'r' as usize] = Some(PATTERN_R);
    patterns[b's' as usize] = Some(PATTERN_S);
    patterns[b't' as usize] = Some(PATTERN_T);
    patterns[b'u' as usize] = Some(PATTERN_U);
    patterns[b'v' as usize] = Some(PATTERN_V);
    patterns[b'w' as usize] = Some(PATTERN_W);
    patterns[b'x' as usize] = Some(PATTERN_X);
    patterns[b'y' as usize] = Some(PATTERN_Y);
    patterns[b'z' as usize] = Some(PATTERN_Z);

    // Numbers
    patterns[b'0' as usize] = Some(PATTERN_0);
    patterns[b'1' as usize] = Some(PATTERN_1);
    patterns[b'2' as usize] = Some(PATTERN_2);
    patterns[b'3' as usize] = Some(PATTERN_3);
    patterns[b'4' as usize] = Some(PATTERN_4);
    patterns[b'5' as usize] = Some(PATTERN_5);
    patterns[b'6' as usize] = Some(PATTERN_6);
    patterns[b'7' as usize] = Some(PATTERN_7);
    patterns[b'8' as usize] = Some(PATTERN_8);
    patterns[b'9' as usize] = Some(PATTERN_9);

    patterns
};

// Reverse lookups scan this range so each pattern maps back to its
// canonical (uppercase) character.
const CANONICAL_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Immutable character <-> pattern mapping for the supported set
/// (A-Z case-insensitive, 0-9). Space is the word separator and has no
/// pattern; everything else is unmapped and skipped by the encoder.
#[derive(Debug, Clone, Copy)]
pub struct SymbolTable {
    patterns: &'static [Option<MarkPattern>; 256],
}

impl SymbolTable {
    /// The standard ITU table.
    pub fn standard() -> Self {
        Self {
            patterns: &MARK_PATTERNS,
        }
    }

    /// Pattern for a character - O(1) lookup, `None` outside the
    /// supported set.
    pub fn pattern(&self, ch: char) -> Option<MarkPattern> {
        if ch.is_ascii() {
            self.patterns[ch as usize]
        } else {
            None
        }
    }

    /// Reverse lookup: the character whose pattern exactly matches the
    /// accumulated marks, or `None` for an unrecognized sequence.
    pub fn lookup(&self, marks: &[Mark]) -> Option<char> {
        if marks.is_empty() {
            return None;
        }
        for &ch in CANONICAL_CHARS {
            if let Some(stored) = self.patterns[ch as usize] {
                if stored == marks {
                    return Some(ch as char);
                }
            }
        }
        None
    }
}

/// Render a message as the dot/dash string the transmitter prints for
/// the operator: patterns separated by spaces, `/` for word breaks,
/// unsupported characters omitted.
pub fn render_patterns(text: &str, table: &SymbolTable) -> String {
    let mut out = String::new();
    for ch in text.chars() {
        let rendered: Option<String> = if ch == ' ' {
            Some("/".to_string())
        } else {
            table.pattern(ch).map(|pattern| {
                pattern
                    .iter()
                    .map(|mark| match mark {
                        Mark::Dot => '.',
                        Mark::Dash => '-',
                    })
                    .collect()
            })
        };
        if let Some(rendered) = rendered {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(&rendered);
        }
    }
    out
}
