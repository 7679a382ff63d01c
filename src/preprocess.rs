//! Deterministic text normalization with offset tracking.
//!
//! [`normalize`] applies a sequence of conservative fixes that are safe for
//! legal text, in order:
//!
//! 1. Unicode NFC composition (combining marks fold into their base).
//! 2. Zero-width characters (U+200B/U+200C/U+200D/U+FEFF) and the soft
//!    hyphen are dropped.
//! 3. No-break and other Unicode spaces become an ASCII space.
//! 4. Smart quotes and hyphen variants become their ASCII equivalents.
//! 5. A trailing `-` followed by a newline and another letter is treated as
//!    a line-wrap artifact and collapsed to the two letters.
//!
//! Line breaks are otherwise preserved verbatim, as are tabs and runs of
//! spaces. The function is pure and performs no I/O.
//!
//! The returned [`CharMap`] records, for every character of the normalized
//! text, the byte offset of the source character that produced it. Offsets
//! are non-decreasing, so spans over the normalized text can always be
//! translated back to original-document ranges for the audit.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

const ZERO_WIDTHS: [char; 4] = ['\u{200b}', '\u{200c}', '\u{200d}', '\u{feff}'];
const SOFT_HYPHEN: char = '\u{00ad}';

fn is_unicode_space(c: char) -> bool {
    matches!(
        c,
        '\u{00a0}' | '\u{202f}' | '\u{2007}' | '\u{2000}'..='\u{200a}' | '\u{3000}'
    )
}

fn map_quote_or_hyphen(c: char) -> Option<char> {
    match c {
        '\u{201c}' | '\u{201d}' => Some('"'),
        '\u{2018}' | '\u{2019}' => Some('\''),
        '\u{2010}'..='\u{2015}' | '\u{2212}' => Some('-'),
        _ => None,
    }
}

/// Mapping from normalized text positions back to original byte offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharMap {
    /// One entry per normalized character: (normalized byte offset,
    /// original byte offset). Both columns are non-decreasing.
    entries: Vec<(usize, usize)>,
    /// Byte length of the normalized text, for end-of-range lookups.
    norm_len: usize,
    /// Byte length of the original text.
    orig_len: usize,
}

impl CharMap {
    /// Number of normalized characters covered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original byte offset of the character at normalized byte `pos`.
    ///
    /// `pos` equal to the normalized length maps to the original length so
    /// that exclusive span ends translate cleanly.
    pub fn to_original(&self, pos: usize) -> usize {
        if pos >= self.norm_len {
            return self.orig_len;
        }
        match self.entries.binary_search_by_key(&pos, |&(n, _)| n) {
            Ok(i) => self.entries[i].1,
            // Interior byte of a multi-byte character: attribute it to the
            // character that contains it.
            Err(i) => self.entries[i - 1].1,
        }
    }

    /// Translate a half-open normalized range to original offsets.
    pub fn to_original_range(&self, start: usize, end: usize) -> (usize, usize) {
        (self.to_original(start), self.to_original(end))
    }

    /// Original offsets, one per normalized character.
    pub fn offsets(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.iter().map(|&(_, o)| o)
    }
}

/// Result of [`normalize`].
#[derive(Debug, Clone)]
pub struct Preprocessed {
    /// The normalized text.
    pub text: String,
    /// Offset map back to the original input.
    pub char_map: CharMap,
    /// Whether normalization changed anything.
    pub changed: bool,
}

/// Normalize `input` and produce the offset map.
pub fn normalize(input: &str) -> Preprocessed {
    // Pass 1: NFC per combining cluster, tagging every produced character
    // with the byte offset where its cluster started.
    let mut tagged: Vec<(char, usize)> = Vec::with_capacity(input.len());
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let mut i = 0;
    while i < chars.len() {
        let (cluster_start, _) = chars[i];
        let mut j = i + 1;
        while j < chars.len() && is_combining_mark(chars[j].1) {
            j += 1;
        }
        let cluster: String = chars[i..j].iter().map(|&(_, c)| c).collect();
        for c in cluster.nfc() {
            tagged.push((c, cluster_start));
        }
        i = j;
    }

    // Pass 2: character class rewrites.
    let mut rewritten: Vec<(char, usize)> = Vec::with_capacity(tagged.len());
    for (c, off) in tagged {
        if ZERO_WIDTHS.contains(&c) || c == SOFT_HYPHEN {
            continue;
        }
        if is_unicode_space(c) {
            rewritten.push((' ', off));
            continue;
        }
        if let Some(mapped) = map_quote_or_hyphen(c) {
            rewritten.push((mapped, off));
            continue;
        }
        rewritten.push((c, off));
    }

    // Pass 3: de-hyphenate wrapped lines (letter '-' newline letter).
    let mut out: Vec<(char, usize)> = Vec::with_capacity(rewritten.len());
    let mut i = 0;
    while i < rewritten.len() {
        let (c, off) = rewritten[i];
        if c.is_ascii_alphabetic() && i + 2 < rewritten.len() && rewritten[i + 1].0 == '-' {
            let after_newline = match (rewritten[i + 2].0, rewritten.get(i + 3).map(|t| t.0)) {
                ('\n', _) => Some(i + 3),
                ('\r', Some('\n')) => Some(i + 4),
                _ => None,
            };
            if let Some(next_idx) = after_newline {
                if let Some(&(next_c, next_off)) = rewritten.get(next_idx) {
                    if next_c.is_ascii_alphabetic() {
                        out.push((c, off));
                        out.push((next_c, next_off));
                        i = next_idx + 1;
                        continue;
                    }
                }
            }
        }
        out.push((c, off));
        i += 1;
    }

    let mut text = String::with_capacity(out.len());
    let mut entries = Vec::with_capacity(out.len());
    for (c, orig) in out {
        entries.push((text.len(), orig));
        text.push(c);
    }

    let changed = text != input;
    let char_map = CharMap {
        entries,
        norm_len: text.len(),
        orig_len: input.len(),
    };
    Preprocessed {
        text,
        char_map,
        changed,
    }
}
