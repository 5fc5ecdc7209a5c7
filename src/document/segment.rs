//! Sentence segmentation with per-language abbreviation guards.
//!
//! Splits normalized page text at terminal punctuation. A period is only a
//! boundary when the word before it is not a known abbreviation for the
//! document's language; the lookback uses Unicode word segmentation so
//! multi-part abbreviations ("e.g", "i.e") survive as one word.

use unicode_segmentation::UnicodeSegmentation;

const ENGLISH_ABBREVIATIONS: &[&str] = &[
    "al", "approx", "cf", "co", "dept", "dr", "e.g", "ed", "est", "etc", "fig", "gen", "gov",
    "i.e", "inc", "jr", "lt", "ltd", "mr", "mrs", "ms", "mt", "pp", "prof", "rev", "sr", "st",
    "univ", "viz", "vol", "vs",
];

const GERMAN_ABBREVIATIONS: &[&str] = &[
    "abb", "bzw", "ca", "d.h", "dr", "evtl", "ggf", "inkl", "nr", "prof", "sog", "u.a", "usw",
    "vgl", "z.b",
];

const FRENCH_ABBREVIATIONS: &[&str] = &[
    "av", "boul", "cf", "ch", "env", "etc", "ex", "fig", "mlle", "mme", "p.ex", "st", "vol",
];

const SPANISH_ABBREVIATIONS: &[&str] = &[
    "aprox", "av", "cap", "dr", "dra", "ej", "etc", "fig", "p.ej", "sr", "sra", "srta", "ud",
    "uds", "vol",
];

/// Splits page text into sentences.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    abbreviations: &'static [&'static str],
}

impl Segmenter {
    /// Build a segmenter for a language tag (`en`, `english`, `de`, ...).
    ///
    /// Unknown tags fall back to the English abbreviation table.
    pub fn for_language(language: &str) -> Self {
        let abbreviations = match language.to_lowercase().as_str() {
            "de" | "german" => GERMAN_ABBREVIATIONS,
            "es" | "spanish" => SPANISH_ABBREVIATIONS,
            "fr" | "french" => FRENCH_ABBREVIATIONS,
            _ => ENGLISH_ABBREVIATIONS,
        };
        Self { abbreviations }
    }

    /// Iterate the sentences of one page, in reading order.
    ///
    /// The iterator is lazy and finite; a page with no sentence text yields
    /// nothing. Calling this again restarts from the beginning.
    pub fn sentences<'a>(&self, text: &'a str) -> Sentences<'a> {
        Sentences {
            text,
            pos: 0,
            abbreviations: self.abbreviations,
        }
    }
}

/// Iterator over the sentences of a single page.
#[derive(Debug, Clone)]
pub struct Sentences<'a> {
    text: &'a str,
    pos: usize,
    abbreviations: &'static [&'static str],
}

impl Iterator for Sentences<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while self.pos < self.text.len() {
            let rest = &self.text[self.pos..];
            let skipped = rest.len() - rest.trim_start().len();
            let start = self.pos + skipped;
            if start >= self.text.len() {
                self.pos = self.text.len();
                break;
            }

            let end = next_boundary(self.text, start, self.abbreviations);
            self.pos = end;

            let sentence = self.text[start..end].trim_end();
            if !sentence.is_empty() {
                return Some(sentence.to_string());
            }
        }
        None
    }
}

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

/// Marks that may trail terminal punctuation and still belong to the
/// sentence, like the quote in `he said "stop."`.
fn is_closer(c: char) -> bool {
    matches!(c, '"' | '\'' | ')' | ']' | '\u{00bb}' | '\u{2019}' | '\u{201d}')
}

/// Find the byte offset just past the end of the sentence starting at
/// `start`. Text without a confirmed boundary runs to the end.
fn next_boundary(text: &str, start: usize, abbreviations: &[&str]) -> usize {
    let mut chars = text[start..].char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        if !is_terminal(c) {
            continue;
        }
        let candidate = start + offset;

        // Consume any run of terminal marks and closers ("...", "?!", ."),
        // so the whole run stays inside the sentence.
        let mut end = candidate + c.len_utf8();
        while let Some(&(next_offset, next_c)) = chars.peek() {
            if is_terminal(next_c) || is_closer(next_c) {
                end = start + next_offset + next_c.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        // A boundary must sit at the end of the page or before whitespace;
        // this keeps decimals like "3.14" and bare URLs intact.
        let followed_by_gap = match text[end..].chars().next() {
            None => true,
            Some(next) => next.is_whitespace(),
        };
        if !followed_by_gap {
            continue;
        }

        if c == '.' && ends_with_abbreviation(&text[..candidate], abbreviations) {
            continue;
        }

        return end;
    }

    text.len()
}

/// True if the last word before a candidate period is a known abbreviation.
fn ends_with_abbreviation(prefix: &str, abbreviations: &[&str]) -> bool {
    let Some(word) = prefix
        .split_word_bounds()
        .rev()
        .find(|segment| segment.chars().any(char::is_alphanumeric))
    else {
        return false;
    };
    let word = word.to_lowercase();
    abbreviations.iter().any(|entry| *entry == word)
}
