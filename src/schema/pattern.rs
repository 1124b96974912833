//! `pattern` restrictions.
//!
//! Patterns are written in the XML Schema regular expression dialect, which
//! is implicitly anchored at both ends and has no `^`/`$` metacharacters.
//! [`Pattern::compile`] rewrites one into the `regex` crate's syntax.

use regex::Regex;

/// One `pattern` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub expr: String,
    /// `modifier invert-match`: the value must not match.
    pub invert_match: bool,
}

/// XML Schema `\p{Is...}` block escapes and the code points they cover.
const BLOCKS: &[(&str, &str)] = &[
    ("BasicLatin", r"\x{0000}-\x{007F}"),
    ("Latin-1Supplement", r"\x{0080}-\x{00FF}"),
    ("LatinExtended-A", r"\x{0100}-\x{017F}"),
    ("LatinExtended-B", r"\x{0180}-\x{024F}"),
    ("IPAExtensions", r"\x{0250}-\x{02AF}"),
    ("SpacingModifierLetters", r"\x{02B0}-\x{02FF}"),
    ("CombiningDiacriticalMarks", r"\x{0300}-\x{036F}"),
    ("Greek", r"\x{0370}-\x{03FF}"),
    ("Cyrillic", r"\x{0400}-\x{04FF}"),
    ("Armenian", r"\x{0530}-\x{058F}"),
    ("Hebrew", r"\x{0590}-\x{05FF}"),
    ("Arabic", r"\x{0600}-\x{06FF}"),
    ("Syriac", r"\x{0700}-\x{074F}"),
    ("Thaana", r"\x{0780}-\x{07BF}"),
    ("Devanagari", r"\x{0900}-\x{097F}"),
    ("Bengali", r"\x{0980}-\x{09FF}"),
    ("Gurmukhi", r"\x{0A00}-\x{0A7F}"),
    ("Gujarati", r"\x{0A80}-\x{0AFF}"),
    ("Oriya", r"\x{0B00}-\x{0B7F}"),
    ("Tamil", r"\x{0B80}-\x{0BFF}"),
    ("Telugu", r"\x{0C00}-\x{0C7F}"),
    ("Kannada", r"\x{0C80}-\x{0CFF}"),
    ("Malayalam", r"\x{0D00}-\x{0D7F}"),
    ("Sinhala", r"\x{0D80}-\x{0DFF}"),
    ("Thai", r"\x{0E00}-\x{0E7F}"),
    ("Lao", r"\x{0E80}-\x{0EFF}"),
    ("Tibetan", r"\x{0F00}-\x{0FFF}"),
    ("Myanmar", r"\x{1000}-\x{109F}"),
    ("Georgian", r"\x{10A0}-\x{10FF}"),
    ("HangulJamo", r"\x{1100}-\x{11FF}"),
    ("Ethiopic", r"\x{1200}-\x{137F}"),
    ("Cherokee", r"\x{13A0}-\x{13FF}"),
    ("UnifiedCanadianAboriginalSyllabics", r"\x{1400}-\x{167F}"),
    ("Ogham", r"\x{1680}-\x{169F}"),
    ("Runic", r"\x{16A0}-\x{16FF}"),
    ("Khmer", r"\x{1780}-\x{17FF}"),
    ("Mongolian", r"\x{1800}-\x{18AF}"),
    ("LatinExtendedAdditional", r"\x{1E00}-\x{1EFF}"),
    ("GreekExtended", r"\x{1F00}-\x{1FFF}"),
    ("GeneralPunctuation", r"\x{2000}-\x{206F}"),
    ("SuperscriptsandSubscripts", r"\x{2070}-\x{209F}"),
    ("CurrencySymbols", r"\x{20A0}-\x{20CF}"),
    ("CombiningMarksforSymbols", r"\x{20D0}-\x{20FF}"),
    ("LetterlikeSymbols", r"\x{2100}-\x{214F}"),
    ("NumberForms", r"\x{2150}-\x{218F}"),
    ("Arrows", r"\x{2190}-\x{21FF}"),
    ("MathematicalOperators", r"\x{2200}-\x{22FF}"),
    ("MiscellaneousTechnical", r"\x{2300}-\x{23FF}"),
    ("ControlPictures", r"\x{2400}-\x{243F}"),
    ("OpticalCharacterRecognition", r"\x{2440}-\x{245F}"),
    ("EnclosedAlphanumerics", r"\x{2460}-\x{24FF}"),
    ("BoxDrawing", r"\x{2500}-\x{257F}"),
    ("BlockElements", r"\x{2580}-\x{259F}"),
    ("GeometricShapes", r"\x{25A0}-\x{25FF}"),
    ("MiscellaneousSymbols", r"\x{2600}-\x{26FF}"),
    ("Dingbats", r"\x{2700}-\x{27BF}"),
    ("BraillePatterns", r"\x{2800}-\x{28FF}"),
    ("CJKRadicalsSupplement", r"\x{2E80}-\x{2EFF}"),
    ("KangxiRadicals", r"\x{2F00}-\x{2FDF}"),
    ("IdeographicDescriptionCharacters", r"\x{2FF0}-\x{2FFF}"),
    ("CJKSymbolsandPunctuation", r"\x{3000}-\x{303F}"),
    ("Hiragana", r"\x{3040}-\x{309F}"),
    ("Katakana", r"\x{30A0}-\x{30FF}"),
    ("Bopomofo", r"\x{3100}-\x{312F}"),
    ("HangulCompatibilityJamo", r"\x{3130}-\x{318F}"),
    ("Kanbun", r"\x{3190}-\x{319F}"),
    ("BopomofoExtended", r"\x{31A0}-\x{31BF}"),
    ("EnclosedCJKLettersandMonths", r"\x{3200}-\x{32FF}"),
    ("CJKCompatibility", r"\x{3300}-\x{33FF}"),
    ("CJKUnifiedIdeographsExtensionA", r"\x{3400}-\x{4DB5}"),
    ("CJKUnifiedIdeographs", r"\x{4E00}-\x{9FFF}"),
    ("YiSyllables", r"\x{A000}-\x{A48F}"),
    ("YiRadicals", r"\x{A490}-\x{A4CF}"),
    ("HangulSyllables", r"\x{AC00}-\x{D7A3}"),
    ("PrivateUse", r"\x{E000}-\x{F8FF}"),
    ("CJKCompatibilityIdeographs", r"\x{F900}-\x{FAFF}"),
    ("AlphabeticPresentationForms", r"\x{FB00}-\x{FB4F}"),
    ("ArabicPresentationForms-A", r"\x{FB50}-\x{FDFF}"),
    ("CombiningHalfMarks", r"\x{FE20}-\x{FE2F}"),
    ("CJKCompatibilityForms", r"\x{FE30}-\x{FE4F}"),
    ("SmallFormVariants", r"\x{FE50}-\x{FE6F}"),
    ("ArabicPresentationForms-B", r"\x{FE70}-\x{FEFE}"),
    ("HalfwidthandFullwidthForms", r"\x{FF00}-\x{FFEF}"),
];

impl Pattern {
    pub fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            invert_match: false,
        }
    }

    pub fn inverted(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            invert_match: true,
        }
    }

    /// Compile to an anchored [`Regex`].
    pub fn compile(&self) -> Result<Regex, String> {
        let translated = translate(&self.expr)?;
        Regex::new(&format!("^(?:{translated})$"))
            .map_err(|error| format!("invalid pattern \"{}\": {error}", self.expr))
    }

    /// Whether `value` satisfies the restriction.
    pub fn accepts(&self, value: &str) -> Result<bool, String> {
        Ok(self.compile()?.is_match(value) != self.invert_match)
    }
}

/// Rewrite XML Schema syntax that the `regex` crate reads differently.
///
/// - `^` and `$` are literals outside a class.
/// - `\p{IsBlock}` becomes a code point range.
/// - class subtraction `[a-z-[aeiou]]` becomes `[a-z--[aeiou]]`.
fn translate(expr: &str) -> Result<String, String> {
    let mut out = String::with_capacity(expr.len() + 8);
    let mut depth = 0usize;
    let mut chars = expr.char_indices().peekable();
    while let Some((at, c)) = chars.next() {
        match c {
            '\\' => {
                let Some((_, escaped)) = chars.next() else {
                    return Err(format!("pattern \"{expr}\" ends with a lone '\\'"));
                };
                let rest = &expr[at + 1..];
                if escaped == 'p' && rest.starts_with("p{Is") {
                    let Some(close) = rest.find('}') else {
                        return Err(format!("pattern \"{expr}\": unterminated character property"));
                    };
                    let block = &rest[4..close];
                    let Some((_, range)) = BLOCKS.iter().find(|(name, _)| *name == block) else {
                        return Err(format!("pattern \"{expr}\": unknown block name \"{block}\""));
                    };
                    if depth > 0 {
                        out.push_str(range);
                    } else {
                        out.push('[');
                        out.push_str(range);
                        out.push(']');
                    }
                    // `p{Is` was partly consumed; skip to the closing brace.
                    while let Some(&(next, _)) = chars.peek() {
                        chars.next();
                        if next == at + 1 + close {
                            break;
                        }
                    }
                } else {
                    out.push('\\');
                    out.push(escaped);
                }
            }
            '[' => {
                depth += 1;
                out.push('[');
                if let Some(&(_, '^')) = chars.peek() {
                    chars.next();
                    out.push('^');
                }
            }
            ']' if depth > 0 => {
                depth -= 1;
                out.push(']');
            }
            '-' if depth > 0 && matches!(chars.peek(), Some(&(_, '['))) => out.push_str("--"),
            '^' | '$' if depth == 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("[0-9]+", "123", true)]
    #[case("[0-9]+", "12a", false)]
    #[case("[0-9]+", "a123", false)]
    #[case("a.*", "abc", true)]
    #[case("$[a-z]", "$x", true)]
    #[case("[^a-z]+", "ABC", true)]
    #[case("[^a-z]+", "Abc", false)]
    #[case("[a-z-[aeiou]]+", "xyz", true)]
    #[case("[a-z-[aeiou]]+", "xaz", false)]
    #[case(r"\p{IsBasicLatin}+", "plain", true)]
    #[case(r"[\p{IsGreek}x]+", "αx", true)]
    #[case(r"\p{IsGreek}", "a", false)]
    fn test_accepts(#[case] expr: &str, #[case] value: &str, #[case] expected: bool) {
        assert_eq!(Pattern::new(expr).accepts(value).unwrap(), expected);
    }

    #[test]
    fn test_invert_match() {
        let pattern = Pattern::inverted("[xX][mM][lL].*");
        assert!(pattern.accepts("data").unwrap());
        assert!(!pattern.accepts("xml-data").unwrap());
    }

    #[rstest]
    #[case("[0-9")]
    #[case(r"\p{IsKlingon}")]
    #[case(r"\p{IsGreek")]
    #[case("a\\")]
    fn test_invalid(#[case] expr: &str) {
        assert!(Pattern::new(expr).compile().is_err());
    }
}
