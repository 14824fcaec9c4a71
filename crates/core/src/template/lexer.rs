//! Directive lexer.
//!
//! Splits template source into literal text and feature directives. The
//! lexer knows nothing about nesting; [`super::Template::parse`] does that.

use once_cell::sync::Lazy;
use regex::Regex;

// Longer keywords first so `@featurefor` never lexes as `@feature`.
static DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"@(?P<keyword>endfeaturefor|endfeature|featurefor|feature)\b(?:\s*\(\s*(?:'(?P<single>[^']*)'|"(?P<double>[^"]*)")\s*(?:,\s*(?P<binding>[A-Za-z_][A-Za-z0-9_]*)\s*)?\))?"#,
    )
    .unwrap_or_else(|err| unreachable!("directive pattern is valid: {err}"))
});

// Opening directives with any second argument, for audits of templates that
// bind host-language expressions (`$user`, `auth()->user()`).
static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"@(?P<keyword>featurefor|feature)\b\s*\(\s*(?:'(?P<single>[^']*)'|"(?P<double>[^"]*)")\s*(?P<comma>,)?"#,
    )
    .unwrap_or_else(|err| unreachable!("reference pattern is valid: {err}"))
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Keyword {
    Feature,
    EndFeature,
    FeatureFor,
    EndFeatureFor,
}

impl Keyword {
    fn from_match(text: &str) -> Option<Self> {
        match text {
            "feature" => Some(Self::Feature),
            "endfeature" => Some(Self::EndFeature),
            "featurefor" => Some(Self::FeatureFor),
            "endfeaturefor" => Some(Self::EndFeatureFor),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Feature => "@feature",
            Self::EndFeature => "@endfeature",
            Self::FeatureFor => "@featurefor",
            Self::EndFeatureFor => "@endfeaturefor",
        }
    }
}

/// One lexed piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token<'s> {
    Text(&'s str),
    Directive {
        keyword: Keyword,
        /// Quoted feature name, when the directive carried arguments.
        name: Option<&'s str>,
        binding: Option<&'s str>,
        /// 1-based line of the `@`.
        line: usize,
    },
}

/// Lex `source` into tokens.
///
/// An opening keyword without an argument list (`user@feature.io`) stays
/// literal text. Arguments on closing keywords are lexed and left for the
/// parser to reject.
pub(crate) fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    let mut line = 1;

    for caps in DIRECTIVE.captures_iter(source) {
        let Some(whole) = caps.get(0) else { continue };
        let Some(keyword) = caps.name("keyword").and_then(|m| Keyword::from_match(m.as_str()))
        else {
            continue;
        };
        let name = caps.name("single").or_else(|| caps.name("double")).map(|m| m.as_str());

        let is_opening = matches!(keyword, Keyword::Feature | Keyword::FeatureFor);
        if is_opening && name.is_none() {
            continue;
        }

        if whole.start() > cursor {
            tokens.push(Token::Text(&source[cursor..whole.start()]));
        }
        line += count_newlines(&source[cursor..whole.start()]);

        tokens.push(Token::Directive {
            keyword,
            name,
            binding: caps.name("binding").map(|m| m.as_str()),
            line,
        });

        line += count_newlines(whole.as_str());
        cursor = whole.end();
    }

    if cursor < source.len() {
        tokens.push(Token::Text(&source[cursor..]));
    }
    tokens
}

/// An opening directive found by [`references`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawReference<'s> {
    pub(crate) name: &'s str,
    /// Second argument as written, trimmed.
    pub(crate) binding: Option<&'s str>,
    pub(crate) line: usize,
}

/// Find every opening directive, whatever its second argument looks like.
///
/// Unlike [`tokenize`] this accepts any expression after the comma and does
/// not require the argument list to close.
pub(crate) fn references(source: &str) -> Vec<RawReference<'_>> {
    let mut found = Vec::new();
    let mut cursor = 0;
    let mut line = 1;

    for caps in REFERENCE.captures_iter(source) {
        let (Some(whole), Some(name)) =
            (caps.get(0), caps.name("single").or_else(|| caps.name("double")))
        else {
            continue;
        };
        line += count_newlines(&source[cursor..whole.start()]);
        cursor = whole.start();

        let binding = caps
            .name("comma")
            .map(|_| argument_text(&source[whole.end()..]))
            .filter(|text| !text.is_empty());
        found.push(RawReference { name: name.as_str(), binding, line });
    }
    found
}

// Text up to the `)` closing the argument list, tracking nested parens.
fn argument_text(rest: &str) -> &str {
    let mut depth = 0usize;
    for (idx, ch) in rest.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' if depth == 0 => return rest[..idx].trim(),
            ')' => depth -= 1,
            '\n' => return rest[..idx].trim(),
            _ => {}
        }
    }
    rest.trim()
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|b| *b == b'\n').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_opening_and_closing_directives() {
        let tokens = tokenize("a@feature('x')b@endfeature");
        assert_eq!(
            tokens,
            vec![
                Token::Text("a"),
                Token::Directive { keyword: Keyword::Feature, name: Some("x"), binding: None, line: 1 },
                Token::Text("b"),
                Token::Directive { keyword: Keyword::EndFeature, name: None, binding: None, line: 1 },
            ]
        );
    }

    #[test]
    fn featurefor_is_not_lexed_as_feature() {
        let tokens = tokenize(r#"@featurefor("beta", user)"#);
        assert_eq!(
            tokens,
            vec![Token::Directive {
                keyword: Keyword::FeatureFor,
                name: Some("beta"),
                binding: Some("user"),
                line: 1,
            }]
        );
    }

    #[test]
    fn bare_opening_keyword_stays_text() {
        let tokens = tokenize("mail me at ops@feature.io");
        assert_eq!(tokens, vec![Token::Text("mail me at ops@feature.io")]);
    }

    #[test]
    fn tracks_line_numbers() {
        let tokens = tokenize("one\ntwo\n@feature('x')\n@endfeature");
        let lines: Vec<usize> = tokens
            .iter()
            .filter_map(|t| match t {
                Token::Directive { line, .. } => Some(*line),
                Token::Text(_) => None,
            })
            .collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn references_accept_expression_bindings() {
        let found = references("@featurefor('beta', $user)\nx\n@featurefor(\"gamma\", auth()->user())");
        assert_eq!(
            found,
            vec![
                RawReference { name: "beta", binding: Some("$user"), line: 1 },
                RawReference { name: "gamma", binding: Some("auth()->user()"), line: 3 },
            ]
        );
    }

    #[test]
    fn references_skip_closing_and_bare_keywords() {
        let found = references("ops@feature.io @endfeature('x') @feature('a')");
        assert_eq!(found, vec![RawReference { name: "a", binding: None, line: 1 }]);
    }

    #[test]
    fn longer_words_do_not_match() {
        assert_eq!(tokenize("@features('x')"), vec![Token::Text("@features('x')")]);
    }
}
