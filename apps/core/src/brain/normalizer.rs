//! Sentence normalization: tokenize, lowercase, tag, lemmatize.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::lexicon::{Lemmatizer, LexiconTagger, PartOfSpeech, PosTagger, RuleLemmatizer};

// Standalone clitic, word (with inner apostrophes/hyphens), or one punctuation char.
// NOTE: expect() is acceptable here: the pattern is a constant.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"['’](?i:s|re|ve|ll|d|m)\b|[\p{L}\p{M}\p{N}]+(?:['’\-][\p{L}\p{M}\p{N}]+)*|[^\s\p{L}\p{M}\p{N}]",
    )
    .expect("Invalid regex: token pattern")
});

const CLITICS: &[&str] = &["'s", "'re", "'ve", "'ll", "'d", "'m"];

/// Splits text into word and punctuation tokens, Treebank style:
/// `"I don't know."` becomes `["I", "do", "n't", "know", "."]`.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for m in TOKEN_PATTERN.find_iter(text) {
        split_clitics(&m.as_str().replace('’', "'"), &mut tokens);
    }
    tokens
}

fn split_clitics(token: &str, out: &mut Vec<String>) {
    let cut = token.len().saturating_sub(3);
    if cut > 0 && token.is_char_boundary(cut) && token[cut..].eq_ignore_ascii_case("n't") {
        out.push(token[..cut].to_string());
        out.push(token[cut..].to_string());
        return;
    }
    if let Some(pos) = token.rfind('\'') {
        if pos > 0 && CLITICS.iter().any(|c| token[pos..].eq_ignore_ascii_case(c)) {
            out.push(token[..pos].to_string());
            out.push(token[pos..].to_string());
            return;
        }
    }
    out.push(token.to_string());
}

/// Turns raw text into the lemma sequence the vectorizer consumes.
#[derive(Clone)]
pub struct Normalizer {
    tagger: Arc<dyn PosTagger>,
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Arc::new(LexiconTagger::new()), Arc::new(RuleLemmatizer::new()))
    }
}

impl Normalizer {
    pub fn new(tagger: Arc<dyn PosTagger>, lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self { tagger, lemmatizer }
    }

    /// Default tagger and lemmatizer, with every vocabulary term registered as
    /// a known lemma so inflected forms resolve onto it.
    pub fn for_vocabulary<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            Arc::new(LexiconTagger::new()),
            Arc::new(RuleLemmatizer::new().with_lemmas(terms)),
        )
    }

    /// Tokenizes, lowercases, tags and lemmatizes `text`. Token order is kept.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        tokenize(text)
            .into_iter()
            .map(|token| {
                let word = token.to_lowercase();
                let pos = PartOfSpeech::from_tag(self.tagger.tag(&word).as_deref());
                self.lemmatizer.lemmatize(&word, pos)
            })
            .collect()
    }
}
