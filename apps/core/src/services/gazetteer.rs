//! Rule and gazetteer based named-entity recognizer.
//!
//! Proper nouns (persons, places, organizations) are found by longest-match
//! lookup of capitalized token sequences in built-in gazetteers; cardinal
//! numbers by digit sequences and English number words. No model required.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

use regex::{Match, Regex};

use super::traits::EntityRecognizer;
use super::ServiceError;
use crate::brain::entities::{EntityCategory, EntitySpan};

// NOTE: expect() is acceptable here: the patterns are constants.
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}]+(?:['’.,\-][\p{L}\p{N}]+)*").expect("Invalid regex: word pattern")
});

static DIGITS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d+(?:[.,]\d+)*$").expect("Invalid regex: digits pattern")
});

const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety",
    "hundred", "thousand", "million", "billion", "dozen",
];

const PERSONS: &[&str] = &[
    "john", "james", "robert", "michael", "william", "david", "richard", "joseph", "thomas",
    "charles", "daniel", "matthew", "anthony", "mark", "paul", "steven", "andrew", "kevin",
    "brian", "george", "edward", "peter", "mary", "patricia", "jennifer", "linda", "elizabeth",
    "barbara", "susan", "jessica", "sarah", "karen", "lisa", "nancy", "emma", "olivia", "sophia",
    "emily", "anna", "laura", "rachel", "maria", "alice", "julia", "kate", "lucy", "tom",
    "sam", "alex", "chris", "mike", "bob", "jack", "harry", "oliver", "noah", "liam",
];

const PLACES: &[&str] = &[
    "canada", "united states", "america", "usa", "mexico", "brazil", "argentina", "england",
    "united kingdom", "uk", "britain", "scotland", "ireland", "france", "germany", "spain",
    "italy", "portugal", "netherlands", "belgium", "switzerland", "sweden", "norway", "poland",
    "russia", "ukraine", "china", "japan", "korea", "india", "pakistan", "australia",
    "new zealand", "egypt", "nigeria", "kenya", "south africa", "toronto", "montreal",
    "vancouver", "ottawa", "new york", "los angeles", "chicago", "boston", "london", "paris",
    "berlin", "madrid", "rome", "tokyo", "beijing", "sydney", "california", "texas", "ontario",
    "quebec", "florida",
];

const ORGANIZATIONS: &[&str] = &[
    "microsoft", "google", "apple", "amazon", "facebook", "meta", "netflix", "twitter", "ibm",
    "intel", "tesla", "walmart", "starbucks", "nhs", "united nations", "nasa",
    "fbi", "cia", "red cross", "harvard", "stanford", "mit", "oxford", "cambridge",
    "university of toronto", "mcgill",
];

/// Named-entity recognizer backed by gazetteers and number rules.
pub struct GazetteerRecognizer {
    phrases: HashMap<String, EntityCategory>,
    number_words: HashSet<&'static str>,
    max_phrase_len: usize,
}

impl Default for GazetteerRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl GazetteerRecognizer {
    /// Creates a recognizer seeded with the built-in gazetteers.
    pub fn new() -> Self {
        let mut recognizer = Self {
            phrases: HashMap::new(),
            number_words: NUMBER_WORDS.iter().copied().collect(),
            max_phrase_len: 1,
        };
        recognizer.add_entries(EntityCategory::Person, PERSONS.iter().copied());
        recognizer.add_entries(EntityCategory::Place, PLACES.iter().copied());
        recognizer.add_entries(EntityCategory::Organization, ORGANIZATIONS.iter().copied());
        recognizer
    }

    /// Adds gazetteer phrases for `category`. Later entries win on conflicts.
    pub fn add_entries<I, S>(&mut self, category: EntityCategory, phrases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for phrase in phrases {
            let key = phrase_key(WORD_PATTERN.find_iter(phrase.as_ref()));
            if key.is_empty() {
                continue;
            }
            self.max_phrase_len = self.max_phrase_len.max(key.split(' ').count());
            self.phrases.insert(key, category);
        }
    }

    /// Builder-style variant of [`add_entries`](Self::add_entries).
    pub fn with_entries<I, S>(mut self, category: EntityCategory, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.add_entries(category, phrases);
        self
    }

    /// Longest capitalized gazetteer phrase starting at `tokens[0]`. A phrase
    /// never spans punctuation.
    fn match_phrase(&self, text: &str, tokens: &[Match<'_>]) -> Option<(usize, EntityCategory)> {
        if !tokens.first().is_some_and(|t| is_capitalized(t.as_str())) {
            return None;
        }
        let longest = self.max_phrase_len.min(contiguous_run(text, tokens));
        (1..=longest).rev().find_map(|len| {
            self.phrases
                .get(&phrase_key(tokens[..len].iter().copied()))
                .map(|category| (len, *category))
        })
    }

    fn is_number(&self, token: &str) -> bool {
        DIGITS_PATTERN.is_match(token) || self.number_words.contains(token.to_lowercase().as_str())
    }
}

impl EntityRecognizer for GazetteerRecognizer {
    fn detect_entities(&self, text: &str) -> Result<Vec<EntitySpan>, ServiceError> {
        let tokens: Vec<Match<'_>> = WORD_PATTERN.find_iter(text).collect();
        let mut spans = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            if let Some((len, category)) = self.match_phrase(text, &tokens[i..]) {
                let mut end = i + len;
                // "John Smith": a known first name swallows the capitalized surname
                // that directly follows it.
                if category == EntityCategory::Person {
                    while end < tokens.len()
                        && adjacent(text, &tokens[end - 1], &tokens[end])
                        && tokens[end].as_str() != "I"
                        && is_capitalized(tokens[end].as_str())
                        && self.match_phrase(text, &tokens[end..]).is_none()
                    {
                        end += 1;
                    }
                }
                spans.push(EntitySpan::new(tokens[i].start(), tokens[end - 1].end(), category));
                i = end;
            } else if self.is_number(tokens[i].as_str()) {
                let mut end = i + 1;
                while end < tokens.len()
                    && adjacent(text, &tokens[end - 1], &tokens[end])
                    && self.is_number(tokens[end].as_str())
                {
                    end += 1;
                }
                // A lone "one" is a pronoun ("no one", "one of them").
                let lone_one = end == i + 1 && tokens[i].as_str().eq_ignore_ascii_case("one");
                if !lone_one {
                    spans.push(EntitySpan::new(
                        tokens[i].start(),
                        tokens[end - 1].end(),
                        EntityCategory::Number,
                    ));
                }
                i = end;
            } else {
                i += 1;
            }
        }

        Ok(spans)
    }
}

fn phrase_key<'a>(tokens: impl Iterator<Item = Match<'a>>) -> String {
    tokens
        .map(|t| t.as_str().to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Only whitespace between two consecutive tokens.
fn adjacent(text: &str, previous: &Match<'_>, next: &Match<'_>) -> bool {
    text[previous.end()..next.start()].chars().all(char::is_whitespace)
}

/// Number of leading tokens not separated by punctuation.
fn contiguous_run(text: &str, tokens: &[Match<'_>]) -> usize {
    if tokens.is_empty() {
        return 0;
    }
    1 + tokens
        .windows(2)
        .take_while(|pair| adjacent(text, &pair[0], &pair[1]))
        .count()
}

fn is_capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(char::is_uppercase)
}
