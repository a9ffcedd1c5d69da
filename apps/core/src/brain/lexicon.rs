//! Part-of-speech tagging and lemmatization.
//!
//! Both work one word at a time, without sentence context. The tagger emits
//! Penn Treebank tags; [`PartOfSpeech::from_tag`] folds them into the four
//! coarse classes the lemmatizer understands.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// Coarse part of speech used as the lemmatization hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Adjective,
    Noun,
    Verb,
    Adverb,
}

impl PartOfSpeech {
    /// Maps a Penn Treebank tag onto a coarse part of speech.
    ///
    /// `JJ*` is an adjective, `NN*` a noun, `VB*` a verb and `RB*` an adverb.
    /// Every other tag, and a missing tag, maps to [`PartOfSpeech::Noun`].
    pub fn from_tag(tag: Option<&str>) -> Self {
        match tag.and_then(|t| t.chars().next()).map(|c| c.to_ascii_uppercase()) {
            Some('J') => PartOfSpeech::Adjective,
            Some('V') => PartOfSpeech::Verb,
            Some('R') => PartOfSpeech::Adverb,
            _ => PartOfSpeech::Noun,
        }
    }
}

/// Assigns a Penn Treebank tag to a single lowercase word.
pub trait PosTagger: Send + Sync {
    fn tag(&self, word: &str) -> Option<String>;
}

/// Reduces a word to its dictionary form given a part-of-speech hint.
pub trait Lemmatizer: Send + Sync {
    fn lemmatize(&self, word: &str, pos: PartOfSpeech) -> String;
}

/// Base forms with their most frequent tag. Every entry is also a known lemma.
const BASE_WORDS: &[(&str, &str)] = &[
    // pronouns, determiners, prepositions, conjunctions, modals
    ("i", "PRP"), ("you", "PRP"), ("he", "PRP"), ("she", "PRP"), ("it", "PRP"),
    ("we", "PRP"), ("they", "PRP"), ("me", "PRP"), ("him", "PRP"), ("her", "PRP"),
    ("us", "PRP"), ("them", "PRP"), ("myself", "PRP"), ("yourself", "PRP"),
    ("my", "PRP$"), ("your", "PRP$"), ("his", "PRP$"), ("its", "PRP$"), ("our", "PRP$"),
    ("their", "PRP$"), ("the", "DT"), ("a", "DT"), ("an", "DT"), ("this", "DT"),
    ("that", "DT"), ("these", "DT"), ("those", "DT"), ("all", "DT"), ("some", "DT"),
    ("any", "DT"), ("every", "DT"), ("no", "DT"), ("in", "IN"), ("on", "IN"), ("at", "IN"),
    ("of", "IN"), ("for", "IN"), ("with", "IN"), ("about", "IN"), ("from", "IN"),
    ("to", "TO"), ("by", "IN"), ("like", "IN"), ("because", "IN"), ("if", "IN"),
    ("and", "CC"), ("or", "CC"), ("but", "CC"), ("can", "MD"), ("could", "MD"),
    ("will", "MD"), ("would", "MD"), ("should", "MD"), ("might", "MD"), ("must", "MD"),
    ("what", "WP"), ("who", "WP"), ("how", "WRB"), ("why", "WRB"), ("when", "WRB"),
    ("where", "WRB"), ("which", "WDT"), ("hello", "UH"), ("hi", "UH"), ("hey", "UH"),
    ("bye", "UH"), ("goodbye", "UH"), ("yes", "UH"), ("ok", "UH"), ("okay", "UH"),
    ("please", "UH"), ("thanks", "UH"), ("wow", "UH"),
    // verbs
    ("be", "VB"), ("have", "VB"), ("do", "VB"), ("go", "VB"), ("feel", "VB"), ("get", "VB"),
    ("make", "VB"), ("know", "VB"), ("think", "VB"), ("take", "VB"), ("see", "VB"),
    ("come", "VB"), ("want", "VB"), ("need", "VB"), ("help", "VB"), ("talk", "VB"),
    ("tell", "VB"), ("say", "VB"), ("ask", "VB"), ("sleep", "VB"), ("cry", "VB"),
    ("die", "VB"), ("kill", "VB"), ("hate", "VB"), ("love", "VB"), ("lose", "VB"),
    ("leave", "VB"), ("keep", "VB"), ("eat", "VB"), ("run", "VB"), ("stop", "VB"),
    ("try", "VB"), ("understand", "VB"), ("meditate", "VB"), ("learn", "VB"), ("live", "VB"),
    ("work", "VB"), ("worry", "VB"), ("hurt", "VB"), ("miss", "VB"), ("begin", "VB"),
    ("break", "VB"), ("give", "VB"), ("find", "VB"), ("call", "VB"), ("care", "VB"),
    ("use", "VB"), ("cope", "VB"), ("relax", "VB"), ("breathe", "VB"), ("panic", "VB"),
    ("suffer", "VB"), ("struggle", "VB"), ("remember", "VB"), ("forget", "VB"),
    ("believe", "VB"), ("agree", "VB"), ("joke", "VB"), ("repeat", "VB"), ("mean", "VB"),
    ("create", "VB"), ("thank", "VB"), ("appreciate", "VB"), ("recommend", "VB"),
    ("suggest", "VB"), ("cut", "VB"), ("fail", "VB"), ("lie", "VB"), ("stay", "VB"),
    ("wake", "VB"), ("seem", "VB"),
    // nouns
    ("anxiety", "NN"), ("depression", "NN"), ("stress", "NN"), ("schizophrenia", "NN"),
    ("disorder", "NN"), ("disorganization", "NN"), ("hallucination", "NN"), ("voice", "NN"),
    ("thought", "NN"), ("mind", "NN"), ("health", "NN"), ("therapy", "NN"),
    ("therapist", "NN"), ("doctor", "NN"), ("medication", "NN"), ("pill", "NN"),
    ("life", "NN"), ("death", "NN"), ("suicide", "NN"), ("friend", "NN"), ("family", "NN"),
    ("mother", "NN"), ("father", "NN"), ("parent", "NN"), ("child", "NN"), ("person", "NN"),
    ("people", "NNS"), ("man", "NN"), ("woman", "NN"), ("day", "NN"), ("night", "NN"),
    ("morning", "NN"), ("afternoon", "NN"), ("evening", "NN"), ("today", "NN"),
    ("tomorrow", "NN"), ("yesterday", "NN"), ("time", "NN"), ("week", "NN"), ("year", "NN"),
    ("name", "NN"), ("problem", "NN"), ("thing", "NN"), ("something", "NN"),
    ("nothing", "NN"), ("anything", "NN"), ("everything", "NN"), ("someone", "NN"),
    ("nobody", "NN"), ("advice", "NN"), ("fact", "NN"), ("joke", "NN"), ("location", "NN"),
    ("place", "NN"), ("home", "NN"), ("school", "NN"), ("job", "NN"), ("exam", "NN"),
    ("bot", "NN"), ("robot", "NN"), ("chatbot", "NN"), ("feeling", "NN"), ("emotion", "NN"),
    ("heart", "NN"), ("head", "NN"), ("body", "NN"), ("pain", "NN"), ("fear", "NN"),
    ("attack", "NN"), ("insomnia", "NN"), ("nightmare", "NN"), ("meditation", "NN"),
    ("breath", "NN"), ("self", "NN"), ("way", "NN"), ("world", "NN"), ("john", "NNP"),
    ("canada", "NNP"), ("microsoft", "NNP"), ("foot", "NN"), ("tooth", "NN"),
    ("wife", "NN"), ("knife", "NN"), ("mouse", "NN"),
    // adjectives
    ("sad", "JJ"), ("happy", "JJ"), ("anxious", "JJ"), ("depressed", "JJ"),
    ("stressed", "JJ"), ("lonely", "JJ"), ("alone", "JJ"), ("worthless", "JJ"),
    ("hopeless", "JJ"), ("helpless", "JJ"), ("tired", "JJ"), ("scared", "JJ"),
    ("afraid", "JJ"), ("angry", "JJ"), ("upset", "JJ"), ("nervous", "JJ"), ("bad", "JJ"),
    ("good", "JJ"), ("great", "JJ"), ("fine", "JJ"), ("okay", "JJ"), ("awful", "JJ"),
    ("terrible", "JJ"), ("stupid", "JJ"), ("useless", "JJ"), ("wrong", "JJ"), ("mental", "JJ"),
    ("major", "JJ"), ("positive", "JJ"), ("negative", "JJ"), ("crazy", "JJ"), ("weird", "JJ"),
    ("bored", "JJ"), ("calm", "JJ"), ("better", "JJR"), ("worse", "JJR"), ("new", "JJ"),
    ("old", "JJ"), ("long", "JJ"), ("late", "JJ"), ("hard", "JJ"), ("easy", "JJ"),
    ("nice", "JJ"), ("kind", "JJ"), ("useful", "JJ"), ("dead", "JJ"), ("empty", "JJ"),
    ("big", "JJ"), ("real", "JJ"),
    // adverbs
    ("very", "RB"), ("really", "RB"), ("so", "RB"), ("too", "RB"), ("not", "RB"),
    ("never", "RB"), ("always", "RB"), ("often", "RB"), ("sometimes", "RB"), ("again", "RB"),
    ("now", "RB"), ("just", "RB"), ("still", "RB"), ("also", "RB"), ("well", "RB"),
    ("much", "RB"), ("more", "RBR"), ("anymore", "RB"), ("here", "RB"), ("there", "RB"),
    ("n't", "RB"),
];

/// Tags for inflected forms that the suffix heuristics would get wrong.
/// "thought" is only ever tagged as a noun, so it shares a lemma with "thoughts".
const INFLECTED_TAGS: &[(&str, &str)] = &[
    ("am", "VBP"), ("is", "VBZ"), ("are", "VBP"), ("was", "VBD"), ("were", "VBD"),
    ("been", "VBN"), ("has", "VBZ"), ("had", "VBD"), ("does", "VBZ"), ("did", "VBD"),
    ("done", "VBN"), ("went", "VBD"), ("gone", "VBN"), ("felt", "VBD"), ("slept", "VBD"),
    ("made", "VBD"), ("said", "VBD"), ("got", "VBD"), ("took", "VBD"),
    ("taken", "VBN"), ("came", "VBD"), ("saw", "VBD"), ("seen", "VBN"), ("knew", "VBD"),
    ("known", "VBN"), ("told", "VBD"), ("lost", "VBD"), ("left", "VBD"), ("kept", "VBD"),
    ("ate", "VBD"), ("eaten", "VBN"), ("ran", "VBD"), ("began", "VBD"), ("begun", "VBN"),
    ("broke", "VBD"), ("broken", "VBN"), ("gave", "VBD"), ("given", "VBN"), ("found", "VBD"),
    ("meant", "VBD"), ("woke", "VBD"), ("children", "NNS"), ("men", "NNS"), ("women", "NNS"),
    ("feet", "NNS"), ("teeth", "NNS"), ("mice", "NNS"), ("lives", "NNS"), ("best", "JJS"),
    ("worst", "JJS"),
];

/// Irregular forms per part of speech (WordNet `*.exc` style).
const EXCEPTIONS: &[(PartOfSpeech, &str, &str)] = &[
    (PartOfSpeech::Verb, "am", "be"), (PartOfSpeech::Verb, "is", "be"),
    (PartOfSpeech::Verb, "are", "be"), (PartOfSpeech::Verb, "was", "be"),
    (PartOfSpeech::Verb, "were", "be"), (PartOfSpeech::Verb, "been", "be"),
    (PartOfSpeech::Verb, "has", "have"), (PartOfSpeech::Verb, "had", "have"),
    (PartOfSpeech::Verb, "does", "do"), (PartOfSpeech::Verb, "did", "do"),
    (PartOfSpeech::Verb, "done", "do"), (PartOfSpeech::Verb, "went", "go"),
    (PartOfSpeech::Verb, "gone", "go"), (PartOfSpeech::Verb, "felt", "feel"),
    (PartOfSpeech::Verb, "slept", "sleep"), (PartOfSpeech::Verb, "thought", "think"),
    (PartOfSpeech::Verb, "made", "make"), (PartOfSpeech::Verb, "said", "say"),
    (PartOfSpeech::Verb, "got", "get"), (PartOfSpeech::Verb, "took", "take"),
    (PartOfSpeech::Verb, "taken", "take"), (PartOfSpeech::Verb, "came", "come"),
    (PartOfSpeech::Verb, "saw", "see"), (PartOfSpeech::Verb, "seen", "see"),
    (PartOfSpeech::Verb, "knew", "know"), (PartOfSpeech::Verb, "known", "know"),
    (PartOfSpeech::Verb, "told", "tell"), (PartOfSpeech::Verb, "lost", "lose"),
    (PartOfSpeech::Verb, "left", "leave"), (PartOfSpeech::Verb, "kept", "keep"),
    (PartOfSpeech::Verb, "ate", "eat"), (PartOfSpeech::Verb, "eaten", "eat"),
    (PartOfSpeech::Verb, "ran", "run"), (PartOfSpeech::Verb, "began", "begin"),
    (PartOfSpeech::Verb, "begun", "begin"), (PartOfSpeech::Verb, "broke", "break"),
    (PartOfSpeech::Verb, "broken", "break"), (PartOfSpeech::Verb, "gave", "give"),
    (PartOfSpeech::Verb, "given", "give"), (PartOfSpeech::Verb, "found", "find"),
    (PartOfSpeech::Verb, "meant", "mean"), (PartOfSpeech::Verb, "woke", "wake"),
    (PartOfSpeech::Verb, "cried", "cry"), (PartOfSpeech::Verb, "died", "die"),
    (PartOfSpeech::Verb, "lying", "lie"), (PartOfSpeech::Verb, "dying", "die"),
    (PartOfSpeech::Noun, "children", "child"), (PartOfSpeech::Noun, "people", "person"),
    (PartOfSpeech::Noun, "men", "man"), (PartOfSpeech::Noun, "women", "woman"),
    (PartOfSpeech::Noun, "feet", "foot"), (PartOfSpeech::Noun, "teeth", "tooth"),
    (PartOfSpeech::Noun, "mice", "mouse"), (PartOfSpeech::Noun, "lives", "life"),
    (PartOfSpeech::Adjective, "better", "good"), (PartOfSpeech::Adjective, "best", "good"),
    (PartOfSpeech::Adjective, "worse", "bad"), (PartOfSpeech::Adjective, "worst", "bad"),
    (PartOfSpeech::Adverb, "better", "well"), (PartOfSpeech::Adverb, "best", "well"),
];

/// Suffix detachment rules (suffix, replacement) per part of speech.
fn detachment_rules(pos: PartOfSpeech) -> &'static [(&'static str, &'static str)] {
    match pos {
        PartOfSpeech::Noun => &[
            ("s", ""), ("ses", "s"), ("ves", "f"), ("xes", "x"), ("zes", "z"),
            ("ches", "ch"), ("shes", "sh"), ("men", "man"), ("ies", "y"),
        ],
        PartOfSpeech::Verb => &[
            ("s", ""), ("ies", "y"), ("es", "e"), ("es", ""), ("ed", "e"), ("ed", ""),
            ("ing", "e"), ("ing", ""),
        ],
        PartOfSpeech::Adjective => &[("er", ""), ("est", ""), ("er", "e"), ("est", "e")],
        PartOfSpeech::Adverb => &[],
    }
}

/// Dictionary tagger with suffix heuristics for unknown words.
pub struct LexiconTagger {
    tags: HashMap<&'static str, &'static str>,
}

impl Default for LexiconTagger {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconTagger {
    pub fn new() -> Self {
        let tags = BASE_WORDS
            .iter()
            .chain(INFLECTED_TAGS.iter())
            .copied()
            .collect();
        Self { tags }
    }

    fn guess(word: &str) -> &'static str {
        let len = word.chars().count();
        if word.chars().all(|c| c.is_ascii_digit()) && len > 0 {
            "CD"
        } else if len > 4 && word.ends_with("ly") {
            "RB"
        } else if len > 4 && word.ends_with("ing") {
            "VBG"
        } else if len > 3 && word.ends_with("ed") {
            "VBD"
        } else if len > 4
            && ["ous", "ful", "ive", "able", "ible", "less", "ish", "ic", "al"]
                .iter()
                .any(|suffix| word.ends_with(suffix))
        {
            "JJ"
        } else if len > 3 && word.ends_with('s') && !word.ends_with("ss") {
            "NNS"
        } else {
            "NN"
        }
    }
}

impl PosTagger for LexiconTagger {
    fn tag(&self, word: &str) -> Option<String> {
        if word.is_empty() || !word.chars().any(char::is_alphanumeric) {
            return None;
        }
        let tag = self.tags.get(word).copied().unwrap_or_else(|| Self::guess(word));
        Some(tag.to_string())
    }
}

/// WordNet-morphy style lemmatizer over a closed set of known lemmas.
///
/// Irregular forms for the given part of speech are looked up first. Known
/// lemmas are then returned unchanged; every exception target is itself a
/// known lemma, so lemmatizing twice gives the same result as once.
/// Otherwise suffix rules are tried and the shortest candidate that is a
/// known lemma wins. Words with no known
/// lemma come back as they went in.
pub struct RuleLemmatizer {
    lemmas: HashSet<String>,
    exceptions: HashMap<PartOfSpeech, HashMap<&'static str, &'static str>>,
}

impl Default for RuleLemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleLemmatizer {
    pub fn new() -> Self {
        let mut lemmas: HashSet<String> =
            BASE_WORDS.iter().map(|(word, _)| word.to_string()).collect();
        let mut exceptions: HashMap<PartOfSpeech, HashMap<&'static str, &'static str>> =
            HashMap::new();
        for (pos, form, lemma) in EXCEPTIONS {
            lemmas.insert(lemma.to_string());
            exceptions.entry(*pos).or_default().insert(*form, *lemma);
        }
        Self { lemmas, exceptions }
    }

    /// Adds extra known lemmas, typically the classifier vocabulary.
    pub fn with_lemmas<I, S>(mut self, lemmas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.lemmas
            .extend(lemmas.into_iter().map(|l| l.as_ref().to_lowercase()));
        self
    }

    pub fn is_lemma(&self, word: &str) -> bool {
        self.lemmas.contains(word)
    }

    fn candidates(word: &str, pos: PartOfSpeech) -> Vec<String> {
        let mut candidates = Vec::new();
        for (suffix, replacement) in detachment_rules(pos) {
            let Some(stem) = word.strip_suffix(suffix) else {
                continue;
            };
            if stem.is_empty() {
                continue;
            }
            candidates.push(format!("{}{}", stem, replacement));
            // "stopped" -> "stopp" -> "stop", "bigger" -> "bigg" -> "big"
            if replacement.is_empty() && has_doubled_final_consonant(stem) {
                let mut chars = stem.chars();
                chars.next_back();
                candidates.push(chars.as_str().to_string());
            }
        }
        candidates
    }
}

impl Lemmatizer for RuleLemmatizer {
    fn lemmatize(&self, word: &str, pos: PartOfSpeech) -> String {
        // Irregular forms win even when the surface form is itself a lemma.
        if let Some(lemma) = self.exceptions.get(&pos).and_then(|forms| forms.get(word)) {
            return lemma.to_string();
        }
        if self.lemmas.contains(word) {
            return word.to_string();
        }
        Self::candidates(word, pos)
            .into_iter()
            .filter(|candidate| self.lemmas.contains(candidate))
            .min_by_key(|candidate| candidate.chars().count())
            .unwrap_or_else(|| word.to_string())
    }
}

fn has_doubled_final_consonant(stem: &str) -> bool {
    let mut chars = stem.chars().rev();
    match (chars.next(), chars.next()) {
        (Some(a), Some(b)) => a == b && a.is_alphabetic() && !"aeiou".contains(a),
        _ => false,
    }
}
