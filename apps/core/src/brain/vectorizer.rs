//! Bag-of-words encoding over a fixed vocabulary.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Ordered list of known terms. Position `i` is feature dimension `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    positions: HashMap<String, Vec<usize>>,
}

impl Vocabulary {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms.into_iter().map(Into::into).collect();
        let mut positions: HashMap<String, Vec<usize>> = HashMap::new();
        for (i, term) in terms.iter().enumerate() {
            positions.entry(term.clone()).or_default().push(i);
        }
        Self { terms, positions }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Every dimension whose term equals `token` exactly.
    pub fn positions(&self, token: &str) -> &[usize] {
        self.positions.get(token).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Binary presence vector, one entry per vocabulary term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector(Vec<u8>);

impl FeatureVector {
    pub fn zeros(len: usize) -> Self {
        Self(vec![0; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    pub fn to_f32(&self) -> Vec<f32> {
        self.0.iter().map(|&bit| f32::from(bit)).collect()
    }

    /// Number of dimensions set to 1.
    pub fn active(&self) -> usize {
        self.0.iter().filter(|&&bit| bit == 1).count()
    }
}

impl From<Vec<u8>> for FeatureVector {
    fn from(bits: Vec<u8>) -> Self {
        Self(bits.into_iter().map(|b| u8::from(b != 0)).collect())
    }
}

/// Encoded input plus the vocabulary terms that fired, in first-seen order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub vector: FeatureVector,
    pub matches: Vec<String>,
}

/// Sets dimension `i` to 1 iff `vocabulary.terms()[i]` appears among `tokens`.
/// Unknown tokens are ignored; repeated tokens count once.
pub fn encode<S: AsRef<str>>(tokens: &[S], vocabulary: &Vocabulary) -> Encoding {
    let mut bits = vec![0u8; vocabulary.len()];
    let mut matches = Vec::new();

    for token in tokens {
        let token = token.as_ref();
        let positions = vocabulary.positions(token);
        if positions.is_empty() || bits[positions[0]] == 1 {
            continue;
        }
        for &i in positions {
            bits[i] = 1;
        }
        matches.push(token.to_string());
    }

    Encoding {
        vector: FeatureVector(bits),
        matches,
    }
}
