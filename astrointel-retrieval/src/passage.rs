//! Knowledge base types
//!
//! Passages are immutable once the knowledge base is built. Order matters:
//! the vector cache is index-aligned with it.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Stable identifier of a passage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassageId(pub u32);

impl std::fmt::Display for PassageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single knowledge base entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub id: PassageId,
    #[serde(rename = "context", alias = "text")]
    pub text: String,
}

impl Passage {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id: PassageId(id),
            text: text.into(),
        }
    }
}

/// Ordered, validated set of passages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeBase {
    passages: Vec<Passage>,
}

impl KnowledgeBase {
    /// Build a knowledge base, rejecting empty sets, blank texts and duplicate ids
    pub fn new(passages: Vec<Passage>) -> Result<Self> {
        if passages.is_empty() {
            return Err(RetrievalError::knowledge_base(
                "knowledge base must contain at least one passage",
            ));
        }

        let mut seen = HashSet::with_capacity(passages.len());
        for passage in &passages {
            if passage.text.trim().is_empty() {
                return Err(RetrievalError::knowledge_base(format!(
                    "passage {} has no text",
                    passage.id
                )));
            }
            if !seen.insert(passage.id) {
                return Err(RetrievalError::knowledge_base(format!(
                    "duplicate passage id {}",
                    passage.id
                )));
            }
        }

        Ok(Self { passages })
    }

    /// Load passages from a JSON array of `{"id": .., "context": ..}` objects
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let passages: Vec<Passage> = serde_json::from_str(&raw)?;
        log::info!(
            "Loaded {} passages from {}",
            passages.len(),
            path.display()
        );
        Self::new(passages)
    }

    /// Built-in space biology facts
    pub fn space_biology() -> Self {
        let passages = SPACE_BIOLOGY
            .iter()
            .map(|(id, text)| Passage::new(*id, *text))
            .collect();
        Self { passages }
    }

    pub fn passages(&self) -> &[Passage] {
        &self.passages
    }

    pub fn get(&self, index: usize) -> Option<&Passage> {
        self.passages.get(index)
    }

    pub fn find(&self, id: PassageId) -> Option<&Passage> {
        self.passages.iter().find(|p| p.id == id)
    }

    /// Passage texts in knowledge base order
    pub fn texts(&self) -> Vec<&str> {
        self.passages.iter().map(|p| p.text.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.passages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

const SPACE_BIOLOGY: &[(u32, &str)] = &[
    (
        1,
        "E. coli and Bacillus subtilis are commonly studied microbes on the ISS in microgravity \
         experiments to understand their behavior, growth, and mutation in space.",
    ),
    (
        2,
        "Microgravity can surprisingly alter bacterial growth rates, increase their resistance to \
         antibiotics, and change their gene expression, which is a key area of study for \
         long-duration space missions.",
    ),
    (
        3,
        "Leafy greens like lettuce and radishes, as well as dwarf wheat, have been successfully \
         grown in microgravity. They are chosen for their fast growth cycles and nutritional value \
         for astronauts.",
    ),
    (
        4,
        "To combat bone density loss in a zero-gravity environment, astronauts must follow a strict \
         regimen of resistance exercises using special equipment, maintain a calcium-rich diet, and \
         sometimes use specific medications.",
    ),
    (
        5,
        "Some incredibly resilient microbes called extremophiles, as well as certain bacterial \
         spores, have been shown to survive for years when exposed to the vacuum and radiation of \
         space, raising questions about the interplanetary transfer of life.",
    ),
    (
        6,
        "Astrobiology is the scientific field dedicated to studying the origin, evolution, \
         distribution, and future of life in the universe. It combines principles of biology, \
         chemistry, and astronomy to explore the possibility of life beyond Earth.",
    ),
];
