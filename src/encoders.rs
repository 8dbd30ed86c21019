// 🔤 Categorical Encoders - Label → Code with Fallback
// Mirrors the persisted label encoders the model was trained with

use anyhow::{anyhow, Context as AnyhowContext, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// On-disk encoder artifact: the ordered class list the encoder was fit on.
#[derive(Debug, Deserialize)]
struct EncoderArtifact {
    classes: Vec<String>,
}

/// Result of encoding one categorical value.
///
/// `warning` is set when the label was unknown and the encoder fell back
/// to its default class.
#[derive(Debug, Clone)]
pub struct Encoded {
    pub code: i64,
    pub warning: Option<String>,
}

/// A read-only bijection from known string labels to small integer codes.
///
/// Codes are positions in the ordered class list; they carry no ordinal
/// meaning beyond what the trained model learned.
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    name: String,
    classes: Vec<String>,
    codes: HashMap<String, i64>,
}

impl LabelEncoder {
    /// Build an encoder from an ordered class list.
    pub fn new(name: &str, classes: Vec<String>) -> Result<Self> {
        if classes.is_empty() {
            return Err(anyhow!("encoder '{}' has no classes", name));
        }

        let mut codes = HashMap::with_capacity(classes.len());
        for (i, class) in classes.iter().enumerate() {
            if codes.insert(class.clone(), i as i64).is_some() {
                return Err(anyhow!("encoder '{}' has duplicate class '{}'", name, class));
            }
        }

        Ok(LabelEncoder {
            name: name.to_string(),
            classes,
            codes,
        })
    }

    /// Load an encoder from its JSON artifact (`{"classes": [...]}`).
    pub fn from_file<P: AsRef<Path>>(name: &str, path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read encoder file: {:?}", path.as_ref()))?;

        let artifact: EncoderArtifact = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse encoder JSON: {:?}", path.as_ref()))?;

        LabelEncoder::new(name, artifact.classes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ordered class list, as persisted at training time.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Exact lookup: code for a known label.
    pub fn encode(&self, label: &str) -> Option<i64> {
        self.codes.get(label).copied()
    }

    /// Encode with fallback: unknown labels map to the first known class.
    ///
    /// This never fails - unknown categorical input is downgraded to a
    /// deterministic default rather than rejected, trading prediction
    /// precision for availability.
    pub fn encode_or_default(&self, label: &str) -> Encoded {
        match self.encode(label) {
            Some(code) => Encoded {
                code,
                warning: None,
            },
            None => Encoded {
                // classes is non-empty by construction, so code 0 exists
                code: 0,
                warning: Some(format!(
                    "Unknown {} '{}', using default '{}'",
                    self.name, label, self.classes[0]
                )),
            },
        }
    }

    /// Whether a label is among the first `n` classes of this encoder.
    pub fn in_top(&self, label: &str, n: usize) -> bool {
        self.classes.iter().take(n).any(|c| c == label)
    }
}

// ============================================================================
// TESTS
// ============================================================================
