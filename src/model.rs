// 🌲 Regression Model - Decision Tree Ensemble
// Evaluates the persisted random forest artifact over a fixed-order feature vector

use anyhow::{anyhow, Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Fixed feature order: [size, bedrooms, parking, project, area_code,
/// subtype_code, regtype_code]
pub const FEATURE_COUNT: usize = 7;

/// A trained regression model exposing a single-point predict operation.
///
/// The serving pipeline only depends on this trait, so tests substitute a
/// stub and the artifact format can evolve independently.
pub trait PriceModel {
    /// Predict a price for one fixed-order feature vector.
    fn predict(&self, features: &[f64]) -> Result<f64>;

    /// Human-readable model type name (e.g. "RandomForestRegressor").
    fn model_type(&self) -> &str;
}

// ============================================================================
// FOREST MODEL
// ============================================================================

/// One node of a flattened decision tree.
///
/// `feature == -1` marks a leaf; interior nodes route to `left` when
/// `features[feature] <= threshold`, otherwise to `right`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub feature: i32,
    pub threshold: f64,
    pub left: i32,
    pub right: i32,
    pub value: f64,
}

/// A single regression tree as a flat node array rooted at index 0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<TreeNode>,
}

impl Tree {
    /// Walk from the root to a leaf. Bounds and cycles are guarded even
    /// though `validate` rejects malformed trees at load time.
    fn evaluate(&self, features: &[f64]) -> Result<f64> {
        let mut index = 0usize;

        // A well-formed tree reaches a leaf in at most nodes.len() steps.
        for _ in 0..=self.nodes.len() {
            let node = self
                .nodes
                .get(index)
                .ok_or_else(|| anyhow!("tree node index {} out of range", index))?;

            if node.feature < 0 {
                return Ok(node.value);
            }

            let feature_idx = node.feature as usize;
            let value = *features
                .get(feature_idx)
                .ok_or_else(|| anyhow!("feature index {} out of range", feature_idx))?;

            index = if value <= node.threshold {
                node.left as usize
            } else {
                node.right as usize
            };
        }

        Err(anyhow!("tree walk did not reach a leaf (cycle?)"))
    }

    fn validate(&self, tree_idx: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(anyhow!("tree {} has no nodes", tree_idx));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            if node.feature < 0 {
                continue;
            }
            if node.feature as usize >= FEATURE_COUNT {
                return Err(anyhow!(
                    "tree {} node {} references feature {} (model has {})",
                    tree_idx,
                    i,
                    node.feature,
                    FEATURE_COUNT
                ));
            }
            let n = self.nodes.len() as i32;
            if node.left < 0 || node.left >= n || node.right < 0 || node.right >= n {
                return Err(anyhow!(
                    "tree {} node {} has child index out of range",
                    tree_idx,
                    i
                ));
            }
        }

        Ok(())
    }
}

/// A random-forest regressor: prediction is the mean of all tree outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestModel {
    #[serde(default = "default_model_type")]
    pub model_type: String,
    pub trees: Vec<Tree>,
}

fn default_model_type() -> String {
    "RandomForestRegressor".to_string()
}

impl ForestModel {
    /// Load and validate the forest artifact.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read model file: {:?}", path.as_ref()))?;

        let model: ForestModel = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse model JSON: {:?}", path.as_ref()))?;

        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(anyhow!("model has no trees"));
        }
        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(i)?;
        }
        Ok(())
    }

    pub fn tree_count(&self) -> usize {
        self.trees.len()
    }
}

impl PriceModel for ForestModel {
    fn predict(&self, features: &[f64]) -> Result<f64> {
        if features.len() != FEATURE_COUNT {
            return Err(anyhow!(
                "expected {} features, got {}",
                FEATURE_COUNT,
                features.len()
            ));
        }

        let mut sum = 0.0;
        for tree in &self.trees {
            sum += tree.evaluate(features)?;
        }

        Ok(sum / self.trees.len() as f64)
    }

    fn model_type(&self) -> &str {
        &self.model_type
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(value: f64) -> TreeNode {
        TreeNode {
            feature: -1,
            threshold: 0.0,
            left: 0,
            right: 0,
            value,
        }
    }

    /// One split on property size: <= 100 sqm is cheap, above is expensive.
    fn size_split_tree(cheap: f64, expensive: f64) -> Tree {
        Tree {
            nodes: vec![
                TreeNode {
                    feature: 0,
                    threshold: 100.0,
                    left: 1,
                    right: 2,
                    value: 0.0,
                },
                leaf(cheap),
                leaf(expensive),
            ],
        }
    }

    #[test]
    fn test_single_tree_routing() {
        let model = ForestModel {
            model_type: default_model_type(),
            trees: vec![size_split_tree(500_000.0, 2_000_000.0)],
        };

        let small = [80.0, 1.0, 1.0, 1.0, 5.0, 2.0, 0.0];
        let large = [250.0, 4.0, 1.0, 1.0, 5.0, 2.0, 0.0];

        assert_eq!(model.predict(&small).unwrap(), 500_000.0);
        assert_eq!(model.predict(&large).unwrap(), 2_000_000.0);
    }

    #[test]
    fn test_forest_averages_trees() {
        let model = ForestModel {
            model_type: default_model_type(),
            trees: vec![
                Tree { nodes: vec![leaf(1_000_000.0)] },
                Tree { nodes: vec![leaf(2_000_000.0)] },
            ],
        };

        let features = [100.0, 2.0, 1.0, 1.0, 5.0, 2.0, 0.0];
        assert_eq!(model.predict(&features).unwrap(), 1_500_000.0);
    }

    #[test]
    fn test_wrong_arity_rejected() {
        let model = ForestModel {
            model_type: default_model_type(),
            trees: vec![Tree { nodes: vec![leaf(1.0)] }],
        };

        assert!(model.predict(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_child_index() {
        let model = ForestModel {
            model_type: default_model_type(),
            trees: vec![Tree {
                nodes: vec![TreeNode {
                    feature: 0,
                    threshold: 1.0,
                    left: 5,
                    right: 0,
                    value: 0.0,
                }],
            }],
        };

        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_forest() {
        let model = ForestModel {
            model_type: default_model_type(),
            trees: vec![],
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_feature() {
        let model = ForestModel {
            model_type: default_model_type(),
            trees: vec![Tree {
                nodes: vec![
                    TreeNode {
                        feature: 7,
                        threshold: 1.0,
                        left: 1,
                        right: 1,
                        value: 0.0,
                    },
                    leaf(1.0),
                ],
            }],
        };
        assert!(model.validate().is_err());
    }
}
