// ==================== CROP PREDICTION MODEL ====================
// Pre-trained decision-tree ensemble over 7 soil/climate features.
// The artifact is a JSON file loaded once at startup and shared via
// web::Data; prediction is a majority vote over trees.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::utils::AppError;

/// Class ids produced by the classifier are in [1, 22]
pub const NUM_CLASSES: usize = 22;

/// Class id -> crop label (index 0 unused, ids start at 1)
const CROP_LABELS: [&str; NUM_CLASSES + 1] = [
    "",
    "rice",
    "maize",
    "chickpea",
    "kidneybeans",
    "pigeonpeas",
    "mothbeans",
    "mungbean",
    "blackgram",
    "lentil",
    "pomegranate",
    "banana",
    "mango",
    "grapes",
    "watermelon",
    "muskmelon",
    "apple",
    "orange",
    "papaya",
    "coconut",
    "cotton",
    "jute",
    "coffee",
];

const DEFAULT_FERTILIZER: &str = "Standard NPK 20-20-20 fertilizer recommended";

fn fertilizer_table() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("rice", "NPK 10-26-26, 2.5 bags per acre"),
        ("maize", "NPK 20-20-20, 2 bags per acre"),
        ("chickpea", "NPK 10-26-26, 1.5 bags per acre"),
        ("kidneybeans", "NPK 20-10-10, 1.5 bags per acre"),
        ("pigeonpeas", "NPK 18-46-0, 1 bag per acre"),
        ("mothbeans", "NPK 20-20-0, 1 bag per acre"),
        ("mungbean", "NPK 20-40-0, 1 bag per acre"),
        ("blackgram", "NPK 10-26-26, 1 bag per acre"),
        ("lentil", "NPK 20-10-10, 1 bag per acre"),
        ("pomegranate", "NPK 15-15-15, 3 bags per acre"),
        ("banana", "NPK 14-14-14, 3 bags per acre"),
        ("mango", "NPK 20-10-10, 2 bags per acre"),
        ("grapes", "NPK 10-20-20, 2 bags per acre"),
        ("watermelon", "NPK 15-15-15, 2 bags per acre"),
        ("muskmelon", "NPK 15-15-15, 2 bags per acre"),
        ("apple", "NPK 20-20-20, 2 bags per acre"),
        ("orange", "NPK 15-15-15, 2 bags per acre"),
        ("papaya", "NPK 20-20-20, 2 bags per acre"),
        ("coconut", "NPK 15-15-15, 2 bags per acre"),
        ("cotton", "NPK 20-10-10, 2 bags per acre"),
        ("jute", "NPK 10-26-26, 1.5 bags per acre"),
        ("coffee", "NPK 20-20-20, 2 bags per acre"),
    ])
}

/// Node in a serialized decision tree (flat table, children by index)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    /// Leaf: class id in [1, 22]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<u32>,
    /// Split: feature index in [0, 6]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Walks the tree from the root for one feature vector.
    /// Returns None if the tree is malformed (dangling index, empty, cycle).
    fn classify(&self, features: &[f64; 7]) -> Option<u32> {
        let mut idx = 0usize;
        // Bounded walk; a well-formed tree terminates long before this
        for _ in 0..self.nodes.len().max(1) {
            let node = self.nodes.get(idx)?;
            if let Some(class) = node.class {
                return Some(class);
            }
            let feature = node.feature?;
            let threshold = node.threshold?;
            let value = *features.get(feature)?;
            idx = if value <= threshold {
                node.left?
            } else {
                node.right?
            };
        }
        None
    }
}

/// Serialized model artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropModelArtifact {
    pub version: u32,
    pub trees: Vec<DecisionTree>,
}

/// Loaded crop model with its label and fertilizer tables
#[derive(Debug, Clone)]
pub struct CropModel {
    trees: Vec<DecisionTree>,
    fertilizers: HashMap<&'static str, &'static str>,
}

impl CropModel {
    /// Loads the model artifact from disk.
    ///
    /// A missing or corrupt artifact is a startup error: the service refuses
    /// to come up with a model that cannot produce meaningful predictions.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ModelError(format!("Cannot read model file {}: {}", path.display(), e))
        })?;

        let artifact: CropModelArtifact = serde_json::from_str(&raw).map_err(|e| {
            AppError::ModelError(format!("Invalid model file {}: {}", path.display(), e))
        })?;

        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: CropModelArtifact) -> Result<Self, AppError> {
        if artifact.trees.is_empty() {
            return Err(AppError::ModelError("Model has no trees".to_string()));
        }

        Ok(CropModel {
            trees: artifact.trees,
            fertilizers: fertilizer_table(),
        })
    }

    /// Maps a 7-feature vector to a class id in [1, 22] by majority vote.
    fn predict_class(&self, features: &[f64; 7]) -> Result<u32, String> {
        let mut votes = [0u32; NUM_CLASSES + 1];

        for tree in &self.trees {
            match tree.classify(features) {
                Some(class) if (1..=NUM_CLASSES as u32).contains(&class) => {
                    votes[class as usize] += 1;
                }
                Some(class) => {
                    return Err(format!("Model produced out-of-range class id {}", class));
                }
                None => {
                    return Err("Model tree is malformed".to_string());
                }
            }
        }

        let (best, _) = votes
            .iter()
            .enumerate()
            .skip(1)
            .max_by_key(|(_, count)| **count)
            .ok_or_else(|| "No votes collected".to_string())?;

        Ok(best as u32)
    }

    /// Predicts the crop and its fertilizer recommendation.
    ///
    /// Feature order: nitrogen, phosphorus, potassium, temperature,
    /// humidity, ph, rainfall.
    pub fn predict_crop(&self, features: &[f64; 7]) -> Result<(String, String), String> {
        let class = self.predict_class(features)?;
        let crop = CROP_LABELS[class as usize];
        let fertilizer = self
            .fertilizers
            .get(crop)
            .copied()
            .unwrap_or(DEFAULT_FERTILIZER);

        Ok((crop.to_string(), fertilizer.to_string()))
    }

    /// All crop labels the model can output
    pub fn known_crops() -> &'static [&'static str] {
        &CROP_LABELS[1..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(class: u32) -> TreeNode {
        TreeNode {
            class: Some(class),
            feature: None,
            threshold: None,
            left: None,
            right: None,
        }
    }

    fn split(feature: usize, threshold: f64, left: usize, right: usize) -> TreeNode {
        TreeNode {
            class: None,
            feature: Some(feature),
            threshold: Some(threshold),
            left: Some(left),
            right: Some(right),
        }
    }

    /// Single tree: rainfall > 150 -> rice (1), else maize (2)
    fn rainfall_model() -> CropModel {
        CropModel::from_artifact(CropModelArtifact {
            version: 1,
            trees: vec![DecisionTree {
                nodes: vec![split(6, 150.0, 1, 2), leaf(2), leaf(1)],
            }],
        })
        .unwrap()
    }

    #[test]
    fn test_predict_follows_split() {
        let model = rainfall_model();

        let wet = [90.0, 42.0, 43.0, 21.0, 82.0, 6.5, 203.0];
        let (crop, fertilizer) = model.predict_crop(&wet).unwrap();
        assert_eq!(crop, "rice");
        assert_eq!(fertilizer, "NPK 10-26-26, 2.5 bags per acre");

        let dry = [71.0, 54.0, 16.0, 22.6, 63.7, 5.7, 87.8];
        let (crop, _) = model.predict_crop(&dry).unwrap();
        assert_eq!(crop, "maize");
    }

    #[test]
    fn test_majority_vote() {
        // Two trees vote rice, one votes coffee
        let model = CropModel::from_artifact(CropModelArtifact {
            version: 1,
            trees: vec![
                DecisionTree { nodes: vec![leaf(1)] },
                DecisionTree { nodes: vec![leaf(1)] },
                DecisionTree { nodes: vec![leaf(22)] },
            ],
        })
        .unwrap();

        let (crop, _) = model.predict_crop(&[0.0; 7]).unwrap();
        assert_eq!(crop, "rice");
    }

    #[test]
    fn test_every_class_has_label_and_fertilizer() {
        let fertilizers = fertilizer_table();
        for class in 1..=NUM_CLASSES {
            let model = CropModel::from_artifact(CropModelArtifact {
                version: 1,
                trees: vec![DecisionTree { nodes: vec![leaf(class as u32)] }],
            })
            .unwrap();

            let (crop, fertilizer) = model.predict_crop(&[0.0; 7]).unwrap();
            assert!(!crop.is_empty());
            assert!(!fertilizer.is_empty());
            assert_eq!(fertilizer, *fertilizers.get(crop.as_str()).unwrap());
        }
    }

    #[test]
    fn test_out_of_range_class_rejected() {
        let model = CropModel::from_artifact(CropModelArtifact {
            version: 1,
            trees: vec![DecisionTree { nodes: vec![leaf(23)] }],
        })
        .unwrap();

        assert!(model.predict_crop(&[0.0; 7]).is_err());
    }

    #[test]
    fn test_malformed_tree_rejected() {
        // Split node pointing past the node table
        let model = CropModel::from_artifact(CropModelArtifact {
            version: 1,
            trees: vec![DecisionTree {
                nodes: vec![split(0, 1.0, 5, 6)],
            }],
        })
        .unwrap();

        assert!(model.predict_crop(&[0.0; 7]).is_err());
    }

    #[test]
    fn test_empty_artifact_rejected() {
        let result = CropModel::from_artifact(CropModelArtifact {
            version: 1,
            trees: vec![],
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_shipped_artifact_loads_and_predicts() {
        let model = CropModel::load(Path::new("ml_models/cropmodel.json")).unwrap();

        let samples: [[f64; 7]; 4] = [
            [90.0, 42.0, 43.0, 20.9, 82.0, 6.5, 202.9],
            [20.0, 67.0, 19.0, 24.5, 21.6, 5.7, 78.7],
            [101.0, 17.0, 47.0, 29.4, 94.0, 6.0, 26.3],
            [40.0, 72.0, 77.0, 17.0, 90.0, 7.6, 110.0],
        ];

        for features in &samples {
            let (crop, fertilizer) = model.predict_crop(features).unwrap();
            assert!(CropModel::known_crops().contains(&crop.as_str()));
            assert!(!fertilizer.is_empty());
        }
    }

    #[test]
    fn test_missing_artifact_is_an_error() {
        assert!(CropModel::load(Path::new("ml_models/no-such-model.json")).is_err());
    }

    #[test]
    fn test_artifact_roundtrip() {
        let artifact = CropModelArtifact {
            version: 1,
            trees: vec![DecisionTree {
                nodes: vec![split(6, 150.0, 1, 2), leaf(2), leaf(1)],
            }],
        };

        let json = serde_json::to_string(&artifact).unwrap();
        let parsed: CropModelArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.trees.len(), 1);
        assert_eq!(parsed.trees[0].nodes.len(), 3);
    }
}
