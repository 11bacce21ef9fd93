//! Decision tree and random forest classification.
//!
//! CART trees split on Gini impurity; the forest trains each tree on a
//! seeded bootstrap sample and reports class probabilities as vote shares.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::dataset::FeatureTable;
use crate::error::{HealthError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
enum TreeNode {
    Leaf {
        class_label: usize,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f32,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

/// Gini impurity of a label set: 1 - sum(p_i^2).
fn gini_impurity(labels: &[usize]) -> f32 {
    if labels.is_empty() {
        return 0.0;
    }

    // BTreeMap for deterministic iteration order
    let mut counts = std::collections::BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0usize) += 1;
    }

    let n = labels.len() as f32;
    let mut gini = 1.0;
    for count in counts.values() {
        let p = *count as f32 / n;
        gini -= p * p;
    }
    gini
}

/// Weighted Gini impurity of a candidate split.
fn gini_split(left_labels: &[usize], right_labels: &[usize]) -> f32 {
    let n_left = left_labels.len() as f32;
    let n_right = right_labels.len() as f32;
    let n_total = n_left + n_right;
    if n_total == 0.0 {
        return 0.0;
    }

    (n_left / n_total) * gini_impurity(left_labels)
        + (n_right / n_total) * gini_impurity(right_labels)
}

fn sorted_unique_values(x: &[f32]) -> Vec<f32> {
    let mut values = x.to_vec();
    values.sort_by(|a, b| a.partial_cmp(b).expect("feature values are finite"));
    values.dedup_by(|a, b| (*a - *b).abs() <= 1e-10);
    values
}

/// Best (threshold, gain) for one feature column, trying midpoints
/// between consecutive unique values.
fn best_split_for_feature(x: &[f32], y: &[usize]) -> Option<(f32, f32)> {
    if x.len() < 2 {
        return None;
    }
    let unique_values = sorted_unique_values(x);
    if unique_values.len() < 2 {
        return None;
    }

    let current_impurity = gini_impurity(y);
    let mut best_gain = 0.0;
    let mut best_threshold = 0.0;

    for pair in unique_values.windows(2) {
        let threshold = (pair[0] + pair[1]) / 2.0;

        let mut left = Vec::new();
        let mut right = Vec::new();
        for (idx, &val) in x.iter().enumerate() {
            if val <= threshold {
                left.push(y[idx]);
            } else {
                right.push(y[idx]);
            }
        }
        if left.is_empty() || right.is_empty() {
            continue;
        }

        let gain = current_impurity - gini_split(&left, &right);
        if gain > best_gain {
            best_gain = gain;
            best_threshold = threshold;
        }
    }

    (best_gain > 0.0).then_some((best_threshold, best_gain))
}

/// Best (feature, threshold, gain) across all feature columns.
fn best_split(x: &FeatureTable, y: &[usize]) -> Option<(usize, f32, f32)> {
    let (n_samples, n_features) = x.shape();
    if n_samples < 2 {
        return None;
    }

    let mut best: Option<(usize, f32, f32)> = None;
    for feature_idx in 0..n_features {
        let column: Vec<f32> = (0..n_samples).map(|row| x.get(row, feature_idx)).collect();
        if let Some((threshold, gain)) = best_split_for_feature(&column, y) {
            if best.map_or(true, |(_, _, g)| gain > g) {
                best = Some((feature_idx, threshold, gain));
            }
        }
    }
    best
}

fn majority_class(labels: &[usize]) -> usize {
    let mut counts = std::collections::BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0usize) += 1;
    }
    // BTreeMap iterates in key order, so ties resolve to the lowest class
    counts
        .into_iter()
        .max_by_key(|&(_, count)| count)
        .expect("at least one label should exist")
        .0
}

fn build_tree(x: &FeatureTable, y: &[usize], depth: usize, max_depth: Option<usize>) -> TreeNode {
    let n_samples = y.len();

    let pure = y.windows(2).all(|w| w[0] == w[1]);
    let depth_reached = max_depth.is_some_and(|max| depth >= max);
    if pure || depth_reached {
        return TreeNode::Leaf {
            class_label: majority_class(y),
            n_samples,
        };
    }

    let Some((feature_idx, threshold, _gain)) = best_split(x, y) else {
        return TreeNode::Leaf {
            class_label: majority_class(y),
            n_samples,
        };
    };

    let mut left_indices = Vec::new();
    let mut right_indices = Vec::new();
    for row in 0..n_samples {
        if x.get(row, feature_idx) <= threshold {
            left_indices.push(row);
        } else {
            right_indices.push(row);
        }
    }
    if left_indices.is_empty() || right_indices.is_empty() {
        return TreeNode::Leaf {
            class_label: majority_class(y),
            n_samples,
        };
    }

    let left_labels: Vec<usize> = left_indices.iter().map(|&i| y[i]).collect();
    let right_labels: Vec<usize> = right_indices.iter().map(|&i| y[i]).collect();
    let left_x = x.subset(&left_indices);
    let right_x = x.subset(&right_indices);

    TreeNode::Split {
        feature_idx,
        threshold,
        left: Box::new(build_tree(&left_x, &left_labels, depth + 1, max_depth)),
        right: Box::new(build_tree(&right_x, &right_labels, depth + 1, max_depth)),
    }
}

/// Decision tree classifier using the CART algorithm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    tree: Option<TreeNode>,
    max_depth: Option<usize>,
    n_features: Option<usize>,
}

impl DecisionTreeClassifier {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: None,
            max_depth: None,
            n_features: None,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Fits the tree to training data.
    ///
    /// # Errors
    ///
    /// Returns an error on empty data or a sample/label count mismatch.
    pub fn fit(&mut self, x: &FeatureTable, y: &[usize]) -> Result<()> {
        let (n_rows, n_cols) = x.shape();
        if n_rows != y.len() {
            return Err(HealthError::Computation(format!(
                "sample count mismatch: {} rows, {} labels",
                n_rows,
                y.len()
            )));
        }
        if n_rows == 0 {
            return Err(HealthError::Computation(
                "cannot fit with zero samples".to_string(),
            ));
        }

        self.n_features = Some(n_cols);
        self.tree = Some(build_tree(x, y, 0, self.max_depth));
        Ok(())
    }

    /// Predicts the class label for a single sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree is unfitted or the sample width does
    /// not match the training data.
    pub fn predict_one(&self, sample: &[f32]) -> Result<usize> {
        let tree = self
            .tree
            .as_ref()
            .ok_or(HealthError::ModelUnavailable("decision tree not fitted"))?;
        if let Some(expected) = self.n_features {
            if sample.len() != expected {
                return Err(HealthError::Computation(format!(
                    "feature length mismatch: got {}, expected {expected}",
                    sample.len()
                )));
            }
        }

        let mut node = tree;
        loop {
            match node {
                TreeNode::Leaf { class_label, .. } => return Ok(*class_label),
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                } => {
                    node = if sample[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }
}

impl Default for DecisionTreeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Random forest classifier: decision trees over bootstrap samples with
/// vote-share probabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    trees: Vec<DecisionTreeClassifier>,
    n_estimators: usize,
    max_depth: Option<usize>,
    random_state: Option<u64>,
    n_classes: usize,
    n_features: Option<usize>,
}

impl RandomForestClassifier {
    #[must_use]
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            random_state: None,
            n_classes: 2,
            n_features: None,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Sets the random state for reproducible bootstrap sampling.
    #[must_use]
    pub fn with_random_state(mut self, random_state: u64) -> Self {
        self.random_state = Some(random_state);
        self
    }

    #[must_use]
    pub fn is_fitted(&self) -> bool {
        !self.trees.is_empty()
    }

    /// Fits the forest, training each tree on its own bootstrap sample.
    ///
    /// # Errors
    ///
    /// Returns an error on empty or mismatched training data.
    pub fn fit(&mut self, x: &FeatureTable, y: &[usize]) -> Result<()> {
        let (n_samples, n_features) = x.shape();
        if n_samples != y.len() {
            return Err(HealthError::Computation(format!(
                "sample count mismatch: {} rows, {} labels",
                n_samples,
                y.len()
            )));
        }
        if n_samples == 0 {
            return Err(HealthError::Computation(
                "cannot fit with zero samples".to_string(),
            ));
        }

        self.n_classes = y.iter().max().copied().unwrap_or(0) + 1;
        self.n_features = Some(n_features);
        self.trees = Vec::with_capacity(self.n_estimators);

        for i in 0..self.n_estimators {
            // Each tree gets its own deterministic stream off the base seed.
            let seed = self.random_state.map(|s| s + i as u64);
            let indices = bootstrap_sample(n_samples, seed);

            let bootstrap_x = x.subset(&indices);
            let bootstrap_y: Vec<usize> = indices.iter().map(|&idx| y[idx]).collect();

            let mut tree = match self.max_depth {
                Some(depth) => DecisionTreeClassifier::new().with_max_depth(depth),
                None => DecisionTreeClassifier::new(),
            };
            tree.fit(&bootstrap_x, &bootstrap_y)?;
            self.trees.push(tree);
        }

        Ok(())
    }

    /// Majority-vote class prediction for a single sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest is unfitted or the sample width is
    /// wrong.
    pub fn predict_one(&self, sample: &[f32]) -> Result<usize> {
        let proba = self.predict_proba_one(sample)?;
        let best = proba
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).expect("vote shares are finite"))
            .map(|(class, _)| class)
            .unwrap_or(0);
        Ok(best)
    }

    /// Per-class vote shares for a single sample. Shares sum to 1.
    ///
    /// # Errors
    ///
    /// Returns an error if the forest is unfitted or the sample width is
    /// wrong.
    pub fn predict_proba_one(&self, sample: &[f32]) -> Result<Vec<f32>> {
        if self.trees.is_empty() {
            return Err(HealthError::ModelUnavailable("random forest not fitted"));
        }
        if let Some(expected) = self.n_features {
            if sample.len() != expected {
                return Err(HealthError::Computation(format!(
                    "feature length mismatch: got {}, expected {expected}",
                    sample.len()
                )));
            }
        }

        let mut votes = vec![0usize; self.n_classes];
        for tree in &self.trees {
            let class = tree.predict_one(sample)?;
            if class < self.n_classes {
                votes[class] += 1;
            }
        }

        let n_trees = self.trees.len() as f32;
        Ok(votes.iter().map(|&v| v as f32 / n_trees).collect())
    }

    /// Probability of the positive (failure) class for one sample.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::predict_proba_one`].
    pub fn fail_probability(&self, sample: &[f32]) -> Result<f32> {
        let proba = self.predict_proba_one(sample)?;
        Ok(proba.get(1).copied().unwrap_or(0.0))
    }

    /// Saves the fitted forest as a bincode artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the file write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| HealthError::Artifact(format!("serialization failed: {e}")))?;
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Loads a forest from a bincode artifact.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or does not deserialize.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = fs::read(path)?;
        bincode::deserialize(&bytes)
            .map_err(|e| HealthError::Artifact(format!("deserialization failed: {e}")))
    }
}

fn bootstrap_sample(n_samples: usize, random_state: Option<u64>) -> Vec<usize> {
    use rand::distributions::{Distribution, Uniform};
    use rand::SeedableRng;

    let dist = Uniform::from(0..n_samples);
    let mut indices = Vec::with_capacity(n_samples);

    if let Some(seed) = random_state {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        for _ in 0..n_samples {
            indices.push(dist.sample(&mut rng));
        }
    } else {
        let mut rng = rand::thread_rng();
        for _ in 0..n_samples {
            indices.push(dist.sample(&mut rng));
        }
    }

    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two well-separated blobs: class 0 near the origin, class 1 far out.
    fn blob_data() -> (FeatureTable, Vec<usize>) {
        let mut x = FeatureTable::new(2);
        let mut y = Vec::new();
        for i in 0..10 {
            let offset = i as f32 * 0.1;
            x.push_row(&[offset, offset + 0.05]).unwrap();
            y.push(0);
            x.push_row(&[10.0 + offset, 10.0 - offset]).unwrap();
            y.push(1);
        }
        (x, y)
    }

    #[test]
    fn gini_is_zero_for_pure_and_half_for_even_split() {
        assert_eq!(gini_impurity(&[1, 1, 1, 1]), 0.0);
        assert!((gini_impurity(&[0, 0, 1, 1]) - 0.5).abs() < 1e-6);
        assert_eq!(gini_impurity(&[]), 0.0);
    }

    #[test]
    fn majority_class_breaks_ties_low() {
        assert_eq!(majority_class(&[0, 1, 1, 0]), 0);
        assert_eq!(majority_class(&[1, 1, 0]), 1);
    }

    #[test]
    fn tree_separates_blobs() {
        let (x, y) = blob_data();
        let mut tree = DecisionTreeClassifier::new();
        tree.fit(&x, &y).unwrap();

        assert_eq!(tree.predict_one(&[0.2, 0.3]).unwrap(), 0);
        assert_eq!(tree.predict_one(&[10.5, 9.8]).unwrap(), 1);
    }

    #[test]
    fn unfitted_tree_is_an_error() {
        let tree = DecisionTreeClassifier::new();
        assert!(matches!(
            tree.predict_one(&[0.0, 0.0]),
            Err(HealthError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn forest_probabilities_are_vote_shares() {
        let (x, y) = blob_data();
        let mut forest = RandomForestClassifier::new(15).with_random_state(42);
        forest.fit(&x, &y).unwrap();

        let proba = forest.predict_proba_one(&[0.2, 0.3]).unwrap();
        assert_eq!(proba.len(), 2);
        let total: f32 = proba.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(proba[0] > 0.9, "healthy blob should vote class 0: {proba:?}");

        let fail = forest.fail_probability(&[10.5, 9.8]).unwrap();
        assert!(fail > 0.9, "failing blob should vote class 1: {fail}");
    }

    #[test]
    fn seeded_forests_are_reproducible() {
        let (x, y) = blob_data();
        let sample = [5.2, 4.9];

        let mut a = RandomForestClassifier::new(10).with_random_state(7);
        a.fit(&x, &y).unwrap();
        let mut b = RandomForestClassifier::new(10).with_random_state(7);
        b.fit(&x, &y).unwrap();

        assert_eq!(
            a.fail_probability(&sample).unwrap(),
            b.fail_probability(&sample).unwrap()
        );
    }

    #[test]
    fn unfitted_forest_is_an_error() {
        let forest = RandomForestClassifier::new(5);
        assert!(matches!(
            forest.fail_probability(&[0.0, 0.0]),
            Err(HealthError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn wrong_feature_width_is_an_error() {
        let (x, y) = blob_data();
        let mut forest = RandomForestClassifier::new(3).with_random_state(1);
        forest.fit(&x, &y).unwrap();

        assert!(matches!(
            forest.fail_probability(&[1.0, 2.0, 3.0]),
            Err(HealthError::Computation(_))
        ));
    }

    #[test]
    fn forest_survives_save_and_load() {
        let (x, y) = blob_data();
        let mut forest = RandomForestClassifier::new(5).with_random_state(3);
        forest.fit(&x, &y).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.bin");
        forest.save(&path).unwrap();

        let loaded = RandomForestClassifier::load(&path).unwrap();
        assert_eq!(
            forest.fail_probability(&[0.2, 0.3]).unwrap(),
            loaded.fail_probability(&[0.2, 0.3]).unwrap()
        );
    }

    #[test]
    fn load_missing_artifact_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(RandomForestClassifier::load(dir.path().join("nope.bin")).is_err());
    }

    #[test]
    fn max_depth_one_still_predicts() {
        let (x, y) = blob_data();
        let mut forest = RandomForestClassifier::new(5)
            .with_max_depth(1)
            .with_random_state(11);
        forest.fit(&x, &y).unwrap();
        assert_eq!(forest.predict_one(&[0.0, 0.0]).unwrap(), 0);
    }
}
