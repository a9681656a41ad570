//! TF-IDF vector space and dense pairwise cosine similarity.
//!
//! Fitting is the expensive step (quadratic in catalog size) and happens once
//! per snapshot. The fitted model is immutable; a refit builds a new one.

use crate::errors::{Result, ScoutError};
use crate::text::tokenize;
use std::collections::{BTreeSet, HashMap};
use std::time::Instant;
use tracing::info;

/// Sparse L2-normalized document vector, sorted by term index.
type SparseVec = Vec<(usize, f32)>;

#[derive(Debug, Clone)]
pub struct SimilarityModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    n_rows: usize,
    /// Row-major `n_rows * n_rows`.
    matrix: Vec<f32>,
    zero_rows: Vec<bool>,
}

impl SimilarityModel {
    /// Fit term weights over `features` and compute the similarity matrix.
    ///
    /// Term frequency is the raw count, idf is smoothed as
    /// `ln((1 + n) / (1 + df)) + 1`, and every row is L2-normalized so the
    /// dot product of two rows is their cosine similarity.
    pub fn fit<S: AsRef<str>>(features: &[S]) -> Result<Self> {
        if features.is_empty() {
            return Err(ScoutError::EmptyCorpus);
        }
        let started = Instant::now();
        let n = features.len();

        let tokenized: Vec<Vec<String>> = features.iter().map(|f| tokenize(f.as_ref())).collect();

        let terms: BTreeSet<&str> = tokenized
            .iter()
            .flat_map(|tokens| tokens.iter().map(String::as_str))
            .collect();
        let vocabulary: HashMap<String, usize> = terms
            .into_iter()
            .enumerate()
            .map(|(idx, term)| (term.to_string(), idx))
            .collect();

        let mut doc_freq = vec![0usize; vocabulary.len()];
        let counts: Vec<HashMap<usize, f32>> = tokenized
            .iter()
            .map(|tokens| {
                let mut tf: HashMap<usize, f32> = HashMap::new();
                for token in tokens {
                    *tf.entry(vocabulary[token.as_str()]).or_insert(0.0) += 1.0;
                }
                for &term in tf.keys() {
                    doc_freq[term] += 1;
                }
                tf
            })
            .collect();

        let idf: Vec<f32> = doc_freq
            .iter()
            .map(|&df| ((1.0 + n as f64) / (1.0 + df as f64)).ln() as f32 + 1.0)
            .collect();

        let vectors: Vec<SparseVec> = counts
            .into_iter()
            .map(|tf| {
                let mut vector: SparseVec =
                    tf.into_iter().map(|(term, count)| (term, count * idf[term])).collect();
                vector.sort_by_key(|&(term, _)| term);
                let norm = vector.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
                if norm > 0.0 {
                    for (_, w) in vector.iter_mut() {
                        *w /= norm;
                    }
                }
                vector
            })
            .collect();

        let zero_rows: Vec<bool> = vectors.iter().map(|v| v.is_empty()).collect();
        let matrix = pairwise_cosine(&vectors, vocabulary.len());

        info!(
            rows = n,
            vocabulary = vocabulary.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "similarity model fitted"
        );

        Ok(Self {
            vocabulary,
            idf,
            n_rows: n,
            matrix,
            zero_rows,
        })
    }

    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Fitted idf weight of `term`, if it is in the vocabulary.
    pub fn idf(&self, term: &str) -> Option<f32> {
        self.vocabulary.get(term).map(|&idx| self.idf[idx])
    }

    /// Similarity between rows `i` and `j`. Panics if either is out of range.
    pub fn similarity(&self, i: usize, j: usize) -> f32 {
        self.matrix[i * self.n_rows + j]
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.matrix[i * self.n_rows..(i + 1) * self.n_rows]
    }

    /// True when the row's feature produced no vocabulary terms.
    pub fn is_zero_row(&self, i: usize) -> bool {
        self.zero_rows[i]
    }
}

/// Dense cosine matrix via an inverted index. Only the upper triangle is
/// accumulated; it is mirrored so the result is exactly symmetric.
fn pairwise_cosine(vectors: &[SparseVec], vocab_size: usize) -> Vec<f32> {
    let n = vectors.len();
    let mut postings: Vec<Vec<(usize, f32)>> = vec![Vec::new(); vocab_size];
    for (row, vector) in vectors.iter().enumerate() {
        for &(term, w) in vector {
            postings[term].push((row, w));
        }
    }

    let mut matrix = vec![0.0f32; n * n];
    let mut acc = vec![0.0f32; n];
    for (i, vector) in vectors.iter().enumerate() {
        acc[i..].iter_mut().for_each(|v| *v = 0.0);
        for &(term, wi) in vector {
            let list = &postings[term];
            let start = list.partition_point(|&(row, _)| row < i);
            for &(j, wj) in &list[start..] {
                acc[j] += wi * wj;
            }
        }

        matrix[i * n + i] = if vector.is_empty() { 0.0 } else { 1.0 };
        for j in (i + 1)..n {
            let value = acc[j].clamp(0.0, 1.0);
            matrix[i * n + j] = value;
            matrix[j * n + i] = value;
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_corpus_fails() {
        let features: Vec<String> = Vec::new();
        assert!(matches!(
            SimilarityModel::fit(&features),
            Err(ScoutError::EmptyCorpus)
        ));
    }

    #[test]
    fn test_matrix_shape_and_diagonal() {
        let model = SimilarityModel::fit(&[
            "RPG dragons swords",
            "RPG dragons magic",
            "Puzzle tiles blocks",
            "",
        ])
        .unwrap();

        assert_eq!(model.len(), 4);
        for i in 0..3 {
            assert!((model.similarity(i, i) - 1.0).abs() < 1e-6);
        }
        assert!(model.is_zero_row(3));
        assert_eq!(model.similarity(3, 3), 0.0);
        assert_eq!(model.similarity(3, 0), 0.0);
        assert!(model.similarity(0, 1) > model.similarity(0, 2));
        assert_eq!(model.similarity(0, 2), 0.0);
    }

    #[test]
    fn test_smoothed_idf() {
        let model = SimilarityModel::fit(&["alpha beta", "alpha gamma"]).unwrap();
        // df(alpha) = 2 of 3 smoothed docs, df(beta) = 1
        assert!((model.idf("alpha").unwrap() - 1.0).abs() < 1e-6);
        let expected = (3.0f32 / 2.0).ln() + 1.0;
        assert!((model.idf("beta").unwrap() - expected).abs() < 1e-6);
        assert_eq!(model.idf("the"), None);
    }

    #[test]
    fn test_stop_words_only_feature_is_zero_row() {
        let model = SimilarityModel::fit(&["the and of", "rogue lite"]).unwrap();
        assert!(model.is_zero_row(0));
        assert!(!model.is_zero_row(1));
        assert_eq!(model.vocabulary_size(), 2);
    }
}
