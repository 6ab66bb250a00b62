//! # Viterbi Decoding for CRF
//!
//! Finds the highest-scoring label path given per-position state scores and
//! a label-to-label transition matrix.

use crate::error::{CrfNameError, Result};

/// Viterbi decoder for linear-chain label sequences.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    num_labels: usize,
}

impl ViterbiDecoder {
    /// Create a new Viterbi decoder.
    ///
    /// # Arguments
    /// * `num_labels` - Number of distinct labels
    pub fn new(num_labels: usize) -> Self {
        Self { num_labels }
    }

    /// Decode the optimal label sequence.
    ///
    /// # Arguments
    /// * `state_scores` - Matrix of shape [seq_len, num_labels]
    /// * `transitions` - Matrix of shape [num_labels, num_labels], `[prev][curr]`
    ///
    /// # Returns
    /// The optimal label path as indices, and its unnormalized score.
    pub fn decode(
        &self,
        state_scores: &[Vec<f64>],
        transitions: &[Vec<f64>],
    ) -> Result<(Vec<usize>, f64)> {
        let seq_len = state_scores.len();
        if seq_len == 0 {
            return Ok((Vec::new(), 0.0));
        }
        if self.num_labels == 0 {
            return Err(CrfNameError::Prediction("model has no labels".into()));
        }

        if let Some(row) = state_scores.iter().find(|row| row.len() != self.num_labels) {
            return Err(CrfNameError::Prediction(format!(
                "state score dimension mismatch: expected {}, got {}",
                self.num_labels,
                row.len()
            )));
        }
        if transitions.len() != self.num_labels
            || transitions.iter().any(|row| row.len() != self.num_labels)
        {
            return Err(CrfNameError::Prediction(format!(
                "transition matrix must be {0}x{0}",
                self.num_labels
            )));
        }

        // DP table
        let mut dp: Vec<Vec<f64>> = vec![vec![f64::NEG_INFINITY; self.num_labels]; seq_len];
        let mut backptr: Vec<Vec<usize>> = vec![vec![0; self.num_labels]; seq_len];

        dp[0].copy_from_slice(&state_scores[0]);

        for pos in 1..seq_len {
            for curr in 0..self.num_labels {
                let mut best_score = f64::NEG_INFINITY;
                let mut best_prev = 0;

                for prev in 0..self.num_labels {
                    let score = dp[pos - 1][prev] + transitions[prev][curr];
                    if score > best_score {
                        best_score = score;
                        best_prev = prev;
                    }
                }

                dp[pos][curr] = best_score + state_scores[pos][curr];
                backptr[pos][curr] = best_prev;
            }
        }

        // Best final label; ties go to the lowest id
        let mut best_final = 0;
        for label in 1..self.num_labels {
            if dp[seq_len - 1][label] > dp[seq_len - 1][best_final] {
                best_final = label;
            }
        }
        let best_score = dp[seq_len - 1][best_final];

        let mut path = vec![best_final];
        let mut curr = best_final;
        for pos in (1..seq_len).rev() {
            curr = backptr[pos][curr];
            path.push(curr);
        }

        path.reverse();
        Ok((path, best_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viterbi_follows_state_scores() {
        let decoder = ViterbiDecoder::new(2);
        let transitions = vec![vec![0.0; 2]; 2];
        let states = vec![vec![1.0, 0.0], vec![0.0, 2.0], vec![3.0, 0.0]];

        let (path, score) = decoder.decode(&states, &transitions).unwrap();
        assert_eq!(path, vec![0, 1, 0]);
        assert_eq!(score, 6.0);
    }

    #[test]
    fn test_viterbi_transitions_override_weak_states() {
        let decoder = ViterbiDecoder::new(2);
        // staying on label 0 is heavily rewarded
        let transitions = vec![vec![5.0, -5.0], vec![-5.0, 0.0]];
        let states = vec![vec![1.0, 0.0], vec![0.0, 1.0]];

        let (path, score) = decoder.decode(&states, &transitions).unwrap();
        assert_eq!(path, vec![0, 0]);
        assert_eq!(score, 6.0);
    }

    #[test]
    fn test_viterbi_empty() {
        let decoder = ViterbiDecoder::new(3);
        let (path, _) = decoder.decode(&[], &vec![vec![0.0; 3]; 3]).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn test_viterbi_dimension_mismatch() {
        let decoder = ViterbiDecoder::new(3);
        let transitions = vec![vec![0.0; 3]; 3];
        assert!(decoder.decode(&[vec![0.0; 2]], &transitions).is_err());
        assert!(decoder.decode(&[vec![0.0; 3]], &[vec![0.0; 3]]).is_err());
    }
}
