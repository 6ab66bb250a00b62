//! Log-space forward/backward recursions over a linear-chain lattice.
//!
//! Shared by the tagger (partition function for the sequence score) and by
//! trainers (marginals for the likelihood gradient).

/// `ln(sum(exp(v)))` computed without overflow.
pub fn log_sum_exp(values: impl IntoIterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.into_iter().collect();
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Unnormalized score of one label path.
pub fn path_score(state_scores: &[Vec<f64>], transitions: &[Vec<f64>], path: &[usize]) -> f64 {
    let mut score = 0.0;
    for (pos, &label) in path.iter().enumerate() {
        score += state_scores[pos][label];
        if pos > 0 {
            score += transitions[path[pos - 1]][label];
        }
    }
    score
}

/// Forward and backward tables of one sequence.
#[derive(Debug, Clone)]
pub struct Lattice {
    /// `alpha[t][y]`: log-sum of all prefixes ending in `y` at `t`
    pub alpha: Vec<Vec<f64>>,
    /// `beta[t][y]`: log-sum of all suffixes following `y` at `t`
    pub beta: Vec<Vec<f64>>,
    /// Log partition function
    pub log_z: f64,
}

impl Lattice {
    /// Run the forward recursion only; `beta` is left empty.
    pub fn forward(state_scores: &[Vec<f64>], transitions: &[Vec<f64>]) -> Self {
        let alpha = forward_table(state_scores, transitions);
        let log_z = alpha
            .last()
            .map_or(0.0, |last| log_sum_exp(last.iter().copied()));
        Self {
            alpha,
            beta: Vec::new(),
            log_z,
        }
    }

    /// Run both recursions.
    pub fn forward_backward(state_scores: &[Vec<f64>], transitions: &[Vec<f64>]) -> Self {
        let mut lattice = Self::forward(state_scores, transitions);
        lattice.beta = backward_table(state_scores, transitions);
        lattice
    }

    /// `P(y_t = label | x)`. Requires [`Lattice::forward_backward`].
    pub fn state_marginal(&self, t: usize, label: usize) -> f64 {
        (self.alpha[t][label] + self.beta[t][label] - self.log_z).exp()
    }

    /// `P(y_{t-1} = prev, y_t = curr | x)` for `t >= 1`. Requires
    /// [`Lattice::forward_backward`].
    pub fn transition_marginal(
        &self,
        state_scores: &[Vec<f64>],
        transitions: &[Vec<f64>],
        t: usize,
        prev: usize,
        curr: usize,
    ) -> f64 {
        (self.alpha[t - 1][prev]
            + transitions[prev][curr]
            + state_scores[t][curr]
            + self.beta[t][curr]
            - self.log_z)
            .exp()
    }
}

fn forward_table(state_scores: &[Vec<f64>], transitions: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let mut alpha: Vec<Vec<f64>> = Vec::with_capacity(state_scores.len());
    for (t, states) in state_scores.iter().enumerate() {
        let row = if t == 0 {
            states.clone()
        } else {
            let prev = &alpha[t - 1];
            (0..states.len())
                .map(|curr| {
                    states[curr]
                        + log_sum_exp(
                            prev.iter()
                                .enumerate()
                                .map(|(p, score)| score + transitions[p][curr]),
                        )
                })
                .collect()
        };
        alpha.push(row);
    }
    alpha
}

fn backward_table(state_scores: &[Vec<f64>], transitions: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let len = state_scores.len();
    let mut beta: Vec<Vec<f64>> = state_scores.iter().map(|row| vec![0.0; row.len()]).collect();
    for t in (0..len.saturating_sub(1)).rev() {
        let next_states = &state_scores[t + 1];
        let row: Vec<f64> = (0..state_scores[t].len())
            .map(|prev| {
                log_sum_exp(
                    (0..next_states.len())
                        .map(|next| transitions[prev][next] + next_states[next] + beta[t + 1][next]),
                )
            })
            .collect();
        beta[t] = row;
    }
    beta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_force_log_z(states: &[Vec<f64>], transitions: &[Vec<f64>]) -> f64 {
        let labels = states[0].len();
        let len = states.len();
        let mut scores = Vec::new();
        for code in 0..labels.pow(len as u32) {
            let mut path = Vec::with_capacity(len);
            let mut rest = code;
            for _ in 0..len {
                path.push(rest % labels);
                rest /= labels;
            }
            scores.push(path_score(states, transitions, &path));
        }
        log_sum_exp(scores)
    }

    fn fixture() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
        let states = vec![vec![0.5, -0.2, 1.0], vec![0.1, 0.3, -1.0], vec![2.0, 0.0, 0.4]];
        let transitions = vec![
            vec![0.2, -0.1, 0.0],
            vec![0.7, 0.1, -0.3],
            vec![-0.5, 0.4, 0.9],
        ];
        (states, transitions)
    }

    #[test]
    fn test_log_sum_exp() {
        assert!((log_sum_exp([0.0, 0.0]) - 2f64.ln()).abs() < 1e-12);
        assert!((log_sum_exp([1000.0, 1000.0]) - (1000.0 + 2f64.ln())).abs() < 1e-9);
        assert_eq!(log_sum_exp(std::iter::empty::<f64>()), f64::NEG_INFINITY);
    }

    #[test]
    fn test_partition_matches_enumeration() {
        let (states, transitions) = fixture();
        let lattice = Lattice::forward(&states, &transitions);
        let expected = brute_force_log_z(&states, &transitions);
        assert!((lattice.log_z - expected).abs() < 1e-9);
    }

    #[test]
    fn test_state_marginals_sum_to_one() {
        let (states, transitions) = fixture();
        let lattice = Lattice::forward_backward(&states, &transitions);
        for t in 0..states.len() {
            let total: f64 = (0..3).map(|y| lattice.state_marginal(t, y)).sum();
            assert!((total - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_transition_marginals_consistent() {
        let (states, transitions) = fixture();
        let lattice = Lattice::forward_backward(&states, &transitions);
        for curr in 0..3 {
            let summed: f64 = (0..3)
                .map(|prev| lattice.transition_marginal(&states, &transitions, 1, prev, curr))
                .sum();
            assert!((summed - lattice.state_marginal(1, curr)).abs() < 1e-9);
        }
    }
}
