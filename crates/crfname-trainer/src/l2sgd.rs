//! L2-regularized stochastic gradient descent for the linear-chain CRF.
//!
//! Minimizes `-sum(log P(y|x)) + c2 * ||w||^2` one instance at a time. The
//! per-instance L2 decay is folded into a single scale factor so an update
//! only touches the weights of the attributes present in that instance.

use crfname_core::crf::{path_score, CrfModel, CrfParameters, Lattice};
use crfname_core::error::{CrfNameError, Result};
use crfname_core::parser::Instance;
use crfname_core::train::{Trainer, TrainingConfig, TrainingData};
use oorandom::Rand32;

/// Rescale stored weights once the decay factor drops below this.
const MIN_SCALE: f64 = 1e-9;

/// SGD trainer producing [`CrfModel`] blobs.
#[derive(Debug, Clone)]
pub struct L2SgdTrainer {
    learning_rate: f64,
}

impl Default for L2SgdTrainer {
    fn default() -> Self {
        Self { learning_rate: 0.1 }
    }
}

impl L2SgdTrainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initial learning rate; decays as `eta0 / (1 + lambda * eta0 * t)`.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }
}

impl Trainer for L2SgdTrainer {
    fn train(
        &self,
        data: &TrainingData,
        config: &TrainingConfig,
        log: &mut dyn FnMut(&str),
    ) -> Result<Vec<u8>> {
        config.validate()?;
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(CrfNameError::InvalidConfig(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if data.instances.is_empty() {
            return Err(CrfNameError::Training("no training instances".into()));
        }
        check_instances(data)?;

        let num_labels = data.labels.len();
        let mut weights = Weights::new(data.attributes.len(), num_labels);
        let lambda = 2.0 * config.c2 / data.instances.len() as f64;

        log(&format!(
            "L2-regularized SGD: {} instances, {} labels, {} attributes, c2={}",
            data.instances.len(),
            num_labels,
            data.attributes.len(),
            config.c2
        ));

        let mut order: Vec<usize> = (0..data.instances.len()).collect();
        let mut rng = Rand32::new(config.seed);
        let mut step = 0usize;
        let mut previous: Option<f64> = None;

        for epoch in 1..=config.max_iterations {
            shuffle(&mut order, &mut rng);

            let mut loss = 0.0;
            let mut eta = self.learning_rate;
            for &index in &order {
                eta = self.learning_rate / (1.0 + lambda * self.learning_rate * step as f64);
                if lambda > 0.0 {
                    eta = eta.min(0.5 / lambda);
                }
                step += 1;
                loss += weights.update(&data.instances[index], eta, lambda);
            }

            let objective = loss + config.c2 * weights.squared_norm();
            if !objective.is_finite() {
                return Err(CrfNameError::Training(format!(
                    "objective diverged at epoch {epoch}"
                )));
            }

            let improvement = previous.map(|prev| (prev - objective) / objective.max(f64::MIN_POSITIVE));
            log(&format!(
                "Epoch {epoch}: loss={objective:.6}, improvement={}, learning rate={eta:.6}",
                improvement.map_or_else(|| "n/a".to_string(), |i| format!("{i:.6}"))
            ));

            if improvement.is_some_and(|i| i < config.epsilon) {
                log(&format!("Converged after {epoch} epochs"));
                break;
            }
            previous = Some(objective);
        }

        let (state, transitions) = weights.export();
        let parameters = CrfParameters::from_dense(num_labels, &state, &transitions);
        let active: usize = parameters.state.iter().map(Vec::len).sum();
        log(&format!("Active state features: {active}"));

        CrfModel::new(
            data.labels.clone(),
            data.attributes.clone(),
            data.feature_config,
            parameters,
        )
        .to_bytes()
    }
}

fn check_instances(data: &TrainingData) -> Result<()> {
    let num_labels = data.labels.len() as u32;
    let num_attributes = data.attributes.len() as u32;

    for (i, instance) in data.instances.iter().enumerate() {
        if instance.is_empty() || instance.items.len() != instance.labels.len() {
            return Err(CrfNameError::Training(format!(
                "instance {i} has {} items and {} labels",
                instance.items.len(),
                instance.labels.len()
            )));
        }
        if instance.labels.iter().any(|&label| label >= num_labels) {
            return Err(CrfNameError::Training(format!(
                "instance {i} uses a label outside the dictionary"
            )));
        }
        let bad_attribute = instance
            .items
            .iter()
            .flat_map(|item| &item.attributes)
            .any(|attr| attr.id >= num_attributes || !attr.weight.is_finite());
        if bad_attribute {
            return Err(CrfNameError::Training(format!(
                "instance {i} uses an attribute outside the dictionary"
            )));
        }
    }
    Ok(())
}

fn shuffle(order: &mut [usize], rng: &mut Rand32) {
    for i in (1..order.len()).rev() {
        let j = rng.rand_range(0..(i as u32 + 1)) as usize;
        order.swap(i, j);
    }
}

/// Dense weights stored divided by `scale`.
struct Weights {
    num_labels: usize,
    state: Vec<f64>,
    transitions: Vec<f64>,
    scale: f64,
}

impl Weights {
    fn new(num_attributes: usize, num_labels: usize) -> Self {
        Self {
            num_labels,
            state: vec![0.0; num_attributes * num_labels],
            transitions: vec![0.0; num_labels * num_labels],
            scale: 1.0,
        }
    }

    /// One SGD step on `instance`. Returns its negative log-likelihood under
    /// the weights before the gradient step.
    fn update(&mut self, instance: &Instance, eta: f64, lambda: f64) -> f64 {
        self.scale *= 1.0 - eta * lambda;
        if self.scale < MIN_SCALE {
            self.rescale();
        }

        let l = self.num_labels;
        let transitions = self.transition_matrix();
        let states: Vec<Vec<f64>> = instance
            .items
            .iter()
            .map(|item| {
                let mut scores = vec![0.0; l];
                for attr in &item.attributes {
                    let row = &self.state[attr.id as usize * l..(attr.id as usize + 1) * l];
                    for (score, w) in scores.iter_mut().zip(row) {
                        *score += self.scale * w * attr.weight;
                    }
                }
                scores
            })
            .collect();

        let gold: Vec<usize> = instance.labels.iter().map(|&y| y as usize).collect();
        let lattice = Lattice::forward_backward(&states, &transitions);
        let nll = lattice.log_z - path_score(&states, &transitions, &gold);

        // gradient of the log-likelihood, in stored units
        let gain = eta / self.scale;
        for (t, item) in instance.items.iter().enumerate() {
            let marginals: Vec<f64> = (0..l).map(|y| lattice.state_marginal(t, y)).collect();
            for attr in &item.attributes {
                let base = attr.id as usize * l;
                self.state[base + gold[t]] += gain * attr.weight;
                for (y, p) in marginals.iter().enumerate() {
                    self.state[base + y] -= gain * attr.weight * p;
                }
            }
        }
        for t in 1..gold.len() {
            self.transitions[gold[t - 1] * l + gold[t]] += gain;
            for prev in 0..l {
                for curr in 0..l {
                    let p = lattice.transition_marginal(&states, &transitions, t, prev, curr);
                    self.transitions[prev * l + curr] -= gain * p;
                }
            }
        }

        nll
    }

    fn transition_matrix(&self) -> Vec<Vec<f64>> {
        self.transitions
            .chunks(self.num_labels.max(1))
            .map(|row| row.iter().map(|w| w * self.scale).collect())
            .collect()
    }

    fn rescale(&mut self) {
        for w in self.state.iter_mut().chain(self.transitions.iter_mut()) {
            *w *= self.scale;
        }
        self.scale = 1.0;
    }

    fn squared_norm(&self) -> f64 {
        let stored: f64 = self
            .state
            .iter()
            .chain(&self.transitions)
            .map(|w| w * w)
            .sum();
        stored * self.scale * self.scale
    }

    fn export(mut self) -> (Vec<f64>, Vec<f64>) {
        self.rescale();
        (self.state, self.transitions)
    }
}
