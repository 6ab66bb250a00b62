use crate::crf::lattice::Lattice;
use crate::crf::model::CrfParameters;
use crate::crf::viterbi::ViterbiDecoder;
use crate::error::{CrfNameError, Result};
use crate::model::{Tagger, Tagging};
use crate::parser::instance::Instance;

/// Viterbi tagger over [`CrfParameters`]. The score is the probability of
/// the returned path under the model.
#[derive(Debug, Clone)]
pub struct CrfTagger {
    parameters: CrfParameters,
    decoder: ViterbiDecoder,
}

impl CrfTagger {
    pub fn new(parameters: CrfParameters) -> Self {
        let decoder = ViterbiDecoder::new(parameters.num_labels());
        Self {
            parameters,
            decoder,
        }
    }

    pub fn parameters(&self) -> &CrfParameters {
        &self.parameters
    }
}

impl Tagger for CrfTagger {
    fn viterbi(&self, instance: &Instance) -> Result<Tagging> {
        if instance.is_empty() {
            return Ok(Tagging {
                labels: Vec::new(),
                score: 1.0,
            });
        }

        let transitions = &self.parameters.transitions;
        let states = self.parameters.state_scores(instance);
        let (path, best) = self.decoder.decode(&states, transitions)?;
        let log_z = Lattice::forward(&states, transitions).log_z;

        let score = (best - log_z).exp();
        if !score.is_finite() {
            return Err(CrfNameError::Prediction(format!(
                "sequence score is not finite (path {best}, log Z {log_z})"
            )));
        }

        Ok(Tagging {
            labels: path.into_iter().map(|label| label as u32).collect(),
            score: score.min(1.0),
        })
    }
}
