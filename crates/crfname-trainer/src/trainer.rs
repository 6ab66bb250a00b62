//! Training orchestration: corpus → instances → trainer → model blob.

use std::fs;
use std::path::Path;

use anyhow::Context;
use crfname_core::corpus::TrainingCorpus;
use crfname_core::dictionary::Dictionary;
use crfname_core::error::CrfNameError;
use crfname_core::parser::{FeatureConfig, InstanceBuilder};
use crfname_core::train::{Trainer, TrainingConfig, TrainingData};
use tracing::{debug, info};

use crate::l2sgd::L2SgdTrainer;

/// A trained model blob plus the sizes of what went into it.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub blob: Vec<u8>,
    pub instance_count: usize,
    pub label_count: usize,
    pub attribute_count: usize,
}

/// Drives instance construction and delegates optimization to a [`Trainer`].
pub struct TrainingOrchestrator<T: Trainer = L2SgdTrainer> {
    trainer: T,
    config: TrainingConfig,
    feature_config: FeatureConfig,
}

impl TrainingOrchestrator<L2SgdTrainer> {
    pub fn new(config: TrainingConfig) -> Self {
        Self::with_trainer(L2SgdTrainer::default(), config)
    }
}

impl Default for TrainingOrchestrator<L2SgdTrainer> {
    fn default() -> Self {
        Self::new(TrainingConfig::default())
    }
}

impl<T: Trainer> TrainingOrchestrator<T> {
    pub fn with_trainer(trainer: T, config: TrainingConfig) -> Self {
        Self {
            trainer,
            config,
            feature_config: FeatureConfig::default(),
        }
    }

    pub fn with_feature_config(mut self, feature_config: FeatureConfig) -> Self {
        self.feature_config = feature_config;
        self
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Convert every sequence of `corpus` into a training instance, growing
    /// fresh label and attribute dictionaries.
    pub fn build_training_data(&self, corpus: &TrainingCorpus) -> TrainingData {
        let builder = InstanceBuilder::new(self.feature_config);
        let mut labels = Dictionary::new();
        let mut attributes = Dictionary::new();
        let mut instances = Vec::with_capacity(corpus.len());

        let total = corpus.len();
        let interval = self.config.progress_interval.max(1);
        for (i, sequence) in corpus.iter().enumerate() {
            debug!("sequence {}: {}", i + 1, sequence);
            instances.push(builder.build_training(sequence, &mut labels, &mut attributes));

            let done = i + 1;
            if done % interval == 0 || done == total {
                info!("Processed {done}/{total} sequences");
            }
        }

        TrainingData {
            instances,
            labels,
            attributes,
            feature_config: self.feature_config,
        }
    }

    /// Train one model from `corpus`.
    pub fn train(&self, corpus: &TrainingCorpus) -> anyhow::Result<TrainedModel> {
        self.config.validate()?;
        if corpus.is_empty() {
            return Err(CrfNameError::Training("training corpus has no sequences".into()).into());
        }

        info!(
            "Converting {} sequences to training instances",
            corpus.len()
        );
        let data = self.build_training_data(corpus);
        info!(
            "Training on {} instances ({} labels, {} attributes)",
            data.instance_count(),
            data.labels.len(),
            data.attributes.len()
        );

        let blob = self
            .trainer
            .train(&data, &self.config, &mut |line| info!("{line}"))
            .context("trainer failed")?;

        Ok(TrainedModel {
            blob,
            instance_count: data.instance_count(),
            label_count: data.labels.len(),
            attribute_count: data.attributes.len(),
        })
    }

    /// Train one model on the union of two corpora (person + company).
    ///
    /// One of the corpora may be empty; both empty is an error.
    pub fn train_generic(
        &self,
        person: TrainingCorpus,
        company: TrainingCorpus,
    ) -> anyhow::Result<TrainedModel> {
        if person.is_empty() && company.is_empty() {
            return Err(CrfNameError::Training(
                "both person and company corpora are empty".into(),
            )
            .into());
        }

        info!(
            "Combining {} person and {} company sequences",
            person.len(),
            company.len()
        );
        let combined = TrainingCorpus::concat(person, company);
        self.train(&combined)
    }

    /// Train from `corpus` and write the blob to `output`.
    pub fn train_to_file<P: AsRef<Path>>(
        &self,
        corpus: &TrainingCorpus,
        output: P,
    ) -> anyhow::Result<TrainedModel> {
        let model = self.train(corpus)?;
        write_model(&model, output.as_ref())?;
        Ok(model)
    }
}

/// Write a trained blob to `path`.
pub fn write_model(model: &TrainedModel, path: &Path) -> anyhow::Result<()> {
    fs::write(path, &model.blob)
        .with_context(|| format!("failed to write model to {}", path.display()))?;
    info!("Model saved to {} ({} bytes)", path.display(), model.blob.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crfname_core::corpus::CorpusParser;
    use crfname_core::crf::CrfModel;

    const PEOPLE: &str = "\
<Name><GivenName>Jane</GivenName><Surname>Doe</Surname></Name>
<Name><PrefixMarital>Mr.</PrefixMarital><GivenName>John</GivenName><Surname>Smith</Surname></Name>
<Name><GivenName>Mary</GivenName><MiddleInitial>K.</MiddleInitial><Surname>Jones</Surname></Name>";

    const COMPANIES: &str = "\
<Name><CorporationName>Acme</CorporationName><CorporationLegalType>Inc.</CorporationLegalType></Name>
<Name><CorporationName>Globex</CorporationName><CorporationLegalType>Corp.</CorporationLegalType></Name>";

    fn corpus(text: &str) -> TrainingCorpus {
        CorpusParser::new().unwrap().parse(text).unwrap()
    }

    fn orchestrator() -> TrainingOrchestrator {
        TrainingOrchestrator::new(TrainingConfig::default().with_max_iterations(5))
    }

    #[test]
    fn test_build_training_data() {
        let data = orchestrator().build_training_data(&corpus(PEOPLE));

        assert_eq!(data.instance_count(), 3);
        assert_eq!(data.labels.len(), 4);
        assert_eq!(data.labels.to_str(0), Some("GivenName"));
        assert_eq!(data.instances[1].labels.len(), 3);
    }

    #[test]
    fn test_train_reports_sizes() {
        let model = orchestrator().train(&corpus(PEOPLE)).unwrap();

        assert_eq!(model.instance_count, 3);
        assert_eq!(model.label_count, 4);
        let parsed = CrfModel::from_bytes(&model.blob).unwrap();
        assert_eq!(parsed.attributes.len(), model.attribute_count);
    }

    #[test]
    fn test_generic_instance_count_is_sum() {
        let trainer = orchestrator();
        let person = trainer.train(&corpus(PEOPLE)).unwrap();
        let company = trainer.train(&corpus(COMPANIES)).unwrap();
        let generic = trainer
            .train_generic(corpus(PEOPLE), corpus(COMPANIES))
            .unwrap();

        assert_eq!(
            generic.instance_count,
            person.instance_count + company.instance_count
        );
        assert_eq!(generic.label_count, 6);
    }

    #[test]
    fn test_generic_keeps_duplicates() {
        let generic = orchestrator()
            .train_generic(corpus(PEOPLE), corpus(PEOPLE))
            .unwrap();
        assert_eq!(generic.instance_count, 6);
    }

    #[test]
    fn test_generic_tolerates_one_empty_corpus() {
        let generic = orchestrator()
            .train_generic(corpus(PEOPLE), TrainingCorpus::default())
            .unwrap();
        assert_eq!(generic.instance_count, 3);

        let err = orchestrator()
            .train_generic(TrainingCorpus::default(), TrainingCorpus::default())
            .unwrap_err();
        assert!(err.to_string().contains("both"));
    }

    #[test]
    fn test_empty_corpus_is_error() {
        assert!(orchestrator().train(&TrainingCorpus::default()).is_err());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let trainer = TrainingOrchestrator::new(TrainingConfig::default().with_epsilon(-1.0));
        let err = trainer.train(&corpus(PEOPLE)).unwrap_err();
        assert!(err.to_string().contains("epsilon"));
    }

    #[test]
    fn test_feature_config_recorded_in_blob() {
        let config = FeatureConfig::default().with_affix(false);
        let model = orchestrator()
            .with_feature_config(config)
            .train(&corpus(PEOPLE))
            .unwrap();

        let parsed = CrfModel::from_bytes(&model.blob).unwrap();
        assert_eq!(parsed.feature_config, config);
        assert!(parsed.attributes.to_id("prefix_1:j").is_none());
    }

    #[test]
    fn test_train_to_file() {
        let path = std::env::temp_dir().join(format!("crfname-train-{}.model", std::process::id()));
        let model = orchestrator().train_to_file(&corpus(PEOPLE), &path).unwrap();
        let written = fs::read(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(written, model.blob);
    }
}
