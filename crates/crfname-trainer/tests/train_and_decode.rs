use std::fs;
use std::path::PathBuf;
use std::process::Command;

use crfname_core::corpus::CorpusParser;
use crfname_core::registry::ModelRegistry;
use crfname_core::train::TrainingConfig;
use crfname_trainer::TrainingOrchestrator;

const CORPUS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<NameCollection>
  <Name><GivenName>Jane</GivenName> <Surname>Doe</Surname></Name>
  <Name><PrefixMarital>Mr.</PrefixMarital> <GivenName>John</GivenName> <Surname>Smith</Surname></Name>
  <Name><GivenName>Mary</GivenName> <MiddleInitial>K.</MiddleInitial> <Surname>Jones</Surname></Name>
  <Name><PrefixOther>Dr.</PrefixOther> <GivenName>Alan</GivenName> <Surname>Turing</Surname></Name>
  <Name><CorporationName>Acme</CorporationName> <CorporationLegalType>Inc.</CorporationLegalType></Name>
  <Name><CorporationName>Globex</CorporationName> <CorporationLegalType>Corp.</CorporationLegalType></Name>
  <Name><CorporationName>Initech</CorporationName> <CorporationLegalType>Ltd.</CorporationLegalType></Name>
  <Name></Name>
</NameCollection>
"#;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("crfname-it-{}-{name}", std::process::id()))
}

#[test]
fn trained_model_decodes_through_registry() {
    let corpus = CorpusParser::new().unwrap().parse(CORPUS).unwrap();
    assert_eq!(corpus.len(), 7);

    let model = TrainingOrchestrator::new(TrainingConfig::default())
        .train(&corpus)
        .unwrap();
    assert_eq!(model.instance_count, 7);

    let registry = ModelRegistry::new();
    registry
        .load_versioned("generic", "it-1", model.blob)
        .unwrap();

    let person = registry.decode("generic", "Jane Smith").unwrap();
    assert_eq!(person.rows(), vec![("Jane", "GivenName"), ("Smith", "Surname")]);
    assert!(person.overall_confidence > 0.0 && person.overall_confidence <= 1.0);
    assert_eq!(person.model_version, "it-1");

    let company = registry.decode("generic", "Globex Inc.").unwrap();
    let columns = company.to_columns();
    assert_eq!(columns.corporation_name.as_deref(), Some("Globex"));
    assert_eq!(columns.corporation_type.as_deref(), Some("Inc."));
}

#[test]
fn cli_trains_model_file() {
    let input = temp_path("cli-corpus.xml");
    let output = temp_path("cli.model");
    fs::write(&input, CORPUS).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_train"))
        .arg(&input)
        .args(["-o"])
        .arg(&output)
        .args(["--max-iter", "10"])
        .status()
        .unwrap();
    fs::remove_file(&input).unwrap();

    assert!(status.success());
    let registry = ModelRegistry::new();
    let loaded = registry.load("person", output.as_path());
    fs::remove_file(&output).unwrap();
    assert_eq!(loaded.unwrap().labels().len(), 7);
}

#[test]
fn cli_generic_requires_both_corpora() {
    let person = temp_path("cli-person.xml");
    fs::write(&person, CORPUS).unwrap();

    let out = Command::new(env!("CARGO_BIN_EXE_train"))
        .args(["-t", "generic", "-p"])
        .arg(&person)
        .args(["-o"])
        .arg(temp_path("never.model"))
        .output()
        .unwrap();
    fs::remove_file(&person).unwrap();

    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Training failed"));
}

#[test]
fn cli_rejects_bad_hyperparameters() {
    let status = Command::new(env!("CARGO_BIN_EXE_train"))
        .args(["missing.xml", "-o"])
        .arg(temp_path("bad.model"))
        .args(["--epsilon", "0"])
        .status()
        .unwrap();
    assert!(!status.success());
}
