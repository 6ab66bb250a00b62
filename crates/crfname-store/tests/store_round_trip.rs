use crfname_core::corpus::CorpusParser;
use crfname_core::{CrfNameError, ModelRegistry};
use crfname_store::{decode_cached, load_into_registry, ModelStore, StoreError};
use crfname_trainer::TrainingOrchestrator;

const CORPUS: &str = "\
<Name><GivenName>Jane</GivenName> <Surname>Doe</Surname></Name>
<Name><PrefixMarital>Mr.</PrefixMarital> <GivenName>John</GivenName> <Surname>Smith</Surname></Name>
<Name><GivenName>Mary</GivenName> <MiddleInitial>K.</MiddleInitial> <Surname>Jones</Surname></Name>
<Name><PrefixOther>Dr.</PrefixOther> <GivenName>Alan</GivenName> <Surname>Turing</Surname></Name>";

const COMPANIES: &str = "\
<Name><CorporationName>Acme</CorporationName> <CorporationLegalType>Inc.</CorporationLegalType></Name>
<Name><CorporationName>Globex</CorporationName> <CorporationLegalType>Corp.</CorporationLegalType></Name>
<Name><CorporationName>Initech</CorporationName> <CorporationLegalType>LLC</CorporationLegalType></Name>";

fn blob_for(corpus: &str) -> Vec<u8> {
    let corpus = CorpusParser::new().unwrap().parse(corpus).unwrap();
    TrainingOrchestrator::default().train(&corpus).unwrap().blob
}

fn trained_blob() -> Vec<u8> {
    blob_for(CORPUS)
}

#[test]
fn stored_model_decodes_and_caches() {
    let store = ModelStore::open_in_memory().unwrap();
    store.save_model("person-2026", "2026.1", &trained_blob()).unwrap();
    store.activate("person-2026").unwrap();

    let registry = ModelRegistry::new();
    let model = load_into_registry(&store, &registry, "person", None).unwrap();
    assert_eq!(model.version(), "2026.1");

    let first = decode_cached(&store, &registry, "person", "Jane Smith").unwrap();
    assert_eq!(first.rows(), vec![("Jane", "GivenName"), ("Smith", "Surname")]);

    let cached = store
        .cached_result("Jane Smith", "person", crfname_store::DEFAULT_CACHE_MAX_AGE)
        .unwrap()
        .unwrap();
    assert_eq!(cached.rows(), first.rows());
    assert_eq!(cached.model_version, "2026.1");

    let second = decode_cached(&store, &registry, "person", "Jane Smith").unwrap();
    assert_eq!(second.rows(), first.rows());
}

#[test]
fn version_change_bypasses_cache() {
    let store = ModelStore::open_in_memory().unwrap();
    let blob = trained_blob();
    store.save_model("person", "v1", &blob).unwrap();

    let registry = ModelRegistry::new();
    load_into_registry(&store, &registry, "person", Some("person")).unwrap();
    decode_cached(&store, &registry, "person", "Mary Jones").unwrap();

    store.save_model("person", "v2", &blob).unwrap();
    load_into_registry(&store, &registry, "person", Some("person")).unwrap();
    let result = decode_cached(&store, &registry, "person", "Mary Jones").unwrap();
    assert_eq!(result.model_version, "v2");
}

#[test]
fn missing_and_broken_models() {
    let store = ModelStore::open_in_memory().unwrap();
    let registry = ModelRegistry::new();

    assert!(matches!(
        load_into_registry(&store, &registry, "person", None),
        Err(StoreError::NoActiveModel)
    ));
    assert!(matches!(
        load_into_registry(&store, &registry, "person", Some("nope")),
        Err(StoreError::ModelNotFound(_))
    ));

    store.save_model("broken", "v1", b"not a model").unwrap();
    assert!(matches!(
        load_into_registry(&store, &registry, "person", Some("broken")),
        Err(StoreError::Core(CrfNameError::ModelLoadFailed(_)))
    ));
    assert!(registry.is_empty());
}

#[test]
fn slots_sharing_a_version_keep_separate_cache_entries() {
    let store = ModelStore::open_in_memory().unwrap();
    store.save_model("person", "1.0", &trained_blob()).unwrap();
    store.save_model("company", "1.0", &blob_for(COMPANIES)).unwrap();

    let registry = ModelRegistry::new();
    load_into_registry(&store, &registry, "person", Some("person")).unwrap();
    load_into_registry(&store, &registry, "company", Some("company")).unwrap();

    let person = decode_cached(&store, &registry, "person", "Acme Widgets").unwrap();
    let company = decode_cached(&store, &registry, "company", "Acme Widgets").unwrap();

    assert_eq!(company.rows(), registry.decode("company", "Acme Widgets").unwrap().rows());
    assert!(company
        .rows()
        .iter()
        .all(|(_, label)| label.starts_with("Corporation")));
    assert!(person
        .rows()
        .iter()
        .all(|(_, label)| !label.starts_with("Corporation")));
}

#[test]
fn unversioned_models_are_not_cached() {
    let store = ModelStore::open_in_memory().unwrap();
    let registry = ModelRegistry::new();
    registry.load("person", trained_blob()).unwrap();

    let result = decode_cached(&store, &registry, "person", "Jane Smith").unwrap();
    assert_eq!(result.len(), 2);
    assert!(store
        .cached_result("Jane Smith", "person", crfname_store::DEFAULT_CACHE_MAX_AGE)
        .unwrap()
        .is_none());

    assert!(matches!(
        decode_cached(&store, &registry, "company", "Jane Smith"),
        Err(StoreError::Core(CrfNameError::ModelNotLoaded(_)))
    ));
}
