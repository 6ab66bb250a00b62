use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crfname_core::corpus::{LabeledSequence, LabeledToken};
use crfname_core::dictionary::Dictionary;
use crfname_core::parser::{FeatureExtractor, InstanceBuilder, Tokenizer};

fn bench_pipeline(c: &mut Criterion) {
    let tokenizer = Tokenizer::new();
    let extractor = FeatureExtractor::default();
    let builder = InstanceBuilder::default();

    let inputs = vec![
        "Mr. John F. Kennedy Jr.",
        "Dr. Mary-Ann O'Brien, Esq.",
        "Acme Widget Holdings Co. Ltd.",
        "Smith, Jane Q.",
        "Bob \"Bobby\" Tables",
    ];

    c.bench_function("tokenize_single", |b| {
        b.iter(|| tokenizer.tokenize(black_box(inputs[0])));
    });

    c.bench_function("tokenize_and_extract_batch_5", |b| {
        b.iter(|| {
            for input in &inputs {
                let tokens = tokenizer.tokenize(black_box(input));
                let _ = extractor.extract_all(&tokens);
            }
        });
    });

    let sequence = LabeledSequence::new(vec![
        LabeledToken::new("John", "GivenName"),
        LabeledToken::new("F.", "MiddleInitial"),
        LabeledToken::new("Kennedy", "Surname"),
    ]);
    let mut labels = Dictionary::new();
    let mut attributes = Dictionary::new();
    builder.build_training(&sequence, &mut labels, &mut attributes);

    c.bench_function("build_inference_instance", |b| {
        b.iter(|| {
            let tokens = tokenizer.tokenize(black_box("John F. Kennedy"));
            builder.build_inference(&tokens, &attributes)
        });
    });
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
