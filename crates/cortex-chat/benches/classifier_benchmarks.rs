//! Benchmarks for intent classification and the local sentence summarizer.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cortex_chat::{IntentClassifier, KeywordClassifier, SentenceSummarizer};

const QUERIES: &[&str] = &[
    "What is BayREN?",
    "what is codes and standards program",
    "Give me all 6 programs names",
    "Show total energy savings by county.",
    "how many active projects are there in multi family program",
    "generate a description of the BayREN program",
    "summarize the heat pump rebate rules",
];

fn bench_classify(c: &mut Criterion) {
    let classifier = KeywordClassifier::new();

    let mut group = c.benchmark_group("classify");
    group.bench_function("sample_questions", |b| {
        b.iter(|| {
            for q in QUERIES {
                black_box(classifier.classify(q));
            }
        })
    });
    // Worst case: nothing matches, every rule is tried.
    let long_fallback = "tell me about the regional network and its members ".repeat(30);
    group.bench_function("fallback_long_query", |b| {
        b.iter(|| classifier.classify(black_box(&long_fallback)))
    });
    group.finish();
}

fn bench_local_summary(c: &mut Criterion) {
    let summarizer = SentenceSummarizer::default();
    let text = (0..200)
        .map(|i| format!("Program {} reduced household energy use by {} percent.", i, i % 40))
        .collect::<Vec<_>>()
        .join(" ");

    c.bench_function("local_summary_200_sentences", |b| {
        b.iter(|| summarizer.summarize(black_box(&text)))
    });
}

criterion_group!(benches, bench_classify, bench_local_summary);
criterion_main!(benches);
