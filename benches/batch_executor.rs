use async_trait::async_trait;
use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use genview_rs::core::{
    execute, segments_for, CostCalculator, GenerationCall, ImageGeneration, ImageModel,
    InferenceGateway, RetryPolicy, SamplingParams, SdkError, UsageMetadata, UsageRecord,
};

struct InstantModel;

#[async_trait]
impl ImageModel for InstantModel {
    fn provider_name(&self) -> &'static str {
        "bench"
    }

    fn model_id(&self) -> &str {
        "gemini-2.5-flash-image"
    }

    async fn do_generate(&self, _call: &GenerationCall) -> Result<ImageGeneration, SdkError> {
        Ok(ImageGeneration {
            image: Some(Bytes::from_static(&[0u8; 256])),
            mime_type: Some("image/png".into()),
            usage: Some(UsageMetadata {
                prompt_token_count: Some(1290),
                candidates_token_count: Some(1290),
                total_token_count: Some(2580),
                ..Default::default()
            }),
            finish_reason: Some("STOP".into()),
        })
    }
}

fn calls(n: usize) -> Vec<GenerationCall> {
    (0..n)
        .map(|i| GenerationCall::new(format!("view {i}"), Vec::new(), SamplingParams::default()))
        .collect()
}

fn bench_execute(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("tokio runtime");
    let gateway = InferenceGateway::new(
        InstantModel,
        CostCalculator::gemini_image_default(),
        RetryPolicy::default(),
    )
    .expect("bench model is priced");

    let mut group = c.benchmark_group("execute");
    for per_view in [1usize, 8, 64] {
        let segments = segments_for(&["front", "back", "side"], per_view);
        group.bench_with_input(
            BenchmarkId::from_parameter(per_view * 3),
            &per_view,
            |b, &per_view| {
                b.to_async(&rt).iter(|| async {
                    let result = execute(&gateway, calls(per_view * 3), &segments, 4)
                        .await
                        .expect("valid batch");
                    black_box(result)
                })
            },
        );
    }
    group.finish();
}

fn bench_merge(c: &mut Criterion) {
    let calc = CostCalculator::gemini_image_default();
    let records: Vec<UsageRecord> = (0..1024u64)
        .map(|i| {
            calc.from_usage_metadata(Some(&UsageMetadata {
                prompt_token_count: Some(1000 + i),
                candidates_token_count: Some(1290),
                total_token_count: Some(2290 + i),
                ..Default::default()
            }))
        })
        .collect();

    c.bench_function("merge_1024_records", |b| {
        b.iter(|| black_box(calc.merge(black_box(&records))))
    });
}

criterion_group!(benches, bench_execute, bench_merge);
criterion_main!(benches);
