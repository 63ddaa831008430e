mod support;

use std::collections::HashSet;
use std::sync::Arc;

use metrics_util::debugging::DebuggingRecorder;
use ssr_engine::{
    BootstrapEntity, Provider, RenderOptions, RequestContext, SetupOptions,
    infra::telemetry::describe_metrics,
};
use support::{FAIL_RENDER, INDEX, StubModule, StubPlatform, engine_with, module, wait_until};

#[tokio::test]
async fn render_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    describe_metrics();

    let (engine, _) = engine_with(
        StubPlatform::new(),
        SetupOptions::new().with_bootstrap(module("home")),
    );

    // Miss, compile and document read, then hits on both caches.
    for _ in 0..2 {
        engine
            .render_to_string(INDEX, RenderOptions::new(RequestContext::new("/")))
            .await
            .expect("render");
    }

    let render_failure = RenderOptions::new(RequestContext::new("/"))
        .with_providers([Provider::new(FAIL_RENDER, ())]);
    assert!(engine.render_to_string(INDEX, render_failure).await.is_err());

    let compile_failure = RenderOptions::new(RequestContext::new("/")).with_bootstrap(
        BootstrapEntity::module(StubModule::named("broken").failing()),
    );
    assert!(engine.render_to_string(INDEX, compile_failure).await.is_err());

    // Two cold renders of one key: one compiles, the other waits on it.
    let (platform, gate) = StubPlatform::gated();
    let stats = Arc::clone(&platform.stats);
    let (gated, _) = engine_with(
        platform,
        SetupOptions::new().with_bootstrap(module("shared")),
    );
    let tasks: Vec<_> = (0..2)
        .map(|_| {
            let engine = gated.clone();
            tokio::spawn(async move {
                engine
                    .render_to_string(INDEX, RenderOptions::new(RequestContext::new("/")))
                    .await
            })
        })
        .collect();
    wait_until(|| stats.compile_started() == 1).await;
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
    gate.add_permits(2);
    for task in tasks {
        task.await.expect("task").expect("render");
    }
    assert_eq!(stats.compile_started(), 1);

    let names: HashSet<String> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    let expected = [
        "ssr_factory_cache_hit_total",
        "ssr_factory_cache_miss_total",
        "ssr_factory_cache_coalesced_total",
        "ssr_compile_total",
        "ssr_compile_failure_total",
        "ssr_compile_ms",
        "ssr_document_cache_hit_total",
        "ssr_document_read_total",
        "ssr_render_total",
        "ssr_render_failure_total",
        "ssr_render_ms",
    ];

    for metric in expected {
        assert!(names.contains(metric), "missing metric: {metric}");
    }
}
