use std::sync::Arc;
use std::time::Duration;
use throttled_log::infrastructure::mocks::{MockClock, RecordingLogger, SharedWriter};
use throttled_log::{throttle, Encoder, EncodingLogger, LoggerLayer};
use tracing_subscriber::layer::SubscriberExt;

#[tokio::test]
async fn test_tracing_events_are_throttled_and_encoded() {
    let out = SharedWriter::new();
    let sink = EncodingLogger::builder(Encoder::production(["correlation_id"]))
        .with_writer(out.clone())
        .with_clock(Arc::new(MockClock::epoch()))
        .build();
    let (logger, _done) = throttle(sink, Duration::from_secs(3600)).unwrap();
    let layer = LoggerLayer::new(logger.clone()).with_target(false);

    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        let span = tracing::info_span!("request", correlation_id = "c-9");
        let _guard = span.enter();
        for _ in 0..4 {
            tracing::warn!(disk = "/var", "disk full");
        }
    });
    logger.flush();

    assert_eq!(
        out.lines(),
        vec![
            "1970-01-01T00:00:00Z WARN disk full ##<correlation_id=c-9;>## {\"disk\":\"/var\"}",
            "1970-01-01T00:00:00Z WARN disk full ##<correlation_id=c-9;>## {\"disk\":\"/var\",\"times\":4}",
        ]
    );
    logger.stop().await.unwrap();
}

#[test]
fn test_layer_shares_logger_with_direct_calls() {
    use throttled_log::{Context, Logger};

    let recorder = Arc::new(RecordingLogger::new());
    let layer = LoggerLayer::from_arc(Arc::clone(&recorder));

    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!("from tracing");
    });
    recorder.info(&Context::background(), "direct", vec![]);

    let messages: Vec<String> = recorder.records().into_iter().map(|r| r.message).collect();
    assert_eq!(messages, vec!["from tracing", "direct"]);
}
