use std::sync::Arc;
use throttled_log::infrastructure::mocks::{MockClock, SharedWriter};
use throttled_log::{
    keys, ChainedError, Context, Encoder, EncodingLogger, Field, Level, Logger, MAX_CHAIN_DEPTH,
};

fn sink(encoder: Encoder) -> (EncodingLogger<SharedWriter>, SharedWriter) {
    let out = SharedWriter::new();
    let logger = EncodingLogger::builder(encoder)
        .with_writer(out.clone())
        .with_clock(Arc::new(MockClock::epoch()))
        .build();
    (logger, out)
}

fn production() -> Encoder {
    Encoder::production([
        keys::CORRELATION_ID,
        keys::WORKFLOW_ID,
        keys::APP_NAME,
        keys::APP_VERSION,
    ])
    .with_fields(vec![
        Field::new(keys::APP_NAME, "errorfields"),
        Field::new(keys::APP_VERSION, "1.0.0"),
    ])
}

fn json_tail(line: &str) -> serde_json::Value {
    let start = line.find(">## ").expect("special field marker") + 4;
    serde_json::from_str(&line[start..]).expect("valid JSON tail")
}

#[test]
fn test_hello_world_line() {
    let (logger, out) = sink(production());
    let ctx = Context::background().with_value(keys::CORRELATION_ID, "c-1");

    logger.info(&ctx, "hello world", vec![Field::new("world", "earth")]);

    assert_eq!(
        out.lines(),
        vec![
            "1970-01-01T00:00:00Z INFO hello world ##<app_name=errorfields;app_version=1.0.0;correlation_id=c-1;>## {\"world\":\"earth\"}"
        ]
    );
}

#[test]
fn test_error_fields_end_up_on_the_line() {
    let (logger, out) = sink(production());
    let err = ChainedError::new("this is bad").with_fields(vec![Field::new("big", "boom")]);

    logger.error(
        &Context::background(),
        "goodbye world",
        vec![Field::error("error", err), Field::new("world", "earth")],
    );

    let lines = out.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("1970-01-01T00:00:00Z ERROR goodbye world ##<app_name=errorfields;app_version=1.0.0;>## "));
    assert_eq!(
        json_tail(&lines[0]),
        serde_json::json!({ "error": "this is bad", "big": "boom", "world": "earth" })
    );
}

fn fetch_error() -> ChainedError {
    ChainedError::new("connection reset")
        .with_stack_trace("at net::read\nat main")
        .wrap("fetch failed")
}

#[test]
fn test_production_stack_trace_keeps_one_line() {
    let (logger, out) = sink(Encoder::production(Vec::<String>::new()));

    logger.error(&Context::background(), "sync aborted", vec![Field::error("error", fetch_error())]);

    assert_eq!(
        out.contents(),
        "1970-01-01T00:00:00Z ERROR sync aborted ##<>## {\"error\":\"connection reset\\nat net::read\\nat main\\nfetch failed\"}\n"
    );
}

#[test]
fn test_trailing_stack_trace_follows_line() {
    let encoder = Encoder::builder()
        .with_trailing_stack_traces(true)
        .build()
        .unwrap();
    let (logger, out) = sink(encoder);

    logger.error(&Context::background(), "sync aborted", vec![Field::error("error", fetch_error())]);

    assert_eq!(
        out.lines(),
        vec![
            "1970-01-01T00:00:00Z ERROR sync aborted ##<>## {}",
            "connection reset",
            "at net::read",
            "at main",
            "fetch failed",
        ]
    );
}

#[test]
fn test_deep_decorated_chain_keeps_every_field() {
    let (logger, out) = sink(Encoder::production(Vec::<String>::new()));
    let err = (0..20).fold(ChainedError::new("root"), |err, n| {
        err.with_fields(vec![Field::new(format!("layer{}", n), n as i64)])
            .wrap(format!("layer {}", n))
    });

    logger.error(&Context::background(), "deep", vec![Field::error("error", err)]);

    // 20 decorated layers still fit: only the messages count towards the cap.
    let tail = json_tail(&out.lines()[0]);
    assert_eq!(tail.as_object().unwrap().len(), 21);
    assert_eq!(tail["layer0"], 0);
    assert!(tail["error"].as_str().unwrap().ends_with(": root"));
}

#[test]
fn test_overlong_chain_is_bounded() {
    let (logger, out) = sink(Encoder::production(Vec::<String>::new()));
    let err = (1..100).fold(ChainedError::new("root"), |err, n| err.wrap(format!("layer {}", n)));

    logger.error(&Context::background(), "deep", vec![Field::error("error", err)]);

    let tail = json_tail(&out.lines()[0]);
    let rendered = tail["error"].as_str().unwrap();
    assert_eq!(rendered.split(": ").count(), MAX_CHAIN_DEPTH);
    assert!(rendered.starts_with("layer 99"));
}

#[test]
fn test_std_errors_are_converted() {
    let (logger, out) = sink(Encoder::production(Vec::<String>::new()));
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");

    logger.warn(
        &Context::background(),
        "using defaults",
        vec![Field::error("error", ChainedError::from_std(&io))],
    );

    assert_eq!(
        json_tail(&out.lines()[0]),
        serde_json::json!({ "error": "config.toml missing" })
    );
}

#[test]
fn test_long_message_is_shortened_in_the_middle() {
    let encoder = Encoder::builder().with_max_message_bytes(20).build().unwrap();
    let (logger, out) = sink(encoder);
    let message = format!("start-{}-end", "x".repeat(200));

    logger.info(&Context::background(), &message, vec![]);

    let line = &out.lines()[0];
    let rendered = line
        .strip_prefix("1970-01-01T00:00:00Z INFO ")
        .and_then(|rest| rest.split(" ##<").next())
        .unwrap();
    assert!(rendered.len() <= 20);
    assert!(rendered.starts_with("start-"));
    assert!(rendered.ends_with("-end"));
    assert!(rendered.contains("..."));
}

#[test]
fn test_multibyte_message_is_never_split() {
    let encoder = Encoder::builder().with_max_message_bytes(16).build().unwrap();
    let (logger, out) = sink(encoder);

    logger.info(&Context::background(), &"äöü€".repeat(20), vec![]);

    // The writer decodes lossily, so a split character would show up as U+FFFD.
    let contents = out.contents();
    assert!(!contents.contains('\u{FFFD}'));
}

#[test]
fn test_multiline_message_stays_on_one_line() {
    let (logger, out) = sink(Encoder::production(Vec::<String>::new()));

    logger.info(&Context::background(), "first\nsecond\r\nthird", vec![]);

    let lines = out.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].contains("first\\nsecond\\r\\nthird ##<>##"));
}

#[test]
fn test_development_encoder_indents_fields() {
    colored::control::set_override(false);
    let (logger, out) = sink(Encoder::development());

    logger.debug(&Context::background(), "state", vec![Field::new("k", "v")]);

    let contents = out.contents();
    assert!(contents.starts_with("00:00:00.000000 DEBUG state ##<>## {\n"));
    assert!(contents.contains("  \"k\": \"v\"\n}"));
}

#[test]
fn test_levels_render_their_tags() {
    let (logger, out) = sink(Encoder::production(Vec::<String>::new()));
    let ctx = Context::background();

    for level in [Level::Debug, Level::Info, Level::Warn, Level::Error] {
        logger.log(&ctx, level, "m", vec![]);
    }

    let tags: Vec<String> = out
        .lines()
        .iter()
        .map(|line| line.split(' ').nth(1).unwrap().to_string())
        .collect();
    assert_eq!(tags, vec!["DEBUG", "INFO", "WARN", "ERROR"]);
}
