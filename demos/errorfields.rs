//! Example showing how fields attached to errors end up on the log line.
//!
//! A production encoder with the usual special keys is installed as the
//! global logger. The error logged at the end carries its own `big` field,
//! which is flattened into the line next to the call-site fields.
//!
//! Run with `cargo run --example errorfields`.

use throttled_log::{global, keys, ChainedError, Context, Encoder, EncodingLogger, Field};

fn main() {
    let encoder = Encoder::production([
        keys::CORRELATION_ID,
        keys::WORKFLOW_ID,
        keys::APP_NAME,
        keys::APP_VERSION,
    ]);
    let logger = EncodingLogger::builder(encoder)
        .with_writer(std::io::stdout())
        .build()
        .with_fields(vec![
            Field::new(keys::APP_NAME, "error example"),
            Field::new(keys::APP_VERSION, "dev"),
        ]);

    if let Err(err) = global::set_global_logger(logger) {
        eprintln!("couldn't install logger: {}", err);
        return;
    }

    let ctx = Context::background();
    global::info(&ctx, "hello world", vec![Field::new("world", "earth")]);

    let err = ChainedError::new("this is bad").with_fields(vec![Field::new("big", "boom")]);
    global::error(
        &ctx,
        "goodbye world",
        vec![Field::error("error", err), Field::new("world", "earth")],
    );
}
