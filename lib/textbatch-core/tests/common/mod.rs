use std::time::Duration;

use rstest::fixture;
use textbatch_core::{ActionKind, AnalysisAction, BatchClient, PollOptions, TextDocumentInput};
use tracing::info;

mod fake_service;
pub use self::fake_service::*;

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

/// Three documents, the second one fails the sentiment analysis.
#[fixture]
pub fn documents() -> Vec<TextDocumentInput> {
    init_tracing();
    vec![
        TextDocumentInput::new("1", "The hotel was lovely and the staff friendly."),
        TextDocumentInput::new("2", "").with_language("en"),
        TextDocumentInput::new("3", "Microsoft was founded by Bill Gates and Paul Allen."),
    ]
}

#[fixture]
pub fn actions() -> Vec<AnalysisAction> {
    vec![
        AnalysisAction::new(ActionKind::EntityRecognition).with_name("entities"),
        AnalysisAction::new(ActionKind::SentimentAnalysis).with_name("sentiment"),
    ]
}

/// Polls every few milliseconds, at most ten times.
pub fn fast_polls() -> PollOptions {
    PollOptions {
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
        max_attempts: 10,
        ..PollOptions::default()
    }
}

pub fn client(service: FakeService) -> BatchClient<FakeService> {
    BatchClient::builder(service)
        .with_poll_options(fast_polls())
        .build()
}
