pub mod failing_generator;
pub mod recording_controller;
pub mod recording_listener;

use std::sync::Arc;

use spdy_session::{Generator, Session, SessionConfig, SessionFrameListener, StandardGenerator};

use recording_controller::RecordingController;

/// Initialise test logging once; `RUST_LOG` overrides the default filter.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Session over `controller` with the default generator.
#[allow(dead_code)]
pub fn session_with(
    config: SessionConfig,
    controller: &Arc<RecordingController>,
    listener: Option<Arc<dyn SessionFrameListener>>,
) -> Arc<Session> {
    init_tracing();
    Session::new(
        config,
        controller.clone(),
        Arc::new(StandardGenerator::new()),
        listener,
    )
    .unwrap()
}

/// Session over `controller` with a custom generator.
#[allow(dead_code)]
pub fn session_with_generator(
    config: SessionConfig,
    controller: &Arc<RecordingController>,
    generator: Arc<dyn Generator>,
    listener: Option<Arc<dyn SessionFrameListener>>,
) -> Arc<Session> {
    init_tracing();
    Session::new(config, controller.clone(), generator, listener).unwrap()
}
