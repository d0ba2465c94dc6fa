use std::sync::Arc;

use tracelab_core::config::Config;
use tracelab_instrument::sinks::{FanoutSink, LogSink, MemorySink};
use tracelab_instrument::{TelemetrySink, Tracer};

use crate::data::DataSet;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub tracer: Tracer,
    pub recorder: Arc<MemorySink>,
    pub data: DataSet,
}

impl AppState {
    /// Wires the scenario backend: every span lands in the in-process
    /// recorder (served by `/api/spans`) and in the log output.
    pub fn new(cfg: Config) -> Self {
        let recorder = Arc::new(MemorySink::with_capacity(cfg.recorder_capacity));
        let sink: Arc<dyn TelemetrySink> =
            Arc::new(FanoutSink::new(vec![recorder.clone(), Arc::new(LogSink)]));
        let data = DataSet::generate(cfg.demo_post_count);

        Self {
            cfg: Arc::new(cfg),
            tracer: Tracer::new(sink),
            recorder,
            data,
        }
    }
}
