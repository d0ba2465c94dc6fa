pub mod sink;
pub mod sinks;
pub mod span;
pub mod tracer;

pub use sink::TelemetrySink;
pub use span::{SpanContext, SpanHandle};
pub use tracer::Tracer;
