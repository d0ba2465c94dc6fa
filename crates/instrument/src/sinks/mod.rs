pub mod fanout;
pub mod log;
pub mod memory;

pub use fanout::FanoutSink;
pub use log::LogSink;
pub use memory::{CapturedException, MemorySink};
