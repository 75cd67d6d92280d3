pub mod endpoint;
pub mod net;

// Re-exports for convenience
pub use endpoint::{collector_base_param, resolve_collector_base};
pub use net::{Collector, HttpCollector, TransportError};
