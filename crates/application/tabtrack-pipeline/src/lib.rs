pub mod debounce;
pub mod dispatch;
pub mod emitter;
pub mod enrich;
pub mod heartbeat;
pub mod ports;
pub mod reporter;
pub mod session;
pub mod settings;
pub mod snapshot;

pub use debounce::{Clock, Debouncer, ManualClock, TokioClock, Trigger};
pub use dispatch::{DeliveryReport, Dispatcher};
pub use emitter::Emitter;
pub use enrich::Enricher;
pub use heartbeat::run_heartbeat;
pub use ports::{Environment, HostDashboard, SettingsStore, SnapshotQueryError};
pub use reporter::StateReporter;
pub use session::{EventBuilder, SessionContext};
pub use settings::{ExtensionSettings, MemorySettingsStore, SettingsError};
pub use snapshot::{filter_state_payload, snapshot_dashboard};
