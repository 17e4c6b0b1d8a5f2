//! # Live telemetry viewer core
//!
//! Everything needed to turn one connection's broker session into a bounded,
//! multi-view message display:
//!
//! ```text
//! telemetry/
//! ├── message.rs     - decoded payload representation and arrival stamping
//! ├── window.rs      - fixed-capacity, newest-first message buffer
//! ├── broker.rs      - rumqttc session worker and the viewer state machine
//! ├── projection.rs  - pure view projections (table, raw, timeline, chart)
//! └── export.rs      - file export of the current window (json/csv/text)
//! ```
//!
//! The broker worker owns the network side and reports over a single channel
//! of tagged events. The [`broker::ViewerSession`] on the UI side is the only
//! writer to the message window, so ingestion needs no locking: decode, stamp
//! and truncate all happen inside the frame loop that also renders the
//! result. Malformed payloads are logged and dropped before they ever reach
//! the window, and there is no retry or backoff anywhere in here - a failed
//! or lost connection stays down until the user reconnects.

pub mod broker;
pub mod export;
pub mod message;
pub mod projection;
pub mod window;

pub use broker::{BrokerSessionConfig, ViewerSession, ViewerState};
pub use message::StatusClass;
