//! Headless watch session for CurbWatch.
//!
//! Drives the dashboard's client-side behavior without a browser: a frame
//! sampler reads stills from a playback surface on a fixed cadence, each
//! frame goes to the commentary endpoint (at most one call in flight), and
//! results merge into session state through a single reducer. An independent
//! poller keeps a rolling analytics snapshot.

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod sampler;
pub mod session;

pub use analytics::{AnalyticsPoller, FailureTracker};
pub use api::{CommentaryApi, HttpCommentaryApi};
pub use config::WatchConfig;
pub use error::{WatchError, WatchResult};
pub use sampler::{DirectoryFrameSource, FrameSource};
pub use session::{PlaybackEvent, Session, SessionInput, SessionState, TickAction, TickResult};
