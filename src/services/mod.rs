//! Services layer - session logic
//!
//! This module contains the stateful services of the client core:
//! - The session context, sole owner of the signed-in user and token
//! - The notification poller keeping counts and liveness current
//! - The navigation and alert seams the host application implements

pub mod alerts;
pub mod navigation;
pub mod poller;
pub mod session;

pub use alerts::{AlertLevel, AlertSink, TracingAlertSink};
pub use navigation::{Navigator, TracingNavigator};
pub use poller::{NotificationPoller, PollerHandle};
pub use session::{
    merge_modules, normalize_module_codes, Liveness, ProfileUpdateError, SessionContext,
    SessionContextBuilder, SessionError, VoteOutcome,
};
