//! Services behind the memory wall: posting and moderating messages,
//! reaction toggles, account moderation and the weekly report.
//!
//! Every service is a plain function over [`AppStateInner`]; callers share
//! one [`AppState`] and invoke them directly. All calls are synchronous and
//! only block on table locks.

pub mod analytics;
pub mod dispatcher;
pub mod error;
pub mod messages;
pub mod moderation;
pub mod reactions;
pub mod state;
pub mod users;

pub use dispatcher::Dispatcher;
pub use error::{Result, ServiceError};
pub use state::{AppState, AppStateInner};
