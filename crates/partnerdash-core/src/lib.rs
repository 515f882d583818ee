//! Session, navigation and composition layer over `partnerdash-api`.
//!
//! - **[`Dashboard`]**: composition root. Wires the loading signal, request
//!   client, session and router together and runs the watcher that sends
//!   the user back to sign-in when the backend drops the session.
//!
//! - **[`SessionState`]**: cached identity, roles and permissions, observed
//!   through a `watch` channel and refreshed lazily.
//!
//! - **[`NavigationGuard`]** / **[`Router`]**: per-route permission and role
//!   checks, with denied navigations landing on the forbidden route.

pub mod config;
pub mod dashboard;
pub mod error;
pub mod guard;
pub mod router;
pub mod routes;
pub mod session;

pub use config::{DEFAULT_APP_NAME, DEFAULT_ORIGIN, DashboardConfig, SessionEndpoints};
pub use dashboard::Dashboard;
pub use error::{CoreError, NavigationError, SessionError};
pub use guard::{Decision, DenyReason, GuardPhase, NavigationGuard, authorize};
pub use router::{Navigation, Router};
pub use routes::{FORBIDDEN_ROUTE, Location, RouteDef, RouteTable, SIGN_IN_ROUTE};
pub use session::{Identity, Session, SessionEvent, SessionState, SessionStatus};

// Re-exported so consumers need only one dependency.
pub use partnerdash_api;
