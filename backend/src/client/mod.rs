//! Client-side auth state.
//!
//! The server guard is the security boundary; this module is what a Rust
//! front-end holds to know who is signed in, and to decide redirects before
//! asking the server for a page.

pub mod context;
pub mod session;

pub use context::{AuthContext, AuthError, AuthState};
pub use session::{AuthChange, BrowserSession, SessionClient, SessionHandle};
