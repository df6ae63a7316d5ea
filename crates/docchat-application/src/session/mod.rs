//! Session application services.
//!
//! This module contains the session store and the synchronization of its
//! session list with the backend.

mod store;
mod sync;

pub use store::{IdGenerator, SessionStore};
pub use sync::SidebarSync;
