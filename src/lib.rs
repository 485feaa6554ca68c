// Satchel - server-side sessions for web request handlers
//
// A session is a mapping of field names to JSON values, named by a random key
// carried in a signed cookie and stored in memory or on disk.

// Re-export the session core
pub use satchel_session::*;

/// The session crate under its own name.
pub use satchel_session as session;

// Prelude for common imports
pub mod prelude {
    pub use satchel_session::prelude::*;
}
