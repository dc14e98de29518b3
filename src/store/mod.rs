//! Parameterised SQL against the four tables this service owns.
//!
//! Every multi-statement write here is expected to run inside a caller-held
//! transaction (`conn.transaction(|conn| { ... })`) — none of these functions
//! open one themselves, so callers can compose several into one atomic unit
//! the way `jobs::processors` does.

pub mod cidrs;
pub mod lists;
pub mod queue;
pub mod users;

pub use cidrs::*;
pub use lists::*;
pub use queue::*;
pub use users::*;
