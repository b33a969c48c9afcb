//! Testing Utilities Module
//!
//! Helpers shared by the conformance runner and its unit tests.
//!
//! ## Submodules
//!
//! - `assertions` - Quote bounds, balance deltas and authorization checks
//! - `mock_venue` - In-memory adapter, ledger and test node

pub mod assertions;
pub mod mock_venue;

// Re-export commonly used items
pub use assertions::*;
pub use mock_venue::{
    DenialStyle, MockVenue, MockVenueBuilder, StorageWrites, VenueBehavior, DUDE, OWNER,
};
