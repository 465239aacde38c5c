//! Continuous collision handling against the boundary.
//!
//! This module handles:
//! - **Detection**: finding the first facet the tentative segment crosses
//! - **Resolution**: reflecting the velocity at the crossing and re-advancing
//!   for the rest of the increment, repeated until the step is clean
//!
//! ## Sub-stepping
//!
//! Instead of only checking where the particle ends up, the whole segment
//! travelled in the increment is tested, and a bounce restarts the test on
//! the remaining time:
//!
//! ```text
//!  start ●
//!         \        ceiling
//!  ════════╳══════════════╗
//!           \  /          ║ wall
//!            \/           ║
//!            ╳ crossing   ║
//!             \  ● end    ║
//! ```
//!
//! A trajectory aimed at a corner therefore resolves as two single-facet
//! bounces inside one increment.

pub mod detection;
pub mod resolution;

pub use detection::*;
pub use resolution::*;
