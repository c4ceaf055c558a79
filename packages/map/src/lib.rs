#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Layer and filter controller for the crime grid map.
//!
//! Everything here drives a [`MapSurface`] from one logical thread:
//!
//! * [`FilterState`] holds the current year, crime type, and display mode
//!   and says which refresh each change needs.
//! * [`LayerController`] loads incidents for the current filter and keeps
//!   the heatmap and pin layers in sync with the display mode.
//! * [`DatasetCache`] fetches gang territories once per session.
//! * [`GangHighlighter`] draws one territory at a time, tracking its layers
//!   in an [`ActiveLayerSet`] so the previous highlight is always removed
//!   first.
//! * [`MapSession`] turns [`UiEvent`]s into calls on the above.

pub mod cache;
pub mod filter;
pub mod highlight;
pub mod layers;
pub mod memory;
pub mod session;
pub mod surface;

#[cfg(test)]
mod testing;

pub use cache::{CacheError, DatasetCache};
pub use filter::{FilterState, Refresh};
pub use highlight::{ActiveLayerSet, GangHighlighter, HighlightStyle};
pub use layers::{LayerController, LoadOutcome, LoadState, LoadTicket};
pub use memory::InMemorySurface;
pub use session::{MapSession, UiEvent};
pub use surface::{MapSurface, SurfaceError};

/// Errors surfaced by session-level operations.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// The rendering surface rejected a layer or source operation.
    #[error(transparent)]
    Surface(#[from] SurfaceError),
}
