/// Owned element tree and HTML serialization
pub mod dom;
/// Track card markup
pub mod fragment;
/// Fetch-and-render of the recent tracks container
pub mod renderer;

pub use dom::{Container, Document, Element};
pub use fragment::track_fragment;
pub use renderer::{LoadOutcome, RecentTracksRenderer};
