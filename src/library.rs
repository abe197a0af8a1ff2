//! Track library: scanning a directory tree and grouping tracks into folders.

mod display;
mod group;
mod model;
mod scan;

pub use display::{display_from_fields, mime_type_for};
pub use group::{group_tracks, tracks_for_folder};
pub use model::{AudioTrack, Folder, LibrarySnapshot};
pub use scan::{FsLibrary, LibraryError, LibraryProvider, scan};

#[cfg(test)]
mod tests;
