//! M3U playlist output.
//!
//! - `Playlist`: extended M3U text builder
//! - `PlaylistGenerator`: resolves channels through a `StreamSource` into
//!   playlists, optionally link-checking each stream

pub mod generator;
pub mod m3u;

pub use generator::{CheckedPlaylists, GenerationReport, PlaylistGenerator, StreamSource};
pub use m3u::Playlist;
