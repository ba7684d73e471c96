//! Noteblock - Note Block Studio song reader and writer
//!
//! This library provides:
//! - Parsing of `.nbs` files for every format version (0 to 5)
//! - Writing a song back at any of those versions
//! - A chord view grouping notes by tick
//!
//! # Example
//!
//! ```no_run
//! use noteblock::{read_nbs, write_nbs, NbsVersion};
//!
//! let file = std::fs::File::open("song.nbs").unwrap();
//! let mut song = read_nbs(file).unwrap();
//! for chord in song.chords() {
//!     println!("{}: {:?}", chord.tick, chord.notes.iter().map(|n| n.key).collect::<Vec<_>>());
//! }
//! let out = std::fs::File::create("legacy.nbs").unwrap();
//! write_nbs(&mut song, out, NbsVersion::V0).unwrap();
//! ```

pub mod error;
pub mod parser;
pub mod song;
pub mod version;
pub mod writer;

// Re-export main types for convenience
pub use error::NbsError;
pub use parser::song_parser::{parse_nbs_data, parse_nbs_song, read_nbs};
pub use song::{new_song, Chord, Chords, Header, HeaderOverrides, Instrument, Layer, Note, Song};
pub use version::NbsVersion;
pub use writer::song_writer::{write_nbs, write_nbs_data};
