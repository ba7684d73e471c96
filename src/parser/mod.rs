pub mod primitive_parser;
pub mod song_parser;
