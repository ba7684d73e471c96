pub mod primitive_writer;
pub mod song_writer;
