use crate::song::{Header, Instrument, Layer, Note, Song};
use crate::version::NbsVersion;
use crate::writer::primitive_writer::{
    write_bool, write_i16, write_int_sized_string, write_panning, write_u16, write_u32, write_u8,
};
use crate::NbsError;
use std::io::Write;

/// Running position of a delta encoded index sequence, mirror of the parser's cursor
#[derive(Debug, Clone, Copy)]
pub struct JumpWriter {
    current: i64,
}

impl Default for JumpWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl JumpWriter {
    pub const fn new() -> Self {
        Self { current: -1 }
    }

    /// Write the jump from the current position to `index`, which must be strictly ahead
    pub fn jump_to<W: Write>(&mut self, w: &mut W, index: u32) -> Result<(), NbsError> {
        let delta = i64::from(index) - self.current;
        if delta <= 0 {
            return Err(NbsError::OutOfRange(format!(
                "index {index} does not follow {}",
                self.current
            )));
        }
        let jump = u16::try_from(delta)
            .map_err(|_| NbsError::OutOfRange(format!("jump of {delta} to index {index}")))?;
        write_u16(w, jump)?;
        self.current = i64::from(index);
        Ok(())
    }

    /// Terminate the sequence with a zero jump
    pub fn end<W: Write>(self, w: &mut W) -> Result<(), NbsError> {
        log::trace!("End of jump sequence at {}", self.current);
        write_u16(w, 0)
    }
}

pub fn write_header<W: Write>(
    w: &mut W,
    header: &Header,
    version: NbsVersion,
) -> Result<(), NbsError> {
    log::debug!("Writing header for version {version}");
    if version.has_version_byte() {
        write_u16(w, 0)?;
        write_u8(w, version.as_u8())?;
    } else {
        // a zero length would announce the post-legacy layout
        if header.song_length == 0 {
            return Err(NbsError::OutOfRange(
                "song length 0 cannot be stored in a version 0 file".to_string(),
            ));
        }
        write_u16(w, header.song_length)?;
    }
    if version.has_default_instruments() {
        write_u8(w, header.default_instruments)?;
    }
    if version.has_song_length_field() {
        write_u16(w, header.song_length)?;
    }
    write_u16(w, header.song_layers)?;
    write_int_sized_string(w, &header.song_name)?;
    write_int_sized_string(w, &header.song_author)?;
    write_int_sized_string(w, &header.original_author)?;
    write_int_sized_string(w, &header.description)?;

    write_u16(w, encode_tempo(header.tempo)?)?;
    write_bool(w, header.auto_save)?;
    write_u8(w, header.auto_save_duration)?;
    write_u8(w, header.time_signature)?;

    write_u32(w, header.minutes_spent)?;
    write_u32(w, header.left_clicks)?;
    write_u32(w, header.right_clicks)?;
    write_u32(w, header.blocks_added)?;
    write_u32(w, header.blocks_removed)?;
    write_int_sized_string(w, &header.song_origin)?;

    if version.has_loop_settings() {
        write_bool(w, header.loop_enabled)?;
        write_u8(w, header.max_loop_count)?;
        write_u16(w, header.loop_start)?;
    }
    Ok(())
}

/// Tempo is stored in hundredths of ticks per second
fn encode_tempo(tempo: f32) -> Result<u16, NbsError> {
    let hundredths = (tempo * 100.0).round();
    if !(0.0..=f32::from(u16::MAX)).contains(&hundredths) {
        return Err(NbsError::OutOfRange(format!("tempo {tempo}")));
    }
    Ok(hundredths as u16)
}

pub fn write_note<W: Write>(w: &mut W, note: &Note, version: NbsVersion) -> Result<(), NbsError> {
    write_u8(w, note.instrument)?;
    write_u8(w, note.key)?;
    if version.has_note_dynamics() {
        write_u8(w, note.velocity)?;
        write_panning(w, note.panning)?;
        write_i16(w, note.pitch)?;
    }
    Ok(())
}

/// Write the sparse tick x layer grid, one chord per tick
pub fn write_notes<W: Write>(w: &mut W, song: &Song, version: NbsVersion) -> Result<(), NbsError> {
    log::debug!("Writing {} notes", song.notes.len());
    let mut ticks = JumpWriter::new();
    for chord in song.chords() {
        ticks.jump_to(w, chord.tick)?;
        let mut layers = JumpWriter::new();
        let mut previous_layer = None;
        for note in chord.notes {
            if previous_layer == Some(note.layer) {
                return Err(NbsError::DuplicateNote {
                    tick: note.tick,
                    layer: note.layer,
                });
            }
            previous_layer = Some(note.layer);
            layers.jump_to(w, note.layer)?;
            write_note(w, note, version)?;
        }
        layers.end(w)?;
    }
    ticks.end(w)
}

pub fn write_layer<W: Write>(
    w: &mut W,
    layer: &Layer,
    version: NbsVersion,
) -> Result<(), NbsError> {
    write_int_sized_string(w, &layer.name)?;
    if version.has_layer_lock() {
        write_bool(w, layer.lock)?;
    }
    write_u8(w, layer.volume)?;
    if version.has_layer_panning() {
        write_panning(w, layer.panning)?;
    }
    Ok(())
}

pub fn write_layers<W: Write>(
    w: &mut W,
    layers: &[Layer],
    version: NbsVersion,
) -> Result<(), NbsError> {
    log::debug!("Writing {} layers", layers.len());
    for layer in layers {
        write_layer(w, layer, version)?;
    }
    Ok(())
}

pub fn write_instrument<W: Write>(w: &mut W, instrument: &Instrument) -> Result<(), NbsError> {
    write_int_sized_string(w, &instrument.name)?;
    write_int_sized_string(w, &instrument.file)?;
    write_u8(w, instrument.pitch)?;
    write_bool(w, instrument.press_key)
}

pub fn write_instruments<W: Write>(w: &mut W, instruments: &[Instrument]) -> Result<(), NbsError> {
    log::debug!("Writing {} instruments", instruments.len());
    let count = u8::try_from(instruments.len())
        .map_err(|_| NbsError::OutOfRange(format!("{} instruments", instruments.len())))?;
    write_u8(w, count)?;
    for instrument in instruments {
        write_instrument(w, instrument)?;
    }
    Ok(())
}

/// Serialize `song` at `version` into the caller's stream.
///
/// Refreshes the header version, song length and layer count first.
/// On error the stream holds a partial file and should be discarded.
pub fn write_nbs<W: Write>(
    song: &mut Song,
    mut writer: W,
    version: NbsVersion,
) -> Result<(), NbsError> {
    song.update_header(version)?;
    write_header(&mut writer, &song.header, version)?;
    write_notes(&mut writer, song, version)?;
    write_layers(&mut writer, &song.layers, version)?;
    write_instruments(&mut writer, &song.instruments)?;
    Ok(())
}

/// Serialize `song` at `version` into a new buffer
pub fn write_nbs_data(song: &mut Song, version: NbsVersion) -> Result<Vec<u8>, NbsError> {
    let mut file_data: Vec<u8> = vec![];
    write_nbs(song, &mut file_data, version)?;
    Ok(file_data)
}
