use crate::parser::primitive_parser::{
    parse_bool, parse_i16, parse_int_sized_string, parse_panning, parse_u16, parse_u32, parse_u8,
};
use crate::song::{
    Header, Instrument, Layer, Note, Song, DEFAULT_VELOCITY, LEGACY_DEFAULT_INSTRUMENTS,
};
use crate::version::NbsVersion;
use crate::NbsError;
use nom::combinator::{cond, flat_map, map};
use nom::error::ErrorKind;
use nom::{IResult, Parser};
use std::io::{Read, Seek, SeekFrom};

// Format docs at <https://opennbs.org/nbs>

/// First field of every file.
///
/// A zero short announces the post-legacy layout and is followed by the version byte,
/// any other value is the song length of a version 0 file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionMarker {
    pub legacy_song_length: u16,
    pub version_byte: Option<u8>,
}

impl VersionMarker {
    pub fn version(&self) -> Result<NbsVersion, NbsError> {
        match self.version_byte {
            Some(byte) => NbsVersion::try_from(byte),
            None => Ok(NbsVersion::V0),
        }
    }
}

pub fn parse_version_marker(i: &[u8]) -> IResult<&[u8], VersionMarker> {
    log::debug!("Parsing version marker");
    flat_map(parse_u16, |legacy_song_length| {
        map(cond(legacy_song_length == 0, parse_u8), move |version_byte| {
            VersionMarker {
                legacy_song_length,
                version_byte,
            }
        })
    })
    .parse(i)
}

/// Running position of a delta encoded index sequence.
///
/// Each short read is added to the current position, a zero short ends the sequence.
/// Ticks and the layers inside each tick are two instances of the same cursor.
#[derive(Debug, Clone, Copy)]
pub struct JumpCursor {
    value: i64,
}

impl Default for JumpCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl JumpCursor {
    pub const fn new() -> Self {
        Self { value: -1 }
    }

    /// Next index or `None` once the terminating zero jump is consumed
    pub fn next_index<'a>(&mut self, i: &'a [u8]) -> IResult<&'a [u8], Option<u32>> {
        let (rest, jump) = parse_u16(i)?;
        if jump == 0 {
            return Ok((rest, None));
        }
        self.value += i64::from(jump);
        let index = u32::try_from(self.value).map_err(|_| {
            nom::Err::Failure(nom::error::Error::new(i, ErrorKind::TooLarge))
        })?;
        Ok((rest, Some(index)))
    }
}

pub fn parse_header(
    marker: VersionMarker,
    version: NbsVersion,
) -> impl FnMut(&[u8]) -> IResult<&[u8], Header> {
    move |i: &[u8]| {
        log::debug!("Parsing header for version {version}");
        let (i, default_instruments) =
            cond(version.has_default_instruments(), parse_u8).parse(i)?;
        let (i, song_length) = cond(version.has_song_length_field(), parse_u16).parse(i)?;
        let (i, song_layers) = parse_u16(i)?;
        let (i, (song_name, song_author, original_author, description)) = (
            parse_int_sized_string,
            parse_int_sized_string,
            parse_int_sized_string,
            parse_int_sized_string,
        )
            .parse(i)?;
        let (i, (tempo, auto_save, auto_save_duration, time_signature)) =
            (parse_u16, parse_bool, parse_u8, parse_u8).parse(i)?;
        let (i, (minutes_spent, left_clicks, right_clicks, blocks_added, blocks_removed)) =
            (parse_u32, parse_u32, parse_u32, parse_u32, parse_u32).parse(i)?;
        let (i, song_origin) = parse_int_sized_string(i)?;
        let (i, loop_settings) = cond(
            version.has_loop_settings(),
            (parse_bool, parse_u8, parse_u16),
        )
        .parse(i)?;
        let (loop_enabled, max_loop_count, loop_start) = loop_settings.unwrap_or((false, 0, 0));

        let header = Header {
            version,
            default_instruments: default_instruments.unwrap_or(LEGACY_DEFAULT_INSTRUMENTS),
            song_length: song_length.unwrap_or(marker.legacy_song_length),
            song_layers,
            song_name,
            song_author,
            original_author,
            description,
            tempo: f32::from(tempo) / 100.0,
            auto_save,
            auto_save_duration,
            time_signature,
            minutes_spent,
            left_clicks,
            right_clicks,
            blocks_added,
            blocks_removed,
            song_origin,
            loop_enabled,
            max_loop_count,
            loop_start,
        };
        log::debug!("{header:?}");
        Ok((i, header))
    }
}

pub fn parse_note(
    tick: u32,
    layer: u32,
    version: NbsVersion,
) -> impl FnMut(&[u8]) -> IResult<&[u8], Note> {
    move |i: &[u8]| {
        map(
            (
                parse_u8, // instrument
                parse_u8, // key
                cond(
                    version.has_note_dynamics(),
                    (parse_u8, parse_panning, parse_i16),
                ),
            ),
            |(instrument, key, dynamics)| {
                let (velocity, panning, pitch) = dynamics.unwrap_or((DEFAULT_VELOCITY, 0, 0));
                Note {
                    tick,
                    layer,
                    instrument,
                    key,
                    velocity,
                    panning,
                    pitch,
                }
            },
        )
        .parse(i)
    }
}

/// Parse the sparse tick x layer grid
pub fn parse_notes(version: NbsVersion) -> impl FnMut(&[u8]) -> IResult<&[u8], Vec<Note>> {
    move |i: &[u8]| {
        log::debug!("Parsing notes");
        let mut i = i;
        let mut notes = vec![];
        let mut ticks = JumpCursor::new();
        loop {
            let (inner, tick) = ticks.next_index(i)?;
            i = inner;
            let Some(tick) = tick else {
                break;
            };
            let mut layers = JumpCursor::new();
            loop {
                let (inner, layer) = layers.next_index(i)?;
                i = inner;
                let Some(layer) = layer else {
                    break;
                };
                let (inner, note) = parse_note(tick, layer, version)(i)?;
                i = inner;
                notes.push(note);
            }
        }
        log::debug!("Parsed {} notes", notes.len());
        Ok((i, notes))
    }
}

pub fn parse_layer(id: u32, version: NbsVersion) -> impl FnMut(&[u8]) -> IResult<&[u8], Layer> {
    move |i: &[u8]| {
        map(
            (
                parse_int_sized_string,
                cond(version.has_layer_lock(), parse_bool),
                parse_u8,
                cond(version.has_layer_panning(), parse_panning),
            ),
            |(name, lock, volume, panning)| Layer {
                id,
                name,
                lock: lock.unwrap_or(false),
                volume,
                panning: panning.unwrap_or(0),
            },
        )
        .parse(i)
    }
}

pub fn parse_layers(
    layer_count: u16,
    version: NbsVersion,
) -> impl FnMut(&[u8]) -> IResult<&[u8], Vec<Layer>> {
    move |i: &[u8]| {
        log::debug!("Parsing {layer_count} layers");
        let mut layers = Vec::with_capacity(layer_count.into());
        let mut i = i;
        for id in 0..u32::from(layer_count) {
            let (inner, layer) = parse_layer(id, version)(i)?;
            i = inner;
            layers.push(layer);
        }
        Ok((i, layers))
    }
}

pub fn parse_instrument(id: u32) -> impl FnMut(&[u8]) -> IResult<&[u8], Instrument> {
    move |i: &[u8]| {
        map(
            (
                parse_int_sized_string,
                parse_int_sized_string,
                parse_u8,
                parse_bool,
            ),
            |(name, file, pitch, press_key)| Instrument {
                id,
                name,
                file,
                pitch,
                press_key,
            },
        )
        .parse(i)
    }
}

pub fn parse_instruments(i: &[u8]) -> IResult<&[u8], Vec<Instrument>> {
    let (mut i, instrument_count) = parse_u8(i)?;
    log::debug!("Parsing {instrument_count} instruments");
    let mut instruments = Vec::with_capacity(instrument_count.into());
    for id in 0..u32::from(instrument_count) {
        let (inner, instrument) = parse_instrument(id)(i)?;
        i = inner;
        instruments.push(instrument);
    }
    Ok((i, instruments))
}

/// Map a nom failure on one section of the file to a library error
fn section_error(
    section: &'static str,
) -> impl Fn(nom::Err<nom::error::Error<&[u8]>>) -> NbsError {
    move |err: nom::Err<nom::error::Error<&[u8]>>| {
        log::error!("Failed to parse {section}: {err:?}");
        match err {
            nom::Err::Incomplete(_) => NbsError::Truncated(section.to_string()),
            nom::Err::Error(e) | nom::Err::Failure(e) if e.code == ErrorKind::Eof => {
                NbsError::Truncated(section.to_string())
            }
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                NbsError::ParsingError(format!("{section}: {:?}", e.code))
            }
        }
    }
}

/// Parse one song from the start of `file_data`, returning the bytes that follow it
pub fn parse_nbs_song(file_data: &[u8]) -> Result<(&[u8], Song), NbsError> {
    let (rest, marker) = parse_version_marker(file_data).map_err(section_error("version"))?;
    let version = marker.version().inspect_err(|err| log::error!("{err}"))?;
    log::debug!("Detected {version} file");

    let (rest, header) = parse_header(marker, version)(rest).map_err(section_error("header"))?;
    let (rest, notes) = parse_notes(version)(rest).map_err(section_error("notes"))?;
    let (rest, layers) =
        parse_layers(header.song_layers, version)(rest).map_err(section_error("layers"))?;
    let (rest, instruments) = parse_instruments(rest).map_err(section_error("instruments"))?;

    let song = Song {
        header,
        notes,
        layers,
        instruments,
    };
    Ok((rest, song))
}

/// Parse a complete song from the bytes of a note block file
pub fn parse_nbs_data(file_data: &[u8]) -> Result<Song, NbsError> {
    let (rest, song) = parse_nbs_song(file_data)?;
    if !rest.is_empty() {
        log::debug!("Ignoring {} trailing bytes", rest.len());
    }
    Ok(song)
}

/// Parse a song from the current position of a stream.
///
/// On success the stream is left right after the last byte of the song,
/// anything following it is available to the caller. The stream stays owned by the caller.
pub fn read_nbs<R: Read + Seek>(mut reader: R) -> Result<Song, NbsError> {
    let start = reader.stream_position()?;
    let mut file_data: Vec<u8> = vec![];
    reader.read_to_end(&mut file_data)?;
    let (rest, song) = parse_nbs_song(&file_data)?;
    let consumed = (file_data.len() - rest.len()) as u64;
    log::debug!("Read song of {consumed} bytes, {} bytes left in stream", rest.len());
    reader.seek(SeekFrom::Start(start + consumed))?;
    Ok(song)
}
