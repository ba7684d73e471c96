use crate::version::NbsVersion;
use crate::NbsError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_VELOCITY: u8 = 100;
pub const DEFAULT_VOLUME: u8 = 100;
pub const DEFAULT_INSTRUMENT_PITCH: u8 = 45;
pub const DEFAULT_TEMPO: f32 = 10.0;

/// Built-in instrument slots assumed by files without the field (version 0)
pub const LEGACY_DEFAULT_INSTRUMENTS: u8 = 10;
pub const DEFAULT_INSTRUMENTS: u8 = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub version: NbsVersion,
    pub default_instruments: u8,
    /// Last tick holding a note
    pub song_length: u16,
    pub song_layers: u16,
    pub song_name: String,
    pub song_author: String,
    pub original_author: String,
    pub description: String,
    /// Ticks per second
    pub tempo: f32,
    pub auto_save: bool,
    /// Minutes
    pub auto_save_duration: u8,
    /// Numerator over 4
    pub time_signature: u8,
    pub minutes_spent: u32,
    pub left_clicks: u32,
    pub right_clicks: u32,
    pub blocks_added: u32,
    pub blocks_removed: u32,
    pub song_origin: String,
    #[serde(rename = "loop")]
    pub loop_enabled: bool,
    pub max_loop_count: u8,
    pub loop_start: u16,
}

impl Default for Header {
    fn default() -> Self {
        Header {
            version: NbsVersion::CURRENT,
            default_instruments: DEFAULT_INSTRUMENTS,
            song_length: 0,
            song_layers: 0,
            song_name: String::new(),
            song_author: String::new(),
            original_author: String::new(),
            description: String::new(),
            tempo: DEFAULT_TEMPO,
            auto_save: false,
            auto_save_duration: 10,
            time_signature: 4,
            minutes_spent: 0,
            left_clicks: 0,
            right_clicks: 0,
            blocks_added: 0,
            blocks_removed: 0,
            song_origin: String::new(),
            loop_enabled: false,
            max_loop_count: 0,
            loop_start: 0,
        }
    }
}

impl Header {
    /// Default header with the provided fields replaced
    pub fn with_overrides(overrides: HeaderOverrides) -> Self {
        let mut header = Header::default();
        header.apply(overrides);
        header
    }

    pub fn apply(&mut self, overrides: HeaderOverrides) {
        let HeaderOverrides {
            version,
            default_instruments,
            song_length,
            song_layers,
            song_name,
            song_author,
            original_author,
            description,
            tempo,
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
        } = overrides;
        merge(&mut self.version, version);
        merge(&mut self.default_instruments, default_instruments);
        merge(&mut self.song_length, song_length);
        merge(&mut self.song_layers, song_layers);
        merge(&mut self.song_name, song_name);
        merge(&mut self.song_author, song_author);
        merge(&mut self.original_author, original_author);
        merge(&mut self.description, description);
        merge(&mut self.tempo, tempo);
        merge(&mut self.auto_save, auto_save);
        merge(&mut self.auto_save_duration, auto_save_duration);
        merge(&mut self.time_signature, time_signature);
        merge(&mut self.minutes_spent, minutes_spent);
        merge(&mut self.left_clicks, left_clicks);
        merge(&mut self.right_clicks, right_clicks);
        merge(&mut self.blocks_added, blocks_added);
        merge(&mut self.blocks_removed, blocks_removed);
        merge(&mut self.song_origin, song_origin);
        merge(&mut self.loop_enabled, loop_enabled);
        merge(&mut self.max_loop_count, max_loop_count);
        merge(&mut self.loop_start, loop_start);
    }
}

fn merge<T>(field: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *field = value;
    }
}

/// Partial [`Header`]: only the `Some` fields replace the defaults.
///
/// Deserializable so that a set of overrides can come from a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderOverrides {
    pub version: Option<NbsVersion>,
    pub default_instruments: Option<u8>,
    pub song_length: Option<u16>,
    pub song_layers: Option<u16>,
    pub song_name: Option<String>,
    pub song_author: Option<String>,
    pub original_author: Option<String>,
    pub description: Option<String>,
    pub tempo: Option<f32>,
    pub auto_save: Option<bool>,
    pub auto_save_duration: Option<u8>,
    pub time_signature: Option<u8>,
    pub minutes_spent: Option<u32>,
    pub left_clicks: Option<u32>,
    pub right_clicks: Option<u32>,
    pub blocks_added: Option<u32>,
    pub blocks_removed: Option<u32>,
    pub song_origin: Option<String>,
    #[serde(rename = "loop")]
    pub loop_enabled: Option<bool>,
    pub max_loop_count: Option<u8>,
    pub loop_start: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub tick: u32,
    pub layer: u32,
    pub instrument: u8,
    pub key: u8,
    pub velocity: u8,
    /// -100 (left) to 100 (right)
    pub panning: i16,
    /// Fine pitch in cents
    pub pitch: i16,
}

impl Note {
    pub const fn new(tick: u32, layer: u32, instrument: u8, key: u8) -> Self {
        Note {
            tick,
            layer,
            instrument,
            key,
            velocity: DEFAULT_VELOCITY,
            panning: 0,
            pitch: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub id: u32,
    pub name: String,
    pub lock: bool,
    pub volume: u8,
    pub panning: i16,
}

impl Layer {
    pub const fn new(id: u32, name: String) -> Self {
        Layer {
            id,
            name,
            lock: false,
            volume: DEFAULT_VOLUME,
            panning: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: u32,
    pub name: String,
    /// Sound file reference, kept opaque
    pub file: String,
    pub pitch: u8,
    pub press_key: bool,
}

impl Instrument {
    pub const fn new(id: u32, name: String, file: String) -> Self {
        Instrument {
            id,
            name,
            file,
            pitch: DEFAULT_INSTRUMENT_PITCH,
            press_key: true,
        }
    }
}

/// A complete note block song.
///
/// `notes` is unordered, `layers` and `instruments` are indexed by their id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub header: Header,
    pub notes: Vec<Note>,
    pub layers: Vec<Layer>,
    pub instruments: Vec<Instrument>,
}

impl Default for Song {
    fn default() -> Self {
        Song::new(HeaderOverrides::default())
    }
}

impl Song {
    /// Empty song with a single default layer
    pub fn new(overrides: HeaderOverrides) -> Self {
        Song {
            header: Header::with_overrides(overrides),
            notes: vec![],
            layers: vec![Layer::new(0, String::new())],
            instruments: vec![],
        }
    }

    /// Notes grouped by tick in ascending order, each chord sorted by layer.
    ///
    /// Recomputed from `notes` on every call.
    pub fn chords(&self) -> Chords<'_> {
        let mut sorted: Vec<&Note> = self.notes.iter().collect();
        sorted.sort_by_key(|n| (n.tick, n.layer));
        Chords {
            notes: sorted.into_iter().peekable(),
        }
    }

    pub fn add_layer(&mut self, name: &str) -> &mut Layer {
        let id = self.layers.len() as u32;
        self.layers.push(Layer::new(id, name.to_string()));
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    pub fn add_instrument(&mut self, name: &str, file: &str) -> &mut Instrument {
        let id = self.instruments.len() as u32;
        self.instruments
            .push(Instrument::new(id, name.to_string(), file.to_string()));
        let last = self.instruments.len() - 1;
        &mut self.instruments[last]
    }

    /// Last tick holding a note, 0 for an empty song
    pub fn last_tick(&self) -> u32 {
        self.notes.iter().map(|n| n.tick).max().unwrap_or(0)
    }

    /// Refresh the derived header fields from the live collections before a write
    pub fn update_header(&mut self, version: NbsVersion) -> Result<(), NbsError> {
        let last_tick = self.last_tick();
        let song_length = u16::try_from(last_tick)
            .map_err(|_| NbsError::OutOfRange(format!("song length {last_tick}")))?;
        let layer_count = self.layers.len();
        let song_layers = u16::try_from(layer_count)
            .map_err(|_| NbsError::OutOfRange(format!("layer count {layer_count}")))?;
        self.header.version = version;
        self.header.song_length = song_length;
        self.header.song_layers = song_layers;
        log::debug!(
            "Updated header: version={version} song_length={song_length} song_layers={song_layers}"
        );
        Ok(())
    }
}

/// Empty song with the given header overrides
pub fn new_song(overrides: HeaderOverrides) -> Song {
    Song::new(overrides)
}

/// Notes sharing one tick, sorted by layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chord<'a> {
    pub tick: u32,
    pub notes: Vec<&'a Note>,
}

pub struct Chords<'a> {
    notes: std::iter::Peekable<std::vec::IntoIter<&'a Note>>,
}

impl<'a> Iterator for Chords<'a> {
    type Item = Chord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.notes.next()?;
        let tick = first.tick;
        let mut notes = vec![first];
        while let Some(note) = self.notes.next_if(|n| n.tick == tick) {
            notes.push(note);
        }
        Some(Chord { tick, notes })
    }
}
