//! Integration tests for noteblock library usage.
//!
//! These tests verify that the library can be used as a dependency
//! from external projects.

use noteblock::{
    new_song, parse_nbs_data, read_nbs, write_nbs, write_nbs_data, Header, HeaderOverrides,
    Layer, NbsError, NbsVersion, Note, Song,
};
use std::io::{Cursor, Read};

/// Test that all major types are accessible from the library.
#[test]
fn test_types_accessible() {
    // If any re-export is missing, this test will fail to compile.
    fn _assert_types() {
        let _: fn(&[u8]) -> Result<Song, NbsError> = parse_nbs_data;
        let _: fn(&mut Song, NbsVersion) -> Result<Vec<u8>, NbsError> = write_nbs_data;
        let _: fn(HeaderOverrides) -> Song = new_song;
    }
}

/// Song using every field, with values that differ from the defaults
fn rich_song() -> Song {
    let mut song = new_song(HeaderOverrides {
        song_name: Some("Für Elise".to_string()),
        song_author: Some("bar".to_string()),
        original_author: Some("Beethoven".to_string()),
        description: Some("a short description".to_string()),
        default_instruments: Some(16),
        tempo: Some(6.75),
        auto_save: Some(true),
        auto_save_duration: Some(3),
        time_signature: Some(3),
        minutes_spent: Some(61),
        left_clicks: Some(1200),
        right_clicks: Some(30),
        blocks_added: Some(9000),
        blocks_removed: Some(12),
        song_origin: Some("elise.mid".to_string()),
        loop_enabled: Some(true),
        max_loop_count: Some(3),
        loop_start: Some(4),
        ..Default::default()
    });
    song.layers[0].name = "Melody".to_string();
    song.layers[0].volume = 70;
    let bass = song.add_layer("Bass");
    bass.lock = true;
    bass.panning = -37;
    song.add_instrument("Custom", "custom/sound.ogg").pitch = 50;

    song.notes = vec![
        Note {
            velocity: 75,
            panning: 20,
            pitch: -30,
            ..Note::new(12, 1, 3, 40)
        },
        Note::new(0, 0, 0, 45),
        Note {
            panning: -100,
            ..Note::new(0, 1, 16, 33)
        },
        Note {
            pitch: 1200,
            ..Note::new(70, 0, 2, 60)
        },
    ];
    song
}

/// Restrict a song to what `version` can store, by resetting later fields to their defaults
fn restricted(song: &Song, version: NbsVersion) -> Song {
    let mut expected = song.clone();
    let defaults = Header::default();
    let header = &mut expected.header;
    if !version.has_default_instruments() {
        header.default_instruments = 10;
    }
    if !version.has_loop_settings() {
        header.loop_enabled = defaults.loop_enabled;
        header.max_loop_count = defaults.max_loop_count;
        header.loop_start = defaults.loop_start;
    }
    if !version.has_note_dynamics() {
        for note in &mut expected.notes {
            note.velocity = 100;
            note.panning = 0;
            note.pitch = 0;
        }
    }
    for layer in &mut expected.layers {
        if !version.has_layer_lock() {
            layer.lock = false;
        }
        if !version.has_layer_panning() {
            layer.panning = 0;
        }
    }
    expected.notes.sort_by_key(|n| (n.tick, n.layer));
    expected
}

#[test]
fn test_round_trip_every_version() {
    for version in NbsVersion::ALL {
        let mut song = rich_song();
        let data = write_nbs_data(&mut song, version).unwrap();
        let read_back = parse_nbs_data(&data).unwrap();
        assert_eq!(read_back, restricted(&song, version), "version {version}");
    }
}

#[test]
fn test_rewrite_is_stable() {
    for version in NbsVersion::ALL {
        let mut song = rich_song();
        let first = write_nbs_data(&mut song, version).unwrap();
        let mut read_back = parse_nbs_data(&first).unwrap();
        let second = write_nbs_data(&mut read_back, version).unwrap();
        assert_eq!(first, second, "version {version}");
    }
}

#[test]
fn test_stream_api() {
    let mut song = rich_song();
    let mut out = Cursor::new(Vec::new());
    write_nbs(&mut song, &mut out, NbsVersion::V5).unwrap();
    out.set_position(0);
    let read_back = read_nbs(&mut out).unwrap();
    assert_eq!(read_back, restricted(&song, NbsVersion::V5));
}

#[test]
fn test_stream_left_after_song() {
    let mut song = rich_song();
    let mut data = write_nbs_data(&mut song, NbsVersion::V5).unwrap();
    let song_len = data.len() as u64;
    data.extend_from_slice(b"NEXT");

    let mut stream = Cursor::new(data);
    let read_back = read_nbs(&mut stream).unwrap();
    assert_eq!(read_back, restricted(&song, NbsVersion::V5));
    assert_eq!(stream.position(), song_len);

    let mut rest = vec![];
    stream.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"NEXT");
}

#[test]
fn test_consecutive_songs_in_one_stream() {
    let mut first = rich_song();
    let mut second = new_song(HeaderOverrides {
        song_name: Some("second".to_string()),
        ..Default::default()
    });
    second.notes.push(Note::new(2, 0, 1, 50));
    let mut data = write_nbs_data(&mut first, NbsVersion::V4).unwrap();
    data.extend(write_nbs_data(&mut second, NbsVersion::V0).unwrap());

    let mut stream = Cursor::new(data);
    let read_first = read_nbs(&mut stream).unwrap();
    let read_second = read_nbs(&mut stream).unwrap();
    assert_eq!(read_first, restricted(&first, NbsVersion::V4));
    assert_eq!(read_second, restricted(&second, NbsVersion::V0));
    assert_eq!(stream.position(), stream.get_ref().len() as u64);
}

#[test]
fn test_header_refreshed_on_write() {
    let mut song = rich_song();
    song.header.song_length = 1;
    song.header.song_layers = 40;
    song.header.version = NbsVersion::V2;
    write_nbs_data(&mut song, NbsVersion::V4).unwrap();
    assert_eq!(song.header.version, NbsVersion::V4);
    assert_eq!(song.header.song_length, 70);
    assert_eq!(song.header.song_layers, 2);
}

#[test]
fn test_create_old_and_new() {
    let mut song = new_song(HeaderOverrides {
        song_name: Some("foo".to_string()),
        song_author: Some("bar".to_string()),
        ..Default::default()
    });
    for tick in [0, 2, 4, 6, 8] {
        song.notes.push(Note::new(tick, 0, 0, 45));
    }
    song.header.blocks_added = 9000;

    let new = write_nbs_data(&mut song, NbsVersion::CURRENT).unwrap();
    let old = write_nbs_data(&mut song, NbsVersion::V0).unwrap();
    assert_ne!(new, old);
    assert_eq!(&new[..3], &[0x00, 0x00, 0x05]);
    assert_eq!(&old[..2], &[0x08, 0x00]);

    let old_song = parse_nbs_data(&old).unwrap();
    assert_eq!(old_song.header.version, NbsVersion::V0);
    assert_eq!(old_song.header.song_name, "foo");
    assert_eq!(old_song.header.blocks_added, 9000);
    assert_eq!(old_song.chords().count(), 5);
}

#[test]
fn test_version_detection() {
    let mut song = rich_song();
    let data = write_nbs_data(&mut song, NbsVersion::V4).unwrap();
    assert_eq!(&data[..3], &[0x00, 0x00, 0x04]);
    assert_eq!(parse_nbs_data(&data).unwrap().header.version, NbsVersion::V4);

    let mut song = new_song(HeaderOverrides::default());
    song.notes.push(Note::new(5, 0, 0, 45));
    let data = write_nbs_data(&mut song, NbsVersion::V0).unwrap();
    assert_eq!(&data[..2], &[0x05, 0x00]);
    let read_back = parse_nbs_data(&data).unwrap();
    assert_eq!(read_back.header.version, NbsVersion::V0);
    assert_eq!(read_back.header.song_length, 5);
    // song layers follow the length directly
    assert_eq!(read_back.header.song_layers, 1);
}

#[test]
fn test_empty_notes_section() {
    let mut song = new_song(HeaderOverrides::default());
    let data = write_nbs_data(&mut song, NbsVersion::V5).unwrap();
    // header is followed by a single zero jump, then the layer
    let layer_and_instruments: [u8; 8] = [0x00, 0x00, 0x00, 0x00, 0x00, 100, 100, 0x00];
    let notes_end = data.len() - layer_and_instruments.len();
    assert_eq!(&data[notes_end..], &layer_and_instruments);
    assert_eq!(&data[notes_end - 2..notes_end], &[0x00, 0x00]);

    let read_back = parse_nbs_data(&data).unwrap();
    assert!(read_back.notes.is_empty());
    assert_eq!(read_back.chords().count(), 0);
}

#[test]
fn test_layer_panning_bias() {
    let mut song = new_song(HeaderOverrides::default());
    song.notes.push(Note::new(1, 0, 0, 45));
    song.layers[0].panning = -37;
    let data = write_nbs_data(&mut song, NbsVersion::V2).unwrap();
    // name, volume, panning, instrument count
    assert_eq!(&data[data.len() - 3..], &[100, 63, 0]);
    let read_back = parse_nbs_data(&data).unwrap();
    assert_eq!(read_back.layers[0].panning, -37);
}

#[test]
fn test_new_song_defaults() {
    let song = new_song(HeaderOverrides {
        song_name: Some("foo".to_string()),
        ..Default::default()
    });
    assert_eq!(
        song.layers,
        vec![Layer {
            id: 0,
            name: String::new(),
            lock: false,
            volume: 100,
            panning: 0,
        }]
    );
    assert!(song.notes.is_empty());
    assert!(song.instruments.is_empty());
    assert_eq!(song.header.song_name, "foo");
    assert_eq!(song.header.version, NbsVersion::V5);
    assert_eq!(song.header.tempo, 10.0);
    assert_eq!(song.header.default_instruments, 16);
}

#[test]
fn test_write_errors() {
    let mut song = new_song(HeaderOverrides {
        song_name: Some("日本".to_string()),
        ..Default::default()
    });
    assert!(matches!(
        write_nbs_data(&mut song, NbsVersion::V5),
        Err(NbsError::EncodingError(_))
    ));

    let mut song = new_song(HeaderOverrides::default());
    song.notes.push(Note::new(3, 1, 0, 45));
    song.notes.push(Note::new(3, 1, 0, 47));
    assert!(matches!(
        write_nbs_data(&mut song, NbsVersion::V5),
        Err(NbsError::DuplicateNote { tick: 3, layer: 1 })
    ));

    assert!(matches!(
        NbsVersion::try_from(6),
        Err(NbsError::UnsupportedVersion(6))
    ));
}

#[test]
fn test_parse_error() {
    let invalid_data = vec![0u8; 10];
    let result = parse_nbs_data(&invalid_data);
    assert!(result.is_err(), "Should return error for invalid data");
    assert!(
        matches!(result, Err(NbsError::Truncated(_))),
        "Should be a truncation error"
    );
}

#[test]
fn test_song_to_json() {
    let song = rich_song();
    let json = serde_json::to_string(&song).unwrap();
    let back: Song = serde_json::from_str(&json).unwrap();
    assert_eq!(back, song);
}
