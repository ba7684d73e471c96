use crate::NbsError;
use encoding_rs::WINDOWS_1252;
use std::io::Write;

/// Write unsigned byte
pub fn write_u8<W: Write>(w: &mut W, value: u8) -> Result<(), NbsError> {
    w.write_all(&[value])?;
    Ok(())
}

/// Write bool as a 0/1 byte
pub fn write_bool<W: Write>(w: &mut W, value: bool) -> Result<(), NbsError> {
    write_u8(w, u8::from(value))
}

/// Write unsigned short
pub fn write_u16<W: Write>(w: &mut W, value: u16) -> Result<(), NbsError> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Write signed short
pub fn write_i16<W: Write>(w: &mut W, value: i16) -> Result<(), NbsError> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Write unsigned 32
pub fn write_u32<W: Write>(w: &mut W, value: u32) -> Result<(), NbsError> {
    w.write_all(&value.to_le_bytes())?;
    Ok(())
}

/// Write panning biased by +100
pub fn write_panning<W: Write>(w: &mut W, panning: i16) -> Result<(), NbsError> {
    let biased = u8::try_from(i32::from(panning) + 100)
        .map_err(|_| NbsError::OutOfRange(format!("panning {panning}")))?;
    write_u8(w, biased)
}

/// Encode text to Windows-1252, failing on characters outside the code page
pub fn encode_string(value: &str) -> Result<Vec<u8>, NbsError> {
    let (bytes, _encoding_used, had_unmappable) = WINDOWS_1252.encode(value);
    if had_unmappable {
        log::debug!("Cannot encode {value:?} with {:?}", WINDOWS_1252.name());
        return Err(NbsError::EncodingError(format!(
            "{value:?} is not representable in windows-1252"
        )));
    }
    Ok(bytes.into_owned())
}

/// Write string prefixed by its encoded size as u32.
/// [u32 string_len][string_len bytes field]
pub fn write_int_sized_string<W: Write>(w: &mut W, value: &str) -> Result<(), NbsError> {
    let bytes = encode_string(value)?;
    let len = u32::try_from(bytes.len())
        .map_err(|_| NbsError::OutOfRange(format!("string of {} bytes", bytes.len())))?;
    write_u32(w, len)?;
    w.write_all(&bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_int_sized_string() {
        let mut out = vec![];
        write_int_sized_string(&mut out, "café €").unwrap();
        assert_eq!(
            out,
            vec![0x06, 0x00, 0x00, 0x00, 0x63, 0x61, 0x66, 0xe9, 0x20, 0x80]
        );
    }

    #[test]
    fn test_write_unmappable_string() {
        let mut out = vec![];
        let res = write_int_sized_string(&mut out, "音符");
        assert!(matches!(res, Err(NbsError::EncodingError(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn test_write_numbers() {
        let mut out = vec![];
        write_u16(&mut out, 0x1234).unwrap();
        write_i16(&mut out, -2).unwrap();
        write_u32(&mut out, 7).unwrap();
        write_bool(&mut out, true).unwrap();
        assert_eq!(
            out,
            vec![0x34, 0x12, 0xfe, 0xff, 0x07, 0x00, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn test_write_panning() {
        let mut out = vec![];
        write_panning(&mut out, -37).unwrap();
        write_panning(&mut out, 100).unwrap();
        assert_eq!(out, vec![63, 200]);
        assert!(matches!(
            write_panning(&mut out, -101),
            Err(NbsError::OutOfRange(_))
        ));
        assert!(matches!(
            write_panning(&mut out, 156),
            Err(NbsError::OutOfRange(_))
        ));
    }
}
