use encoding_rs::WINDOWS_1252;
use nom::combinator::{flat_map, map};
use nom::{bytes, number, IResult, Parser};

/// Parse unsigned byte
pub fn parse_u8(i: &[u8]) -> IResult<&[u8], u8> {
    number::complete::le_u8(i)
}

/// Parse bool
pub fn parse_bool(i: &[u8]) -> IResult<&[u8], bool> {
    map(number::complete::le_u8, |b| b == 1).parse(i)
}

/// Parse unsigned short
pub fn parse_u16(i: &[u8]) -> IResult<&[u8], u16> {
    number::complete::le_u16(i)
}

/// Parse signed short
pub fn parse_i16(i: &[u8]) -> IResult<&[u8], i16> {
    number::complete::le_i16(i)
}

/// Parse unsigned 32
pub fn parse_u32(i: &[u8]) -> IResult<&[u8], u32> {
    number::complete::le_u32(i)
}

/// Parse byte biased by +100 to stay unsigned on the wire
pub fn parse_panning(i: &[u8]) -> IResult<&[u8], i16> {
    map(parse_u8, |b| i16::from(b) - 100).parse(i)
}

/// Materialize Windows-1252 encoded String
fn make_string(i: &[u8]) -> String {
    // every byte has a mapping in the WHATWG variant of Windows-1252
    let (cow, _had_errors) = WINDOWS_1252.decode_without_bom_handling(i);
    cow.into_owned()
}

/// Parse string of length `len`.
fn parse_string(len: u32) -> impl FnMut(&[u8]) -> IResult<&[u8], String> {
    move |i: &[u8]| {
        let (rest, field) = bytes::complete::take(len as usize)(i)?;
        log::debug!("Raw string field len={len} raw={field:02X?}");
        Ok((rest, make_string(field)))
    }
}

/// Size of string encoded as Int.
/// [u32 string_len][string_len bytes field]
pub fn parse_int_sized_string(i: &[u8]) -> IResult<&[u8], String> {
    flat_map(parse_u32, parse_string).parse(i)
}
