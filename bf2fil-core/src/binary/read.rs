use std::io::Read;

use bf2fil_types::{FilError, FilResult};
use byteorder::{LittleEndian, ReadBytesExt};

use super::MAX_STRING_LEN;

/// Читает строку SIGPROC, сдвигая `off` на количество прочитанных байт.
pub fn read_string<R: Read>(
    input: &mut R,
    off: &mut usize,
) -> FilResult<String> {
    let len = input.read_i32::<LittleEndian>()?;

    if len <= 0 || len as usize > MAX_STRING_LEN {
        return Err(FilError::format_violation(format!(
            "string length {len} at offset {off} out of range 1..={MAX_STRING_LEN}"
        )));
    }

    let mut buf = vec![0u8; len as usize];
    input.read_exact(&mut buf)?;
    *off += 4 + buf.len();

    String::from_utf8(buf)
        .map_err(|e| FilError::format_violation(format!("non UTF-8 string: {e}")))
}

pub fn read_int<R: Read>(
    input: &mut R,
    off: &mut usize,
) -> FilResult<i32> {
    let v = input.read_i32::<LittleEndian>()?;
    *off += 4;
    Ok(v)
}

pub fn read_double<R: Read>(
    input: &mut R,
    off: &mut usize,
) -> FilResult<f64> {
    let v = input.read_f64::<LittleEndian>()?;
    *off += 8;
    Ok(v)
}
