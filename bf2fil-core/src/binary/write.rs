use std::io::Write;

use bf2fil_types::{FilError, FilResult};
use byteorder::{LittleEndian, WriteBytesExt};

use super::MAX_STRING_LEN;

pub fn write_string<W: Write>(
    out: &mut W,
    s: &str,
) -> FilResult<()> {
    if s.len() > MAX_STRING_LEN {
        return Err(FilError::format_violation(format!(
            "string '{s}' exceeds {MAX_STRING_LEN} bytes"
        )));
    }

    out.write_i32::<LittleEndian>(s.len() as i32)?;
    out.write_all(s.as_bytes())?;
    Ok(())
}

pub fn write_int<W: Write>(
    out: &mut W,
    key: &str,
    val: i32,
) -> FilResult<()> {
    write_string(out, key)?;
    out.write_i32::<LittleEndian>(val)?;
    Ok(())
}

pub fn write_double<W: Write>(
    out: &mut W,
    key: &str,
    val: f64,
) -> FilResult<()> {
    write_string(out, key)?;
    out.write_f64::<LittleEndian>(val)?;
    Ok(())
}

pub fn write_keyword_string<W: Write>(
    out: &mut W,
    key: &str,
    val: &str,
) -> FilResult<()> {
    write_string(out, key)?;
    write_string(out, val)
}
