//! Чтение заголовка наблюдения и запись заголовка filterbank на диск.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use bf2fil_types::{FilResult, ObservationHeader};
use log::debug;

use crate::format::FilterbankHeader;

/// Читает JSON-заголовок наблюдения и проверяет его.
pub fn read_header<P: AsRef<Path>>(path: P) -> FilResult<ObservationHeader> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let header: ObservationHeader = serde_json::from_reader(reader)?;

    header.validate()?;

    debug!(
        "Header {:?}: nchans={}, fch1={} MHz, foff={} MHz, tsamp={} s",
        path, header.nchans, header.fch1, header.foff, header.tsamp
    );

    Ok(header)
}

/// Записывает заголовок filterbank, перезаписывая файл.
///
/// Данные затем дописываются в тот же файл в режиме append.
pub fn write_header<P: AsRef<Path>>(
    path: P,
    header: &FilterbankHeader,
) -> FilResult<()> {
    let mut out = BufWriter::new(File::create(path.as_ref())?);

    header.write_to(&mut out)?;
    out.flush()?;

    Ok(())
}

/// Читает заголовок filterbank из файла.
///
/// Возвращает заголовок и смещение первого отсчёта.
pub fn read_fil_header<P: AsRef<Path>>(path: P) -> FilResult<(FilterbankHeader, usize)> {
    let mut reader = BufReader::new(File::open(path.as_ref())?);
    FilterbankHeader::deserialize(&mut reader)
}
