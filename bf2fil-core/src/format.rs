//! Заголовок SIGPROC filterbank.
//!
//! Заголовок представляет собой поток пар «ключевое слово — значение»,
//! обрамлённый строками `HEADER_START` и `HEADER_END`. Сразу за ним следуют
//! 8-битные отсчёты, спектр за спектром.

use std::io::{Read, Write};

use bf2fil_types::{FilError, FilResult, ObservationHeader};

use crate::binary::{
    read_double, read_int, read_string, write_double, write_int, write_keyword_string,
    write_string,
};

/// Открывающее ключевое слово заголовка
pub const HEADER_START: &str = "HEADER_START";

/// Закрывающее ключевое слово заголовка
pub const HEADER_END: &str = "HEADER_END";

/// Разрядность выходных отсчётов
pub const FIL_NBITS: i32 = 8;

/// `data_type` SIGPROC для filterbank-данных
pub const FIL_DATA_TYPE_FILTERBANK: i32 = 1;

/// Заголовок выходного filterbank-файла.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterbankHeader {
    pub source_name: String,
    pub machine_id: i32,
    pub telescope_id: i32,
    /// Прямое восхождение (hhmmss.s)
    pub src_raj: f64,
    /// Склонение (ddmmss.s)
    pub src_dej: f64,
    /// Азимут начала, градусы
    pub az_start: f64,
    /// Зенитное расстояние начала, градусы
    pub za_start: f64,
    pub data_type: i32,
    /// Центральная частота первого канала, МГц
    pub fch1: f64,
    /// Ширина канала, МГц
    pub foff: f64,
    pub nchans: i32,
    pub nbits: i32,
    /// Время начала, MJD
    pub tstart: f64,
    /// Интервал между спектрами, с
    pub tsamp: f64,
    /// Количество поляризаций (IF)
    pub nifs: i32,
    pub barycentric: i32,
    pub pulsarcentric: i32,
    /// Опорная мера дисперсии, пк/см³
    pub refdm: f64,
    /// Количество спектров (0 если неизвестно)
    pub nsamples: i32,
}

impl FilterbankHeader {
    /// Строит заголовок из метаданных наблюдения.
    ///
    /// Фиксированные поля: 8 бит, одна поляризация, не барицентрический,
    /// не пульсароцентрический, нулевые DM и смещения наведения.
    pub fn from_observation(obs: &ObservationHeader) -> FilResult<Self> {
        let nchans = i32::try_from(obs.nchans).map_err(|_| {
            FilError::invalid_header(format!("nchans {} does not fit i32", obs.nchans))
        })?;

        let nsamples = i32::try_from(obs.nsamples).map_err(|_| {
            FilError::invalid_header(format!("nsamples {} does not fit i32", obs.nsamples))
        })?;

        Ok(Self {
            source_name: obs.source_name.clone(),
            machine_id: obs.machine_id,
            telescope_id: obs.telescope_id,
            src_raj: obs.src_raj,
            src_dej: obs.src_dej,
            az_start: 0.0,
            za_start: 0.0,
            data_type: FIL_DATA_TYPE_FILTERBANK,
            fch1: obs.fch1,
            foff: obs.foff,
            nchans,
            nbits: FIL_NBITS,
            tstart: obs.tstart,
            tsamp: obs.tsamp,
            nifs: 1,
            barycentric: 0,
            pulsarcentric: 0,
            refdm: 0.0,
            nsamples,
        })
    }

    /// Сериализует заголовок в поток ключевых слов.
    pub fn serialize(&self) -> FilResult<Vec<u8>> {
        let mut buf = Vec::with_capacity(512);

        write_string(&mut buf, HEADER_START)?;

        // Пустое имя источника SIGPROC не пишет
        if !self.source_name.is_empty() {
            write_keyword_string(&mut buf, "source_name", &self.source_name)?;
        }

        write_int(&mut buf, "machine_id", self.machine_id)?;
        write_int(&mut buf, "telescope_id", self.telescope_id)?;
        write_double(&mut buf, "src_raj", self.src_raj)?;
        write_double(&mut buf, "src_dej", self.src_dej)?;
        write_double(&mut buf, "az_start", self.az_start)?;
        write_double(&mut buf, "za_start", self.za_start)?;
        write_int(&mut buf, "data_type", self.data_type)?;
        write_double(&mut buf, "fch1", self.fch1)?;
        write_double(&mut buf, "foff", self.foff)?;
        write_int(&mut buf, "nchans", self.nchans)?;
        write_int(&mut buf, "nbits", self.nbits)?;
        write_double(&mut buf, "tstart", self.tstart)?;
        write_double(&mut buf, "tsamp", self.tsamp)?;
        write_int(&mut buf, "nifs", self.nifs)?;
        write_int(&mut buf, "barycentric", self.barycentric)?;
        write_int(&mut buf, "pulsarcentric", self.pulsarcentric)?;
        write_double(&mut buf, "refdm", self.refdm)?;
        write_int(&mut buf, "nsamples", self.nsamples)?;

        write_string(&mut buf, HEADER_END)?;

        Ok(buf)
    }

    /// Пишет сериализованный заголовок в поток.
    pub fn write_to<W: Write>(
        &self,
        out: &mut W,
    ) -> FilResult<()> {
        out.write_all(&self.serialize()?)?;
        Ok(())
    }

    /// Разбирает заголовок из потока.
    ///
    /// Возвращает заголовок и его длину в байтах (смещение первого отсчёта).
    pub fn deserialize<R: Read>(input: &mut R) -> FilResult<(Self, usize)> {
        let mut off = 0;

        let start = read_string(input, &mut off)?;
        if start != HEADER_START {
            return Err(FilError::format_violation(format!(
                "expected {HEADER_START}, found '{start}'"
            )));
        }

        let mut h = Self::empty();

        loop {
            let key = read_string(input, &mut off)?;

            match key.as_str() {
                HEADER_END => break,
                "source_name" => h.source_name = read_string(input, &mut off)?,
                // Встречается в заголовках сторонних утилит, значение не нужно
                "rawdatafile" => {
                    read_string(input, &mut off)?;
                }
                "machine_id" => h.machine_id = read_int(input, &mut off)?,
                "telescope_id" => h.telescope_id = read_int(input, &mut off)?,
                "data_type" => h.data_type = read_int(input, &mut off)?,
                "nchans" => h.nchans = read_int(input, &mut off)?,
                "nbits" => h.nbits = read_int(input, &mut off)?,
                "nifs" => h.nifs = read_int(input, &mut off)?,
                "barycentric" => h.barycentric = read_int(input, &mut off)?,
                "pulsarcentric" => h.pulsarcentric = read_int(input, &mut off)?,
                "nsamples" => h.nsamples = read_int(input, &mut off)?,
                "nbeams" | "ibeam" => {
                    read_int(input, &mut off)?;
                }
                "src_raj" => h.src_raj = read_double(input, &mut off)?,
                "src_dej" => h.src_dej = read_double(input, &mut off)?,
                "az_start" => h.az_start = read_double(input, &mut off)?,
                "za_start" => h.za_start = read_double(input, &mut off)?,
                "fch1" => h.fch1 = read_double(input, &mut off)?,
                "foff" => h.foff = read_double(input, &mut off)?,
                "tstart" => h.tstart = read_double(input, &mut off)?,
                "tsamp" => h.tsamp = read_double(input, &mut off)?,
                "refdm" => h.refdm = read_double(input, &mut off)?,
                other => {
                    return Err(FilError::format_violation(format!(
                        "unknown header keyword '{other}' at offset {off}"
                    )));
                }
            }
        }

        if h.nchans <= 0 {
            return Err(FilError::format_violation("header has no nchans"));
        }

        Ok((h, off))
    }

    /// Размер одного спектра в байтах.
    pub fn spectrum_bytes(&self) -> usize {
        self.nchans.max(0) as usize * self.nbits.max(0) as usize / 8
    }

    fn empty() -> Self {
        Self {
            source_name: String::new(),
            machine_id: 0,
            telescope_id: 0,
            src_raj: 0.0,
            src_dej: 0.0,
            az_start: 0.0,
            za_start: 0.0,
            data_type: 0,
            fch1: 0.0,
            foff: 0.0,
            nchans: 0,
            nbits: 0,
            tstart: 0.0,
            tsamp: 0.0,
            nifs: 0,
            barycentric: 0,
            pulsarcentric: 0,
            refdm: 0.0,
            nsamples: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn make_observation() -> ObservationHeader {
        ObservationHeader {
            nchans: 400,
            foff: 0.1953125,
            fch1: 110.09765625,
            tsamp: 0.00524288,
            tstart: 60_000.5,
            source_name: "B0329+54".to_string(),
            src_raj: 33259.37,
            src_dej: 543443.5,
            telescope_id: 11,
            machine_id: 11,
            nsamples: 12_345,
        }
    }

    #[test]
    fn test_fixed_fields() {
        let h = FilterbankHeader::from_observation(&make_observation()).unwrap();

        assert_eq!(h.nbits, 8);
        assert_eq!(h.nifs, 1);
        assert_eq!(h.data_type, 1);
        assert_eq!(h.barycentric, 0);
        assert_eq!(h.pulsarcentric, 0);
        assert_eq!(h.refdm, 0.0);
        assert_eq!(h.az_start, 0.0);
        assert_eq!(h.za_start, 0.0);
        assert_eq!(h.nsamples, 12_345);
        assert_eq!(h.spectrum_bytes(), 400);
    }

    #[test]
    fn test_header_starts_and_ends_with_markers() {
        let h = FilterbankHeader::from_observation(&make_observation()).unwrap();
        let bytes = h.serialize().unwrap();

        assert_eq!(&bytes[0..4], &12i32.to_le_bytes());
        assert_eq!(&bytes[4..16], b"HEADER_START");

        let tail = &bytes[bytes.len() - 14..];
        assert_eq!(&tail[0..4], &10i32.to_le_bytes());
        assert_eq!(&tail[4..], b"HEADER_END");
    }

    #[test]
    fn test_deserialize_reports_header_length() {
        let h = FilterbankHeader::from_observation(&make_observation()).unwrap();
        let mut bytes = h.serialize().unwrap();
        let header_len = bytes.len();
        bytes.extend_from_slice(&[1, 2, 3, 4]);

        let (parsed, off) = FilterbankHeader::deserialize(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(parsed, h);
        assert_eq!(off, header_len);
    }

    #[test]
    fn test_empty_source_name_skipped() {
        let mut obs = make_observation();
        obs.source_name.clear();
        let h = FilterbankHeader::from_observation(&obs).unwrap();
        let bytes = h.serialize().unwrap();

        assert!(!bytes.windows(11).any(|w| w == b"source_name"));
        let (parsed, _) = FilterbankHeader::deserialize(&mut Cursor::new(&bytes)).unwrap();
        assert_eq!(parsed.source_name, "");
    }

    #[test]
    fn test_unknown_keyword_rejected() {
        let mut bytes = Vec::new();
        write_string(&mut bytes, HEADER_START).unwrap();
        write_int(&mut bytes, "nchans", 4).unwrap();
        write_int(&mut bytes, "scan_number", 0).unwrap();
        write_string(&mut bytes, HEADER_END).unwrap();

        let res = FilterbankHeader::deserialize(&mut Cursor::new(&bytes));
        assert!(matches!(res, Err(FilError::FormatViolation(_))));
    }

    #[test]
    fn test_missing_start_marker() {
        let mut bytes = Vec::new();
        write_int(&mut bytes, "nchans", 4).unwrap();

        assert!(FilterbankHeader::deserialize(&mut Cursor::new(&bytes)).is_err());
    }

    #[test]
    fn test_nsamples_overflow_rejected() {
        let mut obs = make_observation();
        obs.nsamples = u64::MAX;
        assert!(matches!(
            FilterbankHeader::from_observation(&obs),
            Err(FilError::InvalidHeader(_))
        ));
    }
}
