use std::io::{BufWriter, ErrorKind, Read, Write};

use bf2fil_types::{FilError, FilResult};
use byteorder::{ByteOrder, LittleEndian};
use log::warn;

const F32_SIZE: usize = std::mem::size_of::<f32>();

/// Потоковый читатель сырых отсчётов `f32` (little-endian).
pub struct RawBlockReader<R: Read> {
    reader: R,
    byte_buf: Vec<u8>,
    stats: ReadStats,
    eof: bool,
}

/// Потоковый писатель 8-битных отсчётов filterbank.
///
/// Заголовок пишется отдельно (см. [`crate::write_header`]), сюда попадают
/// только данные.
pub struct FilterbankWriter<W: Write> {
    writer: BufWriter<W>,
    blocks_written: u64,
    bytes_written: u64,
}

/// Статистика, накопленная [`RawBlockReader`] в процессе чтения.
#[derive(Debug, Default, Clone)]
pub struct ReadStats {
    /// Вызовов `read_block`, вернувших хотя бы один отсчёт.
    pub blocks: u64,
    /// Всего прочитано отсчётов.
    pub floats_read: u64,
    /// Всего прочитано байт.
    pub bytes_read: u64,
    /// Байт в хвосте потока, не образующих целый `f32`.
    pub trailing_bytes: u64,
}

impl<R: Read> RawBlockReader<R> {
    /// Создаёт читатель с буфером на `capacity` отсчётов.
    pub fn new(
        inner: R,
        capacity: usize,
    ) -> Self {
        Self {
            reader: inner,
            byte_buf: vec![0u8; capacity * F32_SIZE],
            stats: ReadStats::default(),
            eof: false,
        }
    }

    /// Читает до `out.len()` отсчётов. Возвращает количество прочитанных.
    ///
    /// Меньше запрошенного возвращается только в конце потока.
    pub fn read_block(
        &mut self,
        out: &mut [f32],
    ) -> FilResult<usize> {
        let want = out.len() * F32_SIZE;

        if want > self.byte_buf.len() {
            return Err(FilError::format_violation(format!(
                "requested {} floats, reader capacity is {}",
                out.len(),
                self.byte_buf.len() / F32_SIZE
            )));
        }

        let mut filled = 0;

        while filled < want && !self.eof {
            match self.reader.read(&mut self.byte_buf[filled..want]) {
                Ok(0) => self.eof = true,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FilError::Io(e)),
            }
        }

        let nread = filled / F32_SIZE;
        let rem = filled % F32_SIZE;

        if rem > 0 {
            warn!("Raw stream ends with {rem} bytes that do not form a float, ignored");
            self.stats.trailing_bytes += rem as u64;
        }

        LittleEndian::read_f32_into(&self.byte_buf[..nread * F32_SIZE], &mut out[..nread]);

        if nread > 0 {
            self.stats.blocks += 1;
        }
        self.stats.floats_read += nread as u64;
        self.stats.bytes_read += filled as u64;

        Ok(nread)
    }

    /// Накопленная статистика чтения.
    pub fn stats(&self) -> &ReadStats {
        &self.stats
    }
}

impl<W: Write> FilterbankWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: BufWriter::new(inner),
            blocks_written: 0,
            bytes_written: 0,
        }
    }

    /// Записывает один блок квантованных отсчётов.
    pub fn write_block(
        &mut self,
        data: &[u8],
    ) -> FilResult<()> {
        self.writer.write_all(data)?;
        self.blocks_written += 1;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    /// Сбрасывает буфер и возвращает внутренний поток.
    pub fn finish(self) -> FilResult<W> {
        self.writer
            .into_inner()
            .map_err(|e| FilError::Io(e.into_error()))
    }

    /// Количество вызовов [`write_block`](Self::write_block).
    pub fn block_count(&self) -> u64 {
        self.blocks_written
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}
