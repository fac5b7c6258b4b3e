use std::{
    fs,
    path::{Path, PathBuf},
};

use bf2fil_core::QuantLevels;
use bf2fil_types::BlockGeometry;

use crate::{ConvertError, ConvertResult};

/// Полная конфигурация запуска конвертации.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Путь к JSON-заголовку наблюдения
    pub header_path: PathBuf,
    /// Путь к сырым отсчётам `f32`
    pub raw_path: PathBuf,
    /// Путь к выходному .fil файлу
    pub output_path: PathBuf,
    /// Размер подблока SK `m` (спектров)
    pub sub_block_size: usize,
    /// Подблоков в обрабатываемом блоке `n` (`ny = n·m`)
    pub sub_blocks: usize,
    /// Уровень значимости SK в сигмах
    pub sk_sigma: f64,
    /// Параметр формы SK `d`
    pub sk_shape: f64,
    /// Уровни квантования
    pub levels: QuantLevels,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl ConverterConfig {
    /// Проверяет параметры до открытия файлов.
    pub fn validate(&self) -> ConvertResult<()> {
        if self.sub_block_size < 2 {
            return Err(ConvertError::config(format!(
                "-m: sub-block size must be >= 2, got {}",
                self.sub_block_size
            )));
        }

        if self.sub_blocks == 0 {
            return Err(ConvertError::config("-n: sub-blocks per block must be >= 1"));
        }

        if !(self.sk_sigma.is_finite() && self.sk_sigma > 0.0) {
            return Err(ConvertError::config(format!(
                "-s: SK sigma must be > 0, got {}",
                self.sk_sigma
            )));
        }

        if !(self.sk_shape.is_finite() && self.sk_shape > 0.0) {
            return Err(ConvertError::config(format!(
                "-d: SK shape must be > 0, got {}",
                self.sk_shape
            )));
        }

        let QuantLevels { low, high } = self.levels;
        if !(low.is_finite() && high.is_finite() && low + high > 0.0) {
            return Err(ConvertError::config(format!(
                "-S: levels must be finite with low + high > 0, got {}",
                self.levels
            )));
        }

        let output = resolve_path(&self.output_path);
        if output == resolve_path(&self.raw_path) || output == resolve_path(&self.header_path) {
            return Err(ConvertError::config(format!(
                "-o: output {:?} would overwrite an input file",
                self.output_path
            )));
        }

        Ok(())
    }

    /// Геометрия блока для `nchans` каналов.
    pub fn geometry(
        &self,
        nchans: usize,
    ) -> ConvertResult<BlockGeometry> {
        Ok(BlockGeometry::new(nchans, self.sub_block_size, self.sub_blocks)?)
    }
}

/// Абсолютный путь без `..` и симлинков, в том числе для ещё не созданного
/// файла (разрешается родительский каталог). Если каталог не существует,
/// путь возвращается как есть.
fn resolve_path(path: &Path) -> PathBuf {
    if let Ok(p) = fs::canonicalize(path) {
        return p;
    }

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    match (fs::canonicalize(parent), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            header_path: PathBuf::new(),
            raw_path: PathBuf::new(),
            output_path: PathBuf::from("test.fil"),
            sub_block_size: 1024,
            sub_blocks: 120,
            sk_sigma: 4.0,
            sk_shape: 12.0,
            levels: QuantLevels::default(),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
