use bf2fil_types::FilError;
use thiserror::Error;

pub type ConvertResult<T> = std::result::Result<T, ConvertError>;

/// Код выхода при ошибке конфигурации (EX_USAGE).
pub const EXIT_CONFIG: i32 = 64;
/// Код выхода при ошибке данных или численной ошибке (EX_DATAERR).
pub const EXIT_DATA: i32 = 65;
/// Код выхода при ошибке ввода/вывода (EX_IOERR).
pub const EXIT_IO: i32 = 74;

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Недопустимые параметры запуска
    #[error("Config error: {0}")]
    Config(String),

    /// Ошибка открытия, чтения или записи файла
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка заголовка, формата или численного расчёта
    #[error("{0}")]
    Fil(#[from] FilError),
}

impl ConvertError {
    pub fn config<S: Into<String>>(s: S) -> Self {
        Self::Config(s.into())
    }

    /// Код завершения процесса для этой ошибки.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::Config(_) => EXIT_CONFIG,
            ConvertError::Io(_) | ConvertError::Fil(FilError::Io(_)) => EXIT_IO,
            ConvertError::Fil(_) => EXIT_DATA,
        }
    }
}
