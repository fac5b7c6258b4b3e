use thiserror::Error;

/// Результат для операций bf2fil.
pub type FilResult<T> = std::result::Result<T, FilError>;

/// Ошибки формата, заголовков и численных расчётов.
#[derive(Debug, Error)]
pub enum FilError {
    /// Ошибки ввода/вывода (автоконвертируются из std::io::Error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Заголовок наблюдения не разбирается как JSON
    #[error("Header JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Заголовок прочитан, но его значения недопустимы
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Нарушение формата filterbank
    #[error("Format violation: {0}")]
    FormatViolation(String),

    /// Численная задача не имеет решения (порог SK, нулевая дисперсия)
    #[error("Numeric error: {0}")]
    Numeric(String),
}

impl FilError {
    /// Удобные конструкторы
    pub fn invalid_header<S: Into<String>>(s: S) -> Self {
        Self::InvalidHeader(s.into())
    }

    pub fn format_violation<S: Into<String>>(s: S) -> Self {
        Self::FormatViolation(s.into())
    }

    pub fn numeric<S: Into<String>>(s: S) -> Self {
        Self::Numeric(s.into())
    }
}
