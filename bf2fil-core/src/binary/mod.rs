//! Примитивы потока ключевых слов SIGPROC.
//!
//! Строка кодируется как `i32` длина + байты, целые как `i32`, вещественные
//! как `f64`. Все числа little-endian.

pub mod read;
pub mod write;

pub use read::*;
pub use write::*;

/// Максимальная длина строки в заголовке. Всё, что длиннее, считаем мусором.
pub const MAX_STRING_LEN: usize = 80;
