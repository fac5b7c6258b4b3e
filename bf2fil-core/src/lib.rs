//! Ядро bf2fil
//!
//! Кодек заголовка SIGPROC filterbank, потоковое чтение сырых отсчётов,
//! маскирование RFI по спектральному эксцессу и 8-битное переквантование.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use bf2fil_core::{compute_mask, compute_sk_thresholds, BlockStats, MaskParams};
//! use bf2fil_types::BlockGeometry;
//!
//! let geom = BlockGeometry::new(400, 1024, 120)?;
//! let limits = compute_sk_thresholds(geom.m, 4.0, 12.0)?;
//! let params = MaskParams { shape: 12.0, limits, tail_limits: None };
//!
//! let block = vec![1.0f32; geom.len()];
//! let mut stats = BlockStats::new(&geom);
//! let masked = compute_mask(&block, &geom, &params, &mut stats)?;
//! println!("{masked} cells masked");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binary;
pub mod format;
pub mod header_io;
pub mod mask;
pub mod quantize;
pub mod serialization;
pub mod sk;
pub mod special;

pub use bf2fil_types::*;
pub use format::*;
pub use header_io::*;
pub use mask::*;
pub use quantize::*;
pub use serialization::*;
pub use sk::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert_eq!(FIL_NBITS, 8);
        assert_eq!(HEADER_START, "HEADER_START");
        assert_eq!(ZERO_VARIANCE_FALLBACK, 0);
    }
}
