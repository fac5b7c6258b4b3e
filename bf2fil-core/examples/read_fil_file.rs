//! Пример: чтение заголовка и статистики 8-битного .fil файла
//!
//! Демонстрирует:
//! - разбор SIGPROC-заголовка через read_fil_header
//! - подсчёт спектров по длине данных
//! - гистограмму квантованных значений по первому спектру

use std::fs;

use bf2fil_core::read_fil_header;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let input_path = std::env::args().nth(1).unwrap_or_else(|| "test.fil".to_string());

    let (h, header_len) = match read_fil_header(&input_path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("✗ Header parse failed: {e}");
            return Err(Box::new(e));
        }
    };

    println!("✓ Header parsed ({header_len} bytes)");
    println!("  Source        : {}", h.source_name);
    println!("  Telescope/BE  : {}/{}", h.telescope_id, h.machine_id);
    println!("  fch1          : {} MHz", h.fch1);
    println!("  foff          : {} MHz", h.foff);
    println!("  Channels      : {}", h.nchans);
    println!("  Bits          : {}", h.nbits);
    println!("  tsamp         : {} s", h.tsamp);
    println!("  tstart        : {} MJD", h.tstart);

    let data = fs::read(&input_path)?;
    let data = &data[header_len..];
    let spectrum = h.spectrum_bytes();

    println!("\n✓ Data");
    println!("  Bytes         : {}", data.len());
    println!("  Spectra       : {}", data.len() / spectrum.max(1));
    if data.len() % spectrum.max(1) != 0 {
        println!("  Partial tail  : {} bytes", data.len() % spectrum);
    }

    // --- Нули и насыщения в первом спектре ---
    if let Some(first) = data.chunks_exact(spectrum.max(1)).next() {
        let zeros = first.iter().filter(|&&v| v == 0).count();
        let clipped = first.iter().filter(|&&v| v == 255).count();
        println!("\nFirst spectrum:");
        println!("  zero  : {zeros}");
        println!("  255   : {clipped}");
    }

    Ok(())
}
