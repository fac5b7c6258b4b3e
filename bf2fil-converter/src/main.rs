use std::{path::PathBuf, time::Instant};

use bf2fil_converter::{convert, ConverterConfig};
use bf2fil_core::QuantLevels;
use clap::Parser;
use log::{error, info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "bf2fil",
    version = env!("CARGO_PKG_VERSION"),
    about = "Convert beamformed raw power data to 8-bit filterbank with SK RFI excision",
    long_about = None,
)]
struct Cli {
    /// JSON-заголовок наблюдения
    #[arg(short = 'f', long = "header")]
    header: PathBuf,
    /// Сырые отсчёты f32 (little-endian, канал меняется быстрее времени)
    #[arg(short = 'r', long = "raw")]
    raw: PathBuf,
    /// Размер подблока SK (спектров)
    #[arg(short = 'm', long = "sub-block", default_value = "1024")]
    sub_block: usize,
    /// Уровень значимости SK (сигм)
    #[arg(short = 's', long = "sigma", default_value = "4.0")]
    sigma: f64,
    /// Параметр формы SK d
    #[arg(short = 'd', long = "shape", default_value = "12.0")]
    shape: f64,
    /// Подблоков в обрабатываемом блоке
    #[arg(short = 'n', long = "sub-blocks", default_value = "120")]
    sub_blocks: usize,
    /// Уровни квантования low,high (в СКО канала)
    #[arg(short = 'S', long = "levels", default_value = "3.0,5.0")]
    levels: QuantLevels,
    /// Путь к выходному .fil файлу
    #[arg(short = 'o', long = "output", default_value = "test.fil")]
    output: PathBuf,
    /// Тихий режим (только ошибки)
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> ConverterConfig {
        ConverterConfig {
            header_path: self.header,
            raw_path: self.raw,
            output_path: self.output,
            sub_block_size: self.sub_block,
            sub_blocks: self.sub_blocks,
            sk_sigma: self.sigma,
            sk_shape: self.shape,
            levels: self.levels,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let level = if cli.quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_target(false)
        .format_timestamp_secs()
        .init();

    let config = cli.into_config();

    if let Err(e) = config.validate() {
        error!("{e}");
        std::process::exit(e.exit_code());
    }

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Header        : {:?}", config.header_path);
    info!("  Raw data      : {:?}", config.raw_path);
    info!("  Output        : {:?}", config.output_path);
    info!(
        "  SK            : m={}, sigma={}, d={}",
        config.sub_block_size, config.sk_sigma, config.sk_shape
    );
    info!("  Block         : {} sub-blocks", config.sub_blocks);
    info!("  Levels        : {}", config.levels);
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let session_start = Instant::now();

    let metrics = match convert(&config) {
        Ok(m) => m,
        Err(e) => {
            error!("Conversion failed: {e}");
            std::process::exit(e.exit_code());
        }
    };

    // --- Итоговая статистика ---
    let summary = metrics.summary(&session_start);
    info!("\n{summary}");

    if summary.masked_pct > 50.0 {
        warn!(
            "⚠ {:.1}% of cells masked. Check -d/-m against the data or raise -s",
            summary.masked_pct
        );
    }

    info!("✓ Conversion complete: {:?}", config.output_path);
}
