use std::time::{Duration, Instant};

/// Счётчики сессии конвертации.
#[derive(Debug, Default, Clone)]
pub struct ConversionMetrics {
    pub blocks_processed: u64,
    /// Вызовов записи блока в выходной файл
    pub blocks_written: u64,
    pub floats_read: u64,
    pub bytes_written: u64,
    /// Проверено ячеек (канал × подблок)
    pub cells_tested: u64,
    pub cells_masked: u64,
    /// Каналов, записанных константой из-за нулевой дисперсии (по всем блокам)
    pub fallback_channels: u64,
    /// Байт в конце входа, не образующих целый `f32`
    pub trailing_bytes: u64,
    pub read_time: Duration,
    pub mask_time: Duration,
    pub quantize_time: Duration,
    pub write_time: Duration,
}

/// Snapshot метрик для отображения / тестирования.
#[derive(Debug, Clone)]
pub struct MetricsSummary {
    pub duration_secs: f64,
    pub blocks_processed: u64,
    pub floats_read: u64,
    pub bytes_written: u64,
    pub cells_masked: u64,
    pub masked_pct: f64,
    pub fallback_channels: u64,
    pub trailing_bytes: u64,
    pub read_speed_mbps: f64,
    pub stage_secs: [f64; 4],
}

impl ConversionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Процент замаскированных ячеек (0.0-100.0).
    pub fn masked_pct(&self) -> f64 {
        if self.cells_tested == 0 {
            0.0
        } else {
            self.cells_masked as f64 / self.cells_tested as f64 * 100.0
        }
    }

    /// Скорость чтения входа в МБ/с.
    pub fn read_speed_mbps(
        &self,
        elapsed: &Instant,
    ) -> f64 {
        let secs = elapsed.elapsed().as_secs_f64();

        if secs < 1e-9 {
            return 0.0;
        }

        (self.floats_read * 4) as f64 / secs / 1_000_000.0
    }

    /// Итоговая сводка для вывода в конце сессии.
    pub fn summary(
        &self,
        elapsed: &Instant,
    ) -> MetricsSummary {
        MetricsSummary {
            duration_secs: elapsed.elapsed().as_secs_f64(),
            blocks_processed: self.blocks_processed,
            floats_read: self.floats_read,
            bytes_written: self.bytes_written,
            cells_masked: self.cells_masked,
            masked_pct: self.masked_pct(),
            fallback_channels: self.fallback_channels,
            trailing_bytes: self.trailing_bytes,
            read_speed_mbps: self.read_speed_mbps(elapsed),
            stage_secs: [
                self.read_time.as_secs_f64(),
                self.mask_time.as_secs_f64(),
                self.quantize_time.as_secs_f64(),
                self.write_time.as_secs_f64(),
            ],
        }
    }
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        let [read, mask, quantize, write] = self.stage_secs;

        writeln!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")?;
        writeln!(f, "  Duration      : {:.1}s", self.duration_secs)?;
        writeln!(f, "  Blocks        : {}", self.blocks_processed)?;
        writeln!(f, "  Samples read  : {}", self.floats_read)?;
        writeln!(
            f,
            "  Bytes written : {:.1} MB",
            self.bytes_written as f64 / 1e6
        )?;
        writeln!(
            f,
            "  Masked cells  : {} ({:.2}%)",
            self.cells_masked, self.masked_pct
        )?;
        writeln!(f, "  Flat channels : {}", self.fallback_channels)?;
        if self.trailing_bytes > 0 {
            writeln!(f, "  Trailing bytes: {} (ignored)", self.trailing_bytes)?;
        }
        writeln!(f, "  Read speed    : {:.1} MB/s", self.read_speed_mbps)?;
        writeln!(
            f,
            "  Stages        : read {read:.2}s, mask {mask:.2}s, quantize {quantize:.2}s, write {write:.2}s"
        )?;
        write!(f, "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_metrics_zero() {
        let metrics = ConversionMetrics::new();
        let start = Instant::now();
        let summary = metrics.summary(&start);

        assert_eq!(summary.blocks_processed, 0);
        assert_eq!(summary.floats_read, 0);
        assert_eq!(summary.bytes_written, 0);
        assert_eq!(summary.cells_masked, 0);
        assert_eq!(summary.masked_pct, 0.0);
        assert_eq!(summary.read_speed_mbps, 0.0);
    }

    #[test]
    fn test_masked_pct_calculation() {
        let metrics = ConversionMetrics {
            cells_tested: 400,
            cells_masked: 10,
            ..ConversionMetrics::default()
        };

        assert!((metrics.masked_pct() - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_read_speed() {
        let metrics = ConversionMetrics {
            floats_read: 5_000_000,
            ..ConversionMetrics::default()
        };

        // 20 МБ за 2 с
        let start = Instant::now() - Duration::from_secs(2);
        let summary = metrics.summary(&start);
        assert!((summary.read_speed_mbps - 10.0).abs() < 0.1);
    }

    #[test]
    fn test_summary_display_lists_counters() {
        let metrics = ConversionMetrics {
            blocks_processed: 3,
            cells_tested: 100,
            cells_masked: 7,
            ..ConversionMetrics::default()
        };
        let text = metrics.summary(&Instant::now()).to_string();

        assert!(text.contains("Blocks        : 3"));
        assert!(text.contains("Masked cells  : 7 (7.00%)"));
        assert!(!text.contains("Trailing bytes"));
    }

    #[test]
    fn test_summary_reports_trailing_bytes() {
        let metrics = ConversionMetrics {
            trailing_bytes: 3,
            ..ConversionMetrics::default()
        };
        let text = metrics.summary(&Instant::now()).to_string();

        assert!(text.contains("Trailing bytes: 3 (ignored)"));
    }
}
