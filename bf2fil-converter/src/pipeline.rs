use std::{
    fs::{File, OpenOptions},
    io::{Read, Write},
    time::Instant,
};

use bf2fil_core::{
    compute_mask, compute_sk_thresholds, quantize_block, read_header, write_header, BlockStats,
    ChannelTransform, FilterbankHeader, FilterbankWriter, MaskParams, QuantLevels, RawBlockReader,
    SkLimits,
};
use bf2fil_types::BlockGeometry;
use log::{debug, info, warn};

use crate::{ConversionMetrics, ConvertResult, ConverterConfig};

const MB: f64 = (1 << 20) as f64;

/// Поблочный конвейер: чтение → маска → нормализация → квантование → запись.
///
/// Все буферы выделяются один раз под полную геометрию и переиспользуются;
/// блоки обрабатываются независимо друг от друга.
pub struct BlockPipeline {
    geom: BlockGeometry,
    params: MaskParams,
    sk_sigma: f64,
    levels: QuantLevels,
    block: Vec<f32>,
    stats: BlockStats,
    transform: ChannelTransform,
    quantized: Vec<u8>,
    metrics: ConversionMetrics,
}

impl BlockPipeline {
    /// Создаёт конвейер и вычисляет границы SK для полного подблока.
    pub fn new(
        geom: BlockGeometry,
        sk_sigma: f64,
        sk_shape: f64,
        levels: QuantLevels,
    ) -> ConvertResult<Self> {
        let limits = compute_sk_thresholds(geom.m, sk_sigma, sk_shape)?;

        Ok(Self {
            geom,
            params: MaskParams {
                shape: sk_shape,
                limits,
                tail_limits: None,
            },
            sk_sigma,
            levels,
            block: vec![0.0; geom.len()],
            stats: BlockStats::new(&geom),
            transform: ChannelTransform::new(geom.nx),
            quantized: vec![0; geom.len()],
            metrics: ConversionMetrics::new(),
        })
    }

    pub fn limits(&self) -> SkLimits {
        self.params.limits
    }

    pub fn geometry(&self) -> &BlockGeometry {
        &self.geom
    }

    /// Статистика последнего обработанного блока.
    pub fn stats(&self) -> &BlockStats {
        &self.stats
    }

    pub fn metrics(&self) -> &ConversionMetrics {
        &self.metrics
    }

    pub fn into_metrics(self) -> ConversionMetrics {
        self.metrics
    }

    /// Прогоняет весь поток `input` и возвращает `output` после сброса буфера.
    ///
    /// Цикл завершается на первом неполном чтении.
    pub fn run<R: Read, W: Write>(
        &mut self,
        input: R,
        output: W,
    ) -> ConvertResult<W> {
        let capacity = self.geom.len();
        let mut reader = RawBlockReader::new(input, capacity);
        let mut writer = FilterbankWriter::new(output);

        for iblock in 0u64.. {
            let t = Instant::now();
            let nread = reader.read_block(&mut self.block)?;
            self.metrics.read_time += t.elapsed();
            self.metrics.floats_read += nread as u64;

            info!(
                "Read block {iblock}, {:.1} MB in {:.2} s",
                (nread * 4) as f64 / MB,
                t.elapsed().as_secs_f64()
            );

            if nread == 0 {
                break;
            }

            self.process_block(iblock, nread)?;

            let t = Instant::now();
            writer.write_block(&self.quantized[..nread])?;
            self.metrics.write_time += t.elapsed();

            info!(
                "Wrote block {iblock}, {:.1} MB in {:.2} s",
                nread as f64 / MB,
                t.elapsed().as_secs_f64()
            );

            if nread < capacity {
                info!("Short read ({nread} of {capacity} samples), last block");
                break;
            }
        }

        self.metrics.blocks_written = writer.block_count();
        self.metrics.bytes_written = writer.bytes_written();
        self.metrics.trailing_bytes = reader.stats().trailing_bytes;

        let t = Instant::now();
        let inner = writer.finish()?;
        self.metrics.write_time += t.elapsed();

        Ok(inner)
    }

    /// Маска, нормализация и квантование первых `nread` отсчётов буфера.
    ///
    /// Для неполного блока статистика считается только по целиком
    /// прочитанным спектрам, а хвост буфера за `nread` обнуляется.
    fn process_block(
        &mut self,
        iblock: u64,
        nread: usize,
    ) -> ConvertResult<()> {
        let nx = self.geom.nx;
        let rows_out = nread.div_ceil(nx);

        let geom = if nread == self.geom.len() {
            self.params.tail_limits = None;
            self.geom
        } else {
            self.block[nread..rows_out * nx].fill(0.0);
            let g = self.geom.truncated(nread / nx);
            self.params.tail_limits = self.tail_limits(&g);
            g
        };

        let t = Instant::now();
        let masked = compute_mask(&self.block, &geom, &self.params, &mut self.stats)?;
        self.metrics.mask_time += t.elapsed();
        self.metrics.cells_tested += geom.cells() as u64;
        self.metrics.cells_masked += masked as u64;

        info!(
            "Computed mask ({masked} values masked) in {:.2} s",
            t.elapsed().as_secs_f64()
        );

        let t = Instant::now();
        self.transform
            .update(&self.stats.channel_mean, &self.stats.channel_std, self.levels);
        let fallback = quantize_block(
            &self.block,
            nx,
            rows_out,
            &self.transform,
            &mut self.quantized,
        )?;
        self.metrics.quantize_time += t.elapsed();
        self.metrics.fallback_channels += fallback as u64;
        self.metrics.blocks_processed += 1;

        if fallback > 0 {
            warn!("Block {iblock}: {fallback} channels have zero variance, written as constant");
        }

        debug!("Quantized block {iblock} in {:.2} s", t.elapsed().as_secs_f64());

        Ok(())
    }

    /// Границы SK для укороченного последнего подблока, если он есть.
    fn tail_limits(
        &self,
        geom: &BlockGeometry,
    ) -> Option<SkLimits> {
        let tail = geom.ny % geom.m;

        if tail < 2 {
            return None;
        }

        match compute_sk_thresholds(tail, self.sk_sigma, self.params.shape) {
            Ok(lim) => {
                debug!(
                    "Tail sub-block of {tail} spectra: SK limits [{:.6}, {:.6}]",
                    lim.lower, lim.upper
                );
                Some(lim)
            }
            Err(e) => {
                warn!("Tail sub-block of {tail} spectra left unmasked: {e}");
                None
            }
        }
    }
}

/// Полный прогон по конфигурации: заголовок, данные, метрики.
pub fn convert(config: &ConverterConfig) -> ConvertResult<ConversionMetrics> {
    let mut header = read_header(&config.header_path)?;
    let geom = config.geometry(header.nchans())?;

    // До записи выхода: ошибка порогов не должна портить файл
    let mut pipeline = BlockPipeline::new(geom, config.sk_sigma, config.sk_shape, config.levels)?;
    let limits = pipeline.limits();

    info!(
        "Block size: {:.0} MB, averaged spectra: {}, d: {}, sigma: {:.1}",
        geom.size_mb(),
        geom.m,
        config.sk_shape,
        config.sk_sigma
    );
    info!("SK limits: [{:.6}, {:.6}]", limits.lower, limits.upper);

    header.center_first_channel();
    let fil_header = FilterbankHeader::from_observation(&header)?;
    write_header(&config.output_path, &fil_header)?;

    let input = File::open(&config.raw_path)?;
    let output = OpenOptions::new().append(true).open(&config.output_path)?;

    let mut output = pipeline.run(input, output)?;
    output.flush()?;

    Ok(pipeline.into_metrics())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn raw_floats(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn pipeline(geom: BlockGeometry) -> BlockPipeline {
        BlockPipeline::new(geom, 4.0, 12.0, QuantLevels::default()).unwrap()
    }

    fn ramp(n: usize) -> Vec<f32> {
        (0..n).map(|k| 1.0 + (k * 37 % 101) as f32 * 0.01).collect()
    }

    #[test]
    fn test_output_bytes_equal_floats_read() {
        let geom = BlockGeometry::new(4, 4, 2).unwrap();
        let mut p = pipeline(geom);
        let input = raw_floats(&ramp(32 * 3 + 20));

        let out = p.run(Cursor::new(input), Vec::new()).unwrap();

        assert_eq!(out.len(), 32 * 3 + 20);
        assert_eq!(p.metrics().blocks_processed, 4);
        assert_eq!(p.metrics().blocks_written, 4);
        assert_eq!(p.metrics().floats_read, 116);
        assert_eq!(p.metrics().bytes_written, 116);
    }

    #[test]
    fn test_exact_multiple_ends_on_empty_read() {
        let geom = BlockGeometry::new(4, 4, 2).unwrap();
        let mut p = pipeline(geom);
        let input = raw_floats(&ramp(64));

        let out = p.run(Cursor::new(input), Vec::new()).unwrap();

        assert_eq!(out.len(), 64);
        assert_eq!(p.metrics().blocks_processed, 2);
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let geom = BlockGeometry::new(4, 4, 2).unwrap();
        let mut p = pipeline(geom);

        let out = p.run(Cursor::new(Vec::new()), Vec::new()).unwrap();

        assert!(out.is_empty());
        assert_eq!(p.metrics().blocks_processed, 0);
        assert_eq!(p.metrics().blocks_written, 0);
    }

    #[test]
    fn test_stale_data_does_not_leak_into_short_block() {
        let geom = BlockGeometry::new(4, 4, 2).unwrap();

        // Второй блок: полтора спектра, второй спектр неполный
        let mut values = ramp(32);
        values.extend_from_slice(&[2.0; 6]);

        let mut p = pipeline(geom);
        let out = p.run(Cursor::new(raw_floats(&values)), Vec::new()).unwrap();
        assert_eq!(out.len(), 38);

        // Один целый спектр: ни одного полного подблока, статистики нет,
        // все каналы пишутся константой
        assert!(p.stats().channel_count.iter().all(|&n| n == 1));
        assert_eq!(&out[32..], &[0u8; 6]);
    }

    #[test]
    fn test_trailing_partial_float_counted() {
        let geom = BlockGeometry::new(4, 4, 2).unwrap();
        let mut p = pipeline(geom);
        let mut input = raw_floats(&ramp(8));
        input.extend_from_slice(&[0x7F, 0x00, 0x01]);

        let out = p.run(Cursor::new(input), Vec::new()).unwrap();

        assert_eq!(out.len(), 8);
        assert_eq!(p.metrics().floats_read, 8);
        assert_eq!(p.metrics().bytes_written, 8);
        assert_eq!(p.metrics().trailing_bytes, 3);
    }

    #[test]
    fn test_degenerate_thresholds_fail_early() {
        let geom = BlockGeometry::new(4, 4, 2).unwrap();
        assert!(BlockPipeline::new(geom, -1.0, 12.0, QuantLevels::default()).is_err());
    }
}
