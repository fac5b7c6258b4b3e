//! Маскирование RFI по спектральному эксцессу и робастная статистика
//! по незамаскированным ячейкам.
//!
//! Ячейка — пара (канал, подблок). Для каждой ячейки считается SK; ячейки
//! вне [`SkLimits`] маскируются, после чего среднее и СКО каналов и
//! подблоков пересчитываются только по оставшимся отсчётам.
//!
//! Канал или подблок, у которого не осталось ни одного отсчёта, получает
//! среднее 0, СКО 0 и счётчик 0.

use bf2fil_types::{BlockGeometry, FilError, FilResult};

use crate::sk::SkLimits;

/// Параметры маскирования.
#[derive(Debug, Clone, Copy)]
pub struct MaskParams {
    /// Параметр формы SK `d`
    pub shape: f64,
    /// Границы для полных подблоков из `m` спектров
    pub limits: SkLimits,
    /// Границы для укороченного последнего подблока. `None` — не маскировать.
    pub tail_limits: Option<SkLimits>,
}

/// Маска и статистика одного блока.
///
/// Буферы выделяются один раз под полную геометрию и переиспользуются.
#[derive(Debug, Clone)]
pub struct BlockStats {
    /// Маска ячеек, индекс `channel + nx * sub_block`
    pub mask: Vec<bool>,
    /// Количество замаскированных ячеек
    pub masked: usize,
    pub channel_mean: Vec<f32>,
    pub channel_std: Vec<f32>,
    /// Количество незамаскированных отсчётов в канале
    pub channel_count: Vec<usize>,
    pub subblock_mean: Vec<f32>,
    pub subblock_std: Vec<f32>,
    /// Количество незамаскированных отсчётов в подблоке
    pub subblock_count: Vec<usize>,

    cell_s1: Vec<f64>,
    cell_s2: Vec<f64>,
    chan_s1: Vec<f64>,
    chan_s2: Vec<f64>,
}

impl BlockStats {
    pub fn new(geom: &BlockGeometry) -> Self {
        Self {
            mask: vec![false; geom.cells()],
            masked: 0,
            channel_mean: vec![0.0; geom.nx],
            channel_std: vec![0.0; geom.nx],
            channel_count: vec![0; geom.nx],
            subblock_mean: vec![0.0; geom.my],
            subblock_std: vec![0.0; geom.my],
            subblock_count: vec![0; geom.my],
            cell_s1: vec![0.0; geom.nx],
            cell_s2: vec![0.0; geom.nx],
            chan_s1: vec![0.0; geom.nx],
            chan_s2: vec![0.0; geom.nx],
        }
    }

    /// У канала не осталось незамаскированных отсчётов.
    pub fn is_channel_empty(
        &self,
        c: usize,
    ) -> bool {
        self.channel_count[c] == 0
    }

    pub fn is_masked(
        &self,
        nx: usize,
        c: usize,
        b: usize,
    ) -> bool {
        self.mask[c + nx * b]
    }

    /// Доля замаскированных ячеек в геометрии `geom`.
    pub fn masked_fraction(
        &self,
        geom: &BlockGeometry,
    ) -> f64 {
        if geom.cells() == 0 {
            0.0
        } else {
            self.masked as f64 / geom.cells() as f64
        }
    }

    fn reset(&mut self) {
        self.mask.fill(false);
        self.masked = 0;
        self.channel_mean.fill(0.0);
        self.channel_std.fill(0.0);
        self.channel_count.fill(0);
        self.subblock_mean.fill(0.0);
        self.subblock_std.fill(0.0);
        self.subblock_count.fill(0);
        self.chan_s1.fill(0.0);
        self.chan_s2.fill(0.0);
    }
}

/// Обобщённый оценщик SK для ячейки из `len` отсчётов.
///
/// Для `S1 == 0` результат не число, такая ячейка отвергается границами.
#[inline]
pub fn spectral_kurtosis(
    len: usize,
    shape: f64,
    s1: f64,
    s2: f64,
) -> f64 {
    let n = len as f64;
    ((n * shape + 1.0) / (n - 1.0)) * (n * s2 / (s1 * s1) - 1.0)
}

/// Считает маску и статистику блока. Возвращает число замаскированных ячеек.
///
/// `block` должен содержать не меньше `geom.len()` отсчётов; `stats`
/// должен быть создан под геометрию не меньше `geom`.
pub fn compute_mask(
    block: &[f32],
    geom: &BlockGeometry,
    params: &MaskParams,
    stats: &mut BlockStats,
) -> FilResult<usize> {
    let nx = geom.nx;

    if block.len() < geom.len() {
        return Err(FilError::format_violation(format!(
            "block holds {} samples, geometry needs {}",
            block.len(),
            geom.len()
        )));
    }

    if stats.mask.len() < geom.cells() || stats.channel_mean.len() != nx {
        return Err(FilError::format_violation(format!(
            "stats buffers sized for {} cells / {} channels, geometry needs {} / {nx}",
            stats.mask.len(),
            stats.channel_mean.len(),
            geom.cells()
        )));
    }

    stats.reset();

    for b in 0..geom.my {
        let rows = geom.sub_block_rows(b);
        let len = rows.len();

        stats.cell_s1.fill(0.0);
        stats.cell_s2.fill(0.0);

        for j in rows {
            let spectrum = &block[nx * j..nx * (j + 1)];
            for (c, &v) in spectrum.iter().enumerate() {
                let v = v as f64;
                stats.cell_s1[c] += v;
                stats.cell_s2[c] += v * v;
            }
        }

        let limits = if len == geom.m {
            Some(params.limits)
        } else {
            params.tail_limits
        };

        let mut sb_s1 = 0.0;
        let mut sb_s2 = 0.0;
        let mut sb_n = 0usize;

        for c in 0..nx {
            let s1 = stats.cell_s1[c];
            let s2 = stats.cell_s2[c];

            let masked = match limits {
                Some(lim) if len >= 2 => lim.rejects(spectral_kurtosis(len, params.shape, s1, s2)),
                _ => false,
            };

            if masked {
                stats.mask[c + nx * b] = true;
                stats.masked += 1;
                continue;
            }

            stats.chan_s1[c] += s1;
            stats.chan_s2[c] += s2;
            stats.channel_count[c] += len;

            sb_s1 += s1;
            sb_s2 += s2;
            sb_n += len;
        }

        let (mean, std) = mean_std(sb_s1, sb_s2, sb_n);
        stats.subblock_mean[b] = mean;
        stats.subblock_std[b] = std;
        stats.subblock_count[b] = sb_n;
    }

    for c in 0..nx {
        let (mean, std) = mean_std(stats.chan_s1[c], stats.chan_s2[c], stats.channel_count[c]);
        stats.channel_mean[c] = mean;
        stats.channel_std[c] = std;
    }

    Ok(stats.masked)
}

/// Среднее и СКО (генеральное) по суммам. Для `n == 0` — `(0, 0)`.
fn mean_std(
    s1: f64,
    s2: f64,
    n: usize,
) -> (f32, f32) {
    if n == 0 {
        return (0.0, 0.0);
    }

    let n = n as f64;
    let mean = s1 / n;
    let var = (s2 / n - mean * mean).max(0.0);

    (mean as f32, var.sqrt() as f32)
}
