//! Нормализация и 8-битное квантование с разворотом порядка каналов.
//!
//! Для канала `c`: `offset = mean − low·std`, `scale = (low + high)·std`;
//! отсчёт переводится в `(x − offset)·256/scale`, усекается к нулю и
//! ограничивается диапазоном [0, 255]. Выходной канал `nx − 1 − c`.

use std::str::FromStr;

use bf2fil_types::{FilError, FilResult};

/// Значение всех отсчётов канала с нулевой или нечисловой шкалой.
pub const ZERO_VARIANCE_FALLBACK: u8 = 0;

/// Уровни квантования в единицах СКО канала: ниже среднего и выше.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantLevels {
    pub low: f32,
    pub high: f32,
}

impl Default for QuantLevels {
    fn default() -> Self {
        Self {
            low: 3.0,
            high: 5.0,
        }
    }
}

impl FromStr for QuantLevels {
    type Err = String;

    /// Разбирает строку вида `3.0,5.0`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = s
            .split_once(',')
            .ok_or_else(|| format!("Invalid levels '{s}': expected <low>,<high>"))?;

        let low: f32 = low
            .trim()
            .parse()
            .map_err(|e| format!("Invalid low level '{low}': {e}"))?;
        let high: f32 = high
            .trim()
            .parse()
            .map_err(|e| format!("Invalid high level '{high}': {e}"))?;

        Ok(Self { low, high })
    }
}

impl std::fmt::Display for QuantLevels {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{},{}", self.low, self.high)
    }
}

/// Аффинное преобразование каналов.
#[derive(Debug, Clone)]
pub struct ChannelTransform {
    pub offset: Vec<f32>,
    pub scale: Vec<f32>,
}

impl ChannelTransform {
    pub fn new(nx: usize) -> Self {
        Self {
            offset: vec![0.0; nx],
            scale: vec![0.0; nx],
        }
    }

    /// Пересчитывает смещения и шкалы по статистике каналов.
    pub fn update(
        &mut self,
        mean: &[f32],
        std: &[f32],
        levels: QuantLevels,
    ) {
        for (c, (&m, &s)) in mean.iter().zip(std).enumerate() {
            self.offset[c] = m - levels.low * s;
            self.scale[c] = (levels.low + levels.high) * s;
        }
    }

    /// Шкала канала нулевая или не число — канал пишется константой.
    pub fn is_degenerate(
        &self,
        c: usize,
    ) -> bool {
        let s = self.scale[c];
        s == 0.0 || !s.is_finite()
    }
}

/// Квантует один отсчёт: усечение к нулю, затем ограничение [0, 255].
#[inline]
pub fn quantize_sample(
    value: f32,
    offset: f32,
    gain: f64,
) -> u8 {
    let v = ((value - offset) as f64 * gain) as f32;

    // NaN тоже уходит в 0
    if !(v >= 0.0) {
        0
    } else if v > 255.0 {
        255
    } else {
        v as u8
    }
}

/// Квантует первые `rows` спектров блока в `out` с разворотом каналов.
///
/// Возвращает количество каналов, записанных значением
/// [`ZERO_VARIANCE_FALLBACK`].
pub fn quantize_block(
    block: &[f32],
    nx: usize,
    rows: usize,
    transform: &ChannelTransform,
    out: &mut [u8],
) -> FilResult<usize> {
    let len = nx * rows;

    if block.len() < len || out.len() < len || transform.scale.len() != nx {
        return Err(FilError::format_violation(format!(
            "quantize {nx}×{rows}: block={}, out={}, transform={}",
            block.len(),
            out.len(),
            transform.scale.len()
        )));
    }

    let gain: Vec<Option<f64>> = (0..nx)
        .map(|c| {
            if transform.is_degenerate(c) {
                None
            } else {
                Some(256.0 / transform.scale[c] as f64)
            }
        })
        .collect();

    for j in 0..rows {
        let src = &block[nx * j..nx * (j + 1)];
        let dst = &mut out[nx * j..nx * (j + 1)];

        for (c, &v) in src.iter().enumerate() {
            dst[nx - 1 - c] = match gain[c] {
                Some(g) => quantize_sample(v, transform.offset[c], g),
                None => ZERO_VARIANCE_FALLBACK,
            };
        }
    }

    Ok(gain.iter().filter(|g| g.is_none()).count())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform(
        mean: &[f32],
        std: &[f32],
    ) -> ChannelTransform {
        let mut t = ChannelTransform::new(mean.len());
        t.update(mean, std, QuantLevels::default());
        t
    }

    #[test]
    fn test_dynamic_range_boundaries() {
        // μ = 10, σ = 2: offset = 4, scale = 16
        let t = transform(&[10.0], &[2.0]);
        let gain = 256.0 / t.scale[0] as f64;

        assert_eq!(quantize_sample(10.0 - 3.0 * 2.0, t.offset[0], gain), 0);
        assert_eq!(quantize_sample(10.0 + 5.0 * 2.0, t.offset[0], gain), 255);
        assert_eq!(quantize_sample(10.0, t.offset[0], gain), 96);
        assert_eq!(quantize_sample(-100.0, t.offset[0], gain), 0);
        assert_eq!(quantize_sample(1e6, t.offset[0], gain), 255);
    }

    #[test]
    fn test_truncation_not_rounding() {
        // (x − 0)·256/256 = x
        assert_eq!(quantize_sample(127.9, 0.0, 1.0), 127);
        assert_eq!(quantize_sample(0.99, 0.0, 1.0), 0);
        assert_eq!(quantize_sample(-0.5, 0.0, 1.0), 0);
        assert_eq!(quantize_sample(255.7, 0.0, 1.0), 255);
        assert_eq!(quantize_sample(f32::NAN, 0.0, 1.0), 0);
    }

    #[test]
    fn test_channel_mirroring() {
        let nx = 5;
        let rows = 3;
        let block: Vec<f32> = (0..nx * rows).map(|k| (k * 7 % 23) as f32).collect();
        let t = transform(&[10.0; 5], &[3.0; 5]);

        let mut out = vec![0u8; nx * rows];
        quantize_block(&block, nx, rows, &t, &mut out).unwrap();

        for j in 0..rows {
            for c in 0..nx {
                let gain = 256.0 / t.scale[c] as f64;
                assert_eq!(
                    out[(nx - 1 - c) + nx * j],
                    quantize_sample(block[c + nx * j], t.offset[c], gain),
                    "c={c}, j={j}"
                );
            }
        }
    }

    #[test]
    fn test_zero_variance_channel_uses_fallback() {
        let nx = 3;
        let block = vec![5.0f32; nx * 2];
        let t = transform(&[5.0, 5.0, 0.0], &[0.0, 1.0, 0.0]);

        assert!(t.is_degenerate(0));
        assert!(!t.is_degenerate(1));
        assert!(t.is_degenerate(2));

        let mut out = vec![0xAAu8; nx * 2];
        let fallback = quantize_block(&block, nx, 2, &t, &mut out).unwrap();

        assert_eq!(fallback, 2);
        // Канал 0 → позиция 2, канал 2 → позиция 0
        assert_eq!(out[2], ZERO_VARIANCE_FALLBACK);
        assert_eq!(out[0], ZERO_VARIANCE_FALLBACK);
        assert_eq!(out[1], 96);
    }

    #[test]
    fn test_only_requested_rows_written() {
        let nx = 2;
        let block = vec![10.0f32; nx * 4];
        let t = transform(&[10.0, 10.0], &[2.0, 2.0]);
        let mut out = vec![0xEEu8; nx * 4];

        quantize_block(&block, nx, 1, &t, &mut out).unwrap();
        assert_eq!(&out[..2], &[96, 96]);
        assert!(out[2..].iter().all(|&b| b == 0xEE));
    }

    #[test]
    fn test_levels_parse() {
        assert_eq!(
            "3.0,5.0".parse::<QuantLevels>().unwrap(),
            QuantLevels::default()
        );
        assert_eq!(
            " 2.5 , 6 ".parse::<QuantLevels>().unwrap(),
            QuantLevels {
                low: 2.5,
                high: 6.0
            }
        );
        assert!("3.0".parse::<QuantLevels>().is_err());
        assert!("a,b".parse::<QuantLevels>().is_err());
        assert_eq!(QuantLevels::default().to_string(), "3,5");
    }
}
