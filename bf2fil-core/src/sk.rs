//! Пороги обобщённого оценщика спектрального эксцесса (SK).
//!
//! Распределение оценщика
//! `SK = ((m·d + 1)/(m − 1)) · (m·S2/S1² − 1)` аппроксимируется
//! распределением Пирсона III типа (сдвинутая гамма) по второму и третьему
//! центральным моментам. Математическое ожидание SK равно 1.

use bf2fil_types::{FilError, FilResult};

use crate::special::{erfc, inv_gamma_p};

/// Нижняя и верхняя границы SK для незашумлённых данных.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkLimits {
    pub lower: f64,
    pub upper: f64,
}

/// Центральные моменты распределения SK.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkMoments {
    /// Дисперсия
    pub mu2: f64,
    /// Третий центральный момент
    pub mu3: f64,
}

impl SkLimits {
    /// Значение вне `[lower, upper]`. Нечисловое значение тоже вне границ.
    #[inline]
    pub fn rejects(
        &self,
        sk: f64,
    ) -> bool {
        !(sk >= self.lower && sk <= self.upper)
    }
}

/// Моменты SK для подблока из `m` спектров с параметром формы `d`.
pub fn sk_moments(
    m: usize,
    d: f64,
) -> SkMoments {
    let mf = m as f64;
    let n = mf * d;

    let mu2 = 2.0 * mf * mf * d * (1.0 + d) / ((mf - 1.0) * (n + 2.0) * (n + 3.0));
    let mu3 = 8.0 * mf.powi(3) * d * (1.0 + d) * (-2.0 + d * (-5.0 + mf * (4.0 + d)))
        / ((mf - 1.0).powi(2) * (n + 2.0) * (n + 3.0) * (n + 4.0) * (n + 5.0));

    SkMoments { mu2, mu3 }
}

/// Вычисляет границы SK для уровня значимости `sigma` (односторонний хвост
/// гауссова распределения с каждой стороны).
///
/// # Ошибки
/// [`FilError::Numeric`], если параметры недопустимы или решение не найдено.
pub fn compute_sk_thresholds(
    m: usize,
    sigma: f64,
    d: f64,
) -> FilResult<SkLimits> {
    if m < 2 {
        return Err(FilError::numeric(format!("sub-block size must be >= 2, got {m}")));
    }

    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(FilError::numeric(format!("sigma must be > 0, got {sigma}")));
    }

    if !(d.is_finite() && d > 0.0) {
        return Err(FilError::numeric(format!("shape d must be > 0, got {d}")));
    }

    let SkMoments { mu2, mu3 } = sk_moments(m, d);

    if !(mu2 > 0.0 && mu3 > 0.0 && mu2.is_finite() && mu3.is_finite()) {
        return Err(FilError::numeric(format!(
            "no Pearson III fit for m={m}, d={d}: mu2={mu2}, mu3={mu3}"
        )));
    }

    let k = 4.0 * mu2.powi(3) / (mu3 * mu3);
    let theta = mu3 / (2.0 * mu2);
    let delta = 1.0 - 2.0 * mu2 * mu2 / mu3;

    let p = 0.5 * erfc(sigma / std::f64::consts::SQRT_2)?;

    if p <= 0.0 {
        return Err(FilError::numeric(format!(
            "tail probability underflows for sigma={sigma}"
        )));
    }

    let lower = delta + theta * inv_gamma_p(k, p)?;
    let upper = delta + theta * inv_gamma_p(k, 1.0 - p)?;

    if !(lower < 1.0 && 1.0 < upper) {
        return Err(FilError::numeric(format!(
            "degenerate SK limits [{lower}, {upper}] for m={m}, sigma={sigma}, d={d}"
        )));
    }

    Ok(SkLimits { lower, upper })
}
