use serde::{Deserialize, Serialize};

use crate::{FilError, FilResult};

/// Метаданные наблюдения, описывающие сырой поток мощностей.
///
/// Читается один раз при старте и задаёт размеры всех буферов.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservationHeader {
    /// Количество частотных каналов
    pub nchans: u32,
    /// Ширина канала, МГц (отрицательная при убывающей частоте)
    pub foff: f64,
    /// Частота первого канала, МГц (край канала во входном формате)
    pub fch1: f64,
    /// Интервал между отсчётами, с
    pub tsamp: f64,
    /// Время начала наблюдения, MJD
    pub tstart: f64,
    /// Имя источника
    #[serde(default)]
    pub source_name: String,
    /// Прямое восхождение в кодировке SIGPROC (hhmmss.s)
    #[serde(default)]
    pub src_raj: f64,
    /// Склонение в кодировке SIGPROC (ddmmss.s)
    #[serde(default)]
    pub src_dej: f64,
    /// Идентификатор телескопа SIGPROC
    #[serde(default)]
    pub telescope_id: i32,
    /// Идентификатор бэкенда SIGPROC
    #[serde(default)]
    pub machine_id: i32,
    /// Общее количество спектров в наблюдении (0 если неизвестно)
    #[serde(default)]
    pub nsamples: u64,
}

impl ObservationHeader {
    /// Проверяет значения, от которых зависят размеры буферов.
    pub fn validate(&self) -> FilResult<()> {
        if self.nchans == 0 {
            return Err(FilError::invalid_header("nchans must be > 0"));
        }

        if !(self.tsamp.is_finite() && self.tsamp > 0.0) {
            return Err(FilError::invalid_header(format!(
                "tsamp must be > 0, got {}",
                self.tsamp
            )));
        }

        if !self.foff.is_finite() || !self.fch1.is_finite() {
            return Err(FilError::invalid_header("fch1/foff must be finite"));
        }

        Ok(())
    }

    /// Переносит опорную частоту с края первого канала на его центр.
    pub fn center_first_channel(&mut self) {
        self.fch1 += 0.5 * self.foff;
    }

    pub fn nchans(&self) -> usize {
        self.nchans as usize
    }
}
