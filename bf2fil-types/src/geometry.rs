use crate::{FilError, FilResult};

/// Геометрия обрабатываемого блока: `nx` каналов × `ny` спектров,
/// разбитых по времени на `my` подблоков по `m` спектров.
///
/// Индекс отсчёта в блоке: `channel + nx * time`, индекс ячейки маски:
/// `channel + nx * sub_block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// Количество каналов
    pub nx: usize,
    /// Количество спектров в блоке
    pub ny: usize,
    /// Размер подблока SK (спектров)
    pub m: usize,
    /// Количество подблоков, `ceil(ny / m)`
    pub my: usize,
}

impl BlockGeometry {
    /// Создаёт геометрию полного блока из `sub_blocks` подблоков по `m`.
    pub fn new(
        nx: usize,
        m: usize,
        sub_blocks: usize,
    ) -> FilResult<Self> {
        if nx == 0 || m == 0 || sub_blocks == 0 {
            return Err(FilError::format_violation(format!(
                "empty block geometry: nx={nx}, m={m}, sub_blocks={sub_blocks}"
            )));
        }

        let ny = m.checked_mul(sub_blocks).ok_or_else(|| {
            FilError::format_violation(format!("ny overflows: m={m} × n={sub_blocks}"))
        })?;

        nx.checked_mul(ny).ok_or_else(|| {
            FilError::format_violation(format!("block overflows: nx={nx} × ny={ny}"))
        })?;

        Ok(Self {
            nx,
            ny,
            m,
            my: ny.div_ceil(m),
        })
    }

    /// Геометрия укороченного блока из `rows` полных спектров.
    ///
    /// Последний подблок может оказаться короче `m`.
    pub fn truncated(
        &self,
        rows: usize,
    ) -> Self {
        let ny = rows.min(self.ny);

        Self {
            nx: self.nx,
            ny,
            m: self.m,
            my: ny.div_ceil(self.m),
        }
    }

    /// Количество отсчётов в блоке (`nx * ny`).
    pub fn len(&self) -> usize {
        self.nx * self.ny
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Количество ячеек маски (`nx * my`).
    pub fn cells(&self) -> usize {
        self.nx * self.my
    }

    /// Диапазон спектров подблока `b`: `[b·m, min((b+1)·m, ny))`.
    pub fn sub_block_rows(
        &self,
        b: usize,
    ) -> std::ops::Range<usize> {
        let start = b * self.m;
        start..((b + 1) * self.m).min(self.ny)
    }

    /// Размер блока в мегабайтах при хранении `f32`.
    pub fn size_mb(&self) -> f64 {
        (self.len() * std::mem::size_of::<f32>()) as f64 / (1 << 20) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let g = BlockGeometry::new(400, 1024, 120).unwrap();
        assert_eq!(g.ny, 122_880);
        assert_eq!(g.my, 120);
        assert_eq!(g.len(), 400 * 122_880);
        assert_eq!(g.cells(), 400 * 120);
    }

    #[test]
    fn test_truncated_geometry_has_short_tail() {
        let g = BlockGeometry::new(4, 4, 3).unwrap();
        let t = g.truncated(6);

        assert_eq!(t.ny, 6);
        assert_eq!(t.my, 2);
        assert_eq!(t.sub_block_rows(0), 0..4);
        assert_eq!(t.sub_block_rows(1), 4..6);

        assert_eq!(g.truncated(100), g);
        assert_eq!(g.truncated(0).my, 0);
    }

    #[test]
    fn test_empty_geometry_rejected() {
        assert!(BlockGeometry::new(0, 4, 1).is_err());
        assert!(BlockGeometry::new(4, 0, 1).is_err());
        assert!(BlockGeometry::new(4, 4, 0).is_err());
    }
}
