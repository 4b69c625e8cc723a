/// Axis-aligned screen rectangle in pixels (min inclusive, max exclusive).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl ScreenRect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    /// Rectangle of `width` x `height` centered on `(cx, cy)`.
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        let (hw, hh) = (width * 0.5, height * 0.5);
        Self::new(cx - hw, cy - hh, cx + hw, cy + hh)
    }

    pub fn overlaps(&self, other: &ScreenRect) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}

/// Uniform grid of cells over the viewport, each holding indices of placed rects.
///
/// Cell storage is reused across frames; it is only reallocated when the
/// viewport size changes the number of columns or rows.
pub struct SpatialGrid {
    cell_w: f32,
    cell_h: f32,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<u32>>,
}

impl SpatialGrid {
    pub fn new(cell_w: f32, cell_h: f32) -> Self {
        Self {
            cell_w: cell_w.max(1.0),
            cell_h: cell_h.max(1.0),
            cols: 0,
            rows: 0,
            cells: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Ready the grid for a viewport. Returns `true` if the cell layout changed.
    pub fn prepare(&mut self, width: f32, height: f32) -> bool {
        let cols = ((width / self.cell_w).ceil() as usize).max(1);
        let rows = ((height / self.cell_h).ceil() as usize).max(1);
        if cols != self.cols || rows != self.rows {
            self.cols = cols;
            self.rows = rows;
            self.cells.clear();
            self.cells.resize_with(cols * rows, Vec::new);
            log::debug!("label grid resized to {cols}x{rows}");
            return true;
        }
        for cell in &mut self.cells {
            cell.clear();
        }
        false
    }

    /// Inclusive cell range covered by `rect`, clamped to the grid.
    fn cell_range(&self, rect: &ScreenRect) -> Option<(usize, usize, usize, usize)> {
        if self.cols == 0 || rect.max_x < 0.0 || rect.max_y < 0.0 {
            return None;
        }
        let clamp_col = |x: f32| ((x / self.cell_w).floor().max(0.0) as usize).min(self.cols - 1);
        let clamp_row = |y: f32| ((y / self.cell_h).floor().max(0.0) as usize).min(self.rows - 1);
        Some((
            clamp_col(rect.min_x),
            clamp_row(rect.min_y),
            clamp_col(rect.max_x),
            clamp_row(rect.max_y),
        ))
    }

    /// Record `id` in every cell `rect` covers.
    pub fn insert(&mut self, id: u32, rect: &ScreenRect) {
        let Some((c0, r0, c1, r1)) = self.cell_range(rect) else {
            return;
        };
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.cells[row * self.cols + col].push(id);
            }
        }
    }

    /// Visit ids stored in the cells `rect` covers until `f` returns `true`.
    /// An id spanning several cells may be visited more than once.
    pub fn query(&self, rect: &ScreenRect, mut f: impl FnMut(u32) -> bool) -> bool {
        let Some((c0, r0, c1, r1)) = self.cell_range(rect) else {
            return false;
        };
        for row in r0..=r1 {
            for col in c0..=c1 {
                for &id in &self.cells[row * self.cols + col] {
                    if f(id) {
                        return true;
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_overlap() {
        let a = ScreenRect::new(50.0, 50.0, 150.0, 70.0);
        let b = ScreenRect::new(60.0, 55.0, 160.0, 75.0);
        let c = ScreenRect::new(150.0, 50.0, 250.0, 70.0);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c), "touching edges do not overlap");
    }

    #[test]
    fn prepare_reuses_cells_when_size_is_stable() {
        let mut grid = SpatialGrid::new(100.0, 20.0);
        assert!(grid.prepare(400.0, 300.0));
        assert_eq!(grid.dimensions(), (4, 15));
        grid.insert(1, &ScreenRect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!grid.prepare(390.0, 290.0));
        assert!(!grid.query(&ScreenRect::new(0.0, 0.0, 10.0, 10.0), |_| true));
        assert!(grid.prepare(800.0, 300.0));
    }

    #[test]
    fn insert_spans_cells_and_query_finds() {
        let mut grid = SpatialGrid::new(100.0, 20.0);
        grid.prepare(400.0, 300.0);
        grid.insert(3, &ScreenRect::new(90.0, 15.0, 210.0, 25.0));
        let mut seen = Vec::new();
        grid.query(&ScreenRect::new(205.0, 24.0, 206.0, 24.5), |id| {
            seen.push(id);
            false
        });
        assert_eq!(seen, vec![3]);
        assert!(!grid.query(&ScreenRect::new(350.0, 200.0, 360.0, 210.0), |_| true));
    }

    #[test]
    fn offscreen_rects_are_clamped() {
        let mut grid = SpatialGrid::new(100.0, 20.0);
        grid.prepare(200.0, 100.0);
        grid.insert(9, &ScreenRect::new(-50.0, -5.0, 10.0, 5.0));
        assert!(grid.query(&ScreenRect::new(0.0, 0.0, 1.0, 1.0), |id| id == 9));
        grid.insert(8, &ScreenRect::new(-500.0, -500.0, -400.0, -400.0));
        assert!(!grid.query(&ScreenRect::new(0.0, 0.0, 1.0, 1.0), |id| id == 8));
    }
}
