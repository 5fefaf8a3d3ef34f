//! Rectangles and the overlap scoring used to map windows to monitors and
//! pointer positions to tiled clients.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Area shared by both rectangles, zero when they are disjoint.
    pub fn intersect_area(&self, other: &Rect) -> i32 {
        let overlap_width = (self.right().min(other.right()) - self.x.max(other.x)).max(0);
        let overlap_height = (self.bottom().min(other.bottom()) - self.y.max(other.y)).max(0);
        overlap_width * overlap_height
    }
}

/// Client window geometry. `width`/`height` exclude the border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowGeometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub border_width: i32,
}

impl WindowGeometry {
    pub const fn new(x: i32, y: i32, width: i32, height: i32, border_width: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            border_width,
        }
    }

    pub fn outer_width(&self) -> i32 {
        self.width + 2 * self.border_width
    }

    pub fn outer_height(&self) -> i32 {
        self.height + 2 * self.border_width
    }

    /// Outer rectangle including both borders.
    pub fn outer_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.outer_width(), self.outer_height())
    }

    /// Inner rectangle, the one used for overlap scoring.
    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Index of the candidate sharing the largest area with `rect`.
///
/// Returns `None` when nothing overlaps; ties keep the earliest candidate.
pub fn best_overlap<'a>(rect: &Rect, candidates: impl IntoIterator<Item = &'a Rect>) -> Option<usize> {
    let mut best = None;
    let mut best_area = 0;
    for (index, candidate) in candidates.into_iter().enumerate() {
        let area = rect.intersect_area(candidate);
        if area > best_area {
            best_area = area;
            best = Some(index);
        }
    }
    best
}
