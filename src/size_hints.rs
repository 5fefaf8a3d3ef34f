//! ICCCM WM_NORMAL_HINTS decoding and geometry negotiation.

use crate::geometry::{Rect, WindowGeometry};

pub mod flags {
    pub const P_MIN_SIZE: u32 = 1 << 4;
    pub const P_MAX_SIZE: u32 = 1 << 5;
    pub const P_RESIZE_INC: u32 = 1 << 6;
    pub const P_ASPECT: u32 = 1 << 7;
    pub const P_BASE_SIZE: u32 = 1 << 8;
}

pub mod offset {
    pub const FLAGS: usize = 0;
    pub const MIN_WIDTH: usize = 5;
    pub const MIN_HEIGHT: usize = 6;
    pub const MAX_WIDTH: usize = 7;
    pub const MAX_HEIGHT: usize = 8;
    pub const WIDTH_INC: usize = 9;
    pub const HEIGHT_INC: usize = 10;
    pub const MIN_ASPECT_X: usize = 11;
    pub const MIN_ASPECT_Y: usize = 12;
    pub const MAX_ASPECT_X: usize = 13;
    pub const MAX_ASPECT_Y: usize = 14;
    pub const BASE_WIDTH: usize = 15;
    pub const BASE_HEIGHT: usize = 16;
    pub const LEN: usize = 18;
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizeHints {
    pub base_width: i32,
    pub base_height: i32,
    pub increment_width: i32,
    pub increment_height: i32,
    pub max_width: i32,
    pub max_height: i32,
    pub min_width: i32,
    pub min_height: i32,
    /// Minimum `height / width` ratio, zero when unset.
    pub min_aspect: f32,
    /// Maximum `width / height` ratio, zero when unset.
    pub max_aspect: f32,
}

impl SizeHints {
    /// Decodes the CARD32 array of a WM_NORMAL_HINTS property.
    ///
    /// Missing trailing fields read as zero. Base size falls back to the
    /// minimum size and vice versa.
    pub fn from_raw(values: &[u32]) -> Self {
        use flags::*;
        use offset::*;

        let read = |index: usize| values.get(index).copied().unwrap_or(0) as i32;
        let hint_flags = values.get(FLAGS).copied().unwrap_or(0);
        let mut hints = Self::default();

        if hint_flags & P_BASE_SIZE != 0 {
            hints.base_width = read(BASE_WIDTH);
            hints.base_height = read(BASE_HEIGHT);
        } else if hint_flags & P_MIN_SIZE != 0 {
            hints.base_width = read(MIN_WIDTH);
            hints.base_height = read(MIN_HEIGHT);
        }

        if hint_flags & P_RESIZE_INC != 0 {
            hints.increment_width = read(WIDTH_INC);
            hints.increment_height = read(HEIGHT_INC);
        }

        if hint_flags & P_MAX_SIZE != 0 {
            hints.max_width = read(MAX_WIDTH);
            hints.max_height = read(MAX_HEIGHT);
        }

        if hint_flags & P_MIN_SIZE != 0 {
            hints.min_width = read(MIN_WIDTH);
            hints.min_height = read(MIN_HEIGHT);
        } else if hint_flags & P_BASE_SIZE != 0 {
            hints.min_width = read(BASE_WIDTH);
            hints.min_height = read(BASE_HEIGHT);
        }

        if hint_flags & P_ASPECT != 0 {
            hints.min_aspect = ratio(read(MIN_ASPECT_Y), read(MIN_ASPECT_X));
            hints.max_aspect = ratio(read(MAX_ASPECT_X), read(MAX_ASPECT_Y));
        }

        hints
    }

    /// A window whose minimum and maximum sizes coincide cannot be tiled.
    pub fn is_fixed(&self) -> bool {
        self.max_width > 0
            && self.max_height > 0
            && self.max_width == self.min_width
            && self.max_height == self.min_height
    }

    /// Applies aspect, increment, minimum and maximum constraints.
    ///
    /// The result never grows the request; a dimension that the hints would
    /// enlarge keeps the requested value.
    pub fn constrain(&self, width: i32, height: i32) -> (i32, i32) {
        let base_is_min = self.base_width == self.min_width && self.base_height == self.min_height;
        let mut constrained_width = width;
        let mut constrained_height = height;

        if !base_is_min {
            constrained_width -= self.base_width;
            constrained_height -= self.base_height;
        }

        if self.min_aspect > 0.0 && self.max_aspect > 0.0 {
            if self.max_aspect < width as f32 / height as f32 {
                constrained_width = (constrained_height as f32 * self.max_aspect + 0.5) as i32;
            } else if self.min_aspect < height as f32 / width as f32 {
                constrained_height = (constrained_width as f32 * self.min_aspect + 0.5) as i32;
            }
        }

        if base_is_min {
            constrained_width -= self.base_width;
            constrained_height -= self.base_height;
        }

        if self.increment_width > 0 {
            constrained_width -= constrained_width % self.increment_width;
        }
        if self.increment_height > 0 {
            constrained_height -= constrained_height % self.increment_height;
        }

        constrained_width = (constrained_width + self.base_width).max(self.min_width);
        constrained_height = (constrained_height + self.base_height).max(self.min_height);

        if self.max_width > 0 {
            constrained_width = constrained_width.min(self.max_width);
        }
        if self.max_height > 0 {
            constrained_height = constrained_height.min(self.max_height);
        }

        (constrained_width.min(width), constrained_height.min(height))
    }
}

fn ratio(numerator: i32, denominator: i32) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f32 / denominator as f32
    }
}

/// Environment a geometry request is negotiated against.
#[derive(Debug, Clone, Copy)]
pub struct NegotiationContext {
    /// Interactive requests are only kept on the virtual screen; others are
    /// kept touching the monitor's window area.
    pub interactive: bool,
    pub screen_width: i32,
    pub screen_height: i32,
    pub work_area: Rect,
    /// Smallest width and height any client may take.
    pub min_dimension: i32,
    pub respect_hints: bool,
}

/// Computes the geometry a client actually receives for `requested`.
///
/// `current` is the client's present geometry; the off-screen corrections
/// use its outer size, not the requested one.
pub fn negotiate(
    requested: WindowGeometry,
    current: &WindowGeometry,
    hints: &SizeHints,
    context: &NegotiationContext,
) -> WindowGeometry {
    let mut result = requested;
    result.width = result.width.max(1);
    result.height = result.height.max(1);

    let border = result.border_width;
    if context.interactive {
        if result.x > context.screen_width {
            result.x = context.screen_width - current.outer_width();
        }
        if result.y > context.screen_height {
            result.y = context.screen_height - current.outer_height();
        }
        if result.x + result.width + 2 * border < 0 {
            result.x = 0;
        }
        if result.y + result.height + 2 * border < 0 {
            result.y = 0;
        }
    } else {
        let area = &context.work_area;
        if result.x >= area.right() {
            result.x = area.right() - current.outer_width();
        }
        if result.y >= area.bottom() {
            result.y = area.bottom() - current.outer_height();
        }
        if result.x + result.width + 2 * border <= area.x {
            result.x = area.x;
        }
        if result.y + result.height + 2 * border <= area.y {
            result.y = area.y;
        }
    }

    result.height = result.height.max(context.min_dimension);
    result.width = result.width.max(context.min_dimension);

    if context.respect_hints {
        let (width, height) = hints.constrain(result.width, result.height);
        result.width = width;
        result.height = height;
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(respect_hints: bool) -> NegotiationContext {
        NegotiationContext {
            interactive: false,
            screen_width: 1280,
            screen_height: 800,
            work_area: Rect::new(0, 0, 1280, 800),
            min_dimension: 20,
            respect_hints,
        }
    }

    #[test]
    fn increment_snaps_down_from_minimum() {
        let hints = SizeHints {
            min_width: 100,
            increment_width: 10,
            ..SizeHints::default()
        };
        let current = WindowGeometry::new(0, 0, 10, 10, 0);
        let requested = WindowGeometry::new(0, 0, 147, 200, 0);
        let result = negotiate(requested, &current, &hints, &context(true));
        assert_eq!(result.width, 140);
        assert_eq!(result.height, 200);
    }

    #[test]
    fn raw_min_size_doubles_as_base_size() {
        let mut raw = [0u32; offset::LEN];
        raw[offset::FLAGS] = flags::P_MIN_SIZE | flags::P_RESIZE_INC;
        raw[offset::MIN_WIDTH] = 100;
        raw[offset::MIN_HEIGHT] = 50;
        raw[offset::WIDTH_INC] = 10;
        raw[offset::HEIGHT_INC] = 1;
        let hints = SizeHints::from_raw(&raw);
        assert_eq!(hints.base_width, 100);
        assert_eq!(hints.min_width, 100);
        assert_eq!(hints.constrain(147, 73), (140, 73));
    }

    #[test]
    fn terminal_style_base_and_increment() {
        let hints = SizeHints {
            base_width: 4,
            base_height: 4,
            increment_width: 7,
            increment_height: 15,
            min_width: 11,
            min_height: 19,
            ..SizeHints::default()
        };
        assert_eq!(hints.constrain(640, 480), (634, 469));
    }

    #[test]
    fn max_aspect_narrows_width() {
        let hints = SizeHints {
            min_aspect: 0.5,
            max_aspect: 2.0,
            ..SizeHints::default()
        };
        assert_eq!(hints.constrain(900, 300), (600, 300));
    }

    #[test]
    fn min_aspect_shortens_height() {
        let hints = SizeHints {
            min_aspect: 0.5,
            max_aspect: 2.0,
            ..SizeHints::default()
        };
        assert_eq!(hints.constrain(300, 900), (300, 150));
    }

    #[test]
    fn maximum_clamps_and_minimum_never_grows_request() {
        let hints = SizeHints {
            min_width: 400,
            min_height: 400,
            max_width: 500,
            max_height: 500,
            ..SizeHints::default()
        };
        assert!(!hints.is_fixed());
        assert_eq!(hints.constrain(800, 300), (500, 300));
    }

    #[test]
    fn fixed_when_min_equals_max() {
        let hints = SizeHints {
            min_width: 300,
            min_height: 200,
            max_width: 300,
            max_height: 200,
            ..SizeHints::default()
        };
        assert!(hints.is_fixed());
    }

    #[test]
    fn hints_ignored_when_not_respected() {
        let hints = SizeHints {
            min_width: 100,
            increment_width: 10,
            ..SizeHints::default()
        };
        let current = WindowGeometry::default();
        let requested = WindowGeometry::new(0, 0, 147, 200, 0);
        let result = negotiate(requested, &current, &hints, &context(false));
        assert_eq!(result.width, 147);
    }

    #[test]
    fn tiny_requests_are_raised_to_minimum_dimension() {
        let current = WindowGeometry::default();
        let requested = WindowGeometry::new(10, 10, -5, 3, 1);
        let result = negotiate(requested, &current, &SizeHints::default(), &context(false));
        assert_eq!((result.width, result.height), (20, 20));
    }

    #[test]
    fn windows_left_of_the_area_are_pulled_back() {
        let current = WindowGeometry::new(0, 0, 100, 100, 1);
        let requested = WindowGeometry::new(-300, 50, 100, 100, 1);
        let result = negotiate(requested, &current, &SizeHints::default(), &context(false));
        assert_eq!(result.x, 0);
        assert_eq!(result.y, 50);
    }

    #[test]
    fn windows_beyond_the_area_are_pulled_back_by_current_size() {
        let current = WindowGeometry::new(0, 0, 200, 100, 2);
        let requested = WindowGeometry::new(1280, 10, 300, 100, 2);
        let result = negotiate(requested, &current, &SizeHints::default(), &context(false));
        assert_eq!(result.x, 1280 - 204);
    }

    #[test]
    fn interactive_requests_only_stay_on_screen() {
        let mut interactive = context(false);
        interactive.interactive = true;
        interactive.work_area = Rect::new(0, 20, 1280, 780);
        let current = WindowGeometry::new(0, 0, 100, 100, 1);
        let requested = WindowGeometry::new(-50, 0, 100, 100, 1);
        let result = negotiate(requested, &current, &SizeHints::default(), &interactive);
        assert_eq!((result.x, result.y), (-50, 0));

        let gone = WindowGeometry::new(-500, 0, 100, 100, 1);
        let result = negotiate(gone, &current, &SizeHints::default(), &interactive);
        assert_eq!(result.x, 0);
    }
}
