//! Float position strings place a floating client on its monitor.
//!
//! A string holds two or four `<number><mode>` fields: `"x y"` or
//! `"x y width height"`. With two fields the first mode decides what they
//! mean: `w`/`W` resizes around the center, `p`/`P` moves on a grid,
//! `m`/`M` centers on the pointer, and anything else only moves.
//!
//! | position | meaning |
//! |---|---|
//! | `A` | absolute root coordinate, may leave the monitor |
//! | `a` | shift from the current position, may leave the monitor |
//! | `x`/`y` | shift from the current position |
//! | `X`/`Y` | offset from the monitor's origin |
//! | `S`, `C`, `Z` | pin the near edge, the center or the far edge and stretch to the offset; `-1` pins in place |
//! | `G` | grid of that many cells, `0` for the configured grid |
//! | `%` | center at a percentage of the work area |
//! | `m`/`M` | center on the pointer |
//!
//! | size | meaning |
//! |---|---|
//! | `A` | absolute, may leave the monitor |
//! | `a` | grow by the value, may leave the monitor |
//! | `w`/`h` | grow by the value |
//! | `W`/`H` | absolute |
//! | `%` | percentage of the work area |
//! | `P` | grid cell, counted from one |
//! | `p` | grid cells to move from the current cell |

use crate::client::Client;
use crate::errors::ConfigError;
use crate::geometry::{Rect, WindowGeometry};
use crate::monitor::Monitor;
use std::str::FromStr;

pub const DEFAULT_GRID: (i32, i32) = (5, 5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Absolute,
    Shifted,
    Offset,
    Monitor,
    Start,
    Center,
    End,
    Grid,
    Percent,
    Pointer,
}

impl Anchor {
    fn from_mode(mode: char) -> Option<Self> {
        Some(match mode {
            'A' => Self::Absolute,
            'a' => Self::Shifted,
            'x' | 'y' => Self::Offset,
            'X' | 'Y' => Self::Monitor,
            'S' => Self::Start,
            'C' => Self::Center,
            'Z' => Self::End,
            'G' => Self::Grid,
            '%' => Self::Percent,
            'm' | 'M' => Self::Pointer,
            _ => return None,
        })
    }

    fn unbounded(self) -> bool {
        matches!(self, Self::Absolute | Self::Shifted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resize {
    Absolute,
    Shifted,
    Grow,
    Fixed,
    Percent,
    Cell,
    Cells,
    Keep,
}

impl Resize {
    fn from_mode(mode: char) -> Option<Self> {
        Some(match mode {
            'A' => Self::Absolute,
            'a' => Self::Shifted,
            'w' | 'h' => Self::Grow,
            'W' | 'H' => Self::Fixed,
            '%' => Self::Percent,
            'P' => Self::Cell,
            'p' => Self::Cells,
            _ => return None,
        })
    }

    fn unbounded(self) -> bool {
        matches!(self, Self::Absolute | Self::Shifted)
    }

    fn on_grid(self) -> bool {
        matches!(self, Self::Cell | Self::Cells)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Place {
    pub value: i32,
    pub anchor: Anchor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub value: i32,
    pub resize: Resize,
}

impl Extent {
    const KEEP: Self = Self {
        value: 0,
        resize: Resize::Keep,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatPos {
    pub x: Place,
    pub y: Place,
    pub width: Extent,
    pub height: Extent,
    /// Both position values are replaced by the pointer coordinates.
    pub at_pointer: bool,
}

/// Reads up to four `<number><mode>` pairs. Blanks may separate pairs but
/// not a number from its mode; a number without a mode is an error.
fn scan(input: &str) -> Option<Vec<(i32, char)>> {
    let mut pairs = Vec::with_capacity(4);
    let mut rest = input;
    while pairs.len() < 4 {
        rest = rest.trim_start();
        let sign = usize::from(rest.starts_with(['-', '+']));
        let digits = rest[sign..].bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            break;
        }
        let (number, tail) = rest.split_at(sign + digits);
        let mut chars = tail.chars();
        let mode = chars.next()?;
        pairs.push((number.parse().ok()?, mode));
        rest = chars.as_str();
    }
    Some(pairs)
}

impl FromStr for FloatPos {
    type Err = ConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidFloatPos(input.to_string());
        let place = |value: i32, mode: char| {
            Anchor::from_mode(mode)
                .map(|anchor| Place { value, anchor })
                .ok_or_else(invalid)
        };
        let extent = |value: i32, mode: char| {
            Resize::from_mode(mode)
                .map(|resize| Extent { value, resize })
                .ok_or_else(invalid)
        };

        let pairs = scan(input).ok_or_else(invalid)?;
        match pairs[..] {
            [(x, x_mode), (y, y_mode)] => match x_mode {
                'w' | 'W' => Ok(Self {
                    x: Place { value: -1, anchor: Anchor::Center },
                    y: Place { value: -1, anchor: Anchor::Center },
                    width: extent(x, x_mode)?,
                    height: extent(y, y_mode)?,
                    at_pointer: false,
                }),
                'p' | 'P' => Ok(Self {
                    x: Place { value: 0, anchor: Anchor::Grid },
                    y: Place { value: 0, anchor: Anchor::Grid },
                    width: extent(x, x_mode)?,
                    height: extent(y, y_mode)?,
                    at_pointer: false,
                }),
                _ => Ok(Self {
                    x: place(x, x_mode)?,
                    y: place(y, y_mode)?,
                    width: Extent::KEEP,
                    height: Extent::KEEP,
                    at_pointer: matches!(x_mode, 'm' | 'M'),
                }),
            },
            [(x, x_mode), (y, y_mode), (width, width_mode), (height, height_mode)] => Ok(Self {
                x: place(x, x_mode)?,
                y: place(y, y_mode)?,
                width: extent(width, width_mode)?,
                height: extent(height, height_mode)?,
                at_pointer: matches!(x_mode, 'm' | 'M'),
            }),
            _ => Err(invalid()),
        }
    }
}

impl FloatPos {
    pub fn follows_pointer(&self) -> bool {
        self.at_pointer
    }

    /// Moves and resizes `geometry` within `area`. The border width is
    /// kept; `grid` is the cell count used by `0G`.
    pub fn apply(
        &self,
        geometry: WindowGeometry,
        area: Rect,
        pointer: Option<(i32, i32)>,
        grid: (i32, i32),
    ) -> WindowGeometry {
        let (mut x, mut y) = (self.x, self.y);
        if self.at_pointer
            && let Some((pointer_x, pointer_y)) = pointer
        {
            x.value = pointer_x;
            y.value = pointer_y;
        }
        let border = geometry.border_width;
        let (nx, width) = resolve_axis(
            x,
            self.width,
            (area.x, area.width),
            (geometry.x, geometry.width),
            border,
            grid.0,
        );
        let (ny, height) = resolve_axis(
            y,
            self.height,
            (area.y, area.height),
            (geometry.y, geometry.height),
            border,
            grid.1,
        );
        WindowGeometry::new(nx, ny, width, height, border)
    }
}

/// Resolves one axis. `area` and `current` are `(start, length)` pairs;
/// `current` excludes the borders and so does the returned length.
fn resolve_axis(
    place: Place,
    extent: Extent,
    area: (i32, i32),
    current: (i32, i32),
    border: i32,
    grid: i32,
) -> (i32, i32) {
    let (min_p, max_s) = area;
    let far = min_p + max_s;
    let (mut cp, mut cs) = current;
    cs += 2 * border;
    let pos = place.value;
    let size = extent.value;
    let mut resize = extent.resize;

    match place.anchor {
        Anchor::Absolute => cp = pos,
        Anchor::Shifted => cp += pos,
        Anchor::Offset => cp = (cp + pos).min(far),
        Anchor::Monitor => cp = min_p + pos.min(max_s),
        Anchor::Start | Anchor::Center | Anchor::End if pos != -1 => {
            let target = min_p + pos.min(max_s).max(0);
            cs = match place.anchor {
                Anchor::End => (cp + cs - target).abs(),
                Anchor::Center => (cp + cs / 2 - target).abs(),
                _ => (cp - target).abs(),
            };
            cp = target;
            resize = Resize::Keep;
        }
        Anchor::Grid => {
            let cells = if pos <= 0 { grid } else { pos };
            if size != 0 && cells >= 2 && resize.on_grid() {
                let delta = (max_s - cs) / (cells - 1);
                let rest = max_s - cs - delta * (cells - 1);
                // the last `rest` cells absorb the leftover pixels
                let skew = |cell: i32| {
                    if cell > cells - rest {
                        cell + rest - cells + 1
                    } else {
                        0
                    }
                };
                if resize == Resize::Cell {
                    if (1..=cells).contains(&size) {
                        cp = min_p + delta * (size - 1);
                    }
                } else {
                    let mut cell = 0;
                    while cell < cells && cp >= min_p + delta * cell + skew(cell) {
                        cell += 1;
                    }
                    cp = min_p + delta * ((cell + size).min(cells).max(1) - 1) + skew(cell);
                }
            }
        }
        _ => {}
    }

    let requested = match resize {
        Resize::Absolute => {
            cs = size;
            None
        }
        Resize::Shifted => {
            cs = (cs + size).max(1);
            None
        }
        Resize::Percent if size > 0 => Some(max_s * size.min(100) / 100),
        Resize::Grow if size != 0 => Some(size + cs),
        Resize::Fixed => Some(size),
        _ => None,
    };
    if let Some(mut size) = requested {
        if place.anchor == Anchor::Start && cp + size > far {
            size = far - cp;
        } else if size > max_s {
            size = max_s;
        }
        match place.anchor {
            Anchor::Center => {
                let delta = size - cs;
                if delta < 0 || cp - delta / 2 + size <= far {
                    cp -= delta / 2;
                } else if cp - delta / 2 < min_p {
                    cp = min_p;
                } else if delta != 0 {
                    cp = far;
                }
            }
            Anchor::End => cp -= size - cs,
            _ => {}
        }
        cs = size;
    }

    match place.anchor {
        Anchor::Percent => cp = min_p + max_s * pos.clamp(0, 100) / 100 - cs / 2,
        Anchor::Pointer => cp = pos - cs / 2,
        _ => {}
    }

    let unbounded_position = place.anchor.unbounded();
    if !unbounded_position && cp < min_p {
        cp = min_p;
    }
    if cp + cs > far && !(unbounded_position && extent.resize.unbounded()) {
        if unbounded_position || cp == min_p {
            cs = far - cp;
        } else {
            cp = far - cs;
        }
    }
    (cp, (cs - 2 * border).max(1))
}

/// Where `position` puts `client` on `monitor`, or `None` while a tiling
/// layout owns the client. Marks the client as ignoring size hints and
/// gives a floating client its own border width.
pub(crate) fn place_floating(
    client: &mut Client,
    monitor: &Monitor,
    position: &FloatPos,
    pointer: Option<(i32, i32)>,
    grid: (i32, i32),
) -> Option<WindowGeometry> {
    if monitor.arranges() && !client.is_floating {
        return None;
    }
    let mut geometry = client.geometry;
    if client.is_floating
        && let Some(border) = client.float_border
    {
        geometry.border_width = border;
    }
    client.ignore_size_hints = true;
    Some(position.apply(geometry, monitor.work_area, pointer, grid))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AREA: Rect = Rect::new(0, 24, 1280, 776);
    const WINDOW: WindowGeometry = WindowGeometry::new(100, 100, 300, 200, 1);

    fn place(spec: &str) -> WindowGeometry {
        spec.parse::<FloatPos>()
            .unwrap()
            .apply(WINDOW, AREA, Some((640, 400)), DEFAULT_GRID)
    }

    #[test]
    fn percentages_center_the_window() {
        assert_eq!(place("50% 50%"), WindowGeometry::new(489, 311, 300, 200, 1));
    }

    #[test]
    fn relative_moves_keep_the_size() {
        assert_eq!(place("0a -26a"), WindowGeometry::new(100, 74, 300, 200, 1));
        assert_eq!(place("26x 0y"), WindowGeometry::new(126, 100, 300, 200, 1));
    }

    #[test]
    fn size_only_forms_keep_the_center() {
        let shrunk = place("0w -26h");
        assert_eq!(shrunk, WindowGeometry::new(100, 113, 300, 174, 1));
        assert_eq!(
            shrunk.y + shrunk.outer_height() / 2,
            WINDOW.y + WINDOW.outer_height() / 2
        );
    }

    #[test]
    fn pinned_edges_stretch_to_the_area() {
        assert_eq!(place("0x 0Z 0% 0%"), WindowGeometry::new(100, 24, 300, 276, 1));
        assert_eq!(place("-1S 0y 100% 0%"), WindowGeometry::new(100, 100, 1178, 200, 1));
    }

    #[test]
    fn grid_cells_are_evenly_spaced() {
        assert_eq!(place("3P 2P"), WindowGeometry::new(488, 167, 300, 200, 1));
    }

    #[test]
    fn pointer_forms_center_on_the_pointer() {
        let position: FloatPos = "0m 0m".parse().unwrap();
        assert!(position.follows_pointer());
        assert_eq!(place("0m 0m"), WindowGeometry::new(489, 299, 300, 200, 1));
    }

    #[test]
    fn bounded_modes_stay_inside_the_area() {
        let placed = place("2000X 0Y");
        assert_eq!(placed.x + placed.outer_width(), AREA.right());
        assert_eq!(placed.y, AREA.y);
    }

    #[test]
    fn malformed_strings_are_rejected() {
        for spec in ["", "10", "1a 2a 3a", "1q 2a", "1 2", "50% 50% 0w% 0w%"] {
            assert!(
                matches!(spec.parse::<FloatPos>(), Err(ConfigError::InvalidFloatPos(_))),
                "{spec:?}"
            );
        }
    }
}
