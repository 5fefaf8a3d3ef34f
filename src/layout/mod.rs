pub mod floating;
pub mod monocle;
pub mod tile;

use crate::geometry::{Rect, WindowGeometry};
use crate::size_hints::{NegotiationContext, SizeHints, negotiate};
use serde::Deserialize;
use x11rb::protocol::xproto::Window;

pub type LayoutBox = Box<dyn Layout>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LayoutKind {
    Tile,
    Floating,
    Monocle,
}

impl LayoutKind {
    pub fn new(&self) -> LayoutBox {
        match self {
            Self::Tile => Box::new(tile::TileLayout),
            Self::Floating => Box::new(floating::FloatingLayout),
            Self::Monocle => Box::new(monocle::MonocleLayout),
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Tile => Self::Floating,
            Self::Floating => Self::Monocle,
            Self::Monocle => Self::Tile,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tile => "tile",
            Self::Floating => "floating",
            Self::Monocle => "monocle",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "tile" | "tiling" => Ok(Self::Tile),
            "floating" | "float" => Ok(Self::Floating),
            "monocle" => Ok(Self::Monocle),
            _ => Err(format!("Invalid Layout Type: {}", s)),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Tile => "[]=",
            Self::Floating => "><>",
            Self::Monocle => "[M]",
        }
    }

    /// Floating is the only layout without an arrange step of its own.
    pub fn arranges(&self) -> bool {
        !matches!(self, Self::Floating)
    }
}

/// One split orientation of the tiling layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
    /// Group members stack in Z order; only the most recent one is shown.
    Stacked,
}

impl Axis {
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Horizontal),
            2 => Some(Self::Vertical),
            3 => Some(Self::Stacked),
            _ => None,
        }
    }

    pub fn value(self) -> u8 {
        match self {
            Self::Horizontal => 1,
            Self::Vertical => 2,
            Self::Stacked => 3,
        }
    }
}

/// The `(primary, master, stack)` axis triple.
///
/// `primary` is 1 or 2 and splits the area into master and stack regions; a
/// negative value mirrors the split. `master` and `stack` are 1, 2 or 3 and
/// lay out each region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisConfig {
    pub primary: i8,
    pub master: u8,
    pub stack: u8,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            primary: 1,
            master: 2,
            stack: 2,
        }
    }
}

impl AxisConfig {
    pub fn new(primary: i8, master: u8, stack: u8) -> Option<Self> {
        let valid_primary = matches!(primary.unsigned_abs(), 1 | 2);
        let valid_groups = (1..=3).contains(&master) && (1..=3).contains(&stack);
        (valid_primary && valid_groups).then_some(Self {
            primary,
            master,
            stack,
        })
    }

    pub fn primary_axis(&self) -> Axis {
        if self.primary.unsigned_abs() == 2 {
            Axis::Vertical
        } else {
            Axis::Horizontal
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.primary < 0
    }

    pub fn master_axis(&self) -> Axis {
        Axis::from_value(self.master).unwrap_or(Axis::Vertical)
    }

    pub fn stack_axis(&self) -> Axis {
        Axis::from_value(self.stack).unwrap_or(Axis::Vertical)
    }
}

/// A visible client as seen by a layout.
#[derive(Debug, Clone)]
pub struct LayoutClient {
    pub window: Window,
    pub geometry: WindowGeometry,
    pub hints: SizeHints,
    pub respect_hints: bool,
    pub cfact: f32,
    /// Position in the focus-recency order, zero being the most recent.
    pub focus_rank: usize,
    pub is_floating: bool,
    pub is_fullscreen: bool,
}

/// Everything a layout reads from its monitor.
#[derive(Debug, Clone)]
pub struct LayoutInput<'a> {
    pub work_area: Rect,
    pub gap: i32,
    pub nmaster: usize,
    pub mfact: f32,
    pub axis: AxisConfig,
    pub border_width: i32,
    /// Borders are dropped while `gap > tile_switch`.
    pub border_switch: bool,
    pub tile_switch: i32,
    pub bar_height: i32,
    pub bars_shown: bool,
    pub top_bar: bool,
    pub negotiation: NegotiationContext,
    /// Visible clients in insertion order.
    pub clients: &'a [LayoutClient],
}

impl LayoutInput<'_> {
    pub fn tiled(&self) -> impl Iterator<Item = &LayoutClient> {
        self.clients.iter().filter(|client| !client.is_floating)
    }

    /// Size-hint negotiation for a non-interactive resize of `client`.
    pub fn fit(&self, client: &LayoutClient, requested: WindowGeometry) -> WindowGeometry {
        let context = NegotiationContext {
            interactive: false,
            respect_hints: client.respect_hints,
            ..self.negotiation
        };
        negotiate(requested, &client.geometry, &client.hints, &context)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub window: Window,
    pub geometry: WindowGeometry,
    /// The window is parked off-screen while keeping `geometry`.
    pub offscreen: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Arrangement {
    pub placements: Vec<Placement>,
    pub symbol: String,
    /// Master count after clamping to the number of tiled clients.
    pub nmaster: usize,
}

impl Arrangement {
    pub fn placement(&self, window: Window) -> Option<&Placement> {
        self.placements
            .iter()
            .rev()
            .find(|placement| placement.window == window)
    }
}

pub trait Layout {
    fn arrange(&self, input: &LayoutInput) -> Arrangement;
    fn name(&self) -> &'static str;
    fn symbol(&self) -> &'static str;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn input<'a>(clients: &'a [LayoutClient], gap: i32) -> LayoutInput<'a> {
        let work_area = Rect::new(0, 0, 1280, 800);
        LayoutInput {
            work_area,
            gap,
            nmaster: 1,
            mfact: 0.55,
            axis: AxisConfig::default(),
            border_width: 1,
            border_switch: true,
            tile_switch: 2,
            bar_height: 20,
            bars_shown: true,
            top_bar: true,
            negotiation: NegotiationContext {
                interactive: false,
                screen_width: 1280,
                screen_height: 800,
                work_area,
                min_dimension: 20,
                respect_hints: false,
            },
            clients,
        }
    }

    pub fn client(window: Window, focus_rank: usize) -> LayoutClient {
        LayoutClient {
            window,
            geometry: WindowGeometry::new(0, 0, 100, 100, 1),
            hints: SizeHints::default(),
            respect_hints: false,
            cfact: 1.0,
            focus_rank,
            is_floating: false,
            is_fullscreen: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_kind_names_round_trip() {
        for kind in [LayoutKind::Tile, LayoutKind::Floating, LayoutKind::Monocle] {
            assert_eq!(LayoutKind::from_str(kind.as_str()), Ok(kind));
            assert_eq!(kind.new().name(), kind.as_str());
        }
        assert!(LayoutKind::from_str("grid").is_err());
        assert_eq!(LayoutKind::Monocle.next(), LayoutKind::Tile);
    }

    #[test]
    fn axis_config_rejects_out_of_range_values() {
        assert!(AxisConfig::new(1, 2, 2).is_some());
        assert!(AxisConfig::new(-2, 3, 1).is_some());
        assert!(AxisConfig::new(3, 1, 1).is_none());
        assert!(AxisConfig::new(1, 0, 1).is_none());
        assert!(AxisConfig::new(1, 1, 4).is_none());
    }

    #[test]
    fn mirrored_primary_keeps_its_axis() {
        let axis = AxisConfig::new(-2, 1, 3).unwrap();
        assert!(axis.is_mirrored());
        assert_eq!(axis.primary_axis(), Axis::Vertical);
        assert_eq!(axis.stack_axis(), Axis::Stacked);
    }
}
