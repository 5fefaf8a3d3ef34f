pub mod attach;
pub mod client;
pub mod commands;
pub mod config;
pub mod display;
pub mod drag;
pub mod errors;
pub mod floatpos;
pub mod focus;
pub mod geometry;
pub mod keyboard;
pub mod layout;
pub mod manage;
pub mod monitor;
pub mod pertag;
pub mod size_hints;
pub mod swallow;
pub mod window_manager;
pub mod x11;

pub mod prelude {
    pub use crate::{Rule, SwitchTag};
    pub use crate::attach::AttachPolicy;
    pub use crate::keyboard::{Arg, ButtonBinding, ClickTarget, KeyAction, KeyBinding, MouseAction};
    pub use crate::layout::{AxisConfig, LayoutKind};
    pub use x11rb::protocol::xproto::KeyButMask;
}

use crate::attach::AttachPolicy;
use crate::client::TagMask;
use crate::commands::tag_grid;
use crate::keyboard::keysyms::{self, Keysym};
use crate::keyboard::{Arg, ButtonBinding, ClickTarget, KeyAction, KeyBinding, MouseAction};
use crate::layout::{AxisConfig, LayoutKind};
use crate::monitor::BarSettings;
use serde::Deserialize;
use x11rb::protocol::xproto::KeyButMask;

/// How a rule changes the view when its client opens on hidden tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SwitchTag {
    #[default]
    Off,
    /// Shows the client's tags instead of the current ones.
    View,
    /// Adds the client's tags to the current ones.
    Add,
    /// Like `View`, and the old view returns when the client closes.
    ViewAndRevert,
    /// Like `Add`, and the old view returns when the client closes.
    AddAndRevert,
}

impl SwitchTag {
    pub fn adds(self) -> bool {
        matches!(self, Self::Add | Self::AddAndRevert)
    }

    pub fn reverts(self) -> bool {
        matches!(self, Self::ViewAndRevert | Self::AddAndRevert)
    }
}

/// Window rule applied when a client is managed.
///
/// Every given pattern must be a substring of the matching property.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub class: Option<String>,
    pub instance: Option<String>,
    pub title: Option<String>,
    pub tags: TagMask,
    pub switch_tag: SwitchTag,
    pub is_floating: bool,
    pub is_fake_fullscreen: bool,
    pub is_terminal: bool,
    pub no_swallow: bool,
    pub ignore_size_hints: bool,
    pub monitor: Option<usize>,
    /// Border width while the client floats.
    pub float_border: Option<i32>,
    /// Float position string applied to floating clients, see [`floatpos`].
    pub float_pos: Option<String>,
}

impl Rule {
    pub fn matches(&self, class: &str, instance: &str, title: &str) -> bool {
        let contains = |pattern: &Option<String>, value: &str| {
            pattern.as_deref().is_none_or(|pattern| value.contains(pattern))
        };
        contains(&self.title, title) && contains(&self.class, class) && contains(&self.instance, instance)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    // Appearance
    pub border_width: i32,
    pub border_focused: u32,
    pub border_unfocused: u32,
    pub border_floating: u32,
    pub border_seamless: u32,

    // Gaps
    pub gap: i32,
    /// Hints and borders only apply while the gap is above this value.
    pub tile_switch: i32,
    pub border_switch: bool,

    // Bar geometry
    pub show_bar: bool,
    pub show_extra_bar: bool,
    pub top_bar: bool,
    pub bar_height: i32,
    pub bar_gap: bool,

    // Layout
    pub mfact: f32,
    pub nmaster: usize,
    pub layouts: Vec<LayoutKind>,
    pub layout_axis: AxisConfig,
    pub attach: AttachPolicy,

    // Behavior
    pub snap: i32,
    pub resize_hints: bool,
    pub lock_fullscreen: bool,
    pub swallow_floating: bool,

    // Tags
    pub tags: Vec<String>,
    /// Rows of the tag grid walked by `SwitchTag` keys.
    pub tag_rows: usize,
    pub rules: Vec<Rule>,

    // Float positions
    /// Cells per axis for `0G` float positions.
    pub float_pos_grid: (i32, i32),

    // Input
    pub modkey: KeyButMask,
    pub keybindings: Vec<KeyBinding>,
    pub buttons: Vec<ButtonBinding>,
}

impl Config {
    /// Mask with one bit per configured tag.
    pub fn tag_mask(&self) -> TagMask {
        match self.tags.len() {
            0 => 1,
            n if n >= 32 => TagMask::MAX,
            n => (1 << n) - 1,
        }
    }

    pub fn bar_settings(&self) -> BarSettings {
        BarSettings {
            height: self.bar_height,
            inset_by_gap: self.bar_gap,
        }
    }
}

fn tag_keys(modkey: KeyButMask, key: Keysym, tag: i32) -> [KeyBinding; 4] {
    use KeyButMask as M;
    [
        KeyBinding::new(vec![modkey], key, KeyAction::ViewTag, Arg::Int(tag)),
        KeyBinding::new(vec![modkey, M::CONTROL], key, KeyAction::ToggleView, Arg::Int(tag)),
        KeyBinding::new(vec![modkey, M::SHIFT], key, KeyAction::MoveToTag, Arg::Int(tag)),
        KeyBinding::new(
            vec![modkey, M::CONTROL, M::SHIFT],
            key,
            KeyAction::ToggleTag,
            Arg::Int(tag),
        ),
    ]
}

impl Default for Config {
    fn default() -> Self {
        use keysyms::from_char as key;

        const MODKEY: KeyButMask = KeyButMask::MOD4;
        const SHIFT: KeyButMask = KeyButMask::SHIFT;
        const CONTROL: KeyButMask = KeyButMask::CONTROL;
        const ALT: KeyButMask = KeyButMask::MOD1;
        let float_pos = |spec: &str| Arg::Str(spec.into());

        #[rustfmt::skip]
        let mut keybindings = vec![
            KeyBinding::new(vec![MODKEY],                   key('j'),                KeyAction::FocusStack,           Arg::Int(1)),
            KeyBinding::new(vec![MODKEY],                   key('k'),                KeyAction::FocusStack,           Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_LEFT,        KeyAction::FocusDirection,       Arg::Int(0)),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_RIGHT,       KeyAction::FocusDirection,       Arg::Int(1)),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_UP,          KeyAction::FocusDirection,       Arg::Int(2)),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_DOWN,        KeyAction::FocusDirection,       Arg::Int(3)),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('h'),                KeyAction::PlaceDirection,       Arg::Int(0)),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('l'),                KeyAction::PlaceDirection,       Arg::Int(1)),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('k'),                KeyAction::PlaceDirection,       Arg::Int(2)),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('j'),                KeyAction::PlaceDirection,       Arg::Int(3)),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('j'),                KeyAction::InplaceRotate,        Arg::Int(1)),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('k'),                KeyAction::InplaceRotate,        Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY, CONTROL, SHIFT],   key('j'),                KeyAction::InplaceRotate,        Arg::Int(2)),
            KeyBinding::new(vec![MODKEY, CONTROL, SHIFT],   key('k'),                KeyAction::InplaceRotate,        Arg::Int(-2)),
            KeyBinding::new(vec![MODKEY],                   key('i'),                KeyAction::IncNumMaster,         Arg::Int(1)),
            KeyBinding::new(vec![MODKEY],                   key('d'),                KeyAction::IncNumMaster,         Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY],                   key('h'),                KeyAction::SetMasterFactor,      Arg::Float(-0.05)),
            KeyBinding::new(vec![MODKEY],                   key('l'),                KeyAction::SetMasterFactor,      Arg::Float(0.05)),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('h'),                KeyAction::SetClientFactor,      Arg::Float(-0.25)),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('l'),                KeyAction::SetClientFactor,      Arg::Float(0.25)),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('o'),                KeyAction::SetClientFactor,      Arg::Float(0.0)),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('z'),                KeyAction::Zoom,                 Arg::None),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('z'),                KeyAction::Transfer,             Arg::None),
            KeyBinding::new(vec![MODKEY, CONTROL],          keysyms::XK_TAB,         KeyAction::SwitchColumn,         Arg::None),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_TAB,         KeyAction::ViewTag,              Arg::None),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('q'),                KeyAction::KillClient,           Arg::None),
            KeyBinding::new(vec![MODKEY],                   key('t'),                KeyAction::SetLayout,            Arg::Str("tile".into())),
            KeyBinding::new(vec![MODKEY],                   key('f'),                KeyAction::SetLayout,            Arg::Str("floating".into())),
            KeyBinding::new(vec![MODKEY],                   key('m'),                KeyAction::SetLayout,            Arg::Str("monocle".into())),
            KeyBinding::new(vec![MODKEY, CONTROL],          keysyms::XK_SPACE,       KeyAction::SetLayout,            Arg::None),
            KeyBinding::new(vec![MODKEY],                   key('n'),                KeyAction::CycleLayout,          Arg::None),
            KeyBinding::new(vec![MODKEY, CONTROL, SHIFT],   key('t'),                KeyAction::RotateLayoutAxis,     Arg::Int(0)),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('t'),                KeyAction::RotateLayoutAxis,     Arg::Int(1)),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('t'),                KeyAction::RotateLayoutAxis,     Arg::Int(2)),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('m'),                KeyAction::MirrorLayout,         Arg::None),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_SPACE,       KeyAction::ToggleFloating,       Arg::None),
            KeyBinding::new(vec![MODKEY],                   key('b'),                KeyAction::ToggleBars,           Arg::None),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('b'),                KeyAction::ToggleBar,            Arg::None),
            KeyBinding::new(vec![MODKEY, CONTROL, SHIFT],   key('b'),                KeyAction::ToggleExtraBar,       Arg::None),
            KeyBinding::new(vec![MODKEY, ALT],              key('n'),                KeyAction::ShiftViewClients,     Arg::Int(1)),
            KeyBinding::new(vec![MODKEY, ALT],              key('p'),                KeyAction::ShiftViewClients,     Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY, ALT],              key('k'),                KeyAction::SwitchTag,            Arg::Int(tag_grid::UP | tag_grid::VIEW)),
            KeyBinding::new(vec![MODKEY, ALT],              key('j'),                KeyAction::SwitchTag,            Arg::Int(tag_grid::DOWN | tag_grid::VIEW)),
            KeyBinding::new(vec![MODKEY, ALT],              key('l'),                KeyAction::SwitchTag,            Arg::Int(tag_grid::RIGHT | tag_grid::VIEW)),
            KeyBinding::new(vec![MODKEY, ALT],              key('h'),                KeyAction::SwitchTag,            Arg::Int(tag_grid::LEFT | tag_grid::VIEW)),
            KeyBinding::new(vec![MODKEY, CONTROL, ALT],     key('k'),                KeyAction::SwitchTag,            Arg::Int(tag_grid::UP | tag_grid::TAG | tag_grid::VIEW)),
            KeyBinding::new(vec![MODKEY, CONTROL, ALT],     key('j'),                KeyAction::SwitchTag,            Arg::Int(tag_grid::DOWN | tag_grid::TAG | tag_grid::VIEW)),
            KeyBinding::new(vec![MODKEY, CONTROL, ALT],     key('l'),                KeyAction::SwitchTag,            Arg::Int(tag_grid::RIGHT | tag_grid::TAG | tag_grid::VIEW)),
            KeyBinding::new(vec![MODKEY, CONTROL, ALT],     key('h'),                KeyAction::SwitchTag,            Arg::Int(tag_grid::LEFT | tag_grid::TAG | tag_grid::VIEW)),
            KeyBinding::new(vec![MODKEY, SHIFT],            keysyms::XK_UP,          KeyAction::FloatPos,             float_pos("0a -26a")),
            KeyBinding::new(vec![MODKEY, SHIFT],            keysyms::XK_LEFT,        KeyAction::FloatPos,             float_pos("-26a 0a")),
            KeyBinding::new(vec![MODKEY, SHIFT],            keysyms::XK_RIGHT,       KeyAction::FloatPos,             float_pos("26a 0a")),
            KeyBinding::new(vec![MODKEY, SHIFT],            keysyms::XK_DOWN,        KeyAction::FloatPos,             float_pos("0a 26a")),
            KeyBinding::new(vec![MODKEY, CONTROL],          keysyms::XK_UP,          KeyAction::FloatPos,             float_pos("0w -26h")),
            KeyBinding::new(vec![MODKEY, CONTROL],          keysyms::XK_LEFT,        KeyAction::FloatPos,             float_pos("-26w 0h")),
            KeyBinding::new(vec![MODKEY, CONTROL],          keysyms::XK_RIGHT,       KeyAction::FloatPos,             float_pos("26w 0h")),
            KeyBinding::new(vec![MODKEY, CONTROL],          keysyms::XK_DOWN,        KeyAction::FloatPos,             float_pos("0w 26h")),
            KeyBinding::new(vec![MODKEY, CONTROL, SHIFT],   keysyms::XK_UP,          KeyAction::FloatPos,             float_pos("0x 0Z 0% 0%")),
            KeyBinding::new(vec![MODKEY, CONTROL, SHIFT],   keysyms::XK_LEFT,        KeyAction::FloatPos,             float_pos("0Z 0y 0% 0%")),
            KeyBinding::new(vec![MODKEY, CONTROL, SHIFT],   keysyms::XK_RIGHT,       KeyAction::FloatPos,             float_pos("-1S 0y 100% 0%")),
            KeyBinding::new(vec![MODKEY, CONTROL, SHIFT],   keysyms::XK_DOWN,        KeyAction::FloatPos,             float_pos("0x -1S 0% 100%")),
            KeyBinding::new(vec![MODKEY],                   key('0'),                KeyAction::ViewTag,              Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('0'),                KeyAction::MoveToTag,            Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_COMMA,       KeyAction::FocusMonitor,         Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_PERIOD,      KeyAction::FocusMonitor,         Arg::Int(1)),
            KeyBinding::new(vec![MODKEY, SHIFT],            keysyms::XK_COMMA,       KeyAction::TagMonitor,           Arg::Int(-1)),
            KeyBinding::new(vec![MODKEY, SHIFT],            keysyms::XK_PERIOD,      KeyAction::TagMonitor,           Arg::Int(1)),
            KeyBinding::new(vec![MODKEY, CONTROL],          key('f'),                KeyAction::ToggleFullScreen,     Arg::None),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('f'),                KeyAction::ToggleFakeFullScreen, Arg::None),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_MINUS,       KeyAction::SetGaps,              Arg::Int(-2)),
            KeyBinding::new(vec![MODKEY],                   keysyms::XK_PLUS,        KeyAction::SetGaps,              Arg::Int(2)),
            KeyBinding::new(vec![MODKEY, SHIFT],            key('o'),                KeyAction::SetGaps,              Arg::Int(0)),
            KeyBinding::new(vec![MODKEY, CONTROL, SHIFT],   key('q'),                KeyAction::Quit,                 Arg::None),
        ];
        for (tag, digit) in ('1'..='9').enumerate() {
            keybindings.extend(tag_keys(MODKEY, key(digit), tag as i32));
        }

        Self {
            border_width: 1,
            border_focused: 0x005577,
            border_unfocused: 0x444444,
            border_floating: 0xbbbbbb,
            border_seamless: 0x222222,
            gap: 4,
            tile_switch: 2,
            border_switch: true,
            show_bar: true,
            show_extra_bar: false,
            top_bar: true,
            bar_height: 20,
            bar_gap: true,
            mfact: 0.55,
            nmaster: 1,
            layouts: vec![LayoutKind::Tile, LayoutKind::Floating, LayoutKind::Monocle],
            layout_axis: AxisConfig::default(),
            attach: AttachPolicy::Aside,
            snap: 32,
            resize_hints: true,
            lock_fullscreen: true,
            swallow_floating: true,
            tags: (1..=9).map(|tag| tag.to_string()).collect(),
            tag_rows: 2,
            float_pos_grid: crate::floatpos::DEFAULT_GRID,
            rules: vec![
                Rule {
                    class: Some("st".into()),
                    is_terminal: true,
                    ..Rule::default()
                },
                Rule {
                    title: Some("Event Tester".into()),
                    is_floating: true,
                    no_swallow: true,
                    ..Rule::default()
                },
            ],
            modkey: MODKEY,
            keybindings,
            buttons: vec![
                ButtonBinding::new(ClickTarget::ClientWindow, vec![MODKEY], 1, MouseAction::MoveOrPlace),
                ButtonBinding::new(ClickTarget::ClientWindow, vec![MODKEY], 2, MouseAction::ToggleFloating),
                ButtonBinding::new(ClickTarget::ClientWindow, vec![MODKEY], 3, MouseAction::ResizeMouse),
                ButtonBinding::new(ClickTarget::RootWindow, vec![], 1, MouseAction::DragFact),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_mask_covers_configured_tags() {
        let mut config = Config::default();
        assert_eq!(config.tag_mask(), 0x1ff);
        config.tags.truncate(6);
        assert_eq!(config.tag_mask(), 0x3f);
    }

    #[test]
    fn rule_patterns_are_substrings() {
        let rule = Rule {
            class: Some("fox".into()),
            title: Some("Mozilla".into()),
            ..Rule::default()
        };
        assert!(rule.matches("Firefox", "Navigator", "Mozilla Firefox"));
        assert!(!rule.matches("Firefox", "Navigator", "Settings"));
        assert!(Rule::default().matches("", "", ""));
    }

    #[test]
    fn default_bindings_cover_every_tag() {
        let config = Config::default();
        let tag_views = config
            .keybindings
            .iter()
            .filter(|binding| binding.action == KeyAction::ViewTag && binding.arg != Arg::None)
            .count();
        assert_eq!(tag_views, 10);
    }

    #[test]
    fn default_float_positions_parse() {
        let config = Config::default();
        let positions: Vec<_> = config
            .keybindings
            .iter()
            .filter(|binding| binding.action == KeyAction::FloatPos)
            .collect();
        assert_eq!(positions.len(), 12);
        for binding in positions {
            let Arg::Str(spec) = &binding.arg else {
                panic!("float position without a string: {:?}", binding.arg);
            };
            assert!(spec.parse::<crate::floatpos::FloatPos>().is_ok(), "{spec}");
        }
    }

    #[test]
    fn switch_tag_modes() {
        assert!(SwitchTag::AddAndRevert.adds() && SwitchTag::AddAndRevert.reverts());
        assert!(!SwitchTag::View.adds() && !SwitchTag::View.reverts());
        assert!(SwitchTag::ViewAndRevert.reverts());
    }
}
