use crate::geometry::WindowGeometry;
use crate::size_hints::SizeHints;
use x11rb::protocol::xproto::Window;

pub type TagMask = u32;

pub const MIN_CFACT: f32 = 0.25;
pub const MAX_CFACT: f32 = 4.0;

/// Fake fullscreen keeps a fullscreen-requesting client inside its tile.
///
/// `FakeThenReal` marks a client promoted from fake to real fullscreen,
/// and `RealFromRequest` one that re-requested fullscreen while promoted.
/// Both fall back to `Fake` when real fullscreen ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FakeFullscreen {
    #[default]
    Off,
    Fake,
    FakeThenReal,
    RealFromRequest,
}

impl FakeFullscreen {
    pub fn is_fake(self) -> bool {
        self == Self::Fake
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    pub window: Window,
    pub name: String,
    pub class: String,
    pub instance: String,
    pub pid: Option<u32>,
    pub geometry: WindowGeometry,
    pub old_geometry: WindowGeometry,
    /// Border width the window had before it was managed.
    pub original_border_width: i32,
    /// Last floating geometry, restored when the client floats again.
    pub float_geometry: Option<WindowGeometry>,
    /// Border width while floating, overriding the configured one.
    pub float_border: Option<i32>,
    pub hints: SizeHints,
    pub cfact: f32,
    pub tags: TagMask,
    pub monitor_index: usize,
    pub is_fixed: bool,
    pub is_floating: bool,
    pub is_urgent: bool,
    pub never_focus: bool,
    pub is_fullscreen: bool,
    pub fake_fullscreen: FakeFullscreen,
    /// Floating state saved while real fullscreen is active.
    pub saved_floating: Option<bool>,
    pub is_terminal: bool,
    pub no_swallow: bool,
    pub ignore_size_hints: bool,
    /// Swallowing clients keep the terminal's position on configure requests.
    pub ignore_configure_position: bool,
    /// Set during mouse placement; geometry changes stay in the model only.
    pub being_moved: bool,
    /// Moved off-screen by a stacked layout axis or by monocle.
    pub hidden: bool,
    /// The parked terminal this client replaced.
    pub swallowing: Option<Box<Client>>,
    /// View to return to when the client goes away.
    pub switch_tag: Option<TagMask>,
}

impl Client {
    pub fn new(window: Window, monitor_index: usize, tags: TagMask) -> Self {
        Self {
            window,
            name: String::new(),
            class: String::new(),
            instance: String::new(),
            pid: None,
            geometry: WindowGeometry::default(),
            old_geometry: WindowGeometry::default(),
            original_border_width: 0,
            float_geometry: None,
            float_border: None,
            hints: SizeHints::default(),
            cfact: 1.0,
            tags,
            monitor_index,
            is_fixed: false,
            is_floating: false,
            is_urgent: false,
            never_focus: false,
            is_fullscreen: false,
            fake_fullscreen: FakeFullscreen::Off,
            saved_floating: None,
            is_terminal: false,
            no_swallow: false,
            ignore_size_hints: false,
            ignore_configure_position: false,
            being_moved: false,
            hidden: false,
            swallowing: None,
            switch_tag: None,
        }
    }

    pub fn width_with_border(&self) -> i32 {
        self.geometry.outer_width()
    }

    pub fn height_with_border(&self) -> i32 {
        self.geometry.outer_height()
    }

    pub fn is_visible_on(&self, tagset: TagMask) -> bool {
        self.tags & tagset != 0
    }

    /// Real fullscreen, the state that pins a window over its monitor.
    pub fn is_real_fullscreen(&self) -> bool {
        self.is_fullscreen && !self.fake_fullscreen.is_fake()
    }

    pub fn update_size_hints(&mut self, hints: SizeHints) {
        self.hints = hints;
        self.is_fixed = hints.is_fixed();
    }
}
