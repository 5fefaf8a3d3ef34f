//! The window manager's view of the display server.
//!
//! Every request the model makes goes through [`DisplayPort`]. The X11
//! adapter implements it over a live connection; [`HeadlessDisplay`]
//! records the calls so the model can be exercised without a server.

use crate::geometry::WindowGeometry;
use x11rb::protocol::xproto::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderScheme {
    Focused,
    Floating,
    Unfocused,
    /// Unfocused tiled client while gaps are at or below the tile switch.
    Seamless,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    Client { window: Window, never_focus: bool },
    Root,
}

pub trait DisplayPort {
    /// Applies position, size and border width, then sends the client a
    /// synthetic ConfigureNotify.
    fn configure_window(&mut self, window: Window, geometry: &WindowGeometry);
    fn move_window(&mut self, window: Window, x: i32, y: i32);
    fn raise_window(&mut self, window: Window);
    /// Stacks `windows` below the bar, each one below its predecessor.
    fn restack(&mut self, windows: &[Window]);
    fn set_border(&mut self, window: Window, scheme: BorderScheme);
    fn grab_buttons(&mut self, window: Window, focused: bool);
    fn set_input_focus(&mut self, target: FocusTarget);
    fn query_pointer(&mut self) -> Option<(i32, i32)>;
    fn warp_pointer(&mut self, window: Window, x: i32, y: i32);
    fn send_configure_notify(&mut self, window: Window, geometry: &WindowGeometry);
    fn set_fullscreen_state(&mut self, window: Window, fullscreen: bool);
    fn set_urgent(&mut self, window: Window, urgent: bool);
    fn map_window(&mut self, window: Window);
    fn close_window(&mut self, window: Window);
    /// Marks the window withdrawn, restoring its original border when given.
    fn withdraw_window(&mut self, window: Window, border_width: Option<i32>);
    fn update_client_list(&mut self, windows: &[Window]);
    fn bar_changed(&mut self, _monitor: usize) {}
    /// Drops queued pointer-crossing events produced by our own restacking.
    fn discard_enter_events(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum DisplayCall {
    Configure(Window, WindowGeometry),
    Move(Window, i32, i32),
    Raise(Window),
    Restack(Vec<Window>),
    Border(Window, BorderScheme),
    GrabButtons(Window, bool),
    Focus(FocusTarget),
    Warp(Window, i32, i32),
    ConfigureNotify(Window, WindowGeometry),
    Fullscreen(Window, bool),
    Urgent(Window, bool),
    Map(Window),
    Close(Window),
    Withdraw(Window, Option<i32>),
    ClientList(Vec<Window>),
    BarChanged(usize),
}

/// Records every request; the pointer position is set by the caller.
#[derive(Debug, Default)]
pub struct HeadlessDisplay {
    pub calls: Vec<DisplayCall>,
    pub pointer: Option<(i32, i32)>,
}

impl HeadlessDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// The most recent border scheme set on `window`.
    pub fn border_of(&self, window: Window) -> Option<BorderScheme> {
        self.calls.iter().rev().find_map(|call| match call {
            DisplayCall::Border(target, scheme) if *target == window => Some(*scheme),
            _ => None,
        })
    }

    pub fn last_focus(&self) -> Option<FocusTarget> {
        self.calls.iter().rev().find_map(|call| match call {
            DisplayCall::Focus(target) => Some(*target),
            _ => None,
        })
    }

    /// Where `window` was last placed by a configure or a move.
    pub fn position_of(&self, window: Window) -> Option<(i32, i32)> {
        self.calls.iter().rev().find_map(|call| match call {
            DisplayCall::Configure(target, geometry) if *target == window => {
                Some((geometry.x, geometry.y))
            }
            DisplayCall::Move(target, x, y) if *target == window => Some((*x, *y)),
            _ => None,
        })
    }
}

impl DisplayPort for HeadlessDisplay {
    fn configure_window(&mut self, window: Window, geometry: &WindowGeometry) {
        self.calls.push(DisplayCall::Configure(window, *geometry));
    }

    fn move_window(&mut self, window: Window, x: i32, y: i32) {
        self.calls.push(DisplayCall::Move(window, x, y));
    }

    fn raise_window(&mut self, window: Window) {
        self.calls.push(DisplayCall::Raise(window));
    }

    fn restack(&mut self, windows: &[Window]) {
        self.calls.push(DisplayCall::Restack(windows.to_vec()));
    }

    fn set_border(&mut self, window: Window, scheme: BorderScheme) {
        self.calls.push(DisplayCall::Border(window, scheme));
    }

    fn grab_buttons(&mut self, window: Window, focused: bool) {
        self.calls.push(DisplayCall::GrabButtons(window, focused));
    }

    fn set_input_focus(&mut self, target: FocusTarget) {
        self.calls.push(DisplayCall::Focus(target));
    }

    fn query_pointer(&mut self) -> Option<(i32, i32)> {
        self.pointer
    }

    fn warp_pointer(&mut self, window: Window, x: i32, y: i32) {
        self.calls.push(DisplayCall::Warp(window, x, y));
    }

    fn send_configure_notify(&mut self, window: Window, geometry: &WindowGeometry) {
        self.calls.push(DisplayCall::ConfigureNotify(window, *geometry));
    }

    fn set_fullscreen_state(&mut self, window: Window, fullscreen: bool) {
        self.calls.push(DisplayCall::Fullscreen(window, fullscreen));
    }

    fn set_urgent(&mut self, window: Window, urgent: bool) {
        self.calls.push(DisplayCall::Urgent(window, urgent));
    }

    fn map_window(&mut self, window: Window) {
        self.calls.push(DisplayCall::Map(window));
    }

    fn close_window(&mut self, window: Window) {
        self.calls.push(DisplayCall::Close(window));
    }

    fn withdraw_window(&mut self, window: Window, border_width: Option<i32>) {
        self.calls.push(DisplayCall::Withdraw(window, border_width));
    }

    fn update_client_list(&mut self, windows: &[Window]) {
        self.calls.push(DisplayCall::ClientList(windows.to_vec()));
    }

    fn bar_changed(&mut self, monitor: usize) {
        self.calls.push(DisplayCall::BarChanged(monitor));
    }
}
