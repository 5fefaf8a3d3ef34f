//! Client lifecycle and the event entry points the adapter calls.
//!
//! Every method here takes already-decoded data, so the whole path from a
//! map request to the final arrange runs against [`HeadlessDisplay`] in
//! tests.
//!
//! [`HeadlessDisplay`]: crate::display::HeadlessDisplay

use crate::SwitchTag;
use crate::client::{Client, FakeFullscreen};
use crate::display::{BorderScheme, DisplayPort};
use crate::floatpos::{FloatPos, place_floating};
use crate::geometry::{Rect, WindowGeometry};
use crate::keyboard::{ClickTarget, find_button_action};
use crate::monitor::Monitor;
use crate::size_hints::SizeHints;
use crate::window_manager::WindowManager;
use tracing::{debug, warn};
use x11rb::protocol::xproto::Window;

/// Everything read from a window before it is managed.
#[derive(Debug, Clone, Default)]
pub struct ManageRequest {
    pub window: Window,
    /// Initial geometry; the border is the window's own border width.
    pub geometry: WindowGeometry,
    pub transient_for: Option<Window>,
    pub class: String,
    pub instance: String,
    pub name: String,
    pub pid: Option<u32>,
    pub hints: SizeHints,
    pub urgent: bool,
    pub never_focus: bool,
    /// `_NET_WM_STATE` already holds fullscreen.
    pub fullscreen: bool,
    /// `_NET_WM_WINDOW_TYPE` is a dialog.
    pub dialog: bool,
}

impl ManageRequest {
    pub fn new(window: Window, geometry: WindowGeometry) -> Self {
        Self {
            window,
            geometry,
            ..Self::default()
        }
    }
}

/// Fields present in a ConfigureRequest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigureRequest {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub border_width: Option<i32>,
}

/// A property of a managed window changed.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyUpdate {
    TransientFor(Option<Window>),
    SizeHints(SizeHints),
    WmHints { urgent: bool, input: Option<bool> },
    Title(String),
    WindowType { fullscreen: bool, dialog: bool },
}

/// `_NET_WM_STATE` client message action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Remove,
    Add,
    Toggle,
}

impl StateAction {
    pub fn from_raw(value: u32) -> Option<Self> {
        match value {
            0 => Some(Self::Remove),
            1 => Some(Self::Add),
            2 => Some(Self::Toggle),
            _ => None,
        }
    }
}

impl<D: DisplayPort> WindowManager<D> {
    /// Starts managing a newly mapped window.
    pub fn manage(&mut self, request: ManageRequest) {
        let window = request.window;
        if self.clients.contains_key(&window) {
            return;
        }

        let mut client = Client::new(window, self.selected_monitor, 0);
        client.name = request.name;
        client.class = request.class;
        client.instance = request.instance;
        client.pid = request.pid;
        client.geometry = request.geometry;
        client.old_geometry = request.geometry;
        client.original_border_width = request.geometry.border_width;

        let parent = request
            .transient_for
            .and_then(|parent| self.clients.get(&parent))
            .map(|parent| (parent.monitor_index, parent.tags));
        let mut terminal = None;
        match parent {
            Some((monitor, tags)) => {
                client.monitor_index = monitor;
                client.tags = tags;
            }
            None => {
                self.apply_rules(&mut client);
                terminal = self.term_for_window(&client);
            }
        }

        let border = match client.float_border {
            Some(border) if client.is_floating => border,
            _ => self.config.border_width,
        };
        let monitor = &self.monitors[client.monitor_index];
        client.geometry = clamp_to_monitor(client.geometry, border, monitor);
        client.geometry.border_width = border;
        let index = client.monitor_index;
        debug!(
            window,
            class = %client.class,
            monitor = index,
            tags = client.tags,
            "managing window"
        );

        self.display.configure_window(window, &client.geometry);
        let scheme = if client.is_floating {
            BorderScheme::Floating
        } else if self.current_monitor().gap > self.config.tile_switch {
            BorderScheme::Unfocused
        } else {
            BorderScheme::Seamless
        };
        self.display.set_border(window, scheme);

        client.update_size_hints(request.hints);
        client.is_urgent = request.urgent;
        client.never_focus = request.never_focus;
        self.clients.insert(window, client);

        if request.fullscreen {
            self.set_fullscreen(window, true);
        }
        self.display.grab_buttons(window, false);
        let Some(client) = self.clients.get_mut(&window) else {
            return;
        };
        if request.dialog {
            client.is_floating = true;
        }
        if !client.is_floating {
            client.is_floating = parent.is_some() || client.is_fixed;
        }
        if client.is_floating {
            self.display.raise_window(window);
            self.display.set_border(window, BorderScheme::Floating);
        }

        let mut focusing = true;
        let swallowed = match terminal {
            Some(terminal) => {
                let terminal_selected = self.selected_window() == Some(terminal);
                let swallowed = self.swallow(terminal, window);
                if swallowed {
                    focusing = terminal_selected;
                }
                swallowed
            }
            None => false,
        };
        if !swallowed {
            self.attach(window);
            self.attach_stack(window);
        }

        self.update_client_list();
        if let Some(client) = self.clients.get(&window) {
            let geometry = client.geometry;
            self.display
                .move_window(window, geometry.x + 2 * self.screen_width, geometry.y);
        }

        let Some(index) = self.client_monitor(window) else {
            return;
        };
        if focusing {
            if index == self.selected_monitor {
                self.lose_fullscreen(window);
                if let Some(selected) = self.selected_window() {
                    self.unfocus(selected, false);
                }
            }
            self.monitors[index].selected = Some(window);
        }

        self.arrange(Some(index));
        self.display.map_window(window);
        if focusing {
            self.focus(None);
        }
    }

    /// Applies the first matching rule, then settles the tag mask.
    ///
    /// A rule with a tag switch views the client's tags right away, before
    /// the client is attached.
    pub(crate) fn apply_rules(&mut self, client: &mut Client) {
        client.is_floating = false;
        client.tags = 0;

        let rule = self
            .config
            .rules
            .iter()
            .find(|rule| rule.matches(&client.class, &client.instance, &client.name))
            .cloned();
        if let Some(rule) = rule {
            client.is_terminal = rule.is_terminal;
            client.no_swallow = rule.no_swallow;
            client.is_floating = rule.is_floating;
            client.ignore_size_hints = rule.ignore_size_hints;
            if rule.is_fake_fullscreen {
                client.fake_fullscreen = FakeFullscreen::Fake;
            }
            client.tags |= rule.tags;
            if let Some(monitor) = rule.monitor.filter(|&monitor| monitor < self.monitors.len()) {
                client.monitor_index = monitor;
            }
            client.float_border = rule.float_border;
            if let Some(position) = &rule.float_pos {
                self.place_by_rule(client, position);
            }
            if rule.switch_tag != SwitchTag::Off {
                self.switch_to_client_tags(client, rule.switch_tag);
            }
        }

        let masked = client.tags & self.tag_mask();
        client.tags = if masked != 0 {
            masked
        } else {
            self.monitors[client.monitor_index].tags()
        };
    }

    fn place_by_rule(&mut self, client: &mut Client, position: &str) {
        let position = match position.parse::<FloatPos>() {
            Ok(position) => position,
            Err(error) => {
                warn!(window = client.window, "{error}");
                return;
            }
        };
        let pointer = if position.follows_pointer() {
            self.display.query_pointer()
        } else {
            None
        };
        client.geometry.border_width = self.config.border_width;
        let monitor = &self.monitors[client.monitor_index];
        if let Some(geometry) =
            place_floating(client, monitor, &position, pointer, self.config.float_pos_grid)
        {
            client.geometry = geometry;
        }
    }

    /// Views (or adds) the tags a ruled client lands on when none of them
    /// is shown yet, remembering the old view if the rule reverts.
    fn switch_to_client_tags(&mut self, client: &mut Client, mode: SwitchTag) {
        self.selected_monitor = client.monitor_index;
        let mask = self.tag_mask();
        let wanted = client.tags & mask;
        let current = self.current_monitor().tags();
        if wanted == 0 || wanted & current != 0 {
            return;
        }
        if mode.reverts() {
            client.switch_tag = Some(current);
        }
        if mode.adds() {
            self.toggle_view(wanted);
        } else {
            self.view(wanted);
        }
    }

    /// Stops managing `window`; `destroyed` skips touching the gone window.
    pub fn unmanage(&mut self, window: Window, destroyed: bool) {
        let Some(index) = self.client_monitor(window) else {
            return;
        };
        if self.clients.get(&window).is_some_and(|c| c.swallowing.is_some()) {
            self.unswallow(window);
        }
        if self
            .drag
            .as_ref()
            .is_some_and(|session| session.window == Some(window))
        {
            self.drag = None;
        }

        self.detach(window);
        self.detach_stack(window);
        let Some(client) = self.clients.remove(&window) else {
            return;
        };
        for monitor in &mut self.monitors {
            monitor.pertag.forget(window);
        }
        debug!(window, destroyed, "unmanaging window");
        if !destroyed {
            self.display
                .withdraw_window(window, Some(client.original_border_width));
        }

        self.focus(None);
        self.update_client_list();
        self.arrange(Some(index));
        if let Some(tags) = client.switch_tag {
            debug!(window, tags, "returning to the view before the rule switched it");
            self.view(tags);
        }
    }

    pub fn on_destroy(&mut self, window: Window) {
        if self.clients.contains_key(&window) {
            self.unmanage(window, true);
        } else if let Some(owner) = self.swallowing_client(window) {
            debug!(terminal = window, owner, "parked terminal destroyed");
            if let Some(client) = self.clients.get_mut(&owner) {
                client.swallowing = None;
            }
        }
    }

    /// A synthetic unmap only withdraws the window; a real one unmanages it.
    pub fn on_unmap(&mut self, window: Window, synthetic: bool) {
        if !self.clients.contains_key(&window) {
            return;
        }
        if synthetic {
            self.display.withdraw_window(window, None);
        } else {
            self.unmanage(window, false);
        }
    }

    /// Handles a ConfigureRequest for a managed window. Returns `false` for
    /// unmanaged windows, whose request the caller forwards unchanged.
    pub fn on_configure_request(&mut self, window: Window, request: ConfigureRequest) -> bool {
        let Some(client) = self.clients.get_mut(&window) else {
            return false;
        };

        if let Some(border_width) = request.border_width {
            client.geometry.border_width = border_width;
            return true;
        }

        let monitor = &self.monitors[client.monitor_index];
        if !client.is_floating && monitor.arranges() {
            let geometry = client.geometry;
            self.display.send_configure_notify(window, &geometry);
            return true;
        }

        let screen = monitor.screen;
        let previous = client.geometry;
        let mut geometry = previous;
        if !client.ignore_configure_position {
            if let Some(x) = request.x {
                geometry.x = screen.x + x;
            }
            if let Some(y) = request.y {
                geometry.y = screen.y + y;
            }
        }
        if let Some(width) = request.width {
            geometry.width = width;
        }
        if let Some(height) = request.height {
            geometry.height = height;
        }
        if client.is_floating {
            if geometry.x + geometry.width > screen.right() {
                geometry.x = screen.x + (screen.width / 2 - geometry.outer_width() / 2);
            }
            if geometry.y + geometry.height > screen.bottom() {
                geometry.y = screen.y + (screen.height / 2 - geometry.outer_height() / 2);
            }
        }
        if geometry != previous {
            client.old_geometry = previous;
        }
        client.geometry = geometry;

        let moved_only = (request.x.is_some() || request.y.is_some())
            && request.width.is_none()
            && request.height.is_none();
        if moved_only {
            self.display.send_configure_notify(window, &geometry);
        }
        if self.is_visible(window) {
            self.display.configure_window(window, &geometry);
        }
        true
    }

    pub fn on_property_change(&mut self, window: Window, update: PropertyUpdate) {
        let selected = self.selected_window() == Some(window);
        let Some(client) = self.clients.get_mut(&window) else {
            return;
        };
        let index = client.monitor_index;

        match update {
            PropertyUpdate::TransientFor(parent) => {
                if !client.is_floating
                    && let Some(parent) = parent
                    && self.clients.contains_key(&parent)
                {
                    if let Some(client) = self.clients.get_mut(&window) {
                        client.is_floating = true;
                    }
                    self.arrange(Some(index));
                }
            }
            PropertyUpdate::SizeHints(hints) => client.update_size_hints(hints),
            PropertyUpdate::WmHints { urgent, input } => {
                if selected && urgent {
                    self.display.set_urgent(window, false);
                } else {
                    client.is_urgent = urgent;
                }
                if let Some(client) = self.clients.get_mut(&window) {
                    client.never_focus = input.is_some_and(|input| !input);
                }
                for monitor in 0..self.monitors.len() {
                    self.display.bar_changed(monitor);
                }
            }
            PropertyUpdate::Title(name) => {
                client.name = name;
                if self.monitors[index].selected == Some(window) {
                    self.display.bar_changed(index);
                }
            }
            PropertyUpdate::WindowType { fullscreen, dialog } => {
                if dialog {
                    client.is_floating = true;
                }
                if fullscreen {
                    self.set_fullscreen(window, true);
                }
            }
        }
    }

    /// A `_NET_WM_STATE` fullscreen client message.
    pub fn on_fullscreen_request(&mut self, window: Window, action: StateAction) {
        let Some(client) = self.clients.get_mut(&window) else {
            return;
        };
        if client.fake_fullscreen == FakeFullscreen::FakeThenReal && client.is_fullscreen {
            client.fake_fullscreen = FakeFullscreen::RealFromRequest;
        }
        let fullscreen = match action {
            StateAction::Add => true,
            StateAction::Toggle => !client.is_fullscreen,
            StateAction::Remove => false,
        };
        self.set_fullscreen(window, fullscreen);
    }

    /// `_NET_ACTIVE_WINDOW`: flags the window urgent instead of stealing focus.
    pub fn on_activate_request(&mut self, window: Window) {
        let Some(client) = self.clients.get(&window) else {
            return;
        };
        if self.selected_window() != Some(window) && !client.is_urgent {
            self.set_urgent(window, true);
        }
    }

    /// Pointer entered `window` (a client, or `None` for the root) at root
    /// coordinates `x`, `y`.
    pub fn on_enter(&mut self, window: Option<Window>, x: i32, y: i32) {
        let client = window.filter(|window| self.clients.contains_key(window));
        let monitor = match client.and_then(|window| self.client_monitor(window)) {
            Some(monitor) => monitor,
            None => self.monitor_at_point(x, y),
        };
        if monitor != self.selected_monitor {
            if let Some(selected) = self.selected_window() {
                self.unfocus(selected, true);
            }
            self.selected_monitor = monitor;
        } else if client.is_none() || client == self.selected_window() {
            return;
        }
        self.focus(client);
    }

    /// Pointer motion over the root window switches the selected monitor.
    pub fn on_pointer_motion(&mut self, x: i32, y: i32) {
        let monitor = self.monitor_at_point(x, y);
        if let Some(previous) = self.motion_monitor
            && previous != monitor
        {
            if let Some(selected) = self.selected_window() {
                self.unfocus(selected, true);
            }
            debug!(from = self.selected_monitor, to = monitor, "pointer changed monitor");
            self.selected_monitor = monitor;
            self.focus(None);
        }
        self.motion_monitor = Some(monitor);
    }

    /// A button press on a client (`Some`) or the root (`None`) at root
    /// coordinates `x`, `y`.
    pub fn on_button_press(
        &mut self,
        window: Option<Window>,
        x: i32,
        y: i32,
        button: u8,
        state: u16,
        numlock_mask: u16,
    ) {
        let client = window.filter(|window| self.clients.contains_key(window));
        let monitor = match client.and_then(|window| self.client_monitor(window)) {
            Some(monitor) => monitor,
            None => self.monitor_at_point(x, y),
        };
        if monitor != self.selected_monitor {
            if let Some(selected) = self.selected_window() {
                self.unfocus(selected, true);
            }
            self.selected_monitor = monitor;
            self.focus(None);
        }

        let click = match client {
            Some(window) => {
                self.focus(Some(window));
                self.restack(self.selected_monitor);
                ClickTarget::ClientWindow
            }
            None => ClickTarget::RootWindow,
        };
        let action = find_button_action(click, button, state, numlock_mask, &self.config.buttons)
            .map(|binding| binding.action);
        if let Some(action) = action {
            self.run_mouse_action(action, x, y);
        }
    }

    /// Reconciles monitors with the current screen rectangles. Duplicate
    /// rectangles count once; clients of removed monitors move to the
    /// first one. Returns whether anything changed.
    pub fn update_geometry(&mut self, screens: &[Rect]) -> bool {
        let mut unique: Vec<Rect> = Vec::with_capacity(screens.len());
        for screen in screens {
            if !unique.contains(screen) {
                unique.push(*screen);
            }
        }
        if unique.is_empty() {
            unique.push(Rect::new(0, 0, self.screen_width, self.screen_height));
        }

        let mut dirty = false;
        while self.monitors.len() > unique.len() {
            let index = self.monitors.len() - 1;
            for window in self.monitors[index].clients.clone() {
                dirty = true;
                self.detach(window);
                self.detach_stack(window);
                if let Some(client) = self.clients.get_mut(&window) {
                    client.monitor_index = 0;
                }
                self.attach(window);
                self.attach_stack(window);
            }
            if self.selected_monitor == index {
                self.selected_monitor = 0;
            }
            debug!(monitor = index, "monitor removed");
            self.monitors.pop();
        }

        let bar = self.config.bar_settings();
        for (num, screen) in unique.into_iter().enumerate() {
            match self.monitors.get_mut(num) {
                Some(monitor) if monitor.screen == screen => {}
                Some(monitor) => {
                    dirty = true;
                    monitor.num = num;
                    monitor.set_screen(screen, &bar);
                    debug!(monitor = num, ?screen, "monitor resized");
                }
                None => {
                    dirty = true;
                    self.monitors.push(Monitor::new(num, screen, &self.config));
                    debug!(monitor = num, ?screen, "monitor added");
                }
            }
        }

        if dirty {
            self.motion_monitor = None;
            if self
                .drag
                .as_ref()
                .is_some_and(|session| session.monitor >= self.monitors.len())
            {
                self.cancel_drag();
            }
            self.selected_monitor = 0;
            self.selected_monitor = self.monitor_under_pointer();
        }
        dirty
    }

    /// The root window changed size; `screens` are the new monitor
    /// rectangles.
    pub fn on_root_resize(&mut self, width: i32, height: i32, screens: &[Rect]) {
        let dirty = self.screen_width != width || self.screen_height != height;
        self.screen_width = width;
        self.screen_height = height;
        if !self.update_geometry(screens) && !dirty {
            return;
        }

        for index in 0..self.monitors.len() {
            let screen = self.monitors[index].screen;
            for window in self.monitors[index].clients.clone() {
                let Some(client) = self.clients.get(&window) else {
                    continue;
                };
                if client.is_real_fullscreen() {
                    let border = client.geometry.border_width;
                    self.resize_client(
                        window,
                        WindowGeometry::new(screen.x, screen.y, screen.width, screen.height, border),
                    );
                }
            }
            self.display.bar_changed(index);
        }
        self.focus(None);
        self.arrange(None);
    }
}

/// Keeps a new window on its monitor's screen, and below a top bar when its
/// center would land on it.
fn clamp_to_monitor(geometry: WindowGeometry, border_width: i32, monitor: &Monitor) -> WindowGeometry {
    let screen = monitor.screen;
    let area = monitor.work_area;
    let outer_width = geometry.width + 2 * border_width;
    let outer_height = geometry.height + 2 * border_width;
    let mut clamped = geometry;

    if clamped.x + outer_width > screen.right() {
        clamped.x = screen.right() - outer_width;
    }
    if clamped.y + outer_height > screen.bottom() {
        clamped.y = screen.bottom() - outer_height;
    }
    clamped.x = clamped.x.max(screen.x);
    let center = clamped.x + clamped.width / 2;
    let covers_bar = monitor.bar_y == screen.y && center >= area.x && center < area.right();
    clamped.y = clamped.y.max(if covers_bar { area.y } else { screen.y });
    clamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use crate::Rule;
    use crate::display::HeadlessDisplay;
    use crate::swallow::ProcessTree;

    struct NoProcesses;

    impl ProcessTree for NoProcesses {
        fn parent_of(&self, _pid: u32) -> Option<u32> {
            None
        }

        fn is_multiplexer_server(&self, _pid: u32) -> bool {
            false
        }

        fn multiplexer_client_of(&self, _pane_pid: u32) -> Option<u32> {
            None
        }
    }

    fn manager(config: Config) -> WindowManager<HeadlessDisplay> {
        WindowManager::new(
            config,
            HeadlessDisplay::new(),
            Box::new(NoProcesses),
            Rect::new(0, 0, 1280, 800),
        )
    }

    #[test]
    fn rules_set_tags_and_flags() {
        let mut config = Config::default();
        config.rules = vec![Rule {
            class: Some("Gimp".into()),
            tags: 1 << 4,
            is_floating: true,
            ..Rule::default()
        }];
        let mut wm = manager(config);

        let mut client = Client::new(1, 0, 0);
        client.class = "Gimp".into();
        wm.apply_rules(&mut client);
        assert_eq!(client.tags, 1 << 4);
        assert!(client.is_floating);

        let mut other = Client::new(2, 0, 0);
        other.class = "xterm".into();
        wm.apply_rules(&mut other);
        assert_eq!(other.tags, 1);
        assert!(!other.is_floating);
    }

    #[test]
    fn rule_tags_outside_the_mask_fall_back_to_the_view() {
        let mut config = Config::default();
        config.rules = vec![Rule {
            class: Some("x".into()),
            tags: 1 << 20,
            ..Rule::default()
        }];
        let mut wm = manager(config);
        let mut client = Client::new(1, 0, 0);
        client.class = "x".into();
        wm.apply_rules(&mut client);
        assert_eq!(client.tags, 1);
    }

    #[test]
    fn new_windows_stay_off_the_top_bar() {
        let mut config = Config::default();
        config.bar_gap = false;
        let wm = manager(config);
        let monitor = &wm.monitors[0];
        assert_eq!(monitor.bar_y, 0);

        let clamped = clamp_to_monitor(WindowGeometry::new(100, 0, 200, 100, 0), 1, monitor);
        assert_eq!((clamped.x, clamped.y), (100, 20));

        let clamped = clamp_to_monitor(WindowGeometry::new(1200, 750, 200, 100, 0), 1, monitor);
        assert_eq!((clamped.x, clamped.y), (1078, 698));
    }

    #[test]
    fn state_actions_decode() {
        assert_eq!(StateAction::from_raw(0), Some(StateAction::Remove));
        assert_eq!(StateAction::from_raw(2), Some(StateAction::Toggle));
        assert_eq!(StateAction::from_raw(7), None);
    }
}
