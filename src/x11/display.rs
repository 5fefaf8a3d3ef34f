//! [`DisplayPort`] over a live X connection.

use super::atoms::AtomCache;
use super::keymap::lock_variants;
use crate::Config;
use crate::display::{BorderScheme, DisplayPort, FocusTarget};
use crate::errors::WmResult;
use crate::geometry::WindowGeometry;
use crate::keyboard::ClickTarget;
use crate::manage::{ManageRequest, PropertyUpdate};
use crate::size_hints::{SizeHints, offset};
use std::collections::VecDeque;
use std::fmt::Display;
use tracing::warn;
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::res::{ClientIdMask, ClientIdSpec, ConnectionExt as _};
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

const URGENCY_HINT: u32 = 1 << 8;
const INPUT_HINT: u32 = 1;
const WITHDRAWN_STATE: u32 = 0;
const NORMAL_STATE: u32 = 1;
const BROKEN_TITLE: &str = "broken";

fn report<T, E: Display>(request: &'static str, result: Result<T, E>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(request, %error, "X request failed");
            None
        }
    }
}

struct BorderColors {
    focused: u32,
    unfocused: u32,
    floating: u32,
    seamless: u32,
}

impl BorderColors {
    fn pixel(&self, scheme: BorderScheme) -> u32 {
        match scheme {
            BorderScheme::Focused => self.focused,
            BorderScheme::Unfocused => self.unfocused,
            BorderScheme::Floating => self.floating,
            BorderScheme::Seamless => self.seamless,
        }
    }
}

pub struct X11Display {
    pub(crate) connection: RustConnection,
    pub(crate) root: Window,
    pub(crate) atoms: AtomCache,
    colors: BorderColors,
    /// Client-window button bindings as (button, modifier mask).
    buttons: Vec<(u8, u16)>,
    pub(crate) numlock_mask: u16,
    /// Events read while discarding crossing events, delivered first.
    pending: VecDeque<Event>,
}

impl X11Display {
    pub fn new(connection: RustConnection, root: Window, atoms: AtomCache, config: &Config) -> Self {
        Self {
            connection,
            root,
            atoms,
            colors: BorderColors {
                focused: config.border_focused,
                unfocused: config.border_unfocused,
                floating: config.border_floating,
                seamless: config.border_seamless,
            },
            buttons: config
                .buttons
                .iter()
                .filter(|binding| binding.click == ClickTarget::ClientWindow)
                .map(|binding| (binding.button, binding.modifier_mask()))
                .collect(),
            numlock_mask: 0,
            pending: VecDeque::new(),
        }
    }

    /// Next event, blocking until one arrives.
    pub fn next_event(&mut self) -> WmResult<Event> {
        if let Some(event) = self.pending.pop_front() {
            return Ok(event);
        }
        Ok(self.connection.wait_for_event()?)
    }

    fn property(
        &self,
        window: Window,
        property: impl Into<Atom>,
        kind: impl Into<Atom>,
        length: u32,
    ) -> Option<GetPropertyReply> {
        self.connection
            .get_property(false, window, property, kind, 0, length)
            .ok()
            .and_then(|cookie| cookie.reply().ok())
    }

    fn property_u32s(
        &self,
        window: Window,
        property: impl Into<Atom>,
        kind: impl Into<Atom>,
        length: u32,
    ) -> Vec<u32> {
        let Some(reply) = self.property(window, property, kind, length) else {
            return Vec::new();
        };
        let values: Option<Vec<u32>> = reply.value32().map(Iterator::collect);
        values.unwrap_or_default()
    }

    pub fn transient_for(&self, window: Window) -> Option<Window> {
        self.property_u32s(window, AtomEnum::WM_TRANSIENT_FOR, AtomEnum::WINDOW, 1)
            .first()
            .copied()
            .filter(|&parent| parent != x11rb::NONE)
    }

    /// `(class, instance)` from WM_CLASS.
    pub fn class_hint(&self, window: Window) -> (String, String) {
        let Some(reply) = self.property(window, AtomEnum::WM_CLASS, AtomEnum::STRING, 1024) else {
            return (String::new(), String::new());
        };
        let mut parts = reply
            .value
            .split(|&byte| byte == 0)
            .map(|part| String::from_utf8_lossy(part).into_owned());
        let instance = parts.next().unwrap_or_default();
        let class = parts.next().unwrap_or_default();
        (class, instance)
    }

    pub fn title(&self, window: Window) -> String {
        let utf8 = self
            .property(window, self.atoms.net_wm_name, self.atoms.utf8_string, 256)
            .filter(|reply| !reply.value.is_empty());
        let reply = utf8.or_else(|| {
            self.property(window, self.atoms.wm_name, AtomEnum::STRING, 256)
                .filter(|reply| !reply.value.is_empty())
        });
        match reply {
            Some(reply) => String::from_utf8_lossy(&reply.value).into_owned(),
            None => BROKEN_TITLE.to_string(),
        }
    }

    pub fn size_hints(&self, window: Window) -> SizeHints {
        let values = self.property_u32s(
            window,
            AtomEnum::WM_NORMAL_HINTS,
            AtomEnum::WM_SIZE_HINTS,
            offset::LEN as u32,
        );
        SizeHints::from_raw(&values)
    }

    /// `(urgent, input)` from WM_HINTS; `input` is `None` without the input flag.
    pub fn wm_hints(&self, window: Window) -> Option<(bool, Option<bool>)> {
        let values = self.property_u32s(window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS, 9);
        let flags = *values.first()?;
        let input = (flags & INPUT_HINT != 0).then(|| values.get(1).is_some_and(|&input| input != 0));
        Some((flags & URGENCY_HINT != 0, input))
    }

    /// `(fullscreen, dialog)` from `_NET_WM_STATE` and `_NET_WM_WINDOW_TYPE`.
    pub fn window_type(&self, window: Window) -> (bool, bool) {
        let state = self.property_u32s(window, self.atoms.net_wm_state, AtomEnum::ATOM, 32);
        let kind = self.property_u32s(window, self.atoms.net_wm_window_type, AtomEnum::ATOM, 1);
        (
            state.contains(&self.atoms.net_wm_state_fullscreen),
            kind.first() == Some(&self.atoms.net_wm_window_type_dialog),
        )
    }

    /// Pid of the window's owner, from the X-Resource extension or `_NET_WM_PID`.
    pub fn pid(&self, window: Window) -> Option<u32> {
        let spec = ClientIdSpec {
            client: window,
            mask: ClientIdMask::LOCAL_CLIENT_PID,
        };
        let from_res = self
            .connection
            .res_query_client_ids(&[spec])
            .ok()
            .and_then(|cookie| cookie.reply().ok())
            .and_then(|reply| {
                reply
                    .ids
                    .iter()
                    .find(|id| {
                        u32::from(id.spec.mask) & u32::from(ClientIdMask::LOCAL_CLIENT_PID) != 0
                    })
                    .and_then(|id| id.value.first().copied())
            });
        from_res.or_else(|| {
            self.property_u32s(window, self.atoms.net_wm_pid, AtomEnum::CARDINAL, 1)
                .first()
                .copied()
        })
    }

    /// Reads everything `manage` needs from a window about to be mapped.
    pub fn manage_request(&self, window: Window) -> WmResult<ManageRequest> {
        let geometry = self.connection.get_geometry(window)?.reply()?;
        let (class, instance) = self.class_hint(window);
        let (urgent, input) = self.wm_hints(window).unwrap_or((false, None));
        let (fullscreen, dialog) = self.window_type(window);
        Ok(ManageRequest {
            window,
            geometry: WindowGeometry::new(
                i32::from(geometry.x),
                i32::from(geometry.y),
                i32::from(geometry.width),
                i32::from(geometry.height),
                i32::from(geometry.border_width),
            ),
            transient_for: self.transient_for(window),
            class,
            instance,
            name: self.title(window),
            pid: self.pid(window),
            hints: self.size_hints(window),
            urgent,
            never_focus: input.is_some_and(|input| !input),
            fullscreen,
            dialog,
        })
    }

    /// Decodes a PropertyNotify on a client into a model update.
    pub fn property_update(&self, window: Window, atom: Atom) -> Option<PropertyUpdate> {
        if atom == u32::from(AtomEnum::WM_TRANSIENT_FOR) {
            Some(PropertyUpdate::TransientFor(self.transient_for(window)))
        } else if atom == u32::from(AtomEnum::WM_NORMAL_HINTS) {
            Some(PropertyUpdate::SizeHints(self.size_hints(window)))
        } else if atom == u32::from(AtomEnum::WM_HINTS) {
            let (urgent, input) = self.wm_hints(window)?;
            Some(PropertyUpdate::WmHints { urgent, input })
        } else if atom == self.atoms.wm_name || atom == self.atoms.net_wm_name {
            Some(PropertyUpdate::Title(self.title(window)))
        } else if atom == self.atoms.net_wm_window_type {
            let (fullscreen, dialog) = self.window_type(window);
            Some(PropertyUpdate::WindowType { fullscreen, dialog })
        } else {
            None
        }
    }

    /// Sends a WM_PROTOCOLS message when the window supports `protocol`.
    fn send_protocol(&self, window: Window, protocol: Atom) -> WmResult<bool> {
        let protocols = self.property_u32s(window, self.atoms.wm_protocols, AtomEnum::ATOM, 100);
        if !protocols.contains(&protocol) {
            return Ok(false);
        }
        let event = ClientMessageEvent::new(
            32,
            window,
            self.atoms.wm_protocols,
            [protocol, x11rb::CURRENT_TIME, 0, 0, 0],
        );
        self.connection
            .send_event(false, window, EventMask::NO_EVENT, event)?;
        Ok(true)
    }

    fn set_wm_state(&self, window: Window, state: u32) -> WmResult<()> {
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            self.atoms.wm_state,
            self.atoms.wm_state,
            &[state, x11rb::NONE],
        )?;
        Ok(())
    }

    fn try_configure(&self, window: Window, geometry: &WindowGeometry) -> WmResult<()> {
        self.connection.configure_window(
            window,
            &ConfigureWindowAux::new()
                .x(geometry.x)
                .y(geometry.y)
                .width(geometry.width.max(1) as u32)
                .height(geometry.height.max(1) as u32)
                .border_width(geometry.border_width.max(0) as u32),
        )?;
        self.try_configure_notify(window, geometry)
    }

    fn try_configure_notify(&self, window: Window, geometry: &WindowGeometry) -> WmResult<()> {
        let event = ConfigureNotifyEvent {
            response_type: CONFIGURE_NOTIFY_EVENT,
            sequence: 0,
            event: window,
            window,
            above_sibling: x11rb::NONE,
            x: geometry.x as i16,
            y: geometry.y as i16,
            width: geometry.width.max(1) as u16,
            height: geometry.height.max(1) as u16,
            border_width: geometry.border_width.max(0) as u16,
            override_redirect: false,
        };
        self.connection
            .send_event(false, window, EventMask::STRUCTURE_NOTIFY, event)?;
        Ok(())
    }

    fn try_restack(&self, windows: &[Window]) -> WmResult<()> {
        let mut sibling = None;
        for &window in windows {
            let mut changes = ConfigureWindowAux::new().stack_mode(StackMode::BELOW);
            if let Some(sibling) = sibling {
                changes = changes.sibling(sibling);
            }
            self.connection.configure_window(window, &changes)?;
            sibling = Some(window);
        }
        Ok(())
    }

    fn try_grab_buttons(&self, window: Window, focused: bool) -> WmResult<()> {
        self.connection
            .ungrab_button(ButtonIndex::ANY, window, ModMask::ANY)?;
        let mask = EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE;
        if !focused {
            self.connection.grab_button(
                false,
                window,
                mask,
                GrabMode::SYNC,
                GrabMode::SYNC,
                x11rb::NONE,
                x11rb::NONE,
                ButtonIndex::ANY,
                ModMask::ANY,
            )?;
        }
        for &(button, modifiers) in &self.buttons {
            for variant in lock_variants(self.numlock_mask) {
                self.connection.grab_button(
                    false,
                    window,
                    mask,
                    GrabMode::ASYNC,
                    GrabMode::SYNC,
                    x11rb::NONE,
                    x11rb::NONE,
                    ButtonIndex::from(button),
                    ModMask::from(modifiers | variant),
                )?;
            }
        }
        Ok(())
    }

    fn try_focus(&self, target: FocusTarget) -> WmResult<()> {
        match target {
            FocusTarget::Client {
                window,
                never_focus,
            } => {
                if !never_focus {
                    self.connection.set_input_focus(
                        InputFocus::POINTER_ROOT,
                        window,
                        x11rb::CURRENT_TIME,
                    )?;
                    self.connection.change_property32(
                        PropMode::REPLACE,
                        self.root,
                        self.atoms.net_active_window,
                        AtomEnum::WINDOW,
                        &[window],
                    )?;
                }
                self.send_protocol(window, self.atoms.wm_take_focus)?;
            }
            FocusTarget::Root => {
                self.connection.set_input_focus(
                    InputFocus::POINTER_ROOT,
                    self.root,
                    x11rb::CURRENT_TIME,
                )?;
                self.connection
                    .delete_property(self.root, self.atoms.net_active_window)?;
            }
        }
        Ok(())
    }

    fn try_set_urgent(&self, window: Window, urgent: bool) -> WmResult<()> {
        let mut values = self.property_u32s(window, AtomEnum::WM_HINTS, AtomEnum::WM_HINTS, 9);
        let Some(flags) = values.first_mut() else {
            return Ok(());
        };
        if urgent {
            *flags |= URGENCY_HINT;
        } else {
            *flags &= !URGENCY_HINT;
        }
        self.connection.change_property32(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_HINTS,
            AtomEnum::WM_HINTS,
            &values,
        )?;
        Ok(())
    }

    fn try_close(&self, window: Window) -> WmResult<()> {
        if !self.send_protocol(window, self.atoms.wm_delete_window)? {
            self.connection.grab_server()?;
            self.connection.set_close_down_mode(CloseDown::DESTROY_ALL)?;
            self.connection.kill_client(window)?;
            self.connection.ungrab_server()?;
        }
        Ok(())
    }

    fn try_withdraw(&self, window: Window, border_width: Option<i32>) -> WmResult<()> {
        if let Some(border_width) = border_width {
            self.connection.grab_server()?;
            self.connection.configure_window(
                window,
                &ConfigureWindowAux::new().border_width(border_width.max(0) as u32),
            )?;
            self.connection
                .ungrab_button(ButtonIndex::ANY, window, ModMask::ANY)?;
            self.set_wm_state(window, WITHDRAWN_STATE)?;
            self.connection.ungrab_server()?;
        } else {
            self.set_wm_state(window, WITHDRAWN_STATE)?;
        }
        Ok(())
    }

    fn try_discard_enter_events(&mut self) -> WmResult<()> {
        self.connection.get_input_focus()?.reply()?;
        while let Some(event) = self.connection.poll_for_event()? {
            if !matches!(event, Event::EnterNotify(_)) {
                self.pending.push_back(event);
            }
        }
        Ok(())
    }
}

impl DisplayPort for X11Display {
    fn configure_window(&mut self, window: Window, geometry: &WindowGeometry) {
        report("configure_window", self.try_configure(window, geometry));
    }

    fn move_window(&mut self, window: Window, x: i32, y: i32) {
        let changes = ConfigureWindowAux::new().x(x).y(y);
        report("move_window", self.connection.configure_window(window, &changes));
    }

    fn raise_window(&mut self, window: Window) {
        let changes = ConfigureWindowAux::new().stack_mode(StackMode::ABOVE);
        report("raise_window", self.connection.configure_window(window, &changes));
    }

    fn restack(&mut self, windows: &[Window]) {
        report("restack", self.try_restack(windows));
    }

    fn set_border(&mut self, window: Window, scheme: BorderScheme) {
        let changes = ChangeWindowAttributesAux::new().border_pixel(self.colors.pixel(scheme));
        report(
            "set_border",
            self.connection.change_window_attributes(window, &changes),
        );
    }

    fn grab_buttons(&mut self, window: Window, focused: bool) {
        report("grab_buttons", self.try_grab_buttons(window, focused));
    }

    fn set_input_focus(&mut self, target: FocusTarget) {
        report("set_input_focus", self.try_focus(target));
    }

    fn query_pointer(&mut self) -> Option<(i32, i32)> {
        let reply = self
            .connection
            .query_pointer(self.root)
            .map_err(Into::into)
            .and_then(|cookie| cookie.reply());
        report("query_pointer", reply)
            .map(|reply| (i32::from(reply.root_x), i32::from(reply.root_y)))
    }

    fn warp_pointer(&mut self, window: Window, x: i32, y: i32) {
        report(
            "warp_pointer",
            self.connection
                .warp_pointer(x11rb::NONE, window, 0, 0, 0, 0, x as i16, y as i16),
        );
    }

    fn send_configure_notify(&mut self, window: Window, geometry: &WindowGeometry) {
        report("configure_notify", self.try_configure_notify(window, geometry));
    }

    fn set_fullscreen_state(&mut self, window: Window, fullscreen: bool) {
        let state: &[Atom] = if fullscreen {
            &[self.atoms.net_wm_state_fullscreen]
        } else {
            &[]
        };
        report(
            "set_fullscreen_state",
            self.connection.change_property32(
                PropMode::REPLACE,
                window,
                self.atoms.net_wm_state,
                AtomEnum::ATOM,
                state,
            ),
        );
    }

    fn set_urgent(&mut self, window: Window, urgent: bool) {
        report("set_urgent", self.try_set_urgent(window, urgent));
    }

    fn map_window(&mut self, window: Window) {
        report("map_window", self.connection.map_window(window));
        report("set_wm_state", self.set_wm_state(window, NORMAL_STATE));
    }

    fn close_window(&mut self, window: Window) {
        report("close_window", self.try_close(window));
    }

    fn withdraw_window(&mut self, window: Window, border_width: Option<i32>) {
        report("withdraw_window", self.try_withdraw(window, border_width));
    }

    fn update_client_list(&mut self, windows: &[Window]) {
        report(
            "update_client_list",
            self.connection.change_property32(
                PropMode::REPLACE,
                self.root,
                self.atoms.net_client_list,
                AtomEnum::WINDOW,
                windows,
            ),
        );
    }

    fn discard_enter_events(&mut self) {
        report("discard_enter_events", self.try_discard_enter_events());
    }
}
