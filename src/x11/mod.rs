//! The X11 side: connection setup, monitor detection and the event loop.
//!
//! Events are decoded here and handed to the [`WindowManager`] entry
//! points; all requests flow back out through [`X11Display`].

pub mod atoms;
mod display;
pub mod keymap;

pub use display::X11Display;
pub use keymap::KeyboardMapping;

use crate::Config;
use crate::drag::DragKind;
use crate::errors::{WmResult, X11Error};
use crate::geometry::Rect;
use crate::manage::{ConfigureRequest, StateAction};
use crate::swallow::ProcFs;
use crate::window_manager::WindowManager;
use atoms::AtomCache;
use tracing::{debug, info, warn};
use x11rb::connection::Connection;
use x11rb::cursor::Handle as CursorHandle;
use x11rb::protocol::Event;
use x11rb::protocol::xinerama::ConnectionExt as _;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

const ICONIC_STATE: u32 = 3;
const SEND_EVENT_BIT: u8 = 0x80;

struct Cursors {
    normal: Cursor,
    moving: Cursor,
    resizing: Cursor,
}

impl Cursors {
    fn load(connection: &RustConnection, screen_number: usize) -> WmResult<Self> {
        let database = x11rb::resource_manager::new_from_default(connection)?;
        let handle = CursorHandle::new(connection, screen_number, &database)?.reply()?;
        Ok(Self {
            normal: handle.load_cursor(connection, "left_ptr")?,
            moving: handle.load_cursor(connection, "fleur")?,
            resizing: handle.load_cursor(connection, "sizing")?,
        })
    }
}

/// Screen rectangles from Xinerama, deduplicated and ordered top-left
/// first, or the whole root when Xinerama is inactive.
fn detect_screens(connection: &RustConnection, root_width: i32, root_height: i32) -> Vec<Rect> {
    let fallback = vec![Rect::new(0, 0, root_width, root_height)];
    let active = connection
        .xinerama_is_active()
        .ok()
        .and_then(|cookie| cookie.reply().ok())
        .is_some_and(|reply| reply.state != 0);
    if !active {
        return fallback;
    }
    let Some(reply) = connection
        .xinerama_query_screens()
        .ok()
        .and_then(|cookie| cookie.reply().ok())
    else {
        return fallback;
    };

    let mut screens: Vec<Rect> = Vec::new();
    for info in &reply.screen_info {
        if info.width == 0 || info.height == 0 {
            continue;
        }
        let screen = Rect::new(
            i32::from(info.x_org),
            i32::from(info.y_org),
            i32::from(info.width),
            i32::from(info.height),
        );
        if !screens.contains(&screen) {
            screens.push(screen);
        }
    }
    if screens.is_empty() {
        return fallback;
    }
    screens.sort_by_key(|screen| (screen.y, screen.x));
    screens
}

struct Session {
    wm: WindowManager<X11Display>,
    keyboard: KeyboardMapping,
    cursors: Cursors,
    check_window: Window,
}

/// Connects to the display, takes over window management and runs until
/// the quit command.
pub fn run(config: Config) -> WmResult<()> {
    let (connection, screen_number) = x11rb::connect(None)?;
    let screen = connection.setup().roots[screen_number].clone();
    let root = screen.root;

    let cursors = Cursors::load(&connection, screen_number)?;
    let redirect = connection
        .change_window_attributes(
            root,
            &ChangeWindowAttributesAux::new()
                .cursor(cursors.normal)
                .event_mask(
                    EventMask::SUBSTRUCTURE_REDIRECT
                        | EventMask::SUBSTRUCTURE_NOTIFY
                        | EventMask::BUTTON_PRESS
                        | EventMask::POINTER_MOTION
                        | EventMask::ENTER_WINDOW
                        | EventMask::LEAVE_WINDOW
                        | EventMask::STRUCTURE_NOTIFY
                        | EventMask::PROPERTY_CHANGE,
                ),
        )?
        .check();
    if redirect.is_err() {
        return Err(X11Error::OtherWmRunning.into());
    }

    let atoms = AtomCache::new(&connection)?;
    let check_window = connection.generate_id()?;
    connection.create_window(
        screen.root_depth,
        check_window,
        root,
        0,
        0,
        1,
        1,
        0,
        WindowClass::INPUT_OUTPUT,
        0,
        &CreateWindowAux::new(),
    )?;
    for target in [check_window, root] {
        connection.change_property32(
            PropMode::REPLACE,
            target,
            atoms.net_supporting_wm_check,
            AtomEnum::WINDOW,
            &[check_window],
        )?;
    }
    connection.change_property8(
        PropMode::REPLACE,
        check_window,
        atoms.net_wm_name,
        atoms.utf8_string,
        b"axwm",
    )?;
    connection.change_property32(
        PropMode::REPLACE,
        root,
        atoms.net_supported,
        AtomEnum::ATOM,
        &atoms.supported(),
    )?;
    connection.delete_property(root, atoms.net_client_list)?;

    let keyboard = KeyboardMapping::load(&connection)?;
    let numlock_mask = keymap::numlock_mask(&connection, &keyboard)?;
    let root_width = i32::from(screen.width_in_pixels);
    let root_height = i32::from(screen.height_in_pixels);
    let screens = detect_screens(&connection, root_width, root_height);
    info!(screen = screen_number, monitors = screens.len(), "axwm starting");

    let mut display = X11Display::new(connection, root, atoms, &config);
    display.numlock_mask = numlock_mask;
    let mut wm = WindowManager::with_monitors(config, display, Box::new(ProcFs), screens);
    wm.screen_width = root_width;
    wm.screen_height = root_height;

    let mut session = Session {
        wm,
        keyboard,
        cursors,
        check_window,
    };
    session.grab_keys()?;
    session.scan()?;
    session.wm.focus(None);
    session.wm.arrange(None);
    session.wm.display.connection.flush()?;

    while session.wm.running {
        let event = session.wm.display.next_event()?;
        session.handle_event(event)?;
        session.wm.display.connection.flush()?;
    }

    session.cleanup()
}

impl Session {
    fn connection(&self) -> &RustConnection {
        &self.wm.display.connection
    }

    fn root(&self) -> Window {
        self.wm.display.root
    }

    fn numlock(&self) -> u16 {
        self.wm.display.numlock_mask
    }

    fn grab_keys(&self) -> WmResult<()> {
        keymap::grab_keys(
            self.connection(),
            self.root(),
            &self.wm.config.keybindings,
            &self.keyboard,
            self.numlock(),
        )
    }

    /// Manages windows that existed before we started, transients last.
    fn scan(&mut self) -> WmResult<()> {
        let tree = self.connection().query_tree(self.root())?.reply()?;
        let mut transients = Vec::new();
        for &window in &tree.children {
            if !self.is_manageable(window)? {
                continue;
            }
            if self.wm.display.transient_for(window).is_some() {
                transients.push(window);
            } else {
                self.manage(window)?;
            }
        }
        for window in transients {
            self.manage(window)?;
        }
        Ok(())
    }

    fn is_manageable(&self, window: Window) -> WmResult<bool> {
        let Ok(attributes) = self.connection().get_window_attributes(window)?.reply() else {
            return Ok(false);
        };
        if attributes.override_redirect {
            return Ok(false);
        }
        if attributes.map_state == MapState::VIEWABLE {
            return Ok(true);
        }
        let atoms = &self.wm.display.atoms;
        let state = self
            .connection()
            .get_property(false, window, atoms.wm_state, atoms.wm_state, 0, 2)?
            .reply()
            .ok()
            .and_then(|reply| reply.value32().and_then(|mut values| values.next()));
        Ok(state == Some(ICONIC_STATE))
    }

    fn manage(&mut self, window: Window) -> WmResult<()> {
        let request = match self.wm.display.manage_request(window) {
            Ok(request) => request,
            Err(error) => {
                debug!(window, %error, "window vanished before it was managed");
                return Ok(());
            }
        };
        self.connection().change_window_attributes(
            window,
            &ChangeWindowAttributesAux::new().event_mask(
                EventMask::ENTER_WINDOW
                    | EventMask::FOCUS_CHANGE
                    | EventMask::PROPERTY_CHANGE
                    | EventMask::STRUCTURE_NOTIFY,
            ),
        )?;
        self.wm.manage(request);
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> WmResult<()> {
        let root = self.root();
        match event {
            Event::Error(error) => {
                warn!(?error, "X error");
            }
            Event::MapRequest(event) => {
                let Ok(attributes) = self
                    .connection()
                    .get_window_attributes(event.window)?
                    .reply()
                else {
                    return Ok(());
                };
                if !attributes.override_redirect && !self.wm.clients.contains_key(&event.window) {
                    self.manage(event.window)?;
                }
            }
            Event::UnmapNotify(event) => {
                let synthetic = event.response_type & SEND_EVENT_BIT != 0;
                self.wm.on_unmap(event.window, synthetic);
            }
            Event::DestroyNotify(event) => self.wm.on_destroy(event.window),
            Event::ConfigureRequest(event) => self.configure_request(&event)?,
            Event::ConfigureNotify(event) if event.window == root => {
                let width = i32::from(event.width);
                let height = i32::from(event.height);
                let screens = detect_screens(self.connection(), width, height);
                self.wm.on_root_resize(width, height, &screens);
            }
            Event::PropertyNotify(event) => {
                if event.state == Property::DELETE || event.window == root {
                    return Ok(());
                }
                if self.wm.clients.contains_key(&event.window)
                    && let Some(update) = self.wm.display.property_update(event.window, event.atom)
                {
                    self.wm.on_property_change(event.window, update);
                }
            }
            Event::ClientMessage(event) => self.client_message(&event),
            Event::EnterNotify(event) => {
                let ignored = event.mode != NotifyMode::NORMAL || event.detail == NotifyDetail::INFERIOR;
                if ignored && event.event != root {
                    return Ok(());
                }
                let window = (event.event != root).then_some(event.event);
                self.wm
                    .on_enter(window, i32::from(event.root_x), i32::from(event.root_y));
            }
            Event::FocusIn(event) => self.wm.on_focus_in(event.event),
            Event::MotionNotify(event) => {
                let (x, y) = (i32::from(event.root_x), i32::from(event.root_y));
                if self.wm.is_dragging() {
                    self.wm.drag_motion(x, y, event.time);
                } else if event.event == root {
                    self.wm.on_pointer_motion(x, y);
                }
            }
            Event::ButtonPress(event) => self.button_press(&event)?,
            Event::ButtonRelease(event) => {
                if self.wm.is_dragging() {
                    self.wm
                        .end_drag(i32::from(event.root_x), i32::from(event.root_y));
                    self.connection().ungrab_pointer(x11rb::CURRENT_TIME)?;
                }
            }
            Event::KeyPress(event) => {
                let keysym = self.keyboard.keysym(event.detail);
                let numlock = self.numlock();
                self.wm.on_key_press(keysym, u16::from(event.state), numlock);
            }
            Event::MappingNotify(event) => {
                if event.request == Mapping::KEYBOARD {
                    self.keyboard = KeyboardMapping::load(self.connection())?;
                    let numlock = keymap::numlock_mask(self.connection(), &self.keyboard)?;
                    self.wm.display.numlock_mask = numlock;
                    self.grab_keys()?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn configure_request(&mut self, event: &ConfigureRequestEvent) -> WmResult<()> {
        let mask = u16::from(event.value_mask);
        let has = |flag: ConfigWindow| mask & u16::from(flag) != 0;
        let request = ConfigureRequest {
            x: has(ConfigWindow::X).then_some(i32::from(event.x)),
            y: has(ConfigWindow::Y).then_some(i32::from(event.y)),
            width: has(ConfigWindow::WIDTH).then_some(i32::from(event.width)),
            height: has(ConfigWindow::HEIGHT).then_some(i32::from(event.height)),
            border_width: has(ConfigWindow::BORDER_WIDTH).then_some(i32::from(event.border_width)),
        };
        if self.wm.on_configure_request(event.window, request) {
            return Ok(());
        }

        let mut changes = ConfigureWindowAux::new();
        if let Some(x) = request.x {
            changes = changes.x(x);
        }
        if let Some(y) = request.y {
            changes = changes.y(y);
        }
        if let Some(width) = request.width {
            changes = changes.width(width as u32);
        }
        if let Some(height) = request.height {
            changes = changes.height(height as u32);
        }
        if let Some(border_width) = request.border_width {
            changes = changes.border_width(border_width as u32);
        }
        if has(ConfigWindow::SIBLING) {
            changes = changes.sibling(event.sibling);
        }
        if has(ConfigWindow::STACK_MODE) {
            changes = changes.stack_mode(event.stack_mode);
        }
        self.connection().configure_window(event.window, &changes)?;
        Ok(())
    }

    fn client_message(&mut self, event: &ClientMessageEvent) {
        if !self.wm.clients.contains_key(&event.window) {
            return;
        }
        let atoms = &self.wm.display.atoms;
        let data = event.data.as_data32();
        if event.type_ == atoms.net_wm_state {
            let fullscreen = atoms.net_wm_state_fullscreen;
            if (data[1] == fullscreen || data[2] == fullscreen)
                && let Some(action) = StateAction::from_raw(data[0])
            {
                self.wm.on_fullscreen_request(event.window, action);
            }
        } else if event.type_ == atoms.net_active_window {
            self.wm.on_activate_request(event.window);
        }
    }

    fn button_press(&mut self, event: &ButtonPressEvent) -> WmResult<()> {
        let root = self.root();
        let on_client = event.event != root && self.wm.clients.contains_key(&event.event);
        if on_client {
            self.connection()
                .allow_events(Allow::REPLAY_POINTER, event.time)?;
        }
        let window = on_client.then_some(event.event);
        let numlock = self.numlock();
        self.wm.on_button_press(
            window,
            i32::from(event.root_x),
            i32::from(event.root_y),
            event.detail,
            u16::from(event.state),
            numlock,
        );

        let cursor = match self.wm.drag_kind() {
            None => return Ok(()),
            Some(DragKind::Move { .. } | DragKind::Place { .. }) => self.cursors.moving,
            Some(DragKind::Resize { .. } | DragKind::Fact { .. }) => self.cursors.resizing,
        };
        let grab = self
            .connection()
            .grab_pointer(
                false,
                root,
                EventMask::BUTTON_PRESS | EventMask::BUTTON_RELEASE | EventMask::POINTER_MOTION,
                GrabMode::ASYNC,
                GrabMode::ASYNC,
                x11rb::NONE,
                cursor,
                x11rb::CURRENT_TIME,
            )?
            .reply()?;
        if grab.status != GrabStatus::SUCCESS {
            debug!(status = ?grab.status, "pointer grab refused, dropping drag");
            self.wm.cancel_drag();
        }
        Ok(())
    }

    /// Hands every client back unmanaged and releases our root selection.
    fn cleanup(mut self) -> WmResult<()> {
        info!("axwm shutting down");
        let windows: Vec<Window> = self.wm.clients.keys().copied().collect();
        for window in windows {
            self.wm.unmanage(window, false);
        }
        let root = self.root();
        let connection = self.connection();
        connection.ungrab_key(Grab::ANY, root, ModMask::ANY)?;
        connection.destroy_window(self.check_window)?;
        connection.set_input_focus(InputFocus::POINTER_ROOT, root, x11rb::CURRENT_TIME)?;
        connection.delete_property(root, self.wm.display.atoms.net_active_window)?;
        connection.flush()?;
        Ok(())
    }
}
