#![allow(dead_code)]

use axwm::Config;
use axwm::display::HeadlessDisplay;
use axwm::geometry::{Rect, WindowGeometry};
use axwm::manage::ManageRequest;
use axwm::swallow::ProcessTree;
use axwm::window_manager::WindowManager;
use std::collections::HashMap;
use x11rb::protocol::xproto::Window;

pub const SCREEN: Rect = Rect::new(0, 0, 1280, 800);

/// Process table with explicit parent links and no multiplexers.
#[derive(Default)]
pub struct FakeProcesses {
    pub parents: HashMap<u32, u32>,
}

impl ProcessTree for FakeProcesses {
    fn parent_of(&self, pid: u32) -> Option<u32> {
        self.parents.get(&pid).copied()
    }

    fn is_multiplexer_server(&self, _pid: u32) -> bool {
        false
    }

    fn multiplexer_client_of(&self, _pane_pid: u32) -> Option<u32> {
        None
    }
}

pub type Manager = WindowManager<HeadlessDisplay>;

pub fn manager(config: Config) -> Manager {
    manager_with(config, vec![SCREEN], FakeProcesses::default())
}

pub fn manager_with(config: Config, screens: Vec<Rect>, processes: FakeProcesses) -> Manager {
    let mut wm = WindowManager::with_monitors(config, HeadlessDisplay::new(), Box::new(processes), screens);
    wm.display.pointer = Some((10, 10));
    wm
}

pub fn request(window: Window, class: &str) -> ManageRequest {
    let mut request = ManageRequest::new(window, WindowGeometry::new(100, 100, 300, 200, 0));
    request.class = class.to_string();
    request.instance = class.to_lowercase();
    request.name = format!("{class} {window}");
    request
}

pub fn map(wm: &mut Manager, window: Window) {
    wm.manage(request(window, "xterm"));
}

pub fn geometry(wm: &Manager, window: Window) -> WindowGeometry {
    wm.clients[&window].geometry
}
