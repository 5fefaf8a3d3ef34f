//! Pointer-driven operations as an explicit state machine.
//!
//! A button binding starts a [`DragSession`]; the event loop feeds it
//! pointer motion through [`WindowManager::drag_motion`] and finishes it
//! with [`WindowManager::end_drag`] on button release.

use crate::attach::{self, AttachPolicy};
use crate::client::{FakeFullscreen, MAX_CFACT, MIN_CFACT};
use crate::display::DisplayPort;
use crate::geometry::{Rect, WindowGeometry, best_overlap};
use crate::keyboard::MouseAction;
use crate::layout::LayoutKind;
use crate::window_manager::WindowManager;
use tracing::debug;
use x11rb::protocol::xproto::Window;

/// Motion events closer together than this many milliseconds are dropped.
const MOTION_INTERVAL_MS: u32 = 1000 / 60;
/// Slack in pixels around a split line that still grabs it.
const SPLIT_TOLERANCE: f32 = 2.0;
const MIN_DRAG_MFACT: f32 = 0.1;
const MAX_DRAG_MFACT: f32 = 0.9;

/// How placement picks the tile under the dragged window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceMode {
    /// The tile under the pointer.
    Cursor,
    /// The tile under the dragged window's center.
    WindowCenter,
    /// Like `WindowCenter`, warping the pointer to the center first.
    WarpToCenter,
}

/// Two neighbours in a layout group whose shared edge is being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactPair {
    pub next: Window,
    pub prev: Window,
    next_fact: f32,
    prev_fact: f32,
    /// Group axis: 2 splits vertically, anything else horizontally.
    axis: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragKind {
    Move {
        origin: (i32, i32),
        pointer: (i32, i32),
    },
    Resize {
        origin: WindowGeometry,
        left: bool,
        top: bool,
    },
    Place {
        mode: PlaceMode,
        origin: (i32, i32),
        size: (i32, i32),
        pointer: (i32, i32),
        free_move: bool,
        position: Option<(i32, i32)>,
        target: Option<(Window, bool)>,
    },
    Fact {
        horizontal: bool,
        mirror: bool,
        on_split: bool,
        master: Option<FactPair>,
        stack: Option<FactPair>,
        press: (i32, i32),
        last: (i32, i32),
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// The dragged client; unused by fact drags.
    pub window: Option<Window>,
    pub monitor: usize,
    pub kind: DragKind,
    last_motion: Option<u32>,
}

impl DragSession {
    fn new(window: Option<Window>, monitor: usize, kind: DragKind) -> Self {
        Self {
            window,
            monitor,
            kind,
            last_motion: None,
        }
    }

    /// Whether a motion event at `time` passes the rate limit.
    fn accept_motion(&mut self, time: u32) -> bool {
        if let Some(last) = self.last_motion
            && time.wrapping_sub(last) <= MOTION_INTERVAL_MS
        {
            return false;
        }
        self.last_motion = Some(time);
        true
    }
}

impl<D: DisplayPort> WindowManager<D> {
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_kind(&self) -> Option<&DragKind> {
        self.drag.as_ref().map(|session| &session.kind)
    }

    /// Drops the active drag without applying it, for a failed pointer grab.
    pub fn cancel_drag(&mut self) {
        if let Some(session) = self.drag.take()
            && let Some(window) = session.window
            && let Some(client) = self.clients.get_mut(&window)
        {
            client.being_moved = false;
        }
    }

    /// Runs a mouse binding; `x` and `y` are root coordinates of the press.
    pub fn run_mouse_action(&mut self, action: MouseAction, x: i32, y: i32) {
        match action {
            MouseAction::MoveOrPlace => self.begin_move_or_place(),
            MouseAction::MoveMouse => self.begin_move(),
            MouseAction::PlaceMouse => self.begin_place(PlaceMode::Cursor),
            MouseAction::ResizeMouse => self.begin_resize(),
            MouseAction::ToggleFloating => self.toggle_floating(),
            MouseAction::DragFact => self.begin_drag_fact(x, y),
        }
    }

    /// Selected client that may be dragged: not in real fullscreen.
    fn draggable_selection(&self) -> Option<Window> {
        let selected = self.selected_window()?;
        let client = self.clients.get(&selected)?;
        (!client.is_fullscreen || client.fake_fullscreen == FakeFullscreen::Fake).then_some(selected)
    }

    /// Moves floating clients freely and re-places tiled ones.
    pub fn begin_move_or_place(&mut self) {
        let floats = self
            .selected_window()
            .and_then(|window| self.clients.get(&window))
            .is_some_and(|client| client.is_floating);
        if !self.current_monitor().arranges() || floats {
            self.begin_move();
        } else {
            self.begin_place(PlaceMode::WindowCenter);
        }
    }

    pub fn begin_move(&mut self) {
        let Some(window) = self.draggable_selection() else {
            return;
        };
        self.restack(self.selected_monitor);
        let Some(pointer) = self.display.query_pointer() else {
            return;
        };
        let geometry = self.clients[&window].geometry;
        self.drag = Some(DragSession::new(
            Some(window),
            self.selected_monitor,
            DragKind::Move {
                origin: (geometry.x, geometry.y),
                pointer,
            },
        ));
    }

    pub fn begin_resize(&mut self) {
        let Some(window) = self.draggable_selection() else {
            return;
        };
        self.restack(self.selected_monitor);
        let Some((pointer_x, pointer_y)) = self.display.query_pointer() else {
            return;
        };
        let origin = self.clients[&window].geometry;
        let border = origin.border_width;
        let left = pointer_x - origin.x - border < origin.width / 2;
        let top = pointer_y - origin.y - border < origin.height / 2;
        self.warp_to_corner(window, left, top);
        self.drag = Some(DragSession::new(
            Some(window),
            self.selected_monitor,
            DragKind::Resize { origin, left, top },
        ));
    }

    fn warp_to_corner(&mut self, window: Window, left: bool, top: bool) {
        let Some(geometry) = self.clients.get(&window).map(|client| client.geometry) else {
            return;
        };
        let border = geometry.border_width;
        let x = if left { -border } else { geometry.width + border - 1 };
        let y = if top { -border } else { geometry.height + border - 1 };
        self.display.warp_pointer(window, x, y);
    }

    /// Starts dragging a tiled client to another slot of the layout.
    pub fn begin_place(&mut self, mode: PlaceMode) {
        let Some(window) = self.selected_window() else {
            return;
        };
        let Some(client) = self.clients.get(&window) else {
            return;
        };
        let arranges = self
            .monitors
            .get(client.monitor_index)
            .is_some_and(|monitor| monitor.arranges());
        if !arranges || client.is_fullscreen {
            return;
        }
        let geometry = client.geometry;
        self.restack(self.selected_monitor);

        let pointer = if mode == PlaceMode::WarpToCenter {
            let (half_width, half_height) = (geometry.outer_width() / 2, geometry.outer_height() / 2);
            self.display.warp_pointer(window, half_width, half_height);
            (
                geometry.x + geometry.border_width + half_width,
                geometry.y + geometry.border_width + half_height,
            )
        } else {
            match self.display.query_pointer() {
                Some(pointer) => pointer,
                None => return,
            }
        };

        if let Some(client) = self.clients.get_mut(&window) {
            client.is_floating = false;
            client.being_moved = true;
        }
        self.drag = Some(DragSession::new(
            Some(window),
            self.selected_monitor,
            DragKind::Place {
                mode,
                origin: (geometry.x, geometry.y),
                size: (geometry.width, geometry.height),
                pointer,
                free_move: false,
                position: None,
                target: None,
            },
        ));
    }

    /// Starts a drag on the root window that resizes the master split or
    /// the boundary between two clients of a group.
    pub fn begin_drag_fact(&mut self, x: i32, y: i32) {
        let index = self.selected_monitor;
        let monitor = &self.monitors[index];
        let tiled = self.tiled_visible_clients(index);
        let count = tiled.len();
        let nmaster = monitor.nmaster;
        let layout = monitor.layout();
        if count == 0
            || !monitor.arranges()
            || layout == LayoutKind::Monocle
            || (nmaster != 0 && count <= nmaster)
            || count == 1
        {
            return;
        }

        let axis = monitor.axis;
        let (horizontal, mirror) = if layout == LayoutKind::Tile {
            (axis.primary.unsigned_abs() == 2, axis.is_mirrored())
        } else {
            (false, false)
        };
        let area = monitor.work_area;
        let gap = monitor.gap;
        if x <= area.x + gap
            || x >= area.right() - gap
            || y <= area.y + gap
            || y >= area.bottom() - gap
        {
            return;
        }

        let fact = if mirror { 1.0 - monitor.mfact } else { monitor.mfact };
        let (position, origin, extent) = if horizontal {
            (y, area.y, area.height)
        } else {
            (x, area.x, area.width)
        };
        let position = position as f32;
        let split = origin as f32 + (extent - gap) as f32 * fact;
        let before_split = position < split - SPLIT_TOLERANCE;
        let after_split = position > split + gap as f32 + SPLIT_TOLERANCE;

        let mut on_split = false;
        let mut master_side = false;
        let mut stack_side = false;
        if !before_split && !after_split {
            on_split = true;
        } else if before_split != mirror {
            master_side = axis.master != 3 && nmaster > 1;
        } else {
            stack_side = axis.stack != 3 && count - nmaster.min(count) > 1;
        }
        if !on_split && !master_side && !stack_side {
            return;
        }

        let primary = axis.primary.unsigned_abs();
        let stack = (stack_side || (on_split && primary != axis.stack && axis.stack != 3))
            .then(|| self.find_fact_pair(&tiled[nmaster.min(count)..], axis.stack, x, y, area, gap))
            .flatten();
        let master = (master_side || (on_split && primary != axis.master && axis.master != 3))
            .then(|| self.find_fact_pair(&tiled[..nmaster.min(count)], axis.master, x, y, area, gap))
            .flatten();

        debug!(on_split, master = master.is_some(), stack = stack.is_some(), "fact drag");
        self.drag = Some(DragSession::new(
            None,
            index,
            DragKind::Fact {
                horizontal,
                mirror,
                on_split,
                master,
                stack,
                press: (x, y),
                last: (x, y),
            },
        ));
    }

    /// Finds the client whose leading edge lies right after the press,
    /// together with the client before it in the group.
    fn find_fact_pair(
        &self,
        group: &[Window],
        axis: u8,
        x: i32,
        y: i32,
        area: Rect,
        gap: i32,
    ) -> Option<FactPair> {
        let mut offset_x = area.x + gap;
        let mut offset_y = area.y + gap;
        let mut prev: Option<Window> = None;
        for &window in group {
            let client = self.clients.get(&window)?;
            let geometry = client.geometry;
            let hit = if axis == 2 {
                y > offset_y && y < geometry.y
            } else {
                x > offset_x && x < geometry.x
            };
            if hit {
                let prev = prev?;
                return Some(FactPair {
                    next: window,
                    prev,
                    next_fact: client.cfact,
                    prev_fact: self.clients.get(&prev)?.cfact,
                    axis,
                });
            }
            offset_x += geometry.width;
            offset_y += geometry.height;
            prev = Some(window);
        }
        None
    }

    /// Feeds pointer motion at root coordinates into the active drag.
    pub fn drag_motion(&mut self, x: i32, y: i32, time: u32) {
        let Some(mut session) = self.drag.take() else {
            return;
        };
        if session.accept_motion(time) {
            match session.kind {
                DragKind::Move { .. } => self.move_motion(&session, x, y),
                DragKind::Resize { .. } => self.resize_motion(&session, x, y),
                DragKind::Place { .. } => self.place_motion(&mut session, x, y),
                DragKind::Fact { .. } => self.fact_motion(&mut session, x, y),
            }
        }
        self.drag = Some(session);
    }

    fn move_motion(&mut self, session: &DragSession, x: i32, y: i32) {
        let DragKind::Move { origin, pointer } = session.kind else {
            return;
        };
        let Some(window) = session.window else {
            return;
        };
        let Some(client) = self.clients.get(&window) else {
            return;
        };
        let geometry = client.geometry;
        let area = self.current_monitor().work_area;
        let snap = self.config.snap;

        let mut nx = origin.0 + (x - pointer.0);
        let mut ny = origin.1 + (y - pointer.1);
        if (area.x - nx).abs() < snap {
            nx = area.x;
        } else if (area.right() - (nx + geometry.outer_width())).abs() < snap {
            nx = area.right() - geometry.outer_width();
        }
        if (area.y - ny).abs() < snap {
            ny = area.y;
        } else if (area.bottom() - (ny + geometry.outer_height())).abs() < snap {
            ny = area.bottom() - geometry.outer_height();
        }

        let arranges = self.current_monitor().arranges();
        if !client.is_floating
            && arranges
            && ((nx - geometry.x).abs() > snap || (ny - geometry.y).abs() > snap)
        {
            self.toggle_floating();
        }
        if !arranges || self.clients.get(&window).is_some_and(|c| c.is_floating) {
            let Some(current) = self.clients.get(&window).map(|c| c.geometry) else {
                return;
            };
            self.resize(window, WindowGeometry { x: nx, y: ny, ..current }, true);
        }
    }

    fn resize_motion(&mut self, session: &DragSession, x: i32, y: i32) {
        let DragKind::Resize { origin, left, top } = session.kind else {
            return;
        };
        let Some(window) = session.window else {
            return;
        };
        let Some(client) = self.clients.get(&window) else {
            return;
        };
        let current = client.geometry;
        let border = current.border_width;
        let nx = if left { x } else { current.x };
        let ny = if top { y } else { current.y };
        let nw = if left {
            origin.x + origin.width - nx
        } else {
            x - origin.x - 2 * border + 1
        }
        .max(1);
        let nh = if top {
            origin.y + origin.height - ny
        } else {
            y - origin.y - 2 * border + 1
        }
        .max(1);

        let selected_area = self.current_monitor().work_area;
        let client_area = self.monitors[client.monitor_index].work_area;
        let fits = client_area.x + nw >= selected_area.x
            && client_area.x + nw <= selected_area.right()
            && client_area.y + nh >= selected_area.y
            && client_area.y + nh <= selected_area.bottom();
        let arranges = self.current_monitor().arranges();
        let snap = self.config.snap;
        if fits
            && !client.is_floating
            && arranges
            && ((nw - current.width).abs() > snap || (nh - current.height).abs() > snap)
        {
            self.toggle_floating();
        }
        if !arranges || self.clients.get(&window).is_some_and(|c| c.is_floating) {
            self.resize(window, WindowGeometry::new(nx, ny, nw, nh, border), true);
        }
    }

    /// Tiled client under a 1x1 point on the selected monitor.
    fn tiled_client_at(&self, x: i32, y: i32) -> Option<Window> {
        let tiled = self.tiled_visible_clients(self.selected_monitor);
        let rects: Vec<Rect> = tiled
            .iter()
            .filter_map(|window| self.clients.get(window))
            .map(|client| client.geometry.rect())
            .collect();
        best_overlap(&Rect::new(x, y, 1, 1), rects.iter()).map(|index| tiled[index])
    }

    fn place_motion(&mut self, session: &mut DragSession, x: i32, y: i32) {
        let Some(window) = session.window else {
            return;
        };
        let DragKind::Place {
            mode,
            origin,
            size,
            pointer,
            ref mut free_move,
            ref mut position,
            ref mut target,
        } = session.kind
        else {
            return;
        };

        let nx = origin.0 + (x - pointer.0);
        let ny = origin.1 + (y - pointer.1);
        let snap = self.config.snap;
        if !*free_move && ((nx - origin.0).abs() > snap || (ny - origin.1).abs() > snap) {
            *free_move = true;
        }
        if *free_move {
            self.display.move_window(window, nx, ny);
        }
        *position = Some((nx, ny));

        self.selected_monitor = self.monitor_at_point(x, y);
        let (point_x, point_y) = match mode {
            PlaceMode::Cursor => (x, y),
            PlaceMode::WindowCenter | PlaceMode::WarpToCenter => {
                (nx + size.0 / 2, ny + size.1 / 2)
            }
        };
        let Some(over) = self.tiled_client_at(point_x, point_y) else {
            return;
        };
        if over == window {
            return;
        }
        let Some(anchor) = self.clients.get(&over) else {
            return;
        };
        let r = anchor.geometry;
        let vertical_ratio = (r.y + r.height - point_y) as f32 / r.height as f32;
        let horizontal_ratio = (r.x + r.width - point_x) as f32 / r.width as f32;
        let above = if vertical_ratio > horizontal_ratio {
            (r.y - point_y).abs() < r.height / 2
        } else {
            (r.x - point_x).abs() < r.width / 2
        };
        if *target == Some((over, above)) {
            return;
        }

        let target_monitor = anchor.monitor_index;
        self.detach_stack(window);
        self.detach(window);
        let Some(source_monitor) = self.client_monitor(window) else {
            return;
        };
        if source_monitor != target_monitor {
            self.arrange_monitor(source_monitor);
            let tags = self.monitors[target_monitor].tags();
            if let Some(client) = self.clients.get_mut(&window) {
                client.tags = tags;
            }
        }
        if let Some(client) = self.clients.get_mut(&window) {
            client.monitor_index = target_monitor;
        }
        session.monitor = target_monitor;
        let monitor = &mut self.monitors[target_monitor];
        monitor.selected = Some(over);
        let slot = monitor
            .clients
            .iter()
            .position(|&other| other == over)
            .map_or(0, |slot| if above { slot } else { slot + 1 });
        monitor.clients.insert(slot, window);
        attach::attach_stack(&mut monitor.stack, window);
        self.arrange_monitor(target_monitor);
        *target = Some((over, above));
    }

    fn fact_motion(&mut self, session: &mut DragSession, x: i32, y: i32) {
        let index = session.monitor;
        let DragKind::Fact {
            horizontal,
            mirror,
            on_split,
            master,
            stack,
            press,
            ref mut last,
        } = session.kind
        else {
            return;
        };
        let diff_x = x - last.0;
        let diff_y = y - last.1;

        if on_split && let Some(monitor) = self.monitors.get_mut(index) {
            let (diff, extent) = if horizontal {
                (diff_y, monitor.work_area.height)
            } else {
                (diff_x, monitor.work_area.width)
            };
            let fact = diff as f32 / (extent - 3 * monitor.gap) as f32;
            let applied = if mirror { -fact } else { fact };
            let mfact = monitor.mfact + applied;
            if applied != 0.0 && mfact > MIN_DRAG_MFACT && mfact < MAX_DRAG_MFACT {
                monitor.mfact = mfact;
                monitor.commit_layout();
            }
        }
        for pair in [stack, master].into_iter().flatten() {
            let (diff, position, pressed) = if pair.axis == 2 {
                (diff_y, y, press.1)
            } else {
                (diff_x, x, press.0)
            };
            self.shift_fact(pair, diff, position, pressed);
        }

        self.arrange_monitor(index);
        *last = (x, y);
    }

    /// Moves weight between the two clients of `pair` in proportion to the
    /// pointer travel along the group axis.
    fn shift_fact(&mut self, pair: FactPair, diff: i32, position: i32, pressed: i32) {
        let extent = |geometry: WindowGeometry| {
            if pair.axis == 2 {
                geometry.height
            } else {
                geometry.width
            }
        };
        let (Some(next), Some(prev)) = (self.clients.get(&pair.next), self.clients.get(&pair.prev))
        else {
            return;
        };
        let next_extent = extent(next.geometry);
        let prev_extent = extent(prev.geometry);
        let total = next_extent + prev_extent;
        if total == 0 {
            return;
        }
        let fact = diff as f32 * (pair.next_fact + pair.prev_fact) / total as f32;
        let next_fact = next.cfact - fact;
        let prev_fact = prev.cfact + fact;
        let in_range = |cfact: f32| cfact > MIN_CFACT && cfact <= MAX_CFACT;
        if in_range(next_fact)
            && in_range(prev_fact)
            && position - pressed <= next_extent
            && pressed - position <= prev_extent
        {
            if let Some(next) = self.clients.get_mut(&pair.next) {
                next.cfact = next_fact;
            }
            if let Some(prev) = self.clients.get_mut(&pair.prev) {
                prev.cfact = prev_fact;
            }
        }
    }

    /// Finishes the active drag at root coordinates `x`, `y`.
    pub fn end_drag(&mut self, x: i32, y: i32) {
        let Some(session) = self.drag.take() else {
            return;
        };
        match session.kind {
            DragKind::Move { .. } => self.finish_move(session.window),
            DragKind::Resize { left, top, .. } => {
                if let Some(window) = session.window {
                    self.warp_to_corner(window, left, top);
                }
                self.display.discard_enter_events();
                self.finish_move(session.window);
            }
            DragKind::Place { position, .. } => self.finish_place(session.window, position, x, y),
            DragKind::Fact { .. } => self.display.discard_enter_events(),
        }
    }

    /// Hands a moved or resized client to the monitor it now overlaps most.
    fn finish_move(&mut self, window: Option<Window>) {
        let Some(window) = window else {
            return;
        };
        let Some(rect) = self.clients.get(&window).map(|c| c.geometry.rect()) else {
            return;
        };
        let target = self.monitor_for_rect(&rect);
        if target != self.selected_monitor {
            self.send_to_monitor(window, target);
            self.selected_monitor = target;
            self.focus(None);
        }
    }

    fn finish_place(&mut self, window: Option<Window>, position: Option<(i32, i32)>, x: i32, y: i32) {
        let Some(window) = window else {
            return;
        };
        let Some(source) = self.client_monitor(window) else {
            return;
        };
        let target = self.monitor_at_point(x, y);
        if target != source {
            self.detach(window);
            self.detach_stack(window);
            self.arrange_monitor(source);
            let tags = self.monitors[target].tags();
            if let Some(client) = self.clients.get_mut(&window) {
                client.monitor_index = target;
                client.tags = tags;
            }
            self.attach_with(AttachPolicy::Top, window);
            self.attach_stack(window);
            self.selected_monitor = target;
        }

        self.focus(Some(window));
        let Some(client) = self.clients.get_mut(&window) else {
            return;
        };
        client.being_moved = false;
        let current = client.geometry;
        if let Some((nx, ny)) = position {
            self.resize(window, WindowGeometry { x: nx, y: ny, ..current }, false);
        }
        if let Some(index) = self.client_monitor(window) {
            self.arrange_monitor(index);
        }
    }
}
