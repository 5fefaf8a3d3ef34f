//! Terminal swallowing.
//!
//! A window launched from a terminal takes over the terminal's slot in the
//! client order and focus stack. The terminal is parked inside the new
//! client and put back when that client goes away.

use crate::client::Client;
use crate::display::DisplayPort;
use crate::geometry::WindowGeometry;
use crate::window_manager::WindowManager;
use std::fs;
use std::process::Command;
use tracing::debug;
use x11rb::protocol::xproto::Window;

/// Upper bound on ancestry hops, guarding against cycles in a racing
/// process table.
const MAX_ANCESTRY_DEPTH: usize = 128;

/// Process-table queries behind swallow detection.
pub trait ProcessTree {
    fn parent_of(&self, pid: u32) -> Option<u32>;
    /// Whether `pid` is a terminal multiplexer server.
    fn is_multiplexer_server(&self, pid: u32) -> bool;
    /// Pid of the multiplexer client attached to the pane running `pane_pid`.
    fn multiplexer_client_of(&self, pane_pid: u32) -> Option<u32>;
}

/// Reads `/proc` and asks tmux for its client list.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcFs;

/// Splits a `/proc/<pid>/stat` line into the command name and parent pid.
fn parse_stat(stat: &str) -> Option<(&str, u32)> {
    let open = stat.find('(')?;
    let close = stat.rfind(')')?;
    let name = stat.get(open + 1..close)?;
    let mut fields = stat.get(close + 1..)?.split_whitespace();
    let _state = fields.next()?;
    let parent = fields.next()?.parse().ok()?;
    Some((name, parent))
}

fn read_stat(pid: u32) -> Option<String> {
    match fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => Some(stat),
        Err(error) => {
            debug!(pid, %error, "process status unavailable");
            None
        }
    }
}

/// Finds the client pid for `pane_pid` in `tmux list-clients` output.
fn parse_tmux_clients(output: &str, pane_pid: u32) -> Option<u32> {
    output.lines().find_map(|line| {
        let mut fields = line.split_whitespace();
        let pane: u32 = fields.next()?.parse().ok()?;
        let client: u32 = fields.next()?.parse().ok()?;
        (pane == pane_pid).then_some(client)
    })
}

impl ProcessTree for ProcFs {
    fn parent_of(&self, pid: u32) -> Option<u32> {
        let stat = read_stat(pid)?;
        parse_stat(&stat).map(|(_, parent)| parent)
    }

    fn is_multiplexer_server(&self, pid: u32) -> bool {
        read_stat(pid)
            .as_deref()
            .and_then(parse_stat)
            .is_some_and(|(name, _)| name == "tmux: server")
    }

    fn multiplexer_client_of(&self, pane_pid: u32) -> Option<u32> {
        let output = Command::new("tmux")
            .args(["list-clients", "-F", "#{pane_pid} #{client_pid}"])
            .output();
        match output {
            Ok(output) if output.status.success() => {
                parse_tmux_clients(&String::from_utf8_lossy(&output.stdout), pane_pid)
            }
            Ok(output) => {
                debug!(status = %output.status, "tmux list-clients failed");
                None
            }
            Err(error) => {
                debug!(%error, "could not run tmux");
                None
            }
        }
    }
}

/// Whether `child` descends from `parent`, hopping from a multiplexer pane
/// to the multiplexer client that displays it.
pub fn is_descendant(tree: &dyn ProcessTree, parent: u32, child: u32) -> bool {
    let mut current = child;
    for _ in 0..MAX_ANCESTRY_DEPTH {
        if current == parent {
            return true;
        }
        if current == 0 {
            return false;
        }
        let Some(up) = tree.parent_of(current) else {
            return false;
        };
        current = if tree.is_multiplexer_server(up) {
            match tree.multiplexer_client_of(current) {
                Some(client) => client,
                None => return false,
            }
        } else {
            up
        };
    }
    false
}

impl<D: DisplayPort> WindowManager<D> {
    /// The terminal that launched `client`, if one is managed and free.
    pub fn term_for_window(&self, client: &Client) -> Option<Window> {
        let pid = client.pid?;
        if client.is_terminal {
            return None;
        }
        self.monitors
            .iter()
            .flat_map(|monitor| monitor.clients.iter())
            .filter_map(|window| self.clients.get(window))
            .find(|candidate| {
                candidate.is_terminal
                    && candidate.swallowing.is_none()
                    && candidate
                        .pid
                        .is_some_and(|term_pid| is_descendant(self.processes.as_ref(), term_pid, pid))
            })
            .map(|terminal| terminal.window)
    }

    /// Replaces `terminal` with `window`, parking the terminal inside it.
    pub fn swallow(&mut self, terminal: Window, window: Window) -> bool {
        let Some(client) = self.clients.get(&window) else {
            return false;
        };
        if client.no_swallow
            || client.is_terminal
            || (client.is_floating && !self.config.swallow_floating)
            || !self.clients.contains_key(&terminal)
        {
            return false;
        }

        debug!(terminal, window, "swallowing terminal");
        self.replace_client(terminal, window);
        let Some(parked) = self.clients.remove(&terminal) else {
            return false;
        };
        if let Some(client) = self.clients.get_mut(&window) {
            client.ignore_configure_position = true;
            client.swallowing = Some(Box::new(parked));
        }
        true
    }

    /// Puts the parked terminal back in place of `window`.
    pub fn unswallow(&mut self, window: Window) {
        let Some(parked) = self
            .clients
            .get_mut(&window)
            .and_then(|client| client.swallowing.take())
        else {
            return;
        };
        let terminal = parked.window;
        debug!(terminal, window, "restoring swallowed terminal");
        self.clients.insert(terminal, *parked);
        self.replace_client(window, terminal);
    }

    /// The client whose parked terminal is `window`.
    pub fn swallowing_client(&self, window: Window) -> Option<Window> {
        self.clients
            .values()
            .find(|client| {
                client
                    .swallowing
                    .as_ref()
                    .is_some_and(|parked| parked.window == window)
            })
            .map(|client| client.window)
    }

    /// Gives `new` the monitor, tags, floating state and list slots of `old`
    /// and moves `old` off screen.
    pub(crate) fn replace_client(&mut self, old: Window, new: Window) {
        let Some(old_client) = self.clients.get(&old) else {
            return;
        };
        let index = old_client.monitor_index;
        let tags = old_client.tags;
        let floating = old_client.is_floating;
        let old_geometry = old_client.geometry;
        let Some(new_client) = self.clients.get_mut(&new) else {
            return;
        };
        new_client.monitor_index = index;
        new_client.tags = tags;
        new_client.is_floating = floating;
        let new_geometry = new_client.geometry;

        let Some(monitor) = self.monitors.get_mut(index) else {
            return;
        };
        for order in [&mut monitor.clients, &mut monitor.stack] {
            if let Some(slot) = order.iter().position(|&window| window == old) {
                order[slot] = new;
            }
        }
        if monitor.selected == Some(old) {
            monitor.selected = Some(new);
        }

        self.display
            .move_window(old, -2 * old_geometry.outer_width(), old_geometry.y);

        if self.is_visible(new) {
            let requested = if floating {
                WindowGeometry {
                    x: old_geometry.x,
                    y: old_geometry.y,
                    ..new_geometry
                }
            } else {
                old_geometry
            };
            self.resize(new, requested, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct Table {
        parents: HashMap<u32, u32>,
        servers: HashSet<u32>,
        panes: HashMap<u32, u32>,
    }

    impl ProcessTree for Table {
        fn parent_of(&self, pid: u32) -> Option<u32> {
            self.parents.get(&pid).copied()
        }

        fn is_multiplexer_server(&self, pid: u32) -> bool {
            self.servers.contains(&pid)
        }

        fn multiplexer_client_of(&self, pane_pid: u32) -> Option<u32> {
            self.panes.get(&pane_pid).copied()
        }
    }

    #[test]
    fn stat_name_may_contain_parentheses() {
        let stat = "4242 (tmux: server) S 1 4242 4242 0 -1";
        assert_eq!(parse_stat(stat), Some(("tmux: server", 1)));
        let odd = "77 (a) b) R 12 77 77";
        assert_eq!(parse_stat(odd), Some(("a) b", 12)));
        assert_eq!(parse_stat("garbage"), None);
    }

    #[test]
    fn tmux_client_lookup() {
        let output = "300 100\n301 101\n";
        assert_eq!(parse_tmux_clients(output, 301), Some(101));
        assert_eq!(parse_tmux_clients(output, 999), None);
    }

    #[test]
    fn walks_up_to_the_terminal() {
        let table = Table {
            parents: HashMap::from([(30, 20), (20, 10), (10, 1), (1, 0)]),
            ..Table::default()
        };
        assert!(is_descendant(&table, 10, 30));
        assert!(is_descendant(&table, 30, 30));
        assert!(!is_descendant(&table, 20, 10));
    }

    #[test]
    fn crosses_a_multiplexer_to_its_client() {
        // terminal 10 runs tmux client 11; the server 50 owns shell 51,
        // which launched 52.
        let table = Table {
            parents: HashMap::from([(52, 51), (51, 50), (50, 1), (11, 10), (10, 1), (1, 0)]),
            servers: HashSet::from([50]),
            panes: HashMap::from([(51, 11)]),
        };
        assert!(is_descendant(&table, 10, 52));

        let detached = Table {
            panes: HashMap::new(),
            ..table
        };
        assert!(!is_descendant(&detached, 10, 52));
    }

    #[test]
    fn unknown_processes_are_not_descendants() {
        assert!(!is_descendant(&Table::default(), 10, 30));
    }
}
