mod common;

use axwm::Config;
use axwm::Rule;
use axwm::display::DisplayCall;
use common::{FakeProcesses, Manager, SCREEN, geometry, manager_with, request};

const TERMINAL: u32 = 1;
const CHILD: u32 = 10;

fn with_terminal(config: Config) -> Manager {
    let mut processes = FakeProcesses::default();
    processes.parents.insert(200, 150);
    processes.parents.insert(150, 100);
    let mut wm = manager_with(config, vec![SCREEN], processes);

    let mut terminal = request(TERMINAL, "st");
    terminal.pid = Some(100);
    wm.manage(terminal);
    assert!(wm.clients[&TERMINAL].is_terminal);
    wm
}

fn launch(wm: &mut Manager, class: &str, pid: u32) {
    let mut child = request(CHILD, class);
    child.pid = Some(pid);
    wm.manage(child);
}

#[test]
fn child_takes_the_terminal_slot_and_gives_it_back() {
    let mut wm = with_terminal(Config::default());
    let cell = geometry(&wm, TERMINAL);

    launch(&mut wm, "mpv", 200);
    assert!(!wm.clients.contains_key(&TERMINAL));
    assert_eq!(wm.monitors[0].clients, vec![CHILD]);
    assert_eq!(wm.monitors[0].stack, vec![CHILD]);
    assert_eq!(wm.selected_window(), Some(CHILD));
    assert_eq!(geometry(&wm, CHILD), cell);
    assert_eq!(wm.swallowing_client(TERMINAL), Some(CHILD));
    assert!(wm.clients[&CHILD].ignore_configure_position);
    assert!(
        wm.display
            .calls
            .iter()
            .any(|call| matches!(call, DisplayCall::Move(TERMINAL, x, _) if *x < 0))
    );

    wm.on_unmap(CHILD, false);
    assert!(!wm.clients.contains_key(&CHILD));
    assert_eq!(wm.monitors[0].clients, vec![TERMINAL]);
    assert_eq!(wm.selected_window(), Some(TERMINAL));
    assert_eq!(geometry(&wm, TERMINAL), cell);
    assert_eq!(wm.swallowing_client(TERMINAL), None);
}

#[test]
fn destroyed_terminal_is_not_restored() {
    let mut wm = with_terminal(Config::default());
    launch(&mut wm, "mpv", 200);

    wm.on_destroy(TERMINAL);
    assert!(wm.clients[&CHILD].swallowing.is_none());

    wm.on_unmap(CHILD, false);
    assert!(wm.clients.is_empty());
    assert!(wm.monitors[0].clients.is_empty());
}

#[test]
fn unrelated_processes_are_not_swallowed() {
    let mut wm = with_terminal(Config::default());
    launch(&mut wm, "mpv", 999);

    assert!(wm.clients.contains_key(&TERMINAL));
    assert_eq!(wm.monitors[0].clients.len(), 2);
    assert_eq!(wm.swallowing_client(TERMINAL), None);
}

#[test]
fn no_swallow_rule_keeps_the_terminal() {
    let mut config = Config::default();
    config.rules.push(Rule {
        class: Some("xev".into()),
        no_swallow: true,
        ..Rule::default()
    });
    let mut wm = with_terminal(config);
    launch(&mut wm, "xev", 200);

    assert!(wm.clients.contains_key(&TERMINAL));
    assert!(wm.clients[&TERMINAL].swallowing.is_none());
    assert!(wm.clients[&CHILD].swallowing.is_none());
}

#[test]
fn floating_children_respect_the_switch() {
    let mut config = Config::default();
    config.swallow_floating = false;
    config.rules.push(Rule {
        class: Some("pavucontrol".into()),
        is_floating: true,
        ..Rule::default()
    });
    let mut wm = with_terminal(config);
    launch(&mut wm, "pavucontrol", 200);

    assert!(wm.clients.contains_key(&TERMINAL));
    assert!(wm.clients[&CHILD].is_floating);
}

#[test]
fn a_terminal_never_swallows_another_terminal() {
    let mut wm = with_terminal(Config::default());
    launch(&mut wm, "st", 200);

    assert!(wm.clients.contains_key(&TERMINAL));
    assert!(wm.clients.contains_key(&CHILD));
}
