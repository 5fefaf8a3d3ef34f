use super::keysyms::Keysym;
use serde::Deserialize;
use x11rb::protocol::xproto::KeyButMask;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum KeyAction {
    KillClient,
    FocusStack,
    FocusDirection,
    FocusMonitor,
    TagMonitor,
    SwitchColumn,
    PlaceDirection,
    InplaceRotate,
    Quit,
    ViewTag,
    ToggleView,
    MoveToTag,
    ToggleTag,
    ToggleFloating,
    ToggleFullScreen,
    ToggleFakeFullScreen,
    ToggleBar,
    ToggleExtraBar,
    ToggleBars,
    ShiftViewClients,
    SwitchTag,
    FloatPos,
    SetLayout,
    CycleLayout,
    SetMasterFactor,
    SetClientFactor,
    IncNumMaster,
    RotateLayoutAxis,
    MirrorLayout,
    SetGaps,
    Zoom,
    Transfer,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    None,
    Int(i32),
    Float(f32),
    Str(String),
}

impl Arg {
    pub fn as_int(&self) -> i32 {
        match self {
            Arg::Int(value) => *value,
            Arg::Float(value) => *value as i32,
            _ => 0,
        }
    }

    pub fn as_float(&self) -> f32 {
        match self {
            Arg::Float(value) => *value,
            Arg::Int(value) => *value as f32,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyBinding {
    pub modifiers: Vec<KeyButMask>,
    pub keysym: Keysym,
    pub action: KeyAction,
    pub arg: Arg,
}

impl KeyBinding {
    pub fn new(modifiers: Vec<KeyButMask>, keysym: Keysym, action: KeyAction, arg: Arg) -> Self {
        Self {
            modifiers,
            keysym,
            action,
            arg,
        }
    }

    pub fn modifier_mask(&self) -> u16 {
        modifiers_to_mask(&self.modifiers)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum ClickTarget {
    ClientWindow,
    RootWindow,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum MouseAction {
    /// Moves floating clients, re-places tiled ones.
    MoveOrPlace,
    MoveMouse,
    PlaceMouse,
    ResizeMouse,
    ToggleFloating,
    DragFact,
}

#[derive(Debug, Clone)]
pub struct ButtonBinding {
    pub click: ClickTarget,
    pub modifiers: Vec<KeyButMask>,
    pub button: u8,
    pub action: MouseAction,
}

impl ButtonBinding {
    pub fn new(
        click: ClickTarget,
        modifiers: Vec<KeyButMask>,
        button: u8,
        action: MouseAction,
    ) -> Self {
        Self {
            click,
            modifiers,
            button,
            action,
        }
    }

    pub fn modifier_mask(&self) -> u16 {
        modifiers_to_mask(&self.modifiers)
    }
}

pub fn modifiers_to_mask(modifiers: &[KeyButMask]) -> u16 {
    modifiers
        .iter()
        .fold(0u16, |acc, &modifier| acc | u16::from(modifier))
}

/// Strips lock modifiers and pointer button state from an event mask.
pub fn clean_mask(state: u16, numlock_mask: u16) -> u16 {
    let relevant = u16::from(
        KeyButMask::SHIFT
            | KeyButMask::CONTROL
            | KeyButMask::MOD1
            | KeyButMask::MOD2
            | KeyButMask::MOD3
            | KeyButMask::MOD4
            | KeyButMask::MOD5,
    );
    state & !(numlock_mask | u16::from(KeyButMask::LOCK)) & relevant
}

pub fn find_key_action<'a>(
    keysym: Keysym,
    state: u16,
    numlock_mask: u16,
    keybindings: &'a [KeyBinding],
) -> Option<&'a KeyBinding> {
    let state = clean_mask(state, numlock_mask);
    keybindings.iter().find(|binding| {
        binding.keysym == keysym && clean_mask(binding.modifier_mask(), numlock_mask) == state
    })
}

pub fn find_button_action<'a>(
    click: ClickTarget,
    button: u8,
    state: u16,
    numlock_mask: u16,
    buttons: &'a [ButtonBinding],
) -> Option<&'a ButtonBinding> {
    let state = clean_mask(state, numlock_mask);
    buttons.iter().find(|binding| {
        binding.click == click
            && binding.button == button
            && clean_mask(binding.modifier_mask(), numlock_mask) == state
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::keysyms;

    #[test]
    fn lock_modifiers_do_not_affect_matching() {
        let bindings = vec![KeyBinding::new(
            vec![KeyButMask::MOD4, KeyButMask::SHIFT],
            keysyms::from_char('j'),
            KeyAction::PlaceDirection,
            Arg::Int(3),
        )];
        let numlock = u16::from(KeyButMask::MOD2);
        let state = u16::from(KeyButMask::MOD4 | KeyButMask::SHIFT | KeyButMask::LOCK | KeyButMask::MOD2);

        let found = find_key_action(keysyms::from_char('j'), state, numlock, &bindings).unwrap();
        assert_eq!(found.action, KeyAction::PlaceDirection);
        assert!(find_key_action(keysyms::from_char('j'), u16::from(KeyButMask::MOD4), numlock, &bindings).is_none());
    }

    #[test]
    fn button_matching_ignores_pointer_state() {
        let buttons = vec![ButtonBinding::new(
            ClickTarget::ClientWindow,
            vec![KeyButMask::MOD4],
            1,
            MouseAction::MoveOrPlace,
        )];
        let state = u16::from(KeyButMask::MOD4 | KeyButMask::BUTTON1);
        let found = find_button_action(ClickTarget::ClientWindow, 1, state, 0, &buttons).unwrap();
        assert_eq!(found.action, MouseAction::MoveOrPlace);
        assert!(find_button_action(ClickTarget::RootWindow, 1, state, 0, &buttons).is_none());
    }

    #[test]
    fn arg_conversions() {
        assert_eq!(Arg::Int(-2).as_int(), -2);
        assert_eq!(Arg::Int(1).as_float(), 1.0);
        assert_eq!(Arg::Float(0.05).as_float(), 0.05);
        assert_eq!(Arg::None.as_int(), 0);
    }
}
