pub mod handlers;
pub mod keysyms;

pub use handlers::{
    Arg, ButtonBinding, ClickTarget, KeyAction, KeyBinding, MouseAction, find_button_action,
    find_key_action, modifiers_to_mask,
};
