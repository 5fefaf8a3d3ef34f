//! Keycode/keysym translation and key grabs.

use crate::errors::WmResult;
use crate::keyboard::KeyBinding;
use crate::keyboard::keysyms::Keysym;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{ConnectionExt, Grab, GrabMode, Keycode, ModMask, Window};
use x11rb::rust_connection::RustConnection;

const XK_NUM_LOCK: Keysym = 0xff7f;

pub struct KeyboardMapping {
    min_keycode: Keycode,
    keysyms_per_keycode: usize,
    keysyms: Vec<Keysym>,
}

impl KeyboardMapping {
    pub fn load(connection: &RustConnection) -> WmResult<Self> {
        let setup = connection.setup();
        let min_keycode = setup.min_keycode;
        let count = setup.max_keycode - min_keycode + 1;
        let reply = connection.get_keyboard_mapping(min_keycode, count)?.reply()?;
        Ok(Self::from_table(
            min_keycode,
            usize::from(reply.keysyms_per_keycode),
            reply.keysyms,
        ))
    }

    pub fn from_table(min_keycode: Keycode, keysyms_per_keycode: usize, keysyms: Vec<Keysym>) -> Self {
        Self {
            min_keycode,
            keysyms_per_keycode,
            keysyms,
        }
    }

    /// Unshifted keysym of `keycode`, or 0 when unmapped.
    pub fn keysym(&self, keycode: Keycode) -> Keysym {
        let Some(offset) = keycode.checked_sub(self.min_keycode) else {
            return 0;
        };
        self.keysyms
            .get(usize::from(offset) * self.keysyms_per_keycode)
            .copied()
            .unwrap_or(0)
    }

    /// Every keycode producing `keysym` in any column.
    pub fn keycodes(&self, keysym: Keysym) -> Vec<Keycode> {
        if self.keysyms_per_keycode == 0 {
            return Vec::new();
        }
        self.keysyms
            .chunks(self.keysyms_per_keycode)
            .enumerate()
            .filter(|(_, column)| column.contains(&keysym))
            .filter_map(|(index, _)| Keycode::try_from(index + usize::from(self.min_keycode)).ok())
            .collect()
    }
}

/// Modifier bit the Num Lock key is bound to, or 0.
pub fn numlock_mask(connection: &RustConnection, mapping: &KeyboardMapping) -> WmResult<u16> {
    let reply = connection.get_modifier_mapping()?.reply()?;
    let per_modifier = usize::from(reply.keycodes_per_modifier());
    if per_modifier == 0 {
        return Ok(0);
    }
    let numlock = mapping.keycodes(XK_NUM_LOCK);
    let mask = reply
        .keycodes
        .chunks(per_modifier)
        .position(|codes| codes.iter().any(|code| numlock.contains(code)))
        .map_or(0, |modifier| 1 << modifier);
    Ok(mask)
}

/// Lock-modifier combinations every grab is repeated with.
pub fn lock_variants(numlock: u16) -> [u16; 4] {
    let lock = u16::from(ModMask::LOCK);
    [0, lock, numlock, numlock | lock]
}

pub fn grab_keys(
    connection: &RustConnection,
    root: Window,
    bindings: &[KeyBinding],
    mapping: &KeyboardMapping,
    numlock: u16,
) -> WmResult<()> {
    connection.ungrab_key(Grab::ANY, root, ModMask::ANY)?;
    for binding in bindings {
        let modifiers = binding.modifier_mask();
        for keycode in mapping.keycodes(binding.keysym) {
            for variant in lock_variants(numlock) {
                connection.grab_key(
                    true,
                    root,
                    ModMask::from(modifiers | variant),
                    keycode,
                    GrabMode::ASYNC,
                    GrabMode::ASYNC,
                )?;
            }
        }
    }
    Ok(())
}
