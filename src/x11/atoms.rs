use crate::errors::WmResult;
use x11rb::protocol::xproto::{Atom, AtomEnum, ConnectionExt};
use x11rb::rust_connection::RustConnection;

pub struct AtomCache {
    pub utf8_string: Atom,
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub wm_take_focus: Atom,
    pub wm_state: Atom,
    pub wm_name: Atom,
    pub net_supported: Atom,
    pub net_supporting_wm_check: Atom,
    pub net_wm_name: Atom,
    pub net_wm_state: Atom,
    pub net_wm_state_fullscreen: Atom,
    pub net_wm_window_type: Atom,
    pub net_wm_window_type_dialog: Atom,
    pub net_wm_pid: Atom,
    pub net_active_window: Atom,
    pub net_client_list: Atom,
}

fn intern(connection: &RustConnection, name: &[u8]) -> WmResult<Atom> {
    Ok(connection.intern_atom(false, name)?.reply()?.atom)
}

impl AtomCache {
    pub fn new(connection: &RustConnection) -> WmResult<Self> {
        Ok(Self {
            utf8_string: intern(connection, b"UTF8_STRING")?,
            wm_protocols: intern(connection, b"WM_PROTOCOLS")?,
            wm_delete_window: intern(connection, b"WM_DELETE_WINDOW")?,
            wm_take_focus: intern(connection, b"WM_TAKE_FOCUS")?,
            wm_state: intern(connection, b"WM_STATE")?,
            wm_name: AtomEnum::WM_NAME.into(),
            net_supported: intern(connection, b"_NET_SUPPORTED")?,
            net_supporting_wm_check: intern(connection, b"_NET_SUPPORTING_WM_CHECK")?,
            net_wm_name: intern(connection, b"_NET_WM_NAME")?,
            net_wm_state: intern(connection, b"_NET_WM_STATE")?,
            net_wm_state_fullscreen: intern(connection, b"_NET_WM_STATE_FULLSCREEN")?,
            net_wm_window_type: intern(connection, b"_NET_WM_WINDOW_TYPE")?,
            net_wm_window_type_dialog: intern(connection, b"_NET_WM_WINDOW_TYPE_DIALOG")?,
            net_wm_pid: intern(connection, b"_NET_WM_PID")?,
            net_active_window: intern(connection, b"_NET_ACTIVE_WINDOW")?,
            net_client_list: intern(connection, b"_NET_CLIENT_LIST")?,
        })
    }

    /// The EWMH atoms advertised in `_NET_SUPPORTED`.
    pub fn supported(&self) -> [Atom; 10] {
        [
            self.net_supported,
            self.net_supporting_wm_check,
            self.net_wm_name,
            self.net_wm_state,
            self.net_wm_state_fullscreen,
            self.net_wm_window_type,
            self.net_wm_window_type_dialog,
            self.net_wm_pid,
            self.net_active_window,
            self.net_client_list,
        ]
    }
}
