pub type Keysym = u32;

pub const XK_ESCAPE: Keysym = 0xff1b;
pub const XK_RETURN: Keysym = 0xff0d;
pub const XK_SPACE: Keysym = 0x0020;
pub const XK_TAB: Keysym = 0xff09;
pub const XK_LEFT: Keysym = 0xff51;
pub const XK_UP: Keysym = 0xff52;
pub const XK_RIGHT: Keysym = 0xff53;
pub const XK_DOWN: Keysym = 0xff54;
pub const XK_MINUS: Keysym = 0x002d;
pub const XK_PLUS: Keysym = 0x002b;
pub const XK_EQUAL: Keysym = 0x003d;
pub const XK_COMMA: Keysym = 0x002c;
pub const XK_PERIOD: Keysym = 0x002e;
pub const XK_0: Keysym = 0x0030;
pub const XK_F1: Keysym = 0xffbe;

/// Keysym for a lowercase letter or a digit.
pub const fn from_char(c: char) -> Keysym {
    c as Keysym
}

/// Resolves a configuration key name such as `"j"`, `"5"`, `"Return"` or
/// `"F3"`.
pub fn keysym_from_name(name: &str) -> Option<Keysym> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            return Some(from_char(c));
        }
    }

    if let Some(number) = name.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
        if (1..=12).contains(&number) {
            return Some(XK_F1 + number - 1);
        }
    }

    let keysym = match name {
        "Return" => XK_RETURN,
        "Escape" => XK_ESCAPE,
        "space" | "Space" => XK_SPACE,
        "Tab" => XK_TAB,
        "Left" => XK_LEFT,
        "Up" => XK_UP,
        "Right" => XK_RIGHT,
        "Down" => XK_DOWN,
        "minus" | "-" => XK_MINUS,
        "plus" | "+" => XK_PLUS,
        "equal" | "=" => XK_EQUAL,
        "comma" | "," => XK_COMMA,
        "period" | "." => XK_PERIOD,
        _ => return None,
    };
    Some(keysym)
}
