//! RON configuration loading.
//!
//! The file is a single `Config(...)` record. Every field is optional and
//! falls back to [`Config::default`]. Lines of the form
//! `#DEFINE $name = value` are substituted textually before parsing.

use crate::Rule;
use crate::attach::AttachPolicy;
use crate::commands::tag_grid;
use crate::errors::ConfigError;
use crate::floatpos::FloatPos;
use crate::keyboard::keysyms::{self, Keysym};
use crate::keyboard::{Arg, ButtonBinding, ClickTarget, KeyAction, KeyBinding, MouseAction};
use crate::layout::{AxisConfig, LayoutKind};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use x11rb::protocol::xproto::KeyButMask;

/// The template written by `--init`.
pub const TEMPLATE: &str = include_str!("../../templates/config.ron");

#[derive(Debug, Clone, Copy, Deserialize)]
pub enum ModKey {
    Mod,
    Mod1,
    Mod2,
    Mod3,
    Mod4,
    Mod5,
    Shift,
    Control,
}

impl ModKey {
    fn to_keybut_mask(self, modkey: KeyButMask) -> KeyButMask {
        match self {
            ModKey::Mod => modkey,
            ModKey::Mod1 => KeyButMask::MOD1,
            ModKey::Mod2 => KeyButMask::MOD2,
            ModKey::Mod3 => KeyButMask::MOD3,
            ModKey::Mod4 => KeyButMask::MOD4,
            ModKey::Mod5 => KeyButMask::MOD5,
            ModKey::Shift => KeyButMask::SHIFT,
            ModKey::Control => KeyButMask::CONTROL,
        }
    }
}

/// Default location, `$XDG_CONFIG_HOME/axwm/config.ron`.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("axwm").join("config.ron"))
}

/// Reads and parses `path`, or returns the defaults when it does not exist.
pub fn load(path: &Path) -> Result<crate::Config, crate::errors::WmError> {
    if !path.exists() {
        info!(path = %path.display(), "no config file, using defaults");
        return Ok(crate::Config::default());
    }
    let input = std::fs::read_to_string(path)?;
    let config = parse_config(&input)?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

fn preprocess_variables(input: &str) -> Result<String, ConfigError> {
    let mut variables: HashMap<String, String> = HashMap::new();
    let mut result = String::new();

    for line in input.lines() {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("#DEFINE") {
            let Some((name, value)) = rest.split_once('=') else {
                return Err(ConfigError::InvalidDefine(trimmed.to_string()));
            };
            let name = name.trim();
            if !name.starts_with('$') || name.len() < 2 {
                return Err(ConfigError::InvalidVariableName(name.to_string()));
            }
            let value = value.trim().trim_end_matches(',');
            variables.insert(name.to_string(), value.to_string());
            result.push('\n');
        } else {
            let mut processed_line = line.to_string();
            // longest names first so `$gap` cannot eat into `$gap_big`
            let mut names: Vec<&String> = variables.keys().collect();
            names.sort_by_key(|name| std::cmp::Reverse(name.len()));
            for name in names {
                processed_line = processed_line.replace(name.as_str(), &variables[name]);
            }
            result.push_str(&processed_line);
            result.push('\n');
        }
    }

    for line in result.lines() {
        if let Some(start) = line.find('$') {
            let rest = &line[start..];
            let end = rest[1..]
                .find(|c: char| !c.is_alphanumeric() && c != '_')
                .map_or(rest.len(), |offset| offset + 1);
            return Err(ConfigError::UndefinedVariable(rest[..end].to_string()));
        }
    }
    Ok(result)
}

pub fn parse_config(input: &str) -> Result<crate::Config, ConfigError> {
    let preprocessed = preprocess_variables(input)?;
    let config_data: ConfigData = ron::from_str(&preprocessed)?;
    config_data_to_config(config_data)
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConfigData {
    border_width: i32,
    border_focused: u32,
    border_unfocused: u32,
    border_floating: u32,
    border_seamless: u32,

    gap: i32,
    tile_switch: i32,
    border_switch: bool,

    show_bar: bool,
    show_extra_bar: bool,
    top_bar: bool,
    bar_height: i32,
    bar_gap: bool,

    mfact: f32,
    nmaster: usize,
    layouts: Vec<LayoutKind>,
    layout_axis: (i8, u8, u8),
    attach: AttachPolicy,

    snap: i32,
    resize_hints: bool,
    lock_fullscreen: bool,
    swallow_floating: bool,

    tags: Vec<String>,
    tag_rows: usize,
    rules: Vec<Rule>,
    float_pos_grid: (i32, i32),

    modkey: ModKey,
    /// Replaces the default key table when present.
    keybindings: Option<Vec<KeybindingData>>,
    buttons: Option<Vec<ButtonData>>,
}

impl Default for ConfigData {
    fn default() -> Self {
        let defaults = crate::Config::default();
        Self {
            border_width: defaults.border_width,
            border_focused: defaults.border_focused,
            border_unfocused: defaults.border_unfocused,
            border_floating: defaults.border_floating,
            border_seamless: defaults.border_seamless,
            gap: defaults.gap,
            tile_switch: defaults.tile_switch,
            border_switch: defaults.border_switch,
            show_bar: defaults.show_bar,
            show_extra_bar: defaults.show_extra_bar,
            top_bar: defaults.top_bar,
            bar_height: defaults.bar_height,
            bar_gap: defaults.bar_gap,
            mfact: defaults.mfact,
            nmaster: defaults.nmaster,
            layouts: defaults.layouts,
            layout_axis: (
                defaults.layout_axis.primary,
                defaults.layout_axis.master,
                defaults.layout_axis.stack,
            ),
            attach: defaults.attach,
            snap: defaults.snap,
            resize_hints: defaults.resize_hints,
            lock_fullscreen: defaults.lock_fullscreen,
            swallow_floating: defaults.swallow_floating,
            tags: defaults.tags,
            tag_rows: defaults.tag_rows,
            rules: defaults.rules,
            float_pos_grid: defaults.float_pos_grid,
            modkey: ModKey::Mod4,
            keybindings: None,
            buttons: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct KeybindingData {
    #[serde(default)]
    modifiers: Vec<ModKey>,
    key: String,
    action: KeyAction,
    #[serde(default)]
    arg: ArgData,
}

#[derive(Debug, Deserialize)]
struct ButtonData {
    click: ClickTarget,
    #[serde(default)]
    modifiers: Vec<ModKey>,
    button: u8,
    action: MouseAction,
}

#[derive(Debug, Default, Deserialize)]
#[serde(untagged)]
enum ArgData {
    #[default]
    None,
    Int(i32),
    Float(f32),
    String(String),
}

fn resolve_modifiers(modifiers: &[ModKey], modkey: KeyButMask) -> Vec<KeyButMask> {
    modifiers
        .iter()
        .map(|modifier| modifier.to_keybut_mask(modkey))
        .collect()
}

fn resolve_key(name: &str) -> Result<Keysym, ConfigError> {
    keysyms::keysym_from_name(name).ok_or_else(|| ConfigError::UnknownKey(name.to_string()))
}

fn arg_data_to_arg(data: ArgData) -> Arg {
    match data {
        ArgData::None => Arg::None,
        ArgData::Int(n) => Arg::Int(n),
        ArgData::Float(f) => Arg::Float(f),
        ArgData::String(s) => Arg::Str(s),
    }
}

fn validate(data: &ConfigData) -> Result<(), ConfigError> {
    if data.tags.is_empty() || data.tags.len() > 31 {
        return Err(ConfigError::ValidationError(format!(
            "between 1 and 31 tags are supported, got {}",
            data.tags.len()
        )));
    }
    if !(0.05..=0.95).contains(&data.mfact) {
        return Err(ConfigError::ValidationError(format!(
            "mfact must lie in 0.05..=0.95, got {}",
            data.mfact
        )));
    }
    if data.layouts.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one layout is required".to_string(),
        ));
    }
    if data.border_width < 0 || data.gap < 0 || data.bar_height < 1 {
        return Err(ConfigError::ValidationError(
            "border_width and gap must be non-negative and bar_height positive".to_string(),
        ));
    }
    if data.tag_rows == 0 {
        return Err(ConfigError::ValidationError(
            "tag_rows must be at least 1".to_string(),
        ));
    }
    let (columns, rows) = data.float_pos_grid;
    if columns < 2 || rows < 2 {
        return Err(ConfigError::ValidationError(format!(
            "float_pos_grid needs at least 2 cells per axis, got ({columns}, {rows})"
        )));
    }
    for rule in &data.rules {
        if rule.float_border.is_some_and(|border| border < 0) {
            return Err(ConfigError::ValidationError(
                "rule float_border must be non-negative".to_string(),
            ));
        }
        if let Some(position) = &rule.float_pos {
            position.parse::<FloatPos>()?;
        }
    }
    Ok(())
}

/// Rejects key arguments the action could never use.
fn validate_key_arg(action: KeyAction, arg: &Arg) -> Result<(), ConfigError> {
    match (action, arg) {
        (KeyAction::SetLayout, Arg::Str(name)) => {
            LayoutKind::from_str(name).map_err(|_| ConfigError::UnknownLayout(name.clone()))?;
        }
        (KeyAction::FloatPos, Arg::Str(position)) => {
            position.parse::<FloatPos>()?;
        }
        (KeyAction::FloatPos, _) => {
            return Err(ConfigError::InvalidFloatPos(String::new()));
        }
        (KeyAction::SwitchTag, Arg::Str(words)) if tag_grid::parse(words).is_none() => {
            return Err(ConfigError::InvalidTagMove(words.clone()));
        }
        _ => {}
    }
    Ok(())
}

fn config_data_to_config(data: ConfigData) -> Result<crate::Config, ConfigError> {
    validate(&data)?;

    let (primary, master, stack) = data.layout_axis;
    let layout_axis = AxisConfig::new(primary, master, stack).ok_or_else(|| {
        ConfigError::ValidationError(format!(
            "layout_axis ({primary}, {master}, {stack}) is out of range"
        ))
    })?;

    let defaults = crate::Config::default();
    let modkey = data.modkey.to_keybut_mask(defaults.modkey);
    if matches!(data.modkey, ModKey::Mod) {
        return Err(ConfigError::InvalidModkey(
            "modkey cannot refer to itself".to_string(),
        ));
    }

    let keybindings = match data.keybindings {
        None => defaults.keybindings,
        Some(bindings) => {
            let mut keybindings = Vec::with_capacity(bindings.len());
            for binding in bindings {
                let arg = arg_data_to_arg(binding.arg);
                validate_key_arg(binding.action, &arg)?;
                keybindings.push(KeyBinding::new(
                    resolve_modifiers(&binding.modifiers, modkey),
                    resolve_key(&binding.key)?,
                    binding.action,
                    arg,
                ));
            }
            keybindings
        }
    };

    let buttons = match data.buttons {
        None => defaults.buttons,
        Some(buttons) => buttons
            .into_iter()
            .map(|button| {
                ButtonBinding::new(
                    button.click,
                    resolve_modifiers(&button.modifiers, modkey),
                    button.button,
                    button.action,
                )
            })
            .collect(),
    };

    Ok(crate::Config {
        border_width: data.border_width,
        border_focused: data.border_focused,
        border_unfocused: data.border_unfocused,
        border_floating: data.border_floating,
        border_seamless: data.border_seamless,
        gap: data.gap,
        tile_switch: data.tile_switch,
        border_switch: data.border_switch,
        show_bar: data.show_bar,
        show_extra_bar: data.show_extra_bar,
        top_bar: data.top_bar,
        bar_height: data.bar_height,
        bar_gap: data.bar_gap,
        mfact: data.mfact,
        nmaster: data.nmaster,
        layouts: data.layouts,
        layout_axis,
        attach: data.attach,
        snap: data.snap,
        resize_hints: data.resize_hints,
        lock_fullscreen: data.lock_fullscreen,
        swallow_floating: data.swallow_floating,
        tags: data.tags,
        tag_rows: data.tag_rows,
        rules: data.rules,
        float_pos_grid: data.float_pos_grid,
        modkey,
        keybindings,
        buttons,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_record_yields_defaults() {
        let config = parse_config("()").unwrap();
        let defaults = crate::Config::default();
        assert_eq!(config.gap, defaults.gap);
        assert_eq!(config.tags, defaults.tags);
        assert_eq!(config.keybindings.len(), defaults.keybindings.len());
        assert_eq!(config.layout_axis, AxisConfig::default());
    }

    #[test]
    fn defines_are_substituted() {
        let input = r#"
#DEFINE $gap = 8,
#DEFINE $gap_big = 16
(
    gap: $gap,
    snap: $gap_big,
)
"#;
        let config = parse_config(input).unwrap();
        assert_eq!(config.gap, 8);
        assert_eq!(config.snap, 16);
    }

    #[test]
    fn undefined_variable_is_reported() {
        let error = parse_config("(gap: $missing)").unwrap_err();
        assert!(matches!(error, ConfigError::UndefinedVariable(name) if name == "$missing"));
    }

    #[test]
    fn define_without_dollar_is_rejected() {
        let error = parse_config("#DEFINE gap = 3\n()").unwrap_err();
        assert!(matches!(error, ConfigError::InvalidVariableName(_)));
        let error = parse_config("#DEFINE $gap 3\n()").unwrap_err();
        assert!(matches!(error, ConfigError::InvalidDefine(_)));
    }

    #[test]
    fn keybindings_resolve_names_and_modkey() {
        let input = r#"(
    modkey: Mod1,
    keybindings: [
        (modifiers: [Mod, Shift], key: "Return", action: Zoom),
        (modifiers: [Mod], key: "j", action: FocusStack, arg: 1),
        (modifiers: [Mod], key: "h", action: SetMasterFactor, arg: -0.05),
        (modifiers: [Mod], key: "m", action: SetLayout, arg: "monocle"),
    ],
)"#;
        let config = parse_config(input).unwrap();
        assert_eq!(config.modkey, KeyButMask::MOD1);
        assert_eq!(config.keybindings.len(), 4);
        let zoom = &config.keybindings[0];
        assert_eq!(zoom.keysym, keysyms::XK_RETURN);
        assert_eq!(zoom.modifiers, vec![KeyButMask::MOD1, KeyButMask::SHIFT]);
        assert_eq!(config.keybindings[1].arg, Arg::Int(1));
        assert_eq!(config.keybindings[2].arg, Arg::Float(-0.05));
        assert_eq!(config.keybindings[3].arg, Arg::Str("monocle".into()));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let key = r#"(keybindings: [(key: "NoSuchKey", action: Zoom)])"#;
        assert!(matches!(parse_config(key), Err(ConfigError::UnknownKey(_))));

        let layout = r#"(keybindings: [(key: "t", action: SetLayout, arg: "spiral")])"#;
        assert!(matches!(parse_config(layout), Err(ConfigError::UnknownLayout(_))));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        assert!(matches!(
            parse_config("(mfact: 0.99)"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse_config("(layout_axis: (3, 1, 1))"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse_config("(layouts: [])"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse_config("(modkey: Mod)"),
            Err(ConfigError::InvalidModkey(_))
        ));
    }

    #[test]
    fn rules_and_buttons_parse() {
        let input = r#"(
    rules: [(class: Some("mpv"), is_floating: true, tags: 4)],
    buttons: [(click: RootWindow, button: 1, action: DragFact)],
)"#;
        let config = parse_config(input).unwrap();
        assert_eq!(config.rules.len(), 1);
        assert!(config.rules[0].is_floating);
        assert_eq!(config.rules[0].tags, 4);
        assert_eq!(config.buttons.len(), 1);
        assert_eq!(config.buttons[0].action, MouseAction::DragFact);
    }

    #[test]
    fn rule_placement_fields_parse_and_validate() {
        let input = r#"(
    rules: [(title: Some("scratch"), is_floating: true, float_border: Some(4),
             float_pos: Some("50% 50% 50% 50%"), switch_tag: ViewAndRevert)],
    tag_rows: 3,
    float_pos_grid: (3, 4),
)"#;
        let config = parse_config(input).unwrap();
        assert_eq!(config.rules[0].float_border, Some(4));
        assert_eq!(config.rules[0].switch_tag, crate::SwitchTag::ViewAndRevert);
        assert_eq!(config.tag_rows, 3);
        assert_eq!(config.float_pos_grid, (3, 4));

        assert!(matches!(
            parse_config(r#"(rules: [(float_pos: Some("5q 5q"))])"#),
            Err(ConfigError::InvalidFloatPos(_))
        ));
        assert!(matches!(
            parse_config("(rules: [(float_border: Some(-2))])"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse_config("(float_pos_grid: (1, 5))"),
            Err(ConfigError::ValidationError(_))
        ));
        assert!(matches!(
            parse_config("(tag_rows: 0)"),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn placement_and_grid_key_arguments_are_checked() {
        let config = parse_config(
            r#"(keybindings: [
    (modifiers: [Mod], key: "Up", action: FloatPos, arg: "0x -26y"),
    (modifiers: [Mod], key: "k", action: SwitchTag, arg: "up view"),
])"#,
        )
        .unwrap();
        assert_eq!(config.keybindings.len(), 2);

        assert!(matches!(
            parse_config(r#"(keybindings: [(key: "Up", action: FloatPos, arg: 3)])"#),
            Err(ConfigError::InvalidFloatPos(_))
        ));
        assert!(matches!(
            parse_config(r#"(keybindings: [(key: "k", action: SwitchTag, arg: "sideways")])"#),
            Err(ConfigError::InvalidTagMove(_))
        ));
    }

    #[test]
    fn bundled_template_parses() {
        let config = parse_config(TEMPLATE).unwrap();
        assert_eq!(config.tags.len(), 9);
        assert!(!config.keybindings.is_empty());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load(Path::new("/nonexistent/axwm/config.ron")).unwrap();
        assert_eq!(config.mfact, crate::Config::default().mfact);
    }
}
