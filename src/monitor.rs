use crate::Config;
use crate::client::TagMask;
use crate::geometry::Rect;
use crate::layout::{AxisConfig, LayoutKind};
use crate::pertag::{LayoutSnapshot, Pertag};
use x11rb::protocol::xproto::Window;

/// Bar dimensions the work area is carved from.
#[derive(Debug, Clone, Copy)]
pub struct BarSettings {
    pub height: i32,
    /// Offset the bar from the screen edge by the monitor's gap.
    pub inset_by_gap: bool,
}

#[derive(Debug, Clone)]
pub struct Monitor {
    pub num: usize,
    pub screen: Rect,
    pub work_area: Rect,
    pub bar_y: i32,
    pub tagset: [TagMask; 2],
    pub selected_tagset: usize,
    pub layouts: [LayoutKind; 2],
    pub selected_layout: usize,
    pub axis: AxisConfig,
    pub mfact: f32,
    pub nmaster: usize,
    pub gap: i32,
    pub show_bar: bool,
    pub show_extra_bar: bool,
    pub top_bar: bool,
    pub layout_symbol: String,
    /// Insertion order; the first `nmaster` tiled clients are the masters.
    pub clients: Vec<Window>,
    /// Focus recency, most recent first.
    pub stack: Vec<Window>,
    pub selected: Option<Window>,
    pub pertag: Pertag,
}

impl Monitor {
    pub fn new(num: usize, screen: Rect, config: &Config) -> Self {
        let first = config.layouts.first().copied().unwrap_or(LayoutKind::Tile);
        let second = config
            .layouts
            .get(1 % config.layouts.len().max(1))
            .copied()
            .unwrap_or(first);
        let mut monitor = Self {
            num,
            screen,
            work_area: screen,
            bar_y: 0,
            tagset: [1, 1],
            selected_tagset: 0,
            layouts: [first, second],
            selected_layout: 0,
            axis: config.layout_axis,
            mfact: config.mfact,
            nmaster: config.nmaster,
            gap: config.gap,
            show_bar: config.show_bar,
            show_extra_bar: config.show_extra_bar,
            top_bar: config.top_bar,
            layout_symbol: first.symbol().to_string(),
            clients: Vec::new(),
            stack: Vec::new(),
            selected: None,
            pertag: Pertag::new(
                config.tags.len(),
                LayoutSnapshot {
                    nmaster: config.nmaster,
                    mfact: config.mfact,
                    axis: config.layout_axis,
                    layouts: [first, second],
                    selected_layout: 0,
                    gap: config.gap,
                    show_bar: config.show_bar,
                    show_extra_bar: config.show_extra_bar,
                },
            ),
        };
        monitor.update_bar_position(&config.bar_settings());
        monitor
    }

    pub fn tags(&self) -> TagMask {
        self.tagset[self.selected_tagset]
    }

    pub fn layout(&self) -> LayoutKind {
        self.layouts[self.selected_layout]
    }

    pub fn arranges(&self) -> bool {
        self.layout().arranges()
    }

    pub fn bar_count(&self) -> i32 {
        self.show_bar as i32 + self.show_extra_bar as i32
    }

    /// Recomputes the work area and bar position from the screen rectangle.
    pub fn update_bar_position(&mut self, bar: &BarSettings) {
        let bar_gap = if bar.inset_by_gap { self.gap } else { 0 };
        let bar_count = self.bar_count();
        let bar_height = bar_count * bar.height;

        self.work_area = self.screen;
        if bar_count != 0 {
            self.work_area.height -= bar_height + bar_gap;
            if self.top_bar {
                self.bar_y = self.work_area.y + bar_gap;
                self.work_area.y += bar_height + bar_gap;
            } else {
                self.bar_y = self.work_area.y + self.work_area.height;
            }
        } else {
            self.bar_y = -bar.height;
        }
    }

    pub fn set_screen(&mut self, screen: Rect, bar: &BarSettings) {
        self.screen = screen;
        self.update_bar_position(bar);
    }

    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            nmaster: self.nmaster,
            mfact: self.mfact,
            axis: self.axis,
            layouts: self.layouts,
            selected_layout: self.selected_layout,
            gap: self.gap,
            show_bar: self.show_bar,
            show_extra_bar: self.show_extra_bar,
        }
    }

    /// Writes the live layout fields through to the current tag.
    pub fn commit_layout(&mut self) {
        let snapshot = self.snapshot();
        self.pertag.commit(snapshot);
    }

    /// Loads the current tag's layout fields into the live ones.
    pub fn restore_layout(&mut self, bar: &BarSettings) {
        let snapshot = *self.pertag.snapshot();
        let bar_changed = snapshot.show_bar != self.show_bar
            || snapshot.show_extra_bar != self.show_extra_bar
            || snapshot.gap != self.gap;

        self.nmaster = snapshot.nmaster;
        self.mfact = snapshot.mfact;
        self.axis = snapshot.axis;
        self.layouts = snapshot.layouts;
        self.selected_layout = snapshot.selected_layout;
        self.gap = snapshot.gap;
        self.show_bar = snapshot.show_bar;
        self.show_extra_bar = snapshot.show_extra_bar;

        if bar_changed {
            self.update_bar_position(bar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn monitor() -> Monitor {
        Monitor::new(0, Rect::new(0, 0, 1280, 800), &Config::default())
    }

    #[test]
    fn top_bar_is_inset_by_the_gap() {
        let monitor = monitor();
        assert_eq!(monitor.bar_y, 4);
        assert_eq!(monitor.work_area, Rect::new(0, 24, 1280, 776));
    }

    #[test]
    fn bottom_bar_and_hidden_bar() {
        let bar = BarSettings {
            height: 20,
            inset_by_gap: false,
        };
        let mut monitor = monitor();
        monitor.top_bar = false;
        monitor.update_bar_position(&bar);
        assert_eq!(monitor.work_area, Rect::new(0, 0, 1280, 780));
        assert_eq!(monitor.bar_y, 780);

        monitor.show_bar = false;
        monitor.update_bar_position(&bar);
        assert_eq!(monitor.work_area, Rect::new(0, 0, 1280, 800));
        assert_eq!(monitor.bar_y, -20);
    }

    #[test]
    fn two_bars_stack() {
        let mut monitor = monitor();
        monitor.show_extra_bar = true;
        monitor.update_bar_position(&Config::default().bar_settings());
        assert_eq!(monitor.work_area, Rect::new(0, 44, 1280, 756));
    }

    #[test]
    fn restore_reloads_the_tag_snapshot() {
        let bar = Config::default().bar_settings();
        let mut monitor = monitor();
        monitor.mfact = 0.7;
        monitor.commit_layout();
        monitor.pertag.switch_to(3);
        monitor.restore_layout(&bar);
        assert_eq!(monitor.mfact, 0.55);
        monitor.pertag.swap_with_previous();
        monitor.restore_layout(&bar);
        assert_eq!(monitor.mfact, 0.7);
    }
}
