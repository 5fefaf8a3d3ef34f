use super::{Arrangement, Axis, AxisConfig, Layout, LayoutClient, LayoutInput, Placement};
use crate::geometry::WindowGeometry;
use std::fmt;

pub struct TileLayout;

impl Layout for TileLayout {
    fn name(&self) -> &'static str {
        super::LayoutKind::Tile.as_str()
    }

    fn symbol(&self) -> &'static str {
        super::LayoutKind::Tile.symbol()
    }

    fn arrange(&self, input: &LayoutInput) -> Arrangement {
        let tiled: Vec<&LayoutClient> = input.tiled().collect();
        let count = tiled.len();
        let gap = input.gap;
        let border_px = input.border_width;
        let border = if input.border_switch && gap > input.tile_switch {
            0
        } else {
            border_px
        };

        let mut master_facts = 0.0;
        let mut stack_facts = 0.0;
        for (index, client) in tiled.iter().enumerate() {
            if index < input.nmaster {
                master_facts += client.cfact;
            } else {
                stack_facts += client.cfact;
            }
        }

        let nmaster = if input.nmaster > count {
            count.max(1)
        } else {
            input.nmaster
        };

        let symbol = layout_symbol(input.axis, nmaster, count);
        let mut arrangement = Arrangement {
            placements: Vec::with_capacity(count),
            symbol,
            nmaster,
        };
        if count == 0 {
            return arrangement;
        }

        let area = input.work_area;
        let mut master = Region {
            x: area.x + gap,
            y: area.y + gap,
            width: area.width - gap,
            height: area.height - gap,
        };
        let mut stack = master;

        let axis = input.axis;
        let split = count > nmaster && nmaster > 0;
        if split {
            match axis.primary_axis() {
                Axis::Vertical => {
                    master.height = (master.height as f32 * input.mfact).round() as i32;
                    stack.height -= master.height;
                    if axis.is_mirrored() {
                        master.y += stack.height;
                    } else {
                        stack.y += master.height;
                    }
                }
                _ => {
                    master.width = (master.width as f32 * input.mfact).round() as i32;
                    stack.width -= master.width;
                    if axis.is_mirrored() {
                        master.x += stack.width;
                    } else {
                        stack.x += master.width;
                    }
                }
            }
        }

        if gap == 0 {
            extend_over_borders(&mut master, &mut stack, input, split, count);
        }

        let (masters, rest) = tiled.split_at(nmaster.min(count));
        place_group(
            input,
            masters,
            master,
            axis.master_axis(),
            master_facts,
            border,
            &mut arrangement.placements,
        );
        if count > nmaster {
            place_group(
                input,
                rest,
                stack,
                axis.stack_axis(),
                stack_facts,
                border,
                &mut arrangement.placements,
            );
        }

        arrangement
    }
}

#[derive(Debug, Clone, Copy)]
struct Region {
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

/// Without gaps the regions grow over the outer borders so tiled windows
/// meet the monitor edges and each other with a single border line.
fn extend_over_borders(
    master: &mut Region,
    stack: &mut Region,
    input: &LayoutInput,
    split: bool,
    count: usize,
) {
    let border = input.border_width;
    let axis = input.axis;

    if !input.bars_shown {
        if input.top_bar {
            master.y -= border;
            stack.y -= border;
        }
        master.height += border;
        stack.height += border;
    }

    if split && axis.primary_axis() == Axis::Horizontal {
        master.height += border;
        stack.height += border;
        master.width += border;
        stack.width += border;
        if axis.is_mirrored() {
            stack.x -= border;
        } else {
            master.x -= border;
        }
        if !input.top_bar {
            master.y -= border;
            stack.y -= border;
        }
    }

    if split && axis.primary_axis() == Axis::Vertical {
        master.width += 2 * border;
        stack.width += 2 * border;
        master.x -= border;
        stack.x -= border;
        if input.top_bar {
            stack.height += border;
        } else {
            master.height += border;
            master.y -= border;
        }
    }

    if count == 1 {
        master.height += border;
        stack.height += border;
        master.width += 2 * border;
        stack.width += 2 * border;
        stack.x -= border;
        master.x -= border;
        if !input.top_bar {
            master.y -= border;
            stack.y -= border;
        }
    }
}

/// Lays out one group inside its region.
///
/// Members split the region along `axis` in proportion to their cfact; the
/// last member absorbs the rounding remainder. A stacked axis gives every
/// member the whole region and leaves only the most recently focused one
/// on screen.
fn place_group(
    input: &LayoutInput,
    members: &[&LayoutClient],
    region: Region,
    axis: Axis,
    facts: f32,
    border: i32,
    placements: &mut Vec<Placement>,
) {
    let count = members.len();
    if count == 0 {
        return;
    }

    let gap = input.gap;
    let min_cell = (input.bar_height + gap + 2 * input.border_width) * (count as i32 + 1);
    let across = if axis != Axis::Horizontal || region.width < min_cell {
        1
    } else {
        count
    };
    let down = if axis != Axis::Vertical || region.height < min_cell {
        1
    } else {
        count
    };

    let right = region.x + region.width;
    let bottom = region.y + region.height;
    let mut x = region.x;
    let mut y = region.y;
    let first = placements.len();

    for (index, client) in members.iter().enumerate() {
        let last = index + 1 == count;
        let width = if axis == Axis::Horizontal && last {
            right - x - 2 * border - gap
        } else {
            (share(region.width, client.cfact, facts, across > 1) - (2 * border + gap) as f32) as i32
        };
        let height = if axis == Axis::Vertical && last {
            bottom - y - 2 * border - gap
        } else {
            (share(region.height, client.cfact, facts, down > 1) - (2 * border + gap) as f32) as i32
        };

        let geometry = input.fit(client, WindowGeometry::new(x, y, width, height, border));
        if across > 1 {
            x = geometry.x + geometry.outer_width() + gap;
        }
        if down > 1 {
            y = geometry.y + geometry.outer_height() + gap;
        }
        placements.push(Placement {
            window: client.window,
            geometry,
            offscreen: false,
        });
    }

    if axis == Axis::Stacked {
        let shown = members
            .iter()
            .min_by_key(|client| client.focus_rank)
            .map(|client| client.window);
        for placement in &mut placements[first..] {
            placement.offscreen = Some(placement.window) != shown;
        }
    }
}

fn share(extent: i32, cfact: f32, facts: f32, weighted: bool) -> f32 {
    if weighted {
        extent as f32 * (cfact / facts)
    } else {
        extent as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Glyph {
    Char(char),
    Count(usize),
    Empty,
}

impl fmt::Display for Glyph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(c) => write!(f, "{c}"),
            Self::Count(n) => write!(f, "{n}"),
            Self::Empty => Ok(()),
        }
    }
}

/// Three-glyph symbol describing the axis triple.
///
/// `=` marks a group split across the primary axis, `|` one split along it
/// and a number the size of a stacked group. `[`/`]` point at a single
/// master; a mirrored layout swaps both ends. An empty stacked master group
/// has no glyph.
pub fn layout_symbol(axis: AxisConfig, nmaster: usize, count: usize) -> String {
    let primary = axis.primary.unsigned_abs();
    let mut first = Glyph::Char('=');
    let mut middle = Glyph::Char(']');
    let mut last = Glyph::Char('=');

    if primary == axis.master {
        first = Glyph::Char('|');
    }
    if primary == axis.stack {
        last = Glyph::Char('|');
    }
    if axis.master == 3 {
        first = match nmaster {
            0 => Glyph::Empty,
            _ if count == 0 => Glyph::Count(0),
            _ => Glyph::Count(nmaster),
        };
    }
    if axis.stack == 3 {
        last = Glyph::Count(count.saturating_sub(nmaster));
    }
    if axis.is_mirrored() {
        std::mem::swap(&mut first, &mut last);
        middle = Glyph::Char('[');
    }
    if nmaster == 1 {
        if axis.is_mirrored() {
            last = Glyph::Char(']');
        } else {
            first = Glyph::Char('[');
        }
    }

    format!("{first}{middle}{last}")
}
