use super::{Arrangement, Layout, LayoutInput, Placement};
use crate::geometry::WindowGeometry;

pub struct MonocleLayout;

impl Layout for MonocleLayout {
    fn name(&self) -> &'static str {
        super::LayoutKind::Monocle.as_str()
    }

    fn symbol(&self) -> &'static str {
        super::LayoutKind::Monocle.symbol()
    }

    fn arrange(&self, input: &LayoutInput) -> Arrangement {
        let visible_count = input.clients.len();
        let symbol = if visible_count > 0 {
            format!("[{visible_count}]")
        } else {
            self.symbol().to_string()
        };

        let border = if input.gap == 0 { 0 } else { input.border_width };
        let area = input.work_area;
        let gap = input.gap;
        let front = input.tiled().min_by_key(|client| client.focus_rank);

        let mut placements = Vec::new();
        if let Some(front) = front {
            let requested = WindowGeometry::new(
                area.x + gap,
                area.y + gap,
                area.width - 2 * gap,
                area.height - 2 * gap,
                border,
            );
            placements.push(Placement {
                window: front.window,
                geometry: input.fit(front, requested),
                offscreen: false,
            });
        }
        for client in input.tiled() {
            if Some(client.window) == front.map(|front| front.window) {
                continue;
            }
            placements.push(Placement {
                window: client.window,
                geometry: client.geometry,
                offscreen: true,
            });
        }

        Arrangement {
            placements,
            symbol,
            nmaster: input.nmaster,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::{client, input};

    #[test]
    fn most_recent_client_fills_the_area() {
        let clients = [client(1, 1), client(2, 0), client(3, 2)];
        let arrangement = MonocleLayout.arrange(&input(&clients, 4));

        assert_eq!(arrangement.symbol, "[3]");
        let front = arrangement.placement(2).unwrap();
        assert!(!front.offscreen);
        assert_eq!(front.geometry, WindowGeometry::new(4, 4, 1272, 792, 1));
        assert!(arrangement.placement(1).unwrap().offscreen);
        assert!(arrangement.placement(3).unwrap().offscreen);
    }

    #[test]
    fn symbol_counts_floating_clients_too() {
        let mut clients = vec![client(1, 0), client(2, 1)];
        clients[0].is_floating = true;
        let arrangement = MonocleLayout.arrange(&input(&clients, 0));

        assert_eq!(arrangement.symbol, "[2]");
        assert!(arrangement.placement(1).is_none());
        assert_eq!(
            arrangement.placement(2).unwrap().geometry,
            WindowGeometry::new(0, 0, 1280, 800, 0)
        );
    }

    #[test]
    fn empty_monitor_keeps_the_default_symbol() {
        let arrangement = MonocleLayout.arrange(&input(&[], 4));
        assert_eq!(arrangement.symbol, "[M]");
        assert!(arrangement.placements.is_empty());
    }
}
