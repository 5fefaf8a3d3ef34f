use super::{Arrangement, Layout, LayoutInput, Placement};
use crate::geometry::WindowGeometry;

/// Clients keep their own geometry; borderless ones get their border back
/// without growing their outer size.
pub struct FloatingLayout;

impl Layout for FloatingLayout {
    fn name(&self) -> &'static str {
        super::LayoutKind::Floating.as_str()
    }

    fn symbol(&self) -> &'static str {
        super::LayoutKind::Floating.symbol()
    }

    fn arrange(&self, input: &LayoutInput) -> Arrangement {
        let border = input.border_width;
        let placements = input
            .clients
            .iter()
            .filter(|client| client.geometry.border_width == 0 && !client.is_fullscreen)
            .map(|client| {
                let current = client.geometry;
                let requested = WindowGeometry::new(
                    current.x,
                    current.y,
                    current.width - 2 * border,
                    current.height - 2 * border,
                    border,
                );
                Placement {
                    window: client.window,
                    geometry: input.fit(client, requested),
                    offscreen: false,
                }
            })
            .collect();

        Arrangement {
            placements,
            symbol: self.symbol().to_string(),
            nmaster: input.nmaster,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::test_support::{client, input};

    #[test]
    fn borderless_clients_regain_their_border() {
        let mut clients = vec![client(1, 0), client(2, 1)];
        clients[0].geometry = WindowGeometry::new(10, 10, 300, 200, 0);
        let arrangement = FloatingLayout.arrange(&input(&clients, 4));

        assert_eq!(arrangement.symbol, "><>");
        assert_eq!(arrangement.placements.len(), 1);
        assert_eq!(
            arrangement.placement(1).unwrap().geometry,
            WindowGeometry::new(10, 10, 298, 198, 1)
        );
    }

    #[test]
    fn fullscreen_clients_stay_borderless() {
        let mut clients = vec![client(1, 0)];
        clients[0].geometry = WindowGeometry::new(0, 0, 1280, 800, 0);
        clients[0].is_fullscreen = true;
        let arrangement = FloatingLayout.arrange(&input(&clients, 4));
        assert!(arrangement.placements.is_empty());
    }
}
