//! Insertion policies for a monitor's client order.

use crate::client::{Client, TagMask};
use serde::Deserialize;
use std::collections::HashMap;
use x11rb::protocol::xproto::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum AttachPolicy {
    /// Head of the list, becoming the first master.
    Top,
    /// Directly before the selection.
    Above,
    /// After the last tiled client sharing a tag, the head if there is none.
    #[default]
    Aside,
    /// Directly after the selection.
    Below,
    /// Tail of the list.
    Bottom,
    /// After the tiled clients of the same tags that fill the master area.
    TopOfTag,
}

/// What a policy needs to know about the clients already attached.
pub trait AttachPeers {
    fn is_floating(&self, window: Window) -> bool;
    fn shares_tags(&self, window: Window, tags: TagMask) -> bool;
}

impl AttachPeers for HashMap<Window, Client> {
    fn is_floating(&self, window: Window) -> bool {
        self.get(&window).is_some_and(|client| client.is_floating)
    }

    fn shares_tags(&self, window: Window, tags: TagMask) -> bool {
        self.get(&window).is_some_and(|client| client.tags & tags != 0)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AttachContext {
    pub tags: TagMask,
    pub selected: Option<Window>,
    pub nmaster: usize,
}

pub fn attach(
    policy: AttachPolicy,
    order: &mut Vec<Window>,
    window: Window,
    context: AttachContext,
    peers: &impl AttachPeers,
) {
    let tiled_on_tag =
        |other: Window| !peers.is_floating(other) && peers.shares_tags(other, context.tags);

    let index = match policy {
        AttachPolicy::Top => 0,
        AttachPolicy::Bottom => order.len(),
        AttachPolicy::Above => match context.selected {
            Some(selected) if !peers.is_floating(selected) => order
                .iter()
                .position(|&other| other == selected)
                .unwrap_or(0),
            _ => 0,
        },
        AttachPolicy::Below => match context.selected {
            Some(selected) if selected != window && !peers.is_floating(selected) => order
                .iter()
                .position(|&other| other == selected)
                .map_or(0, |index| index + 1),
            _ => 0,
        },
        AttachPolicy::Aside => order
            .iter()
            .rposition(|&other| tiled_on_tag(other))
            .map_or(0, |index| index + 1),
        AttachPolicy::TopOfTag => {
            if order.is_empty() {
                0
            } else {
                let mut seen = 1;
                let mut index = 0;
                while index + 1 < order.len()
                    && (!tiled_on_tag(order[index]) || seen != context.nmaster)
                {
                    if tiled_on_tag(order[index]) {
                        seen += 1;
                    }
                    index += 1;
                }
                index + 1
            }
        }
    };

    order.insert(index.min(order.len()), window);
}

/// Removes `window` from an ordering, returning the slot it occupied.
pub fn detach(order: &mut Vec<Window>, window: Window) -> Option<usize> {
    let index = order.iter().position(|&other| other == window)?;
    order.remove(index);
    Some(index)
}

/// Pushes `window` to the head of the focus-recency order.
pub fn attach_stack(stack: &mut Vec<Window>, window: Window) {
    detach(stack, window);
    stack.insert(0, window);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Peers {
        floating: Vec<Window>,
        tags: HashMap<Window, TagMask>,
    }

    impl AttachPeers for Peers {
        fn is_floating(&self, window: Window) -> bool {
            self.floating.contains(&window)
        }

        fn shares_tags(&self, window: Window, tags: TagMask) -> bool {
            self.tags.get(&window).copied().unwrap_or(1) & tags != 0
        }
    }

    fn context(selected: Option<Window>) -> AttachContext {
        AttachContext {
            tags: 1,
            selected,
            nmaster: 1,
        }
    }

    fn attached(policy: AttachPolicy, selected: Option<Window>, peers: &Peers) -> Vec<Window> {
        let mut order = vec![1, 2, 3, 4];
        attach(policy, &mut order, 9, context(selected), peers);
        order
    }

    #[test]
    fn top_and_bottom() {
        let peers = Peers::default();
        assert_eq!(attached(AttachPolicy::Top, Some(3), &peers), vec![9, 1, 2, 3, 4]);
        assert_eq!(attached(AttachPolicy::Bottom, Some(3), &peers), vec![1, 2, 3, 4, 9]);
    }

    #[test]
    fn above_and_below_selection() {
        let peers = Peers::default();
        assert_eq!(attached(AttachPolicy::Above, Some(3), &peers), vec![1, 2, 9, 3, 4]);
        assert_eq!(attached(AttachPolicy::Below, Some(3), &peers), vec![1, 2, 3, 9, 4]);
        assert_eq!(attached(AttachPolicy::Above, None, &peers), vec![9, 1, 2, 3, 4]);
        assert_eq!(attached(AttachPolicy::Below, None, &peers), vec![9, 1, 2, 3, 4]);
    }

    #[test]
    fn floating_selection_falls_back_to_head() {
        let peers = Peers {
            floating: vec![3],
            ..Peers::default()
        };
        assert_eq!(attached(AttachPolicy::Above, Some(3), &peers), vec![9, 1, 2, 3, 4]);
        assert_eq!(attached(AttachPolicy::Below, Some(3), &peers), vec![9, 1, 2, 3, 4]);
    }

    #[test]
    fn aside_follows_last_client_of_the_tag() {
        let peers = Peers {
            tags: HashMap::from([(1, 2), (2, 1), (3, 1), (4, 2)]),
            ..Peers::default()
        };
        assert_eq!(attached(AttachPolicy::Aside, None, &peers), vec![1, 2, 3, 9, 4]);

        let strangers = Peers {
            tags: HashMap::from([(1, 2), (2, 2), (3, 2), (4, 2)]),
            ..Peers::default()
        };
        assert_eq!(attached(AttachPolicy::Aside, None, &strangers), vec![9, 1, 2, 3, 4]);
    }

    #[test]
    fn top_of_tag_lands_after_the_master_area() {
        let peers = Peers {
            tags: HashMap::from([(1, 2), (2, 1), (3, 1), (4, 1)]),
            ..Peers::default()
        };
        assert_eq!(attached(AttachPolicy::TopOfTag, None, &peers), vec![1, 2, 9, 3, 4]);

        let mut order = Vec::new();
        attach(AttachPolicy::TopOfTag, &mut order, 9, context(None), &peers);
        assert_eq!(order, vec![9]);
    }

    #[test]
    fn attach_then_detach_restores_the_order() {
        let peers = Peers {
            tags: HashMap::from([(1, 2), (2, 1), (3, 2), (4, 1)]),
            floating: vec![2],
        };
        for policy in [
            AttachPolicy::Top,
            AttachPolicy::Above,
            AttachPolicy::Aside,
            AttachPolicy::Below,
            AttachPolicy::Bottom,
            AttachPolicy::TopOfTag,
        ] {
            for selected in [None, Some(1), Some(2), Some(4)] {
                let mut order = attached(policy, selected, &peers);
                assert_eq!(order.len(), 5);
                assert!(detach(&mut order, 9).is_some());
                assert_eq!(order, vec![1, 2, 3, 4], "{policy:?} with {selected:?}");
            }
        }
    }

    #[test]
    fn attach_stack_moves_to_head() {
        let mut stack = vec![1, 2, 3];
        attach_stack(&mut stack, 3);
        assert_eq!(stack, vec![3, 1, 2]);
        attach_stack(&mut stack, 7);
        assert_eq!(stack, vec![7, 3, 1, 2]);
    }
}
