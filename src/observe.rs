//! Viewport-intersection tracking.
//!
//! Stands in for `IntersectionObserver`: the owner calls [`Observer::poll`]
//! whenever the viewport may have moved (scroll, resize, load, start-up) and
//! gets back the targets that *became* visible since the previous poll.
//! Targets that stay visible are not reported again.

use crate::dom::{Dom, NodeId, Rect, Viewport};

#[derive(Debug, Clone)]
pub struct Observer {
    threshold: f64,
    bottom_margin: f64,
    targets: Vec<(NodeId, bool)>,
}

impl Observer {
    /// `threshold` is the visible fraction (0..=1) that counts as
    /// intersecting; `bottom_margin` shrinks the viewport from below, like a
    /// negative bottom `rootMargin`.
    pub fn new(threshold: f64, bottom_margin: f64) -> Self {
        Self {
            threshold,
            bottom_margin,
            targets: Vec::new(),
        }
    }

    pub fn observe(&mut self, node: NodeId) {
        if !self.targets.iter().any(|(n, _)| *n == node) {
            self.targets.push((node, false));
        }
    }

    pub fn unobserve(&mut self, node: NodeId) {
        self.targets.retain(|(n, _)| *n != node);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets that entered the viewport since the last poll, in observation
    /// order.
    pub fn poll<D: Dom + ?Sized>(&mut self, dom: &D) -> Vec<NodeId> {
        let viewport = dom.viewport();
        let mut entered = Vec::new();
        for (node, was_visible) in &mut self.targets {
            let visible = is_intersecting(
                dom.bounding_rect(*node),
                viewport,
                self.bottom_margin,
                self.threshold,
            );
            if visible && !*was_visible {
                entered.push(*node);
            }
            *was_visible = visible;
        }
        entered
    }
}

/// Fraction of `rect`'s height inside the (margin-shrunk) viewport.
pub fn intersection_ratio(rect: Rect, viewport: Viewport, bottom_margin: f64) -> f64 {
    let root_bottom = viewport.height - bottom_margin;
    if rect.height <= 0.0 {
        return if rect.top >= 0.0 && rect.top <= root_bottom {
            1.0
        } else {
            0.0
        };
    }
    let visible = rect.bottom().min(root_bottom) - rect.top.max(0.0);
    (visible / rect.height).clamp(0.0, 1.0)
}

fn is_intersecting(rect: Rect, viewport: Viewport, bottom_margin: f64, threshold: f64) -> bool {
    let ratio = intersection_ratio(rect, viewport, bottom_margin);
    ratio > 0.0 && ratio >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDom;

    fn rect(top: f64, height: f64) -> Rect {
        Rect {
            left: 0.0,
            top,
            width: 100.0,
            height,
        }
    }

    const VIEW: Viewport = Viewport {
        width: 1000.0,
        height: 800.0,
    };

    #[test]
    fn ratio_partial_overlap() {
        assert_eq!(intersection_ratio(rect(700.0, 200.0), VIEW, 0.0), 0.5);
        assert_eq!(intersection_ratio(rect(-150.0, 200.0), VIEW, 0.0), 0.25);
        assert_eq!(intersection_ratio(rect(900.0, 200.0), VIEW, 0.0), 0.0);
    }

    #[test]
    fn bottom_margin_shrinks_viewport() {
        assert_eq!(intersection_ratio(rect(760.0, 100.0), VIEW, 0.0), 0.4);
        assert_eq!(intersection_ratio(rect(760.0, 100.0), VIEW, 50.0), 0.0);
    }

    #[test]
    fn zero_height_targets() {
        assert_eq!(intersection_ratio(rect(10.0, 0.0), VIEW, 0.0), 1.0);
        assert_eq!(intersection_ratio(rect(-10.0, 0.0), VIEW, 0.0), 0.0);
    }

    #[test]
    fn poll_reports_only_entries() {
        let mut dom = MemoryDom::parse_html("<body><section id='a'></section></body>");
        let a = dom.element_by_id("a").unwrap();
        dom.set_layout(a, rect(1000.0, 400.0));

        let mut observer = Observer::new(0.1, 0.0);
        observer.observe(a);
        observer.observe(a);
        assert_eq!(observer.len(), 1);
        assert!(observer.poll(&dom).is_empty());

        dom.set_scroll_top(500.0);
        assert_eq!(observer.poll(&dom), vec![a]);
        assert!(observer.poll(&dom).is_empty());

        dom.set_scroll_top(0.0);
        assert!(observer.poll(&dom).is_empty());
        dom.set_scroll_top(500.0);
        assert_eq!(observer.poll(&dom), vec![a]);
    }

    #[test]
    fn threshold_gates_entry() {
        let mut dom = MemoryDom::parse_html("<body><section id='a'></section></body>");
        let a = dom.element_by_id("a").unwrap();
        dom.set_layout(a, rect(780.0, 1000.0));
        let mut observer = Observer::new(0.1, 0.0);
        observer.observe(a);
        assert!(observer.poll(&dom).is_empty());
        dom.set_scroll_top(200.0);
        assert_eq!(observer.poll(&dom), vec![a]);
    }
}
