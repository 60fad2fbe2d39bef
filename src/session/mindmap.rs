//! Zoomable mind map.

use crate::artifact::MindMapArtifact;

/// Zoom bounds and step, in percent.
pub const ZOOM_MIN_PERCENT: u16 = 50;
pub const ZOOM_MAX_PERCENT: u16 = 200;
pub const ZOOM_STEP_PERCENT: u16 = 20;
pub const ZOOM_DEFAULT_PERCENT: u16 = 100;

/// A mind map plus its zoom factor.
///
/// Zoom is kept in whole percent so repeated steps never drift; it only
/// affects how the map is drawn, never the map itself.
#[derive(Debug, Clone, PartialEq)]
pub struct MindMapView {
    map: MindMapArtifact,
    zoom_percent: u16,
}

impl MindMapView {
    pub fn new(map: MindMapArtifact) -> Self {
        Self {
            map,
            zoom_percent: ZOOM_DEFAULT_PERCENT,
        }
    }

    pub fn artifact(&self) -> &MindMapArtifact {
        &self.map
    }

    /// Current zoom factor in `[0.5, 2.0]`.
    pub fn zoom(&self) -> f64 {
        f64::from(self.zoom_percent) / 100.0
    }

    pub fn zoom_percent(&self) -> u16 {
        self.zoom_percent
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.zoom_percent = (self.zoom_percent + ZOOM_STEP_PERCENT).min(ZOOM_MAX_PERCENT);
        self.zoom()
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.zoom_percent = self
            .zoom_percent
            .saturating_sub(ZOOM_STEP_PERCENT)
            .max(ZOOM_MIN_PERCENT);
        self.zoom()
    }

    pub fn reset_zoom(&mut self) -> f64 {
        self.zoom_percent = ZOOM_DEFAULT_PERCENT;
        self.zoom()
    }

    pub fn can_zoom_in(&self) -> bool {
        self.zoom_percent < ZOOM_MAX_PERCENT
    }

    pub fn can_zoom_out(&self) -> bool {
        self.zoom_percent > ZOOM_MIN_PERCENT
    }

    /// CSS transform for a renderer that scales the drawn map.
    pub fn css_transform(&self) -> String {
        format!("scale({})", self.zoom())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::MindMapNode;

    fn view() -> MindMapView {
        MindMapView::new(MindMapArtifact {
            mind_map: MindMapNode {
                id: "root".into(),
                label: "Root".into(),
                children: vec![],
            },
        })
    }

    #[test]
    fn three_steps_in_then_reset_is_exactly_one() {
        let mut v = view();
        v.zoom_in();
        v.zoom_in();
        assert_eq!(v.zoom_in(), 1.6);
        assert_eq!(v.reset_zoom(), 1.0);
    }

    #[test]
    fn zoom_in_clamps_at_two() {
        let mut v = view();
        for _ in 0..10 {
            v.zoom_in();
        }
        assert_eq!(v.zoom(), 2.0);
        assert!(!v.can_zoom_in());
    }

    #[test]
    fn zoom_out_clamps_at_half() {
        let mut v = view();
        assert_eq!(v.zoom_out(), 0.8);
        assert_eq!(v.zoom_out(), 0.6);
        assert_eq!(v.zoom_out(), 0.5);
        assert_eq!(v.zoom_out(), 0.5);
        assert!(!v.can_zoom_out());
    }

    #[test]
    fn zoom_never_touches_the_map() {
        let mut v = view();
        let before = v.artifact().clone();
        v.zoom_in();
        v.zoom_out();
        v.zoom_out();
        assert_eq!(v.artifact(), &before);
        assert_eq!(v.css_transform(), "scale(0.8)");
    }
}
