use serde::Serialize;

use crate::models::{ClusterId, ClusterUpdate, ClusterZone};

/// The zone whose detail panel is open, if any.
///
/// Pure state: selecting never triggers I/O, and the zone details are always
/// read from the current snapshot rather than copied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    zone: Option<ClusterId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: ClusterId) {
        self.zone = Some(id);
    }

    pub fn clear(&mut self) {
        self.zone = None;
    }

    pub fn selected(&self) -> Option<ClusterId> {
        self.zone
    }

    pub fn is_empty(&self) -> bool {
        self.zone.is_none()
    }

    /// Drop the selection when its zone is gone from `update` or has no
    /// points left. Returns whether the selection was cleared.
    pub fn reconcile(&mut self, update: Option<&ClusterUpdate>) -> bool {
        let Some(id) = self.zone else {
            return false;
        };
        let alive = update
            .and_then(|u| u.zone(id))
            .is_some_and(|z| !z.is_empty());
        if !alive {
            log::debug!("Zone {} no longer present, clearing selection", id);
            self.zone = None;
        }
        !alive
    }

    /// The selected zone as it appears in `update`.
    pub fn resolve<'a>(&self, update: &'a ClusterUpdate) -> Option<&'a ClusterZone> {
        self.zone.and_then(|id| update.zone(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityTier;

    fn update(zones: &[(u32, usize)]) -> ClusterUpdate {
        ClusterUpdate {
            update_id: "u".into(),
            source_id: "s".into(),
            timestamp: 1,
            zones: zones
                .iter()
                .map(|(id, n)| ClusterZone::new(*id, 0.0, 0.0, *n, QualityTier::Good))
                .collect(),
            total_points: zones.iter().map(|(_, n)| n).sum(),
            points: Vec::new(),
            metadata: Default::default(),
        }
    }

    #[test]
    fn test_selection_survives_while_zone_exists() {
        let mut sel = Selection::new();
        sel.select(ClusterId(1));
        assert!(!sel.reconcile(Some(&update(&[(0, 3), (1, 2)]))));
        assert_eq!(sel.selected(), Some(ClusterId(1)));
        assert_eq!(sel.resolve(&update(&[(1, 7)])).map(|z| z.point_count), Some(7));
    }

    #[test]
    fn test_selection_cleared_when_zone_disappears() {
        let mut sel = Selection::new();
        sel.select(ClusterId(4));
        assert!(sel.reconcile(Some(&update(&[(0, 3)]))));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_selection_cleared_when_zone_empties() {
        let mut sel = Selection::new();
        sel.select(ClusterId(0));
        assert!(sel.reconcile(Some(&update(&[(0, 0)]))));
        assert!(sel.is_empty());
    }

    #[test]
    fn test_selection_cleared_without_snapshot() {
        let mut sel = Selection::new();
        assert!(!sel.reconcile(None));
        sel.select(ClusterId(0));
        assert!(sel.reconcile(None));
    }
}
