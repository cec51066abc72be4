use std::collections::HashSet;

use crate::config::{HotspotAction, HotspotDef, HotspotId, SceneDef, SceneId};

/// Per-session mutable game state. Visits survive scene switches; only
/// `reset_scene` and `reset` clear them.
#[derive(Debug, Default)]
pub struct ProgressStore {
    score: u32,
    visited_hotspots: HashSet<HotspotId>,
    events_triggered: HashSet<SceneId>,
    current_scene: Option<SceneId>,
}

impl ProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true only on the first visit; the reward is granted then and
    /// never again for the same hotspot id.
    pub fn register_visit(&mut self, hotspot: &HotspotId, reward: u32) -> bool {
        if self.visited_hotspots.contains(hotspot) {
            return false;
        }
        self.visited_hotspots.insert(hotspot.clone());
        self.score = self.score.saturating_add(reward);
        true
    }

    pub fn has_visited(&self, hotspot: &HotspotId) -> bool {
        self.visited_hotspots.contains(hotspot)
    }

    pub fn add_score(&mut self, points: u32) {
        self.score = self.score.saturating_add(points);
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Percentage of non-quiz hotspots visited, floored. An empty required
    /// set is vacuously complete.
    pub fn progress_percent(&self, hotspots: &[HotspotDef]) -> u8 {
        let (visited, required) = self.count_required(hotspots);
        if required == 0 {
            return 100;
        }
        ((visited * 100) / required) as u8
    }

    pub fn is_scene_fully_explored(&self, scene: &SceneDef) -> bool {
        scene
            .hotspots
            .iter()
            .filter(|hotspot| hotspot.action == HotspotAction::Dialog)
            .all(|hotspot| self.visited_hotspots.contains(&hotspot.id))
    }

    /// (visited, required) over the scene's non-quiz hotspots, for the
    /// mission report's exploration ratio.
    pub fn explored_required(&self, scene: &SceneDef) -> (usize, usize) {
        self.count_required(&scene.hotspots)
    }

    pub fn mark_event_triggered(&mut self, scene: &SceneId) {
        self.events_triggered.insert(scene.clone());
    }

    pub fn event_triggered(&self, scene: &SceneId) -> bool {
        self.events_triggered.contains(scene)
    }

    pub fn enter_scene(&mut self, scene: &SceneId) {
        self.current_scene = Some(scene.clone());
    }

    pub fn leave_scene(&mut self) {
        self.current_scene = None;
    }

    pub fn current_scene(&self) -> Option<&SceneId> {
        self.current_scene.as_ref()
    }

    /// Clears only the given scene's visits and its triggered-event flag.
    /// Score earned elsewhere stays.
    pub fn reset_scene(&mut self, scene: &SceneDef) {
        for hotspot in &scene.hotspots {
            self.visited_hotspots.remove(&hotspot.id);
        }
        self.events_triggered.remove(&scene.id);
    }

    pub fn reset(&mut self) {
        self.score = 0;
        self.visited_hotspots.clear();
        self.events_triggered.clear();
        self.current_scene = None;
    }

    fn count_required(&self, hotspots: &[HotspotDef]) -> (usize, usize) {
        let required: Vec<&HotspotDef> = hotspots
            .iter()
            .filter(|hotspot| hotspot.action != HotspotAction::Quiz)
            .collect();
        let visited = required
            .iter()
            .filter(|hotspot| self.visited_hotspots.contains(&hotspot.id))
            .count();
        (visited, required.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dialog(id: &str) -> HotspotDef {
        HotspotDef {
            id: HotspotId(id.to_string()),
            action: HotspotAction::Dialog,
            label: None,
            text: Some(format!("about {id}")),
            locked_message: None,
            questions: Vec::new(),
        }
    }

    fn quiz(id: &str) -> HotspotDef {
        HotspotDef {
            id: HotspotId(id.to_string()),
            action: HotspotAction::Quiz,
            label: None,
            text: None,
            locked_message: None,
            questions: Vec::new(),
        }
    }

    fn scene(id: &str, hotspots: Vec<HotspotDef>) -> SceneDef {
        SceneDef {
            id: SceneId(id.to_string()),
            kind: crate::config::SceneKind::Panorama,
            label: None,
            image: None,
            ambience: None,
            narrator_intro: None,
            hotspots,
            event: None,
            cards: Vec::new(),
        }
    }

    #[test]
    fn first_visit_rewards_and_repeat_visits_do_not() {
        let mut store = ProgressStore::new();
        let id = HotspotId("patch_bay".to_string());
        assert!(store.register_visit(&id, 10));
        assert_eq!(store.score(), 10);
        assert!(!store.register_visit(&id, 10));
        assert_eq!(store.score(), 10);
    }

    #[test]
    fn progress_percent_is_monotonic_and_floors() {
        let hotspots = vec![dialog("a"), dialog("b"), dialog("c"), quiz("t")];
        let mut store = ProgressStore::new();
        let mut last = store.progress_percent(&hotspots);
        assert_eq!(last, 0);
        for id in ["a", "b", "c"] {
            store.register_visit(&HotspotId(id.to_string()), 5);
            let percent = store.progress_percent(&hotspots);
            assert!(percent >= last, "{percent} < {last}");
            last = percent;
        }
        assert_eq!(last, 100);

        let mut store = ProgressStore::new();
        store.register_visit(&HotspotId("a".to_string()), 5);
        assert_eq!(store.progress_percent(&hotspots), 33);
    }

    #[test]
    fn empty_required_set_is_vacuously_complete() {
        let store = ProgressStore::new();
        assert_eq!(store.progress_percent(&[]), 100);
        assert_eq!(store.progress_percent(&[quiz("t")]), 100);
        assert!(store.is_scene_fully_explored(&scene("empty", vec![quiz("t")])));
    }

    #[test]
    fn full_exploration_ignores_quiz_hotspots() {
        let scene = scene("relay_hall", vec![dialog("a"), dialog("b"), quiz("t")]);
        let mut store = ProgressStore::new();
        store.register_visit(&HotspotId("a".to_string()), 10);
        assert!(!store.is_scene_fully_explored(&scene));
        store.register_visit(&HotspotId("b".to_string()), 10);
        assert!(store.is_scene_fully_explored(&scene));
    }

    #[test]
    fn reset_scene_only_touches_that_scene() {
        let hall = scene("hall", vec![dialog("a"), dialog("b")]);
        let archive = scene("archive", vec![dialog("x")]);
        let mut store = ProgressStore::new();
        store.register_visit(&HotspotId("a".to_string()), 10);
        store.register_visit(&HotspotId("b".to_string()), 10);
        store.register_visit(&HotspotId("x".to_string()), 10);
        store.mark_event_triggered(&hall.id);
        store.mark_event_triggered(&archive.id);

        store.reset_scene(&hall);

        assert!(!store.has_visited(&HotspotId("a".to_string())));
        assert!(!store.has_visited(&HotspotId("b".to_string())));
        assert!(store.has_visited(&HotspotId("x".to_string())));
        assert!(!store.event_triggered(&hall.id));
        assert!(store.event_triggered(&archive.id));
        assert_eq!(store.score(), 30, "score earned elsewhere must survive");
    }

    #[test]
    fn reset_scene_allows_rewards_again() {
        let hall = scene("hall", vec![dialog("a")]);
        let mut store = ProgressStore::new();
        store.register_visit(&HotspotId("a".to_string()), 10);
        store.reset_scene(&hall);
        assert!(store.register_visit(&HotspotId("a".to_string()), 10));
        assert_eq!(store.score(), 20);
    }

    #[test]
    fn full_reset_clears_everything() {
        let mut store = ProgressStore::new();
        store.register_visit(&HotspotId("a".to_string()), 10);
        store.mark_event_triggered(&SceneId("hall".to_string()));
        store.enter_scene(&SceneId("hall".to_string()));
        store.reset();
        assert_eq!(store.score(), 0);
        assert!(!store.has_visited(&HotspotId("a".to_string())));
        assert!(!store.event_triggered(&SceneId("hall".to_string())));
        assert!(store.current_scene().is_none());
    }

    #[test]
    fn score_additions_saturate() {
        let mut store = ProgressStore::new();
        store.add_score(u32::MAX);
        store.add_score(10);
        assert_eq!(store.score(), u32::MAX);
    }
}
