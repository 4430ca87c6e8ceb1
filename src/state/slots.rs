use super::dispatcher::AiKind;
use leptos::prelude::*;
use std::collections::HashMap;

/// UI locations that can host one AI request at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum SlotId {
    Chat,
    EditorPanel,
    Planner,
    QuizGenerator,
}

/// Monotonic across all slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct RequestId(pub u64);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum SlotState {
    #[default]
    Idle,
    InFlight { id: RequestId, kind: AiKind },
}

/// Per-slot `Idle | InFlight { id, kind }` machine. Reads are tracked so buttons bound
/// to a slot re-render when it flips.
#[derive(Clone, Copy)]
pub(crate) struct SlotTracker {
    states: RwSignal<HashMap<SlotId, SlotState>>,
    last_id: RwSignal<u64>,
}

impl SlotTracker {
    pub fn new() -> Self {
        Self {
            states: RwSignal::new(HashMap::new()),
            last_id: RwSignal::new(0),
        }
    }

    /// Claims `slot`. `None` while another request holds it: callers drop the
    /// new request, they never queue it.
    pub fn try_begin(&self, slot: SlotId, kind: AiKind) -> Option<SlotGuard> {
        if self.is_in_flight_untracked(slot) {
            tracing::debug!(%slot, %kind, "slot busy; request ignored");
            return None;
        }

        let id = RequestId(self.last_id.get_untracked().saturating_add(1));
        self.last_id.set(id.0);
        self.states.update(|m| {
            m.insert(slot, SlotState::InFlight { id, kind });
        });

        Some(SlotGuard {
            tracker: *self,
            slot,
            id,
        })
    }

    /// Clears `slot` only if `id` is still the request holding it.
    fn finish(&self, slot: SlotId, id: RequestId) {
        if self.is_current(slot, id) {
            self.states.update(|m| {
                m.insert(slot, SlotState::Idle);
            });
        }
    }

    /// Returns every slot to idle. Guards still held become stale: their
    /// drop is a no-op and [`SlotTracker::is_current`] turns false for them.
    pub fn release_all(&self) {
        let held = self.states.with_untracked(|m| {
            m.values()
                .filter(|s| matches!(s, SlotState::InFlight { .. }))
                .count()
        });
        if held > 0 {
            tracing::debug!(held, "releasing in-flight slots");
        }
        self.states.update(|m| m.clear());
    }

    pub fn is_current(&self, slot: SlotId, id: RequestId) -> bool {
        matches!(self.state_untracked(slot), SlotState::InFlight { id: cur, .. } if cur == id)
    }

    pub fn state(&self, slot: SlotId) -> SlotState {
        self.states.with(|m| m.get(&slot).copied().unwrap_or_default())
    }

    pub fn state_untracked(&self, slot: SlotId) -> SlotState {
        self.states
            .with_untracked(|m| m.get(&slot).copied().unwrap_or_default())
    }

    pub fn is_in_flight(&self, slot: SlotId) -> bool {
        self.in_flight_kind(slot).is_some()
    }

    pub fn is_in_flight_untracked(&self, slot: SlotId) -> bool {
        matches!(self.state_untracked(slot), SlotState::InFlight { .. })
    }

    /// Tracked. What `slot` is busy with, if anything.
    pub fn in_flight_kind(&self, slot: SlotId) -> Option<AiKind> {
        match self.state(slot) {
            SlotState::InFlight { kind, .. } => Some(kind),
            SlotState::Idle => None,
        }
    }
}

impl Default for SlotTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Holds a slot in flight; dropping it returns the slot to idle, whether the
/// request finished, failed, or its future was dropped.
pub(crate) struct SlotGuard {
    tracker: SlotTracker,
    slot: SlotId,
    id: RequestId,
}

impl SlotGuard {
    pub fn slot(&self) -> SlotId {
        self.slot
    }

    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.tracker.finish(self.slot, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_begin_is_rejected_while_in_flight() {
        let slots = SlotTracker::new();
        let g = slots.try_begin(SlotId::Chat, AiKind::Chat).expect("idle slot");
        assert!(slots.try_begin(SlotId::Chat, AiKind::Chat).is_none());
        assert_eq!(
            slots.state_untracked(SlotId::Chat),
            SlotState::InFlight {
                id: g.id(),
                kind: AiKind::Chat
            }
        );

        drop(g);
        assert_eq!(slots.state_untracked(SlotId::Chat), SlotState::Idle);
        assert!(slots.try_begin(SlotId::Chat, AiKind::Chat).is_some());
    }

    #[test]
    fn test_slots_are_independent() {
        let slots = SlotTracker::new();
        let _chat = slots.try_begin(SlotId::Chat, AiKind::Chat).expect("chat idle");
        let planner = slots.try_begin(SlotId::Planner, AiKind::Plan);
        assert!(planner.is_some());
        assert!(!slots.is_in_flight_untracked(SlotId::EditorPanel));
    }

    #[test]
    fn test_request_ids_increase() {
        let slots = SlotTracker::new();
        let a = slots.try_begin(SlotId::Chat, AiKind::Chat).expect("idle").id();
        let b = slots
            .try_begin(SlotId::EditorPanel, AiKind::Summary)
            .expect("idle")
            .id();
        let c = slots
            .try_begin(SlotId::Chat, AiKind::Chat)
            .expect("idle again")
            .id();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_is_current_is_a_pure_comparison() {
        let slots = SlotTracker::new();
        let g = slots
            .try_begin(SlotId::QuizGenerator, AiKind::Questions)
            .expect("idle");
        let id = g.id();
        assert!(slots.is_current(SlotId::QuizGenerator, id));
        drop(g);
        assert!(!slots.is_current(SlotId::QuizGenerator, id));
    }

    #[test]
    fn test_held_slot_reports_its_kind() {
        let slots = SlotTracker::new();
        assert_eq!(slots.in_flight_kind(SlotId::EditorPanel), None);

        let g = slots
            .try_begin(SlotId::EditorPanel, AiKind::Explain)
            .expect("idle");
        assert_eq!(slots.in_flight_kind(SlotId::EditorPanel), Some(AiKind::Explain));
        assert_eq!(slots.in_flight_kind(SlotId::Chat), None);

        drop(g);
        assert_eq!(slots.in_flight_kind(SlotId::EditorPanel), None);
    }

    #[test]
    fn test_release_all_makes_held_guards_stale() {
        let slots = SlotTracker::new();
        let old = slots.try_begin(SlotId::Chat, AiKind::Chat).expect("idle");
        let _plan = slots.try_begin(SlotId::Planner, AiKind::Plan).expect("idle");

        slots.release_all();
        assert!(!slots.is_in_flight_untracked(SlotId::Chat));
        assert!(!slots.is_in_flight_untracked(SlotId::Planner));
        assert!(!slots.is_current(SlotId::Chat, old.id()));

        // A fresh request takes the slot; the stale guard's drop leaves it alone.
        let fresh = slots.try_begin(SlotId::Chat, AiKind::Chat).expect("released");
        drop(old);
        assert!(slots.is_current(SlotId::Chat, fresh.id()));
    }
}
