//! The showroom view state machine.
//!
//! | Action           | Guard                        | Visual  | History |
//! |------------------|------------------------------|---------|---------|
//! | `RotateTo(f)`    | `f` differs, not locked      | rotate  | -       |
//! | `RotateNext/Prev`| not locked                   | rotate  | -       |
//! | `ShowApartment`  | lock policy                  | rotate if the facade changes | push |
//! | `EnterApartment` | apartment selected           | zoom in | push    |
//! | `ShowRoom`       | lock policy                  | fade    | push    |
//! | `GoBack`         | history not empty            | fade    | pop     |
//! | `Reset`          | -                            | -       | cleared |
//!
//! Every transition start hands out a fresh [`TransitionToken`] and schedules
//! a [`ShowroomAction::TransitionSettled`] carrying it. Only the settle for
//! the running transition unlocks; older ones are dropped.

use crate::facade::FacadeId;
use crate::state::{
    HistoryEntry, RoomType, ShowroomAction, ShowroomState, ShowroomView, Transition,
    TransitionToken, TransitionType,
};
use showroom_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
use std::time::Duration;
use tracing::debug;

/// Settle time of the reference front-end's CSS transitions
pub const DEFAULT_SETTLE_DURATION: Duration = Duration::from_millis(800);

/// Which actions the transition lock blocks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LockPolicy {
    /// Every navigation action is ignored while a transition runs
    #[default]
    AllNavigation,
    /// Only rotation checks the lock; drill-down and back navigation do not
    RotationOnly,
}

impl LockPolicy {
    /// Whether `action` is ignored while a transition runs
    #[must_use]
    pub const fn blocks(self, action: &ShowroomAction) -> bool {
        match self {
            Self::AllNavigation => action.is_navigation(),
            Self::RotationOnly => action.is_rotation(),
        }
    }
}

/// Showroom dependencies
#[derive(Clone, Debug)]
pub struct ShowroomEnvironment {
    /// How long a transition stays locked
    pub settle_duration: Duration,
    /// Which actions the lock blocks
    pub lock_policy: LockPolicy,
    /// Building pre-selected by the initial state
    pub initial_building_id: Option<String>,
}

impl Default for ShowroomEnvironment {
    fn default() -> Self {
        Self {
            settle_duration: DEFAULT_SETTLE_DURATION,
            lock_policy: LockPolicy::default(),
            initial_building_id: None,
        }
    }
}

/// Effects returned by the showroom reducer
pub type ShowroomEffects = SmallVec<[Effect<ShowroomAction>; 4]>;

/// Reducer for [`ShowroomState`]
#[derive(Clone, Copy, Debug, Default)]
pub struct ShowroomReducer;

impl Reducer for ShowroomReducer {
    type State = ShowroomState;
    type Action = ShowroomAction;
    type Environment = ShowroomEnvironment;

    fn reduce(
        &self,
        state: &mut ShowroomState,
        action: ShowroomAction,
        env: &ShowroomEnvironment,
    ) -> ShowroomEffects {
        if state.is_transitioning() && env.lock_policy.blocks(&action) {
            debug!(?action, "Ignored while transitioning");
            return smallvec![Effect::None];
        }

        let effect = match action {
            ShowroomAction::RotateTo(facade) => rotate_to(state, facade, env),
            ShowroomAction::RotateNext => {
                if state.is_transitioning() {
                    None
                } else {
                    let target = state.current_facade.next();
                    rotate_to(state, target, env)
                }
            },
            ShowroomAction::RotatePrev => {
                if state.is_transitioning() {
                    None
                } else {
                    let target = state.current_facade.prev();
                    rotate_to(state, target, env)
                }
            },
            ShowroomAction::ShowApartment {
                building_id,
                apartment_id,
                floor_id,
                facade,
            } => {
                let rotation = rotate_to(state, facade, env);
                navigate_to(state, ShowroomView::FacadeHighlight);
                if building_id.is_some() {
                    state.selected_building_id = building_id;
                }
                state.selected_apartment_id = Some(apartment_id);
                state.selected_floor_id = Some(floor_id);
                state.selected_room = None;
                rotation
            },
            ShowroomAction::EnterApartment => {
                if state.selected_apartment_id.is_none() {
                    debug!("EnterApartment without a selected apartment");
                    None
                } else {
                    navigate_to(state, ShowroomView::FloorPlan);
                    state.selected_room = None;
                    Some(start_transition(state, TransitionType::ZoomIn, env))
                }
            },
            ShowroomAction::ShowRoom(room) => {
                navigate_to(state, ShowroomView::Panorama);
                state.selected_room = Some(room);
                Some(start_transition(state, TransitionType::Fade, env))
            },
            ShowroomAction::GoBack => go_back(state, env),
            ShowroomAction::Reset => {
                let next_token = state.next_token;
                *state = ShowroomState::initial(env.initial_building_id.clone());
                state.next_token = next_token;
                None
            },
            ShowroomAction::TransitionSettled { token } => {
                settle(state, token);
                None
            },
        };

        smallvec![effect.unwrap_or(Effect::None)]
    }
}

fn rotate_to(
    state: &mut ShowroomState,
    facade: FacadeId,
    env: &ShowroomEnvironment,
) -> Option<Effect<ShowroomAction>> {
    if state.current_facade == facade || state.is_transitioning() {
        return None;
    }

    state.previous_facade = Some(state.current_facade);
    state.current_facade = facade;
    Some(start_transition(state, TransitionType::Rotate, env))
}

/// Moves to `view` keeping the history free of the current view: staying put
/// records nothing, returning to a view on the stack unwinds back to it.
fn navigate_to(state: &mut ShowroomState, view: ShowroomView) {
    if state.current_view == view {
        return;
    }

    if let Some(index) = state.history.iter().position(|entry| entry.view == view) {
        state.history.truncate(index);
    } else {
        state.history.push(HistoryEntry {
            view: state.current_view,
            room: room_for(state.current_view, state.selected_room),
        });
    }
    state.current_view = view;
}

fn go_back(
    state: &mut ShowroomState,
    env: &ShowroomEnvironment,
) -> Option<Effect<ShowroomAction>> {
    let entry = state.history.pop()?;

    state.current_view = entry.view;
    match entry.view {
        ShowroomView::Building => {
            state.selected_apartment_id = None;
            state.selected_floor_id = None;
            state.selected_room = None;
        },
        ShowroomView::FacadeHighlight | ShowroomView::FloorPlan => {
            state.selected_room = None;
        },
        ShowroomView::Panorama => {
            state.selected_room = entry.room;
        },
    }

    Some(start_transition(state, TransitionType::Fade, env))
}

fn start_transition(
    state: &mut ShowroomState,
    kind: TransitionType,
    env: &ShowroomEnvironment,
) -> Effect<ShowroomAction> {
    let token = TransitionToken(state.next_token);
    state.next_token = state.next_token.wrapping_add(1);
    state.transition = Some(Transition { kind, token });

    Effect::Delay {
        duration: env.settle_duration,
        action: Box::new(ShowroomAction::TransitionSettled { token }),
    }
}

fn settle(state: &mut ShowroomState, token: TransitionToken) {
    if state.transition_token() == Some(token) {
        state.transition = None;
    } else {
        debug!(?token, "Dropped stale transition settle");
    }
}

const fn room_for(view: ShowroomView, room: Option<RoomType>) -> Option<RoomType> {
    match view {
        ShowroomView::Panorama => room,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)] // Test code

    use super::*;
    use showroom_testing::{ReducerTest, assertions};

    fn env() -> ShowroomEnvironment {
        ShowroomEnvironment::default()
    }

    fn rotation_only() -> ShowroomEnvironment {
        ShowroomEnvironment {
            lock_policy: LockPolicy::RotationOnly,
            ..ShowroomEnvironment::default()
        }
    }

    fn show(apartment_id: &str, facade: FacadeId) -> ShowroomAction {
        ShowroomAction::ShowApartment {
            building_id: Some("building-a".to_string()),
            apartment_id: apartment_id.to_string(),
            floor_id: "floor-1".to_string(),
            facade,
        }
    }

    /// Applies `action` and settles whatever transition it started.
    fn step(state: &mut ShowroomState, action: ShowroomAction, env: &ShowroomEnvironment) {
        let _ = ShowroomReducer.reduce(state, action, env);
        if let Some(token) = state.transition_token() {
            let _ = ShowroomReducer.reduce(state, ShowroomAction::TransitionSettled { token }, env);
        }
    }

    #[test]
    fn test_rotate_next_starts_rotation() {
        ReducerTest::new(ShowroomReducer)
            .with_env(env())
            .given_state(ShowroomState::default())
            .when_action(ShowroomAction::RotateNext)
            .then_state(|state| {
                assert_eq!(state.current_facade, FacadeId::B);
                assert_eq!(state.previous_facade, Some(FacadeId::A));
                assert_eq!(state.transition_type(), TransitionType::Rotate);
                assert!(state.history.is_empty());
            })
            .then_effects(assertions::assert_has_delay_effect)
            .run();
    }

    #[test]
    fn test_rotate_to_current_facade_is_noop() {
        ReducerTest::new(ShowroomReducer)
            .with_env(env())
            .given_state(ShowroomState::default())
            .when_action(ShowroomAction::RotateTo(FacadeId::A))
            .then_state(|state| assert_eq!(*state, ShowroomState::default()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_rotation_ignored_while_transitioning() {
        ReducerTest::new(ShowroomReducer)
            .with_env(rotation_only())
            .given_state(ShowroomState::default())
            .when_action(ShowroomAction::RotateNext)
            .when_action(ShowroomAction::RotateTo(FacadeId::D))
            .then_state(|state| assert_eq!(state.current_facade, FacadeId::B))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_settle_unlocks_matching_token_only() {
        let env = env();
        let mut state = ShowroomState::default();

        let _ = ShowroomReducer.reduce(&mut state, ShowroomAction::RotateNext, &env);
        let first = state.transition_token().unwrap();
        let _ = ShowroomReducer.reduce(
            &mut state,
            ShowroomAction::TransitionSettled { token: first },
            &env,
        );
        assert!(!state.is_transitioning());

        let _ = ShowroomReducer.reduce(&mut state, ShowroomAction::RotateNext, &env);
        let second = state.transition_token().unwrap();
        assert_ne!(first, second);

        // A late settle from the first rotation must not end the second
        let _ = ShowroomReducer.reduce(
            &mut state,
            ShowroomAction::TransitionSettled { token: first },
            &env,
        );
        assert_eq!(state.transition_token(), Some(second));
    }

    #[test]
    fn test_settle_effect_carries_running_token() {
        let env = env();
        let mut state = ShowroomState::default();
        let effects = ShowroomReducer.reduce(&mut state, ShowroomAction::ShowRoom(RoomType::Kitchen), &env);

        let delayed = assertions::delayed_actions(&effects);
        assert_eq!(
            delayed,
            [&ShowroomAction::TransitionSettled {
                token: state.transition_token().unwrap()
            }]
        );
        match &effects[0] {
            Effect::Delay { duration, .. } => assert_eq!(*duration, DEFAULT_SETTLE_DURATION),
            other => panic!("expected delay, got {other:?}"),
        }
    }

    #[test]
    fn test_show_apartment_rotates_and_pushes_history() {
        ReducerTest::new(ShowroomReducer)
            .with_env(env())
            .given_state(ShowroomState::default())
            .when_action(show("apt-a2", FacadeId::C))
            .then_state(|state| {
                assert_eq!(state.current_view, ShowroomView::FacadeHighlight);
                assert_eq!(state.current_facade, FacadeId::C);
                assert_eq!(state.selected_apartment_id.as_deref(), Some("apt-a2"));
                assert_eq!(state.selected_floor_id.as_deref(), Some("floor-1"));
                assert_eq!(state.transition_type(), TransitionType::Rotate);
                assert_eq!(
                    state.history,
                    [HistoryEntry {
                        view: ShowroomView::Building,
                        room: None
                    }]
                );
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn test_show_apartment_on_current_facade_has_no_transition() {
        ReducerTest::new(ShowroomReducer)
            .with_env(env())
            .given_state(ShowroomState::default())
            .when_action(show("apt-a1", FacadeId::A))
            .then_state(|state| {
                assert_eq!(state.current_view, ShowroomView::FacadeHighlight);
                assert!(!state.is_transitioning());
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_enter_apartment_requires_selection() {
        ReducerTest::new(ShowroomReducer)
            .with_env(env())
            .given_state(ShowroomState::default())
            .when_action(ShowroomAction::EnterApartment)
            .then_state(|state| assert_eq!(*state, ShowroomState::default()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_drill_down_and_back_out() {
        let env = env();
        let mut state = ShowroomState::default();

        step(&mut state, show("apt-a1", FacadeId::A), &env);
        step(&mut state, ShowroomAction::EnterApartment, &env);
        assert_eq!(state.current_view, ShowroomView::FloorPlan);
        step(&mut state, ShowroomAction::ShowRoom(RoomType::Bedroom), &env);
        assert_eq!(state.current_view, ShowroomView::Panorama);
        assert_eq!(state.selected_room, Some(RoomType::Bedroom));

        step(&mut state, ShowroomAction::GoBack, &env);
        assert_eq!(state.current_view, ShowroomView::FloorPlan);
        assert_eq!(state.selected_room, None);

        step(&mut state, ShowroomAction::GoBack, &env);
        assert_eq!(state.current_view, ShowroomView::FacadeHighlight);
        assert_eq!(state.selected_apartment_id.as_deref(), Some("apt-a1"));

        step(&mut state, ShowroomAction::GoBack, &env);
        assert_eq!(state.current_view, ShowroomView::Building);
        assert_eq!(state.selected_apartment_id, None);
        assert_eq!(state.selected_floor_id, None);
        assert!(state.history.is_empty());
    }

    #[test]
    fn test_go_back_restores_panorama_room() {
        let env = env();
        let mut state = ShowroomState::default();

        step(&mut state, show("apt-a1", FacadeId::A), &env);
        step(&mut state, ShowroomAction::ShowRoom(RoomType::Kitchen), &env);
        step(&mut state, ShowroomAction::EnterApartment, &env);
        assert_eq!(state.selected_room, None);

        step(&mut state, ShowroomAction::GoBack, &env);
        assert_eq!(state.current_view, ShowroomView::Panorama);
        assert_eq!(state.selected_room, Some(RoomType::Kitchen));
    }

    #[test]
    fn test_revisiting_a_view_unwinds_history() {
        let env = env();
        let mut state = ShowroomState::default();

        step(&mut state, show("apt-a1", FacadeId::A), &env);
        step(&mut state, ShowroomAction::EnterApartment, &env);
        step(&mut state, show("apt-a2", FacadeId::C), &env);

        assert_eq!(state.current_view, ShowroomView::FacadeHighlight);
        assert_eq!(
            state.history,
            [HistoryEntry {
                view: ShowroomView::Building,
                room: None
            }]
        );
    }

    #[test]
    fn test_room_change_inside_panorama_pushes_nothing() {
        let env = env();
        let mut state = ShowroomState::default();

        step(&mut state, ShowroomAction::ShowRoom(RoomType::Living), &env);
        step(&mut state, ShowroomAction::ShowRoom(RoomType::Bathroom), &env);

        assert_eq!(state.selected_room, Some(RoomType::Bathroom));
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_go_back_on_empty_history_is_noop() {
        ReducerTest::new(ShowroomReducer)
            .with_env(env())
            .given_state(ShowroomState::default())
            .when_action(ShowroomAction::GoBack)
            .then_state(|state| assert_eq!(*state, ShowroomState::default()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn test_all_navigation_policy_blocks_drill_down() {
        let env = env();
        let mut state = ShowroomState::default();

        let _ = ShowroomReducer.reduce(&mut state, show("apt-a2", FacadeId::C), &env);
        let before = state.clone();
        let effects = ShowroomReducer.reduce(&mut state, ShowroomAction::EnterApartment, &env);

        assert_eq!(state, before);
        assertions::assert_no_effects(&effects);
    }

    #[test]
    fn test_rotation_only_policy_allows_drill_down() {
        let env = rotation_only();
        let mut state = ShowroomState::default();

        let _ = ShowroomReducer.reduce(&mut state, show("apt-a2", FacadeId::C), &env);
        let rotating = state.transition_token().unwrap();
        let _ = ShowroomReducer.reduce(&mut state, ShowroomAction::EnterApartment, &env);

        assert_eq!(state.current_view, ShowroomView::FloorPlan);
        assert_eq!(state.transition_type(), TransitionType::ZoomIn);
        assert_ne!(state.transition_token(), Some(rotating));
    }

    #[test]
    fn test_reset_restores_initial_state_and_ignores_late_settle() {
        let env = ShowroomEnvironment {
            initial_building_id: Some("building-a".to_string()),
            ..ShowroomEnvironment::default()
        };
        let mut state = ShowroomState::initial(Some("building-a".to_string()));

        let _ = ShowroomReducer.reduce(&mut state, show("apt-a2", FacadeId::C), &env);
        let stale = state.transition_token().unwrap();
        let _ = ShowroomReducer.reduce(&mut state, ShowroomAction::Reset, &env);

        assert_eq!(state.current_view, ShowroomView::Building);
        assert_eq!(state.current_facade, FacadeId::A);
        assert_eq!(state.selected_building_id.as_deref(), Some("building-a"));
        assert!(state.history.is_empty());
        assert!(!state.is_transitioning());

        let _ = ShowroomReducer.reduce(&mut state, ShowroomAction::RotateNext, &env);
        assert_ne!(state.transition_token(), Some(stale));
        let _ = ShowroomReducer.reduce(
            &mut state,
            ShowroomAction::TransitionSettled { token: stale },
            &env,
        );
        assert!(state.is_transitioning());
    }
}
