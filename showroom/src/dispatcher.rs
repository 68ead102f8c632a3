//! Maps typed intents onto showroom actions.
//!
//! The dispatcher is a closed match over [`Intent`]. It never fails: an intent
//! whose parameters do not resolve (no code, unknown apartment, no room) is
//! absorbed as a no-op and logged at `debug`.

use crate::ShowroomStore;
use crate::catalog::Catalog;
use crate::intent::{Intent, RotateDirection};
use crate::state::{ShowroomAction, ShowroomState};
use showroom_runtime::StoreError;
use std::sync::Arc;
use tracing::debug;

/// Turns intents into showroom actions
#[derive(Clone, Debug)]
pub struct IntentDispatcher {
    catalog: Arc<Catalog>,
}

impl IntentDispatcher {
    /// Dispatcher resolving apartment codes against `catalog`
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// The catalog codes are resolved against
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The action `intent` maps to, if any
    #[must_use]
    pub fn plan(&self, intent: &Intent) -> Option<ShowroomAction> {
        match intent {
            Intent::RotateBuilding { direction } => Some(match direction {
                RotateDirection::Next => ShowroomAction::RotateNext,
                RotateDirection::Prev => ShowroomAction::RotatePrev,
                RotateDirection::To(facade) => ShowroomAction::RotateTo(*facade),
            }),
            Intent::ShowApartment { apartment_code } => {
                let Some(code) = apartment_code else {
                    debug!("show_apartment without an apartment code");
                    return None;
                };
                let Some(location) = self.catalog.locate(code) else {
                    debug!(%code, "show_apartment for an unknown code");
                    return None;
                };
                Some(ShowroomAction::ShowApartment {
                    building_id: Some(location.building.id.clone()),
                    apartment_id: location.apartment.id.clone(),
                    floor_id: location.apartment.floor_id.clone(),
                    facade: location.apartment.facade(),
                })
            },
            Intent::EnterApartment => Some(ShowroomAction::EnterApartment),
            Intent::ShowRoom { room } => {
                if room.is_none() {
                    debug!("show_room without a recognized room");
                }
                room.map(ShowroomAction::ShowRoom)
            },
            Intent::GoBack => Some(ShowroomAction::GoBack),
            Intent::ListAvailable { .. }
            | Intent::DescribeElement { .. }
            | Intent::GeneralInfo { .. } => None,
        }
    }

    /// Send the action `intent` maps to
    ///
    /// Returns the action only if it changed the showroom. An action the
    /// reducer ignored (transition lock, nothing to go back to) yields `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store rejects the action.
    #[tracing::instrument(skip(self, store, intent), fields(intent = intent.kind()))]
    pub async fn execute(
        &self,
        store: &ShowroomStore,
        intent: &Intent,
    ) -> Result<Option<ShowroomAction>, StoreError> {
        let Some(action) = self.plan(intent) else {
            return Ok(None);
        };

        let before = store.state(ShowroomState::clone).await;
        store.send(action.clone()).await?;
        let applied = store.state(|after| changed_by_action(&before, after)).await;

        if !applied {
            debug!(?action, "Action left the showroom unchanged");
            metrics::counter!("showroom.intents.ignored", "type" => intent.kind()).increment(1);
            return Ok(None);
        }

        debug!(?action, "Dispatched");
        metrics::counter!("showroom.intents.dispatched", "type" => intent.kind()).increment(1);
        Ok(Some(action))
    }
}

/// Whether `after` differs from `before` other than by a settle
///
/// A settle only clears the running transition, so the transition is left out.
/// Transition starts still show up through `next_token`.
fn changed_by_action(before: &ShowroomState, after: &ShowroomState) -> bool {
    before.next_token != after.next_token
        || before.current_view != after.current_view
        || before.current_facade != after.current_facade
        || before.previous_facade != after.previous_facade
        || before.selected_building_id != after.selected_building_id
        || before.selected_apartment_id != after.selected_apartment_id
        || before.selected_floor_id != after.selected_floor_id
        || before.selected_room != after.selected_room
        || before.history != after.history
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Test code

    use super::*;
    use crate::catalog::test_fixtures::sample_catalog;
    use crate::facade::FacadeId;
    use crate::reducer::{ShowroomEnvironment, ShowroomReducer};
    use crate::state::{RoomType, ShowroomView};
    use showroom_runtime::Store;

    fn dispatcher() -> IntentDispatcher {
        IntentDispatcher::new(Arc::new(sample_catalog()))
    }

    fn store() -> ShowroomStore {
        Store::new(
            ShowroomState::initial(Some("building-a".to_string())),
            ShowroomReducer,
            ShowroomEnvironment::default(),
        )
    }

    fn rotate(direction: RotateDirection) -> Intent {
        Intent::RotateBuilding { direction }
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_reports_applied_action() {
        let store = store();

        let sent = dispatcher()
            .execute(&store, &rotate(RotateDirection::To(FacadeId::D)))
            .await
            .unwrap();

        assert_eq!(sent, Some(ShowroomAction::RotateTo(FacadeId::D)));
        assert_eq!(store.state(|s| s.current_facade).await, FacadeId::D);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_reports_nothing_when_locked() {
        let store = store();
        let d = dispatcher();

        d.execute(&store, &rotate(RotateDirection::Next)).await.unwrap();
        let second = d
            .execute(&store, &rotate(RotateDirection::To(FacadeId::D)))
            .await
            .unwrap();

        assert_eq!(second, None);
        let (facade, transitioning) = store
            .state(|s| (s.current_facade, s.is_transitioning()))
            .await;
        assert_eq!(facade, FacadeId::B);
        assert!(transitioning);
    }

    #[tokio::test]
    async fn test_execute_go_back_on_empty_history_reports_nothing() {
        let store = store();

        let sent = dispatcher().execute(&store, &Intent::GoBack).await.unwrap();

        assert_eq!(sent, None);
        assert_eq!(store.state(|s| s.current_view).await, ShowroomView::Building);
    }

    #[tokio::test]
    async fn test_execute_unknown_code_leaves_store_untouched() {
        let store = store();
        let before = store.state(ShowroomState::clone).await;

        let sent = dispatcher()
            .execute(
                &store,
                &Intent::ShowApartment {
                    apartment_code: Some("Z9".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(sent, None);
        assert_eq!(store.state(ShowroomState::clone).await, before);
    }

    #[test]
    fn test_rotate_plans() {
        let d = dispatcher();
        assert_eq!(
            d.plan(&Intent::RotateBuilding {
                direction: RotateDirection::Prev
            }),
            Some(ShowroomAction::RotatePrev)
        );
        assert_eq!(
            d.plan(&Intent::RotateBuilding {
                direction: RotateDirection::To(FacadeId::D)
            }),
            Some(ShowroomAction::RotateTo(FacadeId::D))
        );
    }

    #[test]
    fn test_show_apartment_resolves_code_case_insensitively() {
        let plan = dispatcher().plan(&Intent::ShowApartment {
            apartment_code: Some("a2".to_string()),
        });
        assert_eq!(
            plan,
            Some(ShowroomAction::ShowApartment {
                building_id: Some("building-a".to_string()),
                apartment_id: "apt-a2".to_string(),
                floor_id: "floor-1".to_string(),
                facade: FacadeId::C,
            })
        );
    }

    #[test]
    fn test_unresolvable_parameters_plan_nothing() {
        let d = dispatcher();
        assert_eq!(d.plan(&Intent::ShowApartment { apartment_code: None }), None);
        assert_eq!(
            d.plan(&Intent::ShowApartment {
                apartment_code: Some("Z9".to_string())
            }),
            None
        );
        assert_eq!(d.plan(&Intent::ShowRoom { room: None }), None);
    }

    #[test]
    fn test_informational_intents_plan_nothing() {
        let d = dispatcher();
        assert_eq!(d.plan(&Intent::GeneralInfo { topic: None }), None);
        assert_eq!(
            d.plan(&Intent::DescribeElement {
                element: Some("balcony".to_string())
            }),
            None
        );
        assert_eq!(
            d.plan(&Intent::ListAvailable {
                filter: crate::intent::ListFilter::default()
            }),
            None
        );
    }

    #[test]
    fn test_navigation_plans() {
        let d = dispatcher();
        assert_eq!(d.plan(&Intent::EnterApartment), Some(ShowroomAction::EnterApartment));
        assert_eq!(d.plan(&Intent::GoBack), Some(ShowroomAction::GoBack));
        assert_eq!(
            d.plan(&Intent::ShowRoom {
                room: Some(RoomType::Living)
            }),
            Some(ShowroomAction::ShowRoom(RoomType::Living))
        );
    }
}
