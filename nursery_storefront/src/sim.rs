//! Simulated device and shell collaborators. The demo binary runs the whole delivery flow with
//! these; tests use them to script scenarios and record side effects.
use std::{
    collections::VecDeque,
    sync::Mutex,
};

use async_trait::async_trait;
use log::*;
use nursery_common::GeoPoint;
use nursery_order_engine::traits::{LocationError, LocationProvider};

use crate::ui::{AlertSink, Choice, ConfirmationPrompt, Navigator, Screen};

//--------------------------------------  SimulatedLocator  ----------------------------------------------------------
/// A geolocation service that replays a scripted route, then keeps reporting the final point.
pub struct SimulatedLocator {
    granted: bool,
    route: Mutex<VecDeque<GeoPoint>>,
    last: Mutex<Option<GeoPoint>>,
}

impl SimulatedLocator {
    pub fn new(route: impl IntoIterator<Item = GeoPoint>) -> Self {
        Self { granted: true, route: Mutex::new(route.into_iter().collect()), last: Mutex::new(None) }
    }

    /// A device that never moves.
    pub fn fixed(position: GeoPoint) -> Self {
        Self::new([position])
    }

    /// A device whose owner refused the location permission.
    pub fn denied() -> Self {
        Self { granted: false, route: Mutex::new(VecDeque::new()), last: Mutex::new(None) }
    }
}

#[async_trait]
impl LocationProvider for SimulatedLocator {
    async fn ensure_permission(&self) -> Result<(), LocationError> {
        if self.granted {
            Ok(())
        } else {
            Err(LocationError::PermissionDenied)
        }
    }

    async fn current_position(&self) -> Result<GeoPoint, LocationError> {
        if !self.granted {
            return Err(LocationError::PermissionDenied);
        }
        let next = self.route.lock().expect("route lock poisoned").pop_front();
        let mut last = self.last.lock().expect("last-fix lock poisoned");
        match next.or(*last) {
            Some(p) => {
                *last = Some(p);
                Ok(p)
            },
            None => Err(LocationError::Unavailable("no fix yet".to_string())),
        }
    }
}

/// A straight-line route from `from` to `to` in `steps` hops, endpoint included. Good enough for
/// a simulated courier; nobody is grading the geodesics.
pub fn route_between(from: GeoPoint, to: GeoPoint, steps: usize) -> Vec<GeoPoint> {
    let steps = steps.max(1);
    (1..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            GeoPoint::new(
                from.latitude + (to.latitude - from.latitude) * t,
                from.longitude + (to.longitude - from.longitude) * t,
            )
        })
        .collect()
}

//--------------------------------------  ScriptedPrompt  ------------------------------------------------------------
/// Answers confirmation prompts from a script, falling back to a fixed choice when the script
/// runs out.
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<Choice>>,
    fallback: Choice,
}

impl ScriptedPrompt {
    pub fn new(fallback: Choice) -> Self {
        Self { answers: Mutex::new(VecDeque::new()), fallback }
    }

    pub fn with_answers(fallback: Choice, answers: impl IntoIterator<Item = Choice>) -> Self {
        Self { answers: Mutex::new(answers.into_iter().collect()), fallback }
    }
}

#[async_trait]
impl ConfirmationPrompt for ScriptedPrompt {
    async fn confirm(&self, title: &str, _message: &str) -> Choice {
        let choice = self.answers.lock().expect("answers lock poisoned").pop_front().unwrap_or(self.fallback);
        debug!("💬️ Prompt '{title}' answered with {choice:?}");
        choice
    }
}

//--------------------------------------  RecordingNavigator  --------------------------------------------------------
#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    Navigate(Screen),
    Back,
}

/// Records every navigation command and logs it in place of a real router.
#[derive(Default)]
pub struct RecordingNavigator {
    events: Mutex<Vec<NavEvent>>,
}

impl RecordingNavigator {
    pub fn events(&self) -> Vec<NavEvent> {
        self.events.lock().expect("navigation lock poisoned").clone()
    }

    pub fn last(&self) -> Option<NavEvent> {
        self.events.lock().expect("navigation lock poisoned").last().cloned()
    }
}

#[async_trait]
impl Navigator for RecordingNavigator {
    async fn navigate(&self, screen: Screen) {
        info!("🧭️ Navigating to {screen:?}");
        self.events.lock().expect("navigation lock poisoned").push(NavEvent::Navigate(screen));
    }

    async fn go_back(&self) {
        info!("🧭️ Navigating back");
        self.events.lock().expect("navigation lock poisoned").push(NavEvent::Back);
    }
}

//--------------------------------------  RecordingAlerts  -----------------------------------------------------------
/// Collects user alerts and logs them in place of a real dialog.
#[derive(Default)]
pub struct RecordingAlerts {
    entries: Mutex<Vec<(String, String)>>,
}

impl RecordingAlerts {
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries.lock().expect("alerts lock poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.entries.lock().expect("alerts lock poisoned").len()
    }
}

#[async_trait]
impl AlertSink for RecordingAlerts {
    async fn alert(&self, title: &str, message: &str) {
        info!("🔔️ {title}: {message}");
        self.entries.lock().expect("alerts lock poisoned").push((title.to_string(), message.to_string()));
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn routes_end_at_the_destination() {
        let from = GeoPoint::new(15.590386, 73.810582);
        let to = GeoPoint::new(15.598293, 73.807998);
        let route = route_between(from, to, 5);
        assert_eq!(route.len(), 5);
        assert_eq!(*route.last().unwrap(), to);
        // Monotonically closing in on the destination.
        for pair in route.windows(2) {
            assert!(pair[1].distance_m(&to) < pair[0].distance_m(&to));
        }
    }
}
