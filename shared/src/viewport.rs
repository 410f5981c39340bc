//! Reconciles programmatic moves with the widget's own event stream.
//!
//! The widget reports idle both after a move we asked for and after the user
//! panned or zoomed. Only the latter may be reported as user navigation;
//! echoing our own moves back would loop region resolution into itself.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{zoom, Bounds, LatLng};

/// Who last authored the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewOrigin {
    #[default]
    Programmatic,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub center: LatLng,
    pub zoom_level: u8,
    pub origin: ViewOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTarget {
    pub center: LatLng,
    pub zoom_level: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    AwaitingSettle,
}

/// What the widget has to do to honor a move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveCommand {
    pub center: LatLng,
    pub native_zoom: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    DragStart,
    ZoomChanged,
}

/// Viewport as the widget reports it once it stops moving.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettledView {
    pub center: LatLng,
    pub native_zoom: f64,
    pub bounds: Option<Bounds>,
}

/// Identifies one debounce window. Only the newest ticket is honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdleTicket(u64);

impl IdleTicket {
    #[must_use]
    pub const fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UserNavigation {
    pub center: LatLng,
    pub zoom_level: u8,
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettleOutcome {
    /// The widget arrived where we sent it. Nothing to report.
    MoveCompleted { center: LatLng, zoom_level: u8 },
    UserNavigated(UserNavigation),
}

#[derive(Debug, Clone)]
pub struct ViewStateController {
    state: ViewState,
    pending: Option<ViewTarget>,
    epsilon_deg: f64,
    idle_generation: u64,
    last_idle: Option<SettledView>,
}

impl ViewStateController {
    #[must_use]
    pub fn new(initial: ViewTarget, epsilon_deg: f64) -> Self {
        Self {
            state: ViewState {
                center: initial.center,
                zoom_level: zoom::clamp_level(initial.zoom_level),
                origin: ViewOrigin::Programmatic,
            },
            pending: None,
            epsilon_deg,
            idle_generation: 0,
            last_idle: None,
        }
    }

    /// Controller for a fresh viewport. Idle tickets keep counting so a
    /// debounce started against us never fires against it.
    #[must_use]
    pub fn successor(&self, initial: ViewTarget, epsilon_deg: f64) -> Self {
        Self {
            idle_generation: self.idle_generation + 1,
            ..Self::new(initial, epsilon_deg)
        }
    }

    #[must_use]
    pub const fn state(&self) -> ViewState {
        self.state
    }

    #[must_use]
    pub const fn pending_target(&self) -> Option<ViewTarget> {
        self.pending
    }

    #[must_use]
    pub const fn phase(&self) -> SyncPhase {
        if self.pending.is_some() {
            SyncPhase::AwaitingSettle
        } else {
            SyncPhase::Idle
        }
    }

    pub fn set_epsilon(&mut self, epsilon_deg: f64) {
        self.epsilon_deg = epsilon_deg;
    }

    /// Command that re-issues the move still in flight, for a widget that
    /// was not ready when the move was requested.
    #[must_use]
    pub fn pending_command(&self) -> Option<MoveCommand> {
        self.pending.map(command_for)
    }

    /// Record a programmatic move. A move already in flight is superseded,
    /// and so is any idle still waiting out its debounce: that idle belongs
    /// to a viewport this move replaces.
    pub fn request_move(&mut self, target: ViewTarget) -> MoveCommand {
        let target = ViewTarget {
            zoom_level: zoom::clamp_level(target.zoom_level),
            ..target
        };
        if let Some(previous) = self.pending.replace(target) {
            debug!(?previous, ?target, "superseding pending move");
        }
        self.idle_generation += 1;
        self.last_idle = None;
        self.state = ViewState {
            center: target.center,
            zoom_level: target.zoom_level,
            origin: ViewOrigin::Programmatic,
        };
        command_for(target)
    }

    /// Raw widget gesture. Resets the idle debounce; without a pending move
    /// the viewport now belongs to the user.
    pub fn on_gesture(&mut self, kind: GestureKind) {
        self.idle_generation += 1;
        if self.pending.is_none() {
            debug!(?kind, "gesture takes over viewport");
            self.state.origin = ViewOrigin::User;
        }
    }

    /// Raw widget idle. Returns the ticket to hand back once the debounce
    /// delay has passed without further events.
    pub fn on_idle(&mut self, settled: SettledView) -> IdleTicket {
        self.idle_generation += 1;
        self.last_idle = Some(settled);
        IdleTicket(self.idle_generation)
    }

    /// Debounced idle. `None` when the ticket was superseded by a later
    /// widget event or was already consumed.
    pub fn on_idle_elapsed(&mut self, ticket: IdleTicket) -> Option<SettleOutcome> {
        if ticket.0 != self.idle_generation {
            debug!(ticket = ticket.0, current = self.idle_generation, "idle superseded");
            return None;
        }
        let settled = self.last_idle.take()?;

        match self.pending.take() {
            Some(target)
                if self.state.origin == ViewOrigin::Programmatic
                    && settled.center.approx_eq(target.center, self.epsilon_deg) =>
            {
                self.state.center = settled.center;
                Some(SettleOutcome::MoveCompleted {
                    center: settled.center,
                    zoom_level: self.state.zoom_level,
                })
            }
            _ => {
                let zoom_level = zoom::level_for_fractional_zoom(settled.native_zoom);
                self.state = ViewState {
                    center: settled.center,
                    zoom_level,
                    origin: ViewOrigin::User,
                };
                Some(SettleOutcome::UserNavigated(UserNavigation {
                    center: settled.center,
                    zoom_level,
                    bounds: settled.bounds,
                }))
            }
        }
    }
}

fn command_for(target: ViewTarget) -> MoveCommand {
    MoveCommand {
        center: target.center,
        native_zoom: zoom::to_native_zoom(target.zoom_level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SETTLE_EPSILON_DEG;

    const SEOUL: LatLng = LatLng::new(37.5665, 126.9780);

    fn controller() -> ViewStateController {
        ViewStateController::new(
            ViewTarget {
                center: crate::NATIONWIDE_CENTER,
                zoom_level: zoom::NATIONWIDE_LEVEL,
            },
            SETTLE_EPSILON_DEG,
        )
    }

    fn settle(controller: &mut ViewStateController, center: LatLng, native_zoom: f64) -> Option<SettleOutcome> {
        let ticket = controller.on_idle(SettledView {
            center,
            native_zoom,
            bounds: None,
        });
        controller.on_idle_elapsed(ticket)
    }

    #[test]
    fn test_programmatic_move_settles_silently() {
        let mut c = controller();
        let cmd = c.request_move(ViewTarget {
            center: SEOUL,
            zoom_level: 10,
        });
        assert_eq!(cmd.native_zoom, 12);
        assert_eq!(c.phase(), SyncPhase::AwaitingSettle);

        let outcome = settle(&mut c, LatLng::new(37.56651, 126.97801), 12.0);
        assert!(matches!(outcome, Some(SettleOutcome::MoveCompleted { zoom_level: 10, .. })));
        assert_eq!(c.phase(), SyncPhase::Idle);
        assert_eq!(c.state().origin, ViewOrigin::Programmatic);
    }

    #[test]
    fn test_user_idle_notifies_exactly_once() {
        let mut c = controller();
        let ticket = c.on_idle(SettledView {
            center: LatLng::new(37.60, 127.02),
            native_zoom: 14.0,
            bounds: None,
        });

        let first = c.on_idle_elapsed(ticket);
        let Some(SettleOutcome::UserNavigated(nav)) = first else {
            panic!("expected user navigation, got {first:?}");
        };
        assert_eq!(nav.center, LatLng::new(37.60, 127.02));
        assert_eq!(nav.zoom_level, 8);
        assert_eq!(c.state().origin, ViewOrigin::User);

        assert_eq!(c.on_idle_elapsed(ticket), None);
    }

    #[test]
    fn test_mismatched_idle_is_user_navigation() {
        let mut c = controller();
        c.request_move(ViewTarget {
            center: SEOUL,
            zoom_level: 10,
        });
        c.on_gesture(GestureKind::DragStart);
        // A gesture during the animation does not steal the viewport yet.
        assert_eq!(c.state().origin, ViewOrigin::Programmatic);

        let outcome = settle(&mut c, LatLng::new(37.60, 127.02), 12.0);
        assert!(matches!(outcome, Some(SettleOutcome::UserNavigated(_))));
        assert_eq!(c.phase(), SyncPhase::Idle);
    }

    #[test]
    fn test_later_move_supersedes_pending() {
        let mut c = controller();
        c.request_move(ViewTarget {
            center: SEOUL,
            zoom_level: 9,
        });
        let busan = LatLng::new(35.1796, 129.0756);
        c.request_move(ViewTarget {
            center: busan,
            zoom_level: 9,
        });
        assert_eq!(c.pending_target().map(|t| t.center), Some(busan));

        let outcome = settle(&mut c, busan, 13.0);
        assert!(matches!(outcome, Some(SettleOutcome::MoveCompleted { .. })));
    }

    #[test]
    fn test_move_invalidates_idle_in_debounce() {
        let mut c = controller();
        c.request_move(ViewTarget {
            center: SEOUL,
            zoom_level: 9,
        });
        let stale = c.on_idle(SettledView {
            center: SEOUL,
            native_zoom: 13.0,
            bounds: None,
        });
        let busan = LatLng::new(35.1796, 129.0756);
        c.request_move(ViewTarget {
            center: busan,
            zoom_level: 9,
        });

        assert_eq!(c.on_idle_elapsed(stale), None);
        assert_eq!(c.pending_target().map(|t| t.center), Some(busan));
        assert_eq!(c.state().origin, ViewOrigin::Programmatic);

        let outcome = settle(&mut c, busan, 13.0);
        assert!(matches!(outcome, Some(SettleOutcome::MoveCompleted { .. })));
    }

    #[test]
    fn test_debounce_is_reset_by_later_events() {
        let mut c = controller();
        let first = c.on_idle(SettledView {
            center: LatLng::new(37.0, 127.0),
            native_zoom: 12.0,
            bounds: None,
        });
        c.on_gesture(GestureKind::ZoomChanged);
        let second = c.on_idle(SettledView {
            center: LatLng::new(37.1, 127.1),
            native_zoom: 13.0,
            bounds: None,
        });

        assert_eq!(c.on_idle_elapsed(first), None);
        let outcome = c.on_idle_elapsed(second);
        assert!(matches!(
            outcome,
            Some(SettleOutcome::UserNavigated(UserNavigation { center, .. })) if center == LatLng::new(37.1, 127.1)
        ));
    }

    #[test]
    fn test_successor_ignores_earlier_tickets() {
        let mut c = controller();
        let ticket = c.on_idle(SettledView {
            center: SEOUL,
            native_zoom: 12.0,
            bounds: None,
        });

        let mut next = c.successor(
            ViewTarget {
                center: crate::NATIONWIDE_CENTER,
                zoom_level: zoom::NATIONWIDE_LEVEL,
            },
            SETTLE_EPSILON_DEG,
        );
        assert_eq!(next.on_idle_elapsed(ticket), None);
        assert_eq!(next.state().center, crate::NATIONWIDE_CENTER);
        let fresh = next.on_idle(SettledView {
            center: SEOUL,
            native_zoom: 12.0,
            bounds: None,
        });
        assert_ne!(fresh, ticket);
    }

    #[test]
    fn test_gesture_without_pending_marks_user() {
        let mut c = controller();
        c.on_gesture(GestureKind::DragStart);
        assert_eq!(c.state().origin, ViewOrigin::User);
        assert_eq!(c.phase(), SyncPhase::Idle);
    }

    #[test]
    fn test_pending_command_reissues_latest_target() {
        let mut c = controller();
        assert_eq!(c.pending_command(), None);
        let cmd = c.request_move(ViewTarget {
            center: SEOUL,
            zoom_level: 9,
        });
        assert_eq!(c.pending_command(), Some(cmd));
    }
}
