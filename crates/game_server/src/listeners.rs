//! Built-in declarative listeners attached during boot.

use crate::context::ServerContext;
use crate::events::{PlayerJoinedEvent, PlayerLeftEvent, PlayerLoginEvent};
use palisade_event_system::{Listen, ListenOrder, Listener, Subscription};
use std::sync::{Arc, Weak};
use tracing::info;

/// Cancels logins once the server is at its player cap.
///
/// Runs in the `Early` band so later handlers (and the admission itself) see
/// the final verdict. Holds the context weakly; if the server is gone the
/// guard just lets events through.
pub struct CapacityGuard {
    context: Weak<ServerContext>,
}

impl CapacityGuard {
    pub fn new(context: &Arc<ServerContext>) -> Arc<Self> {
        Arc::new(Self {
            context: Arc::downgrade(context),
        })
    }
}

impl Listener for CapacityGuard {
    fn name(&self) -> &str {
        "capacity_guard"
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        let guard = Arc::clone(&self);
        vec![Subscription::new(
            Listen::order(ListenOrder::Early),
            "capacity_guard::check_capacity",
            move |event: &PlayerLoginEvent| {
                let Some(context) = guard.context.upgrade() else {
                    return Ok(());
                };
                if context.is_full() {
                    event.cancelled.set_cancelled(true);
                    info!(
                        "🚧 rejecting login of '{}', server is full ({}/{})",
                        event.player.name,
                        context.online_count(),
                        context.max_players()
                    );
                }
                Ok(())
            },
        )]
    }
}

/// Announces joins and departures with the current occupancy.
///
/// Runs in the `Monitor` band, observation only.
pub struct ConnectionAnnouncer {
    context: Weak<ServerContext>,
}

impl ConnectionAnnouncer {
    pub fn new(context: &Arc<ServerContext>) -> Arc<Self> {
        Arc::new(Self {
            context: Arc::downgrade(context),
        })
    }

    fn occupancy(&self) -> Option<(usize, u32)> {
        let context = self.context.upgrade()?;
        Some((context.online_count(), context.max_players()))
    }
}

impl Listener for ConnectionAnnouncer {
    fn name(&self) -> &str {
        "connection_announcer"
    }

    fn subscriptions(self: Arc<Self>) -> Vec<Subscription> {
        let on_join = Arc::clone(&self);
        let on_leave = Arc::clone(&self);
        vec![
            Subscription::new(
                Listen::order(ListenOrder::Monitor),
                "connection_announcer::on_join",
                move |event: &PlayerJoinedEvent| {
                    if let Some((online, max)) = on_join.occupancy() {
                        info!("🔗 {} joined ({online}/{max})", event.player.name);
                    }
                    Ok(())
                },
            ),
            Subscription::new(
                Listen::order(ListenOrder::Monitor),
                "connection_announcer::on_leave",
                move |event: &PlayerLeftEvent| {
                    if let Some((online, max)) = on_leave.occupancy() {
                        info!("❌ {} left ({online}/{max})", event.player.name);
                    }
                    Ok(())
                },
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Location, Player, PlayerId};
    use palisade_event_system::create_event_bus;

    #[test]
    fn test_capacity_guard_cancels_login_when_full() {
        let context = Arc::new(ServerContext::new(
            create_event_bus(),
            "small server",
            1,
            Location::new("overworld", 0.0, 64.0, 0.0),
        ));
        context
            .events()
            .register_listener(CapacityGuard::new(&context))
            .unwrap();

        let steve = Arc::new(Player::new(PlayerId::new(), "steve"));
        let alex = Arc::new(Player::new(PlayerId::new(), "alex"));

        assert!(context.admit_player(steve));
        // Cap reached; the guard must cancel the second login.
        assert!(!context.admit_player(Arc::clone(&alex)));
        assert_eq!(context.online_count(), 1);
        assert!(context.player_by_name("alex").is_none());
    }

    #[test]
    fn test_capacity_guard_admits_again_after_departure() {
        let context = Arc::new(ServerContext::new(
            create_event_bus(),
            "small server",
            1,
            Location::new("overworld", 0.0, 64.0, 0.0),
        ));
        context
            .events()
            .register_listener(CapacityGuard::new(&context))
            .unwrap();

        let steve = Arc::new(Player::new(PlayerId::new(), "steve"));
        let steve_id = steve.id;
        let alex = Arc::new(Player::new(PlayerId::new(), "alex"));

        assert!(context.admit_player(steve));
        context.expel_player(steve_id);
        assert!(context.admit_player(alex));
    }
}
