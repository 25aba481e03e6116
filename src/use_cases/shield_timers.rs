// Per-player shield countdowns that report back into the world task's event queue.

use super::types::GameEvent;
use crate::domain::PlayerId;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

struct ArmedShield {
    token: u64,
    task: JoinHandle<()>,
}

/// At most one live timer per player. Expiries are delivered as `GameEvent::ShieldExpired`
/// and are only honoured if their token still matches the armed timer.
pub struct ShieldTimers {
    events_tx: mpsc::Sender<GameEvent>,
    armed: HashMap<PlayerId, ArmedShield>,
    next_token: u64,
}

impl ShieldTimers {
    pub fn new(events_tx: mpsc::Sender<GameEvent>) -> Self {
        Self {
            events_tx,
            armed: HashMap::new(),
            next_token: 1,
        }
    }

    /// Starts a countdown for `player_id`, replacing any timer already armed for it.
    pub fn arm(&mut self, player_id: PlayerId, duration: Duration) -> u64 {
        self.cancel(player_id);

        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1);

        let events_tx = self.events_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            // The world task may already be gone during shutdown.
            let _ = events_tx
                .send(GameEvent::ShieldExpired { player_id, token })
                .await;
        });

        self.armed.insert(player_id, ArmedShield { token, task });
        debug!(
            player_id,
            token,
            duration_ms = duration.as_millis(),
            "shield timer armed"
        );
        token
    }

    /// Stops the timer for `player_id`. An expiry already queued is discarded later by
    /// `take_expired` because its token is forgotten here.
    pub fn cancel(&mut self, player_id: PlayerId) -> bool {
        match self.armed.remove(&player_id) {
            Some(armed) => {
                armed.task.abort();
                debug!(player_id, token = armed.token, "shield timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Consumes an expiry notification. Returns false for stale or cancelled tokens.
    pub fn take_expired(&mut self, player_id: PlayerId, token: u64) -> bool {
        match self.armed.get(&player_id) {
            Some(armed) if armed.token == token => {
                self.armed.remove(&player_id);
                true
            }
            _ => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn token(&self, player_id: PlayerId) -> Option<u64> {
        self.armed.get(&player_id).map(|armed| armed.token)
    }

    pub fn cancel_all(&mut self) {
        for (_, armed) in self.armed.drain() {
            armed.task.abort();
        }
    }
}

impl Drop for ShieldTimers {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    const WINDOW: Duration = Duration::from_millis(40);
    const GRACE: Duration = Duration::from_millis(400);

    async fn next_expiry(
        rx: &mut mpsc::Receiver<GameEvent>,
        within: Duration,
    ) -> Option<(PlayerId, u64)> {
        match timeout(within, rx.recv()).await {
            Ok(Some(GameEvent::ShieldExpired { player_id, token })) => Some((player_id, token)),
            _ => None,
        }
    }

    #[tokio::test]
    async fn armed_timer_posts_its_token_after_the_window() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timers = ShieldTimers::new(tx);

        let token = timers.arm(2, WINDOW);

        assert_eq!(next_expiry(&mut rx, GRACE).await, Some((2, token)));
        assert!(timers.take_expired(2, token));
        assert_eq!(timers.token(2), None);
    }

    #[tokio::test]
    async fn cancelled_timer_never_fires() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timers = ShieldTimers::new(tx);

        timers.arm(1, WINDOW);
        assert!(timers.cancel(1));

        assert_eq!(next_expiry(&mut rx, WINDOW * 4).await, None);
        assert!(!timers.cancel(1));
    }

    #[tokio::test]
    async fn rearming_replaces_the_previous_countdown() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timers = ShieldTimers::new(tx);

        let first = timers.arm(1, WINDOW);
        let second = timers.arm(1, WINDOW * 3);

        assert_ne!(first, second);
        let fired = next_expiry(&mut rx, GRACE).await;
        assert_eq!(fired, Some((1, second)));
    }

    #[tokio::test]
    async fn stale_tokens_are_rejected() {
        let (tx, _rx) = mpsc::channel(8);
        let mut timers = ShieldTimers::new(tx);

        let old = timers.arm(1, Duration::from_secs(60));
        timers.cancel(1);
        let current = timers.arm(1, Duration::from_secs(60));

        assert!(!timers.take_expired(1, old));
        assert_eq!(timers.token(1), Some(current));
        assert!(!timers.take_expired(2, current));
    }

    #[tokio::test]
    async fn timers_are_independent_per_player() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut timers = ShieldTimers::new(tx);

        timers.arm(1, Duration::from_secs(60));
        let token = timers.arm(2, WINDOW);
        timers.cancel(1);

        assert_eq!(next_expiry(&mut rx, GRACE).await, Some((2, token)));
    }
}
