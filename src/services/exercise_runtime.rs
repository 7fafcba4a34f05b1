use crate::domain::exercise::{ExercisePlayer, PlayerError, PlayerView, TickOutcome};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// A player plus the one-second ticker that drives it while running.
pub struct ExerciseSession {
    player: Arc<Mutex<ExercisePlayer>>,
    ticker: Option<JoinHandle<()>>,
    pub last_active: DateTime<Utc>,
}

impl ExerciseSession {
    pub fn new(player: ExercisePlayer) -> Self {
        Self {
            player: Arc::new(Mutex::new(player)),
            ticker: None,
            last_active: Utc::now(),
        }
    }

    pub async fn view(&self) -> PlayerView {
        self.player.lock().await.view()
    }

    pub async fn start(&mut self) -> Result<PlayerView, PlayerError> {
        self.touch();
        let view = {
            let mut player = self.player.lock().await;
            player.start()?;
            player.view()
        };
        self.spawn_ticker();
        Ok(view)
    }

    pub async fn pause(&mut self) -> Result<PlayerView, PlayerError> {
        self.touch();
        let mut player = self.player.lock().await;
        player.pause()?;
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        Ok(player.view())
    }

    pub async fn resume(&mut self) -> Result<PlayerView, PlayerError> {
        self.touch();
        let view = {
            let mut player = self.player.lock().await;
            player.resume()?;
            player.view()
        };
        self.spawn_ticker();
        Ok(view)
    }

    pub async fn reset(&mut self) -> PlayerView {
        self.touch();
        self.stop_ticker();
        let mut player = self.player.lock().await;
        player.reset();
        player.view()
    }

    pub async fn toggle_audio(&mut self) -> PlayerView {
        self.touch();
        let mut player = self.player.lock().await;
        player.toggle_audio();
        player.view()
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.as_ref().map_or(false, |h| !h.is_finished())
    }

    fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    fn spawn_ticker(&mut self) {
        self.stop_ticker();
        let player = self.player.clone();
        self.ticker = Some(tokio::spawn(run_ticker(player)));
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for ExerciseSession {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

async fn run_ticker(player: Arc<Mutex<ExercisePlayer>>) {
    let mut interval = interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
    loop {
        interval.tick().await;
        let mut player = player.lock().await;
        match player.tick() {
            Ok(TickOutcome::Counting) => {}
            Ok(TickOutcome::Advanced(step)) => {
                tracing::debug!("{}: step {} started", player.exercise().slug, step + 1);
            }
            Ok(TickOutcome::Completed) => {
                tracing::info!("{}: exercise completed", player.exercise().slug);
                break;
            }
            Err(e) => {
                tracing::debug!("ticker stopped: {}", e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exercise::{find_exercise, PlayerStatus, TracingNarrator};

    fn session(slug: &str) -> ExerciseSession {
        let exercise = find_exercise(slug).unwrap();
        ExerciseSession::new(ExercisePlayer::new(exercise, Arc::new(TracingNarrator)))
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_counts_down_once_per_second() {
        let mut s = session("deep-breathing-exercises");
        s.start().await.unwrap();
        assert!(s.is_ticking());

        tokio::time::sleep(Duration::from_millis(3_500)).await;
        let view = s.view().await;
        assert_eq!(view.current_step, 0);
        assert_eq!(view.time_remaining, 27);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_stops_the_clock() {
        let mut s = session("deep-breathing-exercises");
        s.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        let paused = s.pause().await.unwrap();
        assert_eq!(paused.status, PlayerStatus::Paused);
        assert!(!s.is_ticking());

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(s.view().await.time_remaining, 28);

        s.resume().await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(s.view().await.time_remaining, 27);
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_runs_the_exercise_to_completion() {
        let mut s = session("deep-breathing-exercises");
        s.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(45)).await;
        let view = s.view().await;
        assert_eq!(view.status, PlayerStatus::Completed);
        assert!(!s.is_ticking());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_aborts_the_ticker() {
        let mut s = session("mindfulness-for-beginners");
        s.start().await.unwrap();
        let view = s.reset().await;
        assert_eq!(view.status, PlayerStatus::Idle);
        assert!(s.ticker.is_none());
        assert!(s.pause().await.is_err());
    }
}
