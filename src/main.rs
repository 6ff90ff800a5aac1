//! Headless monitor: connects to the quiz server and logs phase, question and standings changes.

use anyhow::Context;
use buzzcontrol_client::{
    ClientConfig, ClientState, ConnectionManager, ConnectionStatus,
    services::ranking::{max_score, team_standings},
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = ClientConfig::load();
    let manager = ConnectionManager::new(config).context("creating connection manager")?;
    manager.connect().context("opening connection")?;

    let mut status = manager.watch_status();
    let mut snapshots = manager.subscribe();
    let mut last = Summary::default();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = status.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *status.borrow_and_update();
                match current {
                    ConnectionStatus::Disconnected => warn!("server unreachable"),
                    other => info!(status = ?other, "connection status"),
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let summary = Summary::of(&snapshots.borrow_and_update());
                summary.log_changes(&last);
                last = summary;
            }
        }
    }

    info!("shutting down");
    manager.shutdown().await;
    Ok(())
}

/// The parts of the snapshot worth a log line.
#[derive(Debug, Default, PartialEq)]
struct Summary {
    phase: String,
    timer: u32,
    question: Option<String>,
    standings: Vec<(usize, String, i64)>,
}

impl Summary {
    fn of(state: &ClientState) -> Self {
        Self {
            phase: format!("{:?}", state.game.phase),
            timer: state.game.timer,
            question: state.game.question.as_ref().map(|q| q.id.clone()),
            standings: team_standings(state)
                .into_iter()
                .map(|ranked| (ranked.rank, ranked.item.name.clone(), ranked.item.score))
                .collect(),
        }
    }

    fn log_changes(&self, previous: &Summary) {
        if self.phase != previous.phase || self.question != previous.question {
            info!(
                phase = %self.phase,
                question = self.question.as_deref().unwrap_or("-"),
                timer = self.timer,
                "game"
            );
        } else if self.timer != previous.timer {
            debug!(timer = self.timer, "tick");
        }
        if self.standings != previous.standings {
            let top = max_score(self.standings.iter().map(|(_, _, score)| *score));
            for (rank, name, score) in &self.standings {
                info!(rank, team = %name, score, bar = score * 20 / top, "standing");
            }
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = term.recv() => {},
                }
            }
            Err(err) => {
                warn!(error = %err, "cannot listen for SIGTERM; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
