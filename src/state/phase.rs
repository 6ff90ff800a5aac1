use serde::{Deserialize, Serialize};

/// High-level phases the game can be in, as announced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Virtual players are enrolling (QR code on the TV).
    Enroll,
    /// A question was selected and buzzers are being pinged.
    Prepare,
    /// Every buzzer answered the ping; the question can be started.
    Ready,
    /// Pre-start countdown sub-phase announced by START.
    Countdown,
    /// Question is running, buzzers enabled.
    #[serde(alias = "START")]
    Started,
    /// Question paused by the game master or by a buzz.
    #[serde(alias = "PAUSE")]
    Paused,
    /// Question stopped; the last question is kept for review.
    #[default]
    #[serde(alias = "STOP")]
    Stopped,
    /// Answer revealed on every display.
    Revealed,
}

impl Phase {
    /// Whether buzzers may currently be pressed.
    pub fn is_running(self) -> bool {
        matches!(self, Phase::Countdown | Phase::Started)
    }

    /// Whether a question is loaded and shown, from selection through reveal.
    pub fn shows_question(self) -> bool {
        !matches!(self, Phase::Enroll)
    }

    /// Check a transition against the nominal game flow.
    ///
    /// The server is authoritative, so an unexpected transition is still applied; this only
    /// feeds diagnostics.
    pub fn is_expected_transition(self, next: Phase) -> bool {
        if self == next {
            return true;
        }
        match (self, next) {
            (Phase::Enroll, Phase::Prepare | Phase::Ready | Phase::Stopped) => true,
            (Phase::Prepare, Phase::Ready | Phase::Stopped) => true,
            (Phase::Ready, Phase::Countdown | Phase::Started | Phase::Prepare | Phase::Stopped) => {
                true
            }
            (Phase::Countdown, Phase::Started | Phase::Paused | Phase::Stopped) => true,
            (Phase::Started, Phase::Paused | Phase::Stopped | Phase::Revealed) => true,
            (Phase::Paused, Phase::Started | Phase::Stopped | Phase::Revealed) => true,
            (Phase::Stopped, Phase::Revealed | Phase::Prepare | Phase::Ready | Phase::Enroll) => {
                true
            }
            (Phase::Revealed, Phase::Prepare | Phase::Ready | Phase::Stopped | Phase::Enroll) => {
                true
            }
            _ => false,
        }
    }
}

/// What the TV display is currently asked to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RemoteMode {
    /// Live question view.
    #[default]
    Game,
    /// Team scoreboard.
    Score,
    /// Individual player scoreboard.
    Players,
    /// Per-category winners.
    Palmares,
}
