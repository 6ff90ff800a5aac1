/// Snapshot entities: game, teams, bumpers, questions.
pub mod game;
/// Game phase and remote display mode.
pub mod phase;
/// Applies inbound messages to the snapshot.
pub mod reducer;

use indexmap::IndexMap;

use self::game::{
    Bumper, ClientCounts, EnrollmentOutcome, FsInfo, GameState, LogEntry, Question, Team,
};

pub use self::reducer::reduce;

/// Number of server log lines kept locally; older lines are dropped first.
pub const MAX_LOG_ENTRIES: usize = 1000;

/// Local reconstruction of the server state, rebuilt exclusively from inbound messages.
///
/// One instance is owned by each connection manager and published to readers through a `watch`
/// channel; presentation code only ever sees immutable borrows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientState {
    /// Game-wide fields.
    pub game: GameState,
    /// Teams keyed by name, in server order.
    pub teams: IndexMap<String, Team>,
    /// Bumpers keyed by device/session id, in server order.
    pub bumpers: IndexMap<String, Bumper>,
    /// Question catalog keyed by id.
    pub questions: IndexMap<String, Question>,
    /// Connected display counters.
    pub clients: ClientCounts,
    /// Server storage usage, when reported.
    pub fs_info: Option<FsInfo>,
    /// Server version string, when reported.
    pub server_version: Option<String>,
    /// Server log lines received through the log subscription.
    pub logs: Vec<LogEntry>,
    /// Latest enrollment answer, for virtual players.
    pub enrollment: Option<EnrollmentOutcome>,
}

impl ClientState {
    /// Team a bumper plays for, `None` when unassigned or when the reference dangles.
    pub fn team_of(&self, bumper: &Bumper) -> Option<&Team> {
        bumper.team.as_deref().and_then(|name| self.teams.get(name))
    }

    /// Bumpers currently assigned to `team`.
    pub fn members<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a Bumper> + 'a {
        self.bumpers
            .values()
            .filter(move |bumper| bumper.team.as_deref() == Some(team))
    }

    /// Bumpers that have buzzed on the current question, earliest first.
    pub fn buzz_order(&self) -> Vec<&Bumper> {
        let mut buzzed: Vec<&Bumper> = self
            .bumpers
            .values()
            .filter(|bumper| bumper.buzz_time.is_some())
            .collect();
        buzzed.sort_by_key(|bumper| bumper.buzz_time);
        buzzed
    }
}
