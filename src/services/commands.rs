//! Typed builders for every outbound command.
//!
//! Roster edits are sent as UPDATE commands carrying the full edited maps, rebuilt from the current
//! snapshot. The builders for those edits are plain functions so they can be checked without a
//! connection.

use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::debug;

use crate::{
    dto::{
        validation::{field_error, validate_player_name, validate_team_name, validate_unique},
        ws::{BumperRecord, ClientCommand, ClientRole, RosterUpdate, TeamRecord},
    },
    error::CommandError,
    services::connection::CommandQueue,
    state::{
        ClientState,
        game::{AnswerColor, TeamColor},
        phase::RemoteMode,
    },
};

/// Colours handed out to new teams, in order of preference.
pub const PRESET_TEAM_COLORS: [[u8; 3]; 8] = [
    [239, 68, 68],
    [249, 115, 22],
    [234, 179, 8],
    [34, 197, 94],
    [6, 182, 212],
    [99, 102, 241],
    [168, 85, 247],
    [236, 72, 153],
];

/// Command front-end bound to one connection manager.
#[derive(Clone)]
pub struct CommandSender {
    queue: CommandQueue,
    state: watch::Receiver<ClientState>,
}

impl CommandSender {
    pub(crate) fn new(queue: CommandQueue, state: watch::Receiver<ClientState>) -> Self {
        Self { queue, state }
    }

    /// Queue a raw command.
    pub fn send(&self, command: ClientCommand) -> Result<(), CommandError> {
        debug!(action = command.action(), "queueing command");
        self.queue.send(command)
    }

    /// Start the current question with a countdown of `delay` seconds worth `points`.
    pub fn start(&self, delay: u32, points: i64) -> Result<(), CommandError> {
        self.send(ClientCommand::Start { delay, points })
    }

    /// End the running question.
    pub fn stop(&self) -> Result<(), CommandError> {
        self.send(ClientCommand::Stop {})
    }

    /// Freeze the running question.
    pub fn pause(&self) -> Result<(), CommandError> {
        self.send(ClientCommand::Pause {})
    }

    /// Resume a paused question (CONTINUE).
    pub fn resume(&self) -> Result<(), CommandError> {
        self.send(ClientCommand::Continue {})
    }

    /// Show the answer.
    pub fn reveal(&self) -> Result<(), CommandError> {
        self.send(ClientCommand::Reveal {})
    }

    /// Skip the PREPARE ping round.
    pub fn force_ready(&self) -> Result<(), CommandError> {
        self.send(ClientCommand::ForceReady {})
    }

    /// Select `question_id` as the next question.
    pub fn ready(&self, question_id: &str) -> Result<(), CommandError> {
        self.send(ClientCommand::Ready {
            question: question_id.to_string(),
        })
    }

    /// Simulate a button press on a bumper.
    pub fn button(&self, bumper_id: &str, button: &str) -> Result<(), CommandError> {
        self.send(ClientCommand::Button {
            id: bumper_id.to_string(),
            button: button.to_string(),
        })
    }

    /// Answer a server ping addressed to this device.
    pub fn pong(&self, id: &str) -> Result<(), CommandError> {
        self.send(ClientCommand::Pong { id: id.to_string() })
    }

    /// Award `points` to a team as a whole.
    pub fn team_points(&self, team: &str, points: i64) -> Result<(), CommandError> {
        self.send(ClientCommand::TeamPoints {
            team: team.to_string(),
            points,
        })
    }

    /// Award `points` to one player.
    pub fn bumper_points(&self, bumper_id: &str, points: i64) -> Result<(), CommandError> {
        self.send(ClientCommand::BumperPoints {
            id: bumper_id.to_string(),
            points,
        })
    }

    /// Switch what the remote display shows.
    pub fn remote(&self, remote: RemoteMode) -> Result<(), CommandError> {
        self.send(ClientCommand::Remote { remote })
    }

    /// Announce the role of this client.
    pub fn set_client_type(&self, client_type: ClientRole) -> Result<(), CommandError> {
        self.send(ClientCommand::SetClientType { client_type })
    }

    /// Turn a memory card face up.
    pub fn flip_memory_card(&self, card_id: &str) -> Result<(), CommandError> {
        self.send(ClientCommand::FlipMemoryCard {
            card_id: card_id.to_string(),
        })
    }

    /// Remove a question from the catalog.
    pub fn delete_question(&self, id: &str) -> Result<(), CommandError> {
        self.send(ClientCommand::Delete { id: id.to_string() })
    }

    /// Show the enrollment QR code on the displays.
    pub fn show_qr_code(&self) -> Result<(), CommandError> {
        self.send(ClientCommand::ShowQrCode {})
    }

    /// Hide the enrollment QR code.
    pub fn hide_qr_code(&self) -> Result<(), CommandError> {
        self.send(ClientCommand::HideQrCode {})
    }

    /// Join as a virtual player. The name is trimmed and must be 2 to 20 characters.
    pub fn player_connect(&self, name: &str) -> Result<(), CommandError> {
        validate_player_name(name).map_err(|err| field_error("name", err))?;
        self.send(ClientCommand::PlayerConnect {
            name: name.trim().to_string(),
        })
    }

    /// Cap the number of virtual players.
    pub fn set_virtual_player_limit(&self, limit: u32) -> Result<(), CommandError> {
        self.send(ClientCommand::SetVirtualPlayerLimit { limit })
    }

    /// Start receiving server log entries.
    pub fn subscribe_logs(&self) -> Result<(), CommandError> {
        self.send(ClientCommand::SubscribeLogs {})
    }

    /// Stop receiving server log entries.
    pub fn unsubscribe_logs(&self) -> Result<(), CommandError> {
        self.send(ClientCommand::UnsubscribeLogs {})
    }

    /// Persist a new catalog order, given as question ids.
    pub fn reorder_questions(&self, order: Vec<String>) -> Result<(), CommandError> {
        self.send(ClientCommand::ReorderQuestions { order })
    }

    /// Add a team; see [`add_team`].
    pub fn add_team(&self, name: &str, color: Option<TeamColor>) -> Result<(), CommandError> {
        let update = add_team(&self.state.borrow(), name, color)?;
        self.send_roster(update)
    }

    /// Delete a team; see [`delete_team`].
    pub fn delete_team(&self, name: &str) -> Result<(), CommandError> {
        let update = delete_team(&self.state.borrow(), name)?;
        self.send_roster(update)
    }

    /// Rename a team; does nothing when the name is unchanged.
    pub fn rename_team(&self, old_name: &str, new_name: &str) -> Result<(), CommandError> {
        let update = rename_team(&self.state.borrow(), old_name, new_name)?;
        match update {
            Some(update) => self.send_roster(update),
            None => Ok(()),
        }
    }

    /// Change a team colour.
    pub fn set_team_color(&self, name: &str, color: TeamColor) -> Result<(), CommandError> {
        let update = set_team_color(&self.state.borrow(), name, color)?;
        self.send_roster(update)
    }

    /// Rename a bumper.
    pub fn rename_bumper(&self, bumper_id: &str, name: &str) -> Result<(), CommandError> {
        let update = rename_bumper(&self.state.borrow(), bumper_id, name)?;
        self.send_roster(update)
    }

    /// Move a bumper to `team`, or unassign it with `None`.
    pub fn assign_bumper(&self, bumper_id: &str, team: Option<&str>) -> Result<(), CommandError> {
        let update = assign_bumper(&self.state.borrow(), bumper_id, team)?;
        self.send_roster(update)
    }

    /// Assign or clear a bumper's answer colour.
    pub fn set_answer_color(
        &self,
        bumper_id: &str,
        color: Option<AnswerColor>,
    ) -> Result<(), CommandError> {
        let update = set_answer_color(&self.state.borrow(), bumper_id, color)?;
        self.send_roster(update)
    }

    fn send_roster(&self, update: RosterUpdate) -> Result<(), CommandError> {
        self.send(ClientCommand::UpdateRoster(update))
    }
}

/// Teams of `state` as written back to the server, with every field the server sent.
pub fn team_records(state: &ClientState) -> IndexMap<String, TeamRecord> {
    state
        .teams
        .iter()
        .map(|(name, team)| {
            (
                name.clone(),
                TeamRecord {
                    name: name.clone(),
                    color: team.color.clone(),
                    score: team.score,
                    team_points: team.team_points,
                    time: team.buzz_time,
                    status: team.status.clone(),
                    ready: team.ready,
                    extra: team.extra.clone(),
                },
            )
        })
        .collect()
}

/// Bumpers of `state` as written back to the server, with every field the server sent.
pub fn bumper_records(state: &ClientState) -> IndexMap<String, BumperRecord> {
    state
        .bumpers
        .iter()
        .map(|(id, bumper)| {
            (
                id.clone(),
                BumperRecord {
                    name: bumper.name.clone(),
                    team: bumper.team.clone().unwrap_or_default(),
                    score: bumper.score,
                    time: bumper.buzz_time,
                    button: bumper.button.clone(),
                    status: bumper.status.clone(),
                    version: bumper.version.clone(),
                    ip: bumper.ip.clone(),
                    ready: bumper.ready,
                    answer_color: bumper.answer_color,
                    is_virtual: bumper.is_virtual,
                    extra: bumper.extra.clone(),
                },
            )
        })
        .collect()
}

fn team_not_found(name: &str) -> CommandError {
    CommandError::NotFound(format!("team `{name}` not found"))
}

fn bumper_not_found(id: &str) -> CommandError {
    CommandError::NotFound(format!("bumper `{id}` not found"))
}

/// Validated, trimmed team name that no existing team uses.
fn new_team_name<'a>(
    state: &'a ClientState,
    name: &'a str,
    except: Option<&str>,
) -> Result<&'a str, CommandError> {
    validate_team_name(name).map_err(|err| field_error("name", err))?;
    let name = name.trim();
    validate_unique(
        name,
        state
            .teams
            .keys()
            .filter(|taken| Some(taken.as_str()) != except),
    )
    .map_err(|err| field_error("name", err))?;
    Ok(name)
}

/// First preset colour no team uses yet, cycling once every preset is taken.
fn next_team_color(state: &ClientState) -> TeamColor {
    let used = |rgb: &[u8; 3]| {
        state
            .teams
            .values()
            .any(|team| team.color == Some(TeamColor::Rgb(*rgb)))
    };
    let rgb = PRESET_TEAM_COLORS
        .iter()
        .find(|rgb| !used(rgb))
        .copied()
        .unwrap_or(PRESET_TEAM_COLORS[state.teams.len() % PRESET_TEAM_COLORS.len()]);
    TeamColor::Rgb(rgb)
}

/// Add an empty team. Without an explicit colour the next free preset is used.
pub fn add_team(
    state: &ClientState,
    name: &str,
    color: Option<TeamColor>,
) -> Result<RosterUpdate, CommandError> {
    let name = new_team_name(state, name, None)?;
    let mut teams = team_records(state);
    teams.insert(
        name.to_string(),
        TeamRecord {
            name: name.to_string(),
            color: Some(color.unwrap_or_else(|| next_team_color(state))),
            ..TeamRecord::default()
        },
    );
    Ok(RosterUpdate {
        teams: Some(teams),
        bumpers: None,
    })
}

/// Remove a team and unassign its bumpers.
pub fn delete_team(state: &ClientState, name: &str) -> Result<RosterUpdate, CommandError> {
    let mut teams = team_records(state);
    teams.shift_remove(name).ok_or_else(|| team_not_found(name))?;

    let mut bumpers = bumper_records(state);
    for bumper in bumpers.values_mut().filter(|bumper| bumper.team == name) {
        bumper.team.clear();
    }
    Ok(RosterUpdate {
        teams: Some(teams),
        bumpers: Some(bumpers),
    })
}

/// Rewrite a team key in place and every bumper reference to it.
///
/// Returns `None` when the trimmed new name equals the old one.
pub fn rename_team(
    state: &ClientState,
    old_name: &str,
    new_name: &str,
) -> Result<Option<RosterUpdate>, CommandError> {
    if !state.teams.contains_key(old_name) {
        return Err(team_not_found(old_name));
    }
    let new_name = new_team_name(state, new_name, Some(old_name))?;
    if new_name == old_name {
        return Ok(None);
    }

    let teams = team_records(state)
        .into_iter()
        .map(|(name, mut record)| {
            if name == old_name {
                record.name = new_name.to_string();
                (new_name.to_string(), record)
            } else {
                (name, record)
            }
        })
        .collect();

    let mut bumpers = bumper_records(state);
    for bumper in bumpers.values_mut().filter(|bumper| bumper.team == old_name) {
        bumper.team = new_name.to_string();
    }
    Ok(Some(RosterUpdate {
        teams: Some(teams),
        bumpers: Some(bumpers),
    }))
}

/// Replace the colour of one team.
pub fn set_team_color(
    state: &ClientState,
    name: &str,
    color: TeamColor,
) -> Result<RosterUpdate, CommandError> {
    let mut teams = team_records(state);
    teams
        .get_mut(name)
        .ok_or_else(|| team_not_found(name))?
        .color = Some(color);
    Ok(RosterUpdate {
        teams: Some(teams),
        bumpers: None,
    })
}

/// Rename a bumper. An empty name falls back to the id suffix on display.
pub fn rename_bumper(
    state: &ClientState,
    bumper_id: &str,
    name: &str,
) -> Result<RosterUpdate, CommandError> {
    let mut bumpers = bumper_records(state);
    bumpers
        .get_mut(bumper_id)
        .ok_or_else(|| bumper_not_found(bumper_id))?
        .name = name.trim().to_string();
    Ok(RosterUpdate {
        teams: None,
        bumpers: Some(bumpers),
    })
}

/// Point a bumper at an existing team, or unassign it.
pub fn assign_bumper(
    state: &ClientState,
    bumper_id: &str,
    team: Option<&str>,
) -> Result<RosterUpdate, CommandError> {
    if let Some(team) = team {
        if !state.teams.contains_key(team) {
            return Err(team_not_found(team));
        }
    }
    let mut bumpers = bumper_records(state);
    bumpers
        .get_mut(bumper_id)
        .ok_or_else(|| bumper_not_found(bumper_id))?
        .team = team.unwrap_or_default().to_string();
    Ok(RosterUpdate {
        teams: None,
        bumpers: Some(bumpers),
    })
}

/// Set or clear the QCM answer colour of one bumper.
pub fn set_answer_color(
    state: &ClientState,
    bumper_id: &str,
    color: Option<AnswerColor>,
) -> Result<RosterUpdate, CommandError> {
    let mut bumpers = bumper_records(state);
    bumpers
        .get_mut(bumper_id)
        .ok_or_else(|| bumper_not_found(bumper_id))?
        .answer_color = color;
    Ok(RosterUpdate {
        teams: None,
        bumpers: Some(bumpers),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::{
        dto::ws::InboundMessage,
        services::connection::DriverEvent,
        state::{
            game::{Bumper, Team},
            reducer::reduce,
        },
    };

    fn roster() -> ClientState {
        let mut state = ClientState::default();
        for (name, rgb) in [("Red", [239, 68, 68]), ("Blue", [6, 182, 212])] {
            state.teams.insert(
                name.into(),
                Team {
                    name: name.into(),
                    color: Some(TeamColor::Rgb(rgb)),
                    score: 10,
                    ..Team::default()
                },
            );
        }
        for (id, team) in [("aa", Some("Red")), ("bb", Some("Blue")), ("cc", Some("Red"))] {
            state.bumpers.insert(
                id.into(),
                Bumper {
                    id: id.into(),
                    name: id.to_uppercase(),
                    team: team.map(str::to_string),
                    score: 3,
                    ..Bumper::default()
                },
            );
        }
        state
    }

    fn wire(update: RosterUpdate) -> Value {
        let text = ClientCommand::UpdateRoster(update).to_json().unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn add_team_sends_full_team_map_with_a_free_preset_colour() {
        let state = roster();
        let value = wire(add_team(&state, "  Green ", None).unwrap());

        assert_eq!(value["ACTION"], "UPDATE");
        let teams = value["MSG"]["teams"].as_object().unwrap();
        assert_eq!(
            teams.keys().collect::<Vec<_>>(),
            ["Red", "Blue", "Green"]
        );
        assert_eq!(teams["Green"]["COLOR"], json!([249, 115, 22]));
        assert_eq!(teams["Green"]["SCORE"], 0);
        assert!(value["MSG"].get("bumpers").is_none());
    }

    #[test]
    fn add_team_rejects_empty_and_duplicate_names() {
        let state = roster();
        assert!(matches!(
            add_team(&state, "   ", None),
            Err(CommandError::Invalid(_))
        ));
        let Err(CommandError::Invalid(errors)) = add_team(&state, "Red", None) else {
            panic!("duplicate accepted");
        };
        assert_eq!(errors.field_errors()["name"][0].code, "name_taken");
    }

    #[test]
    fn delete_team_unassigns_its_bumpers() {
        let value = wire(delete_team(&roster(), "Red").unwrap());
        let msg = &value["MSG"];
        assert!(msg["teams"].get("Red").is_none());
        assert_eq!(msg["bumpers"]["aa"]["TEAM"], "");
        assert_eq!(msg["bumpers"]["cc"]["TEAM"], "");
        assert_eq!(msg["bumpers"]["bb"]["TEAM"], "Blue");
        assert!(matches!(
            delete_team(&roster(), "Ghosts"),
            Err(CommandError::NotFound(_))
        ));
    }

    #[test]
    fn rename_team_rewrites_key_in_place_and_references() {
        let update = rename_team(&roster(), "Red", "Crimson").unwrap().unwrap();
        let teams = update.teams.as_ref().unwrap();
        assert_eq!(teams.keys().collect::<Vec<_>>(), ["Crimson", "Blue"]);
        assert_eq!(teams["Crimson"].score, 10);

        let bumpers = update.bumpers.as_ref().unwrap();
        assert_eq!(bumpers["aa"].team, "Crimson");
        assert_eq!(bumpers["cc"].team, "Crimson");
        assert_eq!(bumpers["bb"].team, "Blue");
    }

    #[test]
    fn rename_team_to_existing_name_is_a_validation_error() {
        let result = rename_team(&roster(), "Red", "Blue");
        assert!(matches!(result, Err(CommandError::Invalid(_))));
        assert!(rename_team(&roster(), "Red", " Red ").unwrap().is_none());
    }

    #[test]
    fn bumper_edits() {
        let state = roster();

        let update = assign_bumper(&state, "bb", Some("Red")).unwrap();
        assert_eq!(update.bumpers.as_ref().unwrap()["bb"].team, "Red");
        assert!(update.teams.is_none());

        let update = assign_bumper(&state, "bb", None).unwrap();
        assert_eq!(update.bumpers.as_ref().unwrap()["bb"].team, "");
        assert!(matches!(
            assign_bumper(&state, "bb", Some("Ghosts")),
            Err(CommandError::NotFound(_))
        ));

        let value = wire(set_answer_color(&state, "aa", Some(AnswerColor::Yellow)).unwrap());
        assert_eq!(value["MSG"]["bumpers"]["aa"]["ANSWER_COLOR"], "YELLOW");

        let update = rename_bumper(&state, "cc", " Zoé ").unwrap();
        assert_eq!(update.bumpers.as_ref().unwrap()["cc"].name, "Zoé");
        assert!(matches!(
            rename_bumper(&state, "zz", "x"),
            Err(CommandError::NotFound(_))
        ));
    }

    #[test]
    fn team_colour_edit_keeps_other_fields() {
        let update = set_team_color(&roster(), "Blue", TeamColor::Css("#123456".into())).unwrap();
        let blue = &update.teams.as_ref().unwrap()["Blue"];
        assert_eq!(blue.color, Some(TeamColor::Css("#123456".into())));
        assert_eq!(blue.score, 10);
    }

    /// Snapshot built from an UPDATE as the server emits it.
    fn synced_roster() -> ClientState {
        let frame = InboundMessage::from_json_str(
            &json!({
                "ACTION": "UPDATE",
                "MSG": {
                    "teams": {
                        "Red": {
                            "NAME": "Red",
                            "COLOR": [239, 68, 68],
                            "SCORE": 12,
                            "TIME": 1700000000123i64,
                            "STATUS": "PENDING",
                            "BUMPER": "aabbccddeeff"
                        }
                    },
                    "bumpers": {
                        "aabbccddeeff": {
                            "NAME": "Ann",
                            "TEAM": "Red",
                            "SCORE": 4,
                            "TIME": 1700000000123i64,
                            "BUTTON": "A",
                            "STATUS": "ONLINE",
                            "VERSION": "1.4",
                            "IP": "192.168.1.20",
                            "READY": true,
                            "BATTERY": 81
                        }
                    }
                }
            })
            .to_string(),
        )
        .unwrap();
        reduce(ClientState::default(), &frame)
    }

    #[test]
    fn bumper_edits_write_back_every_server_field() {
        let value = wire(rename_bumper(&synced_roster(), "aabbccddeeff", "Anna").unwrap());
        assert_eq!(
            value["MSG"]["bumpers"]["aabbccddeeff"],
            json!({
                "NAME": "Anna",
                "TEAM": "Red",
                "SCORE": 4,
                "TIME": 1700000000123i64,
                "BUTTON": "A",
                "STATUS": "ONLINE",
                "VERSION": "1.4",
                "IP": "192.168.1.20",
                "READY": true,
                "IS_VIRTUAL": false,
                "BATTERY": 81
            })
        );
    }

    #[test]
    fn team_rename_writes_back_every_server_field() {
        let update = rename_team(&synced_roster(), "Red", "Crimson").unwrap().unwrap();
        let value = wire(update);
        assert_eq!(
            value["MSG"]["teams"]["Crimson"],
            json!({
                "NAME": "Crimson",
                "COLOR": [239, 68, 68],
                "SCORE": 12,
                "TEAM_POINTS": 0,
                "TIME": 1700000000123i64,
                "STATUS": "PENDING",
                "READY": false,
                "BUMPER": "aabbccddeeff"
            })
        );
        assert_eq!(value["MSG"]["bumpers"]["aabbccddeeff"]["IP"], "192.168.1.20");
        assert_eq!(value["MSG"]["bumpers"]["aabbccddeeff"]["TEAM"], "Crimson");
    }

    #[tokio::test]
    async fn player_connect_validates_before_queueing() {
        let (events, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let (_state_tx, state_rx) = watch::channel(ClientState::default());
        let sender = CommandSender::new(CommandQueue::for_tests(events), state_rx);

        assert!(matches!(
            sender.player_connect(" x "),
            Err(CommandError::Invalid(_))
        ));
        sender.player_connect(" Alice ").unwrap();

        let Ok(DriverEvent::Send(command)) = rx.try_recv() else {
            panic!("one command expected");
        };
        assert_eq!(
            command,
            ClientCommand::PlayerConnect {
                name: "Alice".into()
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn roster_edits_read_the_latest_snapshot() {
        let (events, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ClientState::default());
        let sender = CommandSender::new(CommandQueue::for_tests(events), state_rx);

        assert!(matches!(
            sender.delete_team("Red"),
            Err(CommandError::NotFound(_))
        ));
        state_tx.send_replace(roster());
        sender.delete_team("Red").unwrap();

        let Ok(DriverEvent::Send(ClientCommand::UpdateRoster(update))) = rx.try_recv() else {
            panic!("roster update expected");
        };
        assert_eq!(update.teams.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sending_after_the_manager_stopped_fails() {
        let (events, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let (_state_tx, state_rx) = watch::channel(ClientState::default());
        let sender = CommandSender::new(CommandQueue::for_tests(events), state_rx);
        assert!(matches!(sender.stop(), Err(CommandError::Stopped)));
    }
}
