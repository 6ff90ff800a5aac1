use indexmap::IndexMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use serde_with::{DefaultOnError, serde_as};

use crate::{
    dto::game::{
        BackgroundChangePayload, ClientsPayload, ConfigUpdatePayload, EnrollmentPayload,
        EnrollmentUpdatePayload, FsInfoPayload, GamePayload, LogEntryMessage, LogEntryPayload,
        LogHistoryPayload, QcmHintPayload, QuestionPayload, ReadyPayload, SyncPayload,
    },
    error::ProtocolError,
    state::{
        game::{AnswerColor, TeamColor},
        phase::RemoteMode,
    },
};

/// Raw envelope shared by both directions: `ACTION` tag, `MSG` payload, optional metadata.
#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Message tag.
    #[serde(rename = "ACTION")]
    pub action: String,
    /// Tag-specific payload, decoded in a second step.
    #[serde(rename = "MSG", default)]
    pub msg: Value,
    /// Storage usage, attached to UPDATE and QUESTIONS.
    #[serde(rename = "FSINFO", default)]
    #[serde_as(as = "DefaultOnError")]
    pub fs_info: Option<FsInfoPayload>,
    /// Server build version.
    #[serde(rename = "VERSION", default)]
    #[serde_as(as = "DefaultOnError")]
    pub version: Option<String>,
}

/// Decoded server message: one variant per known `ACTION`.
#[derive(Debug, Clone)]
pub enum ServerMessage {
    /// Question started, possibly through a countdown.
    Start(GamePayload),
    /// Question stopped; may repeat the question for review.
    Stop(Option<GamePayload>),
    /// Timer frozen.
    Pause,
    /// Timer running again.
    Continue,
    /// Full or partial sync of game, teams and bumpers.
    Update(SyncPayload),
    /// Clock tick.
    UpdateTimer(GamePayload),
    /// Next question selected.
    Ready(ReadyPayload),
    /// Answer shown.
    Reveal,
    /// Remote display mode changed.
    Remote(SyncPayload),
    /// Roster-only push.
    Bumper(SyncPayload),
    /// Full question catalog.
    Questions(Vec<QuestionPayload>),
    /// Connected display counters.
    Clients(ClientsPayload),
    /// Carousel moved.
    BackgroundChange(BackgroundChangePayload),
    /// One QCM answer ruled out.
    QcmHint(QcmHintPayload),
    /// Enrollment QR code shown.
    ShowQrCode,
    /// Enrollment QR code hidden.
    HideQrCode,
    /// Virtual player counters changed.
    EnrollmentUpdate(EnrollmentUpdatePayload),
    /// A virtual player joined.
    PlayerConnected(EnrollmentPayload),
    /// A virtual player was put in a team.
    PlayerAssigned(EnrollmentPayload),
    /// A virtual player was turned away.
    PlayerRejected(EnrollmentPayload),
    /// Display effect settings changed.
    ConfigUpdate(ConfigUpdatePayload),
    /// Server log backlog.
    LogHistory(LogHistoryPayload),
    /// One new server log line.
    LogEntry(LogEntryPayload),
    /// Recognised envelope with a tag this client does not handle.
    Unknown(String),
}

impl ServerMessage {
    /// Wire tag of the message, for diagnostics.
    pub fn action(&self) -> &str {
        match self {
            Self::Start(_) => "START",
            Self::Stop(_) => "STOP",
            Self::Pause => "PAUSE",
            Self::Continue => "CONTINUE",
            Self::Update(_) => "UPDATE",
            Self::UpdateTimer(_) => "UPDATE_TIMER",
            Self::Ready(_) => "READY",
            Self::Reveal => "REVEAL",
            Self::Remote(_) => "REMOTE",
            Self::Bumper(_) => "BUMPER",
            Self::Questions(_) => "QUESTIONS",
            Self::Clients(_) => "CLIENTS",
            Self::BackgroundChange(_) => "BACKGROUND_CHANGE",
            Self::QcmHint(_) => "QCM_HINT",
            Self::ShowQrCode => "SHOW_QR_CODE",
            Self::HideQrCode => "HIDE_QR_CODE",
            Self::EnrollmentUpdate(_) => "ENROLLMENT_UPDATE",
            Self::PlayerConnected(_) => "PLAYER_CONNECTED",
            Self::PlayerAssigned(_) => "PLAYER_ASSIGNED",
            Self::PlayerRejected(_) => "PLAYER_REJECTED",
            Self::ConfigUpdate(_) => "CONFIG_UPDATE",
            Self::LogHistory(_) => "LOG_HISTORY",
            Self::LogEntry(_) => "LOG_ENTRY",
            Self::Unknown(action) => action,
        }
    }
}

/// A decoded message together with the out-of-band envelope metadata.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// The decoded message.
    pub body: ServerMessage,
    /// Storage usage from the envelope, if any.
    pub fs_info: Option<FsInfoPayload>,
    /// Server version from the envelope, if any.
    pub version: Option<String>,
}

impl InboundMessage {
    /// Parse a text frame and decode its payload according to its tag.
    pub fn from_json_str(text: &str) -> Result<Self, ProtocolError> {
        let envelope: Envelope = serde_json::from_str(text).map_err(ProtocolError::InvalidJson)?;
        Self::decode(envelope)
    }

    /// Decode an already-parsed envelope.
    pub fn decode(envelope: Envelope) -> Result<Self, ProtocolError> {
        let Envelope {
            action,
            msg,
            fs_info,
            version,
        } = envelope;
        // A missing MSG behaves like an empty object.
        let msg = match msg {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        let body = match action.as_str() {
            "START" => {
                let phase_name = raw_phase(&msg).map(str::to_owned);
                let game = required_game(&action, msg)?;
                if let (None, Some(name)) = (game.phase, phase_name) {
                    tracing::debug!(phase = %name, "unrecognised START phase, assuming STARTED");
                }
                ServerMessage::Start(game)
            }
            "STOP" => {
                let payload: SyncPayload = payload(&action, msg)?;
                ServerMessage::Stop(payload.game().cloned())
            }
            "PAUSE" => ServerMessage::Pause,
            "CONTINUE" => ServerMessage::Continue,
            "UPDATE" => ServerMessage::Update(payload(&action, msg)?),
            "UPDATE_TIMER" => ServerMessage::UpdateTimer(required_game(&action, msg)?),
            "READY" => ServerMessage::Ready(payload(&action, msg)?),
            "REVEAL" => ServerMessage::Reveal,
            "REMOTE" => ServerMessage::Remote(payload(&action, msg)?),
            "BUMPER" => ServerMessage::Bumper(payload(&action, msg)?),
            "QUESTIONS" => ServerMessage::Questions(questions(&action, msg)?),
            "CLIENTS" => ServerMessage::Clients(payload(&action, msg)?),
            "BACKGROUND_CHANGE" => ServerMessage::BackgroundChange(payload(&action, msg)?),
            "QCM_HINT" => ServerMessage::QcmHint(payload(&action, msg)?),
            "SHOW_QR_CODE" => ServerMessage::ShowQrCode,
            "HIDE_QR_CODE" => ServerMessage::HideQrCode,
            "ENROLLMENT_UPDATE" => ServerMessage::EnrollmentUpdate(payload(&action, msg)?),
            "PLAYER_CONNECTED" => ServerMessage::PlayerConnected(payload(&action, msg)?),
            "PLAYER_ASSIGNED" => ServerMessage::PlayerAssigned(payload(&action, msg)?),
            "PLAYER_REJECTED" => ServerMessage::PlayerRejected(payload(&action, msg)?),
            "CONFIG_UPDATE" => ServerMessage::ConfigUpdate(payload(&action, msg)?),
            "LOG_HISTORY" => ServerMessage::LogHistory(payload(&action, msg)?),
            "LOG_ENTRY" => {
                let entry: LogEntryMessage = payload(&action, msg)?;
                ServerMessage::LogEntry(entry.into_entry())
            }
            _ => ServerMessage::Unknown(action),
        };

        Ok(Self {
            body,
            fs_info,
            version,
        })
    }
}

fn payload<T: DeserializeOwned>(action: &str, msg: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(msg).map_err(|source| ProtocolError::InvalidPayload {
        action: action.to_string(),
        source,
    })
}

/// START and UPDATE_TIMER are meaningless without a game block.
fn required_game(action: &str, msg: Value) -> Result<GamePayload, ProtocolError> {
    let sync: SyncPayload = payload(action, msg)?;
    sync.game()
        .cloned()
        .ok_or_else(|| ProtocolError::MissingField {
            action: action.to_string(),
            field: "GAME",
        })
}

/// Phase name as written in a game block, nested under `GAME` first.
fn raw_phase(msg: &Value) -> Option<&str> {
    msg.get("GAME")
        .and_then(|game| game.get("PHASE"))
        .or_else(|| msg.get("PHASE"))
        .and_then(Value::as_str)
}

/// QUESTIONS is a map of catalog entries; entries without an `ID` are skipped.
fn questions(action: &str, msg: Value) -> Result<Vec<QuestionPayload>, ProtocolError> {
    let Value::Object(entries) = msg else {
        return Err(ProtocolError::MissingField {
            action: action.to_string(),
            field: "MSG",
        });
    };

    Ok(entries
        .into_iter()
        .filter(|(key, _)| key != "FSINFO")
        .filter_map(|(key, value)| match serde_json::from_value::<QuestionPayload>(value) {
            Ok(question) if question.id.is_some() => Some(question),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "skipping malformed catalog entry");
                None
            }
        })
        .collect())
}

/// Role announced with SET_CLIENT_TYPE so the server can count displays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientRole {
    /// Game master console.
    Admin,
    /// Shared TV display.
    Tv,
    /// Browser-based virtual player.
    #[serde(rename = "vplayer")]
    VirtualPlayer,
}

/// Outbound command, serialized as `{"ACTION": ..., "MSG": {...}}`.
///
/// Commands without a payload still carry an empty `MSG` object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "ACTION", content = "MSG", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCommand {
    /// Handshake sent right after the socket opens.
    Hello {},
    /// Liveness ping.
    Ping {},
    /// Announce the role of this client.
    SetClientType {
        /// Role of this client.
        #[serde(rename = "TYPE")]
        client_type: ClientRole,
    },
    /// Start the selected question.
    Start {
        /// Answer time in seconds.
        #[serde(rename = "DELAY")]
        delay: u32,
        /// Base point value.
        #[serde(rename = "POINTS")]
        points: i64,
    },
    /// Stop the running question.
    Stop {},
    /// Freeze the timer.
    Pause {},
    /// Resume after a pause.
    Continue {},
    /// Show the answer.
    Reveal {},
    /// Skip the ready round.
    ForceReady {},
    /// Select the next question.
    Ready {
        /// Question id.
        #[serde(rename = "QUESTION")]
        question: String,
    },
    /// Button press from a virtual player.
    Button {
        /// Bumper id.
        #[serde(rename = "ID")]
        id: String,
        /// Button code (`A`..`D`).
        button: String,
    },
    /// Reply to a server ping.
    Pong {
        /// Bumper id.
        #[serde(rename = "ID")]
        id: String,
    },
    /// Award points to a team.
    TeamPoints {
        /// Team name.
        #[serde(rename = "TEAM")]
        team: String,
        /// Points to add; negative to remove.
        #[serde(rename = "POINTS")]
        points: i64,
    },
    /// Award points to one player.
    BumperPoints {
        /// Bumper id.
        #[serde(rename = "ID")]
        id: String,
        /// Points to add; negative to remove.
        #[serde(rename = "POINTS")]
        points: i64,
    },
    /// Switch the remote display.
    Remote {
        /// Mode to show.
        #[serde(rename = "REMOTE")]
        remote: RemoteMode,
    },
    /// Turn a memory card face up.
    FlipMemoryCard {
        /// Card id.
        #[serde(rename = "CARD_ID")]
        card_id: String,
    },
    /// Delete a question from the catalog.
    Delete {
        /// Question id.
        #[serde(rename = "ID")]
        id: String,
    },
    /// Show the enrollment QR code.
    ShowQrCode {},
    /// Hide the enrollment QR code.
    HideQrCode {},
    /// Join as a virtual player.
    PlayerConnect {
        /// Trimmed player name.
        #[serde(rename = "NAME")]
        name: String,
    },
    /// Cap the number of virtual players.
    SetVirtualPlayerLimit {
        /// New cap.
        #[serde(rename = "LIMIT")]
        limit: u32,
    },
    /// Start streaming server logs.
    SubscribeLogs {},
    /// Stop streaming server logs.
    UnsubscribeLogs {},
    /// Persist a catalog order.
    ReorderQuestions {
        /// Question ids, first to last.
        #[serde(rename = "ORDER")]
        order: Vec<String>,
    },
    /// Roster edit, sent as an UPDATE carrying the full edited maps.
    #[serde(rename = "UPDATE")]
    UpdateRoster(RosterUpdate),
}

impl ClientCommand {
    /// Wire tag of the command.
    pub fn action(&self) -> &'static str {
        match self {
            Self::Hello {} => "HELLO",
            Self::Ping {} => "PING",
            Self::SetClientType { .. } => "SET_CLIENT_TYPE",
            Self::Start { .. } => "START",
            Self::Stop {} => "STOP",
            Self::Pause {} => "PAUSE",
            Self::Continue {} => "CONTINUE",
            Self::Reveal {} => "REVEAL",
            Self::ForceReady {} => "FORCE_READY",
            Self::Ready { .. } => "READY",
            Self::Button { .. } => "BUTTON",
            Self::Pong { .. } => "PONG",
            Self::TeamPoints { .. } => "TEAM_POINTS",
            Self::BumperPoints { .. } => "BUMPER_POINTS",
            Self::Remote { .. } => "REMOTE",
            Self::FlipMemoryCard { .. } => "FLIP_MEMORY_CARD",
            Self::Delete { .. } => "DELETE",
            Self::ShowQrCode {} => "SHOW_QR_CODE",
            Self::HideQrCode {} => "HIDE_QR_CODE",
            Self::PlayerConnect { .. } => "PLAYER_CONNECT",
            Self::SetVirtualPlayerLimit { .. } => "SET_VIRTUAL_PLAYER_LIMIT",
            Self::SubscribeLogs {} => "SUBSCRIBE_LOGS",
            Self::UnsubscribeLogs {} => "UNSUBSCRIBE_LOGS",
            Self::ReorderQuestions { .. } => "REORDER_QUESTIONS",
            Self::UpdateRoster(_) => "UPDATE",
        }
    }

    /// Serialize to a text frame.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Body of a roster UPDATE: whichever maps were edited, in full.
///
/// The server replaces its maps with these, so every record repeats all the fields it knows about.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RosterUpdate {
    /// Every team, keyed by name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teams: Option<IndexMap<String, TeamRecord>>,
    /// Every bumper, keyed by id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bumpers: Option<IndexMap<String, BumperRecord>>,
}

/// Team as written back to the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TeamRecord {
    /// Same as the map key.
    #[serde(rename = "NAME")]
    pub name: String,
    /// Display colour.
    #[serde(rename = "COLOR", skip_serializing_if = "Option::is_none")]
    pub color: Option<TeamColor>,
    /// Cumulative score.
    #[serde(rename = "SCORE")]
    pub score: i64,
    /// Points awarded to the team as a whole.
    #[serde(rename = "TEAM_POINTS")]
    pub team_points: i64,
    /// Buzz timestamp.
    #[serde(rename = "TIME", skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    /// Status string.
    #[serde(rename = "STATUS", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Ready flag.
    #[serde(rename = "READY")]
    pub ready: bool,
    /// Untyped server fields, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Bumper as written back to the server. An unassigned bumper carries an empty `TEAM`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BumperRecord {
    /// Display name.
    #[serde(rename = "NAME")]
    pub name: String,
    /// Team name, empty when unassigned.
    #[serde(rename = "TEAM")]
    pub team: String,
    /// Individual score.
    #[serde(rename = "SCORE")]
    pub score: i64,
    /// Buzz timestamp.
    #[serde(rename = "TIME", skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    /// Last pressed button.
    #[serde(rename = "BUTTON", skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    /// Status string.
    #[serde(rename = "STATUS", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Firmware version.
    #[serde(rename = "VERSION", skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Device address.
    #[serde(rename = "IP", skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Ready flag.
    #[serde(rename = "READY")]
    pub ready: bool,
    /// QCM answer colour.
    #[serde(rename = "ANSWER_COLOR", skip_serializing_if = "Option::is_none")]
    pub answer_color: Option<AnswerColor>,
    /// Virtual player flag.
    #[serde(rename = "IS_VIRTUAL")]
    pub is_virtual: bool,
    /// Untyped server fields, passed through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::state::game::AnswerColor;

    fn decode(value: Value) -> Result<InboundMessage, ProtocolError> {
        InboundMessage::from_json_str(&value.to_string())
    }

    #[test]
    fn invalid_json_is_a_protocol_error() {
        let err = InboundMessage::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson(_)));
    }

    #[test]
    fn unknown_action_is_decoded_not_rejected() {
        let message = decode(json!({ "ACTION": "FIREWORKS", "MSG": {} })).unwrap();
        assert!(matches!(message.body, ServerMessage::Unknown(tag) if tag == "FIREWORKS"));
    }

    #[test]
    fn qcm_hint_requires_a_color() {
        let err = decode(json!({ "ACTION": "QCM_HINT", "MSG": {} })).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidPayload { action, .. } if action == "QCM_HINT"));

        let ok = decode(json!({ "ACTION": "QCM_HINT", "MSG": { "COLOR": "BLUE", "REMAINING": 2 } }))
            .unwrap();
        assert!(matches!(ok.body, ServerMessage::QcmHint(QcmHintPayload { color: AnswerColor::Blue, .. })));
    }

    #[test]
    fn start_without_game_block_is_rejected() {
        let err = decode(json!({ "ACTION": "START" })).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingField { field: "GAME", .. }));
    }

    #[test]
    fn start_accepts_inline_and_nested_blocks() {
        let inline = decode(json!({ "ACTION": "START", "MSG": { "DELAY": 40, "POINTS": 5 } })).unwrap();
        assert!(matches!(inline.body, ServerMessage::Start(GamePayload { delay: Some(40), .. })));

        let nested =
            decode(json!({ "ACTION": "START", "MSG": { "GAME": { "PHASE": "COUNTDOWN" } } })).unwrap();
        assert!(matches!(nested.body, ServerMessage::Start(_)));
    }

    #[test]
    fn raw_phase_prefers_the_nested_block() {
        assert_eq!(
            raw_phase(&json!({ "GAME": { "PHASE": "WARMUP" }, "PHASE": "STARTED" })),
            Some("WARMUP")
        );
        assert_eq!(raw_phase(&json!({ "PHASE": "COUNTDOWN" })), Some("COUNTDOWN"));
        assert_eq!(raw_phase(&json!({ "DELAY": 20 })), None);

        let message =
            decode(json!({ "ACTION": "START", "MSG": { "GAME": { "PHASE": "WARMUP" } } })).unwrap();
        assert!(matches!(message.body, ServerMessage::Start(GamePayload { phase: None, .. })));
    }

    #[test]
    fn questions_keyed_by_path_are_kept() {
        let message = decode(json!({
            "ACTION": "QUESTIONS",
            "MSG": {
                "/files/questions/demo1": { "ID": "demo1", "POINTS": "10", "TIME": "20", "TYPE": "QCM" }
            }
        }))
        .unwrap();
        let ServerMessage::Questions(questions) = message.body else {
            panic!("expected questions");
        };
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].points, Some(10));
    }

    #[test]
    fn questions_skip_metadata_and_entries_without_id() {
        let message = decode(json!({
            "ACTION": "QUESTIONS",
            "MSG": {
                "1": { "ID": "1", "QUESTION": "Capital of France?" },
                "2": { "QUESTION": "orphan" },
                "FSINFO": { "USED": 10 }
            },
            "FSINFO": { "USED": 10, "TOTAL": 100 }
        }))
        .unwrap();
        let ServerMessage::Questions(questions) = message.body else {
            panic!("expected questions");
        };
        assert_eq!(questions.len(), 1);
        assert_eq!(message.fs_info.map(|info| info.total), Some(100));
    }

    #[test]
    fn malformed_metadata_does_not_reject_the_frame() {
        let message = decode(json!({ "ACTION": "PAUSE", "VERSION": 12, "FSINFO": "full" })).unwrap();
        assert!(matches!(message.body, ServerMessage::Pause));
        assert!(message.version.is_none());
        assert!(message.fs_info.is_none());
    }

    #[test]
    fn commands_use_the_envelope_shape() {
        let start = serde_json::to_value(ClientCommand::Start {
            delay: 30,
            points: 5,
        })
        .unwrap();
        assert_eq!(start, json!({ "ACTION": "START", "MSG": { "DELAY": 30, "POINTS": 5 } }));

        let stop = serde_json::to_value(ClientCommand::Stop {}).unwrap();
        assert_eq!(stop, json!({ "ACTION": "STOP", "MSG": {} }));

        let button = serde_json::to_value(ClientCommand::Button {
            id: "b1".into(),
            button: "A".into(),
        })
        .unwrap();
        assert_eq!(button, json!({ "ACTION": "BUTTON", "MSG": { "ID": "b1", "button": "A" } }));
    }

    #[test]
    fn command_tags_match_serialization() {
        let commands = [
            ClientCommand::Hello {},
            ClientCommand::SetClientType {
                client_type: ClientRole::VirtualPlayer,
            },
            ClientCommand::FlipMemoryCard {
                card_id: "p1-a".into(),
            },
            ClientCommand::Remote {
                remote: RemoteMode::Palmares,
            },
            ClientCommand::UpdateRoster(RosterUpdate::default()),
        ];
        for command in commands {
            let value = serde_json::to_value(&command).unwrap();
            assert_eq!(value["ACTION"], command.action());
        }
    }

    #[test]
    fn client_role_wire_names() {
        let value = serde_json::to_value(ClientCommand::SetClientType {
            client_type: ClientRole::VirtualPlayer,
        })
        .unwrap();
        assert_eq!(value["MSG"]["TYPE"], "vplayer");
    }

    #[test]
    fn roster_update_omits_untouched_maps() {
        let mut bumpers = IndexMap::new();
        bumpers.insert(
            "b1".to_string(),
            BumperRecord {
                name: "Ann".into(),
                ..BumperRecord::default()
            },
        );
        let value = serde_json::to_value(ClientCommand::UpdateRoster(RosterUpdate {
            teams: None,
            bumpers: Some(bumpers),
        }))
        .unwrap();
        assert_eq!(value["ACTION"], "UPDATE");
        assert!(value["MSG"].get("teams").is_none());
        assert_eq!(value["MSG"]["bumpers"]["b1"]["TEAM"], "");
    }
}
