//! Wire representations of the game payloads pushed by the server.
//!
//! Every struct is lenient: absent fields take their default, and a few enum-valued fields
//! (phase, remote mode, colours) fall back to `None` on values this client does not know yet.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use serde_with::{DefaultOnError, DefaultOnNull, DisplayFromStr, PickFirst, Same, serde_as};

use crate::state::{
    game::{AnswerColor, PointsTarget, QuestionKind},
    phase::{Phase, RemoteMode},
};

/// Number that the server may also store as a decimal string (`"10"`); unparsable values read as
/// absent.
type LenientNumber = DefaultOnError<Option<PickFirst<(Same, DisplayFromStr)>>>;

/// Game block carried by START/STOP/UPDATE/UPDATE_TIMER, either under `GAME` or inline.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct GamePayload {
    #[serde(rename = "PHASE")]
    #[serde_as(as = "DefaultOnError")]
    pub phase: Option<Phase>,
    #[serde(rename = "DELAY")]
    pub delay: Option<u32>,
    #[serde(rename = "CURRENT_TIME")]
    pub current_time: Option<u32>,
    #[serde(rename = "COUNTDOWN_TIME")]
    pub countdown_time: Option<u32>,
    #[serde(rename = "TIME")]
    pub time: Option<i64>,
    #[serde(rename = "QUESTION")]
    pub question: Option<QuestionPayload>,
    #[serde(rename = "REMOTE")]
    #[serde_as(as = "DefaultOnError")]
    pub remote: Option<RemoteMode>,
    pub backgrounds: Option<Vec<BackgroundPayload>>,
    #[serde(rename = "CURRENT_BACKGROUND_INDEX")]
    pub current_background_index: Option<usize>,
    #[serde(rename = "MEMORY_FLIPPED_CARDS")]
    pub memory_flipped_cards: Option<Vec<String>>,
    #[serde(rename = "MEMORY_MATCHED_PAIRS", deserialize_with = "opt_id_list")]
    pub memory_matched_pairs: Option<Vec<String>>,
    #[serde(rename = "MEMORY_ERRORS")]
    pub memory_errors: Option<u32>,
    #[serde(rename = "QCM_INVALIDATED")]
    pub qcm_invalidated: Option<Vec<AnswerColor>>,
    #[serde(rename = "VIRTUAL_PLAYER_COUNT")]
    pub virtual_player_count: Option<u32>,
    #[serde(rename = "VIRTUAL_PLAYER_LIMIT")]
    pub virtual_player_limit: Option<u32>,
    #[serde(rename = "ENROLLMENT_ACTIVE")]
    pub enrollment_active: Option<bool>,
    #[serde(rename = "SHOW_QR_CODE")]
    pub show_qr_code: Option<bool>,
}

impl GamePayload {
    /// True when no field at all was present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Full-or-partial sync payload: a game block plus optional roster maps.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SyncPayload {
    #[serde(rename = "GAME")]
    pub game: Option<GamePayload>,
    pub teams: Option<IndexMap<String, TeamPayload>>,
    pub bumpers: Option<IndexMap<String, BumperPayload>>,
    #[serde(flatten)]
    pub inline: GamePayload,
}

impl SyncPayload {
    /// The game block, preferring the nested `GAME` object over inline fields.
    pub fn game(&self) -> Option<&GamePayload> {
        self.game
            .as_ref()
            .or((!self.inline.is_empty()).then_some(&self.inline))
    }
}

/// Team entry keyed by team name in the `teams` map.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TeamPayload {
    #[serde(rename = "NAME")]
    pub name: Option<String>,
    #[serde(rename = "COLOR")]
    #[serde_as(as = "DefaultOnError")]
    pub color: Option<ColorPayload>,
    #[serde(rename = "SCORE")]
    #[serde_as(as = "DefaultOnNull")]
    pub score: i64,
    #[serde(rename = "TEAM_POINTS")]
    #[serde_as(as = "DefaultOnNull")]
    pub team_points: i64,
    #[serde(rename = "TIME")]
    pub time: Option<i64>,
    #[serde(rename = "STATUS")]
    pub status: Option<String>,
    #[serde(rename = "READY")]
    #[serde_as(as = "DefaultOnNull")]
    pub ready: bool,
    /// Server fields this client does not model, kept for write-back.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Colour as sent by the server: an RGB triple or a CSS string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ColorPayload {
    Rgb([u8; 3]),
    Css(String),
}

/// Bumper entry keyed by device/session id in the `bumpers` map.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BumperPayload {
    #[serde(rename = "NAME")]
    pub name: Option<String>,
    #[serde(rename = "TEAM")]
    pub team: Option<String>,
    #[serde(rename = "SCORE")]
    #[serde_as(as = "DefaultOnNull")]
    pub score: i64,
    #[serde(rename = "TIME")]
    pub time: Option<i64>,
    #[serde(rename = "BUTTON")]
    pub button: Option<String>,
    #[serde(rename = "STATUS")]
    pub status: Option<String>,
    #[serde(rename = "VERSION")]
    pub version: Option<String>,
    #[serde(rename = "IP")]
    pub ip: Option<String>,
    #[serde(rename = "READY")]
    #[serde_as(as = "DefaultOnNull")]
    pub ready: bool,
    #[serde(rename = "ANSWER_COLOR")]
    #[serde_as(as = "DefaultOnError")]
    pub answer_color: Option<AnswerColor>,
    #[serde(rename = "HINTS_AT_BUZZ")]
    pub hints_at_buzz: Option<u32>,
    #[serde(rename = "IS_VIRTUAL")]
    #[serde_as(as = "DefaultOnNull")]
    pub is_virtual: bool,
    /// Server fields this client does not model, kept for write-back.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Question as sent in QUESTIONS, READY and game blocks.
///
/// Questions saved from the upload form or the demo loader carry `POINTS` and `TIME` as strings,
/// so every numeric field accepts both encodings.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct QuestionPayload {
    #[serde(rename = "ID", deserialize_with = "opt_id")]
    pub id: Option<String>,
    #[serde(rename = "TYPE")]
    #[serde_as(as = "DefaultOnError")]
    pub kind: Option<QuestionKind>,
    #[serde(rename = "QUESTION")]
    pub text: Option<String>,
    #[serde(rename = "ANSWER")]
    pub answer: Option<String>,
    #[serde(rename = "POINTS")]
    #[serde_as(as = "LenientNumber")]
    pub points: Option<i64>,
    #[serde(rename = "TIME")]
    #[serde_as(as = "LenientNumber")]
    pub time: Option<u32>,
    #[serde(rename = "MEDIA")]
    pub media: Option<String>,
    #[serde(rename = "MEDIA_ANSWER")]
    pub media_answer: Option<String>,
    #[serde(rename = "CATEGORY")]
    pub category: Option<String>,
    #[serde(rename = "POINTS_TARGET")]
    #[serde_as(as = "DefaultOnError")]
    pub points_target: Option<PointsTarget>,
    #[serde(rename = "STATUS")]
    pub status: Option<String>,
    #[serde(rename = "QCM_ANSWERS")]
    #[serde_as(as = "DefaultOnError")]
    pub qcm_answers: Option<IndexMap<AnswerColor, String>>,
    #[serde(rename = "QCM_CORRECT")]
    #[serde_as(as = "DefaultOnError")]
    pub qcm_correct: Option<AnswerColor>,
    #[serde(rename = "QCM_HINTS_ENABLED", alias = "QCM_HINTS")]
    #[serde_as(as = "DefaultOnError")]
    pub qcm_hints_enabled: Option<bool>,
    /// Share of the answer time after which the first hint is given.
    #[serde(rename = "QCM_HINT_THRESHOLD_1")]
    #[serde_as(as = "LenientNumber")]
    pub qcm_hint_threshold_1: Option<f64>,
    /// Share of the answer time after which the second hint is given.
    #[serde(rename = "QCM_HINT_THRESHOLD_2")]
    #[serde_as(as = "LenientNumber")]
    pub qcm_hint_threshold_2: Option<f64>,
    #[serde(rename = "QCM_PENALTY_1")]
    #[serde_as(as = "LenientNumber")]
    pub qcm_penalty_1: Option<f64>,
    #[serde(rename = "QCM_PENALTY_2")]
    #[serde_as(as = "LenientNumber")]
    pub qcm_penalty_2: Option<f64>,
    #[serde(rename = "ORDER")]
    #[serde_as(as = "LenientNumber")]
    pub order: Option<i64>,
    #[serde(rename = "MEMORY_PAIRS")]
    pub memory_pairs: Option<Vec<MemoryPairPayload>>,
    #[serde(rename = "MEMORY_CONFIG")]
    pub memory_config: Option<MemoryConfigPayload>,
}

/// One pair of a memory question.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemoryPairPayload {
    #[serde(rename = "ID", deserialize_with = "opt_id")]
    pub id: Option<String>,
    #[serde(rename = "CARD1")]
    pub card1: MemoryCardPayload,
    #[serde(rename = "CARD2")]
    pub card2: MemoryCardPayload,
}

/// Face of a memory card: text or image path.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemoryCardPayload {
    #[serde(rename = "TEXT")]
    pub text: String,
    #[serde(rename = "IMAGE")]
    pub image: String,
    #[serde(rename = "IS_IMAGE")]
    pub is_image: bool,
}

/// Memory scoring and pacing block.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MemoryConfigPayload {
    #[serde(rename = "FLIP_DELAY")]
    #[serde_as(as = "LenientNumber")]
    pub flip_delay: Option<f64>,
    #[serde(rename = "POINTS_PER_PAIR")]
    #[serde_as(as = "LenientNumber")]
    pub points_per_pair: Option<u32>,
    #[serde(rename = "ERROR_PENALTY")]
    #[serde_as(as = "LenientNumber")]
    pub error_penalty: Option<u32>,
    #[serde(rename = "COMPLETION_BONUS")]
    #[serde_as(as = "LenientNumber")]
    pub completion_bonus: Option<u32>,
    #[serde(rename = "USE_TIMER")]
    pub use_timer: Option<bool>,
    #[serde(rename = "MEMORIZE_TIME")]
    #[serde_as(as = "LenientNumber")]
    pub memorize_time: Option<f64>,
    #[serde(rename = "SHOW_DURING_MEMORIZE")]
    pub show_during_memorize: Option<bool>,
    #[serde(rename = "REVEAL_DELAY")]
    #[serde_as(as = "LenientNumber")]
    pub reveal_delay: Option<f64>,
}

/// Background carousel entry.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct BackgroundPayload {
    pub path: String,
    pub duration: Option<u32>,
    pub opacity: Option<f64>,
}

/// READY payload: the question about to be played.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReadyPayload {
    #[serde(rename = "QUESTION")]
    pub question: Option<QuestionPayload>,
}

/// CLIENTS payload: connected display counters.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientsPayload {
    #[serde(rename = "ADMIN_COUNT")]
    pub admin_count: u32,
    #[serde(rename = "TV_COUNT")]
    pub tv_count: u32,
}

/// BACKGROUND_CHANGE payload.
#[derive(Debug, Clone, Deserialize)]
pub struct BackgroundChangePayload {
    #[serde(rename = "INDEX")]
    pub index: usize,
}

/// QCM_HINT payload: one more answer ruled out.
#[derive(Debug, Clone, Deserialize)]
pub struct QcmHintPayload {
    #[serde(rename = "COLOR")]
    pub color: AnswerColor,
    #[serde(rename = "REMAINING", default)]
    pub remaining: Option<u32>,
}

/// ENROLLMENT_UPDATE payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrollmentUpdatePayload {
    #[serde(rename = "VIRTUAL_PLAYER_COUNT")]
    pub virtual_player_count: Option<u32>,
    #[serde(rename = "VIRTUAL_PLAYER_LIMIT")]
    pub virtual_player_limit: Option<u32>,
    #[serde(rename = "ENROLLMENT_ACTIVE")]
    pub enrollment_active: Option<bool>,
}

/// PLAYER_CONNECTED / PLAYER_ASSIGNED / PLAYER_REJECTED payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnrollmentPayload {
    #[serde(rename = "ID")]
    pub id: Option<String>,
    #[serde(rename = "NAME")]
    pub name: Option<String>,
    #[serde(rename = "TEAM")]
    pub team: Option<String>,
    #[serde(rename = "REASON")]
    pub reason: Option<String>,
}

/// CONFIG_UPDATE payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigUpdatePayload {
    pub neon_effect: Option<NeonEffectPayload>,
}

/// Display effect block of CONFIG_UPDATE.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NeonEffectPayload {
    pub enabled: bool,
    pub mode: Option<String>,
    pub arc_width: Option<u32>,
    pub intensity_gap: Option<u32>,
    pub rotation_speed: Option<f64>,
    pub bar_offset: Option<u32>,
}

/// LOG_HISTORY payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogHistoryPayload {
    pub entries: Vec<LogEntryPayload>,
}

/// One server log line.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogEntryPayload {
    pub timestamp: i64,
    pub level: String,
    pub component: String,
    pub message: String,
}

/// LOG_ENTRY payload: the entry itself, or the entry wrapped under `entry`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LogEntryMessage {
    Wrapped { entry: LogEntryPayload },
    Flat(LogEntryPayload),
}

impl LogEntryMessage {
    /// Unwrap to the log line regardless of the framing.
    pub fn into_entry(self) -> LogEntryPayload {
        match self {
            Self::Wrapped { entry } | Self::Flat(entry) => entry,
        }
    }
}

/// Envelope-level filesystem usage report.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct FsInfoPayload {
    #[serde(rename = "USED")]
    pub used: u64,
    #[serde(rename = "FREE")]
    pub free: u64,
    #[serde(rename = "TOTAL")]
    pub total: u64,
    #[serde(rename = "P_USED")]
    pub percent_used: f64,
}

/// Identifier that the server may encode as a string or a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireId {
    Text(String),
    Number(serde_json::Number),
}

impl From<WireId> for String {
    fn from(value: WireId) -> Self {
        match value {
            WireId::Text(text) => text,
            WireId::Number(number) => number.to_string(),
        }
    }
}

fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let id = Option::<WireId>::deserialize(deserializer)?;
    Ok(id.map(String::from))
}

fn opt_id_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let ids = Option::<Vec<WireId>>::deserialize(deserializer)?;
    Ok(ids.map(|ids| ids.into_iter().map(String::from).collect()))
}
