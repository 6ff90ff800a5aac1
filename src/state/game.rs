use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{
    dto::game::{
        BackgroundPayload, BumperPayload, ColorPayload, FsInfoPayload, LogEntryPayload,
        MemoryCardPayload, MemoryConfigPayload, MemoryPairPayload, NeonEffectPayload,
        QuestionPayload, TeamPayload,
    },
    state::phase::{Phase, RemoteMode},
};

/// Penalty multiplier applied after one QCM hint when the question does not set one.
pub const DEFAULT_QCM_PENALTY_1: f64 = 0.67;
/// Penalty multiplier applied after two or more QCM hints when the question does not set one.
pub const DEFAULT_QCM_PENALTY_2: f64 = 0.33;
/// Points awarded per matched memory pair when the question does not set it.
pub const DEFAULT_POINTS_PER_PAIR: u32 = 10;
/// Virtual player cap assumed until the server announces one.
pub const DEFAULT_VIRTUAL_PLAYER_LIMIT: u32 = 20;
/// Maximum number of face-up memory cards at any time.
pub const MAX_FLIPPED_CARDS: usize = 2;

/// Question type, selecting the scoring rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionKind {
    /// Open question, first buzz answers.
    #[default]
    Normal,
    /// Multiple choice with coloured answers.
    Qcm,
    /// Pair-matching grid.
    Memory,
}

/// Who receives the points awarded for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PointsTarget {
    /// The player who buzzed.
    #[default]
    Player,
    /// The player's team as a whole.
    Team,
}

/// Coloured answer slot of a multiple-choice question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnswerColor {
    /// Answer A.
    Red,
    /// Answer B.
    Green,
    /// Answer C.
    Yellow,
    /// Answer D.
    Blue,
}

impl AnswerColor {
    /// Map a physical button code (A–D) to its answer colour.
    pub fn from_button(button: &str) -> Option<Self> {
        match button.trim() {
            "A" | "a" => Some(Self::Red),
            "B" | "b" => Some(Self::Green),
            "C" | "c" => Some(Self::Yellow),
            "D" | "d" => Some(Self::Blue),
            _ => None,
        }
    }

    /// Button letter shown next to the answer.
    pub fn letter(self) -> char {
        match self {
            Self::Red => 'A',
            Self::Green => 'B',
            Self::Yellow => 'C',
            Self::Blue => 'D',
        }
    }
}

/// Display colour of a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum TeamColor {
    /// RGB triple.
    Rgb([u8; 3]),
    /// Any CSS colour string.
    Css(String),
}

/// Team keyed by its unique name.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Team {
    /// Unique name, also the key used by bumpers to reference the team.
    pub name: String,
    /// Display colour, if the server assigned one.
    pub color: Option<TeamColor>,
    /// Cumulative score.
    pub score: i64,
    /// Points awarded to the team as a whole.
    pub team_points: i64,
    /// Ready flag from the PREPARE ping round.
    pub ready: bool,
    /// Buzz timestamp, if the team buzzed on the current question.
    pub buzz_time: Option<i64>,
    /// Free-form status string.
    pub status: Option<String>,
    /// Server-side fields without a typed counterpart, written back untouched.
    pub extra: Map<String, Value>,
}

/// Player device (physical buzzer or virtual player) keyed by a stable id.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bumper {
    /// Stable device/session identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Name of the team this bumper plays for; may dangle.
    pub team: Option<String>,
    /// Individual score.
    pub score: i64,
    /// Buzz timestamp, if the bumper buzzed on the current question.
    pub buzz_time: Option<i64>,
    /// Last pressed button code.
    pub button: Option<String>,
    /// Answer colour assigned for multiple choice.
    pub answer_color: Option<AnswerColor>,
    /// Ready flag from the PREPARE ping round.
    pub ready: bool,
    /// True for browser-based virtual players.
    pub is_virtual: bool,
    /// Number of QCM hints already given when this bumper buzzed.
    pub hints_at_buzz: Option<u32>,
    /// Free-form status string.
    pub status: Option<String>,
    /// Firmware version reported by physical buzzers.
    pub version: Option<String>,
    /// Address the buzzer connected from.
    pub ip: Option<String>,
    /// Server-side fields without a typed counterpart, written back untouched.
    pub extra: Map<String, Value>,
}

/// Multiple-choice configuration of a question.
#[derive(Debug, Clone, PartialEq)]
pub struct QcmConfig {
    /// Answer text per colour.
    pub answers: IndexMap<AnswerColor, String>,
    /// The right answer.
    pub correct: Option<AnswerColor>,
    /// Whether the server may rule out answers during the question.
    pub hints_enabled: bool,
    /// Elapsed share of the answer time that triggers the first and second hints.
    pub hint_thresholds: (Option<f64>, Option<f64>),
    /// Multiplier after one hint.
    pub penalty_1: f64,
    /// Multiplier after two or more hints.
    pub penalty_2: f64,
}

impl Default for QcmConfig {
    fn default() -> Self {
        Self {
            answers: IndexMap::new(),
            correct: None,
            hints_enabled: false,
            hint_thresholds: (None, None),
            penalty_1: DEFAULT_QCM_PENALTY_1,
            penalty_2: DEFAULT_QCM_PENALTY_2,
        }
    }
}

/// One face of a memory card.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryCard {
    /// Text face.
    pub text: String,
    /// Image path when the card shows a picture.
    pub image: String,
    /// Whether the image face is used.
    pub is_image: bool,
}

/// Two cards that belong together.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoryPair {
    /// Pair identifier, referenced by the matched-pairs list.
    pub id: String,
    /// First card.
    pub card1: MemoryCard,
    /// Second card.
    pub card2: MemoryCard,
}

/// Memory scoring and pacing configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryConfig {
    /// Points per matched pair.
    pub points_per_pair: u32,
    /// Points removed per mismatch.
    pub error_penalty: u32,
    /// Bonus when every pair is matched.
    pub completion_bonus: u32,
    /// Seconds a mismatched pair stays visible.
    pub flip_delay: f64,
    /// Whether the question timer applies.
    pub use_timer: bool,
    /// Seconds of the memorize phase.
    pub memorize_time: f64,
    /// Whether cards are shown face up while memorizing.
    pub show_during_memorize: bool,
    /// Seconds between card reveals in the reveal cascade.
    pub reveal_delay: f64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            points_per_pair: DEFAULT_POINTS_PER_PAIR,
            error_penalty: 0,
            completion_bonus: 0,
            flip_delay: 1.0,
            use_timer: false,
            memorize_time: 5.0,
            show_during_memorize: true,
            reveal_delay: 0.5,
        }
    }
}

/// Question loaded from the catalog or pushed with READY.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Question {
    /// Catalog identifier.
    pub id: String,
    /// Type selecting the scoring rules.
    pub kind: QuestionKind,
    /// Question text.
    pub text: String,
    /// Expected answer.
    pub answer: String,
    /// Base point value.
    pub points: i64,
    /// Time limit in seconds.
    pub time_limit: u32,
    /// Optional media path shown with the question.
    pub media: Option<String>,
    /// Optional media path shown with the answer.
    pub media_answer: Option<String>,
    /// Category used by the palmares view.
    pub category: Option<String>,
    /// Who receives awarded points.
    pub points_target: PointsTarget,
    /// Catalog status (AVAILABLE, STARTED, ...).
    pub status: Option<String>,
    /// Position in the catalog set by the game master.
    pub order: Option<i64>,
    /// Present for QCM questions.
    pub qcm: Option<QcmConfig>,
    /// Pairs of a memory question.
    pub memory_pairs: Vec<MemoryPair>,
    /// Present for memory questions.
    pub memory: Option<MemoryConfig>,
}

impl Question {
    /// Sort key in the catalog: the explicit order, else a numeric id.
    pub fn catalog_position(&self) -> Option<i64> {
        self.order.or_else(|| self.id.parse().ok())
    }
}

/// Background carousel entry.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Background {
    /// Image path.
    pub path: String,
    /// Seconds this image stays on screen.
    pub duration_secs: u32,
    /// Opacity between 0 and 100.
    pub opacity: f64,
}

/// Display effect settings pushed with CONFIG_UPDATE.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DisplayEffect {
    /// Whether the neon border is drawn.
    pub enabled: bool,
    /// `halo` or `bar`.
    pub mode: String,
    /// Arc width in degrees.
    pub arc_width: u32,
    /// Intensity gap in percent.
    pub intensity_gap: u32,
    /// Seconds per rotation.
    pub rotation_speed: f64,
    /// Bar offset in pixels.
    pub bar_offset: u32,
}

/// Latest enrollment answer received by a virtual player.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrollmentOutcome {
    /// Enrollment accepted.
    Connected {
        /// Session id assigned by the server.
        id: Option<String>,
        /// Accepted player name.
        name: Option<String>,
    },
    /// Player placed in a team.
    Assigned {
        /// Session id of the player.
        id: Option<String>,
        /// Team the player joined.
        team: Option<String>,
    },
    /// Enrollment refused.
    Rejected {
        /// Reason given by the server.
        reason: String,
    },
}

/// Connected display counters by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClientCounts {
    /// Admin consoles.
    pub admin: u32,
    /// TV displays.
    pub tv: u32,
}

/// Server storage usage.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FsInfo {
    /// Bytes used.
    pub used: u64,
    /// Bytes free.
    pub free: u64,
    /// Total bytes.
    pub total: u64,
    /// Percentage used.
    pub percent_used: f64,
}

/// One line of the server log stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogEntry {
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    /// Level (DEBUG, INFO, WARN, ERROR).
    pub level: String,
    /// Emitting component.
    pub component: String,
    /// Message text.
    pub message: String,
}

/// Game-wide state, replaced or merged on every relevant message.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Current phase.
    pub phase: Phase,
    /// Seconds remaining, as last pushed by the server.
    pub timer: u32,
    /// Seconds at question start.
    pub total_time: u32,
    /// Seconds remaining in the pre-start countdown.
    pub countdown_time: u32,
    /// Server epoch reference for reaction times.
    pub game_time: i64,
    /// Question being played or last played.
    pub question: Option<Question>,
    /// What the TV shows.
    pub remote: RemoteMode,
    /// Background carousel.
    pub backgrounds: Vec<Background>,
    /// Server-synchronized carousel index.
    pub current_background_index: usize,
    /// Face-up memory cards (at most two).
    pub memory_flipped_cards: Vec<String>,
    /// Matched memory pair ids; append-only within a question.
    pub memory_matched_pairs: Vec<String>,
    /// Memory mismatches.
    pub memory_errors: u32,
    /// Ruled-out QCM answers; append-only within a question.
    pub qcm_invalidated: Vec<AnswerColor>,
    /// Enrolled virtual players.
    pub virtual_player_count: u32,
    /// Virtual player cap.
    pub virtual_player_limit: u32,
    /// Whether enrollment is open.
    pub enrollment_active: bool,
    /// Whether the TV shows the enrollment QR code.
    pub show_qr_code: bool,
    /// Display effect settings.
    pub display_effect: Option<DisplayEffect>,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: Phase::Stopped,
            timer: 30,
            total_time: 30,
            countdown_time: 0,
            game_time: 0,
            question: None,
            remote: RemoteMode::Game,
            backgrounds: Vec::new(),
            current_background_index: 0,
            memory_flipped_cards: Vec::new(),
            memory_matched_pairs: Vec::new(),
            memory_errors: 0,
            qcm_invalidated: Vec::new(),
            virtual_player_count: 0,
            virtual_player_limit: DEFAULT_VIRTUAL_PLAYER_LIMIT,
            enrollment_active: false,
            show_qr_code: false,
            display_effect: None,
        }
    }
}

impl GameState {
    /// Background currently on screen, wrapping the index around the list.
    pub fn current_background(&self) -> Option<&Background> {
        if self.backgrounds.is_empty() {
            return None;
        }
        self.backgrounds
            .get(self.current_background_index % self.backgrounds.len())
    }

    /// Reaction time of a buzz relative to the server game time reference.
    pub fn reaction_time(&self, buzz_time: i64) -> Option<i64> {
        (self.game_time > 0 && buzz_time >= self.game_time).then(|| buzz_time - self.game_time)
    }

    /// Kind of the current question, if any.
    pub fn question_kind(&self) -> Option<QuestionKind> {
        self.question.as_ref().map(|question| question.kind)
    }

    /// Drop every per-question transient field.
    pub(crate) fn reset_question_fields(&mut self) {
        self.memory_flipped_cards.clear();
        self.memory_matched_pairs.clear();
        self.memory_errors = 0;
        self.qcm_invalidated.clear();
    }
}

impl From<ColorPayload> for TeamColor {
    fn from(value: ColorPayload) -> Self {
        match value {
            ColorPayload::Rgb(rgb) => Self::Rgb(rgb),
            ColorPayload::Css(css) => Self::Css(css),
        }
    }
}

impl From<(String, TeamPayload)> for Team {
    fn from((name, value): (String, TeamPayload)) -> Self {
        Self {
            name,
            color: value.color.map(Into::into),
            score: value.score,
            team_points: value.team_points,
            ready: value.ready,
            buzz_time: value.time.filter(|time| *time > 0),
            status: value.status,
            extra: value.extra,
        }
    }
}

impl From<(String, BumperPayload)> for Bumper {
    fn from((id, value): (String, BumperPayload)) -> Self {
        Self {
            name: value
                .name
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| short_id(&id)),
            id,
            team: value.team.filter(|team| !team.is_empty()),
            score: value.score,
            buzz_time: value.time.filter(|time| *time > 0),
            button: value.button.filter(|button| !button.is_empty()),
            answer_color: value.answer_color,
            ready: value.ready,
            is_virtual: value.is_virtual,
            hints_at_buzz: value.hints_at_buzz,
            status: value.status,
            version: value.version,
            ip: value.ip.filter(|ip| !ip.is_empty()),
            extra: value.extra,
        }
    }
}

/// Fallback display name: last six characters of the id.
fn short_id(id: &str) -> String {
    let skip = id.chars().count().saturating_sub(6);
    id.chars().skip(skip).collect()
}

impl From<MemoryCardPayload> for MemoryCard {
    fn from(value: MemoryCardPayload) -> Self {
        Self {
            text: value.text,
            image: value.image,
            is_image: value.is_image,
        }
    }
}

impl From<MemoryPairPayload> for MemoryPair {
    fn from(value: MemoryPairPayload) -> Self {
        Self {
            id: value.id.unwrap_or_default(),
            card1: value.card1.into(),
            card2: value.card2.into(),
        }
    }
}

impl From<MemoryConfigPayload> for MemoryConfig {
    fn from(value: MemoryConfigPayload) -> Self {
        let defaults = Self::default();
        Self {
            // Zero means "unset" for the per-pair value, matching the question editor.
            points_per_pair: value
                .points_per_pair
                .filter(|points| *points > 0)
                .unwrap_or(defaults.points_per_pair),
            error_penalty: value.error_penalty.unwrap_or(defaults.error_penalty),
            completion_bonus: value.completion_bonus.unwrap_or(defaults.completion_bonus),
            flip_delay: value.flip_delay.unwrap_or(defaults.flip_delay),
            use_timer: value.use_timer.unwrap_or(defaults.use_timer),
            memorize_time: value
                .memorize_time
                .filter(|seconds| *seconds > 0.0)
                .unwrap_or(defaults.memorize_time),
            show_during_memorize: value
                .show_during_memorize
                .unwrap_or(defaults.show_during_memorize),
            reveal_delay: value
                .reveal_delay
                .filter(|seconds| *seconds > 0.0)
                .unwrap_or(defaults.reveal_delay),
        }
    }
}

impl From<QuestionPayload> for Question {
    fn from(value: QuestionPayload) -> Self {
        let kind = value.kind.unwrap_or_default();
        let qcm = (kind == QuestionKind::Qcm).then(|| QcmConfig {
            answers: value.qcm_answers.unwrap_or_default(),
            correct: value.qcm_correct,
            hints_enabled: value.qcm_hints_enabled.unwrap_or(false),
            hint_thresholds: (value.qcm_hint_threshold_1, value.qcm_hint_threshold_2),
            penalty_1: positive_or(value.qcm_penalty_1, DEFAULT_QCM_PENALTY_1),
            penalty_2: positive_or(value.qcm_penalty_2, DEFAULT_QCM_PENALTY_2),
        });
        let memory = (kind == QuestionKind::Memory)
            .then(|| value.memory_config.unwrap_or_default().into());

        Self {
            id: value.id.unwrap_or_default(),
            kind,
            text: value.text.unwrap_or_default(),
            answer: value.answer.unwrap_or_default(),
            points: value.points.unwrap_or_default(),
            time_limit: value.time.unwrap_or_default(),
            media: value.media.filter(|media| !media.is_empty()),
            media_answer: value.media_answer.filter(|media| !media.is_empty()),
            category: value.category.filter(|category| !category.is_empty()),
            points_target: value.points_target.unwrap_or_default(),
            status: value.status,
            order: value.order,
            qcm,
            memory_pairs: value
                .memory_pairs
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            memory,
        }
    }
}

/// Unset or zero multipliers fall back to the default.
fn positive_or(value: Option<f64>, default: f64) -> f64 {
    value
        .filter(|multiplier| multiplier.is_finite() && *multiplier > 0.0)
        .unwrap_or(default)
}

impl From<BackgroundPayload> for Background {
    fn from(value: BackgroundPayload) -> Self {
        Self {
            path: value.path,
            duration_secs: value.duration.filter(|secs| *secs > 0).unwrap_or(10),
            opacity: value.opacity.unwrap_or(100.0).clamp(0.0, 100.0),
        }
    }
}

impl From<NeonEffectPayload> for DisplayEffect {
    fn from(value: NeonEffectPayload) -> Self {
        Self {
            enabled: value.enabled,
            mode: value
                .mode
                .filter(|mode| !mode.is_empty())
                .unwrap_or_else(|| "bar".into()),
            arc_width: value.arc_width.filter(|w| *w > 0).unwrap_or(60),
            intensity_gap: value.intensity_gap.filter(|g| *g > 0).unwrap_or(80),
            rotation_speed: value.rotation_speed.filter(|s| *s > 0.0).unwrap_or(4.0),
            bar_offset: value.bar_offset.filter(|o| *o > 0).unwrap_or(20),
        }
    }
}

impl From<FsInfoPayload> for FsInfo {
    fn from(value: FsInfoPayload) -> Self {
        Self {
            used: value.used,
            free: value.free,
            total: value.total,
            percent_used: value.percent_used,
        }
    }
}

impl From<LogEntryPayload> for LogEntry {
    fn from(value: LogEntryPayload) -> Self {
        Self {
            timestamp: value.timestamp,
            level: value.level,
            component: value.component,
            message: value.message,
        }
    }
}
