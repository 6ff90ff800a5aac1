//! Message reducer: folds decoded server messages into a [`ClientState`].
//!
//! Applying a message never fails. Payload shape problems are rejected earlier, when the frame is
//! decoded, so a message that reaches the reducer only carries fields that can be read safely.

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    dto::{
        game::{BumperPayload, GamePayload, QuestionPayload, SyncPayload, TeamPayload},
        ws::{InboundMessage, ServerMessage},
    },
    state::{
        ClientState, MAX_LOG_ENTRIES,
        game::{Bumper, ClientCounts, EnrollmentOutcome, MAX_FLIPPED_CARDS, Question, Team},
        phase::Phase,
    },
};

/// Apply `message` to `state` and return the resulting state.
pub fn reduce(mut state: ClientState, message: &InboundMessage) -> ClientState {
    state.apply(message);
    state
}

impl ClientState {
    /// Apply one inbound message in place.
    pub fn apply(&mut self, message: &InboundMessage) {
        if let Some(fs_info) = &message.fs_info {
            self.fs_info = Some(fs_info.clone().into());
        }
        if let Some(version) = &message.version {
            self.server_version = Some(version.clone());
        }

        match &message.body {
            ServerMessage::Start(game) => self.apply_start(game),
            ServerMessage::Stop(game) => {
                if let Some(question) = game.as_ref().and_then(|game| game.question.as_ref()) {
                    self.set_question(question);
                }
                self.set_phase(Phase::Stopped);
            }
            ServerMessage::Pause => self.set_phase(Phase::Paused),
            ServerMessage::Continue => self.set_phase(Phase::Started),
            ServerMessage::Update(sync) => {
                let game = sync.game();
                if let Some(question) = game.and_then(|game| game.question.as_ref()) {
                    self.set_question(question);
                }
                let hints_before = self.game.qcm_invalidated.len();
                if let Some(game) = game {
                    self.merge_game(game);
                }
                self.replace_rosters(sync, hints_before);
            }
            ServerMessage::UpdateTimer(game) => self.apply_timer(game),
            ServerMessage::Ready(ready) => {
                if let Some(question) = &ready.question {
                    self.set_question(question);
                }
                self.set_phase(Phase::Ready);
            }
            ServerMessage::Reveal => self.set_phase(Phase::Revealed),
            ServerMessage::Remote(sync) => {
                if let Some(remote) = sync.game().and_then(|game| game.remote) {
                    self.game.remote = remote;
                }
                self.replace_rosters(sync, self.game.qcm_invalidated.len());
            }
            ServerMessage::Bumper(sync) => {
                self.replace_rosters(sync, self.game.qcm_invalidated.len());
            }
            ServerMessage::Questions(questions) => {
                let mut catalog: Vec<Question> =
                    questions.iter().cloned().map(Question::from).collect();
                // Unordered entries go last, in arrival order.
                catalog.sort_by_key(|question| {
                    let position = question.catalog_position();
                    (position.is_none(), position)
                });
                self.questions = catalog
                    .into_iter()
                    .map(|question| (question.id.clone(), question))
                    .collect();
            }
            ServerMessage::Clients(clients) => {
                self.clients = ClientCounts {
                    admin: clients.admin_count,
                    tv: clients.tv_count,
                };
            }
            ServerMessage::BackgroundChange(change) => {
                self.game.current_background_index = change.index;
            }
            ServerMessage::QcmHint(hint) => {
                if !self.game.qcm_invalidated.contains(&hint.color) {
                    self.game.qcm_invalidated.push(hint.color);
                }
            }
            ServerMessage::ShowQrCode => {
                self.game.show_qr_code = true;
                self.game.enrollment_active = true;
            }
            ServerMessage::HideQrCode => {
                self.game.show_qr_code = false;
                self.game.enrollment_active = false;
            }
            ServerMessage::EnrollmentUpdate(update) => {
                if let Some(count) = update.virtual_player_count {
                    self.game.virtual_player_count = count;
                }
                if let Some(limit) = update.virtual_player_limit {
                    self.game.virtual_player_limit = limit;
                }
                if let Some(active) = update.enrollment_active {
                    self.game.enrollment_active = active;
                }
            }
            ServerMessage::PlayerConnected(player) => {
                self.enrollment = Some(EnrollmentOutcome::Connected {
                    id: player.id.clone(),
                    name: player.name.clone(),
                });
            }
            ServerMessage::PlayerAssigned(player) => {
                self.enrollment = Some(EnrollmentOutcome::Assigned {
                    id: player.id.clone(),
                    team: player.team.clone(),
                });
            }
            ServerMessage::PlayerRejected(player) => {
                self.enrollment = Some(EnrollmentOutcome::Rejected {
                    reason: player.reason.clone().unwrap_or_else(|| "unknown".into()),
                });
            }
            ServerMessage::ConfigUpdate(config) => {
                if let Some(effect) = &config.neon_effect {
                    self.game.display_effect = Some(effect.clone().into());
                }
            }
            ServerMessage::LogHistory(history) => {
                self.logs = history.entries.iter().cloned().map(Into::into).collect();
                self.trim_logs();
            }
            ServerMessage::LogEntry(entry) => {
                self.logs.push(entry.clone().into());
                self.trim_logs();
            }
            ServerMessage::Unknown(action) => {
                debug!(action = %action, "ignoring unknown action");
                return;
            }
        }

        debug!(action = %message.body.action(), phase = ?self.game.phase, "applied message");
    }

    fn apply_start(&mut self, game: &GamePayload) {
        if let Some(question) = &game.question {
            self.set_question(question);
        }
        self.set_phase(game.phase.unwrap_or(Phase::Started));
        if let Some(timer) = game.current_time.or(game.delay) {
            self.game.timer = timer;
        }
        if let Some(delay) = game.delay {
            self.game.total_time = delay;
        }
        if let Some(countdown) = game.countdown_time {
            self.game.countdown_time = countdown;
        }
        if let Some(time) = game.time {
            self.game.game_time = time;
        }
    }

    /// UPDATE_TIMER only ever touches phase and clocks.
    fn apply_timer(&mut self, game: &GamePayload) {
        if let Some(phase) = game.phase {
            self.set_phase(phase);
        }
        if let Some(timer) = game.current_time {
            self.game.timer = timer;
        }
        if let Some(countdown) = game.countdown_time {
            self.game.countdown_time = countdown;
        }
        if let Some(time) = game.time {
            self.game.game_time = time;
        }
    }

    /// Merge an UPDATE game block; the question itself is installed beforehand.
    fn merge_game(&mut self, game: &GamePayload) {
        if let Some(phase) = game.phase {
            self.set_phase(phase);
        }
        if let Some(timer) = game.current_time.or(game.delay) {
            self.game.timer = timer;
        }
        if let Some(delay) = game.delay {
            self.game.total_time = delay;
        }
        if let Some(countdown) = game.countdown_time {
            self.game.countdown_time = countdown;
        }
        if let Some(time) = game.time {
            self.game.game_time = time;
        }
        if let Some(remote) = game.remote {
            self.game.remote = remote;
        }
        if let Some(backgrounds) = &game.backgrounds {
            self.game.backgrounds = backgrounds.iter().cloned().map(Into::into).collect();
        }
        if let Some(index) = game.current_background_index {
            self.game.current_background_index = index;
        }

        // Flipped cards and errors are a live snapshot; absent means none.
        let mut flipped = game.memory_flipped_cards.clone().unwrap_or_default();
        flipped.truncate(MAX_FLIPPED_CARDS);
        self.game.memory_flipped_cards = flipped;
        self.game.memory_errors = game.memory_errors.unwrap_or_default();

        // Matched pairs and invalidated hints only grow within a question.
        if let Some(matched) = &game.memory_matched_pairs {
            union_into(&mut self.game.memory_matched_pairs, matched);
        }
        if let Some(invalidated) = &game.qcm_invalidated {
            union_into(&mut self.game.qcm_invalidated, invalidated);
        }

        if let Some(count) = game.virtual_player_count {
            self.game.virtual_player_count = count;
        }
        if let Some(limit) = game.virtual_player_limit {
            self.game.virtual_player_limit = limit;
        }
        if let Some(active) = game.enrollment_active {
            self.game.enrollment_active = active;
        }
        if let Some(show) = game.show_qr_code {
            self.game.show_qr_code = show;
        }
    }

    fn set_phase(&mut self, next: Phase) {
        let current = self.game.phase;
        if !current.is_expected_transition(next) {
            debug!(from = ?current, to = ?next, "unexpected phase transition");
        }
        self.game.phase = next;
    }

    /// Install a question, dropping the per-question transient fields when it is a new one.
    fn set_question(&mut self, payload: &QuestionPayload) {
        let question = Question::from(payload.clone());
        let is_new = self
            .game
            .question
            .as_ref()
            .is_none_or(|current| current.id != question.id);
        if is_new {
            self.game.reset_question_fields();
            for bumper in self.bumpers.values_mut() {
                bumper.hints_at_buzz = None;
            }
        }
        self.game.question = Some(question);
    }

    /// Replace Teams/Bumpers wholesale when the payload carries them.
    ///
    /// `hints_before` is the invalidated-hint count before this message was applied; it becomes
    /// the hint snapshot of any bumper whose buzz appears here without one.
    fn replace_rosters(&mut self, sync: &SyncPayload, hints_before: usize) {
        if let Some(teams) = &sync.teams {
            self.teams = teams_from(teams);
        }
        if let Some(bumpers) = &sync.bumpers {
            let previous = std::mem::take(&mut self.bumpers);
            self.bumpers = bumpers_from(bumpers);
            for bumper in self.bumpers.values_mut() {
                capture_hint_snapshot(bumper, previous.get(&bumper.id), hints_before);
            }
        }
    }

    fn trim_logs(&mut self) {
        if self.logs.len() > MAX_LOG_ENTRIES {
            let excess = self.logs.len() - MAX_LOG_ENTRIES;
            self.logs.drain(..excess);
        }
    }
}

fn teams_from(teams: &IndexMap<String, TeamPayload>) -> IndexMap<String, Team> {
    teams
        .iter()
        .map(|(name, team)| (name.clone(), Team::from((name.clone(), team.clone()))))
        .collect()
}

fn bumpers_from(bumpers: &IndexMap<String, BumperPayload>) -> IndexMap<String, Bumper> {
    bumpers
        .iter()
        .map(|(id, bumper)| (id.clone(), Bumper::from((id.clone(), bumper.clone()))))
        .collect()
}

/// Keep the hint count seen when the bumper first buzzed, unless the server sent one.
fn capture_hint_snapshot(bumper: &mut Bumper, previous: Option<&Bumper>, hints_now: usize) {
    if bumper.hints_at_buzz.is_some() || bumper.buzz_time.is_none() {
        return;
    }
    let carried = previous
        .filter(|previous| previous.buzz_time == bumper.buzz_time)
        .and_then(|previous| previous.hints_at_buzz);
    bumper.hints_at_buzz =
        Some(carried.unwrap_or_else(|| u32::try_from(hints_now).unwrap_or(u32::MAX)));
}

/// Append the entries of `incoming` missing from `target`, keeping first-seen order.
fn union_into<T: PartialEq + Clone>(target: &mut Vec<T>, incoming: &[T]) {
    for item in incoming {
        if !target.contains(item) {
            target.push(item.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::state::{
        game::{AnswerColor, QuestionKind},
        phase::RemoteMode,
    };

    fn frame(value: Value) -> InboundMessage {
        InboundMessage::from_json_str(&value.to_string()).unwrap()
    }

    fn apply_all(frames: impl IntoIterator<Item = Value>) -> ClientState {
        frames
            .into_iter()
            .fold(ClientState::default(), |state, value| reduce(state, &frame(value)))
    }

    fn qcm_update(invalidated: Value, bumpers: Value) -> Value {
        json!({
            "ACTION": "UPDATE",
            "MSG": {
                "GAME": {
                    "PHASE": "STARTED",
                    "QUESTION": { "ID": 9, "TYPE": "QCM", "POINTS": 10 },
                    "QCM_INVALIDATED": invalidated
                },
                "bumpers": bumpers
            }
        })
    }

    #[test]
    fn ready_start_timer_scenario() {
        let state = ClientState::default();
        assert_eq!(state.game.phase, Phase::Stopped);
        assert_eq!(state.game.timer, 30);
        assert_eq!(state.game.total_time, 30);

        let state = reduce(
            state,
            &frame(json!({
                "ACTION": "READY",
                "MSG": { "QUESTION": { "ID": 7, "TIME": 40, "POINTS": 5 } }
            })),
        );
        assert_eq!(state.game.phase, Phase::Ready);
        assert_eq!(state.game.question.as_ref().map(|q| q.id.as_str()), Some("7"));

        let state = reduce(
            state,
            &frame(json!({ "ACTION": "START", "MSG": { "DELAY": 40, "POINTS": 5 } })),
        );
        assert_eq!(state.game.phase, Phase::Started);
        assert_eq!(state.game.total_time, 40);
        assert_eq!(state.game.timer, 40);

        let state = reduce(
            state,
            &frame(json!({ "ACTION": "UPDATE_TIMER", "MSG": { "CURRENT_TIME": 25 } })),
        );
        assert_eq!(state.game.timer, 25);
        assert_eq!(state.game.phase, Phase::Started);
    }

    #[test]
    fn start_honours_countdown_sub_phase() {
        let state = apply_all([json!({
            "ACTION": "START",
            "MSG": { "GAME": { "PHASE": "COUNTDOWN", "DELAY": 30, "COUNTDOWN_TIME": 3, "TIME": 1000 } }
        })]);
        assert_eq!(state.game.phase, Phase::Countdown);
        assert_eq!(state.game.countdown_time, 3);
        assert_eq!(state.game.game_time, 1000);
    }

    #[test]
    fn pause_continue_stop_reveal() {
        let state = apply_all([
            json!({ "ACTION": "READY", "MSG": { "QUESTION": { "ID": 1 } } }),
            json!({ "ACTION": "START", "MSG": { "DELAY": 20 } }),
            json!({ "ACTION": "PAUSE" }),
        ]);
        assert_eq!(state.game.phase, Phase::Paused);
        let paused_timer = state.game.timer;

        let state = reduce(state, &frame(json!({ "ACTION": "CONTINUE", "MSG": {} })));
        assert_eq!(state.game.phase, Phase::Started);
        assert_eq!(state.game.timer, paused_timer);

        let state = reduce(state, &frame(json!({ "ACTION": "STOP", "MSG": {} })));
        assert_eq!(state.game.phase, Phase::Stopped);
        assert_eq!(state.game.question.as_ref().map(|q| q.id.as_str()), Some("1"));

        let state = reduce(state, &frame(json!({ "ACTION": "REVEAL", "MSG": {} })));
        assert_eq!(state.game.phase, Phase::Revealed);
    }

    #[test]
    fn update_is_idempotent() {
        let update = frame(json!({
            "ACTION": "UPDATE",
            "MSG": {
                "GAME": {
                    "PHASE": "STARTED",
                    "CURRENT_TIME": 12,
                    "QUESTION": { "ID": 4, "TYPE": "MEMORY", "MEMORY_PAIRS": [{ "ID": 1 }, { "ID": 2 }] },
                    "MEMORY_MATCHED_PAIRS": [1],
                    "MEMORY_FLIPPED_CARDS": ["c1", "c2", "c3"],
                    "MEMORY_ERRORS": 2
                },
                "teams": { "Red": { "SCORE": 10, "COLOR": [255, 0, 0] } },
                "bumpers": { "b1": { "NAME": "Ann", "TEAM": "Red", "SCORE": 4, "TIME": 1500 } }
            },
            "VERSION": "2.1.0"
        }));

        let once = reduce(ClientState::default(), &update);
        let twice = reduce(once.clone(), &update);
        assert_eq!(once, twice);
        assert_eq!(once.game.memory_flipped_cards.len(), MAX_FLIPPED_CARDS);
        assert_eq!(once.server_version.as_deref(), Some("2.1.0"));
        assert_eq!(once.bumpers["b1"].hints_at_buzz, Some(0));
    }

    #[test]
    fn update_timer_never_touches_rosters() {
        let state = apply_all([json!({
            "ACTION": "UPDATE",
            "MSG": { "teams": { "Red": { "SCORE": 3 } } }
        })]);
        let state = reduce(
            state,
            &frame(json!({
                "ACTION": "UPDATE_TIMER",
                "MSG": { "GAME": { "CURRENT_TIME": 5 }, "teams": {} }
            })),
        );
        assert_eq!(state.teams.len(), 1);
        assert_eq!(state.game.timer, 5);
    }

    #[test]
    fn unknown_action_leaves_state_unchanged() {
        let state = apply_all([json!({
            "ACTION": "UPDATE",
            "MSG": { "GAME": { "PHASE": "READY" }, "teams": { "Red": {} } }
        })]);
        let after = reduce(state.clone(), &frame(json!({ "ACTION": "CONFETTI", "MSG": { "x": 1 } })));
        assert_eq!(state, after);
    }

    #[test]
    fn malformed_payload_is_rejected_before_reaching_state() {
        assert!(InboundMessage::from_json_str(r#"{"ACTION":"BACKGROUND_CHANGE","MSG":{}}"#).is_err());
        assert!(InboundMessage::from_json_str(r#"{"ACTION":"UPDATE","MSG":{"teams":[1,2]}}"#).is_err());
    }

    #[test]
    fn hints_append_and_never_shrink_within_a_question() {
        let state = apply_all([
            json!({ "ACTION": "READY", "MSG": { "QUESTION": { "ID": 9, "TYPE": "QCM" } } }),
            json!({ "ACTION": "QCM_HINT", "MSG": { "COLOR": "RED" } }),
            json!({ "ACTION": "QCM_HINT", "MSG": { "COLOR": "RED" } }),
            json!({ "ACTION": "QCM_HINT", "MSG": { "COLOR": "BLUE", "REMAINING": 2 } }),
        ]);
        assert_eq!(state.game.qcm_invalidated, [AnswerColor::Red, AnswerColor::Blue]);

        // A sync that lags behind must not drop hints already seen.
        let state = reduce(state, &frame(qcm_update(json!(["RED"]), json!({}))));
        assert_eq!(state.game.qcm_invalidated, [AnswerColor::Red, AnswerColor::Blue]);
        assert_eq!(state.game.question_kind(), Some(QuestionKind::Qcm));
    }

    #[test]
    fn new_question_resets_transient_fields() {
        let state = apply_all([
            json!({ "ACTION": "READY", "MSG": { "QUESTION": { "ID": 9, "TYPE": "QCM" } } }),
            json!({ "ACTION": "QCM_HINT", "MSG": { "COLOR": "GREEN" } }),
            json!({ "ACTION": "READY", "MSG": { "QUESTION": { "ID": 10 } } }),
        ]);
        assert!(state.game.qcm_invalidated.is_empty());
        assert_eq!(state.game.memory_errors, 0);
    }

    #[test]
    fn hint_snapshot_is_taken_when_the_buzz_first_appears() {
        let early = json!({ "b1": { "TIME": 1000 }, "b2": {} });
        let late = json!({ "b1": { "TIME": 1000 }, "b2": { "TIME": 2000 } });

        let state = apply_all([
            qcm_update(json!([]), early),
            json!({ "ACTION": "QCM_HINT", "MSG": { "COLOR": "RED" } }),
            json!({ "ACTION": "QCM_HINT", "MSG": { "COLOR": "GREEN" } }),
            qcm_update(json!(["RED", "GREEN"]), late),
        ]);

        assert_eq!(state.bumpers["b1"].hints_at_buzz, Some(0));
        assert_eq!(state.bumpers["b2"].hints_at_buzz, Some(2));
    }

    #[test]
    fn server_hint_snapshot_wins() {
        let state = apply_all([qcm_update(
            json!(["RED"]),
            json!({ "b1": { "TIME": 1000, "HINTS_AT_BUZZ": 0 } }),
        )]);
        assert_eq!(state.bumpers["b1"].hints_at_buzz, Some(0));
    }

    #[test]
    fn remote_and_bumper_replace_rosters() {
        let state = apply_all([
            json!({
                "ACTION": "REMOTE",
                "MSG": { "GAME": { "REMOTE": "SCORE" }, "teams": { "Red": {}, "Blue": {} } }
            }),
            json!({ "ACTION": "BUMPER", "MSG": { "teams": { "Blue": {} }, "bumpers": { "b1": {} } } }),
        ]);
        assert_eq!(state.game.remote, RemoteMode::Score);
        assert_eq!(state.teams.keys().collect::<Vec<_>>(), ["Blue"]);
        assert_eq!(state.bumpers.len(), 1);
    }

    #[test]
    fn catalog_clients_and_background() {
        let state = apply_all([
            json!({
                "ACTION": "QUESTIONS",
                "MSG": { "a": { "ID": 2, "QUESTION": "Two" }, "b": { "ID": 1, "QUESTION": "One" } },
                "FSINFO": { "USED": 5, "FREE": 5, "TOTAL": 10, "P_USED": 50.0 }
            }),
            json!({ "ACTION": "CLIENTS", "MSG": { "ADMIN_COUNT": 1, "TV_COUNT": 2 } }),
            json!({ "ACTION": "BACKGROUND_CHANGE", "MSG": { "INDEX": 4 } }),
        ]);
        assert_eq!(state.questions.keys().collect::<Vec<_>>(), ["1", "2"]);
        assert_eq!(state.clients, ClientCounts { admin: 1, tv: 2 });
        assert_eq!(state.game.current_background_index, 4);
        assert_eq!(state.fs_info.map(|info| info.total), Some(10));
    }

    /// Catalog as the server reads it from disk: questions saved by the upload form and the demo
    /// loader keep `POINTS`/`TIME` as strings and are keyed by their directory path.
    fn server_catalog() -> Value {
        json!({
            "ACTION": "QUESTIONS",
            "MSG": {
                "/files/questions/demo2": {
                    "ID": "demo2",
                    "QUESTION": "Quel acteur joue Iron Man dans les films Marvel?",
                    "ANSWER": "Robert Downey Jr.",
                    "POINTS": "10",
                    "TIME": "30",
                    "TYPE": "NORMAL",
                    "CATEGORY": "ENTERTAINMENT",
                    "POINTS_TARGET": "PLAYER",
                    "ORDER": 1
                },
                "/files/questions/demo1": {
                    "ID": "demo1",
                    "QUESTION": "Quelle est la capitale de l'Australie?",
                    "ANSWER": "Canberra",
                    "POINTS": "10",
                    "TIME": "20",
                    "TYPE": "QCM",
                    "CATEGORY": "GEOGRAPHY",
                    "POINTS_TARGET": "TEAM",
                    "QCM_HINTS_ENABLED": true,
                    "QCM_HINT_THRESHOLD_1": 0.25,
                    "QCM_HINT_THRESHOLD_2": 0.125,
                    "QCM_PENALTY_1": 0.67,
                    "QCM_PENALTY_2": 0.33,
                    "QCM_ANSWERS": {
                        "RED": "Sydney",
                        "GREEN": "Canberra",
                        "YELLOW": "Melbourne",
                        "BLUE": "Brisbane"
                    },
                    "QCM_CORRECT": "GREEN",
                    "ORDER": 0,
                    "MEDIA": "/question/demo1/media.jpg"
                },
                "/files/questions/7": {
                    "ID": "7",
                    "QUESTION": "Uploaded from the form",
                    "ANSWER": "42",
                    "POINTS": "",
                    "TIME": "15"
                }
            }
        })
    }

    #[test]
    fn catalog_from_disk_keeps_string_numbers_and_order() {
        let state = apply_all([server_catalog()]);
        assert_eq!(
            state.questions.keys().collect::<Vec<_>>(),
            ["demo1", "demo2", "7"]
        );

        let demo1 = &state.questions["demo1"];
        assert_eq!(demo1.points, 10);
        assert_eq!(demo1.time_limit, 20);
        let qcm = demo1.qcm.as_ref().unwrap();
        assert!(qcm.hints_enabled);
        assert_eq!(qcm.hint_thresholds, (Some(0.25), Some(0.125)));
        assert_eq!(qcm.correct, Some(AnswerColor::Green));

        let uploaded = &state.questions["7"];
        assert_eq!(uploaded.points, 0);
        assert_eq!(uploaded.time_limit, 15);
    }

    #[test]
    fn ready_with_string_numbers_moves_to_ready() {
        let state = apply_all([json!({
            "ACTION": "READY",
            "MSG": {
                "QUESTION": {
                    "ID": "demo1",
                    "POINTS": "10",
                    "TIME": "20",
                    "TYPE": "QCM",
                    "QCM_HINTS_ENABLED": true
                }
            }
        })]);
        assert_eq!(state.game.phase, Phase::Ready);
        let question = state.game.question.unwrap();
        assert_eq!(question.points, 10);
        assert_eq!(question.time_limit, 20);
        assert!(question.qcm.is_some_and(|qcm| qcm.hints_enabled));
    }

    #[test]
    fn server_update_keeps_rosters_next_to_a_string_typed_question() {
        let state = apply_all([json!({
            "ACTION": "UPDATE",
            "MSG": {
                "GAME": {
                    "PHASE": "PREPARE",
                    "DELAY": 20,
                    "CURRENT_TIME": 20,
                    "QUESTION": { "ID": "demo4", "POINTS": "10", "TIME": "20", "TYPE": "NORMAL" }
                },
                "teams": {
                    "Red": {
                        "NAME": "Red",
                        "COLOR": [239, 68, 68],
                        "SCORE": 12,
                        "STATUS": "PENDING",
                        "BUMPER": "aabbccddeeff"
                    }
                },
                "bumpers": {
                    "aabbccddeeff": {
                        "NAME": "Anna",
                        "TEAM": "Red",
                        "SCORE": 4,
                        "VERSION": "1.4",
                        "IP": "192.168.1.20",
                        "READY": true
                    }
                }
            },
            "VERSION": "2.0.1"
        })]);
        assert_eq!(state.game.phase, Phase::Prepare);
        assert_eq!(state.game.question.as_ref().map(|q| q.points), Some(10));
        assert_eq!(state.teams["Red"].score, 12);
        assert_eq!(state.teams["Red"].extra["BUMPER"], "aabbccddeeff");
        let anna = &state.bumpers["aabbccddeeff"];
        assert_eq!(anna.ip.as_deref(), Some("192.168.1.20"));
        assert!(anna.ready);
        assert_eq!(state.server_version.as_deref(), Some("2.0.1"));
    }

    #[test]
    fn start_with_unknown_phase_defaults_to_started() {
        let state = apply_all([json!({
            "ACTION": "START",
            "MSG": { "GAME": { "PHASE": "WARMUP", "DELAY": 20 } }
        })]);
        assert_eq!(state.game.phase, Phase::Started);
        assert_eq!(state.game.timer, 20);
    }

    #[test]
    fn enrollment_flow() {
        let state = apply_all([
            json!({ "ACTION": "SHOW_QR_CODE" }),
            json!({
                "ACTION": "ENROLLMENT_UPDATE",
                "MSG": { "VIRTUAL_PLAYER_COUNT": 3, "VIRTUAL_PLAYER_LIMIT": 8 }
            }),
            json!({ "ACTION": "PLAYER_REJECTED", "MSG": { "REASON": "name taken" } }),
        ]);
        assert!(state.game.show_qr_code);
        assert!(state.game.enrollment_active);
        assert_eq!(state.game.virtual_player_count, 3);
        assert_eq!(state.game.virtual_player_limit, 8);
        assert_eq!(
            state.enrollment,
            Some(EnrollmentOutcome::Rejected {
                reason: "name taken".into()
            })
        );

        let state = reduce(state, &frame(json!({ "ACTION": "HIDE_QR_CODE" })));
        assert!(!state.game.show_qr_code);
        assert!(!state.game.enrollment_active);
    }

    #[test]
    fn log_buffer_is_bounded() {
        let mut state = ClientState::default();
        let entry = frame(json!({ "ACTION": "LOG_ENTRY", "MSG": { "level": "INFO", "message": "tick" } }));
        for _ in 0..MAX_LOG_ENTRIES + 5 {
            state.apply(&entry);
        }
        assert_eq!(state.logs.len(), MAX_LOG_ENTRIES);

        let state = reduce(
            state,
            &frame(json!({ "ACTION": "LOG_HISTORY", "MSG": { "entries": [{ "message": "boot" }] } })),
        );
        assert_eq!(state.logs.len(), 1);
        assert_eq!(state.logs[0].message, "boot");
    }

    #[test]
    fn config_update_sets_display_effect_defaults() {
        let state = apply_all([json!({
            "ACTION": "CONFIG_UPDATE",
            "MSG": { "neon_effect": { "enabled": true, "mode": "halo" } }
        })]);
        let effect = state.game.display_effect.unwrap();
        assert_eq!(effect.mode, "halo");
        assert_eq!(effect.arc_width, 60);
        assert_eq!(effect.bar_offset, 20);
    }
}
