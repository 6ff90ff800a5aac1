//! Competition ranking shared by team and player scoreboards.

use std::cmp::{Ordering, Reverse};

use crate::state::{
    ClientState,
    game::{Bumper, Team, TeamColor},
};

/// An item together with its 1-based competition rank.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    /// Shared by every item with the same score; skips values after ties.
    pub rank: usize,
    /// The ranked item.
    pub item: T,
}

/// Rank `items` by descending score.
///
/// The sort is stable, so tied items keep their input order, and ties share the rank of the first
/// item at that score (1, 1, 3, 4, 4, 6).
pub fn rank_by<T, F>(items: impl IntoIterator<Item = T>, score_of: F) -> Vec<Ranked<T>>
where
    F: Fn(&T) -> i64,
{
    let mut items: Vec<T> = items.into_iter().collect();
    items.sort_by_key(|item| Reverse(score_of(item)));

    let mut ranked = Vec::with_capacity(items.len());
    let mut previous: Option<(i64, usize)> = None;
    for (index, item) in items.into_iter().enumerate() {
        let score = score_of(&item);
        let rank = match previous {
            Some((last_score, last_rank)) if last_score == score => last_rank,
            _ => index + 1,
        };
        previous = Some((score, rank));
        ranked.push(Ranked { rank, item });
    }
    ranked
}

/// Reorder tied items so the earliest buzz comes first, items without a buzz last.
///
/// Only the display order changes; ranks are left as they are.
pub fn order_ties_by_buzz<T>(ranked: &mut [Ranked<T>], buzz_of: impl Fn(&T) -> Option<i64>) {
    ranked.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| match (buzz_of(&a.item), buzz_of(&b.item)) {
                (Some(a), Some(b)) => a.cmp(&b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
}

/// Highest score in `scores`, at least 1 so it can scale a bar chart.
pub fn max_score(scores: impl IntoIterator<Item = i64>) -> i64 {
    scores.into_iter().fold(1, i64::max)
}

/// Player row of the scoreboard.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerStanding<'a> {
    /// The ranked bumper.
    pub bumper: &'a Bumper,
    /// Its team, `None` when unassigned or when the reference dangles.
    pub team: Option<&'a Team>,
}

impl<'a> PlayerStanding<'a> {
    /// Colour of the player's team, if any.
    pub fn team_color(&self) -> Option<&'a TeamColor> {
        self.team.and_then(|team| team.color.as_ref())
    }
}

/// Teams ranked by score, in server order among ties.
pub fn team_standings(state: &ClientState) -> Vec<Ranked<&Team>> {
    rank_by(state.teams.values(), |team| team.score)
}

/// Players ranked by individual score, joined to their team.
pub fn player_standings(state: &ClientState) -> Vec<Ranked<PlayerStanding<'_>>> {
    let players = state.bumpers.values().map(|bumper| PlayerStanding {
        bumper,
        team: state.team_of(bumper),
    });
    rank_by(players, |player| player.bumper.score)
}
