mod config;
pub mod builder;
pub mod manual;

use log::{debug, info, warn};

use std::{
    cmp::Ordering,
    collections::{BTreeMap, BTreeSet, HashMap},
};

pub use crate::config::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct Points(i64);

impl Points {
    const EMPTY: Points = Points(0);

    /// None if the sum does not fit in an i64.
    fn checked_add(self, rhs: Points) -> Option<Points> {
        self.0.checked_add(rhs.0).map(Points)
    }
}

// Running totals for one voter.
// Invariant: num_votes > 0 once created through record().
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
struct VoterTally {
    total: Points,
    num_votes: u64,
    num_positive_votes: u64,
}

impl VoterTally {
    const EMPTY: VoterTally = VoterTally {
        total: Points::EMPTY,
        num_votes: 0,
        num_positive_votes: 0,
    };

    /// Returns None, leaving the tally untouched, if the total overflows.
    fn record(&mut self, points: i64) -> Option<()> {
        self.total = self.total.checked_add(Points(points))?;
        self.num_votes += 1;
        if points > 0 {
            self.num_positive_votes += 1;
        }
        Some(())
    }

    fn average(&self) -> f64 {
        if self.num_votes == 0 {
            0.0
        } else {
            self.total.0 as f64 / self.num_votes as f64
        }
    }

    fn average_when_positive(&self) -> f64 {
        if self.num_positive_votes == 0 {
            0.0
        } else {
            self.total.0 as f64 / self.num_positive_votes as f64
        }
    }

    /// Compares the averages by cross-multiplication, so that equal ratios
    /// such as 1/3 and 2/6 are always treated as ties.
    fn cmp_average(&self, other: &VoterTally) -> Ordering {
        let lhs = self.total.0 as i128 * other.num_votes as i128;
        let rhs = other.total.0 as i128 * self.num_votes as i128;
        lhs.cmp(&rhs)
    }
}

/// The lookup from a voted track to the competitor who submitted it.
///
/// The same track may be submitted again in a later round, possibly by
/// someone else, so entries are keyed by (track URI, round ID).
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct SubmitterIndex {
    by_round: HashMap<(String, String), String>,
    by_track: HashMap<String, BTreeSet<String>>,
    // submitter id -> one of the tracks they submitted, for error reporting
    submitters: BTreeMap<String, String>,
}

impl SubmitterIndex {
    /// Finds the submitter of a track voted in a given round.
    ///
    /// If no submission exists for this exact round, the track URI alone is
    /// used, provided that all the submissions of this track come from the
    /// same competitor.
    pub fn resolve(&self, track_uri: &str, round_id: &str) -> Option<&str> {
        if let Some(sid) = self
            .by_round
            .get(&(track_uri.to_string(), round_id.to_string()))
        {
            return Some(sid.as_str());
        }
        match self.by_track.get(track_uri) {
            Some(sids) if sids.len() == 1 => sids.iter().next().map(|s| s.as_str()),
            _ => None,
        }
    }

    /// All the competitors who submitted at least one track, sorted by ID.
    pub fn submitters(&self) -> impl Iterator<Item = &str> {
        self.submitters.keys().map(|s| s.as_str())
    }

    /// The number of distinct (track, round) submissions.
    pub fn len(&self) -> usize {
        self.by_round.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_round.is_empty()
    }
}

/// Builds the lookup from (track, round) to submitter.
///
/// Fails if the same track is attributed to two different competitors in
/// the same round. Exact duplicates are accepted.
pub fn build_submitter_index(submissions: &[Submission]) -> Result<SubmitterIndex, DataError> {
    let mut index = SubmitterIndex::default();
    for s in submissions.iter() {
        let key = (s.track_uri.clone(), s.round_id.clone());
        match index.by_round.get(&key) {
            Some(previous) if *previous != s.submitter_id => {
                return Err(DataError::ConflictingSubmission {
                    track_uri: s.track_uri.clone(),
                    round_id: s.round_id.clone(),
                    first: previous.clone(),
                    second: s.submitter_id.clone(),
                });
            }
            Some(_) => {
                debug!(
                    "build_submitter_index: duplicate submission {:?} in round {:?}",
                    s.track_uri, s.round_id
                );
            }
            None => {
                index.by_round.insert(key, s.submitter_id.clone());
            }
        }
        index
            .by_track
            .entry(s.track_uri.clone())
            .or_default()
            .insert(s.submitter_id.clone());
        index
            .submitters
            .entry(s.submitter_id.clone())
            .or_insert_with(|| s.track_uri.clone());
    }
    debug!(
        "build_submitter_index: {:?} submissions, {:?} tracks, {:?} submitters",
        index.by_round.len(),
        index.by_track.len(),
        index.submitters.len()
    );
    Ok(index)
}

fn competitor_names(competitors: &[Competitor]) -> HashMap<&str, &str> {
    competitors
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect()
}

/// Computes the average points given per vote, for every voter who cast at
/// least one vote.
///
/// The entries are sorted from the most generous voter to the least
/// generous one. Ties are broken by voter name, then by voter ID.
pub fn compute_generosity(
    votes: &[Vote],
    competitors: &[Competitor],
) -> Result<Vec<GenerosityEntry>, DataError> {
    let names = competitor_names(competitors);

    let mut tallies: HashMap<&str, (&str, VoterTally)> = HashMap::new();
    for v in votes.iter() {
        let name: &str = names
            .get(v.voter_id.as_str())
            .ok_or_else(|| DataError::UnknownVoter {
                voter_id: v.voter_id.clone(),
                track_uri: v.track_uri.clone(),
            })?;
        tallies
            .entry(v.voter_id.as_str())
            .or_insert((name, VoterTally::EMPTY))
            .1
            .record(v.points)
            .ok_or_else(|| DataError::PointsOverflow {
                voter_id: v.voter_id.clone(),
            })?;
    }

    let mut sorted: Vec<(&str, &str, VoterTally)> = tallies
        .into_iter()
        .map(|(vid, (name, tally))| (vid, name, tally))
        .collect();
    sorted.sort_by(|(id1, name1, t1), (id2, name2, t2)| {
        t2.cmp_average(t1)
            .then_with(|| name1.cmp(name2))
            .then_with(|| id1.cmp(id2))
    });

    let res: Vec<GenerosityEntry> = sorted
        .into_iter()
        .map(|(vid, name, tally)| GenerosityEntry {
            voter_id: vid.to_string(),
            voter_name: name.to_string(),
            average_points: tally.average(),
            total_points: tally.total.0,
            num_votes: tally.num_votes,
            num_positive_votes: tally.num_positive_votes,
            average_points_when_positive: tally.average_when_positive(),
        })
        .collect();
    debug!("compute_generosity: {:?} voters", res.len());
    Ok(res)
}

/// Computes the points given by each voter to each submitter, over all the
/// rounds.
///
/// The participants are the voters of the given votes and all the
/// submitters of the index, sorted by name then ID.
pub fn compute_distribution(
    votes: &[Vote],
    submitter_index: &SubmitterIndex,
    competitors: &[Competitor],
) -> Result<DistributionMatrix, DataError> {
    let names = competitor_names(competitors);

    let mut participant_ids: BTreeSet<&str> = BTreeSet::new();
    for v in votes.iter() {
        if !names.contains_key(v.voter_id.as_str()) {
            return Err(DataError::UnknownVoter {
                voter_id: v.voter_id.clone(),
                track_uri: v.track_uri.clone(),
            });
        }
        participant_ids.insert(v.voter_id.as_str());
    }
    for (sid, track_uri) in submitter_index.submitters.iter() {
        if !names.contains_key(sid.as_str()) {
            return Err(DataError::UnknownSubmitter {
                submitter_id: sid.clone(),
                track_uri: track_uri.clone(),
            });
        }
        participant_ids.insert(sid.as_str());
    }

    let mut participants: Vec<Competitor> = participant_ids
        .iter()
        .filter_map(|pid| {
            names.get(pid).map(|name| Competitor {
                id: pid.to_string(),
                name: name.to_string(),
            })
        })
        .collect();
    participants.sort_by(|c1, c2| c1.name.cmp(&c2.name).then_with(|| c1.id.cmp(&c2.id)));

    let positions: HashMap<&str, usize> = participants
        .iter()
        .enumerate()
        .map(|(idx, c)| (c.id.as_str(), idx))
        .collect();

    let num_participants = participants.len();
    let mut grid: Vec<Vec<Points>> = vec![vec![Points::EMPTY; num_participants]; num_participants];
    for v in votes.iter() {
        let sid = submitter_index
            .resolve(&v.track_uri, &v.round_id)
            .ok_or_else(|| DataError::UnresolvedTrack {
                track_uri: v.track_uri.clone(),
                round_id: v.round_id.clone(),
            })?;
        // Both positions exist: voters and submitters were all registered above.
        let (row, col) = match (positions.get(v.voter_id.as_str()), positions.get(sid)) {
            (Some(row), Some(col)) => (*row, *col),
            _ => {
                return Err(DataError::UnknownSubmitter {
                    submitter_id: sid.to_string(),
                    track_uri: v.track_uri.clone(),
                })
            }
        };
        grid[row][col] = grid[row][col]
            .checked_add(Points(v.points))
            .ok_or_else(|| DataError::PointsOverflow {
                voter_id: v.voter_id.clone(),
            })?;
    }

    debug!(
        "compute_distribution: {:?} participants, {:?} votes",
        num_participants,
        votes.len()
    );
    Ok(DistributionMatrix {
        participants,
        points: grid
            .into_iter()
            .map(|row| row.into_iter().map(|p| p.0).collect())
            .collect(),
    })
}

fn check_not_empty(league: &LeagueData) -> Result<(), DataError> {
    let table = if league.competitors.is_empty() {
        Some(Table::Competitors)
    } else if league.submissions.is_empty() {
        Some(Table::Submissions)
    } else if league.votes.is_empty() {
        Some(Table::Votes)
    } else {
        None
    };
    match table {
        Some(table) => Err(DataError::EmptyInput { table }),
        None => Ok(()),
    }
}

fn check_competitors(competitors: &[Competitor]) -> Result<(), DataError> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for c in competitors.iter() {
        if !seen.insert(c.id.as_str()) {
            return Err(DataError::DuplicateCompetitor { id: c.id.clone() });
        }
    }
    Ok(())
}

fn check_submissions(submissions: &[Submission], competitors: &[Competitor]) -> Result<(), DataError> {
    let names = competitor_names(competitors);
    match submissions
        .iter()
        .find(|s| !names.contains_key(s.submitter_id.as_str()))
    {
        Some(s) => Err(DataError::UnknownSubmitter {
            submitter_id: s.submitter_id.clone(),
            track_uri: s.track_uri.clone(),
        }),
        None => Ok(()),
    }
}

/// Computes all the statistics of a league.
///
/// The tables are validated first: the computation stops at the first
/// referential problem and no statistic is returned in that case.
///
/// Arguments:
/// * `league` the decoded tables of the league
/// * `rules` how to treat the special cases, such as self votes
pub fn aggregate(league: &LeagueData, rules: &StatsRules) -> Result<LeagueStats, DataError> {
    info!(
        "Processing {:?} competitors, {:?} submissions, {:?} votes, rules: {:?}",
        league.competitors.len(),
        league.submissions.len(),
        league.votes.len(),
        rules
    );

    check_not_empty(league)?;
    check_competitors(&league.competitors)?;
    check_submissions(&league.submissions, &league.competitors)?;
    let index = build_submitter_index(&league.submissions)?;

    let mut self_votes: u64 = 0;
    let mut kept_votes: Vec<Vote> = Vec::with_capacity(league.votes.len());
    for v in league.votes.iter() {
        let sid = index
            .resolve(&v.track_uri, &v.round_id)
            .ok_or_else(|| DataError::UnresolvedTrack {
                track_uri: v.track_uri.clone(),
                round_id: v.round_id.clone(),
            })?;
        if sid == v.voter_id {
            self_votes += 1;
            debug!(
                "aggregate: self vote by {:?} on {:?} in round {:?}",
                v.voter_id, v.track_uri, v.round_id
            );
            if rules.self_votes == SelfVoteMode::Exclude {
                continue;
            }
        }
        kept_votes.push(v.clone());
    }
    if self_votes > 0 {
        warn!(
            "Found {:?} self votes, mode: {:?}",
            self_votes, rules.self_votes
        );
    }

    let generosity = compute_generosity(&kept_votes, &league.competitors)?;
    let distribution = compute_distribution(&kept_votes, &index, &league.competitors)?;

    // Invariant: every row of the distribution sums to the points given by that voter.
    for entry in generosity.iter() {
        let row = distribution
            .participants
            .iter()
            .position(|c| c.id == entry.voter_id);
        debug_assert_eq!(
            row.map(|r| distribution.row_total(r)),
            Some(entry.total_points as i128),
            "Row total mismatch for voter {:?}",
            entry.voter_id
        );
    }

    info!(
        "Computed statistics for {:?} voters and {:?} participants",
        generosity.len(),
        distribution.participants.len()
    );
    Ok(LeagueStats {
        generosity,
        distribution,
        self_votes,
    })
}
