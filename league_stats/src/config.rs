// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A participant of the league. Competitors may submit tracks, cast votes, or both.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Competitor {
    pub id: String,
    pub name: String,
}

/// A track submitted by a competitor during one round.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Submission {
    pub track_uri: String,
    pub submitter_id: String,
    pub round_id: String,
}

/// Points given by one voter to one track during one round.
///
/// Points may be negative when the league allows downvotes.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Vote {
    pub track_uri: String,
    pub voter_id: String,
    pub points: i64,
    pub round_id: String,
}

/// The three tables of a league export, already decoded.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct LeagueData {
    pub competitors: Vec<Competitor>,
    pub submissions: Vec<Submission>,
    pub votes: Vec<Vote>,
}

// ******** Output data structures *********

/// The voting habits of one voter.
#[derive(PartialEq, Debug, Clone)]
pub struct GenerosityEntry {
    pub voter_id: String,
    pub voter_name: String,
    /// Total points divided by the number of votes cast.
    pub average_points: f64,
    pub total_points: i64,
    pub num_votes: u64,
    pub num_positive_votes: u64,
    /// Total points divided by the number of votes with strictly positive points.
    /// 0.0 if the voter never gave positive points.
    pub average_points_when_positive: f64,
}

/// One cell of the distribution matrix, with the names resolved.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistributionCell {
    pub voter_name: String,
    pub submitter_name: String,
    pub points: i64,
}

/// The voter x submitter grid of points, over all rounds.
///
/// Rows are voters and columns are submitters, both in the order of `participants`.
/// Every pair is present: a voter who never voted for a submitter has an explicit 0.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DistributionMatrix {
    pub participants: Vec<Competitor>,
    pub points: Vec<Vec<i64>>,
}

impl DistributionMatrix {
    fn position(&self, competitor_id: &str) -> Option<usize> {
        self.participants.iter().position(|c| c.id == competitor_id)
    }

    /// The points given by a voter to a submitter, or None if one of them
    /// does not take part in the matrix.
    pub fn get(&self, voter_id: &str, submitter_id: &str) -> Option<i64> {
        let row = self.position(voter_id)?;
        let col = self.position(submitter_id)?;
        Some(self.points[row][col])
    }

    /// All the points given by the voter in this row.
    ///
    /// Totals are widened to i128: a row or a column may exceed the range of
    /// a single cell.
    pub fn row_total(&self, row: usize) -> i128 {
        self.points
            .get(row)
            .map(|r| r.iter().map(|p| *p as i128).sum())
            .unwrap_or(0)
    }

    /// All the points received by the submitter in this column.
    pub fn column_total(&self, col: usize) -> i128 {
        self.points
            .iter()
            .filter_map(|r| r.get(col))
            .map(|p| *p as i128)
            .sum()
    }

    /// The largest absolute value in the grid, 0 for an empty matrix.
    pub fn max_abs(&self) -> u64 {
        self.points
            .iter()
            .flatten()
            .map(|p| p.unsigned_abs())
            .max()
            .unwrap_or(0)
    }

    /// The cells in row-major order.
    pub fn cells(&self) -> Vec<DistributionCell> {
        let mut res: Vec<DistributionCell> = Vec::new();
        for (voter, row) in self.participants.iter().zip(self.points.iter()) {
            for (submitter, points) in self.participants.iter().zip(row.iter()) {
                res.push(DistributionCell {
                    voter_name: voter.name.clone(),
                    submitter_name: submitter.name.clone(),
                    points: *points,
                });
            }
        }
        res
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct LeagueStats {
    pub generosity: Vec<GenerosityEntry>,
    pub distribution: DistributionMatrix,
    /// The number of votes where the voter rated their own submission.
    pub self_votes: u64,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Table {
    Competitors,
    Submissions,
    Votes,
}

impl Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Table::Competitors => write!(f, "competitors"),
            Table::Submissions => write!(f, "submissions"),
            Table::Votes => write!(f, "votes"),
        }
    }
}

/// Referential integrity problems found in the input.
///
/// Any of these aborts the whole computation: statistics computed on
/// partial data would misrepresent the league.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum DataError {
    EmptyInput {
        table: Table,
    },
    DuplicateCompetitor {
        id: String,
    },
    UnknownVoter {
        voter_id: String,
        track_uri: String,
    },
    UnknownSubmitter {
        submitter_id: String,
        track_uri: String,
    },
    UnresolvedTrack {
        track_uri: String,
        round_id: String,
    },
    ConflictingSubmission {
        track_uri: String,
        round_id: String,
        first: String,
        second: String,
    },
    /// The points given by one voter, in total or to one submitter, do not
    /// fit in an i64.
    PointsOverflow {
        voter_id: String,
    },
}

impl Error for DataError {}

impl Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataError::EmptyInput { table } => write!(f, "no {} found in the input", table),
            DataError::DuplicateCompetitor { id } => {
                write!(f, "competitor {:?} is declared more than once", id)
            }
            DataError::UnknownVoter {
                voter_id,
                track_uri,
            } => write!(
                f,
                "vote for track {:?} references unknown voter {:?}",
                track_uri, voter_id
            ),
            DataError::UnknownSubmitter {
                submitter_id,
                track_uri,
            } => write!(
                f,
                "track {:?} was submitted by unknown competitor {:?}",
                track_uri, submitter_id
            ),
            DataError::UnresolvedTrack {
                track_uri,
                round_id,
            } => write!(
                f,
                "vote for track {:?} in round {:?} does not match any submission",
                track_uri, round_id
            ),
            DataError::ConflictingSubmission {
                track_uri,
                round_id,
                first,
                second,
            } => write!(
                f,
                "track {:?} is submitted by both {:?} and {:?} in round {:?}",
                track_uri, first, second, round_id
            ),
            DataError::PointsOverflow { voter_id } => {
                write!(f, "points given by {:?} overflow the 64-bit total", voter_id)
            }
        }
    }
}

// ********* Configuration **********

/// How to treat a voter rating a track they submitted themselves.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SelfVoteMode {
    /// Counted both in the generosity and on the diagonal of the distribution.
    Include,
    /// Dropped before any statistic is computed.
    Exclude,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StatsRules {
    pub self_votes: SelfVoteMode,
}

impl StatsRules {
    pub const DEFAULT_RULES: StatsRules = StatsRules {
        self_votes: SelfVoteMode::Include,
    };
}
