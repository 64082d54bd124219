pub use crate::config::*;

/// A builder for assembling the tables of a league.
///
/// ```
/// use league_stats::builder::LeagueBuilder;
/// use league_stats::{aggregate, DataError, StatsRules};
///
/// let mut builder = LeagueBuilder::new();
/// builder.add_competitor("A", "Alice");
/// builder.add_competitor("B", "Bob");
/// builder.add_submission("t1", "A", "r1");
/// builder.add_submission("t2", "B", "r1");
/// builder.add_vote("t2", "A", 5, "r1");
///
/// let stats = aggregate(&builder.build(), &StatsRules::DEFAULT_RULES)?;
/// assert_eq!(stats.distribution.get("A", "B"), Some(5));
///
/// # Ok::<(), DataError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct LeagueBuilder {
    _competitors: Vec<Competitor>,
    _submissions: Vec<Submission>,
    _votes: Vec<Vote>,
}

impl LeagueBuilder {
    pub fn new() -> LeagueBuilder {
        LeagueBuilder::default()
    }

    pub fn add_competitor(&mut self, id: &str, name: &str) -> &mut LeagueBuilder {
        self._competitors.push(Competitor {
            id: id.to_string(),
            name: name.to_string(),
        });
        self
    }

    pub fn add_submission(
        &mut self,
        track_uri: &str,
        submitter_id: &str,
        round_id: &str,
    ) -> &mut LeagueBuilder {
        self._submissions.push(Submission {
            track_uri: track_uri.to_string(),
            submitter_id: submitter_id.to_string(),
            round_id: round_id.to_string(),
        });
        self
    }

    pub fn add_vote(
        &mut self,
        track_uri: &str,
        voter_id: &str,
        points: i64,
        round_id: &str,
    ) -> &mut LeagueBuilder {
        self._votes.push(Vote {
            track_uri: track_uri.to_string(),
            voter_id: voter_id.to_string(),
            points,
            round_id: round_id.to_string(),
        });
        self
    }

    /// Adds whole tables at once, as produced by a reader.
    pub fn extend(
        &mut self,
        competitors: Vec<Competitor>,
        submissions: Vec<Submission>,
        votes: Vec<Vote>,
    ) -> &mut LeagueBuilder {
        self._competitors.extend(competitors);
        self._submissions.extend(submissions);
        self._votes.extend(votes);
        self
    }

    pub fn build(&self) -> LeagueData {
        LeagueData {
            competitors: self._competitors.clone(),
            submissions: self._submissions.clone(),
            votes: self._votes.clone(),
        }
    }
}
