use log::{debug, info, warn};

use league_stats::builder::LeagueBuilder;
use league_stats::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::stats::config_reader::*;

mod html;
mod io_common;
mod io_csv;

const DEFAULT_INPUT_DIRECTORY: &str = "input";
const DEFAULT_OUTPUT: &str = "index.html";
const DEFAULT_LEAGUE_NAME: &str = "Music League";
const STDOUT: &str = "stdout";

#[derive(Debug, Snafu)]
pub enum ReportError {
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Line {lineno} of {path} has too few fields"))]
    CsvLineTooShort { path: String, lineno: usize },
    #[snafu(display("Missing column {column:?} in {path}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("Invalid points value {value:?} on line {lineno} of {path}"))]
    InvalidPoints {
        source: std::num::ParseIntError,
        path: String,
        lineno: usize,
        value: String,
    },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error serializing the statistics"))]
    SerializingJson { source: serde_json::Error },
    #[snafu(display("Invalid league data: {source}"))]
    InvalidData { source: DataError },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ReportResult<T> = Result<T, ReportError>;

pub mod config_reader {
    use crate::stats::*;

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct OutputSettings {
        #[serde(rename = "leagueName")]
        pub league_name: Option<String>,
        #[serde(rename = "outputPath")]
        pub output_path: Option<String>,
        #[serde(rename = "summaryPath")]
        pub summary_path: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct InputFiles {
        pub competitors: Option<String>,
        pub submissions: Option<String>,
        pub votes: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ReportRules {
        #[serde(rename = "selfVotes")]
        pub self_votes: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
    pub struct ReportConfig {
        #[serde(rename = "outputSettings", default)]
        pub output_settings: OutputSettings,
        #[serde(rename = "inputDirectory")]
        pub input_directory: Option<String>,
        #[serde(default)]
        pub files: InputFiles,
        #[serde(default)]
        pub rules: ReportRules,
    }

    pub fn read_config(path: &str) -> ReportResult<ReportConfig> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
    }

    pub fn read_summary(path: &str) -> ReportResult<JSValue> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        debug!("read content: {:?}", contents);
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })
    }
}

/// Everything needed for one run, after merging the command line and the
/// configuration file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportSettings {
    pub league_name: String,
    pub competitors_path: PathBuf,
    pub submissions_path: PathBuf,
    pub votes_path: PathBuf,
    pub output: String,
    pub summary: Option<String>,
    pub reference: Option<String>,
    pub rules: StatsRules,
}

fn validate_rules(rules: &ReportRules, exclude_self_votes: bool) -> ReportResult<StatsRules> {
    let self_votes = match (exclude_self_votes, rules.self_votes.as_deref()) {
        (true, _) => SelfVoteMode::Exclude,
        (false, None) | (false, Some("include")) => SelfVoteMode::Include,
        (false, Some("exclude")) => SelfVoteMode::Exclude,
        (false, Some(x)) => {
            whatever!(
                "Cannot understand selfVotes option {:?}: expected 'include' or 'exclude'",
                x
            )
        }
    };
    Ok(StatsRules { self_votes })
}

// Paths from the config file are relative to the config file itself.
fn resolve_path(base: &Path, p: &str) -> String {
    if p == STDOUT {
        return p.to_string();
    }
    base.join(p).display().to_string()
}

fn resolve_settings(
    args: &Args,
    config: &ReportConfig,
    config_dir: &Path,
) -> ReportResult<ReportSettings> {
    let input_dir: PathBuf = match (&args.input, &config.input_directory) {
        (Some(dir), _) => PathBuf::from(dir),
        (None, Some(dir)) => config_dir.join(dir),
        (None, None) => config_dir.join(DEFAULT_INPUT_DIRECTORY),
    };
    let file_name = |name: &Option<String>, default: &str| -> PathBuf {
        input_dir.join(name.clone().unwrap_or_else(|| default.to_string()))
    };

    let output_settings = &config.output_settings;
    let output = match (&args.out, &output_settings.output_path) {
        (Some(out), _) => out.clone(),
        (None, Some(out)) => resolve_path(config_dir, out),
        (None, None) => resolve_path(config_dir, DEFAULT_OUTPUT),
    };
    let summary = match (&args.summary, &output_settings.summary_path) {
        (Some(s), _) => Some(s.clone()),
        (None, Some(s)) => Some(resolve_path(config_dir, s)),
        (None, None) => None,
    };

    Ok(ReportSettings {
        league_name: args
            .title
            .clone()
            .or_else(|| output_settings.league_name.clone())
            .unwrap_or_else(|| DEFAULT_LEAGUE_NAME.to_string()),
        competitors_path: file_name(&config.files.competitors, "competitors.csv"),
        submissions_path: file_name(&config.files.submissions, "submissions.csv"),
        votes_path: file_name(&config.files.votes, "votes.csv"),
        output,
        summary,
        reference: args.reference.clone(),
        rules: validate_rules(&config.rules, args.exclude_self_votes)?,
    })
}

fn read_league(settings: &ReportSettings) -> ReportResult<LeagueData> {
    let competitors = io_csv::read_competitors_file(&settings.competitors_path)?;
    let submissions = io_csv::read_submissions_file(&settings.submissions_path)?;
    let votes = io_csv::read_votes_file(&settings.votes_path)?;
    info!(
        "Read {:?} competitors, {:?} submissions, {:?} votes",
        competitors.len(),
        submissions.len(),
        votes.len()
    );
    let mut builder = LeagueBuilder::new();
    builder.extend(competitors, submissions, votes);
    Ok(builder.build())
}

fn self_vote_mode_name(mode: SelfVoteMode) -> &'static str {
    match mode {
        SelfVoteMode::Include => "include",
        SelfVoteMode::Exclude => "exclude",
    }
}

pub(crate) fn generosity_to_json(generosity: &[GenerosityEntry]) -> Vec<JSValue> {
    generosity
        .iter()
        .enumerate()
        .map(|(idx, e)| {
            json!({
                "rank": idx + 1,
                "voterId": e.voter_id,
                "name": e.voter_name,
                "totalPoints": e.total_points,
                "numVotes": e.num_votes,
                "numPositiveVotes": e.num_positive_votes,
                "averagePoints": io_common::round2(e.average_points),
                "averagePointsWhenPositive": io_common::round2(e.average_points_when_positive),
            })
        })
        .collect()
}

fn distribution_to_json(d: &DistributionMatrix) -> JSValue {
    let participants: Vec<JSValue> = d
        .participants
        .iter()
        .map(|c| json!({"id": c.id, "name": c.name}))
        .collect();
    json!({"participants": participants, "points": d.points})
}

fn build_summary_js(settings: &ReportSettings, stats: &LeagueStats) -> JSValue {
    json!({
        "config": {
            "league": settings.league_name,
            "selfVotes": self_vote_mode_name(settings.rules.self_votes),
        },
        "generosity": generosity_to_json(&stats.generosity),
        "distribution": distribution_to_json(&stats.distribution),
        "selfVotes": stats.self_votes,
    })
}

fn write_output(dest: &str, contents: &str) -> ReportResult<()> {
    if dest == STDOUT {
        println!("{}", contents);
        return Ok(());
    }
    fs::write(dest, contents).context(WritingOutputSnafu { path: dest })?;
    info!("Wrote {:?}", dest);
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> ReportResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(SerializingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between computed statistics and reference summary")
    }
    Ok(())
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ReportOutcome {
    pub output: String,
    pub num_voters: usize,
}

/// Reads the league, computes the statistics and writes the report.
///
/// Nothing is written if the input is invalid.
pub fn run_report(args: &Args) -> ReportResult<ReportOutcome> {
    let (config, config_dir) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let dir = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, dir)
        }
        None => (ReportConfig::default(), PathBuf::new()),
    };
    let settings = resolve_settings(args, &config, &config_dir)?;
    debug!("settings: {:?}", settings);

    let league = read_league(&settings)?;
    let stats = aggregate(&league, &settings.rules).context(InvalidDataSnafu {})?;

    let result_js = build_summary_js(&settings, &stats);
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingJsonSnafu {})?;
    let page = html::render_page(&settings.league_name, &stats)?;

    write_output(&settings.output, &page)?;
    if let Some(summary_path) = &settings.summary {
        write_output(summary_path, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference_path) = &settings.reference {
        check_reference(reference_path, &pretty_js_stats)?;
    }

    Ok(ReportOutcome {
        output: settings.output,
        num_voters: stats.generosity.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir(name: &str) -> PathBuf {
        [env!("CARGO_MANIFEST_DIR"), "tests", "data", name]
            .iter()
            .collect()
    }

    fn tmp_path(name: &str) -> String {
        std::env::temp_dir()
            .join(format!("mlstats-{}-{}", std::process::id(), name))
            .display()
            .to_string()
    }

    fn args() -> Args {
        Args {
            config: None,
            input: None,
            out: None,
            summary: None,
            reference: None,
            title: None,
            exclude_self_votes: false,
            verbose: false,
        }
    }

    #[test]
    fn rules_from_config() {
        let mut rules = ReportRules::default();
        assert_eq!(
            validate_rules(&rules, false).unwrap().self_votes,
            SelfVoteMode::Include
        );
        assert_eq!(
            validate_rules(&rules, true).unwrap().self_votes,
            SelfVoteMode::Exclude
        );
        rules.self_votes = Some("exclude".to_string());
        assert_eq!(
            validate_rules(&rules, false).unwrap().self_votes,
            SelfVoteMode::Exclude
        );
        rules.self_votes = Some("sometimes".to_string());
        assert!(validate_rules(&rules, false).is_err());
    }

    #[test]
    fn settings_defaults() {
        let s = resolve_settings(&args(), &ReportConfig::default(), Path::new("")).unwrap();
        assert_eq!(s.league_name, "Music League");
        assert_eq!(s.competitors_path, PathBuf::from("input/competitors.csv"));
        assert_eq!(s.votes_path, PathBuf::from("input/votes.csv"));
        assert_eq!(s.output, "index.html");
        assert_eq!(s.summary, None);
        assert_eq!(s.rules, StatsRules::DEFAULT_RULES);
    }

    #[test]
    fn settings_from_config_and_args() {
        let config: ReportConfig = serde_json::from_str(
            r#"{
                "outputSettings": {"leagueName": "Rock Fans", "outputPath": "out.html", "summaryPath": "stdout"},
                "inputDirectory": "rf",
                "files": {"votes": "all_votes.csv"},
                "rules": {"selfVotes": "exclude"}
            }"#,
        )
        .unwrap();
        let base = Path::new("leagues");
        let s = resolve_settings(&args(), &config, base).unwrap();
        assert_eq!(s.league_name, "Rock Fans");
        assert_eq!(
            s.submissions_path,
            PathBuf::from("leagues/rf/submissions.csv")
        );
        assert_eq!(s.votes_path, PathBuf::from("leagues/rf/all_votes.csv"));
        assert_eq!(s.output, Path::new("leagues").join("out.html").display().to_string());
        assert_eq!(s.summary, Some("stdout".to_string()));
        assert_eq!(s.rules.self_votes, SelfVoteMode::Exclude);

        let mut a = args();
        a.title = Some("Jazz".to_string());
        a.input = Some("elsewhere".to_string());
        a.out = Some("stdout".to_string());
        let s = resolve_settings(&a, &config, base).unwrap();
        assert_eq!(s.league_name, "Jazz");
        assert_eq!(s.competitors_path, PathBuf::from("elsewhere/competitors.csv"));
        assert_eq!(s.output, "stdout");
    }

    #[test]
    fn summary_shape() {
        let mut b = LeagueBuilder::new();
        b.add_competitor("A", "Alice")
            .add_competitor("B", "Bob")
            .add_submission("t1", "A", "r1")
            .add_submission("t2", "B", "r1")
            .add_vote("t2", "A", 5, "r1")
            .add_vote("t1", "B", 3, "r1");
        let stats = aggregate(&b.build(), &StatsRules::DEFAULT_RULES).unwrap();
        let settings = resolve_settings(&args(), &ReportConfig::default(), Path::new("")).unwrap();
        let js = build_summary_js(&settings, &stats);
        assert_eq!(js["generosity"][0]["name"], json!("Alice"));
        assert_eq!(js["generosity"][0]["averagePoints"], json!(5.0));
        assert_eq!(js["generosity"][1]["rank"], json!(2));
        assert_eq!(js["distribution"]["points"], json!([[0, 5], [3, 0]]));
        assert_eq!(js["distribution"]["participants"][1]["id"], json!("B"));
        assert_eq!(js["config"]["selfVotes"], json!("include"));
        assert_eq!(js["selfVotes"], json!(0));
    }

    #[test]
    fn basic_league_end_to_end() {
        let dir = test_dir("basic");
        let out = tmp_path("basic.html");
        let summary = tmp_path("basic.json");
        let mut a = args();
        a.input = Some(dir.display().to_string());
        a.title = Some("Basic League".to_string());
        a.out = Some(out.clone());
        a.summary = Some(summary.clone());
        a.reference = Some(dir.join("expected_summary.json").display().to_string());

        let outcome = run_report(&a).unwrap();
        assert_eq!(outcome.num_voters, 3);
        assert_eq!(outcome.output, out);

        let page = fs::read_to_string(&out).unwrap();
        assert!(page.contains("Basic League"));
        assert!(page.contains("Carol"));
        let written: JSValue = serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
        assert_eq!(written["generosity"][0]["voterId"], json!("c3"));
        let _ = fs::remove_file(out);
        let _ = fs::remove_file(summary);
    }

    #[test]
    fn basic_league_from_config() {
        let dir = test_dir("basic");
        let out = tmp_path("config.html");
        let mut a = args();
        a.config = Some(dir.join("config.json").display().to_string());
        a.out = Some(out.clone());
        a.reference = Some(dir.join("expected_summary.json").display().to_string());
        assert_eq!(run_report(&a).unwrap().num_voters, 3);
        let _ = fs::remove_file(out);
    }

    #[test]
    fn reference_mismatch_detected() {
        let dir = test_dir("basic");
        let out = tmp_path("mismatch.html");
        let mut a = args();
        a.input = Some(dir.display().to_string());
        a.title = Some("Another League".to_string());
        a.out = Some(out.clone());
        a.reference = Some(dir.join("expected_summary.json").display().to_string());
        let res = run_report(&a);
        assert!(matches!(res, Err(ReportError::Whatever { .. })));
        let _ = fs::remove_file(out);
    }

    #[test]
    fn broken_league_writes_nothing() {
        let dir = test_dir("broken");
        let out = tmp_path("broken.html");
        let mut a = args();
        a.input = Some(dir.display().to_string());
        a.out = Some(out.clone());
        let res = run_report(&a);
        match res {
            Err(ReportError::InvalidData { source }) => assert_eq!(
                source,
                DataError::UnresolvedTrack {
                    track_uri: "spotify:track:9".to_string(),
                    round_id: "r1".to_string()
                }
            ),
            x => panic!("unexpected result {:?}", x),
        }
        assert!(!Path::new(&out).exists());
    }

    #[test]
    fn missing_input_directory() {
        let mut a = args();
        a.input = Some(test_dir("does-not-exist").display().to_string());
        assert!(matches!(run_report(&a), Err(ReportError::CsvOpen { .. })));
    }
}
