// Primitives for reading the CSV exports of a league.

use std::fs::File;
use std::io::Read;

use csv::Reader;

use crate::stats::{
    io_common::{column_indices, fields, simplify_file_name},
    *,
};

const COMPETITOR_COLUMNS: [&str; 2] = ["ID", "Name"];
const SUBMISSION_COLUMNS: [&str; 3] = ["Spotify URI", "Submitter ID", "Round ID"];
const VOTE_COLUMNS: [&str; 4] = ["Spotify URI", "Voter ID", "Points Assigned", "Round ID"];

pub fn csv_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    // Short lines are reported with their line number instead of a generic csv error.
    builder.has_headers(true).flexible(true);
    builder
}

fn open(path: &Path) -> ReportResult<(Reader<File>, String)> {
    let p = path.display().to_string();
    info!("Attempting to read file {:?}", p);
    let rdr = csv_builder().from_path(path).context(CsvOpenSnafu { path: &p })?;
    Ok((rdr, p))
}

/// Reads every line of a table, handing the requested columns to `make`.
fn read_table<R: Read, T>(
    mut rdr: Reader<R>,
    path: &str,
    columns: &[&str],
    make: impl Fn(Vec<String>, usize) -> ReportResult<T>,
) -> ReportResult<Vec<T>> {
    let headers = rdr
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .clone();
    debug!("read_table: {:?} headers: {:?}", simplify_file_name(path), headers);
    let indices = column_indices(&headers, columns, path)?;

    let mut res: Vec<T> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        // The header is line 1.
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        let lineno = line
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(lineno);
        let values = fields(&line, &indices, path, lineno)?;
        res.push(make(values, lineno)?);
    }
    debug!(
        "read_table: {:?}: {:?} lines",
        simplify_file_name(path),
        res.len()
    );
    Ok(res)
}

pub fn read_competitors<R: Read>(rdr: Reader<R>, path: &str) -> ReportResult<Vec<Competitor>> {
    read_table(rdr, path, &COMPETITOR_COLUMNS, |values, lineno| {
        let [id, name]: [String; 2] = to_array(values, path, lineno)?;
        Ok(Competitor { id, name })
    })
}

pub fn read_submissions<R: Read>(rdr: Reader<R>, path: &str) -> ReportResult<Vec<Submission>> {
    read_table(rdr, path, &SUBMISSION_COLUMNS, |values, lineno| {
        let [track_uri, submitter_id, round_id]: [String; 3] = to_array(values, path, lineno)?;
        Ok(Submission {
            track_uri,
            submitter_id,
            round_id,
        })
    })
}

pub fn read_votes<R: Read>(rdr: Reader<R>, path: &str) -> ReportResult<Vec<Vote>> {
    read_table(rdr, path, &VOTE_COLUMNS, |values, lineno| {
        let [track_uri, voter_id, points_s, round_id]: [String; 4] =
            to_array(values, path, lineno)?;
        let points = points_s.parse::<i64>().context(InvalidPointsSnafu {
            path,
            lineno,
            value: points_s.as_str(),
        })?;
        Ok(Vote {
            track_uri,
            voter_id,
            points,
            round_id,
        })
    })
}

// fields() returns exactly one value per requested column; any other
// length is reported against the line instead of producing blank values.
fn to_array<const N: usize>(
    values: Vec<String>,
    path: &str,
    lineno: usize,
) -> ReportResult<[String; N]> {
    let arr: Option<[String; N]> = values.try_into().ok();
    arr.context(CsvLineTooShortSnafu { path, lineno })
}

pub fn read_competitors_file(path: &Path) -> ReportResult<Vec<Competitor>> {
    let (rdr, p) = open(path)?;
    read_competitors(rdr, &p)
}

pub fn read_submissions_file(path: &Path) -> ReportResult<Vec<Submission>> {
    let (rdr, p) = open(path)?;
    read_submissions(rdr, &p)
}

pub fn read_votes_file(path: &Path) -> ReportResult<Vec<Vote>> {
    let (rdr, p) = open(path)?;
    read_votes(rdr, &p)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(data: &str) -> Reader<&[u8]> {
        csv_builder().from_reader(data.as_bytes())
    }

    #[test]
    fn competitors_by_header_name() {
        let res = read_competitors(reader("Name,ID\nAlice,a1\n Bob , b2 \n"), "c.csv").unwrap();
        assert_eq!(
            res,
            vec![
                Competitor {
                    id: "a1".to_string(),
                    name: "Alice".to_string()
                },
                Competitor {
                    id: "b2".to_string(),
                    name: "Bob".to_string()
                }
            ]
        );
    }

    #[test]
    fn submissions_export() {
        let data = "Spotify URI,Title,Album,Artist(s),Submitter ID,Created,Comment,Round ID,Visible To Voters\n\
                    spotify:track:1,\"Song, One\",Album,Artist,a1,2026-02-01T00:00:00Z,,r1,Yes\n";
        let res = read_submissions(reader(data), "s.csv").unwrap();
        assert_eq!(
            res,
            vec![Submission {
                track_uri: "spotify:track:1".to_string(),
                submitter_id: "a1".to_string(),
                round_id: "r1".to_string(),
            }]
        );
    }

    #[test]
    fn votes_export() {
        let data = "Spotify URI,Voter ID,Created,Points Assigned,Comment,Round ID\n\
                    track1,v1,2026-02-10T00:00:00Z,3,,r1\n\
                    track2,v1,2026-02-10T00:00:00Z,-1,\"so-so, honestly\",r1\n";
        let res = read_votes(reader(data), "v.csv").unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].points, 3);
        assert_eq!(res[1].points, -1);
        assert_eq!(res[1].track_uri, "track2");
        assert_eq!(res[1].round_id, "r1");
    }

    #[test]
    fn invalid_points() {
        let data = "Spotify URI,Voter ID,Points Assigned,Round ID\ntrack1,v1,three,r1\n";
        match read_votes(reader(data), "v.csv") {
            Err(ReportError::InvalidPoints { lineno, value, .. }) => {
                assert_eq!(lineno, 2);
                assert_eq!(value, "three");
            }
            x => panic!("unexpected result {:?}", x),
        }
    }

    #[test]
    fn missing_column() {
        let data = "Spotify URI,Voter ID,Round ID\ntrack1,v1,r1\n";
        assert!(matches!(
            read_votes(reader(data), "v.csv"),
            Err(ReportError::MissingColumn { .. })
        ));
    }

    #[test]
    fn field_count_mismatch() {
        let arr: [String; 2] =
            to_array(vec!["a".to_string(), "b".to_string()], "c.csv", 2).unwrap();
        assert_eq!(arr, ["a".to_string(), "b".to_string()]);
        match to_array::<2>(vec!["a".to_string()], "c.csv", 4) {
            Err(ReportError::CsvLineTooShort { lineno, path }) => {
                assert_eq!(lineno, 4);
                assert_eq!(path, "c.csv");
            }
            x => panic!("unexpected result {:?}", x),
        }
        assert!(to_array::<1>(vec!["a".to_string(), "b".to_string()], "c.csv", 4).is_err());
    }

    #[test]
    fn short_line() {
        let data = "ID,Name\na1,Alice\nb2\n";
        match read_competitors(reader(data), "c.csv") {
            Err(ReportError::CsvLineTooShort { lineno, .. }) => assert_eq!(lineno, 3),
            x => panic!("unexpected result {:?}", x),
        }
    }
}
