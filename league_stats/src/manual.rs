/*!

This is the long-form manual for `league_stats` and `mlstats`.

## Input formats

A league is described by three CSV files, as exported by Music League. Columns are
found by their header name: their order does not matter and the other columns are ignored.

### `competitors.csv`

| Column | Content |
|--------|---------|
| `ID`   | the identifier of the competitor |
| `Name` | the display name |

### `submissions.csv`

| Column         | Content |
|----------------|---------|
| `Spotify URI`  | the submitted track |
| `Submitter ID` | the competitor who submitted it |
| `Round ID`     | the round of the submission |

### `votes.csv`

| Column            | Content |
|-------------------|---------|
| `Spotify URI`     | the track that received the points |
| `Voter ID`        | the competitor who gave the points |
| `Points Assigned` | an integer, possibly negative |
| `Round ID`        | the round of the vote |

## Statistics

**Generosity** is the average number of points a voter gives per track they rate. The
report also shows the average computed only on the votes with positive points, which
is closer to "how much do they give when they like something".

**Distribution** is the voter x submitter grid of points, summed over all the rounds.
Each row adds up to the total points given by that voter.

A vote is attributed to the competitor who submitted the track *in the same round*. When a
vote refers to a round without a matching submission, the track alone is used if it was
only ever submitted by one competitor.

Self votes (a voter rating their own track) are counted by default. Use the
`--exclude-self-votes` flag or the `"selfVotes": "exclude"` rule to drop them.

## Errors

The statistics are all-or-nothing. Unknown voters or submitters, votes for tracks that
were never submitted, duplicated competitors and empty tables all stop the computation,
and no report is written.

## Configuration file

All the options can also be set in a JSON file passed with `--config`. Relative paths are
resolved against the directory of this file.

```json
{
  "outputSettings": {
    "leagueName": "Rock Fans",
    "outputPath": "index.html",
    "summaryPath": "summary.json"
  },
  "inputDirectory": "input/rf",
  "files": {
    "competitors": "competitors.csv",
    "submissions": "submissions.csv",
    "votes": "votes.csv"
  },
  "rules": {
    "selfVotes": "include"
  }
}
```

*/
