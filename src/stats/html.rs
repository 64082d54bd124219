// Rendering of the statistics as a single self-contained HTML page.

use crate::stats::{io_common::round2, *};

const STYLE: &str = r#"
      :root {
        color-scheme: dark light;
        --fg: #f9fafb;
        --muted: #9ca3af;
        --accent: #fbbf24;
        --card-radius: 16px;
        --font-sans: system-ui, -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
      }
      * { box-sizing: border-box; }
      body {
        margin: 0;
        min-height: 100vh;
        font-family: var(--font-sans);
        background: radial-gradient(circle at top, #111827 0, #020617 55%, #000 100%);
        color: var(--fg);
      }
      .page { max-width: 1080px; margin: 0 auto; padding: 32px 20px 40px; }
      header { display: flex; flex-direction: column; gap: 10px; margin-bottom: 28px; }
      h1 { font-size: 2rem; letter-spacing: 0.04em; text-transform: uppercase; margin: 0; }
      header p { margin: 0; color: var(--muted); line-height: 1.5; }
      .card {
        background: linear-gradient(145deg, rgba(15,23,42,0.96), rgba(15,23,42,0.88));
        border-radius: var(--card-radius);
        border: 1px solid rgba(148,163,184,0.16);
        padding: 18px;
        margin-bottom: 24px;
        overflow-x: auto;
      }
      .card h2 {
        font-size: 0.9rem;
        text-transform: uppercase;
        letter-spacing: 0.16em;
        color: rgba(156,163,175,0.9);
        margin: 0 0 12px;
      }
      .chart-container { display: flex; flex-direction: column; gap: 8px; }
      .bar-row {
        display: grid;
        grid-template-columns: minmax(0, 220px) minmax(0, 1fr) auto;
        align-items: center;
        gap: 8px;
        font-size: 0.76rem;
      }
      .bar-label { overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }
      .bar-track { position: relative; height: 6px; border-radius: 999px; background: rgba(15,23,42,0.96); overflow: hidden; }
      .bar-fill {
        position: absolute;
        inset: 0;
        border-radius: inherit;
        background: linear-gradient(90deg, rgba(251,191,36,0.2), rgba(251,191,36,0.95), rgba(56,189,248,0.95));
      }
      .bar-value { font-variant-numeric: tabular-nums; color: var(--muted); }
      table { border-collapse: collapse; font-size: 0.78rem; font-variant-numeric: tabular-nums; }
      th, td { padding: 4px 8px; text-align: right; border-bottom: 1px solid rgba(55,65,81,0.6); }
      th.name, td.name { text-align: left; }
      .matrix td { min-width: 3em; text-align: center; }
      .matrix td.diag { outline: 1px dashed rgba(156,163,175,0.6); outline-offset: -3px; }
      .matrix th.col { writing-mode: vertical-rl; transform: rotate(180deg); text-align: left; }
      .muted { color: var(--muted); }
      footer { margin-top: 20px; font-size: 0.75rem; color: rgba(148,163,184,0.9); }
"#;

const SCRIPT: &str = r#"
      function renderChart() {
        const container = document.getElementById("generosity-chart");
        if (!container) return;
        container.innerHTML = "";

        if (!chartLabels.length) {
          const empty = document.createElement("div");
          empty.className = "muted";
          empty.textContent = "No voters found.";
          container.appendChild(empty);
          return;
        }

        const maxValue = Math.max.apply(null, chartValues);

        chartLabels.forEach((label, idx) => {
          const value = chartValues[idx];
          const row = document.createElement("div");
          row.className = "bar-row";

          const nameEl = document.createElement("div");
          nameEl.className = "bar-label";
          nameEl.textContent = label;

          const track = document.createElement("div");
          track.className = "bar-track";
          const fill = document.createElement("div");
          fill.className = "bar-fill";
          const widthPct = maxValue > 0 && value > 0 ? (value / maxValue) * 100 : 0;
          fill.style.width = widthPct.toFixed(1) + "%";
          track.appendChild(fill);

          const valueEl = document.createElement("div");
          valueEl.className = "bar-value";
          valueEl.textContent = value.toFixed(2);

          row.appendChild(nameEl);
          row.appendChild(track);
          row.appendChild(valueEl);
          container.appendChild(row);
        });
      }

      renderChart();
"#;

pub fn escape_html(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => res.push_str("&amp;"),
            '<' => res.push_str("&lt;"),
            '>' => res.push_str("&gt;"),
            '"' => res.push_str("&quot;"),
            '\'' => res.push_str("&#39;"),
            _ => res.push(c),
        }
    }
    res
}

/// JSON that can be embedded in a script element.
fn script_json(value: &JSValue) -> ReportResult<String> {
    let s = serde_json::to_string(value).context(SerializingJsonSnafu {})?;
    Ok(s.replace("</", "<\\/"))
}

fn generosity_table(generosity: &[GenerosityEntry]) -> String {
    if generosity.is_empty() {
        return "<div class=\"muted\">No voters found.</div>".to_string();
    }
    let mut rows = String::new();
    for (idx, e) in generosity.iter().enumerate() {
        rows.push_str(&format!(
            "<tr><td>{}</td><td class=\"name\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td><td>{:.2}</td></tr>\n",
            idx + 1,
            escape_html(&e.voter_name),
            e.total_points,
            e.num_votes,
            e.num_positive_votes,
            round2(e.average_points),
            round2(e.average_points_when_positive),
        ));
    }
    format!(
        "<table>\n<thead><tr><th>#</th><th class=\"name\">Voter</th><th>Points</th><th>Votes</th>\
         <th>Positive votes</th><th>Average</th><th>Average when positive</th></tr></thead>\n\
         <tbody>\n{}</tbody>\n</table>",
        rows
    )
}

// Amber for points given, red for points taken away.
fn cell_style(points: i64, max_abs: u64) -> String {
    if points == 0 || max_abs == 0 {
        return String::new();
    }
    let alpha = points.unsigned_abs() as f64 / max_abs as f64;
    let rgb = if points > 0 { "251,191,36" } else { "248,113,113" };
    format!(" style=\"background: rgba({},{:.2})\"", rgb, alpha * 0.85)
}

fn distribution_table(d: &DistributionMatrix) -> String {
    if d.participants.is_empty() {
        return "<div class=\"muted\">No votes found.</div>".to_string();
    }
    let max_abs = d.max_abs();
    let mut res = String::from("<table class=\"matrix\">\n<thead><tr><th class=\"name\">Voter \\ Submitter</th>");
    for c in d.participants.iter() {
        res.push_str(&format!("<th class=\"col\">{}</th>", escape_html(&c.name)));
    }
    res.push_str("<th>Given</th></tr></thead>\n<tbody>\n");

    for (row, (voter, points)) in d.participants.iter().zip(d.points.iter()).enumerate() {
        res.push_str(&format!("<tr><th class=\"name\">{}</th>", escape_html(&voter.name)));
        for (col, (submitter, p)) in d.participants.iter().zip(points.iter()).enumerate() {
            let class = if row == col { " class=\"diag\"" } else { "" };
            res.push_str(&format!(
                "<td{}{} title=\"{} &#8594; {}: {}\">{}</td>",
                class,
                cell_style(*p, max_abs),
                escape_html(&voter.name),
                escape_html(&submitter.name),
                p,
                p
            ));
        }
        res.push_str(&format!("<td>{}</td></tr>\n", d.row_total(row)));
    }

    res.push_str("<tr><th class=\"name\">Received</th>");
    for col in 0..d.participants.len() {
        res.push_str(&format!("<td>{}</td>", d.column_total(col)));
    }
    res.push_str("<td></td></tr>\n</tbody>\n</table>");
    res
}

/// Renders the generosity chart, the generosity table and the distribution
/// heatmap of a league.
pub fn render_page(league_name: &str, stats: &LeagueStats) -> ReportResult<String> {
    let labels: Vec<&str> = stats
        .generosity
        .iter()
        .map(|e| e.voter_name.as_str())
        .collect();
    let values: Vec<f64> = stats
        .generosity
        .iter()
        .map(|e| round2(e.average_points))
        .collect();
    let chart_labels = script_json(&json!(labels))?;
    let chart_values = script_json(&json!(values))?;
    let voters = script_json(&JSValue::Array(generosity_to_json(&stats.generosity)))?;
    let title = escape_html(league_name);

    let self_votes_note = if stats.self_votes > 0 {
        format!(
            "<footer>{} vote(s) were given by submitters to their own tracks.</footer>",
            stats.self_votes
        )
    } else {
        String::new()
    };

    let page = format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <title>{title} – Voter Generosity</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>{style}</style>
  </head>
  <body>
    <main class="page">
      <header>
        <h1>{title}</h1>
        <p>
          <strong>Generosity</strong> here is defined as the
          <strong>average points each voter gives out per track they rate</strong>.
          High averages mean someone tends to hand out bigger scores rather than spreading them out.
        </p>
      </header>

      <section class="card">
        <h2>League generosity</h2>
        <div class="chart-container" id="generosity-chart"></div>
      </section>

      <section class="card">
        <h2>Voters</h2>
        {generosity_table}
      </section>

      <section class="card">
        <h2>Who gives points to whom</h2>
        {distribution_table}
      </section>
      {self_votes_note}
    </main>

    <script>
      const chartLabels = {chart_labels};
      const chartValues = {chart_values};
      const voters = {voters};
{script}
    </script>
  </body>
</html>
"#,
        title = title,
        style = STYLE,
        generosity_table = generosity_table(&stats.generosity),
        distribution_table = distribution_table(&stats.distribution),
        self_votes_note = self_votes_note,
        chart_labels = chart_labels,
        chart_values = chart_values,
        voters = voters,
        script = SCRIPT,
    );
    Ok(page)
}
