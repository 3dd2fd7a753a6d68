use crate::coach::{ClientData, CoachView};
use crate::models::{DayData, Journal, Profile, Role, RuleItem, StoredState, WeekData, RATING_MAX, WEEK_COUNT};
use crate::session::SessionView;
use crate::stats::{format_average, is_day_filled, journal_progress, progress_overview, summarize_week};
use chrono::{DateTime, Local, Utc};

/// Escapes text for HTML. Braces are escaped too so user text can never
/// form a template placeholder.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(ch),
        }
    }
    out
}

fn query_value(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn format_time(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|time| time.with_timezone(&Local).format("%H:%M").to_string())
        .unwrap_or_default()
}

fn format_amount(value: f64) -> String {
    if value == 0.0 {
        "-".to_string()
    } else {
        let text = format!("{value:.1}");
        text.trim_end_matches(".0").to_string()
    }
}

fn format_rating(value: u8) -> String {
    if value == 0 { "-".to_string() } else { format!("{value}/{RATING_MAX}") }
}

fn page(title: &str, nav: &str, body: &str, script: &str) -> String {
    LAYOUT_HTML
        .replace("{{TITLE}}", &escape_html(title))
        .replace("{{STYLE}}", STYLE)
        .replace("{{NAV}}", nav)
        .replace("{{BODY}}", body)
        .replace("{{SCRIPT}}", script)
}

fn nav(email: &str, role: Role) -> String {
    let coach = if role.is_admin() {
        r#"<a class="nav-link coach" href="/coach">Coach view</a>"#
    } else {
        ""
    };
    format!(
        r#"<nav class="nav">
  <a class="brand" href="/">Fighter Reset <span>Journal</span></a>
  <div class="nav-right">
    <a class="nav-link" href="/">Journal</a>
    {coach}
    <span class="who">{email}</span>
    <form method="post" action="/logout"><button class="btn ghost" type="submit">Log out</button></form>
  </div>
</nav>"#,
        email = escape_html(email),
    )
}

pub fn render_login(message: Option<&str>) -> String {
    let message = message
        .map(|msg| format!(r#"<p class="status" data-type="error">{}</p>"#, escape_html(msg)))
        .unwrap_or_default();
    let body = LOGIN_HTML.replace("{{MESSAGE}}", &message);
    page("Sign in", "", &body, "")
}

pub fn render_loading() -> String {
    page(
        "Loading",
        "",
        r#"<section class="center"><div class="spinner"></div><p class="muted">Loading your journal...</p></section>"#,
        "<script>setTimeout(() => window.location.reload(), 800);</script>",
    )
}

pub fn render_legacy_prompt(email: &str, role: Role, legacy: &Journal) -> String {
    let progress = journal_progress(legacy);
    let body = LEGACY_HTML
        .replace("{{FILLED}}", &progress.filled.to_string())
        .replace("{{TOTAL}}", &progress.total.to_string());
    page("Import earlier entries", &nav(email, role), &body, "")
}

pub fn render_not_found(message: &str) -> String {
    let body = format!(
        r#"<section class="card center"><h2>Not found</h2><p class="muted">{}</p><a class="btn" href="/">Back to the journal</a></section>"#,
        escape_html(message)
    );
    page("Not found", "", &body, "")
}

pub fn render_index(email: &str, role: Role, view: &SessionView) -> String {
    let journal = &view.journal;
    let weeks: String = journal
        .weeks
        .iter()
        .map(|week| {
            let summary = summarize_week(week);
            let total = week.days.len().max(1);
            format!(
                r#"<a class="week-card" href="/week/{n}">
  <span class="ghost-number">{n}</span>
  <h3>Week {n}</h3>
  <p class="label">Self-check log</p>
  <p class="muted">{filled}/{days} days filled</p>
  <div class="bar"><div style="width: {pct}%"></div></div>
</a>"#,
                n = week.week_number,
                filled = summary.filled_days,
                days = week.days.len(),
                pct = summary.filled_days * 100 / total,
            )
        })
        .collect();

    let overview = progress_overview(journal);
    let dashboard = if overview.points.is_empty() {
        r#"<div class="card empty"><h3>Nothing to show yet</h3><p class="muted">Start filling in your journal (sleep, water, workouts) to see your progress here.</p></div>"#.to_string()
    } else {
        DASHBOARD_HTML
            .replace("{{WORKOUTS}}", &overview.workouts.to_string())
            .replace("{{AVG_SLEEP}}", &format_average(overview.avg_sleep))
            .replace("{{AVG_WATER}}", &format_average(overview.avg_water))
    };

    let coach = if role.is_admin() {
        r#"<div class="right"><a class="btn accent" href="/coach">Open coach view</a></div>"#
    } else {
        ""
    };

    let body = INDEX_HTML
        .replace("{{RULES}}", RULES_HTML)
        .replace("{{COACH}}", coach)
        .replace("{{WEEKS}}", &weeks)
        .replace("{{DASHBOARD}}", &dashboard)
        .replace("{{LAST_SAVED}}", &format_time(view.last_saved));
    let script = INDEX_SCRIPT.replace("{{SYNC}}", SYNC_SCRIPT);
    page("Fighter Reset Journal", &nav(email, role), &body, &script)
}

fn rating_select(field: &str, value: u8) -> String {
    let options: String = (0..=RATING_MAX)
        .map(|n| {
            let label = if n == 0 { "-".to_string() } else { n.to_string() };
            let selected = if n == value { " selected" } else { "" };
            format!(r#"<option value="{n}"{selected}>{label}</option>"#)
        })
        .collect();
    format!(r#"<select data-field="{field}">{options}</select>"#)
}

fn number_input(field: &str, value: f64, step: &str) -> String {
    let value = if value == 0.0 { String::new() } else { value.to_string() };
    format!(r#"<input type="number" min="0" step="{step}" placeholder="-" data-field="{field}" value="{value}" />"#)
}

fn checkbox(field: &str, checked: bool) -> String {
    let checked = if checked { " checked" } else { "" };
    format!(r#"<input type="checkbox" data-field="{field}"{checked} />"#)
}

fn rule_checklist(day: &DayData, editable: bool) -> String {
    RuleItem::ALL
        .iter()
        .map(|item| {
            let checked = day.rule103210.get(*item);
            if editable {
                let checked = if checked { " checked" } else { "" };
                format!(
                    r#"<label class="rule"><input type="checkbox" data-rule="{key}"{checked} /> {label}</label>"#,
                    key = item.key(),
                    label = item.label(),
                )
            } else {
                let mark = if checked { "yes" } else { "no" };
                format!(
                    r#"<li class="rule {mark}">{label}</li>"#,
                    label = item.label(),
                )
            }
        })
        .collect()
}

fn day_row(day: &DayData) -> String {
    format!(
        r#"<tr data-day="{id}">
  <th class="day-name">{name}</th>
  <td>{workout}</td>
  <td>{nutrition}</td>
  <td>{supplements}</td>
  <td>{water}</td>
  <td>{sleep}</td>
  <td>
    <details class="rules">
      <summary><span class="score" data-score="{score}">{score} / 5</span></summary>
      <div class="popover">{rules}</div>
    </details>
  </td>
  <td>{hunger}</td>
  <td>{wellbeing}</td>
  <td><textarea rows="1" data-field="notes" placeholder="Notes">{notes}</textarea></td>
</tr>"#,
        id = escape_html(&day.id),
        name = escape_html(&day.day_name),
        workout = checkbox("workout", day.workout),
        nutrition = rating_select("nutrition", day.nutrition),
        supplements = checkbox("supplements", day.supplements),
        water = number_input("water", day.water, "0.1"),
        sleep = number_input("sleep", day.sleep, "0.5"),
        score = day.rule103210.score(),
        rules = rule_checklist(day, true),
        hunger = rating_select("eveningHunger", day.evening_hunger),
        wellbeing = rating_select("wellbeing", day.wellbeing),
        notes = escape_html(&day.notes),
    )
}

fn week_stats(week: &WeekData) -> String {
    let summary = summarize_week(week);
    format!(
        r#"<div class="stats">
  <div class="stat"><span class="label">Filled days</span><span class="value" id="stat-filled">{filled}/{days}</span></div>
  <div class="stat"><span class="label">Workouts</span><span class="value" id="stat-workouts">{workouts}</span></div>
  <div class="stat"><span class="label">Avg sleep</span><span class="value" id="stat-sleep">{sleep}</span></div>
  <div class="stat"><span class="label">Avg water</span><span class="value" id="stat-water">{water}</span></div>
  <div class="stat"><span class="label">Avg nutrition</span><span class="value" id="stat-nutrition">{nutrition}</span></div>
  <div class="stat"><span class="label">Avg well-being</span><span class="value" id="stat-wellbeing">{wellbeing}</span></div>
</div>"#,
        filled = summary.filled_days,
        days = week.days.len(),
        workouts = summary.workouts,
        sleep = format_average(summary.avg_sleep),
        water = format_average(summary.avg_water),
        nutrition = format_average(summary.avg_nutrition),
        wellbeing = format_average(summary.avg_wellbeing),
    )
}

pub fn render_week(email: &str, role: Role, week: &WeekData, last_saved: Option<DateTime<Utc>>) -> String {
    let n = week.week_number;
    let prev = if n > 1 {
        format!(r#"<a class="btn ghost" href="/week/{}">&larr;</a>"#, n - 1)
    } else {
        r#"<span class="btn ghost disabled">&larr;</span>"#.to_string()
    };
    let next = if n < WEEK_COUNT {
        format!(r#"<a class="btn ghost" href="/week/{}">&rarr;</a>"#, n + 1)
    } else {
        r#"<span class="btn ghost disabled">&rarr;</span>"#.to_string()
    };
    let rows: String = week.days.iter().map(|day| day_row(day)).collect();

    let body = WEEK_HTML
        .replace("{{WEEK}}", &n.to_string())
        .replace("{{PREV}}", &prev)
        .replace("{{NEXT}}", &next)
        .replace("{{STATS}}", &week_stats(week))
        .replace("{{ROWS}}", &rows)
        .replace("{{LAST_SAVED}}", &format_time(last_saved));
    let script = WEEK_SCRIPT.replace("{{SYNC}}", SYNC_SCRIPT);
    page(&format!("Week {n}"), &nav(email, role), &body, &script)
}

fn coach_link(client: &Profile, week: Option<u8>, day: Option<&str>) -> String {
    let mut link = format!("/coach?client={}", query_value(&client.id));
    if let Some(week) = week {
        link.push_str(&format!("&amp;week={week}"));
    }
    if let Some(day) = day {
        link.push_str(&format!("&amp;day={}", query_value(day)));
    }
    link
}

fn day_detail(day: &DayData) -> String {
    format!(
        r#"<div class="card detail">
  <h4>{name}</h4>
  <dl>
    <dt>Workout</dt><dd>{workout}</dd>
    <dt>Nutrition</dt><dd>{nutrition}</dd>
    <dt>Supplements</dt><dd>{supplements}</dd>
    <dt>Water (l)</dt><dd>{water}</dd>
    <dt>Sleep (h)</dt><dd>{sleep}</dd>
    <dt>Evening hunger</dt><dd>{hunger}</dd>
    <dt>Well-being</dt><dd>{wellbeing}</dd>
  </dl>
  <p class="label">10-3-2-1-0 rule: {score}/5</p>
  <ul class="rule-list">{rules}</ul>
  <p class="label">Notes</p>
  <p class="notes">{notes}</p>
</div>"#,
        name = escape_html(&day.day_name),
        workout = if day.workout { "done" } else { "-" },
        nutrition = format_rating(day.nutrition),
        supplements = if day.supplements { "taken" } else { "-" },
        water = format_amount(day.water),
        sleep = format_amount(day.sleep),
        hunger = format_rating(day.evening_hunger),
        wellbeing = format_rating(day.wellbeing),
        score = day.rule103210.score(),
        rules = rule_checklist(day, false),
        notes = if day.notes.trim().is_empty() {
            "-".to_string()
        } else {
            escape_html(&day.notes)
        },
    )
}

fn coach_client_panel(client: &Profile, state: &StoredState, view: &CoachView) -> String {
    let progress = journal_progress(&state.data);
    let selected_week = view.week().map(|week| week.week_number);
    let weeks: String = state
        .data
        .weeks
        .iter()
        .map(|week| {
            let summary = summarize_week(week);
            let active = if Some(week.week_number) == selected_week { " active" } else { "" };
            format!(
                r#"<a class="week-tile{active}" href="{href}">
  <strong>Week {n}</strong>
  <span>{filled}/{days} filled &middot; {workouts} workouts</span>
  <span>Sleep {sleep} &middot; Water {water}</span>
  <span>Nutrition {nutrition} &middot; Well-being {wellbeing}</span>
</a>"#,
                href = coach_link(client, Some(week.week_number), None),
                n = week.week_number,
                filled = summary.filled_days,
                days = week.days.len(),
                workouts = summary.workouts,
                sleep = format_average(summary.avg_sleep),
                water = format_average(summary.avg_water),
                nutrition = format_average(summary.avg_nutrition),
                wellbeing = format_average(summary.avg_wellbeing),
            )
        })
        .collect();

    let days = match view.week() {
        Some(week) => {
            let selected_day = view.day().map(|day| day.id.clone());
            let items: String = week
                .days
                .iter()
                .map(|day| {
                    let active = if selected_day.as_deref() == Some(day.id.as_str()) { " active" } else { "" };
                    let badge = if is_day_filled(day) {
                        r#"<span class="badge ok">filled</span>"#
                    } else {
                        r#"<span class="badge">empty</span>"#
                    };
                    format!(
                        r#"<a class="day-item{active}" href="{href}">{name} {badge}</a>"#,
                        href = coach_link(client, Some(week.week_number), Some(&day.id)),
                        name = escape_html(&day.day_name),
                    )
                })
                .collect();
            format!(r#"<h4>Week {} days</h4><div class="day-list">{items}</div>"#, week.week_number)
        }
        None => String::new(),
    };

    let detail = view.day().map(|day| day_detail(day)).unwrap_or_default();
    let updated = state
        .updated_at
        .map(|time| {
            format!(
                "Last update: {}",
                time.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="client-head">
  <h3>{email}</h3>
  <p class="muted">{filled}/{total} days filled &middot; {updated}</p>
</div>
<div class="week-tiles">{weeks}</div>
{days}
{detail}"#,
        email = escape_html(&client.email),
        filled = progress.filled,
        total = progress.total,
    )
}

pub fn render_coach(email: &str, roster: &[Profile], roster_error: Option<&str>, view: &CoachView) -> String {
    let selected = view.client().map(|client| client.id.as_str());
    let clients: String = if roster.is_empty() {
        r#"<p class="muted">No clients yet.</p>"#.to_string()
    } else {
        roster
            .iter()
            .map(|client| {
                let active = if Some(client.id.as_str()) == selected { " active" } else { "" };
                format!(
                    r#"<a class="client{active}" href="{href}">{email}</a>"#,
                    href = coach_link(client, None, None),
                    email = escape_html(&client.email),
                )
            })
            .collect()
    };
    let message = roster_error
        .map(|msg| format!(r#"<p class="status" data-type="error">{}</p>"#, escape_html(msg)))
        .unwrap_or_default();

    let panel = match view {
        CoachView::NoClientSelected => {
            r#"<p class="muted center">Select a client on the left to load their journal.</p>"#.to_string()
        }
        CoachView::ClientSelected { client, data } => match data {
            ClientData::Loading => r#"<p class="muted">Loading...</p>"#.to_string(),
            ClientData::NoData => format!(
                r#"<div class="client-head"><h3>{}</h3></div><p class="muted">No saved data for this client yet.</p>"#,
                escape_html(&client.email)
            ),
            ClientData::Error(msg) => format!(
                r#"<div class="client-head"><h3>{}</h3></div><p class="status" data-type="error">{}</p>"#,
                escape_html(&client.email),
                escape_html(msg)
            ),
            ClientData::Loaded(state) => coach_client_panel(client, state, view),
        },
        CoachView::WeekSelected { client, state, .. } | CoachView::DaySelected { client, state, .. } => {
            coach_client_panel(client, state, view)
        }
    };

    let body = COACH_HTML
        .replace("{{MESSAGE}}", &message)
        .replace("{{CLIENTS}}", &clients)
        .replace("{{PANEL}}", &panel);
    page("Coach view", &nav(email, Role::Admin), &body, "")
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>{{STYLE}}</style>
</head>
<body>
  {{NAV}}
  <main class="app">
    {{BODY}}
  </main>
  <footer class="footer">
    <p>&copy; Fighter Reset Program</p>
  </footer>
  {{SCRIPT}}
</body>
</html>
"#;

const STYLE: &str = r#"
    :root {
      --bg: #0a0a0a;
      --panel: #111;
      --panel-2: #1a1a1a;
      --ink: #e5e5e5;
      --muted: #8a8a8a;
      --accent: #dc2626;
      --ok: #22c55e;
      --warn: #eab308;
      --line: rgba(255, 255, 255, 0.06);
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
      display: flex;
      flex-direction: column;
    }

    a { color: inherit; text-decoration: none; }

    .nav {
      display: flex;
      justify-content: space-between;
      align-items: center;
      padding: 16px 28px;
      border-bottom: 1px solid var(--line);
      background: #050505;
    }

    .brand { font-weight: 800; letter-spacing: 0.02em; }
    .brand span { color: var(--accent); }
    .nav-right { display: flex; align-items: center; gap: 16px; }
    .nav-link { color: var(--muted); font-weight: 600; }
    .nav-link:hover, .nav-link.coach { color: var(--ink); }
    .who { color: var(--muted); font-size: 0.85rem; }

    .app {
      flex: 1;
      width: min(1200px, 100%);
      margin: 0 auto;
      padding: 32px 18px 48px;
      display: grid;
      gap: 32px;
    }

    .footer { text-align: center; color: #555; font-size: 0.85rem; padding: 24px; border-top: 1px solid var(--line); }

    h1, h2, h3, h4 { margin: 0; }
    .muted { color: var(--muted); }
    .label { font-size: 0.75rem; text-transform: uppercase; letter-spacing: 0.12em; color: var(--muted); margin: 0; }
    .center { text-align: center; display: grid; justify-items: center; gap: 14px; }
    .right { display: flex; justify-content: flex-end; }

    .card { background: var(--panel); border: 1px solid var(--line); border-radius: 18px; padding: 24px; }
    .card.empty { border-style: dashed; text-align: center; }

    .btn {
      appearance: none;
      border: 1px solid var(--line);
      border-radius: 12px;
      padding: 10px 16px;
      font-size: 0.9rem;
      font-weight: 700;
      cursor: pointer;
      background: var(--panel-2);
      color: var(--ink);
      display: inline-flex;
      align-items: center;
      gap: 8px;
    }
    .btn.accent { background: linear-gradient(90deg, #7f1d1d, #b91c1c); border-color: transparent; }
    .btn.danger { color: #f87171; border-color: rgba(220, 38, 38, 0.3); background: #1a0505; }
    .btn.ghost { background: transparent; }
    .btn.disabled { opacity: 0.3; cursor: default; }

    .week-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 18px; }
    .week-card {
      position: relative;
      overflow: hidden;
      background: var(--panel);
      border: 1px solid var(--line);
      border-radius: 18px;
      padding: 22px;
      display: grid;
      gap: 8px;
      transition: border-color 200ms ease, transform 200ms ease;
    }
    .week-card:hover { border-color: rgba(220, 38, 38, 0.5); transform: translateY(-2px); }
    .ghost-number { position: absolute; right: -6px; top: -24px; font-size: 96px; font-weight: 900; color: rgba(255, 255, 255, 0.03); }
    .bar { height: 4px; background: #222; border-radius: 999px; overflow: hidden; }
    .bar div { height: 100%; background: var(--accent); }

    .stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(160px, 1fr)); gap: 14px; }
    .stat { background: var(--panel-2); border: 1px solid var(--line); border-radius: 16px; padding: 16px; display: grid; gap: 6px; }
    .stat .value { font-size: 1.8rem; font-weight: 800; }

    #chart, #mood-chart { width: 100%; height: 260px; display: block; }
    .chart-bar.wellbeing { fill: #22c55e; }
    .chart-bar.nutrition { fill: #f59e0b; }
    .chart-line { fill: none; stroke-width: 3; }
    .chart-line.sleep { stroke: #6366f1; }
    .chart-line.water { stroke: #06b6d4; }
    .chart-grid { stroke: rgba(255, 255, 255, 0.06); }
    .chart-label { fill: #777; font-size: 11px; }

    .panel { display: flex; flex-wrap: wrap; justify-content: space-between; align-items: center; gap: 18px; }
    .actions { display: flex; flex-wrap: wrap; gap: 10px; align-items: center; }
    .actions form { margin: 0; }

    .status { min-height: 1.2em; font-size: 0.9rem; color: var(--muted); margin: 0; }
    .status[data-type="error"] { color: #f87171; }
    .status[data-type="ok"] { color: var(--ok); }

    .rules-info ul { margin: 8px 0 0; padding-left: 18px; color: var(--muted); line-height: 1.7; }

    table { width: 100%; border-collapse: collapse; min-width: 980px; }
    .table-wrap { overflow-x: auto; }
    th, td { padding: 10px 8px; border-bottom: 1px solid var(--line); text-align: center; vertical-align: middle; }
    thead th { font-size: 0.72rem; text-transform: uppercase; letter-spacing: 0.1em; color: var(--muted); }
    .day-name { text-align: left; font-weight: 700; }
    input[type="number"], select, textarea {
      background: #0a0a0a;
      color: var(--ink);
      border: 1px solid #2a2a2a;
      border-radius: 10px;
      padding: 8px;
      width: 100%;
      max-width: 110px;
      font: inherit;
    }
    textarea { max-width: 240px; resize: vertical; }
    input[type="checkbox"] { width: 20px; height: 20px; accent-color: var(--accent); }

    details.rules { position: relative; }
    details.rules summary { list-style: none; cursor: pointer; }
    .score { padding: 4px 10px; border-radius: 8px; font-weight: 700; border: 1px solid transparent; color: #666; }
    .score[data-score="5"] { color: var(--ok); border-color: rgba(34, 197, 94, 0.3); }
    .popover { position: absolute; z-index: 5; left: 50%; transform: translateX(-50%); margin-top: 8px; background: var(--panel-2); border: 1px solid var(--line); border-radius: 12px; padding: 12px; display: grid; gap: 8px; min-width: 210px; text-align: left; }
    .rule { display: flex; gap: 8px; align-items: center; font-size: 0.85rem; }

    .week-head { display: flex; justify-content: space-between; align-items: center; gap: 12px; }
    .week-head .pager { display: flex; gap: 8px; }

    .coach { display: grid; grid-template-columns: 280px 1fr; gap: 24px; }
    .roster { display: grid; gap: 8px; align-content: start; }
    .client { padding: 12px 14px; border-radius: 12px; background: var(--panel-2); border: 1px solid transparent; color: var(--muted); overflow: hidden; text-overflow: ellipsis; }
    .client.active, .week-tile.active, .day-item.active { border-color: rgba(220, 38, 38, 0.5); color: var(--ink); background: rgba(127, 29, 29, 0.3); }
    .client-head { display: grid; gap: 4px; margin-bottom: 16px; }
    .week-tiles { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 12px; margin-bottom: 20px; }
    .week-tile { display: grid; gap: 4px; padding: 14px; border-radius: 14px; background: var(--panel-2); border: 1px solid #252525; font-size: 0.8rem; color: var(--muted); }
    .week-tile strong { color: var(--ink); font-size: 1rem; }
    .day-list { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 8px; margin: 12px 0 20px; }
    .day-item { padding: 10px 12px; border-radius: 12px; background: var(--panel-2); border: 1px solid #252525; display: flex; justify-content: space-between; }
    .badge { font-size: 0.7rem; padding: 2px 8px; border-radius: 999px; background: #222; color: var(--muted); }
    .badge.ok { background: rgba(34, 197, 94, 0.15); color: var(--ok); }
    .detail dl { display: grid; grid-template-columns: 160px 1fr; gap: 6px 12px; }
    .detail dt { color: var(--muted); }
    .detail dd { margin: 0; font-weight: 600; }
    .rule-list { list-style: none; padding: 0; display: grid; gap: 4px; }
    .rule-list .yes { color: var(--ok); }
    .rule-list .no { color: #555; }
    .notes { white-space: pre-wrap; }

    .login { width: min(420px, 100%); margin: 40px auto; display: grid; gap: 18px; }
    .login form { display: grid; gap: 14px; }
    .login input { width: 100%; max-width: none; padding: 12px; background: #0a0a0a; color: var(--ink); border: 1px solid #2a2a2a; border-radius: 12px; font: inherit; }

    .spinner { width: 48px; height: 48px; border-radius: 50%; border: 3px solid #222; border-top-color: var(--accent); animation: spin 900ms linear infinite; }
    @keyframes spin { to { transform: rotate(360deg); } }

    @media (max-width: 800px) {
      .coach { grid-template-columns: 1fr; }
    }
"#;

const LOGIN_HTML: &str = r#"<section class="card login">
  <div class="center">
    <h1>Fighter Reset <span style="color: var(--accent)">Journal</span></h1>
    <p class="label">Self-check journal</p>
  </div>
  <form method="post" action="/login">
    <input type="email" name="email" placeholder="Email address" required autocomplete="email" />
    <input type="password" name="password" placeholder="Password" required autocomplete="current-password" />
    <button class="btn accent" type="submit">Sign in</button>
  </form>
  {{MESSAGE}}
</section>"#;

const LEGACY_HTML: &str = r#"<section class="card center">
  <h2>Earlier entries found</h2>
  <p class="muted">This device has a journal from before accounts existed ({{FILLED}} of {{TOTAL}} days filled). Import it into your account?</p>
  <div class="actions">
    <form method="post" action="/legacy-import"><input type="hidden" name="accept" value="true" /><button class="btn accent" type="submit">Import</button></form>
    <form method="post" action="/legacy-import"><input type="hidden" name="accept" value="false" /><button class="btn ghost" type="submit">Start fresh</button></form>
  </div>
</section>"#;

const RULES_HTML: &str = r#"<section class="card rules-info">
  <h2>How to fill in the journal</h2>
  <ul>
    <li><strong>Workout:</strong> tick it when you completed the prescribed training.</li>
    <li><strong>Nutrition, evening hunger, well-being:</strong> rate the day from 1 to 5.</li>
    <li><strong>Supplements:</strong> tick it when you took your daily vitamins and supplements.</li>
    <li><strong>Water and sleep:</strong> enter the amount as a number (e.g. 3 litres, 7.5 hours).</li>
    <li><strong>10-3-2-1-0 rule:</strong> no caffeine 10 hours before bed, no food 3 hours before, no fluids 2 hours before, no screens 1 hour before, and zero snooze presses.</li>
  </ul>
</section>"#;

const INDEX_HTML: &str = r#"{{RULES}}
{{COACH}}
<section>
  <h2 class="label">Journal weeks</h2>
  <div class="week-grid">{{WEEKS}}</div>
</section>
<section>
  <h2 class="label">Summary</h2>
  {{DASHBOARD}}
</section>
<section class="card panel">
  <div>
    <strong>Account synced</strong>
    <p class="muted">Last saved: <span id="last-saved">{{LAST_SAVED}}</span></p>
  </div>
  <div class="actions">
    <a class="btn" href="/api/export">Export</a>
    <button class="btn" type="button" id="import-btn">Import</button>
    <input type="file" id="import-file" accept=".json,application/json" hidden />
    <form method="post" action="/reset" id="reset-form"><button class="btn danger" type="submit">Reset</button></form>
  </div>
  <p class="status" id="status"></p>
</section>"#;

const DASHBOARD_HTML: &str = r#"<div class="stats">
  <div class="stat"><span class="label">Workouts</span><span class="value">{{WORKOUTS}}</span></div>
  <div class="stat"><span class="label">Average sleep (h)</span><span class="value">{{AVG_SLEEP}}</span></div>
  <div class="stat"><span class="label">Average water (l)</span><span class="value">{{AVG_WATER}}</span></div>
</div>
<div class="card" style="margin-top: 18px">
  <p class="label">Sleep and water per logged day</p>
  <svg id="chart" viewBox="0 0 600 260" role="img" aria-label="Sleep and water chart"></svg>
</div>
<div class="card" style="margin-top: 18px">
  <p class="label">Well-being and nutrition, last 14 logged days</p>
  <svg id="mood-chart" viewBox="0 0 600 260" role="img" aria-label="Well-being and nutrition chart"></svg>
</div>"#;

const WEEK_HTML: &str = r#"<section class="week-head">
  <a class="btn ghost" href="/">&larr; Back</a>
  <h2>Week {{WEEK}}</h2>
  <div class="pager">{{PREV}}{{NEXT}}</div>
</section>
{{STATS}}
<section class="card table-wrap" data-week="{{WEEK}}" id="week">
  <table>
    <thead>
      <tr>
        <th class="day-name">Day</th>
        <th>Workout</th>
        <th>Nutrition</th>
        <th>Supplements</th>
        <th>Water (l)</th>
        <th>Sleep (h)</th>
        <th>10-3-2-1-0</th>
        <th>Evening hunger</th>
        <th>Well-being</th>
        <th>Notes</th>
      </tr>
    </thead>
    <tbody>{{ROWS}}</tbody>
  </table>
</section>
<p class="status" id="status">Last saved: <span id="last-saved">{{LAST_SAVED}}</span></p>"#;

const COACH_HTML: &str = r#"<section>
  <h2>Coach view</h2>
  <p class="muted">Clients and their journals</p>
  {{MESSAGE}}
</section>
<section class="coach">
  <aside class="card roster">
    <p class="label">Clients</p>
    {{CLIENTS}}
  </aside>
  <div class="card">{{PANEL}}</div>
</section>"#;

const SYNC_SCRIPT: &str = r#"
    const lastSavedEl = document.getElementById('last-saved');
    const statusEl = document.getElementById('status');

    const setStatus = (message, type) => {
      if (!statusEl) return;
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const formatTime = (iso) => {
      if (!iso) return '';
      return new Date(iso).toLocaleTimeString([], { hour: '2-digit', minute: '2-digit' });
    };

    const refreshSync = async () => {
      const res = await fetch('/api/sync');
      if (!res.ok) return;
      const data = await res.json();
      if (lastSavedEl && data.last_saved) {
        lastSavedEl.textContent = formatTime(data.last_saved);
      }
    };
"#;

const INDEX_SCRIPT: &str = r#"<script>
{{SYNC}}
    const chartEl = document.getElementById('chart');

    const renderChart = (points) => {
      if (!chartEl || !points.length) return;
      const width = 600;
      const height = 260;
      const padX = 40;
      const padY = 30;
      const top = 20;
      const max = Math.max(1, ...points.map((p) => Math.max(p.sleep, p.water)));
      const step = points.length > 1 ? (width - padX * 2) / (points.length - 1) : 0;
      const x = (i) => padX + i * step;
      const y = (v) => height - padY - (v / max) * (height - top - padY);
      const line = (key) => points
        .map((p, i) => `${i === 0 ? 'M' : 'L'} ${x(i).toFixed(2)} ${y(p[key]).toFixed(2)}`)
        .join(' ');

      let grid = '';
      for (let i = 0; i <= 4; i += 1) {
        const v = (max * i) / 4;
        grid += `<line class="chart-grid" x1="${padX}" y1="${y(v)}" x2="${width - padX}" y2="${y(v)}" />`;
        grid += `<text class="chart-label" x="${padX - 8}" y="${y(v) + 4}" text-anchor="end">${Math.round(v * 10) / 10}</text>`;
      }
      const every = points.length > 10 ? Math.ceil(points.length / 10) : 1;
      const labels = points
        .map((p, i) => (i % every === 0
          ? `<text class="chart-label" x="${x(i)}" y="${height - padY + 16}" text-anchor="middle">${p.label}</text>`
          : ''))
        .join('');

      chartEl.innerHTML = `${grid}<path class="chart-line sleep" d="${line('sleep')}" /><path class="chart-line water" d="${line('water')}" />${labels}`;
    };

    const moodChartEl = document.getElementById('mood-chart');

    const renderBars = (points) => {
      if (!moodChartEl || !points.length) return;
      const recent = points.slice(-14);
      const width = 600;
      const height = 260;
      const padX = 40;
      const padY = 30;
      const top = 20;
      const max = 5;
      const slot = (width - padX * 2) / recent.length;
      const barWidth = Math.max(2, slot / 2 - 3);
      const y = (v) => height - padY - (v / max) * (height - top - padY);

      let grid = '';
      for (let v = 0; v <= max; v += 1) {
        grid += `<line class="chart-grid" x1="${padX}" y1="${y(v)}" x2="${width - padX}" y2="${y(v)}" />`;
        grid += `<text class="chart-label" x="${padX - 8}" y="${y(v) + 4}" text-anchor="end">${v}</text>`;
      }
      const bars = recent
        .map((p, i) => {
          const x = padX + i * slot + 2;
          const bar = (value, offset, cls) => `<rect class="chart-bar ${cls}" x="${(x + offset).toFixed(2)}" y="${y(value).toFixed(2)}" width="${barWidth.toFixed(2)}" height="${(y(0) - y(value)).toFixed(2)}" />`;
          const label = `<text class="chart-label" x="${(x + barWidth).toFixed(2)}" y="${height - padY + 16}" text-anchor="middle">${p.label}</text>`;
          return bar(p.wellbeing, 0, 'wellbeing') + bar(p.nutrition, barWidth + 2, 'nutrition') + (i % 2 === 0 ? label : '');
        })
        .join('');

      moodChartEl.innerHTML = `${grid}${bars}`;
    };

    const loadSummary = async () => {
      const res = await fetch('/api/summary');
      if (!res.ok) throw new Error('Unable to load summary');
      const data = await res.json();
      renderChart(data.overview.points);
      renderBars(data.overview.points);
    };

    const importBtn = document.getElementById('import-btn');
    const importFile = document.getElementById('import-file');
    importBtn.addEventListener('click', () => importFile.click());
    importFile.addEventListener('change', async () => {
      const file = importFile.files[0];
      if (!file) return;
      const text = await file.text();
      const res = await fetch('/api/import', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: text
      });
      if (res.ok) {
        alert('Data imported.');
        window.location.reload();
      } else {
        alert('Error: ' + (await res.text()));
      }
      importFile.value = '';
    });

    document.getElementById('reset-form').addEventListener('submit', (event) => {
      if (!window.confirm('Delete every entry so far? This cannot be undone.')) {
        event.preventDefault();
      }
    });

    loadSummary().catch((err) => setStatus(err.message, 'error'));
    setInterval(() => refreshSync().catch(() => {}), 5000);
</script>"#;

const WEEK_SCRIPT: &str = r#"<script>
{{SYNC}}
    const weekEl = document.getElementById('week');
    const weekNum = weekEl.dataset.week;

    const fieldValue = (input) => {
      if (input.type === 'checkbox') return input.checked;
      if (input.tagName === 'SELECT') return Number(input.value);
      if (input.type === 'number') return input.value === '' ? 0 : Number(input.value);
      return input.value;
    };

    const fmt = (v) => (v === null || v === undefined ? 'no data' : v.toFixed(1));

    const updateStats = async () => {
      const res = await fetch('/api/summary');
      if (!res.ok) return;
      const data = await res.json();
      const week = data.weeks.find((w) => String(w.week_number) === weekNum);
      if (!week) return;
      document.getElementById('stat-filled').textContent = `${week.filled_days}/7`;
      document.getElementById('stat-workouts').textContent = week.workouts;
      document.getElementById('stat-sleep').textContent = fmt(week.avg_sleep);
      document.getElementById('stat-water').textContent = fmt(week.avg_water);
      document.getElementById('stat-nutrition').textContent = fmt(week.avg_nutrition);
      document.getElementById('stat-wellbeing').textContent = fmt(week.avg_wellbeing);
    };

    let saveTimer = null;
    const send = async (dayId, patch) => {
      setStatus('Saving...', 'info');
      const res = await fetch(`/api/weeks/${weekNum}/days/${encodeURIComponent(dayId)}`, {
        method: 'PATCH',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(patch)
      });
      if (!res.ok) {
        throw new Error((await res.text()) || 'Request failed');
      }
      updateStats().catch(() => {});
      clearTimeout(saveTimer);
      saveTimer = setTimeout(() => {
        refreshSync()
          .then(() => setStatus('Saved', 'ok'))
          .catch(() => {});
      }, 1500);
    };

    weekEl.addEventListener('change', (event) => {
      const target = event.target;
      const row = target.closest('tr[data-day]');
      if (!row) return;
      const dayId = row.dataset.day;
      let patch;
      if (target.dataset.rule) {
        const rule = {};
        row.querySelectorAll('input[data-rule]').forEach((box) => {
          rule[box.dataset.rule] = box.checked;
        });
        const score = Object.values(rule).filter(Boolean).length;
        const scoreEl = row.querySelector('.score');
        scoreEl.textContent = `${score} / 5`;
        scoreEl.dataset.score = score;
        patch = { rule103210: rule };
      } else if (target.dataset.field) {
        patch = { [target.dataset.field]: fieldValue(target) };
      } else {
        return;
      }
      send(dayId, patch).catch((err) => setStatus(err.message, 'error'));
    });
</script>"#;
