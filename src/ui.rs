use crate::models::{CalendarEvent, DirectoryStats, FieldErrors, GymStats, Member, MemberForm, MembershipType};
use crate::query::PageView;
use crate::state::{Notice, NoticeKind};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn render_notice(notice: Option<&Notice>) -> String {
    match notice {
        Some(notice) => {
            let class = match notice.kind {
                NoticeKind::Success => "notice ok",
                NoticeKind::Error => "notice err",
            };
            format!(
                r#"<div class="{class}" role="status"><span>{}</span><button class="dismiss link" type="button" onclick="this.parentElement.remove()" aria-label="Dismiss">&times;</button></div>"#,
                escape(&notice.message)
            )
        }
        None => String::new(),
    }
}

fn layout(title: &str, user: Option<&str>, notice: Option<&Notice>, body: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<nav>
      <a href="/members">Members</a>
      <a href="/calendar">Calendar</a>
      <a href="/stats">Stats</a>
      <span class="who">{}</span>
      <form method="post" action="/logout"><button class="link" type="submit">Sign out</button></form>
    </nav>"#,
            escape(user)
        ),
        None => String::new(),
    };
    LAYOUT_HTML
        .replace("{{TITLE}}", &escape(title))
        .replace("{{NAV}}", &nav)
        .replace("{{NOTICE}}", &render_notice(notice))
        .replace("{{BODY}}", body)
}

pub fn render_login(username: &str, error: Option<&str>) -> String {
    let error = error
        .map(|message| format!(r#"<p class="field-error">{}</p>"#, escape(message)))
        .unwrap_or_default();
    let body = LOGIN_HTML
        .replace("{{USERNAME}}", &escape(username))
        .replace("{{ERROR}}", &error);
    layout("Sign in", None, None, &body)
}

pub fn render_members(user: &str, notice: Option<&Notice>, term: &str, page: &PageView) -> String {
    let rows: String = if page.items.is_empty() {
        r#"<tr><td colspan="6" class="empty">No members</td></tr>"#.to_string()
    } else {
        page.items.iter().map(member_row).collect()
    };

    let pager = render_pager(term, page);
    let body = MEMBERS_HTML
        .replace("{{TERM}}", &escape(term))
        .replace("{{MATCHES}}", &page.total_matches.to_string())
        .replace("{{ROWS}}", &rows)
        .replace("{{PAGER}}", &pager);
    layout("Members", Some(user), notice, &body)
}

fn member_row(member: &Member) -> String {
    let (status_class, status, toggle) = if member.is_active {
        ("active", "Active", "Deactivate")
    } else {
        ("inactive", "Inactive", "Activate")
    };
    let joined = member
        .joined_at
        .map(|joined| joined.date().format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "—".to_string());
    let membership = match &member.membership_type {
        MembershipType::None => "—".to_string(),
        other => escape(other.label()),
    };
    format!(
        r#"<tr>
        <td>{name}<small>{email}</small></td>
        <td>{cedula}</td>
        <td class="{status_class}">{status}</td>
        <td>{membership}</td>
        <td>{joined}</td>
        <td class="actions">
          <a class="btn" href="/members/{id}/edit">Edit</a>
          <form method="post" action="/members/{id}/toggle"><button type="submit">{toggle}</button></form>
          <a class="btn danger" href="/members/{id}/delete">Delete</a>
        </td>
      </tr>"#,
        name = escape(&member.full_name),
        email = escape(&member.email),
        cedula = escape(&member.cedula),
        id = member.id,
    )
}

fn render_pager(term: &str, page: &PageView) -> String {
    if page.total_pages <= 1 {
        return String::new();
    }
    let link = |target: usize, label: &str| {
        format!(
            r#"<a href="/members?q={}&page={target}">{label}</a>"#,
            urlencoding::encode(term)
        )
    };
    let mut out = String::from(r#"<div class="pager">"#);
    if page.current_page > 1 {
        out.push_str(&link(page.current_page - 1, "&larr; Previous"));
    }
    out.push_str(&format!(
        "<span>Page {} of {}</span>",
        page.current_page, page.total_pages
    ));
    if page.current_page < page.total_pages {
        out.push_str(&link(page.current_page + 1, "Next &rarr;"));
    }
    out.push_str("</div>");
    out
}

/// Create or edit form. `action` is where the form posts to.
pub fn render_member_form(
    user: &str,
    notice: Option<&Notice>,
    heading: &str,
    action: &str,
    form: &MemberForm,
    errors: Option<&FieldErrors>,
) -> String {
    let field_error = |field: &str| {
        errors
            .and_then(|errors| errors.get(field))
            .map(|message| format!(r#"<span class="field-error">{}</span>"#, escape(message)))
            .unwrap_or_default()
    };
    let text_input = |name: &str, label: &str, kind: &str, value: &str| {
        format!(
            r#"<label>{label}<input type="{kind}" name="{name}" value="{}" required>{}</label>"#,
            escape(value),
            field_error(name)
        )
    };

    let current = MembershipType::parse(&form.membership_type);
    let mut options: Vec<MembershipType> = MembershipType::OFFERED.to_vec();
    if !options.contains(&current) {
        options.push(current.clone());
    }
    let options: String = options
        .iter()
        .map(|kind| {
            let selected = if *kind == current { " selected" } else { "" };
            format!(r#"<option{selected}>{}</option>"#, escape(kind.label()))
        })
        .collect();

    let fields = [
        text_input("full_name", "Full name", "text", &form.full_name),
        text_input("cedula", "National ID", "text", &form.cedula),
        text_input("email", "Email", "email", &form.email),
        text_input("phone", "Phone", "tel", &form.phone),
    ]
    .join("\n");

    let body = MEMBER_FORM_HTML
        .replace("{{HEADING}}", &escape(heading))
        .replace("{{ACTION}}", &escape(action))
        .replace("{{FIELDS}}", &fields)
        .replace("{{OPTIONS}}", &options)
        .replace("{{CHECKED}}", if form.is_active() { "checked" } else { "" });
    layout(heading, Some(user), notice, &body)
}

pub fn render_confirm_delete(user: &str, member: &Member) -> String {
    let body = CONFIRM_HTML
        .replace("{{NAME}}", &escape(&member.full_name))
        .replace("{{CEDULA}}", &escape(&member.cedula))
        .replace("{{ID}}", &member.id.to_string());
    layout("Delete member", Some(user), None, &body)
}

pub fn render_stats(
    user: &str,
    notice: Option<&Notice>,
    gym: Option<&GymStats>,
    local: &DirectoryStats,
) -> String {
    let cards = match gym {
        Some(gym) => [
            ("Total members", gym.total_clientes, "blue"),
            ("Active members", gym.clientes_activos, "green"),
            ("Present now", gym.clientes_presentes, "amber"),
            ("Inactive members", gym.inactive(), "red"),
        ]
        .iter()
        .map(|(label, value, tone)| {
            format!(r#"<div class="card {tone}"><span>{label}</span><strong>{value}</strong></div>"#)
        })
        .collect::<String>(),
        None => r#"<p class="empty">Gym statistics are unavailable.</p>"#.to_string(),
    };

    let memberships: String = local
        .by_membership
        .iter()
        .map(|(label, count)| format!("<tr><td>{}</td><td>{count}</td></tr>", escape(label)))
        .collect();
    let days: String = local
        .joined_last_7_days
        .iter()
        .map(|day| format!("<tr><td>{}</td><td>{}</td></tr>", day.date, day.joined))
        .collect();
    let weeks: String = local
        .weekly_joins
        .iter()
        .map(|week| {
            format!(
                r#"<tr><td title="{} – {}">{}</td><td>{}</td></tr>"#,
                week.start_date, week.end_date, week.week, week.joined
            )
        })
        .collect();

    let body = STATS_HTML
        .replace("{{CARDS}}", &cards)
        .replace("{{TOTAL}}", &local.total.to_string())
        .replace("{{ACTIVE}}", &local.active.to_string())
        .replace("{{INACTIVE}}", &local.inactive.to_string())
        .replace("{{MEMBERSHIPS}}", &memberships)
        .replace("{{DAYS}}", &days)
        .replace("{{WEEKS}}", &weeks);
    layout("Stats", Some(user), notice, &body)
}

pub fn render_calendar(user: &str, notice: Option<&Notice>, events: &[CalendarEvent]) -> String {
    let rows: String = if events.is_empty() {
        r#"<li class="empty">No activities scheduled</li>"#.to_string()
    } else {
        events.iter().map(event_row).collect()
    };
    let body = CALENDAR_HTML.replace("{{EVENTS}}", &rows);
    layout("Calendar", Some(user), notice, &body)
}

fn event_row(event: &CalendarEvent) -> String {
    let date = crate::calendar::date_from_backend(&event.start)
        .map(|date| date.to_string())
        .unwrap_or_default();
    // The native title attribute is the hover tooltip.
    format!(
        r#"<li>
        <span class="event" title="{description}"><strong>{date}</strong> {title}</span>
        <details>
          <summary>Edit</summary>
          <form method="post" action="/calendar/events/{id}">
            <input type="text" name="title" value="{title}" required>
            <input type="date" name="date" value="{date}" required>
            <input type="text" name="description" value="{description}">
            <button type="submit">Save</button>
          </form>
          <form method="post" action="/calendar/events/{id}/delete">
            <label><input type="checkbox" name="confirm" value="yes" required> Delete this activity</label>
            <button class="danger" type="submit">Delete</button>
          </form>
        </details>
      </li>"#,
        id = event.id,
        title = escape(&event.title),
        description = escape(&event.description),
    )
}

const LAYOUT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}} · Gym Admin</title>
  <style>
    :root {
      --bg: #eef1f6;
      --ink: #1c283c;
      --accent: #2563eb;
      --danger: #dc2626;
      --ok: #16a34a;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(28, 40, 60, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
    }

    nav {
      display: flex;
      gap: 18px;
      align-items: center;
      padding: 14px 28px;
      background: var(--ink);
    }

    nav a, nav .who, nav .link {
      color: #fff;
      text-decoration: none;
    }

    nav .who {
      margin-left: auto;
      opacity: 0.8;
    }

    .link {
      background: none;
      border: none;
      cursor: pointer;
      font: inherit;
    }

    main {
      width: min(1040px, 100%);
      margin: 28px auto;
      padding: 28px;
      background: var(--card);
      border-radius: 18px;
      box-shadow: var(--shadow);
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      text-align: left;
      padding: 10px;
      border-bottom: 1px solid #e5e7eb;
    }

    td small {
      display: block;
      color: #6b7280;
    }

    .active { color: var(--ok); font-weight: 600; }
    .inactive { color: var(--danger); font-weight: 600; }
    .empty { color: #6b7280; text-align: center; }
    .actions { display: flex; gap: 8px; }
    .actions form { margin: 0; }

    .btn, button {
      padding: 6px 12px;
      border-radius: 8px;
      border: 1px solid #d1d5db;
      background: #f3f4f6;
      color: var(--ink);
      text-decoration: none;
      cursor: pointer;
      font: inherit;
    }

    .primary { background: var(--accent); border-color: var(--accent); color: #fff; }
    .danger { background: var(--danger); border-color: var(--danger); color: #fff; }

    .notice {
      display: flex;
      justify-content: space-between;
      padding: 12px 16px;
      border-radius: 10px;
      margin-bottom: 18px;
    }

    .notice.ok { background: #dcfce7; }
    .notice.err { background: #fee2e2; }
    .dismiss { text-decoration: none; color: inherit; }

    label { display: grid; gap: 4px; margin-bottom: 12px; }
    input, select { padding: 8px; border: 1px solid #d1d5db; border-radius: 8px; font: inherit; }
    .field-error { color: var(--danger); font-size: 0.9rem; }
    .toolbar { display: flex; gap: 12px; align-items: center; margin-bottom: 16px; }
    .toolbar form { display: flex; gap: 8px; margin: 0; }
    .pager { display: flex; gap: 16px; justify-content: center; margin-top: 16px; }
    .cards { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 16px; }
    .card { padding: 18px; border-radius: 14px; color: #fff; display: grid; gap: 6px; }
    .card strong { font-size: 2rem; }
    .card.blue { background: #3b82f6; }
    .card.green { background: #22c55e; }
    .card.amber { background: #eab308; }
    .card.red { background: #ef4444; }
    .events { list-style: none; padding: 0; }
    .events li { padding: 10px 0; border-bottom: 1px solid #e5e7eb; }
  </style>
</head>
<body>
  {{NAV}}
  <main>
    {{NOTICE}}
    {{BODY}}
  </main>
</body>
</html>
"#;

const LOGIN_HTML: &str = r#"<h1>Gym Admin</h1>
    <p>Enter your credentials to continue.</p>
    <form method="post" action="/login">
      <label>Username<input type="text" name="username" value="{{USERNAME}}" autofocus></label>
      <label>Password<input type="password" name="password"></label>
      {{ERROR}}
      <button class="primary" type="submit">Sign in</button>
    </form>"#;

const MEMBERS_HTML: &str = r#"<h1>Members</h1>
    <div class="toolbar">
      <form method="get" action="/members">
        <input type="search" name="q" value="{{TERM}}" placeholder="Name, national ID or email">
        <button type="submit">Search</button>
      </form>
      <span>{{MATCHES}} found</span>
      <form method="post" action="/members/reload"><button type="submit">Reload</button></form>
      <a class="btn primary" href="/members/new">New member</a>
    </div>
    <table>
      <thead>
        <tr><th>Name</th><th>National ID</th><th>Status</th><th>Membership</th><th>Joined</th><th>Actions</th></tr>
      </thead>
      <tbody>
      {{ROWS}}
      </tbody>
    </table>
    {{PAGER}}"#;

const MEMBER_FORM_HTML: &str = r#"<h1>{{HEADING}}</h1>
    <form method="post" action="{{ACTION}}">
      {{FIELDS}}
      <label>Membership<select name="membership_type">{{OPTIONS}}</select></label>
      <label><span><input type="checkbox" name="is_active" value="on" {{CHECKED}}> Active account</span></label>
      <a class="btn" href="/members">Cancel</a>
      <button class="primary" type="submit">Save</button>
    </form>"#;

const CONFIRM_HTML: &str = r#"<h1>Delete member</h1>
    <p>Delete <strong>{{NAME}}</strong> (national ID {{CEDULA}})? This cannot be undone.</p>
    <form method="post" action="/members/{{ID}}/delete">
      <input type="hidden" name="confirm" value="yes">
      <a class="btn" href="/members">Cancel</a>
      <button class="danger" type="submit">Delete</button>
    </form>"#;

const STATS_HTML: &str = r#"<h1>Overview</h1>
    <section class="cards">{{CARDS}}</section>
    <h2>Directory</h2>
    <p>{{TOTAL}} members cached, {{ACTIVE}} active, {{INACTIVE}} inactive.</p>
    <table>
      <thead><tr><th>Membership</th><th>Members</th></tr></thead>
      <tbody>{{MEMBERSHIPS}}</tbody>
    </table>
    <h2>Sign-ups, last 7 days</h2>
    <table>
      <thead><tr><th>Date</th><th>Joined</th></tr></thead>
      <tbody>{{DAYS}}</tbody>
    </table>
    <h2>Sign-ups per week</h2>
    <table>
      <thead><tr><th>Week</th><th>Joined</th></tr></thead>
      <tbody>{{WEEKS}}</tbody>
    </table>"#;

const CALENDAR_HTML: &str = r#"<h1>Activity calendar</h1>
    <form class="toolbar" method="post" action="/calendar/events">
      <input type="text" name="title" placeholder="Title" required>
      <input type="date" name="date" required>
      <input type="text" name="description" placeholder="Description">
      <button class="primary" type="submit">Add activity</button>
    </form>
    <ul class="events">
      {{EVENTS}}
    </ul>"#;
