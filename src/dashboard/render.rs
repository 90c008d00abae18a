//! Server-side HTML for the dashboard page.

use super::list::{IncidentListState, LoadState};
use super::player::{PlayerState, PLACEHOLDER_IMAGE};
use crate::db::models::IncidentRecord;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::fmt::Write;

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Percent-encode an identifier for use in a URL path segment or query value
pub fn encode_component(text: &str) -> String {
    utf8_percent_encode(text, NON_ALPHANUMERIC).to_string()
}

pub fn format_time(ts: &DateTime<Utc>) -> String {
    ts.format("%H:%M").to_string()
}

pub fn render_dashboard(list: &IncidentListState, player: &PlayerState) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Incident Monitor</title>
<link rel="stylesheet" href="/dashboard.css">
</head>
<body class="min-h-screen bg-gray-900">
<nav class="navbar"><a href="/">Incident Monitor</a></nav>
<main class="grid">
<section class="player-column">{player}</section>
<aside class="list-column">{list}</aside>
</main>
</body>
</html>
"#,
        player = render_player(player),
        list = render_list(list),
    )
}

pub fn render_list(list: &IncidentListState) -> String {
    let mut html = String::from(r#"<div class="incident-list"><header><h2>Active Incidents</h2>"#);
    if *list.load_state() == LoadState::Loaded {
        let _ = write!(
            html,
            r#"<span class="count">{} Active</span>"#,
            list.incidents().len()
        );
    }
    html.push_str("</header>");

    match list.load_state() {
        LoadState::Loading => {
            html.push_str(r#"<div class="spinner" role="status">Loading incidents...</div>"#);
        }
        LoadState::Failed(message) => {
            let _ = write!(
                html,
                r#"<div class="error"><p>{}</p><a class="retry" href="/">Retry</a></div>"#,
                escape_html(message)
            );
        }
        LoadState::Loaded => {
            if let Some(error) = list.error() {
                let _ = write!(html, r#"<p class="error inline">{}</p>"#, escape_html(error));
            }
            if list.incidents().is_empty() {
                html.push_str(r#"<p class="empty">No open incidents</p>"#);
            } else {
                html.push_str("<ul>");
                for incident in list.incidents() {
                    html.push_str(&render_row(incident, list.is_resolving(&incident.id)));
                }
                html.push_str("</ul>");
            }
        }
    }

    html.push_str("</div>");
    html
}

fn render_row(incident: &IncidentRecord, resolving: bool) -> String {
    let id = encode_component(&incident.id);
    let button = if resolving {
        r#"<button type="submit" disabled>Resolving...</button>"#
    } else {
        r#"<button type="submit">Resolve</button>"#
    };

    format!(
        r#"<li class="incident"><a class="select" href="/?selected={id}"><img src="{thumb}" alt="" onerror="this.onerror=null;this.src='{placeholder}'"><span class="badge {badge}">{kind}</span><span class="camera">{camera}</span><span class="location">{location}</span><span class="time">{start} - {end}</span></a><form method="post" action="/dashboard/incidents/{id}/resolve">{button}</form></li>"#,
        id = id,
        thumb = escape_html(&incident.thumbnail_url),
        placeholder = PLACEHOLDER_IMAGE,
        badge = incident.incident_type.badge_class(),
        kind = escape_html(incident.incident_type.as_str()),
        camera = escape_html(&incident.camera.name),
        location = escape_html(&incident.camera.location),
        start = format_time(&incident.ts_start),
        end = format_time(&incident.ts_end),
        button = button,
    )
}

pub fn render_player(player: &PlayerState) -> String {
    let mut html = String::from(r#"<div class="player">"#);

    match player.selected() {
        Some(incident) => {
            let _ = write!(
                html,
                r#"<div class="media"><img src="{src}" alt="Incident thumbnail" onerror="this.onerror=null;this.src='{placeholder}'"></div><div class="details"><span class="badge {badge}">{kind}</span><h3>{camera}</h3><p class="location">{location}</p><p class="time">{start} - {end}</p></div>"#,
                src = escape_html(player.media_src()),
                placeholder = PLACEHOLDER_IMAGE,
                badge = incident.incident_type.badge_class(),
                kind = escape_html(incident.incident_type.as_str()),
                camera = escape_html(&incident.camera.name),
                location = escape_html(&incident.camera.location),
                start = format_time(&incident.ts_start),
                end = format_time(&incident.ts_end),
            );
        }
        None => {
            let _ = write!(
                html,
                r#"<div class="media"><img src="{}" alt=""><p class="prompt">Select an incident to view</p></div>"#,
                PLACEHOLDER_IMAGE
            );
        }
    }

    html.push_str(r#"<div class="camera-tiles">"#);
    for (index, camera) in player.cameras().iter().enumerate() {
        let active = if index == player.active_camera() {
            " active"
        } else {
            ""
        };
        let _ = write!(
            html,
            r#"<div class="tile{active}"><span class="live">LIVE</span><span class="name">{name}</span><span class="location">{location}</span></div>"#,
            active = active,
            name = escape_html(&camera.name),
            location = escape_html(&camera.location),
        );
    }
    html.push_str("</div></div>");
    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Camera;
    use crate::services::InMemoryIncidentStore;
    use chrono::TimeZone;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<b>"Vault" & 'Co'</b>"#),
            "&lt;b&gt;&quot;Vault&quot; &amp; &#39;Co&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn encodes_identifiers_for_paths() {
        assert_eq!(encode_component("a b/c"), "a%20b%2Fc");
        assert_eq!(encode_component("42"), "42");
        assert_eq!(encode_component("x?y&z"), "x%3Fy%26z");
        assert_eq!(encode_component("é"), "%C3%A9");
    }

    #[test]
    fn formats_hours_and_minutes() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 9, 7, 45).unwrap();
        assert_eq!(format_time(&ts), "09:07");
    }

    #[test]
    fn loading_and_empty_states() {
        let mut list = IncidentListState::new();
        assert!(render_list(&list).contains("spinner"));
        assert!(!render_list(&list).contains("Active</span>"));

        list.loaded(Vec::new());
        let html = render_list(&list);
        assert!(html.contains("No open incidents"));
        assert!(html.contains("0 Active"));
    }

    #[tokio::test]
    async fn rows_link_to_player_and_resolve_form() {
        let store = InMemoryIncidentStore::fixture(Utc::now());
        let mut list = IncidentListState::new();
        list.load(&store).await;
        assert!(list.begin_resolve("4"));

        let html = render_list(&list);
        assert!(html.contains(r#"href="/?selected=1""#));
        assert!(html.contains(r#"action="/dashboard/incidents/1/resolve""#));
        assert!(html.contains("bg-red-500"));
        assert!(html.contains("Resolving..."));
        assert!(html.contains("4 Active"));
        assert!(html.contains(r#"<span class="location">Building B - Basement</span>"#));
    }

    #[test]
    fn player_shows_prompt_and_tiles() {
        let player = PlayerState::new(vec![Camera::new("Vault <B>", "Basement")]);
        let html = render_player(&player);
        assert!(html.contains("Select an incident"));
        assert!(html.contains("Vault &lt;B&gt;"));
        assert!(html.contains(r#"class="tile active""#));
    }
}
