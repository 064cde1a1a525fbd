//! JSON and HTML artifacts.

use std::fs;
use std::path::Path;

use crate::AlertSummary;
use crate::error::AlertsError;

/// Serialize `summaries` as a 2-space indented JSON array to `path`,
/// replacing any previous file. Returns the written text.
pub fn write_json(path: &Path, summaries: &[AlertSummary]) -> Result<String, AlertsError> {
    let json = serde_json::to_string_pretty(summaries)?;
    fs::write(path, &json)?;
    tracing::debug!("Wrote {} alerts to {}", summaries.len(), path.display());
    Ok(json)
}

pub fn render_html(summaries: &[AlertSummary]) -> String {
    let mut html = String::from("<ul>");
    for item in summaries {
        html.push_str(&format!(
            "<li><b>Route {}:</b> {}</li>",
            item.route_id, item.description
        ));
    }
    html.push_str("</ul>");
    html
}

pub fn write_html(path: &Path, summaries: &[AlertSummary]) -> Result<String, AlertsError> {
    let html = render_html(summaries);
    fs::write(path, &html)?;
    tracing::debug!("Wrote HTML fragment to {}", path.display());
    Ok(html)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(route_id: &str, description: &str) -> AlertSummary {
        AlertSummary {
            route_id: route_id.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn json_is_indented_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_alerts.json");

        let json = write_json(&path, &[summary("201", "D")]).unwrap();

        let expected = "[\n  {\n    \"route_id\": \"201\",\n    \"description\": \"D\"\n  }\n]";
        assert_eq!(json, expected);
        assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    }

    #[test]
    fn json_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_alerts.json");
        fs::write(&path, "stale contents that are longer than an empty array").unwrap();

        write_json(&path, &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn html_lists_each_alert() {
        let html = render_html(&[summary("201", "Detour on 4 St"), summary("202", "Stop closed")]);
        assert_eq!(
            html,
            "<ul><li><b>Route 201:</b> Detour on 4 St</li>\
             <li><b>Route 202:</b> Stop closed</li></ul>"
        );
    }

    #[test]
    fn html_for_no_alerts_is_empty_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("current_alerts.html");
        let html = write_html(&path, &[]).unwrap();
        assert_eq!(html, "<ul></ul>");
        assert_eq!(fs::read_to_string(&path).unwrap(), "<ul></ul>");
    }
}
