//! Reconciled row → display row
//!
//! Every string leaving this module is already HTML-entity encoded. The
//! renderer concatenates these values into element bodies, `title`
//! attributes and `href`s alike, so encoding happens once, here.

use crate::config::Config;
use crate::inventory::ReconciledRow;
use crate::report::columns::{COLUMNS, COLUMN_COUNT, Column};

/// Admin center URL templates; `{id}` is replaced with the device identifier
#[derive(Debug, Clone)]
pub struct LinkTemplates {
    pub intune_device: String,
    pub entra_device: String,
}

impl LinkTemplates {
    pub fn from_config(config: &Config) -> Self {
        Self {
            intune_device: config.intune_device_url.clone(),
            entra_device: config.entra_device_url.clone(),
        }
    }
}

impl Default for LinkTemplates {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// A display-ready row with every field escaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedRow {
    pub enrolled: bool,
    pub cells: [String; COLUMN_COUNT],
    pub intune_link: Option<String>,
    pub entra_link: Option<String>,
}

impl ProjectedRow {
    pub fn cell(&self, column: Column) -> &str {
        &self.cells[column.index()]
    }

    pub fn link(&self, column: Column) -> Option<&str> {
        match column {
            Column::IntuneDeviceName => self.intune_link.as_deref(),
            Column::EntraDeviceName => self.entra_link.as_deref(),
            _ => None,
        }
    }
}

/// Encode `& < > " '` for safe use in element text and quoted attributes
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Interpolate an already-escaped identifier into a URL template
fn device_link(template: &str, escaped_id: &str) -> Option<String> {
    if escaped_id.is_empty() {
        None
    } else {
        Some(template.replace("{id}", escaped_id))
    }
}

pub fn project(row: &ReconciledRow, links: &LinkTemplates) -> ProjectedRow {
    let cells = COLUMNS.map(|c| escape_html(c.text(row)));

    let intune_link = device_link(&links.intune_device, &cells[Column::IntuneDeviceId.index()]);
    let entra_link = device_link(&links.entra_device, &cells[Column::EntraObjectId.index()]);

    ProjectedRow {
        enrolled: row.enrolled,
        cells,
        intune_link,
        entra_link,
    }
}

pub fn project_all(rows: &[ReconciledRow], links: &LinkTemplates) -> Vec<ProjectedRow> {
    rows.iter().map(|r| project(r, links)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_project_escapes_every_cell() {
        let row = ReconciledRow {
            enrolled: true,
            intune_device_name: Some("<script>".into()),
            model: Some("Surface \"Pro\"".into()),
            autopilot_id: "ap&1".into(),
            intune_device_id: Some("m-1".into()),
            ..Default::default()
        };
        let projected = project(&row, &LinkTemplates::default());
        assert_eq!(projected.cell(Column::IntuneDeviceName), "&lt;script&gt;");
        assert_eq!(projected.cell(Column::Model), "Surface &quot;Pro&quot;");
        assert_eq!(projected.cell(Column::AutopilotId), "ap&amp;1");
        assert_eq!(projected.cell(Column::EnrollmentStatus), "Enrolled");
    }

    #[test]
    fn test_links_present_only_with_identifier() {
        let links = LinkTemplates {
            intune_device: "https://intune.test/device/{id}".into(),
            entra_device: "https://entra.test/device/{id}".into(),
        };
        let enrolled = ReconciledRow {
            intune_device_id: Some("m-1".into()),
            entra_object_id: Some("obj-1".into()),
            ..Default::default()
        };
        let projected = project(&enrolled, &links);
        assert_eq!(
            projected.link(Column::IntuneDeviceName),
            Some("https://intune.test/device/m-1")
        );
        assert_eq!(
            projected.link(Column::EntraDeviceName),
            Some("https://entra.test/device/obj-1")
        );
        assert_eq!(projected.link(Column::SerialNumber), None);

        let bare = project(&ReconciledRow::default(), &links);
        assert_eq!(bare.intune_link, None);
        assert_eq!(bare.entra_link, None);
    }

    #[test]
    fn test_project_does_not_touch_source() {
        let row = ReconciledRow {
            serial_number: Some("A&B".into()),
            ..Default::default()
        };
        let before = row.clone();
        let _ = project(&row, &LinkTemplates::default());
        assert_eq!(row, before);
    }
}
