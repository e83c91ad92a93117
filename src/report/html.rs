//! Interactive HTML device report
//!
//! One self-contained document: styles, filter controls, the 13-column
//! device table and the table script. Cell values arrive pre-escaped from
//! the projector and are inserted verbatim.

use crate::inventory::InventorySummary;
use crate::report::columns::{COLUMNS, Column, TEXT_FILTER_COLUMNS};
use crate::report::projector::{ProjectedRow, escape_html};
use crate::report::script::get_table_script;
use chrono::{DateTime, Local};
use std::collections::BTreeSet;

/// Report metadata
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    pub title: String,
    pub generated_at: DateTime<Local>,
    pub summary: InventorySummary,
    /// Primary-user lookups that failed and were left blank
    pub degraded_lookups: usize,
}

/// Generate the complete HTML report
pub fn generate_html_report(metadata: &ReportMetadata, rows: &[ProjectedRow]) -> String {
    let css = get_css_styles();
    let header = generate_header(metadata);
    let controls = generate_controls(rows);
    let table = generate_table(rows);
    let script = get_table_script();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <div class="container">
{header}
{controls}
{table}
    </div>
    <script>
{script}
    </script>
</body>
</html>"#,
        title = escape_html(&metadata.title),
        css = css,
        header = header,
        controls = controls,
        table = table,
        script = script,
    )
}

fn get_css_styles() -> &'static str {
    r#"
        :root {
            --primary: #1e40af;
            --secondary: #64748b;
            --success: #16a34a;
            --warning: #ca8a04;
            --light: #f8fafc;
            --dark: #1e293b;
            --border: #e2e8f0;
        }

        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: 'Segoe UI', system-ui, -apple-system, sans-serif;
            line-height: 1.5;
            color: var(--dark);
            background: var(--light);
        }

        .container {
            padding: 1.5rem 2rem;
            background: white;
            min-height: 100vh;
        }

        /* Header */
        .header {
            padding-bottom: 1rem;
            border-bottom: 3px solid var(--primary);
            margin-bottom: 1rem;
        }

        .header h1 {
            color: var(--primary);
            font-size: 1.75rem;
            font-weight: 600;
        }

        .header .metadata {
            display: flex;
            flex-wrap: wrap;
            gap: 1.5rem;
            margin-top: 0.5rem;
            font-size: 0.9rem;
            color: var(--secondary);
        }

        .header .degraded {
            color: var(--warning);
        }

        /* Controls */
        .controls,
        .column-filters {
            display: flex;
            flex-wrap: wrap;
            align-items: flex-start;
            gap: 0.75rem;
            margin-bottom: 0.75rem;
        }

        .controls input[type="search"] {
            min-width: 280px;
        }

        input, select, button {
            font: inherit;
            font-size: 0.9rem;
            padding: 0.35rem 0.6rem;
            border: 1px solid var(--border);
            border-radius: 6px;
            background: white;
        }

        button {
            cursor: pointer;
            background: var(--primary);
            color: white;
            border-color: var(--primary);
        }

        button.secondary {
            background: white;
            color: var(--primary);
        }

        .column-filters input {
            width: 11rem;
        }

        #rowCount {
            margin-left: auto;
            align-self: center;
            color: var(--secondary);
            font-size: 0.9rem;
        }

        .column-menu {
            position: relative;
        }

        .column-menu-panel {
            position: absolute;
            z-index: 20;
            top: 2.4rem;
            left: 0;
            width: 16rem;
            padding: 0.75rem;
            background: white;
            border: 1px solid var(--border);
            border-radius: 8px;
            box-shadow: 0 8px 24px rgba(15, 23, 42, 0.12);
        }

        .column-menu-actions {
            display: flex;
            gap: 0.4rem;
            margin-bottom: 0.5rem;
        }

        #columnChecks label {
            display: block;
            font-size: 0.9rem;
            padding: 0.1rem 0;
        }

        /* Table */
        .table-wrap {
            overflow: auto;
            max-height: calc(100vh - 14rem);
            border: 1px solid var(--border);
            border-radius: 8px;
        }

        .device-table {
            width: 100%;
            border-collapse: collapse;
            font-size: 0.85rem;
        }

        .device-table th,
        .device-table td {
            padding: 0.5rem 0.75rem;
            text-align: left;
            border-bottom: 1px solid var(--border);
            white-space: nowrap;
            max-width: 22rem;
            overflow: hidden;
            text-overflow: ellipsis;
        }

        .device-table th {
            position: sticky;
            top: 0;
            background: var(--light);
            font-weight: 600;
            color: var(--secondary);
            text-transform: uppercase;
            font-size: 0.75rem;
            cursor: pointer;
            user-select: none;
        }

        .device-table tr:hover td {
            background: var(--light);
        }

        .device-table a {
            color: var(--primary);
        }

        .badge {
            padding: 0.1rem 0.6rem;
            border-radius: 9999px;
            font-size: 0.75rem;
            font-weight: 600;
            color: white;
        }

        .badge.enrolled { background: var(--success); }
        .badge.not-enrolled { background: var(--secondary); }

        .empty {
            padding: 2rem;
            text-align: center;
            color: var(--secondary);
        }
"#
}

fn generate_header(metadata: &ReportMetadata) -> String {
    let summary = &metadata.summary;
    let degraded = if metadata.degraded_lookups > 0 {
        format!(
            r#"
                <span class="degraded">⚠ {} primary user lookup(s) failed</span>"#,
            metadata.degraded_lookups
        )
    } else {
        String::new()
    };

    format!(
        r#"        <header class="header">
            <h1>{title}</h1>
            <div class="metadata">
                <span>Generated: {date}</span>
                <span>Autopilot devices: {devices}</span>
                <span>Intune enrolled: {enrolled}</span>
                <span>Entra matched: {matched}</span>
                <span>With primary user: {users}</span>{degraded}
            </div>
        </header>"#,
        title = escape_html(&metadata.title),
        date = metadata.generated_at.format("%Y-%m-%d %H:%M:%S %Z"),
        devices = summary.devices,
        enrolled = summary.enrolled,
        matched = summary.directory_matched,
        users = summary.with_primary_user,
        degraded = degraded,
    )
}

/// Distinct non-empty group tags, exact values, sorted case-insensitively.
///
/// The filter matches tags exactly, so "Sales" and "sales" are separate options.
fn group_tags(rows: &[ProjectedRow]) -> Vec<&str> {
    let tags: BTreeSet<&str> = rows
        .iter()
        .map(|row| row.cell(Column::GroupTag))
        .filter(|tag| !tag.is_empty())
        .collect();
    let mut tags: Vec<&str> = tags.into_iter().collect();
    tags.sort_by_key(|tag| (tag.to_lowercase(), *tag));
    tags
}

fn generate_controls(rows: &[ProjectedRow]) -> String {
    let tag_options: String = group_tags(rows)
        .iter()
        .map(|tag| format!(r#"<option value="{tag}">{tag}</option>"#, tag = tag))
        .collect::<Vec<_>>()
        .join("");

    let column_filters: String = TEXT_FILTER_COLUMNS
        .iter()
        .map(|c| {
            format!(
                r#"            <input type="text" class="column-filter" data-col="{id}" placeholder="{label}">"#,
                id = c.id(),
                label = c.label(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"        <div class="controls">
            <input type="search" id="globalSearch" placeholder="Search all visible columns">
            <select id="enrollmentFilter">
                <option value="all">All devices</option>
                <option value="enrolled">Enrolled</option>
                <option value="not-enrolled">Not enrolled</option>
            </select>
            <select id="groupTagFilter" multiple size="3" title="Group tags (Ctrl+click for several)">{tag_options}</select>
            <button type="button" id="exportCsv">Export CSV</button>
            <button type="button" id="clearFilters" class="secondary">Clear filters</button>
            <div class="column-menu">
                <button type="button" id="columnMenuToggle" class="secondary">Columns ▾</button>
                <div id="columnMenu" class="column-menu-panel" hidden>
                    <div class="column-menu-actions">
                        <button type="button" id="selectAllColumns" class="secondary">Select All</button>
                        <button type="button" id="deselectAllColumns" class="secondary">Deselect All</button>
                        <button type="button" id="resetLayout" class="secondary">Reset</button>
                    </div>
                    <div id="columnChecks"></div>
                </div>
            </div>
            <span id="rowCount">{count} of {count} devices</span>
        </div>
        <div class="column-filters">
{column_filters}
        </div>"#,
        tag_options = tag_options,
        count = rows.len(),
        column_filters = column_filters,
    )
}

fn generate_cell(row: &ProjectedRow, column: Column) -> String {
    let text = row.cell(column);
    let body = match column {
        Column::EnrollmentStatus => {
            let class = if row.enrolled {
                "enrolled"
            } else {
                "not-enrolled"
            };
            format!(r#"<span class="badge {}">{}</span>"#, class, text)
        }
        _ => match row.link(column) {
            Some(href) if !text.is_empty() => format!(
                r#"<a href="{}" target="_blank" rel="noopener noreferrer">{}</a>"#,
                href, text
            ),
            _ => text.to_string(),
        },
    };

    format!(
        r#"<td data-col="{id}" title="{text}">{body}</td>"#,
        id = column.id(),
        text = text,
        body = body,
    )
}

fn generate_table(rows: &[ProjectedRow]) -> String {
    let header_cells: String = COLUMNS
        .iter()
        .map(|c| {
            format!(
                r#"                        <th data-col="{id}" data-label="{label}" draggable="true">{label}<span class="sort-indicator"></span></th>"#,
                id = c.id(),
                label = c.label(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let body_rows: String = rows
        .iter()
        .map(|row| {
            let cells: String = COLUMNS.iter().map(|c| generate_cell(row, *c)).collect();
            format!("                    <tr>{}</tr>", cells)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let empty = if rows.is_empty() {
        r#"
            <p class="empty">No Autopilot devices were returned.</p>"#
    } else {
        ""
    };

    format!(
        r#"        <div class="table-wrap">
            <table id="deviceTable" class="device-table">
                <thead>
                    <tr>
{header_cells}
                    </tr>
                </thead>
                <tbody>
{body_rows}
                </tbody>
            </table>{empty}
        </div>"#,
        header_cells = header_cells,
        body_rows = body_rows,
        empty = empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::ReconciledRow;
    use crate::report::controller::{TableEvent, TableState};
    use crate::report::projector::{LinkTemplates, project, project_all};
    use crate::report::table_rows;

    fn metadata(devices: usize) -> ReportMetadata {
        ReportMetadata {
            title: "Autopilot Device Report".to_string(),
            generated_at: Local::now(),
            summary: InventorySummary {
                devices,
                ..Default::default()
            },
            degraded_lookups: 0,
        }
    }

    fn links() -> LinkTemplates {
        LinkTemplates {
            intune_device: "https://intune.test/{id}".into(),
            entra_device: "https://entra.test/{id}".into(),
        }
    }

    #[test]
    fn test_empty_report_is_complete() {
        let html = generate_html_report(&metadata(0), &[]);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<thead>"));
        assert_eq!(html.matches("<th ").count(), 13);
        assert_eq!(html.matches("<tr>").count(), 1);
        assert!(html.contains("No Autopilot devices were returned."));
        assert!(html.contains("0 of 0 devices"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_one_row_per_device_with_thirteen_cells() {
        let rows: Vec<_> = (0..3)
            .map(|i| {
                project(
                    &ReconciledRow {
                        autopilot_id: format!("ap-{}", i),
                        ..Default::default()
                    },
                    &links(),
                )
            })
            .collect();
        let html = generate_html_report(&metadata(3), &rows);
        assert_eq!(html.matches("<tr>").count(), 1 + 3);
        assert_eq!(html.matches("<td ").count(), 13 * 3);
        assert!(!html.contains("No Autopilot devices were returned."));
    }

    #[test]
    fn test_links_rendered_only_when_identifier_present() {
        let linked = project(
            &ReconciledRow {
                enrolled: true,
                intune_device_name: Some("LAPTOP-01".into()),
                intune_device_id: Some("m-1".into()),
                entra_device_name: Some("Laptop-A".into()),
                entra_object_id: Some("obj-1".into()),
                ..Default::default()
            },
            &links(),
        );
        let unlinked = project(
            &ReconciledRow {
                entra_device_name: Some("Orphan".into()),
                ..Default::default()
            },
            &links(),
        );

        let html = generate_html_report(&metadata(2), &[linked, unlinked]);
        assert!(html.contains(r#"<a href="https://intune.test/m-1""#));
        assert!(html.contains(r#"<a href="https://entra.test/obj-1""#));
        assert!(html.contains(r#"title="Orphan">Orphan</td>"#));
    }

    #[test]
    fn test_hostile_values_stay_escaped() {
        let row = project(
            &ReconciledRow {
                serial_number: Some("<img src=x onerror=alert(1)>".into()),
                group_tag: Some("R&D \"west\"".into()),
                ..Default::default()
            },
            &links(),
        );
        let html = generate_html_report(&metadata(1), &[row]);
        assert!(!html.contains("<img src=x"));
        assert!(html.contains("&lt;img src=x onerror=alert(1)&gt;"));
        assert!(html.contains(r#"<option value="R&amp;D &quot;west&quot;">"#));
    }

    #[test]
    fn test_every_tagged_row_is_reachable_through_an_option() {
        let reconciled: Vec<ReconciledRow> = ["Sales", "sales", "", "Lab", "Sales"]
            .iter()
            .map(|t| ReconciledRow {
                group_tag: Some(t.to_string()),
                ..Default::default()
            })
            .collect();
        let projected = project_all(&reconciled, &links());
        let options = group_tags(&projected);
        assert_eq!(options, vec!["Lab", "Sales", "sales"]);

        let cells = table_rows(&reconciled);
        let all_tags: BTreeSet<String> = options.iter().map(|t| t.to_string()).collect();
        let state = TableState::new(cells.len()).apply(&TableEvent::SetGroupTags(all_tags), &cells);
        assert_eq!(state.visible_rows(&cells), vec![0, 1, 3, 4]);

        for option in options {
            let one = BTreeSet::from([option.to_string()]);
            let state = TableState::new(cells.len()).apply(&TableEvent::SetGroupTags(one), &cells);
            assert!(!state.visible_rows(&cells).is_empty(), "{option} selects nothing");
        }
    }

    #[test]
    fn test_header_shows_degraded_lookups() {
        let mut meta = metadata(1);
        meta.degraded_lookups = 2;
        let html = generate_html_report(&meta, &[]);
        assert!(html.contains("2 primary user lookup(s) failed"));
    }

    #[test]
    fn test_title_is_escaped() {
        let mut meta = metadata(0);
        meta.title = "Devices <Q3>".to_string();
        let html = generate_html_report(&meta, &[]);
        assert!(html.contains("<title>Devices &lt;Q3&gt;</title>"));
        assert!(!html.contains("<Q3>"));
    }
}
