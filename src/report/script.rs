//! Behavior embedded in the report
//!
//! Mirrors [`super::controller`]: one `state` object, one function per
//! transition, layout persisted to `localStorage` after each layout change.
//! Cells are addressed by their `data-col` id, never by position, so column
//! moves cannot desynchronize headers and rows.

use crate::report::columns::{ENROLLED_TEXT, NOT_ENROLLED_TEXT};
use crate::report::controller::{ORDER_STORAGE_KEY, VISIBILITY_STORAGE_KEY};

pub fn get_table_script() -> String {
    TABLE_SCRIPT
        .replace("__ORDER_KEY__", ORDER_STORAGE_KEY)
        .replace("__VISIBILITY_KEY__", VISIBILITY_STORAGE_KEY)
        .replace("__ENROLLED__", ENROLLED_TEXT)
        .replace("__NOT_ENROLLED__", NOT_ENROLLED_TEXT)
}

const TABLE_SCRIPT: &str = r#"
(function () {
    'use strict';

    const ORDER_KEY = '__ORDER_KEY__';
    const VISIBILITY_KEY = '__VISIBILITY_KEY__';
    const ENROLLED = '__ENROLLED__';
    const NOT_ENROLLED = '__NOT_ENROLLED__';

    const table = document.getElementById('deviceTable');
    const headerRow = table.tHead.rows[0];
    const tbody = table.tBodies[0];
    const rows = Array.from(tbody.rows);

    const declared = Array.from(headerRow.cells).map(th => th.dataset.col);
    const labels = {};
    const headers = {};
    Array.from(headerRow.cells).forEach(th => {
        labels[th.dataset.col] = th.dataset.label;
        headers[th.dataset.col] = th;
    });

    // Cell text never changes after render, so read it once
    const cells = rows.map(tr => {
        const byCol = {};
        Array.from(tr.cells).forEach(td => {
            byCol[td.dataset.col] = { td: td, text: td.textContent.trim() };
        });
        return byCol;
    });

    function initialState() {
        const visible = {};
        declared.forEach(id => { visible[id] = true; });
        return {
            columnOrder: declared.slice(),
            columnVisible: visible,
            filters: { global: '', columns: {}, enrollment: 'all', groupTags: [] },
            sort: null,
            rowOrder: rows.map((_, i) => i)
        };
    }

    const state = initialState();

    function visibleColumns() {
        return state.columnOrder.filter(id => state.columnVisible[id]);
    }

    function contains(haystack, needle) {
        return haystack.toLowerCase().indexOf(needle.toLowerCase()) !== -1;
    }

    function rowMatches(i, shownColumns) {
        const f = state.filters;
        const row = cells[i];

        const global = f.global.trim();
        if (global && !shownColumns.some(id => contains(row[id].text, global))) {
            return false;
        }

        for (const id of Object.keys(f.columns)) {
            const needle = f.columns[id].trim();
            if (needle && !contains(row[id].text, needle)) {
                return false;
            }
        }

        const status = row['enrollment'].text;
        if (f.enrollment === 'enrolled' && status !== ENROLLED) return false;
        if (f.enrollment === 'not-enrolled' && status !== NOT_ENROLLED) return false;

        return f.groupTags.length === 0 || f.groupTags.indexOf(row['group-tag'].text) !== -1;
    }

    function visibleRows() {
        const shownColumns = visibleColumns();
        return state.rowOrder.filter(i => rowMatches(i, shownColumns));
    }

    // ---- rendering -------------------------------------------------------

    function renderRows() {
        const shownColumns = visibleColumns();
        let count = 0;
        state.rowOrder.forEach(i => {
            const show = rowMatches(i, shownColumns);
            rows[i].style.display = show ? '' : 'none';
            if (show) count++;
            tbody.appendChild(rows[i]);
        });
        document.getElementById('rowCount').textContent =
            count + ' of ' + rows.length + ' devices';
    }

    function renderColumns() {
        state.columnOrder.forEach(id => {
            const display = state.columnVisible[id] ? '' : 'none';
            headers[id].style.display = display;
            headerRow.appendChild(headers[id]);
            cells.forEach((row, i) => {
                row[id].td.style.display = display;
                rows[i].appendChild(row[id].td);
            });
        });
        renderColumnMenu();
    }

    function renderSortIndicators() {
        declared.forEach(id => {
            const indicator = headers[id].querySelector('.sort-indicator');
            if (!indicator) return;
            if (state.sort && state.sort.col === id) {
                indicator.textContent = state.sort.dir === 'asc' ? ' ▲' : ' ▼';
            } else {
                indicator.textContent = '';
            }
        });
    }

    function renderColumnMenu() {
        const list = document.getElementById('columnChecks');
        list.innerHTML = '';
        state.columnOrder.forEach((id, position) => {
            const label = document.createElement('label');
            const box = document.createElement('input');
            box.type = 'checkbox';
            box.checked = state.columnVisible[id];
            box.addEventListener('change', () => toggleColumn(position, box.checked));
            label.appendChild(box);
            label.appendChild(document.createTextNode(' ' + labels[id]));
            list.appendChild(label);
        });
    }

    // ---- persistence -----------------------------------------------------

    function persist() {
        try {
            localStorage.setItem(ORDER_KEY, JSON.stringify(state.columnOrder));
            localStorage.setItem(VISIBILITY_KEY,
                JSON.stringify(state.columnOrder.map(id => state.columnVisible[id])));
        } catch (e) {
            // storage unavailable (private mode, file:// restrictions)
        }
    }

    function readStored(key) {
        try {
            const raw = localStorage.getItem(key);
            return raw === null ? null : JSON.parse(raw);
        } catch (e) {
            return null;
        }
    }

    function restoreLayout() {
        const order = readStored(ORDER_KEY);
        if (Array.isArray(order) && order.length === declared.length &&
            new Set(order).size === declared.length &&
            order.every(id => declared.indexOf(id) !== -1)) {
            state.columnOrder = order.slice();
        }

        // Visibility is positional, so it is applied after the order
        const visible = readStored(VISIBILITY_KEY);
        if (Array.isArray(visible) && visible.length === declared.length) {
            state.columnOrder.forEach((id, position) => {
                state.columnVisible[id] = visible[position] === true;
            });
        }
    }

    // ---- transitions -----------------------------------------------------

    function filtersChanged() {
        renderRows();
    }

    function sortBy(id) {
        const dir = state.sort && state.sort.col === id && state.sort.dir === 'asc' ? 'desc' : 'asc';
        state.rowOrder.sort((a, b) => {
            const x = cells[a][id].text.toLowerCase();
            const y = cells[b][id].text.toLowerCase();
            return x < y ? -1 : x > y ? 1 : 0;
        });
        // Descending mirrors ascending exactly, ties included
        if (dir === 'desc') state.rowOrder.reverse();
        state.sort = { col: id, dir: dir };
        renderSortIndicators();
        renderRows();
    }

    function toggleColumn(position, show) {
        const id = state.columnOrder[position];
        if (id === undefined) return;
        state.columnVisible[id] = show;
        persist();
        renderColumns();
        renderRows();
    }

    function moveColumn(from, to) {
        const n = state.columnOrder.length;
        if (from < 0 || from >= n || to < 0 || to >= n || from === to) return;
        const moved = state.columnOrder.splice(from, 1)[0];
        state.columnOrder.splice(to, 0, moved);
        persist();
        renderColumns();
    }

    function setAllColumns(show) {
        declared.forEach(id => { state.columnVisible[id] = show; });
        persist();
        renderColumns();
        renderRows();
    }

    function resetLayout() {
        try {
            localStorage.removeItem(ORDER_KEY);
            localStorage.removeItem(VISIBILITY_KEY);
        } catch (e) {
            // nothing stored
        }
        location.reload();
    }

    function csvField(value) {
        return '"' + String(value).replace(/"/g, '""') + '"';
    }

    function exportCsv() {
        const shownColumns = visibleColumns();
        if (shownColumns.length === 0) return;

        const lines = [shownColumns.map(id => csvField(labels[id])).join(',')];
        visibleRows().forEach(i => {
            lines.push(shownColumns.map(id => csvField(cells[i][id].text)).join(','));
        });

        const blob = new Blob([lines.join('\n') + '\n'], { type: 'text/csv;charset=utf-8' });
        const link = document.createElement('a');
        link.href = URL.createObjectURL(blob);
        link.download = 'DeviceReport.csv';
        document.body.appendChild(link);
        link.click();
        document.body.removeChild(link);
        URL.revokeObjectURL(link.href);
    }

    function clearFilters() {
        state.filters = { global: '', columns: {}, enrollment: 'all', groupTags: [] };
        document.getElementById('globalSearch').value = '';
        document.getElementById('enrollmentFilter').value = 'all';
        Array.from(document.getElementById('groupTagFilter').options)
            .forEach(opt => { opt.selected = false; });
        document.querySelectorAll('.column-filter').forEach(input => { input.value = ''; });
        filtersChanged();
    }

    // ---- wiring ----------------------------------------------------------

    document.getElementById('globalSearch').addEventListener('input', e => {
        state.filters.global = e.target.value;
        filtersChanged();
    });

    document.getElementById('enrollmentFilter').addEventListener('change', e => {
        state.filters.enrollment = e.target.value;
        filtersChanged();
    });

    document.getElementById('groupTagFilter').addEventListener('change', e => {
        state.filters.groupTags = Array.from(e.target.selectedOptions).map(opt => opt.value);
        filtersChanged();
    });

    document.querySelectorAll('.column-filter').forEach(input => {
        input.addEventListener('input', () => {
            if (input.value.trim()) {
                state.filters.columns[input.dataset.col] = input.value;
            } else {
                delete state.filters.columns[input.dataset.col];
            }
            filtersChanged();
        });
    });

    document.getElementById('exportCsv').addEventListener('click', exportCsv);
    document.getElementById('clearFilters').addEventListener('click', clearFilters);
    document.getElementById('selectAllColumns').addEventListener('click', () => setAllColumns(true));
    document.getElementById('deselectAllColumns').addEventListener('click', () => setAllColumns(false));
    document.getElementById('resetLayout').addEventListener('click', resetLayout);
    document.getElementById('columnMenuToggle').addEventListener('click', () => {
        const panel = document.getElementById('columnMenu');
        panel.hidden = !panel.hidden;
    });

    let dragFrom = null;
    declared.forEach(id => {
        const th = headers[id];
        th.addEventListener('click', () => sortBy(id));
        th.addEventListener('dragstart', e => {
            dragFrom = state.columnOrder.indexOf(id);
            e.dataTransfer.effectAllowed = 'move';
            e.dataTransfer.setData('text/plain', id);
        });
        th.addEventListener('dragover', e => {
            e.preventDefault();
            e.dataTransfer.dropEffect = 'move';
        });
        th.addEventListener('drop', e => {
            e.preventDefault();
            if (dragFrom !== null) {
                moveColumn(dragFrom, state.columnOrder.indexOf(id));
            }
            dragFrom = null;
        });
    });

    restoreLayout();
    renderColumns();
    renderRows();
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_filled() {
        let script = get_table_script();
        assert!(!script.contains("__ORDER_KEY__"));
        assert!(!script.contains("__NOT_ENROLLED__"));
        assert!(script.contains(&format!("'{}'", ORDER_STORAGE_KEY)));
        assert!(script.contains(&format!("'{}'", VISIBILITY_STORAGE_KEY)));
        assert!(script.contains("'Not enrolled'"));
    }

    #[test]
    fn test_script_cannot_close_its_tag() {
        assert!(!get_table_script().contains("</script"));
    }
}
