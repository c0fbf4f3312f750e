use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Dashboard asset handlers.
pub struct DashboardAssets;

const STYLES: &str = r#"
:root {
    --bg-primary: #f7f7f9;
    --bg-secondary: #ffffff;
    --bg-stripe: #f3f3f6;
    --text-primary: #1f2328;
    --text-secondary: #6b7280;
    --accent: #3b528b;
    --selected: #dde6f7;
    --border: #e2e4e8;
    --shadow: 0 1px 3px rgba(0, 0, 0, 0.08);
}

* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
    background: var(--bg-primary);
    color: var(--text-primary);
    line-height: 1.5;
}

.dashboard {
    max-width: 1280px;
    margin: 0 auto;
    padding: 1.5rem;
}

.content-header {
    display: flex;
    align-items: baseline;
    gap: 1rem;
    margin-bottom: 1rem;
}

.content-header h1 {
    font-size: 1.6rem;
}

.version {
    color: var(--text-secondary);
    font-size: 0.8rem;
}

.panel {
    background: var(--bg-secondary);
    border: 1px solid var(--border);
    border-radius: 8px;
    box-shadow: var(--shadow);
    padding: 1rem;
    margin-bottom: 1rem;
}

.filters {
    display: flex;
    align-items: center;
    gap: 0.75rem;
    flex-wrap: wrap;
}

.filters select,
.filters input[type="search"] {
    padding: 0.4rem 0.6rem;
    border: 1px solid var(--border);
    border-radius: 4px;
    min-width: 200px;
}

.summary {
    margin-top: 0.5rem;
    color: var(--text-secondary);
    font-size: 0.85rem;
}

.layout {
    display: grid;
    grid-template-columns: 2fr 1fr;
    gap: 1rem;
}

.data-table {
    width: 100%;
    border-collapse: collapse;
    font-size: 0.9rem;
}

.data-table th,
.data-table td {
    padding: 0.45rem 0.6rem;
    text-align: left;
    border-bottom: 1px solid var(--border);
}

.data-table th a {
    color: var(--text-primary);
    text-decoration: none;
    white-space: nowrap;
}

.data-table td a {
    color: var(--accent);
    text-decoration: none;
}

.data-table .numeric {
    text-align: right;
}

.data-table tr.odd {
    background: var(--bg-stripe);
}

.data-table tr.selected {
    background: var(--selected);
}

.empty-row td {
    text-align: center;
    color: var(--text-secondary);
}

.pager {
    display: flex;
    align-items: center;
    justify-content: flex-end;
    gap: 0.75rem;
    margin-top: 0.75rem;
}

.btn {
    padding: 0.3rem 0.8rem;
    border-radius: 4px;
    border: 1px solid var(--border);
    background: var(--bg-secondary);
    color: var(--text-primary);
    text-decoration: none;
    font-size: 0.85rem;
}

.btn-disabled {
    color: var(--text-secondary);
    opacity: 0.6;
}

.flag-panel {
    text-align: center;
}

.flag {
    max-width: 100%;
    max-height: 200px;
    border: 1px solid var(--border);
}

.placeholder {
    color: var(--text-secondary);
    font-style: italic;
}

#country-info h3 {
    margin-bottom: 0.5rem;
}

#country-info dl {
    display: grid;
    grid-template-columns: auto 1fr;
    gap: 0.25rem 1rem;
}

#country-info dt {
    font-weight: 600;
}

.bar-chart {
    width: 100%;
    height: auto;
}

.bar-chart .chart-title {
    font-size: 18px;
    font-weight: 600;
}

.bar-chart .tick,
.bar-chart .axis-title {
    font-size: 12px;
    fill: var(--text-secondary);
}

.bar-chart .grid {
    stroke: var(--border);
}

.error-panel {
    color: #b91c1c;
}

.loading {
    opacity: 0.6;
    transition: opacity 0.2s;
}

@media (max-width: 900px) {
    .layout {
        grid-template-columns: 1fr;
    }
}
"#;

const SCRIPT: &str = r#"
// Countries dashboard: re-renders fragments without a full page load.

document.addEventListener('DOMContentLoaded', function() {
    setupEventHandlers();
    window.addEventListener('popstate', function() {
        refresh(window.location.search.replace(/^\?/, ''), false);
    });
});

function setupEventHandlers() {
    document.addEventListener('click', function(event) {
        const link = event.target.closest('a[data-nav]');
        if (!link || event.metaKey || event.ctrlKey) {
            return;
        }
        event.preventDefault();
        refresh(new URL(link.href).search.replace(/^\?/, ''), true);
    });

    document.addEventListener('change', function(event) {
        const form = event.target.closest('form.filters');
        if (form) {
            submitForm(form);
        }
    });

    document.addEventListener('submit', function(event) {
        const form = event.target.closest('form.filters');
        if (form) {
            event.preventDefault();
            submitForm(form);
        }
    });

    let debounce = null;
    document.addEventListener('input', function(event) {
        if (event.target.name !== 'filter') {
            return;
        }
        const form = event.target.form;
        clearTimeout(debounce);
        debounce = setTimeout(function() { submitForm(form); }, 250);
    });
}

function submitForm(form) {
    const params = new URLSearchParams(new FormData(form));
    for (const [key, value] of Array.from(params.entries())) {
        if (value === '' && key !== 'selected') {
            params.delete(key);
        }
    }
    refresh(params.toString(), true);
}

async function refresh(query, push) {
    const body = document.querySelector('.dashboard');
    body.classList.add('loading');
    try {
        const response = await fetch('/api/dashboard?' + query);
        const result = await response.json();
        if (!result.success) {
            showError(result.error || 'Request failed');
            return;
        }
        applyFragments(result.data.fragments);
        if (push) {
            history.pushState(null, '', '/?' + result.data.query);
        }
    } catch (e) {
        showError('Failed to reach the server');
        console.error('Dashboard refresh failed:', e);
    } finally {
        body.classList.remove('loading');
    }
}

function applyFragments(fragments) {
    for (const [name, html] of Object.entries(fragments)) {
        const target = document.querySelector('[data-fragment="' + name + '"]');
        if (!target) {
            continue;
        }
        // Keep typing focus in the filter box across re-renders
        const active = document.activeElement;
        const keepFilter = name === 'controls' && active && active.name === 'filter';
        if (keepFilter) {
            continue;
        }
        target.innerHTML = html;
    }
}

function showError(message) {
    const info = document.querySelector('[data-fragment="info"]');
    if (info) {
        info.innerHTML = '<p class="placeholder error-panel"></p>';
        info.firstChild.textContent = message;
    }
}
"#;

/// CSS styles.
pub async fn styles_css() -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/css")], STYLES).into_response()
}

/// Main JavaScript.
pub async fn main_js() -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/javascript")],
        SCRIPT,
    )
        .into_response()
}
