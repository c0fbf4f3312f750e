use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Serialize;

use atlas_core::error::AtlasError;
use atlas_core::format::escape_html;
use atlas_core::view::{
    toggle_sort, Column, DashboardParams, DashboardRequest, DashboardView, GridQuery, Selection,
    SortDirection,
};

use super::DashboardState;

/// Dashboard page handlers.
pub struct DashboardPages;

/// Server-rendered pieces of the page, swapped in place by the page script.
#[derive(Debug, Clone, Serialize)]
pub struct Fragments {
    pub controls: String,
    pub grid: String,
    pub flag: String,
    pub info: String,
    pub chart: String,
}

impl Fragments {
    pub fn render(title: &str, request: &DashboardRequest, view: &DashboardView) -> Self {
        Self {
            controls: render_controls(title, request, view),
            grid: render_grid(request, view),
            flag: render_flag(&view.selection),
            info: render_info(&view.selection),
            chart: view.chart.to_svg(),
        }
    }
}

/// Base HTML template.
fn base_template(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/assets/styles.css">
    <script src="/assets/main.js" defer></script>
</head>
<body>
    <main class="dashboard">
        <header class="content-header">
            <h1>{title}</h1>
            <span class="version">v{version}</span>
        </header>
        {content}
    </main>
</body>
</html>"#,
        title = escape_html(title),
        content = content,
        version = env!("CARGO_PKG_VERSION"),
    )
}

/// Dashboard page.
pub async fn index(
    State(state): State<DashboardState>,
    Query(params): Query<DashboardParams>,
) -> Result<Html<String>, PageError> {
    let (request, view) = state.interact(params).await?;
    let fragments = Fragments::render(&state.config.title, &request, &view);

    let content = format!(
        r#"
        <section class="panel controls" data-fragment="controls">{controls}</section>
        <div class="layout">
            <section class="panel table-panel" data-fragment="grid">{grid}</section>
            <aside class="side">
                <section class="panel flag-panel" data-fragment="flag">{flag}</section>
                <section class="panel info-panel" data-fragment="info">{info}</section>
            </aside>
        </div>
        <section class="panel chart-panel" data-fragment="chart">{chart}</section>
    "#,
        controls = fragments.controls,
        grid = fragments.grid,
        flag = fragments.flag,
        info = fragments.info,
        chart = fragments.chart,
    );

    Ok(Html(base_template(&state.config.title, &content)))
}

fn render_controls(title: &str, request: &DashboardRequest, view: &DashboardView) -> String {
    let mut options = String::from(r#"<option value="">All regions</option>"#);
    for region in &view.regions {
        let selected = if view.region.as_deref() == Some(region.as_str()) {
            " selected"
        } else {
            ""
        };
        options.push_str(&format!(
            r#"<option value="{v}"{selected}>{v}</option>"#,
            v = escape_html(region),
            selected = selected
        ));
    }

    let sort: Vec<String> = request.grid.sort.iter().map(|k| k.to_param()).collect();

    let selected = request
        .selected
        .map(|index| index.to_string())
        .unwrap_or_default();

    format!(
        r#"<form class="filters" method="get" action="/" aria-label="{title} filters">
    <label for="region-dropdown">Region</label>
    <select id="region-dropdown" name="region">{options}</select>
    <input type="search" name="filter" placeholder="Filter rows" value="{filter}">
    <input type="hidden" name="sort" value="{sort}">
    <input type="hidden" name="selected" value="{selected}">
    <noscript><button type="submit" class="btn">Apply</button></noscript>
</form>
<p class="summary">{rows} countries</p>"#,
        title = escape_html(title),
        options = options,
        filter = escape_html(request.grid.filter.as_deref().unwrap_or("")),
        sort = escape_html(&sort.join(",")),
        selected = selected,
        rows = view.filtered_rows,
    )
}

fn render_grid(request: &DashboardRequest, view: &DashboardView) -> String {
    let grid = &view.grid;
    let selected = view.selection.index();

    let mut header = String::new();
    for column in Column::ALL {
        let next = DashboardRequest {
            grid: GridQuery {
                sort: toggle_sort(&request.grid.sort, column),
                page: 0,
                ..request.grid.clone()
            },
            ..request.clone()
        };
        let marker = match request.grid.sort.iter().find(|k| k.column == column) {
            Some(key) if key.direction == SortDirection::Asc => " ▲",
            Some(_) => " ▼",
            None => "",
        };
        header.push_str(&format!(
            r#"<th class="{class}"><a href="/?{query}" data-nav>{name}{marker}</a></th>"#,
            class = if column.is_numeric() { "numeric" } else { "" },
            query = escape_html(&next.to_query()),
            name = escape_html(column.name()),
            marker = marker,
        ));
    }

    let mut body = String::new();
    if grid.rows.is_empty() {
        body.push_str(&format!(
            r#"<tr class="empty-row"><td colspan="{}">No countries</td></tr>"#,
            Column::ALL.len()
        ));
    }
    for (i, row) in grid.rows.iter().enumerate() {
        let mut class = if i % 2 == 1 { "odd" } else { "even" }.to_string();
        if selected == Some(row.index) {
            class.push_str(" selected");
        }
        let link = DashboardRequest {
            selected: Some(row.index),
            ..request.clone()
        };
        body.push_str(&format!(
            r#"<tr class="{class}" data-index="{index}"><td><a href="/?{query}" data-nav>{country}</a></td><td>{capital}</td><td>{region}</td><td>{subregion}</td><td class="numeric">{population}</td><td class="numeric">{area}</td></tr>"#,
            class = class,
            index = row.index,
            query = escape_html(&link.to_query()),
            country = escape_html(&row.country),
            capital = escape_html(&row.capital),
            region = escape_html(row.region.as_deref().unwrap_or("")),
            subregion = escape_html(row.subregion.as_deref().unwrap_or("")),
            population = escape_html(&row.population),
            area = escape_html(&row.area),
        ));
    }

    let page_link = |page: usize, label: &str| {
        let target = DashboardRequest {
            grid: GridQuery {
                page,
                ..request.grid.clone()
            },
            ..request.clone()
        };
        format!(
            r#"<a class="btn btn-secondary" href="/?{}" data-nav>{}</a>"#,
            escape_html(&target.to_query()),
            label
        )
    };
    let prev = if grid.page > 0 {
        page_link(grid.page - 1, "‹ Prev")
    } else {
        r#"<span class="btn btn-disabled">‹ Prev</span>"#.to_string()
    };
    let next = if grid.page + 1 < grid.page_count {
        page_link(grid.page + 1, "Next ›")
    } else {
        r#"<span class="btn btn-disabled">Next ›</span>"#.to_string()
    };

    format!(
        r#"<table class="data-table" id="country-table">
    <thead><tr>{header}</tr></thead>
    <tbody>{body}</tbody>
</table>
<nav class="pager">{prev}<span class="page-info">Page {page} of {pages}</span>{next}</nav>"#,
        header = header,
        body = body,
        prev = prev,
        next = next,
        page = grid.page + 1,
        pages = grid.page_count.max(1),
    )
}

fn render_flag(selection: &Selection) -> String {
    match selection {
        Selection::Country {
            flag_url: Some(url),
            info,
            ..
        } => format!(
            r#"<img id="flag-display" class="flag" src="{url}" alt="Flag of {name}">"#,
            url = escape_html(url),
            name = escape_html(&info.name),
        ),
        Selection::Country { info, .. } => format!(
            r#"<p id="flag-display" class="placeholder">No flag for {}</p>"#,
            escape_html(&info.name)
        ),
        Selection::Placeholder { flag_message, .. } => format!(
            r#"<p id="flag-display" class="placeholder">{}</p>"#,
            escape_html(flag_message)
        ),
    }
}

fn render_info(selection: &Selection) -> String {
    match selection {
        Selection::Country { info, .. } => format!(
            r#"<div id="country-info">
    <h3>{name}</h3>
    <dl>
        <dt>Capital</dt><dd>{capital}</dd>
        <dt>Region</dt><dd>{region}</dd>
        <dt>Population</dt><dd>{population}</dd>
        <dt>Area</dt><dd>{area}</dd>
    </dl>
</div>"#,
            name = escape_html(&info.name),
            capital = escape_html(&info.capital),
            region = escape_html(info.region.as_deref().unwrap_or("Unknown")),
            population = escape_html(&info.population),
            area = escape_html(&info.area),
        ),
        Selection::Placeholder { info_message, .. } => format!(
            r#"<div id="country-info"><p class="placeholder">{}</p></div>"#,
            escape_html(info_message)
        ),
    }
}

/// Error response for page requests.
pub struct PageError(AtlasError);

impl From<AtlasError> for PageError {
    fn from(err: AtlasError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            AtlasError::InvalidArgument(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            other => {
                tracing::error!(error = %other, "Dashboard request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The dashboard could not be rendered".to_string(),
                )
            }
        };

        let content = format!(
            r#"<section class="panel error-panel"><p>{}</p><p><a href="/">Back to dashboard</a></p></section>"#,
            escape_html(&message)
        );
        (status, Html(base_template("Error", &content))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use super::super::create_dashboard_router;
    use super::super::tests::{broken_state, state};
    use super::*;

    async fn get(path: &str, state: DashboardState) -> (StatusCode, String) {
        let response = create_dashboard_router(state)
            .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[test]
    fn test_base_template() {
        let html = base_template("Countries <Dashboard>", "<p>Content</p>");
        assert!(html.contains("<title>Countries &lt;Dashboard&gt;</title>"));
        assert!(html.contains("<p>Content</p>"));
        assert!(html.contains("/assets/main.js"));
    }

    #[tokio::test]
    async fn test_index_defaults_to_first_country() {
        let (status, html) = get("/", state()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains("Countries Dashboard"));
        assert!(html.contains(r#"src="https://flagcdn.com/w320/ca.png""#));
        assert!(html.contains("<dt>Capital</dt><dd>Ottawa</dd>"));
        assert!(html.contains("Total Population by Region"));
        assert!(html.contains(r#"<option value="Europe">Europe</option>"#));
    }

    #[tokio::test]
    async fn test_index_region_filter() {
        let (status, html) = get("/?region=Europe&selected=0", state()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(html.contains(r#"<option value="Europe" selected>"#));
        assert!(html.contains("<h3>France</h3>"));
        assert!(!html.contains(">Canada</a>"));
        // The chart still covers the Americas
        assert!(html.contains("Americas"));
    }

    #[tokio::test]
    async fn test_index_placeholder_when_out_of_range() {
        let (_, html) = get("/?region=Europe&selected=7", state()).await;
        assert!(html.contains("No country selected"));
        assert!(html.contains("Select a country from the table"));

        let (_, html) = get("/?selected=", state()).await;
        assert!(html.contains("No country selected"));
    }

    #[tokio::test]
    async fn test_filter_form_keeps_selection() {
        let (_, html) = get("/?selected=2", state()).await;
        assert!(html.contains(r#"name="selected" value="2""#));
        assert!(!html.contains(r#"name="selected" value="0""#));

        let (_, html) = get("/?selected=", state()).await;
        assert!(html.contains(r#"name="selected" value="""#));
    }

    #[tokio::test]
    async fn test_text_filter_does_not_move_selection() {
        let (_, html) = get("/?filter=bra&selected=2", state()).await;
        assert!(html.contains("<h3>Brazil</h3>"));
        assert!(html.contains(r#"name="selected" value="2""#));
    }

    #[tokio::test]
    async fn test_index_rejects_bad_params() {
        let (status, html) = get("/?page=abc", state()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(html.contains("Invalid page"));
    }

    #[tokio::test]
    async fn test_index_database_failure() {
        let (status, html) = get("/", broken_state()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!html.contains("connection refused"));
    }

    #[tokio::test]
    async fn test_sort_links_toggle() {
        let (_, html) = get("/?sort=population", state()).await;
        assert!(html.contains("Population ▲"));
        assert!(html.contains("sort=population:desc"));
    }
}
