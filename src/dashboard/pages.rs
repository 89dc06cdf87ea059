// 🖥️ Pages - path → page mapping and static HTML rendering

use super::charts::Chart;
use crate::error::Result;
use crate::snapshot::SnapshotMeta;

const LAYOUT: &str = include_str!("../../web/layout.html");

// ============================================================================
// PAGE ROUTING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Participant,
    SocialActivity,
    Business,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::Home,
        Page::Participant,
        Page::SocialActivity,
        Page::Business,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Page::Home => "/",
            Page::Participant => "/participantDashboard",
            Page::SocialActivity => "/socialActivityDashboard",
            Page::Business => "/businessDashboard",
        }
    }

    /// Link text
    pub fn name(&self) -> &'static str {
        match self {
            Page::Home => "Home Page",
            Page::Participant => "Participant Dashboard",
            Page::SocialActivity => "Social Activity Dashboard",
            Page::Business => "Business Dashboard",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            Page::Home => "Welcome to the Data Insights Dashboard 🚀",
            Page::Participant => "Participant Dashboard 📊",
            Page::SocialActivity => "Social Activity Dashboard 🌐",
            Page::Business => "Business Dashboard 🏙️",
        }
    }

    /// Unknown paths fall back to the home page; a trailing slash is ignored
    pub fn from_path(path: &str) -> Page {
        match path.trim_end_matches('/') {
            "/participantDashboard" => Page::Participant,
            "/socialActivityDashboard" => Page::SocialActivity,
            "/businessDashboard" => Page::Business,
            _ => Page::Home,
        }
    }
}

// ============================================================================
// HTML
// ============================================================================

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// JSON inside a <script> element must not close the element early
fn script_json(chart: &Chart) -> Result<String> {
    Ok(serde_json::to_string(chart)?.replace("</", "<\\/"))
}

pub fn chart_block(chart: &Chart) -> Result<String> {
    let class = match chart {
        Chart::Plotly { .. } => "chart",
        Chart::Network { .. } => "network",
    };
    let id = escape_html(chart.id());
    Ok(format!(
        "<div class=\"{class}\" id=\"{id}\" data-chart=\"{id}\"></div>\n\
         <script type=\"application/json\" id=\"{id}-spec\">{json}</script>\n",
        class = class,
        id = id,
        json = script_json(chart)?,
    ))
}

fn nav(current: Page) -> String {
    let links: Vec<String> = Page::ALL
        .iter()
        .filter(|p| **p != current)
        .map(|p| format!("<a href=\"{}\">{}</a>", p.path(), p.name()))
        .collect();
    format!("<nav>\n{}\n</nav>\n", links.join("\n<br>\n"))
}

fn document(page: Page, body: &str) -> String {
    LAYOUT
        .replace("{{title}}", &escape_html(page.name()))
        .replace("{{body}}", body)
}

/// A chart followed by its explanatory paragraph
#[derive(Debug, Clone)]
pub struct Section {
    pub chart: Chart,
    pub caption: String,
}

pub fn render_dashboard(page: Page, sections: &[Section]) -> Result<String> {
    let mut body = format!("<h1>{}</h1>\n", escape_html(page.heading()));
    for section in sections {
        body.push_str(&chart_block(&section.chart)?);
        body.push_str(&format!(
            "<p class=\"caption\">{}</p>\n",
            escape_html(&section.caption)
        ));
    }
    body.push_str(&nav(page));
    Ok(document(page, &body))
}

pub fn render_home(manifest: &[SnapshotMeta]) -> String {
    let mut body = format!("<h1>{}</h1>\n", escape_html(Page::Home.heading()));
    body.push_str(
        "<p>This dashboard summarises a simulated city: who lives there, how much they earn, \
         who they talk to and where its businesses are.</p>\n\
         <p>Here is what each page covers:</p>\n\
         <ul>\n\
         <li>📊 <b>Participant Dashboard</b>: age groups, kids, income and education.</li>\n\
         <li>🌐 <b>Social Activity Dashboard</b>: who connects with whom, and how often over time.</li>\n\
         <li>🏙️ <b>Business Dashboard</b>: education required by jobs and where buildings sit in the city.</li>\n\
         </ul>\n",
    );

    if let Some(first) = manifest.first() {
        body.push_str(&format!(
            "<p>Data loaded from ETL run <code>{}</code>.</p>\n",
            first.run_id
        ));
    }
    body.push_str("<table class=\"summary\">\n<tr><th>Table</th><th>Rows</th></tr>\n");
    for meta in manifest {
        body.push_str(&format!(
            "<tr><td>{}</td><td>{}</td></tr>\n",
            escape_html(&meta.name),
            meta.row_count
        ));
    }
    body.push_str("</table>\n");

    body.push_str(&nav(Page::Home));
    document(Page::Home, &body)
}
