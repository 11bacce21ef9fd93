//! HTML rendering for the form and report pages.
//!
//! One page template covers both routes: `GET /` renders the bare form,
//! `POST /predict` renders the same form with the report section filled in.

use std::fmt::Write;

use vehicle_health::HealthReport;

/// Everything the report section needs beyond the catalog.
pub struct ReportView {
    pub report: HealthReport,
    pub bike: String,
    pub impact_pct: f32,
}

pub fn render_page(catalog: &[String], view: Option<&ReportView>) -> String {
    let mut html = String::with_capacity(4096);

    html.push_str(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Vehicle Health Check</title>\n</head>\n<body>\n\
         <h1>Vehicle Health Check</h1>\n",
    );

    render_form(&mut html, catalog);
    if let Some(view) = view {
        render_report(&mut html, view);
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn render_form(html: &mut String, catalog: &[String]) {
    html.push_str("<form method=\"post\" action=\"/predict\">\n<select name=\"bike_model\">\n");
    for entry in catalog {
        let escaped = escape(entry);
        let _ = writeln!(html, "<option value=\"{escaped}\">{escaped}</option>");
    }
    html.push_str("</select>\n");

    for (name, label) in [
        ("temp", "Engine temperature (C)"),
        ("voltage", "Battery voltage"),
        ("chain", "Chain slack (mm)"),
        ("vibe", "Vibration level"),
        ("rpm", "Engine RPM"),
        ("work_exp", "Riding experience (years)"),
    ] {
        let _ = writeln!(
            html,
            "<label>{label} <input type=\"text\" name=\"{name}\" required></label>"
        );
    }

    html.push_str("<button type=\"submit\">Run Check</button>\n</form>\n");
}

fn render_report(html: &mut String, view: &ReportView) {
    let report = &view.report;
    let status = report.status;

    let _ = writeln!(html, "<section class=\"report\">");
    let _ = writeln!(html, "<h2>Report for {}</h2>", escape(&view.bike));
    let _ = writeln!(html, "<p>Health score: {}/100</p>", report.score);
    let _ = writeln!(
        html,
        "<p style=\"color:{}\"><strong>{}</strong></p>",
        status.color(),
        status.label()
    );
    let _ = writeln!(html, "<p>{}</p>", report.advice);

    if !report.issues.is_empty() {
        html.push_str("<table>\n<tr><th>Part</th><th>Action</th><th>Cost</th></tr>\n");
        for issue in &report.issues {
            let _ = writeln!(
                html,
                "<tr><td>{}</td><td>{}</td><td>${}</td></tr>",
                issue.part, issue.action, issue.cost
            );
        }
        html.push_str("</table>\n");
        let _ = writeln!(html, "<p>Estimated total: ${}</p>", report.total_cost);
    }

    let _ = writeln!(
        html,
        "<p>Financial impact: {:.1}% of estimated monthly income</p>",
        view.impact_pct
    );
    html.push_str("</section>\n");
}

/// Minimal escaping for text interpolated into the page.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
