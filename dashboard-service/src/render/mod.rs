//! Server-side HTML for the dashboard: metric tiles, inline SVG bar charts,
//! a key/value table and the recent-fault grid.

use std::fmt::Write;

use time::{macros::format_description, OffsetDateTime};

use crate::report::{FaultRow, Report};

pub const PAGE_TITLE: &str = "Agent IA Énergie Cameroun";
const SUBTITLE: &str = "Tableau de bord de supervision énergétique";
const FOOTER: &str = "© 2025 Agent IA Énergie Cameroun – conçu par MENYE BIBI Georges";
pub const NO_DATA_MESSAGE: &str = "Aucune donnée disponible pour le moment. Attendez quelques cycles d'ingestion.";
pub const FAILURE_MESSAGE: &str = "Impossible de charger les données. Réessayez dans quelques instants.";
const MISSING: &str = "Aucune donnée";

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0 auto; max-width: 1100px; padding: 1.5rem; color: #1f2933; }
header h1 { margin-bottom: 0.2rem; }
hr { border: none; border-top: 1px solid #d9e2ec; margin: 1.5rem 0; }
.tiles { display: grid; grid-template-columns: repeat(4, 1fr); gap: 1rem; }
.tile { background: #f5f7fa; border-radius: 8px; padding: 1rem; }
.tile .label { font-size: 0.9rem; color: #52606d; }
.tile .value { font-size: 2rem; font-weight: 600; }
.warning { background: #fff8e1; border-left: 4px solid #f0b429; padding: 1rem; }
.error { background: #ffe3e3; border-left: 4px solid #e12d39; padding: 1rem; }
.note { color: #52606d; font-size: 0.9rem; }
table { border-collapse: collapse; width: 100%; }
th, td { border-bottom: 1px solid #d9e2ec; padding: 0.4rem 0.6rem; text-align: left; }
th { background: #f5f7fa; }
svg text { font-size: 11px; fill: #334e68; }
"#;

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn format_value(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.2}"),
        None => MISSING.to_string(),
    }
}

fn format_date(ts: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    ts.format(fmt).unwrap_or_else(|_| ts.to_string())
}

fn page(body: &str) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n\
         <header><h1>⚡ {title}</h1><h4>{SUBTITLE}</h4></header>\n<hr>\n{body}\n<hr>\n\
         <footer class=\"note\">{footer}</footer>\n</body>\n</html>\n",
        title = escape_html(PAGE_TITLE),
        footer = escape_html(FOOTER),
    );
    html
}

/// One bar chart; bars are drawn in the given order.
pub struct BarChart<'a> {
    pub title: &'a str,
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub bars: Vec<(String, usize)>,
}

const CHART_WIDTH: usize = 1000;
const CHART_HEIGHT: usize = 360;
const MARGIN_LEFT: usize = 60;
const MARGIN_BOTTOM: usize = 90;
const MARGIN_TOP: usize = 20;

impl BarChart<'_> {
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        let _ = write!(
            svg,
            "<figure><figcaption><strong>{}</strong></figcaption>\
             <svg viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\" width=\"100%\" role=\"img\" aria-label=\"{}\">",
            escape_html(self.title),
            escape_html(self.title),
        );

        let plot_w = CHART_WIDTH - MARGIN_LEFT - 20;
        let plot_h = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
        let base_y = MARGIN_TOP + plot_h;
        let max = self.bars.iter().map(|(_, v)| *v).max().unwrap_or(0).max(1);

        let _ = write!(
            svg,
            "<line x1=\"{MARGIN_LEFT}\" y1=\"{base_y}\" x2=\"{}\" y2=\"{base_y}\" stroke=\"#9fb3c8\"/>\
             <text x=\"14\" y=\"{}\" transform=\"rotate(-90 14 {})\" text-anchor=\"middle\">{}</text>\
             <text x=\"{}\" y=\"{}\" text-anchor=\"middle\">{}</text>",
            MARGIN_LEFT + plot_w,
            MARGIN_TOP + plot_h / 2,
            MARGIN_TOP + plot_h / 2,
            escape_html(self.y_label),
            MARGIN_LEFT + plot_w / 2,
            CHART_HEIGHT - 6,
            escape_html(self.x_label),
        );

        if !self.bars.is_empty() {
            let slot = plot_w as f64 / self.bars.len() as f64;
            let bar_w = (slot * 0.7).max(1.0);

            for (i, (label, value)) in self.bars.iter().enumerate() {
                let h = (*value as f64 / max as f64) * plot_h as f64;
                let x = MARGIN_LEFT as f64 + i as f64 * slot + (slot - bar_w) / 2.0;
                let y = base_y as f64 - h;
                let cx = x + bar_w / 2.0;
                let shade = 0.35 + 0.65 * (*value as f64 / max as f64);

                let _ = write!(
                    svg,
                    "<rect x=\"{x:.1}\" y=\"{y:.1}\" width=\"{bar_w:.1}\" height=\"{h:.1}\" \
                     fill=\"#2680c2\" fill-opacity=\"{shade:.2}\"><title>{label}: {value}</title></rect>\
                     <text x=\"{cx:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{value}</text>\
                     <text x=\"{cx:.1}\" y=\"{}\" text-anchor=\"end\" transform=\"rotate(-35 {cx:.1} {})\">{label}</text>",
                    y - 4.0,
                    base_y + 14,
                    base_y + 14,
                    label = escape_html(label),
                );
            }
        }

        svg.push_str("</svg></figure>");
        svg
    }
}

fn fault_grid(rows: &[FaultRow]) -> String {
    let mut html = String::from(
        "<table class=\"grid\"><thead><tr><th>poste</th><th>tension</th><th>courant</th>\
         <th>temperature</th><th>type_panne</th><th>date</th></tr></thead><tbody>",
    );
    for r in rows {
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&r.poste),
            format_value(r.tension),
            format_value(r.courant),
            format_value(r.temperature),
            escape_html(r.type_panne.as_deref().unwrap_or("")),
            format_date(r.date),
        );
    }
    html.push_str("</tbody></table>");
    html
}

pub fn render_dashboard(report: &Report) -> String {
    let h = &report.headline;
    let mut body = String::new();

    let _ = write!(
        body,
        "<section class=\"tiles\">\
         <div class=\"tile\"><div class=\"label\">🔋 Total des relevés</div><div class=\"value\">{}</div></div>\
         <div class=\"tile\"><div class=\"label\">⚠️ Pannes détectées</div><div class=\"value\">{}</div></div>\
         <div class=\"tile\"><div class=\"label\">✅ États normaux</div><div class=\"value\">{}</div></div>\
         <div class=\"tile\"><div class=\"label\">📍 Postes surveillés</div><div class=\"value\">{}</div></div>\
         </section>",
        h.total, h.panne, h.normal, h.postes,
    );
    if h.other > 0 {
        let _ = write!(
            body,
            "<p class=\"note\">{} relevé(s) avec un statut non reconnu ne sont comptés ni en panne ni en état normal.</p>",
            h.other,
        );
    }
    if report.rejected > 0 {
        let _ = write!(
            body,
            "<p class=\"note\">{} relevé(s) illisible(s) ignoré(s) (date ou poste manquant).</p>",
            report.rejected,
        );
    }
    body.push_str("<hr>");

    let weekly = BarChart {
        title: "📅 Évolution des pannes par semaine",
        x_label: "Semaine",
        y_label: "Nombre de pannes",
        bars: report
            .weekly_faults
            .iter()
            .map(|w| (w.label.clone(), w.count))
            .collect(),
    };
    body.push_str(&weekly.to_svg());

    let top = BarChart {
        title: "🏭 Top 5 des postes les plus touchés",
        x_label: "poste",
        y_label: "total",
        bars: report
            .top_postes
            .iter()
            .map(|p| (p.poste.clone(), p.count))
            .collect(),
    };
    body.push_str(&top.to_svg());

    body.push_str("<h3>📊 Moyennes des 7 derniers jours</h3>");
    body.push_str("<table class=\"kv\"><thead><tr><th>Paramètre</th><th>Valeur</th></tr></thead><tbody>");
    for (label, value) in report.averages.rows() {
        let _ = write!(
            body,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_html(label),
            format_value(value),
        );
    }
    body.push_str("</tbody></table>");

    body.push_str("<h3>📋 Détails des pannes récentes</h3>");
    body.push_str(&fault_grid(&report.recent_faults));

    let _ = write!(
        body,
        "<p class=\"note\">Généré le {} UTC</p>",
        format_date(report.generated_at),
    );

    page(&body)
}

pub fn render_no_data() -> String {
    page(&format!("<div class=\"warning\">⏳ {}</div>", escape_html(NO_DATA_MESSAGE)))
}

pub fn render_failure() -> String {
    page(&format!("<div class=\"error\">{}</div>", escape_html(FAILURE_MESSAGE)))
}
