use std::fmt::Write as _;

use crate::domain::{Inspection, InspectionStatus};

const PAGE_STYLE: &str = "body{margin:0;background:#fff;font-family:Helvetica,Arial,sans-serif;color:#0f172a}\
.report{width:760px;padding:32px;box-sizing:border-box}\
.header{display:flex;justify-content:space-between;border-bottom:2px solid #0f172a;padding-bottom:16px}\
.brand{font-size:24px;font-weight:900;margin:0}\
.subtitle{font-size:11px;font-weight:700;color:#64748b;text-transform:uppercase;margin:4px 0 0}\
.meta{font-size:11px;color:#64748b;text-align:right}\
.facts{display:flex;gap:16px;margin:24px 0}\
.fact{flex:1;background:#f8fafc;padding:16px;border-radius:8px}\
.fact span{display:block;font-size:10px;font-weight:700;color:#94a3b8;text-transform:uppercase}\
.area{border:1px solid #e2e8f0;border-radius:12px;padding:16px;margin-bottom:16px;page-break-inside:avoid}\
.area h4{margin:0;display:inline-block}\
.badge{float:right;padding:4px 12px;border-radius:999px;font-size:10px;font-weight:700;text-transform:uppercase}\
.ok{background:#d1fae5;color:#047857}.fail{background:#fee2e2;color:#b91c1c}\
.notes{font-size:13px;color:#475569;background:#f8fafc;padding:12px;border-left:4px solid #cbd5e1;margin-top:12px}\
.photos img{width:32%;margin:1% 1% 0 0;border-radius:8px;border:1px solid #e2e8f0}\
footer{margin-top:40px;padding-top:16px;border-top:1px solid #e2e8f0;text-align:center;font-size:10px;color:#94a3b8}";

/// Full printable report document for one inspection.
pub fn render_report_html(inspection: &Inspection) -> String {
    let mut html = String::new();
    html.push_str("<!DOCTYPE html><html lang=\"pt-BR\"><head><meta charset=\"utf-8\">");
    writeln!(
        html,
        "<title>Relatório {}</title><style>{PAGE_STYLE}</style></head><body><div class=\"report\">",
        escape_html(&inspection.condominium_name)
    )
    .expect("write head");

    writeln!(
        html,
        "<div class=\"header\"><div><h2 class=\"brand\">MS SUPERVISION</h2>\
<p class=\"subtitle\">Relatório Técnico de Vistoria</p></div>\
<div class=\"meta\"><p>ID: #{}</p><p>DATA: {}</p></div></div>",
        escape_html(&inspection.id.as_str().to_uppercase()),
        inspection.date_label()
    )
    .expect("write header");

    writeln!(
        html,
        "<div class=\"facts\"><div class=\"fact\"><span>Condomínio</span><strong>{}</strong></div>\
<div class=\"fact\"><span>Responsável</span><strong>{}</strong></div></div>",
        escape_html(&inspection.condominium_name),
        escape_html(&inspection.inspector)
    )
    .expect("write facts");

    html.push_str("<h3>Itens Vistoriados</h3>");
    for area in &inspection.areas {
        let badge = match area.status {
            InspectionStatus::Conforme => "ok",
            InspectionStatus::NaoConforme => "fail",
        };
        writeln!(
            html,
            "<div class=\"area\"><h4>{}</h4><span class=\"badge {badge}\">{}</span>",
            escape_html(&area.area_name),
            area.status.label()
        )
        .expect("write area heading");

        if !area.notes.trim().is_empty() {
            writeln!(html, "<div class=\"notes\">{}</div>", escape_html(&area.notes))
                .expect("write notes");
        }

        if !area.photos.is_empty() {
            html.push_str("<div class=\"photos\">");
            for photo in area.photos.iter().filter(|photo| is_image_data_url(photo)) {
                writeln!(html, "<img src=\"{}\" alt=\"Evidência\">", escape_html(photo))
                    .expect("write photo");
            }
            html.push_str("</div>");
        }
        html.push_str("</div>");
    }

    html.push_str(
        "<footer>Este relatório foi gerado via MS SUPERVISION. Registros digitais invioláveis.</footer>",
    );
    html.push_str("</div></body></html>");
    html
}

fn is_image_data_url(raw: &str) -> bool {
    raw.starts_with("data:image/")
}

pub(crate) fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Area, AreaInspection, RecordId};
    use chrono::{TimeZone, Utc};

    fn inspection() -> Inspection {
        let mut lobby = AreaInspection::from_area(&Area::new("Hall de entrada"));
        lobby.status = InspectionStatus::NaoConforme;
        lobby.notes = "Porta <quebrada> & sem trava".to_string();
        lobby.photos = vec![
            "data:image/png;base64,AAAA".to_string(),
            "javascript:alert(1)".to_string(),
        ];
        Inspection {
            id: RecordId::from("abc123"),
            condominium_id: RecordId::from("c1"),
            condominium_name: "Edifício \"X\"".to_string(),
            date: Utc.with_ymd_and_hms(2025, 1, 9, 12, 0, 0).unwrap(),
            inspector: "Mikael".to_string(),
            areas: vec![lobby, AreaInspection::from_area(&Area::new("Garagem"))],
        }
    }

    #[test]
    fn report_contains_header_and_each_area() {
        let html = render_report_html(&inspection());
        assert!(html.contains("MS SUPERVISION"));
        assert!(html.contains("ID: #ABC123"));
        assert!(html.contains("DATA: 09/01/2025"));
        assert!(html.contains("Hall de entrada"));
        assert!(html.contains("Garagem"));
        assert!(html.contains("Não Conforme"));
        assert!(html.contains("badge fail"));
        assert!(html.contains("badge ok"));
    }

    #[test]
    fn user_text_is_escaped_and_only_image_urls_are_embedded() {
        let html = render_report_html(&inspection());
        assert!(html.contains("Porta &lt;quebrada&gt; &amp; sem trava"));
        assert!(html.contains("Edifício &quot;X&quot;"));
        assert_eq!(html.matches("<img ").count(), 1);
        assert!(!html.contains("javascript:"));
    }
}
