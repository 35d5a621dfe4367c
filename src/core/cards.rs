use crate::models::Recommendation;

/// Render sanitized recommendations as HTML result cards
///
/// Mirrors the survey page: title, "NN% match", a progress bar and the
/// reason. All text is escaped.
pub fn render_cards(recommendations: &[Recommendation]) -> String {
    if recommendations.is_empty() {
        return r#"<p class="muted">No recommendations returned.</p>"#.to_string();
    }

    recommendations
        .iter()
        .map(render_card)
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_card(rec: &Recommendation) -> String {
    let pct = rec.match_score.min(100);

    format!(
        r#"<article class="card">
  <header style="display:flex;justify-content:space-between;align-items:center">
    <strong>{title}</strong>
    <span class="muted">{pct}% match</span>
  </header>
  <div class="progress"><div class="progress-bar" style="width:{pct}%;height:6px;background:#0d6efd;border-radius:3px"></div></div>
  <p style="margin-top:8px">{reason}</p>
</article>"#,
        title = escape_html(rec.archetype.title()),
        pct = pct,
        reason = escape_html(&rec.reason),
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
