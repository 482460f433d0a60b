//! HTML rendering for the facade.
//!
//! Plain string templates, assembled with `format!`. The facade is an
//! operator tool; the pages stay deliberately small.

use sqlgate_core::config::Target;

use crate::query::QueryGrid;
use crate::storage::QueryRecord;

/// Escape text for HTML element and attribute positions.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Base layout wrapper.
fn layout(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - sqlgate</title>
<style>
body {{ font-family: system-ui, sans-serif; margin: 2rem auto; max-width: 64rem; padding: 0 1rem; color: #1a1a1a; }}
a {{ color: #2456c4; }}
table {{ border-collapse: collapse; margin: 1rem 0; width: 100%; }}
th, td {{ border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: left; font-size: 0.9rem; }}
th {{ background: #f2f2f2; }}
textarea {{ width: 100%; min-height: 7rem; font-family: monospace; }}
.error {{ color: #b00020; }}
.muted {{ color: #666; font-size: 0.85rem; }}
nav {{ margin-bottom: 1.5rem; }}
</style>
</head>
<body>
<nav><a href="/servers">servers</a> &middot; <a href="/logout">logout</a></nav>
{content}
</body>
</html>"#,
        title = escape(title),
        content = content,
    )
}

/// The login form.
pub fn login_page(error: Option<&str>, redirect: &str) -> String {
    let error_html = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>Sign in - sqlgate</title>
<style>body {{ font-family: system-ui, sans-serif; margin: 4rem auto; max-width: 20rem; }}
input {{ display: block; width: 100%; margin: 0.4rem 0 1rem; padding: 0.4rem; }}
.error {{ color: #b00020; }}</style>
</head>
<body>
<h1>sqlgate</h1>
{error_html}
<form method="post" action="/auth">
<input type="hidden" name="redirect" value="{redirect}">
<label>Username<input name="username" autofocus></label>
<label>Password<input name="password" type="password"></label>
<button type="submit">Sign in</button>
</form>
</body>
</html>"#,
        error_html = error_html,
        redirect = escape(redirect),
    )
}

/// The target list.
pub fn servers_page(targets: &[&Target]) -> String {
    let mut items = String::new();
    for target in targets {
        items.push_str(&format!(
            r#"<tr><td><a href="/servers/{id}">{id}</a></td><td>{kind}</td><td>{description}</td><td>{tags}</td></tr>"#,
            id = escape(target.id.as_str()),
            kind = escape(&target.kind),
            description = escape(&target.description),
            tags = escape(&target.tags.join(", ")),
        ));
    }

    let content = format!(
        r#"<h1>Servers</h1>
<table>
<tr><th>id</th><th>type</th><th>description</th><th>tags</th></tr>
{items}
</table>"#
    );
    layout("Servers", &content)
}

/// The query form for one target, with its declared table sheet.
pub fn target_page(target: &Target) -> String {
    let mut sheet = String::new();
    for table in &target.tables {
        sheet.push_str(&format!(
            r#"<tr><td>{table}</td><td>{fields}</td></tr>"#,
            table = escape(&table.table),
            fields = escape(&table.fields.join(", ")),
        ));
    }

    let content = format!(
        r#"<h1>{id}</h1>
<p class="muted">{description}</p>
<form method="post" action="/servers/{id}">
<textarea name="query" placeholder="select ..."></textarea>
<p><button type="submit">Run</button></p>
</form>
<h2>Declared tables</h2>
<table>
<tr><th>table</th><th>columns</th></tr>
{sheet}
</table>"#,
        id = escape(target.id.as_str()),
        description = escape(&target.description),
    );
    layout(target.id.as_str(), &content)
}

/// A stored query result.
pub fn result_page(record: &QueryRecord) -> String {
    let content = format!(
        r#"<h1>Result</h1>
<p class="muted">{target} &middot; {when} &middot; <a href="/servers/{target}/{id}?format=json">json</a></p>
<pre>{query}</pre>
{grid}
<p><a href="/servers/{target}">back to {target}</a></p>"#,
        target = escape(record.target_id.as_str()),
        when = record.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
        id = record.id,
        query = escape(&record.query),
        grid = grid_table(&record.response),
    );
    layout("Result", &content)
}

/// Render a grid as an HTML table.
pub fn grid_table(grid: &QueryGrid) -> String {
    if grid.headers.is_empty() {
        return r#"<p class="muted">statement executed; no rows returned</p>"#.to_owned();
    }

    let mut out = String::from("<table>\n<tr>");
    for header in &grid.headers {
        out.push_str(&format!("<th>{}</th>", escape(header)));
    }
    out.push_str("</tr>\n");

    for row in &grid.rows {
        out.push_str("<tr>");
        for value in row {
            let text = match value {
                serde_json::Value::Null => String::new(),
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out.push_str(&format!("<td>{}</td>", escape(&text)));
        }
        out.push_str("</tr>\n");
    }

    out.push_str("</table>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn escape_covers_html_metacharacters() {
        assert_eq!(
            escape(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn grid_renders_headers_and_nulls() {
        let grid = QueryGrid {
            headers: vec!["id".into(), "name".into()],
            rows: vec![vec![json!(1), serde_json::Value::Null]],
        };
        let html = grid_table(&grid);
        assert!(html.contains("<th>id</th>"));
        assert!(html.contains("<td></td>"));
    }

    #[test]
    fn query_text_is_escaped() {
        let grid = QueryGrid {
            headers: vec!["c".into()],
            rows: vec![vec![json!("<script>alert(1)</script>")]],
        };
        let html = grid_table(&grid);
        assert!(!html.contains("<script>"));
    }
}
