//! The HTML page shell around rendered problem fragments.

/// The built-in page template.
///
/// Templates are plain HTML with two placeholders: `{body}` receives the
/// rendered page content and `{path_to_root}` the relative prefix from the
/// page to the site root (empty for top-level pages, `../` for pages in a
/// subdirectory). Substitution is literal, so templates need no escaping
/// beyond avoiding the two placeholder strings.
pub const DEFAULT_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8" />
<meta name="viewport" content="width=device-width, initial-scale=1" />
<title>Practice Problems</title>
<script>
MathJax = {
  tex: {
    inlineMath: [["\\(", "\\)"]],
    displayMath: [["\\[", "\\]"]]
  }
};
</script>
<script defer src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-chtml.js"></script>
<style>
body { max-width: 50rem; margin: 2rem auto; padding: 0 1rem; font-family: sans-serif; line-height: 1.5; }
.problem { border: 1px solid #ccc; border-radius: 4px; padding: 1rem; margin: 1.5rem 0; }
.subproblem { border-left: 3px solid #ccc; padding-left: 1rem; margin: 1rem 0; }
.choice { margin: 0.25rem 0; padding-left: 1.5rem; }
.choice::before { content: "\25CB"; margin-right: 0.5rem; margin-left: -1.5rem; }
.multiple-select .choice::before { content: "\25A1"; }
details { margin: 0.5rem 0; }
details > summary { cursor: pointer; color: #555; }
pre.code { background: #f5f5f5; padding: 0.75rem; overflow-x: auto; }
code.code { background: #f5f5f5; padding: 0 0.25rem; }
img { max-width: 100%; }
</style>
</head>
<body>
<nav><a href="{path_to_root}index.html">Index</a></nav>
{body}
</body>
</html>
"#;

/// Instantiate a page template. `template` falls back to
/// [`DEFAULT_TEMPLATE`] when `None`.
pub fn render_page(body: &str, path_to_root: &str, template: Option<&str>) -> String {
    template
        .unwrap_or(DEFAULT_TEMPLATE)
        .replace("{path_to_root}", path_to_root)
        .replace("{body}", body)
}
