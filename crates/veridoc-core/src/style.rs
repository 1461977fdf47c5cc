//! Static stylesheet asset
//!
//! Written to the output directory on every run; pages reference it through
//! a `<link rel="stylesheet">` in their head.

pub const STYLESHEET: &str = r#":root {
  --bg-color: #ffffff;
  --text-color: #1a1a2e;
  --accent-color: #2b4bd7;
  --band-bg: #fceb6c;
  --band-bg-light: #fefdcc;
  --code-bg: #f3f5f6;
  --border-color: #333;
}

* {
  box-sizing: border-box;
}

body {
  font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, Oxygen, Ubuntu, sans-serif;
  background-color: var(--bg-color);
  color: var(--text-color);
  line-height: 1.5;
  margin: 0 auto;
  max-width: 960px;
  padding: 0 1rem 2rem;
}

h1 {
  color: var(--accent-color);
  text-align: center;
  background-color: var(--band-bg);
  padding: 0.25rem 0.5rem;
}

h2 {
  color: var(--accent-color);
  text-align: left;
  background-color: var(--band-bg);
  padding: 0.15rem 0.5rem;
}

h3 {
  color: var(--accent-color);
  text-align: left;
  background-color: var(--band-bg-light);
  padding: 0.1rem 0.5rem;
}

p {
  font-size: 16px;
}

a {
  color: var(--accent-color);
  text-decoration: none;
}

a:hover {
  text-decoration: underline;
}

code {
  background: var(--code-bg);
  padding: 0.1rem 0.25rem;
  border-radius: 3px;
  font-family: 'Fira Code', 'Consolas', monospace;
  font-size: 0.9em;
}

table {
  border-collapse: collapse;
}

td {
  padding: 0.1rem 0.4rem;
  vertical-align: top;
}

.smaller {
  font-size: 0.75em;
  font-weight: normal;
}

.indent {
  margin-left: 25px;
}

.rule {
  width: 100%;
  height: 10px;
  border-bottom: 1px solid var(--border-color);
  text-align: center;
}

.rule span {
  font-size: 1.15rem;
  background-color: var(--code-bg);
  padding: 0 10px;
}

ul {
  list-style: none;
  padding-left: 1.25rem;
}
"#;
