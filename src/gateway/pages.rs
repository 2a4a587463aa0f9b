//! HTML renderers.
//!
//! Every full page goes through [`layout`]; the form pages take an
//! optional inline error (the 422 re-render path) plus the submitted
//! values so user input survives a failed validation.

use crate::session::{Flash, FlashKind};

fn base_style() -> &'static str {
    r#"
    * { margin: 0; padding: 0; box-sizing: border-box; }
    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
        background: #f5f5f5; color: #333;
        display: flex; justify-content: center;
        min-height: 100vh; padding: 24px;
    }
    .card {
        background: #fff; border-radius: 16px; padding: 32px;
        max-width: 640px; width: 100%; box-shadow: 0 4px 24px rgba(0,0,0,0.08);
        align-self: flex-start;
    }
    .brand { margin-bottom: 20px; }
    .brand h1 { font-size: 24px; color: #1a1a2e; }
    .brand h1 a { color: inherit; text-decoration: none; }
    .brand p { font-size: 13px; color: #666; margin-top: 2px; }
    .flash { padding: 10px 14px; border-radius: 8px; font-size: 14px; margin-bottom: 16px; }
    .flash.success { background: #eefaf0; color: #1d7a3d; }
    .flash.error { background: #fff0f0; color: #d32f2f; }
    .error { background: #fff0f0; color: #d32f2f; padding: 10px 14px; border-radius: 8px; font-size: 13px; margin-bottom: 16px; }
    ul.documents { list-style: none; margin: 16px 0; }
    ul.documents li {
        display: flex; align-items: center; gap: 10px;
        padding: 8px 0; border-bottom: 1px solid #eee; font-size: 15px;
    }
    ul.documents li a.doc { color: #1a1a2e; text-decoration: none; flex: 1; }
    ul.documents li a.doc:hover { text-decoration: underline; }
    .actions a, .actions button {
        font-size: 13px; color: #4a6cf7; background: none; border: none;
        cursor: pointer; text-decoration: none; padding: 0;
    }
    .actions a:hover, .actions button:hover { text-decoration: underline; }
    .actions form { display: inline; }
    .toolbar { margin: 16px 0; display: flex; gap: 14px; font-size: 14px; }
    .toolbar a { color: #4a6cf7; text-decoration: none; }
    .toolbar a:hover { text-decoration: underline; }
    .form-group { margin-bottom: 16px; }
    .form-group label { display: block; font-size: 14px; font-weight: 500; margin-bottom: 6px; color: #444; }
    .form-group input, .form-group textarea {
        width: 100%; padding: 10px 12px; border: 1.5px solid #ddd;
        border-radius: 10px; font-size: 15px; outline: none;
    }
    .form-group input:focus, .form-group textarea:focus { border-color: #4a6cf7; }
    .form-group textarea { min-height: 280px; font-family: ui-monospace, monospace; }
    .btn {
        padding: 10px 18px; border: none; border-radius: 10px;
        font-size: 15px; font-weight: 600; cursor: pointer;
        background: #4a6cf7; color: #fff;
    }
    .btn:hover { background: #3b5de7; }
    .whoami { margin-top: 24px; padding-top: 14px; border-top: 1px solid #eee; font-size: 13px; color: #666; display: flex; gap: 8px; align-items: center; }
    .whoami a, .whoami button {
        color: #4a6cf7; background: none; border: none; font-size: 13px;
        cursor: pointer; text-decoration: none; padding: 0;
    }
    .whoami a:hover, .whoami button:hover { text-decoration: underline; }
    .content { margin-top: 8px; line-height: 1.6; }
    .content h1, .content h2, .content h3 { margin: 16px 0 8px; color: #1a1a2e; }
    .content p { margin: 8px 0; }
    .content pre { background: #f4f4f8; padding: 12px; border-radius: 8px; overflow-x: auto; }
    .content table { border-collapse: collapse; margin: 12px 0; }
    .content td, .content th { border: 1px solid #ddd; padding: 6px 10px; }
    "#
}

/// Minimal HTML escape for text interpolated into pages.
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

fn href(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

fn flash_html(flash: Option<&Flash>) -> String {
    match flash {
        Some(flash) => {
            let class = match flash.kind {
                FlashKind::Success => "success",
                FlashKind::Error => "error",
            };
            format!(
                r#"<div class="flash {class}">{}</div>"#,
                escape_html(&flash.message)
            )
        }
        None => String::new(),
    }
}

fn whoami_html(username: Option<&str>) -> String {
    match username {
        Some(username) => format!(
            r#"<div class="whoami">Signed in as {user}.
  <form method="POST" action="/users/signout"><button type="submit">Sign Out</button></form>
</div>"#,
            user = escape_html(username)
        ),
        None => r#"<div class="whoami"><a href="/users/signin">Sign In</a></div>"#.to_string(),
    }
}

/// Site shell shared by every full page.
fn layout(title: &str, username: Option<&str>, flash: Option<&Flash>, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en"><head>
<meta charset="utf-8"><meta name="viewport" content="width=device-width,initial-scale=1">
<title>Quillpad - {title}</title>
<style>{style}</style>
</head><body>
<div class="card">
  <div class="brand"><h1><a href="/">Quillpad</a></h1><p>{title}</p></div>
  {flash}
  {content}
  {whoami}
</div>
</body></html>"#,
        style = base_style(),
        flash = flash_html(flash),
        whoami = whoami_html(username),
        title = escape_html(title),
    )
}

pub fn index(names: &[String], flash: Option<&Flash>, username: Option<&str>) -> String {
    let rows: String = names
        .iter()
        .map(|name| {
            format!(
                r#"    <li><a class="doc" href="/{href}">{name}</a>
      <span class="actions">
        <a href="/{href}/edit">edit</a>
        <a href="/{href}/duplicate">duplicate</a>
        <form method="POST" action="/{href}/delete"><button type="submit">delete</button></form>
      </span></li>
"#,
                href = href(name),
                name = escape_html(name),
            )
        })
        .collect();

    let listing = if rows.is_empty() {
        "  <p>No documents yet.</p>\n".to_string()
    } else {
        format!("  <ul class=\"documents\">\n{rows}  </ul>\n")
    };

    let content = format!(
        r#"{listing}  <div class="toolbar">
    <a href="/new">New Document</a>
    <a href="/upload/image">Upload Image</a>
  </div>"#
    );

    layout("Documents", username, flash, &content)
}

/// Rendered markdown document inside the site shell.
pub fn document(name: &str, fragment: &str, username: Option<&str>) -> String {
    let content = format!(r#"<div class="content">{fragment}</div>"#);
    layout(name, username, None, &content)
}

fn inline_error(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<div class="error">{}</div>"#, escape_html(e)))
        .unwrap_or_default()
}

pub fn signin(
    error: Option<&str>,
    uname: &str,
    flash: Option<&Flash>,
    username: Option<&str>,
) -> String {
    let content = format!(
        r#"{error}  <form method="POST" action="/users/signin">
    <div class="form-group">
      <label>Username</label>
      <input type="text" name="uname" value="{uname}" required autocomplete="username">
    </div>
    <div class="form-group">
      <label>Password</label>
      <input type="password" name="psswd" required autocomplete="current-password">
    </div>
    <button type="submit" class="btn">Sign In</button>
  </form>
  <div class="toolbar"><a href="/users/signup">No account? Sign Up</a></div>"#,
        error = inline_error(error),
        uname = escape_html(uname),
    );
    layout("Sign In", username, flash, &content)
}

pub fn signup(
    error: Option<&str>,
    uname: &str,
    flash: Option<&Flash>,
    username: Option<&str>,
) -> String {
    let content = format!(
        r#"{error}  <form method="POST" action="/users/signup">
    <div class="form-group">
      <label>Username</label>
      <input type="text" name="uname" value="{uname}" required autocomplete="username" placeholder="4-16 letters and numbers">
    </div>
    <div class="form-group">
      <label>Password</label>
      <input type="password" name="psswd" required autocomplete="new-password" placeholder="8-16 characters">
    </div>
    <button type="submit" class="btn">Create Account</button>
  </form>
  <div class="toolbar"><a href="/users/signin">Already registered? Sign In</a></div>"#,
        error = inline_error(error),
        uname = escape_html(uname),
    );
    layout("Sign Up", username, flash, &content)
}

pub fn new_document(
    error: Option<&str>,
    name: &str,
    flash: Option<&Flash>,
    username: Option<&str>,
) -> String {
    let content = format!(
        r#"{error}  <form method="POST" action="/create">
    <div class="form-group">
      <label>Document name</label>
      <input type="text" name="name" value="{name}" placeholder="notes.md">
    </div>
    <button type="submit" class="btn">Create</button>
  </form>"#,
        error = inline_error(error),
        name = escape_html(name),
    );
    layout("New Document", username, flash, &content)
}

pub fn edit_document(
    name: &str,
    content_text: &str,
    flash: Option<&Flash>,
    username: Option<&str>,
) -> String {
    let content = format!(
        r#"  <form method="POST" action="/{href}">
    <div class="form-group">
      <label>Content of {name}</label>
      <textarea name="content">{body}</textarea>
    </div>
    <button type="submit" class="btn">Save Changes</button>
  </form>"#,
        href = href(name),
        name = escape_html(name),
        body = escape_html(content_text),
    );
    layout(&format!("Edit {name}"), username, flash, &content)
}

pub fn duplicate(
    source: &str,
    dest: &str,
    error: Option<&str>,
    flash: Option<&Flash>,
    username: Option<&str>,
) -> String {
    let content = format!(
        r#"{error}  <form method="POST" action="/{href}/duplicate">
    <div class="form-group">
      <label>Duplicate {source} as</label>
      <input type="text" name="name" value="{dest}">
    </div>
    <button type="submit" class="btn">Duplicate</button>
  </form>"#,
        error = inline_error(error),
        href = href(source),
        source = escape_html(source),
        dest = escape_html(dest),
    );
    layout(&format!("Duplicate {source}"), username, flash, &content)
}

pub fn upload(error: Option<&str>, flash: Option<&Flash>, username: Option<&str>) -> String {
    let content = format!(
        r#"{error}  <form method="POST" action="/upload/image" enctype="multipart/form-data">
    <div class="form-group">
      <label>Image (JPEG or PNG)</label>
      <input type="file" name="image" accept="image/jpeg,image/png">
    </div>
    <button type="submit" class="btn">Upload</button>
  </form>"#,
        error = inline_error(error),
    );
    layout("Upload Image", username, flash, &content)
}
