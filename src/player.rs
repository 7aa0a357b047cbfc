//! Renders a generated video as a standalone HTML player page.

use std::path::Path;

use crate::scene::PlayableVideo;

/// Escape text for use inside HTML element content and attribute values.
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

/// Build a self-contained page that plays `video` in a loop.
///
/// The video is embedded through its data URI, so the page needs nothing
/// but a browser.
pub fn render_player_page(video: &PlayableVideo) -> String {
    let title = escape_html(&video.title);
    let description = escape_html(&video.description);
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body {{ margin: 0; background: #111; color: #eee; font-family: sans-serif; }}
  main {{ max-width: 960px; margin: 2rem auto; padding: 0 1rem; }}
  video {{ width: 100%; aspect-ratio: 16 / 9; background: #000; border-radius: 6px; }}
  p.description {{ white-space: pre-wrap; }}
</style>
</head>
<body>
<main>
  <h1>{title}</h1>
  <video id="scene-{id}" src="{src}" controls autoplay loop aria-label="{title}"></video>
  <p class="description">{description}</p>
</main>
</body>
</html>
"#,
        title = title,
        id = escape_html(&video.id),
        src = video.video_url,
        description = description,
    )
}

/// Write the player page for `video` to `path`.
pub fn write_player_page(video: &PlayableVideo, path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, render_player_page(video))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> PlayableVideo {
        PlayableVideo {
            id: "1234".to_string(),
            title: "Ruthvika's <Adventure>".to_string(),
            description: "A tiger & a girl".to_string(),
            video_url: "data:video/mp4;base64,AAE=".to_string(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html(r#"<a href="x">&'"#), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_page_embeds_data_uri() {
        let page = render_player_page(&video());
        assert!(page.contains(r#"src="data:video/mp4;base64,AAE=""#));
        assert!(page.contains("controls autoplay loop"));
    }

    #[test]
    fn test_page_escapes_text() {
        let page = render_player_page(&video());
        assert!(page.contains("Ruthvika&#39;s &lt;Adventure&gt;"));
        assert!(page.contains("A tiger &amp; a girl"));
        assert!(!page.contains("<Adventure>"));
    }

    #[test]
    fn test_description_keeps_line_breaks() {
        let mut video = video();
        video.description = "A tiger runs\nthrough the jungle".to_string();
        let page = render_player_page(&video);
        assert!(page.contains("white-space: pre-wrap"));
        assert!(page.contains("<p class=\"description\">A tiger runs\nthrough the jungle</p>"));
    }

    #[test]
    fn test_write_player_page_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("scene.html");
        write_player_page(&video(), &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }
}
