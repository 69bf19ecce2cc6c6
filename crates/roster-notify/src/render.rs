//! Turning digests and greetings into HTML.
//!
//! Images are referenced as `cid:<content id>` so they resolve against the
//! message's inline attachments.

use roster_core::occasion::OccasionKind;

use crate::{digest::Digest, greetings::Greeting};

/// Renders notification bodies. Implementations own all markup and wording.
pub trait DigestRenderer: Send + Sync {
  fn render_digest(&self, digest: &Digest) -> String;

  fn render_greeting(&self, greeting: &Greeting) -> String;
}

/// Minimal semantic HTML with no styling.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  for c in text.chars() {
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

fn image(cid: &str, alt: &str) -> String {
  format!("<img src=\"cid:{}\" alt=\"{}\">\n", escape(cid), escape(alt))
}

impl DigestRenderer for PlainRenderer {
  fn render_digest(&self, digest: &Digest) -> String {
    let mut html = String::from("<html><body>\n");
    if let Some(cid) = &digest.banner_cid {
      html.push_str(&image(cid, "Celebration"));
    }

    let date = digest.date.long_form();
    for section in digest.sections.iter().filter(|s| !s.cards.is_empty()) {
      html.push_str(&format!("<h2>{} on {date}</h2>\n", escape(section.title)));
      for card in &section.cards {
        let headline = card.occasion.headline();
        html.push_str("<div>\n");
        for cid in [&card.image_cid, &card.partner_image_cid].into_iter().flatten() {
          html.push_str(&image(cid, &headline));
        }
        html.push_str(&format!("<h3>{}</h3>\n<ul>\n", escape(&headline)));
        for field in card.occasion.display_fields() {
          html.push_str(&format!("<li>{}: {}</li>\n", field.label, escape(&field.value)));
        }
        html.push_str("</ul>\n</div>\n");
      }
    }

    html.push_str("</body></html>\n");
    html
  }

  fn render_greeting(&self, greeting: &Greeting) -> String {
    let occasion = &greeting.occasion;
    let wish = match occasion.kind {
      OccasionKind::Birthday => "Happy Birthday!",
      OccasionKind::Anniversary => "Happy Wedding Anniversary!",
    };

    let mut html = format!(
      "<html><body>\n<p>Dear {},</p>\n<p>{wish}</p>\n",
      escape(&occasion.headline())
    );
    if let Some(cid) = &greeting.poster_cid {
      html.push_str(&image(cid, "Poster"));
    }
    html.push_str("</body></html>\n");
    html
  }
}
