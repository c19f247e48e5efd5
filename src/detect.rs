use once_cell::sync::Lazy;
use scraper::{Html, Selector};

// Create static selectors to avoid recompiling them each time
static CONTENT_FRAME_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("#iframe_title").expect("Failed to parse content frame selector")
});

static TURNSTILE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".cf-turnstile").expect("Failed to parse turnstile selector")
});

/// True when the content frame has rendered, meaning any challenge
/// interstitial has already been passed.
pub fn content_frame_present(html: &str) -> bool {
    let document = Html::parse_document(html);

    document.select(&CONTENT_FRAME_SELECTOR).next().is_some()
}

/// True when the page carries a Cloudflare Turnstile widget.
pub fn turnstile_present(html: &str) -> bool {
    let document = Html::parse_document(html);

    document.select(&TURNSTILE_SELECTOR).next().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHALLENGE_PAGE: &str = r#"<html><body>
        <div class="cf-turnstile" data-sitekey="0x4AAAAAAA"></div>
    </body></html>"#;

    const RENDERED_PAGE: &str = r#"<html><body>
        <iframe id="iframe_title" src="/content"></iframe>
    </body></html>"#;

    const PLAIN_PAGE: &str = "<html><body><p>hello</p></body></html>";

    #[test]
    fn flags_turnstile_widget() {
        assert!(turnstile_present(CHALLENGE_PAGE));
        assert!(!content_frame_present(CHALLENGE_PAGE));
    }

    #[test]
    fn recognizes_rendered_content() {
        assert!(content_frame_present(RENDERED_PAGE));
        assert!(!turnstile_present(RENDERED_PAGE));
    }

    #[test]
    fn plain_page_carries_neither_marker() {
        assert!(!turnstile_present(PLAIN_PAGE));
        assert!(!content_frame_present(PLAIN_PAGE));
    }
}
