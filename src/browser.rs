//! Headless-browser automation: one Chromium session per fetch.
//!
//! A fresh browser process is launched for every request and torn down when
//! the capture finishes. That per-call footprint is what the resource gate
//! in [`crate::gate`] is guarding.

use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::BrowserSettings;
use crate::detect;
use crate::error::{AppError, Result};

/// How long a detected challenge is given to clear before the fetch fails.
const CHALLENGE_WAIT: Duration = Duration::from_secs(20);

/// Interval between re-captures of the page while a challenge is pending.
const CHALLENGE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Rendered page HTML plus the challenge verdict.
#[derive(Debug)]
pub struct PageCapture {
    pub html: String,
    pub captcha_detected: bool,
}

/// Navigate to `url` in a headless browser and capture the rendered page.
pub async fn fetch_page(
    settings: &BrowserSettings,
    url: &str,
    proxy: Option<&str>,
) -> Result<PageCapture> {
    let config = browser_config(settings, proxy)?;
    let (mut browser, mut handler) = Browser::launch(config).await?;

    // The handler stream must be polled for the CDP connection to make
    // progress; it ends when the browser goes away.
    let driver = tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if event.is_err() {
                break;
            }
        }
    });

    let outcome = capture(&browser, url).await;

    if let Err(err) = browser.close().await {
        warn!("Failed to close browser cleanly: {}", err);
    }
    let _ = browser.wait().await;
    driver.abort();

    outcome
}

fn browser_config(settings: &BrowserSettings, proxy: Option<&str>) -> Result<BrowserConfig> {
    let mut builder = BrowserConfig::builder()
        .user_data_dir(&settings.user_data_dir)
        .arg("--lang=en-US");

    if let Some(proxy) = proxy {
        builder = builder.arg(format!("--proxy-server={}", proxy));
    }

    builder.build().map_err(AppError::Automation)
}

async fn capture(browser: &Browser, url: &str) -> Result<PageCapture> {
    let page = browser.new_page(url).await?;
    page.wait_for_navigation().await?;
    let html = page.content().await?;

    // The content frame only renders once past any interstitial, so its
    // presence settles the question regardless of what else is on the page.
    if detect::content_frame_present(&html) {
        info!("No captcha on rendered page");
        return Ok(PageCapture {
            html,
            captcha_detected: false,
        });
    }

    if !detect::turnstile_present(&html) {
        info!("No captcha on rendered page");
        return Ok(PageCapture {
            html,
            captcha_detected: false,
        });
    }

    info!("Captcha detected, waiting for challenge to clear");
    let html = wait_for_content_frame(&page).await?;
    info!("Captcha cleared");

    Ok(PageCapture {
        html,
        captcha_detected: true,
    })
}

/// Re-capture the page until the content frame shows up, bounded by
/// [`CHALLENGE_WAIT`].
async fn wait_for_content_frame(page: &Page) -> Result<String> {
    let deadline = Instant::now() + CHALLENGE_WAIT;
    loop {
        let html = page.content().await?;
        if detect::content_frame_present(&html) {
            return Ok(html);
        }
        if Instant::now() >= deadline {
            return Err(AppError::Automation(format!(
                "Challenge did not clear within {} seconds",
                CHALLENGE_WAIT.as_secs()
            )));
        }
        debug!("Challenge still pending");
        tokio::time::sleep(CHALLENGE_POLL_INTERVAL).await;
    }
}
