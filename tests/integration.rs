//! Integration tests for the live page adapter
//!
//! These tests require Chrome to be installed and available.
//! Run with: cargo test --test integration -- --ignored

use eoka::Browser;
use eoka_invite::{
    Driver, DriverConfig, EntryPoint, EntryPointConfig, LivePage, MountStatus, Outcome,
    PageAdapter, PageSelectors,
};

/// Check if Chrome is available
fn chrome_available() -> bool {
    eoka::stealth::patcher::find_chrome().is_ok()
}

/// A stripped-down invitee picker: credits counter, results panel with a
/// disabled and a hidden row, and a "Show more results" button that appends
/// three rows once.
const PICKER_HTML: &str = r#"data:text/html,
<div><span>3/250 credits available</span></div>
<div>
  <div id="invitee-picker-results-container" style="height:120px;overflow:auto">
    <label><input type="checkbox"> Ada</label>
    <label><input type="checkbox" disabled> Bob</label>
    <label style="display:none"><input type="checkbox"> Cy</label>
    <label><input type="checkbox"> Dee</label>
  </div>
  <button onclick="
    const c = document.getElementById('invitee-picker-results-container');
    for (const n of ['Eve', 'Fay', 'Gus']) {
      const l = document.createElement('label');
      l.innerHTML = '<input type=checkbox> ' + n;
      c.appendChild(l);
    }
    this.remove();
  "><span>Show more results</span></button>
</div>
"#;

async fn open(html: &str) -> (Browser, LivePage) {
    let browser = Browser::launch().await.expect("Failed to launch browser");
    let page = browser
        .new_page("about:blank")
        .await
        .expect("Failed to create page");
    page.goto(html).await.expect("Failed to navigate");
    let live = LivePage::new(page, PageSelectors::default(), EntryPointConfig::default());
    (browser, live)
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_live_adapter_reads_page() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, live) = open(PICKER_HTML).await;

    assert_eq!(live.read_quota().await.unwrap(), Some(3));
    assert!(live.has_results_panel().await.unwrap());

    let items = live.list_selectable_items().await.unwrap();
    assert_eq!(items.len(), 4);
    let eligible: Vec<_> = items.iter().filter(|i| i.is_eligible()).collect();
    assert_eq!(eligible.len(), 2);

    // Handles survive a second listing.
    let again = live.list_selectable_items().await.unwrap();
    assert_eq!(
        items.iter().map(|i| i.id).collect::<Vec<_>>(),
        again.iter().map(|i| i.id).collect::<Vec<_>>()
    );

    assert!(live.has_more_results_control().await.unwrap());

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_live_run_paginates_and_stops_at_quota() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, live) = open(PICKER_HTML).await;
    let driver = Driver::new(live, DriverConfig::immediate());

    let report = driver.start().await;

    assert!(matches!(report.outcome, Outcome::QuotaMet), "{}", report);
    assert_eq!(report.selected, 3);
    assert_eq!(report.pages, 1);

    let checked: u32 = driver
        .adapter()
        .page()
        .evaluate("document.querySelectorAll('input:checked').length")
        .await
        .unwrap();
    assert_eq!(checked, 3);

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_mount_is_idempotent_and_counts_clicks() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, live) = open(PICKER_HTML).await;

    assert_eq!(live.mount_entry_point().await.unwrap(), MountStatus::Installed);
    for _ in 0..4 {
        assert_eq!(
            live.mount_entry_point().await.unwrap(),
            MountStatus::AlreadyMounted
        );
    }
    let buttons: u32 = live
        .page()
        .evaluate("document.querySelectorAll('[id=\"SelectAllBtn\"]').length")
        .await
        .unwrap();
    assert_eq!(buttons, 1);

    live.page().click("#SelectAllBtn").await.unwrap();
    assert_eq!(live.take_activations().await.unwrap(), 1);
    assert_eq!(live.take_activations().await.unwrap(), 0);

    browser.close().await.expect("Failed to close browser");
}

#[tokio::test]
#[ignore = "requires Chrome"]
async fn test_page_without_credits() {
    if !chrome_available() {
        eprintln!("Chrome not found, skipping test");
        return;
    }

    let (browser, live) = open("data:text/html,<p>Nothing here</p>").await;

    assert_eq!(live.read_quota().await.unwrap(), None);
    assert!(!live.has_results_panel().await.unwrap());
    assert_eq!(
        live.mount_entry_point().await.unwrap(),
        MountStatus::AnchorMissing
    );

    let driver = Driver::new(live, DriverConfig::immediate());
    let report = driver.start().await;
    assert!(matches!(report.outcome, Outcome::NoQuota));

    browser.close().await.expect("Failed to close browser");
}
