//! End-to-end scenarios for the admin UI steps
//!
//! Each test plays a feature scenario against a scripted admin page whose
//! search results render after a delay on a shared fake clock.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use catalog_probe::prelude::*;
use catalog_probe::{MockChange, RecordingObserver, RetryError, SEARCH_SETTLE_BEFORE};
use std::sync::Arc;
use std::time::Duration;

type Steps = WebSteps<MockDriver, Arc<FakeClock>, RecordingObserver>;

fn admin_page(clock: &Arc<FakeClock>) -> MockDriver {
    let mut driver = MockDriver::new()
        .with_clock(Arc::clone(clock))
        .with_title("Product Catalog Administration")
        .with_element(Selector::body(), MockElement::text("body", "Product Catalog Administration"))
        .with_element(Selector::flash_message(), MockElement::text("div", ""))
        .with_element(Selector::search_results(), MockElement::text("div", ""));
    for field in ["Id", "Name", "Description", "Price"] {
        driver.add_element(Selector::field(field), MockElement::input(""));
    }
    driver.add_element(Selector::field("Available"), MockElement::select(["True", "False"]));
    driver.add_element(
        Selector::field("Category"),
        MockElement::select(["Unknown", "Cloths", "Food", "Housewares", "Automotive", "Tools"]),
    );
    for button in ["Create", "Retrieve", "Update", "Delete", "Search", "Clear"] {
        driver.add_element(Selector::button(button), MockElement::button(button));
    }
    driver
}

fn steps(driver: MockDriver, clock: &Arc<FakeClock>) -> Steps {
    let config = ProbeConfig::default().with_wait_seconds(10);
    WebSteps::new(driver, config)
        .with_clock(Arc::clone(clock))
        .with_observer(RecordingObserver::new())
}

/// Search renders the table after 2.5s and the results text after 4s
fn with_slow_search(driver: &mut MockDriver, results: &str) {
    let search = Selector::button("Search");
    driver.on_click(
        search.clone(),
        Duration::from_millis(2500),
        Selector::results_table(),
        MockChange::Show(MockElement::text("table", "")),
    );
    driver.on_click(
        search.clone(),
        Duration::from_millis(2500),
        Selector::flash_message(),
        MockChange::Text("Success".into()),
    );
    driver.on_click(
        search,
        Duration::from_secs(4),
        Selector::search_results(),
        MockChange::Text(results.into()),
    );
}

#[test]
fn test_create_a_product() {
    let clock = FakeClock::shared();
    let mut driver = admin_page(&clock);
    driver.on_click(
        Selector::button("Create"),
        Duration::from_millis(300),
        Selector::flash_message(),
        MockChange::Text("Success".into()),
    );
    let mut s = steps(driver, &clock);

    s.visit_home_page().unwrap();
    s.expect_title_contains("Product Catalog Administration").unwrap();
    s.expect_page_lacks("404 Not Found").unwrap();
    s.set_field("Name", "Hammer").unwrap();
    s.set_field("Description", "Claw hammer").unwrap();
    s.select_dropdown("Available", "True").unwrap();
    s.select_dropdown("Category", "Tools").unwrap();
    s.set_field("Price", "34.95").unwrap();
    s.press_button("Create").unwrap();
    s.expect_flash_message("Success").unwrap();

    s.expect_field_empty("Id").unwrap();
    s.expect_dropdown_selection("Category", "Tools").unwrap();
}

#[test]
fn test_retrieve_by_copied_id() {
    let clock = FakeClock::shared();
    let mut s = steps(admin_page(&clock), &clock);

    s.set_field("Id", "17").unwrap();
    s.copy_field("Id").unwrap();
    s.press_button("Clear").unwrap();
    s.set_field("Id", "").unwrap();
    s.expect_field_empty("Id").unwrap();
    s.paste_field("Id").unwrap();
    s.press_button("Retrieve").unwrap();
    s.expect_field_value("Id", "17").unwrap();
}

#[test]
fn test_search_results_rendered_late() {
    let clock = FakeClock::shared();
    let mut driver = admin_page(&clock);
    with_slow_search(&mut driver, "Hammer Tools 34.95");
    driver.add_element(
        Selector::results_rows(),
        MockElement::list(["ID Name Category", "1 Hammer Tools"]),
    );
    let mut s = steps(driver, &clock);

    s.select_dropdown("Category", "Tools").unwrap();
    s.press_button("Search").unwrap();
    s.expect_flash_message("Success").unwrap();

    // Table present at 2.5s, one second of settle: results appear at 4s
    let outcome = s.expect_results_contain("Hammer").unwrap();
    assert_eq!(outcome.attempts, 2);
    s.expect_results_lack("Banana").unwrap();
    assert!(clock.sleeps().contains(&SEARCH_SETTLE_BEFORE));
}

#[test]
fn test_search_results_never_contain_product() {
    let clock = FakeClock::shared();
    let mut driver = admin_page(&clock);
    with_slow_search(&mut driver, "Widget A");
    let mut s = steps(driver, &clock);

    s.press_button("Search").unwrap();
    let err = s.expect_results_contain("Widget Z").unwrap_err();

    assert_eq!(
        err.to_string(),
        "could not find 'Widget Z' after 3 attempts; last observed: 'Widget A'"
    );
    assert!(matches!(
        err,
        ProbeError::Retry(RetryError::ExpectationNotMet { .. })
    ));
    assert_eq!(
        s.observer()
            .lines()
            .iter()
            .filter(|l| l.starts_with("search_results (attempt"))
            .count(),
        3
    );
}

#[test]
fn test_repeated_check_after_success() {
    let clock = FakeClock::shared();
    let mut driver = admin_page(&clock);
    driver.add_element(Selector::search_results(), MockElement::text("div", "Widget A"));
    let s = steps(driver, &clock);

    let first = s.expect_results_contain("Widget A").unwrap();
    let second = s.expect_results_contain("Widget A").unwrap();
    assert_eq!(first, second);
    assert_eq!(clock.sleep_count(), 0);
}
