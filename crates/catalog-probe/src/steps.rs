//! Web steps for the catalog admin page.
//!
//! [`WebSteps`] is the per-scenario context a BDD runner hands to each step:
//! it owns the page driver, the clock used for every pause, the attempt
//! observer and a clipboard for copy/paste steps. Fields are addressed by
//! their visible label (see [`crate::locator`]).

use crate::assertion::{
    Assertion, AttemptObserver, BoundedRetry, Expectation, RetryBudget, RetryOutcome,
    TracingObserver,
};
use crate::clock::{Clock, SystemClock};
use crate::config::ProbeConfig;
use crate::driver::PageDriver;
use crate::locator::{Selector, SEARCH_RESULTS_ID};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::Waiter;
use std::time::Duration;
use tracing::info;

/// Pause after clicking Search before looking for the results table
pub const SEARCH_SETTLE_BEFORE: Duration = Duration::from_secs(2);

/// Pause after the results table and flash message are present
pub const SEARCH_SETTLE_AFTER: Duration = Duration::from_secs(1);

/// Step context for one scenario
#[derive(Debug)]
pub struct WebSteps<D: PageDriver, C: Clock = SystemClock, O: AttemptObserver = TracingObserver> {
    driver: D,
    clock: C,
    observer: O,
    config: ProbeConfig,
    clipboard: Option<String>,
}

impl<D: PageDriver> WebSteps<D> {
    /// Steps over `driver` using the wall clock and tracing diagnostics
    pub fn new(driver: D, config: ProbeConfig) -> Self {
        Self {
            driver,
            clock: SystemClock::new(),
            observer: TracingObserver,
            config,
            clipboard: None,
        }
    }
}

impl<D: PageDriver, C: Clock, O: AttemptObserver> WebSteps<D, C, O> {
    /// Replace the clock
    pub fn with_clock<C2: Clock>(self, clock: C2) -> WebSteps<D, C2, O> {
        WebSteps {
            driver: self.driver,
            clock,
            observer: self.observer,
            config: self.config,
            clipboard: self.clipboard,
        }
    }

    /// Replace the attempt observer
    pub fn with_observer<O2: AttemptObserver>(self, observer: O2) -> WebSteps<D, C, O2> {
        WebSteps {
            driver: self.driver,
            clock: self.clock,
            observer,
            config: self.config,
            clipboard: self.clipboard,
        }
    }

    /// The page driver
    pub const fn driver(&self) -> &D {
        &self.driver
    }

    /// The page driver, mutably
    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    /// Give the driver back
    pub fn into_driver(self) -> D {
        self.driver
    }

    /// The attempt observer
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// The run configuration
    pub const fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Value captured by the last copy step
    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    fn waiter(&self) -> Waiter<'_, D> {
        Waiter::new(&self.driver, &self.clock, self.config.wait_options())
    }

    // ------------------------------------------------------------------
    // Navigation and page-level checks
    // ------------------------------------------------------------------

    /// When I visit the "Home Page"
    pub fn visit_home_page(&mut self) -> ProbeResult<()> {
        let url = self.config.base_url().to_string();
        self.driver.navigate(&url)
    }

    /// Then I should see "{message}" in the title
    pub fn expect_title_contains(&self, message: &str) -> ProbeResult<()> {
        let title = self.driver.title()?;
        Assertion::contains(&title, message).into_result()
    }

    /// Then I should not see "{text}"
    pub fn expect_page_lacks(&self, text: &str) -> ProbeResult<()> {
        let body = self.driver.text(&Selector::body())?;
        Assertion::lacks(&body, text).into_result()
    }

    // ------------------------------------------------------------------
    // Form fields
    // ------------------------------------------------------------------

    /// When I set the "{label}" to "{text}"
    pub fn set_field(&mut self, label: &str, text: &str) -> ProbeResult<()> {
        let field = Selector::field(label);
        self.driver.clear(&field)?;
        self.driver.send_keys(&field, text)
    }

    /// When I select "{text}" in the "{label}" dropdown
    pub fn select_dropdown(&mut self, label: &str, text: &str) -> ProbeResult<()> {
        self.driver.select_by_visible_text(&Selector::field(label), text)
    }

    /// Then I should see "{text}" in the "{label}" dropdown
    pub fn expect_dropdown_selection(&self, label: &str, text: &str) -> ProbeResult<()> {
        let selected = self.driver.selected_option_text(&Selector::field(label))?;
        Assertion::equals(&text, &selected.as_str()).into_result()
    }

    /// Then the "{label}" field should be empty
    pub fn expect_field_empty(&self, label: &str) -> ProbeResult<()> {
        let value = self.driver.value(&Selector::field(label))?;
        Assertion::is_true(
            value.is_empty(),
            &format!("expected {label} to be empty, got '{value}'"),
        )
        .into_result()
    }

    /// When I copy the "{label}" field
    pub fn copy_field(&mut self, label: &str) -> ProbeResult<()> {
        let field = Selector::field(label);
        self.waiter().for_presence(&field)?;
        let value = self.driver.value(&field)?;
        info!("Clipboard contains: {value}");
        self.clipboard = Some(value);
        Ok(())
    }

    /// When I paste the "{label}" field
    pub fn paste_field(&mut self, label: &str) -> ProbeResult<()> {
        let text = self
            .clipboard
            .clone()
            .ok_or_else(|| ProbeError::assertion("clipboard is empty; copy a field first"))?;
        self.change_field(label, &text)
    }

    /// Then I should see "{text}" in the "{label}" field
    pub fn expect_field_value(&self, label: &str, text: &str) -> ProbeResult<()> {
        self.waiter()
            .for_value(&Selector::field(label), text)
            .map(|_| ())
    }

    /// When I change "{label}" to "{text}"
    pub fn change_field(&mut self, label: &str, text: &str) -> ProbeResult<()> {
        let field = Selector::field(label);
        self.waiter().for_presence(&field)?;
        self.driver.clear(&field)?;
        self.driver.send_keys(&field, text)
    }

    // ------------------------------------------------------------------
    // Buttons
    // ------------------------------------------------------------------

    /// When I press the "{button}" button
    ///
    /// A search re-renders the results table asynchronously, so pressing
    /// Search also waits for the table and the flash message and logs the
    /// rows it finds.
    pub fn press_button(&mut self, button: &str) -> ProbeResult<()> {
        self.driver.click(&Selector::button(button))?;
        if !button.eq_ignore_ascii_case("search") {
            return Ok(());
        }

        self.clock.sleep(SEARCH_SETTLE_BEFORE);
        let waiter = self.waiter();
        waiter.for_presence(&Selector::results_table())?;
        waiter.for_presence(&Selector::flash_message())?;

        let rows = self.driver.texts(&Selector::results_rows())?;
        info!("Found {} rows after search", rows.len());
        for row in &rows {
            info!("Row content: [{row}]");
        }

        self.clock.sleep(SEARCH_SETTLE_AFTER);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Messages and results
    // ------------------------------------------------------------------

    /// Then I should see the message "{message}"
    pub fn expect_flash_message(&self, message: &str) -> ProbeResult<()> {
        self.waiter()
            .for_text(&Selector::flash_message(), message)
            .map(|_| ())
    }

    /// Then I should see "{name}" in the results
    ///
    /// Samples the results region up to three times, one second apart.
    pub fn expect_results_contain(&self, name: &str) -> ProbeResult<RetryOutcome> {
        info!("Looking for {name} in search results");
        let results = Selector::search_results();
        let rows = Selector::results_rows();
        BoundedRetry::new(SEARCH_RESULTS_ID, Expectation::contains(name))
            .with_clock(&self.clock)
            .with_observer(&self.observer)
            .verify_with_context(
                || self.driver.text(&results),
                || self.driver.texts(&rows),
            )
            .map_err(ProbeError::from)
    }

    /// Then I should not see "{name}" in the results
    pub fn expect_results_lack(&self, name: &str) -> ProbeResult<()> {
        let results = Selector::search_results();
        BoundedRetry::new(SEARCH_RESULTS_ID, Expectation::absent(name))
            .with_clock(&self.clock)
            .with_observer(&self.observer)
            .with_budget(RetryBudget::SINGLE)
            .verify(|| self.driver.text(&results))
            .map(|_| ())
            .map_err(ProbeError::from)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::assertion::{RecordingObserver, RetryError};
    use crate::clock::FakeClock;
    use crate::driver::{MockChange, MockDriver, MockElement};
    use std::sync::Arc;

    const CATEGORIES: [&str; 6] = [
        "Unknown",
        "Cloths",
        "Food",
        "Housewares",
        "Automotive",
        "Tools",
    ];

    fn admin_page(clock: &Arc<FakeClock>) -> MockDriver {
        let mut driver = MockDriver::new()
            .with_clock(Arc::clone(clock))
            .with_title("Product Catalog Administration")
            .with_element(
                Selector::body(),
                MockElement::text("body", "Product Catalog Administration"),
            )
            .with_element(Selector::field("Id"), MockElement::input(""))
            .with_element(Selector::field("Name"), MockElement::input(""))
            .with_element(Selector::field("Description"), MockElement::input(""))
            .with_element(Selector::field("Price"), MockElement::input(""))
            .with_element(Selector::field("Available"), MockElement::select(["True", "False"]))
            .with_element(Selector::field("Category"), MockElement::select(CATEGORIES))
            .with_element(Selector::flash_message(), MockElement::text("div", ""))
            .with_element(Selector::search_results(), MockElement::text("div", ""));
        for button in ["Create", "Retrieve", "Update", "Delete", "Search", "Clear"] {
            driver.add_element(Selector::button(button), MockElement::button(button));
        }
        driver
    }

    type TestSteps = WebSteps<MockDriver, Arc<FakeClock>, RecordingObserver>;

    fn steps(driver: MockDriver, clock: &Arc<FakeClock>) -> TestSteps {
        WebSteps::new(driver, ProbeConfig::default().with_wait_seconds(5))
            .with_clock(Arc::clone(clock))
            .with_observer(RecordingObserver::new())
    }

    mod page {
        use super::*;

        #[test]
        fn test_visit_home_page() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            s.visit_home_page().unwrap();
            assert_eq!(s.driver().current_url, "http://localhost:8080");
        }

        #[test]
        fn test_title() {
            let clock = FakeClock::shared();
            let s = steps(admin_page(&clock), &clock);
            s.expect_title_contains("Catalog Administration").unwrap();
            assert!(s.expect_title_contains("Error").is_err());
        }

        #[test]
        fn test_page_lacks() {
            let clock = FakeClock::shared();
            let s = steps(admin_page(&clock), &clock);
            s.expect_page_lacks("404 Not Found").unwrap();
            let err = s.expect_page_lacks("Catalog").unwrap_err();
            assert!(matches!(err, ProbeError::AssertionFailed { .. }));
        }
    }

    mod fields {
        use super::*;

        #[test]
        fn test_set_field_replaces_value() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            s.set_field("Name", "Hammer").unwrap();
            s.set_field("Name", "Wrench").unwrap();
            s.expect_field_value("Name", "Wrench").unwrap();
        }

        #[test]
        fn test_set_unknown_field() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            let err = s.set_field("Colour", "Red").unwrap_err();
            assert!(err.is_not_found());
            assert!(err.to_string().contains("#product_colour"));
        }

        #[test]
        fn test_dropdown() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            s.select_dropdown("Category", "Tools").unwrap();
            s.expect_dropdown_selection("Category", "Tools").unwrap();
            let err = s.expect_dropdown_selection("Category", "Food").unwrap_err();
            assert!(err.to_string().contains("Food"));
        }

        #[test]
        fn test_field_empty() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            s.expect_field_empty("Id").unwrap();
            s.set_field("Id", "42").unwrap();
            assert!(s.expect_field_empty("Id").is_err());
        }

        #[test]
        fn test_copy_then_paste() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            s.set_field("Id", "42").unwrap();
            s.copy_field("Id").unwrap();
            assert_eq!(s.clipboard(), Some("42"));

            s.set_field("Id", "").unwrap();
            s.paste_field("Id").unwrap();
            s.expect_field_value("Id", "42").unwrap();
        }

        #[test]
        fn test_paste_without_copy() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            assert!(s.paste_field("Id").is_err());
        }

        #[test]
        fn test_field_value_times_out() {
            let clock = FakeClock::shared();
            let s = steps(admin_page(&clock), &clock);
            let err = s.expect_field_value("Name", "Hammer").unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { ms: 5000, .. }));
        }

        #[test]
        fn test_change_field_waits_for_presence() {
            let clock = FakeClock::shared();
            let mut driver = admin_page(&clock);
            let late = Selector::field("Sku");
            driver.schedule(
                Duration::from_secs(1),
                late.clone(),
                MockChange::Show(MockElement::input("")),
            );
            let mut s = steps(driver, &clock);
            s.change_field("Sku", "AB-1").unwrap();
            assert_eq!(s.driver().value(&late).unwrap(), "AB-1");
        }
    }

    mod buttons {
        use super::*;

        #[test]
        fn test_plain_button_does_not_wait() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            s.press_button("Clear").unwrap();
            assert!(s.driver().was_called("click:#clear-btn"));
            assert_eq!(clock.sleep_count(), 0);
        }

        #[test]
        fn test_search_waits_for_table_and_flash() {
            let clock = FakeClock::shared();
            let mut driver = admin_page(&clock);
            driver.on_click(
                Selector::button("Search"),
                Duration::from_millis(2500),
                Selector::results_table(),
                MockChange::Show(MockElement::text("table", "")),
            );
            driver.add_element(
                Selector::results_rows(),
                MockElement::list(["ID Name Category", "1 Hammer TOOLS"]),
            );
            let mut s = steps(driver, &clock);

            s.press_button("Search").unwrap();

            let sleeps = clock.sleeps();
            assert_eq!(sleeps.first(), Some(&SEARCH_SETTLE_BEFORE));
            assert_eq!(sleeps.last(), Some(&SEARCH_SETTLE_AFTER));
            assert_eq!(clock.now(), Duration::from_millis(3500));
        }

        #[test]
        fn test_search_without_table_times_out() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            let err = s.press_button("search").unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { .. }));
        }

        #[test]
        fn test_unknown_button() {
            let clock = FakeClock::shared();
            let mut s = steps(admin_page(&clock), &clock);
            assert!(s.press_button("Launch").unwrap_err().is_not_found());
        }
    }

    mod messages_and_results {
        use super::*;

        #[test]
        fn test_flash_message_after_delay() {
            let clock = FakeClock::shared();
            let mut driver = admin_page(&clock);
            driver.on_click(
                Selector::button("Create"),
                Duration::from_millis(700),
                Selector::flash_message(),
                MockChange::Text("Success".into()),
            );
            let mut s = steps(driver, &clock);
            s.press_button("Create").unwrap();
            s.expect_flash_message("Success").unwrap();
        }

        #[test]
        fn test_results_on_first_attempt() {
            let clock = FakeClock::shared();
            let mut driver = admin_page(&clock);
            driver.add_element(Selector::search_results(), MockElement::text("div", "Hammer"));
            let s = steps(driver, &clock);
            let outcome = s.expect_results_contain("Hammer").unwrap();
            assert_eq!(outcome.attempts, 1);
            assert_eq!(clock.sleep_count(), 0);
        }

        #[test]
        fn test_results_appear_late() {
            let clock = FakeClock::shared();
            let mut driver = admin_page(&clock);
            driver.schedule(
                Duration::from_secs(1),
                Selector::search_results(),
                MockChange::Text("Widget A".into()),
            );
            driver.add_element(Selector::results_rows(), MockElement::list(["ID Name"]));
            let s = steps(driver, &clock);
            let outcome = s.expect_results_contain("Widget A").unwrap();
            assert_eq!(outcome.attempts, 2);
            assert!(s
                .observer()
                .lines()
                .iter()
                .any(|l| l.contains("[ID Name]")));
        }

        #[test]
        fn test_results_never_match() {
            let clock = FakeClock::shared();
            let mut driver = admin_page(&clock);
            driver.add_element(Selector::search_results(), MockElement::text("div", "Widget A"));
            let s = steps(driver, &clock);
            let err = s.expect_results_contain("Widget Z").unwrap_err();
            assert_eq!(
                err.to_string(),
                "could not find 'Widget Z' after 3 attempts; last observed: 'Widget A'"
            );
            assert_eq!(clock.total_slept(), Duration::from_secs(2));
        }

        #[test]
        fn test_results_region_missing() {
            let clock = FakeClock::shared();
            let mut driver = admin_page(&clock);
            driver.schedule(Duration::ZERO, Selector::search_results(), MockChange::Hide);
            let s = steps(driver, &clock);
            let err = s.expect_results_contain("Widget").unwrap_err();
            assert!(matches!(
                err,
                ProbeError::Retry(RetryError::TargetUnavailable { attempts: 3, .. })
            ));
        }

        #[test]
        fn test_results_lack() {
            let clock = FakeClock::shared();
            let mut driver = admin_page(&clock);
            driver.add_element(Selector::search_results(), MockElement::text("div", "Hammer"));
            let s = steps(driver, &clock);
            s.expect_results_lack("Wrench").unwrap();
            let err = s.expect_results_lack("Hammer").unwrap_err();
            assert!(matches!(
                err,
                ProbeError::Retry(RetryError::UnexpectedText { attempts: 1, .. })
            ));
            assert_eq!(clock.sleep_count(), 0);
        }
    }
}
