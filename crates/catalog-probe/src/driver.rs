//! PageDriver - abstract browser automation trait
//!
//! Steps and assertions talk to the page only through [`PageDriver`], so the
//! same step library runs against a real browser ([`crate::CdpDriver`], behind
//! the `browser` feature) or the scriptable [`MockDriver`].
//!
//! Reads take `&self` and fail with [`ProbeError::ElementNotFound`] when the
//! selector does not currently resolve; that is the signal the retry loop
//! and the waits poll on.

use crate::clock::{Clock, FakeClock};
use crate::locator::Selector;
use crate::result::{ProbeError, ProbeResult};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Abstract driver trait for browser automation
pub trait PageDriver {
    /// Navigate to URL
    fn navigate(&mut self, url: &str) -> ProbeResult<()>;

    /// Current document title
    fn title(&self) -> ProbeResult<String>;

    /// Rendered text of the first element matching `selector`
    fn text(&self, selector: &Selector) -> ProbeResult<String>;

    /// Rendered text of every element matching `selector`
    fn texts(&self, selector: &Selector) -> ProbeResult<Vec<String>>;

    /// `value` property of a form control
    fn value(&self, selector: &Selector) -> ProbeResult<String>;

    /// Clear a form control
    fn clear(&mut self, selector: &Selector) -> ProbeResult<()>;

    /// Type text into a form control
    fn send_keys(&mut self, selector: &Selector, text: &str) -> ProbeResult<()>;

    /// Select the `<option>` whose visible text equals `text`
    fn select_by_visible_text(&mut self, selector: &Selector, text: &str) -> ProbeResult<()>;

    /// Visible text of the first selected `<option>`
    fn selected_option_text(&self, selector: &Selector) -> ProbeResult<String>;

    /// Click an element
    fn click(&mut self, selector: &Selector) -> ProbeResult<()>;

    /// Whether `selector` currently resolves
    fn is_present(&self, selector: &Selector) -> ProbeResult<bool> {
        match self.text(selector) {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// A scripted element in the [`MockDriver`] document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// Element tag name
    pub tag_name: String,
    /// Rendered text
    pub text: String,
    /// Form control value
    pub value: String,
    /// `<option>` texts for a `<select>`
    pub options: Vec<String>,
    /// Index of the selected option
    pub selected: Option<usize>,
    /// Text of each matched element when the selector matches many
    pub items: Vec<String>,
}

impl MockElement {
    /// A text-bearing element
    #[must_use]
    pub fn text(tag_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    /// An `<input>` with an initial value
    #[must_use]
    pub fn input(value: impl Into<String>) -> Self {
        Self {
            tag_name: "input".into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// A `<select>` with options, first option selected
    #[must_use]
    pub fn select<S: Into<String>>(options: impl IntoIterator<Item = S>) -> Self {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let selected = if options.is_empty() { None } else { Some(0) };
        Self {
            tag_name: "select".into(),
            options,
            selected,
            ..Self::default()
        }
    }

    /// A `<button>`
    #[must_use]
    pub fn button(label: impl Into<String>) -> Self {
        Self::text("button", label)
    }

    /// A selector matching several elements, e.g. table rows
    #[must_use]
    pub fn list<S: Into<String>>(items: impl IntoIterator<Item = S>) -> Self {
        let items: Vec<String> = items.into_iter().map(Into::into).collect();
        Self {
            tag_name: "tr".into(),
            text: items.join("\n"),
            items,
            ..Self::default()
        }
    }
}

/// A change applied to the mock document at a point in virtual time
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockChange {
    /// Insert or replace the element
    Show(MockElement),
    /// Replace the rendered text, inserting a `div` if absent
    Text(String),
    /// Remove the element
    Hide,
}

#[derive(Debug, Clone)]
struct Scheduled {
    at: Duration,
    selector: Selector,
    change: MockChange,
}

/// Mock driver for unit testing
///
/// Holds a document of [`MockElement`]s keyed by selector. Changes can be
/// scheduled at virtual times on a shared [`FakeClock`], or registered as
/// reactions to a click, to simulate asynchronous rendering.
#[derive(Debug, Default)]
pub struct MockDriver {
    /// Current URL
    pub current_url: String,
    /// Document title
    pub title: String,
    elements: HashMap<Selector, MockElement>,
    scheduled: Vec<Scheduled>,
    reactions: HashMap<Selector, Vec<(Duration, Selector, MockChange)>>,
    clock: Option<Arc<FakeClock>>,
    call_history: RefCell<Vec<String>>,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tie scheduled changes to a shared fake clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<FakeClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the document title
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Add an element present from the start
    #[must_use]
    pub fn with_element(mut self, selector: Selector, element: MockElement) -> Self {
        self.add_element(selector, element);
        self
    }

    /// Add an element present from the start
    pub fn add_element(&mut self, selector: Selector, element: MockElement) {
        self.elements.insert(selector, element);
    }

    /// Apply `change` once the clock reaches `at`
    pub fn schedule(&mut self, at: Duration, selector: Selector, change: MockChange) {
        self.scheduled.push(Scheduled {
            at,
            selector,
            change,
        });
        self.scheduled.sort_by_key(|s| s.at);
    }

    /// When `trigger` is clicked, apply `change` to `target` after `delay`
    pub fn on_click(
        &mut self,
        trigger: Selector,
        delay: Duration,
        target: Selector,
        change: MockChange,
    ) {
        self.reactions
            .entry(trigger)
            .or_default()
            .push((delay, target, change));
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.call_history.borrow().clone()
    }

    /// Check if method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.call_history
            .borrow()
            .iter()
            .any(|c| c.starts_with(method))
    }

    /// Number of recorded calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.call_history
            .borrow()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    fn record(&self, call: String) {
        self.call_history.borrow_mut().push(call);
    }

    fn now(&self) -> Duration {
        self.clock.as_ref().map_or(Duration::ZERO, |c| c.now())
    }

    /// Promote every change whose time has come into the base document
    fn settle(&mut self) {
        let now = self.now();
        let (due, pending): (Vec<_>, Vec<_>) =
            self.scheduled.drain(..).partition(|s| s.at <= now);
        self.scheduled = pending;
        for s in due {
            apply(&mut self.elements, s.selector, s.change);
        }
    }

    /// Element state as of the clock's current time
    fn current(&self, selector: &Selector) -> Option<MockElement> {
        let now = self.now();
        let mut element = self.elements.get(selector).cloned();
        for s in self
            .scheduled
            .iter()
            .filter(|s| s.at <= now && &s.selector == selector)
        {
            element = match &s.change {
                MockChange::Show(e) => Some(e.clone()),
                MockChange::Text(t) => {
                    let mut e = element.unwrap_or_else(|| MockElement::text("div", ""));
                    e.text.clone_from(t);
                    Some(e)
                }
                MockChange::Hide => None,
            };
        }
        element
    }

    fn resolve(&self, selector: &Selector) -> ProbeResult<MockElement> {
        self.current(selector)
            .ok_or_else(|| ProbeError::not_found(selector.to_css()))
    }

    fn resolve_mut(&mut self, selector: &Selector) -> ProbeResult<&mut MockElement> {
        self.settle();
        self.elements
            .get_mut(selector)
            .ok_or_else(|| ProbeError::not_found(selector.to_css()))
    }
}

fn apply(elements: &mut HashMap<Selector, MockElement>, selector: Selector, change: MockChange) {
    match change {
        MockChange::Show(e) => {
            elements.insert(selector, e);
        }
        MockChange::Text(t) => {
            elements
                .entry(selector)
                .or_insert_with(|| MockElement::text("div", ""))
                .text = t;
        }
        MockChange::Hide => {
            elements.remove(&selector);
        }
    }
}

impl PageDriver for MockDriver {
    fn navigate(&mut self, url: &str) -> ProbeResult<()> {
        self.record(format!("navigate:{url}"));
        self.current_url = url.to_string();
        Ok(())
    }

    fn title(&self) -> ProbeResult<String> {
        self.record("title".to_string());
        Ok(self.title.clone())
    }

    fn text(&self, selector: &Selector) -> ProbeResult<String> {
        self.record(format!("text:{selector}"));
        self.resolve(selector).map(|e| e.text)
    }

    fn texts(&self, selector: &Selector) -> ProbeResult<Vec<String>> {
        self.record(format!("texts:{selector}"));
        Ok(match self.current(selector) {
            Some(e) if !e.items.is_empty() => e.items,
            Some(e) => vec![e.text],
            None => Vec::new(),
        })
    }

    fn value(&self, selector: &Selector) -> ProbeResult<String> {
        self.record(format!("value:{selector}"));
        let element = self.resolve(selector)?;
        if element.tag_name == "select" {
            return Ok(element
                .selected
                .and_then(|i| element.options.get(i).cloned())
                .unwrap_or_default());
        }
        Ok(element.value)
    }

    fn clear(&mut self, selector: &Selector) -> ProbeResult<()> {
        self.record(format!("clear:{selector}"));
        self.resolve_mut(selector)?.value.clear();
        Ok(())
    }

    fn send_keys(&mut self, selector: &Selector, text: &str) -> ProbeResult<()> {
        self.record(format!("send_keys:{selector}:{text}"));
        self.resolve_mut(selector)?.value.push_str(text);
        Ok(())
    }

    fn select_by_visible_text(&mut self, selector: &Selector, text: &str) -> ProbeResult<()> {
        self.record(format!("select:{selector}:{text}"));
        let css = selector.to_css();
        let element = self.resolve_mut(selector)?;
        if element.tag_name != "select" {
            return Err(ProbeError::UnsupportedInteraction {
                selector: css,
                operation: "select".into(),
            });
        }
        let index = element
            .options
            .iter()
            .position(|o| o == text)
            .ok_or_else(|| ProbeError::not_found(format!("{css} option '{text}'")))?;
        element.selected = Some(index);
        Ok(())
    }

    fn selected_option_text(&self, selector: &Selector) -> ProbeResult<String> {
        self.record(format!("selected:{selector}"));
        let element = self.resolve(selector)?;
        element
            .selected
            .and_then(|i| element.options.get(i).cloned())
            .ok_or_else(|| ProbeError::not_found(format!("{selector} selected option")))
    }

    fn click(&mut self, selector: &Selector) -> ProbeResult<()> {
        self.record(format!("click:{selector}"));
        self.resolve(selector)?;
        let now = self.now();
        if let Some(reactions) = self.reactions.get(selector).cloned() {
            for (delay, target, change) in reactions {
                self.schedule(now + delay, target, change);
            }
        }
        Ok(())
    }
}
