//! [`Driver`] implementation over [`MockDom`].

use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::{Duration, Instant};

use super::dom::{MockDom, MockNode};
use super::selector;
use crate::driver::{
    BoundingBox, Driver, DriverError, DriverResult, ElementHandle, ScriptArg,
};
use crate::locator::Locator;

type Mutation = Box<dyn FnOnce(&mut MockDom)>;

struct Scheduled {
    at: Instant,
    apply: Mutation,
}

/// Mock driver for unit testing.
///
/// Handles are `node-<n>`. Every call first applies scheduled mutations
/// that are due, then records itself in the call history.
pub struct MockDriver {
    dom: RefCell<MockDom>,
    pending: RefCell<Vec<Scheduled>>,
    failures: RefCell<Vec<(String, DriverError)>>,
    script_results: RefCell<Vec<(String, serde_json::Value)>>,
    call_history: RefCell<Vec<String>>,
    implicit_wait: Cell<Duration>,
}

impl fmt::Debug for MockDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockDriver")
            .field("nodes", &self.dom.borrow().document_order().len())
            .field("pending_mutations", &self.pending.borrow().len())
            .field("injected_failures", &self.failures.borrow().len())
            .field("calls", &self.call_history.borrow().len())
            .finish()
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new(MockNode::new("body"))
    }
}

impl MockDriver {
    /// Create a driver serving the given tree
    #[must_use]
    pub fn new(root: MockNode) -> Self {
        Self {
            dom: RefCell::new(MockDom::from_root(root)),
            pending: RefCell::new(Vec::new()),
            failures: RefCell::new(Vec::new()),
            script_results: RefCell::new(Vec::new()),
            call_history: RefCell::new(Vec::new()),
            implicit_wait: Cell::new(Duration::ZERO),
        }
    }

    /// Apply `mutation` to the DOM once `after` has elapsed
    pub fn schedule<F>(&self, after: Duration, mutation: F)
    where
        F: FnOnce(&mut MockDom) + 'static,
    {
        self.pending.borrow_mut().push(Scheduled {
            at: Instant::now() + after,
            apply: Box::new(mutation),
        });
    }

    /// Mutate the DOM right now
    pub fn mutate<R>(&self, mutation: impl FnOnce(&mut MockDom) -> R) -> R {
        self.apply_due();
        mutation(&mut *self.dom.borrow_mut())
    }

    /// Read the DOM
    pub fn inspect<R>(&self, read: impl FnOnce(&MockDom) -> R) -> R {
        self.apply_due();
        read(&*self.dom.borrow())
    }

    /// Make the next call to `method` fail with `error`
    pub fn fail_next(&self, method: &str, error: DriverError) {
        self.failures
            .borrow_mut()
            .push((method.to_string(), error));
    }

    /// Answer scripts containing `fragment` with `value`
    pub fn set_script_result(&self, fragment: &str, value: serde_json::Value) {
        self.script_results
            .borrow_mut()
            .push((fragment.to_string(), value));
    }

    /// Handle for a node, as a driver lookup would return it
    #[must_use]
    pub fn handle_of(&self, id: &str) -> Option<ElementHandle> {
        self.dom
            .borrow()
            .by_id(id)
            .map(|node| ElementHandle::new(format!("node-{}", node.0)))
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
            .any(|call| call.starts_with(method))
    }

    /// Number of calls whose entry starts with `method`
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.call_history
            .borrow()
            .iter()
            .filter(|call| call.starts_with(method))
            .count()
    }

    /// Last value passed to [`Driver::set_implicit_wait`]
    #[must_use]
    pub fn implicit_wait(&self) -> Duration {
        self.implicit_wait.get()
    }

    fn apply_due(&self) {
        let now = Instant::now();
        let mut due: Vec<Scheduled> = {
            let mut pending = self.pending.borrow_mut();
            let (due, keep): (Vec<Scheduled>, Vec<Scheduled>) =
                pending.drain(..).partition(|m| m.at <= now);
            *pending = keep;
            due
        };
        due.sort_by_key(|m| m.at);
        let mut dom = self.dom.borrow_mut();
        for mutation in due {
            (mutation.apply)(&mut *dom);
        }
    }

    fn enter(&self, method: &str, detail: &str) -> DriverResult<()> {
        self.apply_due();
        self.call_history
            .borrow_mut()
            .push(format!("{method}:{detail}"));
        let mut failures = self.failures.borrow_mut();
        match failures.iter().position(|(m, _)| m == method) {
            Some(pos) => Err(failures.remove(pos).1),
            None => Ok(()),
        }
    }

    fn node(&self, handle: &ElementHandle) -> DriverResult<usize> {
        let idx = handle
            .id()
            .strip_prefix("node-")
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| DriverError::stale(format!("unknown handle {handle}")))?;
        if self.dom.borrow().get(idx).is_some() {
            Ok(idx)
        } else {
            Err(DriverError::stale(format!(
                "{handle} is no longer attached to the DOM"
            )))
        }
    }

    fn handles(found: Vec<usize>) -> Vec<ElementHandle> {
        found
            .into_iter()
            .map(|idx| ElementHandle::new(format!("node-{idx}")))
            .collect()
    }

    fn interactable(&self, idx: usize, handle: &ElementHandle) -> DriverResult<()> {
        let dom = self.dom.borrow();
        if dom.is_displayed(idx) && dom.is_enabled(idx) {
            Ok(())
        } else {
            Err(DriverError::not_interactable(format!(
                "{handle} is hidden or disabled"
            )))
        }
    }
}

impl Driver for MockDriver {
    fn find_element(&self, locator: &Locator) -> DriverResult<ElementHandle> {
        self.enter("find_element", &locator.to_string())?;
        let found = selector::query(&self.dom.borrow(), None, locator)?;
        Self::handles(found)
            .into_iter()
            .next()
            .ok_or_else(|| DriverError::no_such_element(format!("Unable to locate {locator}")))
    }

    fn find_elements(&self, locator: &Locator) -> DriverResult<Vec<ElementHandle>> {
        self.enter("find_elements", &locator.to_string())?;
        let found = selector::query(&self.dom.borrow(), None, locator)?;
        Ok(Self::handles(found))
    }

    fn find_child_elements(
        &self,
        parent: &ElementHandle,
        locator: &Locator,
    ) -> DriverResult<Vec<ElementHandle>> {
        self.enter("find_child_elements", &format!("{parent} {locator}"))?;
        let idx = self.node(parent)?;
        let found = selector::query(&self.dom.borrow(), Some(idx), locator)?;
        Ok(Self::handles(found))
    }

    fn execute_script(&self, source: &str, args: &[ScriptArg]) -> DriverResult<serde_json::Value> {
        self.enter("execute_script", source)?;
        let mut elements = Vec::new();
        for arg in args {
            if let ScriptArg::Element(handle) = arg {
                elements.push(self.node(handle)?);
            }
        }
        if source.contains("document.readyState") {
            let state = self.dom.borrow().ready_state().to_string();
            return Ok(serde_json::Value::String(state));
        }
        if let Some((_, value)) = self
            .script_results
            .borrow()
            .iter()
            .find(|(fragment, _)| source.contains(fragment.as_str()))
        {
            return Ok(value.clone());
        }
        if let Some(&target) = elements.first() {
            let mut dom = self.dom.borrow_mut();
            if source.contains("style.border") {
                dom.set_attr_idx(target, "style", "border: 3px solid red");
            }
            if source.contains(".click()") {
                dom.activate(target);
            }
        }
        Ok(serde_json::Value::Null)
    }

    fn bounding_box(&self, element: &ElementHandle) -> DriverResult<BoundingBox> {
        self.enter("bounding_box", element.id())?;
        let idx = self.node(element)?;
        self.dom
            .borrow()
            .bounds_of(idx)
            .ok_or_else(|| DriverError::stale(element.to_string()))
    }

    fn is_clickable(&self, element: &ElementHandle) -> DriverResult<bool> {
        self.enter("is_clickable", element.id())?;
        let idx = self.node(element)?;
        let dom = self.dom.borrow();
        Ok(dom.is_displayed(idx) && dom.is_enabled(idx))
    }

    fn is_selected(&self, element: &ElementHandle) -> DriverResult<bool> {
        self.enter("is_selected", element.id())?;
        let idx = self.node(element)?;
        let dom = self.dom.borrow();
        let flag = if dom.tag(idx) == Some("option") {
            "selected"
        } else {
            "checked"
        };
        Ok(dom.attr_idx(idx, flag).is_some())
    }

    fn text(&self, element: &ElementHandle) -> DriverResult<String> {
        self.enter("text", element.id())?;
        let idx = self.node(element)?;
        Ok(self.dom.borrow().text_of(idx))
    }

    fn attribute(&self, element: &ElementHandle, name: &str) -> DriverResult<Option<String>> {
        self.enter("attribute", &format!("{element} {name}"))?;
        let idx = self.node(element)?;
        Ok(self.dom.borrow().attr_idx(idx, name).map(str::to_string))
    }

    fn tag_name(&self, element: &ElementHandle) -> DriverResult<String> {
        self.enter("tag_name", element.id())?;
        let idx = self.node(element)?;
        Ok(self
            .dom
            .borrow()
            .tag(idx)
            .map(str::to_string)
            .unwrap_or_default())
    }

    fn click(&self, element: &ElementHandle) -> DriverResult<()> {
        self.enter("click", element.id())?;
        let idx = self.node(element)?;
        self.interactable(idx, element)?;
        self.dom.borrow_mut().activate(idx);
        Ok(())
    }

    fn send_keys(&self, element: &ElementHandle, keys: &str) -> DriverResult<()> {
        self.enter("send_keys", element.id())?;
        let idx = self.node(element)?;
        self.interactable(idx, element)?;
        let mut dom = self.dom.borrow_mut();
        let mut value = dom.attr_idx(idx, "value").unwrap_or_default().to_string();
        value.push_str(keys);
        dom.set_value(idx, &value);
        Ok(())
    }

    fn clear(&self, element: &ElementHandle) -> DriverResult<()> {
        self.enter("clear", element.id())?;
        let idx = self.node(element)?;
        self.interactable(idx, element)?;
        self.dom.borrow_mut().set_value(idx, "");
        Ok(())
    }

    fn set_implicit_wait(&self, wait: Duration) -> DriverResult<()> {
        self.enter("set_implicit_wait", &format!("{}ms", wait.as_millis()))?;
        self.implicit_wait.set(wait);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn login_page() -> MockDriver {
        MockDriver::new(
            MockNode::new("body")
                .child(MockNode::input("text").id("employee_username"))
                .child(MockNode::input("password").id("employee_password"))
                .child(MockNode::input("submit").attr("name", "commit").disabled())
                .child(MockNode::new("div").id("spinner").hidden()),
        )
    }

    mod lookup_tests {
        use super::*;

        #[test]
        fn test_find_element_missing_is_no_such_element() {
            let driver = login_page();
            let err = driver.find_element(&Locator::id("nope")).unwrap_err();
            assert!(matches!(err, DriverError::NoSuchElement { .. }));
        }

        #[test]
        fn test_handles_are_stable_for_same_node() {
            let driver = login_page();
            let a = driver.find_element(&Locator::id("employee_username")).unwrap();
            let b = driver.handle_of("employee_username").unwrap();
            assert_eq!(a, b);
        }

        #[test]
        fn test_removed_node_is_stale() {
            let driver = login_page();
            let handle = driver.handle_of("employee_username").unwrap();
            driver.mutate(|dom| {
                let node = dom.by_id("employee_username").unwrap();
                dom.remove(node);
            });
            assert!(matches!(
                driver.text(&handle).unwrap_err(),
                DriverError::StaleElement { .. }
            ));
        }

        #[test]
        fn test_history_records_calls() {
            let driver = login_page();
            let _ = driver.find_element(&Locator::id("employee_username"));
            assert!(driver.was_called("find_element:id = employee_username"));
            assert_eq!(driver.call_count("find_element"), 1);
            assert!(!driver.was_called("click"));
        }
    }

    mod interaction_tests {
        use super::*;

        #[test]
        fn test_send_keys_appends_and_clear_empties() {
            let driver = login_page();
            let user = driver.handle_of("employee_username").unwrap();
            driver.send_keys(&user, "com").unwrap();
            driver.send_keys(&user, "pany").unwrap();
            assert_eq!(driver.attribute(&user, "value").unwrap().as_deref(), Some("company"));
            driver.clear(&user).unwrap();
            assert_eq!(driver.attribute(&user, "value").unwrap().as_deref(), Some(""));
        }

        #[test]
        fn test_click_disabled_is_not_interactable() {
            let driver = login_page();
            let commit = driver.find_element(&Locator::name("commit")).unwrap();
            assert!(!driver.is_clickable(&commit).unwrap());
            let err = driver.click(&commit).unwrap_err();
            assert!(matches!(err, DriverError::NotInteractable { .. }));
        }

        #[test]
        fn test_hidden_bounding_box_collapses() {
            let driver = login_page();
            let spinner = driver.handle_of("spinner").unwrap();
            assert_eq!(driver.bounding_box(&spinner).unwrap(), BoundingBox::collapsed());
        }

        #[test]
        fn test_injected_failure_fires_once() {
            let driver = login_page();
            let user = driver.handle_of("employee_username").unwrap();
            driver.fail_next("text", DriverError::stale("detached"));
            assert!(driver.text(&user).is_err());
            assert!(driver.text(&user).is_ok());
        }

        #[test]
        fn test_implicit_wait_recorded() {
            let driver = login_page();
            driver.set_implicit_wait(Duration::ZERO).unwrap();
            assert_eq!(driver.implicit_wait(), Duration::ZERO);
            assert!(driver.was_called("set_implicit_wait:0ms"));
        }
    }

    mod script_tests {
        use super::*;

        #[test]
        fn test_ready_state_script() {
            let driver = login_page();
            driver.mutate(|dom| dom.set_ready_state("interactive"));
            let state = driver
                .execute_script("return document.readyState;", &[])
                .unwrap();
            assert_eq!(state, serde_json::json!("interactive"));
        }

        #[test]
        fn test_js_click_bypasses_interactability() {
            let driver = MockDriver::new(
                MockNode::new("body").child(MockNode::input("checkbox").id("cb").hidden()),
            );
            let cb = driver.handle_of("cb").unwrap();
            driver
                .execute_script("arguments[0].click();", &[ScriptArg::Element(cb.clone())])
                .unwrap();
            assert!(driver.is_selected(&cb).unwrap());
        }

        #[test]
        fn test_scripted_result() {
            let driver = login_page();
            driver.set_script_result("navigator.userAgent", serde_json::json!("mock"));
            let ua = driver
                .execute_script("return navigator.userAgent;", &[])
                .unwrap();
            assert_eq!(ua, serde_json::json!("mock"));
        }

        #[test]
        fn test_script_with_stale_arg_fails() {
            let driver = login_page();
            let stale = ElementHandle::new("node-999");
            let err = driver
                .execute_script("arguments[0].click();", &[ScriptArg::Element(stale)])
                .unwrap_err();
            assert!(err.is_absence());
        }
    }

    mod schedule_tests {
        use super::*;

        #[test]
        fn test_mutation_applies_only_after_delay() {
            let driver = login_page();
            driver.schedule(Duration::from_millis(40), |dom| {
                let spinner = dom.by_id("spinner").unwrap();
                dom.set_displayed(spinner, true);
            });
            let spinner = driver.handle_of("spinner").unwrap();
            assert!(!driver.bounding_box(&spinner).unwrap().looks_visible());
            std::thread::sleep(Duration::from_millis(60));
            assert!(driver.bounding_box(&spinner).unwrap().looks_visible());
        }

        #[test]
        fn test_zero_delay_applies_on_next_call() {
            let driver = login_page();
            driver.schedule(Duration::ZERO, |dom| dom.set_ready_state("loading"));
            assert_eq!(driver.inspect(|dom| dom.ready_state().to_string()), "loading");
        }
    }
}
