//! In-memory engine that plays back a scripted application.
//!
//! Lets the tests run the start sequence without a desktop: an application
//! owns a tree of controls, its windows can appear only after a number of
//! lookups, and clicks can run hooks that change the tree (e.g. clicking
//! "Start Server" flips the status field to "Running"). Every activation and
//! click is recorded.

use super::ax_path::{canonical_role, AxPath, Segment, SegmentKey};
use super::{poll_lookup, AccessibilityEngine};
use crate::element::{ClickResult, UIElement, UIElementImpl};
use crate::{AutomationError, Selector};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, instrument};

/// A control in a scripted application's tree.
#[derive(Debug, Clone)]
pub struct ScriptedNode {
    pub role: String,
    pub name: Option<String>,
    pub value: Option<String>,
    pub enabled: bool,
    pub children: Vec<ScriptedNode>,
}

impl ScriptedNode {
    pub fn new(role: &str) -> Self {
        Self {
            role: role.to_string(),
            name: None,
            value: None,
            enabled: true,
            children: Vec::new(),
        }
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_child(mut self, child: ScriptedNode) -> Self {
        self.children.push(child);
        self
    }

    /// Depth-first search for a descendant (or self) with the given name.
    pub fn find_named_mut(&mut self, name: &str) -> Option<&mut ScriptedNode> {
        if self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|child| child.find_named_mut(name))
    }

    fn matches(&self, segment: &Segment) -> bool {
        let role_matches =
            segment.role == "uielement" || canonical_role(&self.role) == segment.role;
        match &segment.key {
            SegmentKey::Name(name) => role_matches && self.name.as_deref() == Some(name.as_str()),
            SegmentKey::Index(_) => role_matches,
        }
    }
}

/// A scripted target application.
#[derive(Debug, Clone)]
pub struct ScriptedApp {
    pub name: String,
    /// Whether activation can start the application.
    pub launchable: bool,
    pub running: bool,
    /// Lookups that report no window after activation.
    pub window_delay: usize,
    lookups: usize,
    pub windows: Vec<ScriptedNode>,
}

impl ScriptedApp {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            launchable: true,
            running: false,
            window_delay: 0,
            lookups: 0,
            windows: Vec::new(),
        }
    }

    pub fn with_window(mut self, window: ScriptedNode) -> Self {
        self.windows.push(window);
        self
    }

    pub fn window_delay(mut self, lookups: usize) -> Self {
        self.window_delay = lookups;
        self
    }

    pub fn already_running(mut self) -> Self {
        self.running = true;
        self
    }

    pub fn not_launchable(mut self) -> Self {
        self.launchable = false;
        self
    }

    pub fn find_named_mut(&mut self, name: &str) -> Option<&mut ScriptedNode> {
        self.windows
            .iter_mut()
            .find_map(|window| window.find_named_mut(name))
    }

    fn visible_windows(&self) -> &[ScriptedNode] {
        if self.lookups <= self.window_delay {
            &[]
        } else {
            &self.windows
        }
    }

    /// Resolve the segments below the process segment to child indices.
    fn resolve(&self, segments: &[Segment]) -> Option<Vec<usize>> {
        let mut level = self.visible_windows();
        let mut indices = Vec::with_capacity(segments.len());
        for segment in segments {
            let matching: Vec<usize> = level
                .iter()
                .enumerate()
                .filter(|(_, node)| node.matches(segment))
                .map(|(i, _)| i)
                .collect();
            let picked = match segment.key {
                SegmentKey::Name(_) => matching.first().copied(),
                SegmentKey::Index(i) if i >= 0 => matching.get(i as usize).copied(),
                SegmentKey::Index(i) => matching
                    .len()
                    .checked_sub(i.unsigned_abs() as usize)
                    .and_then(|j| matching.get(j).copied()),
            }?;
            indices.push(picked);
            level = level[picked].children.as_slice();
        }
        Some(indices)
    }

    fn node(&self, indices: &[usize]) -> Option<&ScriptedNode> {
        let (first, rest) = indices.split_first()?;
        let mut node = self.windows.get(*first)?;
        for i in rest {
            node = node.children.get(*i)?;
        }
        Some(node)
    }
}

/// Something the engine was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedEvent {
    Activated(String),
    Clicked(String),
}

type ClickHook = Box<dyn Fn(&mut ScriptedApp) + Send + Sync>;

#[derive(Default)]
struct ScriptedDesktop {
    apps: Vec<ScriptedApp>,
    hooks: Vec<(String, ClickHook)>,
    events: Vec<ScriptedEvent>,
}

impl ScriptedDesktop {
    fn app_mut(&mut self, name: &str) -> Option<&mut ScriptedApp> {
        self.apps.iter_mut().find(|a| a.name == name)
    }
}

/// Engine over scripted applications. Clones share state.
#[derive(Clone)]
pub struct ScriptedEngine {
    state: Arc<Mutex<ScriptedDesktop>>,
    lookup_interval: Duration,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            lookup_interval: Duration::from_millis(5),
        }
    }

    pub fn with_app(self, app: ScriptedApp) -> Self {
        self.lock().apps.push(app);
        self
    }

    /// Run `hook` on the application whenever a control named `control` is clicked.
    pub fn on_click(
        self,
        control: &str,
        hook: impl Fn(&mut ScriptedApp) + Send + Sync + 'static,
    ) -> Self {
        self.lock().hooks.push((control.to_string(), Box::new(hook)));
        self
    }

    pub fn events(&self) -> Vec<ScriptedEvent> {
        self.lock().events.clone()
    }

    pub fn clicked(&self, control: &str) -> bool {
        self.events()
            .iter()
            .any(|e| matches!(e, ScriptedEvent::Clicked(name) if name == control))
    }

    /// Mutate an application's tree between steps.
    pub fn update_app(&self, name: &str, update: impl FnOnce(&mut ScriptedApp)) {
        if let Some(app) = self.lock().app_mut(name) {
            update(app);
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedDesktop> {
        // A panicking test hook must not poison later assertions.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lookup(&self, path: &AxPath) -> Result<UIElement, AutomationError> {
        let mut desktop = self.lock();
        let process = path.process_name().unwrap_or_default().to_string();
        let app = desktop
            .app_mut(&process)
            .filter(|a| a.running)
            .ok_or_else(|| {
                AutomationError::ElementNotFound(format!("Application '{process}' is not running"))
            })?;
        app.lookups += 1;
        match app.resolve(&path.segments()[1..]) {
            Some(_) => Ok(UIElement::new(Box::new(ScriptedElement {
                state: self.state.clone(),
                path: path.clone(),
            }))),
            None => Err(AutomationError::ElementNotFound(path.to_string())),
        }
    }
}

impl Default for ScriptedEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessibilityEngine for ScriptedEngine {
    #[instrument(skip(self))]
    fn activate_application(&self, app_name: &str) -> Result<(), AutomationError> {
        let mut desktop = self.lock();
        desktop
            .events
            .push(ScriptedEvent::Activated(app_name.to_string()));
        let app = desktop.app_mut(app_name).ok_or_else(|| {
            AutomationError::ElementNotFound(format!("Application '{app_name}' not found"))
        })?;
        if !app.running {
            if !app.launchable {
                return Err(AutomationError::PlatformError(format!(
                    "Application '{app_name}' could not be launched"
                )));
            }
            app.running = true;
            app.lookups = 0;
        }
        debug!("activated scripted app {app_name}");
        Ok(())
    }

    fn find_element(
        &self,
        selector: &Selector,
        root: Option<&UIElement>,
        timeout: Option<Duration>,
    ) -> Result<UIElement, AutomationError> {
        let base = root.map(|r| r.path().clone()).unwrap_or_default();
        let path = base.join(selector)?;
        if path.process_name().is_none() {
            return Err(AutomationError::InvalidSelector(format!(
                "{selector} must start from an application"
            )));
        }
        poll_lookup(timeout, self.lookup_interval, || self.lookup(&path))
    }
}

#[derive(Clone)]
pub struct ScriptedElement {
    state: Arc<Mutex<ScriptedDesktop>>,
    path: AxPath,
}

impl std::fmt::Debug for ScriptedElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedElement")
            .field("path", &self.path.to_string())
            .finish()
    }
}

impl ScriptedElement {
    fn with_node<T>(
        &self,
        read: impl FnOnce(&ScriptedNode) -> T,
    ) -> Result<T, AutomationError> {
        let mut desktop = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let detached = || AutomationError::ElementNotFound(format!("{} is gone", self.path));
        let app = desktop
            .app_mut(self.path.process_name().unwrap_or_default())
            .ok_or_else(detached)?;
        let indices = app.resolve(&self.path.segments()[1..]).ok_or_else(detached)?;
        let node = app.node(&indices).ok_or_else(detached)?;
        Ok(read(node))
    }
}

impl UIElementImpl for ScriptedElement {
    fn path(&self) -> &AxPath {
        &self.path
    }

    fn role(&self) -> String {
        self.with_node(|n| n.role.clone()).unwrap_or_default()
    }

    fn name(&self) -> Option<String> {
        self.with_node(|n| n.name.clone()).ok().flatten()
    }

    fn value(&self) -> Result<Option<String>, AutomationError> {
        self.with_node(|n| n.value.clone())
    }

    fn is_enabled(&self) -> Result<bool, AutomationError> {
        self.with_node(|n| n.enabled)
    }

    fn click(&self) -> Result<ClickResult, AutomationError> {
        let label = self
            .with_node(|n| n.name.clone().unwrap_or_else(|| n.role.clone()))?;

        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let desktop = &mut *guard;
        desktop.events.push(ScriptedEvent::Clicked(label.clone()));
        let process = self.path.process_name().unwrap_or_default();
        if let Some(app) = desktop.apps.iter_mut().find(|a| a.name == process) {
            for (_, hook) in desktop.hooks.iter().filter(|(name, _)| *name == label) {
                hook(&mut *app);
            }
        }

        Ok(ClickResult {
            method: "scripted".to_string(),
            details: self.path.to_string(),
        })
    }

    fn clone_box(&self) -> Box<dyn UIElementImpl> {
        Box::new(self.clone())
    }
}
