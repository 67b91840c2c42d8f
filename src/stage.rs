//! Abstracted visual stage for the front end.
//!
//! A retained element tree standing in for the document the state machines
//! mutate: elements addressable by stable identifiers, ordered style-class
//! lists, attach/detach, click bindings that re-dispatch UI events, and
//! transition animations whose start/end signals are delivered back through
//! the host loop. Every mutating call that actually changes something bumps a
//! revision counter, so tests can assert that a no-op transition touched
//! nothing.
//!
//! All operations are tolerant of missing elements: they log and return
//! rather than panic, since transition functions must never fail.

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;

// ---------------------------------------------------------------------------
// Element identifiers
// ---------------------------------------------------------------------------

/// Root of the element tree; everything reachable from it is visible.
pub const BODY: &str = "body";

pub const RUN_BUTTON: &str = "run";
pub const STOP_BUTTON: &str = "stop";
pub const RUN_ICON: &str = "run-icon";
pub const CONTAINER: &str = "container";
pub const OUTPUT_PANEL: &str = "output";
pub const OUTPUT_TITLEBAR: &str = "output-titlebar";
pub const QUIT_BUTTON: &str = "quit";
pub const QUIT_ICON: &str = "quit-icon";
pub const SHRINK_BUTTON: &str = "shrink";
pub const SHRINK_ICON: &str = "shrink-icon";

// ---------------------------------------------------------------------------
// Style classes and animation names
// ---------------------------------------------------------------------------

pub const CLASS_ICON_PLAY: &str = "icon-play";
pub const CLASS_ICON_PAUSE: &str = "icon-pause";
pub const CLASS_ICON_MINIMIZE: &str = "icon-minimize";
pub const CLASS_ICON_RESTORE: &str = "icon-restore";
pub const CLASS_ICON_QUIT: &str = "icon-quit";
pub const CLASS_OUTPUT_BUTTONS: &str = "output-buttons";

pub const CLASS_CONTAINER_MAX: &str = "container-max-dims";
pub const CLASS_CONTAINER_MIN: &str = "container-min-dims";
pub const CLASS_CONTAINER_TRAN: &str = "container-tran-dims";
pub const CLASS_OUTPUT_MAX: &str = "output-max-dims";
pub const CLASS_OUTPUT_MIN: &str = "output-min-dims";

pub const ANIM_SHRINK: &str = "container-shrink";
pub const ANIM_EXPAND: &str = "container-expand";
pub const ANIM_TRAN_SHRINK: &str = "container-tran-shrink";
pub const ANIM_TRAN_EXPAND: &str = "container-tran-expand";
pub const ANIM_TRAN_MAX_EXPAND: &str = "container-tran-max-expand";

/// Duration of every layout transition animation.
pub const TRANSITION: Duration = Duration::from_millis(300);

// ---------------------------------------------------------------------------
// UI events
// ---------------------------------------------------------------------------

/// A user-originated event, either from the main-window buttons or from the
/// output panel's own controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Run,
    Stop,
    Shrink,
    Quit,
}

// ---------------------------------------------------------------------------
// Animations
// ---------------------------------------------------------------------------

/// A named, timed visual effect on one element. The host delivers a start
/// signal when it begins and an end signal when the duration elapses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Animation {
    pub name: String,
    pub duration: Duration,
    pub easing: &'static str,
}

impl Animation {
    /// The standard 300 ms ease-out layout transition.
    pub fn transition(name: &str) -> Self {
        Self {
            name: name.to_string(),
            duration: TRANSITION,
            easing: "ease-out",
        }
    }
}

/// An animation set on an element, waiting for the host to run it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationRequest {
    pub element: String,
    pub animation: Animation,
}

// ---------------------------------------------------------------------------
// Elements and the stage
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Element {
    classes: Vec<String>,
    parent: Option<String>,
    click: Option<UiEvent>,
    animation: Option<Animation>,
    observe_animations: bool,
}

/// The retained element tree plus the queue of animations the host has not
/// started yet.
pub struct Stage {
    elements: HashMap<String, Element>,
    animation_requests: Vec<AnimationRequest>,
    revision: u64,
}

pub type SharedStage = std::sync::Arc<std::sync::Mutex<Stage>>;

impl Stage {
    /// Build the main-window chrome: run/stop buttons, the run icon and the
    /// editor container. The output panel's chrome is constructed lazily by
    /// the window machine on the first `run`.
    pub fn new() -> Self {
        let mut stage = Self {
            elements: HashMap::new(),
            animation_requests: Vec::new(),
            revision: 0,
        };
        stage.create(BODY);
        stage.create(CONTAINER);
        stage.create(RUN_BUTTON);
        stage.create(STOP_BUTTON);
        stage.create(RUN_ICON);
        stage.append(BODY, CONTAINER);
        stage.append(BODY, RUN_BUTTON);
        stage.append(BODY, STOP_BUTTON);
        stage.append(RUN_BUTTON, RUN_ICON);
        stage.add_class(CONTAINER, CLASS_CONTAINER_MAX);
        stage.add_class(RUN_ICON, CLASS_ICON_PLAY);
        stage.revision = 0;
        stage
    }

    /// Create (or re-create, fresh) an element.
    pub fn create(&mut self, id: &str) {
        self.elements.insert(id.to_string(), Element::default());
        self.revision += 1;
    }

    pub fn exists(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    // -- style classes ------------------------------------------------------

    pub fn add_class(&mut self, id: &str, class: &str) {
        let Some(el) = self.element_mut(id) else { return };
        if !el.classes.iter().any(|c| c == class) {
            el.classes.push(class.to_string());
            self.revision += 1;
        }
    }

    pub fn remove_class(&mut self, id: &str, class: &str) {
        let Some(el) = self.element_mut(id) else { return };
        let before = el.classes.len();
        el.classes.retain(|c| c != class);
        if el.classes.len() != before {
            self.revision += 1;
        }
    }

    /// Swap `from` for `to` in place. Returns `false` (and changes nothing)
    /// when `from` is not present.
    pub fn replace_class(&mut self, id: &str, from: &str, to: &str) -> bool {
        let Some(el) = self.element_mut(id) else { return false };
        match el.classes.iter().position(|c| c == from) {
            Some(index) => {
                el.classes[index] = to.to_string();
                self.revision += 1;
                true
            }
            None => false,
        }
    }

    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.elements
            .get(id)
            .map(|el| el.classes.iter().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn classes(&self, id: &str) -> Vec<String> {
        self.elements
            .get(id)
            .map(|el| el.classes.clone())
            .unwrap_or_default()
    }

    // -- tree ---------------------------------------------------------------

    pub fn append(&mut self, parent: &str, child: &str) {
        if !self.exists(parent) {
            warn!(target: "stage", parent, child, "append: no such parent");
            return;
        }
        let Some(el) = self.element_mut(child) else { return };
        el.parent = Some(parent.to_string());
        self.revision += 1;
    }

    pub fn detach(&mut self, parent: &str, child: &str) {
        let Some(el) = self.element_mut(child) else { return };
        if el.parent.as_deref() == Some(parent) {
            el.parent = None;
            self.revision += 1;
        } else {
            warn!(target: "stage", parent, child, "detach: not a child of that parent");
        }
    }

    /// Whether the element is reachable from the body root.
    pub fn is_attached(&self, id: &str) -> bool {
        let mut current = id;
        // parent chains are tiny; the cap only guards against a miswired cycle
        for _ in 0..32 {
            if current == BODY {
                return true;
            }
            match self.elements.get(current).and_then(|el| el.parent.as_deref()) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    // -- click bindings -----------------------------------------------------

    /// Declare that a click on `id` re-dispatches `event` into the machines.
    pub fn bind_click(&mut self, id: &str, event: UiEvent) {
        let Some(el) = self.element_mut(id) else { return };
        el.click = Some(event);
    }

    pub fn click_target(&self, id: &str) -> Option<UiEvent> {
        self.elements.get(id).and_then(|el| el.click)
    }

    // -- animations ---------------------------------------------------------

    /// Set a transition animation on an element and queue it for the host.
    pub fn play_animation(&mut self, id: &str, animation: Animation) {
        let Some(el) = self.element_mut(id) else { return };
        el.animation = Some(animation.clone());
        self.animation_requests.push(AnimationRequest {
            element: id.to_string(),
            animation,
        });
        self.revision += 1;
    }

    /// Drain the animations queued since the last call, in trigger order.
    pub fn take_animation_requests(&mut self) -> Vec<AnimationRequest> {
        std::mem::take(&mut self.animation_requests)
    }

    pub fn animation(&self, id: &str) -> Option<Animation> {
        self.elements.get(id).and_then(|el| el.animation.clone())
    }

    /// Subscribe the element to animation lifecycle signals.
    pub fn observe_animations(&mut self, id: &str) {
        let Some(el) = self.element_mut(id) else { return };
        el.observe_animations = true;
    }

    pub fn observes_animations(&self, id: &str) -> bool {
        self.elements
            .get(id)
            .map(|el| el.observe_animations)
            .unwrap_or(false)
    }

    // -- change tracking ----------------------------------------------------

    /// Monotonic counter of visual mutations. Unchanged across no-ops.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        let el = self.elements.get_mut(id);
        if el.is_none() {
            warn!(target: "stage", id, "no such element");
        }
        el
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_stage_has_main_chrome() {
        let stage = Stage::new();
        assert!(stage.is_attached(CONTAINER));
        assert!(stage.is_attached(RUN_ICON));
        assert!(stage.has_class(CONTAINER, CLASS_CONTAINER_MAX));
        assert!(stage.has_class(RUN_ICON, CLASS_ICON_PLAY));
        assert!(!stage.exists(OUTPUT_PANEL));
    }

    #[test]
    fn replace_class_requires_the_old_class() {
        let mut stage = Stage::new();
        assert!(stage.replace_class(RUN_ICON, CLASS_ICON_PLAY, CLASS_ICON_PAUSE));
        assert!(!stage.replace_class(RUN_ICON, CLASS_ICON_PLAY, CLASS_ICON_PAUSE));
        assert!(stage.has_class(RUN_ICON, CLASS_ICON_PAUSE));
        assert!(!stage.has_class(RUN_ICON, CLASS_ICON_PLAY));
    }

    #[test]
    fn revision_unchanged_by_reads_and_noop_mutations() {
        let mut stage = Stage::new();
        let before = stage.revision();
        let _ = stage.has_class(CONTAINER, CLASS_CONTAINER_MAX);
        stage.remove_class(CONTAINER, "never-added");
        let _ = stage.replace_class(CONTAINER, "never-added", "other");
        assert_eq!(stage.revision(), before);
    }

    #[test]
    fn detach_makes_subtree_unreachable() {
        let mut stage = Stage::new();
        stage.create(OUTPUT_TITLEBAR);
        stage.create(QUIT_BUTTON);
        stage.append(OUTPUT_TITLEBAR, QUIT_BUTTON);
        stage.append(BODY, OUTPUT_TITLEBAR);
        assert!(stage.is_attached(QUIT_BUTTON));
        stage.detach(BODY, OUTPUT_TITLEBAR);
        assert!(!stage.is_attached(QUIT_BUTTON));
    }

    #[test]
    fn play_animation_queues_a_request() {
        let mut stage = Stage::new();
        stage.play_animation(CONTAINER, Animation::transition(ANIM_SHRINK));
        let requests = stage.take_animation_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].element, CONTAINER);
        assert_eq!(requests[0].animation.name, ANIM_SHRINK);
        assert_eq!(requests[0].animation.duration, TRANSITION);
        assert!(stage.take_animation_requests().is_empty());
    }
}
