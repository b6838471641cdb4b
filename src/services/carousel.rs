// src/services/carousel.rs

//! Modal carousel over the current search matches.
//!
//! The navigator is a two-state machine, `Closed` or `Open(index)`. While
//! open it holds an [`InputSubscription`] on the host's input surface; the
//! subscription is released whenever the navigator leaves the open state,
//! whichever path it leaves by (explicit close, Escape, the match list
//! emptying, or the navigator being dropped).

use std::sync::Arc;

use crate::error::{AppError, Result};

/// Default minimum drag distance, in pixels, that counts as a swipe.
pub const DEFAULT_SWIPE_THRESHOLD_PX: f64 = 50.0;

/// Keys the carousel reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Escape,
    Other,
}

/// Raw input delivered by the host surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    TouchStart { x: f64 },
    TouchEnd { x: f64 },
}

/// Navigation applied in response to input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    Next,
    Prev,
    Close,
}

/// Kinds of listener the carousel installs on the host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    KeyDown,
    TouchStart,
    TouchEnd,
}

impl ListenerKind {
    pub const ALL: [ListenerKind; 3] = [
        ListenerKind::KeyDown,
        ListenerKind::TouchStart,
        ListenerKind::TouchEnd,
    ];
}

/// Handle for an attached listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// A process-wide input surface that listeners can be attached to.
pub trait InputSurface: Send + Sync {
    fn attach(&self, kind: ListenerKind) -> Result<ListenerId>;
    fn detach(&self, id: ListenerId);
}

/// Surface for hosts that feed input straight into
/// [`CarouselNavigator::handle_input`] and have nothing to attach.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirectInput;

impl InputSurface for DirectInput {
    fn attach(&self, _kind: ListenerKind) -> Result<ListenerId> {
        Ok(ListenerId(0))
    }

    fn detach(&self, _id: ListenerId) {}
}

/// Listeners attached for one open period. Detaches them on drop.
pub struct InputSubscription {
    surface: Arc<dyn InputSurface>,
    listeners: Vec<ListenerId>,
}

impl InputSubscription {
    /// Attach one listener of every kind.
    ///
    /// If any attach fails, the listeners attached so far are released.
    pub fn acquire(surface: Arc<dyn InputSurface>) -> Result<Self> {
        let mut subscription = Self {
            surface,
            listeners: Vec::with_capacity(ListenerKind::ALL.len()),
        };
        for kind in ListenerKind::ALL {
            let id = subscription.surface.attach(kind)?;
            subscription.listeners.push(id);
        }
        Ok(subscription)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl Drop for InputSubscription {
    fn drop(&mut self) {
        for id in self.listeners.drain(..).rev() {
            self.surface.detach(id);
        }
    }
}

/// Public view of the navigator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CarouselState {
    Closed,
    Open { index: usize },
}

struct OpenCarousel {
    index: usize,
    touch_start_x: Option<f64>,
    _subscription: InputSubscription,
}

/// Modal carousel navigator.
pub struct CarouselNavigator {
    surface: Arc<dyn InputSurface>,
    swipe_threshold: f64,
    open: Option<OpenCarousel>,
}

impl CarouselNavigator {
    pub fn new(surface: Arc<dyn InputSurface>) -> Self {
        Self {
            surface,
            swipe_threshold: DEFAULT_SWIPE_THRESHOLD_PX,
            open: None,
        }
    }

    pub fn with_swipe_threshold(mut self, threshold_px: f64) -> Self {
        self.swipe_threshold = threshold_px;
        self
    }

    pub fn state(&self) -> CarouselState {
        match &self.open {
            Some(open) => CarouselState::Open { index: open.index },
            None => CarouselState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Current index while open.
    pub fn index(&self) -> Option<usize> {
        self.open.as_ref().map(|open| open.index)
    }

    /// Open at `initial_index` within a list of `match_count` items.
    ///
    /// Opening while already open moves to the new index and keeps the
    /// existing listeners.
    pub fn open(&mut self, initial_index: usize, match_count: usize) -> Result<()> {
        if initial_index >= match_count {
            return Err(AppError::InvalidIndex {
                index: initial_index,
                len: match_count,
            });
        }

        if let Some(open) = self.open.as_mut() {
            open.index = initial_index;
            open.touch_start_x = None;
            return Ok(());
        }

        let subscription = InputSubscription::acquire(Arc::clone(&self.surface))?;
        log::debug!(
            "Carousel opened at {} of {} ({} listeners)",
            initial_index,
            match_count,
            subscription.listener_count()
        );
        self.open = Some(OpenCarousel {
            index: initial_index,
            touch_start_x: None,
            _subscription: subscription,
        });
        Ok(())
    }

    /// Close the carousel and release its listeners.
    pub fn close(&mut self) {
        if self.open.take().is_some() {
            log::debug!("Carousel closed");
        }
    }

    fn open_mut(&mut self, match_count: usize) -> Result<&mut OpenCarousel> {
        let open = self.open.as_mut().ok_or(AppError::NotOpen)?;
        if match_count == 0 {
            return Err(AppError::InvalidIndex {
                index: open.index,
                len: 0,
            });
        }
        Ok(open)
    }

    /// Step forward, wrapping to the first item.
    pub fn next(&mut self, match_count: usize) -> Result<usize> {
        let open = self.open_mut(match_count)?;
        open.index = (open.index % match_count + 1) % match_count;
        Ok(open.index)
    }

    /// Step back, wrapping to the last item.
    pub fn prev(&mut self, match_count: usize) -> Result<usize> {
        let open = self.open_mut(match_count)?;
        open.index = (open.index % match_count + match_count - 1) % match_count;
        Ok(open.index)
    }

    /// Re-check the open index against a list that may have changed.
    ///
    /// Closes when the list is empty and clamps an index past the end.
    pub fn sync_bounds(&mut self, match_count: usize) {
        if match_count == 0 {
            self.close();
            return;
        }
        if let Some(open) = self.open.as_mut() {
            if open.index >= match_count {
                open.index = match_count - 1;
            }
        }
    }

    /// Apply the key and swipe bindings. Input while closed is ignored.
    pub fn handle_input(&mut self, event: InputEvent, match_count: usize) -> Option<NavAction> {
        let open = self.open.as_mut()?;
        if match_count == 0 {
            self.close();
            return Some(NavAction::Close);
        }

        let action = match event {
            InputEvent::KeyDown(Key::ArrowLeft) => NavAction::Prev,
            InputEvent::KeyDown(Key::ArrowRight) => NavAction::Next,
            InputEvent::KeyDown(Key::Escape) => NavAction::Close,
            InputEvent::KeyDown(Key::Other) => return None,
            InputEvent::TouchStart { x } => {
                open.touch_start_x = Some(x);
                return None;
            }
            InputEvent::TouchEnd { x } => {
                let start = open.touch_start_x.take()?;
                let travel = start - x;
                if travel > self.swipe_threshold {
                    NavAction::Next
                } else if -travel > self.swipe_threshold {
                    NavAction::Prev
                } else {
                    return None;
                }
            }
        };

        match action {
            NavAction::Next => {
                self.next(match_count).ok()?;
            }
            NavAction::Prev => {
                self.prev(match_count).ok()?;
            }
            NavAction::Close => self.close(),
        }
        Some(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    /// Tracks attached listeners; can be told to refuse the n-th attach.
    #[derive(Default)]
    struct RecordingSurface {
        next_id: AtomicU64,
        attached: Mutex<HashMap<ListenerId, ListenerKind>>,
        total_attaches: AtomicUsize,
        refuse_attach: Option<usize>,
    }

    impl RecordingSurface {
        fn attached(&self) -> usize {
            self.attached.lock().unwrap().len()
        }

        fn total_attaches(&self) -> usize {
            self.total_attaches.load(Ordering::SeqCst)
        }
    }

    impl InputSurface for RecordingSurface {
        fn attach(&self, kind: ListenerKind) -> Result<ListenerId> {
            let n = self.total_attaches.fetch_add(1, Ordering::SeqCst);
            if self.refuse_attach == Some(n) {
                return Err(AppError::capability("input surface", "refused"));
            }
            let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
            self.attached.lock().unwrap().insert(id, kind);
            Ok(id)
        }

        fn detach(&self, id: ListenerId) {
            self.attached.lock().unwrap().remove(&id);
        }
    }

    fn navigator() -> (CarouselNavigator, Arc<RecordingSurface>) {
        let surface = Arc::new(RecordingSurface::default());
        (CarouselNavigator::new(surface.clone()), surface)
    }

    #[test]
    fn test_open_validates_index() {
        let (mut nav, surface) = navigator();
        assert!(matches!(
            nav.open(3, 3),
            Err(AppError::InvalidIndex { index: 3, len: 3 })
        ));
        assert!(matches!(nav.open(0, 0), Err(AppError::InvalidIndex { .. })));
        assert_eq!(nav.state(), CarouselState::Closed);
        assert_eq!(surface.attached(), 0);
    }

    #[test]
    fn test_next_wraps_around() {
        let (mut nav, _) = navigator();
        for start in 0..4 {
            nav.open(start, 4).unwrap();
            for _ in 0..4 {
                nav.next(4).unwrap();
            }
            assert_eq!(nav.index(), Some(start));
        }
        nav.open(3, 4).unwrap();
        assert_eq!(nav.next(4).unwrap(), 0);
    }

    #[test]
    fn test_prev_then_next_is_identity() {
        let (mut nav, _) = navigator();
        for start in 0..5 {
            nav.open(start, 5).unwrap();
            nav.prev(5).unwrap();
            nav.next(5).unwrap();
            assert_eq!(nav.index(), Some(start));
        }
        nav.open(0, 5).unwrap();
        assert_eq!(nav.prev(5).unwrap(), 4);
    }

    #[test]
    fn test_navigation_requires_open() {
        let (mut nav, _) = navigator();
        assert!(matches!(nav.next(3), Err(AppError::NotOpen)));
        assert!(matches!(nav.prev(3), Err(AppError::NotOpen)));
    }

    #[test]
    fn test_navigation_with_zero_matches_rejected() {
        let (mut nav, _) = navigator();
        nav.open(0, 2).unwrap();
        assert!(matches!(nav.next(0), Err(AppError::InvalidIndex { .. })));
        assert!(matches!(nav.prev(0), Err(AppError::InvalidIndex { .. })));
        assert_eq!(nav.index(), Some(0));
    }

    #[test]
    fn test_listeners_attached_once_per_open() {
        let (mut nav, surface) = navigator();

        nav.open(0, 3).unwrap();
        assert_eq!(surface.attached(), 3);

        // Re-targeting an open carousel does not stack listeners
        nav.open(2, 3).unwrap();
        assert_eq!(surface.attached(), 3);
        assert_eq!(surface.total_attaches(), 3);
        assert_eq!(nav.index(), Some(2));

        nav.close();
        assert_eq!(surface.attached(), 0);

        for _ in 0..5 {
            nav.open(1, 3).unwrap();
            assert_eq!(surface.attached(), 3);
            nav.close();
            assert_eq!(surface.attached(), 0);
        }
    }

    #[test]
    fn test_escape_closes_and_detaches() {
        let (mut nav, surface) = navigator();
        nav.open(1, 3).unwrap();

        let action = nav.handle_input(InputEvent::KeyDown(Key::Escape), 3);
        assert_eq!(action, Some(NavAction::Close));
        assert_eq!(nav.state(), CarouselState::Closed);
        assert_eq!(surface.attached(), 0);
    }

    #[test]
    fn test_arrow_keys() {
        let (mut nav, _) = navigator();
        nav.open(0, 3).unwrap();

        assert_eq!(
            nav.handle_input(InputEvent::KeyDown(Key::ArrowRight), 3),
            Some(NavAction::Next)
        );
        assert_eq!(nav.index(), Some(1));
        assert_eq!(
            nav.handle_input(InputEvent::KeyDown(Key::ArrowLeft), 3),
            Some(NavAction::Prev)
        );
        assert_eq!(nav.index(), Some(0));
        assert_eq!(nav.handle_input(InputEvent::KeyDown(Key::Other), 3), None);
    }

    #[test]
    fn test_input_ignored_while_closed() {
        let (mut nav, _) = navigator();
        assert_eq!(
            nav.handle_input(InputEvent::KeyDown(Key::ArrowRight), 3),
            None
        );
        assert_eq!(nav.state(), CarouselState::Closed);
    }

    #[test]
    fn test_swipe_threshold() {
        let (mut nav, _) = navigator();
        nav.open(1, 3).unwrap();

        // Leftward drag past the threshold moves forward
        nav.handle_input(InputEvent::TouchStart { x: 200.0 }, 3);
        assert_eq!(
            nav.handle_input(InputEvent::TouchEnd { x: 120.0 }, 3),
            Some(NavAction::Next)
        );
        assert_eq!(nav.index(), Some(2));

        // Rightward drag moves back
        nav.handle_input(InputEvent::TouchStart { x: 100.0 }, 3);
        assert_eq!(
            nav.handle_input(InputEvent::TouchEnd { x: 160.0 }, 3),
            Some(NavAction::Prev)
        );
        assert_eq!(nav.index(), Some(1));

        // Exactly the threshold is not enough
        nav.handle_input(InputEvent::TouchStart { x: 100.0 }, 3);
        assert_eq!(nav.handle_input(InputEvent::TouchEnd { x: 50.0 }, 3), None);
        assert_eq!(nav.index(), Some(1));

        // End without a start is ignored
        assert_eq!(nav.handle_input(InputEvent::TouchEnd { x: 0.0 }, 3), None);
    }

    #[test]
    fn test_custom_swipe_threshold() {
        let surface = Arc::new(RecordingSurface::default());
        let mut nav = CarouselNavigator::new(surface).with_swipe_threshold(10.0);
        nav.open(0, 2).unwrap();

        nav.handle_input(InputEvent::TouchStart { x: 30.0 }, 2);
        assert_eq!(
            nav.handle_input(InputEvent::TouchEnd { x: 15.0 }, 2),
            Some(NavAction::Next)
        );
    }

    #[test]
    fn test_input_with_empty_list_closes() {
        let (mut nav, surface) = navigator();
        nav.open(0, 2).unwrap();

        assert_eq!(
            nav.handle_input(InputEvent::KeyDown(Key::ArrowRight), 0),
            Some(NavAction::Close)
        );
        assert!(!nav.is_open());
        assert_eq!(surface.attached(), 0);
    }

    #[test]
    fn test_sync_bounds() {
        let (mut nav, surface) = navigator();
        nav.open(4, 5).unwrap();

        nav.sync_bounds(3);
        assert_eq!(nav.index(), Some(2));

        nav.sync_bounds(0);
        assert_eq!(nav.state(), CarouselState::Closed);
        assert_eq!(surface.attached(), 0);
    }

    #[test]
    fn test_drop_detaches() {
        let (mut nav, surface) = navigator();
        nav.open(0, 1).unwrap();
        assert_eq!(surface.attached(), 3);

        drop(nav);
        assert_eq!(surface.attached(), 0);
    }

    #[test]
    fn test_failed_attach_releases_partial_subscription() {
        let surface = Arc::new(RecordingSurface {
            refuse_attach: Some(2),
            ..RecordingSurface::default()
        });
        let mut nav = CarouselNavigator::new(surface.clone());

        assert!(nav.open(0, 3).is_err());
        assert!(!nav.is_open());
        assert_eq!(surface.attached(), 0);
    }
}
