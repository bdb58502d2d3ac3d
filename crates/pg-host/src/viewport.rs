//! Scrollable viewport with smooth-scroll animation.

use std::time::Duration;

pub const SMOOTH_SCROLL_DURATION: Duration = Duration::from_millis(360);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Instant,
    Smooth,
}

/// Programmatic scroll issued through `scroll_to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollRequest {
    pub target_y: f32,
    pub behavior: ScrollBehavior,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ScrollAnimation {
    from: f32,
    to: f32,
    elapsed: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    width: f32,
    height: f32,
    document_height: f32,
    scroll_y: f32,
    animation: Option<ScrollAnimation>,
    requests: Vec<ScrollRequest>,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            document_height: 0.0,
            scroll_y: 0.0,
            animation: None,
            requests: Vec::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn document_height(&self) -> f32 {
        self.document_height
    }

    /// Current vertical offset (`window.pageYOffset`).
    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    pub fn top(&self) -> f32 {
        self.scroll_y
    }

    pub fn bottom(&self) -> f32 {
        self.scroll_y + self.height
    }

    pub fn max_scroll(&self) -> f32 {
        (self.document_height - self.height).max(0.0)
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Every programmatic scroll request, oldest first.
    pub fn scroll_requests(&self) -> &[ScrollRequest] {
        &self.requests
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
        self.scroll_y = self.clamp(self.scroll_y);
    }

    pub fn set_document_height(&mut self, document_height: f32) {
        self.document_height = document_height.max(0.0);
        self.scroll_y = self.clamp(self.scroll_y);
        if let Some(animation) = self.animation.as_mut() {
            animation.to = animation.to.clamp(0.0, (self.document_height - self.height).max(0.0));
        }
    }

    fn clamp(&self, y: f32) -> f32 {
        if y.is_nan() {
            return self.scroll_y;
        }
        y.clamp(0.0, self.max_scroll())
    }

    /// User-driven scroll: cancels any running animation. Returns true if the offset moved.
    pub fn user_scroll_to(&mut self, y: f32) -> bool {
        self.animation = None;
        self.set_offset(y)
    }

    /// Programmatic scroll. Instant scrolls apply now; smooth ones advance in `tick`.
    pub fn scroll_to(&mut self, y: f32, behavior: ScrollBehavior) -> bool {
        let target = self.clamp(y);
        self.requests.push(ScrollRequest {
            target_y: target,
            behavior,
        });

        match behavior {
            ScrollBehavior::Instant => {
                self.animation = None;
                self.set_offset(target)
            }
            ScrollBehavior::Smooth => {
                self.animation = (target != self.scroll_y).then_some(ScrollAnimation {
                    from: self.scroll_y,
                    to: target,
                    elapsed: Duration::ZERO,
                });
                false
            }
        }
    }

    /// Advances a smooth scroll by `dt`. Returns true if the offset moved.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(mut animation) = self.animation else {
            return false;
        };

        animation.elapsed = animation.elapsed.saturating_add(dt);
        let progress = (animation.elapsed.as_secs_f32() / SMOOTH_SCROLL_DURATION.as_secs_f32())
            .clamp(0.0, 1.0);
        let eased = 1.0 - (1.0 - progress).powi(3);
        let next = animation.from + (animation.to - animation.from) * eased;

        self.animation = (progress < 1.0).then_some(animation);
        let target = if progress < 1.0 { next } else { animation.to };
        self.set_offset(target)
    }

    fn set_offset(&mut self, y: f32) -> bool {
        let next = self.clamp(y);
        if next == self.scroll_y {
            return false;
        }
        self.scroll_y = next;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::SMOOTH_SCROLL_DURATION;
    use super::ScrollBehavior;
    use super::Viewport;
    use std::time::Duration;

    fn viewport() -> Viewport {
        let mut viewport = Viewport::new(1024.0, 600.0);
        viewport.set_document_height(2400.0);
        viewport
    }

    #[test]
    fn offsets_are_clamped_to_the_document() {
        let mut viewport = viewport();
        assert!(viewport.user_scroll_to(5000.0));
        assert_eq!(viewport.scroll_y(), 1800.0);
        assert!(viewport.user_scroll_to(-10.0));
        assert_eq!(viewport.scroll_y(), 0.0);
        assert!(!viewport.user_scroll_to(0.0));
    }

    #[test]
    fn smooth_scroll_eases_to_the_target() {
        let mut viewport = viewport();
        assert!(!viewport.scroll_to(900.0, ScrollBehavior::Smooth));
        assert!(viewport.is_animating());

        assert!(viewport.tick(Duration::from_millis(16)));
        let early = viewport.scroll_y();
        assert!(early > 0.0 && early < 900.0);

        viewport.tick(SMOOTH_SCROLL_DURATION);
        assert_eq!(viewport.scroll_y(), 900.0);
        assert!(!viewport.is_animating());
        assert!(!viewport.tick(Duration::from_millis(16)));
    }

    #[test]
    fn user_scroll_cancels_animation() {
        let mut viewport = viewport();
        viewport.scroll_to(900.0, ScrollBehavior::Smooth);
        viewport.user_scroll_to(10.0);
        assert!(!viewport.is_animating());
        assert!(!viewport.tick(SMOOTH_SCROLL_DURATION));
        assert_eq!(viewport.scroll_y(), 10.0);
    }

    #[test]
    fn records_requests_with_clamped_targets() {
        let mut viewport = viewport();
        assert!(viewport.scroll_to(99_999.0, ScrollBehavior::Instant));
        assert_eq!(viewport.scroll_y(), 1800.0);
        let request = viewport.scroll_requests().last().copied();
        assert_eq!(request.map(|request| request.target_y), Some(1800.0));
        assert_eq!(request.map(|request| request.behavior), Some(ScrollBehavior::Instant));
    }
}
