//! Timeline reveal: containers get a one-way marker class once they are seen.

use crate::config::RevealConfig;
use pg_dom::NodeId;
use pg_host::IntersectionObserver;
use pg_host::ObserverOptions;
use pg_host::Page;

#[derive(Debug, Clone)]
pub struct TimelineReveal {
    containers: Vec<NodeId>,
    observer: IntersectionObserver,
    revealed_class: String,
}

impl TimelineReveal {
    pub fn install(containers: Vec<NodeId>, config: &RevealConfig, revealed_class: &str) -> Self {
        let mut observer = IntersectionObserver::new(ObserverOptions {
            threshold: config.threshold,
            root_margin: config.root_margin,
        });
        for container in &containers {
            observer.observe(*container);
        }
        Self {
            containers,
            observer,
            revealed_class: revealed_class.to_owned(),
        }
    }

    pub fn containers(&self) -> &[NodeId] {
        &self.containers
    }

    pub fn observed_count(&self) -> usize {
        self.observer.observed_count()
    }

    /// Applies the marker to every container that started intersecting. Returns how many were newly marked.
    pub fn deliver_intersections(&mut self, page: &mut Page) -> usize {
        let mut revealed = 0;
        for entry in self.observer.take_records(&page.document, &page.viewport) {
            if entry.is_intersecting && page.document.add_class(entry.target, &self.revealed_class) {
                revealed += 1;
            }
        }
        if revealed > 0 {
            tracing::debug!(revealed, "timeline entries revealed");
        }
        revealed
    }

    pub fn revealed(&self, page: &Page) -> Vec<NodeId> {
        self.containers
            .iter()
            .copied()
            .filter(|container| page.document.has_class(*container, &self.revealed_class))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::TimelineReveal;
    use crate::config::RevealConfig;
    use pg_css::query_selector_all;
    use pg_host::Page;
    use pg_host::PageOptions;

    const MARKUP: &str = r#"
        <style>.container { height: 400px; }</style>
        <div class="timeline"><div class="container" id="c1"></div><div class="container" id="c2"></div><div class="container" id="c3"></div></div>
    "#;

    fn fixture() -> (Page, TimelineReveal) {
        let options = PageOptions {
            viewport_height: 500.0,
            ..PageOptions::default()
        };
        let page = match Page::load(MARKUP, options) {
            Ok(page) => page,
            Err(error) => panic!("{error}"),
        };
        let containers = match query_selector_all(&page.document, ".container") {
            Ok(containers) => containers,
            Err(error) => panic!("{error}"),
        };
        let reveal = TimelineReveal::install(containers, &RevealConfig::default(), "show");
        (page, reveal)
    }

    #[test]
    fn reveals_containers_past_half_visibility() {
        let (mut page, mut reveal) = fixture();
        // c1 [0,400) fully visible, c2 [400,800) a quarter visible.
        assert_eq!(reveal.deliver_intersections(&mut page), 1);
        assert_eq!(reveal.revealed(&page).len(), 1);

        page.viewport.user_scroll_to(300.0);
        assert_eq!(reveal.deliver_intersections(&mut page), 1);
        assert_eq!(reveal.revealed(&page).len(), 2);
    }

    #[test]
    fn reveal_is_one_way_and_idempotent() {
        let (mut page, mut reveal) = fixture();
        reveal.deliver_intersections(&mut page);
        for offset in [300.0, page.viewport.max_scroll(), 0.0] {
            page.viewport.user_scroll_to(offset);
            reveal.deliver_intersections(&mut page);
        }
        let after_round_trip = page.document.revision();
        page.viewport.user_scroll_to(page.viewport.max_scroll());
        assert_eq!(reveal.deliver_intersections(&mut page), 0);

        assert_eq!(reveal.revealed(&page).len(), 3);
        assert_eq!(reveal.observed_count(), 3);
        assert_eq!(page.document.revision(), after_round_trip);
    }
}
