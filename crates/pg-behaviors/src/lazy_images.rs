//! Lazy image loading: native hand-off or a visibility-triggered fallback.

use pg_css::SelectorList;
use pg_dom::Document;
use pg_dom::NodeId;
use pg_host::IntersectionObserver;
use pg_host::ObserverOptions;
use pg_host::Page;

#[derive(Debug, Clone)]
pub struct LazyImageLoader {
    images: Vec<NodeId>,
    fallback: Option<IntersectionObserver>,
}

impl LazyImageLoader {
    /// Selects the lazy images and applies whichever loading path the host supports.
    ///
    /// Returns the loader and the number of sources assigned immediately.
    pub fn install(page: &mut Page, selector: &SelectorList) -> (Self, usize) {
        let images = selector.select_all(&page.document);

        if page.capabilities.native_lazy_loading {
            let assigned = images
                .iter()
                .filter(|image| assign_source(&mut page.document, **image))
                .count();
            tracing::debug!(images = images.len(), assigned, "native lazy loading");
            return (
                Self {
                    images,
                    fallback: None,
                },
                assigned,
            );
        }

        let mut observer = IntersectionObserver::new(ObserverOptions::default());
        for image in &images {
            observer.observe(*image);
        }
        tracing::debug!(images = images.len(), "lazy loading through visibility observer");
        (
            Self {
                images,
                fallback: Some(observer),
            },
            0,
        )
    }

    pub fn images(&self) -> &[NodeId] {
        &self.images
    }

    pub fn uses_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Images the fallback observer is still waiting on.
    pub fn pending(&self) -> usize {
        self.fallback
            .as_ref()
            .map(IntersectionObserver::observed_count)
            .unwrap_or(0)
    }

    /// Loads every image that became visible and stops watching it.
    pub fn deliver_intersections(&mut self, page: &mut Page) -> usize {
        let Some(observer) = self.fallback.as_mut() else {
            return 0;
        };

        let mut assigned = 0;
        for entry in observer.take_records(&page.document, &page.viewport) {
            if !entry.is_intersecting {
                continue;
            }
            if assign_source(&mut page.document, entry.target) {
                assigned += 1;
            }
            observer.unobserve(entry.target);
        }
        assigned
    }
}

/// Copies `data-src` into `src`. A missing deferred source leaves the image untouched.
fn assign_source(document: &mut Document, image: NodeId) -> bool {
    let Some(source) = document.dataset(image, "src").map(str::to_owned) else {
        tracing::debug!(image = image.index(), "lazy image has no data-src");
        return false;
    };
    document.set_attribute(image, "src", source);
    true
}
