//! Session history with fragment replacement.

use pg_core::PageError;
use pg_core::PageResult;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct History {
    entries: Vec<Url>,
    index: usize,
}

impl History {
    pub fn new(url: Url) -> Self {
        Self {
            entries: vec![url],
            index: 0,
        }
    }

    pub fn parse(url: &str) -> PageResult<Self> {
        let parsed = Url::parse(url).map_err(|error| PageError::InvalidUrl {
            url: url.to_owned(),
            reason: error.to_string(),
        })?;
        Ok(Self::new(parsed))
    }

    pub fn current(&self) -> &Url {
        &self.entries[self.index]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fragment of the current entry, without the leading `#`.
    pub fn fragment(&self) -> Option<&str> {
        self.current().fragment()
    }

    /// Appends an entry resolved against the current one (`history.pushState`).
    ///
    /// Forward entries are discarded.
    pub fn push_state(&mut self, url: &str) -> PageResult<()> {
        let next = self.current().join(url).map_err(|error| PageError::InvalidUrl {
            url: url.to_owned(),
            reason: error.to_string(),
        })?;
        self.entries.truncate(self.index + 1);
        self.entries.push(next);
        self.index = self.entries.len() - 1;
        Ok(())
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Rewrites the current entry's fragment in place (`history.replaceState`).
    ///
    /// An empty fragment removes it. No navigation and no new entry.
    pub fn replace_fragment(&mut self, fragment: &str) {
        let mut next = self.current().clone();
        next.set_fragment((!fragment.is_empty()).then_some(fragment));
        self.entries[self.index] = next;
    }
}

#[cfg(test)]
mod tests {
    use super::History;

    fn history(url: &str) -> History {
        match History::parse(url) {
            Ok(history) => history,
            Err(error) => panic!("{error}"),
        }
    }

    #[test]
    fn replace_fragment_keeps_a_single_entry() {
        let mut history = history("https://folio.example/index.html");
        history.replace_fragment("contact");
        history.replace_fragment("about");
        assert_eq!(history.len(), 1);
        assert_eq!(history.fragment(), Some("about"));
        assert_eq!(
            history.current().as_str(),
            "https://folio.example/index.html#about"
        );
    }

    #[test]
    fn empty_fragment_is_cleared() {
        let mut history = history("https://folio.example/#top");
        history.replace_fragment("");
        assert_eq!(history.fragment(), None);
    }

    #[test]
    fn push_state_resolves_against_the_current_entry() {
        let mut history = history("https://folio.example/work/index.html");
        for url in ["#skills", "../about.html"] {
            if let Err(error) = history.push_state(url) {
                panic!("{error}");
            }
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        assert_eq!(history.current().as_str(), "https://folio.example/about.html");

        history.replace_fragment("team");
        assert_eq!(history.len(), 3);
        assert_eq!(history.fragment(), Some("team"));
    }

    #[test]
    fn rejects_relative_urls() {
        let error = History::parse("/index.html").err();
        assert_eq!(error.map(|error| error.code()), Some("host.invalid_url"));
    }
}
