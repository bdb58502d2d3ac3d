//! Behavior configuration (TOML).

use pg_core::PageError;
use pg_core::PageResult;
use pg_css::SelectorList;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectorConfig {
    pub lazy_images: String,
    pub header: String,
    pub navbar: String,
    pub anchors: String,
    pub sections: String,
    pub nav_links: String,
    pub containers: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            lazy_images: r#"img[loading="lazy"]"#.to_owned(),
            header: ".header".to_owned(),
            navbar: ".navbar".to_owned(),
            anchors: r##"a[href^="#"]"##.to_owned(),
            sections: "section[id]".to_owned(),
            nav_links: ".navbar a".to_owned(),
            containers: ".container".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassConfig {
    pub nav_open: String,
    pub scroll_up: String,
    pub scroll_down: String,
    pub active_link: String,
    pub revealed: String,
}

impl Default for ClassConfig {
    fn default() -> Self {
        Self {
            nav_open: "active".to_owned(),
            scroll_up: "scroll-up".to_owned(),
            scroll_down: "scroll-down".to_owned(),
            active_link: "Active".to_owned(),
            revealed: "show".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToggleConfig {
    pub class: String,
    pub label: String,
    pub closed_glyph: String,
    pub open_glyph: String,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self {
            class: "menu-btn".to_owned(),
            label: "Toggle navigation menu".to_owned(),
            closed_glyph: "\u{2630}".to_owned(),
            open_glyph: "\u{2715}".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScrollSpyConfig {
    /// Pixels before a section's top at which it becomes current.
    pub pre_roll: f32,
}

impl Default for ScrollSpyConfig {
    fn default() -> Self {
        Self { pre_roll: 100.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevealConfig {
    pub threshold: f32,
    pub root_margin: f32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            root_margin: 0.0,
        }
    }
}

/// Everything the six page behaviors read from the outside.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BehaviorConfig {
    pub selectors: SelectorConfig,
    pub classes: ClassConfig,
    pub toggle: ToggleConfig,
    pub scroll_spy: ScrollSpyConfig,
    pub reveal: RevealConfig,
}

impl BehaviorConfig {
    pub fn from_toml_str(source: &str) -> PageResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|error| PageError::ConfigParse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> PageResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|error| PageError::ConfigRead {
            path: path.display().to_string(),
            reason: error.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> PageResult<()> {
        let selectors = [
            ("selectors.lazy_images", &self.selectors.lazy_images),
            ("selectors.header", &self.selectors.header),
            ("selectors.navbar", &self.selectors.navbar),
            ("selectors.anchors", &self.selectors.anchors),
            ("selectors.sections", &self.selectors.sections),
            ("selectors.nav_links", &self.selectors.nav_links),
            ("selectors.containers", &self.selectors.containers),
        ];
        for (key, selector) in selectors {
            SelectorList::parse(selector).map_err(|error| PageError::ConfigValue {
                key,
                reason: error.to_string(),
            })?;
        }

        let classes = [
            ("classes.nav_open", &self.classes.nav_open),
            ("classes.scroll_up", &self.classes.scroll_up),
            ("classes.scroll_down", &self.classes.scroll_down),
            ("classes.active_link", &self.classes.active_link),
            ("classes.revealed", &self.classes.revealed),
            ("toggle.class", &self.toggle.class),
        ];
        for (key, class) in classes {
            if class.is_empty() || class.chars().any(char::is_whitespace) {
                return Err(PageError::ConfigValue {
                    key,
                    reason: format!("`{class}` is not a single class name"),
                });
            }
        }
        if self.classes.scroll_up == self.classes.scroll_down {
            return Err(PageError::ConfigValue {
                key: "classes.scroll_up",
                reason: "scroll-up and scroll-down classes must differ".to_owned(),
            });
        }

        if !(0.0..=1.0).contains(&self.reveal.threshold) {
            return Err(PageError::ConfigValue {
                key: "reveal.threshold",
                reason: format!("{} is outside 0.0..=1.0", self.reveal.threshold),
            });
        }
        let offsets = [
            ("scroll_spy.pre_roll", self.scroll_spy.pre_roll),
            ("reveal.root_margin", self.reveal.root_margin),
        ];
        for (key, offset) in offsets {
            if !offset.is_finite() {
                return Err(PageError::ConfigValue {
                    key,
                    reason: format!("{offset} is not a finite offset"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::BehaviorConfig;
    use pg_core::PageError;
    use std::io::Write;

    #[test]
    fn defaults_match_the_page_contract() {
        let config = BehaviorConfig::default();
        assert_eq!(config.selectors.anchors, r##"a[href^="#"]"##);
        assert_eq!(config.classes.active_link, "Active");
        assert_eq!(config.toggle.closed_glyph, "☰");
        assert_eq!(config.toggle.open_glyph, "✕");
        assert_eq!(config.scroll_spy.pre_roll, 100.0);
        assert_eq!(config.reveal.threshold, 0.5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = match BehaviorConfig::from_toml_str(
            r##"
            [selectors]
            header = "#site-header"

            [scroll_spy]
            pre_roll = 64.0
            "##,
        ) {
            Ok(config) => config,
            Err(error) => panic!("{error}"),
        };
        assert_eq!(config.selectors.header, "#site-header");
        assert_eq!(config.selectors.navbar, ".navbar");
        assert_eq!(config.scroll_spy.pre_roll, 64.0);
    }

    #[test]
    fn non_finite_offsets_name_their_own_key() {
        let mut config = BehaviorConfig::default();
        config.reveal.root_margin = f32::NAN;
        match config.validate() {
            Err(PageError::ConfigValue { key, .. }) => assert_eq!(key, "reveal.root_margin"),
            other => panic!("unexpected {other:?}"),
        }

        let mut config = BehaviorConfig::default();
        config.scroll_spy.pre_roll = f32::INFINITY;
        match config.validate() {
            Err(PageError::ConfigValue { key, .. }) => assert_eq!(key, "scroll_spy.pre_roll"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        let unknown = BehaviorConfig::from_toml_str("[classes]\nopen = \"x\"");
        assert_eq!(unknown.err().map(|error| error.code()), Some("config.parse_failed"));

        let selector = BehaviorConfig::from_toml_str("[selectors]\nheader = \"header:first\"");
        assert_eq!(selector.err().map(|error| error.code()), Some("config.invalid_value"));

        let threshold = BehaviorConfig::from_toml_str("[reveal]\nthreshold = 1.5");
        assert_eq!(threshold.err().map(|error| error.code()), Some("config.invalid_value"));

        let class = BehaviorConfig::from_toml_str("[classes]\nrevealed = \"is shown\"");
        assert_eq!(class.err().map(|error| error.code()), Some("config.invalid_value"));
    }

    #[test]
    fn loads_from_file() {
        let mut file = match tempfile::NamedTempFile::new() {
            Ok(file) => file,
            Err(error) => panic!("{error}"),
        };
        if let Err(error) = writeln!(file, "[toggle]\nlabel = \"Menu\"") {
            panic!("{error}");
        }

        match BehaviorConfig::load(file.path()) {
            Ok(config) => assert_eq!(config.toggle.label, "Menu"),
            Err(error) => panic!("{error}"),
        }
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let missing = BehaviorConfig::load("/nonexistent/pageglow.toml");
        assert_eq!(missing.err().map(|error| error.code()), Some("config.read_failed"));
    }
}
