use serde::{Deserialize, Serialize};

/// Markup shown when a tab has no figure.
pub const FALLBACK_HTML: &str = "<p>Information non disponible</p>";

/// What the figure area shows for one tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Figure {
    Bomb {
        image: String,
        alt: String,
        name: String,
    },
    Comparison {
        image: String,
        alt: String,
    },
}

impl Figure {
    pub fn image(&self) -> &str {
        match self {
            Figure::Bomb { image, .. } | Figure::Comparison { image, .. } => image,
        }
    }

    pub fn to_html(&self) -> String {
        match self {
            Figure::Bomb { image, alt, name } => format!(
                "<div class=\"bomb-container animate-bomb\">\
                 <img src=\"{}\" alt=\"{}\">\
                 <div class=\"bomb-title\"><span class=\"bomb-name\">{}</span></div>\
                 </div>",
                escape_attr(image),
                escape_attr(alt),
                escape_text(name)
            ),
            Figure::Comparison { image, alt } => format!(
                "<div class=\"bombs-comparison animate-bomb\">\
                 <img src=\"{}\" alt=\"{}\" style=\"max-width: 100%; max-height: 400px;\">\
                 </div>",
                escape_attr(image),
                escape_attr(alt)
            ),
        }
    }
}

/// A tab button's `data-target` and the figure it selects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfographicTab {
    pub target: String,
    pub figure: Figure,
}

/// Tracks the active tab; exactly one tab is active once any is selected.
#[derive(Debug, Clone)]
pub struct TabSwitcher {
    tabs: Vec<InfographicTab>,
    active: Option<String>,
}

impl TabSwitcher {
    pub fn new(tabs: Vec<InfographicTab>) -> Self {
        Self { tabs, active: None }
    }

    pub fn tabs(&self) -> &[InfographicTab] {
        &self.tabs
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// The first configured tab, shown before any click.
    pub fn default_target(&self) -> Option<&str> {
        self.tabs.first().map(|t| t.target.as_str())
    }

    /// Activates `target` and returns the markup for the figure area.
    /// Unknown targets still become active and render the fallback.
    pub fn select(&mut self, target: &str) -> String {
        self.active = Some(target.to_string());
        self.html_for(target)
    }

    pub fn html_for(&self, target: &str) -> String {
        self.tabs
            .iter()
            .find(|t| t.target == target)
            .map(|t| t.figure.to_html())
            .unwrap_or_else(|| FALLBACK_HTML.to_string())
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::{FALLBACK_HTML, Figure, TabSwitcher};
    use crate::config::StoryConfig;
    use pretty_assertions::assert_eq;

    #[test]
    fn bomb_markup_carries_name_and_image() {
        let html = Figure::Bomb {
            image: "a.png".into(),
            alt: "Little \"Boy\"".into(),
            name: "Little Boy".into(),
        }
        .to_html();
        assert!(html.contains("src=\"a.png\""));
        assert!(html.contains("alt=\"Little &quot;Boy&quot;\""));
        assert!(html.contains("<span class=\"bomb-name\">Little Boy</span>"));
    }

    #[test]
    fn switching_tabs_and_fallback() {
        let mut tabs = TabSwitcher::new(StoryConfig::builtin().infographic);
        assert_eq!(tabs.default_target(), Some("tab-hiroshima"));
        assert!(tabs.select("tab-nagasaki").contains("fatman_nagasaki.png"));
        assert_eq!(tabs.active(), Some("tab-nagasaki"));
        assert!(tabs.select("tab-comparison").contains("bombs-comparison"));
        assert_eq!(tabs.select("tab-missing"), FALLBACK_HTML);
        assert_eq!(tabs.active(), Some("tab-missing"));
    }

    #[test]
    fn figure_json_shape() {
        let json = r#"{"target":"t","figure":{"kind":"comparison","image":"x.png","alt":"x"}}"#;
        let tab: super::InfographicTab = serde_json::from_str(json).unwrap();
        assert_eq!(tab.figure.image(), "x.png");
    }
}
