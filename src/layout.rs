//! Layout shell: wraps page content in header and footer chrome.
//!
//! Chrome is shown or hidden as a unit, driven by the store's
//! `header_visible` flag. With chrome, content is indented to sit inside the
//! header's frame; without it, content is emitted as-is.

use crate::store::UiState;
use chrono::Datelike;
use std::fmt;

pub const PRODUCT_NAME: &str = "SubCruncher";
const RULE_WIDTH: usize = 60;
const CONTENT_INDENT: &str = "  ";

/// A fully composed screen, ready to print.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Screen {
    pub header: Option<Vec<String>>,
    pub content: Vec<String>,
    pub footer: Option<Vec<String>>,
}

impl Screen {
    pub fn has_chrome(&self) -> bool {
        self.header.is_some()
    }

    /// All lines in display order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.header
            .iter()
            .flatten()
            .chain(self.content.iter())
            .chain(self.footer.iter().flatten())
            .map(String::as_str)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

pub struct Layout;

impl Layout {
    /// Compose `content` according to the current UI state.
    pub fn compose<I, L>(state: &UiState, content: I) -> Screen
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        let content: Vec<String> = content.into_iter().map(Into::into).collect();

        if !state.layout.header_visible {
            return Screen {
                header: None,
                content,
                footer: None,
            };
        }

        Screen {
            header: Some(header(state)),
            content: content
                .into_iter()
                .map(|line| {
                    if line.is_empty() {
                        line
                    } else {
                        format!("{CONTENT_INDENT}{line}")
                    }
                })
                .collect(),
            footer: Some(footer()),
        }
    }
}

fn header(state: &UiState) -> Vec<String> {
    let who = state
        .user
        .as_ref()
        .map(|u| u.name.clone().unwrap_or_else(|| u.email.clone()))
        .unwrap_or_else(|| "not signed in".to_string());
    let title = format!("{PRODUCT_NAME} · Document Converter");
    let pad = RULE_WIDTH.saturating_sub(title.chars().count() + who.chars().count());
    vec![
        "═".repeat(RULE_WIDTH),
        format!("{title}{}{who}", " ".repeat(pad)),
        "═".repeat(RULE_WIDTH),
    ]
}

fn footer() -> Vec<String> {
    footer_for_year(chrono::Local::now().year())
}

fn footer_for_year(year: i32) -> Vec<String> {
    vec![
        "─".repeat(RULE_WIDTH),
        format!("© {year} Legal Document Converter. All rights reserved."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{reduce, Action, SessionToken, User};

    #[test]
    fn hidden_chrome_passes_content_through() {
        let screen = Layout::compose(&UiState::default(), ["Sign in", ""]);
        assert!(!screen.has_chrome());
        assert_eq!(screen.lines().collect::<Vec<_>>(), vec!["Sign in", ""]);
    }

    #[test]
    fn visible_chrome_wraps_content() {
        let state = reduce(&UiState::default(), &Action::ShowHeader);
        let state = reduce(
            &state,
            &Action::SetUser(User::new("a@b.c"), Some(SessionToken::new("t"))),
        );
        let screen = Layout::compose(&state, ["Dashboard"]);
        assert!(screen.has_chrome());

        let text = screen.to_string();
        assert!(text.contains(PRODUCT_NAME));
        assert!(text.contains("a@b.c"));
        assert!(text.contains("  Dashboard"));
        assert!(text.trim_end().ends_with("All rights reserved."));
        let year = chrono::Local::now().year().to_string();
        assert!(text.contains(&year));
    }

    #[test]
    fn footer_carries_year_and_product_line() {
        let lines = footer_for_year(2031);
        assert_eq!(
            lines.last().map(String::as_str),
            Some("© 2031 Legal Document Converter. All rights reserved.")
        );
    }
}
