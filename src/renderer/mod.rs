//! Markdown renderer module
//!
//! Generates release notes in Markdown format.
//! Groups pull requests into sections (by label) and categories (by prefixed label).

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::config::Config;
use crate::models::labels::{compare_ignore_case, fold};
use crate::models::{LabelMap, PullRequestDto};
use crate::providers::PullRequestProvider;

/// Characters escaped in text taken from pull requests and configuration
const MARKDOWN_SPECIAL_CHARACTERS: &str = "\\`*_{}[]()#>+-.!";

/// Pull requests sharing a heading, in input order
type Group<'p> = (String, Vec<&'p PullRequestDto>);

/// Markdown renderer for release notes
pub struct Renderer<'a, P: PullRequestProvider + ?Sized> {
    config: &'a Config,
    links: &'a P,
}

impl<'a, P: PullRequestProvider + ?Sized> Renderer<'a, P> {
    pub fn new(config: &'a Config, links: &'a P) -> Self {
        Self { config, links }
    }

    /// Render release notes for already ordered pull requests
    pub fn render(&self, pull_requests: &[PullRequestDto]) -> String {
        let all: Vec<&PullRequestDto> = pull_requests.iter().collect();

        let output = if self.config.sections.enabled {
            self.render_sections(&all)
        } else {
            self.render_items(&all)
        };

        output.trim_end().to_string()
    }

    /// Render one block per section, sections ordered by heading
    fn render_sections(&self, pull_requests: &[&PullRequestDto]) -> String {
        let sections = LabelMap::from(&self.config.sections.labels);
        let fallback = &self.config.sections.fallback;

        let section_headings = |pr: &PullRequestDto| -> Vec<String> {
            pr.labels
                .iter()
                .filter_map(|label| sections.get(label))
                .map(str::to_string)
                .collect()
        };
        let groups = group_by(pull_requests, section_headings, fallback);

        let mut output = String::new();
        for (description, section_prs) in &groups {
            output.push_str(&self.render_section(description, section_prs));
            output.push('\n');
        }

        output
    }

    /// Render a single section
    fn render_section(&self, description: &str, pull_requests: &[&PullRequestDto]) -> String {
        if pull_requests.is_empty() {
            return String::new();
        }

        let mut output = String::new();
        output.push_str(&format!("## {}\n", escape_markdown(description)));

        if self.config.categories.enabled {
            output.push_str(&self.render_categories(pull_requests));
        } else {
            output.push_str(&self.render_items(pull_requests));
        }

        output
    }

    /// Render section contents grouped by category, uncategorized last
    fn render_categories(&self, pull_requests: &[&PullRequestDto]) -> String {
        let categories = LabelMap::from(&self.config.categories.labels);
        let prefix = &self.config.categories.prefix;

        let mut uncategorized = Vec::new();
        let mut categorized = Vec::new();
        for pr in pull_requests {
            if category_names(*pr, prefix).next().is_some() {
                categorized.push(*pr);
            } else {
                uncategorized.push(*pr);
            }
        }

        let category_headings = |pr: &PullRequestDto| -> Vec<String> {
            category_names(pr, prefix)
                .map(|name| categories.get(name).unwrap_or(name).to_string())
                .collect()
        };
        let groups = group_by(&categorized, category_headings, "");

        let mut output = String::new();
        for (description, category_prs) in &groups {
            output.push_str(&format!("\n### {}\n", escape_markdown(description)));
            output.push_str(&self.render_items(category_prs));
        }

        if !uncategorized.is_empty() {
            output.push_str(&format!(
                "\n### {}\n",
                escape_markdown(&self.config.categories.fallback)
            ));
            output.push_str(&self.render_items(&uncategorized));
        }

        output
    }

    /// Render a bulleted list
    fn render_items(&self, pull_requests: &[&PullRequestDto]) -> String {
        pull_requests
            .iter()
            .map(|pr| format!("- {}\n", self.render_item(pr)))
            .collect()
    }

    /// Render a single pull request line from the configured template
    fn render_item(&self, pr: &PullRequestDto) -> String {
        let date_format = &self.config.format.date;
        let author = escape_markdown(&pr.author);

        let slots = [
            emphasise_brackets(&escape_markdown(&pr.title)),
            format!(
                "[{}]({})",
                self.links.prefixed_identifier(pr.number),
                self.links.url(pr.number)
            ),
            pr.number.to_string(),
            format_date(pr.created_at, date_format),
            pr.merged_at
                .map(|merged| format_date(merged, date_format))
                .unwrap_or_default(),
            author.clone(),
            format!("[{}]({})", author, pr.author_url),
        ];

        fill_template(&self.config.format.line, &slots)
    }
}

/// Group pull requests under the headings `headings` assigns them
///
/// Pull requests without a heading go under `fallback`. Headings differing
/// only in case share a group shown with the first spelling seen. Groups come
/// back ordered case-insensitively by heading; each keeps the input order.
fn group_by<'p>(
    pull_requests: &[&'p PullRequestDto],
    headings: impl Fn(&PullRequestDto) -> Vec<String>,
    fallback: &str,
) -> Vec<Group<'p>> {
    let mut groups: Vec<Group<'p>> = Vec::new();

    for pr in pull_requests {
        let mut pr_headings = headings(*pr);
        if pr_headings.is_empty() {
            pr_headings.push(fallback.to_string());
        }

        for heading in pr_headings {
            let key = fold(&heading);
            match groups.iter_mut().find(|(existing, _)| fold(existing) == key) {
                Some((_, members)) => {
                    if !members.iter().any(|m| m.number == pr.number) {
                        members.push(*pr);
                    }
                }
                None => groups.push((heading, vec![*pr])),
            }
        }
    }

    groups.sort_by(|(a, _), (b, _)| compare_ignore_case(a, b));
    groups
}

/// Category names (prefix stripped) carried by a pull request
fn category_names<'p>(pr: &'p PullRequestDto, prefix: &'p str) -> impl Iterator<Item = &'p str> {
    pr.labels
        .iter()
        .filter_map(move |label| label.strip_prefix(prefix))
        .filter(|name| !name.is_empty())
}

/// Backslash-escape Markdown special characters
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for character in text.chars() {
        if MARKDOWN_SPECIAL_CHARACTERS.contains(character) {
            escaped.push('\\');
        }
        escaped.push(character);
    }
    escaped
}

/// Bold the first escaped `\[...\]` pair of an already escaped title
fn emphasise_brackets(escaped_title: &str) -> String {
    let Some(open) = escaped_title.find("\\[") else {
        return escaped_title.to_string();
    };
    let contents_start = open + 2;
    let Some(length) = escaped_title[contents_start..].find("\\]") else {
        return escaped_title.to_string();
    };
    let close = contents_start + length;

    format!(
        "{}**[{}]**{}",
        &escaped_title[..open],
        &escaped_title[contents_start..close],
        &escaped_title[close + 2..]
    )
}

/// Substitute `{n}` slots; `{{` and `}}` are literal braces, unknown slots stay as written
fn fill_template(template: &str, slots: &[String]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                output.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                output.push('}');
            }
            '{' => {
                let mut token = String::new();
                let mut closed = false;
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next == '}' {
                        closed = true;
                        break;
                    }
                    token.push(next);
                }

                match token.parse::<usize>().ok().and_then(|i| slots.get(i)) {
                    Some(value) if closed => output.push_str(value),
                    _ => {
                        output.push('{');
                        output.push_str(&token);
                        if closed {
                            output.push('}');
                        }
                    }
                }
            }
            other => output.push(other),
        }
    }

    output
}

/// Format a timestamp, falling back to RFC 3339 for unusable format strings
fn format_date(date: DateTime<Utc>, format: &str) -> String {
    let mut output = String::new();
    if write!(output, "{}", date.format(format)).is_err() {
        return date.to_rfc3339();
    }
    output
}
