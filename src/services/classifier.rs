// src/services/classifier.rs

//! Post markup classification.
//!
//! Transparent Classroom renders each tagged child as
//! `<a class="child-link" href="/s/<school>/children/<id>">Name</a>`.
//! Two questions are answered from those anchors:
//! - which children a post is about (`tagged_child_ids`)
//! - how likely it is that the post went to the whole class
//!   (`class_post_confidence`)

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{AppError, Result};

const CHILD_LINK_CLASS: &str = "child-link";

static CHILD_HREF_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/s/\d+/children/(\d+)$").expect("valid regex"));
static CHILD_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a.child-link").expect("valid selector"));

fn is_child_link(element: &Element) -> bool {
    element.name() == "a" && element.classes().any(|c| c == CHILD_LINK_CLASS)
}

/// Ids of every child tagged in the markup.
///
/// Fails if a child link's href is missing or not of the
/// `/s/<school>/children/<id>` shape; guessing would risk tagging the
/// wrong child.
pub fn tagged_child_ids(markup: &str) -> Result<BTreeSet<u64>> {
    let fragment = Html::parse_fragment(markup);

    fragment
        .select(&CHILD_LINK_SELECTOR)
        .map(|link| {
            let href = link
                .value()
                .attr("href")
                .ok_or_else(|| AppError::parse("child-link without href"))?;
            CHILD_HREF_REGEX
                .captures(href)
                .and_then(|caps| caps[1].parse::<u64>().ok())
                .ok_or_else(|| AppError::parse(format!("child-link with unexpected href: {href}")))
        })
        .collect()
}

/// Confidence that a post was written for the whole class.
///
/// Whole-class posts get an automatically expanded tag list naming every
/// child, sorted alphabetically and separated by spaces. Teachers sometimes
/// delete a name from that list, leaving extra whitespace behind.
///
/// The score is the length of the longest sorted run of child links found
/// among the top-level nodes, where a run only continues across
/// whitespace. Markup without child links scores 0.
pub fn class_post_confidence(markup: &str) -> usize {
    let fragment = Html::parse_fragment(markup);

    tag_runs(fragment.root_element())
        .iter()
        .filter(|run| run.windows(2).all(|pair| pair[0] <= pair[1]))
        .map(Vec::len)
        .max()
        .unwrap_or(0)
}

/// Split the top-level child links into runs of names.
///
/// A run ends at any node other than a child link or text, or when the
/// text right after a child link has something besides whitespace in it.
/// Empty runs are kept; they never change the maximum.
fn tag_runs(root: ElementRef<'_>) -> Vec<Vec<String>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    let mut nodes = root.children().peekable();

    while let Some(node) = nodes.next() {
        match node.value() {
            // Text only matters as the tail of a child link, checked below.
            Node::Text(_) => continue,
            Node::Element(element) if is_child_link(element) => {
                let name: String = ElementRef::wrap(node)
                    .map(|link| link.text().collect())
                    .unwrap_or_default();
                current.push(name);

                let tail_is_blank = match nodes.peek().map(|next| next.value()) {
                    Some(Node::Text(text)) => text.chars().all(char::is_whitespace),
                    _ => true,
                };
                if tail_is_blank {
                    continue;
                }
            }
            _ => {}
        }

        runs.push(std::mem::take(&mut current));
    }

    runs.push(current);
    runs
}
