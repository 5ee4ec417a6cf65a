use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

use crate::categories::{extract_categories, matches_targets};
use crate::error::{HarvestError, Result};
use crate::record::PaperRecord;
use crate::text::{clean_optional, clean_text, strip_label};

const TITLE_LABEL: &str = "Title:";
const COMMENTS_LABEL: &str = "Comments:";

pub fn listing_url(base_url: &str, category: &str) -> String {
    format!("{}/{}/new", base_url.trim_end_matches('/'), category)
}

struct ListingSelectors {
    nav_item: Selector,
    nav_link: Selector,
    paper: Selector,
    paper_anchor: Selector,
    abstract_link: Selector,
    title: Selector,
    author: Selector,
    summary: Selector,
    comments: Selector,
    primary_subject: Selector,
    subjects: Selector,
}

impl ListingSelectors {
    fn new() -> Result<Self> {
        Ok(Self {
            nav_item: parse_selector("div[id=dlpage] ul li")?,
            nav_link: parse_selector("a[href]")?,
            paper: parse_selector("dl dt")?,
            paper_anchor: parse_selector("a[name^='item']")?,
            abstract_link: parse_selector("a[title='Abstract'][href]")?,
            title: parse_selector(".list-title")?,
            author: parse_selector(".list-authors a")?,
            summary: parse_selector("p.mathjax")?,
            comments: parse_selector(".list-comments")?,
            primary_subject: parse_selector(".list-subjects .primary-subject")?,
            subjects: parse_selector(".list-subjects")?,
        })
    }
}

/// A parsed "new submissions" listing page for one category.
pub struct Listing {
    document: Html,
    selectors: ListingSelectors,
}

impl Listing {
    pub fn parse(html: &str) -> Result<Self> {
        Ok(Self {
            document: Html::parse_document(html),
            selectors: ListingSelectors::new()?,
        })
    }

    /// Highest ordinal among the navigation anchors. Papers at or past it belong to
    /// the replacement sections. `None` when the page has no navigation anchors.
    pub fn boundary(&self) -> Option<u32> {
        self.document
            .select(&self.selectors.nav_item)
            .filter_map(|li| {
                li.select(&self.selectors.nav_link)
                    .find_map(|a| a.value().attr("href"))
            })
            .filter(|href| href.contains("item"))
            .filter_map(parse_ordinal)
            .max()
    }

    /// Lazily yields the new papers whose categories intersect `targets`, in document order.
    /// Papers with no parsed categories are always yielded.
    pub fn papers<'a>(
        &'a self,
        targets: &'a HashSet<String>,
    ) -> impl Iterator<Item = PaperRecord> + 'a {
        let boundary = self.boundary();
        self.document
            .select(&self.selectors.paper)
            .filter_map(move |dt| self.candidate(dt, boundary))
            .filter(move |record| {
                if matches_targets(&record.categories, targets) {
                    debug!(id = %record.id, categories = ?record.categories, "found paper");
                    true
                } else {
                    debug!(
                        id = %record.id,
                        categories = ?record.categories,
                        targets = ?targets,
                        "skipped paper outside target categories"
                    );
                    false
                }
            })
    }

    fn candidate(&self, dt: ElementRef<'_>, boundary: Option<u32>) -> Option<PaperRecord> {
        let s = &self.selectors;

        let Some(ordinal) = dt
            .select(&s.paper_anchor)
            .find_map(|a| a.value().attr("name"))
            .and_then(parse_ordinal)
        else {
            trace!("listing entry without a numeric anchor");
            return None;
        };
        if boundary.is_some_and(|limit| ordinal >= limit) {
            return None;
        }

        let link = dt
            .select(&s.abstract_link)
            .find_map(|a| a.value().attr("href"))?;
        let id = link.rsplit('/').next().map(str::trim).filter(|id| !id.is_empty())?;

        // Pairs with the very next element only. A `dd` that follows some other
        // element first is not attached to this `dt`.
        let Some(dd) = dt
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .next()
            .filter(|el| el.value().name() == "dd")
        else {
            trace!(id, "listing entry without a description block");
            return None;
        };

        let mut record = PaperRecord::new(id);
        record.title = strip_label(&own_texts(dd, &s.title).concat(), TITLE_LABEL);
        record.authors = own_texts(dd, &s.author)
            .into_iter()
            .map(clean_text)
            .filter(|name| !name.is_empty())
            .collect();
        record.summary = clean_text(&own_texts(dd, &s.summary).join(" "));
        record.comment = clean_optional(
            &own_texts(dd, &s.comments)
                .concat()
                .replacen(COMMENTS_LABEL, "", 1),
        );
        record.categories = extract_categories(
            &own_texts(dd, &s.primary_subject).concat(),
            &own_texts(dd, &s.subjects).concat(),
        );
        Some(record)
    }
}

/// Direct text children of every element in `scope` matching `selector`, in document order.
/// Text inside nested elements (such as the `Title:` descriptor span) is not included.
fn own_texts<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<&'a str> {
    scope
        .select(selector)
        .flat_map(|el| {
            el.children()
                .filter_map(|child| child.value().as_text().map(|text| &**text))
        })
        .collect()
}

fn parse_ordinal(value: &str) -> Option<u32> {
    value.rsplit("item").next()?.trim().parse().ok()
}

fn parse_selector(input: &str) -> Result<Selector> {
    Selector::parse(input)
        .map_err(|e| HarvestError::Parse(format!("invalid selector {input}: {e}")))
}
