use quick_xml::de::from_str;
use serde::Deserialize;

use crate::enrichment::LookupRecord;
use crate::error::{HarvestError, Result};
use crate::text::{clean_optional, clean_text};

/// Only the elements a lookup merges back into a record. Everything else in the
/// entry (ids, timestamps, links) is skipped, so a malformed value there cannot
/// fail the lookup.
#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(rename = "author", default)]
    authors: Vec<Author>,
    #[serde(rename = "category", default)]
    categories: Vec<Category>,
    #[serde(rename = "arxiv:comment", alias = "comment")]
    comment: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct Category {
    #[serde(rename = "@term")]
    term: Option<String>,
}

pub fn parse_atom_response(xml: &str) -> Result<Vec<LookupRecord>> {
    let feed: Feed =
        from_str(xml).map_err(|e| HarvestError::Parse(format!("invalid atom xml: {e}")))?;

    Ok(feed.entries.into_iter().map(LookupRecord::from).collect())
}

impl From<Entry> for LookupRecord {
    fn from(entry: Entry) -> Self {
        Self {
            authors: entry
                .authors
                .iter()
                .filter_map(|author| clean_optional(&author.name))
                .collect(),
            title: clean_text(&entry.title),
            categories: entry
                .categories
                .iter()
                .filter_map(|category| category.term.as_deref().and_then(clean_optional))
                .collect(),
            comment: entry.comment.as_deref().and_then(clean_optional),
            summary: clean_text(&entry.summary),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEGMENTATION_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title>arXiv Query: id_list=2405.11223</title>
  <entry>
    <id>http://arxiv.org/abs/2405.11223v2</id>
    <published>2024-05-18T09:12:03Z</published>
    <title>
      Sparse Prompts for
      Open-Vocabulary Segmentation
    </title>
    <summary>
      We revisit prompt tuning for dense prediction.
    </summary>
    <author>
      <name>Mei Tanaka</name>
      <arxiv:affiliation>Kyoto University</arxiv:affiliation>
    </author>
    <author><name> Jonas   Weber </name></author>
    <arxiv:comment>CVPR 2024, 12 pages</arxiv:comment>
    <link title="pdf" rel="related" type="application/pdf" href="http://arxiv.org/pdf/2405.11223v2"/>
    <arxiv:primary_category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>
"#;

    #[test]
    fn keeps_fields_merged_into_records() {
        let entries = parse_atom_response(SEGMENTATION_XML).unwrap();
        assert_eq!(entries.len(), 1);

        let item = &entries[0];
        assert_eq!(item.title, "Sparse Prompts for Open-Vocabulary Segmentation");
        assert_eq!(item.summary, "We revisit prompt tuning for dense prediction.");
        assert_eq!(item.authors, vec!["Mei Tanaka", "Jonas Weber"]);
        assert_eq!(item.categories, vec!["cs.CV", "cs.LG"]);
        assert_eq!(item.comment.as_deref(), Some("CVPR 2024, 12 pages"));
    }

    #[test]
    fn bad_timestamps_and_missing_elements_do_not_fail_the_entry() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>not an arXiv id</id>
    <published>not-a-date</published>
    <updated></updated>
    <title>Untimed Paper</title>
  </entry>
</feed>"#;
        let entries = parse_atom_response(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Untimed Paper");
        assert_eq!(entries[0].summary, "");
        assert!(entries[0].authors.is_empty());
        assert!(entries[0].categories.is_empty());
        assert_eq!(entries[0].comment, None);
    }

    #[test]
    fn empty_feed_has_no_entries() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>arXiv Query</title></feed>"#;
        assert!(parse_atom_response(xml).unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_xml() {
        assert!(matches!(
            parse_atom_response("<feed><entry>"),
            Err(HarvestError::Parse(_))
        ));
    }
}
