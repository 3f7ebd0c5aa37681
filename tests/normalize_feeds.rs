//! End-to-end normalization tests over complete RSS and Atom documents.
//!
//! These exercise the full pipeline (XML → tree → dialect detection →
//! transform) the way a caller would, including the full-content
//! passthrough mode and the error surface of `parse_and_normalize`.

use pretty_assertions::assert_eq;

use sift::config::{ParserConfig, ReaderConfig};
use sift::feed::{parse_and_normalize, NormalizeError};

const RSS_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/" xmlns:media="http://search.yahoo.com/mrss/">
<channel>
    <title>News &amp; Notes</title>
    <link>http://example.com/</link>
    <description>Daily updates</description>
    <language>en-us</language>
    <generator>HandRolled 1.0</generator>
    <lastBuildDate>Thu, 28 Jul 2022 08:59:58 GMT</lastBuildDate>
    <owner>editor@example.com</owner>
    <item>
        <title>First post</title>
        <link>http://example.com/posts/1</link>
        <guid isPermaLink="true">http://example.com/posts/1</guid>
        <pubDate>Thu, 28 Jul 2022 02:43:00 GMT</pubDate>
        <description>Plain summary of the first post</description>
        <content:encoded><![CDATA[<p>The <b>full</b> body of the first post</p>]]></content:encoded>
        <category>tech</category>
        <category>news</category>
    </item>
    <item>
        <title>Second post</title>
        <link>http://example.com/posts/2</link>
        <guid>http://example.com/posts/2</guid>
        <description><![CDATA[Second summary]]></description>
        <media:thumbnail url="http://example.com/thumb2.png"/>
    </item>
    <item>
        <title>Third post</title>
        <guid>http://example.com/posts/3</guid>
        <description>Third summary</description>
    </item>
</channel>
</rss>"#;

const ATOM_DOC: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:media="http://search.yahoo.com/mrss/">
    <id>urn:example:feed</id>
    <title>Atom Digest</title>
    <subtitle>Curated &amp; condensed</subtitle>
    <link href="http://example.org/" rel="alternate"/>
    <link href="http://example.org/feed.atom" rel="self"/>
    <generator>atomgen</generator>
    <updated>2022-07-28T02:43:00Z</updated>
    <entry>
        <id>http://example.org/entries/1</id>
        <title>Entry one</title>
        <link href="http://example.org/entries/1"/>
        <updated>2022-07-27T10:00:00Z</updated>
        <summary>Summary of entry one</summary>
        <content type="html">&lt;p&gt;Entry one body&lt;/p&gt;</content>
        <media:thumbnail url="http://example.org/thumb1.png"/>
    </entry>
    <entry>
        <id>http://example.org/entries/2</id>
        <title>Entry two</title>
        <published>2022-07-26T09:30:00Z</published>
        <summary>Summary of entry two</summary>
    </entry>
</feed>"#;

fn parse(source: &str, reader: &ReaderConfig) -> sift::feed::Feed {
    parse_and_normalize(source, &ParserConfig::default(), reader).expect("normalization failed")
}

#[test]
fn rss_channel_fields_are_mapped() {
    let feed = parse(RSS_DOC, &ReaderConfig::default());
    assert_eq!(feed.id, None);
    assert_eq!(feed.title, "News & Notes");
    assert_eq!(feed.link.as_deref(), Some("http://example.com/"));
    assert_eq!(feed.description, "Daily updates");
    assert_eq!(feed.language, "en-us");
    assert_eq!(feed.generator, "HandRolled 1.0");
    assert_eq!(feed.published, "2022-07-28T08:59:58.000Z");
}

#[test]
fn rss_entries_preserve_source_order() {
    let feed = parse(RSS_DOC, &ReaderConfig::default());
    let titles: Vec<&str> = feed.entries.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, vec!["First post", "Second post", "Third post"]);
}

#[test]
fn rss_entry_extraction_is_total() {
    let feed = parse(RSS_DOC, &ReaderConfig::default());

    let first = &feed.entries[0];
    assert_eq!(first.link.as_deref(), Some("http://example.com/posts/1"));
    assert_eq!(first.published, "2022-07-28T02:43:00.000Z");
    // The encoded body outranks the plain description as content candidate.
    assert_eq!(first.description, "The full body of the first post");
    assert_eq!(first.guid.as_deref(), Some("http://example.com/posts/1"));

    // No pubDate: published degrades to empty, description still extracts.
    let third = &feed.entries[2];
    assert_eq!(third.published, "");
    assert_eq!(third.description, "Third summary");
    // No link either: the guid URL steps in.
    assert_eq!(third.link.as_deref(), Some("http://example.com/posts/3"));
}

#[test]
fn rss_full_content_mode_adds_bodies_and_extras() {
    let options = ReaderConfig {
        include_full_content: true,
        ..ReaderConfig::default()
    };
    let feed = parse(RSS_DOC, &options);

    // Channel-level non-standard tag is passed through.
    assert_eq!(
        feed.extras.get("owner").map(String::as_str),
        Some("editor@example.com")
    );

    let first = &feed.entries[0];
    assert_eq!(
        first.content.as_deref(),
        Some("<p>The <b>full</b> body of the first post</p>")
    );
    // Repeated custom tags resolve across all matches.
    assert_eq!(
        first.extras.get("category").map(String::as_str),
        Some("technews")
    );

    // A lone attribute stands in for text content.
    let second = &feed.entries[1];
    assert_eq!(
        second.extras.get("thumbnail").map(String::as_str),
        Some("http://example.com/thumb2.png")
    );
}

#[test]
fn rss_default_mode_has_no_extras_or_content() {
    let feed = parse(RSS_DOC, &ReaderConfig::default());
    assert!(feed.extras.is_empty());
    for entry in &feed.entries {
        assert_eq!(entry.content, None);
        assert!(entry.extras.is_empty());
    }
}

#[test]
fn atom_feed_fields_are_mapped() {
    let feed = parse(ATOM_DOC, &ReaderConfig::default());
    assert_eq!(feed.id.as_deref(), Some("urn:example:feed"));
    assert_eq!(feed.title, "Atom Digest");
    assert_eq!(feed.description, "Curated & condensed");
    // First link wins over the self variant.
    assert_eq!(feed.link.as_deref(), Some("http://example.org/"));
    assert_eq!(feed.generator, "atomgen");
    assert_eq!(feed.published, "2022-07-28T02:43:00.000Z");
}

#[test]
fn atom_entries_map_updated_and_published() {
    let feed = parse(ATOM_DOC, &ReaderConfig::default());
    assert_eq!(feed.entries.len(), 2);

    let first = &feed.entries[0];
    assert_eq!(first.link.as_deref(), Some("http://example.org/entries/1"));
    assert_eq!(first.published, "2022-07-27T10:00:00.000Z");
    assert_eq!(first.description, "Entry one body");
    assert_eq!(first.guid, None);

    // No updated: published is the fallback timestamp.
    let second = &feed.entries[1];
    assert_eq!(second.published, "2022-07-26T09:30:00.000Z");
    assert_eq!(second.description, "Summary of entry two");
}

#[test]
fn atom_full_content_mode_toggles_extras() {
    let options = ReaderConfig {
        include_full_content: true,
        ..ReaderConfig::default()
    };
    let feed = parse(ATOM_DOC, &options);
    let first = &feed.entries[0];
    assert_eq!(first.content.as_deref(), Some("<p>Entry one body</p>"));
    assert_eq!(
        first.extras.get("thumbnail").map(String::as_str),
        Some("http://example.org/thumb1.png")
    );

    let without = parse(ATOM_DOC, &ReaderConfig::default());
    assert!(without.entries[0].extras.get("thumbnail").is_none());
}

#[test]
fn raw_dates_keep_source_text_verbatim() {
    let options = ReaderConfig {
        convert_pubdate_to_iso: false,
        ..ReaderConfig::default()
    };
    let feed = parse(RSS_DOC, &options);
    assert_eq!(feed.entries[0].published, "Thu, 28 Jul 2022 02:43:00 GMT");
    // The feed-level timestamp converts regardless of the entry option.
    assert_eq!(feed.published, "2022-07-28T08:59:58.000Z");
}

#[test]
fn description_respects_configured_length() {
    let options = ReaderConfig {
        description_max_len: 10,
        ..ReaderConfig::default()
    };
    let feed = parse(RSS_DOC, &options);
    for entry in &feed.entries {
        assert!(entry.description.chars().count() <= 13, "{}", entry.description);
        assert!(!entry.description.contains('\n'));
    }
}

#[test]
fn error_surface_is_exactly_four_kinds() {
    let parser = ParserConfig::default();
    let reader = ReaderConfig::default();

    assert!(matches!(
        parse_and_normalize("", &parser, &reader),
        Err(NormalizeError::EmptySource)
    ));
    assert!(matches!(
        parse_and_normalize("<rss><channel>", &parser, &reader),
        Err(NormalizeError::MalformedSource(_))
    ));
    assert!(matches!(
        parse_and_normalize("<html><body>nope</body></html>", &parser, &reader),
        Err(NormalizeError::UnrecognizedFormat(_))
    ));
    // An <rss> root whose channel is missing passes detection only when a
    // channel exists, so a channel-free document is unrecognized, not a
    // navigation failure.
    assert!(matches!(
        parse_and_normalize("<rss version=\"2.0\"><other/></rss>", &parser, &reader),
        Err(NormalizeError::UnrecognizedFormat(_))
    ));
}

#[test]
fn canonical_feed_serializes_with_flattened_extras() {
    let options = ReaderConfig {
        include_full_content: true,
        ..ReaderConfig::default()
    };
    let feed = parse(RSS_DOC, &options);
    let json = serde_json::to_value(&feed).unwrap();

    assert_eq!(json["title"], "News & Notes");
    assert_eq!(json["owner"], "editor@example.com");
    // RSS feeds carry no id; the field is omitted rather than null.
    assert!(json.get("id").is_none());
    assert_eq!(json["entries"][0]["guid"], "http://example.com/posts/1");
    assert!(json["entries"][0].get("content").is_some());
}
