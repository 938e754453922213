//! Tabular serialization of the accepted article set.
//!
//! One row per article, fixed column order:
//!
//! ```text
//! headline, article_body, author_name, date_published, language, source, url[, scraped_at]
//! ```
//!
//! The trailing `scraped_at` column is present only for object-store
//! destinations. `author_name` is the author list joined by `", "`.
//! Timestamps are RFC 3339 strings; an absent publication date is an empty
//! field, never a placeholder.

use crate::models::Article;
use csv::Writer;

/// Column headers for the local-file layout.
const COLUMNS: [&str; 7] = [
    "headline",
    "article_body",
    "author_name",
    "date_published",
    "language",
    "source",
    "url",
];

/// Render `articles` as CSV bytes, header row included.
///
/// # Arguments
///
/// * `articles` - The accepted set, in acceptance order
/// * `include_scraped_at` - Append the `scraped_at` column (object-store
///   destinations only)
pub fn render(articles: &[Article], include_scraped_at: bool) -> Result<Vec<u8>, csv::Error> {
    let mut writer = Writer::from_writer(Vec::new());

    let mut header: Vec<&str> = COLUMNS.to_vec();
    if include_scraped_at {
        header.push("scraped_at");
    }
    writer.write_record(&header)?;

    for article in articles {
        let date_published = article
            .published_at
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_default();
        let mut record = vec![
            article.headline.clone(),
            article.body.clone(),
            article.author_name(),
            date_published,
            article.language.clone(),
            article.source_domain.clone(),
            article.url.clone(),
        ];
        if include_scraped_at {
            record.push(article.scraped_at.to_rfc3339());
        }
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))
}
