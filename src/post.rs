//! Defines the [`Post`] type and how posts are converted into template values
//! (see [`Post::to_value`] and [`Post::summarize`]).

use crate::tag::Tag;
use chrono::{DateTime, NaiveDate, Utc};
use gtmpl::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use url::Url;

/// A single article parsed from a Markdown source file.
#[derive(Clone, Debug)]
pub struct Post {
    /// The path of the source file relative to the posts directory, less the
    /// `.md` extension (e.g., `2021/ollie.md` has the id `2021/ollie`).
    pub id: String,

    /// The output location for the post's HTML page.
    pub file_path: PathBuf,

    /// The URL for the post's HTML page.
    pub url: Url,

    /// The title of the post.
    pub title: String,

    /// The date exactly as written in the front-matter. See
    /// [`Post::parsed_date`].
    pub date: String,

    /// The rendered HTML body.
    pub body: String,

    /// The plain-text excerpt extracted from `body` by
    /// [`crate::summary::extract_summary`].
    pub summary: String,

    /// The post's tags in front-matter order, without duplicates.
    pub tags: Vec<Tag>,
}

impl Post {
    /// Returns the post's date if it is a `YYYY-MM-DD` date or an RFC 3339
    /// timestamp (converted to UTC).
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    /// The medium date with weekday, e.g., `Fri, Oct 16, 2026`. Falls back to
    /// the raw front-matter value when the date can't be parsed.
    pub fn date_string(&self) -> String {
        match self.parsed_date() {
            Some(date) => date.format("%a, %b %-d, %Y").to_string(),
            None => self.date.clone(),
        }
    }

    /// The short date, e.g., `10/16/2026`. Falls back to the raw front-matter
    /// value when the date can't be parsed.
    pub fn date_string_short(&self) -> String {
        match self.parsed_date() {
            Some(date) => date.format("%-m/%-d/%Y").to_string(),
            None => self.date.clone(),
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|tag| tag.name == name)
    }

    /// Converts the post into a [`Value`] for the post template. The result
    /// has every field of [`Post::summarize`] plus `body`.
    pub fn to_value(&self) -> Value {
        let mut m = self.fields();
        m.insert("body".to_owned(), Value::String(self.body.clone()));
        Value::Object(m)
    }

    /// Converts the post into the [`Value`] used on listing pages: `id`,
    /// `title`, `date`, `date_string`, `date_string_short`, `url`, `summary`,
    /// and `tags`.
    pub fn summarize(&self) -> Value {
        Value::Object(self.fields())
    }

    fn fields(&self) -> HashMap<String, Value> {
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("id".to_owned(), Value::String(self.id.clone()));
        m.insert("title".to_owned(), Value::String(self.title.clone()));
        m.insert("date".to_owned(), Value::String(self.date.clone()));
        m.insert("date_string".to_owned(), Value::String(self.date_string()));
        m.insert(
            "date_string_short".to_owned(),
            Value::String(self.date_string_short()),
        );
        m.insert("url".to_owned(), Value::String(self.url.to_string()));
        m.insert("summary".to_owned(), Value::String(self.summary.clone()));
        m.insert(
            "tags".to_owned(),
            Value::Array(self.tags.iter().map(Value::from).collect()),
        );
        m
    }
}

/// Parses a front-matter date. Accepts `YYYY-MM-DD` and RFC 3339.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|date| date.with_timezone(&Utc).naive_utc().date())
    })
}

#[cfg(test)]
pub(crate) fn test_post(id: &str, date: &str, tags: &[&str]) -> Post {
    let index_url = Url::parse("https://example.org/pages/").unwrap();
    Post {
        id: id.to_owned(),
        file_path: PathBuf::from(format!("/tmp/posts/{}.html", id)),
        url: Url::parse(&format!("https://example.org/posts/{}.html", id)).unwrap(),
        title: format!("Post {}", id),
        date: date.to_owned(),
        body: format!("<p>Body of {}.</p>", id),
        summary: format!("Body of {}.", id),
        tags: tags
            .iter()
            .map(|name| Tag::new(name, &index_url).unwrap())
            .collect(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_date_strings() {
        let post = test_post("a", "2026-10-16", &[]);
        assert_eq!("Fri, Oct 16, 2026", post.date_string());
        assert_eq!("10/16/2026", post.date_string_short());
    }

    #[test]
    fn test_single_digit_day_and_month() {
        let post = test_post("a", "2021-03-07", &[]);
        assert_eq!("Sun, Mar 7, 2021", post.date_string());
        assert_eq!("3/7/2021", post.date_string_short());
    }

    #[test]
    fn test_rfc3339_dates_are_converted_to_utc() {
        let post = test_post("a", "2021-03-07T23:30:00-05:00", &[]);
        assert_eq!("3/8/2021", post.date_string_short());
    }

    #[test]
    fn test_malformed_date_falls_back_to_raw() {
        let post = test_post("a", "sometime in spring", &[]);
        assert_eq!(None, post.parsed_date());
        assert_eq!("sometime in spring", post.date_string());
        assert_eq!("sometime in spring", post.date_string_short());
    }

    #[test]
    fn test_summarize_omits_body() {
        let post = test_post("a", "2021-03-07", &["software"]);
        match post.summarize() {
            Value::Object(m) => {
                assert!(!m.contains_key("body"));
                assert!(m.contains_key("summary"));
            }
            _ => panic!("wanted an object"),
        }
        match post.to_value() {
            Value::Object(m) => assert!(m.contains_key("body")),
            _ => panic!("wanted an object"),
        }
    }
}
