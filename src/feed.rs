//! Support for creating Atom feeds from a list of posts.

use crate::config::Author;
use crate::post::Post;
use atom_syndication::{Category, Content, Entry, Error as AtomError, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use std::fmt;
use std::io::Write;
use url::Url;

/// Bundled configuration for creating a feed.
pub struct FeedConfig {
    pub title: String,
    pub subtitle: Option<String>,
    pub language: String,
    pub id: String,
    pub author: Option<Author>,
    pub home_page: Url,
    pub site_root: Url,
    pub feed_url: Url,

    /// Only posts carrying this tag are included.
    pub implicit_tag: String,

    /// The maximum number of entries; `0` means no limit.
    pub limit: usize,
}

/// Creates a feed from some configuration ([`FeedConfig`]) and a list of
/// [`Post`]s (newest first) and writes the result to a [`std::io::Write`].
pub fn write_feed<W: Write>(config: &FeedConfig, posts: &[Post], w: W) -> Result<()> {
    feed(config, posts, Utc::now().into()).write_to(w)?;
    Ok(())
}

/// Builds the feed. `now` is the feed's `updated` time and the fallback date
/// for posts whose dates can't be parsed.
fn feed(config: &FeedConfig, posts: &[Post], now: DateTime<FixedOffset>) -> Feed {
    let mut feed = Feed::default();
    feed.set_title(Text::plain(config.title.clone()));
    feed.set_subtitle(config.subtitle.clone().map(Text::plain));
    feed.set_id(config.id.clone());
    feed.set_updated(now);
    feed.set_lang(Some(config.language.clone()));
    feed.set_base(Some(config.site_root.to_string()));
    feed.set_authors(author_to_people(&config.author));
    feed.set_links(vec![
        link(config.home_page.as_str(), "alternate"),
        link(config.feed_url.as_str(), "self"),
    ]);
    feed.set_entries(feed_entries(config, posts, now));
    feed
}

fn feed_entries(config: &FeedConfig, posts: &[Post], now: DateTime<FixedOffset>) -> Vec<Entry> {
    let articles = posts.iter().filter(|post| post.has_tag(&config.implicit_tag));
    let limit = match config.limit {
        0 => usize::MAX,
        limit => limit,
    };

    articles
        .take(limit)
        .map(|post| {
            let date = match post.parsed_date().and_then(midnight_utc) {
                Some(date) => date,
                None => {
                    tracing::warn!(
                        post = %post.id,
                        date = %post.date,
                        "unparseable date; using build time in feed"
                    );
                    now
                }
            };

            let mut content = Content::default();
            content.set_content_type(Some("html".to_owned()));
            content.set_value(Some(post.body.clone()));

            let mut entry = Entry::default();
            entry.set_id(post.url.to_string());
            entry.set_title(Text::plain(post.title.clone()));
            entry.set_updated(date);
            entry.set_published(Some(date));
            entry.set_authors(author_to_people(&config.author));
            entry.set_links(vec![link(post.url.as_str(), "alternate")]);
            entry.set_summary(Some(Text::plain(post.summary.clone())));
            entry.set_content(Some(content));
            entry.set_categories(
                post.tags
                    .iter()
                    .filter(|tag| tag.name != config.implicit_tag)
                    .map(|tag| {
                        let mut category = Category::default();
                        category.set_term(tag.name.clone());
                        category
                    })
                    .collect::<Vec<Category>>(),
            );
            entry
        })
        .collect()
}

fn midnight_utc(date: NaiveDate) -> Option<DateTime<FixedOffset>> {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight).into())
}

fn link(href: &str, rel: &str) -> Link {
    let mut link = Link::default();
    link.set_href(href);
    link.set_rel(rel);
    link
}

fn author_to_people(author: &Option<Author>) -> Vec<Person> {
    match author {
        Some(author) => {
            let mut person = Person::default();
            person.set_name(author.name.clone());
            person.set_email(author.email.clone());
            vec![person]
        }
        None => Vec::new(),
    }
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem writing a feed. Variants include I/O and Atom issues.
#[derive(Debug)]
pub enum Error {
    /// Returned when there is a generic I/O error.
    Io(std::io::Error),

    /// Returned when there is an Atom-related error.
    Atom(AtomError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::Atom(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::Atom(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<AtomError> for Error {
    /// Converts [`AtomError`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: AtomError) -> Error {
        Error::Atom(err)
    }
}
