//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: parsing the posts
//! ([`crate::parser`]), reconciling their tags against the allow-list
//! ([`crate::taxonomy`]), rendering listing and post pages
//! ([`crate::write`]), copying the static assets ([`crate::assets`]), and
//! generating the Atom feed ([`crate::feed`]).

use crate::assets::{copy_assets, Error as AssetsError};
use crate::config::Config;
use crate::feed::{write_feed, Error as FeedError, FeedConfig};
use crate::listing::listings;
use crate::parser::{Error as ParseError, Parser as PostParser};
use crate::taxonomy::{discover_tags, SlugError, TagMismatch};
use crate::write::{parse_template, Error as WriteError, Globals, Writer};
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Builds the site from a [`Config`] object. Tags are reconciled before
/// anything is removed or written, so a mismatch leaves the previous output
/// untouched.
pub fn build_site(config: &Config) -> Result<()> {
    let post_parser = PostParser::new(
        &config.index_url,
        &config.posts_url,
        &config.posts_output_directory,
    );

    // collect all posts
    let posts = post_parser.parse_posts(&config.posts_source_directory)?;

    // the allow-list must match the tags in use exactly
    let discovered = discover_tags(&posts, &config.implicit_tag);
    config.known_tags.reconcile(&discovered)?;
    config.known_tags.check_slugs()?;
    tracing::info!(tags = discovered.len(), "tags reconciled");

    // Parse the template files.
    let index_template = parse_template(config.index_template.iter())?;
    let posts_template = parse_template(config.posts_template.iter())?;

    // Blow away the old output directories so we don't have any collisions.
    // The root output directory itself is left alone in case the user passed
    // the wrong directory.
    rmdir(&config.posts_output_directory)?;
    rmdir(&config.index_output_directory)?;
    rmdir(&config.assets_output_directory)?;

    // write the listing and post pages
    let globals = Globals::from_config(config);
    let writer = Writer {
        posts_template: &posts_template,
        index_template: &index_template,
        index_page_size: config.index_page_size,
        globals: &globals,
    };
    let listings = listings(
        &config.known_tags,
        &config.implicit_tag,
        &posts,
        &config.index_url,
        &config.index_output_directory,
    )
    .map_err(WriteError::from)?;
    writer.write_site(&listings, &posts)?;

    copy_assets(
        &config.assets_source_directory,
        &config.assets_output_directory,
    )?;

    // copy /pages/index.html to /index.html
    let _ = std::fs::copy(
        config.index_output_directory.join("index.html"),
        config.root_output_directory.join("index.html"),
    )?;

    // create the atom feed
    if let Some(parent) = config.feed_output_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_feed(
        &FeedConfig {
            title: config.title.clone(),
            subtitle: config.feed.subtitle.clone(),
            language: config.feed.language.clone(),
            id: config.home_page.to_string(),
            author: config.author.clone(),
            home_page: config.home_page.clone(),
            site_root: config.site_root.clone(),
            feed_url: config.feed_url.clone(),
            implicit_tag: config.implicit_tag.clone(),
            limit: config.feed.limit,
        },
        &posts,
        File::create(&config.feed_output_path)?,
    )?;
    tracing::info!(
        output = %config.root_output_directory.display(),
        "site built"
    );

    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during parsing, tag
/// reconciliation, writing, cleaning output directories, copying assets,
/// writing the feed, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors during parsing.
    Parse(ParseError),

    /// Returned when the allow-list doesn't match the tags used by posts.
    Tags(TagMismatch),

    /// Returned when known tags can't each get their own listing directory.
    Slugs(SlugError),

    /// Returned for errors writing pages to disk as HTML files.
    Write(WriteError),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for errors copying static assets.
    Assets(AssetsError),

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Tags(err) => err.fmt(f),
            Error::Slugs(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning directory '{}': {}", path.display(), err)
            }
            Error::Assets(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Tags(err) => Some(err),
            Error::Slugs(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Assets(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<TagMismatch> for Error {
    /// Converts [`TagMismatch`]es into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: TagMismatch) -> Error {
        Error::Tags(err)
    }
}

impl From<SlugError> for Error {
    fn from(err: SlugError) -> Error {
        Error::Slugs(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<AssetsError> for Error {
    fn from(err: AssetsError) -> Error {
        Error::Assets(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn project(known_tags: &str) -> tempfile::TempDir {
        project_with_tags(known_tags, "software", "skateboarding")
    }

    fn project_with_tags(known_tags: &str, first: &str, second: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            crate::config::PROJECT_FILE,
            &format!(
                "site_root: https://cberes.com/\n\
                 window_title: cberes\n\
                 site_title: Corey Beres\n\
                 index_page_size: 1\n\
                 known_tags: {}\n\
                 author: {{name: Corey Beres}}\n\
                 feed: {{title: cberes, output_path: /rss.xml}}\n",
                known_tags
            ),
        );
        write(
            root,
            "theme/theme.yaml",
            "index_template: [index.html]\nposts_template: [post.html]\n",
        );
        write(
            root,
            "theme/index.html",
            "{{.window_title}}:{{range .item}}{{.title}};{{end}}{{if .next}}more{{end}}",
        );
        write(root, "theme/post.html", "{{.site_title}}:{{.item.title}}");
        write(
            root,
            "posts/kickflip.md",
            &format!(
                "---\ntitle: Kickflip\ndate: 2021-02-01\ntags: [articles, {}]\n---\n\
                 Flip it.\n",
                second
            ),
        );
        write(
            root,
            "posts/borrowck.md",
            &format!(
                "---\ntitle: Borrowck\ndate: 2021-03-01\ntags: [articles, {}]\n---\n\
                 Borrow it.\n",
                first
            ),
        );
        write(root, "assets/style.css", "body {}");
        dir
    }

    #[test]
    fn test_build_site() -> Result<()> {
        let dir = project("[software, skateboarding]");
        let config = Config::from_directory(dir.path(), None).unwrap();
        build_site(&config)?;

        let out = dir.path().join("_site");
        let read = |relative: &str| fs::read_to_string(out.join(relative)).unwrap();
        assert_eq!("cberes:Borrowck;more", read("pages/index.html"));
        assert_eq!("cberes:Kickflip;", read("pages/1.html"));
        assert_eq!("cberes:Borrowck;more", read("index.html"));
        assert_eq!("cberes:Borrowck;", read("pages/software/index.html"));
        assert_eq!("cberes:Kickflip;", read("pages/skateboarding/index.html"));
        assert_eq!("Corey Beres:Kickflip", read("posts/kickflip.html"));
        assert_eq!("body {}", read("assets/style.css"));
        let feed = read("rss.xml");
        assert!(feed.contains("https://cberes.com/posts/borrowck.html"));
        assert!(feed.contains("https://cberes.com/posts/kickflip.html"));
        Ok(())
    }

    #[test]
    fn test_tag_mismatch_is_fatal() {
        let dir = project("[software, perl]");
        let config = Config::from_directory(dir.path(), None).unwrap();
        match build_site(&config) {
            Err(Error::Tags(mismatch)) => {
                assert_eq!(
                    vec!["skateboarding"],
                    mismatch.to_add.iter().map(String::as_str).collect::<Vec<&str>>()
                );
                assert_eq!(
                    vec!["perl"],
                    mismatch.to_remove.iter().map(String::as_str).collect::<Vec<&str>>()
                );
            }
            Err(err) => panic!("wanted a tag mismatch; got {}", err),
            Ok(()) => panic!("wanted a tag mismatch; build succeeded"),
        }
        assert!(!dir.path().join("_site").exists());
    }

    #[test]
    fn test_tags_sharing_a_listing_directory_are_fatal() {
        let dir = project_with_tags("[Rust, rust]", "Rust", "rust");
        let config = Config::from_directory(dir.path(), None).unwrap();
        match build_site(&config) {
            Err(Error::Slugs(SlugError::Shared { slug, tags })) => {
                assert_eq!("rust", slug);
                assert_eq!(vec!["Rust", "rust"], tags);
            }
            Err(err) => panic!("wanted a slug error; got {}", err),
            Ok(()) => panic!("wanted a slug error; build succeeded"),
        }
        assert!(!dir.path().join("_site").exists());
    }

    #[test]
    fn test_tag_with_empty_slug_is_fatal() {
        let dir = project_with_tags("[software, '#']", "software", "'#'");
        let config = Config::from_directory(dir.path(), None).unwrap();
        match build_site(&config) {
            Err(Error::Slugs(SlugError::Empty(tag))) => assert_eq!("#", tag),
            Err(err) => panic!("wanted a slug error; got {}", err),
            Ok(()) => panic!("wanted a slug error; build succeeded"),
        }
        assert!(!dir.path().join("_site").exists());
    }
}
