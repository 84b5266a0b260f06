//! Defines the [`Parser`] and [`Error`] types and the logic for parsing posts
//! from the file system into memory.

use std::{
    fmt,
    fs::File,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use url::Url;
use walkdir::WalkDir;

use crate::{markdown, post::Post, summary::extract_summary, tag::Tag};

const MARKDOWN_EXTENSION: &str = "md";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `index_url` is the base URL for listing pages. It's used to prefix tag
    /// page URLs (i.e., the URL for the first page of a tag is
    /// `{index_url}/{tag_slug}/index.html`).
    index_url: &'a Url,

    /// `posts_url` is the base URL for post pages (i.e., the URL for a post
    /// is `{posts_url}/{post_id}.html`).
    posts_url: &'a Url,

    /// `posts_directory` is the directory in which post pages will be
    /// rendered.
    posts_directory: &'a Path,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser. See fields on [`Parser`] for argument
    /// descriptions.
    pub fn new(index_url: &'a Url, posts_url: &'a Url, posts_directory: &'a Path) -> Parser<'a> {
        Parser {
            index_url,
            posts_url,
            posts_directory,
        }
    }

    /// Recursively searches `source_directory` for post files (extension =
    /// `.md`) and returns a list of [`Post`] objects sorted by date (most
    /// recent first). Each post file must be structured as follows:
    ///
    /// 1. Initial frontmatter fence (`---`)
    /// 2. YAML frontmatter with field `title` and optionally `date` and `tags`
    /// 3. Terminal frontmatter fence (`---`)
    /// 4. Post body
    ///
    /// For example:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// tags: [articles, software]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self, source_directory: &Path) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        for result in WalkDir::new(source_directory).sort_by(|a, b| a.file_name().cmp(b.file_name())) {
            let entry = result?;
            if !entry.file_type().is_file()
                || entry.path().extension().map_or(true, |ext| ext != MARKDOWN_EXTENSION)
            {
                continue;
            }
            let relative_path = entry
                .path()
                .strip_prefix(source_directory)
                .map_err(|_| InvalidFileNameError(entry.path().to_owned()))?;
            posts.push(self.parse_post(source_directory, relative_path)?);
        }

        sort_posts(&mut posts);
        tracing::info!(count = posts.len(), "parsed posts");
        Ok(posts)
    }

    /// Parses a single [`Post`], annotating any error with the file's path.
    fn parse_post(&self, posts_source_directory: &Path, relative_path: &Path) -> Result<Post> {
        tracing::debug!(path = %relative_path.display(), "parsing post");
        match self._parse_post(posts_source_directory, relative_path) {
            Ok(p) => Ok(p),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", relative_path.display()),
                Box::new(e),
            )),
        }
    }

    fn _parse_post(&self, posts_source_directory: &Path, relative_path: &Path) -> Result<Post> {
        use std::io::Read;
        let mut contents = String::new();
        File::open(posts_source_directory.join(relative_path))?.read_to_string(&mut contents)?;
        let input: &str = &contents;

        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        let frontmatter: Frontmatter = serde_yaml::from_str(&input[yaml_start..yaml_stop])?;

        let id = post_id(relative_path)?;
        let file_name = format!("{}.html", id);

        let mut tags: Vec<Tag> = Vec::new();
        for name in frontmatter.tags.into_vec() {
            let tag = Tag::new(&name, self.index_url)?;
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let mut body = String::new();
        markdown::to_html(&mut body, &input[body_start..]);
        let summary = extract_summary(&body);

        Ok(Post {
            file_path: self.posts_directory.join(&file_name),
            url: self.posts_url.join(&file_name)?,
            id,
            title: frontmatter.title,
            date: frontmatter.date,
            body,
            summary,
            tags,
        })
    }
}

/// Returns the byte offsets of the YAML start, the YAML end, and the body
/// start. The closing fence must begin a line.
fn frontmatter_indices(input: &str) -> Result<(usize, usize, usize)> {
    const FENCE: &str = "---";
    const CLOSING_FENCE: &str = "\n---";
    if !input.starts_with(FENCE) {
        return Err(Error::FrontmatterMissingStartFence);
    }
    match input[FENCE.len()..].find(CLOSING_FENCE) {
        None => Err(Error::FrontmatterMissingEndFence),
        Some(offset) => Ok((
            FENCE.len(),                                // yaml_start
            FENCE.len() + offset,                       // yaml_stop
            FENCE.len() + offset + CLOSING_FENCE.len(), // body_start
        )),
    }
}

/// Builds the post id from its path relative to the posts directory, e.g.,
/// `2021/ollie.md` becomes `2021/ollie` on every platform.
fn post_id(relative_path: &Path) -> Result<String> {
    let stem = relative_path.with_extension("");
    let mut parts = Vec::new();
    for component in stem.components() {
        parts.push(
            component
                .as_os_str()
                .to_str()
                .ok_or_else(|| InvalidFileNameError(relative_path.to_owned()))?,
        );
    }
    Ok(parts.join("/"))
}

/// Sorts posts newest first. Posts with unparseable dates sort after every
/// dated post, ordered by their raw date. Ties are broken by id.
fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.parsed_date()
            .cmp(&a.parsed_date())
            .then_with(|| b.date.cmp(&a.date))
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[derive(Deserialize)]
struct Frontmatter {
    /// The title of the post.
    #[serde(alias = "Title")]
    title: String,

    /// The date of the post. Posts without one are treated as undated.
    #[serde(default, alias = "Date")]
    date: String,

    /// The tags associated with the post.
    #[serde(default, alias = "Tags")]
    tags: TagList,
}

/// Front-matter tags may be a single string or a list of strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagList {
    One(String),
    Many(Vec<String>),
}

impl Default for TagList {
    fn default() -> Self {
        TagList::Many(Vec::new())
    }
}

impl TagList {
    fn into_vec(self) -> Vec<String> {
        match self {
            TagList::One(tag) => vec![tag],
            TagList::Many(tags) => tags,
        }
    }
}

#[derive(Debug)]
pub struct InvalidFileNameError(PathBuf);

impl fmt::Display for InvalidFileNameError {
    /// Displays an [`InvalidFileNameError`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid file name: {:?}", &self.0)
    }
}

impl std::error::Error for InvalidFileNameError {}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file is missing its starting frontmatter
    /// fence (`---`).
    FrontmatterMissingStartFence,

    /// Returned when a post source file is missing its terminal frontmatter
    /// fence (`---` i.e., the starting fence was found but the ending one was
    /// missing).
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when there is a problem parsing URLs.
    UrlParse(url::ParseError),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// Returned when a source file name isn't valid UTF-8.
    InvalidFileName(InvalidFileNameError),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingStartFence => {
                write!(f, "Post must begin with `---`")
            }
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::InvalidFileName(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingStartFence => None,
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::InvalidFileName(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<InvalidFileNameError> for Error {
    fn from(err: InvalidFileNameError) -> Error {
        Error::InvalidFileName(err)
    }
}

impl From<url::ParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`].
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`].
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
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

    #[test]
    fn test_parse_posts() -> Result<()> {
        let source = tempfile::tempdir()?;
        write(
            source.path(),
            "older.md",
            "---\ntitle: Older\ndate: 2020-05-01\ntags: [articles, software]\n---\n\
             First paragraph.\n\nSecond paragraph.\n",
        );
        write(
            source.path(),
            "2021/newer.md",
            "---\nTitle: Newer\nDate: 2021-06-01\nTags: skateboarding\n---\n\
             <div class=\"summary\">Ollies.</div>\n\nBody.\n",
        );
        write(source.path(), "notes.txt", "not a post");

        let index_url = Url::parse("https://example.com/pages/")?;
        let posts_url = Url::parse("https://example.com/posts/")?;
        let posts_directory = Path::new("/out/posts");
        let parser = Parser::new(&index_url, &posts_url, posts_directory);
        let posts = parser.parse_posts(source.path())?;

        assert_eq!(2, posts.len());

        let newer = &posts[0];
        assert_eq!("2021/newer", newer.id);
        assert_eq!("Newer", newer.title);
        assert_eq!("https://example.com/posts/2021/newer.html", newer.url.as_str());
        assert_eq!(Path::new("/out/posts/2021/newer.html"), newer.file_path);
        assert_eq!("Ollies.", newer.summary);
        assert!(newer.has_tag("skateboarding"));

        let older = &posts[1];
        assert_eq!("older", older.id);
        assert_eq!("First paragraph.", older.summary);
        assert_eq!(
            vec!["articles", "software"],
            older.tags.iter().map(|t| t.name.as_str()).collect::<Vec<&str>>()
        );
        assert_eq!(
            "https://example.com/pages/software/index.html",
            older.tags[1].url.as_str()
        );
        Ok(())
    }

    #[test]
    fn test_missing_fences() {
        assert!(matches!(
            frontmatter_indices("title: x\n"),
            Err(Error::FrontmatterMissingStartFence)
        ));
        assert!(matches!(
            frontmatter_indices("---\ntitle: x\n"),
            Err(Error::FrontmatterMissingEndFence)
        ));
    }

    #[test]
    fn test_errors_are_annotated_with_path() -> Result<()> {
        let source = tempfile::tempdir()?;
        write(source.path(), "broken.md", "no frontmatter here");
        let url = Url::parse("https://example.com/")?;
        let parser = Parser::new(&url, &url, Path::new("/out"));
        let err = parser.parse_posts(source.path()).unwrap_err();
        assert_eq!(
            "parsing post `broken.md`: Post must begin with `---`",
            err.to_string()
        );
        Ok(())
    }

    #[test]
    fn test_duplicate_tags_are_dropped() -> Result<()> {
        let source = tempfile::tempdir()?;
        write(
            source.path(),
            "dup.md",
            "---\ntitle: Dup\ndate: 2020-01-01\ntags: [rust, rust]\n---\nBody\n",
        );
        let url = Url::parse("https://example.com/")?;
        let posts = Parser::new(&url, &url, Path::new("/out")).parse_posts(source.path())?;
        assert_eq!(1, posts[0].tags.len());
        Ok(())
    }

    #[test]
    fn test_sort_newest_first_with_undated_last() {
        use crate::post::test_post;
        let mut posts = vec![
            test_post("undated", "someday", &[]),
            test_post("old", "2019-01-01", &[]),
            test_post("new", "2021-01-01", &[]),
            test_post("also-new", "2021-01-01", &[]),
        ];
        sort_posts(&mut posts);
        assert_eq!(
            vec!["also-new", "new", "old", "undated"],
            posts.iter().map(|p| p.id.as_str()).collect::<Vec<&str>>()
        );
    }

    #[test]
    fn test_closing_fence_must_start_a_line() -> Result<()> {
        let input = "---\ntitle: before---after\n---\nBody\n";
        let (yaml_start, yaml_stop, body_start) = frontmatter_indices(input)?;
        assert_eq!("\ntitle: before---after", &input[yaml_start..yaml_stop]);
        assert_eq!("\nBody\n", &input[body_start..]);
        Ok(())
    }

    #[test]
    fn test_post_without_date_is_undated() -> Result<()> {
        let source = tempfile::tempdir()?;
        write(
            source.path(),
            "dated.md",
            "---\ntitle: Dated\ndate: 2020-01-01\n---\nBody\n",
        );
        write(source.path(), "undated.md", "---\ntitle: Undated\n---\nBody\n");
        let url = Url::parse("https://example.com/")?;
        let posts = Parser::new(&url, &url, Path::new("/out")).parse_posts(source.path())?;
        assert_eq!(
            vec!["dated", "undated"],
            posts.iter().map(|p| p.id.as_str()).collect::<Vec<&str>>()
        );
        assert_eq!("", posts[1].date);
        assert_eq!(None, posts[1].parsed_date());
        Ok(())
    }
}
