//! Loads the project configuration. A project is a directory containing a
//! `homepage.yaml` project file, a `posts/` directory, an optional `assets/`
//! directory, and a `theme/` directory with a `theme.yaml` naming the template
//! files. For example:
//!
//! ```yaml
//! site_root: https://cberes.com/
//! window_title: cberes
//! site_title: Corey Beres
//! known_tags: [software, skateboarding]
//! author:
//!   name: Corey Beres
//! feed:
//!   title: cberes
//!   subtitle: Mostly thoughts about software and skateboards.
//! ```

use crate::taxonomy::KnownTags;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "homepage.yaml";

/// The default output directory, relative to the project root.
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "_site";

#[derive(Deserialize)]
struct PageSize(usize);
impl Default for PageSize {
    fn default() -> Self {
        PageSize(10)
    }
}

#[derive(Deserialize)]
struct HomePage(String);
impl Default for HomePage {
    fn default() -> Self {
        HomePage(String::from("index.html"))
    }
}

#[derive(Deserialize)]
struct ImplicitTag(String);
impl Default for ImplicitTag {
    fn default() -> Self {
        ImplicitTag(String::from("articles"))
    }
}

#[derive(Deserialize)]
struct Project {
    site_root: Url,

    #[serde(default)]
    home_page: HomePage,

    #[serde(default)]
    window_title: String,

    #[serde(default)]
    site_title: String,

    #[serde(default)]
    index_page_size: PageSize,

    #[serde(default)]
    implicit_tag: ImplicitTag,

    #[serde(default)]
    known_tags: Vec<String>,

    #[serde(default)]
    globals: BTreeMap<String, String>,

    #[serde(default)]
    author: Option<Author>,

    #[serde(default)]
    feed: FeedSettings,
}

#[derive(Deserialize)]
struct Theme {
    index_template: Vec<PathBuf>,
    posts_template: Vec<PathBuf>,
}

/// The author of the site, credited in the feed.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Author {
    pub name: String,

    /// An empty email is treated as no email.
    #[serde(default)]
    pub email: Option<String>,
}

/// Feed metadata and output settings.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedSettings {
    pub title: String,
    pub subtitle: Option<String>,
    pub language: String,

    /// The feed's path relative to the output directory and the site root.
    pub output_path: String,

    /// The maximum number of entries; `0` means no limit.
    pub limit: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        FeedSettings {
            title: String::new(),
            subtitle: None,
            language: String::from("en"),
            output_path: String::from("rss.xml"),
            limit: 0,
        }
    }
}

/// The fully-resolved build configuration.
pub struct Config {
    pub title: String,
    pub window_title: String,
    pub site_title: String,
    pub globals: BTreeMap<String, String>,
    pub author: Option<Author>,
    pub feed: FeedSettings,
    pub known_tags: KnownTags,
    pub implicit_tag: String,
    pub site_root: Url,
    pub home_page: Url,
    pub posts_source_directory: PathBuf,
    pub assets_source_directory: PathBuf,
    pub root_output_directory: PathBuf,
    pub index_url: Url,
    pub index_template: Vec<PathBuf>,
    pub index_output_directory: PathBuf,
    pub index_page_size: usize,
    pub posts_url: Url,
    pub posts_template: Vec<PathBuf>,
    pub posts_output_directory: PathBuf,
    pub assets_url: Url,
    pub assets_output_directory: PathBuf,
    pub feed_url: Url,
    pub feed_output_path: PathBuf,
}

impl Config {
    /// Searches `dir` and its ancestors for a `homepage.yaml` and loads it.
    /// Output goes to `output_directory` or, if `None`, `_site` under the
    /// project root.
    pub fn from_directory(dir: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::ProjectFileNotFound),
            }
        }
    }

    /// Loads the configuration from the project file at `path`.
    pub fn from_project_file(path: &Path, output_directory: Option<&Path>) -> Result<Config> {
        let project: Project = serde_yaml::from_reader(open(path, "project")?)
            .map_err(|err| Error::Yaml(path.to_owned(), err))?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoParentDirectory(path.to_owned()))?;
        let theme_dir = project_root.join("theme");
        let theme_path = theme_dir.join("theme.yaml");
        let theme: Theme = serde_yaml::from_reader(open(&theme_path, "theme")?)
            .map_err(|err| Error::Yaml(theme_path.clone(), err))?;
        let output_directory = match output_directory {
            Some(dir) => dir.to_owned(),
            None => project_root.join(DEFAULT_OUTPUT_DIRECTORY),
        };
        tracing::debug!(
            project = %path.display(),
            output = %output_directory.display(),
            "loaded project file"
        );
        Config::new(project, theme, project_root, &theme_dir, &output_directory)
    }

    fn new(
        project: Project,
        theme: Theme,
        project_root: &Path,
        theme_dir: &Path,
        output_directory: &Path,
    ) -> Result<Config> {
        if project.index_page_size.0 < 1 {
            return Err(Error::InvalidPageSize);
        }

        let site_root = with_trailing_slash(project.site_root);
        let feed_path = project.feed.output_path.trim_start_matches('/').to_owned();
        let author = project.author.map(|author| Author {
            email: author.email.filter(|email| !email.is_empty()),
            name: author.name,
        });

        Ok(Config {
            title: match project.feed.title.is_empty() {
                true => project.window_title.clone(),
                false => project.feed.title.clone(),
            },
            window_title: project.window_title,
            site_title: project.site_title,
            globals: project.globals,
            author,
            known_tags: KnownTags::new(project.known_tags),
            implicit_tag: project.implicit_tag.0,
            home_page: site_root.join(&project.home_page.0)?,
            posts_source_directory: project_root.join("posts"),
            assets_source_directory: project_root.join("assets"),
            root_output_directory: output_directory.to_owned(),
            index_url: site_root.join("pages/")?,
            index_template: theme
                .index_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            index_output_directory: output_directory.join("pages"),
            index_page_size: project.index_page_size.0,
            posts_url: site_root.join("posts/")?,
            posts_template: theme
                .posts_template
                .iter()
                .map(|relpath| theme_dir.join(relpath))
                .collect(),
            posts_output_directory: output_directory.join("posts"),
            assets_url: site_root.join("assets/")?,
            assets_output_directory: output_directory.join("assets"),
            feed_url: site_root.join(&feed_path)?,
            feed_output_path: output_directory.join(&feed_path),
            feed: FeedSettings {
                output_path: feed_path,
                ..project.feed
            },
            site_root,
        })
    }
}

/// Appends a slash to the URL's path if it lacks one so that joining
/// relative paths keeps the last segment.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

fn open(path: &Path, kind: &'static str) -> Result<File> {
    File::open(path).map_err(|err| Error::Open {
        kind,
        path: path.to_owned(),
        err,
    })
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem loading the configuration.
#[derive(Debug)]
pub enum Error {
    /// Returned when no `homepage.yaml` exists in the directory or any
    /// ancestor.
    ProjectFileNotFound,

    /// Returned when the project file path has no parent directory.
    NoParentDirectory(PathBuf),

    /// Returned when a project or theme file can't be opened.
    Open {
        kind: &'static str,
        path: PathBuf,
        err: std::io::Error,
    },

    /// Returned when a project or theme file isn't valid.
    Yaml(PathBuf, serde_yaml::Error),

    /// Returned when `index_page_size` is zero.
    InvalidPageSize,

    /// Returned when a configured URL can't be joined onto the site root.
    UrlParse(url::ParseError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ProjectFileNotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::NoParentDirectory(path) => write!(
                f,
                "Can't get parent directory for project file '{}'",
                path.display()
            ),
            Error::Open { kind, path, err } => {
                write!(f, "Opening {} file `{}`: {}", kind, path.display(), err)
            }
            Error::Yaml(path, err) => write!(f, "Loading `{}`: {}", path.display(), err),
            Error::InvalidPageSize => write!(f, "`index_page_size` must be at least 1"),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ProjectFileNotFound => None,
            Error::NoParentDirectory(_) => None,
            Error::Open { err, .. } => Some(err),
            Error::Yaml(_, err) => Some(err),
            Error::InvalidPageSize => None,
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<url::ParseError> for Error {
    /// Converts [`url::ParseError`]s into [`Error`]. This allows us to use
    /// the `?` operator when joining URLs.
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}
