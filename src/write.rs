use crate::config::Config;
use crate::listing::{Listing, ListingPage};
use crate::post::Post;
use gtmpl::{Template, Value};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use url::Url;

/// The variables available to every template regardless of page kind:
/// `window_title`, `site_title`, `home_page`, `assets_url`, `feed_url`, plus
/// every entry of the project's `globals` map.
pub struct Globals(HashMap<String, Value>);

impl Globals {
    pub fn from_config(config: &Config) -> Globals {
        let mut m: HashMap<String, Value> = config
            .globals
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let mut insert = |k: &str, v: String| {
            m.insert(k.to_owned(), Value::String(v));
        };
        insert("window_title", config.window_title.clone());
        insert("site_title", config.site_title.clone());
        insert("home_page", config.home_page.to_string());
        insert("assets_url", config.assets_url.to_string());
        insert("feed_url", config.feed_url.to_string());
        Globals(m)
    }
}

/// Responsible for templating and writing HTML pages to disk from
/// [`Listing`]s and [`Post`]s.
pub struct Writer<'a> {
    /// The template for post pages.
    pub posts_template: &'a Template,

    /// The template for listing pages.
    pub index_template: &'a Template,

    /// The number of posts per listing page.
    pub index_page_size: usize,

    /// Variables merged into every page's value.
    pub globals: &'a Globals,
}

impl Writer<'_> {
    /// Takes a single [`Page`], templates it, and writes it to disk.
    fn write_page(&self, page: &Page) -> Result<()> {
        let mut value = page.to_value();
        if let Value::Object(obj) = &mut value {
            for (k, v) in self.globals.0.iter() {
                obj.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        tracing::debug!(path = %page.file_path.display(), "writing page");
        let context = gtmpl::Context::from(value)?;
        page.template
            .execute(&mut std::fs::File::create(&page.file_path)?, &context)?;
        Ok(())
    }

    /// Writes every page of every listing followed by every post page.
    pub fn write_site(&self, listings: &[Listing], posts: &[Post]) -> Result<()> {
        let mut pages = Vec::new();
        for listing in listings {
            let listing_pages = listing.paginate(self.index_page_size)?;
            pages.extend(listing_pages.iter().map(|p| listing_page(p, self.index_template)));
        }
        pages.extend(post_pages(posts, self.posts_template));

        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        for page in &pages {
            if let Some(dir) = page.file_path.parent() {
                if seen_dirs.insert(dir.to_owned()) {
                    std::fs::create_dir_all(dir)?;
                }
            }
            self.write_page(page)?;
        }
        tracing::info!(pages = pages.len(), "wrote pages");
        Ok(())
    }
}

/// An object representing an output HTML file. A [`Page`] can be converted to a
/// [`Value`] and thus rendered in a template via [`Page::to_value`].
struct Page<'a> {
    /// The main item for the page: a post, or an array of post summaries.
    item: Value,

    /// Extra page-kind-specific fields (e.g., `tag` for listing pages).
    extra: HashMap<String, Value>,

    /// The target location on disk for the output file.
    file_path: PathBuf,

    /// The URL for the previous page, if any.
    prev: Option<Url>,

    /// The URL for the next page, if any.
    next: Option<Url>,

    /// The template with which the page will be rendered.
    template: &'a Template,
}

impl Page<'_> {
    /// Converts a [`Page`] into a [`Value`]. The result is a [`Value::Object`]
    /// with fields `item`, `prev`, and `next` (see [`Page`] for descriptions)
    /// plus the extra fields.
    fn to_value(&self) -> Value {
        let option_to_value = |opt: &Option<Url>| match opt {
            Some(url) => Value::String(url.to_string()),
            None => Value::Nil,
        };

        let mut m = self.extra.clone();
        m.insert("item".to_owned(), self.item.clone());
        m.insert("prev".to_owned(), option_to_value(&self.prev));
        m.insert("next".to_owned(), option_to_value(&self.next));
        Value::Object(m)
    }
}

/// Creates the [`Page`] for one page of a listing. Besides `item` (the post
/// summaries), listing pages carry `tag` (nil for the main index),
/// `page_url`, and the one-based `page_number`.
fn listing_page<'t>(page: &ListingPage, template: &'t Template) -> Page<'t> {
    let mut extra = HashMap::new();
    extra.insert(
        "tag".to_owned(),
        match page.tag {
            Some(tag) => Value::from(tag),
            None => Value::Nil,
        },
    );
    extra.insert("page_url".to_owned(), Value::String(page.url.to_string()));
    extra.insert(
        "page_number".to_owned(),
        Value::String((page.number + 1).to_string()),
    );
    Page {
        item: Value::Array(page.posts.iter().map(|p| p.summarize()).collect()),
        extra,
        file_path: page.file_path.clone(),
        prev: page.prev.clone(),
        next: page.next.clone(),
        template,
    }
}

/// Creates all of the post [`Page`]s. `prev` is the newer neighbor and `next`
/// the older one, matching the listing order.
fn post_pages<'a>(posts: &'a [Post], template: &'a Template) -> impl Iterator<Item = Page<'a>> {
    posts.iter().enumerate().map(move |(i, post)| Page {
        item: post.to_value(),
        extra: HashMap::new(),
        file_path: post.file_path.clone(),
        prev: match i < 1 {
            true => None,
            false => Some(posts[i - 1].url.clone()),
        },
        next: posts.get(i + 1).map(|p| p.url.clone()),
        template,
    })
}

/// Loads the template file contents in order, concatenates them, and parses
/// the result into a template with the site's functions registered.
pub fn parse_template<P: AsRef<Path>>(template_files: impl Iterator<Item = P>) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        let template_file = template_file.as_ref();
        let file_contents =
            std::fs::read_to_string(template_file).map_err(|err| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err,
            })?;
        contents.push_str(&file_contents);
        contents.push(' ');
    }
    parse_template_str(&contents)
}

fn parse_template_str(contents: &str) -> Result<Template> {
    let mut template = Template::default();
    template.add_func("firstItems", first_items);
    template.parse(contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// Template function: `firstItems ARRAY COUNT` returns the first `COUNT`
/// items of `ARRAY` (all of them if there are fewer).
fn first_items(args: &[Value]) -> std::result::Result<Value, String> {
    match args {
        [Value::Array(items), Value::Number(count)] => match count.as_u64() {
            Some(count) => Ok(Value::Array(
                items.iter().take(count as usize).cloned().collect(),
            )),
            None => Err(format!("firstItems: invalid count {:?}", count)),
        },
        [Value::Nil, _] => Ok(Value::Array(Vec::new())),
        _ => Err(String::from("firstItems: wanted an array and a count")),
    }
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned when a page URL can't be built.
    UrlParse(url::ParseError),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => err.fmt(f),
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate(err) => write!(f, "Parsing template: {}", err),
            Error::UrlParse(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::OpenTemplateFile { err, .. } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::UrlParse(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::test_post;

    fn render(template: &str, value: Value) -> Result<String> {
        let template = parse_template_str(template)?;
        let mut out: Vec<u8> = Vec::new();
        template.execute(&mut out, &gtmpl::Context::from(value)?)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    fn strings(items: &[&str]) -> Value {
        Value::Array(items.iter().map(|s| Value::String(s.to_string())).collect())
    }

    #[test]
    fn test_first_items() -> Result<()> {
        assert_eq!(
            "ab",
            render("{{range firstItems . 2}}{{.}}{{end}}", strings(&["a", "b", "c"]))?
        );
        assert_eq!(
            "a",
            render("{{range firstItems . 5}}{{.}}{{end}}", strings(&["a"]))?
        );
        Ok(())
    }

    #[test]
    fn test_post_pages_link_neighbors() {
        let template = Template::default();
        let posts = vec![
            test_post("new", "2021-03-01", &[]),
            test_post("mid", "2021-02-01", &[]),
            test_post("old", "2021-01-01", &[]),
        ];
        let pages: Vec<Page> = post_pages(&posts, &template).collect();
        assert_eq!(None, pages[0].prev);
        assert_eq!(Some(posts[1].url.clone()), pages[0].next);
        assert_eq!(Some(posts[0].url.clone()), pages[1].prev);
        assert_eq!(Some(posts[2].url.clone()), pages[1].next);
        assert_eq!(None, pages[2].next);
    }

    #[test]
    fn test_write_site() -> Result<()> {
        use crate::taxonomy::KnownTags;

        let out = tempfile::tempdir()?;
        let posts_dir = out.path().join("posts");
        let mut posts = vec![
            test_post("b", "2021-02-01", &["articles", "software"]),
            test_post("a", "2021-01-01", &["articles", "skateboarding"]),
        ];
        for post in posts.iter_mut() {
            post.file_path = posts_dir.join(format!("{}.html", post.id));
        }

        let index_template = parse_template_str(
            "{{.site_title}}|{{if .tag}}{{.tag.tag}}{{else}}all{{end}}|\
             {{range .item}}{{.title}} ({{.date_string_short}}): {{.summary}};{{end}}",
        )?;
        let posts_template = parse_template_str("{{.window_title}}|{{.item.title}}|{{.item.body}}")?;
        let mut m = HashMap::new();
        m.insert("site_title".to_owned(), Value::String("Corey Beres".to_owned()));
        m.insert("window_title".to_owned(), Value::String("cberes".to_owned()));
        let globals = Globals(m);

        let index_url = Url::parse("https://example.org/pages/")?;
        let pages_dir = out.path().join("pages");
        let known = KnownTags::new(vec!["software", "skateboarding"]);
        let listings = crate::listing::listings(&known, "articles", &posts, &index_url, &pages_dir)?;

        Writer {
            posts_template: &posts_template,
            index_template: &index_template,
            index_page_size: 10,
            globals: &globals,
        }
        .write_site(&listings, &posts)?;

        assert_eq!(
            "Corey Beres|all|Post b (2/1/2021): Body of b.;Post a (1/1/2021): Body of a.;",
            std::fs::read_to_string(pages_dir.join("index.html"))?
        );
        assert_eq!(
            "Corey Beres|software|Post b (2/1/2021): Body of b.;",
            std::fs::read_to_string(pages_dir.join("software/index.html"))?
        );
        assert!(pages_dir.join("skateboarding/index.html").is_file());
        assert_eq!(
            "cberes|Post a|<p>Body of a.</p>",
            std::fs::read_to_string(posts_dir.join("a.html"))?
        );
        Ok(())
    }
}
