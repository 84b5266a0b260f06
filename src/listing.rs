//! Groups posts into listings (the main index plus one per known tag) and
//! paginates them. A listing rooted at `{url}` and `{output_directory}` has
//! its first page at `index.html` and subsequent pages at `1.html`, `2.html`,
//! etc.

use crate::post::Post;
use crate::tag::Tag;
use crate::taxonomy::KnownTags;
use std::path::{Path, PathBuf};
use url::{ParseError, Url};

/// A collection of [`Post`]s associated with a tag, or with no tag for the
/// main index containing every post that carries the implicit tag.
pub struct Listing<'a> {
    /// The tag this listing is for, or `None` for the main index.
    pub tag: Option<Tag>,

    /// The directory URL for the listing's pages. Ends with a slash.
    pub url: Url,

    /// The output directory for the listing's pages.
    pub output_directory: PathBuf,

    /// The posts in the listing, newest first.
    pub posts: Vec<&'a Post>,
}

/// One page of a [`Listing`].
pub struct ListingPage<'a> {
    /// The zero-based page number.
    pub number: usize,

    /// The tag of the listing this page belongs to.
    pub tag: Option<&'a Tag>,

    /// The posts on this page.
    pub posts: &'a [&'a Post],

    /// The target location on disk for the output file.
    pub file_path: PathBuf,

    /// The URL of this page.
    pub url: Url,

    /// The URL for the previous page, if any.
    pub prev: Option<Url>,

    /// The URL for the next page, if any.
    pub next: Option<Url>,
}

impl<'a> Listing<'a> {
    /// The main index: every post carrying `implicit_tag`, rooted directly at
    /// `index_url` and `index_output_directory`.
    pub fn main(
        posts: &'a [Post],
        implicit_tag: &str,
        index_url: &Url,
        index_output_directory: &Path,
    ) -> Listing<'a> {
        Listing {
            tag: None,
            url: index_url.clone(),
            output_directory: index_output_directory.to_owned(),
            posts: posts.iter().filter(|post| post.has_tag(implicit_tag)).collect(),
        }
    }

    /// The listing for a single tag: every post carrying `name`, rooted at
    /// `{index_url}/{slug}/` and `{index_output_directory}/{slug}/`.
    pub fn for_tag(
        name: &str,
        posts: &'a [Post],
        index_url: &Url,
        index_output_directory: &Path,
    ) -> Result<Listing<'a>, ParseError> {
        let tag = Tag::new(name, index_url)?;
        let slug = tag.slug();
        Ok(Listing {
            url: index_url.join(&format!("{}/", slug))?,
            output_directory: index_output_directory.join(&slug),
            posts: posts.iter().filter(|post| post.has_tag(name)).collect(),
            tag: Some(tag),
        })
    }

    /// Splits the listing into pages of at most `page_size` posts. An empty
    /// listing still gets a single (empty) page so its URL resolves.
    pub fn paginate(&self, page_size: usize) -> Result<Vec<ListingPage<'_>>, ParseError> {
        let page_size = page_size.max(1);
        let chunks: Vec<&[&Post]> = match self.posts.is_empty() {
            true => vec![&self.posts[..]],
            false => self.posts.chunks(page_size).collect(),
        };
        let total_pages = chunks.len();

        let mut pages = Vec::with_capacity(total_pages);
        for (i, chunk) in chunks.into_iter().enumerate() {
            pages.push(ListingPage {
                number: i,
                tag: self.tag.as_ref(),
                posts: chunk,
                file_path: self.output_directory.join(page_file_name(i)),
                url: self.page_url(i)?,
                prev: match i {
                    0 => None,
                    _ => Some(self.page_url(i - 1)?),
                },
                next: match i + 1 < total_pages {
                    false => None,
                    true => Some(self.page_url(i + 1)?),
                },
            });
        }
        Ok(pages)
    }

    fn page_url(&self, i: usize) -> Result<Url, ParseError> {
        self.url.join(&page_file_name(i))
    }
}

fn page_file_name(i: usize) -> String {
    match i {
        0 => String::from("index.html"),
        _ => format!("{}.html", i),
    }
}

/// Builds the main index followed by exactly one listing per known tag, in
/// allow-list order.
pub fn listings<'a>(
    known_tags: &KnownTags,
    implicit_tag: &str,
    posts: &'a [Post],
    index_url: &Url,
    index_output_directory: &Path,
) -> Result<Vec<Listing<'a>>, ParseError> {
    let mut listings = Vec::with_capacity(known_tags.len() + 1);
    listings.push(Listing::main(
        posts,
        implicit_tag,
        index_url,
        index_output_directory,
    ));
    for name in known_tags.iter() {
        listings.push(Listing::for_tag(name, posts, index_url, index_output_directory)?);
    }
    Ok(listings)
}
