//! Reconciles the tags actually used by posts against the hand-maintained
//! allow-list. Content and configuration drift apart easily (a typo in one
//! post's front-matter, a tag retired from every post but left in the list),
//! and either kind of drift fails the build before anything is published.

use crate::post::Post;
use crate::tag::slug;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The allow-list of tag names, in the order they were configured. Listing
/// pages are generated in this order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KnownTags(Vec<String>);

impl KnownTags {
    /// Builds an allow-list from tag names. Duplicates are dropped, keeping
    /// the first occurrence.
    pub fn new<I, S>(names: I) -> KnownTags
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = BTreeSet::new();
        KnownTags(
            names
                .into_iter()
                .map(Into::into)
                .filter(|name| seen.insert(name.clone()))
                .collect(),
        )
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|known| known == name)
    }

    /// Compares the `discovered` tag names against the allow-list. Succeeds
    /// only when the two sets are equal; otherwise returns a [`TagMismatch`]
    /// naming the symmetric difference.
    pub fn reconcile(&self, discovered: &BTreeSet<String>) -> Result<(), TagMismatch> {
        let known: BTreeSet<String> = self.0.iter().cloned().collect();
        let mismatch = TagMismatch {
            to_add: discovered.difference(&known).cloned().collect(),
            to_remove: known.difference(discovered).cloned().collect(),
        };
        match mismatch.is_empty() {
            true => Ok(()),
            false => Err(mismatch),
        }
    }

    /// Checks that every known tag has its own listing directory: each name
    /// must slugify to something non-empty, and no two names may share a
    /// slug (e.g., `Rust` and `rust`).
    pub fn check_slugs(&self) -> Result<(), SlugError> {
        let mut by_slug: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for name in self.0.iter() {
            let slug = slug(name);
            if slug.is_empty() {
                return Err(SlugError::Empty(name.clone()));
            }
            by_slug.entry(slug).or_default().push(name.clone());
        }
        match by_slug.into_iter().find(|(_, names)| names.len() > 1) {
            Some((slug, tags)) => Err(SlugError::Shared { slug, tags }),
            None => Ok(()),
        }
    }
}

/// Collects every tag name used by `posts` except `implicit_tag`, which marks
/// membership in the "all articles" collection rather than a category.
pub fn discover_tags(posts: &[Post], implicit_tag: &str) -> BTreeSet<String> {
    posts
        .iter()
        .flat_map(|post| post.tags.iter())
        .map(|tag| tag.name.as_str())
        .filter(|name| *name != implicit_tag)
        .map(str::to_owned)
        .collect()
}

/// Returned when the allow-list and the tags used by posts differ.
#[derive(Clone, Debug, PartialEq)]
pub struct TagMismatch {
    /// Tags used by posts but missing from the allow-list.
    pub to_add: BTreeSet<String>,

    /// Tags in the allow-list that no post uses.
    pub to_remove: BTreeSet<String>,
}

impl TagMismatch {
    fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

impl fmt::Display for TagMismatch {
    /// Displays a [`TagMismatch`] as an actionable message, e.g.,
    /// `known tags do not match tags used by posts; add: [rust]; remove:
    /// [perl]`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn list(tags: &BTreeSet<String>) -> String {
            tags.iter().map(String::as_str).collect::<Vec<&str>>().join(", ")
        }
        write!(
            f,
            "known tags do not match tags used by posts; add: [{}]; remove: [{}]",
            list(&self.to_add),
            list(&self.to_remove),
        )
    }
}

impl std::error::Error for TagMismatch {}

/// Returned when known tags can't be mapped 1:1 onto listing directories.
#[derive(Clone, Debug, PartialEq)]
pub enum SlugError {
    /// The tag's slug is empty, so its listing would land on the main index.
    Empty(String),

    /// Several tags slugify to the same listing directory.
    Shared { slug: String, tags: Vec<String> },
}

impl fmt::Display for SlugError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SlugError::Empty(tag) => {
                write!(f, "known tag `{}` has an empty slug", tag)
            }
            SlugError::Shared { slug, tags } => write!(
                f,
                "known tags [{}] share the listing directory `{}`",
                tags.join(", "),
                slug
            ),
        }
    }
}

impl std::error::Error for SlugError {}
