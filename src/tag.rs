//! Defines the [`Tag`] type, which represents a [`crate::post::Post`] tag.

use gtmpl::Value;
use std::hash::{Hash, Hasher};
use url::{ParseError, Url};

/// Represents a [`crate::post::Post`] tag. The `name` is kept exactly as it
/// was written in the front-matter since that's what the allow-list is
/// checked against; the `url` points at the tag's first listing page.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag's name as written in the post front-matter.
    pub name: String,

    /// The URL for the tag's first listing page, i.e.,
    /// `{index_url}/{slug}/index.html`.
    pub url: Url,
}

impl Tag {
    /// Builds a [`Tag`] from its name and the base URL for listing pages.
    pub fn new(name: &str, index_url: &Url) -> Result<Tag, ParseError> {
        Ok(Tag {
            name: name.to_owned(),
            // The trailing slash on the slug matters: without it `Url::join`
            // treats the slug as a file name and replaces it.
            url: index_url.join(&format!("{}/index.html", slug(name)))?,
        })
    }

    /// The path segment used for this tag's listing directory.
    pub fn slug(&self) -> String {
        slug(&self.name)
    }
}

/// Slugifies a tag name so e.g., `Open Source` lands in `open-source/`.
pub fn slug(name: &str) -> String {
    ::slug::slugify(name)
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `name`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `name` field.
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
impl Eq for Tag {}

impl From<&Tag> for Value {
    /// Converts [`Tag`]s into [`Value`]s for templating.
    fn from(t: &Tag) -> Value {
        use std::collections::HashMap;
        let mut m: HashMap<String, Value> = HashMap::new();
        m.insert("tag".to_owned(), Value::String(t.name.clone()));
        m.insert("slug".to_owned(), Value::String(t.slug()));
        m.insert("url".to_owned(), Value::String(t.url.to_string()));
        Value::Object(m)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tag_url_uses_slug() -> Result<(), ParseError> {
        let index_url = Url::parse("https://example.org/pages/")?;
        let tag = Tag::new("Open Source", &index_url)?;
        assert_eq!("Open Source", tag.name);
        assert_eq!(
            "https://example.org/pages/open-source/index.html",
            tag.url.as_str()
        );
        Ok(())
    }

    #[test]
    fn test_tags_compare_by_name() -> Result<(), ParseError> {
        let a = Tag::new("rust", &Url::parse("https://a.org/pages/")?)?;
        let b = Tag::new("rust", &Url::parse("https://b.org/pages/")?)?;
        assert_eq!(a, b);
        Ok(())
    }
}
