//! The library code for the `homepage` static site generator. A build runs in
//! four steps:
//!
//! 1. Parsing posts from source files on disk ([`crate::parser`])
//! 2. Reconciling the tags the posts use against the configured allow-list
//!    ([`crate::taxonomy`]); any drift fails the build
//! 3. Converting the posts into output files on disk ([`crate::listing`],
//!    [`crate::write`])
//! 4. Copying static assets ([`crate::assets`]) and writing the Atom feed
//!    ([`crate::feed`])
//!
//! The third step builds a group of listing pages for each known tag and
//! another group for all posts. Each group is paginated into pages of a
//! configurable number of posts, newest first. Listing pages show a short
//! excerpt of each post, extracted from its rendered HTML
//! ([`crate::summary`]).

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod assets;
pub mod build;
pub mod config;
pub mod feed;
pub mod listing;
mod markdown;
pub mod parser;
pub mod post;
pub mod summary;
pub mod tag;
pub mod taxonomy;
pub mod write;
