//! Conversions between on-disk names and the forms used in links and titles.
//!
//! Chapter directories may contain spaces, which links replace with
//! underscores; collection slugs use hyphens where a title has spaces.

/// Turns a chapter name taken from a link back into its directory name.
///
/// ```
/// use shelf_catalog::names::chapter_from_url;
/// assert_eq!(chapter_from_url("1_-_Intro"), "1 - Intro");
/// ```
pub fn chapter_from_url(segment: &str) -> String {
    segment.replace('_', " ")
}

/// Turns a chapter directory name into the form used in links. This is also
/// the chapter half of the names returned by
/// [`Catalog::list_combined`](crate::Catalog::list_combined).
pub fn chapter_to_url(chapter: &str) -> String {
    chapter.replace(' ', "_")
}

/// Human-readable title of a collection.
pub fn display_name(slug: &str) -> String {
    slug.replace('-', " ")
}
