//! Image list bookkeeping shared by menu items and news posts.
//!
//! Entities own their images only through the URLs in their image list, so
//! every update recomputes which files fell out of the list.

/// Outcome of merging an entity's previous images with a new submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImagePlan {
    /// Image list to persist: kept URLs first, then fresh uploads.
    pub urls: Vec<String>,
    /// Previous URLs missing from `urls`, in their original order.
    pub removed: Vec<String>,
}

/// Merge `kept` and `uploaded` into the final list and diff it against `previous`.
///
/// Matching is by exact string; duplicates in `previous` are reported once.
pub fn plan_images(previous: &[String], kept: Vec<String>, uploaded: Vec<String>) -> ImagePlan {
    let mut urls = kept;
    urls.extend(uploaded);

    let mut removed: Vec<String> = Vec::new();
    for url in previous {
        if !urls.contains(url) && !removed.contains(url) {
            removed.push(url.clone());
        }
    }

    ImagePlan { urls, removed }
}

/// Returns `true` when the declared content type names an image.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .to_ascii_lowercase()
        .strip_prefix("image/")
        .is_some_and(|subtype| !subtype.is_empty())
}
