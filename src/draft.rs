// In-progress listing form state. Image URLs are only changed through merge/remove,
// which check the capacity invariant and apply the change in one step.

use crate::{
    error::{ClientError, ClientResult},
    models::ListingDraft,
};

pub const MAX_IMAGES: usize = 6;

pub const IMAGE_LIMIT_NOTICE: &str = "You can only upload 6 images per listing";
pub const NO_IMAGES_NOTICE: &str = "You must upload at least one image";
pub const DISCOUNT_NOTICE: &str = "Discount price must be lower than regular price";

#[derive(Debug, Clone)]
pub struct ListingDraftStore {
    draft: ListingDraft,
    max_images: usize,
}

impl Default for ListingDraftStore {
    fn default() -> Self {
        Self::new(MAX_IMAGES)
    }
}

impl ListingDraftStore {
    pub fn new(max_images: usize) -> Self {
        Self {
            draft: ListingDraft::default(),
            max_images,
        }
    }

    /// Replaces the whole draft, e.g. with a listing loaded for editing. A draft
    /// carrying more images than the limit is refused and the store is kept.
    pub fn load(&mut self, draft: ListingDraft) -> ClientResult<()> {
        if draft.image_urls.len() > self.max_images {
            tracing::warn!(
                images = draft.image_urls.len(),
                max = self.max_images,
                "Refused to load draft over image capacity"
            );
            return Err(ClientError::validation(IMAGE_LIMIT_NOTICE));
        }
        self.draft = draft;
        Ok(())
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    pub fn image_urls(&self) -> &[String] {
        &self.draft.image_urls
    }

    pub fn max_images(&self) -> usize {
        self.max_images
    }

    /// Slots still free for new images.
    pub fn remaining_capacity(&self) -> usize {
        self.max_images.saturating_sub(self.draft.image_urls.len())
    }

    /// Applies a non-image field edit. Image URLs are restored afterwards so
    /// the capacity invariant cannot be bypassed from here.
    pub fn edit(&mut self, apply: impl FnOnce(&mut ListingDraft)) {
        let image_urls = std::mem::take(&mut self.draft.image_urls);
        apply(&mut self.draft);
        self.draft.image_urls = image_urls;
    }

    /// Appends `urls` in order, or leaves the store untouched if the result
    /// would exceed the image limit.
    pub fn merge(&mut self, urls: Vec<String>) -> ClientResult<()> {
        let merged_len = self.draft.image_urls.len() + urls.len();
        if merged_len > self.max_images {
            tracing::warn!(
                current = self.draft.image_urls.len(),
                incoming = urls.len(),
                max = self.max_images,
                "Rejected image merge over capacity"
            );
            return Err(ClientError::validation(IMAGE_LIMIT_NOTICE));
        }
        self.draft.image_urls.extend(urls);
        Ok(())
    }

    /// Removes the image at `index`, keeping the others in order.
    pub fn remove(&mut self, index: usize) -> ClientResult<String> {
        if index >= self.draft.image_urls.len() {
            return Err(ClientError::validation(format!(
                "No image at position {} (draft has {})",
                index,
                self.draft.image_urls.len()
            )));
        }
        Ok(self.draft.image_urls.remove(index))
    }

    pub fn validate_for_submit(&self) -> ClientResult<()> {
        if self.draft.image_urls.is_empty() {
            return Err(ClientError::validation(NO_IMAGES_NOTICE));
        }
        if self.draft.offer && self.draft.regular_price < self.draft.discount_price {
            return Err(ClientError::validation(DISCOUNT_NOTICE));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("https://cdn/{prefix}{i}.jpg")).collect()
    }

    #[test]
    fn merge_appends_in_order_up_to_the_cap() {
        let mut store = ListingDraftStore::default();
        store.merge(urls("a", 4)).unwrap();
        store.merge(urls("b", 2)).unwrap();
        assert_eq!(store.image_urls().len(), 6);
        assert_eq!(store.image_urls()[4], "https://cdn/b0.jpg");
        assert_eq!(store.remaining_capacity(), 0);
    }

    #[test]
    fn merge_over_capacity_leaves_store_unchanged() {
        let mut store = ListingDraftStore::default();
        store.merge(urls("a", 5)).unwrap();
        let before = store.image_urls().to_vec();

        let err = store.merge(urls("b", 2)).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(store.image_urls(), before.as_slice());
    }

    #[test]
    fn remove_preserves_relative_order() {
        let mut store = ListingDraftStore::default();
        store.merge(urls("a", 3)).unwrap();
        assert_eq!(store.remove(1).unwrap(), "https://cdn/a1.jpg");
        assert_eq!(store.image_urls(), ["https://cdn/a0.jpg", "https://cdn/a2.jpg"]);
        assert!(store.remove(2).is_err());
        assert_eq!(store.image_urls().len(), 2);
    }

    #[test]
    fn submit_requires_an_image() {
        let store = ListingDraftStore::default();
        let err = store.validate_for_submit().unwrap_err();
        assert_eq!(err.to_string(), NO_IMAGES_NOTICE);
    }

    #[test]
    fn submit_rejects_discount_above_regular_on_offer() {
        let mut store = ListingDraftStore::default();
        store.merge(urls("a", 1)).unwrap();
        store.edit(|draft| {
            draft.offer = true;
            draft.regular_price = 100.0;
            draft.discount_price = 120.0;
        });
        assert_eq!(store.validate_for_submit().unwrap_err().to_string(), DISCOUNT_NOTICE);

        store.edit(|draft| draft.discount_price = 100.0);
        assert!(store.validate_for_submit().is_ok());

        store.edit(|draft| {
            draft.offer = false;
            draft.discount_price = 500.0;
        });
        assert!(store.validate_for_submit().is_ok());
    }

    #[test]
    fn load_refuses_drafts_over_the_image_limit() {
        let mut store = ListingDraftStore::default();
        store.merge(urls("a", 1)).unwrap();

        let oversized = ListingDraft {
            name: "Imported".to_string(),
            image_urls: urls("x", 7),
            ..Default::default()
        };
        let err = store.load(oversized).unwrap_err();
        assert_eq!(err.to_string(), IMAGE_LIMIT_NOTICE);
        assert_eq!(store.image_urls(), ["https://cdn/a0.jpg"]);
        assert_eq!(store.draft().name, "");

        let full = ListingDraft {
            image_urls: urls("y", 6),
            ..Default::default()
        };
        store.load(full).unwrap();
        assert_eq!(store.image_urls().len(), 6);
        assert!(store.validate_for_submit().is_ok());
    }

    #[test]
    fn edit_cannot_touch_image_urls() {
        let mut store = ListingDraftStore::default();
        store.merge(urls("a", 2)).unwrap();
        store.edit(|draft| {
            draft.name = "Lakeside cabin".to_string();
            draft.image_urls = urls("x", 9);
        });
        assert_eq!(store.draft().name, "Lakeside cabin");
        assert_eq!(store.image_urls().len(), 2);
    }
}
