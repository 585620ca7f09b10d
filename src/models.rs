// Data structures shared by the search engine and the listing editor

use bytes::Bytes;
use serde::{Deserialize, Serialize};

// Listing kind filter used by search ("all" matches both)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    #[default]
    All,
    Rent,
    Sale,
}

impl TypeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeFilter::All => "all",
            TypeFilter::Rent => "rent",
            TypeFilter::Sale => "sale",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(TypeFilter::All),
            "rent" => Some(TypeFilter::Rent),
            "sale" => Some(TypeFilter::Sale),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
    #[serde(rename = "regularPrice")]
    RegularPrice,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "createdAt",
            SortKey::RegularPrice => "regularPrice",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(SortKey::CreatedAt),
            "regularPrice" => Some(SortKey::RegularPrice),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// The combined `<sort>_<order>` value carried by the sort select
/// (e.g. `regularPrice_desc`). Missing or unknown halves fall back to
/// `createdAt` / `desc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SortChoice {
    pub sort: SortKey,
    pub order: SortOrder,
}

impl SortChoice {
    pub fn parse(value: &str) -> Self {
        let mut parts = value.splitn(2, '_');
        let sort = parts.next().and_then(SortKey::parse).unwrap_or_default();
        let order = parts.next().and_then(SortOrder::parse).unwrap_or_default();
        SortChoice { sort, order }
    }

    pub fn as_value(&self) -> String {
        format!("{}_{}", self.sort.as_str(), self.order.as_str())
    }
}

/// Normalized search criteria. Every field is always present; the
/// `Default` impl holds the documented fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub search_term: String,
    #[serde(rename = "type")]
    pub listing_type: TypeFilter,
    pub parking: bool,
    pub furnished: bool,
    pub offer: bool,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl SearchFilter {
    /// Merges a decoded partial filter over the defaults.
    pub fn from_partial(partial: PartialFilter) -> Self {
        let defaults = SearchFilter::default();
        SearchFilter {
            search_term: partial.search_term.unwrap_or(defaults.search_term),
            listing_type: partial.listing_type.unwrap_or(defaults.listing_type),
            parking: partial.parking.unwrap_or(defaults.parking),
            furnished: partial.furnished.unwrap_or(defaults.furnished),
            offer: partial.offer.unwrap_or(defaults.offer),
            sort: partial.sort.unwrap_or(defaults.sort),
            order: partial.order.unwrap_or(defaults.order),
        }
    }

    pub fn sort_choice(&self) -> SortChoice {
        SortChoice {
            sort: self.sort,
            order: self.order,
        }
    }

    pub fn set_sort_choice(&mut self, choice: SortChoice) {
        self.sort = choice.sort;
        self.order = choice.order;
    }
}

// Filter as read from a query string: only the keys that were present
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartialFilter {
    pub search_term: Option<String>,
    pub listing_type: Option<TypeFilter>,
    pub parking: Option<bool>,
    pub furnished: Option<bool>,
    pub offer: Option<bool>,
    pub sort: Option<SortKey>,
    pub order: Option<SortOrder>,
}

// Kind of a concrete listing (a listing is never "all")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    #[default]
    Rent,
    Sale,
}

/// A listing as returned by the listing API, both in search pages and
/// when fetched for editing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub address: String,
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub regular_price: f64,
    pub discount_price: f64,
    pub offer: bool,
    pub parking: bool,
    pub furnished: bool,
    pub image_urls: Vec<String>,
    pub user_ref: Option<String>,
    pub created_at: Option<String>,
}

/// One page of search results, in server order.
pub type ListingPage = Vec<Listing>;

/// The in-progress listing form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub image_urls: Vec<String>,
    pub name: String,
    pub description: String,
    pub address: String,
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub regular_price: f64,
    pub discount_price: f64,
    pub offer: bool,
    pub parking: bool,
    pub furnished: bool,
}

impl Default for ListingDraft {
    fn default() -> Self {
        Self {
            image_urls: Vec::new(),
            name: String::new(),
            description: String::new(),
            address: String::new(),
            kind: ListingKind::Rent,
            bedrooms: 1,
            bathrooms: 1,
            regular_price: 50.0,
            discount_price: 0.0,
            offer: false,
            parking: false,
            furnished: false,
        }
    }
}

impl From<Listing> for ListingDraft {
    fn from(listing: Listing) -> Self {
        Self {
            image_urls: listing.image_urls,
            name: listing.name,
            description: listing.description,
            address: listing.address,
            kind: listing.kind,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            regular_price: listing.regular_price,
            discount_price: listing.discount_price,
            offer: listing.offer,
            parking: listing.parking,
            furnished: listing.furnished,
        }
    }
}

// Body of create/update requests: the draft plus its owner
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSubmission {
    #[serde(flatten)]
    pub draft: ListingDraft,
    pub user_ref: String,
}

// Failure envelope returned by the listing API instead of a listing
#[derive(Debug, Clone, Deserialize)]
pub struct ApiFailure {
    pub success: bool,
    pub message: Option<String>,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFile {
    pub name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_choice_splits_select_value() {
        let choice = SortChoice::parse("regularPrice_asc");
        assert_eq!(choice.sort, SortKey::RegularPrice);
        assert_eq!(choice.order, SortOrder::Asc);
        assert_eq!(choice.as_value(), "regularPrice_asc");
    }

    #[test]
    fn sort_choice_falls_back_per_half() {
        assert_eq!(SortChoice::parse(""), SortChoice::default());
        let choice = SortChoice::parse("regularPrice");
        assert_eq!(choice.sort, SortKey::RegularPrice);
        assert_eq!(choice.order, SortOrder::Desc);
        let choice = SortChoice::parse("bogus_asc");
        assert_eq!(choice.sort, SortKey::CreatedAt);
        assert_eq!(choice.order, SortOrder::Asc);
    }

    #[test]
    fn partial_filter_merges_over_defaults() {
        let filter = SearchFilter::from_partial(PartialFilter {
            listing_type: Some(TypeFilter::Sale),
            offer: Some(true),
            ..Default::default()
        });
        assert_eq!(filter.search_term, "");
        assert_eq!(filter.listing_type, TypeFilter::Sale);
        assert!(filter.offer);
        assert!(!filter.parking);
        assert_eq!(filter.sort, SortKey::CreatedAt);
        assert_eq!(filter.order, SortOrder::Desc);
    }

    #[test]
    fn listing_parses_api_shape() {
        let json = r#"{
            "_id": "65f1",
            "name": "Lake house",
            "type": "sale",
            "regularPrice": 420000,
            "discountPrice": 0,
            "imageUrls": ["https://cdn/a.jpg"],
            "userRef": "u1",
            "unknownField": 3
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.id, "65f1");
        assert_eq!(listing.kind, ListingKind::Sale);
        assert_eq!(listing.regular_price, 420000.0);
        assert_eq!(listing.image_urls.len(), 1);
        assert_eq!(listing.bedrooms, 0);
    }

    #[test]
    fn submission_flattens_draft_with_owner() {
        let submission = ListingSubmission {
            draft: ListingDraft::default(),
            user_ref: "u42".to_string(),
        };
        let value = serde_json::to_value(&submission).unwrap();
        assert_eq!(value["userRef"], "u42");
        assert_eq!(value["type"], "rent");
        assert_eq!(value["regularPrice"], 50.0);
        assert!(value["imageUrls"].as_array().unwrap().is_empty());
    }
}
