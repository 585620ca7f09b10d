// CSV export of loaded search results

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{Listing, ListingKind};

#[derive(Debug, Serialize)]
struct ListingRow<'a> {
    id: &'a str,
    name: &'a str,
    address: &'a str,
    #[serde(rename = "type")]
    kind: ListingKind,
    bedrooms: u32,
    bathrooms: u32,
    regular_price: f64,
    discount_price: f64,
    offer: bool,
    parking: bool,
    furnished: bool,
    cover_image: &'a str,
}

impl<'a> From<&'a Listing> for ListingRow<'a> {
    fn from(listing: &'a Listing) -> Self {
        Self {
            id: &listing.id,
            name: &listing.name,
            address: &listing.address,
            kind: listing.kind,
            bedrooms: listing.bedrooms,
            bathrooms: listing.bathrooms,
            regular_price: listing.regular_price,
            discount_price: listing.discount_price,
            offer: listing.offer,
            parking: listing.parking,
            furnished: listing.furnished,
            cover_image: listing.image_urls.first().map(String::as_str).unwrap_or(""),
        }
    }
}

/// Writes `listings` as CSV (with a header row) to any writer.
pub fn write_listings<W: std::io::Write>(writer: W, listings: &[Listing]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for listing in listings {
        csv_writer
            .serialize(ListingRow::from(listing))
            .with_context(|| format!("Failed to write CSV row for listing {}", listing.id))?;
    }
    csv_writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

pub fn save_listings(path: &Path, listings: &[Listing]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory {:?}", parent))?;
        }
    }
    let file = std::fs::File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    write_listings(file, listings)?;
    tracing::info!(rows = listings.len(), path = %path.display(), "Saved listings CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_has_header_and_cover_image() {
        let listings = vec![Listing {
            id: "l1".to_string(),
            name: "Cabin, by the lake".to_string(),
            kind: ListingKind::Sale,
            regular_price: 1200.0,
            image_urls: vec!["https://cdn/1.jpg".to_string(), "https://cdn/2.jpg".to_string()],
            ..Default::default()
        }];
        let mut out = Vec::new();
        write_listings(&mut out, &listings).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            concat!(
                "id,name,address,type,bedrooms,bathrooms,regular_price,discount_price,",
                "offer,parking,furnished,cover_image"
            )
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("l1,\"Cabin, by the lake\",,sale,"));
        assert!(row.ends_with("https://cdn/1.jpg"));
    }
}
