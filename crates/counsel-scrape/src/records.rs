use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Placeholder written when a card yields no name; rows carrying it are
/// skipped by the expertise filter.
pub const NAME_NOT_FOUND: &str = "Name not found";
pub const LINK_NOT_FOUND: &str = "Link not found";
pub const RATING_NOT_FOUND: &str = "Rating not found";

/// One scraped directory row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Profile Link")]
    pub profile_link: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Avvo Rating")]
    pub rating: String,
    #[serde(rename = "Details Snippet")]
    pub snippet: String,
}

/// A listing confirmed to mention EB-1 work on its profile page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertiseRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Profile Link")]
    pub profile_link: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Avvo Rating")]
    pub rating: String,
    #[serde(rename = "EB-1 Expertise")]
    pub expertise: String,
    #[serde(rename = "Mention Count")]
    pub mention_count: usize,
    #[serde(rename = "EB-1 Details")]
    pub details: String,
}

pub fn read_listings<P: AsRef<Path>>(path: P) -> Result<Vec<Listing>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("could not open listings CSV {path:?}"))?;

    let mut rows = Vec::new();
    for result in rdr.deserialize() {
        let row: Listing = result.context("malformed listings row")?;
        rows.push(row);
    }
    info!(count = rows.len(), ?path, "loaded listings");
    Ok(rows)
}

pub fn write_listings<P: AsRef<Path>>(path: P, rows: &[Listing]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("could not create listings CSV {path:?}"))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    info!(count = rows.len(), ?path, "listings saved");
    Ok(())
}

pub fn write_expertise<P: AsRef<Path>>(path: P, rows: &[ExpertiseRow]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("could not create expertise CSV {path:?}"))?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    info!(count = rows.len(), ?path, "expertise rows saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listings_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lawyers.csv");

        let rows = vec![
            Listing {
                name: "Jane Smith".into(),
                profile_link: "https://www.avvo.com/attorneys/jane-smith.html".into(),
                location: "New York, NY".into(),
                rating: "9.5".into(),
                snippet: "Immigration attorney focused on employment visas".into(),
            },
            Listing {
                name: NAME_NOT_FOUND.into(),
                profile_link: LINK_NOT_FOUND.into(),
                location: "New York, NY".into(),
                rating: RATING_NOT_FOUND.into(),
                snippet: String::new(),
            },
        ];

        write_listings(&path, &rows).expect("write");
        let back = read_listings(&path).expect("read");

        assert_eq!(back.len(), 2);
        assert_eq!(back[0].name, "Jane Smith");
        assert_eq!(back[0].rating, "9.5");
        assert_eq!(back[1].name, NAME_NOT_FOUND);
    }

    #[test]
    fn listings_header_names_match_interchange_format() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("lawyers.csv");
        write_listings(
            &path,
            &[Listing {
                name: "A".into(),
                profile_link: "https://example.com".into(),
                location: "NY".into(),
                rating: "10".into(),
                snippet: "s".into(),
            }],
        )
        .expect("write");

        let contents = std::fs::read_to_string(&path).expect("read file");
        let header = contents.lines().next().unwrap_or_default();
        assert_eq!(
            header,
            "Name,Profile Link,Location,Avvo Rating,Details Snippet"
        );
    }

    #[test]
    fn expertise_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("eb1_lawyers.csv");

        write_expertise(
            &path,
            &[ExpertiseRow {
                name: "Jane Smith".into(),
                profile_link: "https://www.avvo.com/attorneys/jane-smith.html".into(),
                location: "New York, NY".into(),
                rating: "9.5".into(),
                expertise: "Yes".into(),
                mention_count: 4,
                details: "Practice area: EB-1 extraordinary ability petitions...".into(),
            }],
        )
        .expect("write");

        let contents = std::fs::read_to_string(&path).expect("read file");
        let header = contents.lines().next().unwrap_or_default();
        assert_eq!(
            header,
            "Name,Profile Link,Location,Avvo Rating,EB-1 Expertise,Mention Count,EB-1 Details"
        );
        assert!(contents.contains("Jane Smith"));
    }
}
