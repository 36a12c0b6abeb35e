//! Resolves the published index of archived feed versions.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use crate::error::Error;
use crate::fetch::HttpClient;

/// One published, time-bounded schedule snapshot as listed by the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedVersion {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub version: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct IndexRow {
    feed_start_date: String,
    feed_end_date: String,
    feed_version: String,
    archive_url: String,
}

const INDEX_DATE_FORMAT: &str = "%Y%m%d";

fn parse_index_date(value: &str, row: usize) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, INDEX_DATE_FORMAT).map_err(|e| Error::MalformedIndexRow {
        row,
        reason: format!("bad date {value:?}: {e}"),
    })
}

/// Parses the delimited index listing. Any malformed required field fails
/// the whole parse, naming the offending row.
pub fn parse_index(bytes: &[u8]) -> Result<Vec<FeedVersion>, Error> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut versions = Vec::new();
    for (i, row) in reader.deserialize().enumerate() {
        // Row numbers are 1-based and include the header line.
        let row_number = i + 2;
        let row: IndexRow = row.map_err(|e| Error::MalformedIndexRow {
            row: row_number,
            reason: e.to_string(),
        })?;
        versions.push(FeedVersion {
            start_date: parse_index_date(&row.feed_start_date, row_number)?,
            end_date: parse_index_date(&row.feed_end_date, row_number)?,
            version: row.feed_version,
            url: row.archive_url,
        });
    }
    Ok(versions)
}

/// Fetches the index and returns the versions whose start date lies in
/// `[from, to]`, sorted ascending by start date.
pub async fn list_versions<C: HttpClient>(
    client: &C,
    index_url: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<FeedVersion>, Error> {
    let bytes = client.get(index_url).await?;
    let mut versions: Vec<_> = parse_index(&bytes)?
        .into_iter()
        .filter(|v| from <= v.start_date && v.start_date <= to)
        .collect();
    versions.sort_by_key(|v| v.start_date);
    info!(count = versions.len(), from = %from, to = %to, "Feed index resolved");
    Ok(versions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    const LISTING: &str = "\
feed_start_date,feed_end_date,feed_version,archive_url,archive_note
20200201,20200401,Winter 2020 v2,https://example.com/20200201.zip,
20200101,20200301,Winter 2020,https://example.com/20200101.zip,
20191001,20191231,Fall 2019,https://example.com/20191001.zip,note
";

    struct StaticClient(&'static str);

    #[async_trait]
    impl HttpClient for StaticClient {
        async fn get(&self, _url: &str) -> Result<Vec<u8>, Error> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_index() {
        let versions = parse_index(LISTING.as_bytes()).unwrap();
        assert_eq!(versions.len(), 3);
        assert_eq!(versions[0].version, "Winter 2020 v2");
        assert_eq!(versions[0].start_date, date(2020, 2, 1));
        assert_eq!(versions[0].end_date, date(2020, 4, 1));
        assert_eq!(versions[0].url, "https://example.com/20200201.zip");
    }

    #[test]
    fn test_malformed_date_is_fatal() {
        let listing = "\
feed_start_date,feed_end_date,feed_version,archive_url
20200101,2020-03-01,Winter 2020,https://example.com/a.zip
";
        let err = parse_index(listing.as_bytes()).unwrap_err();
        match err {
            Error::MalformedIndexRow { row, reason } => {
                assert_eq!(row, 2);
                assert!(reason.contains("2020-03-01"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_column_is_fatal() {
        let listing = "\
feed_start_date,feed_end_date,feed_version
20200101,20200301,Winter 2020
";
        assert!(matches!(
            parse_index(listing.as_bytes()),
            Err(Error::MalformedIndexRow { row: 2, .. })
        ));
    }

    #[tokio::test]
    async fn test_list_versions_filters_and_sorts() {
        let client = StaticClient(LISTING);
        let versions = list_versions(&client, "unused", date(2020, 1, 1), date(2020, 12, 31))
            .await
            .unwrap();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].version, "Winter 2020");
        assert_eq!(versions[1].version, "Winter 2020 v2");
    }

    #[tokio::test]
    async fn test_list_versions_empty_range() {
        let client = StaticClient(LISTING);
        let versions = list_versions(&client, "unused", date(2021, 1, 1), date(2021, 12, 31))
            .await
            .unwrap();
        assert!(versions.is_empty());
    }
}
