//! Path synthesis: render a (category, parameters) pair into a concrete
//! request-path string. Free-text parameters are percent-encoded.

use crate::mix::Surface;
use crate::resolve::{Endpoint, QueryFilter, RecordQuery};
use url::form_urlencoded;

/// Route prefix for the versioned record API.
pub const SIERRA_API_ROUTE: &str = "/iii/sierra-api/v6";
/// Route for discovery resource queries and lookups.
pub const DISCOVERY_ROUTE: &str = "/api/v0.1/discovery/resources";
/// Route prefix for research-catalog front-end pages.
pub const CATALOG_ROUTE: &str = "/research/collections/shared-collection-catalog";

/// Renders request paths. Pure; malformed input is a programming error,
/// not a runtime failure.
#[derive(Debug, Clone, Copy)]
pub struct PathSynthesizer;

impl PathSynthesizer {
    /// Render a record API query as a request path.
    pub fn query_path(&self, query: &RecordQuery) -> String {
        let mut qs = form_urlencoded::Serializer::new(String::new());

        match &query.filter {
            QueryFilter::Id(id) => {
                qs.append_pair("id", id);
                if let Some(fields) = &query.fields {
                    qs.append_pair("fields", fields);
                }
            }
            QueryFilter::UpdatedWithin(window) => {
                if let Some(fields) = &query.fields {
                    qs.append_pair("fields", fields);
                }
                qs.append_pair("offset", &query.offset.to_string());
                qs.append_pair("updatedDate", &window.to_range_param());
                qs.append_pair("limit", &query.limit.to_string());
            }
            QueryFilter::DeletedWithin(window) => {
                if let Some(fields) = &query.fields {
                    qs.append_pair("fields", fields);
                }
                qs.append_pair("offset", &query.offset.to_string());
                qs.append_pair("deletedDate", &window.to_date_range_param());
                qs.append_pair("limit", &query.limit.to_string());
            }
        }
        if query.exclude_deleted {
            qs.append_pair("deleted", "false");
        }

        match query.endpoint {
            Endpoint::Sierra => {
                format!("{SIERRA_API_ROUTE}/{}?{}", query.record_type, qs.finish())
            }
            Endpoint::Discovery => format!("{DISCOVERY_ROUTE}?{}", qs.finish()),
        }
    }

    /// Render the path(s) for one keyword search.
    ///
    /// API searches hit both the resource query and its aggregations, the
    /// way real clients do.
    pub fn search_paths(&self, surface: Surface, keyword: &str) -> Vec<String> {
        let qs: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("q", keyword)
            .finish();
        match surface {
            Surface::Api => vec![
                format!("{DISCOVERY_ROUTE}?{qs}"),
                format!("{DISCOVERY_ROUTE}/aggregations?{qs}"),
            ],
            Surface::Catalog => vec![format!("{CATALOG_ROUTE}/search?{qs}")],
        }
    }

    /// Render a record detail page for a resolved identifier.
    pub fn record_page_path(&self, surface: Surface, id: &str) -> String {
        match surface {
            Surface::Api => format!("{DISCOVERY_ROUTE}/{id}"),
            Surface::Catalog => format!("{CATALOG_ROUTE}/bib/{id}"),
        }
    }

    /// Render a patron's hold listing.
    pub fn holds_path(&self, patron_id: &str) -> String {
        format!("{SIERRA_API_ROUTE}/patrons/{patron_id}/holds?expand=record")
    }

    /// Render the front-end home page.
    pub fn homepage_path(&self) -> String {
        format!("{CATALOG_ROUTE}/")
    }

    /// Render the paths one subject-heading navigation produces: the
    /// heading page plus its context and related API calls.
    pub fn subject_heading_paths(&self, uuid: &str, label: &str) -> Vec<String> {
        let qs: String = form_urlencoded::Serializer::new(String::new())
            .append_pair("label", label)
            .finish();
        vec![
            format!("{CATALOG_ROUTE}/subject_headings/{uuid}?{qs}"),
            format!("{CATALOG_ROUTE}/api/subjectHeadings/subject_headings/{uuid}/context"),
            format!("{CATALOG_ROUTE}/api/subjectHeadings/subject_headings/{uuid}/related"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{parse_timestamp, DateWindow};
    use std::collections::HashMap;

    fn parse_query(path: &str) -> HashMap<String, String> {
        let query = path.split_once('?').map(|(_, q)| q).unwrap_or_default();
        form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    fn window() -> DateWindow {
        DateWindow {
            start: parse_timestamp("2021-03-01T12:00:00Z").unwrap(),
            end: parse_timestamp("2021-07-15T08:30:00Z").unwrap(),
        }
    }

    #[test]
    fn test_updated_query_round_trips() {
        let query = RecordQuery {
            endpoint: Endpoint::Sierra,
            record_type: "bibs".to_string(),
            filter: QueryFilter::UpdatedWithin(window()),
            offset: 17,
            limit: 200,
            fields: Some("default,fixedFields,varFields".to_string()),
            exclude_deleted: false,
        };
        let path = PathSynthesizer.query_path(&query);

        assert!(path.starts_with("/iii/sierra-api/v6/bibs?"));
        let params = parse_query(&path);
        assert_eq!(params["fields"], "default,fixedFields,varFields");
        assert_eq!(params["offset"], "17");
        assert_eq!(params["limit"], "200");
        assert_eq!(
            params["updatedDate"],
            "[2021-03-01T12:00:00Z,2021-07-15T08:30:00Z]"
        );
        // The bracketed range itself is percent-encoded in the raw path.
        assert!(path.contains("updatedDate=%5B"));
    }

    #[test]
    fn test_deleted_query_uses_date_granularity() {
        let query = RecordQuery {
            endpoint: Endpoint::Sierra,
            record_type: "items".to_string(),
            filter: QueryFilter::DeletedWithin(window()),
            offset: 2,
            limit: 200,
            fields: Some("default".to_string()),
            exclude_deleted: false,
        };
        let params = parse_query(&PathSynthesizer.query_path(&query));
        assert_eq!(params["deletedDate"], "[2021-03-01,2021-07-15]");
    }

    #[test]
    fn test_identity_query_has_no_paging_params() {
        let query = RecordQuery {
            endpoint: Endpoint::Sierra,
            record_type: "patrons".to_string(),
            filter: QueryFilter::Id("1234567".to_string()),
            offset: 0,
            limit: 200,
            fields: Some("id,names,barcodes".to_string()),
            exclude_deleted: false,
        };
        let path = PathSynthesizer.query_path(&query);
        let params = parse_query(&path);
        assert_eq!(params["id"], "1234567");
        assert_eq!(params["fields"], "id,names,barcodes");
        assert!(!params.contains_key("offset"));
        assert!(!params.contains_key("limit"));
    }

    #[test]
    fn test_exclude_deleted_flag() {
        let query = RecordQuery {
            endpoint: Endpoint::Sierra,
            record_type: "patrons".to_string(),
            filter: QueryFilter::UpdatedWithin(window()),
            offset: 0,
            limit: 200,
            fields: None,
            exclude_deleted: true,
        };
        let params = parse_query(&PathSynthesizer.query_path(&query));
        assert_eq!(params["deleted"], "false");
        assert!(!params.contains_key("fields"));
    }

    #[test]
    fn test_search_keyword_percent_encoded_and_recoverable() {
        let keyword = "maps & atlases, 1850–1900";
        let paths = PathSynthesizer.search_paths(Surface::Api, keyword);
        assert_eq!(paths.len(), 2);
        assert!(paths[0].starts_with("/api/v0.1/discovery/resources?"));
        assert!(paths[1].starts_with("/api/v0.1/discovery/resources/aggregations?"));

        for path in &paths {
            assert_eq!(parse_query(path)["q"], keyword);
        }

        let catalog = PathSynthesizer.search_paths(Surface::Catalog, "subway history");
        assert_eq!(
            catalog,
            vec!["/research/collections/shared-collection-catalog/search?q=subway+history"]
        );
    }

    #[test]
    fn test_record_page_paths() {
        assert_eq!(
            PathSynthesizer.record_page_path(Surface::Api, "b12345678"),
            "/api/v0.1/discovery/resources/b12345678"
        );
        assert_eq!(
            PathSynthesizer.record_page_path(Surface::Catalog, "b12345678"),
            "/research/collections/shared-collection-catalog/bib/b12345678"
        );
    }

    #[test]
    fn test_holds_and_homepage_paths() {
        assert_eq!(
            PathSynthesizer.holds_path("98765"),
            "/iii/sierra-api/v6/patrons/98765/holds?expand=record"
        );
        assert_eq!(
            PathSynthesizer.homepage_path(),
            "/research/collections/shared-collection-catalog/"
        );
    }

    #[test]
    fn test_subject_heading_paths() {
        let paths = PathSynthesizer.subject_heading_paths("abcd-1234", "Mystery fiction");
        assert_eq!(paths.len(), 3);
        assert_eq!(
            paths[0],
            "/research/collections/shared-collection-catalog/subject_headings/abcd-1234?label=Mystery+fiction"
        );
        assert!(paths[1].ends_with("/subject_headings/abcd-1234/context"));
        assert!(paths[2].ends_with("/subject_headings/abcd-1234/related"));
    }
}
