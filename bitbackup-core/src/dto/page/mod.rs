//! Paginated listing DTOs

use serde::{Deserialize, Serialize};

/// One page of a Bitbucket-style paginated collection
///
/// `next` holds the absolute URL of the following page and is absent on the
/// last page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default = "Vec::new")]
    pub values: Vec<T>,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub pagelen: Option<u32>,
    #[serde(default)]
    pub size: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::RepositoryDescriptor;

    #[test]
    fn test_page_with_next_link() {
        let json = r#"{
            "pagelen": 100,
            "page": 1,
            "size": 101,
            "next": "https://api.bitbucket.org/2.0/repositories/acme?pagelen=100&page=2",
            "values": [{ "full_name": "acme/widgets" }]
        }"#;

        let page: Page<RepositoryDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(page.values.len(), 1);
        assert_eq!(page.values[0].full_name, "acme/widgets");
        assert!(page.next.unwrap().ends_with("page=2"));
    }

    #[test]
    fn test_last_page_has_no_next() {
        let page: Page<RepositoryDescriptor> =
            serde_json::from_str(r#"{ "values": [], "page": 2 }"#).unwrap();
        assert!(page.values.is_empty());
        assert!(page.next.is_none());
    }
}
