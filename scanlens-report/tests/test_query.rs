//! Layered issue filtering and pagination

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::*;
use scanlens_core::config::QueryConfig;
use scanlens_report::domain::{HttpMethod, IntegralStatus, OwaspCategory, Severity};
use scanlens_report::{
    IssueFilter, IssueQuery, PathFilter, QueryError, QueryService, ReportStore, SortOrder,
    StatusFilter,
};

async fn petstore_service(store: Arc<dyn ReportStore>) -> QueryService {
    ingest(store.clone(), petstore_report())
        .await
        .expect("Ingestion failed");
    QueryService::new(store, QueryConfig::default())
}

fn ids(page: &scanlens_report::IssuePage) -> Vec<String> {
    page.items
        .iter()
        .map(|i| format!("{}{}", i.id, i.path))
        .collect()
}

fn filtered(filter: IssueFilter) -> IssueQuery {
    IssueQuery {
        filter,
        ..IssueQuery::default()
    }
}

#[tokio::test]
async fn test_unfiltered_query_returns_document_order() {
    let service = petstore_service(memory_store()).await;
    let page = service.get_issues(&IssueQuery::default()).await.unwrap();

    assert_eq!(page.total_items, 5);
    assert_eq!(page.filtered_items, 5);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.per_page, 50);
    assert_eq!(
        ids(&page),
        vec!["i1/pets", "i2/pets", "i3/pets", "i4/pets/{id}", "i1/petshop"]
    );
}

async fn check_path_modes(store: Arc<dyn ReportStore>) {
    let service = petstore_service(store).await;

    let strict = filtered(IssueFilter {
        path: Some(PathFilter::strict("/pets", None)),
        ..IssueFilter::default()
    });
    let page = service.get_issues(&strict).await.unwrap();
    assert_eq!(ids(&page), vec!["i1/pets", "i2/pets", "i3/pets"]);

    let sub_paths = filtered(IssueFilter {
        path: Some(PathFilter::sub_paths("/pets", None)),
        ..IssueFilter::default()
    });
    let page = service.get_issues(&sub_paths).await.unwrap();
    assert_eq!(
        ids(&page),
        vec!["i1/pets", "i2/pets", "i3/pets", "i4/pets/{id}"]
    );
    assert_eq!(page.total_items, 5);
    assert_eq!(page.filtered_items, 4);

    let strict_get = filtered(IssueFilter {
        path: Some(PathFilter::strict("/pets", Some(HttpMethod::Get))),
        ..IssueFilter::default()
    });
    let page = service.get_issues(&strict_get).await.unwrap();
    assert_eq!(ids(&page), vec!["i1/pets", "i2/pets"]);

    let sub_get = filtered(IssueFilter {
        path: Some(PathFilter::sub_paths("/pets", Some(HttpMethod::Get))),
        ..IssueFilter::default()
    });
    let page = service.get_issues(&sub_get).await.unwrap();
    assert_eq!(ids(&page), vec!["i1/pets", "i2/pets", "i4/pets/{id}"]);
}

#[tokio::test]
async fn test_path_modes_memory() {
    check_path_modes(memory_store()).await;
}

#[tokio::test]
async fn test_path_modes_sqlite() {
    let (store, _dir) = sqlite_store().await;
    check_path_modes(store).await;
}

#[tokio::test]
async fn test_status_owasp_and_severity_layers() {
    let service = petstore_service(memory_store()).await;

    let owasp_any = filtered(IssueFilter {
        status: Some(StatusFilter::HasOwaspIssue),
        ..IssueFilter::default()
    });
    let page = service.get_issues(&owasp_any).await.unwrap();
    assert_eq!(ids(&page), vec!["i2/pets", "i3/pets", "i4/pets/{id}"]);

    let failures = filtered(IssueFilter {
        status: Some(StatusFilter::Integral(
            IntegralStatus::ExpectedConformityFailure,
        )),
        ..IssueFilter::default()
    });
    let page = service.get_issues(&failures).await.unwrap();
    assert_eq!(ids(&page), vec!["i3/pets"]);

    let api8 = filtered(IssueFilter {
        owasp: HashSet::from(["API8:2019".parse::<OwaspCategory>().unwrap()]),
        ..IssueFilter::default()
    });
    let page = service.get_issues(&api8).await.unwrap();
    assert_eq!(ids(&page), vec!["i2/pets"]);

    let severe = filtered(IssueFilter {
        severities: HashSet::from([Severity::High, Severity::Critical]),
        ..IssueFilter::default()
    });
    let page = service.get_issues(&severe).await.unwrap();
    assert_eq!(ids(&page), vec!["i2/pets", "i4/pets/{id}"]);

    // Layers combine
    let combined = filtered(IssueFilter {
        path: Some(PathFilter::strict("/pets", None)),
        severities: HashSet::from([Severity::High, Severity::Critical]),
        ..IssueFilter::default()
    });
    let page = service.get_issues(&combined).await.unwrap();
    assert_eq!(ids(&page), vec!["i2/pets"]);
}

#[tokio::test]
async fn test_text_search() {
    let service = petstore_service(memory_store()).await;

    let query = IssueQuery {
        search: Some("SQL".into()),
        ..IssueQuery::default()
    };
    let page = service.get_issues(&query).await.unwrap();
    assert_eq!(ids(&page), vec!["i1/pets", "i3/pets"]);

    let query = IssueQuery {
        search: Some("api1:2023".into()),
        ..IssueQuery::default()
    };
    let page = service.get_issues(&query).await.unwrap();
    assert_eq!(ids(&page), vec!["i4/pets/{id}"]);

    let query = IssueQuery {
        search: Some("non-conforming".into()),
        ..IssueQuery::default()
    };
    let page = service.get_issues(&query).await.unwrap();
    assert_eq!(ids(&page), vec!["i3/pets"]);
}

#[tokio::test]
async fn test_pages_cover_every_issue_once() {
    let service = petstore_service(memory_store()).await;

    for per_page in 1..=6 {
        let mut seen = Vec::new();
        let first = service
            .get_issues(&IssueQuery {
                per_page: Some(per_page),
                ..IssueQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(first.total_pages, 5u64.div_ceil(per_page as u64));

        for page in 0..first.total_pages as usize {
            let result = service
                .get_issues(&IssueQuery {
                    page,
                    per_page: Some(per_page),
                    ..IssueQuery::default()
                })
                .await
                .unwrap();
            assert!(result.items.len() <= per_page);
            seen.extend(ids(&result));
        }
        assert_eq!(
            seen,
            vec!["i1/pets", "i2/pets", "i3/pets", "i4/pets/{id}", "i1/petshop"],
            "per_page {}",
            per_page
        );
    }

    let past_end = service
        .get_issues(&IssueQuery {
            page: 9,
            ..IssueQuery::default()
        })
        .await
        .unwrap();
    assert!(past_end.items.is_empty());
}

#[tokio::test]
async fn test_filtered_pages_cover_matches_once() {
    let service = petstore_service(memory_store()).await;

    let cases: Vec<(&str, IssueQuery, Option<u64>)> = vec![
        (
            "strict path",
            filtered(IssueFilter {
                path: Some(PathFilter::strict("/pets", None)),
                ..IssueFilter::default()
            }),
            Some(3),
        ),
        (
            "owasp status",
            filtered(IssueFilter {
                status: Some(StatusFilter::HasOwaspIssue),
                ..IssueFilter::default()
            }),
            Some(3),
        ),
        (
            "severity set",
            filtered(IssueFilter {
                severities: HashSet::from([Severity::High, Severity::Critical]),
                ..IssueFilter::default()
            }),
            Some(2),
        ),
        (
            "sub-paths and severity",
            filtered(IssueFilter {
                path: Some(PathFilter::sub_paths("/pets", None)),
                severities: HashSet::from([Severity::Medium, Severity::High, Severity::Critical]),
                ..IssueFilter::default()
            }),
            Some(3),
        ),
        (
            "search",
            IssueQuery {
                search: Some("xss".into()),
                ..IssueQuery::default()
            },
            None,
        ),
    ];

    for (name, query, expected) in cases {
        let all = service
            .get_issues(&IssueQuery {
                per_page: Some(100),
                ..query.clone()
            })
            .await
            .unwrap();
        if let Some(expected) = expected {
            assert_eq!(all.filtered_items, expected, "{}", name);
        }

        for per_page in 1..=4 {
            let mut seen = Vec::new();
            let mut total_pages = 1;
            let mut page = 0;
            while page < total_pages {
                let result = service
                    .get_issues(&IssueQuery {
                        page,
                        per_page: Some(per_page),
                        ..query.clone()
                    })
                    .await
                    .unwrap();
                assert_eq!(result.filtered_items, all.filtered_items, "{}", name);
                assert!(result.items.len() <= per_page);
                total_pages = result.total_pages as usize;
                seen.extend(ids(&result));
                page += 1;
            }

            assert_eq!(seen.len() as u64, all.filtered_items, "{} per_page {}", name, per_page);
            let unique: HashSet<&String> = seen.iter().collect();
            assert_eq!(unique.len(), seen.len(), "{} per_page {}", name, per_page);
            assert_eq!(seen, ids(&all), "{} per_page {}", name, per_page);
        }
    }
}

#[tokio::test]
async fn test_sort_orders() {
    let service = petstore_service(memory_store()).await;

    let query = IssueQuery {
        sort: SortOrder::CriticalityDesc,
        ..IssueQuery::default()
    };
    let page = service.get_issues(&query).await.unwrap();
    assert_eq!(
        ids(&page),
        vec!["i4/pets/{id}", "i2/pets", "i3/pets", "i1/petshop", "i1/pets"]
    );

    let query = IssueQuery {
        sort: SortOrder::PathAsc,
        ..IssueQuery::default()
    };
    let page = service.get_issues(&query).await.unwrap();
    assert_eq!(
        ids(&page),
        vec!["i1/pets", "i2/pets", "i3/pets", "i4/pets/{id}", "i1/petshop"]
    );
}

#[tokio::test]
async fn test_invalid_page_size() {
    let service = petstore_service(memory_store()).await;
    for per_page in [0, 1001] {
        let err = service
            .get_issues(&IssueQuery {
                per_page: Some(per_page),
                ..IssueQuery::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidPageSize { max: 1000, .. }));
    }
}
