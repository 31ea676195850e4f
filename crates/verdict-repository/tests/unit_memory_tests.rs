//! Unit tests for the in-memory repository

use verdict_core::Definitions;
use verdict_repository::{
    compute_checksum, DefinitionRepository, ListFilter, MemoryRepository, NewDefinition,
};

fn new_definition(key: &str, name: &str, tenant_id: &str) -> NewDefinition {
    let source = format!("<definitions id=\"{key}\"/>");
    NewDefinition {
        key: key.to_string(),
        name: name.to_string(),
        source,
        parsed_model: Definitions {
            id: key.to_string(),
            ..Default::default()
        },
        tenant_id: tenant_id.to_string(),
    }
}

#[tokio::test]
async fn test_deploy_assigns_incrementing_versions() {
    let repo = MemoryRepository::new();

    let v1 = repo.deploy(new_definition("d1", "Discount", "")).await.unwrap();
    let v2 = repo.deploy(new_definition("d1", "Discount", "")).await.unwrap();
    let v3 = repo.deploy(new_definition("d1", "Discount", "")).await.unwrap();

    assert_eq!(v1.version, 1);
    assert_eq!(v2.version, 2);
    assert_eq!(v3.version, 3);
    assert_ne!(v1.id, v2.id);
}

#[tokio::test]
async fn test_deploy_computes_checksum() {
    let repo = MemoryRepository::new();

    let def = repo.deploy(new_definition("d1", "Discount", "")).await.unwrap();
    assert_eq!(def.checksum, compute_checksum(&def.source));

    // Byte-identical sources produce identical checksums across deploys
    let again = repo.deploy(new_definition("d1", "Discount", "")).await.unwrap();
    assert_eq!(def.checksum, again.checksum);
}

#[tokio::test]
async fn test_get_by_key_returns_latest() {
    let repo = MemoryRepository::new();

    repo.deploy(new_definition("d1", "Discount", "")).await.unwrap();
    repo.deploy(new_definition("d1", "Discount", "")).await.unwrap();

    let latest = repo.get_by_key("d1", "").await.unwrap();
    assert_eq!(latest.version, 2);
}

#[tokio::test]
async fn test_get_by_key_and_version() {
    let repo = MemoryRepository::new();

    repo.deploy(new_definition("d1", "Discount", "")).await.unwrap();
    repo.deploy(new_definition("d1", "Discount", "")).await.unwrap();

    let second = repo.get_by_key_and_version("d1", 2, "").await.unwrap();
    assert_eq!(second.version, 2);

    let missing = repo.get_by_key_and_version("d1", 9, "").await;
    assert!(missing.is_err());
    assert!(missing.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_get_by_key_not_found() {
    let repo = MemoryRepository::new();

    let err = repo.get_by_key("nope", "").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_list_collapses_to_latest_per_key() {
    let repo = MemoryRepository::new();

    repo.deploy(new_definition("d1", "Bravo", "")).await.unwrap();
    repo.deploy(new_definition("d1", "Bravo", "")).await.unwrap();
    repo.deploy(new_definition("d1", "Bravo", "")).await.unwrap();
    repo.deploy(new_definition("d2", "Alpha", "")).await.unwrap();

    let listed = repo.list(&ListFilter::default()).await.unwrap();

    assert_eq!(listed.len(), 2);
    // Sorted by name ascending
    assert_eq!(listed[0].key, "d2");
    assert_eq!(listed[1].key, "d1");
    assert_eq!(listed[1].version, 3);
}

#[tokio::test]
async fn test_list_pagination() {
    let repo = MemoryRepository::new();

    repo.deploy(new_definition("a", "A", "")).await.unwrap();
    repo.deploy(new_definition("b", "B", "")).await.unwrap();
    repo.deploy(new_definition("c", "C", "")).await.unwrap();

    let page = repo
        .list(&ListFilter {
            limit: 2,
            offset: 1,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page[0].name, "B");
    assert_eq!(page[1].name, "C");

    let past_end = repo
        .list(&ListFilter {
            offset: 10,
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(past_end.is_empty());
}

#[tokio::test]
async fn test_list_filters_by_key() {
    let repo = MemoryRepository::new();

    repo.deploy(new_definition("d1", "One", "")).await.unwrap();
    repo.deploy(new_definition("d2", "Two", "")).await.unwrap();

    let listed = repo
        .list(&ListFilter {
            key: Some("d1".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].key, "d1");
}

#[tokio::test]
async fn test_tenant_isolation() {
    let repo = MemoryRepository::new();

    repo.deploy(new_definition("d1", "Shared", "")).await.unwrap();
    repo.deploy(new_definition("d1", "Acme", "acme")).await.unwrap();
    repo.deploy(new_definition("d1", "Acme", "acme")).await.unwrap();

    // Version lineages are independent per tenant
    let shared = repo.get_by_key("d1", "").await.unwrap();
    assert_eq!(shared.version, 1);
    let acme = repo.get_by_key("d1", "acme").await.unwrap();
    assert_eq!(acme.version, 2);

    // Tenant filter narrows the listing; no filter sees both lineages
    let acme_only = repo
        .list(&ListFilter {
            tenant_id: Some("acme".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(acme_only.len(), 1);
    assert_eq!(acme_only[0].tenant_id, "acme");

    let all = repo.list(&ListFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_get_all_versions_newest_first() {
    let repo = MemoryRepository::new();

    repo.deploy(new_definition("d1", "One", "")).await.unwrap();
    repo.deploy(new_definition("d1", "One", "")).await.unwrap();
    repo.deploy(new_definition("d1", "One", "")).await.unwrap();

    let versions = repo.get_all_versions("d1", "").await.unwrap();
    let numbers: Vec<i32> = versions.iter().map(|d| d.version).collect();
    assert_eq!(numbers, vec![3, 2, 1]);

    assert!(repo.get_all_versions("nope", "").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_delete_removes_all_versions() {
    let repo = MemoryRepository::new();

    repo.deploy(new_definition("d1", "One", "")).await.unwrap();
    repo.deploy(new_definition("d1", "One", "")).await.unwrap();
    repo.deploy(new_definition("d2", "Two", "")).await.unwrap();

    repo.delete("d1", "").await.unwrap();

    assert!(repo.get_by_key("d1", "").await.unwrap_err().is_not_found());
    assert!(repo.get_by_key("d2", "").await.is_ok());

    // Deleting again reports not found
    assert!(repo.delete("d1", "").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_concurrent_deploys_never_share_a_version() {
    use std::sync::Arc;

    let repo = Arc::new(MemoryRepository::new());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let repo = Arc::clone(&repo);
        handles.push(tokio::spawn(async move {
            repo.deploy(new_definition("d1", "Race", "")).await.unwrap().version
        }));
    }

    let mut versions = Vec::new();
    for handle in handles {
        versions.push(handle.await.unwrap());
    }

    versions.sort_unstable();
    assert_eq!(versions, (1..=8).collect::<Vec<i32>>());
}
