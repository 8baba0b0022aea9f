//! Integration tests for the local gateway over a site directory

use super::support::{Fault, Site, SECRET};
use folio::auth::{Identity, SignedTokenVerifier, Token, TokenVerifier};
use folio::content::{ContentData, ContentId, TemplateId};
use folio::error::{GatewayError, RestoreOutcome};
use folio::gateway::ResourceGateway;
use folio::media::{MediaEntry, MediaKind, MediaTarget};
use folio::schema::PageSchema;
use serde_json::json;

#[tokio::test]
async fn test_every_operation_rejects_a_missing_token() {
    let site = Site::with_schema(&json!([]));
    let gateway = &site.gateway;
    let none = Token::default();
    let id = ContentId::parse("c-1").unwrap();
    let template = TemplateId::parse("t").unwrap();

    assert!(matches!(gateway.load_schema(&none).await, Err(GatewayError::Unauthorized(_))));
    assert!(matches!(
        gateway.save_schema(&none, &PageSchema::default()).await,
        Err(GatewayError::Unauthorized(_))
    ));
    assert!(matches!(
        gateway.load_content(&none, &id, &template).await,
        Err(GatewayError::Unauthorized(_))
    ));
    assert!(matches!(
        gateway.create_content(&none, &template).await,
        Err(GatewayError::Unauthorized(_))
    ));
    assert!(matches!(
        gateway.save_content(&none, &id, &ContentData::default()).await,
        Err(GatewayError::Unauthorized(_))
    ));
    assert!(matches!(
        gateway.delete_content(&none, &id).await,
        Err(GatewayError::Unauthorized(_))
    ));
    assert!(matches!(
        gateway.list_media(&none, MediaKind::Images, None).await,
        Err(GatewayError::Unauthorized(_))
    ));
    assert!(matches!(
        gateway.create_gallery(&none, "g").await,
        Err(GatewayError::Unauthorized(_))
    ));
    assert_eq!(site.read_json("web-schema.json"), json!([]));
    assert!(!site.exists("media"));
}

#[tokio::test]
async fn test_token_from_another_secret_is_rejected() {
    let site = Site::with_schema(&json!([]));
    let foreign = SignedTokenVerifier::new("not-the-secret", 3600);
    let token = foreign.issue(&Identity::new("u-1", "editor"));
    assert_ne!(SECRET, "not-the-secret");

    let err = site.gateway.load_schema(&token).await.unwrap_err();
    assert!(matches!(err, GatewayError::Unauthorized(_)));
}

#[tokio::test]
async fn test_refreshed_token_verifies_to_same_identity() {
    let site = Site::with_schema(&json!([{"type": "text", "data": ""}]));
    let loaded = site.gateway.load_schema(&site.token).await.unwrap();
    let identity = site.verifier.verify(&loaded.token).unwrap();
    assert_eq!(identity, Identity::new("u-1", "editor"));
}

#[tokio::test]
async fn test_missing_schema_is_not_found() {
    let site = Site::new();
    let err = site.gateway.load_schema(&site.token).await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn test_save_schema_twice_persists_identical_bytes() {
    let site = Site::new();
    let schema = PageSchema::from_value(json!([
        {"type": "hero", "data": "c-1", "settings": {"wide": true}},
        {"type": "list", "children": [{"type": "text", "data": ""}]}
    ]));

    site.gateway.save_schema(&site.token, &schema).await.unwrap();
    let first = std::fs::read(site.root().join("web-schema.json")).unwrap();
    site.gateway.save_schema(&site.token, &schema).await.unwrap();
    let second = std::fs::read(site.root().join("web-schema.json")).unwrap();

    assert_eq!(first, second);
    let reloaded = site.gateway.load_schema(&site.token).await.unwrap().value;
    assert_eq!(reloaded, schema);
}

#[tokio::test]
async fn test_save_schema_failure_restores_previous_bytes() {
    let site = Site::with_schema(&json!([{"type": "text", "data": "c-1"}]));
    site.backend.tear_on_failure(true);
    site.backend.fail_next(Fault::Write, "web-schema.json");

    let err = site
        .gateway
        .save_schema(&site.token, &PageSchema::from_value(json!([])))
        .await
        .unwrap_err();

    match err {
        GatewayError::WriteFailure(failure) => {
            assert_eq!(failure.restore, RestoreOutcome::Restored);
            assert_eq!(failure.attempted, serde_json::to_vec_pretty(&json!([])).unwrap());
        }
        other => panic!("expected write failure, got {:?}", other),
    }
    assert_eq!(
        site.read_json("web-schema.json"),
        json!([{"type": "text", "data": "c-1"}])
    );
}

#[tokio::test]
async fn test_create_then_load_content_is_empty() {
    let site = Site::new();
    let template = TemplateId::parse("article").unwrap();

    let created = site.gateway.create_content(&site.token, &template).await.unwrap();
    let item = site
        .gateway
        .load_content(&created.token, &created.value, &template)
        .await
        .unwrap()
        .value;

    assert_eq!(item.id, created.value);
    assert_eq!(item.template_id, template);
    assert!(item.document().is_empty());
}

#[tokio::test]
async fn test_created_ids_are_unique() {
    let site = Site::new();
    let template = TemplateId::parse("article").unwrap();
    let mut ids = Vec::new();
    for _ in 0..20 {
        ids.push(site.gateway.create_content(&site.token, &template).await.unwrap().value);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 20);
}

#[tokio::test]
async fn test_save_content_requires_existing_item() {
    let site = Site::new();
    let err = site
        .gateway
        .save_content(
            &site.token,
            &ContentId::parse("c-missing").unwrap(),
            &ContentData::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
    assert!(!site.exists("data/c-missing.json"));
}

#[tokio::test]
async fn test_delete_missing_content_is_not_found() {
    let site = Site::new();
    let err = site
        .gateway
        .delete_content(&site.token, &ContentId::parse("c-gone").unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn test_media_listing_and_removal() {
    let site = Site::new();
    site.touch("media/images/b.png");
    site.touch("media/images/a.JPG");
    site.touch("media/images/thumb_a.JPG");
    site.touch("media/images/notes.txt");
    site.touch("media/gallery/summer/x.jpeg");

    let images = site
        .gateway
        .list_media(&site.token, MediaKind::Images, None)
        .await
        .unwrap()
        .value;
    assert_eq!(images, vec![MediaEntry::image("a.JPG"), MediaEntry::image("b.png")]);

    let galleries = site
        .gateway
        .list_media(&site.token, MediaKind::Gallery, None)
        .await
        .unwrap()
        .value;
    assert_eq!(galleries, vec![MediaEntry::gallery("summer")]);

    site.gateway
        .delete_media(
            &site.token,
            &MediaTarget {
                kind: MediaKind::Images,
                name: "a.JPG".to_string(),
                deep: None,
            },
        )
        .await
        .unwrap();
    assert!(!site.exists("media/images/a.JPG"));
    assert!(!site.exists("media/images/thumb_a.JPG"));

    let err = site
        .gateway
        .delete_media(
            &site.token,
            &MediaTarget {
                kind: MediaKind::Images,
                name: "a.JPG".to_string(),
                deep: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn test_gallery_name_cannot_escape_media_root() {
    let site = Site::new();
    for name in ["..", "a/b", "", ".hidden"] {
        let err = site
            .gateway
            .list_media(&site.token, MediaKind::Gallery, Some(name))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidRequest(_)), "{:?}", name);
    }
}
