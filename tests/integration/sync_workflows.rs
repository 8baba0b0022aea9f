//! End-to-end workflow tests: orchestrator, gateway and store over a temp dir

use super::support::{Fault, Site};
use folio::auth::Token;
use folio::content::{ContentId, TemplateId};
use folio::error::RestoreOutcome;
use folio::media::{MediaEntry, MediaKind, MediaTarget};
use folio::schema::{PageSchema, Path};
use folio::sync::{EventPayload, FailureKind, Family, Intent, Workflow, WorkflowEvent, WorkflowState};
use serde_json::json;

fn page_with_link(link: &str) -> serde_json::Value {
    json!([
        {"type": "header", "title": "Home"},
        {"type": "text", "data": ""},
        {"type": "article", "data": link}
    ])
}

fn path(raw: &str) -> Path {
    raw.parse().unwrap()
}

fn workflows(events: &[WorkflowEvent]) -> Vec<Workflow> {
    events.iter().map(|e| e.workflow).collect()
}

#[tokio::test]
async fn test_create_content_links_saves_and_loads() {
    let site = Site::with_schema(&page_with_link(""));
    let (orchestrator, mut streams) = site.orchestrator();
    let schema_a = PageSchema::from_value(page_with_link(""));

    orchestrator
        .execute(Intent::CreateContent {
            template_id: TemplateId::parse("article").unwrap(),
            path: path("2.data"),
            schema: schema_a.clone(),
        })
        .await;

    let events = streams.drain_family(Family::Pages);
    assert_eq!(
        workflows(&events),
        vec![Workflow::CreateContent, Workflow::SaveSchema, Workflow::LoadContent]
    );
    assert!(events.iter().all(WorkflowEvent::is_success));

    let new_id = match &events[0].payload {
        EventPayload::ContentLinked { content_id, schema } => {
            assert_eq!(schema.to_value()[2]["data"], json!(content_id.as_str()));
            content_id.clone()
        }
        other => panic!("unexpected payload {:?}", other),
    };
    assert!(new_id.as_str().starts_with("c-"));

    match &events[2].payload {
        EventPayload::Content { item } => {
            assert_eq!(item.id, new_id);
            assert_eq!(item.template_id.as_str(), "article");
            assert!(item.metadata.is_empty());
            assert!(item.data.is_empty());
        }
        other => panic!("unexpected payload {:?}", other),
    }

    // persisted schema carries the link, the caller's schema does not
    assert_eq!(site.read_json("web-schema.json")[2]["data"], json!(new_id.as_str()));
    assert_eq!(schema_a.to_value()[2]["data"], json!(""));
    assert_eq!(
        site.read_json(&format!("data/{}.json", new_id)),
        json!({"metadata": {}, "data": {}})
    );
    assert!(orchestrator.content(&new_id).is_some());
}

#[tokio::test]
async fn test_create_content_at_child_list_keeps_schema_file() {
    let nested = json!([
        {"type": "page", "data": "", "children": [{"type": "text", "data": "c-1"}]}
    ]);
    let site = Site::with_schema(&nested);
    let (orchestrator, mut streams) = site.orchestrator();

    orchestrator
        .execute(Intent::CreateContent {
            template_id: TemplateId::parse("article").unwrap(),
            path: path("0.children"),
            schema: PageSchema::from_value(nested.clone()),
        })
        .await;

    let events = streams.drain_family(Family::Pages);
    assert_eq!(workflows(&events), vec![Workflow::CreateContent]);
    assert_eq!(events[0].failure().unwrap().kind, FailureKind::InvalidPath);
    assert_eq!(site.read_json("web-schema.json"), nested);
    let created = std::fs::read_dir(site.root().join("data"))
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(created, 0);
}

#[tokio::test]
async fn test_create_content_write_failure_leaves_no_link() {
    let site = Site::with_schema(&page_with_link(""));
    site.backend.fail_next(Fault::Write, "data/");
    let (orchestrator, mut streams) = site.orchestrator();

    let root = orchestrator
        .execute(Intent::CreateContent {
            template_id: TemplateId::parse("article").unwrap(),
            path: path("2.data"),
            schema: PageSchema::from_value(page_with_link("")),
        })
        .await;

    let events = streams.drain_family(Family::Pages);
    assert_eq!(events.len(), 1);
    let failure = events[0].failure().unwrap();
    assert_eq!(failure.kind, FailureKind::WriteFailure);
    assert_eq!(failure.restore, Some(RestoreOutcome::Cleared));
    assert_eq!(orchestrator.state(root), Some(WorkflowState::Failed));

    assert!(orchestrator.schema().is_none());
    assert_eq!(site.read_json("web-schema.json"), page_with_link(""));
    let leftovers = std::fs::read_dir(site.root().join("data"))
        .map(|entries| entries.count())
        .unwrap_or(0);
    assert_eq!(leftovers, 0, "no half-registered content item");
}

#[tokio::test]
async fn test_delete_content_unlinks_and_saves() {
    let site = Site::with_schema(&page_with_link("c-123"));
    site.write_json("data/c-123.json", &json!({"metadata": {}, "data": {"title": "x"}}));
    let (orchestrator, mut streams) = site.orchestrator();

    orchestrator
        .execute(Intent::DeleteContent {
            data_id: ContentId::parse("c-123").unwrap(),
            path: path("2.data"),
            schema: PageSchema::from_value(page_with_link("c-123")),
        })
        .await;

    let events = streams.drain_family(Family::Pages);
    assert_eq!(workflows(&events), vec![Workflow::DeleteContent, Workflow::SaveSchema]);
    assert!(events.iter().all(WorkflowEvent::is_success));
    assert_eq!(site.read_json("web-schema.json")[2]["data"], json!(""));
    assert!(!site.exists("data/c-123.json"));

    orchestrator
        .execute(Intent::LoadContent {
            data_id: ContentId::parse("c-123").unwrap(),
            template_id: TemplateId::parse("article").unwrap(),
        })
        .await;
    let events = streams.drain_family(Family::Pages);
    assert_eq!(events[0].failure().unwrap().kind, FailureKind::NotFound);
}

#[tokio::test]
async fn test_delete_content_failure_keeps_schema_and_skips_save() {
    let site = Site::with_schema(&page_with_link("c-123"));
    site.write_json("data/c-123.json", &json!({"metadata": {}, "data": {}}));
    site.backend.fail_next(Fault::Remove, "data/c-123");
    let (orchestrator, mut streams) = site.orchestrator();
    let schema_b = PageSchema::from_value(page_with_link("c-123"));

    orchestrator
        .execute(Intent::DeleteContent {
            data_id: ContentId::parse("c-123").unwrap(),
            path: path("2.data"),
            schema: schema_b.clone(),
        })
        .await;

    let events = streams.drain_family(Family::Pages);
    assert_eq!(workflows(&events), vec![Workflow::DeleteContent]);
    let failure = events[0].failure().unwrap();
    assert_eq!(failure.subject.as_deref(), Some("c-123"));
    assert_eq!(schema_b.to_value(), page_with_link("c-123"));
    assert_eq!(site.read_json("web-schema.json"), page_with_link("c-123"));
    assert!(site.exists("data/c-123.json"));
}

#[tokio::test]
async fn test_failed_schema_save_keeps_link_in_session() {
    let site = Site::with_schema(&page_with_link(""));
    site.backend.fail_next(Fault::Write, "web-schema.json");
    let (orchestrator, mut streams) = site.orchestrator();

    orchestrator
        .execute(Intent::CreateContent {
            template_id: TemplateId::parse("article").unwrap(),
            path: path("2.data"),
            schema: PageSchema::from_value(page_with_link("")),
        })
        .await;

    let events = streams.drain_family(Family::Pages);
    assert_eq!(workflows(&events), vec![Workflow::CreateContent, Workflow::SaveSchema]);
    assert!(events[0].is_success());
    let failure = events[1].failure().unwrap();
    assert_eq!(failure.kind, FailureKind::WriteFailure);
    assert_eq!(failure.restore, Some(RestoreOutcome::Restored));

    let linked = orchestrator.schema().unwrap();
    assert_ne!(linked.to_value()[2]["data"], json!(""));
    assert_eq!(site.read_json("web-schema.json"), page_with_link(""));

    // a later save repairs the drift
    orchestrator.execute(Intent::SaveSchema { schema: linked.clone() }).await;
    assert_eq!(site.read_json("web-schema.json"), linked.to_value());
}

#[tokio::test]
async fn test_save_content_returns_canonical_document() {
    let site = Site::with_schema(&page_with_link("c-7"));
    site.write_json(
        "data/c-7.json",
        &json!({"_metadata": "{\"author\":\"old\"}", "data": "{\"body\":\"old\"}"}),
    );
    let (orchestrator, mut streams) = site.orchestrator();
    let id = ContentId::parse("c-7").unwrap();

    orchestrator
        .execute(Intent::LoadContent {
            data_id: id.clone(),
            template_id: TemplateId::parse("article").unwrap(),
        })
        .await;
    let mut document = orchestrator.content(&id).unwrap().document();
    assert_eq!(document.metadata["author"], json!("old"));
    document.data.insert("body".to_string(), json!("new"));

    orchestrator
        .execute(Intent::SaveContent {
            data_id: id.clone(),
            content: document,
        })
        .await;

    let events = streams.drain_family(Family::Pages);
    assert!(events.iter().all(WorkflowEvent::is_success));
    assert_eq!(
        site.read_json("data/c-7.json"),
        json!({"metadata": {"author": "old"}, "data": {"body": "new"}})
    );
    assert_eq!(orchestrator.content(&id).unwrap().data["body"], json!("new"));
}

#[tokio::test]
async fn test_invalid_token_fails_before_any_io() {
    let site = Site::with_schema(&page_with_link(""));
    let (orchestrator, mut streams) = site.orchestrator();
    orchestrator.replace_token(Token::new("forged.token"));

    orchestrator
        .execute(Intent::CreateContent {
            template_id: TemplateId::parse("article").unwrap(),
            path: path("2.data"),
            schema: PageSchema::from_value(page_with_link("")),
        })
        .await;

    let events = streams.drain_family(Family::Pages);
    assert_eq!(events[0].failure().unwrap().kind, FailureKind::Unauthorized);
    assert!(!site.exists("data"));
}

#[tokio::test]
async fn test_successful_calls_refresh_the_token() {
    let site = Site::with_schema(&page_with_link(""));
    let (orchestrator, mut streams) = site.orchestrator();
    let before = orchestrator.token();
    // tokens carry second-resolution expiry; make sure the refreshed one differs
    tokio::time::sleep(std::time::Duration::from_millis(1100)).await;

    orchestrator.execute(Intent::LoadSchema).await;
    let after = orchestrator.token();
    assert_ne!(after, before);
    assert_eq!(orchestrator.schema().unwrap().to_value(), page_with_link(""));

    // the refreshed token is accepted for the next call
    orchestrator.execute(Intent::LoadGalleries).await;
    assert_eq!(orchestrator.in_flight(), 0);
    assert!(streams.drain().iter().all(WorkflowEvent::is_success));
}

#[tokio::test]
async fn test_corrupt_content_is_distinct_from_missing() {
    let site = Site::with_schema(&page_with_link("c-9"));
    std::fs::create_dir_all(site.root().join("data")).unwrap();
    std::fs::write(site.root().join("data/c-9.json"), b"{not json").unwrap();
    let (orchestrator, mut streams) = site.orchestrator();

    orchestrator
        .execute(Intent::LoadContent {
            data_id: ContentId::parse("c-9").unwrap(),
            template_id: TemplateId::parse("article").unwrap(),
        })
        .await;

    let events = streams.drain_family(Family::Pages);
    assert_eq!(events[0].failure().unwrap().kind, FailureKind::CorruptContent);
}

#[tokio::test]
async fn test_delete_gallery_image_reloads_that_gallery() {
    let site = Site::new();
    site.touch("media/gallery/summer/img1.jpg");
    site.touch("media/gallery/summer/thumb_img1.jpg");
    site.touch("media/gallery/summer/img2.PNG");
    let (orchestrator, mut streams) = site.orchestrator();

    orchestrator
        .execute(Intent::DeleteMedia {
            target: MediaTarget {
                kind: MediaKind::Gallery,
                name: "summer".to_string(),
                deep: Some("img1.jpg".to_string()),
            },
        })
        .await;

    let events = streams.drain_family(Family::Media);
    assert_eq!(
        workflows(&events),
        vec![Workflow::DeleteMedia, Workflow::LoadGalleryImages]
    );
    assert_eq!(events[1].parent, Some(events[0].intent_id));
    assert_eq!(
        orchestrator.gallery_images("summer").unwrap(),
        vec![MediaEntry::image("img2.PNG")]
    );
    assert!(!site.exists("media/gallery/summer/thumb_img1.jpg"));
}

#[tokio::test]
async fn test_media_mutations_reload_their_listing() {
    let site = Site::new();
    site.touch("media/images/a.jpg");
    let (orchestrator, mut streams) = site.orchestrator();

    orchestrator
        .execute(Intent::CreateGallery {
            name: "winter".to_string(),
        })
        .await;
    orchestrator
        .execute(Intent::DeleteMedia {
            target: MediaTarget {
                kind: MediaKind::Images,
                name: "a.jpg".to_string(),
                deep: None,
            },
        })
        .await;
    orchestrator
        .execute(Intent::DeleteMedia {
            target: MediaTarget {
                kind: MediaKind::Gallery,
                name: "winter".to_string(),
                deep: None,
            },
        })
        .await;

    let events = streams.drain_family(Family::Media);
    assert_eq!(
        workflows(&events),
        vec![
            Workflow::CreateGallery,
            Workflow::LoadGalleries,
            Workflow::DeleteMedia,
            Workflow::LoadImages,
            Workflow::DeleteMedia,
            Workflow::LoadGalleries,
        ]
    );
    assert!(events.iter().all(WorkflowEvent::is_success));
    assert!(orchestrator.images().is_empty());
    assert!(orchestrator.galleries().is_empty());
}

#[tokio::test]
async fn test_media_names_with_separators_are_rejected() {
    let site = Site::new();
    let (orchestrator, mut streams) = site.orchestrator();

    orchestrator
        .execute(Intent::CreateGallery {
            name: "../escape".to_string(),
        })
        .await;

    let events = streams.drain_family(Family::Media);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].failure().unwrap().kind, FailureKind::InvalidRequest);
    assert!(!site.root().join("escape").exists());
}
