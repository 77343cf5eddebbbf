use std::sync::{Arc, Mutex};

use canvas_actions::MutationCommand;
use canvas_context::{OutlineSource, StaticSource};
use canvas_core::{AppConfig, ConfigStore, Conversation};
use canvas_tools::{CanvasHost, HostError};
use canvas_types::{BatchStatus, DocumentKind, FocusInfo, OutlineNode, PageInfo, Slot};
use serde_json::json;

#[derive(Default)]
struct MemoryHost {
    source: StaticSource,
    batches: Mutex<Vec<(String, Vec<MutationCommand>, BatchStatus)>>,
}

impl OutlineSource for MemoryHost {
    fn outline(&self, id: &str, kind: DocumentKind) -> Option<OutlineNode> {
        self.source.outline(id, kind)
    }

    fn all_pages(&self) -> Vec<PageInfo> {
        self.source.all_pages()
    }

    fn component_doc(&self, namespace: &str) -> Option<String> {
        self.source.component_doc(namespace)
    }
}

impl CanvasHost for MemoryHost {
    fn apply_mutation(
        &self,
        target_id: &str,
        commands: &[MutationCommand],
        status: BatchStatus,
    ) -> Result<(), HostError> {
        self.batches
            .lock()
            .expect("lock")
            .push((target_id.to_string(), commands.to_vec(), status));
        Ok(())
    }

    fn root_container_id(&self, _page_id: &str) -> Option<String> {
        Some("u_gen_root".to_string())
    }
}

fn host() -> Arc<MemoryHost> {
    let home = OutlineNode::new("p_home", "Home").with_slot(
        Slot::new("_rootSlot_").with_child(
            OutlineNode::new("u_card", "Card")
                .with_namespace("ns.card")
                .with_slot(
                    Slot::new("body")
                        .with_child(OutlineNode::new("u_title", "Title").with_namespace("ns.text")),
                ),
        ),
    );
    Arc::new(MemoryHost {
        source: StaticSource::default()
            .with_page(PageInfo::new("p_home", "Home"), home)
            .with_doc("ns.text", "Text: data.content"),
        ..MemoryHost::default()
    })
}

const ADD_HERO: &str = concat!(
    "```json file=\"actions.json\"\n",
    "[\"u_gen_root\",\"_rootSlot_\",\"addChild\",{\"title\":\"Hero\",\"ns\":\"ns.card\",\"comId\":\"u_hero\"}]\n",
    "```\n",
);

#[tokio::test]
async fn each_turn_gets_fresh_parsers() {
    let host = host();
    let mut conversation = Conversation::new(
        host.clone(),
        AppConfig::default(),
        FocusInfo::page("p_home", "Home"),
    );

    for _ in 0..2 {
        let tools = conversation.begin_turn().expect("tools");
        tools.stream("generate-page", ADD_HERO).await.expect("stream");
    }

    let batches = host.batches.lock().expect("lock").clone();
    assert_eq!(batches.len(), 2);
    for (target, commands, status) in &batches {
        assert_eq!(target, "p_home");
        assert_eq!(*status, BatchStatus::Start);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].target_id, "_root_");
    }
    assert_eq!(conversation.turns(), 2);
}

#[tokio::test]
async fn configured_sentinel_reaches_the_parser() {
    let host = host();
    let mut config = AppConfig::default();
    config.actions.root_sentinel = "__page__".to_string();
    let mut conversation =
        Conversation::new(host.clone(), config, FocusInfo::page("p_home", "Home"));

    conversation
        .begin_turn()
        .expect("tools")
        .execute("generate-page", json!({ "content": ADD_HERO }))
        .await
        .expect("execute");

    let batches = host.batches.lock().expect("lock").clone();
    let (_, commands, status) = batches.last().expect("complete batch");
    assert_eq!(*status, BatchStatus::Complete);
    assert_eq!(commands[0].target_id, "__page__");
}

#[tokio::test]
async fn workspace_outlives_turns_until_reset() {
    let host = host();
    let mut conversation =
        Conversation::new(host, AppConfig::default(), FocusInfo::page("p_home", "Home"));
    let first_id = conversation.id().to_string();

    let result = conversation
        .begin_turn()
        .expect("tools")
        .execute("open-dsl-document", json!({ "ids": "u_title" }))
        .await
        .expect("open");
    assert!(result.output.contains("<ns.text>"));

    conversation.begin_turn().expect("tools");
    assert_eq!(conversation.workspace().read().await.documents().len(), 1);
    assert!(conversation.render_context().await.contains("[id=u_title]"));

    conversation.reset(FocusInfo::page("p_home", "Home")).await;
    assert!(conversation.workspace().read().await.documents().is_empty());
    assert_ne!(conversation.id(), first_id);
    assert_eq!(conversation.turns(), 0);
}

#[tokio::test]
async fn project_patches_persist_and_runtime_patches_do_not() {
    let dir = tempfile::tempdir().expect("tempdir");
    let project = dir.path().join("project").join("config.json");
    let global = dir.path().join("global.json");

    let store = ConfigStore::with_global_path(&project, &global, None)
        .await
        .expect("store");
    store
        .patch_project(json!({ "context": { "collapse_unrelated": false } }))
        .await
        .expect("project patch");
    store
        .patch_runtime(json!({ "actions": { "root_slot_id": "_tmpSlot_" } }))
        .await
        .expect("runtime patch");

    let config = store.get().await;
    assert!(!config.context.collapse_unrelated);
    assert_eq!(config.actions.root_slot_id, "_tmpSlot_");

    let reopened = ConfigStore::with_global_path(&project, &global, None)
        .await
        .expect("reopen");
    let config = reopened.get().await;
    assert!(!config.context.collapse_unrelated);
    assert_eq!(config.actions.root_slot_id, "_rootSlot_");
}

#[tokio::test]
async fn cli_overrides_win_over_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let global = dir.path().join("global.json");
    std::fs::write(&global, r#"{"logging":{"retention_days":30}}"#).expect("write global");
    let project = dir.path().join("config.json");
    std::fs::write(&project, r#"{"logging":{"retention_days":7}}"#).expect("write project");

    let store = ConfigStore::with_global_path(&project, &global, None)
        .await
        .expect("store");
    assert_eq!(store.get().await.logging.retention_days, 7);

    let store = ConfigStore::with_global_path(
        &project,
        &global,
        Some(json!({ "logging": { "retention_days": 1 } })),
    )
    .await
    .expect("store");
    assert_eq!(store.get().await.logging.retention_days, 1);
}
