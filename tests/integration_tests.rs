use learning_paths::{
    classify, recommend, CompletionCriteria, ConfigBuilder, ContentItem, Engine, Error,
    JsonFileStore, LearningPath, Level, PathUpdate, Session, Store,
};
use std::collections::BTreeMap;
use tempfile::TempDir;
use tokio::fs;

fn scenario_path() -> LearningPath {
    LearningPath::new("p1", "Python", Level::Beginner)
        .with_topics(["python"])
        .with_criteria(CompletionCriteria {
            min_items_watched: 2,
            min_time_spent_seconds: 1000,
            required_topics: ["python".to_string()].into_iter().collect(),
        })
}

fn scenario_item() -> ContentItem {
    ContentItem::new("v1", "Python Basics Intro", "intro to basics", 600)
}

#[test]
fn test_classify_scenario() {
    let paths = vec![scenario_path()];
    let result = classify(&scenario_item(), &paths).unwrap();

    assert_eq!(result.path_id, "p1");
    assert_eq!(result.topics, vec!["python".to_string()]);
    assert_eq!(result.required_watch_seconds, 600);
}

#[test]
fn test_unknown_topics_never_classify() {
    let paths = vec![scenario_path()];
    let item = ContentItem::new("v2", "Gardening basics", "an introduction to soil", 300);

    for _ in 0..3 {
        assert!(classify(&item, &paths).is_none());
    }
}

#[test]
fn test_record_watch_and_completion_scenario() {
    let mut engine = Engine::new(vec![scenario_path()]);
    let classification = engine.classify(&scenario_item()).unwrap();
    let item = scenario_item().with_topics(classification.topics);

    engine.record_watch("p1", &item, 600).unwrap();
    let progress = engine.record_watch("p1", &item, 600).unwrap();

    assert_eq!(progress.completed_count, 2);
    assert_eq!(progress.total_count, 2);
    assert_eq!(progress.time_spent_seconds, 1200);
    assert!(engine.is_path_completed("p1").unwrap());
}

#[test]
fn test_recommend_scenario() {
    let p1 = LearningPath::new("p1", "Basics", Level::Beginner).with_topics(["python"]);
    let p2 = LearningPath::new("p2", "Projects", Level::Intermediate).with_prerequisites(["p1"]);
    let p3 = LearningPath::new("p3", "Orphan", Level::Intermediate).with_prerequisites(["p_missing"]);

    let mut engine = Engine::new(vec![p1, p2, p3]);
    engine
        .record_watch("p1", &ContentItem::new("v1", "Python", "", 60), 60)
        .unwrap();

    let ids: Vec<String> = engine.recommend().into_iter().map(|p| p.id).collect();
    assert!(ids.contains(&"p2".to_string()));
    assert!(!ids.contains(&"p3".to_string()));
    assert!(!ids.contains(&"p1".to_string()));

    let same: Vec<String> = recommend(engine.paths(), engine.tracker().all())
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, same);
}

#[test]
fn test_analytics_on_unwatched_path() {
    let engine = Engine::new(vec![scenario_path()]);
    let analytics = engine.analytics("p1").unwrap();

    assert_eq!(analytics.completion_rate, 0.0);
    assert_eq!(analytics.streak_days, 0);
    assert_eq!(analytics.next_milestone.value, 25);
}

#[test]
fn test_invariants_hold_over_many_watches() {
    let mut engine = Engine::new(vec![scenario_path()]);
    let mut previous = (0, 0);

    for i in 0..20u64 {
        let item = ContentItem::new(format!("v{}", i % 3), "Python", "", 60);
        let progress = engine.record_watch("p1", &item, i * 7).unwrap();

        assert!(progress.completed_count <= progress.total_count);
        assert!(progress.completed_count >= previous.0);
        assert!(progress.time_spent_seconds >= previous.1);
        assert!(progress
            .completed_topics
            .iter()
            .all(|topic| engine.path("p1").unwrap().find_topic(topic).is_some()));
        previous = (progress.completed_count, progress.time_spent_seconds);
    }
}

#[tokio::test]
async fn test_session_persists_across_restarts() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new().with_data_dir(dir.path().to_path_buf()).build();

    {
        let mut session = Session::open(JsonFileStore::from_config(&config), &config)
            .await
            .unwrap();
        assert_eq!(session.engine().paths().len(), 3);

        let item = ContentItem::with_iso_duration("yt1", "Neural networks explained", "", "PT12M")
            .unwrap();
        let assignment = session.assign_item(item.clone()).await.unwrap().unwrap();
        assert_eq!(assignment.path_id, "ai-basics");

        session.record_watch("ai-basics", &item, 720).await.unwrap();
        session
            .update_path(
                "ml-projects",
                PathUpdate {
                    description: Some("Build real models".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let session = Session::open(JsonFileStore::from_config(&config), &config)
        .await
        .unwrap();
    let engine = session.engine();

    let progress = engine.progress("ai-basics").unwrap();
    assert_eq!(progress.time_spent_seconds, 720);
    assert!(progress.completed_topics.contains("neural networks"));
    assert!(engine.path("ai-basics").unwrap().has_item("yt1"));
    assert_eq!(engine.path("ml-projects").unwrap().description, "Build real models");
    assert_eq!(engine.summary().total_videos_watched, 1);
}

#[tokio::test]
async fn test_deleted_path_progress_is_removed_from_disk() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new().with_data_dir(dir.path().to_path_buf()).build();
    let store = JsonFileStore::from_config(&config);

    let mut session = Session::open(store.clone(), &config).await.unwrap();
    session
        .record_watch("advanced-ai", &ContentItem::new("v", "GANs", "", 60), 60)
        .await
        .unwrap();
    session.delete_path("advanced-ai").await.unwrap();

    let saved = store.load().await.unwrap().unwrap();
    assert!(saved.paths.iter().all(|p| p.id != "advanced-ai"));
    assert!(!saved.progress.contains_key("advanced-ai"));

    assert!(matches!(
        session.delete_path("advanced-ai").await,
        Err(Error::PathNotFound(_))
    ));
}

#[tokio::test]
async fn test_rules_file_from_config() {
    let dir = TempDir::new().unwrap();
    let rules_path = dir.path().join("rules.txt");
    fs::write(&rules_path, "[topics]\nrl -> reinforcement learning\n[advanced]\nmasterclass\n")
        .await
        .unwrap();

    let config = ConfigBuilder::new()
        .with_data_dir(dir.path().join("data"))
        .with_rules_file(rules_path)
        .build();
    let session = Session::open(JsonFileStore::from_config(&config), &config)
        .await
        .unwrap();

    let item = ContentItem::new("v1", "RL masterclass", "", 3600);
    let result = session.engine().classify(&item).unwrap();
    assert_eq!(result.path_id, "advanced-ai");
    assert_eq!(result.level, Some(Level::Advanced));
}

#[tokio::test]
async fn test_persisted_json_layout() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new().with_data_dir(dir.path().to_path_buf()).build();
    let mut session = Session::open(JsonFileStore::from_config(&config), &config)
        .await
        .unwrap();
    session
        .record_watch("ai-basics", &ContentItem::new("v", "Python", "", 60), 30)
        .await
        .unwrap();

    let progress: BTreeMap<String, serde_json::Value> = serde_json::from_str(
        &fs::read_to_string(config.progress_path()).await.unwrap(),
    )
    .unwrap();
    let record = &progress["ai-basics"];
    assert_eq!(record["completedCount"], 1);
    assert_eq!(record["totalCount"], 1);
    assert_eq!(record["timeSpentSeconds"], 30);
    assert!(record["startedAt"].is_string());

    let paths: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(config.paths_path()).await.unwrap()).unwrap();
    assert_eq!(paths[0]["id"], "ai-basics");
    assert_eq!(paths[0]["level"], "beginner");
}

#[tokio::test]
async fn test_failed_save_is_not_visible_after_restart() {
    let dir = TempDir::new().unwrap();
    let config = ConfigBuilder::new().with_data_dir(dir.path().to_path_buf()).build();
    let mut session = Session::open(JsonFileStore::from_config(&config), &config)
        .await
        .unwrap();
    session
        .record_watch("ai-basics", &ContentItem::new("v", "Python", "", 60), 60)
        .await
        .unwrap();

    fs::remove_file(config.progress_path()).await.unwrap();
    fs::create_dir(config.progress_path()).await.unwrap();
    fs::write(config.progress_path().join("keep"), "x").await.unwrap();

    let result = session
        .add_path(LearningPath::new("new-path", "New Path", Level::Beginner))
        .await;
    assert!(matches!(result, Err(Error::Io(_))));
    assert!(session.engine().path("new-path").is_none());

    fs::remove_dir_all(config.progress_path()).await.unwrap();
    let reopened = Session::open(JsonFileStore::from_config(&config), &config)
        .await
        .unwrap();
    assert!(reopened.engine().path("new-path").is_none());
    assert_eq!(reopened.engine().paths().len(), 3);
}
