use rusqlite::{params, Connection, OptionalExtension};
use writeit_core::db::{open_db, open_db_in_memory};
use writeit_core::{
    ChapterPatch, Genre, RepoError, SnapshotRepository, SqliteSnapshotRepository, StoryDraft,
    StoryPatch, StoryStore, STORY_SLOT,
};

fn open_store(conn: &Connection) -> StoryStore<SqliteSnapshotRepository<'_>> {
    let repo = SqliteSnapshotRepository::try_new(conn).unwrap();
    StoryStore::open(repo).unwrap()
}

fn slot_payload(conn: &Connection) -> Option<String> {
    conn.query_row(
        "SELECT value FROM slots WHERE slot = ?1;",
        [STORY_SLOT],
        |row| row.get(0),
    )
    .optional()
    .unwrap()
}

fn seed_slot(conn: &Connection, payload: &str) {
    conn.execute(
        "INSERT INTO slots (slot, value, updated_at) VALUES (?1, ?2, 0);",
        params![STORY_SLOT, payload],
    )
    .unwrap();
}

fn assert_snapshot_matches(conn: &Connection, store: &StoryStore<SqliteSnapshotRepository<'_>>) {
    let persisted = slot_payload(conn).expect("slot should exist after a mutation");
    let in_memory = serde_json::to_string(store.list_stories()).unwrap();
    assert_eq!(persisted, in_memory);
}

#[test]
fn every_mutation_rewrites_the_full_snapshot() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);

    let story_id = store
        .create_story(StoryDraft {
            title: "Synced".to_string(),
            genres: vec![Genre::Thriller],
            tags: vec!["draft".to_string()],
            ..StoryDraft::default()
        })
        .unwrap();
    assert_snapshot_matches(&conn, &store);

    store
        .update_story(
            story_id,
            StoryPatch {
                title: Some("Synced Again".to_string()),
                ..StoryPatch::default()
            },
        )
        .unwrap();
    assert_snapshot_matches(&conn, &store);

    let chapter_id = store
        .create_chapter(story_id, "Ch1", "body")
        .unwrap()
        .unwrap();
    assert_snapshot_matches(&conn, &store);

    store
        .update_chapter(
            story_id,
            chapter_id,
            ChapterPatch {
                content: Some("longer body".to_string()),
                ..ChapterPatch::default()
            },
        )
        .unwrap();
    assert_snapshot_matches(&conn, &store);

    store.delete_chapter(story_id, chapter_id).unwrap();
    assert_snapshot_matches(&conn, &store);

    store.delete_story(story_id).unwrap();
    assert_snapshot_matches(&conn, &store);
    assert_eq!(slot_payload(&conn).as_deref(), Some("[]"));
}

#[test]
fn snapshot_round_trips_field_for_field() {
    let conn = open_db_in_memory().unwrap();
    let mut store = open_store(&conn);

    // Zero, one and many chapters across several stories.
    let bare = store
        .create_story(StoryDraft {
            title: "Bare".to_string(),
            ..StoryDraft::default()
        })
        .unwrap();
    let single = store
        .create_story(StoryDraft {
            title: "Single".to_string(),
            cover_image: Some("data:image/png;base64,CCC".to_string()),
            genres: vec![Genre::Fantasy, Genre::NonFiction],
            tags: vec!["epic".to_string(), "Epic".to_string()],
        })
        .unwrap();
    store.create_chapter(single, "Only", "alone").unwrap();
    let many = store
        .create_story(StoryDraft {
            title: "Many".to_string(),
            genres: vec![Genre::SciFi],
            ..StoryDraft::default()
        })
        .unwrap();
    for index in 0..3 {
        store
            .create_chapter(many, format!("Ch{index}"), format!("body {index}"))
            .unwrap();
    }

    let expected = store.list_stories().to_vec();
    drop(store);

    let reopened = open_store(&conn);
    assert_eq!(reopened.list_stories(), expected.as_slice());
    assert!(reopened.get_story(bare).unwrap().chapters.is_empty());
}

#[test]
fn store_survives_process_restart_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("writeit.sqlite3");

    let story_id = {
        let conn = open_db(&path).unwrap();
        let mut store = open_store(&conn);
        let id = store
            .create_story(StoryDraft {
                title: "Persistent".to_string(),
                ..StoryDraft::default()
            })
            .unwrap();
        store.create_chapter(id, "Ch1", "kept").unwrap();
        id
    };

    let conn = open_db(&path).unwrap();
    let store = open_store(&conn);
    let story = store.get_story(story_id).unwrap();
    assert_eq!(story.title, "Persistent");
    assert_eq!(story.chapters.len(), 1);
    assert_eq!(story.chapters[0].content, "kept");
}

#[test]
fn absent_slot_loads_an_empty_collection() {
    let conn = open_db_in_memory().unwrap();
    let store = open_store(&conn);
    assert!(store.list_stories().is_empty());
}

#[test]
fn malformed_payload_fails_open_to_an_empty_collection() {
    let conn = open_db_in_memory().unwrap();
    seed_slot(&conn, "{definitely not json");

    let store = open_store(&conn);
    assert!(store.list_stories().is_empty());
}

#[test]
fn wrong_shaped_payload_fails_open_to_an_empty_collection() {
    let conn = open_db_in_memory().unwrap();
    seed_slot(&conn, r#"{"stories": "not an array"}"#);

    let store = open_store(&conn);
    assert!(store.list_stories().is_empty());
}

#[test]
fn out_of_domain_genre_label_fails_open_to_an_empty_collection() {
    let conn = open_db_in_memory().unwrap();
    seed_slot(
        &conn,
        r#"[{
            "id": "00000000-0000-4000-8000-000000000001",
            "title": "Odd",
            "genres": ["Cyberpunk"],
            "tags": [],
            "chapters": [],
            "createdAt": 1,
            "lastUpdated": 1
        }]"#,
    );

    let store = open_store(&conn);
    assert!(store.list_stories().is_empty());
}

#[test]
fn next_save_overwrites_a_discarded_payload() {
    let conn = open_db_in_memory().unwrap();
    seed_slot(&conn, "corrupted");

    let mut store = open_store(&conn);
    store
        .create_story(StoryDraft {
            title: "Fresh Start".to_string(),
            ..StoryDraft::default()
        })
        .unwrap();

    let repo = SqliteSnapshotRepository::try_new(&conn).unwrap();
    let reloaded = repo.load().unwrap().unwrap();
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded[0].title, "Fresh Start");
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteSnapshotRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_slots_table() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA user_version = 1;").unwrap();

    assert!(matches!(
        SqliteSnapshotRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("slots"))
    ));
}
