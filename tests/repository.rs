use api_boilerplate::model::{Example, ExampleCreate, ExampleUpdate, Table, UPDATE_BY_MAX_LEN};
use api_boilerplate::session::MemorySession;
use api_boilerplate::{
    Entity, ListLimit, MemoryStore, PersistenceError, Repository, RepositoryError, Row, Session,
};
use async_trait::async_trait;
use serde_json::{json, Value};

fn new_example(by: &str) -> ExampleCreate {
    ExampleCreate {
        update_by: Some(by.to_string()),
        extra_data: Some(json!({ "source": "test" })),
        ..Default::default()
    }
}

async fn seed(store: &MemoryStore, repo: &Repository<Example>, n: usize) -> Vec<Example> {
    let mut session = store.session();
    let mut out = Vec::new();
    for i in 0..n {
        out.push(repo.create(&mut session, &new_example(&format!("user-{i}"))).await.unwrap());
    }
    out
}

#[tokio::test]
async fn create_then_get_returns_supplied_fields() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let mut session = store.session();

    let created = repo.create(&mut session, &new_example("ana")).await.unwrap();
    assert!(created.active);
    assert_eq!(created.update_by.as_deref(), Some("ana"));
    assert_eq!(created.created_at, created.last_update);

    let mut other = store.session();
    let fetched = repo.get(&mut other, &created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_honours_explicit_active_flag() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let input = ExampleCreate {
        active: Some(false),
        ..Default::default()
    };
    let created = repo.create(&mut store.session(), &input).await.unwrap();
    assert!(!created.active);
}

#[tokio::test]
async fn get_missing_is_none() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let got = repo.get(&mut store.session(), &uuid::Uuid::new_v4()).await.unwrap();
    assert!(got.is_none());
}

#[tokio::test]
async fn get_by_matches_on_named_fields() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let seeded = seed(&store, &repo, 3).await;
    let mut session = store.session();

    let hit = repo
        .get_by(&mut session, &[("update_by", json!("user-1"))])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.id, seeded[1].id);

    let miss = repo
        .get_by(&mut session, &[("update_by", json!("nobody"))])
        .await
        .unwrap();
    assert!(miss.is_none());
}

#[tokio::test]
async fn get_by_rejects_unknown_columns() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let err = repo
        .get_by(&mut store.session(), &[("colour", json!("red"))])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::UnknownColumn { column, .. } if column == "colour"));
}

#[tokio::test]
async fn list_skips_and_honours_limit_by_default() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let seeded = seed(&store, &repo, 3).await;
    let mut session = store.session();

    let page = repo.list(&mut session, 0, Some(1)).await.unwrap();
    assert_eq!(page.len(), 1);

    let rest = repo.list(&mut session, 1, None).await.unwrap();
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0].id, seeded[1].id);
}

#[tokio::test]
async fn list_with_ignored_limit_returns_every_row() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new().with_list_limit(ListLimit::Ignore);
    seed(&store, &repo, 3).await;

    let all = repo.list(&mut store.session(), 0, Some(1)).await.unwrap();
    assert_eq!(all.len(), 3);
}

#[tokio::test]
async fn update_is_a_patch() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let created = seed(&store, &repo, 1).await.remove(0);
    let mut session = store.session();

    let patch = ExampleUpdate {
        update_by: Some("bo".into()),
        ..Default::default()
    };
    let updated = repo.update(&mut session, &created, &patch).await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.update_by.as_deref(), Some("bo"));
    assert_eq!(updated.active, created.active);
    assert_eq!(updated.extra_data, created.extra_data);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.last_update >= created.last_update);

    let stored = repo.get(&mut store.session(), &created.id).await.unwrap().unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn empty_update_changes_nothing() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let created = seed(&store, &repo, 1).await.remove(0);

    let same = repo
        .update(&mut store.session(), &created, &ExampleUpdate::default())
        .await
        .unwrap();
    assert_eq!(same, created);
}

#[tokio::test]
async fn update_of_deleted_entity_is_not_found() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let created = seed(&store, &repo, 1).await.remove(0);
    let mut session = store.session();
    repo.remove(&mut session, &created.id).await.unwrap();

    let patch = ExampleUpdate {
        active: Some(false),
        ..Default::default()
    };
    let err = repo.update(&mut session, &created, &patch).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn remove_returns_prior_state_and_deletes() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let created = seed(&store, &repo, 2).await.remove(0);
    let mut session = store.session();

    let removed = repo.remove(&mut session, &created.id).await.unwrap();
    assert_eq!(removed, created);
    assert!(repo.get(&mut session, &created.id).await.unwrap().is_none());
    assert_eq!(store.len(&Example::TABLE), 1);
}

#[tokio::test]
async fn remove_missing_is_not_found() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let id = uuid::Uuid::new_v4();
    let err = repo.remove(&mut store.session(), &id).await.unwrap_err();
    match err {
        RepositoryError::NotFound { entity, id: missing } => {
            assert_eq!(entity, "example");
            assert_eq!(missing, id.to_string());
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn soft_remove_keeps_row_inactive() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let created = seed(&store, &repo, 1).await.remove(0);
    let mut session = store.session();

    let deactivated = repo.soft_remove(&mut session, &created.id).await.unwrap();
    assert!(!deactivated.active);

    let fetched = repo.get(&mut store.session(), &created.id).await.unwrap().unwrap();
    assert_eq!(fetched.id, created.id);
    assert!(!fetched.active);
    assert_eq!(fetched.update_by, created.update_by);
}

#[tokio::test]
async fn soft_remove_missing_is_not_found() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let err = repo
        .soft_remove(&mut store.session(), &uuid::Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn update_by_is_limited_to_its_column_width() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();

    let at_limit = "é".repeat(UPDATE_BY_MAX_LEN);
    let created = repo.create(&mut store.session(), &new_example(&at_limit)).await.unwrap();
    assert_eq!(created.update_by.as_deref(), Some(at_limit.as_str()));

    let too_long = "x".repeat(UPDATE_BY_MAX_LEN + 1);
    let err = repo
        .create(&mut store.session(), &new_example(&too_long))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::TooLong { column: "update_by", max, .. } if max == UPDATE_BY_MAX_LEN));

    let patch = ExampleUpdate {
        update_by: Some(too_long),
        ..Default::default()
    };
    let err = repo.update(&mut store.session(), &created, &patch).await.unwrap_err();
    assert!(matches!(err, RepositoryError::TooLong { .. }));
    assert_eq!(store.len(&Example::TABLE), 1);
}

/// Delegates to a memory session but fails every insert.
struct RejectingInserts {
    inner: MemorySession,
    rolled_back: bool,
}

#[async_trait]
impl Session for RejectingInserts {
    async fn find(&mut self, table: &Table, filters: &[(&str, Value)]) -> Result<Option<Row>, PersistenceError> {
        self.inner.find(table, filters).await
    }

    async fn find_many(
        &mut self,
        table: &Table,
        offset: u64,
        limit: Option<u64>,
    ) -> Result<Vec<Row>, PersistenceError> {
        self.inner.find_many(table, offset, limit).await
    }

    async fn insert(&mut self, _table: &Table, _row: Row) -> Result<Row, PersistenceError> {
        Err(PersistenceError::Constraint("rejected".into()))
    }

    async fn update(&mut self, table: &Table, id: &Value, changes: Row) -> Result<Option<Row>, PersistenceError> {
        self.inner.update(table, id, changes).await
    }

    async fn delete(&mut self, table: &Table, id: &Value) -> Result<Option<Row>, PersistenceError> {
        self.inner.delete(table, id).await
    }

    async fn commit(&mut self) -> Result<(), PersistenceError> {
        self.inner.commit().await
    }

    async fn rollback(&mut self) -> Result<(), PersistenceError> {
        self.rolled_back = true;
        self.inner.rollback().await
    }
}

#[tokio::test]
async fn failed_create_rolls_back_and_leaves_nothing_behind() {
    let store = MemoryStore::new();
    let repo = Repository::<Example>::new();
    let mut session = RejectingInserts {
        inner: store.session(),
        rolled_back: false,
    };

    let err = repo.create(&mut session, &new_example("ana")).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Persistence(PersistenceError::Constraint(_))
    ));
    assert!(session.rolled_back);
    assert!(store.is_empty(&Example::TABLE));
    assert!(repo.list(&mut store.session(), 0, None).await.unwrap().is_empty());
}
