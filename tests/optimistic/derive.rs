use optimistic_cache::{Collection, Entity, EntityKey, InMemoryRemote, RemoteError};
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Entity)]
#[serde(default)]
struct Note {
    #[entity(id)]
    slug: String,
    body: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Entity)]
#[entity(collection = "lists")]
struct TodoList {
    id: u32,
    name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Entity)]
#[serde(default, rename_all = "camelCase")]
struct Post {
    #[entity(id)]
    post_id: i64,
    title: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Entity)]
#[serde(default)]
struct Bookmark {
    #[entity(id)]
    #[serde(rename = "key")]
    slug: String,
    url: String,
}

#[test]
fn derive_defaults_from_type_name() {
    assert_eq!(Note::COLLECTION, "notes");
    assert_eq!(Note::NAME, "note");
    assert_eq!(Note::ID_FIELD, "slug");

    assert_eq!(TodoList::COLLECTION, "lists");
    assert_eq!(TodoList::NAME, "todo_list");
    assert_eq!(TodoList::ID_FIELD, "id");

    let list = TodoList {
        id: 4,
        name: "groceries".into(),
    };
    assert_eq!(*list.id(), 4);
}

#[tokio::test]
async fn string_ids_get_provisional_then_server_ids() {
    let notes = Collection::new(InMemoryRemote::<Note>::new());

    let pending = notes.begin_create(json!({ "body": "hello" })).unwrap();
    assert_eq!(pending.target_id(), &String::provisional(1));
    assert_eq!(
        notes.store().get(&"tmp-1".to_string()).unwrap().map(|n| n.body),
        Some("hello".to_string())
    );

    let committed = pending.settle().await.unwrap();
    let note = committed.entity.unwrap();
    assert_eq!(note.slug, "1");
    assert_eq!(notes.store().get_all().unwrap(), vec![note]);
}

#[tokio::test]
async fn failure_message_uses_entity_name() {
    let remote = InMemoryRemote::with_entities(vec![TodoList {
        id: 1,
        name: "home".into(),
    }]);
    let lists = Collection::new(remote.clone());
    lists.refetch().await.unwrap();
    remote.fail_next(RemoteError::rejected(502));

    let err = lists
        .update(&1, json!({ "name": "work" }))
        .await
        .unwrap_err();

    assert_eq!(err.message(), "Failed to update todo_list");
    assert_eq!(lists.store().get(&1).unwrap().map(|l| l.name), Some("home".into()));
}

#[test]
fn id_field_follows_serde_renames() {
    assert_eq!(Post::ID_FIELD, "postId");
    assert_eq!(Bookmark::ID_FIELD, "key");
}

#[tokio::test]
async fn renamed_id_field_gets_distinct_provisional_ids() {
    let posts = Collection::new(InMemoryRemote::<Post>::new());

    let first = posts.begin_create(json!({ "title": "one" })).unwrap();
    let second = posts.begin_create(json!({ "title": "two" })).unwrap();
    assert_eq!(*first.target_id(), -1);
    assert_eq!(*second.target_id(), -2);
    assert_eq!(
        posts.store().get_all().unwrap(),
        vec![
            Post {
                post_id: -2,
                title: "two".into(),
            },
            Post {
                post_id: -1,
                title: "one".into(),
            },
        ]
    );

    let committed = first.settle().await.unwrap();
    assert_eq!(committed.entity.map(|p| p.post_id), Some(1));
    second.settle().await.unwrap();

    let mut ids: Vec<i64> = posts.store().get_all().unwrap().iter().map(|p| p.post_id).collect();
    ids.sort();
    assert_eq!(ids, vec![1, 2]);

    posts.update(&1, json!({ "title": "uno" })).await.unwrap();
    assert_eq!(posts.store().get(&1).unwrap().map(|p| p.title), Some("uno".into()));
}

#[tokio::test]
async fn field_rename_is_used_for_string_ids() {
    let bookmarks = Collection::new(InMemoryRemote::<Bookmark>::new());

    let pending = bookmarks.begin_create(json!({ "url": "https://a" })).unwrap();
    assert_eq!(pending.target_id(), &String::provisional(1));
    let bookmark = pending.settle().await.unwrap().entity.unwrap();
    assert_eq!(bookmark.slug, "1");
    assert_eq!(bookmarks.store().get_all().unwrap(), vec![bookmark]);
}
