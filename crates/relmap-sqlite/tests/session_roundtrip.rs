//! End-to-end tests: compiled SQL executed against SQLite through a session.

use relmap_core::{
    Association, Catalog, Criterion, Cursor, EntityDef, FieldDef, Lazy, Record, RecordFactory,
    ScalarType, SchemaBundle, Session, StorageSession, Value,
};
use relmap_sqlite::SqliteSession;

fn blog_schema() -> SchemaBundle {
    SchemaBundle::new()
        .with_entity(
            EntityDef::new("User")
                .with_table("users")
                .with_field(FieldDef::scalar("id", ScalarType::Int64).auto_increment())
                .with_field(FieldDef::scalar("name", ScalarType::String).not_null())
                .with_field(FieldDef::scalar("email", ScalarType::String).unique())
                .with_field(FieldDef::association(
                    "posts",
                    Association::OneToMany {
                        name: "user_posts".into(),
                        target: "Post".into(),
                        column: "author_id".into(),
                    },
                ))
                .with_field(FieldDef::association(
                    "groups",
                    Association::ManyToMany {
                        name: "user_groups".into(),
                        target: "Group".into(),
                        table: "user_group".into(),
                        key_field: "id".into(),
                        foreign_field: "id".into(),
                    },
                ))
                .with_field(FieldDef::association(
                    "profile",
                    Association::OneToOne {
                        name: "user_profile".into(),
                        target: "Profile".into(),
                        column: "profile_id".into(),
                    },
                ))
                .cascading(),
        )
        .with_entity(
            EntityDef::new("Post")
                .with_table("posts")
                .with_field(FieldDef::scalar("id", ScalarType::Int64).auto_increment())
                .with_field(FieldDef::scalar("title", ScalarType::String))
                .with_field(FieldDef::scalar("author", ScalarType::Int64).with_column("author_id")),
        )
        .with_entity(
            EntityDef::new("Group")
                .with_table("clubs")
                .with_field(FieldDef::scalar("id", ScalarType::Int64))
                .with_field(FieldDef::scalar("name", ScalarType::String)),
        )
        .with_entity(
            EntityDef::new("Profile")
                .with_field(FieldDef::scalar("id", ScalarType::Int64))
                .with_field(FieldDef::scalar("bio", ScalarType::String)),
        )
}

fn user(id: i64, name: &str) -> Record {
    Record::new("User")
        .with("id", id)
        .with("name", name)
        .with("email", format!("{}@example.com", name))
}

fn scalar_count(session: &mut Session<'_, SqliteSession, RecordFactory>, sql: &str) -> i64 {
    let mut cursor = session.storage().execute_for_result(sql, false).unwrap();
    assert!(cursor.move_to_first());
    let count = cursor.get_long(0).unwrap();
    cursor.close();
    count
}

#[test]
fn test_create_and_drop_tables() {
    let catalog = Catalog::new(blog_schema());
    let mut session = Session::new(&catalog, SqliteSession::open_in_memory().unwrap(), RecordFactory);

    assert_eq!(session.create_tables().unwrap(), 5);
    assert_eq!(
        scalar_count(
            &mut session,
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name IN ('users', 'posts', 'clubs', 'profile', 'user_group')"
        ),
        5
    );

    assert_eq!(session.drop_tables().unwrap(), 5);
    assert_eq!(
        scalar_count(
            &mut session,
            "SELECT count(*) FROM sqlite_master WHERE type = 'table' AND name = 'users'"
        ),
        0
    );
}

#[test]
fn test_save_query_update_delete() {
    let catalog = Catalog::new(blog_schema());
    let mut session = Session::new(&catalog, SqliteSession::open_in_memory().unwrap(), RecordFactory);
    session.create_tables().unwrap();

    session.save(&user(1, "ada")).unwrap();
    session.save(&user(2, "grace")).unwrap();
    session.save(&user(3, "o'brien")).unwrap();
    session.clear_cache();

    let all = session.criteria("User").list().unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(session.cached_len(), 3);

    let grace = session
        .criteria("User")
        .add(Criterion::eq("name", "grace"))
        .unique()
        .unwrap()
        .unwrap();
    assert_eq!(grace.get("id"), Some(&Value::Int64(2)));

    let quoted = session
        .criteria("User")
        .add(Criterion::eq("name", "o'brien"))
        .count()
        .unwrap();
    assert_eq!(quoted, 1);

    let page = session
        .criteria("User")
        .add(Criterion::gt("id", 0i64))
        .limit(2)
        .offset(1)
        .list()
        .unwrap();
    assert_eq!(page.len(), 2);

    let mut renamed = grace.clone();
    renamed.set("name", "hopper");
    session.update(&renamed).unwrap();
    session.clear_cache();
    let reloaded = session.load("User", 2i64).unwrap().unwrap();
    assert_eq!(reloaded.get("name"), Some(&Value::from("hopper")));

    session.delete(&reloaded).unwrap();
    assert_eq!(session.criteria("User").count().unwrap(), 2);
    assert!(!session.is_cached(&reloaded).unwrap());
}

#[test]
fn test_generated_keys() {
    let catalog = Catalog::new(blog_schema());
    let mut session = Session::new(&catalog, SqliteSession::open_in_memory().unwrap(), RecordFactory);
    session.create_tables().unwrap();

    let unsaved = Record::new("Post").with("title", "hello");
    session.save(&unsaved).unwrap();
    session.save(&unsaved).unwrap();

    let posts = session.criteria("Post").list().unwrap();
    let ids: Vec<_> = posts.iter().map(|p| p.get("id").cloned()).collect();
    assert_eq!(ids, vec![Some(Value::Int64(1)), Some(Value::Int64(2))]);
}

#[test]
fn test_relationship_maintenance() {
    let catalog = Catalog::new(blog_schema());
    let mut session = Session::new(&catalog, SqliteSession::open_in_memory().unwrap(), RecordFactory);
    session.create_tables().unwrap();

    let ada = user(1, "ada");
    session.save(&ada).unwrap();
    for (id, title) in [(10i64, "a"), (11, "b"), (12, "c")] {
        session
            .save(&Record::new("Post").with("id", id).with("title", title))
            .unwrap();
    }
    for (id, name) in [(100i64, "admins"), (200, "readers"), (300, "writers")] {
        session
            .save(&Record::new("Group").with("id", id).with("name", name))
            .unwrap();
    }
    session
        .save(&Record::new("Profile").with("id", 7i64).with("bio", "math"))
        .unwrap();

    // One-to-many: posts 10 and 12 belong to ada.
    let linked = session
        .link_one_to_many(&ada, "posts", &[Value::Int64(10), Value::Int64(12)])
        .unwrap();
    assert_eq!(linked, 2);
    assert_eq!(session.link_one_to_many(&ada, "posts", &[]).unwrap(), 0);
    assert_eq!(
        session
            .criteria("Post")
            .add(Criterion::eq("author", 1i64))
            .count()
            .unwrap(),
        2
    );

    // One-to-one: ada's profile.
    let profile = Record::new("Profile").with("id", 7i64);
    session.link_one_to_one(&ada, "profile", &profile).unwrap();
    let ada_row = session
        .criteria("User")
        .add(Criterion::eq("id", 1i64))
        .unique()
        .unwrap()
        .unwrap();
    assert_eq!(ada_row.get("profile"), Some(&Value::Int64(7)));

    let mut lazy: Lazy<Record> = Lazy::new("Profile", "id", 7i64);
    session.clear_cache();
    let loaded = session.load_lazy(&mut lazy).unwrap().unwrap();
    assert_eq!(loaded.get("bio"), Some(&Value::from("math")));

    // Many-to-many: reconcile twice, the second time dropping a group.
    session
        .reconcile_many_to_many(&ada, "groups", &[Value::Int64(100), Value::Int64(200)])
        .unwrap();
    let groups = session.many_to_many_related(&ada, "groups").unwrap();
    assert_eq!(groups.len(), 2);

    session
        .reconcile_many_to_many(&ada, "groups", &[Value::Int64(200), Value::Int64(300)])
        .unwrap();
    let mut names: Vec<_> = session
        .many_to_many_related(&ada, "groups")
        .unwrap()
        .into_iter()
        .filter_map(|g| g.get("name").and_then(|n| n.as_str().map(String::from)))
        .collect();
    names.sort();
    assert_eq!(names, vec!["readers".to_string(), "writers".to_string()]);

    // Deleting the user clears its join rows.
    session.delete(&ada).unwrap();
    assert_eq!(scalar_count(&mut session, "SELECT count(*) FROM user_group"), 0);
}

#[test]
fn test_file_database_persists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relmap.db");
    let catalog = Catalog::new(blog_schema());

    {
        let mut session = Session::new(&catalog, SqliteSession::open(&path).unwrap(), RecordFactory);
        session.create_tables().unwrap();
        session.save(&user(1, "ada")).unwrap();
    }

    let mut session = Session::new(&catalog, SqliteSession::open(&path).unwrap(), RecordFactory);
    let ada = session.load("User", 1i64).unwrap().unwrap();
    assert_eq!(ada.get("email"), Some(&Value::from("ada@example.com")));
}

#[test]
fn test_load_with_colliding_identity_hash() {
    let catalog = Catalog::new(blog_schema());
    let mut session = Session::new(&catalog, SqliteSession::open_in_memory().unwrap(), RecordFactory);
    session.create_tables().unwrap();

    let big = 1i64 << 32;
    session.save(&user(1, "one")).unwrap();
    session.save(&user(big, "big")).unwrap();

    let one = session.load("User", 1i64).unwrap().unwrap();
    assert_eq!(one.get("id"), Some(&Value::Int64(1)));
    assert_eq!(one.get("name"), Some(&Value::from("one")));

    let reloaded = session.load("User", big).unwrap().unwrap();
    assert_eq!(reloaded.get("name"), Some(&Value::from("big")));
}

#[test]
fn test_update_entity_with_only_a_key_column() {
    let catalog = Catalog::new(
        SchemaBundle::new()
            .with_entity(
                EntityDef::new("Tag")
                    .with_field(FieldDef::scalar("id", ScalarType::Int64))
                    .with_field(FieldDef::association(
                        "notes",
                        Association::OneToMany {
                            name: "tag_notes".into(),
                            target: "Note".into(),
                            column: "tag_id".into(),
                        },
                    )),
            )
            .with_entity(
                EntityDef::new("Note")
                    .with_field(FieldDef::scalar("id", ScalarType::Int64))
                    .with_field(FieldDef::scalar("tag", ScalarType::Int64).with_column("tag_id")),
            ),
    );
    let mut session = Session::new(&catalog, SqliteSession::open_in_memory().unwrap(), RecordFactory);
    session.create_tables().unwrap();

    let tag = Record::new("Tag").with("id", 1i64);
    session.save(&tag).unwrap();
    assert_eq!(session.update(&tag).unwrap(), 0);
    assert!(session.is_cached(&tag).unwrap());
}
