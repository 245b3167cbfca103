//! Integration tests for the PostgreSQL store against a real database.
//!
//! Run with `DATABASE_URL` pointing at a server where the test user may
//! create databases, then `cargo test -p layoutsmith-db -- --ignored`.

use assert_matches::assert_matches;
use layoutsmith_core::error::CoreError;
use layoutsmith_core::generation::InputMethod;
use layoutsmith_core::invitation::InvitationStatus;
use layoutsmith_core::roles::{SharePermission, TeamAuthority, TeamRole};
use layoutsmith_core::search::{LayoutSearch, SearchScope, TagMatch};
use layoutsmith_db::models::layout::{GeneratedLayout, NewLayoutVersion, NewRootLayout};
use layoutsmith_db::models::share::{NewShare, ShareTarget};
use layoutsmith_db::models::tag::UpdateTag;
use layoutsmith_db::models::team::NewInvitation;
use layoutsmith_db::models::user::CreateUser;
use layoutsmith_db::store::NewLabel;
use layoutsmith_db::{
    CategoryStore, LayoutStore, PgStore, ShareStore, StoreError, TagStore, TeamStore, UserStore,
};
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_user(store: &PgStore, name: &str) -> i64 {
    store
        .create_user(&CreateUser {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password_hash: "$argon2id$stub".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn new_root(owner_user_id: i64, title: &str) -> NewRootLayout {
    NewRootLayout {
        owner_user_id,
        title: title.to_string(),
        description: "Generated storefront".to_string(),
        generated_code: "<main>bakery</main>".to_string(),
        input_method: InputMethod::Text,
        additional_context: None,
        category_id: None,
        is_public: false,
    }
}

fn new_version(parent: &GeneratedLayout) -> NewLayoutVersion {
    NewLayoutVersion {
        parent_layout_id: parent.id,
        owner_user_id: parent.owner_user_id,
        generated_code: "<main>bakery v2</main>".to_string(),
        changes_description: "Larger hero".to_string(),
        description: None,
        category_id: None,
        is_public: None,
    }
}

fn label(owner_user_id: i64, name: &str) -> NewLabel {
    NewLabel {
        owner_user_id,
        name: name.to_string(),
        color: "#6366F1".to_string(),
        description: None,
    }
}

// ---------------------------------------------------------------------------
// Schema and constraints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_health_check(pool: PgPool) {
    layoutsmith_db::health_check(&pool).await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_username_maps_to_constraint(pool: PgPool) {
    let store = PgStore::new(pool);
    new_user(&store, "alice").await;
    let err = store
        .create_user(&CreateUser {
            username: "alice".to_string(),
            email: "other@example.com".to_string(),
            password_hash: "x".to_string(),
        })
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Duplicate { ref constraint } if constraint == "uq_users_username");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_duplicate_root_title(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let root = store.create_root(&new_root(alice, "Bakery")).await.unwrap();

    let err = store.create_root(&new_root(alice, "Bakery")).await.unwrap_err();
    assert_matches!(err, StoreError::Duplicate { .. });

    // Versions share the root's title without tripping the index.
    store.create_version(&new_version(&root)).await.unwrap();
    assert!(store.root_title_exists(alice, "Bakery").await.unwrap());
    assert!(!store.root_title_exists(alice, "bakery").await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_category_delete_clears_layouts(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let category = store.create_category(&label(alice, "Marketing")).await.unwrap();
    let mut input = new_root(alice, "Bakery");
    input.category_id = Some(category.id);
    let root = store.create_root(&input).await.unwrap();

    assert!(store.delete_category(category.id).await.unwrap());
    let root = store.find_layout(root.id).await.unwrap().unwrap();
    assert_eq!(root.category_id, None);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_tag_description_clears_only_when_null(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let mut input = label(alice, "seasonal");
    input.description = Some("Holiday pages".to_string());
    let tag = store.create_tag(&input).await.unwrap();

    let recolored = UpdateTag {
        color: Some("#000000".to_string()),
        ..Default::default()
    };
    let tag = store.update_tag(tag.id, &recolored).await.unwrap().unwrap();
    assert_eq!(tag.description.as_deref(), Some("Holiday pages"));

    let cleared = UpdateTag {
        description: Some(None),
        ..Default::default()
    };
    let tag = store.update_tag(tag.id, &cleared).await.unwrap().unwrap();
    assert_eq!(tag.description, None);
    assert_eq!(tag.color, "#000000");
}

// ---------------------------------------------------------------------------
// Versions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_version_labels_and_history(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let root = store.create_root(&new_root(alice, "Bakery")).await.unwrap();
    let v1 = store.create_version(&new_version(&root)).await.unwrap();
    let v2 = store.create_version(&new_version(&v1)).await.unwrap();

    assert_eq!(root.version_number, "v1.0");
    assert_eq!(v1.version_number, "v1.1");
    assert_eq!(v2.version_number, "v1.2");

    let history = store.version_history(v2.id).await.unwrap();
    let mut ids: Vec<i64> = history.iter().map(|l| l.id).collect();
    ids.sort();
    assert_eq!(ids, vec![root.id, v1.id, v2.id]);
    assert_eq!(history, store.version_history(root.id).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_versions_get_distinct_labels(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let root = store.create_root(&new_root(alice, "Bakery")).await.unwrap();

    let input = new_version(&root);
    let (a, b) = tokio::join!(store.create_version(&input), store.create_version(&input));
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_ne!(a.version_number, b.version_number);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_version_rejects_foreign_owner(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let bob = new_user(&store, "bob").await;
    let root = store.create_root(&new_root(alice, "Bakery")).await.unwrap();

    let mut input = new_version(&root);
    input.owner_user_id = bob;
    let err = store.create_version(&input).await.unwrap_err();
    assert_matches!(err, StoreError::Rule(CoreError::Forbidden(_)));
}

// ---------------------------------------------------------------------------
// Sharing and teams
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_access_facts_include_ancestor_and_team_shares(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let bob = new_user(&store, "bob").await;
    let root = store.create_root(&new_root(alice, "Bakery")).await.unwrap();
    let v1 = store.create_version(&new_version(&root)).await.unwrap();

    let team = store.create_team(alice, "Design", None).await.unwrap();
    store.upsert_member(team.id, bob, TeamRole::Viewer).await.unwrap();

    store
        .upsert_share(&NewShare {
            layout_id: root.id,
            shared_by_user_id: alice,
            target: ShareTarget::User(bob),
            permissions: SharePermission::Viewer,
        })
        .await
        .unwrap();
    store
        .upsert_share(&NewShare {
            layout_id: root.id,
            shared_by_user_id: alice,
            target: ShareTarget::Team(team.id),
            permissions: SharePermission::Admin,
        })
        .await
        .unwrap();

    let facts = store.access_facts(Some(bob), v1.id).await.unwrap().unwrap();
    assert!(!facts.is_owner);
    assert_eq!(facts.direct_shares, vec![SharePermission::Viewer]);
    assert_eq!(facts.team_grants.len(), 1);
    assert_eq!(
        facts.team_grants[0].authority,
        TeamAuthority::Member(TeamRole::Viewer)
    );

    assert!(store.access_facts(Some(bob), 999_999).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_shared_with_user_includes_versions(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let bob = new_user(&store, "bob").await;
    let root = store.create_root(&new_root(alice, "Bakery")).await.unwrap();
    store
        .upsert_share(&NewShare {
            layout_id: root.id,
            shared_by_user_id: alice,
            target: ShareTarget::User(bob),
            permissions: SharePermission::Viewer,
        })
        .await
        .unwrap();
    let v1 = store.create_version(&new_version(&root)).await.unwrap();

    let shared: Vec<i64> = store
        .shared_with_user(bob)
        .await
        .unwrap()
        .iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(shared, vec![v1.id, root.id]);

    let mut search = LayoutSearch::owned_by(bob);
    search.scope = SearchScope::Accessible;
    let accessible: Vec<i64> = store
        .search_layouts(&search)
        .await
        .unwrap()
        .iter()
        .map(|l| l.id)
        .collect();
    assert_eq!(accessible, shared);
    assert!(store.shared_with_user(alice).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_share_upsert_keeps_one_row(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let bob = new_user(&store, "bob").await;
    let root = store.create_root(&new_root(alice, "Bakery")).await.unwrap();

    let mut share = NewShare {
        layout_id: root.id,
        shared_by_user_id: alice,
        target: ShareTarget::User(bob),
        permissions: SharePermission::Viewer,
    };
    let first = store.upsert_share(&share).await.unwrap();
    share.permissions = SharePermission::Editor;
    let second = store.upsert_share(&share).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.permissions, SharePermission::Editor);
    assert_eq!(store.list_shares(root.id).await.unwrap().len(), 1);
    assert_eq!(store.shared_with_user(bob).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_accept_invitation_is_atomic(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let bob = new_user(&store, "bob").await;
    let team = store.create_team(alice, "Design", None).await.unwrap();
    let root = store.create_root(&new_root(alice, "Bakery")).await.unwrap();

    let invitation = store
        .create_invitation(&NewInvitation {
            team_id: team.id,
            invited_user_id: bob,
            invited_by: alice,
            role: TeamRole::Editor,
            layout_id: Some(root.id),
            message: Some("Join us".to_string()),
        })
        .await
        .unwrap();

    let err = store
        .respond_invitation(invitation.id, alice, true)
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Rule(CoreError::Forbidden(_)));

    let accepted = store.respond_invitation(invitation.id, bob, true).await.unwrap();
    assert_eq!(accepted.status, InvitationStatus::Accepted);
    assert_eq!(
        store.team_authority(team.id, bob).await.unwrap(),
        Some(TeamAuthority::Member(TeamRole::Editor))
    );
    let facts = store.access_facts(Some(bob), root.id).await.unwrap().unwrap();
    assert_eq!(facts.direct_shares, vec![SharePermission::Editor]);

    let err = store
        .respond_invitation(invitation.id, bob, false)
        .await
        .unwrap_err();
    assert_matches!(err, StoreError::Rule(CoreError::Conflict(_)));
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
#[ignore = "requires DATABASE_URL"]
async fn test_search_filters(pool: PgPool) {
    let store = PgStore::new(pool);
    let alice = new_user(&store, "alice").await;
    let bob = new_user(&store, "bob").await;
    let bakery = store.create_root(&new_root(alice, "Bakery")).await.unwrap();
    let _gym = store.create_root(&new_root(alice, "Gym 100%")).await.unwrap();
    let mut public = new_root(bob, "Bob's bakery");
    public.is_public = true;
    let bobs = store.create_root(&public).await.unwrap();

    let hero = store.create_tag(&label(alice, "hero")).await.unwrap();
    let dark = store.create_tag(&label(alice, "dark")).await.unwrap();
    store.attach_tag(bakery.id, hero.id).await.unwrap();

    let mut search = LayoutSearch::owned_by(alice);
    search.text = Some("BAKERY".to_string());
    let found = store.search_layouts(&search.clone().validated().unwrap()).await.unwrap();
    assert_eq!(found.iter().map(|l| l.id).collect::<Vec<_>>(), vec![bakery.id]);

    // Description matches count as well as titles.
    let mut menu = new_root(alice, "Menu");
    menu.description = "Seasonal bakery specials".to_string();
    let menu = store.create_root(&menu).await.unwrap();
    let found = store.search_layouts(&search.validated().unwrap()).await.unwrap();
    assert_eq!(
        found.iter().map(|l| l.id).collect::<Vec<_>>(),
        vec![menu.id, bakery.id]
    );

    // A literal percent sign is not a wildcard.
    let mut search = LayoutSearch::owned_by(alice);
    search.text = Some("100%".to_string());
    assert_eq!(store.search_layouts(&search).await.unwrap().len(), 1);

    let mut search = LayoutSearch::owned_by(alice);
    search.tag_ids = vec![hero.id, dark.id];
    assert!(store.search_layouts(&search).await.unwrap().is_empty());
    search.tag_match = TagMatch::Any;
    assert_eq!(store.search_layouts(&search).await.unwrap().len(), 1);

    let mut search = LayoutSearch::owned_by(alice);
    search.scope = SearchScope::Public;
    let found = store.search_layouts(&search).await.unwrap();
    assert_eq!(found.iter().map(|l| l.id).collect::<Vec<_>>(), vec![bobs.id]);
}
