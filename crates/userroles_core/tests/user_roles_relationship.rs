use rusqlite::Connection;
use std::collections::BTreeSet;
use userroles_core::db::open_db_in_memory;
use userroles_core::{
    CrudRepository, FilterSpec, QuerySpec, RelationArity, RelationshipRepository, Role, RoleId,
    SortSpec, SqliteRoleRepository, SqliteUserRepository, User, UserId,
    UserToRoleRelationshipRepository, ROLES_FIELD,
};
use uuid::Uuid;

struct Fixture {
    user_id: UserId,
    user: RoleId,
    admin: RoleId,
    auditor: RoleId,
}

fn setup(conn: &Connection) -> Fixture {
    let roles = SqliteRoleRepository::try_new(conn).unwrap();
    let users = SqliteUserRepository::try_new(conn).unwrap();
    let user = roles.save(&Role::new("ROLE_USER")).unwrap().id;
    let admin = roles.save(&Role::new("ROLE_ADMIN")).unwrap().id;
    let auditor = roles.save(&Role::new("ROLE_AUDITOR")).unwrap().id;
    let user_id = users
        .save(&User::new("alice", "alice@test.com"))
        .unwrap()
        .id;
    Fixture {
        user_id,
        user,
        admin,
        auditor,
    }
}

fn role_ids<R>(relationship: &R, user_id: UserId) -> BTreeSet<RoleId>
where
    R: RelationshipRepository<Source = User, Target = Role>,
{
    relationship
        .find_many_targets(user_id, ROLES_FIELD, &QuerySpec::default())
        .unwrap()
        .into_iter()
        .map(|role| role.id)
        .collect()
}

#[test]
fn set_relations_replaces_with_exact_deduplicated_set() {
    let conn = open_db_in_memory().unwrap();
    let fx = setup(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);

    relationship
        .set_relations(fx.user_id, &[fx.user, fx.admin, fx.user], ROLES_FIELD)
        .unwrap();
    assert_eq!(
        role_ids(&relationship, fx.user_id),
        BTreeSet::from([fx.user, fx.admin])
    );

    relationship
        .set_relations(fx.user_id, &[fx.auditor], ROLES_FIELD)
        .unwrap();
    assert_eq!(
        role_ids(&relationship, fx.user_id),
        BTreeSet::from([fx.auditor])
    );

    relationship
        .set_relations(fx.user_id, &[], ROLES_FIELD)
        .unwrap();
    assert!(role_ids(&relationship, fx.user_id).is_empty());
}

#[test]
fn set_relations_silently_drops_unknown_role_ids() {
    let conn = open_db_in_memory().unwrap();
    let fx = setup(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);

    relationship
        .set_relations(
            fx.user_id,
            &[fx.user, Uuid::new_v4(), fx.admin],
            ROLES_FIELD,
        )
        .unwrap();

    assert_eq!(
        role_ids(&relationship, fx.user_id),
        BTreeSet::from([fx.user, fx.admin])
    );
}

#[test]
fn set_relations_resolves_id_lists_beyond_sqlite_variable_limit() {
    let conn = open_db_in_memory().unwrap();
    let fx = setup(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);

    let mut requested: Vec<RoleId> = (0..40_000).map(|_| Uuid::new_v4()).collect();
    requested.insert(20_000, fx.admin);

    relationship
        .set_relations(fx.user_id, &requested, ROLES_FIELD)
        .unwrap();

    let stored = users.get_by_id(fx.user_id).unwrap();
    assert!(stored.has_role(fx.admin));
    assert!(!stored.has_role(fx.user));
    assert_eq!(stored.roles.len(), 1);
}

#[test]
fn add_relations_in_two_steps_equals_single_union() {
    let conn = open_db_in_memory().unwrap();
    let fx = setup(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);
    let other_id = users.save(&User::new("bob", "bob@test.com")).unwrap().id;

    relationship
        .add_relations(fx.user_id, &[fx.user, fx.admin], ROLES_FIELD)
        .unwrap();
    relationship
        .add_relations(fx.user_id, &[fx.admin, fx.auditor], ROLES_FIELD)
        .unwrap();
    relationship
        .add_relations(other_id, &[fx.user, fx.admin, fx.auditor], ROLES_FIELD)
        .unwrap();

    assert_eq!(
        role_ids(&relationship, fx.user_id),
        role_ids(&relationship, other_id)
    );
    assert_eq!(role_ids(&relationship, fx.user_id).len(), 3);
}

#[test]
fn remove_relations_with_disjoint_ids_is_a_noop() {
    let conn = open_db_in_memory().unwrap();
    let fx = setup(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);
    relationship
        .set_relations(fx.user_id, &[fx.user], ROLES_FIELD)
        .unwrap();

    relationship
        .remove_relations(fx.user_id, &[fx.admin, Uuid::new_v4()], ROLES_FIELD)
        .unwrap();
    assert_eq!(
        role_ids(&relationship, fx.user_id),
        BTreeSet::from([fx.user])
    );

    relationship
        .remove_relations(fx.user_id, &[fx.user], ROLES_FIELD)
        .unwrap();
    assert!(role_ids(&relationship, fx.user_id).is_empty());
    assert!(!users.get_by_id(fx.user_id).unwrap().has_role(fx.user));
    assert!(roles.find_by_id(fx.user).unwrap().is_some());
}

#[test]
fn mutations_on_missing_user_propagate_not_found() {
    let conn = open_db_in_memory().unwrap();
    let fx = setup(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);
    let missing = Uuid::new_v4();

    let set = relationship.set_relations(missing, &[fx.user], ROLES_FIELD);
    let add = relationship.add_relations(missing, &[fx.user], ROLES_FIELD);
    let remove = relationship.remove_relations(missing, &[fx.user], ROLES_FIELD);

    for result in [set, add, remove] {
        assert!(result.unwrap_err().is_not_found());
    }
    assert_eq!(users.count().unwrap(), 1);
}

#[test]
fn find_many_targets_on_missing_user_is_empty() {
    let conn = open_db_in_memory().unwrap();
    setup(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);

    let list = relationship
        .find_many_targets(Uuid::new_v4(), ROLES_FIELD, &QuerySpec::default())
        .unwrap();
    assert!(list.is_empty());
    assert_eq!(list.total, 0);
}

#[test]
fn find_many_targets_applies_query_spec() {
    let conn = open_db_in_memory().unwrap();
    let fx = setup(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);
    relationship
        .set_relations(fx.user_id, &[fx.user, fx.admin, fx.auditor], ROLES_FIELD)
        .unwrap();

    let sorted = QuerySpec::default()
        .sort_by(SortSpec::desc("name"))
        .page(0, Some(2));
    let page = relationship
        .find_many_targets(fx.user_id, ROLES_FIELD, &sorted)
        .unwrap();
    let names: Vec<&str> = page.items.iter().map(|role| role.name.as_str()).collect();
    assert_eq!(names, vec!["ROLE_USER", "ROLE_AUDITOR"]);
    assert_eq!(page.total, 3);

    let filtered = QuerySpec::default().filter(FilterSpec::like("name", "admin"));
    let page = relationship
        .find_many_targets(fx.user_id, ROLES_FIELD, &filtered)
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page.items[0].id, fx.admin);
}

#[test]
fn to_one_operations_are_inert_for_many_to_many() {
    let conn = open_db_in_memory().unwrap();
    let fx = setup(&conn);
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);
    relationship
        .set_relations(fx.user_id, &[fx.user], ROLES_FIELD)
        .unwrap();

    relationship
        .set_relation(fx.user_id, Some(fx.admin), ROLES_FIELD)
        .unwrap();
    relationship
        .set_relation(fx.user_id, None, ROLES_FIELD)
        .unwrap();
    assert_eq!(
        role_ids(&relationship, fx.user_id),
        BTreeSet::from([fx.user])
    );

    let one = relationship
        .find_one_target(fx.user_id, ROLES_FIELD, &QuerySpec::default())
        .unwrap();
    assert!(one.is_none());
}

#[test]
fn relationship_describes_its_field() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let relationship = UserToRoleRelationshipRepository::new(users, roles);

    assert_eq!(relationship.arity(), RelationArity::ToMany);
    assert_eq!(relationship.field_name(), "roles");
    assert_eq!(relationship.source_resource_type(), "users");
    assert_eq!(relationship.target_resource_type(), "roles");
}
