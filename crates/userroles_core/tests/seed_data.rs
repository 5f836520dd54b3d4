use userroles_core::db::open_db_in_memory;
use userroles_core::{
    seed_demo_data, CrudRepository, QuerySpec, RelationshipRepository, SortSpec,
    SqliteRoleRepository, SqliteUserRepository, UserToRoleRelationshipRepository, ROLES_FIELD,
    ROLE_ADMIN, ROLE_USER,
};

fn role_names<R>(relationship: &R, user_id: uuid::Uuid) -> Vec<String>
where
    R: RelationshipRepository<Source = userroles_core::User, Target = userroles_core::Role>,
{
    relationship
        .find_many_targets(
            user_id,
            ROLES_FIELD,
            &QuerySpec::default().sort_by(SortSpec::asc("name")),
        )
        .unwrap()
        .into_iter()
        .map(|role| role.name)
        .collect()
}

#[test]
fn seed_creates_two_roles_and_two_users() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();

    let report = seed_demo_data(&users, &roles).unwrap();

    assert_eq!(roles.count().unwrap(), 2);
    assert_eq!(users.count().unwrap(), 2);
    assert_eq!(report.role_user.name, ROLE_USER);
    assert_eq!(report.role_admin.name, ROLE_ADMIN);
    assert_eq!(report.john.email, "john@test.com");
    assert_eq!(report.tom.email, "tom@test.com");
}

#[test]
fn seeded_users_expose_expected_roles_through_relationship() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();
    let report = seed_demo_data(&users, &roles).unwrap();

    let relationship = UserToRoleRelationshipRepository::new(&users, &roles);
    assert_eq!(
        role_names(&relationship, report.john.id),
        vec![ROLE_ADMIN, ROLE_USER]
    );
    assert_eq!(role_names(&relationship, report.tom.id), vec![ROLE_USER]);
}

#[test]
fn seeding_twice_duplicates_records() {
    let conn = open_db_in_memory().unwrap();
    let users = SqliteUserRepository::try_new(&conn).unwrap();
    let roles = SqliteRoleRepository::try_new(&conn).unwrap();

    let first = seed_demo_data(&users, &roles).unwrap();
    let second = seed_demo_data(&users, &roles).unwrap();

    assert_ne!(first.john.id, second.john.id);
    assert_eq!(roles.count().unwrap(), 4);
    assert_eq!(users.find_by_username("john").unwrap().len(), 2);
    assert_eq!(roles.find_by_name(ROLE_USER).unwrap().len(), 2);
}
