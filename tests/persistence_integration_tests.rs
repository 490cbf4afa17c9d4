/// Snapshot-backed factories and mapping configuration failures.
/// Run with: cargo test --test persistence_integration_tests

use compomap::core::DataType;
use compomap::{
    Address, Component, EntityMapping, MappingRegistry, Person, SchemaAction, SessionConfig,
    SessionFactory, driver, person_mapping,
};
use tempfile::TempDir;

fn homer() -> Person {
    Person::new(
        "Homer",
        Address::new("742 Evergreen Terrace", "Springfield", "80085"),
        Address::new("57 Walnut Street", "Springfield", "80085"),
    )
}

fn registry() -> MappingRegistry {
    MappingRegistry::new().register(person_mapping())
}

#[tokio::test]
async fn test_reopened_factory_sees_committed_rows() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.json");

    let first_id = {
        let factory = SessionFactory::build(SessionConfig::new().data_file(&path), registry())
            .await
            .unwrap();
        driver::save(&factory, homer()).await.unwrap().id().unwrap()
    };
    assert!(path.exists());

    let factory = SessionFactory::build(
        SessionConfig::new()
            .data_file(&path)
            .schema_action(SchemaAction::Validate),
        registry(),
    )
    .await
    .unwrap();
    assert_eq!(factory.count::<Person>().await.unwrap(), 1);

    let session = factory.open_session();
    let loaded: Person = session.find(first_id).await.unwrap().unwrap();
    assert_eq!(loaded.name(), Some("Homer"));
    drop(session);

    let second = driver::save(&factory, homer()).await.unwrap();
    assert!(second.id().unwrap() > first_id);
}

#[tokio::test]
async fn test_rolled_back_work_is_not_in_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.json");

    {
        let factory = SessionFactory::build(SessionConfig::new().data_file(&path), registry())
            .await
            .unwrap();
        driver::save(&factory, homer()).await.unwrap();

        let mut session = factory.open_session();
        session.begin().unwrap();
        session.persist(&mut homer()).await.unwrap();
        session.rollback().unwrap();
        session.close();
    }

    let factory = SessionFactory::build(SessionConfig::new().data_file(&path), registry())
        .await
        .unwrap();
    assert_eq!(factory.count::<Person>().await.unwrap(), 1);
}

#[tokio::test]
async fn test_rolled_back_id_not_reissued_after_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("people.json");

    let discarded_id = {
        let factory = SessionFactory::build(SessionConfig::new().data_file(&path), registry())
            .await
            .unwrap();
        driver::save(&factory, homer()).await.unwrap();

        let mut session = factory.open_session();
        session.begin().unwrap();
        let id = session.persist(&mut homer()).await.unwrap();
        session.rollback().unwrap();
        session.close();
        id
    };

    let factory = SessionFactory::build(
        SessionConfig::new()
            .data_file(&path)
            .schema_action(SchemaAction::Validate),
        registry(),
    )
    .await
    .unwrap();
    let saved = driver::save(&factory, homer()).await.unwrap();
    assert!(saved.id().unwrap() > discarded_id);
    assert_eq!(factory.count::<Person>().await.unwrap(), 2);
}

#[tokio::test]
async fn test_colliding_embeddings_fail_at_build() {
    let mapping = EntityMapping::new("Person", "person")
        .id("id", "id")
        .required("name", "name", DataType::Text)
        .embedded(
            "homeAddress",
            Address::component_mapping(),
            [("street", "street"), ("city", "city"), ("zipcode", "zipcode")],
        )
        .embedded(
            "billingAddress",
            Address::component_mapping(),
            [("street", "street"), ("city", "city"), ("zipcode", "zipcode")],
        );

    let err = SessionFactory::build(SessionConfig::new(), MappingRegistry::new().register(mapping))
        .await
        .err()
        .unwrap();
    assert!(err.is_mapping_configuration());
}

#[tokio::test]
async fn test_unregistered_entity_cannot_be_persisted() {
    let factory = SessionFactory::build(SessionConfig::new(), MappingRegistry::new())
        .await
        .unwrap();
    let mut session = factory.open_session();
    session.begin().unwrap();
    let err = session.persist(&mut homer()).await.unwrap_err();
    assert!(err.is_persistence());
    assert!(factory.storage().list_tables().await.is_empty());
}

#[tokio::test]
async fn test_schema_sql_describes_person_table() {
    let factory = SessionFactory::build(SessionConfig::new(), registry()).await.unwrap();
    let ddl = factory.schema_sql().unwrap().remove(0);
    assert_eq!(
        ddl,
        "CREATE TABLE person (\n\
         \x20   id BIGINT NOT NULL,\n\
         \x20   name VARCHAR(255) NOT NULL,\n\
         \x20   home_street VARCHAR(255),\n\
         \x20   home_city VARCHAR(255),\n\
         \x20   home_zipcode VARCHAR(255),\n\
         \x20   billing_street VARCHAR(255),\n\
         \x20   billing_city VARCHAR(255),\n\
         \x20   billing_zipcode VARCHAR(255),\n\
         \x20   PRIMARY KEY (id)\n\
         )"
    );
}
