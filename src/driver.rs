//! The save sequence: open a session, begin, persist, commit, close.
//!
//! Each step returns a `Result`. The first failure sends the session down
//! the rollback branch; the session is closed on every path and the error
//! is handed back to the caller.

use crate::core::Result;
use crate::mapping::Entity;
use crate::session::{Session, SessionFactory};
use tracing::{debug, error, info};

/// Persist `entity` in its own unit of work and return it with its id.
pub async fn save<E: Entity>(factory: &SessionFactory, mut entity: E) -> Result<E> {
    let mut session = factory.open_session();
    let txn = session.id();

    let outcome = persist_and_commit(&mut session, &mut entity).await;
    if let Err(err) = &outcome {
        error!(%txn, error = %err, "unit of work failed, rolling back");
        if session.state().is_active()
            && let Err(rollback_err) = session.rollback()
        {
            error!(%txn, error = %rollback_err, "rollback failed");
        }
    }

    debug!(%txn, "closing session");
    session.close();

    let id = outcome?;
    info!(%txn, entity = E::ENTITY_NAME, id, "saved");
    Ok(entity)
}

async fn persist_and_commit<E: Entity>(session: &mut Session, entity: &mut E) -> Result<i64> {
    debug!(txn = %session.id(), "beginning transaction");
    session.begin()?;

    debug!(txn = %session.id(), entity = E::ENTITY_NAME, "saving");
    let id = session.persist(entity).await?;

    debug!(txn = %session.id(), "committing");
    session.commit().await?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingRegistry;
    use crate::model::{Address, Person, person_mapping};
    use crate::session::SessionConfig;

    async fn factory() -> SessionFactory {
        SessionFactory::build(
            SessionConfig::new(),
            MappingRegistry::new().register(person_mapping()),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_commits() {
        let factory = factory().await;
        let person = Person::new(
            "Homer",
            Address::new("742 Evergreen Terrace", "Springfield", "80085"),
            Address::new("57 Walnut Street", "Springfield", "80085"),
        );

        let saved = save(&factory, person).await.unwrap();
        assert!(saved.id().unwrap() > 0);
        assert_eq!(factory.count::<Person>().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_save_surfaces_failure() {
        let factory = factory().await;
        let err = save(&factory, Person::default()).await.unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(factory.count::<Person>().await.unwrap(), 0);
    }
}
