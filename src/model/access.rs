use crate::{
    model::{
        ModelManager,
        error::{DatabaseError, DatabaseResult},
    },
    web::AuthenticatedUser,
};

#[async_trait::async_trait]
pub trait HasOwner {
    type OwnerId: PartialEq + Send + Sync;
    async fn get_owner_id(
        &self,
        mm: &ModelManager,
        actor: &AuthenticatedUser,
    ) -> DatabaseResult<Self::OwnerId>;
}

pub async fn check_access<T, O>(
    mm: &ModelManager,
    actor: &AuthenticatedUser,
    resource: &T,
    expected: O,
) -> DatabaseResult<()>
where
    T: HasOwner<OwnerId = O> + Sync,
    O: PartialEq + Send + Sync,
{
    if actor.is_admin() {
        return Ok(());
    }

    if resource.get_owner_id(mm, actor).await? == expected {
        Ok(())
    } else {
        Err(DatabaseError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::{model::DbConnection, web::UserRole};

    struct OwnedPool {
        created_by: Option<Uuid>,
    }

    #[async_trait::async_trait]
    impl HasOwner for OwnedPool {
        type OwnerId = Option<Uuid>;
        async fn get_owner_id(
            &self,
            _mm: &ModelManager,
            _actor: &AuthenticatedUser,
        ) -> DatabaseResult<Self::OwnerId> {
            Ok(self.created_by)
        }
    }

    fn manager() -> ModelManager {
        // never connects: the lookups above do not touch the database
        ModelManager::new(DbConnection::connect("postgres://localhost/unused").unwrap())
    }

    #[tokio::test]
    async fn owner_and_admin_pass_others_are_forbidden() {
        let mm = manager();
        let owner = AuthenticatedUser::new(Uuid::new_v4(), UserRole::Teacher);
        let other = AuthenticatedUser::new(Uuid::new_v4(), UserRole::Teacher);
        let pool = OwnedPool { created_by: Some(owner.user_id()) };

        check_access(&mm, &owner, &pool, Some(owner.user_id())).await.unwrap();
        check_access(&mm, &AuthenticatedUser::admin(), &pool, None).await.unwrap();

        let denied = check_access(&mm, &other, &pool, Some(other.user_id())).await;
        assert!(matches!(denied, Err(DatabaseError::Forbidden)));
    }

    #[tokio::test]
    async fn ownerless_resources_belong_to_nobody() {
        let mm = manager();
        let student = AuthenticatedUser::new(Uuid::new_v4(), UserRole::Student);
        let pool = OwnedPool { created_by: None };

        let denied = check_access(&mm, &student, &pool, Some(student.user_id())).await;
        assert!(matches!(denied, Err(DatabaseError::Forbidden)));
    }
}
