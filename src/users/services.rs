use tracing::info;
use uuid::Uuid;

use super::{
    repo::{StoreError, UserStore},
    repo_types::User,
};

pub async fn list_users(store: &dyn UserStore) -> Result<Vec<User>, StoreError> {
    store.list().await
}

pub async fn get_user(store: &dyn UserStore, id: Uuid) -> Result<User, StoreError> {
    store.find_by_id(id).await?.ok_or(StoreError::NotFound)
}

pub async fn rename_user(store: &dyn UserStore, id: Uuid, name: &str) -> Result<User, StoreError> {
    let user = store.update_name(id, name).await?;
    info!(user_id = %id, "user renamed");
    Ok(user)
}

pub async fn delete_user(store: &dyn UserStore, id: Uuid) -> Result<(), StoreError> {
    store.delete(id).await?;
    info!(user_id = %id, "user deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::{memory::InMemoryUserStore, repo_types::NewUser};

    #[tokio::test]
    async fn rename_and_delete() {
        let store = InMemoryUserStore::new();
        let user = store
            .create(NewUser::local("Alice", "alice@example.com", "hash".into()))
            .await
            .unwrap();

        let renamed = rename_user(&store, user.id, "Alicia").await.unwrap();
        assert_eq!(renamed.name, "Alicia");
        assert_eq!(renamed.email, "alice@example.com");
        assert!(renamed.updated_at >= user.updated_at);

        delete_user(&store, user.id).await.unwrap();
        assert!(matches!(get_user(&store, user.id).await, Err(StoreError::NotFound)));
        assert!(matches!(delete_user(&store, user.id).await, Err(StoreError::NotFound)));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let store = InMemoryUserStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(get_user(&store, id).await, Err(StoreError::NotFound)));
        assert!(matches!(rename_user(&store, id, "x").await, Err(StoreError::NotFound)));
        assert!(list_users(&store).await.unwrap().is_empty());
    }
}
