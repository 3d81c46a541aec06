//! Reads and writes against the `objetivos_ahorro` table.

use lana_core::{NewSavingsGoal, SavingsGoal};
use tracing::instrument;
use uuid::Uuid;

use crate::client::{Query, StoreClient, StoreResult};

const TABLE: &str = "objetivos_ahorro";

impl StoreClient {
    /// The user's savings goals, oldest first.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn list_goals(
        &self,
        user_id: Uuid,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<SavingsGoal>> {
        let query = Query::select_all()
            .eq("usuario_id", user_id)
            .order("created_at", false);
        self.select(TABLE, &query, access_token).await
    }

    /// Insert one goal, returning the created row.
    #[instrument(skip_all)]
    pub async fn insert_goal(
        &self,
        goal: &NewSavingsGoal,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<SavingsGoal>> {
        self.insert(TABLE, std::slice::from_ref(goal), access_token)
            .await
    }

    /// Patch the user's goal by id.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn update_goal(
        &self,
        id: Uuid,
        user_id: Uuid,
        patch: &serde_json::Value,
        access_token: Option<&str>,
    ) -> StoreResult<()> {
        let query = Query::default().eq("id", id).eq("usuario_id", user_id);
        self.update(TABLE, &query, patch, access_token).await
    }

    /// Delete the user's goal by id.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete_goal(
        &self,
        id: Uuid,
        user_id: Uuid,
        access_token: Option<&str>,
    ) -> StoreResult<()> {
        let query = Query::default().eq("id", id).eq("usuario_id", user_id);
        self.delete(TABLE, &query, access_token).await
    }

    /// Upsert goals on their id: existing ids are updated in place, never
    /// duplicated. Used by import.
    #[instrument(skip_all, fields(count = goals.len()))]
    pub async fn upsert_goals(
        &self,
        goals: &[NewSavingsGoal],
        access_token: Option<&str>,
    ) -> StoreResult<Vec<SavingsGoal>> {
        self.upsert(TABLE, goals, "id", access_token).await
    }

    /// Delete all of the user's goals. Used by reset.
    #[instrument(skip_all, fields(user_id = %user_id))]
    pub async fn delete_user_goals(
        &self,
        user_id: Uuid,
        access_token: Option<&str>,
    ) -> StoreResult<()> {
        let query = Query::default().eq("usuario_id", user_id);
        self.delete(TABLE, &query, access_token).await
    }
}
