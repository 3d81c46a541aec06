//! Reads and writes against the `gastos_mensuales` table.
//!
//! Recurring charges are household-level rows without user scoping; all
//! operations run with the anon bearer unless a token is passed through.

use lana_core::{NewRecurringCharge, RecurringCharge};
use tracing::instrument;
use uuid::Uuid;

use crate::client::{Query, StoreClient, StoreResult};
use crate::transactions::NIL_UUID;

const TABLE: &str = "gastos_mensuales";

impl StoreClient {
    /// All recurring charges ordered by charge day.
    #[instrument(skip_all)]
    pub async fn list_recurring_charges(
        &self,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<RecurringCharge>> {
        let query = Query::select_all().order("dia_de_cobro", false);
        self.select(TABLE, &query, access_token).await
    }

    /// Active charges that fire on `day`, the materializer's input set.
    #[instrument(skip_all, fields(day = day))]
    pub async fn list_due_recurring_charges(
        &self,
        day: u8,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<RecurringCharge>> {
        let query = Query::select_all()
            .eq("activo", true)
            .eq("dia_de_cobro", day);
        self.select(TABLE, &query, access_token).await
    }

    /// All recurring charges oldest first. Used by export.
    #[instrument(skip_all)]
    pub async fn list_recurring_charges_by_creation(
        &self,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<RecurringCharge>> {
        let query = Query::select_all().order("created_at", false);
        self.select(TABLE, &query, access_token).await
    }

    /// Insert one charge, returning the created row.
    #[instrument(skip_all)]
    pub async fn insert_recurring_charge(
        &self,
        charge: &NewRecurringCharge,
        access_token: Option<&str>,
    ) -> StoreResult<Vec<RecurringCharge>> {
        self.insert(TABLE, std::slice::from_ref(charge), access_token)
            .await
    }

    /// Insert many charges. Used by import.
    #[instrument(skip_all, fields(count = charges.len()))]
    pub async fn insert_recurring_charges(
        &self,
        charges: &[NewRecurringCharge],
        access_token: Option<&str>,
    ) -> StoreResult<Vec<RecurringCharge>> {
        self.insert(TABLE, charges, access_token).await
    }

    /// Patch a charge by id.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn update_recurring_charge(
        &self,
        id: Uuid,
        patch: &serde_json::Value,
        access_token: Option<&str>,
    ) -> StoreResult<()> {
        let query = Query::default().eq("id", id);
        self.update(TABLE, &query, patch, access_token).await
    }

    /// Delete a charge by id.
    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete_recurring_charge(
        &self,
        id: Uuid,
        access_token: Option<&str>,
    ) -> StoreResult<()> {
        let query = Query::default().eq("id", id);
        self.delete(TABLE, &query, access_token).await
    }

    /// Delete every charge. Used by reset; the `neq` sentinel satisfies
    /// the service's filter requirement while matching all rows.
    #[instrument(skip_all)]
    pub async fn delete_all_recurring_charges(
        &self,
        access_token: Option<&str>,
    ) -> StoreResult<()> {
        let query = Query::default().neq("id", NIL_UUID);
        self.delete(TABLE, &query, access_token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::StoreConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> StoreClient {
        StoreClient::new(StoreConfig {
            base_url: server.uri(),
            anon_key: "anon-key".into(),
        })
    }

    #[tokio::test]
    async fn list_orders_by_charge_day() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/gastos_mensuales"))
            .and(query_param("order", "dia_de_cobro.asc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
            .mount(&server)
            .await;

        let charges = client_for(&server)
            .list_recurring_charges(None)
            .await
            .unwrap();
        assert!(charges.is_empty());
    }

    #[tokio::test]
    async fn delete_all_uses_sentinel_filter() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/gastos_mensuales"))
            .and(query_param(
                "id",
                "neq.00000000-0000-0000-0000-000000000000",
            ))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server)
            .delete_all_recurring_charges(Some("tok"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delete_by_id_filters_exactly() {
        let server = MockServer::start().await;
        let id: Uuid = "99999999-8888-7777-6666-555555555555".parse().unwrap();
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/gastos_mensuales"))
            .and(query_param("id", format!("eq.{id}")))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        client_for(&server)
            .delete_recurring_charge(id, None)
            .await
            .unwrap();
    }
}
