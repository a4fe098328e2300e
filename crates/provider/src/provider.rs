//! The data provider facade.
//!
//! [`DataProvider`] exposes the generic list/read/write operations and
//! translates them into calls on a [`RemoteClient`]. List and reference-list
//! requests go through the query compiler; the remaining operations are
//! single-call passthroughs.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ProviderConfig;
use crate::error::{BackendError, ProviderResult};
use crate::observer::{QueryObserver, TracingObserver};
use crate::query::{QueryPlan, RemoteClient, RemoteQueryBuilder, RowFilter, execute_plan};
use crate::types::{
    Filter, IdsResult, ListParams, ListResult, ManyResult, RecordResult, ReferenceParams,
    ResourcesConfig,
};

/// Generic record operations over a tabular backend.
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tabula_provider::backends::memory::MemoryClient;
/// use tabula_provider::config::ProviderConfig;
/// use tabula_provider::provider::DataProvider;
/// use tabula_provider::types::{ListParams, ResourceConfig, ResourcesConfig};
///
/// # tokio_test_block(async {
/// let client = MemoryClient::new();
/// client.seed("tags", vec![json!({"id": 1, "name": "rust"}), json!({"id": 2, "name": "sql"})]);
///
/// let resources = ResourcesConfig::new().with_resource("tags", ResourceConfig::fields(["id", "name"]));
/// let provider = DataProvider::new(client, resources, ProviderConfig::default());
///
/// let page = provider.get_list("tags", ListParams::new(1, 10).with_filter("q", "ru")).await.unwrap();
/// assert_eq!(page.total, 1);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct DataProvider<C> {
    client: C,
    resources: ResourcesConfig,
    config: ProviderConfig,
    observer: Arc<dyn QueryObserver>,
}

impl<C: RemoteClient> DataProvider<C> {
    /// Creates a provider with the default [`TracingObserver`].
    pub fn new(client: C, resources: ResourcesConfig, config: ProviderConfig) -> Self {
        Self {
            client,
            resources,
            config,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the query observer. It is only invoked when
    /// [`ProviderConfig::log_queries`] is set.
    pub fn with_observer(mut self, observer: Arc<dyn QueryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the resource configuration.
    pub fn resources(&self) -> &ResourcesConfig {
        &self.resources
    }

    /// Returns the provider configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Compiles a list request without executing it.
    pub fn compile_list(&self, resource: &str, params: &ListParams) -> ProviderResult<QueryPlan> {
        let resource_config = self.resources.get(resource)?;
        self.config.check_page_size(params.pagination.per_page)?;
        Ok(QueryPlan::compile(resource, resource_config, params)?.with_count(self.config.count_mode))
    }

    /// Lists one page of records with the total match count.
    pub async fn get_list(&self, resource: &str, params: ListParams) -> ProviderResult<ListResult> {
        let plan = self.compile_list(resource, &params)?;
        if self.config.log_queries {
            self.observer.plan_compiled(&plan);
        }

        let outcome = execute_plan(&plan, self.client.from_table(resource)).await;
        if self.config.log_queries {
            self.observer.query_completed(&plan, outcome.as_ref());
        }
        outcome
    }

    /// Lists records referencing another record through `params.target`.
    pub async fn get_many_reference(
        &self,
        resource: &str,
        params: ReferenceParams,
    ) -> ProviderResult<ListResult> {
        self.get_list(resource, params.into_list_params()).await
    }

    /// Fetches a single record by identifier.
    pub async fn get_one(&self, resource: &str, id: Value) -> ProviderResult<RecordResult> {
        let fields = self.resources.get(resource)?.select_fields();

        let mut query = self.client.from_table(resource);
        query.select(&fields, None);
        query.match_all(&self.id_filter(id.clone()));
        let rows = query.execute().await?.data.unwrap_or_default();

        Ok(RecordResult {
            data: single_row(resource, &id, rows)?,
        })
    }

    /// Fetches several records by identifier.
    pub async fn get_many(&self, resource: &str, ids: Vec<Value>) -> ProviderResult<ManyResult> {
        let fields = self.resources.get(resource)?.select_fields();

        let mut query = self.client.from_table(resource);
        query.select(&fields, None);
        query.in_list(&self.config.id_field, &ids);
        let response = query.execute().await?;

        Ok(ManyResult {
            data: response.data.unwrap_or_default(),
        })
    }

    /// Creates a record.
    pub async fn create(&self, resource: &str, data: Value) -> ProviderResult<RecordResult> {
        let rows = self.client.insert(resource, data).await?;
        let created = rows.into_iter().next().ok_or_else(|| BackendError::query(format!(
            "insert into {} returned no rows",
            resource
        )))?;
        tracing::debug!(resource = %resource, "Created record");
        Ok(RecordResult { data: created })
    }

    /// Updates a single record.
    pub async fn update(&self, resource: &str, id: Value, data: Value) -> ProviderResult<RecordResult> {
        let target = RowFilter::Match(self.id_filter(id.clone()));
        let rows = self.client.update(resource, &target, data).await?;
        Ok(RecordResult {
            data: single_row(resource, &id, rows)?,
        })
    }

    /// Applies the same patch to several records.
    pub async fn update_many(
        &self,
        resource: &str,
        ids: Vec<Value>,
        data: Value,
    ) -> ProviderResult<IdsResult> {
        let target = RowFilter::any_of(self.config.id_field.clone(), ids);
        let rows = self.client.update(resource, &target, data).await?;
        Ok(IdsResult::from_records(&rows, &self.config.id_field))
    }

    /// Deletes a single record and returns it.
    pub async fn delete(&self, resource: &str, id: Value) -> ProviderResult<RecordResult> {
        let target = RowFilter::Match(self.id_filter(id.clone()));
        let rows = self.client.delete(resource, &target).await?;
        Ok(RecordResult {
            data: single_row(resource, &id, rows)?,
        })
    }

    /// Deletes several records.
    pub async fn delete_many(&self, resource: &str, ids: Vec<Value>) -> ProviderResult<IdsResult> {
        let target = RowFilter::any_of(self.config.id_field.clone(), ids);
        let rows = self.client.delete(resource, &target).await?;
        Ok(IdsResult::from_records(&rows, &self.config.id_field))
    }

    fn id_filter(&self, id: Value) -> Filter {
        let mut filter = Filter::new();
        filter.insert(self.config.id_field.clone(), id);
        filter
    }
}

/// Requires exactly one row, like a `.single()` call on the backend.
fn single_row(resource: &str, id: &Value, rows: Vec<Value>) -> Result<Value, BackendError> {
    let count = rows.len();
    let mut rows = rows.into_iter();
    match (rows.next(), count) {
        (Some(row), 1) => Ok(row),
        (None, _) => Err(BackendError::NotFound {
            resource: resource.to_string(),
            id: display_id(id),
        }),
        _ => Err(BackendError::MultipleRows {
            resource: resource.to_string(),
            count,
        }),
    }
}

fn display_id(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
