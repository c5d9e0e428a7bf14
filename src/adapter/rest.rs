//! REST adapter over the channel transport.
//!
//! Bridges the abstract document-store operations to HTTP verbs in
//! django-tastypie conventions: unpluralized resource roots, forced
//! trailing slashes, `set/{id1};{id2};/` batched lookups, api-key
//! authentication, and the `{objects, meta}` list envelope.
//!
//! CRUD operations are fire-and-forget: completion is signaled entirely
//! through the store's lifecycle hooks, never a payload-bearing return
//! value. Find operations additionally propagate remote failures to the
//! caller, since there is no record to attach them to.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::adapter::config::AdapterConfig;
use crate::error::{Error, Result};
use crate::identifiers::RecordId;
use crate::protocol::{AjaxParams, Method};
use crate::record::Record;
use crate::serializer::WireSerializer;
use crate::store::RecordStore;
use crate::transport::Transport;

// ============================================================================
// DataAdapter
// ============================================================================

/// The abstract adapter capability a document store programs against.
///
/// Implementations own URL construction and dispatch; the store owns
/// record identity and presentation. Bulk commits are not supported:
/// each record operation is exactly one request.
#[async_trait]
pub trait DataAdapter: Send + Sync {
    /// Composes the URL for a resource root, or one item of it.
    fn build_url(&self, resource: &str, id: Option<RecordId>) -> String;

    /// Creates a record (POST). Outcomes arrive via
    /// [`RecordStore::did_create_record`] or
    /// [`RecordStore::record_was_error`].
    async fn create(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        record: &mut Record,
    ) -> Result<()>;

    /// Updates a record (PUT). Outcomes arrive via
    /// [`RecordStore::did_save_record`] or
    /// [`RecordStore::record_was_error`].
    async fn update(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        record: &mut Record,
    ) -> Result<()>;

    /// Deletes a record (DELETE). Outcomes arrive via
    /// [`RecordStore::did_delete_record`] or
    /// [`RecordStore::record_was_error`].
    async fn delete(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        record: &mut Record,
    ) -> Result<()>;

    /// Looks up one record by id (GET). Resolves via
    /// [`RecordStore::did_find_record`].
    async fn find_one(&self, store: &dyn RecordStore, resource: &str, id: RecordId) -> Result<()>;

    /// Looks up a batch of ids with a single GET on the composite
    /// `set/{id1};{id2};.../` path. Resolves via
    /// [`RecordStore::did_find_many`].
    async fn find_many(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        ids: &[RecordId],
    ) -> Result<()>;

    /// Lists all records (GET). Resolves via
    /// [`RecordStore::did_find_all`].
    async fn find_all(&self, store: &dyn RecordStore, resource: &str) -> Result<()>;

    /// Runs a filtered query (GET with query parameters). Resolves via
    /// [`RecordStore::did_find_query`].
    async fn find_query(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        query: &Value,
    ) -> Result<()>;
}

// ============================================================================
// RestAdapter
// ============================================================================

/// Tastypie-convention REST adapter.
///
/// The transport is constructor-passed: hand it a
/// [`Channel`](crate::Channel) for cross-domain tunneling or a
/// [`DirectHttp`](crate::DirectHttp) for same-origin dispatch.
pub struct RestAdapter {
    config: AdapterConfig,
    transport: Arc<dyn Transport>,
    serializer: WireSerializer,
}

impl RestAdapter {
    /// Creates an adapter from a validated configuration and a transport.
    #[must_use]
    pub fn new(config: AdapterConfig, transport: Arc<dyn Transport>) -> Self {
        let serializer = WireSerializer::new(config.namespace());
        Self {
            config,
            transport,
            serializer,
        }
    }

    /// Returns the adapter's configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Returns the wire serializer bound to this adapter's namespace.
    #[inline]
    #[must_use]
    pub fn serializer(&self) -> &WireSerializer {
        &self.serializer
    }
}

// ============================================================================
// RestAdapter - Dispatch
// ============================================================================

impl RestAdapter {
    /// Dispatches one request with auth injection and loading hooks.
    async fn dispatch(&self, url: String, method: Method, data: Option<Value>) -> Result<Value> {
        let url = self.with_query_auth(url, method);
        let data = self.with_body_auth(data, method);

        let mut params = AjaxParams::new(url, method);
        if let Some(data) = data {
            params = params.with_data(data);
        }

        debug!(url = %params.url, method = %method, "adapter dispatch");

        if let Some(hooks) = self.config.loading_hooks() {
            (hooks.on_loading)();
        }
        let result = self.transport.ajax(params).await;
        if let Some(hooks) = self.config.loading_hooks() {
            (hooks.on_loaded)();
        }

        result
    }

    /// Appends auth query parameters for GET/DELETE requests.
    fn with_query_auth(&self, mut url: String, method: Method) -> String {
        if method.sends_body() {
            return url;
        }
        if let Some((username, api_key)) = self.config.credentials() {
            url.push_str("?username=");
            url.push_str(&urlencoding::encode(username));
            url.push_str("&api_key=");
            url.push_str(&urlencoding::encode(api_key));
        }
        url
    }

    /// Injects auth fields into POST/PUT bodies.
    fn with_body_auth(&self, data: Option<Value>, method: Method) -> Option<Value> {
        if !method.sends_body() {
            return data;
        }
        let Some((username, api_key)) = self.config.credentials() else {
            return data;
        };

        let mut object = match data {
            Some(Value::Object(map)) => map,
            Some(other) => {
                warn!("non-object body, auth fields not injected");
                return Some(other);
            }
            None => Map::new(),
        };
        object.insert("username".to_string(), Value::String(username.to_string()));
        object.insert("api_key".to_string(), Value::String(api_key.to_string()));
        Some(Value::Object(object))
    }

    /// Attaches the raw error detail to the record and notifies the
    /// store's error hook.
    fn deliver_error(store: &dyn RecordStore, resource: &str, record: &mut Record, error: &Error) {
        record.set_errors(error.response_text());
        store.record_was_error(resource, record);
    }

    /// Merges a non-empty single-record payload back into the record.
    fn absorb_payload(&self, payload: &Value, record: &mut Record) -> Result<()> {
        if payload.is_null() {
            return Ok(());
        }
        self.serializer.extract_single(payload, record)
    }
}

// ============================================================================
// RestAdapter - DataAdapter
// ============================================================================

#[async_trait]
impl DataAdapter for RestAdapter {
    fn build_url(&self, resource: &str, id: Option<RecordId>) -> String {
        let mut url = String::new();
        if let Some(domain) = self.config.server_domain() {
            url.push_str(domain);
        }
        url.push('/');
        url.push_str(self.config.namespace());
        url.push('/');
        url.push_str(resource);
        url.push('/');
        if let Some(id) = id {
            url.push_str(&id.to_string());
            url.push('/');
        }
        url
    }

    async fn create(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        record: &mut Record,
    ) -> Result<()> {
        let url = self.build_url(resource, None);
        let data = record.serialize_payload();

        match self.dispatch(url, Method::Post, Some(data)).await {
            Ok(payload) => {
                self.absorb_payload(&payload, record)?;
                store.did_create_record(resource, record, &payload);
                Ok(())
            }
            Err(error) if error.is_remote() => {
                Self::deliver_error(store, resource, record, &error);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    async fn update(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        record: &mut Record,
    ) -> Result<()> {
        let id = record
            .id()
            .ok_or_else(|| Error::invalid_argument("cannot update a record without an id"))?;
        let url = self.build_url(resource, Some(id));
        let data = record.serialize_payload();

        match self.dispatch(url, Method::Put, Some(data)).await {
            Ok(payload) => {
                self.absorb_payload(&payload, record)?;
                store.did_save_record(resource, record, &payload);
                Ok(())
            }
            Err(error) if error.is_remote() => {
                Self::deliver_error(store, resource, record, &error);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    async fn delete(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        record: &mut Record,
    ) -> Result<()> {
        let id = record
            .id()
            .ok_or_else(|| Error::invalid_argument("cannot delete a record without an id"))?;
        let url = self.build_url(resource, Some(id));

        match self.dispatch(url, Method::Delete, None).await {
            Ok(payload) => {
                store.did_delete_record(resource, record, &payload);
                Ok(())
            }
            Err(error) if error.is_remote() => {
                Self::deliver_error(store, resource, record, &error);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    async fn find_one(&self, store: &dyn RecordStore, resource: &str, id: RecordId) -> Result<()> {
        let url = self.build_url(resource, Some(id));
        let payload = self.dispatch(url, Method::Get, None).await?;
        store.did_find_record(resource, id, &payload);
        Ok(())
    }

    async fn find_many(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        ids: &[RecordId],
    ) -> Result<()> {
        if ids.is_empty() {
            debug!(resource, "find_many with no ids, skipping request");
            store.did_find_many(resource, &crate::record::Collection::new());
            return Ok(());
        }

        let joined = ids
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(";");
        let url = format!("{}set/{joined}/", self.build_url(resource, None));

        let payload = self.dispatch(url, Method::Get, None).await?;
        let collection = self.serializer.extract_many(&payload)?;
        store.did_find_many(resource, &collection);
        Ok(())
    }

    async fn find_all(&self, store: &dyn RecordStore, resource: &str) -> Result<()> {
        let url = self.build_url(resource, None);
        let payload = self.dispatch(url, Method::Get, None).await?;
        let collection = self.serializer.extract_many(&payload)?;
        store.did_find_all(resource, &collection);
        Ok(())
    }

    async fn find_query(
        &self,
        store: &dyn RecordStore,
        resource: &str,
        query: &Value,
    ) -> Result<()> {
        let url = self.build_url(resource, None);
        let payload = self
            .dispatch(url, Method::Get, Some(query.clone()))
            .await?;
        let collection = self.serializer.extract_many(&payload)?;
        store.did_find_query(resource, &collection);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::record::Collection;

    // ------------------------------------------------------------------
    // Mocks
    // ------------------------------------------------------------------

    /// Transport stub: records dispatched params, replays canned results.
    #[derive(Default)]
    struct MockTransport {
        requests: Mutex<Vec<AjaxParams>>,
        replies: Mutex<VecDeque<Result<Value>>>,
    }

    impl MockTransport {
        fn replying(reply: Result<Value>) -> Arc<Self> {
            let transport = Self::default();
            transport.replies.lock().push_back(reply);
            Arc::new(transport)
        }

        fn requests(&self) -> Vec<AjaxParams> {
            self.requests.lock().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn ajax(&self, params: AjaxParams) -> Result<Value> {
            self.requests.lock().push(params);
            self.replies
                .lock()
                .pop_front()
                .unwrap_or(Ok(Value::Null))
        }
    }

    /// Store stub: records hook invocations and the last collection.
    #[derive(Default)]
    struct MockStore {
        events: Mutex<Vec<String>>,
        collection: Mutex<Option<Collection>>,
    }

    impl MockStore {
        fn events(&self) -> Vec<String> {
            self.events.lock().clone()
        }

        fn collection(&self) -> Collection {
            self.collection.lock().clone().expect("collection captured")
        }
    }

    impl RecordStore for MockStore {
        fn did_create_record(&self, resource: &str, _record: &mut Record, _payload: &Value) {
            self.events.lock().push(format!("did_create_record:{resource}"));
        }

        fn did_save_record(&self, resource: &str, _record: &mut Record, _payload: &Value) {
            self.events.lock().push(format!("did_save_record:{resource}"));
        }

        fn did_delete_record(&self, resource: &str, _record: &mut Record, _payload: &Value) {
            self.events.lock().push(format!("did_delete_record:{resource}"));
        }

        fn did_find_record(&self, resource: &str, id: RecordId, _payload: &Value) {
            self.events.lock().push(format!("did_find_record:{resource}:{id}"));
        }

        fn did_find_many(&self, resource: &str, collection: &Collection) {
            self.events.lock().push(format!("did_find_many:{resource}"));
            *self.collection.lock() = Some(collection.clone());
        }

        fn did_find_all(&self, resource: &str, collection: &Collection) {
            self.events.lock().push(format!("did_find_all:{resource}"));
            *self.collection.lock() = Some(collection.clone());
        }

        fn did_find_query(&self, resource: &str, collection: &Collection) {
            self.events.lock().push(format!("did_find_query:{resource}"));
            *self.collection.lock() = Some(collection.clone());
        }

        fn record_was_error(&self, resource: &str, _record: &mut Record) {
            self.events.lock().push(format!("record_was_error:{resource}"));
        }
    }

    fn config() -> AdapterConfig {
        AdapterConfig::builder()
            .namespace("api/v1")
            .build()
            .expect("valid config")
    }

    fn config_with_auth() -> AdapterConfig {
        AdapterConfig::builder()
            .namespace("api/v1")
            .credentials("alice", "s3cr3t")
            .build()
            .expect("valid config")
    }

    fn adapter(config: AdapterConfig, transport: Arc<MockTransport>) -> RestAdapter {
        RestAdapter::new(config, transport)
    }

    // ------------------------------------------------------------------
    // URL building
    // ------------------------------------------------------------------

    #[test]
    fn test_build_url_without_domain() {
        let rest = adapter(config(), Arc::new(MockTransport::default()));
        assert_eq!(rest.build_url("item", None), "/api/v1/item/");
        assert_eq!(
            rest.build_url("item", Some(RecordId::new(3))),
            "/api/v1/item/3/"
        );
    }

    #[test]
    fn test_build_url_with_domain() {
        let config = AdapterConfig::builder()
            .namespace("api/v1")
            .server_domain("https://api.example.com/")
            .build()
            .expect("valid config");
        let rest = adapter(config, Arc::new(MockTransport::default()));
        assert_eq!(
            rest.build_url("item", None),
            "https://api.example.com/api/v1/item/"
        );
    }

    // ------------------------------------------------------------------
    // CRUD
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_adopts_server_id() {
        let transport = MockTransport::replying(Ok(json!({"id": 42})));
        let rest = adapter(config(), Arc::clone(&transport));
        let store = MockStore::default();

        let mut record = Record::new();
        record.set("name", json!("a"));

        rest.create(&store, "item", &mut record)
            .await
            .expect("create");

        assert_eq!(record.id(), Some(RecordId::new(42)));
        assert_eq!(store.events(), vec!["did_create_record:item"]);

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].url, "/api/v1/item/");
        let body = requests[0].data.as_ref().expect("body");
        assert_eq!(body.get("name").and_then(Value::as_str), Some("a"));
    }

    #[tokio::test]
    async fn test_create_failure_attaches_errors() {
        let transport = MockTransport::replying(Err(Error::remote(400, "name required")));
        let rest = adapter(config(), Arc::clone(&transport));
        let store = MockStore::default();

        let mut record = Record::new();
        rest.create(&store, "item", &mut record)
            .await
            .expect("failure is delivered via hooks");

        assert_eq!(record.errors(), Some("name required"));
        assert_eq!(store.events(), vec!["record_was_error:item"]);
        assert_eq!(record.id(), None);
    }

    #[tokio::test]
    async fn test_update_injects_body_auth() {
        let transport = MockTransport::replying(Ok(Value::Null));
        let rest = adapter(config_with_auth(), Arc::clone(&transport));
        let store = MockStore::default();

        let mut record = Record::with_id(RecordId::new(3));
        record.set("name", json!("b"));

        rest.update(&store, "item", &mut record)
            .await
            .expect("update");

        assert_eq!(store.events(), vec!["did_save_record:item"]);

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].url, "/api/v1/item/3/");
        let body = requests[0].data.as_ref().expect("body");
        assert_eq!(body.get("username").and_then(Value::as_str), Some("alice"));
        assert_eq!(body.get("api_key").and_then(Value::as_str), Some("s3cr3t"));
    }

    #[tokio::test]
    async fn test_update_without_id_rejected() {
        let rest = adapter(config(), Arc::new(MockTransport::default()));
        let store = MockStore::default();

        let mut record = Record::new();
        let result = rest.update(&store, "item", &mut record).await;
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
        assert!(store.events().is_empty());
    }

    #[tokio::test]
    async fn test_delete_uses_query_auth() {
        let transport = MockTransport::replying(Ok(Value::Null));
        let rest = adapter(config_with_auth(), Arc::clone(&transport));
        let store = MockStore::default();

        let mut record = Record::with_id(RecordId::new(9));
        rest.delete(&store, "item", &mut record)
            .await
            .expect("delete");

        assert_eq!(store.events(), vec!["did_delete_record:item"]);

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Delete);
        assert_eq!(
            requests[0].url,
            "/api/v1/item/9/?username=alice&api_key=s3cr3t"
        );
        assert!(requests[0].data.is_none());
    }

    // ------------------------------------------------------------------
    // Finds
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_find_one_notifies_store() {
        let transport = MockTransport::replying(Ok(json!({"id": 7, "name": "a"})));
        let rest = adapter(config(), Arc::clone(&transport));
        let store = MockStore::default();

        rest.find_one(&store, "item", RecordId::new(7))
            .await
            .expect("find_one");

        assert_eq!(store.events(), vec!["did_find_record:item:7"]);
        assert_eq!(transport.requests()[0].url, "/api/v1/item/7/");
    }

    #[tokio::test]
    async fn test_find_many_batches_ids() {
        let transport = MockTransport::replying(Ok(json!({
            "objects": [{"id": 1}, {"id": 2}, {"id": 3}],
            "meta": {"total_count": 3, "next": null}
        })));
        let rest = adapter(config(), Arc::clone(&transport));
        let store = MockStore::default();

        let ids = [RecordId::new(1), RecordId::new(2), RecordId::new(3)];
        rest.find_many(&store, "item", &ids).await.expect("find_many");

        // One composite request, never one per id.
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url, "/api/v1/item/set/1;2;3/");

        assert_eq!(store.events(), vec!["did_find_many:item"]);
        assert_eq!(store.collection().len(), 3);
    }

    #[tokio::test]
    async fn test_find_many_empty_ids_skips_request() {
        let transport = Arc::new(MockTransport::default());
        let rest = adapter(config(), Arc::clone(&transport));
        let store = MockStore::default();

        rest.find_many(&store, "item", &[]).await.expect("find_many");

        assert!(transport.requests().is_empty());
        assert_eq!(store.events(), vec!["did_find_many:item"]);
        assert!(store.collection().is_empty());
    }

    #[tokio::test]
    async fn test_find_query_decodes_collection() {
        let transport = MockTransport::replying(Ok(json!({
            "objects": [{"id": 3, "name": "a"}],
            "meta": {"total_count": 1, "next": null}
        })));
        let rest = adapter(config(), Arc::clone(&transport));
        let store = MockStore::default();

        rest.find_query(&store, "item", &json!({"status": "open"}))
            .await
            .expect("find_query");

        let requests = transport.requests();
        assert_eq!(requests[0].url, "/api/v1/item/");
        assert_eq!(
            requests[0].data.as_ref().and_then(|d| d.get("status")).and_then(Value::as_str),
            Some("open")
        );

        let collection = store.collection();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.total_count(), Some(1));
        // Terminal page: no cursor, nothing further to fetch.
        assert!(collection.next().is_none());
        assert!(!collection.has_more());
    }

    #[tokio::test]
    async fn test_find_all_remote_error_propagates() {
        let transport = MockTransport::replying(Err(Error::remote(500, "boom")));
        let rest = adapter(config(), Arc::clone(&transport));
        let store = MockStore::default();

        let result = rest.find_all(&store, "item").await;
        assert!(matches!(result, Err(Error::Remote { status: 500, .. })));
        assert!(store.events().is_empty());
    }

    #[tokio::test]
    async fn test_get_appends_query_auth() {
        let transport = MockTransport::replying(Ok(json!({
            "objects": [],
            "meta": {"total_count": 0, "next": null}
        })));
        let rest = adapter(config_with_auth(), Arc::clone(&transport));
        let store = MockStore::default();

        rest.find_all(&store, "item").await.expect("find_all");
        assert_eq!(
            transport.requests()[0].url,
            "/api/v1/item/?username=alice&api_key=s3cr3t"
        );
    }

    // ------------------------------------------------------------------
    // Loading hooks
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_loading_hooks_fire_on_both_branches() {
        let counters = Arc::new(Mutex::new((0u32, 0u32)));
        let start = Arc::clone(&counters);
        let stop = Arc::clone(&counters);

        let config = AdapterConfig::builder()
            .namespace("api/v1")
            .loading_hooks(
                move || start.lock().0 += 1,
                move || stop.lock().1 += 1,
            )
            .build()
            .expect("valid config");

        let transport = Arc::new(MockTransport::default());
        transport.replies.lock().push_back(Ok(json!({"id": 1})));
        transport
            .replies
            .lock()
            .push_back(Err(Error::remote(400, "bad")));

        let rest = adapter(config, Arc::clone(&transport));
        let store = MockStore::default();

        let mut record = Record::new();
        rest.create(&store, "item", &mut record).await.expect("create");
        let mut failing = Record::new();
        rest.create(&store, "item", &mut failing).await.expect("create");

        assert_eq!(*counters.lock(), (2, 2));
    }
}
