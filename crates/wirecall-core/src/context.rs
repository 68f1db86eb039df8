//! Per-request execution context.
//!
//! A `RequestContext` is created by the host for each inbound request and
//! handed to handlers. It is a cheap-clone handle; clones share the same
//! memoization slot, so a dispatcher resolved from one clone is reused by
//! every other clone of the same request.

use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

type MemoSlot = Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>;

#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    request_id: String,
    http_method: String,
    path: String,
    /// `None` for contexts that are not bound to an inbound request.
    headers: Option<BTreeMap<String, String>>,
    body: Value,
    memo: MemoSlot,
}

impl RequestContext {
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::default()
    }

    /// A context with no inbound request behind it. Handlers invoked from
    /// the mock dispatcher receive one of these.
    pub fn detached() -> Self {
        Self::from_inner(ContextInner {
            request_id: uuid::Uuid::new_v4().to_string(),
            http_method: String::new(),
            path: String::new(),
            headers: None,
            body: Value::Null,
            memo: Mutex::new(HashMap::new()),
        })
    }

    fn from_inner(inner: ContextInner) -> Self {
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.inner.request_id
    }

    pub fn http_method(&self) -> &str {
        &self.inner.http_method
    }

    pub fn path(&self) -> &str {
        &self.inner.path
    }

    /// Whether this context is bound to an inbound request.
    pub fn has_headers(&self) -> bool {
        self.inner.headers.is_some()
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        self.inner.headers.as_ref()
    }

    /// Header lookup; names are stored lowercased.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner
            .headers
            .as_ref()?
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Parsed request body, `Null` when none was parsed.
    pub fn body(&self) -> &Value {
        &self.inner.body
    }

    /// Return the value memoized for `T`, creating it with `init` on first use.
    pub fn memoize<T, F>(&self, init: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let mut memo = self
            .inner
            .memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(existing) = memo.get(&TypeId::of::<T>()) {
            if let Ok(value) = Arc::clone(existing).downcast::<T>() {
                return value;
            }
        }

        let value = Arc::new(init());
        let erased: Arc<dyn Any + Send + Sync> = value.clone();
        memo.insert(TypeId::of::<T>(), erased);
        value
    }

    /// Whether two handles refer to the same request.
    pub fn same_request(&self, other: &RequestContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("request_id", &self.inner.request_id)
            .field("http_method", &self.inner.http_method)
            .field("path", &self.inner.path)
            .field("headers", &self.inner.headers)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    request_id: Option<String>,
    http_method: String,
    path: String,
    headers: BTreeMap<String, String>,
    body: Option<Value>,
}

impl RequestContextBuilder {
    pub fn request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn http_method(mut self, method: impl Into<String>) -> Self {
        self.http_method = method.into();
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn build(self) -> RequestContext {
        RequestContext::from_inner(ContextInner {
            request_id: self
                .request_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            http_method: self.http_method,
            path: self.path,
            headers: Some(self.headers),
            body: self.body.unwrap_or(Value::Null),
            memo: Mutex::new(HashMap::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_builder_fields() {
        let ctx = RequestContext::builder()
            .request_id("req-1")
            .http_method("POST")
            .path("/api/test")
            .header("Content-Type", "application/json")
            .body(json!({ "a": 1 }))
            .build();

        assert_eq!(ctx.request_id(), "req-1");
        assert_eq!(ctx.http_method(), "POST");
        assert_eq!(ctx.path(), "/api/test");
        assert_eq!(ctx.header("content-type"), Some("application/json"));
        assert_eq!(ctx.header("CONTENT-TYPE"), Some("application/json"));
        assert_eq!(ctx.body(), &json!({ "a": 1 }));
        assert!(ctx.has_headers());
    }

    #[test]
    fn test_detached_has_no_headers() {
        let ctx = RequestContext::detached();
        assert!(!ctx.has_headers());
        assert_eq!(ctx.header("anything"), None);
        assert_eq!(ctx.body(), &Value::Null);
    }

    #[test]
    fn test_memoize_runs_init_once_per_request() {
        struct Counter(usize);

        let calls = AtomicUsize::new(0);
        let ctx = RequestContext::builder().build();
        let clone = ctx.clone();

        let first = ctx.memoize(|| Counter(calls.fetch_add(1, Ordering::SeqCst)));
        let second = clone.memoize(|| Counter(calls.fetch_add(1, Ordering::SeqCst)));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.0, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_memoize_is_request_scoped() {
        let a = RequestContext::builder().build();
        let b = RequestContext::builder().build();

        let from_a = a.memoize(|| String::from("a"));
        let from_b = b.memoize(|| String::from("b"));

        assert_eq!(from_a.as_str(), "a");
        assert_eq!(from_b.as_str(), "b");
        assert!(!a.same_request(&b));
        assert!(a.same_request(&a.clone()));
    }

    #[test]
    fn test_generated_request_ids_differ() {
        let a = RequestContext::builder().build();
        let b = RequestContext::builder().build();
        assert_ne!(a.request_id(), b.request_id());
    }
}
