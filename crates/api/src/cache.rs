//! Resource-keyed read cache with invalidation.
//!
//! Every cached read is keyed by resource, visibility scope and serialized
//! query parameters. Mutations never write into the cache; once the API
//! confirms them, every entry of the affected resources is invalidated so the
//! next read refetches.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, warn};

use vitrine_core::{Address, Cart, Category, Order, Product, ProductPage, User, UserId};

use crate::error::ApiError;

/// A cacheable API resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Products,
    Categories,
    Orders,
    Users,
    Cart,
    Addresses,
    /// The signed-in user's own record (`/auth/me`).
    Profile,
}

impl Resource {
    /// Name used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Products => "products",
            Self::Categories => "categories",
            Self::Orders => "orders",
            Self::Users => "users",
            Self::Cart => "cart",
            Self::Addresses => "addresses",
            Self::Profile => "profile",
        }
    }
}

/// Who a cached entry is visible to.
///
/// Anonymous catalog reads are shared; anything fetched with a bearer token
/// is private to that user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Public,
    User(UserId),
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Public => f.write_str("public"),
            Self::User(id) => write!(f, "user:{id}"),
        }
    }
}

/// Cache key: resource, scope and serialized parameters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub resource: Resource,
    pub scope: Scope,
    pub params: String,
}

impl CacheKey {
    #[must_use]
    pub fn new(resource: Resource, scope: Scope, params: impl Into<String>) -> Self {
        Self {
            resource,
            scope,
            params: params.into(),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.resource.as_str(), self.scope, self.params)
    }
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Products(ProductPage),
    Product(Box<Product>),
    Categories(Vec<Category>),
    Category(Box<Category>),
    Orders(Vec<Order>),
    Order(Box<Order>),
    Users(Vec<User>),
    User(Box<User>),
    Cart(Cart),
    Addresses(Vec<Address>),
}

/// A response type that can live in the cache.
pub trait Cacheable: Sized {
    fn into_value(self) -> CacheValue;
    fn from_value(value: CacheValue) -> Option<Self>;
}

macro_rules! cacheable {
    ($ty:ty => $variant:ident) => {
        impl Cacheable for $ty {
            fn into_value(self) -> CacheValue {
                CacheValue::$variant(self)
            }

            fn from_value(value: CacheValue) -> Option<Self> {
                match value {
                    CacheValue::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
    (box $ty:ty => $variant:ident) => {
        impl Cacheable for $ty {
            fn into_value(self) -> CacheValue {
                CacheValue::$variant(Box::new(self))
            }

            fn from_value(value: CacheValue) -> Option<Self> {
                match value {
                    CacheValue::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

cacheable!(ProductPage => Products);
cacheable!(box Product => Product);
cacheable!(Vec<Category> => Categories);
cacheable!(box Category => Category);
cacheable!(Vec<Order> => Orders);
cacheable!(box Order => Order);
cacheable!(Vec<User> => Users);
cacheable!(box User => User);
cacheable!(Cart => Cart);
cacheable!(Vec<Address> => Addresses);

/// Shared cache of API reads.
#[derive(Clone)]
pub struct ResourceCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl ResourceCache {
    /// Create a cache holding at most `capacity` entries for `ttl` each.
    #[must_use]
    pub fn new(capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self { cache }
    }

    /// Return the cached value for `key`, or run `fetch` and cache its
    /// result.
    ///
    /// Concurrent calls for the same key share one `fetch`. Failures are not
    /// cached.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `fetch`, or a decode error if the entry
    /// under `key` holds another type.
    pub async fn get_or_fetch<T, F>(&self, key: CacheKey, fetch: F) -> Result<T, ApiError>
    where
        T: Cacheable,
        F: Future<Output = Result<T, ApiError>>,
    {
        let label = key.to_string();
        let value = self
            .cache
            .try_get_with(key, async move { fetch.await.map(Cacheable::into_value) })
            .await
            .map_err(|e: Arc<ApiError>| (*e).clone())?;

        T::from_value(value)
            .ok_or_else(|| ApiError::Decode(format!("cache entry {label} holds another type")))
    }

    /// Whether `key` currently has an entry.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.cache.get(key).await.is_some()
    }

    /// Drop every entry of the given resources, across all scopes.
    pub fn invalidate(&self, resources: &[Resource]) {
        if resources.is_empty() {
            return;
        }
        let targets: Vec<Resource> = resources.to_vec();
        debug!(
            resources = ?targets.iter().map(|r| r.as_str()).collect::<Vec<_>>(),
            "Invalidating cached reads"
        );
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |key, _| targets.contains(&key.resource))
        {
            warn!("Falling back to full cache invalidation: {e}");
            self.cache.invalidate_all();
        }
    }

    /// Drop every entry visible to one user, e.g. on sign-out.
    pub fn invalidate_scope(&self, scope: &Scope) {
        let scope = scope.clone();
        debug!(?scope, "Invalidating cached reads of one scope");
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |key, _| key.scope == scope)
        {
            warn!("Falling back to full cache invalidation: {e}");
            self.cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for ResourceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceCache")
            .field("entries", &self.cache.entry_count())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn cache() -> ResourceCache {
        ResourceCache::new(100, Duration::from_secs(60))
    }

    fn category(slug: &str) -> Category {
        Category {
            id: slug.into(),
            name: slug.to_uppercase(),
            slug: slug.to_string(),
            description: None,
            image: None,
        }
    }

    fn key(resource: Resource, scope: Scope, params: &str) -> CacheKey {
        CacheKey::new(resource, scope, params)
    }

    #[tokio::test]
    async fn test_second_read_is_served_from_cache() {
        let cache = cache();
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let fetch = || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, ApiError>(vec![category("vestidos")])
        };

        let k = key(Resource::Categories, Scope::Public, "");
        let first: Vec<Category> = cache.get_or_fetch(k.clone(), fetch()).await.unwrap();
        let second: Vec<Category> = cache.get_or_fetch(k, fetch()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_different_params_are_independent() {
        let cache = cache();
        let a: Vec<Category> = cache
            .get_or_fetch(key(Resource::Categories, Scope::Public, "a"), async {
                Ok(vec![category("a")])
            })
            .await
            .unwrap();
        let b: Vec<Category> = cache
            .get_or_fetch(key(Resource::Categories, Scope::Public, "b"), async {
                Ok(vec![category("b")])
            })
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = cache();
        let k = key(Resource::Categories, Scope::Public, "");
        let failed: Result<Vec<Category>, _> = cache
            .get_or_fetch(k.clone(), async { Err(ApiError::Transport("down".into())) })
            .await;
        assert!(failed.is_err());
        assert!(!cache.contains(&k).await);

        let ok: Vec<Category> = cache
            .get_or_fetch(k, async { Ok(vec![category("saias")]) })
            .await
            .unwrap();
        assert_eq!(ok.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_by_resource_spans_scopes() {
        let cache = cache();
        let public = key(Resource::Categories, Scope::Public, "");
        let private = key(Resource::Categories, Scope::User("7".into()), "");
        let other = key(Resource::Addresses, Scope::User("7".into()), "");

        let _: Vec<Category> = cache
            .get_or_fetch(public.clone(), async { Ok(vec![category("a")]) })
            .await
            .unwrap();
        let _: Vec<Category> = cache
            .get_or_fetch(private.clone(), async { Ok(vec![category("b")]) })
            .await
            .unwrap();
        let _: Vec<Address> = cache
            .get_or_fetch(other.clone(), async { Ok(Vec::new()) })
            .await
            .unwrap();

        cache.invalidate(&[Resource::Categories]);

        assert!(!cache.contains(&public).await);
        assert!(!cache.contains(&private).await);
        assert!(cache.contains(&other).await);
    }

    #[tokio::test]
    async fn test_invalidate_scope() {
        let cache = cache();
        let mine = key(Resource::Cart, Scope::User("1".into()), "");
        let theirs = key(Resource::Cart, Scope::User("2".into()), "");
        let _: Cart = cache
            .get_or_fetch(mine.clone(), async { Ok(Cart::default()) })
            .await
            .unwrap();
        let _: Cart = cache
            .get_or_fetch(theirs.clone(), async { Ok(Cart::default()) })
            .await
            .unwrap();

        cache.invalidate_scope(&Scope::User("1".into()));

        assert!(!cache.contains(&mine).await);
        assert!(cache.contains(&theirs).await);
    }

    #[test]
    fn test_key_display() {
        let k = key(Resource::Products, Scope::User("9".into()), "page=2");
        assert_eq!(k.to_string(), "products:user:9:page=2");
    }
}
