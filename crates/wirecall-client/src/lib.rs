//! wirecall client: calls server methods over HTTP.
//!
//! # Example
//!
//! ```ignore
//! use wirecall_client::RpcClientFactory;
//!
//! let factory = RpcClientFactory::http("http://127.0.0.1:3210")?;
//! let rpc = factory.client();
//!
//! let sum = rpc.request("math.add", Some(json!({ "a": 2, "b": 3 }))).await?;
//! ```

pub mod client;
pub mod error;
pub mod fetch;

pub use client::{resolve_route_prefix, RpcClient, RpcClientFactory, ROUTE_PREFIX_ENV};
pub use error::{ClientError, TransportError};
pub use fetch::{Fetch, FetchOptions, ReqwestFetch};
