//! Hypermedia authentication flow engine. Drives HAAPI-style OAuth/OIDC login steps, client
//! operations, and the final authorization-code exchange from one observable state machine.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod error;
pub mod flow;
pub mod http;
pub mod model;
pub mod obs;
pub mod operation;
pub mod profile;
pub mod step;
pub mod token;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::Value;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {httpmock as _, tokio as _};
